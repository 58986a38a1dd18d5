use chrono::{Duration, TimeZone, Utc};
use log::warn;

use crate::datetime::start_of_day;
use crate::summary_entry::SummaryEntry;

/// 日付をまたぐエントリーを、指定したタイムゾーンの日ごとに分割する。
///
/// 分割後の作業時間の合計は、元のエントリーの作業時間と常に一致する。
/// 作業時間が0以下のエントリーと、終了時刻が表現できないエントリーは分割せずにそのまま返す。
///
/// # Arguments
///
/// * `entries` - 分割対象のエントリー
/// * `tz` - 日の境界を決めるタイムゾーン
pub fn split_entries_by_day<Tz: TimeZone>(entries: &[SummaryEntry], tz: &Tz) -> Vec<SummaryEntry> {
    let mut segments = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.duration <= Duration::zero() {
            segments.push(entry.clone());
            continue;
        }

        let Some(end) = entry.start.checked_add_signed(entry.duration) else {
            warn!(
                "End time out of range, not split: {} {} {}",
                entry.project, entry.task, entry.start
            );
            segments.push(entry.clone());
            continue;
        };
        let mut current = entry.start;
        while current < end {
            let local_date = current.with_timezone(tz).date_naive();
            let next_day = local_date
                .succ_opt()
                .map(|date| start_of_day(tz, date).with_timezone(&Utc))
                .filter(|next| *next > current)
                .unwrap_or(end);
            let segment_end = next_day.min(end);

            segments.push(SummaryEntry {
                project: entry.project.clone(),
                task: entry.task.clone(),
                start: current,
                duration: segment_end - current,
            });
            current = segment_end;
        }
    }

    segments
}
