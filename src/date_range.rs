use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::datetime::{parse_date, start_of_day};

/// 日付指定の解決に失敗した場合のエラー。
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    /// 日付指定の組み合わせが不正。
    #[error("{0}")]
    InvalidUsage(&'static str),

    /// 日付の書式が不正。
    #[error("invalid --{flag}: {value:?} (expected YYYY-M-D)")]
    InvalidDate { flag: &'static str, value: String },

    /// `--from`が`--to`より後の日付。
    #[error("--from must be <= --to (from: {from}, to: {to})")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

/// ユーザーが指定した日付の選択。
///
/// 空文字の値は未指定として扱う。前後の空白は取り除かずに日付としてパースする。
#[derive(Clone, Debug, Default)]
pub struct DateSelector {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// `[start, end)`の半開区間で表す集計対象の期間。
///
/// `start`と`end`は常に指定したタイムゾーンでの00:00:00となる。
#[derive(Clone, Debug, PartialEq)]
pub struct DateRange<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// `--from`/`--to`で指定された場合にtrueとなる。1日だけの範囲でもtrueとする。
    pub is_range: bool,
}

/// 日付の選択を集計対象の期間に変換する。
///
/// 何も指定されていない場合は、`now`を`tz`に変換した日付の1日を対象とする。
///
/// # Arguments
///
/// * `selector` - ユーザーが指定した日付
/// * `tz` - 日の境界を決めるタイムゾーン
/// * `now` - 現在時刻
pub fn resolve_date_range<Tz: TimeZone>(
    selector: &DateSelector,
    tz: &Tz,
    now: DateTime<Utc>,
) -> Result<DateRange<Tz>, DateRangeError> {
    let date = non_empty(&selector.date);
    let from = non_empty(&selector.from);
    let to = non_empty(&selector.to);

    match (date, from, to) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(DateRangeError::InvalidUsage(
            "use either --date or --from/--to, not both",
        )),
        (None, None, None) => {
            let today = now.with_timezone(tz).date_naive();
            single_day(tz, "date", today)
        }
        (Some(date), None, None) => {
            let date = parse_flag("date", date)?;
            single_day(tz, "date", date)
        }
        (None, Some(from), Some(to)) => {
            let from = parse_flag("from", from)?;
            let to = parse_flag("to", to)?;
            if from > to {
                return Err(DateRangeError::InvalidRange { from, to });
            }
            Ok(DateRange {
                start: start_of_day(tz, from),
                end: start_of_day(tz, next_day("to", to)?),
                is_range: true,
            })
        }
        _ => Err(DateRangeError::InvalidUsage(
            "both --from and --to are required for a range",
        )),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_flag(flag: &'static str, value: &str) -> Result<NaiveDate, DateRangeError> {
    parse_date(value).ok_or_else(|| DateRangeError::InvalidDate {
        flag,
        value: value.to_string(),
    })
}

fn next_day(flag: &'static str, date: NaiveDate) -> Result<NaiveDate, DateRangeError> {
    date.succ_opt().ok_or_else(|| DateRangeError::InvalidDate {
        flag,
        value: date.to_string(),
    })
}

fn single_day<Tz: TimeZone>(
    tz: &Tz,
    flag: &'static str,
    date: NaiveDate,
) -> Result<DateRange<Tz>, DateRangeError> {
    Ok(DateRange {
        start: start_of_day(tz, date),
        end: start_of_day(tz, next_day(flag, date)?),
        is_range: false,
    })
}
