use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone};

use crate::aggregate::Bucket;
use crate::datetime::{date_key, start_of_day};

/// 出力するエントリーがない場合のデフォルトのメッセージ。
pub const DEFAULT_EMPTY_MESSAGE: &str = "No data";

const TASKS_HEADING: &str = "### タスク";
const PROJECTS_HEADING: &str = "### プロジェクト";
const NANOS_PER_HOUR: i128 = 3_600_000_000_000;

/// 出力のレイアウト。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// タスク一覧とプロジェクト一覧を並べて表示する。
    #[default]
    Default,
    /// プロジェクトごとにタスクを表示する。
    Detail,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" => Ok(Self::Default),
            "detail" => Ok(Self::Detail),
            other => Err(format!(
                "invalid format: {} (expected default or detail)",
                other
            )),
        }
    }
}

/// Markdownの出力設定。
#[derive(Clone, Debug)]
pub struct FormatOptions<Tz: TimeZone> {
    pub daily: bool,
    pub range_start: Option<DateTime<Tz>>,
    pub range_end: Option<DateTime<Tz>>,
    pub location: Tz,
    pub format: OutputFormat,
    /// 空の場合は`DEFAULT_EMPTY_MESSAGE`を利用する。
    pub empty_message: String,
}

/// 集計結果をMarkdown形式の文字列に変換する。
///
/// 見出しや一覧のまとまりの間には空行を1行入れる。先頭に空行は入れない。
///
/// # Arguments
///
/// * `buckets` - 集計結果
/// * `options` - 出力設定
pub fn format_markdown<Tz: TimeZone>(buckets: &[Bucket], options: &FormatOptions<Tz>) -> String {
    let blocks = if buckets.is_empty() {
        empty_blocks(options)
    } else {
        buckets
            .iter()
            .flat_map(|bucket| bucket_blocks(bucket, options))
            .collect()
    };

    blocks.join("\n")
}

fn bucket_blocks<Tz: TimeZone>(bucket: &Bucket, options: &FormatOptions<Tz>) -> Vec<String> {
    let mut blocks = Vec::new();
    if options.daily && !bucket.date.is_empty() {
        blocks.push(date_heading(&bucket.date));
    }

    match options.format {
        OutputFormat::Default => {
            let tasks: String = bucket
                .tasks
                .iter()
                .map(|task| list_item(&task.name, task.total))
                .collect();
            let projects: String = bucket
                .projects
                .iter()
                .map(|project| list_item(&project.name, project.total))
                .collect();
            blocks.push(format!("{}\n{}", TASKS_HEADING, tasks));
            blocks.push(format!("{}\n{}", PROJECTS_HEADING, projects));
        }
        OutputFormat::Detail => {
            blocks.extend(bucket.projects.iter().map(|project| {
                let tasks: String = project
                    .tasks
                    .iter()
                    .map(|task| list_item(&task.name, task.total))
                    .collect();
                format!(
                    "### {} {}h\n{}",
                    project.name,
                    format_hours(project.total),
                    tasks
                )
            }));
        }
    }

    blocks
}

// エントリーがない場合は、期間の日付見出しまたはメッセージのみを出力する。
fn empty_blocks<Tz: TimeZone>(options: &FormatOptions<Tz>) -> Vec<String> {
    match options.format {
        OutputFormat::Detail => {
            if options.daily {
                range_days(options)
                    .iter()
                    .map(|date| date_heading(&date_key(date)))
                    .collect()
            } else {
                range_heading(options).into_iter().collect()
            }
        }
        OutputFormat::Default => {
            let message = if options.empty_message.trim().is_empty() {
                format!("{}\n", DEFAULT_EMPTY_MESSAGE)
            } else {
                format!("{}\n", options.empty_message)
            };
            let days = if options.daily {
                range_days(options)
            } else {
                vec![]
            };
            if days.is_empty() {
                return vec![message];
            }
            days.iter()
                .flat_map(|date| [date_heading(&date_key(date)), message.clone()])
                .collect()
        }
    }
}

/// `[range_start, range_end)`に含まれる日付を返す。
fn range_days<Tz: TimeZone>(options: &FormatOptions<Tz>) -> Vec<NaiveDate> {
    let (Some(start), Some(end)) = (&options.range_start, &options.range_end) else {
        return vec![];
    };

    let mut days = Vec::new();
    let mut date = start.with_timezone(&options.location).date_naive();
    while start_of_day(&options.location, date) < *end {
        days.push(date);
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    days
}

/// 日毎でない場合の期間全体の見出しを返す。1日だけの場合は日付のみとする。
fn range_heading<Tz: TimeZone>(options: &FormatOptions<Tz>) -> Option<String> {
    let (Some(start), Some(end)) = (&options.range_start, &options.range_end) else {
        return None;
    };

    let first = start.with_timezone(&options.location).date_naive();
    let last = (end.with_timezone(&options.location).naive_local() - Duration::days(1)).date();
    if last <= first {
        Some(date_heading(&date_key(&first)))
    } else {
        Some(date_heading(&format!(
            "{}..{}",
            date_key(&first),
            date_key(&last)
        )))
    }
}

fn date_heading(date: &str) -> String {
    format!("## {}\n", date)
}

fn list_item(name: &str, total: Duration) -> String {
    format!("- {} {}h\n", name, format_hours(total))
}

/// 時間を小数点以下2桁の時間単位の文字列に変換する。
///
/// 浮動小数点の誤差を避けるため、ナノ秒の整数演算で0.01時間単位に四捨五入する(0から遠い方へ丸める)。
pub fn format_hours(duration: Duration) -> String {
    let nanos = duration
        .num_nanoseconds()
        .map(i128::from)
        .unwrap_or_else(|| i128::from(duration.num_milliseconds()) * 1_000_000);
    let centi_hours = div_round_half_away(nanos * 100, NANOS_PER_HOUR);
    let sign = if centi_hours < 0 { "-" } else { "" };
    let abs = centi_hours.abs();

    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator {
        quotient + numerator.signum()
    } else {
        quotient
    }
}
