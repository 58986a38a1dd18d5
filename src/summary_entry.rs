use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::time_entry::TimeEntry;

/// プロジェクトが未設定、または名前が解決できない場合のプロジェクト名。
pub const NO_PROJECT: &str = "No Project";

/// 説明が空の場合のタスク名。
pub const NO_DESCRIPTION: &str = "No Description";

/// 集計対象の1エントリー。
///
/// プロジェクト名とタスク名は解決済みで、空になることはない。
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryEntry {
    pub project: String,
    pub task: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
}

/// プロジェクト名の解決が必要なtime entryが含まれているかを返す。
///
/// プロジェクト名がレスポンスに含まれているtime entryは対象外とする。
pub fn needs_project_names(time_entries: &[TimeEntry]) -> bool {
    time_entries
        .iter()
        .any(|entry| project_id(entry).is_some() && inline_project_name(entry).is_none())
}

/// time entryを集計用のエントリーに変換する。
///
/// 入力の順序を保ち、time entryを除外することはない。
///
/// # Arguments
///
/// * `time_entries` - Toggl APIから取得したtime entry
/// * `projects` - プロジェクトIDからプロジェクト名へのマップ。空でも良い。
///   time entryにプロジェクト名が含まれている場合はそちらを優先する。
pub fn build_summary_entries(
    time_entries: &[TimeEntry],
    projects: &HashMap<i64, String>,
) -> Vec<SummaryEntry> {
    time_entries
        .iter()
        .map(|entry| {
            let project = inline_project_name(entry)
                .or_else(|| lookup_project_name(entry, projects))
                .unwrap_or(NO_PROJECT);
            let task = Some(entry.description.trim())
                .filter(|task| !task.is_empty())
                .unwrap_or(NO_DESCRIPTION);

            SummaryEntry {
                project: project.to_string(),
                task: task.to_string(),
                start: entry.start,
                duration: entry.duration,
            }
        })
        .collect()
}

// Togglではプロジェクト未設定を0で返すことがある。
fn project_id(entry: &TimeEntry) -> Option<i64> {
    entry.project_id.filter(|id| *id != 0)
}

fn inline_project_name(entry: &TimeEntry) -> Option<&str> {
    project_id(entry)?;
    non_blank(entry.project_name.as_deref())
}

fn lookup_project_name<'a>(
    entry: &TimeEntry,
    projects: &'a HashMap<i64, String>,
) -> Option<&'a str> {
    let id = project_id(entry)?;
    let name = projects.get(&id);
    if name.is_none() {
        debug!("Project {} not found for time entry {}", id, entry.id);
    }
    non_blank(name.map(String::as_str))
}

fn non_blank(name: Option<&str>) -> Option<&str> {
    name.map(str::trim).filter(|name| !name.is_empty())
}
