use chrono::{DateTime, Duration, Utc};

/// Toggl APIから取得したtime entry。
///
/// 実行中(durationが負)のtime entryは取得時に除外済みのため、`duration`は常に0以上となる。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    pub description: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
    pub project_id: Option<i64>,
    /// レスポンスに含まれていた場合のプロジェクト名。
    pub project_name: Option<String>,
}
