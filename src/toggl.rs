use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::time_entry::TimeEntry;

/// Toggl APIのデフォルトのURL。
pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";

/// エラーメッセージに含めるレスポンスボディの最大文字数。
const MAX_ERROR_BODY_CHARS: usize = 2048;

/// Toggl APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglTimeEntry {
    id: i64,
    #[serde(default)]
    description: Option<String>,
    start: String,
    duration: i64,
    #[serde(default)]
    project_id: Option<i64>,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    project_name: Option<String>,
}

/// Toggl APIのプロジェクト情報をデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglProject {
    id: i64,
    name: String,
}

/// Toggl APIが成功以外のステータスを返した場合のエラー。
#[derive(Debug, thiserror::Error)]
#[error("toggl API error: {status} ({method} {path}){}", format_body(.body))]
pub struct TogglApiError {
    pub status: StatusCode,
    pub method: Method,
    pub path: String,
    pub body: String,
}

fn format_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

/// Toggl APIからデータを取得するためのtrait。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TogglRepository {
    /// 指定された期間のタイムエントリーを取得する。
    ///
    /// 実行中のタイムエントリーは含まない。
    ///
    /// # Arguments
    ///
    /// * `start_at` - 取得するタイムエントリーの開始日時
    /// * `end_at` - 取得するタイムエントリーの終了日時
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;

    /// ワークスペースのプロジェクトIDとプロジェクト名のマップを取得する。
    async fn read_projects(&self, workspace_id: &str) -> Result<HashMap<i64, String>>;
}

/// Toggl APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = TogglClient::new(DEFAULT_API_URL, "api-token");
/// let time_entries = client.read_time_entries(&start_at, &end_at).await.unwrap();
/// ```
pub struct TogglClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl TogglClient {
    /// 新しい`TogglClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `api_url` - Toggl APIのベースURL
    /// * `api_token` - Toggl APIのトークン
    pub fn new(api_url: &str, api_token: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{}", self.api_url, path))
            .basic_auth(&self.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", self.api_url))?;
        let response = check_status(response, Method::GET).await?;

        response
            .json::<T>()
            .await
            .context("Failed to deserialize response")
    }
}

#[async_trait]
impl TogglRepository for TogglClient {
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let request = self.get("me/time_entries").query(&[
            ("start_date", start_at.to_rfc3339()),
            ("end_date", end_at.to_rfc3339()),
        ]);
        let toggl_time_entries: Vec<TogglTimeEntry> = self.send(request).await?;
        info!("length of time entries: {}", toggl_time_entries.len());

        toggl_time_entries
            .into_iter()
            .filter(|entry| {
                if entry.duration < 0 {
                    debug!("Skip running time entry: {}", entry.id);
                }
                entry.duration >= 0
            })
            .map(|entry| {
                let start = DateTime::parse_from_rfc3339(&entry.start)
                    .with_context(|| format!("Invalid start time: {}", entry.start))?
                    .to_utc();
                let duration = Duration::try_seconds(entry.duration)
                    .with_context(|| format!("Invalid duration: {}", entry.duration))?;

                Ok(TimeEntry {
                    id: entry.id,
                    description: entry.description.unwrap_or_default(),
                    start,
                    duration,
                    project_id: entry.project_id.or(entry.pid),
                    project_name: entry.project_name,
                })
            })
            .collect()
    }

    async fn read_projects(&self, workspace_id: &str) -> Result<HashMap<i64, String>> {
        let request = self.get(&format!("workspaces/{}/projects", workspace_id));
        let projects: Vec<TogglProject> = self.send(request).await?;
        info!("length of projects: {}", projects.len());

        Ok(projects
            .into_iter()
            .map(|project| (project.id, project.name))
            .collect())
    }
}

/// 成功以外のステータスの場合に、レスポンスボディを含むエラーを返す。
async fn check_status(response: Response, method: Method) -> Result<Response, TogglApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response
        .text()
        .await
        .map(|text| text.trim().chars().take(MAX_ERROR_BODY_CHARS).collect::<String>())
        .unwrap_or_default();

    Err(TogglApiError {
        status,
        method,
        path,
        body,
    })
}
