use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use log::{debug, info};

use crate::aggregate::aggregate;
use crate::date_range::{resolve_date_range, DateSelector};
use crate::datetime;
use crate::day_split::split_entries_by_day;
use crate::markdown::{format_markdown, FormatOptions, OutputFormat, DEFAULT_EMPTY_MESSAGE};
use crate::summary_entry::{build_summary_entries, needs_project_names};
use crate::toggl::TogglRepository;

/// 集計レポートを出力するための引数。
#[derive(Debug, Default, clap::Args)]
pub struct SummaryArgs {
    #[clap(long, value_name = "DATE", help = "Target date in YYYY-M-D (default: today, local)")]
    pub date: Option<String>,

    #[clap(long, value_name = "DATE", help = "Start date in YYYY-M-D")]
    pub from: Option<String>,

    #[clap(long, value_name = "DATE", help = "End date in YYYY-M-D")]
    pub to: Option<String>,

    #[clap(long, help = "Split output by day when using a date range")]
    pub daily: bool,

    #[clap(long, value_name = "PATH", help = "Write output to file (default: stdout)")]
    pub out: Option<PathBuf>,

    #[clap(
        long,
        value_name = "PATH",
        help = "Config file path (default: <config dir>/toggl-daily-summary/config.json)"
    )]
    pub config: Option<PathBuf>,

    #[clap(long, value_name = "ID", help = "Workspace ID (overrides config/env)")]
    pub workspace: Option<String>,

    #[clap(
        long,
        value_name = "FORMAT",
        default_value = "default",
        help = "Output format: default or detail"
    )]
    pub format: OutputFormat,
}

impl SummaryArgs {
    fn date_selector(&self) -> DateSelector {
        DateSelector {
            date: self.date.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

pub struct SummaryCommand<'a, T: TogglRepository> {
    toggl_client: &'a T,
    workspace_id: &'a str,
}

impl<'a, T: TogglRepository> SummaryCommand<'a, T> {
    /// 新しい`SummaryCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    /// * `workspace_id` - プロジェクト名を取得するワークスペース
    pub fn new(toggl_client: &'a T, workspace_id: &'a str) -> Self {
        Self {
            toggl_client,
            workspace_id,
        }
    }

    /// 指定された期間のtime entryを集計し、Markdown形式のレポートを返す。
    ///
    /// 日付の指定に誤りがある場合は、Toggl APIと通信する前にエラーを返す。
    ///
    /// # Arguments
    ///
    /// * `args` - 集計の引数
    /// * `tz` - 日の境界を決めるタイムゾーン
    pub async fn run<Tz: TimeZone>(&self, args: &SummaryArgs, tz: &Tz) -> Result<String> {
        let range = resolve_date_range(&args.date_selector(), tz, datetime::now())?;
        let start_at = range.start.with_timezone(&Utc);
        let end_at = range.end.with_timezone(&Utc);
        info!(
            "Start at: {}, End at: {}, range: {}",
            start_at, end_at, range.is_range
        );

        let time_entries = self
            .toggl_client
            .read_time_entries(&start_at, &end_at)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        let projects = if needs_project_names(&time_entries) {
            self.toggl_client
                .read_projects(self.workspace_id)
                .await
                .context("Failed to retrieve projects")?
        } else {
            debug!("No project names needed.");
            HashMap::new()
        };

        let mut entries = build_summary_entries(&time_entries, &projects);
        if args.daily {
            entries = split_entries_by_day(&entries, tz);
        }
        let buckets = aggregate(&entries, args.daily, tz);
        debug!("Aggregated into {} bucket(s).", buckets.len());

        Ok(format_markdown(
            &buckets,
            &FormatOptions {
                daily: args.daily,
                range_start: Some(range.start),
                range_end: Some(range.end),
                location: tz.clone(),
                format: args.format,
                empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            },
        ))
    }
}
