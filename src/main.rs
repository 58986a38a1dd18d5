use std::io;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

mod aggregate;
mod config;
mod date_range;
mod datetime;
mod day_split;
mod markdown;
mod output;
mod summary_command;
mod summary_entry;
mod time_entry;
mod toggl;

use config::Config;
use output::write_report;
use summary_command::{SummaryArgs, SummaryCommand};
use toggl::TogglClient;

/// Toggl Trackのtime entryを集計し、Markdown形式で出力するCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- --date 2026-1-10
/// $ cargo run -- --from 2026-01-05 --to 2026-01-09 --daily --format detail
/// ```
#[derive(Debug, Parser)]
#[clap(name = "toggl-daily-summary", version, about)]
struct Args {
    #[clap(short, long, help = "Print debug logs to stderr")]
    verbose: bool,

    #[clap(flatten)]
    summary: SummaryArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let mut config =
        Config::load(args.summary.config.as_deref()).context("Failed to load config")?;
    config.apply_env();
    if let Some(workspace) = args
        .summary
        .workspace
        .as_deref()
        .map(str::trim)
        .filter(|workspace| !workspace.is_empty())
    {
        config.workspace_id = workspace.to_string();
    }
    config.validate()?;

    let client = TogglClient::new(config.api_url(), &config.api_token);
    let command = SummaryCommand::new(&client, &config.workspace_id);
    let report = command.run(&args.summary, &Local).await?;

    let mut stdout = io::stdout().lock();
    write_report(args.summary.out.as_deref(), &report, &mut stdout)?;

    Ok(())
}

/// ログの出力設定を行う。
///
/// stdoutはレポートの出力に利用するため、ログはstderrに出力する。
fn setup_logger(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%:z"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Args;
    use crate::markdown::OutputFormat;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    /// 日付の引数のヘルプに書式が含まれることを確認する。
    #[test]
    fn test_date_flags_usage_mentions_ymd() {
        let command = Args::command();
        for name in ["date", "from", "to"] {
            let arg = command
                .get_arguments()
                .find(|arg| arg.get_id() == name)
                .unwrap_or_else(|| panic!("missing flag: {}", name));
            let help = arg.get_help().unwrap_or_default();
            assert!(help.contains("YYYY-M-D"), "{}: {}", name, help);
        }
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "toggl-daily-summary",
            "--from",
            "2026-1-5",
            "--to",
            "2026-1-7",
            "--daily",
            "--format",
            "detail",
            "--out",
            "summary.md",
        ])
        .unwrap();

        assert_eq!(args.summary.from.as_deref(), Some("2026-1-5"));
        assert!(args.summary.daily);
        assert_eq!(args.summary.format, OutputFormat::Detail);
        assert!(args.summary.out.is_some());
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_args_default_format() {
        let args = Args::try_parse_from(["toggl-daily-summary"]).unwrap();

        assert_eq!(args.summary.format, OutputFormat::Default);
        assert!(args.summary.date.is_none());
    }

    #[test]
    fn test_parse_args_invalid_format() {
        assert!(Args::try_parse_from(["toggl-daily-summary", "--format", "weird"]).is_err());
    }
}
