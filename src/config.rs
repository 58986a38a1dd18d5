use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::Deserialize;

use crate::toggl::DEFAULT_API_URL;

/// 設定ファイルを配置するディレクトリ名。
const APP_NAME: &str = "toggl-daily-summary";

const ENV_API_TOKEN: &str = "TOGGL_API_TOKEN";
const ENV_WORKSPACE_ID: &str = "TOGGL_WORKSPACE_ID";
const ENV_BASE_URL: &str = "TOGGL_BASE_URL";

/// 設定ファイルの内容。
///
/// 設定ファイルはJSON形式で、全ての項目は省略できる。
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_token: String,
    pub workspace_id: String,
    pub base_url: String,
}

/// デフォルトの設定ファイルのパスを返す。
pub fn default_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to resolve user config directory")?;
    Ok(config_dir.join(APP_NAME).join("config.json"))
}

impl Config {
    /// 設定ファイルを読み込む。
    ///
    /// パスが指定されていない場合はデフォルトのパスを利用する。
    /// ファイルが存在しない場合は空の設定を返す。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_path()?,
        };

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Config file not found: {}", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))
            }
        };
        info!("Load config file: {}", path.display());

        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// 環境変数の値で設定を上書きする。
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// `lookup`が返す空でない値で設定を上書きする。
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let targets = [
            (ENV_API_TOKEN, &mut self.api_token),
            (ENV_WORKSPACE_ID, &mut self.workspace_id),
            (ENV_BASE_URL, &mut self.base_url),
        ];
        for (key, field) in targets {
            if let Some(value) = lookup(key).filter(|value| !value.is_empty()) {
                debug!("Override config with {}", key);
                *field = value;
            }
        }
    }

    /// Toggl APIとの通信に必要な項目が設定されていることを確認する。
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            bail!(
                "missing API token: set {} or config api_token",
                ENV_API_TOKEN
            );
        }
        if self.workspace_id.trim().is_empty() {
            bail!(
                "missing workspace ID: set {} or config workspace_id",
                ENV_WORKSPACE_ID
            );
        }
        Ok(())
    }

    /// Toggl APIのベースURLを返す。
    pub fn api_url(&self) -> &str {
        if self.base_url.trim().is_empty() {
            DEFAULT_API_URL
        } else {
            self.base_url.trim()
        }
    }
}
