// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。
// 探索順: `--config` 指定 → カレントディレクトリ → ホームディレクトリ。
// いずれも存在しなければデフォルト設定を使用します。

use crate::core::config::Config;
use crate::core::naming::CONFIG_FILE;
use anyhow::{anyhow, Context, Result};
use directories::UserDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 読み込み結果
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// 解決済みの設定
    pub config: Config,
    /// 実際に読み込んだ設定ファイル（デフォルト使用時はNone）
    pub source: Option<PathBuf>,
}

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_saphyr::from_str(&content).with_context(|| "Failed to parse config file")
    }

    /// 設定を探索して読み込む
    ///
    /// `custom_path` が `.env` で終わる場合は、その内容をプロセス環境変数に読み込み
    /// （既存の環境変数は上書きしない）、YAMLは通常の探索順で探します。
    pub fn load(custom_path: Option<&Path>) -> Result<LoadedConfig> {
        let mut yaml_path = custom_path;

        if let Some(path) = custom_path.filter(|p| is_dotenv_path(p)) {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load .env file: {:?}", path))?;
            debug!(path = ?path, "Loaded environment from .env file");
            yaml_path = None;
        }

        if let Some(path) = yaml_path {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {:?}", path));
            }
            let config = Self::from_file(path)?;
            return Ok(LoadedConfig {
                config,
                source: Some(path.to_path_buf()),
            });
        }

        for candidate in Self::candidate_paths() {
            if candidate.is_file() {
                debug!(path = ?candidate, "Using config file");
                let config = Self::from_file(&candidate)?;
                return Ok(LoadedConfig {
                    config,
                    source: Some(candidate),
                });
            }
        }

        debug!("No config file found, using defaults");
        Ok(LoadedConfig {
            config: Config::default(),
            source: None,
        })
    }

    /// 暗黙の設定ファイル探索パス
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(user_dirs) = UserDirs::new() {
            paths.push(user_dirs.home_dir().join(CONFIG_FILE));
        }
        paths
    }
}

fn is_dotenv_path(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".env")
}
