// コマンド共通コンテキスト
//
// 設定ファイル読み込みやDB接続の重複をCLI層で集約する。

use crate::adapters::database::DatabaseConnectionService;
use crate::adapters::repository::EnvRepository;
use crate::core::config::{Config, DatabaseConfig};
use crate::services::config_loader::ConfigLoader;
use crate::services::database_config_resolver::DatabaseConfigResolver;
use anyhow::{Context, Result};
use sqlx::AnyPool;
use std::path::PathBuf;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// 読み込んだ設定ファイル（デフォルト使用時はNone）
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl CommandContext {
    /// 既定の探索順で設定を読み込んでコンテキストを作成
    pub fn load() -> Result<Self> {
        Self::load_with_config(None)
    }

    /// カスタム設定ファイルパスを指定してコンテキストを作成
    pub fn load_with_config(custom_config_path: Option<PathBuf>) -> Result<Self> {
        let loaded = ConfigLoader::load(custom_config_path.as_deref())
            .with_context(|| "Failed to load configuration")?;

        Ok(Self {
            config_path: loaded.source,
            config: loaded.config,
        })
    }

    /// 環境変数上書き込みのデータベース設定を取得
    pub fn database_config(&self) -> Result<DatabaseConfig> {
        let config = DatabaseConfigResolver::apply_env_overrides(&self.config.database)
            .with_context(|| "Invalid database settings in environment")?;
        config
            .validate()
            .with_context(|| "Invalid database configuration")?;
        Ok(config)
    }

    /// マイグレーションディレクトリ（カスタム指定があれば優先）
    pub fn migrations_dir(&self, custom_dir: Option<&PathBuf>) -> PathBuf {
        custom_dir
            .cloned()
            .unwrap_or_else(|| self.config.migrations_dir.clone())
    }

    /// 接続プールを作成
    pub async fn connect_pool(&self) -> Result<AnyPool> {
        let db_config = self.database_config()?;
        let db_service = DatabaseConnectionService::new();
        db_service
            .create_pool(&db_config)
            .await
            .with_context(|| "Failed to connect to database")
    }

    /// 接続済みのリポジトリを作成
    pub async fn connect_repository(&self) -> Result<EnvRepository> {
        Ok(EnvRepository::new(self.connect_pool().await?))
    }
}
