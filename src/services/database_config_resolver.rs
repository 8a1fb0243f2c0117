// データベース設定の解決サービス
//
// 環境変数による上書きをCLI/サービス層で扱い、coreは純粋な構造体に保つ。

use crate::core::config::{DatabaseConfig, SslMode};
use crate::core::error::ConfigError;
use crate::core::naming::database_env_var;

/// 接続文字列全体を上書きする環境変数名
pub fn database_url_var() -> String {
    database_env_var("URL")
}

/// データベース設定の解決ユーティリティ
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfigResolver;

impl DatabaseConfigResolver {
    /// プロセス環境変数による上書きを適用
    pub fn apply_env_overrides(base: &DatabaseConfig) -> Result<DatabaseConfig, ConfigError> {
        Self::apply_overrides_with(base, |name| std::env::var(name).ok())
    }

    /// 任意の参照関数による上書きを適用
    ///
    /// 各項目は `DB_HOST` 形式を優先し、なければ `ENVKEEPER_DATABASE_HOST` 形式を参照します。
    /// 項目: HOST, PORT, USER, PASSWORD, NAME, SSLMODE。
    /// `ENVKEEPER_DATABASE_URL` は接続文字列全体を置き換えます。
    pub fn apply_overrides_with<F>(
        base: &DatabaseConfig,
        lookup: F,
    ) -> Result<DatabaseConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let setting = |suffix: &str| {
            lookup(&format!("DB_{}", suffix)).or_else(|| lookup(&database_env_var(suffix)))
        };
        let mut config = base.clone();

        if let Some(host) = setting("HOST") {
            config.host = host;
        }
        if let Some(port) = setting("PORT") {
            let port_num = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { value: port })?;
            config.port = Some(port_num);
        }
        if let Some(user) = setting("USER") {
            config.user = Some(user);
        }
        if let Some(password) = setting("PASSWORD") {
            config.password = Some(password);
        }
        if let Some(database) = setting("NAME") {
            config.database = database;
        }
        if let Some(ssl_mode) = setting("SSLMODE") {
            config.ssl_mode = Some(ssl_mode.parse::<SslMode>()?);
        }
        if let Some(url) = lookup(&database_url_var()) {
            config.url = Some(url);
        }

        Ok(config)
    }
}
