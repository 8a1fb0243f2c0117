// 設定ファイル管理
//
// 設定ファイル（YAML形式）の構造と、データベース接続設定の検証・
// 接続文字列への変換を扱います。ファイルI/Oは services::config_loader に置きます。

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// SSL接続モード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslMode {
    Disable,
    #[serde(rename = "prefer")]
    Prefer,
    Require,
    #[serde(rename = "verify-ca")]
    VerifyCa,
    #[serde(rename = "verify-full")]
    VerifyFull,
}

impl std::fmt::Display for SslMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SslMode::Disable => write!(f, "disable"),
            SslMode::Prefer => write!(f, "prefer"),
            SslMode::Require => write!(f, "require"),
            SslMode::VerifyCa => write!(f, "verify-ca"),
            SslMode::VerifyFull => write!(f, "verify-full"),
        }
    }
}

impl std::str::FromStr for SslMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            other => Err(ConfigError::InvalidSslMode {
                value: other.to_string(),
            }),
        }
    }
}

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql", alias = "postgres")]
    PostgreSQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl Dialect {
    /// Dialectに応じたデフォルトポートを返す
    ///
    /// - PostgreSQL: 5432
    /// - SQLite: None（ファイルベースのためポート不要）
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Dialect::PostgreSQL => Some(5432),
            Dialect::SQLite => None,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// データベース接続設定
    #[serde(default)]
    pub database: DatabaseConfig,

    /// マイグレーションディレクトリ
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations_dir: default_migrations_dir(),
        }
    }
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()
    }
}

/// データベース接続設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// データベース方言
    #[serde(default = "default_dialect")]
    pub dialect: Dialect,

    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号（Noneの場合はDialectのデフォルトポートを使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// データベース名（SQLiteの場合はファイルパス）
    #[serde(default = "default_database")]
    pub database: String,

    /// ユーザー名
    #[serde(default = "default_user", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// パスワード
    #[serde(default = "default_password", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// SSL接続モード
    #[serde(default = "default_ssl_mode", skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<SslMode>,

    /// 接続タイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// 最大コネクション数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,

    /// 接続文字列の直接指定（他の項目より優先）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

fn default_dialect() -> Dialect {
    Dialect::PostgreSQL
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "envkeeper".to_string()
}

fn default_user() -> Option<String> {
    Some("postgres".to_string())
}

fn default_password() -> Option<String> {
    Some("postgres".to_string())
}

fn default_ssl_mode() -> Option<SslMode> {
    Some(SslMode::Disable)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            host: default_host(),
            port: None,
            database: default_database(),
            user: default_user(),
            password: default_password(),
            ssl_mode: default_ssl_mode(),
            timeout: None,
            max_connections: None,
            url: None,
        }
    }
}

impl DatabaseConfig {
    /// Dialectに応じた解決済みポート番号を取得
    ///
    /// portがSomeの場合はその値を返し、Noneの場合はDialectのデフォルトポートを返します。
    /// SQLiteの場合は0を返します。
    pub fn resolved_port(&self) -> u16 {
        self.port
            .unwrap_or_else(|| self.dialect.default_port().unwrap_or(0))
    }

    /// Validate database configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_some() {
            return Ok(());
        }
        if self.database.is_empty() {
            return Err(ConfigError::MissingDatabaseName);
        }
        if self.dialect == Dialect::PostgreSQL && self.host.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        Ok(())
    }
}
