// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、KeyValueError, RepositoryError, DatabaseError,
// MigrationError, ConfigError を定義します。

use std::path::PathBuf;
use thiserror::Error;

/// `key=value` 形式の解析エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyValueError {
    /// `=` を含まない入力
    #[error("invalid format: {input} (expected key=value)")]
    InvalidFormat {
        /// 元の入力文字列
        input: String,
    },

    /// キーが空
    #[error("invalid format: {input} (key must not be empty)")]
    EmptyKey {
        /// 元の入力文字列
        input: String,
    },
}

/// リポジトリ操作の対象エンティティ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Project,
    Environment,
    EnvVariable,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Project => write!(f, "project"),
            Entity::Environment => write!(f, "environment"),
            Entity::EnvVariable => write!(f, "environment variable"),
        }
    }
}

/// リポジトリエラー
///
/// 有効な行が見つからない、あるいは有効な行と名前が重複する場合を区別します。
/// それ以外のデータベースエラーは文脈付きでラップするのみです。
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Not found
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// 対象エンティティ
        entity: Entity,
        /// 検索キー（名前・ID・変数キー）
        key: String,
    },

    /// Already exists
    #[error("{entity} with name '{name}' already exists")]
    AlreadyExists {
        /// 対象エンティティ
        entity: Entity,
        /// 重複した名前
        name: String,
    },

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl RepositoryError {
    /// 未検出エラーかどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// 重複エラーかどうか
    pub fn is_already_exists(&self) -> bool {
        matches!(self, RepositoryError::AlreadyExists { .. })
    }

    pub(crate) fn not_found(entity: Entity, key: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn already_exists(entity: Entity, name: impl Into<String>) -> Self {
        RepositoryError::AlreadyExists {
            entity,
            name: name.into(),
        }
    }
}

/// データベースエラー
///
/// データベース操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },

    /// Transaction error
    #[error("Transaction error: {message}")]
    Transaction {
        /// エラーメッセージ
        message: String,
    },

    /// Row decode error
    #[error("Failed to decode column '{column}': {cause}")]
    Decode {
        /// カラム名
        column: String,
        /// エラー原因
        cause: String,
    },
}

impl DatabaseError {
    pub(crate) fn query(message: impl Into<String>, sql: &str, cause: sqlx::Error) -> Self {
        DatabaseError::Query {
            message: format!("{}: {}", message.into(), cause),
            sql: Some(sql.to_string()),
        }
    }

    pub(crate) fn transaction(message: impl Into<String>, cause: sqlx::Error) -> Self {
        DatabaseError::Transaction {
            message: format!("{}: {}", message.into(), cause),
        }
    }
}

/// マイグレーションエラー
#[derive(Debug, Error)]
pub enum MigrationError {
    /// マイグレーションディレクトリの走査失敗
    #[error("Failed to read migrations directory {path:?}: {cause}")]
    Discovery {
        /// ディレクトリパス
        path: PathBuf,
        /// エラー原因
        cause: String,
    },

    /// マイグレーションファイルの読み込み失敗
    #[error("Failed to read migration file {version}: {cause}")]
    Read {
        /// ファイル名
        version: String,
        /// エラー原因
        cause: String,
    },

    /// マイグレーションSQLの実行失敗
    #[error("Failed to execute migration {version}: {cause}")]
    Execution {
        /// ファイル名
        version: String,
        /// エラー原因
        cause: String,
    },

    /// 履歴テーブルの操作失敗
    #[error("Failed to record migration {version}: {cause}")]
    Record {
        /// ファイル名
        version: String,
        /// エラー原因
        cause: String,
    },

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl MigrationError {
    /// 失敗したマイグレーションのファイル名を取得
    pub fn version(&self) -> Option<&str> {
        match self {
            MigrationError::Read { version, .. }
            | MigrationError::Execution { version, .. }
            | MigrationError::Record { version, .. } => Some(version),
            MigrationError::Discovery { .. } | MigrationError::Database(_) => None,
        }
    }
}

/// 設定エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// データベース名未指定
    #[error("Database name is not specified")]
    MissingDatabaseName,

    /// ホスト未指定
    #[error("Database host is not specified")]
    MissingHost,

    /// 不正なSSLモード
    #[error("Invalid ssl mode '{value}'. Expected one of: disable, prefer, require, verify-ca, verify-full")]
    InvalidSslMode {
        /// 指定された値
        value: String,
    },

    /// 不正なポート番号
    #[error("Invalid port '{value}'")]
    InvalidPort {
        /// 指定された値
        value: String,
    },
}
