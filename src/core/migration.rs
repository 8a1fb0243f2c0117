// マイグレーションモデル
//
// ディスク上のマイグレーションファイルと、履歴テーブルに記録された
// 適用済みマイグレーションを表現します。

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// ディスク上のマイグレーションファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// 履歴テーブルに記録するバージョン（ファイル名）
    pub version: String,
    /// ファイルのフルパス
    pub path: PathBuf,
}

impl MigrationFile {
    /// パスからマイグレーションファイルを作成
    ///
    /// バージョンはディレクトリを除いたファイル名です。
    pub fn from_path(path: &Path) -> Self {
        let version = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            version,
            path: path.to_path_buf(),
        }
    }
}

/// 適用済みマイグレーションの記録
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationRecord {
    pub version: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

/// マイグレーション実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// 今回適用したバージョン
    pub applied: Vec<String>,
    /// 適用済みのためスキップしたバージョン
    pub skipped: Vec<String>,
}

impl MigrationReport {
    /// 何も適用しなかったか
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// マイグレーションファイルごとの適用状態
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub version: String,
    pub applied_at: Option<DateTime<Utc>>,
    /// 記録済みチェックサムとファイル内容が一致しない
    pub checksum_mismatch: bool,
}

impl MigrationStatus {
    /// 適用済みか
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// SQLテキストのSHA-256チェックサムを計算
pub fn calculate_checksum(sql: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sql.as_bytes());
    format!("{:x}", hasher.finalize())
}
