// データベースマイグレーターサービス
//
// マイグレーション履歴テーブルの管理とトランザクション制御を担当するサービス。
// 未適用のマイグレーションファイルを1ファイル1トランザクションで順に適用します。

use crate::core::error::{DatabaseError, MigrationError};
use crate::core::migration::{
    calculate_checksum, MigrationFile, MigrationRecord, MigrationReport, MigrationStatus,
};
use crate::core::naming::MIGRATIONS_TABLE;
use chrono::{DateTime, Utc};
use sqlx::{AnyPool, Row};
use std::collections::HashMap;
use std::fs;
use tracing::{debug, info};

/// データベースマイグレーターサービス
///
/// マイグレーション履歴の管理とトランザクション制御を提供します。
#[derive(Debug, Clone, Default)]
pub struct DatabaseMigratorService {}

impl DatabaseMigratorService {
    /// 新しいDatabaseMigratorServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// マイグレーション履歴テーブル作成SQLを生成
    ///
    /// PostgreSQLとSQLiteの両方で同じ定義を使用します。
    pub fn generate_create_migration_table_sql(&self) -> String {
        format!(
            r#"CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
    version VARCHAR(255) PRIMARY KEY,
    checksum VARCHAR(64) NOT NULL,
    applied_at VARCHAR(64) NOT NULL
)"#
        )
    }

    /// マイグレーション履歴テーブルを作成（存在する場合は何もしない）
    pub async fn create_migration_table(&self, pool: &AnyPool) -> Result<(), DatabaseError> {
        let sql = self.generate_create_migration_table_sql();

        sqlx::query(&sql)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::query("failed to create migration history table", &sql, e))?;

        Ok(())
    }

    /// データベースからすべてのマイグレーション記録を取得
    pub async fn get_migrations(
        &self,
        pool: &AnyPool,
    ) -> Result<Vec<MigrationRecord>, DatabaseError> {
        let sql = format!(
            "SELECT version, checksum, applied_at FROM {MIGRATIONS_TABLE} ORDER BY version"
        );

        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DatabaseError::query("failed to load migration history", &sql, e))?;

        rows.iter()
            .map(|row| {
                let version: String = row.try_get("version").map_err(decode_error("version"))?;
                let checksum: String =
                    row.try_get("checksum").map_err(decode_error("checksum"))?;
                let applied_at_str: String =
                    row.try_get("applied_at").map_err(decode_error("applied_at"))?;

                let applied_at = DateTime::parse_from_rfc3339(&applied_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| DatabaseError::Decode {
                        column: "applied_at".to_string(),
                        cause: format!("'{}' is not an RFC3339 timestamp: {}", applied_at_str, e),
                    })?;

                Ok(MigrationRecord {
                    version,
                    checksum,
                    applied_at,
                })
            })
            .collect()
    }

    /// 未適用のマイグレーションを順に適用
    ///
    /// 1. 履歴テーブルを作成（冪等）
    /// 2. 適用済みバージョンを読み込む
    /// 3. 未適用ファイルごとにトランザクションを開き、SQLの実行と履歴の記録をまとめてコミット
    ///
    /// 途中で失敗した場合はそのファイルのトランザクションのみロールバックし、処理を中断します。
    /// それ以前に適用したファイルはコミット済みのまま残ります。
    pub async fn migrate_up(
        &self,
        pool: &AnyPool,
        migrations: &[MigrationFile],
    ) -> Result<MigrationReport, MigrationError> {
        self.create_migration_table(pool).await?;

        let applied: HashMap<String, MigrationRecord> = self
            .get_migrations(pool)
            .await?
            .into_iter()
            .map(|record| (record.version.clone(), record))
            .collect();

        let mut report = MigrationReport::default();

        for migration in migrations {
            if applied.contains_key(&migration.version) {
                debug!(version = %migration.version, "Migration already applied, skipping");
                report.skipped.push(migration.version.clone());
                continue;
            }

            info!(version = %migration.version, "Applying migration");
            self.apply_migration(pool, migration).await?;
            info!(version = %migration.version, "Successfully applied migration");
            report.applied.push(migration.version.clone());
        }

        Ok(report)
    }

    /// 1ファイル分のマイグレーションをトランザクション内で適用
    async fn apply_migration(
        &self,
        pool: &AnyPool,
        migration: &MigrationFile,
    ) -> Result<(), MigrationError> {
        let sql = fs::read_to_string(&migration.path).map_err(|e| MigrationError::Read {
            version: migration.version.clone(),
            cause: e.to_string(),
        })?;

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DatabaseError::transaction("failed to start transaction", e))?;

        // ファイル内の複数ステートメントをそのまま実行する
        // 失敗時は tx のドロップでロールバックされる
        sqlx::raw_sql(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| MigrationError::Execution {
                version: migration.version.clone(),
                cause: e.to_string(),
            })?;

        let record_sql = format!(
            "INSERT INTO {MIGRATIONS_TABLE} (version, checksum, applied_at) VALUES ($1, $2, $3)"
        );
        sqlx::query(&record_sql)
            .bind(&migration.version)
            .bind(calculate_checksum(&sql))
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| MigrationError::Record {
                version: migration.version.clone(),
                cause: e.to_string(),
            })?;

        tx.commit().await.map_err(|e| MigrationError::Record {
            version: migration.version.clone(),
            cause: format!("commit failed: {}", e),
        })?;

        Ok(())
    }

    /// 各マイグレーションファイルの適用状態を取得（適用はしない）
    pub async fn status(
        &self,
        pool: &AnyPool,
        migrations: &[MigrationFile],
    ) -> Result<Vec<MigrationStatus>, MigrationError> {
        self.create_migration_table(pool).await?;

        let applied: HashMap<String, MigrationRecord> = self
            .get_migrations(pool)
            .await?
            .into_iter()
            .map(|record| (record.version.clone(), record))
            .collect();

        migrations
            .iter()
            .map(|migration| {
                let record = applied.get(&migration.version);
                let checksum_mismatch = match record {
                    Some(record) => {
                        let sql = fs::read_to_string(&migration.path).map_err(|e| {
                            MigrationError::Read {
                                version: migration.version.clone(),
                                cause: e.to_string(),
                            }
                        })?;
                        calculate_checksum(&sql) != record.checksum
                    }
                    None => false,
                };

                Ok(MigrationStatus {
                    version: migration.version.clone(),
                    applied_at: record.map(|r| r.applied_at),
                    checksum_mismatch,
                })
            })
            .collect()
    }
}

fn decode_error(column: &'static str) -> impl Fn(sqlx::Error) -> DatabaseError {
    move |e| DatabaseError::Decode {
        column: column.to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_create_migration_table_sql() {
        let service = DatabaseMigratorService::new();
        let sql = service.generate_create_migration_table_sql();

        assert!(sql.contains("CREATE TABLE IF NOT EXISTS schema_migrations"));
        assert!(sql.contains("version"));
        assert!(sql.contains("checksum"));
        assert!(sql.contains("applied_at"));
    }
}
