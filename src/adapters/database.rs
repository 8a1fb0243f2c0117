// データベース接続アダプター
//
// SQLxのAnyドライバーを使用したデータベース接続の管理を行います。
// PostgreSQLとSQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::{build_connection_string, redact_connection_string};
use crate::core::config::DatabaseConfig;
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::sync::Once;
use std::time::Duration;
use tracing::debug;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

static INSTALL_DRIVERS: Once = Once::new();

/// Anyドライバーに組み込みドライバーを登録（複数回呼んでも一度だけ実行）
pub fn install_drivers() {
    INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);
}

/// データベース接続サービス
///
/// データベース接続プールの初期化と管理を行います。
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService {}

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self {}
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `config` - データベース設定
    ///
    /// # Returns
    ///
    /// 接続プールまたはエラー
    pub async fn create_pool(&self, config: &DatabaseConfig) -> Result<AnyPool, DatabaseError> {
        install_drivers();

        let connection_string = build_connection_string(config);
        debug!(
            url = %redact_connection_string(&connection_string),
            "Connecting to database"
        );

        self.create_pool_options(config)
            .connect(&connection_string)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!("failed to connect to {} database", config.dialect),
                cause: e.to_string(),
            })
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, pool: &AnyPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Connection {
                message: "connection test failed".to_string(),
                cause: e.to_string(),
            })
    }

    /// 設定に応じたプールオプションを作成
    pub fn create_pool_options(&self, config: &DatabaseConfig) -> PoolOptions<Any> {
        let timeout = config.timeout.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS);
        PoolOptions::new()
            .max_connections(config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
            .acquire_timeout(Duration::from_secs(timeout))
    }

    /// 接続プールを閉じる
    pub async fn close_pool(&self, pool: AnyPool) {
        pool.close().await;
    }
}
