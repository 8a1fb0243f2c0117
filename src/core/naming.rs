// 名前と既定値
//
// 設定ファイル名や環境変数プレフィックスなど、複数のレイヤーで参照する名前を集約します。

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".envkeeper.yaml";

/// バイナリ名（補完スクリプトのコマンド名）
pub const BINARY_NAME: &str = "envkeeper";

/// 環境変数による上書きのプレフィックス
pub const ENV_PREFIX: &str = "ENVKEEPER";

/// `--env` 省略時の環境名
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// マイグレーション履歴テーブル名
pub const MIGRATIONS_TABLE: &str = "schema_migrations";

/// `ENVKEEPER_DATABASE_<SUFFIX>` 形式の環境変数名
pub fn database_env_var(suffix: &str) -> String {
    format!("{}_DATABASE_{}", ENV_PREFIX, suffix)
}
