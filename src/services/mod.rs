// Services Layer
// ドメインロジックを実行するサービス層

pub mod config_loader;
pub mod database_config_resolver;
pub mod key_value;
pub mod migration_loader;
pub mod process_runner;
