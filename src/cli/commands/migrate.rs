// migrateコマンドハンドラー
//
// マイグレーションディレクトリの.sqlファイルを探索し、未適用のものを順に適用します。
// `--status` 指定時は適用せず、各ファイルの状態を表示します。

use crate::adapters::database_migrator::DatabaseMigratorService;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::migration::{MigrationReport, MigrationStatus};
use crate::services::migration_loader::MigrationLoader;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// migrate の出力
#[derive(Debug, Clone, Serialize)]
pub struct MigrateOutput {
    pub directory: String,
    #[serde(flatten)]
    pub report: MigrationReport,
}

impl CommandOutput for MigrateOutput {
    fn to_text(&self) -> String {
        if self.report.is_noop() {
            return "No pending migrations. Database is up to date.".to_string();
        }

        let mut lines = Vec::new();
        for version in &self.report.applied {
            lines.push(format!("  {} {}", "✓".green(), version));
        }
        lines.push(format!(
            "Applied {} migration(s), {} already applied",
            self.report.applied.len(),
            self.report.skipped.len()
        ));
        lines.join("\n")
    }
}

/// migrate --status の出力
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatusOutput {
    pub directory: String,
    pub migrations: Vec<MigrationStatus>,
}

impl CommandOutput for MigrationStatusOutput {
    fn to_text(&self) -> String {
        if self.migrations.is_empty() {
            return format!("No migration files found in {}", self.directory);
        }

        let mut lines = vec![format!("Migrations in {}:", self.directory).bold().to_string()];
        for status in &self.migrations {
            let state = match status.applied_at {
                Some(applied_at) => format!(
                    "{} {}",
                    "applied".green(),
                    applied_at.format("%Y-%m-%d %H:%M:%S")
                ),
                None => "pending".yellow().to_string(),
            };
            let mut line = format!("  {:<40} {}", status.version, state);
            if status.checksum_mismatch {
                line.push_str(&format!(" {}", "(modified since applied)".red()));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// migrateコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct MigrateCommand {
    pub config_path: Option<PathBuf>,
    /// マイグレーションディレクトリ（Noneの場合は設定値）
    pub dir: Option<PathBuf>,
    /// 適用せず状態のみ表示
    pub status: bool,
    pub format: OutputFormat,
}

/// migrateコマンドハンドラー
#[derive(Debug, Default)]
pub struct MigrateCommandHandler {}

impl MigrateCommandHandler {
    /// 新しいMigrateCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// migrateコマンドを実行
    pub async fn execute(&self, command: &MigrateCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let dir = context.migrations_dir(command.dir.as_ref());

        let migrations = MigrationLoader::discover(&dir)
            .with_context(|| "Failed to load migration files")?;

        let pool = context.connect_pool().await?;
        let migrator = DatabaseMigratorService::new();
        let directory = dir.display().to_string();

        if command.status {
            let migrations = migrator
                .status(&pool, &migrations)
                .await
                .with_context(|| "Failed to read migration status")?;
            for status in migrations.iter().filter(|s| s.checksum_mismatch) {
                warn!(version = %status.version, "Migration file changed after it was applied");
            }
            pool.close().await;
            return render_output(
                &MigrationStatusOutput {
                    directory,
                    migrations,
                },
                &command.format,
            );
        }

        let result = migrator.migrate_up(&pool, &migrations).await;
        pool.close().await;
        let report = result.with_context(|| "Migration failed")?;

        render_output(&MigrateOutput { directory, report }, &command.format)
    }
}
