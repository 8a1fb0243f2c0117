// envサブコマンドハンドラー
//
// 環境の一覧表示と作成を扱います。環境は全プロジェクトで共有されます。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::models::Environment;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// env list の出力
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentListOutput {
    pub environments: Vec<Environment>,
}

impl CommandOutput for EnvironmentListOutput {
    fn to_text(&self) -> String {
        if self.environments.is_empty() {
            return "No environments found".to_string();
        }

        let mut lines = vec!["Environments:".bold().to_string(), "============".to_string()];
        for env in &self.environments {
            lines.push(format!("- {}: {}", env.name.cyan(), env.description));
        }
        lines.join("\n")
    }
}

/// env create の出力
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentCreateOutput {
    pub environment: Environment,
}

impl CommandOutput for EnvironmentCreateOutput {
    fn to_text(&self) -> String {
        format!("{} Created environment '{}'", "✓".green(), self.environment.name)
    }
}

/// env list の入力パラメータ
#[derive(Debug, Clone)]
pub struct EnvListCommand {
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
}

/// env create の入力パラメータ
#[derive(Debug, Clone)]
pub struct EnvCreateCommand {
    pub config_path: Option<PathBuf>,
    pub name: String,
    pub description: String,
    pub format: OutputFormat,
}

/// envサブコマンドハンドラー
#[derive(Debug, Default)]
pub struct EnvironmentCommandHandler {}

impl EnvironmentCommandHandler {
    /// 新しいEnvironmentCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 環境を名前順に一覧表示
    pub async fn list(&self, command: &EnvListCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let environments = repo
            .get_all_environments()
            .await
            .with_context(|| "Failed to list environments")?;

        render_output(&EnvironmentListOutput { environments }, &command.format)
    }

    /// 環境を作成
    pub async fn create(&self, command: &EnvCreateCommand) -> Result<String> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Environment name must not be empty"));
        }

        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let environment = repo
            .create_environment(name, &command.description)
            .await
            .with_context(|| format!("Failed to create environment '{}'", name))?;

        info!(environment = %environment.name, "Created environment");

        render_output(&EnvironmentCreateOutput { environment }, &command.format)
    }
}
