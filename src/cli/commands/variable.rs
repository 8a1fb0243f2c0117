// 変数関連コマンドハンドラー
//
// set / get / delete / list と、変数を注入してコマンドを実行する list --run を扱います。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{ensure_scope, render_output, resolve_scope, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::models::{EnvVariable, SetOutcome};
use crate::services::key_value::parse_key_value;
use crate::services::process_runner::run_with_env;
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// 設定する変数の指定方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableInput {
    /// `--key` と `--value`
    Explicit { key: String, value: String },
    /// 位置引数の `KEY=VALUE`
    Pair(String),
}

impl VariableInput {
    /// (key, value) に解決
    pub fn resolve(&self) -> Result<(String, String)> {
        match self {
            VariableInput::Explicit { key, value } => {
                if key.trim().is_empty() {
                    return Err(anyhow!("--key must not be empty"));
                }
                Ok((key.clone(), value.clone()))
            }
            VariableInput::Pair(pair) => Ok(parse_key_value(pair)?),
        }
    }
}

/// set の出力
#[derive(Debug, Clone, Serialize)]
pub struct SetOutput {
    pub project: String,
    pub environment: String,
    pub key: String,
    pub value: String,
    pub outcome: SetOutcome,
}

impl CommandOutput for SetOutput {
    fn to_text(&self) -> String {
        format!(
            "{} Set {}={} for project '{}' ({} environment) [{}]",
            "✓".green(),
            self.key,
            self.value,
            self.project,
            self.environment,
            self.outcome
        )
    }
}

/// get の出力
#[derive(Debug, Clone, Serialize)]
pub struct GetOutput {
    pub key: String,
    pub value: String,
}

impl CommandOutput for GetOutput {
    // パイプで渡せるよう値のみを出力
    fn to_text(&self) -> String {
        self.value.clone()
    }
}

/// delete の出力
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutput {
    pub project: String,
    pub environment: String,
    pub key: String,
}

impl CommandOutput for DeleteOutput {
    fn to_text(&self) -> String {
        format!(
            "{} Deleted environment variable '{}' from project '{}' ({} environment)",
            "✓".green(),
            self.key,
            self.project,
            self.environment
        )
    }
}

/// list の1行
#[derive(Debug, Clone, Serialize)]
pub struct VariableEntry {
    pub key: String,
    pub value: String,
}

/// list の出力
#[derive(Debug, Clone, Serialize)]
pub struct VariableListOutput {
    pub project: String,
    pub environment: String,
    pub variables: Vec<VariableEntry>,
}

impl CommandOutput for VariableListOutput {
    fn to_text(&self) -> String {
        if self.variables.is_empty() {
            return format!(
                "No environment variables found for project '{}' ({} environment)",
                self.project, self.environment
            );
        }

        let mut lines = vec![
            format!(
                "Environment variables for project '{}' ({} environment):",
                self.project, self.environment
            )
            .bold()
            .to_string(),
            "=================================================".to_string(),
        ];
        for variable in &self.variables {
            lines.push(format!("{}={}", variable.key, variable.value));
        }
        lines.join("\n")
    }
}

/// set の入力パラメータ
#[derive(Debug, Clone)]
pub struct SetCommand {
    pub config_path: Option<PathBuf>,
    pub project: String,
    pub env: String,
    pub input: VariableInput,
    pub format: OutputFormat,
}

/// get / delete の入力パラメータ
#[derive(Debug, Clone)]
pub struct KeyCommand {
    pub config_path: Option<PathBuf>,
    pub project: String,
    pub env: String,
    pub key: String,
    pub format: OutputFormat,
}

/// list の入力パラメータ
#[derive(Debug, Clone)]
pub struct ListCommand {
    pub config_path: Option<PathBuf>,
    pub project: String,
    pub env: String,
    /// キーの部分一致フィルタ
    pub filter: Option<String>,
    pub format: OutputFormat,
}

/// list --run の入力パラメータ
#[derive(Debug, Clone)]
pub struct RunCommand {
    pub config_path: Option<PathBuf>,
    pub project: String,
    pub env: String,
    pub filter: Option<String>,
    /// シェルに渡すコマンドライン
    pub command_line: String,
}

/// 変数関連コマンドハンドラー
#[derive(Debug, Default)]
pub struct VariableCommandHandler {}

impl VariableCommandHandler {
    /// 新しいVariableCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 変数を設定（プロジェクトは存在しなければ作成）
    pub async fn set(&self, command: &SetCommand) -> Result<String> {
        let (key, value) = command.input.resolve()?;

        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let (project, environment) = ensure_scope(&repo, &command.project, &command.env).await?;

        let (variable, outcome) = repo
            .set_env_variable(&project.id, &environment.id, &key, &value)
            .await
            .with_context(|| format!("Failed to set environment variable '{}'", key))?;

        info!(project = %project.name, environment = %environment.name, key = %key, %outcome, "Set variable");

        render_output(
            &SetOutput {
                project: project.name,
                environment: environment.name,
                key: variable.key,
                value: variable.value,
                outcome,
            },
            &command.format,
        )
    }

    /// 変数の値を取得
    pub async fn get(&self, command: &KeyCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let (project, environment) = resolve_scope(&repo, &command.project, &command.env).await?;

        let variable = repo
            .get_env_variable(&project.id, &environment.id, &command.key)
            .await
            .with_context(|| format!("Failed to get environment variable '{}'", command.key))?;

        render_output(
            &GetOutput {
                key: variable.key,
                value: variable.value,
            },
            &command.format,
        )
    }

    /// 変数を論理削除
    pub async fn delete(&self, command: &KeyCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let (project, environment) = resolve_scope(&repo, &command.project, &command.env).await?;

        repo.delete_env_variable(&project.id, &environment.id, &command.key)
            .await
            .with_context(|| {
                format!("Failed to delete environment variable '{}'", command.key)
            })?;

        info!(project = %project.name, environment = %environment.name, key = %command.key, "Deleted variable");

        render_output(
            &DeleteOutput {
                project: project.name,
                environment: environment.name,
                key: command.key.clone(),
            },
            &command.format,
        )
    }

    /// 変数を一覧表示
    pub async fn list(&self, command: &ListCommand) -> Result<String> {
        let variables = self
            .load_variables(
                command.config_path.clone(),
                &command.project,
                &command.env,
                command.filter.as_deref(),
            )
            .await?;

        render_output(
            &VariableListOutput {
                project: command.project.clone(),
                environment: command.env.clone(),
                variables: variables
                    .into_iter()
                    .map(|v| VariableEntry {
                        key: v.key,
                        value: v.value,
                    })
                    .collect(),
            },
            &command.format,
        )
    }

    /// 変数を注入してコマンドを実行し、子プロセスの終了コードを返す
    pub async fn run(&self, command: &RunCommand) -> Result<i32> {
        let variables = self
            .load_variables(
                command.config_path.clone(),
                &command.project,
                &command.env,
                command.filter.as_deref(),
            )
            .await?;

        debug!(
            project = %command.project,
            environment = %command.env,
            count = variables.len(),
            "Running command with stored variables"
        );

        let command_line = command.command_line.clone();
        let code = tokio::task::spawn_blocking(move || {
            run_with_env(
                &command_line,
                variables.iter().map(|v| (v.key.as_str(), v.value.as_str())),
            )
        })
        .await
        .with_context(|| "Command runner task failed")??;

        Ok(code)
    }

    async fn load_variables(
        &self,
        config_path: Option<PathBuf>,
        project: &str,
        env: &str,
        filter: Option<&str>,
    ) -> Result<Vec<EnvVariable>> {
        let context = CommandContext::load_with_config(config_path)?;
        let repo = context.connect_repository().await?;

        let (project, environment) = resolve_scope(&repo, project, env).await?;

        let variables = match filter {
            Some(pattern) => repo
                .search_env_variables(&project.id, &environment.id, pattern)
                .await,
            None => repo.get_env_variables(&project.id, &environment.id).await,
        }
        .with_context(|| "Failed to list environment variables")?;

        // 子プロセスの実行中にプールを保持しない
        repo.pool().close().await;

        Ok(variables)
    }
}
