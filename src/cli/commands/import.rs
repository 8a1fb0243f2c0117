// importコマンドハンドラー
//
// .envファイルの内容をプロジェクト・環境に取り込みます。
// - ファイルの存在確認と解析（dotenvy）
// - プロジェクトの自動作成（環境は既存のもののみ）
// - 各ペアの設定（作成・更新・再有効化）

use crate::adapters::env_file::read_env_file;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{ensure_scope, render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::models::SetOutcome;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// importコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutput {
    pub file: String,
    pub project: String,
    pub environment: String,
    pub created: usize,
    pub updated: usize,
    pub reactivated: usize,
}

impl ImportOutput {
    /// 取り込んだ変数の総数
    pub fn total(&self) -> usize {
        self.created + self.updated + self.reactivated
    }
}

impl CommandOutput for ImportOutput {
    fn to_text(&self) -> String {
        format!(
            "{} Imported {} environment variables from {} to project '{}' ({} environment)\n  created: {}, updated: {}, reactivated: {}",
            "✓".green(),
            self.total(),
            self.file,
            self.project,
            self.environment,
            self.created,
            self.updated,
            self.reactivated
        )
    }
}

/// importコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ImportCommand {
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 読み込む.envファイル
    pub file: PathBuf,
    /// プロジェクト名
    pub project: String,
    /// 環境名
    pub env: String,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// importコマンドハンドラー
#[derive(Debug, Default)]
pub struct ImportCommandHandler {}

impl ImportCommandHandler {
    /// 新しいImportCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// importコマンドを実行
    ///
    /// ファイルの解析はDB接続より先に行い、不正なファイルでは何も変更しません。
    pub async fn execute(&self, command: &ImportCommand) -> Result<String> {
        let pairs = read_env_file(&command.file)?;

        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let (project, environment) = ensure_scope(&repo, &command.project, &command.env).await?;

        let mut output = ImportOutput {
            file: command.file.display().to_string(),
            project: project.name.clone(),
            environment: environment.name.clone(),
            created: 0,
            updated: 0,
            reactivated: 0,
        };

        for (key, value) in &pairs {
            let (_, outcome) = repo
                .set_env_variable(&project.id, &environment.id, key, value)
                .await
                .with_context(|| format!("Failed to set environment variable '{}'", key))?;
            match outcome {
                SetOutcome::Created => output.created += 1,
                SetOutcome::Updated => output.updated += 1,
                SetOutcome::Reactivated => output.reactivated += 1,
            }
        }

        info!(
            project = %output.project,
            environment = %output.environment,
            count = output.total(),
            "Imported .env file"
        );

        render_output(&output, &command.format)
    }
}
