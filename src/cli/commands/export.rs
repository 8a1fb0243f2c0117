// exportコマンドハンドラー
//
// プロジェクト・環境の有効な変数を.envファイルに書き出します。
// 既存ファイルは確認の上で上書きし、`--force` 指定時は確認を省略します。

use crate::adapters::env_file::write_env_file;
use crate::cli::command_context::CommandContext;
use crate::cli::commands::{confirm, render_output, resolve_scope, CommandOutput};
use crate::cli::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// exportコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub file: String,
    pub project: String,
    pub environment: String,
    /// 書き出したキー（ソート済み）
    pub keys: Vec<String>,
    /// 上書き確認で中止された場合true
    pub cancelled: bool,
}

impl CommandOutput for ExportOutput {
    fn to_text(&self) -> String {
        if self.cancelled {
            return "Export cancelled".yellow().to_string();
        }
        format!(
            "{} Exported {} environment variables from project '{}' ({} environment) to {}",
            "✓".green(),
            self.keys.len(),
            self.project,
            self.environment,
            self.file
        )
    }
}

/// exportコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ExportCommand {
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// 出力先.envファイル
    pub file: PathBuf,
    /// プロジェクト名
    pub project: String,
    /// 環境名
    pub env: String,
    /// 既存ファイルを確認なしで上書き
    pub force: bool,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// exportコマンドハンドラー
#[derive(Debug, Default)]
pub struct ExportCommandHandler {}

impl ExportCommandHandler {
    /// 新しいExportCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// exportコマンドを実行
    pub async fn execute(&self, command: &ExportCommand) -> Result<String> {
        let file = command.file.display().to_string();

        // 上書き確認
        if command.file.exists() && !command.force {
            let overwrite = confirm(&format!("File {} already exists. Overwrite?", file))?;
            if !overwrite {
                let output = ExportOutput {
                    file,
                    project: command.project.clone(),
                    environment: command.env.clone(),
                    keys: Vec::new(),
                    cancelled: true,
                };
                return render_output(&output, &command.format);
            }
        }

        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let (project, environment) = resolve_scope(&repo, &command.project, &command.env).await?;

        let mut variables = repo.get_env_variables(&project.id, &environment.id).await?;
        variables.sort_by(|a, b| a.key.cmp(&b.key));

        write_env_file(
            &command.file,
            variables.iter().map(|v| (v.key.as_str(), v.value.as_str())),
        )?;

        info!(
            project = %project.name,
            environment = %environment.name,
            count = variables.len(),
            "Exported .env file"
        );

        let output = ExportOutput {
            file,
            project: project.name,
            environment: environment.name,
            keys: variables.into_iter().map(|v| v.key).collect(),
            cancelled: false,
        };

        render_output(&output, &command.format)
    }
}
