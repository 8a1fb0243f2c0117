// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod environment;
pub mod export;
pub mod import;
pub mod migrate;
pub mod project;
pub mod variable;

use crate::adapters::repository::EnvRepository;
use crate::cli::OutputFormat;
use crate::core::models::{Environment, Project};
use anyhow::{anyhow, Context, Result};
use inquire::{Confirm, InquireError};
use serde::Serialize;

/// 自動作成したプロジェクトの説明
pub(crate) const AUTO_PROJECT_DESCRIPTION: &str = "";

/// コマンド出力
///
/// テキスト表現と、`--format json` 用のシリアライズを両方提供します。
pub trait CommandOutput: Serialize {
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じて文字列化
pub fn render_output<T: CommandOutput>(output: &T, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}

/// 確認プロンプトを表示
///
/// 端末でない場合はエラーとし、`--force` の指定を促します。
pub(crate) fn confirm(message: &str) -> Result<bool> {
    match Confirm::new(message).with_default(false).prompt() {
        Ok(answer) => Ok(answer),
        Err(InquireError::NotTTY) => Err(anyhow!(
            "Cannot ask for confirmation without a terminal. Use --force to proceed."
        )),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
            Ok(false)
        }
        Err(e) => Err(e).with_context(|| "Failed to read confirmation"),
    }
}

/// 既存のプロジェクトと環境を解決
pub(crate) async fn resolve_scope(
    repo: &EnvRepository,
    project: &str,
    env: &str,
) -> Result<(Project, Environment)> {
    let project = repo
        .get_project_by_name(project)
        .await
        .with_context(|| format!("Failed to resolve project '{}'", project))?;
    let environment = resolve_environment(repo, env).await?;
    Ok((project, environment))
}

/// 環境を解決し、プロジェクトは存在しなければ作成
pub(crate) async fn ensure_scope(
    repo: &EnvRepository,
    project: &str,
    env: &str,
) -> Result<(Project, Environment)> {
    let environment = resolve_environment(repo, env).await?;
    let project = repo
        .get_or_create_project(project, AUTO_PROJECT_DESCRIPTION)
        .await
        .with_context(|| format!("Failed to get or create project '{}'", project))?;
    Ok((project, environment))
}

async fn resolve_environment(repo: &EnvRepository, env: &str) -> Result<Environment> {
    repo.get_environment_by_name(env)
        .await
        .with_context(|| format!("Failed to resolve environment '{}'", env))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: String,
        #[serde(skip)]
        text: String,
    }

    impl CommandOutput for Sample {
        fn to_text(&self) -> String {
            self.text.clone()
        }
    }

    #[test]
    fn test_render_text() {
        let sample = Sample {
            name: "app".to_string(),
            text: "hello".to_string(),
        };
        assert_eq!(render_output(&sample, &OutputFormat::Text).unwrap(), "hello");
    }

    #[test]
    fn test_render_json_skips_text() {
        let sample = Sample {
            name: "app".to_string(),
            text: "hello".to_string(),
        };
        let json = render_output(&sample, &OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["name"], "app");
        assert!(value.get("text").is_none());
    }
}
