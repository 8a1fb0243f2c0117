// プロジェクト関連コマンドハンドラー
//
// list-projects / search-project / delete-project / project-details を扱います。

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{confirm, render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::models::Project;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// プロジェクト一覧の1行
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub description: String,
    /// 有効な変数を持つ環境名
    pub environments: Vec<String>,
}

/// list-projects の出力
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListOutput {
    pub projects: Vec<ProjectSummary>,
}

impl CommandOutput for ProjectListOutput {
    fn to_text(&self) -> String {
        if self.projects.is_empty() {
            return "No projects found".to_string();
        }

        let mut lines = vec!["Projects:".bold().to_string(), "=========".to_string()];
        for project in &self.projects {
            lines.push(format!("- {}: {}", project.name.cyan(), project.description));
            if !project.environments.is_empty() {
                lines.push(format!("  Environments: {}", project.environments.join(", ")));
            }
        }
        lines.join("\n")
    }
}

/// search-project の出力
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSearchOutput {
    pub pattern: String,
    pub projects: Vec<Project>,
}

impl CommandOutput for ProjectSearchOutput {
    fn to_text(&self) -> String {
        if self.projects.is_empty() {
            return format!("No projects found matching '{}'", self.pattern);
        }

        let mut lines = vec![
            format!("Projects matching '{}':", self.pattern).bold().to_string(),
            "======================".to_string(),
        ];
        for project in &self.projects {
            lines.push(format!("- {}: {}", project.name.cyan(), project.description));
        }
        lines.join("\n")
    }
}

/// delete-project の出力
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDeleteOutput {
    pub project: String,
    pub deleted: bool,
}

impl CommandOutput for ProjectDeleteOutput {
    fn to_text(&self) -> String {
        if self.deleted {
            format!("{} Deleted project '{}'", "✓".green(), self.project)
        } else {
            "Delete cancelled".yellow().to_string()
        }
    }
}

/// project-details の出力
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetailsOutput {
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub environments: Vec<String>,
}

impl CommandOutput for ProjectDetailsOutput {
    fn to_text(&self) -> String {
        let mut lines = vec![
            format!("Project: {}", self.name.cyan()),
            format!("Description: {}", self.description),
            format!("Created: {}", self.created_at.format("%Y-%m-%d %H:%M:%S")),
        ];

        if self.environments.is_empty() {
            lines.push(String::new());
            lines.push("No environments found for this project".to_string());
        } else {
            lines.push(String::new());
            lines.push("Environments:".bold().to_string());
            for env in &self.environments {
                lines.push(format!("- {}", env));
            }
        }
        lines.join("\n")
    }
}

/// list-projects の入力パラメータ
#[derive(Debug, Clone)]
pub struct ListProjectsCommand {
    pub config_path: Option<PathBuf>,
    pub format: OutputFormat,
}

/// search-project の入力パラメータ
#[derive(Debug, Clone)]
pub struct SearchProjectCommand {
    pub config_path: Option<PathBuf>,
    /// プロジェクト名に含まれる文字列
    pub pattern: String,
    pub format: OutputFormat,
}

/// delete-project の入力パラメータ
#[derive(Debug, Clone)]
pub struct DeleteProjectCommand {
    pub config_path: Option<PathBuf>,
    pub project: String,
    /// 確認を省略
    pub force: bool,
    pub format: OutputFormat,
}

/// project-details の入力パラメータ
#[derive(Debug, Clone)]
pub struct ProjectDetailsCommand {
    pub config_path: Option<PathBuf>,
    pub project: String,
    pub format: OutputFormat,
}

/// プロジェクト関連コマンドハンドラー
#[derive(Debug, Default)]
pub struct ProjectCommandHandler {}

impl ProjectCommandHandler {
    /// 新しいProjectCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// 有効なプロジェクトを、使用中の環境とともに一覧表示
    pub async fn list(&self, command: &ListProjectsCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let projects = repo
            .get_all_projects()
            .await
            .with_context(|| "Failed to list projects")?;

        let mut summaries = Vec::with_capacity(projects.len());
        for project in projects {
            let environments = repo
                .get_environments_for_project(&project.id)
                .await
                .with_context(|| {
                    format!("Failed to get environments for project '{}'", project.name)
                })?;
            summaries.push(ProjectSummary {
                name: project.name,
                description: project.description,
                environments: environments.into_iter().map(|e| e.name).collect(),
            });
        }

        render_output(
            &ProjectListOutput {
                projects: summaries,
            },
            &command.format,
        )
    }

    /// 名前に部分文字列を含むプロジェクトを検索
    pub async fn search(&self, command: &SearchProjectCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let projects = repo
            .search_projects(&command.pattern)
            .await
            .with_context(|| "Failed to search projects")?;

        render_output(
            &ProjectSearchOutput {
                pattern: command.pattern.clone(),
                projects,
            },
            &command.format,
        )
    }

    /// プロジェクトとその変数を論理削除
    pub async fn delete(&self, command: &DeleteProjectCommand) -> Result<String> {
        if !command.force {
            let proceed = confirm(&format!(
                "Are you sure you want to delete the project '{}' and all of its variables?",
                command.project
            ))?;
            if !proceed {
                return render_output(
                    &ProjectDeleteOutput {
                        project: command.project.clone(),
                        deleted: false,
                    },
                    &command.format,
                );
            }
        }

        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let project = repo
            .get_project_by_name(&command.project)
            .await
            .with_context(|| format!("Failed to resolve project '{}'", command.project))?;
        repo.soft_delete_project(&project.id)
            .await
            .with_context(|| format!("Failed to delete project '{}'", command.project))?;

        info!(project = %project.name, "Soft deleted project");

        render_output(
            &ProjectDeleteOutput {
                project: project.name,
                deleted: true,
            },
            &command.format,
        )
    }

    /// プロジェクトの詳細を表示
    pub async fn details(&self, command: &ProjectDetailsCommand) -> Result<String> {
        let context = CommandContext::load_with_config(command.config_path.clone())?;
        let repo = context.connect_repository().await?;

        let project = repo
            .get_project_by_name(&command.project)
            .await
            .with_context(|| format!("Failed to resolve project '{}'", command.project))?;
        let environments = repo
            .get_environments_for_project(&project.id)
            .await
            .with_context(|| {
                format!("Failed to get environments for project '{}'", project.name)
            })?;

        render_output(
            &ProjectDetailsOutput {
                name: project.name,
                description: project.description,
                created_at: project.created_at,
                environments: environments.into_iter().map(|e| e.name).collect(),
            },
            &command.format,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_project_list_text() {
        let output = ProjectListOutput { projects: vec![] };
        assert_eq!(output.to_text(), "No projects found");
    }

    #[test]
    fn test_project_list_text_includes_environments() {
        colored::control::set_override(false);
        let output = ProjectListOutput {
            projects: vec![ProjectSummary {
                name: "app".to_string(),
                description: "demo".to_string(),
                environments: vec!["development".to_string(), "uat".to_string()],
            }],
        };
        let text = output.to_text();

        assert!(text.contains("- app: demo"));
        assert!(text.contains("Environments: development, uat"));
    }

    #[test]
    fn test_cancelled_delete_text() {
        colored::control::set_override(false);
        let output = ProjectDeleteOutput {
            project: "app".to_string(),
            deleted: false,
        };
        assert_eq!(output.to_text(), "Delete cancelled");
    }
}
