/// コマンドハンドラーのテスト
///
/// 一時ディレクトリにSQLite用の設定ファイルを作成し、
/// migrate から import / export / set / get / delete / list までを通しで確認します。

#[cfg(test)]
mod commands_tests {
    use envkeeper::cli::commands::environment::{
        EnvCreateCommand, EnvListCommand, EnvironmentCommandHandler,
    };
    use envkeeper::cli::commands::export::{ExportCommand, ExportCommandHandler};
    use envkeeper::cli::commands::import::{ImportCommand, ImportCommandHandler};
    use envkeeper::cli::commands::migrate::{MigrateCommand, MigrateCommandHandler};
    use envkeeper::cli::commands::project::{
        DeleteProjectCommand, ListProjectsCommand, ProjectCommandHandler, ProjectDetailsCommand,
        SearchProjectCommand,
    };
    use envkeeper::cli::commands::variable::{
        KeyCommand, ListCommand, SetCommand, VariableCommandHandler, VariableInput,
    };
    use envkeeper::cli::OutputFormat;
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// テスト用の作業ディレクトリ
    struct TestProject {
        temp_dir: TempDir,
        config_path: PathBuf,
    }

    impl TestProject {
        fn path(&self, name: &str) -> PathBuf {
            self.temp_dir.path().join(name)
        }

        fn config(&self) -> Option<PathBuf> {
            Some(self.config_path.clone())
        }
    }

    /// SQLite設定を作成し、同梱マイグレーションを適用
    async fn setup_project() -> TestProject {
        colored::control::set_override(false);

        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("envkeeper.db");
        let migrations_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
        let config_path = temp_dir.path().join(".envkeeper.yaml");
        fs::write(
            &config_path,
            format!(
                "database:\n  dialect: sqlite\n  database: '{}'\nmigrations_dir: '{}'\n",
                db_path.display(),
                migrations_dir.display()
            ),
        )
        .unwrap();

        let project = TestProject {
            temp_dir,
            config_path,
        };

        MigrateCommandHandler::new()
            .execute(&MigrateCommand {
                config_path: project.config(),
                dir: None,
                status: false,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        project
    }

    fn set_command(project: &TestProject, app: &str, pair: &str) -> SetCommand {
        SetCommand {
            config_path: project.config(),
            project: app.to_string(),
            env: "development".to_string(),
            input: VariableInput::Pair(pair.to_string()),
            format: OutputFormat::Text,
        }
    }

    fn key_command(project: &TestProject, app: &str, key: &str) -> KeyCommand {
        KeyCommand {
            config_path: project.config(),
            project: app.to_string(),
            env: "development".to_string(),
            key: key.to_string(),
            format: OutputFormat::Text,
        }
    }

    #[tokio::test]
    async fn test_migrate_twice_reports_up_to_date() {
        let project = setup_project().await;

        let output = MigrateCommandHandler::new()
            .execute(&MigrateCommand {
                config_path: project.config(),
                dir: None,
                status: false,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        assert_eq!(output, "No pending migrations. Database is up to date.");
    }

    #[tokio::test]
    async fn test_migrate_status_json() {
        let project = setup_project().await;

        let output = MigrateCommandHandler::new()
            .execute(&MigrateCommand {
                config_path: project.config(),
                dir: None,
                status: true,
                format: OutputFormat::Json,
            })
            .await
            .unwrap();

        let json: Value = serde_json::from_str(&output).unwrap();
        let migrations = json["migrations"].as_array().unwrap();
        assert_eq!(migrations.len(), 4);
        assert!(migrations.iter().all(|m| !m["applied_at"].is_null()));
    }

    #[tokio::test]
    async fn test_import_then_export_sorted() {
        let project = setup_project().await;
        let env_file = project.path("input.env");
        fs::write(
            &env_file,
            "# settings\nZ_LAST=1\nGREETING=\"hello world\"\nA_FIRST=postgres://u:p@h/db\n",
        )
        .unwrap();

        let output = ImportCommandHandler::new()
            .execute(&ImportCommand {
                config_path: project.config(),
                file: env_file,
                project: "app".to_string(),
                env: "development".to_string(),
                format: OutputFormat::Json,
            })
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["created"], 3);
        assert_eq!(json["project"], "app");

        let out_file = project.path("out.env");
        ExportCommandHandler::new()
            .execute(&ExportCommand {
                config_path: project.config(),
                file: out_file.clone(),
                project: "app".to_string(),
                env: "development".to_string(),
                force: false,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        let content = fs::read_to_string(&out_file).unwrap();
        assert_eq!(
            content,
            "A_FIRST=postgres://u:p@h/db\nGREETING=\"hello world\"\nZ_LAST=1\n"
        );
    }

    #[tokio::test]
    async fn test_import_again_updates_existing_keys() {
        let project = setup_project().await;
        let env_file = project.path("input.env");
        fs::write(&env_file, "A=1\nB=2\n").unwrap();

        let command = ImportCommand {
            config_path: project.config(),
            file: env_file.clone(),
            project: "app".to_string(),
            env: "development".to_string(),
            format: OutputFormat::Json,
        };
        let handler = ImportCommandHandler::new();
        handler.execute(&command).await.unwrap();

        fs::write(&env_file, "A=10\nC=3\n").unwrap();
        let output = handler.execute(&command).await.unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["created"], 1);
        assert_eq!(json["updated"], 1);

        let value = VariableCommandHandler::new()
            .get(&key_command(&project, "app", "A"))
            .await
            .unwrap();
        assert_eq!(value, "10");
    }

    #[tokio::test]
    async fn test_import_into_unknown_environment_fails() {
        let project = setup_project().await;
        let env_file = project.path("input.env");
        fs::write(&env_file, "A=1\n").unwrap();

        let err = ImportCommandHandler::new()
            .execute(&ImportCommand {
                config_path: project.config(),
                file: env_file,
                project: "app".to_string(),
                env: "staging".to_string(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("environment 'staging' not found"));
    }

    #[tokio::test]
    async fn test_import_missing_file_fails() {
        let project = setup_project().await;

        let err = ImportCommandHandler::new()
            .execute(&ImportCommand {
                config_path: project.config(),
                file: project.path("nope.env"),
                project: "app".to_string(),
                env: "development".to_string(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("File does not exist"));
    }

    #[tokio::test]
    async fn test_export_force_overwrites_existing_file() {
        let project = setup_project().await;
        let handler = VariableCommandHandler::new();
        handler
            .set(&set_command(&project, "app", "KEY=value"))
            .await
            .unwrap();

        let out_file = project.path("existing.env");
        fs::write(&out_file, "OLD=1\n").unwrap();

        let output = ExportCommandHandler::new()
            .execute(&ExportCommand {
                config_path: project.config(),
                file: out_file.clone(),
                project: "app".to_string(),
                env: "development".to_string(),
                force: true,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        assert!(output.contains("Exported 1 environment variables"));
        assert_eq!(fs::read_to_string(&out_file).unwrap(), "KEY=value\n");
    }

    #[tokio::test]
    async fn test_export_unknown_project_fails() {
        let project = setup_project().await;

        let err = ExportCommandHandler::new()
            .execute(&ExportCommand {
                config_path: project.config(),
                file: project.path("out.env"),
                project: "ghost".to_string(),
                env: "development".to_string(),
                force: false,
                format: OutputFormat::Text,
            })
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("project 'ghost' not found"));
        assert!(!project.path("out.env").exists());
    }

    #[tokio::test]
    async fn test_set_get_delete_lifecycle() {
        let project = setup_project().await;
        let handler = VariableCommandHandler::new();

        let output = handler
            .set(&set_command(&project, "app", "TOKEN=abc"))
            .await
            .unwrap();
        assert!(output.contains("[created]"));

        let output = handler
            .set(&set_command(&project, "app", "TOKEN=def"))
            .await
            .unwrap();
        assert!(output.contains("[updated]"));

        let value = handler
            .get(&key_command(&project, "app", "TOKEN"))
            .await
            .unwrap();
        assert_eq!(value, "def");

        handler
            .delete(&key_command(&project, "app", "TOKEN"))
            .await
            .unwrap();

        let err = handler
            .get(&key_command(&project, "app", "TOKEN"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("environment variable 'TOKEN' not found"));

        let output = handler
            .set(&set_command(&project, "app", "TOKEN=ghi"))
            .await
            .unwrap();
        assert!(output.contains("[reactivated]"));
    }

    #[tokio::test]
    async fn test_set_rejects_malformed_pair() {
        let project = setup_project().await;

        let err = VariableCommandHandler::new()
            .set(&set_command(&project, "app", "NOEQUALS"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid format: NOEQUALS (expected key=value)"
        );
    }

    #[tokio::test]
    async fn test_list_with_filter_json() {
        let project = setup_project().await;
        let handler = VariableCommandHandler::new();
        for pair in ["DB_HOST=localhost", "DB_PORT=5432", "API_URL=http://x"] {
            handler
                .set(&set_command(&project, "app", pair))
                .await
                .unwrap();
        }

        let output = handler
            .list(&ListCommand {
                config_path: project.config(),
                project: "app".to_string(),
                env: "development".to_string(),
                filter: Some("db".to_string()),
                format: OutputFormat::Json,
            })
            .await
            .unwrap();

        let json: Value = serde_json::from_str(&output).unwrap();
        let keys: Vec<&str> = json["variables"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["DB_HOST", "DB_PORT"]);
    }

    #[tokio::test]
    async fn test_list_text_output() {
        let project = setup_project().await;
        let handler = VariableCommandHandler::new();
        handler
            .set(&set_command(&project, "app", "B=2"))
            .await
            .unwrap();
        handler
            .set(&set_command(&project, "app", "A=1"))
            .await
            .unwrap();

        let output = handler
            .list(&ListCommand {
                config_path: project.config(),
                project: "app".to_string(),
                env: "development".to_string(),
                filter: None,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();

        assert!(output.starts_with("Environment variables for project 'app' (development environment):"));
        assert!(output.ends_with("A=1\nB=2"));
    }

    #[tokio::test]
    async fn test_projects_listing_search_and_details() {
        let project = setup_project().await;
        let handler = VariableCommandHandler::new();
        handler
            .set(&set_command(&project, "billing-api", "A=1"))
            .await
            .unwrap();
        handler
            .set(&set_command(&project, "frontend", "A=1"))
            .await
            .unwrap();

        let projects = ProjectCommandHandler::new();

        let output = projects
            .list(&ListProjectsCommand {
                config_path: project.config(),
                format: OutputFormat::Json,
            })
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();
        let listed = json["projects"].as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["name"], "billing-api");
        assert_eq!(listed[0]["environments"][0], "development");

        let output = projects
            .search(&SearchProjectCommand {
                config_path: project.config(),
                pattern: "BILL".to_string(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap();
        assert!(output.contains("- billing-api"));
        assert!(!output.contains("frontend"));

        let output = projects
            .details(&ProjectDetailsCommand {
                config_path: project.config(),
                project: "frontend".to_string(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap();
        assert!(output.contains("Project: frontend"));
        assert!(output.contains("- development"));
    }

    #[tokio::test]
    async fn test_delete_project_force_hides_project_and_variables() {
        let project = setup_project().await;
        let variables = VariableCommandHandler::new();
        variables
            .set(&set_command(&project, "app", "A=1"))
            .await
            .unwrap();

        let projects = ProjectCommandHandler::new();
        let output = projects
            .delete(&DeleteProjectCommand {
                config_path: project.config(),
                project: "app".to_string(),
                force: true,
                format: OutputFormat::Text,
            })
            .await
            .unwrap();
        assert_eq!(output, "✓ Deleted project 'app'");

        let err = projects
            .details(&ProjectDetailsCommand {
                config_path: project.config(),
                project: "app".to_string(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("project 'app' not found"));

        // 同名プロジェクトは新規に作成され、以前の変数は見えない
        variables
            .set(&set_command(&project, "app", "B=2"))
            .await
            .unwrap();
        let err = variables
            .get(&key_command(&project, "app", "A"))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("not found"));
    }

    #[tokio::test]
    async fn test_environment_create_and_list() {
        let project = setup_project().await;
        let handler = EnvironmentCommandHandler::new();

        let output = handler
            .create(&EnvCreateCommand {
                config_path: project.config(),
                name: "production".to_string(),
                description: "Production".to_string(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap();
        assert_eq!(output, "✓ Created environment 'production'");

        let err = handler
            .create(&EnvCreateCommand {
                config_path: project.config(),
                name: "production".to_string(),
                description: String::new(),
                format: OutputFormat::Text,
            })
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("already exists"));

        let output = handler
            .list(&EnvListCommand {
                config_path: project.config(),
                format: OutputFormat::Json,
            })
            .await
            .unwrap();
        let json: Value = serde_json::from_str(&output).unwrap();
        let names: Vec<&str> = json["environments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["development", "production", "sit", "uat"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_injects_variables_and_returns_exit_code() {
        use envkeeper::cli::commands::variable::RunCommand;

        let project = setup_project().await;
        let handler = VariableCommandHandler::new();
        handler
            .set(&set_command(&project, "app", "GREETING=hello world"))
            .await
            .unwrap();

        let run = |command_line: &str| RunCommand {
            config_path: project.config(),
            project: "app".to_string(),
            env: "development".to_string(),
            filter: None,
            command_line: command_line.to_string(),
        };

        let code = handler
            .run(&run("test \"$GREETING\" = 'hello world'"))
            .await
            .unwrap();
        assert_eq!(code, 0);

        let code = handler.run(&run("exit 7")).await.unwrap();
        assert_eq!(code, 7);
    }
}
