use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
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
    KeyCommand, ListCommand, RunCommand, SetCommand, VariableCommandHandler, VariableInput,
};
use envkeeper::cli::{write_completions, Cli, Commands, EnvCommands};
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// コマンドの実行結果
enum Outcome {
    /// 標準出力に表示する文字列
    Output(String),
    /// 子プロセスの終了コードで終了
    Exit(i32),
}

fn main() {
    // CLIをパースして実行
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(Outcome::Output(output)) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Ok(Outcome::Exit(code)) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化（標準エラー、RUST_LOG優先）
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "envkeeper=debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<Outcome> {
    // --no-color フラグの処理
    if cli.no_color {
        color_control::set_override(false);
    }

    // --config フラグの処理（絶対パスに変換）
    let current_dir = env::current_dir()?;
    let config_path: Option<PathBuf> = cli.config.map(|p| {
        if p.is_absolute() {
            p
        } else {
            current_dir.join(p)
        }
    });
    let format = cli.format;

    let output = match cli.command {
        Commands::Import { file, project, env } => {
            let handler = ImportCommandHandler::new();
            let command = ImportCommand {
                config_path,
                file,
                project,
                env,
                format,
            };
            handler.execute(&command).await?
        }

        Commands::Export {
            file,
            project,
            env,
            force,
        } => {
            let handler = ExportCommandHandler::new();
            let command = ExportCommand {
                config_path,
                file,
                project,
                env,
                force,
                format,
            };
            handler.execute(&command).await?
        }

        Commands::ListProjects => {
            let handler = ProjectCommandHandler::new();
            let command = ListProjectsCommand {
                config_path,
                format,
            };
            handler.list(&command).await?
        }

        Commands::SearchProject { pattern } => {
            let handler = ProjectCommandHandler::new();
            let command = SearchProjectCommand {
                config_path,
                pattern,
                format,
            };
            handler.search(&command).await?
        }

        Commands::Set {
            project,
            env,
            key,
            value,
            pair,
        } => {
            let input = match (key, pair) {
                (Some(key), _) => VariableInput::Explicit {
                    key,
                    value: value.unwrap_or_default(),
                },
                (None, Some(pair)) => VariableInput::Pair(pair),
                (None, None) => anyhow::bail!("Either --key or KEY=VALUE is required"),
            };
            let handler = VariableCommandHandler::new();
            let command = SetCommand {
                config_path,
                project,
                env,
                input,
                format,
            };
            handler.set(&command).await?
        }

        Commands::Get { project, env, key } => {
            let handler = VariableCommandHandler::new();
            let command = KeyCommand {
                config_path,
                project,
                env,
                key,
                format,
            };
            handler.get(&command).await?
        }

        Commands::Delete { project, env, key } => {
            let handler = VariableCommandHandler::new();
            let command = KeyCommand {
                config_path,
                project,
                env,
                key,
                format,
            };
            handler.delete(&command).await?
        }

        Commands::List {
            project,
            env,
            filter,
            run,
        } => {
            let handler = VariableCommandHandler::new();
            if let Some(command_line) = run {
                let command = RunCommand {
                    config_path,
                    project,
                    env,
                    filter,
                    command_line,
                };
                return Ok(Outcome::Exit(handler.run(&command).await?));
            }
            let command = ListCommand {
                config_path,
                project,
                env,
                filter,
                format,
            };
            handler.list(&command).await?
        }

        Commands::DeleteProject { project, force } => {
            let handler = ProjectCommandHandler::new();
            let command = DeleteProjectCommand {
                config_path,
                project,
                force,
                format,
            };
            handler.delete(&command).await?
        }

        Commands::ProjectDetails { project } => {
            let handler = ProjectCommandHandler::new();
            let command = ProjectDetailsCommand {
                config_path,
                project,
                format,
            };
            handler.details(&command).await?
        }

        Commands::Env { command } => {
            let handler = EnvironmentCommandHandler::new();
            match command {
                EnvCommands::List => {
                    let command = EnvListCommand {
                        config_path,
                        format,
                    };
                    handler.list(&command).await?
                }
                EnvCommands::Create { name, description } => {
                    let command = EnvCreateCommand {
                        config_path,
                        name,
                        description,
                        format,
                    };
                    handler.create(&command).await?
                }
            }
        }

        Commands::Completion { shell } => {
            write_completions(shell, &mut std::io::stdout());
            String::new()
        }

        Commands::Migrate { dir, status } => {
            let handler = MigrateCommandHandler::new();
            let command = MigrateCommand {
                config_path,
                dir,
                status,
                format,
            };
            handler.execute(&command).await?
        }
    };

    Ok(Outcome::Output(output))
}
