// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use crate::core::naming::{BINARY_NAME, DEFAULT_ENVIRONMENT};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::io::Write;
use std::path::PathBuf;

/// 出力フォーマット
#[derive(Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

/// envkeeper - Environment variable manager backed by a database
#[derive(Parser, Debug)]
#[command(name = "envkeeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage project environment variables stored in a database")]
#[command(long_about = "envkeeper - Environment variable manager

Store environment variables per project and environment (development, sit, uat, ...)
in PostgreSQL or SQLite, and move them in and out of .env files.

envkeeper helps you:
  • Import and export .env files
  • Set, get, list and delete individual variables
  • Run commands with a project's variables injected
  • Soft-delete projects and variables without losing history")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Create the schema:          envkeeper migrate
  2. Import an existing file:    envkeeper import .env --project myapp
  3. Inspect the variables:      envkeeper list --project myapp
  4. Run with them injected:     envkeeper list --project myapp --run \"make run\"

For detailed help on each command, use: envkeeper <command> --help")]
pub struct Cli {
    /// Path to configuration file (.yaml, or .env to load into the environment)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import environment variables from a .env file
    ///
    /// The project is created if it does not exist yet. The environment must exist.
    ///
    /// EXAMPLES:
    ///   envkeeper import .env --project myapp
    ///   envkeeper import .env.uat --project myapp --env uat
    Import {
        /// Path to the .env file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Environment name
        #[arg(short, long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
        env: String,
    },

    /// Export environment variables to a .env file
    ///
    /// Keys are written in sorted order. An existing file is only overwritten
    /// after confirmation, or with --force.
    ///
    /// EXAMPLES:
    ///   envkeeper export .env --project myapp
    ///   envkeeper export .env.sit --project myapp --env sit --force
    Export {
        /// Path to the output .env file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Environment name
        #[arg(short, long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },

    /// List all projects
    ListProjects,

    /// Search for projects by name pattern (case-insensitive substring)
    SearchProject {
        /// Substring to look for in project names
        #[arg(value_name = "PATTERN")]
        pattern: String,
    },

    /// Set an environment variable
    ///
    /// EXAMPLES:
    ///   envkeeper set --project myapp --key API_URL --value http://localhost:8080
    ///   envkeeper set --project myapp API_URL=http://localhost:8080
    Set {
        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Environment name
        #[arg(short, long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        /// Variable key
        #[arg(short, long, value_name = "KEY", conflicts_with = "pair")]
        key: Option<String>,

        /// Variable value
        #[arg(long, value_name = "VALUE", requires = "key")]
        value: Option<String>,

        /// Variable as KEY=VALUE
        #[arg(value_name = "KEY=VALUE", required_unless_present = "key")]
        pair: Option<String>,
    },

    /// Get an environment variable (prints the bare value)
    Get {
        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Environment name
        #[arg(short, long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        /// Variable key
        #[arg(short, long, value_name = "KEY")]
        key: String,
    },

    /// Delete an environment variable
    Delete {
        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Environment name
        #[arg(short, long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        /// Variable key
        #[arg(short, long, value_name = "KEY")]
        key: String,
    },

    /// List environment variables for a project
    ///
    /// Use --run to execute a command with the variables loaded. The command's
    /// exit code becomes envkeeper's exit code.
    ///
    /// EXAMPLES:
    ///   envkeeper list --project myapp
    ///   envkeeper list --project myapp --filter db_
    ///   envkeeper list --project myapp --env uat --run "make run"
    List {
        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Environment name
        #[arg(short, long, value_name = "ENV", default_value = DEFAULT_ENVIRONMENT)]
        env: String,

        /// Only keys containing this pattern (case-insensitive)
        #[arg(long, value_name = "PATTERN")]
        filter: Option<String>,

        /// Command to run with the variables loaded
        #[arg(long, value_name = "COMMAND")]
        run: Option<String>,
    },

    /// Soft delete a project and all of its variables
    DeleteProject {
        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show details of a project including its environments
    ProjectDetails {
        /// Project name
        #[arg(short, long, value_name = "PROJECT")]
        project: String,
    },

    /// Manage environments
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },

    /// Apply pending schema migrations
    ///
    /// EXAMPLES:
    ///   envkeeper migrate
    ///   envkeeper migrate --dir ./db/migrations
    ///   envkeeper migrate --status
    Migrate {
        /// Migrations directory (defaults to migrations_dir from the config)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Show applied/pending state without applying anything
        #[arg(long)]
        status: bool,
    },

    /// Generate shell completion scripts
    ///
    /// EXAMPLES:
    ///   source <(envkeeper completion bash)
    ///   envkeeper completion zsh > "${fpath[1]}/_envkeeper"
    ///   envkeeper completion fish > ~/.config/fish/completions/envkeeper.fish
    ///   envkeeper completion powershell | Out-String | Invoke-Expression
    Completion {
        /// Target shell
        #[arg(value_enum, value_name = "SHELL")]
        shell: Shell,
    },
}

/// 指定シェル向けの補完スクリプトを書き出す
pub fn write_completions<W: Write>(shell: Shell, out: &mut W) {
    clap_complete::generate(shell, &mut Cli::command(), BINARY_NAME, out);
}

/// `env` サブコマンド
#[derive(Subcommand, Debug)]
pub enum EnvCommands {
    /// List all environments
    List,

    /// Create a new environment
    Create {
        /// Environment name
        #[arg(short, long, value_name = "NAME")]
        name: String,

        /// Environment description
        #[arg(short, long, value_name = "DESCRIPTION", default_value = "")]
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_env_defaults_to_development() {
        let cli = Cli::try_parse_from(["envkeeper", "get", "--project", "app", "--key", "A"])
            .unwrap();
        match cli.command {
            Commands::Get { env, .. } => assert_eq!(env, "development"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_set_accepts_positional_pair() {
        let cli = Cli::try_parse_from(["envkeeper", "set", "--project", "app", "A=1"]).unwrap();
        match cli.command {
            Commands::Set { key, pair, .. } => {
                assert!(key.is_none());
                assert_eq!(pair.as_deref(), Some("A=1"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_set_requires_key_or_pair() {
        assert!(Cli::try_parse_from(["envkeeper", "set", "--project", "app"]).is_err());
    }

    #[test]
    fn test_set_rejects_key_and_pair_together() {
        assert!(Cli::try_parse_from([
            "envkeeper", "set", "--project", "app", "--key", "A", "B=2"
        ])
        .is_err());
    }

    #[test]
    fn test_global_format_flag() {
        let cli =
            Cli::try_parse_from(["envkeeper", "list-projects", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_env_create_subcommand() {
        let cli = Cli::try_parse_from(["envkeeper", "env", "create", "--name", "prod"]).unwrap();
        match cli.command {
            Commands::Env {
                command: EnvCommands::Create { name, description },
            } => {
                assert_eq!(name, "prod");
                assert_eq!(description, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bash_completion_names_binary() {
        let mut out = Vec::new();
        write_completions(Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("envkeeper"));
        assert!(script.contains("list-projects"));
    }
}
