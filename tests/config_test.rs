/// 設定ファイル管理機能のテスト
///
/// 設定ファイルの読み込み、既定値、環境変数による上書きが
/// 正しく動作することを確認します。
#[cfg(test)]
mod config_tests {
    use envkeeper::core::config::{Config, Dialect, SslMode};
    use envkeeper::core::error::ConfigError;
    use envkeeper::services::config_loader::ConfigLoader;
    use envkeeper::services::database_config_resolver::DatabaseConfigResolver;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const OVERRIDE_VARS: &[&str] = &[
        "DB_HOST",
        "DB_PORT",
        "DB_USER",
        "DB_PASSWORD",
        "DB_NAME",
        "DB_SSLMODE",
        "ENVKEEPER_DATABASE_URL",
    ];

    fn clear_override_vars() {
        for name in OVERRIDE_VARS {
            env::remove_var(name);
        }
    }

    fn load_config_from_yaml(yaml: &str) -> Config {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(&config_path, yaml).unwrap();
        ConfigLoader::from_file(&config_path).unwrap()
    }

    /// Config構造体が正しくデシリアライズできることを確認
    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
database:
  dialect: postgresql
  host: db.example.com
  port: 5433
  user: app
  password: secret
  database: vars
  ssl_mode: require
  timeout: 10
  max_connections: 2
migrations_dir: db/migrations
"#;

        let config = load_config_from_yaml(yaml);

        assert_eq!(config.database.dialect, Dialect::PostgreSQL);
        assert_eq!(config.database.host, "db.example.com");
        assert_eq!(config.database.resolved_port(), 5433);
        assert_eq!(config.database.user.as_deref(), Some("app"));
        assert_eq!(config.database.password.as_deref(), Some("secret"));
        assert_eq!(config.database.database, "vars");
        assert_eq!(config.database.ssl_mode, Some(SslMode::Require));
        assert_eq!(config.database.timeout, Some(10));
        assert_eq!(config.database.max_connections, Some(2));
        assert_eq!(config.migrations_dir, Path::new("db/migrations"));
    }

    /// 空の設定ファイルでは既定値が使われる
    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_config_from_yaml("{}\n");

        assert_eq!(config.database.dialect, Dialect::PostgreSQL);
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.resolved_port(), 5432);
        assert_eq!(config.database.database, "envkeeper");
        assert_eq!(config.database.ssl_mode, Some(SslMode::Disable));
        assert_eq!(config.migrations_dir, PathBuf::from("migrations"));
    }

    /// postgres は postgresql の別名として受け付ける
    #[test]
    fn test_postgres_alias() {
        let config = load_config_from_yaml("database:\n  dialect: postgres\n");
        assert_eq!(config.database.dialect, Dialect::PostgreSQL);
    }

    /// 不正なYAMLはエラー
    #[test]
    fn test_invalid_yaml_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(&config_path, "database:\n  dialect: oracle\n").unwrap();

        assert!(ConfigLoader::from_file(&config_path).is_err());
    }

    /// 環境変数が設定ファイルの値を上書きする
    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        clear_override_vars();
        let config = load_config_from_yaml("database:\n  host: from-file\n  database: filedb\n");

        env::set_var("DB_HOST", "from-env");
        env::set_var("DB_PORT", "6543");
        env::set_var("DB_NAME", "envdb");
        env::set_var("DB_SSLMODE", "verify-full");

        let resolved = DatabaseConfigResolver::apply_env_overrides(&config.database).unwrap();
        clear_override_vars();

        assert_eq!(resolved.host, "from-env");
        assert_eq!(resolved.port, Some(6543));
        assert_eq!(resolved.database, "envdb");
        assert_eq!(resolved.ssl_mode, Some(SslMode::VerifyFull));
    }

    /// 不正なポート番号はエラー
    #[test]
    #[serial]
    fn test_env_invalid_port() {
        clear_override_vars();
        env::set_var("DB_PORT", "99999");

        let result = DatabaseConfigResolver::apply_env_overrides(&Config::default().database);
        clear_override_vars();

        assert!(matches!(result, Err(ConfigError::InvalidPort { .. })));
    }

    /// `.env` 形式の設定ファイルはプロセス環境に読み込まれる
    #[test]
    #[serial]
    fn test_dotenv_config_path_loads_environment() {
        clear_override_vars();
        let temp_dir = TempDir::new().unwrap();
        let dotenv_path = temp_dir.path().join("db.env");
        fs::write(
            &dotenv_path,
            "DB_HOST=dotenv-host\nENVKEEPER_DATABASE_URL=sqlite://vars.db?mode=rwc\n",
        )
        .unwrap();

        let loaded = ConfigLoader::load(Some(&dotenv_path)).unwrap();
        let resolved = DatabaseConfigResolver::apply_env_overrides(&loaded.config.database).unwrap();
        clear_override_vars();

        assert_eq!(resolved.host, "dotenv-host");
        assert_eq!(resolved.url.as_deref(), Some("sqlite://vars.db?mode=rwc"));
    }

    /// 明示指定された設定ファイルが存在しない場合はエラー
    #[test]
    fn test_explicit_missing_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.yaml");

        let err = ConfigLoader::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
