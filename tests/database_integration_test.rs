/// データベース統合テスト
///
/// testcontainersを使用してPostgreSQLに対するエンドツーエンドテストを実施します。
///
/// テスト内容:
/// - 同梱マイグレーションの適用と冪等性
/// - 変数の設定・論理削除・再有効化
/// - プロジェクトの論理削除と名前の再利用
///
/// 注意: このテストはDockerが必要なため #[ignore] でマークされています。
/// Docker起動時に実行するには: `cargo test -- --ignored`

#[cfg(test)]
mod database_integration_tests {
    use envkeeper::adapters::database::DatabaseConnectionService;
    use envkeeper::adapters::database_migrator::DatabaseMigratorService;
    use envkeeper::adapters::repository::EnvRepository;
    use envkeeper::core::config::{DatabaseConfig, Dialect};
    use envkeeper::core::models::SetOutcome;
    use envkeeper::services::migration_loader::MigrationLoader;
    use sqlx::AnyPool;
    use std::path::PathBuf;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::postgres::Postgres;

    /// PostgreSQLコンテナを起動して接続プールを作成
    async fn setup_postgres_container(
    ) -> Result<(ContainerAsync<Postgres>, AnyPool), Box<dyn std::error::Error>> {
        let container = Postgres::default().with_tag("16-alpine").start().await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;

        let config = DatabaseConfig {
            dialect: Dialect::PostgreSQL,
            host: host.to_string(),
            port: Some(port),
            database: "postgres".to_string(),
            ..Default::default()
        };
        let pool = DatabaseConnectionService::new().create_pool(&config).await?;

        Ok((container, pool))
    }

    async fn migrate(pool: &AnyPool) -> usize {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
        let migrations = MigrationLoader::discover(&dir).unwrap();
        DatabaseMigratorService::new()
            .migrate_up(pool, &migrations)
            .await
            .unwrap()
            .applied
            .len()
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_migrations_are_idempotent() {
        let (_container, pool) = setup_postgres_container().await.unwrap();

        assert_eq!(migrate(&pool).await, 4);
        assert_eq!(migrate(&pool).await, 0);

        let repo = EnvRepository::new(pool);
        let names: Vec<String> = repo
            .get_all_environments()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["development", "sit", "uat"]);
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_variable_lifecycle() {
        let (_container, pool) = setup_postgres_container().await.unwrap();
        migrate(&pool).await;
        let repo = EnvRepository::new(pool);

        let project = repo.create_project("app", "demo").await.unwrap();
        let env = repo.get_environment_by_name("uat").await.unwrap();

        let (created, outcome) = repo
            .set_env_variable(&project.id, &env.id, "API_KEY", "one")
            .await
            .unwrap();
        assert_eq!(outcome, SetOutcome::Created);

        let (_, outcome) = repo
            .set_env_variable(&project.id, &env.id, "API_KEY", "two")
            .await
            .unwrap();
        assert_eq!(outcome, SetOutcome::Updated);

        repo.delete_env_variable(&project.id, &env.id, "API_KEY")
            .await
            .unwrap();
        assert!(repo
            .get_env_variable(&project.id, &env.id, "API_KEY")
            .await
            .unwrap_err()
            .is_not_found());

        let (revived, outcome) = repo
            .set_env_variable(&project.id, &env.id, "API_KEY", "three")
            .await
            .unwrap();
        assert_eq!(outcome, SetOutcome::Reactivated);
        assert_eq!(revived.id, created.id);

        let found = repo.search_env_variables(&project.id, &env.id, "api").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "three");
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_project_name_reuse_after_soft_delete() {
        let (_container, pool) = setup_postgres_container().await.unwrap();
        migrate(&pool).await;
        let repo = EnvRepository::new(pool);

        let first = repo.create_project("app", "").await.unwrap();
        assert!(repo
            .create_project("app", "")
            .await
            .unwrap_err()
            .is_already_exists());

        repo.soft_delete_project(&first.id).await.unwrap();
        let second = repo.create_project("app", "").await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(repo.search_projects("APP").await.unwrap().len(), 1);
    }
}
