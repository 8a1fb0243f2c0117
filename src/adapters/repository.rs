// 環境変数リポジトリ
//
// projects / environments / env_variables テーブルへのCRUDと論理削除を提供します。
// すべての操作は単一ステートメント、または1つのトランザクションで完結し、
// メモリ上のキャッシュは持ちません。
//
// ID は UUID 文字列、日時は RFC3339 文字列として保存します（Anyドライバーで
// PostgreSQL と SQLite を同じクエリで扱うため）。

use crate::core::error::{DatabaseError, Entity, RepositoryError};
use crate::core::models::{EnvVariable, Environment, Project, SetOutcome, VariableSlot};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::{AnyConnection, AnyPool, Row};
use tracing::debug;
use uuid::Uuid;

type Result<T> = std::result::Result<T, RepositoryError>;

const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at, deleted_at";

const ENVIRONMENT_COLUMNS: &str = "id, name, description, created_at, updated_at";

const VARIABLE_COLUMNS: &str =
    "id, project_id, environment_id, key, value, created_at, updated_at, deleted_at";

/// 環境変数リポジトリ
#[derive(Debug, Clone)]
pub struct EnvRepository {
    pool: AnyPool,
}

impl EnvRepository {
    /// 接続プールからリポジトリを作成
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// 内部の接続プール
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    // ------------------------------------------------------------------
    // Project
    // ------------------------------------------------------------------

    /// プロジェクトを作成
    ///
    /// 同名の有効なプロジェクトが存在する場合は `AlreadyExists` を返します。
    /// 論理削除済みの同名プロジェクトは重複とみなしません。
    pub async fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let sql = "SELECT COUNT(*) AS count FROM projects WHERE name = $1 AND deleted_at IS NULL";
        let count: i64 = sqlx::query(sql)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to check existing project", sql, e))?
            .try_get("count")
            .map_err(|e| decode_error("count", e))?;

        if count > 0 {
            return Err(RepositoryError::already_exists(Entity::Project, name));
        }

        let now = Utc::now();
        let project = Project {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let sql = "INSERT INTO projects (id, name, description, created_at, updated_at) \
                   VALUES ($1, $2, $3, $4, $5)";
        sqlx::query(sql)
            .bind(&project.id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(format_timestamp(&project.created_at))
            .bind(format_timestamp(&project.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                // 存在確認と挿入の間に別プロセスが作成した場合は部分一意インデックスで検出される
                if is_unique_violation(&e) {
                    RepositoryError::already_exists(Entity::Project, name)
                } else {
                    DatabaseError::query("failed to create project", sql, e).into()
                }
            })?;

        debug!(project = %project.name, id = %project.id, "Created project");
        Ok(project)
    }

    /// 名前から有効なプロジェクトを取得
    pub async fn get_project_by_name(&self, name: &str) -> Result<Project> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE name = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get project by name", &sql, e))?;

        match row {
            Some(row) => Ok(project_from_row(&row)?),
            None => Err(RepositoryError::not_found(Entity::Project, name)),
        }
    }

    /// 有効なプロジェクトを取得、存在しなければ作成
    pub async fn get_or_create_project(&self, name: &str, description: &str) -> Result<Project> {
        match self.get_project_by_name(name).await {
            Err(e) if e.is_not_found() => self.create_project(name, description).await,
            other => other,
        }
    }

    /// 有効なプロジェクトを名前順に取得
    pub async fn get_all_projects(&self) -> Result<Vec<Project>> {
        let sql =
            format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE deleted_at IS NULL ORDER BY name");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get all projects", &sql, e))?;

        Ok(rows
            .iter()
            .map(project_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// 名前に部分文字列を含む有効なプロジェクトを検索（大文字小文字を区別しない）
    pub async fn search_projects(&self, pattern: &str) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE LOWER(name) LIKE $1 ESCAPE '\\' AND deleted_at IS NULL ORDER BY name"
        );
        let rows = sqlx::query(&sql)
            .bind(contains_pattern(pattern))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to search projects", &sql, e))?;

        Ok(rows
            .iter()
            .map(project_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// プロジェクトを論理削除し、配下の有効な変数もまとめて論理削除
    pub async fn soft_delete_project(&self, id: &str) -> Result<()> {
        let now = format_timestamp(&Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::transaction("failed to start transaction", e))?;

        let sql = "UPDATE projects SET deleted_at = $1, updated_at = $1 \
                   WHERE id = $2 AND deleted_at IS NULL";
        let result = sqlx::query(sql)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::query("failed to soft delete project", sql, e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(Entity::Project, id));
        }

        let sql = "UPDATE env_variables SET deleted_at = $1, updated_at = $1 \
                   WHERE project_id = $2 AND deleted_at IS NULL";
        let result = sqlx::query(sql)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::query("failed to delete environment variables", sql, e))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::transaction("failed to commit project deletion", e))?;

        debug!(
            project_id = %id,
            variables = result.rows_affected(),
            "Soft deleted project"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Environment
    // ------------------------------------------------------------------

    /// 名前から環境を取得
    pub async fn get_environment_by_name(&self, name: &str) -> Result<Environment> {
        let sql = format!("SELECT {ENVIRONMENT_COLUMNS} FROM environments WHERE name = $1");
        let row = sqlx::query(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get environment by name", &sql, e))?;

        match row {
            Some(row) => Ok(environment_from_row(&row)?),
            None => Err(RepositoryError::not_found(Entity::Environment, name)),
        }
    }

    /// すべての環境を名前順に取得
    pub async fn get_all_environments(&self) -> Result<Vec<Environment>> {
        let sql = format!("SELECT {ENVIRONMENT_COLUMNS} FROM environments ORDER BY name");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get all environments", &sql, e))?;

        Ok(rows
            .iter()
            .map(environment_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// 環境を作成
    pub async fn create_environment(&self, name: &str, description: &str) -> Result<Environment> {
        let sql = "SELECT COUNT(*) AS count FROM environments WHERE name = $1";
        let count: i64 = sqlx::query(sql)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to check existing environment", sql, e))?
            .try_get("count")
            .map_err(|e| decode_error("count", e))?;

        if count > 0 {
            return Err(RepositoryError::already_exists(Entity::Environment, name));
        }

        let now = Utc::now();
        let environment = Environment {
            id: new_id(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };

        let sql = "INSERT INTO environments (id, name, description, created_at, updated_at) \
                   VALUES ($1, $2, $3, $4, $5)";
        sqlx::query(sql)
            .bind(&environment.id)
            .bind(&environment.name)
            .bind(&environment.description)
            .bind(format_timestamp(&environment.created_at))
            .bind(format_timestamp(&environment.updated_at))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::already_exists(Entity::Environment, name)
                } else {
                    DatabaseError::query("failed to create environment", sql, e).into()
                }
            })?;

        debug!(environment = %environment.name, "Created environment");
        Ok(environment)
    }

    // ------------------------------------------------------------------
    // EnvVariable
    // ------------------------------------------------------------------

    /// 変数を設定
    ///
    /// スロットの状態に応じて1つのトランザクション内で次のいずれかを行います。
    /// - 行なし: 新規挿入
    /// - 有効な行あり: 値と更新日時を更新
    /// - 論理削除済みの行あり: `deleted_at` をクリアして値と更新日時を更新（再有効化）
    pub async fn set_env_variable(
        &self,
        project_id: &str,
        environment_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(EnvVariable, SetOutcome)> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::transaction("failed to start transaction", e))?;

        let slot = find_slot(&mut *tx, project_id, environment_id, key).await?;

        let (variable, outcome) = match slot {
            VariableSlot::Vacant => {
                let variable = EnvVariable {
                    id: new_id(),
                    project_id: project_id.to_string(),
                    environment_id: environment_id.to_string(),
                    key: key.to_string(),
                    value: value.to_string(),
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                insert_variable(&mut *tx, &variable).await?;
                (variable, SetOutcome::Created)
            }
            VariableSlot::Active(existing) => {
                let sql = "UPDATE env_variables SET value = $1, updated_at = $2 WHERE id = $3";
                sqlx::query(sql)
                    .bind(value)
                    .bind(format_timestamp(&now))
                    .bind(&existing.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        DatabaseError::query("failed to update environment variable", sql, e)
                    })?;
                let variable = EnvVariable {
                    value: value.to_string(),
                    updated_at: now,
                    ..existing
                };
                (variable, SetOutcome::Updated)
            }
            VariableSlot::Deleted(existing) => {
                let sql = "UPDATE env_variables SET value = $1, updated_at = $2, deleted_at = NULL \
                           WHERE id = $3";
                sqlx::query(sql)
                    .bind(value)
                    .bind(format_timestamp(&now))
                    .bind(&existing.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        DatabaseError::query("failed to reactivate environment variable", sql, e)
                    })?;
                let variable = EnvVariable {
                    value: value.to_string(),
                    updated_at: now,
                    deleted_at: None,
                    ..existing
                };
                (variable, SetOutcome::Reactivated)
            }
        };

        tx.commit()
            .await
            .map_err(|e| DatabaseError::transaction("failed to commit environment variable", e))?;

        debug!(key = %key, outcome = %outcome, "Set environment variable");
        Ok((variable, outcome))
    }

    /// 有効な変数を取得
    pub async fn get_env_variable(
        &self,
        project_id: &str,
        environment_id: &str,
        key: &str,
    ) -> Result<EnvVariable> {
        let sql = format!(
            "SELECT {VARIABLE_COLUMNS} FROM env_variables \
             WHERE project_id = $1 AND environment_id = $2 AND key = $3 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(project_id)
            .bind(environment_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get environment variable", &sql, e))?;

        match row {
            Some(row) => Ok(variable_from_row(&row)?),
            None => Err(RepositoryError::not_found(Entity::EnvVariable, key)),
        }
    }

    /// プロジェクト・環境の有効な変数をキー順に取得
    pub async fn get_env_variables(
        &self,
        project_id: &str,
        environment_id: &str,
    ) -> Result<Vec<EnvVariable>> {
        let sql = format!(
            "SELECT {VARIABLE_COLUMNS} FROM env_variables \
             WHERE project_id = $1 AND environment_id = $2 AND deleted_at IS NULL \
             ORDER BY key"
        );
        let rows = sqlx::query(&sql)
            .bind(project_id)
            .bind(environment_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get environment variables", &sql, e))?;

        Ok(rows
            .iter()
            .map(variable_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// キーに部分文字列を含む有効な変数を検索（大文字小文字を区別しない）
    pub async fn search_env_variables(
        &self,
        project_id: &str,
        environment_id: &str,
        pattern: &str,
    ) -> Result<Vec<EnvVariable>> {
        let sql = format!(
            "SELECT {VARIABLE_COLUMNS} FROM env_variables \
             WHERE project_id = $1 AND environment_id = $2 AND deleted_at IS NULL \
             AND LOWER(key) LIKE $3 ESCAPE '\\' \
             ORDER BY key"
        );
        let rows = sqlx::query(&sql)
            .bind(project_id)
            .bind(environment_id)
            .bind(contains_pattern(pattern))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::query("failed to search environment variables", &sql, e)
            })?;

        Ok(rows
            .iter()
            .map(variable_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }

    /// 変数を論理削除
    pub async fn delete_env_variable(
        &self,
        project_id: &str,
        environment_id: &str,
        key: &str,
    ) -> Result<()> {
        let sql = "UPDATE env_variables SET deleted_at = $1, updated_at = $1 \
                   WHERE project_id = $2 AND environment_id = $3 AND key = $4 \
                   AND deleted_at IS NULL";
        let result = sqlx::query(sql)
            .bind(format_timestamp(&Utc::now()))
            .bind(project_id)
            .bind(environment_id)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to delete environment variable", sql, e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found(Entity::EnvVariable, key));
        }

        Ok(())
    }

    /// プロジェクトが有効な変数を持つ環境を名前順に取得
    pub async fn get_environments_for_project(&self, project_id: &str) -> Result<Vec<Environment>> {
        let sql = "SELECT DISTINCT e.id, e.name, e.description, e.created_at, e.updated_at \
                   FROM environments e \
                   JOIN env_variables ev ON e.id = ev.environment_id \
                   WHERE ev.project_id = $1 AND ev.deleted_at IS NULL \
                   ORDER BY e.name";
        let rows = sqlx::query(sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::query("failed to get environments for project", sql, e))?;

        Ok(rows
            .iter()
            .map(environment_from_row)
            .collect::<std::result::Result<_, _>>()?)
    }
}

/// スロットの現在の行（論理削除済みを含む）を取得して状態を判定
async fn find_slot(
    conn: &mut AnyConnection,
    project_id: &str,
    environment_id: &str,
    key: &str,
) -> Result<VariableSlot> {
    // 有効な行を優先
    let sql = format!(
        "SELECT {VARIABLE_COLUMNS} FROM env_variables \
         WHERE project_id = $1 AND environment_id = $2 AND key = $3 \
         ORDER BY CASE WHEN deleted_at IS NULL THEN 0 ELSE 1 END, updated_at DESC \
         LIMIT 1"
    );
    let row = sqlx::query(&sql)
        .bind(project_id)
        .bind(environment_id)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| DatabaseError::query("failed to check existing variable", &sql, e))?;

    let existing = row.as_ref().map(variable_from_row).transpose()?;
    Ok(VariableSlot::from_existing(existing))
}

async fn insert_variable(conn: &mut AnyConnection, variable: &EnvVariable) -> Result<()> {
    let sql = "INSERT INTO env_variables \
               (id, project_id, environment_id, key, value, created_at, updated_at) \
               VALUES ($1, $2, $3, $4, $5, $6, $7)";
    sqlx::query(sql)
        .bind(&variable.id)
        .bind(&variable.project_id)
        .bind(&variable.environment_id)
        .bind(&variable.key)
        .bind(&variable.value)
        .bind(format_timestamp(&variable.created_at))
        .bind(format_timestamp(&variable.updated_at))
        .execute(&mut *conn)
        .await
        .map_err(|e| DatabaseError::query("failed to insert environment variable", sql, e))?;
    Ok(())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: &str, value: &str) -> std::result::Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode {
            column: column.to_string(),
            cause: format!("'{}' is not an RFC3339 timestamp: {}", value, e),
        })
}

/// LIKE 用の部分一致パターン（ワイルドカード文字はエスケープ）
fn contains_pattern(pattern: &str) -> String {
    let escaped = pattern
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn decode_error(column: &str, e: sqlx::Error) -> DatabaseError {
    DatabaseError::Decode {
        column: column.to_string(),
        cause: e.to_string(),
    }
}

fn get_string(row: &AnyRow, column: &str) -> std::result::Result<String, DatabaseError> {
    row.try_get::<String, _>(column)
        .map_err(|e| decode_error(column, e))
}

fn get_timestamp(row: &AnyRow, column: &str) -> std::result::Result<DateTime<Utc>, DatabaseError> {
    parse_timestamp(column, &get_string(row, column)?)
}

fn get_optional_timestamp(
    row: &AnyRow,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, DatabaseError> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|e| decode_error(column, e))?
        .map(|value| parse_timestamp(column, &value))
        .transpose()
}

fn project_from_row(row: &AnyRow) -> std::result::Result<Project, DatabaseError> {
    Ok(Project {
        id: get_string(row, "id")?,
        name: get_string(row, "name")?,
        description: get_string(row, "description")?,
        created_at: get_timestamp(row, "created_at")?,
        updated_at: get_timestamp(row, "updated_at")?,
        deleted_at: get_optional_timestamp(row, "deleted_at")?,
    })
}

fn environment_from_row(row: &AnyRow) -> std::result::Result<Environment, DatabaseError> {
    Ok(Environment {
        id: get_string(row, "id")?,
        name: get_string(row, "name")?,
        description: get_string(row, "description")?,
        created_at: get_timestamp(row, "created_at")?,
        updated_at: get_timestamp(row, "updated_at")?,
    })
}

fn variable_from_row(row: &AnyRow) -> std::result::Result<EnvVariable, DatabaseError> {
    Ok(EnvVariable {
        id: get_string(row, "id")?,
        project_id: get_string(row, "project_id")?,
        environment_id: get_string(row, "environment_id")?,
        key: get_string(row, "key")?,
        value: get_string(row, "value")?,
        created_at: get_timestamp(row, "created_at")?,
        updated_at: get_timestamp(row, "updated_at")?,
        deleted_at: get_optional_timestamp(row, "deleted_at")?,
    })
}
