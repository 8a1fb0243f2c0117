// マイグレーションファイル探索
//
// マイグレーションディレクトリを再帰的に走査して `.sql` ファイルを集め、
// フルパスの辞書順に並べて返します。

use crate::core::error::MigrationError;
use crate::core::migration::MigrationFile;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// マイグレーションファイルの拡張子
pub const MIGRATION_SUFFIX: &str = ".sql";

/// マイグレーション探索サービス
#[derive(Debug, Clone, Default)]
pub struct MigrationLoader;

impl MigrationLoader {
    /// ディレクトリ配下の `.sql` ファイルをパス順に収集
    ///
    /// 順序はフルパスの辞書順のみで決まるため、ファイル名には
    /// `0001_` のような連番プレフィックスを付けます。
    /// 異なるサブディレクトリに同じファイル名がある場合は
    /// 履歴テーブル上で区別できないためエラーとします。
    pub fn discover(dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
        if !dir.is_dir() {
            return Err(MigrationError::Discovery {
                path: dir.to_path_buf(),
                cause: "directory not found".to_string(),
            });
        }

        let mut paths = Vec::new();
        collect_sql_files(dir, &mut paths)?;
        // コンポーネント単位ではなくパス文字列の辞書順
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        let migrations: Vec<MigrationFile> =
            paths.iter().map(|p| MigrationFile::from_path(p)).collect();

        let mut seen: HashMap<&str, &Path> = HashMap::new();
        for migration in &migrations {
            if let Some(previous) = seen.insert(&migration.version, &migration.path) {
                return Err(MigrationError::Discovery {
                    path: dir.to_path_buf(),
                    cause: format!(
                        "duplicate migration file name '{}' ({:?} and {:?})",
                        migration.version, previous, migration.path
                    ),
                });
            }
        }

        Ok(migrations)
    }
}

fn collect_sql_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), MigrationError> {
    let discovery_error = |e: std::io::Error| MigrationError::Discovery {
        path: dir.to_path_buf(),
        cause: e.to_string(),
    };

    for entry in fs::read_dir(dir).map_err(discovery_error)? {
        let path = entry.map_err(discovery_error)?.path();
        if path.is_dir() {
            collect_sql_files(&path, out)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(MIGRATION_SUFFIX))
        {
            out.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_and_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("0002_envs.sql"), "").unwrap();
        fs::write(root.join("0001_projects.sql"), "").unwrap();
        fs::write(root.join("b").join("0003_vars.sql"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();

        let migrations = MigrationLoader::discover(root).unwrap();
        let versions: Vec<&str> = migrations.iter().map(|m| m.version.as_str()).collect();

        assert_eq!(
            versions,
            vec!["0001_projects.sql", "0002_envs.sql", "0003_vars.sql"]
        );
    }

    #[test]
    fn test_discover_orders_by_full_path_string() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("0001")).unwrap();
        fs::write(root.join("0001").join("b.sql"), "").unwrap();
        fs::write(root.join("0001-a.sql"), "").unwrap();

        let migrations = MigrationLoader::discover(root).unwrap();
        let versions: Vec<&str> = migrations.iter().map(|m| m.version.as_str()).collect();

        // '-' (0x2d) は '/' (0x2f) より前
        assert_eq!(versions, vec!["0001-a.sql", "b.sql"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = MigrationLoader::discover(&temp_dir.path().join("missing"));

        assert!(matches!(result, Err(MigrationError::Discovery { .. })));
    }

    #[test]
    fn test_discover_duplicate_basename() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("a")).unwrap();
        fs::create_dir(root.join("b")).unwrap();
        fs::write(root.join("a").join("0001_init.sql"), "").unwrap();
        fs::write(root.join("b").join("0001_init.sql"), "").unwrap();

        let err = MigrationLoader::discover(root).unwrap_err();
        assert!(err.to_string().contains("duplicate migration file name"));
    }

    #[test]
    fn test_discover_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let migrations = MigrationLoader::discover(temp_dir.path()).unwrap();
        assert!(migrations.is_empty());
    }
}
