//! Migration request - one SQL file bound for one project

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::result::{Error, Result};

/// A migration loaded from disk and addressed to a remote project
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub project_ref: String,
    pub migration_path: PathBuf,
    sql_content: String,
}

impl MigrationRequest {
    /// Build a request from already-loaded SQL
    pub fn new(
        project_ref: impl Into<String>,
        migration_path: impl Into<PathBuf>,
        sql_content: impl Into<String>,
    ) -> Self {
        Self {
            project_ref: project_ref.into(),
            migration_path: migration_path.into(),
            sql_content: sql_content.into(),
        }
    }

    /// Read the migration file into a request
    ///
    /// The caller is expected to have checked that the path exists.
    pub fn load(project_ref: impl Into<String>, migration_path: &Path) -> Result<Self> {
        let sql_content = std::fs::read_to_string(migration_path).map_err(|source| Error::Read {
            path: migration_path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(project_ref, migration_path, sql_content))
    }

    pub fn sql_content(&self) -> &str {
        &self.sql_content
    }

    /// File name of the migration, without directories
    pub fn file_name(&self) -> String {
        self.migration_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.migration_path.to_string_lossy().to_string())
    }

    /// Hex SHA-256 of the SQL text
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sql_content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_reads_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("001_init.sql");
        std::fs::write(&path, "CREATE TABLE a (id int);\nSELECT 1;\n").unwrap();

        let request = MigrationRequest::load("abc", &path).unwrap();
        assert_eq!(request.sql_content(), "CREATE TABLE a (id int);\nSELECT 1;\n");
        assert_eq!(request.file_name(), "001_init.sql");
        assert_eq!(request.project_ref, "abc");
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.sql");

        let err = MigrationRequest::load("abc", &path).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn test_checksum_is_stable_sha256() {
        let request = MigrationRequest::new("abc", "x.sql", "SELECT 1;");
        assert_eq!(request.checksum().len(), 64);
        assert_eq!(request.checksum(), MigrationRequest::new("zzz", "y.sql", "SELECT 1;").checksum());
        assert_ne!(request.checksum(), MigrationRequest::new("abc", "x.sql", "SELECT 2;").checksum());
    }
}
