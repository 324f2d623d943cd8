use crate::postgres::PostgresConfig;
use anyhow::{bail, Result};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Applies the SQL migrations under `migrations/postgres` by driving the goose CLI.
pub struct MigrationRunner {
    goose_binary_path: String,
    migrations_dir: String,
    dsn: String,
}

impl MigrationRunner {
    pub fn new(goose_binary_path: String, migrations_dir: String, dsn: String) -> Self {
        Self {
            goose_binary_path,
            migrations_dir,
            dsn,
        }
    }

    pub fn from_config(config: &PostgresConfig) -> Self {
        Self::new(
            config.goose_binary_path.clone(),
            config.migrations_dir.clone(),
            config.dsn(),
        )
    }

    /// Runs all pending migrations (`goose up`)
    pub async fn run_migrations(&self) -> Result<()> {
        debug!(migrations_dir = %self.migrations_dir, "running postgres migrations");

        let output = self.goose("up").await?;
        debug!(
            "migrations completed successfully:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
        Ok(())
    }

    /// Returns the goose status report for the configured database
    pub async fn migration_status(&self) -> Result<String> {
        let output = self.goose("status").await?;
        // goose writes its status table to stderr
        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(report)
    }

    async fn goose(&self, command: &str) -> Result<Output> {
        let output = Command::new(&self.goose_binary_path)
            .arg("-dir")
            .arg(&self.migrations_dir)
            .arg("postgres")
            .arg(&self.dsn)
            .arg(command)
            .output()
            .await?;

        if !output.status.success() {
            bail!(
                "goose {} failed.\nstdout: {}\nstderr: {}",
                command,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_goose_binary_is_an_error() {
        let runner = MigrationRunner::new(
            "/nonexistent/goose-binary".to_string(),
            "migrations/postgres".to_string(),
            PostgresConfig::default().dsn(),
        );

        assert!(runner.run_migrations().await.is_err());
    }
}
