use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::postgres::PostgresClient;

/// Embedded schema migrations in apply order, as `(name, goose-format sql)`
pub const MIGRATIONS: &[(&str, &str)] = &[(
    "00001_create_user_roles",
    include_str!("../../migrations/00001_create_user_roles.sql"),
)];

const UP_MARKER: &str = "-- +goose Up";
const DOWN_MARKER: &str = "-- +goose Down";

/// The statements of a goose-format migration that apply it
pub fn up_section(sql: &str) -> &str {
    let start = sql.find(UP_MARKER).map_or(0, |i| i + UP_MARKER.len());
    let rest = &sql[start..];
    let end = rest.find(DOWN_MARKER).unwrap_or(rest.len());
    rest[..end].trim()
}

/// Apply every embedded migration. Statements are idempotent, so this is
/// safe to run on each startup.
pub async fn run_migrations(client: &PostgresClient) -> Result<()> {
    let conn = client.get_connection().await?;
    for (name, sql) in MIGRATIONS {
        debug!(migration = %name, "applying migration");
        conn.batch_execute(up_section(sql))
            .await
            .with_context(|| format!("migration {} failed", name))?;
    }
    info!(count = MIGRATIONS.len(), "postgres migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_section_excludes_down() {
        let sql = "-- +goose Up\nCREATE TABLE t (id INT);\n\n-- +goose Down\nDROP TABLE t;\n";
        assert_eq!(up_section(sql), "CREATE TABLE t (id INT);");
    }

    #[test]
    fn test_embedded_migrations_create_user_roles() {
        let (_, sql) = MIGRATIONS[0];
        let up = up_section(sql);
        assert!(up.contains("CREATE TABLE IF NOT EXISTS user_roles"));
        assert!(!up.contains("DROP TABLE"));
    }
}
