use crate::logging::Logger;
use sqlx::{sqlite::SqliteQueryResult, SqlitePool};

/// Execute a SQL statement with the query logged first
///
/// Transparent wrapper for the data layer: the statement and its parameters
/// go to the log sink as a `sql` record, then the query runs unchanged.
/// Telemetry is best-effort, so the query executes whether or not the log
/// record is delivered.
pub async fn log_and_query(
    logger: &Logger,
    pool: &SqlitePool,
    sql: &str,
    params: &[&str],
) -> Result<SqliteQueryResult, sqlx::Error> {
    logger.log_sql_query(sql, params);

    let mut query = sqlx::query(sql);
    for param in params {
        query = query.bind(*param);
    }
    query.execute(pool).await
}
