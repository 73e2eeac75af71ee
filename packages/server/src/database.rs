use std::future::Future;
use std::path::Path;
use std::time::Duration;

use common::retry::{RetryPolicy, retry_if};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::error::AppError;

/// Create the parent directory of a file-backed SQLite database, which
/// SQLite will not do itself. Other URLs are left alone.
pub fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(rest) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if file.is_empty() || file == ":memory:" {
        return Ok(());
    }
    match Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("folio::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Connection-level failures that a fresh attempt may get past.
pub fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

/// Run a read query, retrying on transient connection errors.
///
/// Exhausted retries surface as [`AppError::Unavailable`].
pub async fn with_read_retry<T, F, Fut>(op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    with_read_retry_policy(&RetryPolicy::default(), op).await
}

/// [`with_read_retry`] under an explicit backoff policy.
pub async fn with_read_retry_policy<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    retry_if(policy, is_transient, op)
        .await
        .map_err(|e| {
            if is_transient(&e) {
                tracing::error!(error = %e, "Database unavailable after retries");
                AppError::Unavailable
            } else {
                AppError::from(e)
            }
        })
}
