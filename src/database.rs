use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};

use crate::approach::{Approach, ApproachSubmission};
use crate::create_timestamp;

const DATABASE_NAME: &str = "approaches.sqlite3";

pub fn get_db_path() -> anyhow::Result<PathBuf> {
    use anyhow::Context;
    use directories::ProjectDirs;

    let proj_dirs =
        ProjectDirs::from("", "", "approaches").context("Unable to find user directory")?;
    let data_dir = proj_dirs.data_local_dir();

    fs::create_dir_all(data_dir).context("Failed to create local data dir")?;

    Ok(data_dir.join(DATABASE_NAME))
}

/// Opens (creating if needed) the database and its schema.
///
/// The pool holds a single connection, so a transaction that checks the
/// quota and then writes cannot interleave with another request's.
pub async fn init_db(db_path: impl AsRef<Path>) -> sqlx::Result<SqlitePool> {
    let db_url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display()); // rwc = read/write/create
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(0)
        .connect(&db_url)
        .await?;

    // PRAGMA statements cannot run inside a transaction
    for pragma_sql in &[
        "PRAGMA foreign_keys = ON;",
        "PRAGMA busy_timeout = 2000;", // 2 seconds timeout for lock contention
        "PRAGMA journal_mode = WAL;",
        "PRAGMA synchronous = NORMAL;",
    ] {
        sqlx::query(pragma_sql).execute(&db_pool).await?;
    }

    let mut tx = db_pool.begin().await?;

    for sql in &[
        r"
        CREATE TABLE IF NOT EXISTS approaches (
            id             INTEGER  PRIMARY KEY AUTOINCREMENT,
            user_id        INTEGER  NOT NULL,
            question_id    INTEGER  NOT NULL,
            text_content   TEXT     NOT NULL,
            code_content   TEXT     NOT NULL,
            code_language  TEXT     NOT NULL,
            created_time   TEXT     NOT NULL,
            updated_time   TEXT     NOT NULL
        );",
        "CREATE INDEX IF NOT EXISTS idx_approaches_owner ON approaches(user_id, question_id);",
    ] {
        sqlx::query(sql).execute(tx.as_mut()).await?;
    }

    tx.commit().await?;

    log::info!("Initialized database at {}", db_path.as_ref().display());

    Ok(db_pool)
}

pub fn remove_db(db_path: impl AsRef<Path>) {
    // Remove WAL and SHM files (ignore errors as they might not exist)
    let wal_path = format!("{}-wal", db_path.as_ref().display());
    let shm_path = format!("{}-shm", db_path.as_ref().display());
    let _ = fs::remove_file(wal_path);
    let _ = fs::remove_file(shm_path);

    if let Err(e) = std::fs::remove_file(&db_path) {
        log::warn!(
            "Unable to remove database at {}: {e}",
            db_path.as_ref().display()
        );
    } else {
        log::info!("Removed database at {}", db_path.as_ref().display());
    }
}

#[derive(sqlx::FromRow)]
struct ApproachRow {
    id: u32,
    user_id: u32,
    question_id: u32,
    text_content: String,
    code_content: String,
    code_language: String,
    created_time: String,
    updated_time: String,
}

fn parse_time(value: &str) -> sqlx::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl TryFrom<ApproachRow> for Approach {
    type Error = sqlx::Error;

    fn try_from(row: ApproachRow) -> sqlx::Result<Self> {
        Ok(Approach {
            id: row.id,
            user_id: row.user_id,
            question_id: row.question_id,
            text_content: row.text_content,
            code_content: row.code_content,
            code_language: row.code_language,
            created_at: parse_time(&row.created_time)?,
            updated_at: parse_time(&row.updated_time)?,
        })
    }
}

const SELECT_APPROACH: &str = "SELECT id, user_id, question_id, text_content, code_content, \
     code_language, created_time, updated_time FROM approaches";

/// Inserts a new approach on `conn` and returns it as stored.
///
/// Callers that check the quota first run both on the same transaction.
///
/// # Errors
///
/// This function will return an `Err` in the following cases:
///
/// - If the insertion into the `approaches` table fails.
/// - If the inserted row cannot be read back or its timestamps do not parse.
pub async fn create_approach_tx(
    conn: &mut SqliteConnection,
    user_id: u32,
    question_id: u32,
    body: &ApproachSubmission,
) -> sqlx::Result<Approach> {
    let now = create_timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO approaches (user_id, question_id, text_content, code_content, code_language, created_time, updated_time)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(question_id)
    .bind(&body.text_content)
    .bind(&body.code_content)
    .bind(&body.code_language)
    .bind(&now)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid() as u32;
    log::debug!("Inserted approach {id} for user {user_id} on question {question_id}");

    fetch_approach_tx(conn, id).await
}

/// Inserts a new approach in a transaction of its own.
///
/// # Errors
///
/// Same as [`create_approach_tx`], plus failures to begin or commit.
pub async fn create_approach(
    user_id: u32,
    question_id: u32,
    body: &ApproachSubmission,
    pool: Arc<SqlitePool>,
) -> sqlx::Result<Approach> {
    let mut tx = pool.begin().await?;
    let approach = create_approach_tx(tx.as_mut(), user_id, question_id, body).await?;
    tx.commit().await?;
    Ok(approach)
}

pub async fn fetch_approach_tx(conn: &mut SqliteConnection, id: u32) -> sqlx::Result<Approach> {
    let row = sqlx::query_as::<_, ApproachRow>(&format!("{SELECT_APPROACH} WHERE id = ?"))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    row.try_into()
}

/// # Errors
///
/// Returns [`sqlx::Error::RowNotFound`] when no approach has this id.
pub async fn fetch_approach(id: u32, pool: Arc<SqlitePool>) -> sqlx::Result<Approach> {
    let mut conn = pool.acquire().await?;
    fetch_approach_tx(&mut conn, id).await
}

/// All approaches a user holds for a question, oldest first.
///
/// # Errors
///
/// Returns an `Err` if the query fails or a stored timestamp does not parse.
pub async fn list_approaches_tx(
    conn: &mut SqliteConnection,
    user_id: u32,
    question_id: u32,
) -> sqlx::Result<Vec<Approach>> {
    let rows = sqlx::query_as::<_, ApproachRow>(&format!(
        "{SELECT_APPROACH} WHERE user_id = ? AND question_id = ? ORDER BY created_time, id"
    ))
    .bind(user_id)
    .bind(question_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Approach::try_from).collect()
}

pub async fn list_approaches(
    user_id: u32,
    question_id: u32,
    pool: Arc<SqlitePool>,
) -> sqlx::Result<Vec<Approach>> {
    let mut conn = pool.acquire().await?;
    list_approaches_tx(&mut conn, user_id, question_id).await
}

/// Replaces the content of an approach and bumps its update time.
///
/// # Errors
///
/// This function will return an `Err` in the following cases:
///
/// - [`sqlx::Error::RowNotFound`] if no approach has this id.
/// - If the update or the read-back of the row fails.
pub async fn update_approach_tx(
    conn: &mut SqliteConnection,
    id: u32,
    body: &ApproachSubmission,
) -> sqlx::Result<Approach> {
    let now = create_timestamp();

    let affected = sqlx::query(
        r#"
        UPDATE approaches
        SET text_content = ?, code_content = ?, code_language = ?, updated_time = ?
        WHERE id = ?
        "#,
    )
    .bind(&body.text_content)
    .bind(&body.code_content)
    .bind(&body.code_language)
    .bind(&now)
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    fetch_approach_tx(conn, id).await
}

/// # Errors
///
/// Same as [`update_approach_tx`], plus failures to begin or commit.
pub async fn update_approach(
    id: u32,
    body: &ApproachSubmission,
    pool: Arc<SqlitePool>,
) -> sqlx::Result<Approach> {
    let mut tx = pool.begin().await?;
    let approach = update_approach_tx(tx.as_mut(), id, body).await?;
    tx.commit().await?;
    Ok(approach)
}

/// # Errors
///
/// Returns [`sqlx::Error::RowNotFound`] when no approach has this id.
pub async fn delete_approach(id: u32, pool: Arc<SqlitePool>) -> sqlx::Result<()> {
    let affected = sqlx::query("DELETE FROM approaches WHERE id = ?")
        .bind(id)
        .execute(pool.as_ref())
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn count_approaches(pool: Arc<SqlitePool>) -> sqlx::Result<u32> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM approaches")
        .fetch_one(pool.as_ref())
        .await?;
    Ok(count as u32)
}
