use crate::models::assessment::{AssessmentRow, RiskAssessment};
use crate::models::applicant::ApplicantRecord;
use rusqlite::{params, Connection, OptionalExtension, Result};

const DB_SCHEMA_VERSION: i64 = 2;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("history database schema v{version} is newer than v{DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS assessments (
            id TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL,
            probability REAL NOT NULL,
            decision INTEGER,
            category TEXT NOT NULL,
            record_json TEXT NOT NULL DEFAULT '{}'
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    add_column_if_missing(conn, "assessments", "profile TEXT NOT NULL DEFAULT 'seven_input'")?;
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_assessments_created_at ON assessments(created_at);",
    )
}

fn add_column_if_missing(conn: &Connection, table: &str, column_def: &str) -> Result<()> {
    let column_name = column_def
        .split_whitespace()
        .next()
        .unwrap_or(column_def)
        .to_string();

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .filter_map(|res| res.ok())
        .any(|name| name == column_name);

    if !exists {
        conn.execute(&format!("ALTER TABLE {table} ADD COLUMN {column_def}"), [])?;
    }

    Ok(())
}

pub fn get_db_connection(workspace_path: &str) -> Result<Connection> {
    let db_path = std::path::Path::new(workspace_path)
        .join(crate::commands::settings::WORKSPACE_DIR)
        .join("history.db");
    let conn = Connection::open(db_path)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

pub fn insert_assessment(conn: &Connection, assessment: &RiskAssessment, record: &ApplicantRecord) -> Result<()> {
    let record_json = serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string());

    conn.execute(
        "INSERT INTO assessments (id, created_at, profile, probability, decision, category, record_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            assessment.id,
            assessment.created_at,
            assessment.profile,
            assessment.probability,
            assessment.decision,
            assessment.category.label,
            record_json,
        ],
    )?;

    Ok(())
}

/// Keep only the newest `keep` rows. Returns how many were removed.
pub fn prune_assessments(conn: &Connection, keep: u32) -> Result<usize> {
    conn.execute(
        "DELETE FROM assessments WHERE id NOT IN (
            SELECT id FROM assessments ORDER BY created_at DESC, rowid DESC LIMIT ?1
        )",
        params![keep as i64],
    )
}

pub fn load_assessment(conn: &Connection, id: &str) -> Result<Option<AssessmentRow>> {
    conn.query_row(
        "SELECT id, created_at, profile, probability, decision, category, record_json FROM assessments WHERE id = ?1",
        params![id],
        row_to_assessment,
    )
    .optional()
}

pub fn list_assessments(conn: &Connection, limit: u32) -> Result<Vec<AssessmentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, created_at, profile, probability, decision, category, record_json
         FROM assessments ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )?;

    let rows = stmt
        .query_map(params![limit as i64], row_to_assessment)?
        .filter_map(|r| r.ok())
        .collect();

    Ok(rows)
}

fn row_to_assessment(row: &rusqlite::Row<'_>) -> Result<AssessmentRow> {
    Ok(AssessmentRow {
        id: row.get(0)?,
        created_at: row.get(1)?,
        profile: row.get(2)?,
        probability: row.get(3)?,
        decision: row.get(4)?,
        category: row.get(5)?,
        record_json: row.get(6)?,
    })
}

pub async fn get_assessment_history(workspace_path: String, limit: Option<u32>) -> Result<Vec<AssessmentRow>, String> {
    crate::commands::settings::ensure_workspace_dir(&workspace_path)?;
    let conn = get_db_connection(&workspace_path)
        .map_err(|e| format!("DB error: {e}"))?;

    list_assessments(&conn, limit.unwrap_or(20))
        .map_err(|e| format!("Query error: {e}"))
}

pub async fn get_assessment(workspace_path: String, id: String) -> Result<Option<AssessmentRow>, String> {
    crate::commands::settings::ensure_workspace_dir(&workspace_path)?;
    let conn = get_db_connection(&workspace_path)
        .map_err(|e| format!("DB error: {e}"))?;

    load_assessment(&conn, &id).map_err(|e| format!("Read error: {e}"))
}
