use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{Semester, StudentRecord};
use crate::store::{BackendKind, RecordBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    Memory,
    File(PathBuf),
}

/// Accepts `sqlite::memory:`, `sqlite://<path>` and `sqlite:<path>`.
pub fn parse_connection_string(url: &str) -> Result<DbLocation, StoreError> {
    let url = url.trim();
    let rest = url.strip_prefix("sqlite:").ok_or_else(|| {
        StoreError::Unavailable(format!("unsupported connection string: {url}"))
    })?;
    if rest == ":memory:" || rest == "//:memory:" {
        return Ok(DbLocation::Memory);
    }
    let path = rest.strip_prefix("//").unwrap_or(rest);
    if path.is_empty() {
        return Err(StoreError::Unavailable(
            "connection string has no database path".into(),
        ));
    }
    Ok(DbLocation::File(PathBuf::from(path)))
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    location: DbLocation,
}

impl SqliteStore {
    pub fn open(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let location = parse_connection_string(url)?;
        let conn = match &location {
            DbLocation::Memory => Connection::open_in_memory().map_err(map_db_err)?,
            DbLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path).map_err(map_db_err)?
            }
        };
        conn.busy_timeout(timeout).map_err(map_db_err)?;
        init_schema(&conn).map_err(map_db_err)?;
        info!(location = ?location, "database store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection lock poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            career TEXT NOT NULL,
            origin_city TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            sort_order INTEGER NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    // Databases created before semesters were tracked lack the column.
    ensure_students_semester(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_sort ON students(sort_order)",
        [],
    )?;
    Ok(())
}

fn ensure_students_semester(conn: &Connection) -> rusqlite::Result<()> {
    if table_has_column(conn, "students", "semester")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE students ADD COLUMN semester TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Lock contention past the busy timeout is reported distinctly.
fn map_db_err(e: rusqlite::Error) -> StoreError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            StoreError::Unavailable(format!("database busy past timeout: {e}"))
        }
        _ => StoreError::from(e),
    }
}

fn require_id(rec: &StudentRecord) -> Result<&str, StoreError> {
    rec.id()
        .ok_or_else(|| StoreError::validation("record has no identity"))
}

fn insert_row(conn: &Connection, rec: &StudentRecord, sort_order: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO students(
           id,
           name,
           career,
           origin_city,
           phone,
           semester,
           sort_order,
           updated_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (
            rec.id.as_deref(),
            &rec.name,
            &rec.career,
            &rec.origin_city,
            &rec.phone,
            rec.semester.map(Semester::as_str),
            sort_order,
        ),
    )
}

impl RecordBackend for SqliteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    fn describe(&self) -> String {
        match &self.location {
            DbLocation::Memory => "sqlite::memory:".to_string(),
            DbLocation::File(p) => format!("sqlite://{}", p.to_string_lossy()),
        }
    }

    fn list(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, career, origin_city, phone, semester
                 FROM students
                 ORDER BY sort_order, rowid",
            )
            .map_err(map_db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let semester: Option<String> = row.get(5)?;
                Ok(StudentRecord {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    career: row.get(2)?,
                    origin_city: row.get(3)?,
                    phone: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    semester: semester.as_deref().and_then(Semester::parse),
                })
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .map_err(map_db_err)?;
        Ok(rows)
    }

    fn insert(&self, record: &StudentRecord) -> Result<(), StoreError> {
        require_id(record)?;
        let conn = self.conn()?;
        let sort_order: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM students",
                [],
                |r| r.get(0),
            )
            .map_err(map_db_err)?;
        insert_row(&conn, record, sort_order).map_err(map_db_err)?;
        Ok(())
    }

    fn replace(&self, id: &str, record: &StudentRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE students
                 SET name = ?, career = ?, origin_city = ?, phone = ?, semester = ?,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
                 WHERE id = ?",
                (
                    &record.name,
                    &record.career,
                    &record.origin_city,
                    &record.phone,
                    record.semester.map(Semester::as_str),
                    id,
                ),
            )
            .map_err(map_db_err)?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| r.get(0))
            .optional()
            .map_err(map_db_err)?;
        if exists.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        conn.execute("DELETE FROM students WHERE id = ?", [id])
            .map_err(map_db_err)?;
        Ok(())
    }

    fn replace_all(&self, records: &[StudentRecord]) -> Result<(), StoreError> {
        for rec in records {
            require_id(rec)?;
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(map_db_err)?;
        tx.execute("DELETE FROM students", []).map_err(map_db_err)?;
        for (i, rec) in records.iter().enumerate() {
            // Dropping `tx` on error rolls the whole batch back.
            insert_row(&tx, rec, i as i64).map_err(map_db_err)?;
        }
        tx.commit().map_err(map_db_err)?;
        debug!(count = records.len(), "replaced student set");
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), StoreError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| StoreError::Unavailable("database connection lock poisoned".into()))?;
        conn.close().map_err(|(_, e)| map_db_err(e))
    }
}
