//! SQLite store for document records.
//!
//! Records are opaque JSON documents in a single table, stamped with a
//! generated identifier and insertion timestamp. Stored records are never
//! updated in place.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{DocumentRecord, StoredDocument, StoredDocumentSummary};

pub struct DocumentDb {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentDb {
    /// Create or open the database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("failed to create data dir: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("failed to open database: {e}")))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("failed to open in-memory database: {e}")))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::Storage(format!("failed to set pragmas: {e}")))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                extension TEXT NOT NULL,
                doc_type TEXT,
                content TEXT NOT NULL,
                clean_content TEXT NOT NULL,
                images TEXT NOT NULL,
                fields TEXT NOT NULL,
                tables_json TEXT NOT NULL,
                rules TEXT NOT NULL,
                validation TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at);
        "#,
        )
        .map_err(|e| Error::Storage(format!("migration failed: {e}")))?;

        Ok(())
    }

    /// Insert a document, returning its generated identifier. The insertion
    /// timestamp is stamped here.
    pub fn insert(&self, document: &StoredDocument) -> Result<DocumentRecord> {
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            document: document.clone(),
        };

        let images = serde_json::to_string(&record.document.images)
            .map_err(|e| Error::Storage(format!("failed to serialize images: {e}")))?;
        let fields = record.document.fields.to_string();
        let tables = record.document.tables.to_string();
        let rules = record.document.rules.to_string();
        let validation = record
            .document
            .validation
            .as_ref()
            .map(|v| serde_json::to_string(v))
            .transpose()
            .map_err(|e| Error::Storage(format!("failed to serialize validation: {e}")))?;

        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO documents
                (id, filename, extension, doc_type, content, clean_content,
                 images, fields, tables_json, rules, validation, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
            params![
                record.id.to_string(),
                record.document.filename,
                record.document.extension,
                record.document.doc_type,
                record.document.content,
                record.document.clean_content,
                images,
                fields,
                tables,
                rules,
                validation,
                record.created_at,
            ],
        )
        .map_err(|e| Error::Storage(format!("insert failed: {e}")))?;

        Ok(record)
    }

    /// Fetch one record by id.
    pub fn get(&self, id: &Uuid) -> Result<Option<DocumentRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            r#"
            SELECT id, filename, extension, doc_type, content, clean_content,
                   images, fields, tables_json, rules, validation, created_at
            FROM documents WHERE id = ?1
        "#,
            params![id.to_string()],
            row_to_record,
        )
        .optional()
        .map_err(|e| Error::Storage(format!("query failed: {e}")))?
        .transpose()
    }

    /// List summaries of all stored documents, newest first.
    pub fn list(&self) -> Result<Vec<StoredDocumentSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, filename, doc_type, created_at FROM documents \
                 ORDER BY created_at DESC",
            )
            .map_err(|e| Error::Storage(format!("prepare failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                Ok((
                    id,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, DateTime<Utc>>(3)?,
                ))
            })
            .map_err(|e| Error::Storage(format!("query failed: {e}")))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, filename, doc_type, created_at) =
                row.map_err(|e| Error::Storage(format!("row decode failed: {e}")))?;
            summaries.push(StoredDocumentSummary {
                id: parse_uuid(&id)?,
                filename,
                doc_type,
                created_at,
            });
        }

        Ok(summaries)
    }

    /// Delete a record; returns whether anything was removed.
    pub fn delete(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn
            .execute("DELETE FROM documents WHERE id = ?1", params![id.to_string()])
            .map_err(|e| Error::Storage(format!("delete failed: {e}")))?;
        Ok(deleted > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Storage(format!("count failed: {e}")))?;
        Ok(count as usize)
    }
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| Error::Storage(format!("corrupt id column: {e}")))
}

fn parse_json(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or(serde_json::Value::Null)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<DocumentRecord>> {
    let id: String = row.get(0)?;
    let filename: String = row.get(1)?;
    let extension: String = row.get(2)?;
    let doc_type: Option<String> = row.get(3)?;
    let content: String = row.get(4)?;
    let clean_content: String = row.get(5)?;
    let images: String = row.get(6)?;
    let fields: String = row.get(7)?;
    let tables: String = row.get(8)?;
    let rules: String = row.get(9)?;
    let validation: Option<String> = row.get(10)?;
    let created_at: DateTime<Utc> = row.get(11)?;

    Ok(build_record(
        id,
        filename,
        extension,
        doc_type,
        content,
        clean_content,
        images,
        fields,
        tables,
        rules,
        validation,
        created_at,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_record(
    id: String,
    filename: String,
    extension: String,
    doc_type: Option<String>,
    content: String,
    clean_content: String,
    images: String,
    fields: String,
    tables: String,
    rules: String,
    validation: Option<String>,
    created_at: DateTime<Utc>,
) -> Result<DocumentRecord> {
    let images = serde_json::from_str(&images)
        .map_err(|e| Error::Storage(format!("corrupt images column: {e}")))?;
    let validation = validation
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| Error::Storage(format!("corrupt validation column: {e}")))?;

    Ok(DocumentRecord {
        id: parse_uuid(&id)?,
        created_at,
        document: StoredDocument {
            filename,
            extension,
            doc_type,
            content,
            clean_content,
            images,
            fields: parse_json(&fields),
            tables: parse_json(&tables),
            rules: parse_json(&rules),
            validation,
        },
    })
}
