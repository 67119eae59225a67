//! SQLite-backed document store.
//!
//! Every collection shares one `documents` table; payloads are JSON text in
//! the extended form produced by [`Value::to_json`](super::Value::to_json).

use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, params};
use tracing::warn;

use super::{Document, DocumentStore, Filter, StoreError, Value, document_from_json, stamp};

pub struct SqliteStore {
    name: String,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database named by `url`.
    ///
    /// Accepts `sqlite://path`, `sqlite:path`, a plain path, or `:memory:`.
    pub fn open(url: &str, name: &str) -> Result<Self, StoreError> {
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        let store = Self { name: name.to_owned(), conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents(
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL UNIQUE,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS documents_collection ON documents(collection, seq);",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("sqlite connection lock poisoned".to_owned()))
    }
}

impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_document(&self, kind: &str, payload: Document) -> Result<String, StoreError> {
        let (id, doc) = stamp(payload);
        let json = Value::Document(doc).to_json().to_string();
        self.lock()?.execute(
            "INSERT INTO documents (collection, id, payload) VALUES (?1, ?2, ?3)",
            params![kind, id, json],
        )?;
        Ok(id)
    }

    fn get_documents(&self, kind: &str, filter: &Filter, limit: usize) -> Result<Vec<Document>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let conn = self.lock()?;
        // Filters are evaluated on decoded documents, so the SQL limit only
        // applies when every row is a match.
        let sql_limit = if filter.is_empty() { i64::try_from(limit).unwrap_or(i64::MAX) } else { -1 };
        let mut stmt = conn.prepare(
            "SELECT id, payload FROM documents WHERE collection = ?1 ORDER BY seq LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![kind, sql_limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            match document_from_json(&payload) {
                Ok(doc) if filter.matches(&doc) => out.push(doc),
                Ok(_) => {}
                Err(e) => warn!(collection = kind, id = %id, "skipping undecodable document: {e}"),
            }
            if out.len() >= limit {
                break;
            }
        }
        Ok(out)
    }

    fn list_collection_names(&self) -> Result<Option<Vec<String>>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(names))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open("sqlite://:memory:", "maffa").unwrap()
    }

    #[test]
    fn round_trips_native_timestamps() {
        let store = store();
        let when = Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap();
        let mut doc = Document::new();
        doc.insert("title".into(), Value::from("Fabric"));
        doc.insert("date".into(), Value::Timestamp(when));
        let id = store.create_document("gig", doc).unwrap();

        let docs = store.get_documents("gig", &Filter::all(), 20).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["date"], Value::Timestamp(when));
        assert_eq!(docs[0]["_id"], Value::Text(id));
    }

    #[test]
    fn limit_and_filter_apply_in_insertion_order() {
        let store = store();
        for (title, city) in [("a", "Oslo"), ("b", "Rome"), ("c", "Oslo"), ("d", "Oslo")] {
            let doc = document_from_json(&format!(r#"{{"title":"{title}","city":"{city}"}}"#)).unwrap();
            store.create_document("gig", doc).unwrap();
        }

        let first_two = store.get_documents("gig", &Filter::all(), 2).unwrap();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1]["title"], Value::from("b"));

        let oslo = store.get_documents("gig", &Filter::all().eq("city", "Oslo"), 2).unwrap();
        let titles: Vec<_> = oslo.iter().map(|d| d["title"].clone()).collect();
        assert_eq!(titles, [Value::from("a"), Value::from("c")]);
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let store = store();
        store
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO documents (collection, id, payload) VALUES ('gig', 'x', 'not json')",
                [],
            )
            .unwrap();
        store.create_document("gig", Document::new()).unwrap();
        assert_eq!(store.get_documents("gig", &Filter::all(), 20).unwrap().len(), 1);
    }

    #[test]
    fn collection_names_are_distinct() {
        let store = store();
        store.create_document("message", Document::new()).unwrap();
        store.create_document("message", Document::new()).unwrap();
        assert_eq!(store.list_collection_names().unwrap(), Some(vec!["message".to_owned()]));
    }
}
