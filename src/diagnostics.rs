//! Best-effort database diagnostics behind `GET /test`.

use serde::Serialize;

use crate::config::Config;
use crate::store::{BACKEND_AVAILABLE, DocumentStore};

/// Collection names included in a report.
const MAX_COLLECTIONS: usize = 10;
/// Error text is cut to this many characters before it is reported.
const MAX_ERROR_CHARS: usize = 50;

/// What the diagnostic learned about the database, computed fresh per call.
#[derive(Clone, Debug, PartialEq)]
pub enum DatabaseState {
    /// No store backend is compiled into this build.
    ModuleMissing,
    /// A backend exists but no store was opened at startup.
    ClientUninitialized,
    /// The store is open but cannot enumerate its collections.
    Connected,
    /// The store is open and failed while listing collections.
    ConnectedWithListError(String),
    /// The store is open and listed its collections.
    ConnectedAndWorking(Vec<String>),
}

impl DatabaseState {
    pub fn probe(store: Option<&dyn DocumentStore>) -> Self {
        let Some(store) = store else {
            return if BACKEND_AVAILABLE { Self::ClientUninitialized } else { Self::ModuleMissing };
        };
        match store.list_collection_names() {
            Ok(Some(mut names)) => {
                names.truncate(MAX_COLLECTIONS);
                Self::ConnectedAndWorking(names)
            }
            Ok(None) => Self::Connected,
            Err(e) => Self::ConnectedWithListError(e.to_string().chars().take(MAX_ERROR_CHARS).collect()),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::ModuleMissing => "❌ Database module not found (build with the `sqlite` feature)".to_owned(),
            Self::ClientUninitialized => "⚠️  Available but not initialized".to_owned(),
            Self::Connected => "✅ Available".to_owned(),
            Self::ConnectedWithListError(e) => format!("⚠️  Connected but Error: {e}"),
            Self::ConnectedAndWorking(_) => "✅ Connected & Working".to_owned(),
        }
    }

    fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::ConnectedWithListError(_) | Self::ConnectedAndWorking(_))
    }
}

/// Body of `GET /test`. Configuration is reported by presence only.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub backend: &'static str,
    pub database: String,
    pub database_url: &'static str,
    pub database_name: &'static str,
    pub connection_status: &'static str,
    pub collections: Vec<String>,
}

/// Builds the diagnostic report. Never fails: every problem becomes text.
pub fn test_database(store: Option<&dyn DocumentStore>, config: &Config) -> Report {
    let state = DatabaseState::probe(store);
    let collections = match &state {
        DatabaseState::ConnectedAndWorking(names) => names.clone(),
        _ => Vec::new(),
    };
    Report {
        backend: "✅ Running",
        database: state.label(),
        database_url: presence(config.database_url.is_some()),
        database_name: presence(config.database_name.is_some()),
        connection_status: if state.is_connected() { "Connected" } else { "Not Connected" },
        collections,
    }
}

impl Report {
    /// Report for a probe that could not run at all.
    pub fn failed(error: &str, config: &Config) -> Self {
        let error: String = error.chars().take(MAX_ERROR_CHARS).collect();
        Self {
            backend: "✅ Running",
            database: format!("❌ Error: {error}"),
            database_url: presence(config.database_url.is_some()),
            database_name: presence(config.database_name.is_some()),
            connection_status: "Not Connected",
            collections: Vec::new(),
        }
    }
}

fn presence(set: bool) -> &'static str {
    if set { "✅ Set" } else { "❌ Not Set" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, Filter, MemoryStore, StoreError};

    struct Opaque;

    impl DocumentStore for Opaque {
        fn name(&self) -> &str { "opaque" }
        fn create_document(&self, _: &str, _: Document) -> Result<String, StoreError> {
            Ok("1".into())
        }
        fn get_documents(&self, _: &str, _: &Filter, _: usize) -> Result<Vec<Document>, StoreError> {
            Ok(Vec::new())
        }
    }

    struct Broken;

    impl DocumentStore for Broken {
        fn name(&self) -> &str { "broken" }
        fn create_document(&self, _: &str, _: Document) -> Result<String, StoreError> {
            Err(StoreError::Backend("down".into()))
        }
        fn get_documents(&self, _: &str, _: &Filter, _: usize) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Backend("down".into()))
        }
        fn list_collection_names(&self) -> Result<Option<Vec<String>>, StoreError> {
            Err(StoreError::Backend("x".repeat(80)))
        }
    }

    fn config(url: Option<&str>) -> Config {
        Config::from_vars(|k| match k {
            "DATABASE_URL" => url.map(str::to_owned),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn without_a_store() {
        let report = test_database(None, &config(None));
        let expected = if BACKEND_AVAILABLE {
            DatabaseState::ClientUninitialized
        } else {
            DatabaseState::ModuleMissing
        };
        assert_eq!(report.database, expected.label());
        assert_eq!(report.connection_status, "Not Connected");
        assert_eq!(report.database_url, "❌ Not Set");
        assert!(report.collections.is_empty());
    }

    #[test]
    fn working_store_lists_at_most_ten_collections() {
        let store = MemoryStore::new("maffa");
        for i in 0..12 {
            store.insert_raw(&format!("c{i:02}"), Document::new()).unwrap();
        }
        let report = test_database(Some(&store), &config(Some("secret://value")));
        assert_eq!(report.database, "✅ Connected & Working");
        assert_eq!(report.collections.len(), 10);
        assert_eq!(report.database_url, "✅ Set");
        assert_eq!(report.database_name, "❌ Not Set");
    }

    #[test]
    fn list_errors_are_truncated() {
        let state = DatabaseState::probe(Some(&Broken));
        let DatabaseState::ConnectedWithListError(msg) = &state else { panic!("{state:?}") };
        assert_eq!(msg.chars().count(), 50);
        assert_eq!(test_database(Some(&Broken), &config(None)).connection_status, "Connected");
    }

    #[test]
    fn stores_without_introspection_are_just_connected() {
        assert_eq!(DatabaseState::probe(Some(&Opaque)), DatabaseState::Connected);
    }

    #[test]
    fn failed_probe_is_still_a_report() {
        let report = Report::failed("task panicked", &config(None));
        assert_eq!(report.database, "❌ Error: task panicked");
        assert_eq!(report.backend, "✅ Running");
    }

    #[test]
    fn report_never_echoes_configuration_values() {
        let report = test_database(None, &config(Some("sqlite:///srv/secret.db")));
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("secret"));
    }
}
