use std::net::SocketAddr;
use std::sync::Arc;

use maffa_api::api::{AppState, create_router};
use maffa_api::store::{Document, Filter, MemoryStore, StoreError, document_from_json};
use maffa_api::{Config, DocumentStore, MAX_BODY_BYTES, Server};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A database that is configured but refuses every operation.
struct FailingStore;

impl DocumentStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    fn create_document(&self, _kind: &str, _payload: Document) -> Result<String, StoreError> {
        Err(StoreError::Backend("write concern error: disk full".into()))
    }

    fn get_documents(&self, _kind: &str, _filter: &Filter, _limit: usize) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    fn list_collection_names(&self) -> Result<Option<Vec<String>>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
}

struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(store: Option<Arc<dyn DocumentStore>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = Config::from_vars(|k| match k {
            "DATABASE_URL" => Some("sqlite://:memory:".into()),
            "DATABASE_NAME" => Some("maffa".into()),
            _ => None,
        })
        .unwrap();
        let app = create_router(AppState { store, config });
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            Server::serve_with_shutdown(listener, app, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });
        Self { addr, shutdown: Some(tx), handle }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap();
    }
}

fn seeded_store(gigs: &[Value]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new("maffa"));
    for gig in gigs {
        store.insert_raw("gig", document_from_json(&gig.to_string()).unwrap()).unwrap();
    }
    store
}

fn valid_message() -> Value {
    json!({
        "name": "Ada",
        "email": "ada@example.com",
        "subject": "Booking",
        "message": "Would you play our warehouse party?"
    })
}

#[tokio::test]
async fn limit_returns_that_many_fully_populated_gigs() {
    let gigs: Vec<Value> = (1..=5)
        .map(|i| {
            let mut gig = json!({
                "title": format!("Night {i}"),
                "venue": "Panorama Bar",
                "city": "Berlin",
                "date": format!("2024-06-0{i}T20:00:00"),
                "is_confirmed": true,
            });
            if i == 1 {
                gig["ticket_url"] = json!("https://tickets.example/1");
            }
            gig
        })
        .collect();
    let server = TestServer::start(Some(seeded_store(&gigs))).await;

    let res = reqwest::get(server.url("/api/gigs?limit=2")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Vec<Value> = res.json().await.unwrap();
    assert_eq!(body.len(), 2);
    for gig in &body {
        for field in ["title", "venue", "city", "date", "is_confirmed"] {
            assert!(!gig[field].is_null(), "{field} missing in {gig}");
        }
    }
    assert_eq!(body[0]["title"], "Night 1");
    assert_eq!(body[0]["date"], "2024-06-01T20:00:00Z");
    assert_eq!(body[0]["ticket_url"], "https://tickets.example/1");
    assert!(body[1]["ticket_url"].is_null());

    server.stop().await;
}

#[tokio::test]
async fn default_limit_is_twenty() {
    let gigs: Vec<Value> = (0..25).map(|i| json!({"title": i.to_string()})).collect();
    let server = TestServer::start(Some(seeded_store(&gigs))).await;

    let body: Vec<Value> = reqwest::get(server.url("/api/gigs")).await.unwrap().json().await.unwrap();
    assert_eq!(body.len(), 20);

    server.stop().await;
}

#[tokio::test]
async fn malformed_gig_documents_are_defaulted() {
    let server = TestServer::start(Some(seeded_store(&[json!({"date": "not-a-date", "is_confirmed": 0})]))).await;

    let body: Vec<Value> = reqwest::get(server.url("/api/gigs")).await.unwrap().json().await.unwrap();
    assert_eq!(body[0]["title"], "");
    assert_eq!(body[0]["venue"], "");
    assert_eq!(body[0]["city"], "");
    assert_eq!(body[0]["is_confirmed"], false);
    assert!(body[0]["date"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn failing_store_lists_no_gigs_with_ok() {
    let server = TestServer::start(Some(Arc::new(FailingStore))).await;

    let res = reqwest::get(server.url("/api/gigs")).await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.json::<Value>().await.unwrap(), json!([]));

    server.stop().await;
}

#[tokio::test]
async fn failing_store_surfaces_contact_errors() {
    let server = TestServer::start(Some(Arc::new(FailingStore))).await;

    let res = reqwest::Client::new()
        .post(server.url("/api/contact"))
        .json(&valid_message())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("disk full"));

    server.stop().await;
}

#[tokio::test]
async fn contact_is_stored_and_acknowledged() {
    let store = Arc::new(MemoryStore::new("maffa"));
    let server = TestServer::start(Some(store.clone())).await;

    let res = reqwest::Client::new()
        .post(server.url("/api/contact"))
        .json(&valid_message())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    let id = body["id"].as_str().unwrap();
    assert!(!id.is_empty());

    let stored = store.get_documents("message", &Filter::all().eq("_id", id), 1).unwrap();
    assert_eq!(stored.len(), 1);

    server.stop().await;
}

#[tokio::test]
async fn malformed_contact_is_rejected_before_persistence() {
    let store = Arc::new(MemoryStore::new("maffa"));
    let server = TestServer::start(Some(store.clone())).await;

    let res = reqwest::Client::new()
        .post(server.url("/api/contact"))
        .json(&json!({"name": "Ada", "email": "nope", "message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 422);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"][0]["loc"], json!(["body", "email"]));
    assert!(store.get_documents("message", &Filter::all(), 10).unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn oversized_contact_body_is_rejected() {
    let store = Arc::new(MemoryStore::new("maffa"));
    let server = TestServer::start(Some(store.clone())).await;

    let mut message = valid_message();
    message["message"] = json!("x".repeat(MAX_BODY_BYTES + 1));
    let res = reqwest::Client::new()
        .post(server.url("/api/contact"))
        .json(&message)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    assert!(store.get_documents("message", &Filter::all(), 10).unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn diagnostic_reports_without_failing() {
    let server = TestServer::start(Some(Arc::new(FailingStore))).await;

    let res = reqwest::get(server.url("/test")).await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["backend"], "✅ Running");
    assert!(body["database"].as_str().unwrap().contains("Connected but Error"));
    assert_eq!(body["database_url"], "✅ Set");
    assert_eq!(body["database_name"], "✅ Set");
    assert!(!body.to_string().contains("memory"));

    server.stop().await;
}

#[tokio::test]
async fn cors_is_fully_open() {
    let server = TestServer::start(None).await;
    let client = reqwest::Client::new();

    let preflight = client
        .request(reqwest::Method::OPTIONS, server.url("/api/contact"))
        .header("origin", "https://maffa.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), 200);
    assert_eq!(preflight.headers()["access-control-allow-origin"], "https://maffa.example");
    assert_eq!(preflight.headers()["access-control-allow-headers"], "content-type");

    let res = client
        .get(server.url("/"))
        .header("origin", "https://maffa.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "https://maffa.example");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");
    assert_eq!(res.json::<Value>().await.unwrap()["message"], "MAFFA Backend Running");

    server.stop().await;
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let server = TestServer::start(None).await;

    let res = reqwest::get(server.url("/api/nothing")).await.unwrap();
    assert_eq!(res.status(), 404);

    server.stop().await;
}
