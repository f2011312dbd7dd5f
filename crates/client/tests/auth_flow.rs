//! Authentication flow against a fake repository: idempotence, ordering
//! guard and the no-partial-store failure contract.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use qix::{ClientConfig, EngineClient, Error, HttpClient, HttpMethod, HttpResponse};

/// Canned repository endpoint recording every request it answers.
struct FakeRepository {
    status: u16,
    body: Value,
    calls: AtomicUsize,
    urls: parking_lot::Mutex<Vec<String>>,
}

impl FakeRepository {
    fn new(status: u16, body: Value) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            calls: AtomicUsize::new(0),
            urls: parking_lot::Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeRepository {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        _body: Option<Value>,
    ) -> qix::Result<HttpResponse> {
        assert_eq!(method, HttpMethod::Get);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> qix::Result<Vec<u8>> {
        Ok(url.as_bytes().to_vec())
    }
}

fn identity_body() -> Value {
    json!([{"userDirectory": "CORP", "userId": "ada", "name": "Ada"}])
}

#[tokio::test]
async fn authenticate_resolves_once_and_reuses_the_identity() {
    let repository = FakeRepository::new(200, identity_body());
    let client = EngineClient::new(ClientConfig::new("t.cloud.example"))
        .with_http(repository.clone());
    client.attach(common::demo_engine());

    let first = client.authenticate().await.unwrap();
    assert_eq!(first.directory, "CORP");
    assert_eq!(first.user_id, "ada");
    assert_eq!(
        repository.urls.lock()[0],
        "https://t.cloud.example/qrs/user/full"
    );

    // The second call answers from the stored identity, no round trip.
    let second = client.authenticate().await.unwrap();
    assert_eq!(second.user_id, "ada");
    assert_eq!(repository.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn authenticate_requires_a_completed_connect() {
    let repository = FakeRepository::new(200, identity_body());
    let client = EngineClient::new(ClientConfig::new("t.cloud.example"))
        .with_http(repository.clone());

    let error = client.authenticate().await.unwrap_err();
    assert!(matches!(error, Error::Auth(_)));
    assert_eq!(repository.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_whoami_stores_no_identity() {
    let repository = FakeRepository::new(500, identity_body());
    let client = EngineClient::new(ClientConfig::new("t.cloud.example"))
        .with_http(repository.clone());
    client.attach(common::demo_engine());

    let error = client.authenticate().await.unwrap_err();
    assert!(matches!(error, Error::Auth(_)));

    // Nothing was cached; the next attempt goes back to the repository.
    let error = client.authenticate().await.unwrap_err();
    assert!(matches!(error, Error::Auth(_)));
    assert_eq!(repository.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn ticket_is_percent_encoded_into_the_query() {
    let repository = FakeRepository::new(200, identity_body());
    let client = EngineClient::new(ClientConfig::new("srv").with_ticket("abc/12 3"))
        .with_http(repository.clone());
    client.attach(common::demo_engine());

    client.authenticate().await.unwrap();
    assert_eq!(
        repository.urls.lock()[0],
        "https://srv/qrs/user/full?qlikTicket=abc%2F12+3"
    );
}
