use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;

use pantry_api::app::{self, services::AppServices};
use pantry_core::ItemId;
use pantry_infra::{InMemoryItemStore, ItemStore};
use pantry_items::{Item, NewItem};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryItemStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build the same router as prod, wired to a seedable in-memory store,
        // bound to an ephemeral port.
        let store = Arc::new(InMemoryItemStore::new());
        let services = Arc::new(AppServices::new(store.clone()));
        let app = app::build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    async fn seed(&self, name: &str, price: i64, expiry_time: Option<DateTime<Utc>>) -> Item {
        self.store
            .insert(NewItem {
                name: name.to_string(),
                price,
                expiry_time,
            })
            .await
            .expect("seed item")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_returns_all_visible_items() {
    let srv = TestServer::spawn().await;
    for i in 0..5 {
        srv.seed(&format!("Item {i}"), 10 + i, None).await;
    }

    let res = reqwest::get(format!("{}/items", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn list_search_matches_substring_case_insensitively() {
    let srv = TestServer::spawn().await;
    srv.seed("Jacket", 100, None).await;
    srv.seed("Jacket blue", 120, None).await;
    srv.seed("Coat", 80, None).await;

    let res = reqwest::get(format!("{}/items?search=Ja", srv.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Jacket", "Jacket blue"]);
}

#[tokio::test]
async fn get_single_item_round_trips() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let res = reqwest::get(format!("{}/items/{}", srv.base_url, item.id))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Jacket");
    assert_eq!(body["price"], 100);
    assert_eq!(body["expiry_time"], serde_json::Value::Null);
}

#[tokio::test]
async fn get_unknown_or_malformed_id() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(format!("{}/items/{}", srv.base_url, ItemId::new()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = reqwest::get(format!("{}/items/not-a-uuid", srv.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expired_items_are_absent_from_get_and_head() {
    let srv = TestServer::spawn().await;
    let expired = srv
        .seed("Jacket", 100, Some(Utc::now() - Duration::minutes(5)))
        .await;
    let visible = srv.seed("Coat", 80, None).await;

    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/items/{}", srv.base_url, expired.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .head(format!("{}/items/{}", srv.base_url, expired.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .head(format!("{}/items/{}", srv.base_url, visible.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn put_replaces_name_and_price() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}", srv.base_url, item.id))
        .json(&json!({ "name": "T-shirt", "price": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "T-shirt");
    assert_eq!(body["price"], 15);
}

#[tokio::test]
async fn put_with_missing_name_reports_the_field() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}", srv.base_url, item.id))
        .json(&json!({ "nameX": "T-shirt" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["name"].is_array());
    assert!(body["fields"]["price"].is_array());
}

#[tokio::test]
async fn put_with_negative_price_never_mutates() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}", srv.base_url, item.id))
        .json(&json!({ "name": "T-shirt", "price": -50 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["fields"]["price"].is_array());

    // Unchanged on a subsequent read.
    let res = client
        .get(format!("{}/items/{}", srv.base_url, item.id))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Jacket");
    assert_eq!(body["price"], 100);
}

#[tokio::test]
async fn put_with_expire_in_schedules_expiry() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let before = Utc::now();
    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}?expire_in=60", srv.base_url, item.id))
        .json(&json!({ "name": "T-shirt", "price": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    let expiry: DateTime<Utc> = body["expiry_time"].as_str().unwrap().parse().unwrap();
    assert!(expiry >= before + Duration::minutes(60));
    assert!(expiry <= Utc::now() + Duration::minutes(60));
}

#[tokio::test]
async fn expiry_side_effect_survives_rejected_patch() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}?expire_in=-5", srv.base_url, item.id))
        .json(&json!({ "price": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The scheduled (past) expiry was committed before validation failed.
    let res = client
        .get(format!("{}/items/{}", srv.base_url, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_expire_in_hides_item_but_leaves_it_deletable() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}?expire_in=-5", srv.base_url, item.id))
        .json(&json!({ "name": "Jacket", "price": 100 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/items/{}", srv.base_url, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/items/{}", srv.base_url, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn put_on_expired_item_is_not_found() {
    let srv = TestServer::spawn().await;
    let item = srv
        .seed("Jacket", 100, Some(Utc::now() - Duration::minutes(5)))
        .await;

    let client = reqwest::Client::new();
    let res = client
        .put(format!("{}/items/{}", srv.base_url, item.id))
        .json(&json!({ "name": "T-shirt", "price": 15 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_single_item() {
    let srv = TestServer::spawn().await;
    let item = srv.seed("Jacket", 100, None).await;

    let client = reqwest::Client::new();
    let res = client
        .delete(format!("{}/items/{}", srv.base_url, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Gone now, including for a second delete.
    let res = client
        .delete(format!("{}/items/{}", srv.base_url, item.id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_delete_removes_everything_even_expired() {
    let srv = TestServer::spawn().await;
    srv.seed("Jacket", 100, None).await;
    srv.seed("Milk", 3, Some(Utc::now() - Duration::minutes(5)))
        .await;

    let client = reqwest::Client::new();
    let res = client
        .delete(format!("{}/items", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(format!("{}/items", srv.base_url)).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());

    // Bulk delete always succeeds, even with nothing left to delete.
    let res = client
        .delete(format!("{}/items", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn bulk_delete_with_search_removes_only_matches() {
    let srv = TestServer::spawn().await;
    srv.seed("Jacket", 100, None).await;
    srv.seed("Jacket blue", 120, None).await;
    srv.seed("Coat", 80, None).await;

    let client = reqwest::Client::new();
    let res = client
        .delete(format!("{}/items?search=jacket", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(format!("{}/items", srv.base_url)).send().await.unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Coat"]);
}
