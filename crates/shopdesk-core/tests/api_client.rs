use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use shopdesk_core::api::client::{ApiClient, ApiRequest, Navigator};
use shopdesk_core::api::models::{AppConfigs, User};
use shopdesk_core::error::ApiError;
use shopdesk_core::storage::session::Session;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Default)]
struct RecordingNavigator {
    count: AtomicUsize,
    last: Mutex<Option<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(path.to_string());
    }
}

fn admin() -> User {
    serde_json::from_value(json!({
        "id": "u1",
        "email": "admin@example.com",
        "name": "Admin",
        "role": "admin",
        "permissions": ["admin"]
    }))
    .unwrap()
}

fn signed_in_session() -> Session {
    let session = Session::in_memory();
    session
        .persist("tok-123", &admin(), Utc::now() + ChronoDuration::hours(1))
        .unwrap();
    session
}

fn client_for(server: &MockServer, session: Session) -> ApiClient {
    ApiClient::new(format!("{}/api", server.uri()), session).unwrap()
}

#[tokio::test]
async fn test_bearer_token_and_query_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/product"))
        .and(header("authorization", "Bearer tok-123"))
        .and(query_param("search", "shirt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"products": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, signed_in_session());
    assert!(client.is_authenticated());

    let envelope = client
        .list_resource(
            "/product",
            vec![
                ("search".to_string(), "shirt".to_string()),
                ("status".to_string(), String::new()),
            ],
        )
        .await
        .unwrap();
    assert!(envelope.success);
}

#[tokio::test]
async fn test_success_false_envelope_is_an_error_with_its_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/category"))
        .and(body_json(json!({"name": "Hats"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Category already exists"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let err = client
        .create_resource("/category", json!({"name": "Hats"}))
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Category already exists");
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_success_false_without_message_uses_default() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/product/p9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let err = client.delete_resource("/product", "p9").await.unwrap_err();
    assert_eq!(err.user_message(), "Something went wrong, Please try again!");
}

#[tokio::test]
async fn test_http_error_prefers_body_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/order/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Order not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/order/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());

    let err = client.get_resource("/order", "missing").await.unwrap_err();
    assert_eq!(err.user_message(), "Order not found");
    assert_eq!(err.status(), Some(404));

    let err = client.get_resource("/order", "broken").await.unwrap_err();
    assert_eq!(err.user_message(), "Internal Server Error");
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/order"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Token expired"
        })))
        .mount(&server)
        .await;

    let session = signed_in_session();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(&server, session.clone()).with_navigator(navigator.clone());

    let err = client.call(ApiRequest::get("/order")).await.unwrap_err();
    match err {
        ApiError::Unauthorized {
            status,
            server_message,
            ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(server_message, "Token expired");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(navigator.count.load(Ordering::SeqCst), 1);
    assert_eq!(navigator.last.lock().unwrap().as_deref(), Some("/auth/login"));
    assert!(session.token().is_none());
    assert!(session.user().unwrap().is_none());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_forbidden_does_not_clear_session() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/app-config"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Forbidden"})))
        .mount(&server)
        .await;

    let session = signed_in_session();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(&server, session.clone()).with_navigator(navigator.clone());

    let err = client
        .update_app_configs(&AppConfigs {
            shipping_cost: 10.0,
            pickup_address: "Main St 1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(navigator.count.load(Ordering::SeqCst), 0);
    assert_eq!(session.token().as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/app-config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "data": {}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client =
        ApiClient::with_timeout(format!("{}/api", server.uri()), Session::in_memory(), 1).unwrap();
    let err = client.get_app_configs().await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { timeout_secs: 1, .. }));
    assert_eq!(err.user_message(), "Request timed out after 1 seconds");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9/api", Session::in_memory()).unwrap();
    let err = client.get_resource("/product", "p1").await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }));
}

#[tokio::test]
async fn test_app_configs_and_contact_orders_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/app-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"shippingCost": 7.5, "pickupAddress": "Warehouse 2"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/order/contact"))
        .and(query_param("email", "jane@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"orders": [{"_id": "o1"}, {"_id": "o2"}]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let configs = client.get_app_configs().await.unwrap();
    assert_eq!(configs.shipping_cost, 7.5);
    assert_eq!(configs.pickup_address, "Warehouse 2");

    let orders = client.orders_by_contact("jane@example.com").await.unwrap();
    assert_eq!(orders.len(), 2);
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/product/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server, Session::in_memory());
    let err = client.get_resource("/product", "p1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
}
