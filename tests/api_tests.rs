use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use roadside_dispatch::config::EnvironmentConfig;
use roadside_dispatch::routes::create_app_router;
use roadside_dispatch::state::AppState;

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory(EnvironmentConfig::default());
        Self {
            router: create_app_router(state),
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Partner dado de alta y disponible en (lat, lng)
    async fn partner_at(&self, latitude: f64, longitude: f64) -> String {
        let (status, body) = self
            .post(
                "/partner",
                json!({ "user_id": uuid::Uuid::new_v4(), "service_type_id": 1 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = self
            .put(
                "/location/partner",
                json!({ "partner_id": id, "latitude": latitude, "longitude": longitude }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    async fn request_at(&self, user_id: &str, latitude: f64, longitude: f64) -> String {
        let (status, body) = self
            .post(
                "/request",
                json!({
                    "user_id": user_id,
                    "service_type_id": 1,
                    "latitude": latitude,
                    "longitude": longitude,
                    "description": "Batería descargada"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_full_fulfillment_flow() {
    let app = TestApp::new();
    let user_id = uuid::Uuid::new_v4().to_string();
    let partner_id = app.partner_at(36.76, 3.06).await;
    let request_id = app.request_at(&user_id, 36.75, 3.06).await;

    let (status, body) = app.get(&format!("/request/{}", request_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PENDING");
    assert!(body["data"]["partner_id"].is_null());

    let (status, body) = app
        .patch(
            &format!("/request/{}/status", request_id),
            json!({ "status": "ACCEPTED", "partner_id": partner_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ACCEPTED");
    assert_eq!(body["data"]["partner_id"], partner_id.as_str());

    let (status, body) = app
        .post(&format!("/request/{}/complete", request_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");

    let (status, body) = app
        .post(
            "/transaction",
            json!({ "request_id": request_id, "partner_id": partner_id, "amount": "100.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tax_amount"], "15.00");
    assert_eq!(body["data"]["total_amount"], "115.00");
    assert_eq!(body["data"]["payment_status"], "UNPAID");
    let transaction_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .patch(
            &format!("/transaction/{}/status", transaction_id),
            json!({ "payment_status": "PAID" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "PAID");

    let (status, body) = app
        .post(&format!("/transaction/{}/refund", transaction_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "REFUNDED");

    let (status, body) = app.get(&format!("/transaction/user/{}", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], transaction_id.as_str());
}

#[tokio::test]
async fn test_illegal_transition_is_conflict() {
    let app = TestApp::new();
    let request_id = app
        .request_at(&uuid::Uuid::new_v4().to_string(), 36.75, 3.06)
        .await;

    let (status, body) = app
        .patch(
            &format!("/request/{}/status", request_id),
            json!({ "status": "COMPLETED" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_transaction_partner_mismatch_is_bad_request() {
    let app = TestApp::new();
    let partner_id = app.partner_at(36.75, 3.06).await;
    let request_id = app
        .request_at(&uuid::Uuid::new_v4().to_string(), 36.75, 3.06)
        .await;
    app.patch(
        &format!("/request/{}/status", request_id),
        json!({ "status": "ACCEPTED", "partner_id": partner_id }),
    )
    .await;

    let (status, body) = app
        .post(
            "/transaction",
            json!({
                "request_id": request_id,
                "partner_id": uuid::Uuid::new_v4(),
                "amount": 40
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ASSIGNMENT");
}

#[tokio::test]
async fn test_refund_unpaid_is_precondition_failed() {
    let app = TestApp::new();
    let partner_id = app.partner_at(36.75, 3.06).await;
    let request_id = app
        .request_at(&uuid::Uuid::new_v4().to_string(), 36.75, 3.06)
        .await;
    app.patch(
        &format!("/request/{}/status", request_id),
        json!({ "status": "ACCEPTED", "partner_id": partner_id }),
    )
    .await;
    let (_, body) = app
        .post(
            "/transaction",
            json!({ "request_id": request_id, "partner_id": partner_id, "amount": "25.50" }),
        )
        .await;
    let transaction_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(&format!("/transaction/{}/refund", transaction_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRECONDITION_FAILED");
}

#[tokio::test]
async fn test_nearby_partners_respects_radius() {
    let app = TestApp::new();
    // ~5 km y ~20 km al norte de Argel
    let near = app.partner_at(36.795, 3.06).await;
    app.partner_at(36.93, 3.06).await;

    let (status, body) = app
        .get("/location/nearby-partners?latitude=36.75&longitude=3.06&radius_km=10")
        .await;
    assert_eq!(status, StatusCode::OK);

    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], near.as_str());
    assert!(found[0]["distance_km"].as_f64().unwrap() < 10.0);
}

#[tokio::test]
async fn test_nearby_pending_requests() {
    let app = TestApp::new();
    let user_id = uuid::Uuid::new_v4().to_string();
    let close = app.request_at(&user_id, 36.76, 3.06).await;
    app.request_at(&user_id, 40.0, 3.06).await;

    let (status, body) = app
        .get("/request/nearby?latitude=36.75&longitude=3.06&radius_km=5")
        .await;
    assert_eq!(status, StatusCode::OK);
    let found = body["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], close.as_str());

    let (status, body) = app
        .get("/request/nearby?latitude=36.75&longitude=3.06&radius_km=-1")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_guarantee_flow() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/carVerification",
            json!({
                "user_id": uuid::Uuid::new_v4(),
                "vin_number": "VF1RFB00X56789012",
                "car_model": "Renault Master",
                "year": 2019,
                "mileage": 120000
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PENDING");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .get(&format!("/carVerification/{}/guarantee/validity", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "valid": false }));

    let guarantee = json!({
        "valid_until": "2999-01-01T00:00:00Z",
        "terms": "Cobertura de motor y transmisión"
    });
    let (status, body) = app
        .post(&format!("/carVerification/{}/guarantee", id), guarantee.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verification"]["status"], "VERIFIED");

    let (status, body) = app
        .post(&format!("/carVerification/{}/guarantee", id), guarantee)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_ISSUED");

    let (status, body) = app
        .get(&format!("/carVerification/{}/guarantee/validity", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], true);
}

#[tokio::test]
async fn test_invalid_vin_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/carVerification",
            json!({
                "user_id": uuid::Uuid::new_v4(),
                "vin_number": "BAD",
                "car_model": "Clio",
                "year": 2015,
                "mileage": 1000
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_banned_partner_cannot_accept() {
    let app = TestApp::new();
    let partner_id = app.partner_at(36.75, 3.06).await;
    let (status, body) = app
        .post(
            &format!("/partner/{}/ban", partner_id),
            json!({ "reason": "Documentación vencida" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_available"], false);

    let request_id = app
        .request_at(&uuid::Uuid::new_v4().to_string(), 36.75, 3.06)
        .await;
    let (status, body) = app
        .patch(
            &format!("/request/{}/status", request_id),
            json!({ "status": "ACCEPTED", "partner_id": partner_id }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ASSIGNMENT");
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let app = TestApp::new();
    let id = uuid::Uuid::new_v4();

    for uri in [
        format!("/request/{}", id),
        format!("/transaction/request/{}", id),
        format!("/carVerification/{}", id),
        format!("/carVerification/{}/guarantee", id),
        format!("/partner/{}", id),
        format!("/location/user/{}", id),
    ] {
        let (status, body) = app.get(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_delete_partner_with_assigned_request_is_rejected() {
    let app = TestApp::new();
    let partner_id = app.partner_at(36.75, 3.06).await;
    let request_id = app
        .request_at(&uuid::Uuid::new_v4().to_string(), 36.75, 3.06)
        .await;
    app.patch(
        &format!("/request/{}/status", request_id),
        json!({ "status": "ACCEPTED", "partner_id": partner_id }),
    )
    .await;
    app.post(&format!("/request/{}/complete", request_id), json!({}))
        .await;

    let (status, body) = app.delete(&format!("/partner/{}", partner_id)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PRECONDITION_FAILED");

    // la Request completada sigue facturable a su partner
    let (status, body) = app
        .post(
            "/transaction",
            json!({ "request_id": request_id, "partner_id": partner_id, "amount": "60.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_amount"], "69.00");

    let idle_id = app.partner_at(36.70, 3.00).await;
    let (status, _) = app.delete(&format!("/partner/{}", idle_id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/partner/{}", idle_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_listings() {
    let app = TestApp::new();
    let partner_id = app.partner_at(36.75, 3.06).await;
    app.partner_at(36.80, 3.10).await;
    let request_id = app
        .request_at(&uuid::Uuid::new_v4().to_string(), 36.75, 3.06)
        .await;
    app.patch(
        &format!("/request/{}/status", request_id),
        json!({ "status": "ACCEPTED", "partner_id": partner_id }),
    )
    .await;
    app.post(
        "/transaction",
        json!({ "request_id": request_id, "partner_id": partner_id, "amount": "10.00" }),
    )
    .await;
    app.post(
        "/carVerification",
        json!({
            "user_id": uuid::Uuid::new_v4(),
            "vin_number": "VF1RFB00X56789012",
            "car_model": "Renault Master",
            "year": 2019,
            "mileage": 120000
        }),
    )
    .await;

    let (status, body) = app.get("/partner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/partner?limit=1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = app.get("/transaction").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["request_id"], request_id.as_str());

    let (status, body) = app.get("/carVerification").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_partner_profile() {
    let app = TestApp::new();
    let partner_id = app.partner_at(36.75, 3.06).await;

    let (status, body) = app
        .patch(
            &format!("/partner/{}", partner_id),
            json!({ "service_type_id": 3, "admin_notes": "Servicio de grúa" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service_type_id"], 3);
    assert_eq!(body["data"]["admin_notes"], "Servicio de grúa");
    assert_eq!(body["data"]["is_available"], true);

    let (status, body) = app
        .patch(&format!("/partner/{}", partner_id), json!({ "service_type_id": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .patch(
            &format!("/partner/{}", uuid::Uuid::new_v4()),
            json!({ "admin_notes": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
