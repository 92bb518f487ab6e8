use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::api::{app_state::AppState, create_router};
use crate::cache::NoopCache;
use crate::config::AppConfig;
use crate::observability::{AppMetrics, ObservabilityState};
use crate::storage::Repositories;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

struct TestApp {
    router: Router,
    _uploads: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = AppConfig::testing();
        config.upload.dir = uploads.path().to_path_buf();

        let metrics = Arc::new(AppMetrics::new().unwrap());
        let state = AppState::from_parts(
            config,
            Repositories::in_memory(),
            Arc::new(NoopCache),
            metrics.clone(),
        );
        let observability = Arc::new(ObservabilityState::new("test".into(), metrics));

        Self {
            router: create_router(state, observability),
            _uploads: uploads,
        }
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.request(request).await
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "gundam0079"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    /// 第一个注册的用户是管理员，第二个是普通用户
    async fn admin_and_user(&self) -> (String, String) {
        let admin = self.register("bright").await;
        let user = self.register("kai").await;
        (admin, user)
    }
}

#[tokio::test]
async fn test_writes_require_token_and_admin_role() {
    let app = TestApp::new();
    let (_, user) = app.admin_and_user().await;
    let payload = json!({ "name": "Zaku II", "grade": "HG" });

    let (status, body) = app
        .send("POST", "/api/v1/mobile-suits", None, Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send("POST", "/api/v1/mobile-suits", Some(&user), Some(payload))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("GET", "/api/v1/dashboard/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("GET", "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_duplicate_natural_key() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    let payload = json!({ "name": "RX-78-2 Gundam", "grade": "MG", "scale": "1/100" });

    let (status, created) = app
        .send("POST", "/api/v1/mobile-suits", Some(&admin), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["grade"], "MG");

    let (status, body) = app
        .send("POST", "/api/v1/mobile-suits", Some(&admin), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = app
        .send("GET", &format!("/api/v1/mobile-suits/{}", id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "RX-78-2 Gundam");

    let (status, _) = app.send("GET", "/api/v1/mobile-suits/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pages_are_disjoint() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    for name in ["Titans", "AEUG", "Karaba", "Axis Zeon", "Londo Bell"] {
        let (status, _) = app
            .send("POST", "/api/v1/factions", Some(&admin), Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut seen = HashSet::new();
    for page in 1..=3 {
        let (status, body) = app
            .send("GET", &format!("/api/v1/factions?page={}&limit=2", page), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
        assert_eq!(body["total_pages"], 3);
        for item in body["items"].as_array().unwrap() {
            assert!(seen.insert(item["id"].as_str().unwrap().to_string()));
        }
    }
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn test_keyword_search_is_case_insensitive() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    for (name, grade) in [("Zaku II", "HG"), ("Gouf Custom", "MG"), ("Zaku Warrior", "HG")] {
        app.send(
            "POST",
            "/api/v1/mobile-suits",
            Some(&admin),
            Some(json!({ "name": name, "grade": grade })),
        )
        .await;
    }

    let (_, body) = app.send("GET", "/api/v1/mobile-suits?q=zAkU", None, None).await;
    assert_eq!(body["total"], 2);

    let (_, body) = app
        .send("GET", "/api/v1/mobile-suits?q=zaku&grade=HG", None, None)
        .await;
    assert_eq!(body["total"], 2);

    let (_, body) = app.send("GET", "/api/v1/mobile-suits?grade=MG", None, None).await;
    assert_eq!(body["items"][0]["name"], "Gouf Custom");

    let (status, _) = app
        .send("GET", "/api/v1/mobile-suits?grade=unknown", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update_preserves_other_fields() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    let (_, created) = app
        .send(
            "POST",
            "/api/v1/lore-characters",
            Some(&admin),
            Some(json!({
                "url": "https://gundam.fandom.com/wiki/Amuro_Ray",
                "name": "Amuro Ray",
                "affiliation": "Earth Federation",
                "rank": "Ensign",
                "mobile_suits": ["RX-78-2 Gundam"]
            })),
        )
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = app
        .send(
            "PUT",
            &format!("/api/v1/lore-characters/{}", id),
            Some(&admin),
            Some(json!({ "rank": "Lieutenant" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rank"], "Lieutenant");
    assert_eq!(updated["affiliation"], "Earth Federation");
    assert_eq!(updated["mobile_suits"], json!(["RX-78-2 Gundam"]));
    assert_eq!(updated["created_at"], created["created_at"]);
}

#[tokio::test]
async fn test_image_upload_sets_image_url() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    let (_, created) = app
        .send("POST", "/api/v1/factions", Some(&admin), Some(json!({ "name": "Celestial Being" })))
        .await;
    let id = created["id"].as_str().unwrap();

    let boundary = "codexboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cb.png\"\r\nContent-Type: image/png\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(PNG);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/factions/{}/image", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, uploaded) = app.request(request).await;
    assert_eq!(status, StatusCode::OK, "{}", uploaded);

    let url = uploaded["image_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/faction/"));

    let (_, faction) = app
        .send("GET", &format!("/api/v1/factions/{}", id), None, None)
        .await;
    assert_eq!(faction["image_url"], url.as_str());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_timeline_events_are_ordered() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    let (status, era) = app
        .send(
            "POST",
            "/api/v1/timeline",
            Some(&admin),
            Some(json!({ "name": "Universal Century", "abbreviation": "U.C.", "order": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = era["id"].as_str().unwrap();

    for (date, year, title) in [
        ("0093.03.04", 93, "Char's Counterattack"),
        ("0079.01.03", 79, "One Year War"),
        ("0087.03.02", 87, "Gryps Conflict"),
    ] {
        let (status, _) = app
            .send(
                "POST",
                &format!("/api/v1/timeline/{}/events", id),
                Some(&admin),
                Some(json!({ "date": date, "year": year, "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, era) = app.send("GET", &format!("/api/v1/timeline/{}", id), None, None).await;
    let titles: Vec<&str> = era["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["One Year War", "Gryps Conflict", "Char's Counterattack"]);

    let event_id = era["events"][0]["id"].as_str().unwrap();
    let (status, era) = app
        .send(
            "DELETE",
            &format!("/api/v1/timeline/{}/events/{}", id, event_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(era["events"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_and_analytics() {
    let app = TestApp::new();
    let (admin, _) = app.admin_and_user().await;
    app.send(
        "POST",
        "/api/v1/mobile-suits",
        Some(&admin),
        Some(json!({ "name": "Nu Gundam", "grade": "RG", "series": "Char's Counterattack" })),
    )
    .await;
    app.send("POST", "/api/v1/factions", Some(&admin), Some(json!({ "name": "Neo Zeon" })))
        .await;

    let (status, stats) = app.send("GET", "/api/v1/dashboard/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["mobile_suits"], 1);
    assert_eq!(stats["factions"], 1);
    assert_eq!(stats["users"], 2);
    assert_eq!(stats["admins"], 1);

    let (_, grades) = app
        .send("GET", "/api/v1/analytics/mobile-suits/grades", Some(&admin), None)
        .await;
    assert_eq!(grades, json!([{ "label": "RG", "count": 1 }]));

    let (_, growth) = app
        .send("GET", "/api/v1/analytics/content-growth?months=3", Some(&admin), None)
        .await;
    let growth = growth.as_array().unwrap();
    assert_eq!(growth.len(), 3);
    assert_eq!(growth[2]["mobile_suits"], 1);
}

#[tokio::test]
async fn test_auth_me_and_user_management() {
    let app = TestApp::new();
    let (admin, user) = app.admin_and_user().await;

    let (status, me) = app.send("GET", "/api/v1/auth/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "kai");
    assert!(me.get("password_hash").is_none());

    let (status, _) = app.send("GET", "/api/v1/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "kai", "password": "wrong-pass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", login);

    let (_, admin_me) = app.send("GET", "/api/v1/auth/me", Some(&admin), None).await;
    let admin_id = admin_me["id"].as_str().unwrap();
    let (status, _) = app
        .send("DELETE", &format!("/api/v1/users/{}", admin_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, users) = app.send("GET", "/api/v1/users", Some(&admin), None).await;
    assert_eq!(users["total"], 2);
    assert!(users["items"][0].get("password_hash").is_none());
}

#[tokio::test]
async fn test_role_changes_apply_to_existing_tokens() {
    let app = TestApp::new();
    let (admin, user) = app.admin_and_user().await;
    let (_, kai) = app.send("GET", "/api/v1/auth/me", Some(&user), None).await;
    let kai_uri = format!("/api/v1/users/{}", kai["id"].as_str().unwrap());

    let (status, _) = app
        .send("PUT", &kai_uri, Some(&admin), Some(json!({ "role": "admin" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    // 提权前签发的令牌立即获得管理员权限
    let (status, _) = app
        .send("POST", "/api/v1/mobile-suits", Some(&user), Some(json!({ "name": "Zaku", "grade": "HG" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, login) = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "kai", "password": "gundam0079" })),
        )
        .await;
    let kai_admin = login["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .send("PUT", &kai_uri, Some(&admin), Some(json!({ "role": "user" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send("POST", "/api/v1/mobile-suits", Some(&kai_admin), Some(json!({ "name": "Gouf", "grade": "HG" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", &kai_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", "/api/v1/users", Some(&kai_admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.send("GET", "/api/v1/auth/me", Some(&kai_admin), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_usernames_are_case_insensitive() {
    let app = TestApp::new();
    app.register("Amuro").await;

    let (status, _) = app
        .send(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "username": "amuro",
                "email": "ray@example.com",
                "password": "gundam0079"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, login) = app
        .send(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "AMURO", "password": "gundam0079" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", login);
    assert_eq!(login["user"]["username"], "Amuro");
}

#[tokio::test]
async fn test_huge_page_number_is_clamped() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "GET",
            "/api/v1/factions?page=18446744073709551615&limit=100",
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_settings_public_read_admin_write() {
    let app = TestApp::new();
    let (admin, user) = app.admin_and_user().await;

    let (status, settings) = app.send("GET", "/api/v1/settings", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["site_name"], "Gundam Codex");

    let change = json!({ "maintenance_mode": true });
    let (status, _) = app
        .send("PUT", "/api/v1/settings", Some(&user), Some(change.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .send("PUT", "/api/v1/settings", Some(&admin), Some(change))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["maintenance_mode"], true);
}

#[tokio::test]
async fn test_security_headers_and_health() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health/live").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-content-type-options"));

    let (status, _) = app.send("GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_error_bodies_carry_request_id() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/v1/factions/missing")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-request-id"], "req-42");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["request_id"], "req-42");

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/api/v1/factions/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let generated = response.headers()["x-request-id"].to_str().unwrap().to_string();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["request_id"], generated.as_str());
}
