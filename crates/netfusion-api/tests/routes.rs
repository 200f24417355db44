//! Router tests driven through `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::UdpSocket;
use tower::ServiceExt;

use netfusion_api::{build_router, AppState};
use netfusion_core::SYS_NAME_OID;
use netfusion_discover::snmp::{Message, PduType, SnmpValue};
use netfusion_discover::{DiscoverConfig, SnmpScanner};
use netfusion_vault::{MemoryEndpointStore, Vault};

fn app_with_port(snmp_port: u16) -> (Router, AppState) {
    let scanner = SnmpScanner::new(DiscoverConfig {
        snmp_port,
        ..DiscoverConfig::default()
    });
    let state = AppState::new(Vault::new(MemoryEndpointStore::new()), scanner);
    (build_router(state.clone()), state)
}

fn app() -> (Router, AppState) {
    app_with_port(161)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Loopback agent answering sysName for any GET with community "public".
async fn spawn_agent(sys_name: &'static str) -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
            let Ok(mut reply) = Message::decode(&buf[..n]) else {
                continue;
            };
            if reply.community != b"public" {
                continue;
            }
            reply.pdu.pdu_type = PduType::Response;
            for (oid, value) in reply.pdu.varbinds.iter_mut() {
                *value = if oid.to_string() == SYS_NAME_OID {
                    SnmpValue::OctetString(sys_name.as_bytes().to_vec())
                } else {
                    SnmpValue::NoSuchObject
                };
            }
            let _ = socket.send_to(&reply.encode(), peer).await;
        }
    });
    port
}

fn unifi() -> Value {
    json!({
        "name": "  HQ controller ",
        "kind": "unifi",
        "address": "10.0.0.2",
        "auth_type": "userpass",
        "username": "admin",
        "password": "s3cret",
        "site": "hq"
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_and_list_redacts_secrets() {
    let (app, _) = app();

    let (status, created) = send(&app, Method::POST, "/api/endpoints", Some(unifi())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "HQ controller");
    assert_eq!(created["has_password"], true);
    assert!(created.get("password").is_none());

    let (status, listed) = send(&app, Method::GET, "/api/endpoints", None).await;
    assert_eq!(status, StatusCode::OK);
    let endpoints = listed["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0]["id"], created["id"]);
    assert!(!listed.to_string().contains("s3cret"));
}

#[tokio::test]
async fn test_create_reports_every_field_issue() {
    let (app, state) = app();
    let body = json!({ "name": " ", "kind": "cisco", "address": "", "auth_type": "apikey" });

    let (status, error) = send(&app, Method::POST, "/api/endpoints", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = error["detail"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue["field"].as_str())
        .collect();
    for expected in ["name", "address", "kind", "api_key"] {
        assert!(fields.contains(&expected), "missing {expected} in {fields:?}");
    }
    assert!(state.vault.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_keeps_omitted_secrets() {
    let (app, state) = app();
    let (_, created) = send(&app, Method::POST, "/api/endpoints", Some(unifi())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let patch = json!({ "name": "HQ", "password": "" });
    let (status, updated) = send(&app, Method::PATCH, &format!("/api/endpoints/{id}"), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "HQ");
    assert_eq!(updated["has_password"], true);

    let stored = state.vault.load(id.parse().unwrap()).unwrap();
    assert_eq!(stored.password.as_deref(), Some("s3cret"));
}

#[tokio::test]
async fn test_invalid_update_changes_nothing() {
    let (app, state) = app();
    let (_, created) = send(&app, Method::POST, "/api/endpoints", Some(unifi())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let patch = json!({ "name": "renamed", "auth_type": "bogus" });
    let (status, _) = send(&app, Method::PATCH, &format!("/api/endpoints/{id}"), Some(patch)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let stored = state.vault.load(id.parse().unwrap()).unwrap();
    assert_eq!(stored.name, "HQ controller");
}

#[tokio::test]
async fn test_toggle_and_delete() {
    let (app, _) = app();
    let (_, created) = send(&app, Method::POST, "/api/endpoints", Some(unifi())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, toggled) = send(
        &app,
        Method::PATCH,
        &format!("/api/endpoints/{id}/toggle"),
        Some(json!({ "enabled": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["enabled"], false);
    assert_eq!(toggled["name"], created["name"]);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/endpoints/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/endpoints/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let (app, _) = app();
    let missing = "00000000-0000-4000-8000-000000000000";

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/endpoints/{missing}"),
        Some(json!({ "name": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/endpoints/not-a-uuid/toggle",
        Some(json!({ "enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, _) = app();
    let (_, created) = send(&app, Method::POST, "/api/endpoints", Some(unifi())).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/endpoints/{id}/toggle"),
        Some(json!({ "enabled": "yes" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_scan_rejects_bad_cidr() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/snmp/scan",
        Some(json!({ "cidr": "10.0.0.0/99" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("10.0.0.0/99"));
}

#[tokio::test]
async fn test_scan_then_import() {
    let port = spawn_agent("sw1").await;
    let (app, state) = app_with_port(port);

    let (status, report) = send(
        &app,
        Method::POST,
        "/api/snmp/scan",
        Some(json!({ "cidr": "127.0.0.1/32", "community": "public", "timeout_ms": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["count"], 1);
    assert_eq!(report["results"][0]["ip"], "127.0.0.1");
    assert_eq!(report["results"][0]["values"][SYS_NAME_OID], "sw1");

    let (status, summary) = send(
        &app,
        Method::POST,
        "/api/snmp/import",
        Some(json!({ "report": report, "selected": ["127.0.0.1", "127.0.0.9"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["failed"], 1);

    let listed = state.vault.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "sw1");
    assert_eq!(listed[0].address, "127.0.0.1");
}
