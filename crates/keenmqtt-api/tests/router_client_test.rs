#![allow(clippy::unwrap_used)]
// Integration tests for `RouterClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keenmqtt_api::{Credentials, Error, RouterClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RouterClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let credentials = Credentials::new("admin", "secret".to_string().into());
    let client = RouterClient::new(base_url, credentials, &TransportConfig::default()).unwrap();
    (server, client)
}

/// Mount the two halves of the challenge handshake.
async fn mount_auth(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("X-NDM-Realm", "Keenetic Giga")
                .insert_header("X-NDM-Challenge", "ABCDEF0123456789"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_json(json!({
            "login": "admin",
            "password": "5c269cb91791bd81a932b6b9e42ea7aadf458d8fd81a486fea22d696fc210e8c",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

fn ok_status() -> serde_json::Value {
    json!({
        "ip": {
            "hotspot": {
                "status": [{
                    "status": "message",
                    "code": "0",
                    "ident": "Core::Configurator",
                    "message": "done"
                }]
            }
        }
    })
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_with_challenge() {
    let (server, client) = setup().await;
    mount_auth(&server).await;

    client.authenticate().await.unwrap();
}

#[tokio::test]
async fn test_authenticate_skips_login_when_session_valid() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
}

#[tokio::test]
async fn test_authenticate_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("X-NDM-Realm", "Keenetic Giga")
                .insert_header("X-NDM-Challenge", "ABCDEF0123456789"),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad login"))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_authenticate_missing_challenge_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).insert_header("X-NDM-Realm", "Keenetic Giga"))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_request_reauthenticates_and_retries_once() {
    let (server, client) = setup().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/rci/show/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rci/show/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "mac": "aa:bb:cc:dd:ee:ff", "name": "Phone" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let hosts = client.list_hosts().await.unwrap();

    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].name, "Phone");
}

#[tokio::test]
async fn test_second_unauthorized_surfaces() {
    let (server, client) = setup().await;
    mount_auth(&server).await;

    Mock::given(method("GET"))
        .and(path("/rci/show/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.list_hosts().await;

    assert!(
        matches!(result, Err(Error::Unauthorized)),
        "expected Unauthorized, got: {result:?}"
    );
}

// ── Read endpoint tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_list_hosts() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rci/show/ip/hotspot/host"))
        .and(header("Content-Type", "application/json;charset=UTF-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "mac": "aa:bb:cc:dd:ee:ff",
                "via": "aa:bb:cc:dd:ee:ff",
                "ip": "192.168.1.20",
                "hostname": "android-1234",
                "name": "Phone",
                "registered": true,
                "active": true,
                "rxbytes": 1024,
                "txbytes": 2048,
                "ssid": "home",
                "rssi": -51
            },
            { "mac": "11:22:33:44:55:66" }
        ])))
        .mount(&server)
        .await;

    let hosts = client.list_hosts().await.unwrap();

    assert_eq!(hosts.len(), 2);
    let phone = &hosts[0];
    assert_eq!(phone.mac, "aa:bb:cc:dd:ee:ff");
    assert_eq!(phone.name, "Phone");
    assert_eq!(phone.hostname, "android-1234");
    assert_eq!(phone.rx_bytes, 1024);
    assert_eq!(phone.tx_bytes, 2048);
    assert!(phone.active);
    assert_eq!(phone.extra.get("rssi"), Some(&json!(-51)));

    let bare = &hosts[1];
    assert_eq!(bare.name, "");
    assert_eq!(bare.rx_bytes, 0);
}

#[tokio::test]
async fn test_list_host_policies() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rci/show/rc/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "mac": "aa:bb:cc:dd:ee:ff", "access": "permit", "policy": "kids", "permit": true, "priority": 6 },
            { "mac": "11:22:33:44:55:66", "access": "deny", "permit": false }
        ])))
        .mount(&server)
        .await;

    let policies = client.list_host_policies().await.unwrap();

    assert_eq!(policies.len(), 2);
    assert_eq!(policies[0].policy.as_deref(), Some("kids"));
    assert!(policies[0].permit);
    assert_eq!(policies[1].policy, None);
    assert!(!policies[1].permit);
}

#[tokio::test]
async fn test_list_policies() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rci/show/rc/ip/policy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Policy0": {
                "description": "kids",
                "permit": [{ "interface": "Wireguard0", "enabled": true }]
            },
            "Policy1": {}
        })))
        .mount(&server)
        .await;

    let policies = client.list_policies().await.unwrap();

    let names: Vec<&str> = policies.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Policy0", "Policy1"]);
    assert_eq!(policies["Policy0"].description, "kids");
    assert_eq!(policies["Policy0"].permit[0].interface, "Wireguard0");
    assert!(policies["Policy1"].permit.is_empty());
}

#[tokio::test]
async fn test_non_success_status_maps_to_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rci/show/rc/ip/policy"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.list_policies().await;

    match result {
        Err(Error::Http { status, endpoint }) => {
            assert_eq!(status, 500);
            assert_eq!(endpoint, "/rci/show/rc/ip/policy");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rci/show/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.list_hosts().await;

    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "not json"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Mutation tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_set_policy_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rci/ip/hotspot/host"))
        .and(header("Content-Type", "application/json;charset=UTF-8"))
        .and(body_json(json!({ "mac": "aa:bb", "policy": "kids" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_status()))
        .expect(1)
        .mount(&server)
        .await;

    client.set_policy("aa:bb", Some("kids")).await.unwrap();
}

#[tokio::test]
async fn test_set_policy_none_sends_false() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rci/ip/hotspot/host"))
        .and(body_json(json!({ "mac": "aa:bb", "policy": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_status()))
        .expect(1)
        .mount(&server)
        .await;

    client.set_policy("aa:bb", None).await.unwrap();
}

#[tokio::test]
async fn test_set_permit_true() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rci/ip/hotspot/host"))
        .and(body_json(json!({ "mac": "aa:bb", "permit": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_status()))
        .expect(1)
        .mount(&server)
        .await;

    client.set_permit("aa:bb", true).await.unwrap();
}

#[tokio::test]
async fn test_set_permit_false_sends_deny() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rci/ip/hotspot/host"))
        .and(body_json(json!({ "mac": "aa:bb", "deny": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_status()))
        .expect(1)
        .mount(&server)
        .await;

    client.set_permit("aa:bb", false).await.unwrap();
}

#[tokio::test]
async fn test_empty_mutation_response() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rci/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let result = client.set_permit("aa:bb", true).await;

    assert!(
        matches!(result, Err(Error::EmptyStatus { .. })),
        "expected EmptyStatus, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rejected_mutation() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rci/ip/hotspot/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": {
                "status": [{
                    "status": "error",
                    "code": "7405602",
                    "ident": "Network::Ip::Hotspot",
                    "message": "unknown policy"
                }]
            }
        })))
        .mount(&server)
        .await;

    let result = client.set_policy("aa:bb", Some("ghost")).await;

    match result {
        Err(Error::Rejected { message, .. }) => assert_eq!(message, "unknown policy"),
        other => panic!("expected Rejected, got: {other:?}"),
    }
}
