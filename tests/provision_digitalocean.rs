use std::time::Duration;

use anchorage::DigitalOcean;
use anchorage::error::ProvisionError;
use anchorage::provision::{Compute, Droplet, DropletId, DropletSpec, is_public_key};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DigitalOcean {
    DigitalOcean::new("do-token")
        .base_url(&server.uri())
        .poll(3, Duration::from_millis(1))
}

fn droplet(id: u64) -> Droplet {
    Droplet {
        id: DropletId(id),
        name: "web-01".into(),
        region: "syd1".into(),
    }
}

#[test]
fn spec_defaults() {
    let spec = DropletSpec::new("web-01");

    assert_eq!(spec.name, "web-01");
    assert_eq!(spec.image, "ubuntu-24-10-x64");
    assert_eq!(spec.region, "syd1");
    assert_eq!(spec.size, "s-1vcpu-1gb");
    assert!(spec.backups);
    assert!(spec.ssh_keys.is_empty());
}

#[test]
fn spec_builder_chain() {
    let spec = DropletSpec::new("web-01")
        .image("ubuntu-24-04-x64")
        .region("nyc1")
        .size("s-2vcpu-4gb")
        .backups(false)
        .ssh_key("12345");

    assert_eq!(spec.image, "ubuntu-24-04-x64");
    assert_eq!(spec.region, "nyc1");
    assert_eq!(spec.size, "s-2vcpu-4gb");
    assert!(!spec.backups);
    assert_eq!(spec.ssh_keys, vec!["12345"]);
}

#[test]
fn droplet_id_parsing() {
    assert_eq!(" 42 ".parse::<DropletId>().unwrap(), DropletId(42));
    assert!(matches!(
        "".parse::<DropletId>(),
        Err(ProvisionError::InvalidDropletId { .. })
    ));
    assert!(matches!(
        "-1".parse::<DropletId>(),
        Err(ProvisionError::InvalidDropletId { .. })
    ));
}

#[test]
fn public_key_detection() {
    assert!(is_public_key("ssh-ed25519 AAAAC3Nza user@host"));
    assert!(is_public_key("ecdsa-sha2-nistp256 AAAAE2"));
    assert!(!is_public_key("3b:16:bf:e4:8b:00:8b:b8:59:8c:a9:d3:f0:19:45:fa"));
    assert!(!is_public_key("512190"));
}

#[tokio::test]
async fn create_droplet_posts_spec() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets"))
        .and(header("authorization", "Bearer do-token"))
        .and(body_json(json!({
            "name": "web-01",
            "region": "syd1",
            "size": "s-1vcpu-1gb",
            "image": "ubuntu-24-10-x64",
            "backups": true,
            "ssh_keys": ["512190"],
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "droplet": { "id": 3_164_444, "name": "web-01", "status": "new" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = DropletSpec::new("web-01").ssh_key("512190");
    let created = client(&server).create_droplet(&spec).await.unwrap();

    assert_eq!(created, Droplet {
        id: DropletId(3_164_444),
        name: "web-01".into(),
        region: "syd1".into(),
    });
}

#[tokio::test]
async fn create_droplet_parses_string_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "droplet": { "id": "77", "name": "web-01" }
        })))
        .mount(&server)
        .await;

    let created = client(&server)
        .create_droplet(&DropletSpec::new("web-01"))
        .await
        .unwrap();
    assert_eq!(created.id, DropletId(77));
}

#[tokio::test]
async fn create_droplet_rejects_non_numeric_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "droplet": { "id": "abc", "name": "web-01" }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_droplet(&DropletSpec::new("web-01"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::InvalidDropletId { .. }));
}

#[tokio::test]
async fn api_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/droplets"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "id": "unprocessable_entity",
            "message": "Size is not available in this region."
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_droplet(&DropletSpec::new("web-01"))
        .await
        .unwrap_err();
    match err {
        ProvisionError::Api { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "Size is not available in this region.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn wait_polls_until_active() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/droplets/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "droplet": { "id": 9, "name": "web-01", "status": "new" }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/droplets/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "droplet": { "id": 9, "name": "web-01", "status": "active" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).wait_until_active(&droplet(9)).await.unwrap();
}

#[tokio::test]
async fn wait_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/droplets/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "droplet": { "id": 9, "name": "web-01", "status": "new" }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server)
        .wait_until_active(&droplet(9))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "droplet 9 not active after 3 attempts");
}

#[tokio::test]
async fn reserved_ip_is_bound_to_droplet() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reserved_ips"))
        .and(body_json(json!({ "droplet_id": 9 })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "reserved_ip": {
                "ip": "45.55.96.47",
                "region": { "slug": "syd1" },
                "locked": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reserved = client(&server)
        .create_reserved_ip(DropletId(9), "syd1")
        .await
        .unwrap();

    assert_eq!(reserved.ip, "45.55.96.47");
    assert_eq!(reserved.droplet_id, DropletId(9));
    assert_eq!(reserved.region, "syd1");
}

#[tokio::test]
async fn ssh_key_id_passes_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let key = client(&server)
        .resolve_ssh_key("512190", "web-01")
        .await
        .unwrap();
    assert_eq!(key, "512190");
}

#[tokio::test]
async fn ssh_key_reuses_registered_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/keys"))
        .and(query_param("per_page", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ssh_keys": [
                { "id": 1, "public_key": "ssh-ed25519 OTHER a@b", "name": "a" },
                { "id": 2, "public_key": "ssh-ed25519 AAAAC3 laptop", "name": "b" }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/keys"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let key = client(&server)
        .resolve_ssh_key("ssh-ed25519 AAAAC3 me@desk", "web-01")
        .await
        .unwrap();
    assert_eq!(key, "2");
}

#[tokio::test]
async fn ssh_key_is_registered_when_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ssh_keys": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/keys"))
        .and(body_partial_json(json!({
            "name": "web-01",
            "public_key": "ssh-rsa AAAA me@desk"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "ssh_key": { "id": 99, "public_key": "ssh-rsa AAAA me@desk", "name": "web-01" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = client(&server)
        .resolve_ssh_key("ssh-rsa AAAA me@desk\n", "web-01")
        .await
        .unwrap();
    assert_eq!(key, "99");
}

#[tokio::test]
async fn ssh_key_lookup_follows_next_page() {
    let server = MockServer::start().await;
    let next = format!("{}/account/keys?page=2&per_page=200", server.uri());
    Mock::given(method("GET"))
        .and(path("/account/keys"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ssh_keys": [
                { "id": 314, "public_key": "ssh-ed25519 AAAAC3 laptop", "name": "b" }
            ],
            "links": { "pages": { "prev": "ignored" } }
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/account/keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ssh_keys": [
                { "id": 1, "public_key": "ssh-ed25519 OTHER a@b", "name": "a" }
            ],
            "links": { "pages": { "next": next } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/account/keys"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let key = client(&server)
        .resolve_ssh_key("ssh-ed25519 AAAAC3 me@desk", "web-01")
        .await
        .unwrap();
    assert_eq!(key, "314");
}

#[tokio::test]
async fn api_error_keeps_plain_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reserved_ips"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_reserved_ip(DropletId(9), "syd1")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API error (503): upstream unavailable");
}
