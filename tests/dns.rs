use anchorage::Cloudflare;
use anchorage::dns::{APEX, DnsProvider, DnsRecord};
use anchorage::error::ProvisionError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn apex_a_record_is_fixed() {
    let record = DnsRecord::apex_a("zone123", "203.0.113.7");

    assert_eq!(record.zone_id, "zone123");
    assert_eq!(record.name, APEX);
    assert_eq!(record.record_type, "A");
    assert_eq!(record.content, "203.0.113.7");
    assert!(record.proxied);
}

#[test]
fn record_body_omits_zone() {
    let body = serde_json::to_value(DnsRecord::apex_a("zone123", "203.0.113.7")).unwrap();
    assert_eq!(
        body,
        json!({
            "name": "@",
            "type": "A",
            "content": "203.0.113.7",
            "proxied": true,
            "ttl": 1
        })
    );
}

#[tokio::test]
async fn creates_record_in_zone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/zone123/dns_records"))
        .and(header("authorization", "Bearer cf-token"))
        .and(body_json(json!({
            "name": "@",
            "type": "A",
            "content": "203.0.113.7",
            "proxied": true,
            "ttl": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": {
                "id": "372e67954025e0ba6aaa6d586b9e0b59",
                "name": "example.com",
                "type": "A",
                "content": "203.0.113.7",
                "proxied": true,
                "ttl": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cf = Cloudflare::new("cf-token").base_url(&server.uri());
    let info = cf
        .create_record(&DnsRecord::apex_a("zone123", "203.0.113.7"))
        .await
        .unwrap();

    assert_eq!(info.id, "372e67954025e0ba6aaa6d586b9e0b59");
    assert_eq!(info.name, "example.com");
    assert_eq!(info.content, "203.0.113.7");
    assert!(info.proxied);
}

#[tokio::test]
async fn api_failure_surfaces_first_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zones/zone123/dns_records"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 81057, "message": "Record already exists." }],
            "messages": [],
            "result": null
        })))
        .mount(&server)
        .await;

    let cf = Cloudflare::new("cf-token").base_url(&server.uri());
    let err = cf
        .create_record(&DnsRecord::apex_a("zone123", "203.0.113.7"))
        .await
        .unwrap_err();

    match err {
        ProvisionError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Record already exists.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_failure_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let cf = Cloudflare::new("cf-token").base_url(&server.uri());
    let err = cf
        .create_record(&DnsRecord::apex_a("zone123", "203.0.113.7"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "API error (502): bad gateway");
}
