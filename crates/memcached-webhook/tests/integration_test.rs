mod common;

use admission_review::AdmissionReview;
use axum::{
    body::Body,
    http::{self, Request, Response, header},
};
use http_body_util::BodyExt;
use rstest::*;
use tower::ServiceExt;

use crate::common::{app, default_test_config};

async fn post(uri: &str, content_type: Option<&str>, body: &str) -> Response<Body> {
    let app = app(default_test_config());

    let mut builder = Request::builder().method(http::Method::POST).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder.body(Body::from(body.to_owned())).unwrap();

    app.oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn admission_review_response(response: Response<Body>) -> AdmissionReview {
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );

    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn request_review(payload: &str) -> AdmissionReview {
    serde_json::from_str(payload).unwrap()
}

#[tokio::test]
async fn test_mutate_allows_positive_size() {
    let payload = include_str!("data/memcached_size_3.json");

    let response = post("/mutate", Some("application/json"), payload).await;
    let review = admission_review_response(response).await;

    let request = request_review(payload);
    assert_eq!(review.group_version_kind(), request.group_version_kind());
    assert!(review.request.is_none());

    let response = review.response.expect("response should be filled");
    assert!(response.allowed);
    assert_eq!(response.uid, request.request.unwrap().uid);
}

#[tokio::test]
#[rstest]
#[case::zero_size(include_str!("data/memcached_size_0.json"))]
#[case::without_size(include_str!("data/memcached_without_size.json"))]
async fn test_mutate_rejects_empty_memcached(#[case] payload: &str) {
    let response = post("/mutate", Some("application/json"), payload).await;
    let review = admission_review_response(response).await;

    let response = review.response.expect("response should be filled");
    assert!(!response.allowed);
    assert!(response.message().unwrap().contains("size"));
    assert_eq!(response.uid, request_review(payload).request.unwrap().uid);
}

#[tokio::test]
async fn test_mutate_rejects_other_resources() {
    let payload = include_str!("data/deployment_resource.json");

    let response = post("/mutate", Some("application/json"), payload).await;
    let review = admission_review_response(response).await;

    let response = review.response.expect("response should be filled");
    assert!(!response.allowed);
    assert!(response.message().unwrap().contains("memcacheds"));
}

#[tokio::test]
#[rstest]
#[case::valid(include_str!("data/memcached_size_3.json"))]
#[case::zero_size(include_str!("data/memcached_size_0.json"))]
#[case::other_resource(include_str!("data/deployment_resource.json"))]
async fn test_validate_allows(#[case] payload: &str) {
    let response = post("/validate", Some("application/json"), payload).await;
    let review = admission_review_response(response).await;

    let response = review.response.expect("response should be filled");
    assert!(response.allowed);
    assert_eq!(response.uid, request_review(payload).request.unwrap().uid);
}

#[tokio::test]
#[rstest]
#[case::mutate("/mutate")]
#[case::validate("/validate")]
async fn test_response_echoes_v1beta1(#[case] uri: &str) {
    let payload = include_str!("data/memcached_v1beta1.json");

    let response = post(uri, Some("application/json"), payload).await;
    let review = admission_review_response(response).await;

    assert_eq!(review.api_version, "admission.k8s.io/v1beta1");
    assert_eq!(review.kind, "AdmissionReview");
    assert!(review.response.unwrap().allowed);
}

#[tokio::test]
async fn test_content_type_with_charset() {
    let payload = include_str!("data/memcached_size_3.json");

    let response = post("/mutate", Some("application/json; charset=utf-8"), payload).await;
    let review = admission_review_response(response).await;

    assert!(review.response.unwrap().allowed);
}

#[tokio::test]
#[rstest]
#[case::text_plain(Some("text/plain"))]
#[case::missing(None)]
async fn test_wrong_content_type(#[case] content_type: Option<&str>) {
    let payload = include_str!("data/memcached_size_3.json");

    let response = post("/mutate", content_type, payload).await;

    assert_eq!(response.status(), 415);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
#[rstest]
#[case::garbage("{\"apiVersion\": ")]
#[case::empty("")]
#[case::unknown_kind(r#"{"apiVersion": "v1", "kind": "Pod"}"#)]
#[case::request_not_an_object(
    r#"{"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview", "request": []}"#
)]
async fn test_undecodable_payload(#[case] payload: &str) {
    let response = post("/mutate", Some("application/json"), payload).await;

    assert_eq!(response.status(), 400);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("Request could not be decoded"));
}

#[tokio::test]
async fn test_review_without_request() {
    let payload = r#"{"apiVersion": "admission.k8s.io/v1", "kind": "AdmissionReview"}"#;

    let response = post("/validate", Some("application/json"), payload).await;

    assert_eq!(response.status(), 400);
    assert!(!body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_payload_is_not_a_review() {
    let payload = r#"{
        "apiVersion": "cache.example.com/v1alpha1",
        "kind": "Memcached",
        "metadata": {"name": "memcached-sample"},
        "spec": {"size": 3}
    }"#;

    let response = post("/mutate", Some("application/json"), payload).await;

    assert_eq!(response.status(), 400);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("Expected AdmissionReview"));
}

#[tokio::test]
async fn test_unknown_path() {
    let payload = include_str!("data/memcached_size_3.json");

    let response = post("/audit", Some("application/json"), payload).await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_get_is_not_allowed() {
    let app = app(default_test_config());
    let request = Request::builder()
        .method(http::Method::GET)
        .uri("/mutate")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn test_mutate_accepts_large_update_review() {
    let mut review: serde_json::Value =
        serde_json::from_str(include_str!("data/memcached_size_3.json")).unwrap();
    let annotation = "x".repeat(1_200_000);
    let request = &mut review["request"];
    request["operation"] = "UPDATE".into();
    request["object"]["metadata"]["annotations"] =
        serde_json::json!({"example.com/blob": annotation});
    request["oldObject"] = request["object"].clone();
    request["options"] =
        serde_json::json!({"apiVersion": "meta.k8s.io/v1", "kind": "UpdateOptions"});
    let payload = serde_json::to_string(&review).unwrap();
    assert!(payload.len() > 2 * 1024 * 1024);

    let response = post("/mutate", Some("application/json"), &payload).await;
    let review = admission_review_response(response).await;

    let response = review.response.expect("response should be set");
    assert!(response.allowed);
    assert_eq!(response.uid, "705ab4f5-6393-11e8-b7cc-42010a800002");
}

#[tokio::test]
async fn test_readiness() {
    let app = app(default_test_config());
    let request = Request::builder()
        .uri("/readiness")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), 200);
}

// helper functions for the HTTPS tests
#[cfg(target_os = "linux")]
mod tls_helpers {
    use rcgen::{CertifiedKey, generate_simple_self_signed};

    pub struct TlsData {
        pub key: String,
        pub cert: String,
        pub der: Vec<u8>,
    }

    pub fn create_cert(hostname: &str) -> TlsData {
        let subject_alt_names = vec![hostname.to_string()];

        let CertifiedKey { cert, key_pair } =
            generate_simple_self_signed(subject_alt_names).unwrap();

        TlsData {
            key: key_pair.serialize_pem(),
            cert: cert.pem(),
            der: cert.der().to_vec(),
        }
    }

    pub fn install_crypto_provider() {
        // Starting from rustls 0.22, each application must set its default crypto provider.
        // This is done inside of `main`, which is not called by the tests.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    fn client() -> reqwest::Client {
        // a new client per call, pooled connections would keep the old certificate
        reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .tls_info(true)
            .build()
            .unwrap()
    }

    pub async fn wait_for_server_to_be_ready(address: &str) {
        let sleep_interval = std::time::Duration::from_secs(1);
        let max_retries = 5;
        let mut failed_retries = 0;

        loop {
            let url = reqwest::Url::parse(&format!("https://{address}/readiness")).unwrap();
            match client().get(url).send().await {
                Ok(_) => break,
                Err(e) => {
                    failed_retries += 1;
                    if failed_retries >= max_retries {
                        panic!("failed to start the server: {:?}", e);
                    }
                    tokio::time::sleep(sleep_interval).await;
                }
            }
        }
    }

    pub async fn peer_certificate(address: &str) -> Vec<u8> {
        let url = reqwest::Url::parse(&format!("https://{address}/readiness")).unwrap();
        let response = client().get(url).send().await.unwrap();

        response
            .extensions()
            .get::<reqwest::tls::TlsInfo>()
            .and_then(|info| info.peer_certificate())
            .expect("peer certificate should be available")
            .to_vec()
    }

    pub async fn check_peer_certificate(address: &str, expected: &[u8]) -> bool {
        let sleep_interval = std::time::Duration::from_secs(1);
        let max_retries = 10;
        let mut failed_retries = 0;
        loop {
            if peer_certificate(address).await == expected {
                return true;
            }
            failed_retries += 1;
            if failed_retries >= max_retries {
                return false;
            }
            tokio::time::sleep(sleep_interval).await;
        }
    }
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_mutate_over_https() {
    use memcached_webhook::{WebhookServer, config::TlsConfig};
    use std::net::SocketAddr;
    use tls_helpers::*;

    install_crypto_provider();

    let certs_dir = tempfile::tempdir().unwrap();
    let cert_file = certs_dir.path().join("tls.crt");
    let key_file = certs_dir.path().join("tls.key");
    let tls_data = create_cert("memcached-webhook.default.svc");
    std::fs::write(&cert_file, tls_data.cert).unwrap();
    std::fs::write(&key_file, tls_data.key).unwrap();

    let mut config = default_test_config();
    config.addr = SocketAddr::from(([127, 0, 0, 1], 3444));
    config.tls_config = TlsConfig {
        cert_file,
        key_file,
    };
    let address = config.addr.to_string();

    tokio::spawn(async move {
        WebhookServer::new_from_config(config).run().await.unwrap();
    });
    wait_for_server_to_be_ready(&address).await;

    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap();
    let response = client
        .post(format!("https://{address}/mutate"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(include_str!("data/memcached_size_3.json"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let review: AdmissionReview = serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert!(review.response.unwrap().allowed);
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread")]
async fn test_detect_certificate_rotation() {
    use memcached_webhook::{WebhookServer, config::TlsConfig};
    use std::net::SocketAddr;
    use tls_helpers::*;

    install_crypto_provider();

    let certs_dir = tempfile::tempdir().unwrap();
    let cert_file = certs_dir.path().join("tls.crt");
    let key_file = certs_dir.path().join("tls.key");

    let tls_data1 = create_cert("cert1.example.com");
    std::fs::write(&cert_file, &tls_data1.cert).unwrap();
    std::fs::write(&key_file, &tls_data1.key).unwrap();

    let mut config = default_test_config();
    config.addr = SocketAddr::from(([127, 0, 0, 1], 3445));
    config.tls_config = TlsConfig {
        cert_file: cert_file.clone(),
        key_file: key_file.clone(),
    };
    let address = config.addr.to_string();

    tokio::spawn(async move {
        WebhookServer::new_from_config(config).run().await.unwrap();
    });
    wait_for_server_to_be_ready(&address).await;

    assert!(check_peer_certificate(&address, &tls_data1.der).await);

    let tls_data2 = create_cert("cert2.example.com");

    // write only the cert file
    std::fs::write(&cert_file, &tls_data2.cert).unwrap();

    // give inotify some time to ensure it detected the cert change
    tokio::time::sleep(std::time::Duration::from_secs(4)).await;

    // the old certificate should still be in use, since the key didn't change yet
    assert!(check_peer_certificate(&address, &tls_data1.der).await);

    std::fs::write(&key_file, &tls_data2.key).unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(4)).await;

    assert!(check_peer_certificate(&address, &tls_data2.der).await);
}
