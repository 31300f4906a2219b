//! Workflow integration tests
//!
//! Runs the generate, sign and verify workflows over real HTTP against the
//! in-process mock service from `common::mock_service`.

use digisign_client::{
    save_artifact, ClientConfiguration, ClientError, GenerateWorkflow, HttpTransport,
    OperationState, SignWorkflow, Tone, VerifyWorkflow,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;

mod common;

use common::mock_service::{expected_signature, CannedReply, MockConfig, MockService};
use common::{write_fixture, TEST_CERTIFICATE, TEST_PRIVATE_KEY};

fn config_for(service: &MockService) -> ClientConfiguration {
    ClientConfiguration {
        service_url: service.url(),
        timeout_seconds: 5,
        ..ClientConfiguration::default()
    }
}

fn sign_workflow(service: &MockService) -> SignWorkflow<HttpTransport> {
    SignWorkflow::from_config(&config_for(service)).unwrap()
}

fn verify_workflow(service: &MockService) -> VerifyWorkflow<HttpTransport> {
    VerifyWorkflow::from_config(&config_for(service)).unwrap()
}

fn generate_workflow(service: &MockService) -> GenerateWorkflow<HttpTransport> {
    GenerateWorkflow::from_config(&config_for(service)).unwrap()
}

mod sign_tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_produces_named_signature_artifact() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "contract.pdf", b"%PDF-1.7 terms");
        let key = write_fixture(dir.path(), "private_key.pem", TEST_PRIVATE_KEY);

        let workflow = sign_workflow(&service);
        let rendered = workflow.sign(&data, &key).await.unwrap();

        assert_eq!(rendered.tone, Tone::Positive);
        let artifact = rendered.artifact.expect("signature artifact");
        let signature = expected_signature(b"%PDF-1.7 terms");
        assert_eq!(artifact.name, "contract.pdf.sig");
        assert_eq!(artifact.bytes, signature.as_bytes());
        assert!(rendered
            .message
            .contains(&format!("{} bytes", signature.len())));
        assert!(workflow.controller().context().trigger().is_enabled());
    }

    #[tokio::test]
    async fn test_sign_frames_multipart_fields() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let payload = [0u8, 159, 146, 150, 255];
        let data = write_fixture(dir.path(), "blob.bin", payload);
        let key = write_fixture(dir.path(), "key.pem", TEST_PRIVATE_KEY);

        sign_workflow(&service).sign(&data, &key).await.unwrap();

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.path, "/api/sign");
        assert_eq!(request.fields["data"], payload);
        assert_eq!(request.file_names["data"], "blob.bin");
        assert_eq!(request.field_text("key").unwrap(), TEST_PRIVATE_KEY);
        assert!(!request.file_names.contains_key("key"));
    }

    #[tokio::test]
    async fn test_sign_rejected_key_shows_error_and_details() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"hello");
        let key = write_fixture(dir.path(), "key.pem", "not a key");

        let workflow = sign_workflow(&service);
        let rendered = workflow.sign(&data, &key).await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(rendered.message.contains("Invalid private key"));
        assert!(rendered.message.contains("failed to decode PEM block"));
        assert!(rendered.artifact.is_none());
        assert!(matches!(
            workflow.controller().state(),
            OperationState::Failed(ClientError::ServiceError { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_before_dispatch() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"hello");
        let key = write_fixture(dir.path(), "key.pem", "");

        let workflow = sign_workflow(&service);
        let rendered = workflow.sign(&data, &key).await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(rendered.message.contains("`key`"));
        assert!(matches!(
            workflow.controller().state(),
            OperationState::Failed(ClientError::ValidationError(_))
        ));
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_data_file_is_read_error() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let key = write_fixture(dir.path(), "key.pem", TEST_PRIVATE_KEY);

        let workflow = sign_workflow(&service);
        let rendered = workflow
            .sign(dir.path().join("missing.bin"), &key)
            .await
            .unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(matches!(
            workflow.controller().state(),
            OperationState::Failed(ClientError::ReadError(_))
        ));
        assert_eq!(service.request_count(), 0);
        assert!(workflow.controller().context().trigger().is_enabled());
    }

    #[tokio::test]
    async fn test_malformed_success_body() {
        let service = MockService::start(MockConfig {
            sign: Some(CannedReply::text(200, "signed!")),
            ..MockConfig::default()
        });
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"hello");
        let key = write_fixture(dir.path(), "key.pem", TEST_PRIVATE_KEY);

        let workflow = sign_workflow(&service);
        let rendered = workflow.sign(&data, &key).await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(matches!(
            workflow.controller().state(),
            OperationState::Failed(ClientError::MalformedResponse(_))
        ));
        assert!(workflow.controller().context().trigger().is_enabled());
    }

    #[tokio::test]
    async fn test_concurrent_submit_is_rejected() {
        let service = MockService::start(MockConfig {
            delay: Duration::from_millis(200),
            ..MockConfig::default()
        });
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"hello");
        let key = write_fixture(dir.path(), "key.pem", TEST_PRIVATE_KEY);

        let workflow = sign_workflow(&service);
        let (first, second) = tokio::join!(workflow.sign(&data, &key), workflow.sign(&data, &key));

        assert!(first.unwrap().is_positive());
        assert!(matches!(
            second,
            Err(ClientError::SubmissionInProgress(_))
        ));
        assert_eq!(service.request_count(), 1);
        assert!(workflow.controller().context().trigger().is_enabled());
    }
}

mod verify_tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_then_verify_round_trip() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "invoice.txt", b"total: 42");
        let key = write_fixture(dir.path(), "key.pem", TEST_PRIVATE_KEY);
        let cert = write_fixture(dir.path(), "cert.pem", TEST_CERTIFICATE);

        let signed = sign_workflow(&service).sign(&data, &key).await.unwrap();
        let artifact = signed.artifact.unwrap();
        let signature = save_artifact(&artifact, &dir.path().join("out"))
            .await
            .unwrap();

        let rendered = verify_workflow(&service)
            .verify(&data, &signature, &cert)
            .await
            .unwrap();
        assert_eq!(rendered.tone, Tone::Positive);
        assert!(rendered.message.contains("valid"));

        let request = &service.requests()[1];
        assert_eq!(request.path, "/api/verify");
        assert_eq!(request.field_text("cert").unwrap(), TEST_CERTIFICATE);
        assert_eq!(
            request.field_text("signature").unwrap(),
            expected_signature(b"total: 42")
        );
    }

    #[tokio::test]
    async fn test_verify_sends_all_three_fields() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"abc");
        let signature = write_fixture(dir.path(), "a.txt.sig", expected_signature(b"abc"));
        let cert = write_fixture(dir.path(), "cert.pem", TEST_CERTIFICATE);

        let rendered = verify_workflow(&service)
            .verify(&data, &signature, &cert)
            .await
            .unwrap();
        assert_eq!(rendered.tone, Tone::Positive);

        let requests = service.requests();
        assert_eq!(requests.len(), 1);
        let fields: Vec<&str> = requests[0].fields.keys().map(String::as_str).collect();
        assert_eq!(fields, ["cert", "data", "signature"]);
        assert_eq!(requests[0].file_names.len(), 1);
        assert_eq!(requests[0].file_names["data"], "a.txt");
    }

    #[tokio::test]
    async fn test_tampered_data_is_negative() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "invoice.txt", b"total: 4200");
        let signature = write_fixture(
            dir.path(),
            "invoice.txt.sig",
            expected_signature(b"total: 42"),
        );
        let cert = write_fixture(dir.path(), "cert.pem", TEST_CERTIFICATE);

        let workflow = verify_workflow(&service);
        let rendered = workflow.verify(&data, &signature, &cert).await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(rendered.message.contains("bad signature"));
    }

    #[tokio::test]
    async fn test_repeated_verify_renders_identically() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"abc");
        let signature = write_fixture(dir.path(), "a.txt.sig", expected_signature(b"abc"));
        let cert = write_fixture(dir.path(), "cert.pem", TEST_CERTIFICATE);

        let workflow = verify_workflow(&service);
        let first = workflow.verify(&data, &signature, &cert).await.unwrap();
        let second = workflow.verify(&data, &signature, &cert).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(service.request_count(), 2);
    }

    #[tokio::test]
    async fn test_non_utf8_certificate_is_read_error() {
        let service = MockService::start(MockConfig::default());
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"abc");
        let signature = write_fixture(dir.path(), "a.txt.sig", expected_signature(b"abc"));
        let cert = write_fixture(dir.path(), "cert.der", [0x30u8, 0x82, 0xff, 0xfe]);

        let workflow = verify_workflow(&service);
        let rendered = workflow.verify(&data, &signature, &cert).await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(matches!(
            workflow.controller().state(),
            OperationState::Failed(ClientError::ReadError(_))
        ));
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn test_plain_text_and_bare_status_errors() {
        let dir = TempDir::new().unwrap();
        let data = write_fixture(dir.path(), "a.txt", b"abc");
        let signature = write_fixture(dir.path(), "a.txt.sig", "c2ln");
        let cert = write_fixture(dir.path(), "cert.pem", TEST_CERTIFICATE);

        let text_service = MockService::start(MockConfig {
            verify: Some(CannedReply::text(500, "upstream crashed\n")),
            ..MockConfig::default()
        });
        let rendered = verify_workflow(&text_service)
            .verify(&data, &signature, &cert)
            .await
            .unwrap();
        assert_eq!(rendered.message, "upstream crashed");

        let bare_service = MockService::start(MockConfig {
            verify: Some(CannedReply::empty(502)),
            ..MockConfig::default()
        });
        let rendered = verify_workflow(&bare_service)
            .verify(&data, &signature, &cert)
            .await
            .unwrap();
        assert_eq!(rendered.message, "Request failed with status 502");
    }
}

mod generate_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_success_enables_downloads() {
        let service = MockService::start(MockConfig::default());

        let workflow = generate_workflow(&service);
        assert!(!workflow.download_certificate().is_enabled());

        let rendered = workflow.generate().await.unwrap();
        assert_eq!(rendered.tone, Tone::Positive);
        assert!(rendered.artifact.is_none());
        assert!(workflow.download_certificate().is_enabled());
        assert!(workflow.download_key().is_enabled());

        let requests = service.requests();
        assert_eq!(requests[0].method, "POST");
        assert!(requests[0].fields.is_empty());
    }

    #[tokio::test]
    async fn test_generate_returns_archive_artifact() {
        let service = MockService::start(MockConfig {
            generate: CannedReply::archive("alice-credentials.zip", b"PK\x03\x04data"),
            ..MockConfig::default()
        });

        let rendered = generate_workflow(&service).generate().await.unwrap();
        let archive = rendered.artifact.expect("archive");
        assert_eq!(archive.name, "alice-credentials.zip");
        assert_eq!(archive.bytes, b"PK\x03\x04data");
    }

    #[tokio::test]
    async fn test_generate_failure_keeps_downloads_disabled() {
        let service = MockService::start(MockConfig {
            generate: CannedReply::json(500, json!({ "error": "Failed to generate key" })),
            ..MockConfig::default()
        });

        let workflow = generate_workflow(&service);
        let rendered = workflow.generate().await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert_eq!(rendered.message, "Failed to generate key");
        assert!(!workflow.download_certificate().is_enabled());
        assert!(!workflow.download_key().is_enabled());
        assert!(workflow.controller().context().trigger().is_enabled());
    }

    #[tokio::test]
    async fn test_manual_download_saves_archive() {
        let service = MockService::start(MockConfig {
            download: CannedReply::archive("../keys.zip", b"PK\x03\x04zip"),
            ..MockConfig::default()
        });
        let dir = TempDir::new().unwrap();

        let workflow = generate_workflow(&service);
        let path = workflow.download(dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("keys.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04zip");
        assert_eq!(service.requests()[0].method, "GET");
        // the download path leaves the workflow state alone
        assert_eq!(workflow.controller().state(), OperationState::Idle);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let config = ClientConfiguration {
            service_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..ClientConfiguration::default()
        };

        let workflow = GenerateWorkflow::from_config(&config).unwrap();
        let rendered = workflow.generate().await.unwrap();

        assert_eq!(rendered.tone, Tone::Negative);
        assert!(rendered.message.starts_with("Network error"));
        assert!(matches!(
            workflow.controller().state(),
            OperationState::Failed(ClientError::TransportError(_))
        ));
        assert!(workflow.controller().context().trigger().is_enabled());
        assert!(!workflow.download_key().is_enabled());
    }
}
