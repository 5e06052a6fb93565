//! Client SDK tests against a mocked FaceCensor API.

use facecensor_client::{ClientError, FaceCensorClient, ImageStatus, TransactionKind};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "user-token";

fn client(server: &MockServer) -> FaceCensorClient {
    FaceCensorClient::new(server.uri(), TOKEN).unwrap()
}

fn job_json(status: &str, has_processed: bool) -> serde_json::Value {
    json!({
        "id": "01HZY8Q9V7J5D3K2M1N0P9R8S7",
        "original_filename": "team.jpg",
        "media_type": "image/jpeg",
        "faces_detected": 2,
        "status": status,
        "credits_used": 1,
        "created_at": "2026-10-19T12:00:00Z",
        "updated_at": "2026-10-19T12:00:01Z",
        "has_processed": has_processed,
    })
}

fn error_json(code: &str, message: &str, details: serde_json::Value) -> serde_json::Value {
    json!({ "error": { "code": code, "message": message, "details": details } })
}

#[tokio::test]
async fn create_account_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "account_id": "5f0c6f0e-8a57-4e8e-9d0b-0d6f3c1a2b3c",
            "credits": 1,
            "lifetime_granted": 1,
            "lifetime_purchased": 0,
            "lifetime_used": 0,
            "created_at": "2026-10-19T12:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = client(&server).create_account().await.unwrap();

    assert_eq!(account.credits, 1);
    assert_eq!(account.lifetime_granted, 1);
}

#[tokio::test]
async fn get_balance_parses_transactions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/credits/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credits": 0,
            "transactions": [{
                "id": "01HZY8Q9V7J5D3K2M1N0P9R8S8",
                "delta": -1,
                "kind": "usage",
                "balance_after": 0,
                "description": "Face censoring: team.jpg",
                "metadata": { "image_id": "01HZY8Q9V7J5D3K2M1N0P9R8S7" },
                "created_at": "2026-10-19T12:00:01Z",
            }, {
                "id": "01HZY8Q9V7J5D3K2M1N0P9R8S6",
                "delta": 1,
                "kind": "welcome_bonus",
                "balance_after": 1,
                "description": "Welcome bonus: 1 free censor credit",
                "created_at": "2026-10-19T12:00:00Z",
            }],
        })))
        .mount(&server)
        .await;

    let balance = client(&server).get_balance().await.unwrap();

    assert_eq!(balance.credits, 0);
    assert_eq!(balance.transactions.len(), 2);
    assert_eq!(balance.transactions[0].kind, TransactionKind::Usage);
    assert_eq!(
        balance.transactions[0].metadata["image_id"],
        "01HZY8Q9V7J5D3K2M1N0P9R8S7"
    );
    assert!(balance.transactions[1].metadata.is_null());
}

#[tokio::test]
async fn list_transactions_passes_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/credits/transactions"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [],
            "has_more": false,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server).list_transactions(10, 20).await.unwrap();

    assert!(page.transactions.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn upload_returns_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("done", true)))
        .expect(1)
        .mount(&server)
        .await;

    let job = client(&server)
        .upload_image("team.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
        .await
        .unwrap();

    assert_eq!(job.status, ImageStatus::Done);
    assert_eq!(job.faces_detected, 2);
    assert!(job.has_processed);
}

#[tokio::test]
async fn upload_maps_insufficient_credits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/upload"))
        .respond_with(ResponseTemplate::new(402).set_body_json(error_json(
            "insufficient_credits",
            "insufficient credits: balance=0, required=1",
            json!({ "balance": 0, "required": 1 }),
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_image("team.jpg", "image/jpeg", vec![1, 2, 3])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::InsufficientCredits {
            balance: 0,
            required: 1
        }
    ));
}

#[tokio::test]
async fn upload_maps_unsupported_media_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/upload"))
        .respond_with(ResponseTemplate::new(415).set_body_json(error_json(
            "unsupported_media_type",
            "Only JPEG, PNG and WebP images are allowed",
            json!({ "content_type": "image/gif" }),
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_image("anim.gif", "image/gif", vec![1, 2, 3])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::UnsupportedMediaType { ref content_type } if content_type == "image/gif"));
}

#[tokio::test]
async fn upload_maps_payload_too_large() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/upload"))
        .respond_with(ResponseTemplate::new(413).set_body_json(error_json(
            "payload_too_large",
            "payload too large",
            json!({ "size": 30_000_000, "limit": 20_971_520 }),
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .upload_image("huge.jpg", "image/jpeg", vec![0; 16])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::PayloadTooLarge { limit: 20_971_520 }));
}

#[tokio::test]
async fn download_processed_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/images/abc/processed"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(b"\x89PNG\r\n".to_vec()),
        )
        .mount(&server)
        .await;

    let bytes = client(&server).download_processed("abc").await.unwrap();

    assert_eq!(bytes, b"\x89PNG\r\n");
}

#[tokio::test]
async fn download_of_failed_job_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/images/abc/processed"))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_json(
            "not_found",
            "Processed image not available",
            serde_json::Value::Null,
        )))
        .mount(&server)
        .await;

    let err = client(&server).download_processed("abc").await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound { .. }));
}

#[tokio::test]
async fn non_json_error_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/images"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).list_images(50, 0).await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 502, .. }));
}

#[tokio::test]
async fn get_image_parses_failed_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/images/01HZY8Q9V7J5D3K2M1N0P9R8S7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json("failed", false)))
        .mount(&server)
        .await;

    let job = client(&server)
        .get_image("01HZY8Q9V7J5D3K2M1N0P9R8S7")
        .await
        .unwrap();

    assert_eq!(job.status, ImageStatus::Failed);
    assert!(!job.has_processed);
}
