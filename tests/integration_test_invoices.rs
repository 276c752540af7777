mod common;

use axum::http::StatusCode;
use common::{TestApp, TestOptions};
use serde_json::json;

fn basic_invoice() -> serde_json::Value {
    json!({
        "customerName": "Jordan Lee",
        "customerEmail": "jordan@example.com",
        "customerPhone": "+15550001111",
        "lineItems": [
            { "description": "Full detail", "amount": 12.5, "quantity": 2 }
        ],
        "depositAmount": 5.0
    })
}

#[tokio::test]
async fn test_create_draft_invoice_with_deposit() {
    let app = TestApp::new().await;

    let (status, body) = app.request("POST", "/api/v1/invoices", Some(basic_invoice()), true).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "draft");
    assert_eq!(body["total"], 20.0);
    assert_eq!(body["emailSent"], false);
    assert_eq!(body["smsSent"], false);
    assert_eq!(body["customerId"], "cus_test");

    let items = app.payments.items.lock().unwrap().clone();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].unit_amount, 1250);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[1].unit_amount, -500);

    let calls = app.payments.calls();
    assert!(!calls.iter().any(|c| c.starts_with("finalize_invoice")));
}

#[tokio::test]
async fn test_create_and_send_invoice() {
    let app = TestApp::new().await;

    let mut payload = basic_invoice();
    payload["createAsDraft"] = json!(false);
    payload["sendViaEmail"] = json!(true);
    payload["sendViaSms"] = json!(true);

    let (status, body) = app.request("POST", "/api/v1/invoices", Some(payload), true).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "open");
    assert_eq!(body["invoiceNumber"], "TEST-0001");
    assert_eq!(body["emailSent"], true);
    assert_eq!(body["smsSent"], true);

    let sms = app.messaging.sent.lock().unwrap().clone();
    assert_eq!(sms.len(), 1);
    assert_eq!(sms[0].0, "+15550001111");
    assert!(sms[0].1.contains("https://pay.test/"));
}

#[tokio::test]
async fn test_email_failure_is_reported_not_raised() {
    let app = TestApp::with_options(TestOptions { fail_invoice_email: true, ..Default::default() }).await;

    let mut payload = basic_invoice();
    payload["createAsDraft"] = json!(false);
    payload["sendViaEmail"] = json!(true);

    let (status, body) = app.request("POST", "/api/v1/invoices", Some(payload), true).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "open");
    assert_eq!(body["emailSent"], false);
}

#[tokio::test]
async fn test_send_existing_draft_defaults_to_email() {
    let app = TestApp::new().await;

    let (_, created) = app.request("POST", "/api/v1/invoices", Some(basic_invoice()), true).await;
    let invoice_id = created["invoiceId"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("POST", &format!("/api/v1/invoices/{}/send", invoice_id), None, true)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "open");
    assert_eq!(body["emailSent"], true);
    assert_eq!(body["smsSent"], false);

    let (status, view) = app.request("GET", &format!("/api/v1/invoices/{}", invoice_id), None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["invoiceId"], invoice_id);
    assert_eq!(view["amountDue"], 20.0);
    assert_eq!(view["hostedInvoiceUrl"], format!("https://pay.test/{}", invoice_id));
}

#[tokio::test]
async fn test_invoice_validation() {
    let app = TestApp::new().await;

    let cases = vec![
        json!({ "customerName": "", "customerEmail": "a@b.c", "lineItems": [{ "description": "Wash", "amount": 10 }] }),
        json!({ "customerName": "Ana", "lineItems": [{ "description": "Wash", "amount": 10 }] }),
        json!({ "customerName": "Ana", "customerEmail": "a@b.c", "lineItems": [] }),
        json!({ "customerName": "Ana", "customerEmail": "a@b.c", "lineItems": [{ "description": "Wash", "amount": 0 }] }),
        json!({ "customerName": "Ana", "customerEmail": "a@b.c", "lineItems": [{ "description": "Wash", "amount": 10 }], "depositAmount": 50 }),
    ];

    for payload in cases {
        let (status, body) = app.request("POST", "/api/v1/invoices", Some(payload.clone()), true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} gave {}", payload, body);
        assert!(body["error"].is_string());
    }

    assert!(app.payments.calls().is_empty());
}

#[tokio::test]
async fn test_invoice_routes_require_admin_token() {
    let app = TestApp::new().await;

    let (status, _) = app.request("POST", "/api/v1/invoices", Some(basic_invoice()), false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/api/v1/invoices/in_1", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_unavailable_without_token_configured() {
    let app = TestApp::with_options(TestOptions { admin_token: false, ..Default::default() }).await;

    let (status, _) = app.request("POST", "/api/v1/invoices", Some(basic_invoice()), true).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_invoices_unavailable_without_payment_provider() {
    let app = TestApp::with_options(TestOptions { vendors: false, ..Default::default() }).await;

    let (status, body) = app.request("POST", "/api/v1/invoices", Some(basic_invoice()), true).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Payment provider is not configured");
}

#[tokio::test]
async fn test_unknown_invoice_maps_provider_error() {
    let app = TestApp::new().await;

    let (status, _) = app.request("GET", "/api/v1/invoices/in_missing", None, true).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let app = TestApp::new().await;

    let cases = vec![
        json!({
            "customerName": "Ana",
            "customerEmail": "a@b.c",
            "lineItems": [{ "description": "Wash", "amount": 1e17, "quantity": 1000 }]
        }),
        json!({
            "customerName": "Ana",
            "customerEmail": "a@b.c",
            "lineItems": [{ "description": "Wash", "amount": 10, "quantity": 4000000000u32 }]
        }),
        json!({
            "customerName": "Ana",
            "customerEmail": "a@b.c",
            "lineItems": [{ "description": "Wash", "amount": 10 }],
            "depositAmount": 1e300
        }),
    ];

    for payload in cases {
        let (status, body) = app.request("POST", "/api/v1/invoices", Some(payload.clone()), true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {} gave {}", payload, body);
    }

    assert!(app.payments.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_invoice_ids_never_reach_provider() {
    let app = TestApp::new().await;

    for uri in ["/api/v1/invoices/cus_123", "/api/v1/invoices/in_1%2F..%2F..%2Fcustomers", "/api/v1/invoices/in_1%3Fexpand=x"] {
        let (status, _) = app.request("GET", uri, None, true).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} accepted", uri);
    }

    let (status, _) = app
        .request("POST", "/api/v1/invoices/in_1%2Fvoid/send", Some(json!({ "sendViaEmail": true })), true)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.payments.calls().is_empty());
}
