//! Integration tests for banner list/create/edit/delete.

mod common;

use common::{client, create_banner, list, TestHarness};

#[tokio::test]
async fn list_starts_empty() {
    let (_h, addr) = TestHarness::with_server().await;
    assert!(list(addr).await.is_empty());
}

#[tokio::test]
async fn create_returns_default_banner() {
    let (h, addr) = TestHarness::with_server().await;

    let resp = client()
        .post(format!("http://{addr}/banners"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();

    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["isSilent"], false);
    assert_eq!(body["weight"], 10);
    for key in [
        "startDate",
        "endDate",
        "imageUrl",
        "imageHeight",
        "imageWidth",
        "url",
    ] {
        assert!(
            body.get(key).is_some_and(|v| v.is_null()),
            "{key} should be an explicit null"
        );
    }
    assert_eq!(h.count("banners"), 1);
}

#[tokio::test]
async fn list_returns_banners_in_id_order() {
    let (_h, addr) = TestHarness::with_server().await;
    let first = create_banner(addr).await;
    let second = create_banner(addr).await;

    let banners = list(addr).await;
    let ids: Vec<i64> = banners.iter().map(|b| b["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(banners[0]["imageUrl"].is_null());
}

#[tokio::test]
async fn partial_edit_leaves_other_fields() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;
    let c = client();

    let resp = c
        .post(format!("http://{addr}/banners/{id}/edit"))
        .form(&[("startDate", "2024-01-01"), ("weight", "25")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().is_empty());

    let resp = c
        .post(format!("http://{addr}/banners/{id}/edit"))
        .form(&[("url", "https://example.com/promo")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let banner = &list(addr).await[0];
    assert_eq!(banner["startDate"], "2024-01-01");
    assert_eq!(banner["weight"], 25);
    assert_eq!(banner["url"], "https://example.com/promo");
    assert!(banner["endDate"].is_null());
    assert_eq!(banner["isSilent"], false);
}

#[tokio::test]
async fn empty_values_clear_fields() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;
    let c = client();

    c.post(format!("http://{addr}/banners/{id}/edit"))
        .form(&[
            ("startDate", "2024-01-01"),
            ("endDate", "2024-02-01"),
            ("url", "https://example.com"),
        ])
        .send()
        .await
        .unwrap();

    let resp = c
        .post(format!("http://{addr}/banners/{id}/edit"))
        .form(&[("startDate", ""), ("url", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let banner = &list(addr).await[0];
    assert!(banner["startDate"].is_null());
    assert!(banner["url"].is_null());
    assert_eq!(banner["endDate"], "2024-02-01");
}

#[tokio::test]
async fn silent_flag_decoding() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;
    let c = client();
    let edit = |value: &'static str| {
        c.post(format!("http://{addr}/banners/{id}/edit"))
            .form(&[("silent", value)])
            .send()
    };

    assert_eq!(edit("True").await.unwrap().status(), 200);
    assert_eq!(list(addr).await[0]["isSilent"], true);

    assert_eq!(edit("true").await.unwrap().status(), 200);
    assert_eq!(list(addr).await[0]["isSilent"], false);
}

#[tokio::test]
async fn unparseable_weight_becomes_zero() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit"))
        .form(&[("weight", "heavy")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(list(addr).await[0]["weight"], 0);
}

#[tokio::test]
async fn edit_rejects_invalid_date() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit"))
        .form(&[("endDate", "not-a-date"), ("weight", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().is_empty());

    // Nothing from the rejected form was applied.
    assert_eq!(list(addr).await[0]["weight"], 10);
}

#[tokio::test]
async fn edit_unknown_banner_is_400() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = client()
        .post(format!("http://{addr}/banners/999/edit"))
        .form(&[("weight", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client()
        .post(format!("http://{addr}/banners/999/edit"))
        .form::<[(&str, &str); 0]>(&[])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn empty_edit_of_existing_banner_succeeds() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit"))
        .form::<[(&str, &str); 0]>(&[])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn edit_reads_query_string() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit?weight=5&silent=True"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let banner = &list(addr).await[0];
    assert_eq!(banner["weight"], 5);
    assert_eq!(banner["isSilent"], true);
}

#[tokio::test]
async fn body_overrides_query_string() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit?weight=5&url=https://q.example"))
        .form(&[("weight", "7")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let banner = &list(addr).await[0];
    assert_eq!(banner["weight"], 7);
    assert_eq!(banner["url"], "https://q.example");
}

#[tokio::test]
async fn edit_reads_multipart_body() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let form = reqwest::multipart::Form::new()
        .text("weight", "6")
        .text("silent", "True")
        .text("unrelated", "ignored");
    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit?weight=1"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let banner = &list(addr).await[0];
    assert_eq!(banner["weight"], 6);
    assert_eq!(banner["isSilent"], true);
}

#[tokio::test]
async fn invalid_date_in_query_is_rejected() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;

    let resp = client()
        .post(format!("http://{addr}/banners/{id}/edit?startDate=bad"))
        .form(&[("weight", "3")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(list(addr).await[0]["weight"], 10);
}

#[tokio::test]
async fn delete_banner_then_again() {
    let (h, addr) = TestHarness::with_server().await;
    let id = create_banner(addr).await;
    let c = client();

    let resp = c
        .delete(format!("http://{addr}/banners/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().is_empty());
    assert_eq!(h.count("banners"), 0);

    let resp = c
        .delete(format!("http://{addr}/banners/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = client()
        .delete(format!("http://{addr}/banners/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn health_and_openapi_are_public() {
    let (_h, addr) = TestHarness::with_server().await;
    let c = reqwest::Client::new();

    let resp = c.get(format!("http://{addr}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = c
        .get(format!("http://{addr}/api-docs/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let doc: serde_json::Value = resp.json().await.unwrap();
    assert!(doc["paths"]["/banners/{id}/upload"].is_object());
}

#[tokio::test]
async fn request_id_is_echoed() {
    let (_h, addr) = TestHarness::with_server().await;
    let c = reqwest::Client::new();

    let resp = c
        .get(format!("http://{addr}/health"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me");

    let resp = c.get(format!("http://{addr}/health")).send().await.unwrap();
    assert!(!resp.headers()["x-request-id"].is_empty());
}
