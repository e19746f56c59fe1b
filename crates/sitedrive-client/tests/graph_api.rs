//! Graph API integration tests against a mock server.

use serde_json::json;
use sitedrive_client::{Error, GraphClient, SiteReference};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE_PATH: &str = "/v1.0/sites/contoso.sharepoint.com:/sites/demo";
const ROOT_CHILDREN: &str = "/v1.0/sites/site-1/drive/root/children";

fn client(server: &MockServer) -> GraphClient {
    GraphClient::builder()
        .base_url(format!("{}/v1.0", server.uri()))
        .access_token("test-token")
        .build()
        .unwrap()
}

fn site() -> SiteReference {
    SiteReference::parse("https://contoso.sharepoint.com/sites/demo").unwrap()
}

async fn mount_site(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(SITE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "site-1",
            "displayName": "Demo"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn children(items: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": items }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Site resolution
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolve_site_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SITE_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "site-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let handle = client(&server).sites().resolve(&site()).await.unwrap();
    assert_eq!(handle.as_str(), "site-1");
}

#[tokio::test]
async fn test_resolve_root_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/sites/contoso.sharepoint.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "root-site"})))
        .mount(&server)
        .await;

    let root = SiteReference::parse("https://contoso.sharepoint.com").unwrap();
    let handle = client(&server).sites().resolve(&root).await.unwrap();
    assert_eq!(handle.as_str(), "root-site");
}

#[tokio::test]
async fn test_resolve_site_missing_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SITE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"displayName": "Demo"})))
        .mount(&server)
        .await;

    let err = client(&server).sites().resolve(&site()).await.unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "id", .. }));
}

#[tokio::test]
async fn test_site_resolution_is_memoized() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(children(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    client.drive().list(&site(), None).await.unwrap();
    client.drive().list(&site(), None).await.unwrap();
}

#[tokio::test]
async fn test_site_resolution_without_memo() {
    let server = MockServer::start().await;
    mount_site(&server, 2).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(children(json!([])))
        .mount(&server)
        .await;

    let client = GraphClient::builder()
        .base_url(format!("{}/v1.0", server.uri()))
        .access_token("test-token")
        .cache_sites(false)
        .build()
        .unwrap();
    client.drive().list(&site(), None).await.unwrap();
    client.drive().list(&site(), None).await.unwrap();
}

#[tokio::test]
async fn test_invalidate_site_forces_lookup() {
    let server = MockServer::start().await;
    mount_site(&server, 2).await;

    let client = client(&server);
    client.sites().resolve(&site()).await.unwrap();
    client.invalidate_site(&site()).await;
    client.sites().resolve(&site()).await.unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing and search
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_root_maps_entries() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(children(json!([
            {"id": "1", "name": "a.txt", "size": 2048, "lastModifiedDateTime": "2024-01-15T10:30:00Z"},
            {"id": "2", "name": "Sub", "folder": {"childCount": 3}}
        ])))
        .mount(&server)
        .await;

    let entries = client(&server).drive().list(&site(), None).await.unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].name, "a.txt");
    assert_eq!(entries[0].size, 2048);
    assert!(!entries[0].is_folder);
    assert!(entries[0].last_modified.is_some());

    assert_eq!(entries[1].name, "Sub");
    assert_eq!(entries[1].size, 0);
    assert!(entries[1].is_folder);
}

#[tokio::test]
async fn test_list_folder_uses_encoded_path() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(
            "/v1.0/sites/site-1/drive/root:/Shared%20Documents/Sub:/children",
        ))
        .respond_with(children(json!([{"id": "9", "name": "deep.txt", "size": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client(&server)
        .drive()
        .list(&site(), Some("/Shared Documents/Sub/"))
        .await
        .unwrap();
    assert_eq!(entries[0].name, "deep.txt");
}

#[tokio::test]
async fn test_search() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1.0/sites/site-1/drive/root/search(q='budget%202024')"))
        .respond_with(children(json!([{"id": "5", "name": "budget 2024.xlsx", "size": 10}])))
        .expect(1)
        .mount(&server)
        .await;

    let hits = client(&server)
        .drive()
        .search(&site(), "budget 2024")
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "budget 2024.xlsx");
}

#[tokio::test]
async fn test_pagination_follows_next_link() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1", "name": "first"}],
            "@odata.nextLink": format!("{}/v1.0/next-page", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/next-page"))
        .respond_with(children(json!([{"id": "2", "name": "second"}])))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client(&server).drive().list(&site(), None).await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
}

#[tokio::test]
async fn test_pagination_stops_at_page_limit() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1", "name": "first"}],
            "@odata.nextLink": format!("{}/v1.0/next-page", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/next-page"))
        .respond_with(children(json!([{"id": "2", "name": "second"}])))
        .expect(0)
        .mount(&server)
        .await;

    let client = GraphClient::builder()
        .base_url(format!("{}/v1.0", server.uri()))
        .access_token("test-token")
        .max_pages(1)
        .build()
        .unwrap();
    let entries = client.drive().list(&site(), None).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_pagination_ignores_foreign_next_link() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1", "name": "first"}],
            "@odata.nextLink": format!("{}/v1.0/next-page", other.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(children(json!([{"id": "2", "name": "second"}])))
        .expect(0)
        .mount(&other)
        .await;

    let entries = client(&server).drive().list(&site(), None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "first");
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SITE_PATH))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": {"message": "Forbidden"}})),
        )
        .mount(&server)
        .await;

    let err = client(&server).drive().list(&site(), None).await.unwrap_err();
    let text = err.to_string();
    assert!(text.contains("403"), "{text}");
    assert!(text.contains("Forbidden"), "{text}");
    match err {
        Error::Remote { status, url, .. } => {
            assert_eq!(status, 403);
            assert!(url.ends_with(SITE_PATH));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).drive().list(&site(), None).await.unwrap_err();
    assert!(err.is_server_error());
    assert!(err.to_string().contains("bad gateway"));
}

#[tokio::test]
async fn test_item_without_id_is_error() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(ROOT_CHILDREN))
        .respond_with(children(json!([{"name": "nameless"}])))
        .mount(&server)
        .await;

    let err = client(&server).drive().list(&site(), None).await.unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "id", .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Content
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_content_follows_redirect() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(
            "/v1.0/sites/site-1/drive/root:/Shared%20Documents/report.txt:/content",
        ))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/download/report.txt", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/report.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"quarterly numbers".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client(&server)
        .drive()
        .content(&site(), "Shared Documents/report.txt")
        .await
        .unwrap();
    assert_eq!(bytes, b"quarterly numbers");
}

#[tokio::test]
async fn test_content_not_found() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1.0/sites/site-1/drive/root:/missing.txt:/content"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "itemNotFound", "message": "The resource could not be found."}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .drive()
        .content(&site(), "missing.txt")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_content_rejects_empty_path() {
    let server = MockServer::start().await;
    let err = client(&server).drive().content(&site(), "/").await.unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}

#[tokio::test]
async fn test_dot_segments_are_rejected_before_any_request() {
    let server = MockServer::start().await;
    mount_site(&server, 0).await;
    let client = client(&server);

    let err = client.drive().content(&site(), "../../x").await.unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));

    let err = client
        .drive()
        .list(&site(), Some("Documents/.."))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}
