use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode},
};
use scraper::{Html, Selector};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meklet::Config;
use meklet::api::{AppState, create_router};

fn router_for(server_url: String, summary_endpoint: String) -> Router {
    let config = Config {
        server_url,
        summary_endpoint,
        summary_wait: Duration::from_secs(2),
        request_timeout: Duration::from_secs(2),
        ..Config::default()
    };
    create_router(Arc::new(AppState::new(config).unwrap()))
}

fn router_with_mock(server: &MockServer) -> Router {
    router_for(server.uri(), format!("{}/w/api.php", server.uri()))
}

async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn count(html: &str, selector: &str) -> usize {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).unwrap();
    document.select(&selector).count()
}

#[tokio::test]
async fn first_visit_serves_initial_page() {
    let server = MockServer::start().await;
    let (status, html) = get(router_with_mock(&server), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(count(&html, "form.search-form.init[action=\"/\"][method=\"get\"]"), 1);
    assert!(count(&html, ".init") > 0);
    assert_eq!(count(&html, ".result-item"), 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn query_renders_results_server_side() {
    let server = MockServer::start().await;
    Mock::given(path("/api/search-results"))
        .and(query_param("advanced", "false"))
        .and(query_param("query", "cats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [1, 2.5, "Cat", "https://en.wikipedia.org/wiki/Cat"],
            [2, 1.0, "Lion", "https://en.wikipedia.org/wiki/Lion"]
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"pages": {"1": {"extract": "A feline."}}}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (status, html) = get(router_with_mock(&server), "/?query=cats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(count(&html, ".init"), 0);
    assert_eq!(count(&html, ".result-item"), 2);
    assert_eq!(count(&html, "p.summary.loading-grad"), 0);
    assert!(html.contains("A feline...."));
    assert_eq!(count(&html, "input.search-input[value=\"cats\"]"), 1);
    assert_eq!(count(&html, "#advanced[checked]"), 0);
}

#[tokio::test]
async fn advanced_checkbox_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(path("/api/search-results"))
        .and(query_param("advanced", "true"))
        .and(query_param("query", "\"harry potter\" and books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, html) = get(
        router_with_mock(&server),
        "/?query=%22harry+potter%22+and+books&advanced=true",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h2>No Results</h2>"));
    assert_eq!(count(&html, "#advanced[checked]"), 1);
}

#[tokio::test]
async fn backend_down_still_serves_page() {
    let (status, html) = get(
        router_for(
            "http://127.0.0.1:9".to_string(),
            "http://127.0.0.1:9/w/api.php".to_string(),
        ),
        "/?query=cats",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(count(&html, ".init") > 0);
    assert_eq!(count(&html, ".result-item"), 0);
}

#[tokio::test]
async fn serves_static_assets() {
    let server = MockServer::start().await;
    let (status, css) = get(router_with_mock(&server), "/static/style.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(css.contains(".loading-grad"));
}

#[test]
fn unusable_template_is_rejected_at_startup() {
    let dir = std::env::temp_dir().join(format!("meklet-template-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let template = dir.join("page.html");
    std::fs::write(&template, "<html><body><p>no form here</p></body></html>").unwrap();

    let config = Config {
        template_path: Some(template),
        ..Config::default()
    };
    let err = AppState::new(config).err().unwrap();
    assert!(matches!(err, meklet::ClientError::MissingElement(_)));

    std::fs::remove_dir_all(&dir).ok();
}
