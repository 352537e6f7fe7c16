use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use cargoos_core::Environment;
use cargoos_fx::{FxError, MemoryRateCache, RateSource};
use cargoos_scraper::{
    Classifier, ExtractOptions, FetchError, FetchOptions, PageFetcher, PipelineSettings, Url,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

const RESULTS_PAGE: &str = r#"
<div class="offer">
  <a href="https://detail.1688.com/offer/1.html">源头工厂 保温杯</a>
  <span class="price">￥12.50-18.00</span>
  <span class="tag">实力商家</span>
</div>
<div class="offer">
  <a href="https://detail.1688.com/offer/2.html">工厂直供 水杯</a>
  <span class="price">￥3.00</span>
  <span class="tag">实地认证</span>
</div>
"#;

struct StaticFetcher;

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, _url: &Url, _opts: &FetchOptions) -> Result<String, FetchError> {
        Ok(RESULTS_PAGE.to_string())
    }
}

enum StubRate {
    Fixed(Decimal),
    Down,
}

#[async_trait]
impl RateSource for StubRate {
    async fn fetch_rate(&self) -> Result<Decimal, FxError> {
        match self {
            Self::Fixed(rate) => Ok(*rate),
            Self::Down => Err(FxError::UpstreamStatus {
                status: 503,
                url: "https://www.cbr.ru/scripts/XML_daily.asp".to_string(),
            }),
        }
    }
}

fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        log_level: "debug".to_string(),
        user_agent: "cargoos-test/0.1".to_string(),
        search_base_url: "https://s.1688.com/selloffer/offer_search.htm".to_string(),
        search_deadline_secs: 30,
        offline_dir: dir.join("offline"),
        exports_dir: dir.join("exports"),
        scoring_rules_path: PathBuf::from("/nonexistent/scoring_rules.yaml"),
        extract_max_candidates: 5,
        extract_detail_marker: "detail".to_string(),
        fx_cbr_url: "https://www.cbr.ru/scripts/XML_daily.asp".to_string(),
        fx_cache_path: dir.join("fx.json"),
        fx_cache_ttl_secs: 3600,
        fx_target_currency: "RUB".to_string(),
        fx_timeout_secs: 5,
    }
}

fn test_app(dir: &Path, rate: StubRate) -> Router {
    let config = test_config(dir);
    let pipeline = SearchPipeline::new(
        Arc::new(StaticFetcher),
        Classifier::default(),
        PipelineSettings {
            search_base_url: config.search_base_url.clone(),
            extract: ExtractOptions::default(),
            offline_dir: config.offline_dir.clone(),
            deadline: Duration::from_secs(config.search_deadline_secs),
        },
    )
    .expect("pipeline");
    let fx = FxResolver::new(
        Arc::new(MemoryRateCache::new()),
        Arc::new(rate),
        Duration::from_secs(3600),
    );
    build_app(AppState {
        pipeline: Arc::new(pipeline),
        fx: Arc::new(fx),
        config: Arc::new(config),
    })
}

fn rate_12_5() -> StubRate {
    StubRate::Fixed(Decimal::new(125, 1))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json parse")
}

// ---------------------------------------------------------------------------
// Envelope and health
// ---------------------------------------------------------------------------

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("not_found", StatusCode::NOT_FOUND),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_returns_ok_with_request_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let response = test_app(dir.path(), rate_12_5())
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header(REQUEST_ID_HEADER, "health-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
        Some("health-1")
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = parse(&body);
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "health-1");
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_returns_ranked_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, body) = get(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/search?q=%E6%9D%AF&pages=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json = parse(&body);
    let data = json["data"].as_array().expect("data array");
    // both pages serve the same two offers; duplicates across pages are kept
    assert_eq!(data.len(), 4);
    assert_eq!(data[0]["title"], "工厂直供 水杯");
    assert_eq!(data[0]["price_min_cny"], 3.0);
    assert!(data[0]["price_max_cny"].is_null());
    assert_eq!(data[0]["audited"], true);
    let scores: Vec<f64> = data
        .iter()
        .map(|r| r["score"].as_f64().expect("score"))
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn search_rejects_out_of_range_query() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, body) = get(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/search?q=cup&pages=0",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"]["code"], "validation_error");
}

#[tokio::test]
async fn search_rejects_malformed_query() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, body) = get(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/search?q=cup&pages=many",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"]["code"], "validation_error");
}

#[tokio::test]
async fn stream_emits_start_items_and_done() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, body) = get(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/search/stream?q=cup&offline_demo=true&audited_only=false",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).expect("utf8 body");
    let start = text.find("data: start").expect("start event");
    let item = text.find("event: item").expect("item event");
    let done = text.find("data: done").expect("done event");
    assert!(start < item && item < done, "unexpected event order:\n{text}");
    assert_eq!(text.matches("event: item").count(), 1);
    assert!(text.contains("源头工厂 塑料瓶 OEM ODM"));
}

#[tokio::test]
async fn stream_rejects_invalid_query_before_opening() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, body) = get(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/search/stream?q=&offline_demo=true",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"]["code"], "validation_error");
}

// ---------------------------------------------------------------------------
// Export and RFQ
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_writes_file_and_returns_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let records = json!([
        {"title": "源头工厂 保温杯", "url": "https://detail.1688.com/offer/1.html", "score": 90.0},
        {"title": "工厂直供 水杯", "url": "https://detail.1688.com/offer/2.html"}
    ]);
    let (status, json) = post_json(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/export/json",
        &records,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["format"], "json");
    assert_eq!(json["data"]["count"], 2);
    let path = PathBuf::from(json["data"]["path"].as_str().expect("path"));
    assert!(path.starts_with(dir.path().join("exports")));
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read export")).expect("json");
    assert_eq!(written.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn export_rejects_unknown_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/export/xml",
        &json!([]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn rfq_returns_path_and_preview() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/rfq",
        &json!({"lang": "en", "title": "Insulated cup", "moq": 500, "qty": 2000}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let path = PathBuf::from(json["data"]["path"].as_str().expect("path"));
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("rfq_en.txt"));
    assert!(path.exists());
    let preview = json["data"]["preview"].as_str().expect("preview");
    assert!(preview.lines().count() <= 6);
    assert!(preview.contains("Insulated cup"));
}

#[tokio::test]
async fn rfq_rejects_blank_title() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/rfq",
        &json!({"lang": "ru", "title": "  "}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

// ---------------------------------------------------------------------------
// Landed cost
// ---------------------------------------------------------------------------

fn worked_example(fx_source: &str) -> Value {
    json!({
        "unit_price_cny": "10",
        "qty": 100,
        "duty_rate_pct": "5",
        "vat_rate_pct": "13",
        "freight_total_cny": "2000",
        "fx_source": fx_source,
        "fx_rate": "12.5"
    })
}

#[tokio::test]
async fn landed_cost_worked_example() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), StubRate::Down),
        "/api/v1/landed-cost",
        &worked_example("manual"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &json["data"];
    assert_eq!(data["total"], "43081.25");
    assert_eq!(data["vat"], "4956.25");
    assert_eq!(data["per_unit"], "430.81");
    assert_eq!(data["currency"], "RUB");
    assert_eq!(data["mode"], "sea_lcl");
}

#[tokio::test]
async fn landed_cost_uses_cbr_rate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), rate_12_5()),
        "/api/v1/landed-cost",
        &worked_example("cbr"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], "43081.25");
    assert_eq!(json["data"]["fx_rate_used"], "12.5");
}

#[tokio::test]
async fn landed_cost_maps_rate_outage_to_bad_gateway() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), StubRate::Down),
        "/api/v1/landed-cost",
        &worked_example("cbr"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "upstream_error");
}

#[tokio::test]
async fn landed_cost_manual_without_rate_is_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut body = worked_example("manual");
    body["fx_rate"] = Value::Null;
    let (status, json) = post_json(test_app(dir.path(), rate_12_5()), "/api/v1/landed-cost", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn landed_cost_rejects_negative_quantity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut body = worked_example("manual");
    body["qty"] = json!(-1);
    let (status, json) = post_json(test_app(dir.path(), rate_12_5()), "/api/v1/landed-cost", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn landed_cost_reports_rate_to_two_places() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (status, json) = post_json(
        test_app(dir.path(), StubRate::Fixed(Decimal::new(112_345, 4))),
        "/api/v1/landed-cost",
        &worked_example("cbr"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["fx_rate_used"], "11.23");
}

#[tokio::test]
async fn landed_cost_overflow_is_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut body = worked_example("manual");
    body["unit_price_cny"] = json!("100000000000000000000");
    body["qty"] = json!(10_000_000_000_i64);
    let (status, json) = post_json(test_app(dir.path(), rate_12_5()), "/api/v1/landed-cost", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}
