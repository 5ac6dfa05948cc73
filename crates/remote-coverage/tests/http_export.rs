//! End-to-end tests against a local export server.
//!
//! The server imitates an application with the coverage middleware
//! installed: it answers `/?export_code_coverage=true&coverage_group=...`
//! depending on the group prefix and echoes request cookies on `/echo`.

#![cfg(feature = "http")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use remote_coverage::storage::load;
use remote_coverage::{
    CoverageError, CoverageGroup, Feature, HttpSession, HttpTransport, LifecycleDispatcher,
    LineCoverage, RemoteCoverageConfig, RemoteCoverageListener, RemoteFetcher, SplitPolicy, Suite,
    SuiteSettings,
};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::TempDir;

async fn export(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
    if params.get("export_code_coverage").map(String::as_str) != Some("true") {
        return (StatusCode::BAD_REQUEST, "not an export request".to_string());
    }
    let group = params.get("coverage_group").cloned().unwrap_or_default();
    if group.starts_with("slow") {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if group.starts_with("html") {
        return (StatusCode::OK, "<html>Fatal error</html>".to_string());
    }
    if group.starts_with("missing") {
        return (StatusCode::NOT_FOUND, "Not Found".to_string());
    }
    let body = serde_json::json!({ "files": { "src/App.php": { "1": [group] } } });
    (StatusCode::OK, body.to_string())
}

async fn echo(headers: HeaderMap) -> String {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn spawn_server() -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            let app = Router::new()
                .route("/", get(export))
                .route("/echo", get(echo));
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

fn fetcher(timeout: Duration) -> RemoteFetcher<HttpTransport> {
    RemoteFetcher::new(HttpTransport::new(timeout).unwrap())
}

#[test]
fn test_fetch_decodes_export() {
    let base = spawn_server();
    let group = CoverageGroup::from_raw("Checkout.abc");

    let coverage: LineCoverage = fetcher(Duration::from_secs(5)).fetch(&base, &group).unwrap();

    assert!(coverage.is_covered("src/App.php", 1));
    assert!(coverage
        .hits("src/App.php", 1)
        .unwrap()
        .contains("Checkout.abc"));
}

#[test]
fn test_fetch_rejects_html() {
    let base = spawn_server();
    let err = fetcher(Duration::from_secs(5))
        .fetch::<LineCoverage>(&base, &CoverageGroup::from_raw("html.1"))
        .unwrap_err();
    assert!(matches!(err, CoverageError::MalformedPayload { .. }));
    assert!(err.to_string().contains("<html>Fatal error</html>"));
}

#[test]
fn test_fetch_rejects_error_status() {
    let base = spawn_server();
    let err = fetcher(Duration::from_secs(5))
        .fetch::<LineCoverage>(&base, &CoverageGroup::from_raw("missing.1"))
        .unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[test]
fn test_fetch_times_out() {
    let base = spawn_server();
    let err = fetcher(Duration::from_millis(300))
        .fetch::<LineCoverage>(&base, &CoverageGroup::from_raw("slow.1"))
        .unwrap_err();
    assert!(matches!(err, CoverageError::Timeout { .. }), "{err}");
}

#[test]
fn test_fetch_connection_refused() {
    let err = fetcher(Duration::from_secs(2))
        .fetch::<LineCoverage>("http://127.0.0.1:1", &CoverageGroup::from_raw("g"))
        .unwrap_err();
    assert!(matches!(err, CoverageError::Transport { .. }), "{err}");
}

#[test]
fn test_feature_run_over_http() {
    let base = spawn_server();
    let tmp = TempDir::new().unwrap();
    let session = HttpSession::new("default", &base).unwrap();
    let jar = session.jar();

    let config = RemoteCoverageConfig::new(tmp.path())
        .with_split_by(SplitPolicy::Feature)
        .with_fetch_timeout_secs(5);
    let mut listener = RemoteCoverageListener::http(config)
        .unwrap()
        .with_session("default", session);

    let suite = Suite::new("Checkout")
        .with_settings(SuiteSettings::new().with("remote_coverage_enabled", true));
    let feature = Feature::new("features/checkout/pay.feature");
    let scenario = feature.scenario(3);

    let cookies;
    {
        let mut dispatcher = LifecycleDispatcher::new();
        dispatcher.register(&mut listener);
        dispatcher.before_suite(&suite).unwrap();
        dispatcher.before_feature(&feature).unwrap();
        dispatcher.before_scenario(&scenario).unwrap();

        // A step definition talking to the application through the session jar
        let client = reqwest::blocking::Client::builder()
            .cookie_provider(jar)
            .build()
            .unwrap();
        cookies = client
            .get(format!("{base}/echo"))
            .send()
            .unwrap()
            .text()
            .unwrap();

        dispatcher.after_scenario(&scenario).unwrap();
        dispatcher.after_feature(&feature).unwrap();
        dispatcher.after_suite(&suite).unwrap();
    }
    let group = cookies
        .split("; ")
        .find_map(|pair| pair.strip_prefix("coverage_group="))
        .unwrap()
        .to_string();

    assert!(cookies.contains("collect_code_coverage=true"));
    assert!(group.starts_with("Checkout."));
    assert!(cookies.contains("coverage_id=features%2Fcheckout%2Fpay.feature%3A3"));

    let stored: LineCoverage = load(&tmp.path().join("checkout-pay.cov")).unwrap();
    assert!(stored.hits("src/App.php", 1).unwrap().contains(&group));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    assert!(!listener.is_enabled());
}

#[test]
fn test_disabled_suite_after_enabled_sends_no_cookies() {
    let base = spawn_server();
    let tmp = TempDir::new().unwrap();
    let session = HttpSession::new("default", &base).unwrap();
    let client = reqwest::blocking::Client::builder()
        .cookie_provider(session.jar())
        .build()
        .unwrap();

    let config = RemoteCoverageConfig::new(tmp.path())
        .with_split_by(SplitPolicy::Feature)
        .with_fetch_timeout_secs(5);
    let mut listener = RemoteCoverageListener::http(config)
        .unwrap()
        .with_session("default", session);

    let first = Suite::new("Checkout")
        .with_settings(SuiteSettings::new().with("remote_coverage_enabled", true));
    let second = Suite::new("Search");
    let feature = Feature::new("features/search.feature");
    let scenario = feature.scenario(2);

    let cookies = {
        let mut dispatcher = LifecycleDispatcher::new();
        dispatcher.register(&mut listener);
        dispatcher.before_suite(&first).unwrap();
        dispatcher.before_feature(&feature).unwrap();
        dispatcher.before_scenario(&scenario).unwrap();
        dispatcher.after_scenario(&scenario).unwrap();
        dispatcher.after_feature(&feature).unwrap();
        dispatcher.after_suite(&first).unwrap();

        dispatcher.before_suite(&second).unwrap();
        dispatcher.before_feature(&feature).unwrap();
        dispatcher.before_scenario(&scenario).unwrap();
        let cookies = client
            .get(format!("{base}/echo"))
            .send()
            .unwrap()
            .text()
            .unwrap();
        dispatcher.after_scenario(&scenario).unwrap();
        dispatcher.after_feature(&feature).unwrap();
        dispatcher.after_suite(&second).unwrap();
        cookies
    };

    assert!(!cookies.contains("collect_code_coverage"), "{cookies}");
    assert!(!cookies.contains("coverage_group"), "{cookies}");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
}
