// tests/health_server_tests.rs
use rust_healthcheck::config::{Config, HealthOptions};
use rust_healthcheck::health::{check_fn, CheckConfig, CheckOutcome};
use rust_healthcheck::interval::Interval;
use rust_healthcheck::kernel::{events, Kernel, KernelState};
use rust_healthcheck::plugins::default_kernel;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn local_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}

async fn start(options: HealthOptions) -> (Kernel, String) {
    let mut kernel = default_kernel(options).unwrap();
    kernel.init().await.unwrap();
    let addr = kernel.context().server.as_ref().unwrap().local_addr;
    (kernel, format!("http://{}", addr))
}

async fn get(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let code = response.status().as_u16();
    (code, response.json().await.unwrap())
}

#[tokio::test]
async fn test_healthy_service_returns_200() {
    let options = HealthOptions::new(local_config())
        .check("api", check_fn(|| async { Ok(CheckOutcome::healthy().with_latency(3.0)) }))
        .check("cache", check_fn(|| async { Ok(CheckOutcome::healthy()) }));
    let (mut kernel, base) = start(options).await;

    let (code, body) = get(&format!("{}/health", base)).await;

    assert_eq!(code, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["score"], 100);
    assert_eq!(body["checks"]["api"]["latency"], 3.0);
    assert!(body["checks"]["cache"]["lastCheck"].is_string());

    assert!(kernel.destroy().await.is_clean());
    assert_eq!(kernel.state(), KernelState::Destroyed);
}

#[tokio::test]
async fn test_critical_failure_returns_503() {
    let options = HealthOptions::new(local_config())
        .check_with(
            "db",
            CheckConfig::new(check_fn(|| async {
                Err::<CheckOutcome, _>(anyhow::anyhow!("connection refused"))
            }))
            .critical(true)
            .weight(1.0),
        )
        .check_with(
            "api",
            CheckConfig::new(check_fn(|| async { Ok(CheckOutcome::healthy()) })).weight(9.0),
        );
    let (mut kernel, base) = start(options).await;

    let (code, body) = get(&format!("{}/health", base)).await;
    assert_eq!(code, 503);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["score"], 90);
    assert!(body["checks"]["db"]["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    let (code, body) = get(&format!("{}/health/ready", base)).await;
    assert_eq!(code, 503);
    assert_eq!(body["failing"], json!(["db"]));

    let (code, body) = get(&format!("{}/health/live", base)).await;
    assert_eq!(code, 200);
    assert_eq!(body["status"], "alive");

    kernel.destroy().await;
}

#[tokio::test]
async fn test_slow_check_times_out() {
    let options = HealthOptions::new(local_config()).check_with(
        "slow",
        CheckConfig::new(check_fn(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(CheckOutcome::healthy())
        }))
        .timeout(Duration::from_millis(50)),
    );
    let (mut kernel, base) = start(options).await;

    let (code, body) = get(&format!("{}/health", base)).await;

    assert_eq!(code, 503);
    assert_eq!(body["score"], 0);
    assert!(body["checks"]["slow"]["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));

    kernel.destroy().await;
}

#[tokio::test]
async fn test_metrics_and_history_routes() {
    let mut config = local_config();
    config.history.enabled = true;
    let options = HealthOptions::new(config).check(
        "api",
        check_fn(|| async { Ok(CheckOutcome::degraded()) }),
    );
    let (mut kernel, base) = start(options).await;

    let text = reqwest::get(format!("{}/metrics", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("health_check_status{check=\"api\"} 0.5"));
    assert!(text.contains("health_score 50"));
    assert!(text.contains("health_aggregations_total{status=\"degraded\"} 1"));

    let (code, json) = get(&format!("{}/metrics?format=json", base)).await;
    assert_eq!(code, 200);
    assert_eq!(json["checks"]["api"]["value"], 0.5);

    let (code, history) = get(&format!("{}/health/history", base)).await;
    assert_eq!(code, 200);
    assert_eq!(history["entries"].as_array().unwrap().len(), 2);
    assert_eq!(history["entries"][0]["status"], "degraded");

    let (code, body) = get(&format!("{}/nope", base)).await;
    assert_eq!(code, 404);
    assert_eq!(body["error"], "not found");

    kernel.destroy().await;
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let (mut kernel, base) = start(HealthOptions::new(local_config())).await;

    for path in ["/health", "/health/live", "/missing"] {
        let response = reqwest::get(format!("{}{}", base, path)).await.unwrap();
        let id = response.headers()["x-request-id"].to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    kernel.destroy().await;
}

#[tokio::test]
async fn test_custom_base_path() {
    let mut config = local_config();
    config.server.base_path = "/status/".to_string();
    let (mut kernel, base) = start(HealthOptions::new(config)).await;

    assert_eq!(
        kernel.context().server.as_ref().unwrap().base_path,
        "/status"
    );
    let (code, _) = get(&format!("{}/status/live", base)).await;
    assert_eq!(code, 200);
    let (code, _) = get(&format!("{}/health", base)).await;
    assert_eq!(code, 404);

    kernel.destroy().await;
}

#[tokio::test]
async fn test_scheduler_runs_until_destroy() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let mut config = local_config();
    config.interval = Some("20ms".parse::<Interval>().unwrap());
    let options = HealthOptions::new(config).check(
        "tick",
        check_fn(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(CheckOutcome::healthy())
            }
        }),
    );

    let (mut kernel, _) = start(options).await;
    let checked = Arc::new(AtomicUsize::new(0));
    let seen = checked.clone();
    kernel.on(events::HEALTH_CHECKED, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    kernel.destroy().await;
    let after_destroy = runs.load(Ordering::SeqCst);

    assert!(after_destroy >= 2);
    assert!(checked.load(Ordering::SeqCst) >= 1);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(runs.load(Ordering::SeqCst), after_destroy);
}

#[tokio::test]
async fn test_threshold_update_changes_verdict() {
    let options = HealthOptions::new(local_config()).check(
        "api",
        check_fn(|| async { Ok(CheckOutcome::degraded()) }),
    );
    let (mut kernel, base) = start(options).await;

    let (_, body) = get(&format!("{}/health", base)).await;
    assert_eq!(body["status"], "degraded");

    kernel.emit(events::THRESHOLDS_UPDATE, &json!({ "degraded": 60 }));

    let (code, body) = get(&format!("{}/health", base)).await;
    assert_eq!(code, 503);
    assert_eq!(body["status"], "unhealthy");

    kernel.destroy().await;
}

#[tokio::test]
async fn test_port_in_use_fails_init_and_cleans_up() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = local_config();
    config.server.port = taken.local_addr().unwrap().port();

    let mut kernel = default_kernel(HealthOptions::new(config)).unwrap();
    let err = kernel.init().await.unwrap_err();

    assert!(format!("{:#}", anyhow::Error::new(err)).contains("failed to bind"));
    assert_ne!(kernel.state(), KernelState::Running);
    assert!(kernel.destroy().await.is_clean());
}

#[tokio::test]
async fn test_checks_declared_in_config_file() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let tcp_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((_stream, _)) = listener.accept().await {}
    });

    let mut upstream = mockito::Server::new_async().await;
    upstream
        .mock("GET", "/ping")
        .with_status(500)
        .expect_at_least(1)
        .create_async()
        .await;

    let yaml = format!(
        "server:\n  host: 127.0.0.1\n  port: 0\nchecks:\n  db:\n    type: tcp\n    address: \"{}\"\n    weight: 3\n  api:\n    type: http\n    url: {}/ping\n",
        tcp_addr,
        upstream.url()
    );
    let path = std::env::temp_dir().join(format!("healthcheck-{}.yaml", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, yaml).await.unwrap();
    let config = rust_healthcheck::config::load_config(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.unwrap();

    let (mut kernel, base) = start(HealthOptions::new(config)).await;
    let (code, body) = get(&format!("{}/health", base)).await;

    // db healthy (weight 3), api unhealthy (weight 1): 75 -> degraded
    assert_eq!(code, 200);
    assert_eq!(body["score"], 75);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["db"]["status"], "healthy");
    assert_eq!(body["checks"]["api"]["error"], "HTTP 500 Internal Server Error");

    kernel.destroy().await;
}
