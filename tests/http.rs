use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::Mutex;

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter().copied().filter(|pid| *pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("farm_reports_http_{tag}_{}_{}.json", std::process::id(), nanos));
    path
}

fn fixture() -> Value {
    json!({
        "sales": [
            { "date": "2024-01-01", "buyer": "Market",
              "item": { "farm_type": "goat", "id": "G-1", "breed": "Boer", "unit_price": 1 },
              "quantity": 5 },
            { "createdAt": "2024-01-01T09:00:00Z", "buyer": "Market",
              "item": { "farm_type": "goat", "id": "G-2", "breed": "Boer", "unit_price": 1 },
              "quantity": 3 },
            { "date": "2024-01-02", "buyer": "Bakery",
              "item": { "farm_type": "poultry", "id": "P-1", "product": "eggs", "unit_price": 1 },
              "quantity": 2 },
            { "buyer": "Nobody",
              "item": { "farm_type": "dairy", "id": "D-1", "product": "milk", "unit_price": 1 },
              "quantity": 99 }
        ],
        "feed": [
            { "date": "2024-01-02", "feed_type": "Hay, baled", "quantity": 40, "unit": "kg", "cost": 12.5 }
        ],
        "expenses": [
            { "date": "2024-01-03", "category": "vet", "amount": 4 }
        ]
    })
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(tag: &str, contents: &[u8]) -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path(tag);
    std::fs::write(&data_path, contents).expect("write fixture");

    let child = Command::new(env!("CARGO_BIN_EXE_farm_reports"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", &data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let contents = serde_json::to_vec(&fixture()).unwrap();
    let server = Arc::new(spawn_server("shared", &contents).await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_sales_report_buckets_by_day() {
    let server = shared_server().await;
    let body: Value = Client::new()
        .get(format!(
            "{}/reports/sales?start=2024-01-01&end=2024-01-03&group=day",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let summary = body["summary"].as_array().unwrap();
    let quantities: Vec<_> = summary
        .iter()
        .map(|row| (row["period"].as_str().unwrap(), row["quantity"].as_i64().unwrap()))
        .collect();
    assert_eq!(quantities, [("2024-01-01", 8), ("2024-01-02", 2), ("2024-01-03", 0)]);
    assert_eq!(body["totals"]["quantity"], 10);
    assert_eq!(body["totals"]["sales"], 3);
}

#[tokio::test]
async fn http_sales_report_exports_csv() {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!(
            "{}/reports/sales?start=2024-01-01&end=2024-01-03&format=csv",
            server.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    assert_eq!(
        response.text().await.unwrap(),
        "period,sales,quantity,revenue\n2024-01-01,2,8,8\n2024-01-02,1,2,2\n2024-01-03,0,0,0\n"
    );
}

#[tokio::test]
async fn http_sales_report_filters_by_farm_type() {
    let server = shared_server().await;
    let body: Value = Client::new()
        .get(format!(
            "{}/reports/sales?start=2024-01-01&end=2024-01-31&group=week&type=poultry",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["summary"][0]["period"], "2024-W01");
    assert_eq!(body["totals"]["quantity"], 2);
}

#[tokio::test]
async fn http_reversed_range_is_a_client_error() {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!(
            "{}/reports/feed?start=2024-01-03&end=2024-01-01",
            server.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.success);
    assert!(body.message.contains("after"));
}

#[tokio::test]
async fn http_unsupported_format_is_a_client_error() {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!(
            "{}/reports/finance?start=2024-01-01&end=2024-01-03&format=xml",
            server.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.message.contains("xml"));
}

#[tokio::test]
async fn http_duplicate_query_parameter_is_a_json_client_error() {
    let server = shared_server().await;
    let response = Client::new()
        .get(format!(
            "{}/reports/sales?start=2024-01-01&start=2024-01-02&end=2024-01-03",
            server.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.success);
    assert!(body.message.contains("duplicate field"), "{}", body.message);
}

#[tokio::test]
async fn http_finance_report_nets_costs() {
    let server = shared_server().await;
    let body: Value = Client::new()
        .get(format!(
            "{}/reports/finance?start=2024-01-01&end=2024-01-31&group=month",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["summary"][0]["period"], "2024-01");
    assert_eq!(body["totals"]["revenue"], 10);
    assert_eq!(body["totals"]["expenses"], 16.5);
    assert_eq!(body["totals"]["net"], -6.5);
}

#[tokio::test]
async fn http_feed_filter_accepts_values_with_commas() {
    let server = shared_server().await;
    let text = Client::new()
        .get(format!(
            "{}/reports/feed?start=2024-01-02&end=2024-01-02&format=csv&feedType=hay,%20baled",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(text, "period,entries,quantity,cost\n2024-01-02,1,40,12.5\n");
}

#[tokio::test]
async fn http_dashboard_reports_all_time_figures() {
    let server = shared_server().await;
    let client = Client::new();
    let first: Value = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["sales_count"], 4);
    assert_eq!(first["last_7_days"].as_array().unwrap().len(), 7);

    let second: Value = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["generated_at"], second["generated_at"]);
}

#[tokio::test]
async fn http_malformed_data_is_a_server_error() {
    let server = spawn_server("malformed", b"{ broken").await;
    let response = Client::new()
        .get(format!(
            "{}/reports/health?start=2024-01-01&end=2024-01-02",
            server.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(!body.success);
}
