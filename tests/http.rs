use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Task {
    id: String,
    text: String,
    completed: bool,
    priority: String,
    scheduled_date: String,
    subtasks: Vec<serde_json::Value>,
    frequency: Option<Frequency>,
}

#[derive(Debug, Deserialize)]
struct Frequency {
    count: u32,
    unit: String,
}

#[derive(Debug, Deserialize)]
struct DailyProgress {
    completed_count: usize,
    total_count: usize,
}

#[derive(Debug, Deserialize)]
struct TodayResponse {
    date: String,
    progress: DailyProgress,
}

#[derive(Debug, Deserialize)]
struct CalendarPosition {
    week: u32,
    total_weeks: u32,
    day_of_year: u32,
    total_days: u32,
}

#[derive(Debug, Deserialize)]
struct WeeklyGoalProgress {
    total_targets: u32,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    weekly_goals: WeeklyGoalProgress,
}

#[derive(Debug, Deserialize)]
struct BreakdownResponse {
    applied: bool,
    task: Task,
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

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
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

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("task_tracker_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/calendar")).send().await {
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

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_task_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
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
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create(client: &Client, base_url: &str, body: serde_json::Value) -> Task {
    let response = client
        .post(format!("{base_url}/api/tasks"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn today(client: &Client, base_url: &str) -> TodayResponse {
    client
        .get(format!("{base_url}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_register_and_toggle_updates_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = today(&client, &server.base_url).await;

    let task = create(
        &client,
        &server.base_url,
        serde_json::json!({ "text": "Stretch", "frequency": 3 }),
    )
    .await;
    assert_eq!(task.text, "Stretch");
    assert!(!task.completed);
    assert_eq!(task.priority, "MEDIUM");
    assert_eq!(task.scheduled_date, before.date);
    let frequency = task.frequency.expect("frequency stored");
    assert_eq!((frequency.count, frequency.unit.as_str()), (3, "week"));

    let toggled: Task = client
        .post(format!("{}/api/tasks/{}/toggle", server.base_url, task.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(toggled.completed);

    let after = today(&client, &server.base_url).await;
    assert_eq!(after.progress.total_count, before.progress.total_count + 1);
    assert_eq!(after.progress.completed_count, before.progress.completed_count + 1);

    let dashboard: DashboardResponse = client
        .get(format!("{}/api/progress", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(dashboard.weekly_goals.total_targets >= 3);
}

#[tokio::test]
async fn http_rejects_invalid_registrations() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for body in [
        serde_json::json!({ "text": "   " }),
        serde_json::json!({ "text": "Read", "scheduled_date": "tomorrow" }),
        serde_json::json!({ "text": "Read", "frequency": 0 }),
        serde_json::json!({ "text": "Read", "frequency": -2 }),
        serde_json::json!({ "text": "Read", "frequency": "3" }),
    ] {
        let response = client
            .post(format!("{}/api/tasks", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn http_breakdown_without_analyzer_changes_nothing() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let task = create(
        &client,
        &server.base_url,
        serde_json::json!({ "text": "Renovate kitchen", "scheduled_date": "2026-03-02" }),
    )
    .await;

    let result: BreakdownResponse = client
        .post(format!("{}/api/tasks/{}/breakdown", server.base_url, task.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(!result.applied);
    assert_eq!(result.task.priority, "MEDIUM");
    assert!(result.task.subtasks.is_empty());
}

#[tokio::test]
async fn http_delete_removes_task() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let task = create(
        &client,
        &server.base_url,
        serde_json::json!({ "text": "Temporary", "scheduled_date": "2026-03-02" }),
    )
    .await;

    let response = client
        .delete(format!("{}/api/tasks/{}", server.base_url, task.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let tasks: Vec<Task> = client
        .get(format!("{}/api/tasks", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(tasks.iter().all(|t| t.id != task.id));

    let again = client
        .delete(format!("{}/api/tasks/{}", server.base_url, task.id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_calendar_and_index_render() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let calendar: CalendarPosition = client
        .get(format!("{}/api/calendar", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!((1..=53).contains(&calendar.week));
    assert!(calendar.week <= calendar.total_weeks);
    assert!(calendar.day_of_year <= calendar.total_days);

    let page = client
        .get(format!("{}/?tab=register", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Schedule task"));
    assert!(page.contains(&format!("Week: {}/{}", calendar.week, calendar.total_weeks)));
}
