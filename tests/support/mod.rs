#![allow(dead_code)]

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portal_web::api::ApiClient;
use portal_web::cache::LocalCache;
use portal_web::progress::RepeatAward;
use portal_web::Portal;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::TcpListener;
use std::sync::Arc;
use tokio::sync::Mutex;

const SESSION_COOKIE: &str = "portal_session=test-session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    History,
    Reply,
}

/// Server-side state of the fake portal API.
#[derive(Debug)]
pub struct MockState {
    pub offline: bool,
    pub signed_in: Option<String>,
    pub accounts: HashMap<String, String>,
    pub unlocked_index: usize,
    pub completed_projects: Vec<usize>,
    pub points: u32,
    pub task_completion: BTreeMap<String, Vec<bool>>,
    pub chat: Vec<Value>,
    pub chat_mode: ChatMode,
    pub requests: Vec<String>,
}

impl Default for MockState {
    fn default() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert("ada".to_string(), "lovelace".to_string());
        Self {
            offline: false,
            signed_in: None,
            accounts,
            unlocked_index: 0,
            completed_projects: Vec::new(),
            points: 0,
            task_completion: BTreeMap::new(),
            chat: Vec::new(),
            chat_mode: ChatMode::History,
            requests: Vec::new(),
        }
    }
}

pub type Shared = Arc<Mutex<MockState>>;

pub struct MockApi {
    pub base_url: String,
    pub state: Shared,
}

impl MockApi {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new()
            .route("/api/projects", get(projects))
            .route("/api/register", post(register))
            .route("/api/login", post(login))
            .route("/api/logout", post(logout))
            .route("/api/user", get(user))
            .route("/api/user/progress/task", post(toggle_task))
            .route("/api/user/progress/complete", post(complete))
            .route("/api/user/progress/reset", post(reset))
            .route("/api/chat", get(chat_history).post(chat_send))
            .layer(middleware::from_fn_with_state(state.clone(), availability))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock api");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock api stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    pub async fn requested(&self, path: &str) -> bool {
        self.state.lock().await.requests.iter().any(|seen| seen == path)
    }
}

pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub async fn portal_for(base_url: &str, dir: &tempfile::TempDir) -> Portal {
    portal_with(base_url, dir, RepeatAward::Guarded).await
}

pub async fn portal_with(base_url: &str, dir: &tempfile::TempDir, policy: RepeatAward) -> Portal {
    let api = ApiClient::new(base_url).expect("build client");
    let cache = LocalCache::open(dir.path().join("cache.json")).await;
    Portal::new(api, cache, policy)
}

pub async fn signed_in_portal(mock: &MockApi, dir: &tempfile::TempDir) -> Portal {
    let mut portal = portal_for(&mock.base_url, dir).await;
    portal.initialize().await;
    portal.login("ada", "lovelace").await;
    portal
}

async fn availability(State(state): State<Shared>, request: Request, next: Next) -> Response {
    {
        let mut state = state.lock().await;
        state.requests.push(request.uri().path().to_string());
        if state.offline {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "message": "maintenance" })),
            )
                .into_response();
        }
    }
    next.run(request).await
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(SESSION_COOKIE))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Not logged in" }))).into_response()
}

async fn projects() -> Json<Value> {
    Json(json!({
        "projects": [
            {
                "name": "Intro",
                "description": "First steps",
                "image": "intro.png",
                "resources": [{ "label": "Guide", "url": "https://example.test/guide" }]
            },
            { "name": "Circuits", "description": "Wire it up", "image": "circuits.png" },
            { "name": "Capstone", "description": "Bring it together", "image": "capstone.png" }
        ],
        "project_tasks": [
            ["Read", "Sketch", "Build", "Present"],
            ["Solder", "Test"],
            []
        ]
    }))
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().await;
    if state.accounts.contains_key(&username) {
        return (StatusCode::CONFLICT, Json(json!({ "message": "Username already taken" })))
            .into_response();
    }
    state.accounts.insert(username, password);
    (StatusCode::CREATED, Json(json!({ "message": "Registered! Please log in." }))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let mut state = state.lock().await;
    if state.accounts.get(username).map(String::as_str) != Some(password) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" })))
            .into_response();
    }
    state.signed_in = Some(username.to_string());
    (
        [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

async fn logout(State(state): State<Shared>) -> StatusCode {
    state.lock().await.signed_in = None;
    StatusCode::NO_CONTENT
}

async fn user(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let state = state.lock().await;
    match (&state.signed_in, has_session(&headers)) {
        (Some(username), true) => Json(json!({
            "logged_in": true,
            "username": username,
            "unlocked_index": state.unlocked_index,
            "completed_projects": state.completed_projects,
            "points": state.points,
            "task_completion": state.task_completion,
        })),
        _ => Json(json!({ "logged_in": false })),
    }
}

async fn toggle_task(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let project = body["project_index"].as_u64().unwrap_or_default().to_string();
    let task = body["task_index"].as_u64().unwrap_or_default() as usize;
    let checked = body["checked"].as_bool().unwrap_or_default();
    let mut state = state.lock().await;
    let row = state.task_completion.entry(project).or_default();
    if row.len() <= task {
        row.resize(task + 1, false);
    }
    row[task] = checked;
    // Empty body on purpose: the client must cope with it.
    StatusCode::OK.into_response()
}

async fn complete(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let index = body["project_index"].as_u64().unwrap_or_default() as usize;
    let mut state = state.lock().await;
    if !state.completed_projects.contains(&index) {
        state.completed_projects.push(index);
        state.points += 50;
        if index == state.unlocked_index && state.unlocked_index < 2 {
            state.unlocked_index += 1;
        }
    }
    Json(json!({
        "success": true,
        "unlocked_index": state.unlocked_index,
        "completed_projects": state.completed_projects,
        "points": state.points,
    }))
    .into_response()
}

async fn reset(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().await;
    state.unlocked_index = 0;
    state.completed_projects.clear();
    state.points = 0;
    state.task_completion.clear();
    Json(json!({ "success": true })).into_response()
}

async fn chat_history(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let state = state.lock().await;
    Json(json!({ "success": true, "history": state.chat })).into_response()
}

async fn chat_send(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let text = body["message"].as_str().unwrap_or_default().to_string();
    let reply = format!("echo: {text}");
    let mut state = state.lock().await;
    state
        .chat
        .push(json!({ "who": "user", "text": text, "time": "2026-01-05T10:00:00Z" }));
    state
        .chat
        .push(json!({ "who": "bot", "text": reply, "time": "2026-01-05T10:00:01Z" }));
    let response = match state.chat_mode {
        ChatMode::History => json!({ "success": true, "history": state.chat }),
        ChatMode::Reply => json!({ "success": true, "reply": { "text": reply } }),
    };
    Json(response).into_response()
}
