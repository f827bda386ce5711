//! Shared integration-test bootstrap helpers: seeded projects and a stand-in
//! GitHub contents API.

use axum::{
    extract::{Path as UrlPath, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_test::TestServer;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use liveedit_server::{create_app, AppState, Config};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) const HERO_PATH: &str = "src/app/page.tsx";
pub(crate) const MISSION_PATH: &str = "src/components/MissionSection.tsx";
pub(crate) const VIAL_PATH: &str = "src/components/MedicalCore.tsx";
pub(crate) const GITHUB_TOKEN: &str = "test-token";

pub(crate) const HERO_PAGE: &str = r#"const HERO_TEXT = /* HERO_TEXT_START */ "Research peptides, verified." /* HERO_TEXT_END */;

export default function Home() {
  return <h1>{HERO_TEXT}</h1>;
}
"#;

pub(crate) const MISSION_SECTION: &str = r#"export const CARD_POSITIONS = [
  /* CARD_1_START */ { x: 0, y: 0 } /* CARD_1_END */,
  /* CARD_2_START */ { x: 0, y: 0 } /* CARD_2_END */,
];

export const MISSION_VIAL = /* VIAL_START */ { x: 0, y: 0, rotate: 0, scale: 1 } /* VIAL_END */;
"#;

pub(crate) const MEDICAL_CORE: &str = r#"const initialVial = /*VIAL_POS_START*/ { x: 0, y: 0, rotate: 0, scale: 1.00 } /*VIAL_POS_END*/;
"#;

pub(crate) fn seed_project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (path, text) in [
        (HERO_PATH, HERO_PAGE),
        (MISSION_PATH, MISSION_SECTION),
        (VIAL_PATH, MEDICAL_CORE),
    ] {
        let full = dir.path().join(path);
        std::fs::create_dir_all(full.parent().expect("parent")).expect("create dirs");
        std::fs::write(&full, text).expect("seed document");
    }
    dir
}

pub(crate) fn read_document(project: &TempDir, path: &str) -> String {
    std::fs::read_to_string(project.path().join(path)).expect("read document")
}

pub(crate) fn test_config_for_root(root: &Path) -> Config {
    let mut config = Config::local(root);
    config.port = 0;
    config
}

pub(crate) fn hosted_config(root: &Path, github: &MockGitHub) -> Config {
    let mut config = test_config_for_root(root);
    config.hosted = true;
    config.github.repo = Some("helivex/storefront".to_string());
    config.github.token = Some(GITHUB_TOKEN.to_string());
    config.github.api_url = github.url.clone();
    config
}

pub(crate) fn test_server_for_config(config: Config) -> TestServer {
    let state = AppState::new(config).expect("app state");
    TestServer::new(create_app(state, false)).expect("server")
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let project = seed_project();
    let server = test_server_for_config(test_config_for_root(project.path()));
    (server, project)
}

/// Recorded state of the stand-in GitHub API.
#[derive(Default)]
pub(crate) struct MockRepo {
    files: Mutex<HashMap<String, (String, String)>>,
    commits: Mutex<Vec<String>>,
    racing: Mutex<HashSet<String>>,
    garbled_replies: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MockRepo {
    pub(crate) fn file(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .expect("files")
            .get(path)
            .map(|(text, _)| text.clone())
    }

    /// Simulate another commit landing on `path` right after each read, so
    /// the sha handed out is already stale when the write arrives.
    pub(crate) fn race_writes_to(&self, path: &str) {
        self.racing.lock().expect("racing").insert(path.to_string());
    }

    /// Accept writes but answer them with a body that is not JSON.
    pub(crate) fn garble_commit_replies(&self) {
        self.garbled_replies.store(true, Ordering::SeqCst);
    }

    pub(crate) fn commits(&self) -> Vec<String> {
        self.commits.lock().expect("commits").clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst) + self.writes.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockGitHub {
    pub(crate) url: String,
    pub(crate) repo: Arc<MockRepo>,
}

/// Start a GitHub contents API stand-in on an ephemeral loopback port,
/// seeded with the three documents.
pub(crate) async fn spawn_mock_github() -> MockGitHub {
    let repo = Arc::new(MockRepo::default());
    {
        let mut files = repo.files.lock().expect("files");
        for (index, (path, text)) in [
            (HERO_PATH, HERO_PAGE),
            (MISSION_PATH, MISSION_SECTION),
            (VIAL_PATH, MEDICAL_CORE),
        ]
        .into_iter()
        .enumerate()
        {
            files.insert(path.to_string(), (text.to_string(), format!("blob-{}", index)));
        }
    }

    let app = Router::new()
        .route(
            "/repos/:owner/:name/contents/*path",
            get(get_contents).put(put_contents),
        )
        .with_state(repo.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("mock listener");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockGitHub {
        url: format!("http://{}", addr),
        repo,
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {}", GITHUB_TOKEN))
}

fn github_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": message })))
}

async fn get_contents(
    State(repo): State<Arc<MockRepo>>,
    UrlPath((_owner, _name, path)): UrlPath<(String, String, String)>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    repo.reads.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return github_error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    let racing = repo.racing.lock().expect("racing").contains(&path);
    match repo.files.lock().expect("files").get_mut(&path) {
        Some((text, sha)) => {
            let response = (
                StatusCode::OK,
                Json(json!({
                    "sha": sha.as_str(),
                    "encoding": "base64",
                    "content": STANDARD.encode(text.as_bytes()),
                })),
            );
            if racing {
                *sha = format!("{}-concurrent", sha);
            }
            response
        }
        None => github_error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn put_contents(
    State(repo): State<Arc<MockRepo>>,
    UrlPath((_owner, _name, path)): UrlPath<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let write = repo.writes.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return github_error(StatusCode::UNAUTHORIZED, "Bad credentials").into_response();
    }
    let mut files = repo.files.lock().expect("files");
    let current_sha = files.get(&path).map(|(_, sha)| sha.clone());
    if body["sha"].as_str().map(str::to_string) != current_sha {
        return github_error(StatusCode::CONFLICT, "sha does not match").into_response();
    }
    let decoded = STANDARD
        .decode(body["content"].as_str().unwrap_or_default())
        .expect("base64 content");
    let text = String::from_utf8(decoded).expect("utf-8 content");
    files.insert(path, (text, format!("blob-w{}", write)));
    repo.commits
        .lock()
        .expect("commits")
        .push(body["message"].as_str().unwrap_or_default().to_string());
    if repo.garbled_replies.load(Ordering::SeqCst) {
        return (StatusCode::OK, "<html>upstream proxy</html>").into_response();
    }
    (
        StatusCode::OK,
        Json(json!({ "commit": { "sha": format!("commit-{}", write) } })),
    )
        .into_response()
}
