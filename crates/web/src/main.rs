use anyhow::Context;
use chrono::{DateTime, Utc};
use picker_core::{
    DisplayModel, DrawRequest, HistoryStyle, Item, KeyValueStore, Picker, PickerEvent,
    SpinReplay,
};
use picker_data::{load_config, open_picker, FileStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    init_logging();
    let config = load_config().context("load config")?;
    let picker = open_picker(&config, Utc::now());
    let server = Server::http(config.bind.as_str())
        .map_err(|err| anyhow::anyhow!(err))
        .with_context(|| format!("bind {}", config.bind))?;
    info!(bind = %config.bind, "picker web server listening");
    let state = Arc::new(Mutex::new(picker));
    for request in server.incoming_requests() {
        let state = state.clone();
        if let Err(err) = handle_request(request, state) {
            error!(error = %err, "request failed");
        }
    }
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    State,
    Draw,
    Reset,
    Upload,
}

fn route(method: &Method, url: &str) -> Option<Action> {
    match (method, url) {
        (&Method::Get, "/api/state") => Some(Action::State),
        (&Method::Post, "/api/draw") => Some(Action::Draw),
        (&Method::Post, "/api/reset") => Some(Action::Reset),
        (&Method::Post, "/api/upload") => Some(Action::Upload),
        _ => None,
    }
}

/// Page files served from the workspace `web/` directory.
fn static_asset(url: &str) -> Option<(&'static str, &'static str)> {
    match url {
        "/" | "/index.html" => Some(("index.html", "text/html; charset=utf-8")),
        "/app.js" => Some(("app.js", "application/javascript")),
        "/styles.css" => Some(("styles.css", "text/css; charset=utf-8")),
        _ => None,
    }
}

fn web_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("web")
        .join(file)
}

#[derive(Serialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    notice: Option<String>,
    state: UiState,
    events: Vec<PickerEvent>,
    spin: Option<SpinReplay>,
}

#[derive(Serialize)]
struct UiState {
    remaining: Vec<Item>,
    drawn: Vec<Item>,
    history_style: HistoryStyle,
    slot_count: usize,
    bounce_ms: u64,
    display: DisplayModel,
}

fn handle_request(
    mut request: tiny_http::Request,
    state: Arc<Mutex<Picker<FileStore>>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = request.url().to_string();
    if request.method() == &Method::Get {
        if let Some((file, content_type)) = static_asset(&url) {
            return respond_with_file(request, web_path(file), content_type);
        }
    }
    let Some(action) = route(request.method(), &url) else {
        request.respond(Response::empty(StatusCode(404)))?;
        return Ok(());
    };
    let body = if action == Action::Upload {
        let mut bytes = Vec::new();
        request.as_reader().read_to_end(&mut bytes)?;
        Some(String::from_utf8(bytes).map_err(|err| err.to_string()))
    } else {
        None
    };
    let mut picker = state.lock().map_err(|_| "picker state lock poisoned")?;
    let response = apply(&mut *picker, action, body, Utc::now());
    respond_json(request, &response)
}

fn apply<S: KeyValueStore>(
    picker: &mut Picker<S>,
    action: Action,
    body: Option<Result<String, String>>,
    now: DateTime<Utc>,
) -> ApiResponse {
    picker.advance(now);
    let mut spin = None;
    let err = match action {
        Action::State => None,
        Action::Draw => match picker.request_draw(now) {
            DrawRequest::Started => {
                spin = picker.simulate_spin();
                None
            }
            DrawRequest::Ignored => Some("a draw is in progress".to_string()),
            DrawRequest::Exhausted => Some("all items have been drawn".to_string()),
        },
        Action::Reset => picker.reset(now).err().map(|err| err.to_string()),
        Action::Upload => {
            let read = body.unwrap_or_else(|| Err("empty upload".to_string()));
            picker.upload(read, now).err().map(|err| err.to_string())
        }
    };
    build_response(picker, err, spin)
}

fn build_response<S: KeyValueStore>(
    picker: &mut Picker<S>,
    err: Option<String>,
    spin: Option<SpinReplay>,
) -> ApiResponse {
    let events: Vec<_> = picker.events().drain().collect();
    let notice = picker.renderer_mut().take_notice();
    ApiResponse {
        ok: err.is_none(),
        error: err,
        notice,
        state: UiState {
            remaining: picker.pool().remaining().to_vec(),
            drawn: picker.pool().drawn().to_vec(),
            history_style: picker.history_style(),
            slot_count: picker.animator().config().slots,
            bounce_ms: picker.animator().config().bounce_ms,
            display: picker.renderer().clone(),
        },
        events,
        spin,
    }
}

fn respond_with_file(
    request: tiny_http::Request,
    path: PathBuf,
    content_type: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read(&path).map_err(|err| format!("read {}: {err}", path.display()))?;
    let header = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
        .map_err(|_| "invalid content-type header")?;
    request.respond(Response::from_data(content).with_header(header))?;
    Ok(())
}

fn respond_json(
    request: tiny_http::Request,
    response: &ApiResponse,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_vec_pretty(response)?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| "invalid content-type header")?;
    let status = if response.ok { 200 } else { 409 };
    request.respond(
        Response::from_data(body)
            .with_header(header)
            .with_status_code(StatusCode(status)),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use picker_core::{
        MemoryStore, Persistence, PickerError, PickerOptions, ScriptedRandom, StoreVariant,
    };

    fn picker() -> Picker<MemoryStore> {
        Picker::bootstrap(
            Persistence::new(MemoryStore::new(), StoreVariant::Local),
            Box::new(ScriptedRandom::constant(0)),
            DisplayModel::default(),
            PickerOptions::default(),
            now(),
            || Err(PickerError::ResourceLoadFailure("offline".to_string())),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn routes_known_paths() {
        assert_eq!(route(&Method::Get, "/api/state"), Some(Action::State));
        assert_eq!(route(&Method::Post, "/api/draw"), Some(Action::Draw));
        assert_eq!(route(&Method::Get, "/api/draw"), None);
        assert_eq!(route(&Method::Get, "/"), None);
    }

    #[test]
    fn serves_page_files_that_exist() {
        for url in ["/", "/app.js", "/styles.css"] {
            let (file, _) = static_asset(url).expect("asset");
            assert!(web_path(file).is_file(), "missing {file}");
        }
        assert_eq!(static_asset("/api/state"), None);
        let page = std::fs::read_to_string(web_path("index.html")).expect("page");
        assert!(page.contains("/app.js"));
    }

    #[test]
    fn draw_returns_replay_and_commits() {
        let mut picker = picker();
        let response = apply(&mut picker, Action::Draw, None, now());
        assert!(response.ok);
        let spin = response.spin.expect("spin");
        assert_eq!(spin.result, Item::new(1, "Item 1"));
        assert_eq!(response.state.drawn, vec![Item::new(1, "Item 1")]);
        assert_eq!(response.state.remaining.len(), 149);
        assert_eq!(response.state.display.counts.drawn, 1);
        assert_eq!(response.state.slot_count, 3);
        assert_eq!(response.state.bounce_ms, 1000);
        assert!(spin.frames.iter().all(|frame| frame.slots.len() == 3));
    }

    #[test]
    fn upload_replaces_pool() {
        let mut picker = picker();
        apply(&mut picker, Action::Draw, None, now());
        let response = apply(
            &mut picker,
            Action::Upload,
            Some(Ok("X,foo\nY,bar".to_string())),
            now(),
        );
        assert!(response.ok);
        assert_eq!(
            response.state.remaining,
            vec![Item::new(1, "X"), Item::new(2, "Y")]
        );
        assert!(response.state.drawn.is_empty());
    }

    #[test]
    fn bad_upload_reports_error() {
        let mut picker = picker();
        let response = apply(
            &mut picker,
            Action::Upload,
            Some(Err("invalid utf-8".to_string())),
            now(),
        );
        assert!(!response.ok);
        assert_eq!(response.notice.as_deref(), Some("Could not read the file."));
        assert_eq!(response.state.remaining.len(), 150);
    }
}
