//! Command-line client for the LiveEdit API.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use liveedit_core::constants::DEFAULT_CLI_SERVER_URL;
use liveedit_core::models::ActionCall;
use liveedit_core::session::{reload_url, SavePlan};
use liveedit_core::slots::{Position, SlotValue, Transform};
use liveedit_core::{EditSession, PatchResult, SessionState, SlotKey};
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "liveedit", about = "LiveEdit CLI", version)]
struct Cli {
    /// Server URL (can also be set via LIVEEDIT_SERVER env var)
    #[arg(short, long, env = "LIVEEDIT_SERVER")]
    server: Option<String>,

    /// Admin bearer token for servers with ADMIN_TOKEN set
    #[arg(long, env = "LIVEEDIT_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Page URL to print with a cache-busting parameter after a save
    #[arg(long, global = true)]
    reload: Option<String>,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current slot values of a document (hero, mission, vial)
    Show { target: String },
    /// Show route generations bumped by saves
    Views,
    /// Replace the hero headline
    Hero { text: String },
    /// Set the medical-core vial transform
    Vial {
        #[arg(long, allow_hyphen_values = true)]
        x: f64,
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        rotate: f64,
        #[arg(long, allow_hyphen_values = true, default_value = "1")]
        scale: f64,
    },
    /// Move mission cards and the mission vial
    Mission {
        /// Card position as N=X,Y (1-based card number); repeatable
        #[arg(long = "card", value_parser = parse_card, allow_hyphen_values = true)]
        cards: Vec<(usize, Position)>,
        /// Mission vial transform as X,Y,ROTATE,SCALE
        #[arg(long, value_parser = parse_transform, allow_hyphen_values = true)]
        vial: Option<Transform>,
    },
}

fn parse_numbers(raw: &str, expected: usize) -> Result<Vec<f64>, String> {
    let numbers = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|err| format!("'{}' is not a number: {}", part.trim(), err))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if numbers.len() != expected {
        return Err(format!(
            "expected {} comma-separated numbers, got {}",
            expected,
            numbers.len()
        ));
    }
    Ok(numbers)
}

fn parse_card(raw: &str) -> Result<(usize, Position), String> {
    let (index, coords) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected N=X,Y, got '{}'", raw))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid card number '{}': {}", index.trim(), err))?;
    let numbers = parse_numbers(coords, 2)?;
    Ok((index, Position::new(numbers[0], numbers[1])))
}

fn parse_transform(raw: &str) -> Result<Transform, String> {
    let numbers = parse_numbers(raw, 4)?;
    Ok(Transform::new(numbers[0], numbers[1], numbers[2], numbers[3]))
}

fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

/// Decode an action response; the server answers with a `PatchResult` for
/// every status, anything else is reported as a failure.
fn patch_result_from_response(status: reqwest::StatusCode, body: &str) -> PatchResult {
    match serde_json::from_str::<PatchResult>(body) {
        Ok(result) => result,
        Err(_) => PatchResult::failure(error_message_for_response(status, body)),
    }
}

fn api_url(server: &str, segments: &[&str]) -> Result<reqwest::Url, String> {
    let mut url = reqwest::Url::parse(server)
        .map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

fn normalize_server(server: String) -> String {
    if let Ok(mut url) = reqwest::Url::parse(&server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server;
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server
}

fn resolve_server(server: Option<String>) -> String {
    liveedit_core::text::normalize_optional_nonempty(server)
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string())
}

/// Request body of an action, in the shape the HTTP API expects.
fn action_body(call: &ActionCall) -> serde_json::Result<Value> {
    match call {
        ActionCall::HeroText(request) => serde_json::to_value(request),
        ActionCall::MissionPositions(request) => serde_json::to_value(request),
        ActionCall::VialPosition(transform) => serde_json::to_value(transform),
    }
}

/// Edits requested on the command line, as session slot assignments.
fn edits_for(command: &Commands) -> Vec<(SlotKey, SlotValue)> {
    match command {
        Commands::Show { .. } | Commands::Views => Vec::new(),
        Commands::Hero { text } => vec![(SlotKey::HeroText, SlotValue::Text(text.clone()))],
        Commands::Vial {
            x,
            y,
            rotate,
            scale,
        } => vec![(
            SlotKey::MedicalVial,
            SlotValue::Transform(Transform::new(*x, *y, *rotate, *scale)),
        )],
        Commands::Mission { cards, vial } => {
            let mut edits: Vec<_> = cards
                .iter()
                .map(|(index, position)| (SlotKey::MissionCard(*index), SlotValue::Position(*position)))
                .collect();
            if let Some(vial) = vial {
                edits.push((SlotKey::MissionVial, SlotValue::Transform(*vial)));
            }
            edits
        }
    }
}

/// HTTP transport for session saves.
struct ActionClient {
    http: reqwest::Client,
    server: String,
    token: Option<String>,
}

impl ActionClient {
    async fn get_json(&self, segments: &[&str]) -> anyhow::Result<Value> {
        let url = api_url(&self.server, segments).map_err(anyhow::Error::msg)?;
        let res = self.http.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            bail!("{} ({})", error_message_for_response(status, &body), status);
        }
        serde_json::from_str(&body).context("response is not valid JSON")
    }

    async fn send(&self, call: &ActionCall) -> PatchResult {
        match self.try_send(call).await {
            Ok(result) => result,
            Err(err) => PatchResult::failure(format!("{:#}", err)),
        }
    }

    async fn try_send(&self, call: &ActionCall) -> anyhow::Result<PatchResult> {
        let url = api_url(&self.server, &["api", "actions", call.name()])
            .map_err(anyhow::Error::msg)?;
        let mut request = self.http.post(url).json(&action_body(call)?);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        tracing::debug!("POST {}", call.name());
        let res = request.send().await?;
        let status = res.status();
        let body = res.text().await?;
        Ok(patch_result_from_response(status, &body))
    }

    /// Send every planned call in order and collect their results.
    async fn execute(&self, plan: &SavePlan) -> Vec<PatchResult> {
        let mut results = Vec::with_capacity(plan.calls.len());
        for call in &plan.calls {
            results.push(self.send(&call.action).await);
        }
        results
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let Cli {
        server,
        token,
        json,
        reload,
        timeout,
        command,
    } = Cli::parse();

    let client = ActionClient {
        http: reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?,
        server: normalize_server(resolve_server(server)),
        token,
    };

    match &command {
        Commands::Show { target } => {
            let slots = client.get_json(&["api", "slots", target.as_str()]).await?;
            println!("{}", serde_json::to_string_pretty(&slots)?);
            return Ok(());
        }
        Commands::Views => {
            let views = client.get_json(&["api", "views"]).await?;
            println!("{}", serde_json::to_string_pretty(&views)?);
            return Ok(());
        }
        Commands::Hero { .. } | Commands::Vial { .. } | Commands::Mission { .. } => {}
    }

    // The server enforces the admin gate; the CLI operator always edits.
    let mut session = EditSession::new(true);
    session.enter_edit()?;
    for (key, value) in edits_for(&command) {
        session.record(key, value)?;
    }
    let plan = session.begin_save()?;
    let results = client.execute(&plan).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    match session.complete_save(plan, &results)? {
        SessionState::Saved => {
            if !json {
                println!("{}", session.message().unwrap_or("Saved."));
            }
            if let Some(base) = reload {
                println!("{}", reload_url(&base, chrono::Utc::now()));
            }
            Ok(())
        }
        state => {
            eprintln!(
                "Save failed ({:?}): {}",
                state,
                session.error().unwrap_or("unknown error")
            );
            std::process::exit(1);
        }
    }
}
