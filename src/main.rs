//! LiveEdit API server entrypoint.

use liveedit_core::persist::Persistence;
use liveedit_core::{BackendKind, DEFAULT_PORT};
use liveedit_server::{config::Config, serve_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    check: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" => flags.help = true,
            "--check" => flags.check = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

/// Describe the persistence backend `config` selects.
///
/// # Errors
/// Fails when hosted credentials are missing or malformed.
fn check_persistence(config: &Config) -> anyhow::Result<String> {
    match Persistence::from_config(config)? {
        Persistence::Local(store) => Ok(format!(
            "Local persistence under {}",
            store.root().display()
        )),
        Persistence::Remote(store) => Ok(format!(
            "GitHub persistence on {} (branch {})",
            config.github.repo.as_deref().unwrap_or_default(),
            store.branch()
        )),
        Persistence::Unconfigured { missing } => {
            anyhow::bail!(liveedit_core::AppError::ConfigurationMissing(missing))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liveedit=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();

    if cli_flags.check {
        println!("{}", check_persistence(&config)?);
        return Ok(());
    }

    let state = AppState::new(config.clone())?;
    match state.editor.backend() {
        BackendKind::Local => tracing::info!(
            "Saving edits to local files under {}",
            config.project_root.display()
        ),
        BackendKind::Remote => tracing::info!("Saving edits as GitHub commits"),
    }
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set - live edit actions are open to any caller");
    }

    let allow_public = liveedit_server::config::env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = liveedit_server::resolve_bind_address(&config, allow_public);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("LiveEdit running at http://{}", actual_addr);

    serve_router(listener, state, allow_public, shutdown_signal()).await?;
    tracing::info!("LiveEdit stopped");
    Ok(())
}

fn print_help() {
    println!("LiveEdit Server\n");
    println!("Usage: liveedit-server [OPTIONS]\n");
    println!("Options:");
    println!("  --check           Print the selected persistence backend and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  PROJECT_ROOT      Directory holding the editable sources (default: cwd)");
    println!(
        "  PORT              Server port (default: {})",
        DEFAULT_PORT
    );
    println!("  MAX_BODY_SIZE     Maximum request body in bytes (default: 64KB)");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin");
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
    println!("  ADMIN_TOKEN       Bearer token required by action endpoints");
    println!("  VERCEL            When set, commit edits to GitHub instead of local files");
    println!("  GITHUB_REPO       Repository as owner/name (hosted mode)");
    println!("  GITHUB_TOKEN      Token with contents write access (hosted mode)");
    println!("  GITHUB_BRANCH     Branch to commit to (default: main)");
    println!("  GITHUB_API_URL    API base URL (default: https://api.github.com)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
