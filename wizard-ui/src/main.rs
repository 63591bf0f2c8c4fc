//! Wizard UI server - serves a multi-step form over HTTP with in-memory
//! sessions, plus a small JSON API.

mod pages;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use axum::Router;
use axum::response::Redirect;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use wizard::definition::{default_definition, load_definition};
use wizard::form::Submission;
use wizard::io::config::{WizardConfig, load_config};

use crate::pages::PageRenderer;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "wizard-ui")]
#[command(about = "Serve a multi-step form in the browser")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3002")]
    port: u16,

    /// Form definition (TOML); the sample signup form when omitted
    #[arg(long)]
    form: Option<PathBuf>,

    /// Wizard config (TOML); defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wizard_ui=info".parse()?)
                .add_directive("wizard=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let state = build_state(&args)?;
    info!(form = state.form.name(), steps = state.form.step_count(), "starting wizard-ui");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { Redirect::to(routes::FORM_PATH) }))
        .merge(routes::form_router())
        .nest("/api", routes::api_router().layer(cors))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load the form and config, wiring completion into the in-memory
/// submission list.
fn build_state(args: &Args) -> anyhow::Result<AppState> {
    let definition = match &args.form {
        Some(path) => load_definition(path)?,
        None => default_definition(),
    };
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WizardConfig::default(),
    };

    let submissions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&submissions);
    let form = definition
        .builder()
        .base_action(routes::FORM_PATH)
        .config(config)
        .on_complete(move |submission: &Submission| -> anyhow::Result<()> {
            info!(form = %submission.form, fields = submission.data.len(), "submission received");
            sink.lock()
                .map_err(|_| anyhow!("submission list poisoned"))?
                .push(submission.clone());
            Ok(())
        })
        .build()?;

    Ok(AppState::new(form, submissions, PageRenderer::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_serve_the_sample_form() {
        let args = Args::parse_from(["wizard-ui"]);
        assert_eq!(args.port, 3002);
        let state = build_state(&args).expect("state");
        assert_eq!(state.form.name(), "Signup");
        assert_eq!(state.form.form_action(2), "/form?step=2");
        assert!(state.form.has_completion_handler());
    }

    #[test]
    fn missing_form_file_is_an_error() {
        let args = Args::parse_from(["wizard-ui", "--form", "/nonexistent/form.toml"]);
        assert!(build_state(&args).is_err());
    }
}
