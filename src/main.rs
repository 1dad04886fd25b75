//! medintake - patient intake client
//!
//! Submits a completed intake form to a remote diagnostic service, holds
//! the follow-up question dialogue in the terminal, and prints the results.

mod config;
mod intake;
mod report;
mod runtime;
mod shell;
mod state_machine;
mod transport;

use clap::Parser;
use config::Config;
use intake::IntakeForm;
use shell::TerminalShell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use transport::{HttpDiagnosisService, LoggingService};

/// Run a clinical intake against a diagnostic service
#[derive(Debug, Parser)]
#[command(name = "medintake", version)]
struct Cli {
    /// Intake form as JSON (patient, symptoms, vitals, attachments)
    intake: PathBuf,

    /// Diagnostic service root URL [env: MEDINTAKE_BASE_URL]
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds, 0 for none [env: MEDINTAKE_TIMEOUT_SECS]
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "medintake=info".into());

    let json = std::env::var("MEDINTAKE_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(cli.base_url, cli.timeout_secs)?;
    tracing::info!(
        base_url = %config.base_url,
        timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        "Configuration loaded"
    );

    let form = IntakeForm::load(&cli.intake)?;
    let snapshot = intake::assemble(&form);
    tracing::info!(
        path = %cli.intake.display(),
        symptoms = form.symptoms.len(),
        "Intake form loaded"
    );

    let http = HttpDiagnosisService::new(&config.base_url, config.request_timeout)?;
    let service = LoggingService::new(Arc::new(http));
    let (handle, join) = runtime::launch(service);

    let shell = TerminalShell::new(handle.clone(), form, snapshot, std::io::stdout());
    let result = shell
        .run(tokio::io::BufReader::new(tokio::io::stdin()))
        .await;

    // Unmount: responses still in flight are discarded
    handle.shutdown();
    if let Err(e) = join.await {
        tracing::warn!(error = %e, "Conversation runtime panicked");
    }

    result?;
    Ok(())
}
