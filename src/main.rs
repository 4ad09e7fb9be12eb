use clap::Parser;
use mimalloc::MiMalloc;
use photo_provenance::utils::env_reader::EnvVariables;
use photo_provenance::verify::{ImageVerifier, VerificationPolicy};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Logging goes to stderr, stdout is reserved for JSON output
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = cli::Cli::parse();

    let vars = match EnvVariables::get_all() {
        Ok(vars) => vars,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let policy = match &vars.rules_path {
        Some(path) => match VerificationPolicy::load(path) {
            Ok(policy) => policy,
            Err(e) => {
                error!("Failed to load verification rules: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => VerificationPolicy::default(),
    };
    let verifier = ImageVerifier::new(policy);

    match cli::run_cli(cli, &vars, &verifier).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
