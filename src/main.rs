//! Bluefruit DFU - Main Entry Point

use std::sync::Arc;

use bluefruit_dfu::{
    ExitStatus,
    backend::BluerBackend,
    config::{ArgumentTokenizer, Settings, TokenTable},
    core::{dispatcher::CommandDispatcher, types::Diagnostic},
};
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing; stdout is reserved for user-facing output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let status = run().await;

    // Exit explicitly so a worker left behind by a timeout cannot keep us alive
    std::process::exit(status.code());
}

async fn run() -> ExitStatus {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            let _ = e.print();
            return ExitStatus::Failure;
        }
    };
    info!(?settings, "Starting Bluefruit DFU");

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            println!("Cannot determine current directory: {e}");
            return ExitStatus::Failure;
        }
    };

    let tokenizer =
        ArgumentTokenizer::new(TokenTable::default()).strict(settings.strict_commands);
    let invocation = match tokenizer.tokenize(args.as_slice(), &cwd) {
        Ok(invocation) => invocation,
        Err(e) => {
            println!("{e}");
            return ExitStatus::Failure;
        }
    };

    for diagnostic in &invocation.diagnostics {
        match diagnostic {
            Diagnostic::MissingValue(_) => println!("{diagnostic}"),
            Diagnostic::UnknownArgument(_) => warn!("{}", diagnostic),
        }
    }

    let backend = Arc::new(BluerBackend::new(&settings));
    let stdin = BufReader::new(tokio::io::stdin());
    let mut dispatcher = CommandDispatcher::new(backend, stdin, &settings);

    match dispatcher.dispatch(invocation).await {
        Ok(()) => ExitStatus::Success,
        Err(e) => {
            debug!(error = ?e, "Command failed");
            println!("{e}");
            ExitStatus::Failure
        }
    }
}
