//! Interactive peripheral selection

use tokio::io::AsyncBufRead;
use tracing::{debug, info};

use crate::{
    backend::DfuBackend,
    core::{error::DispatchResult, input::LineInput},
};

/// Resolve a user-typed index against a snapshot of discovered identifiers
pub fn resolve_index(line: &str, identifiers: &[String]) -> Option<String> {
    let index = line.trim().parse::<usize>().ok()?;
    identifiers.get(index).cloned()
}

/// Let the user pick a discovered peripheral by its index
///
/// Returns `None` when the input is not a valid index into the list as it
/// stands when the line arrives. Discovery is stopped in every case so it
/// cannot overlap the update.
pub async fn select_peripheral<B, R>(
    backend: &B,
    input: &mut LineInput<R>,
) -> DispatchResult<Option<String>>
where
    B: DfuBackend,
    R: AsyncBufRead + Unpin,
{
    println!("Select a peripheral for dfu. Scanning...");
    backend.start_scanning(true).await?;

    let line = match input.read_line().await {
        Ok(line) => line,
        Err(e) => {
            backend.stop_scanning().await?;
            return Err(e.into());
        }
    };
    let identifiers = backend.discovered_identifiers().await;
    let selected = line
        .as_deref()
        .and_then(|line| resolve_index(line, &identifiers));

    match &selected {
        Some(identifier) => {
            println!("Selected UUID: {identifier}");
            info!(%identifier, "Peripheral selected");
        }
        None => debug!(
            ?line,
            discovered = identifiers.len(),
            "No valid peripheral index"
        ),
    }

    backend.stop_scanning().await?;
    Ok(selected)
}
