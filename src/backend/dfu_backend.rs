//! DFU backend trait definition

use trait_variant::make;

use crate::config::USAGE;
use crate::core::error::{DfuResult, PreflightError};
use crate::core::types::UpdateRequest;

/// Abstraction over the radio stack and the firmware update protocol
///
/// The dispatcher only talks to this trait, which keeps the command flow
/// testable without Bluetooth hardware.
#[make(Send)]
pub trait DfuBackend: Send + Sync + 'static {
    /// Check that the radio is present, powered and usable
    async fn check_preflight(&self) -> Result<(), PreflightError>;

    /// Print version information
    fn show_version(&self) {
        println!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    }

    /// Print usage information
    fn show_help(&self) {
        println!("{USAGE}");
    }

    /// Start discovering peripherals
    ///
    /// With `show_index` set, every discovered peripheral is printed with its
    /// position in the discovered list so the user can pick one by number.
    async fn start_scanning(&self, show_index: bool) -> DfuResult<()>;

    /// Stop discovering peripherals
    async fn stop_scanning(&self) -> DfuResult<()>;

    /// Snapshot of the identifiers discovered since scanning started
    async fn discovered_identifiers(&self) -> Vec<String>;

    /// Flash the firmware described by `request`
    ///
    /// Runs to completion; the transfer may take a minute or more.
    async fn perform_update(&self, request: &UpdateRequest) -> DfuResult<()>;
}
