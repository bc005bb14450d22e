//! Command dispatch
//!
//! Sequences the preflight check, the selected command and, for `dfu`, the
//! interactive peripheral selection and the update barrier.

use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tracing::{error, info};

use crate::{
    backend::DfuBackend,
    config::{ExitPolicy, Settings},
    core::{
        barrier::OperationBarrier,
        error::{DispatchError, DispatchResult},
        input::LineInput,
        selector::select_peripheral,
        types::{Command, ParsedInvocation, UpdateRequest},
    },
};

/// Runs one parsed invocation against a backend
pub struct CommandDispatcher<B: DfuBackend, R> {
    backend: Arc<B>,
    input: LineInput<R>,
    barrier: OperationBarrier,
    exit_policy: ExitPolicy,
}

impl<B: DfuBackend, R: AsyncBufRead + Unpin> CommandDispatcher<B, R> {
    /// Create a dispatcher reading interactive input from `reader`
    pub fn new(backend: Arc<B>, reader: R, settings: &Settings) -> Self {
        Self {
            backend,
            input: LineInput::new(reader, settings.input_timeout),
            barrier: OperationBarrier::new(settings.update_timeout),
            exit_policy: settings.exit_policy,
        }
    }

    /// Execute the invocation
    ///
    /// `Ok` maps to a successful exit; every error is fatal.
    pub async fn dispatch(&mut self, invocation: ParsedInvocation) -> DispatchResult<()> {
        self.backend.check_preflight().await?;

        let command = invocation.command.unwrap_or(Command::Help);
        info!(%command, "Dispatching");

        match command {
            Command::Version => self.backend.show_version(),
            Command::Help => self.backend.show_help(),
            Command::Scan => self.scan().await?,
            Command::Dfu => self.dfu(invocation).await?,
        }

        Ok(())
    }

    async fn scan(&mut self) -> DispatchResult<()> {
        println!("Scanning...");
        self.backend.start_scanning(false).await?;

        // Any line, end of input or timeout ends the scan
        let line = self.input.read_line().await;

        self.backend.stop_scanning().await?;
        line?;
        Ok(())
    }

    async fn dfu(&mut self, invocation: ParsedInvocation) -> DispatchResult<()> {
        println!("DFU Update");

        let hex_path = invocation.hex_path.ok_or(DispatchError::MissingHexFile)?;

        let peripheral_uuid = match invocation.peripheral_uuid {
            Some(uuid) => Some(uuid),
            None => select_peripheral(self.backend.as_ref(), &mut self.input).await?,
        };
        let peripheral_uuid = peripheral_uuid.ok_or(DispatchError::InvalidPeripheral)?;

        let request = UpdateRequest {
            peripheral_uuid,
            hex_path,
            init_path: invocation.init_path,
        };
        println!("{request}");

        let backend = self.backend.clone();
        let result = self
            .barrier
            .run(async move { backend.perform_update(&request).await })
            .await?;

        match result {
            Ok(()) => {
                info!("Update finished");
                Ok(())
            }
            Err(e) => match self.exit_policy {
                ExitPolicy::Propagate => Err(DispatchError::Update(e)),
                ExitPolicy::AlwaysSucceed => {
                    error!(error = %e, "Update failed");
                    Ok(())
                }
            },
        }
    }
}
