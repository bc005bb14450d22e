//! Mock DFU backend for testing

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::backend::DfuBackend;
use crate::core::error::{DfuError, DfuResult, PreflightError};
use crate::core::peripherals::PeripheralList;
use crate::core::types::UpdateRequest;

/// A call received by the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CheckPreflight,
    ShowVersion,
    ShowHelp,
    StartScanning { show_index: bool },
    StopScanning,
    PerformUpdate(UpdateRequest),
}

/// Configurable behavior of the mock backend
#[derive(Debug, Clone, Default)]
struct MockState {
    preflight_error: Option<PreflightError>,
    peripherals: Vec<String>,
    should_fail_update: bool,
    update_delay: Option<Duration>,
    calls: Vec<BackendCall>,
}

/// Mock DFU backend for testing
///
/// Records every call and plays back configured results without requiring
/// Bluetooth hardware.
#[derive(Debug, Clone)]
pub struct MockDfuBackend {
    inner: Arc<Mutex<MockState>>,
    discovered: PeripheralList,
}

impl MockDfuBackend {
    /// Create a new mock backend with a healthy radio and no peripherals
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState::default())),
            discovered: PeripheralList::new(),
        }
    }

    /// Configure the preflight check to fail
    pub fn set_preflight_error(&self, error: PreflightError) {
        self.inner.lock().unwrap().preflight_error = Some(error);
    }

    /// Configure peripherals "discovered" once scanning starts
    pub fn set_peripherals(&self, peripherals: &[&str]) {
        self.inner.lock().unwrap().peripherals =
            peripherals.iter().map(|p| p.to_string()).collect();
    }

    /// Configure the update operation to fail
    pub fn set_update_failure(&self, should_fail: bool) {
        self.inner.lock().unwrap().should_fail_update = should_fail;
    }

    /// Make the update operation take `delay` before completing
    pub fn set_update_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().update_delay = Some(delay);
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: BackendCall) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

impl Default for MockDfuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DfuBackend for MockDfuBackend {
    async fn check_preflight(&self) -> Result<(), PreflightError> {
        self.record(BackendCall::CheckPreflight);
        match self.inner.lock().unwrap().preflight_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn show_version(&self) {
        self.record(BackendCall::ShowVersion);
    }

    fn show_help(&self) {
        self.record(BackendCall::ShowHelp);
    }

    async fn start_scanning(&self, show_index: bool) -> DfuResult<()> {
        self.record(BackendCall::StartScanning { show_index });
        let peripherals = self.inner.lock().unwrap().peripherals.clone();

        self.discovered.clear().await;
        for peripheral in peripherals {
            self.discovered.push(peripheral).await;
        }
        Ok(())
    }

    async fn stop_scanning(&self) -> DfuResult<()> {
        self.record(BackendCall::StopScanning);
        Ok(())
    }

    async fn discovered_identifiers(&self) -> Vec<String> {
        self.discovered.snapshot().await
    }

    async fn perform_update(&self, request: &UpdateRequest) -> DfuResult<()> {
        self.record(BackendCall::PerformUpdate(request.clone()));
        let delay = self.inner.lock().unwrap().update_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.lock().unwrap().should_fail_update {
            Err(DfuError::Protocol("Mock update failure".into()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_mock_backend_discovery() {
        let backend = MockDfuBackend::new();
        backend.set_peripherals(&["AA", "BB"]);

        assert!(backend.discovered_identifiers().await.is_empty());

        backend.start_scanning(true).await.unwrap();
        assert_eq!(backend.discovered_identifiers().await, vec!["AA", "BB"]);

        backend.stop_scanning().await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::StartScanning { show_index: true },
                BackendCall::StopScanning,
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_backend_preflight_failure() {
        let backend = MockDfuBackend::new();
        assert!(backend.check_preflight().await.is_ok());

        backend.set_preflight_error(PreflightError::PoweredOff);
        assert_eq!(
            backend.check_preflight().await,
            Err(PreflightError::PoweredOff)
        );
    }

    #[tokio::test]
    async fn test_mock_backend_update_failure() {
        let backend = MockDfuBackend::new();
        let request = UpdateRequest {
            peripheral_uuid: "AA".into(),
            hex_path: PathBuf::from("/tmp/a.hex"),
            init_path: None,
        };

        assert!(backend.perform_update(&request).await.is_ok());

        backend.set_update_failure(true);
        assert!(backend.perform_update(&request).await.is_err());
        assert_eq!(
            backend.count(|call| matches!(call, BackendCall::PerformUpdate(_))),
            2
        );
    }
}
