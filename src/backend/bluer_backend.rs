//! BlueZ backend implementation

use bluer::Address;
use tokio::{
    sync::{Mutex, OnceCell},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    backend::DfuBackend,
    config::Settings,
    core::{
        error::{DfuError, DfuResult, PreflightError},
        firmware::FirmwareImage,
        peripherals::PeripheralList,
        types::UpdateRequest,
    },
    transport::ble::{BleAdapter, DfuClient},
};

/// Real backend talking to bluetoothd over D-Bus
pub struct BluerBackend {
    adapter_name: Option<String>,
    packet_notify: u16,
    adapter: OnceCell<BleAdapter>,
    peripherals: PeripheralList,
    discovery: Mutex<Option<JoinHandle<()>>>,
}

impl BluerBackend {
    /// Create a backend; the adapter is opened by the preflight check
    pub fn new(settings: &Settings) -> Self {
        Self {
            adapter_name: settings.adapter.clone(),
            packet_notify: settings.packet_notify,
            adapter: OnceCell::new(),
            peripherals: PeripheralList::new(),
            discovery: Mutex::new(None),
        }
    }

    fn adapter(&self) -> DfuResult<&BleAdapter> {
        self.adapter.get().ok_or(DfuError::NotReady)
    }
}

impl DfuBackend for BluerBackend {
    async fn check_preflight(&self) -> Result<(), PreflightError> {
        let adapter = self
            .adapter
            .get_or_try_init(|| BleAdapter::open(self.adapter_name.as_deref()))
            .await?;
        adapter.check_powered().await?;

        debug!("Preflight passed on {}", adapter.name());
        Ok(())
    }

    async fn start_scanning(&self, show_index: bool) -> DfuResult<()> {
        let adapter = self.adapter()?;

        let mut discovery = self.discovery.lock().await;
        if let Some(previous) = discovery.take() {
            previous.abort();
            let _ = previous.await;
        }

        self.peripherals.clear().await;
        *discovery = Some(
            adapter
                .discover(self.peripherals.clone(), show_index)
                .await?,
        );
        Ok(())
    }

    async fn stop_scanning(&self) -> DfuResult<()> {
        if stop_discovery(&self.discovery).await {
            info!("Discovery stopped");
        }
        Ok(())
    }

    async fn discovered_identifiers(&self) -> Vec<String> {
        self.peripherals.snapshot().await
    }

    async fn perform_update(&self, request: &UpdateRequest) -> DfuResult<()> {
        let image = FirmwareImage::load(request).await?;
        let address: Address = request
            .peripheral_uuid
            .parse()
            .map_err(|_| DfuError::InvalidAddress(request.peripheral_uuid.clone()))?;

        let device = self.adapter()?.find_device(address).await?;
        let client = DfuClient::connect(device, self.packet_notify).await?;

        let result = client.update(&image).await;
        client.disconnect().await;

        match &result {
            Ok(()) => println!("DFU finished successfully"),
            Err(e) => println!("DFU failed: {e}"),
        }
        result
    }
}

/// Abort the running discovery task and wait until it is gone
///
/// The task owns the BlueZ discovery session, so once this returns the
/// adapter is no longer scanning. Returns whether a task was running.
async fn stop_discovery(discovery: &Mutex<Option<JoinHandle<()>>>) -> bool {
    let Some(task) = discovery.lock().await.take() else {
        return false;
    };
    task.abort();
    let _ = task.await;
    true
}
