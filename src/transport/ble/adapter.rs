//! BLE adapter management and peripheral discovery

use std::time::Duration;

use bluer::{Adapter, AdapterEvent, Address, Device, ErrorKind, Session};
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{
    error::{DfuError, DfuResult, PreflightError},
    peripherals::PeripheralList,
};

/// How long to look for a peripheral BlueZ has not seen yet
const FIND_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

/// BLE adapter handle
pub struct BleAdapter {
    _session: Session,
    adapter: Adapter,
}

impl BleAdapter {
    /// Open the named adapter, or the system default one
    pub async fn open(name: Option<&str>) -> Result<Self, PreflightError> {
        let session = Session::new()
            .await
            .map_err(|e| PreflightError::Unsupported(e.to_string()))?;

        let adapter = match name {
            Some(name) => session.adapter(name),
            None => session.default_adapter().await,
        }
        .map_err(classify)?;

        info!("Using BLE adapter: {}", adapter.name());

        Ok(Self {
            _session: session,
            adapter,
        })
    }

    /// Adapter name, e.g. `hci0`
    pub fn name(&self) -> &str {
        self.adapter.name()
    }

    /// Fail unless the adapter is powered
    pub async fn check_powered(&self) -> Result<(), PreflightError> {
        match self.adapter.is_powered().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(PreflightError::PoweredOff),
            Err(e) => Err(classify(e)),
        }
    }

    /// Start discovery on a background task
    ///
    /// Every new peripheral is appended to `peripherals` and printed. Aborting
    /// the returned task ends the discovery session.
    pub async fn discover(
        &self,
        peripherals: PeripheralList,
        show_index: bool,
    ) -> Result<JoinHandle<()>, bluer::Error> {
        let events = self.adapter.discover_devices().await?;
        let adapter = self.adapter.clone();

        info!("Discovery started");

        Ok(tokio::spawn(async move {
            run_discovery(adapter, events, peripherals, show_index).await;
        }))
    }

    /// Get a peripheral, discovering it first when BlueZ does not know it yet
    pub async fn find_device(&self, address: Address) -> DfuResult<Device> {
        if self.adapter.device_addresses().await?.contains(&address) {
            return Ok(self.adapter.device(address)?);
        }

        debug!(%address, "Peripheral unknown, discovering");
        let events = self.adapter.discover_devices().await?;
        let mut events = std::pin::pin!(events);

        let found = tokio::time::timeout(FIND_DEVICE_TIMEOUT, async {
            while let Some(event) = events.next().await {
                if matches!(event, AdapterEvent::DeviceAdded(added) if added == address) {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        if !found {
            return Err(DfuError::DeviceNotFound(address.to_string()));
        }
        Ok(self.adapter.device(address)?)
    }
}

async fn run_discovery(
    adapter: Adapter,
    events: impl Stream<Item = AdapterEvent>,
    peripherals: PeripheralList,
    show_index: bool,
) {
    let mut events = std::pin::pin!(events);

    while let Some(event) = events.next().await {
        match event {
            AdapterEvent::DeviceAdded(address) => {
                let Some(index) = peripherals.push(address.to_string()).await else {
                    continue;
                };

                let (name, rssi) = match adapter.device(address) {
                    Ok(device) => (
                        device.name().await.ok().flatten(),
                        device.rssi().await.ok().flatten(),
                    ),
                    Err(e) => {
                        debug!("Cannot query {}: {}", address, e);
                        (None, None)
                    }
                };

                println!(
                    "{}",
                    describe_peripheral(
                        show_index.then_some(index),
                        &address.to_string(),
                        name.as_deref(),
                        rssi
                    )
                );
            }
            AdapterEvent::DeviceRemoved(address) => {
                debug!("Device removed: {}", address);
            }
            AdapterEvent::PropertyChanged(_prop) => {}
        }
    }

    warn!("Discovery event stream ended");
}

/// One line of discovery output
fn describe_peripheral(
    index: Option<usize>,
    address: &str,
    name: Option<&str>,
    rssi: Option<i16>,
) -> String {
    let mut line = String::new();
    if let Some(index) = index {
        line.push_str(&format!("{index}: "));
    }
    line.push_str(name.unwrap_or("<unnamed>"));
    line.push_str(&format!(" [{address}]"));
    if let Some(rssi) = rssi {
        line.push_str(&format!(" {rssi} dBm"));
    }
    line
}

fn classify(error: bluer::Error) -> PreflightError {
    match error.kind {
        ErrorKind::NotAuthorized | ErrorKind::NotPermitted => PreflightError::Unauthorized,
        ErrorKind::NotReady => PreflightError::PoweredOff,
        ErrorKind::NotSupported => PreflightError::Unsupported(error.message),
        _ => PreflightError::Unavailable(error.to_string()),
    }
}
