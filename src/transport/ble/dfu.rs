//! Legacy DFU client over BlueZ GATT

use bluer::{
    Device,
    gatt::{
        WriteOp,
        remote::{Characteristic, CharacteristicWriteRequest},
    },
};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    core::{
        error::{DfuError, DfuResult},
        firmware::FirmwareImage,
    },
    protocol::{
        ControlNotification, ControlRequest, ImageType, PACKET_SIZE, ResponseStatus, image_sizes,
    },
};

use super::uuids::{DFU_CONTROL_POINT_UUID, DFU_PACKET_UUID, DFU_SERVICE_UUID};

/// Connected peripheral running the legacy DFU bootloader
pub struct DfuClient {
    device: Device,
    control_point: Characteristic,
    packet: Characteristic,
    packet_notify: u16,
}

impl DfuClient {
    /// Connect to `device` and resolve the DFU characteristics
    ///
    /// `packet_notify` is the number of packets between receipt
    /// notifications; 0 disables them.
    pub async fn connect(device: Device, packet_notify: u16) -> DfuResult<Self> {
        let address = device.address();

        if !device.is_connected().await? {
            info!(%address, "Connecting");
            device.connect().await?;
        }

        let mut control_point = None;
        let mut packet = None;

        for service in device.services().await? {
            if service.uuid().await? != DFU_SERVICE_UUID {
                continue;
            }
            for characteristic in service.characteristics().await? {
                match characteristic.uuid().await? {
                    DFU_CONTROL_POINT_UUID => control_point = Some(characteristic),
                    DFU_PACKET_UUID => packet = Some(characteristic),
                    _ => {}
                }
            }
        }

        if control_point.is_none() && packet.is_none() {
            return Err(DfuError::ServiceNotFound(address.to_string()));
        }

        Ok(Self {
            device,
            control_point: control_point
                .ok_or(DfuError::CharacteristicNotFound(DFU_CONTROL_POINT_UUID))?,
            packet: packet.ok_or(DfuError::CharacteristicNotFound(DFU_PACKET_UUID))?,
            packet_notify,
        })
    }

    /// Transfer `image` and reset the peripheral into the new application
    pub async fn update(&self, image: &FirmwareImage) -> DfuResult<()> {
        let size = u32::try_from(image.application.len())
            .map_err(|_| DfuError::Protocol("application image too large".into()))?;

        let notifications = self.control_point.notify().await?;
        let mut notifications = std::pin::pin!(notifications);

        let start = ControlRequest::StartDfu(ImageType::Application);
        self.request(start).await?;
        self.write_packet(&image_sizes(size)).await?;
        expect_response(&mut notifications, start).await?;
        info!(size, "DFU started");

        if let Some(init_packet) = &image.init_packet {
            self.request(ControlRequest::InitParams { complete: false })
                .await?;
            for chunk in init_packet.chunks(PACKET_SIZE) {
                self.write_packet(chunk).await?;
            }
            let complete = ControlRequest::InitParams { complete: true };
            self.request(complete).await?;
            expect_response(&mut notifications, complete).await?;
            debug!(len = init_packet.len(), "Init packet accepted");
        }

        if self.packet_notify > 0 {
            self.request(ControlRequest::PacketReceiptRequest(self.packet_notify))
                .await?;
        }

        let receive = ControlRequest::ReceiveFirmwareImage;
        self.request(receive).await?;

        let chunks = image.application.chunks(PACKET_SIZE);
        let total = chunks.len();
        let mut progress = Progress::new(image.application.len());

        for (index, chunk) in chunks.enumerate() {
            self.write_packet(chunk).await?;
            progress.advance(chunk.len());

            let sent = index + 1;
            if self.packet_notify > 0 && sent < total && sent % self.packet_notify as usize == 0 {
                let received = expect_receipt(&mut notifications).await?;
                debug!(received, sent = progress.sent, "Packet receipt");
            }
        }
        expect_response(&mut notifications, receive).await?;

        let validate = ControlRequest::ValidateFirmware;
        self.request(validate).await?;
        expect_response(&mut notifications, validate).await?;
        info!("Firmware validated");

        // The bootloader resets right away and may drop the link before acking
        if let Err(e) = self.request(ControlRequest::ActivateAndReset).await {
            warn!("Activate and reset: {}", e);
        }

        Ok(())
    }

    /// Disconnect, ignoring a link the peripheral already dropped
    pub async fn disconnect(&self) {
        if let Err(e) = self.device.disconnect().await {
            debug!("Disconnect: {}", e);
        }
    }

    async fn request(&self, request: ControlRequest) -> DfuResult<()> {
        debug!(?request, "Control point write");
        self.control_point.write(&request.encode()).await?;
        Ok(())
    }

    async fn write_packet(&self, data: &[u8]) -> DfuResult<()> {
        let req = CharacteristicWriteRequest {
            op_type: WriteOp::Command,
            ..Default::default()
        };
        self.packet.write_ext(data, &req).await?;
        Ok(())
    }
}

/// Wait for the response to `request`, skipping unrelated notifications
async fn expect_response<S>(notifications: &mut S, request: ControlRequest) -> DfuResult<()>
where
    S: Stream<Item = Vec<u8>> + Unpin,
{
    loop {
        let value = notifications
            .next()
            .await
            .ok_or(DfuError::NotificationsClosed)?;
        debug!(value = %hex::encode(&value), "Control point notification");

        if let Some(ControlNotification::Response { request: op, status }) =
            ControlNotification::parse(&value)
        {
            if op != request.opcode() {
                continue;
            }
            return match status {
                ResponseStatus::Success => Ok(()),
                status => Err(DfuError::Protocol(format!("{request:?} failed: {status}"))),
            };
        }
    }
}

/// Wait for the next packet receipt notification
async fn expect_receipt<S>(notifications: &mut S) -> DfuResult<u32>
where
    S: Stream<Item = Vec<u8>> + Unpin,
{
    loop {
        let value = notifications
            .next()
            .await
            .ok_or(DfuError::NotificationsClosed)?;

        match ControlNotification::parse(&value) {
            Some(ControlNotification::PacketReceipt { bytes_received }) => {
                return Ok(bytes_received);
            }
            Some(ControlNotification::Response { request, status }) => {
                return Err(DfuError::Protocol(format!(
                    "unexpected response to {request:#04x} during transfer: {status}"
                )));
            }
            None => debug!(value = %hex::encode(&value), "Ignoring notification"),
        }
    }
}

/// Percentage reporting in 10 % steps
struct Progress {
    total: usize,
    sent: usize,
    reported: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            sent: 0,
            reported: 0,
        }
    }

    /// Account for `len` more bytes, returning a newly reached percentage
    fn advance(&mut self, len: usize) -> Option<usize> {
        self.sent += len;
        if self.total == 0 {
            return None;
        }
        let percent = self.sent * 100 / self.total;
        let step = percent / 10 * 10;
        if step > self.reported {
            self.reported = step;
            println!("Progress: {step}%");
            return Some(step);
        }
        None
    }
}
