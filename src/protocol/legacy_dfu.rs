//! Legacy Nordic DFU control point messages (bootloader SDK 7 to 11)

use std::fmt;

/// Payload bytes per packet characteristic write
pub const PACKET_SIZE: usize = 20;

const OP_START_DFU: u8 = 0x01;
const OP_INITIALIZE_DFU_PARAMS: u8 = 0x02;
const OP_RECEIVE_FIRMWARE_IMAGE: u8 = 0x03;
const OP_VALIDATE_FIRMWARE: u8 = 0x04;
const OP_ACTIVATE_AND_RESET: u8 = 0x05;
const OP_PACKET_RECEIPT_NOTIFICATION_REQUEST: u8 = 0x08;
const OP_RESPONSE_CODE: u8 = 0x10;
const OP_PACKET_RECEIPT_NOTIFICATION: u8 = 0x11;

/// Image kinds accepted by Start DFU; only application updates are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ImageType {
    Application = 0x04,
}

/// Request written to the control point characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    StartDfu(ImageType),
    InitParams { complete: bool },
    ReceiveFirmwareImage,
    ValidateFirmware,
    ActivateAndReset,
    PacketReceiptRequest(u16),
}

impl ControlRequest {
    pub fn opcode(&self) -> u8 {
        match self {
            ControlRequest::StartDfu(_) => OP_START_DFU,
            ControlRequest::InitParams { .. } => OP_INITIALIZE_DFU_PARAMS,
            ControlRequest::ReceiveFirmwareImage => OP_RECEIVE_FIRMWARE_IMAGE,
            ControlRequest::ValidateFirmware => OP_VALIDATE_FIRMWARE,
            ControlRequest::ActivateAndReset => OP_ACTIVATE_AND_RESET,
            ControlRequest::PacketReceiptRequest(_) => OP_PACKET_RECEIPT_NOTIFICATION_REQUEST,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode()];
        match self {
            ControlRequest::StartDfu(image) => bytes.push(*image as u8),
            ControlRequest::InitParams { complete } => bytes.push(u8::from(*complete)),
            ControlRequest::PacketReceiptRequest(interval) => {
                bytes.extend_from_slice(&interval.to_le_bytes())
            }
            _ => {}
        }
        bytes
    }
}

/// Image size triple sent on the packet characteristic after Start DFU
pub fn image_sizes(application_len: u32) -> [u8; 12] {
    let mut sizes = [0u8; 12];
    // softdevice and bootloader sizes stay zero
    sizes[8..].copy_from_slice(&application_len.to_le_bytes());
    sizes
}

/// Result code of a control point request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Success,
    InvalidState,
    NotSupported,
    DataSizeExceedsLimit,
    CrcError,
    OperationFailed,
    Unknown(u8),
}

impl From<u8> for ResponseStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => ResponseStatus::Success,
            2 => ResponseStatus::InvalidState,
            3 => ResponseStatus::NotSupported,
            4 => ResponseStatus::DataSizeExceedsLimit,
            5 => ResponseStatus::CrcError,
            6 => ResponseStatus::OperationFailed,
            other => ResponseStatus::Unknown(other),
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Success => f.write_str("success"),
            ResponseStatus::InvalidState => f.write_str("invalid state"),
            ResponseStatus::NotSupported => f.write_str("not supported"),
            ResponseStatus::DataSizeExceedsLimit => f.write_str("data size exceeds limit"),
            ResponseStatus::CrcError => f.write_str("CRC error"),
            ResponseStatus::OperationFailed => f.write_str("operation failed"),
            ResponseStatus::Unknown(code) => write!(f, "unknown status {code}"),
        }
    }
}

/// Notification received from the control point characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlNotification {
    Response { request: u8, status: ResponseStatus },
    PacketReceipt { bytes_received: u32 },
}

impl ControlNotification {
    /// Decode a notification, `None` for unknown or truncated payloads
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [OP_RESPONSE_CODE, request, status, ..] => Some(ControlNotification::Response {
                request: *request,
                status: ResponseStatus::from(*status),
            }),
            [OP_PACKET_RECEIPT_NOTIFICATION, b0, b1, b2, b3, ..] => {
                Some(ControlNotification::PacketReceipt {
                    bytes_received: u32::from_le_bytes([*b0, *b1, *b2, *b3]),
                })
            }
            _ => None,
        }
    }
}
