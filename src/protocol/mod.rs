//! DFU protocol message definitions

pub mod legacy_dfu;

pub use legacy_dfu::{
    ControlNotification, ControlRequest, ImageType, PACKET_SIZE, ResponseStatus, image_sizes,
};
