//! Radio and firmware update backend abstraction layer

pub mod bluer_backend;
pub mod dfu_backend;
#[cfg(test)]
pub mod mock_backend;

pub use bluer_backend::BluerBackend;
pub use dfu_backend::DfuBackend;

#[cfg(test)]
pub use mock_backend::{BackendCall, MockDfuBackend};
