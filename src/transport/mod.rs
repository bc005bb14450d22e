//! Radio transport implementations

pub mod ble;
