//! Bluetooth Low Energy transport layer

pub mod adapter;
pub mod dfu;
pub mod uuids;

pub use {adapter::BleAdapter, dfu::DfuClient, uuids::*};
