//! Bluefruit DFU
//!
//! Command-line firmware updater for Bluetooth LE peripherals running the
//! legacy Nordic DFU bootloader:
//! - argument tokenizing and command dispatch
//! - interactive peripheral selection
//! - firmware transfer over BlueZ

pub mod backend;
pub mod config;
pub mod core;
pub mod protocol;
pub mod transport;

pub use crate::core::{
    error::{DfuError, DispatchError, PreflightError},
    types::{Command, ExitStatus, ParsedInvocation, UpdateRequest},
};
