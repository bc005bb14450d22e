//! Core command flow module

pub mod barrier;
pub mod dispatcher;
pub mod error;
pub mod firmware;
pub mod input;
pub mod peripherals;
pub mod selector;
pub mod types;
