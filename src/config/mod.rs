//! Configuration module

pub mod cli;
pub mod settings;

pub use cli::{ArgumentTokenizer, CaseMatching, TokenTable, USAGE};
pub use settings::{EnvArgs, ExitPolicy, Settings};
