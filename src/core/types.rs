//! Domain types for command parsing and dispatch

use std::{fmt, path::PathBuf};

/// Top-level operation selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Version,
    Help,
    Scan,
    Dfu,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Version => "version",
            Command::Help => "help",
            Command::Scan => "scan",
            Command::Dfu => "dfu",
        };
        f.write_str(name)
    }
}

/// Named parameter that consumes exactly one following token as its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    PeripheralUuid,
    HexFile,
    IniFile,
}

impl Parameter {
    /// Canonical command-line spelling
    pub fn literal(self) -> &'static str {
        match self {
            Parameter::PeripheralUuid => "-uuid",
            Parameter::HexFile => "-hex",
            Parameter::IniFile => "-init",
        }
    }
}

/// A recognized command-line literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Command(Command),
    Parameter(Parameter),
}

/// Non-fatal problem found while tokenizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Token matched neither a command nor a parameter
    UnknownArgument(String),
    /// Parameter literal was the last token
    MissingValue(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
            Diagnostic::MissingValue(literal) => write!(f, "{literal} needs a value"),
        }
    }
}

/// Result of tokenizing the raw argument list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInvocation {
    pub command: Option<Command>,
    pub peripheral_uuid: Option<String>,
    pub hex_path: Option<PathBuf>,
    pub init_path: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything the update collaborator needs to flash one peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub peripheral_uuid: String,
    pub hex_path: PathBuf,
    pub init_path: Option<PathBuf>,
}

impl fmt::Display for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\tuuid: {}", self.peripheral_uuid)?;
        write!(f, "\thex:  {}", self.hex_path.display())?;
        if let Some(init_path) = &self.init_path {
            write!(f, "\n\tinit: {}", init_path.display())?;
        }
        Ok(())
    }
}

/// Process exit status reported by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}
