//! Command-line argument tokenizing
//!
//! The grammar is positional and lenient: single-dash long parameters
//! (`-uuid`, `-hex`, `-init`), bare command words, and diagnostics instead of
//! hard errors for anything unexpected.

use std::path::Path;

use tracing::debug;

use crate::core::{
    error::ParseError,
    types::{Command, Diagnostic, Parameter, ParsedInvocation, Token},
};

/// Usage text printed by the help command
pub const USAGE: &str = "\
Usage: bluefruit <command> [options]

Commands:
  -v, --version        Show version information
  -h, --help           Show this help
  scan                 Scan for peripherals until Enter is pressed
  dfu                  Update the firmware of a peripheral

Options:
  -uuid <identifier>   Peripheral identifier (prompted for when omitted)
  -hex <file>          Firmware image in Intel HEX format (required for dfu)
  -init <file>         Init packet file for the firmware image

Environment:
  BLUEFRUIT_ADAPTER, BLUEFRUIT_INPUT_TIMEOUT, BLUEFRUIT_UPDATE_TIMEOUT,
  BLUEFRUIT_EXIT_POLICY, BLUEFRUIT_STRICT_COMMANDS, BLUEFRUIT_PACKET_NOTIFY";

const DEFAULT_LITERALS: &[(&str, Token)] = &[
    ("-v", Token::Command(Command::Version)),
    ("--version", Token::Command(Command::Version)),
    ("-h", Token::Command(Command::Help)),
    ("--help", Token::Command(Command::Help)),
    ("scan", Token::Command(Command::Scan)),
    ("dfu", Token::Command(Command::Dfu)),
    ("-uuid", Token::Parameter(Parameter::PeripheralUuid)),
    ("-hex", Token::Parameter(Parameter::HexFile)),
    ("-init", Token::Parameter(Parameter::IniFile)),
];

/// How raw arguments are compared against literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMatching {
    #[default]
    Insensitive,
    Sensitive,
}

/// Lookup table from literal spelling to token
#[derive(Debug, Clone)]
pub struct TokenTable {
    entries: Vec<(&'static str, Token)>,
    matching: CaseMatching,
}

impl TokenTable {
    /// Create a table with the standard literals
    pub fn new(matching: CaseMatching) -> Self {
        Self::with_entries(DEFAULT_LITERALS.to_vec(), matching)
    }

    /// Create a table with custom literals
    ///
    /// With [`CaseMatching::Insensitive`] literals must be lower-case.
    pub fn with_entries(entries: Vec<(&'static str, Token)>, matching: CaseMatching) -> Self {
        Self { entries, matching }
    }

    /// Resolve a raw argument to a token
    pub fn lookup(&self, raw: &str) -> Option<Token> {
        let folded;
        let key = match self.matching {
            CaseMatching::Insensitive => {
                folded = raw.to_lowercase();
                folded.as_str()
            }
            CaseMatching::Sensitive => raw,
        };

        self.entries
            .iter()
            .find(|(literal, _)| *literal == key)
            .map(|(_, token)| *token)
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::new(CaseMatching::default())
    }
}

/// Turns the raw argument list into a [`ParsedInvocation`]
#[derive(Debug, Clone, Default)]
pub struct ArgumentTokenizer {
    table: TokenTable,
    strict: bool,
}

impl ArgumentTokenizer {
    /// Create a tokenizer over the given literal table
    pub fn new(table: TokenTable) -> Self {
        Self {
            table,
            strict: false,
        }
    }

    /// Reject invocations naming more than one distinct command
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Tokenize `args` (program path excluded), resolving file paths against `cwd`
    ///
    /// A parameter literal always consumes the next raw token as its value.
    /// Only strict mode can fail; everything else becomes a diagnostic.
    pub fn tokenize<S: AsRef<str>>(
        &self,
        args: &[S],
        cwd: &Path,
    ) -> Result<ParsedInvocation, ParseError> {
        let mut invocation = ParsedInvocation::default();
        let mut skip_next = false;

        for (index, arg) in args.iter().enumerate() {
            if skip_next {
                skip_next = false;
                continue;
            }

            let arg = arg.as_ref();
            match self.table.lookup(arg) {
                Some(Token::Command(command)) => {
                    match invocation.command {
                        Some(first) if self.strict && first != command => {
                            return Err(ParseError::ConflictingCommands {
                                first,
                                second: command,
                            });
                        }
                        _ => {}
                    }
                    debug!(%command, "command selected");
                    invocation.command = Some(command);
                }
                Some(Token::Parameter(parameter)) => {
                    let value = args.get(index + 1).map(|v| v.as_ref().to_string());
                    match value {
                        Some(_) => skip_next = true,
                        None => invocation
                            .diagnostics
                            .push(Diagnostic::MissingValue(parameter.literal().to_string())),
                    }

                    match parameter {
                        Parameter::PeripheralUuid => invocation.peripheral_uuid = value,
                        Parameter::HexFile => invocation.hex_path = value.map(|v| cwd.join(v)),
                        Parameter::IniFile => invocation.init_path = value.map(|v| cwd.join(v)),
                    }
                }
                None => {
                    debug!(argument = arg, "unrecognized argument");
                    invocation
                        .diagnostics
                        .push(Diagnostic::UnknownArgument(arg.to_string()));
                }
            }
        }

        Ok(invocation)
    }
}
