//! Command line parsing.
//!
//! The historical single-dash flags (`-add`, `-int`, `-cob`) are accepted
//! alongside their `--` forms. Anything unrecognized is collected in
//! [`BridgeArgs::ignored`] for the caller to report, never rejected.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

/// Command line arguments.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "thermpdo")]
#[command(about = "Reads a DS1621 thermometer over I2C and emits its temperature as a CAN PDO")]
#[command(version)]
pub struct BridgeArgs {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// DS1621 I2C address (default is 0x48).
    #[arg(long = "add", value_name = "ADDR", value_parser = parse_int::<u8>)]
    pub address: Option<u8>,

    /// Interval between PDOs in seconds (default is 10).
    #[arg(long = "int", value_name = "SECS")]
    pub interval: Option<f64>,

    /// COB-ID of the PDO to emit (default is 0x1AB).
    #[arg(long = "cob", value_name = "ID", value_parser = parse_int::<u16>)]
    pub cob_id: Option<u16>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Arguments that were not understood.
    #[arg(skip)]
    pub ignored: Vec<String>,
}

/// Flags taking a value, with the canonical long form they map to.
const VALUE_FLAGS: &[(&str, &str)] = &[
    ("-add", "--add"),
    ("--add", "--add"),
    ("-int", "--int"),
    ("--int", "--int"),
    ("-cob", "--cob"),
    ("--cob", "--cob"),
    ("-c", "--config"),
    ("--config", "--config"),
    ("--log-level", "--log-level"),
];

const SWITCHES: &[&str] = &["-h", "--help", "-V", "--version"];

impl BridgeArgs {
    /// Configuration file looked up when `--config` is not given.
    pub const DEFAULT_CONFIG: &'static str = "thermpdo.json5";

    /// Parse the process arguments, exiting on `--help`, `--version` or a
    /// malformed value.
    pub fn from_env() -> Self {
        Self::try_from_args(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse an argument list (first item is the program name).
    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = args
            .into_iter()
            .map(|arg| arg.into().to_string_lossy().into_owned());
        let (known, ignored) = split_args(args);

        let mut parsed = <Self as Parser>::try_parse_from(known)?;
        parsed.ignored = ignored;
        Ok(parsed)
    }
}

/// Rewrite known flags to `--flag=value` and set aside everything else.
fn split_args(args: impl IntoIterator<Item = String>) -> (Vec<String>, Vec<String>) {
    let mut args = args.into_iter();
    let mut known = Vec::new();
    let mut ignored = Vec::new();

    if let Some(program) = args.next() {
        known.push(program);
    }

    while let Some(arg) = args.next() {
        if SWITCHES.contains(&arg.as_str()) {
            known.push(arg);
            continue;
        }

        let (flag, inline_value) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };

        let Some((_, long)) = VALUE_FLAGS.iter().find(|(alias, _)| *alias == flag) else {
            ignored.push(arg);
            continue;
        };

        // `=` keeps values such as "-5" from being read as flags
        match inline_value.or_else(|| args.next()) {
            Some(value) => known.push(format!("{}={}", long, value)),
            None => ignored.push(arg),
        }
    }

    (known, ignored)
}

/// Parse an integer with an optional `0x`, `0o` or `0b` radix prefix.
pub fn parse_int<T: TryFrom<u64>>(input: &str) -> Result<T, String> {
    let text = input.trim();
    let lower = text.to_ascii_lowercase();

    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(octal) = lower.strip_prefix("0o") {
        (octal, 8)
    } else if let Some(binary) = lower.strip_prefix("0b") {
        (binary, 2)
    } else {
        (lower.as_str(), 10)
    };

    let value = u64::from_str_radix(digits, radix)
        .map_err(|e| format!("invalid integer '{}': {}", text, e))?;
    T::try_from(value).map_err(|_| format!("{} is out of range", text))
}
