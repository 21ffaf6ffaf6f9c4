//! Command-line interface for collector_launch

use crate::config::{translate_override, SourceList, SourceLocator};
use argh::{EarlyExit, FromArgs};
use std::path::Path;

/// Launch a telemetry collector from layered configuration sources
#[derive(FromArgs, Debug)]
pub struct CollectorArgs {
    /// configuration source: a file path or scheme:payload (repeatable, later wins)
    #[argh(option, short = 'c')]
    pub config: Vec<String>,

    /// override a property, e.g. processors.batch.timeout=2s (repeatable, applied after --config)
    #[argh(option, from_str_fn(parse_set_flag))]
    pub set: Vec<SourceLocator>,

    /// validate the configuration, print the service plan and exit
    #[argh(switch)]
    pub dry_run: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,

    /// print the version and exit
    #[argh(switch, short = 'V')]
    pub version: bool,
}

/// Translate `--set path=value` into an inline YAML layer
fn parse_set_flag(s: &str) -> Result<SourceLocator, String> {
    translate_override(s).map_err(|e| format!("invalid --set '{}': {}", s, e))
}

/// Split `--flag=value` into `--flag value`; arguments after `--` are left alone
fn split_long_assignments(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    for arg in iter.by_ref() {
        if arg == "--" {
            out.push(arg.clone());
            break;
        }
        match arg.strip_prefix("--").and_then(|flag| flag.split_once('=')) {
            Some((flag, value)) if !flag.is_empty() => {
                out.push(format!("--{}", flag));
                out.push(value.to_string());
            }
            _ => out.push(arg.clone()),
        }
    }
    out.extend(iter.cloned());
    out
}

impl CollectorArgs {
    /// Parse `args` (without the command name), accepting `--flag=value`
    pub fn parse(cmd: &str, args: &[String]) -> Result<Self, EarlyExit> {
        let args = split_long_assignments(args);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Self::from_args(&[cmd], &args)
    }

    /// Parse the process arguments, exiting on `--help` or a usage error
    pub fn from_env() -> Self {
        let strings: Vec<String> = std::env::args().collect();
        let cmd = strings
            .first()
            .and_then(|s| Path::new(s).file_name())
            .and_then(|s| s.to_str())
            .unwrap_or(env!("CARGO_PKG_NAME"))
            .to_string();
        let rest = strings.get(1..).unwrap_or_default();

        match Self::parse(&cmd, rest) {
            Ok(args) => args,
            Err(EarlyExit { output, status }) => match status {
                Ok(()) => {
                    println!("{}", output);
                    std::process::exit(0);
                }
                Err(()) => {
                    eprintln!("{}\nRun {} --help for more information.", output, cmd);
                    std::process::exit(1);
                }
            },
        }
    }

    /// Configuration sources in resolution order
    pub fn source_list(&self) -> SourceList {
        let mut sources = SourceList::new();
        for config in &self.config {
            sources.add(config);
        }
        for locator in &self.set {
            sources.push_override(locator.clone());
        }
        sources
    }
}
