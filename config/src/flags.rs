//! # Command-Line Flags
//!
//! Flags are registered against the working configuration tree, so every
//! flag advertises the value a user gets by leaving the setting out of the
//! document. Only flags given on the command line are copied back into the
//! tree; defaults never overwrite document content.
//!
//! Flag names are a compatibility surface. The Go-style single dash form
//! (`-config.file`) is accepted and rewritten to `--config.file` before
//! parsing.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::time::Duration;

/// A part of the configuration tree that can be set from flags.
pub trait RegisterFlags {
    /// Add this part's flags to `cmd`, using the current values as defaults.
    fn register_flags(&self, cmd: Command) -> Command;

    /// Copy every flag explicitly given on the command line into `self`.
    fn apply_flags(&mut self, matches: &ArgMatches);
}

/// Value of flag `id` if it was given on the command line.
pub fn explicit<T>(matches: &ArgMatches, id: &str) -> Option<T>
where
    T: Clone + Send + Sync + 'static
{
    match matches.value_source(id) {
        Some(ValueSource::CommandLine) => matches.get_one::<T>(id).cloned(),
        _ => None
    }
}

pub(crate) fn string_flag(id: &'static str, help: &'static str, default: impl Into<String>) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .value_name("string")
        .default_value(default.into())
        .action(ArgAction::Set)
}

pub(crate) fn port_flag(id: &'static str, help: &'static str, default: u16) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .value_name("port")
        .default_value(default.to_string())
        .value_parser(clap::value_parser!(u16))
        .action(ArgAction::Set)
}

pub(crate) fn duration_flag(id: &'static str, help: &'static str, default: Duration) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .value_name("duration")
        .default_value(humantime::format_duration(default).to_string())
        .value_parser(humantime::parse_duration)
        .action(ArgAction::Set)
}

/// Boolean flag accepting `--flag`, `--flag=true` and `--flag=false`.
pub(crate) fn bool_flag(id: &'static str, help: &'static str, default: bool) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .num_args(0..=1)
        .require_equals(true)
        .default_missing_value("true")
        .default_value(if default { "true" } else { "false" })
        .value_parser(clap::value_parser!(bool))
        .action(ArgAction::Set)
}

/// Rewrite single dash long flags (`-config.file=x`) into the double dash
/// form clap expects. Arguments after `--`, unknown flags and arguments that
/// are not valid UTF-8 are left alone.
pub fn normalize_args<I, T>(cmd: &Command, args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>
{
    let longs: BTreeSet<&str> = cmd.get_arguments().filter_map(Arg::get_long).collect();
    let mut terminated = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if terminated {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                terminated = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if longs.contains(name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg
            }
        })
        .collect()
}
