//! # Configuration Loader
//!
//! Builds the agent configuration from its three layers:
//!
//! 1. compiled defaults ([`Config::default`])
//! 2. the configuration document named by `-config.file`
//! 3. flags given on the command line
//!
//! Later layers win. Flags are parsed once and applied in two passes: the
//! discover pass finds the document and seeds the tree before loading, the
//! override pass re-applies explicit flags on top of the loaded document.
//! The merged tree is then resolved with [`Config::apply_defaults`].
//!
//! ## Usage
//! ```rust,no_run
//! use agent_config::{LoadOutcome, load};
//!
//! match load(["-config.file", "agent.yaml"]) {
//!     Ok(LoadOutcome::Ready(config)) => println!("{}", config.server.http_listen_port),
//!     Ok(LoadOutcome::Exit { code, message }) => {
//!         println!("{message}");
//!         std::process::exit(code);
//!     }
//!     Err(err) => eprintln!("{err}")
//! }
//! ```

use crate::config::Config;
use crate::decode;
use crate::error::{FileError, LoadError};
use crate::flags::{self, RegisterFlags};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use strum::Display;
use tracing::debug;

/// Steps of the resolution pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Init,
    DefaultsSeeded,
    FlagsRegistered,
    DocumentLoaded,
    FlagsReapplied,
    Migrated,
    CascadeApplied,
    Validated
}

/// The two times parsed flags are copied into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FlagPass {
    /// Before the document is read.
    Discover,
    /// After the document is read, so flags beat document values.
    Override
}

/// Result of a successful invocation.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The resolved configuration.
    Ready(Box<Config>),
    /// The invocation asked for version or help output instead of a
    /// configuration. The caller prints `message` and exits with `code`.
    Exit { code: i32, message: String }
}

/// Version string printed by `-version`.
pub fn version_info() -> String {
    format!("agent, version {}", env!("CARGO_PKG_VERSION"))
}

/// Resolve the configuration from `args` (without the program name),
/// reading the document from disk. Arguments need not be valid UTF-8.
pub fn load<I, T>(args: I) -> Result<LoadOutcome, LoadError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>
{
    load_with(args, decode::load_file)
}

/// Resolve the configuration from `args`, reading the document with
/// `loader`.
///
/// `loader` receives the document path, whether environment substitution
/// was requested and the working tree to decode into.
pub fn load_with<I, T, F>(args: I, loader: F) -> Result<LoadOutcome, LoadError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    F: FnOnce(&Path, bool, &mut Config) -> Result<(), FileError>
{
    debug!(stage = %Stage::Init, "loading configuration");
    let mut config = Config::default();
    debug!(stage = %Stage::DefaultsSeeded, "compiled defaults seeded");

    let cmd = command(&config);
    let args = flags::normalize_args(&cmd, args);
    let matches = match cmd.try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Ok(LoadOutcome::Exit {
                code: 0,
                message: err.render().to_string()
            });
        }
        Err(err) => return Err(LoadError::Flags(err))
    };
    debug!(stage = %Stage::FlagsRegistered, "flags parsed");

    if matches.get_one::<bool>("version").copied().unwrap_or(false) {
        return Ok(LoadOutcome::Exit {
            code: 0,
            message: version_info()
        });
    }

    apply_pass(&mut config, &matches, FlagPass::Discover);

    let Some(path) = matches.get_one::<PathBuf>("config.file").cloned() else {
        return Err(LoadError::MissingConfigFile);
    };
    let expand_env = matches
        .get_one::<bool>("config.expand-env")
        .copied()
        .unwrap_or(false);

    loader(&path, expand_env, &mut config).map_err(|source| LoadError::File {
        path: path.clone(),
        source
    })?;
    debug!(stage = %Stage::DocumentLoaded, path = %path.display(), expand_env, "document loaded");

    apply_pass(&mut config, &matches, FlagPass::Override);
    debug!(stage = %Stage::FlagsReapplied, "explicit flags reapplied");

    config.apply_defaults()?;
    Ok(LoadOutcome::Ready(Box::new(config)))
}

fn apply_pass(config: &mut Config, matches: &ArgMatches, pass: FlagPass) {
    config.apply_flags(matches);
    debug!(%pass, "applied explicit flags");
}

/// Every flag the agent understands, with `config`'s values as defaults.
fn command(config: &Config) -> Command {
    let cmd = Command::new("agent")
        .no_binary_name(true)
        .disable_version_flag(true)
        .about("Telemetry collection agent")
        .arg(
            Arg::new("config.file")
                .long("config.file")
                .help("configuration file to load")
                .value_name("path")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set)
        )
        .arg(flags::bool_flag(
            "config.expand-env",
            "expands ${var} in config according to the values of the environment variables",
            false
        ))
        .arg(flags::bool_flag("version", "show the version and exit", false));
    config.register_flags(cmd)
}
