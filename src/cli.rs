//! Command-line definitions for `nowplaying-bridge`.

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

/// What the process should do after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Dispatch from a page capture file. `None` falls back to the config.
    Run { capture: Option<PathBuf> },
    /// Dispatch from the simulated player.
    Mock { seed: Option<u64> },
    /// Serve the local webhook sink. `None` falls back to the config.
    Sink { listen: Option<String> },
}

/// Global options plus the selected subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
    pub command: CliCommand,
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("nowplaying-bridge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Forward the music player's now-playing state to a webhook")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Config file to load instead of the default location"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log every tick at debug level"),
        )
        .subcommand(
            Command::new("run")
                .about("Dispatch snapshots read from a page capture file")
                .arg(
                    Arg::new("capture")
                        .long("capture")
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON page capture, re-read every tick"),
                ),
        )
        .subcommand(
            Command::new("mock")
                .about("Dispatch snapshots from a simulated player")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("N")
                        .value_parser(value_parser!(u64))
                        .help("Seed for a reproducible track sequence"),
                ),
        )
        .subcommand(
            Command::new("sink")
                .about("Serve the webhook sink and a now-playing page")
                .arg(
                    Arg::new("listen")
                        .long("listen")
                        .value_name("ADDR")
                        .help("Socket address to listen on, e.g. 127.0.0.1:8080"),
                ),
        )
}

/// Converts parsed matches into [`CliOptions`].
pub fn parse_matches(matches: &ArgMatches) -> Option<CliOptions> {
    let command = match matches.subcommand()? {
        ("run", sub) => CliCommand::Run {
            capture: sub.get_one::<PathBuf>("capture").cloned(),
        },
        ("mock", sub) => CliCommand::Mock {
            seed: sub.get_one::<u64>("seed").copied(),
        },
        ("sink", sub) => CliCommand::Sink {
            listen: sub.get_one::<String>("listen").cloned(),
        },
        _ => return None,
    };
    Some(CliOptions {
        config_path: matches.get_one::<PathBuf>("config").cloned(),
        verbose: matches.get_flag("verbose"),
        command,
    })
}
