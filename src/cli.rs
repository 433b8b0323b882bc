//! Main `dwopt` binary command line arguments options.
//!
//! This module declares a function to build `clap` command line arguments
//! parser, so that it can be used from other places than the main binary,
//! such as from bash completion file generator.

use clap::{value_parser, Arg, ArgAction, Command};
use clap_complete::Shell;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

fn arg_debug() -> Arg {
    Arg::new("debug")
        .short('d')
        .long("debug")
        .action(ArgAction::SetTrue)
        .help("Activate debug mode")
}

fn arg_verbose() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("Activate verbose mode")
}

fn arg_ecslog() -> Arg {
    Arg::new("ecslog")
        .short('e')
        .long("ecslog")
        .action(ArgAction::SetTrue)
        .help("Output logs in ECS format")
}

fn arg_input() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .action(ArgAction::Set)
        .required(true)
        .help("Input program file")
}

fn arg_system() -> Arg {
    Arg::new("system")
        .short('s')
        .long("system")
        .action(ArgAction::Set)
        .help("Additional library classes program file")
}

fn arg_output(help: &str) -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .action(ArgAction::Set)
        .help(help.to_string())
}

fn arg_filter_class() -> Arg {
    Arg::new("filter-class")
        .long("filter-class")
        .action(ArgAction::Set)
        .help("Class(es) regex filter")
}

fn arg_filter_method() -> Arg {
    Arg::new("filter-method")
        .long("filter-method")
        .action(ArgAction::Set)
        .help("Method(s) regex filter")
}

fn arg_imprecise() -> Arg {
    Arg::new("imprecise")
        .long("imprecise")
        .action(ArgAction::SetTrue)
        .help("Tolerate imprecise (top) types")
}

#[must_use]
pub fn dwopt() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .author(AUTHORS)
        .about(DESCRIPTION)
        .subcommand(devirt())
        .subcommand(types())
        .subcommand(
            Command::new("gen-completions")
                .about("Generates completions file")
                .arg(
                    Arg::new("shell")
                        .short('s')
                        .long("shell")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(Shell))
                        .required(true)
                        .help("Shell type for completion generation"),
                ),
        )
}

#[must_use]
pub fn devirt() -> Command {
    Command::new("devirt")
        .bin_name("dw-devirt")
        .version(VERSION)
        .author(AUTHORS)
        .about("Devirtualizes method invocations")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_system())
        .arg(arg_output("Output program file"))
        .arg(arg_filter_class())
        .arg(arg_filter_method())
        .arg(arg_imprecise())
        .arg(
            Arg::new("no-rebind")
                .long("no-rebind")
                .action(ArgAction::SetTrue)
                .help("Do not rebind invoke-virtual instructions"),
        )
        .arg(
            Arg::new("no-interface")
                .long("no-interface")
                .action(ArgAction::SetTrue)
                .help("Do not devirtualize invoke-interface instructions"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Do not print rewritten methods"),
        )
}

#[must_use]
pub fn types() -> Command {
    Command::new("types")
        .bin_name("dw-types")
        .version(VERSION)
        .author(AUTHORS)
        .about("Prints the types computed for SSA values")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_system())
        .arg(arg_filter_class())
        .arg(arg_filter_method())
        .arg(arg_imprecise())
}
