use clap::ArgMatches;
use clap_complete::{generate, Shell};
use dwopt::prelude::*;
use dwopt::{cli, dw_devirt, dw_types};
use std::io;

fn main() -> DwResult<()> {
    let args = cli::dwopt().get_matches();

    match &args.subcommand() {
        Some(("devirt", cmd_args)) => dw_devirt::run(cmd_args),
        Some(("types", cmd_args)) => dw_types::run(cmd_args),
        Some(("gen-completions", sub_args)) => subcommand_gen_completions(sub_args),
        Some((subcommand, _)) => Err(DwError::BadArguments(format!(
            "unknown subcommand '{subcommand}'"
        ))),
        None => Err(DwError::BadArguments("missing subcommand".to_string())),
    }
}

fn subcommand_gen_completions(sub_args: &ArgMatches) -> DwResult<()> {
    let generator = *sub_args
        .get_one::<Shell>("shell")
        .ok_or_else(|| DwError::BadArguments("--shell needed".to_string()))?;
    let mut cmd = cli::dwopt();
    let cmd_name = cmd.get_name().to_string();
    generate(generator, &mut cmd, cmd_name, &mut io::stdout());
    Ok(())
}
