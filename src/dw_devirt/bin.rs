use dwopt::prelude::DwResult;
use dwopt::{cli, dw_devirt};

fn main() -> DwResult<()> {
    let args = cli::devirt().get_matches();
    dw_devirt::run(&args)
}
