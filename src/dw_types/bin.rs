use dwopt::prelude::DwResult;
use dwopt::{cli, dw_types};

fn main() -> DwResult<()> {
    let args = cli::types().get_matches();
    dw_types::run(&args)
}
