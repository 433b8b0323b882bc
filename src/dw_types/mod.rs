use crate::analysis;
use crate::analysis::errors::AnalysisError;
use crate::prelude::*;
use clap::ArgMatches;
use dw_ir::MethodDef;
use rayon::prelude::*;

pub fn run(args: &ArgMatches) -> DwResult<()> {
    init_logger(args);

    let (program, repo) = load_repo(args)?;
    let filter = MethodFilter::from_args(args)?;
    let options = options(args);

    let methods: Vec<&MethodDef> = program
        .methods_with_code()
        .map(|(_, method_def)| method_def)
        .filter(|method_def| filter.matches(&method_def.descriptor))
        .collect();
    let results: Vec<DwResult<Code>> = methods
        .par_iter()
        .map(|method_def| type_method(&repo, method_def, options))
        .collect();

    let mut nb_success = 0;
    let mut nb_fails = 0;
    let mut last_res = Ok(());

    for (method_def, result) in methods.iter().zip(results) {
        match result {
            Ok(code) => {
                println!("[*] {}", method_def.descriptor);
                for value in code.values() {
                    match value.local() {
                        Some(local) => println!("    {}[{local}]: {}", value.id(), value.type_()),
                        None => println!("    {}: {}", value.id(), value.type_()),
                    }
                }
                nb_success += 1;
            }
            Err(err) => {
                log::error!("{}: {err}", method_def.descriptor);
                nb_fails += 1;
                last_res = Err(err);
            }
        }
    }

    log::info!("");
    log::info!(
        "typed methods: {} / {}",
        nb_success,
        nb_success + nb_fails
    );

    last_res
}

fn type_method(repo: &Repo, method_def: &MethodDef, options: Options) -> DwResult<Code> {
    let method = repo
        .find_method_by_descriptor(&method_def.descriptor)
        .ok_or_else(|| AnalysisError::MethodNotFound(method_def.descriptor.to_string()))?;
    let mut code = method_def.code.clone().ok_or(AnalysisError::NoCode)?;
    log::debug!("typing {}", method.descriptor());
    analysis::infer_types(method, &mut code, repo, options)?;
    Ok(code)
}
