use crate::analysis;
use crate::analysis::errors::AnalysisError;
use crate::prelude::*;
use clap::ArgMatches;
use dw_ir::MethodDef;
use nu_ansi_term::Color;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;

pub fn run(args: &ArgMatches) -> DwResult<()> {
    init_logger(args);

    let (mut program, repo) = load_repo(args)?;
    let filter = MethodFilter::from_args(args)?;
    let options = options(args);
    let quiet = args.get_flag("quiet");

    // (class index, method index) of every method to rewrite
    let jobs: Vec<(usize, usize)> = program
        .classes
        .iter()
        .enumerate()
        .flat_map(|(class_index, class)| {
            class
                .methods
                .iter()
                .enumerate()
                .filter(|(_, method_def)| {
                    method_def.code.is_some() && filter.matches(&method_def.descriptor)
                })
                .map(move |(method_index, _)| (class_index, method_index))
        })
        .collect();
    let results: Vec<DwResult<(Code, DevirtStats)>> = jobs
        .par_iter()
        .map(|&(class_index, method_index)| {
            optimize_method(
                &repo,
                &program.classes[class_index].methods[method_index],
                options,
            )
        })
        .collect();

    let mut total = DevirtStats::default();
    let mut nb_success = 0;
    let mut nb_fails = 0;
    let mut last_res = Ok(());

    for ((class_index, method_index), result) in jobs.into_iter().zip(results) {
        let method_def = &mut program.classes[class_index].methods[method_index];
        match result {
            Ok((code, stats)) => {
                if !quiet && !stats.is_empty() {
                    print_rewritten(method_def, &code);
                }
                total += stats;
                method_def.code = Some(code);
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
        "devirtualized methods: {} / {}",
        nb_success,
        nb_success + nb_fails
    );
    log::info!("{total}");

    if let Some(output_fname) = args.get_one::<String>("output") {
        let mut file = File::create(output_fname)?;
        file.write_all(program.to_string().as_bytes())?;
        log::info!("rewritten program written in {:?}", output_fname);
    }

    last_res
}

fn optimize_method(
    repo: &Repo,
    method_def: &MethodDef,
    options: Options,
) -> DwResult<(Code, DevirtStats)> {
    let method = repo
        .find_method_by_descriptor(&method_def.descriptor)
        .ok_or_else(|| AnalysisError::MethodNotFound(method_def.descriptor.to_string()))?;
    let mut code = method_def.code.clone().ok_or(AnalysisError::NoCode)?;
    log::debug!("devirtualizing {}", method.descriptor());
    let stats = analysis::optimize(method, &mut code, repo, options)?;
    Ok((code, stats))
}

/// Prints the rewritten body, new lines being highlighted.
fn print_rewritten(method_def: &MethodDef, code: &Code) {
    let original = method_def
        .code
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let before: BTreeSet<&str> = original.lines().collect();

    println!("[*] {}", method_def.descriptor);
    for line in code.to_string().lines() {
        if before.contains(line) {
            println!("{line}");
        } else {
            println!("{}", Color::Green.paint(line));
        }
    }
}
