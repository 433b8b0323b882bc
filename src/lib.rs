//! # `dwopt`
//!
//! `dwopt` is the entry crate of the `DroidWorks` optimizer. It computes
//! precise types for the SSA values of Dalvik methods and uses them to
//! devirtualize method invocations. The work is split into two sub-crates,
//! `dwopt` re-exports their most used items in the `dwopt::prelude`
//! namespace.
//!
//! ## Library basics
//!
//! Programs are read from their textual SSA form, then registered into a
//! `Repo` that answers class hierarchy queries:
//!
//! ```rust,no_run
//! use dwopt::prelude::*;
//!
//! let program = dwopt::ir::open("app.dwir")?;
//! let mut repository = Repo::new();
//! repository.register_program(&program, false)?;
//! repository.close_hierarchy()?;
//! println!("classes count: {}", repository.nb_classes());
//! println!("methods count: {}", repository.nb_methods());
//! # Ok::<(), DwError>(())
//! ```
//!
//! Each method body can then be typed, or typed and devirtualized:
//!
//! ```rust,no_run
//! use dwopt::prelude::*;
//!
//! # let program = dwopt::ir::open("app.dwir")?;
//! # let mut repository = Repo::new();
//! # repository.register_program(&program, false)?;
//! # repository.close_hierarchy()?;
//! for (_, method_def) in program.methods_with_code() {
//!     let method = repository
//!         .find_method_by_descriptor(&method_def.descriptor)
//!         .ok_or_else(|| DwError::BadArguments(method_def.descriptor.to_string()))?;
//!     let mut code = method_def.code.clone().unwrap_or_default();
//!     let stats = dwopt::analysis::optimize(method, &mut code, &repository, Options::default())?;
//!     println!("{}: {stats}", method.descriptor());
//! }
//! # Ok::<(), DwError>(())
//! ```
//!
//! ## Sub-crates
//!
//!  - [`dw_ir`] contains the SSA representation, its textual format and the
//!    structural edits the passes rely on,
//!  - [`dw_analysis`] contains the class hierarchy repository, the type
//!    analysis and the devirtualizer.

mod errors;

pub mod cli;
pub mod dw_devirt;
pub mod dw_types;

pub use dw_analysis as analysis;
pub use dw_ir as ir;

/// Reexport module of commonly used structures and functions from `DroidWorks` project
/// sub-crates:
///
/// ```rust
/// use dwopt::prelude::*;
/// ```
pub mod prelude {
    pub use crate::errors::{DwError, DwResult};

    pub use dw_analysis::devirt::DevirtStats;
    pub use dw_analysis::repo::{Class, Method, Repo};
    pub use dw_analysis::typing::TypeAnalysis;
    pub use dw_analysis::Options;

    pub use dw_ir::lattice::TypeElement;
    pub use dw_ir::{Code, MethodDescr, Program};

    use clap::ArgMatches;
    use regex::Regex;

    pub fn init_logger(args: &ArgMatches) {
        let env = env_logger::Env::new()
            .filter_or("DW_LOG", "info")
            .write_style("DW_LOG_STYLE");

        let mut builder = env_logger::Builder::from_env(env);
        if args.get_flag("verbose") {
            builder.filter_level(log::LevelFilter::Trace);
        } else if args.get_flag("debug") {
            builder.filter_level(log::LevelFilter::Debug);
        }
        if args.get_flag("ecslog") {
            builder.format(ecs_logger::format);
        }
        builder.init();
    }

    /// Builds the repository from the `--input` program and the optional
    /// `--system` one, returning it along with the input program.
    pub fn load_repo(args: &ArgMatches) -> DwResult<(Program, Repo)> {
        let mut repo = Repo::new();
        if let Some(system_fname) = args.get_one::<String>("system") {
            let system = dw_ir::open(system_fname)?;
            repo.register_program(&system, true)?;
        }

        let input_fname = args
            .get_one::<String>("input")
            .ok_or_else(|| DwError::BadArguments("--input needed".to_string()))?;
        let input = dw_ir::open(input_fname)?;
        repo.register_program(&input, false)?;
        repo.close_hierarchy()?;
        log::info!(
            "{} classes, {} methods registered",
            repo.nb_classes(),
            repo.nb_methods()
        );
        Ok((input, repo))
    }

    /// Reads the run options from the command line flags. Flags a command
    /// does not declare keep their default value.
    #[must_use]
    pub fn options(args: &ArgMatches) -> Options {
        let flag = |name: &str| {
            args.try_get_one::<bool>(name)
                .ok()
                .flatten()
                .copied()
                .unwrap_or(false)
        };
        let mut options = Options::default();
        if flag("imprecise") {
            options = options.allow_imprecise_types();
        }
        if flag("no-rebind") {
            options = options.dont_rebind_virtual_invokes();
        }
        if flag("no-interface") {
            options = options.dont_devirtualize_interface_invokes();
        }
        options
    }

    /// Filters of the analyzed methods, from `--filter-class` and
    /// `--filter-method`.
    #[derive(Debug, Default)]
    pub struct MethodFilter {
        class_pattern: Option<Regex>,
        method_pattern: Option<Regex>,
    }

    impl MethodFilter {
        pub fn from_args(args: &ArgMatches) -> DwResult<Self> {
            let class_pattern = args
                .get_one::<String>("filter-class")
                .map(|r| Regex::new(r))
                .transpose()?;
            let method_pattern = args
                .get_one::<String>("filter-method")
                .map(|r| Regex::new(r))
                .transpose()?;
            Ok(Self {
                class_pattern,
                method_pattern,
            })
        }

        #[must_use]
        pub fn matches(&self, descriptor: &MethodDescr) -> bool {
            self.class_pattern
                .as_ref()
                .map_or(true, |r| r.is_match(descriptor.definer()))
                && self
                    .method_pattern
                    .as_ref()
                    .map_or(true, |r| r.is_match(descriptor.name()))
        }
    }
}
