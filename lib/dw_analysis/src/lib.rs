//! This crate provides the type propagation and devirtualization passes of
//! the `DroidWorks` optimizer, working on the `dw_ir` SSA representation.
//!
//! A [`repo::Repo`] gathers the class hierarchy of the analyzed program and of
//! its libraries. [`typing::TypeAnalysis`] computes a type for every SSA value
//! of a method, and [`devirt::Devirtualizer`] uses these types to rewrite
//! virtual and interface invocations to more specific targets.

mod options;
#[cfg(test)]
mod testing;

pub mod devirt;
pub mod errors;
pub mod hierarchy;
pub mod repo;
pub mod typing;

pub use crate::options::Options;

use crate::devirt::{DevirtStats, Devirtualizer};
use crate::errors::AnalysisResult;
use crate::repo::{Method, Repo};
use crate::typing::TypeAnalysis;
use dw_ir::Code;

/// Computes the types of every value of `code`, the body of `method`.
pub fn infer_types(
    method: &Method,
    code: &mut Code,
    repo: &Repo,
    options: Options,
) -> AnalysisResult<()> {
    TypeAnalysis::new(repo, options).widen(method, method, code)
}

/// Types `code`, the body of `method`, and devirtualizes its invocations.
pub fn optimize(
    method: &Method,
    code: &mut Code,
    repo: &Repo,
    options: Options,
) -> AnalysisResult<DevirtStats> {
    infer_types(method, code, repo, options)?;
    Devirtualizer::new(repo, options).devirtualize(method, code)
}
