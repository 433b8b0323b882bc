//! SSA intermediate representation of Dalvik/Java methods.
//!
//! Methods are made of basic blocks of SSA instructions. Every value carries
//! a [`TypeElement`](lattice::TypeElement) that analyses may refine. Programs
//! can be read from (and printed to) a smali-like textual format, see
//! [`text`].

mod descriptors;
mod dominators;
mod program;

pub mod code;
pub mod errors;
pub mod flags;
pub mod instrs;
pub mod lattice;
pub mod text;
pub mod types;

pub use crate::code::{Block, BlockId, Code, Definition, InstrId, Instruction, Value, ValueId};
pub use crate::descriptors::{FieldDescr, MethodDescr};
pub use crate::dominators::{DominatorTree, LazyDominatorTree};
pub use crate::program::{ClassDef, MethodDef, Program};
pub use crate::text::parse_program as parse;
pub use crate::types::Type;

use crate::errors::IrResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads and parses a program file.
pub fn open<P: AsRef<Path>>(path: P) -> IrResult<Program> {
    log::debug!("opening {}", path.as_ref().display());
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let program = parse(&content)?;
    log::debug!("{} class(es) read", program.classes.len());
    Ok(program)
}
