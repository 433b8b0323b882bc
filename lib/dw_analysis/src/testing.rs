//! Helpers shared by unit tests.

use crate::repo::Repo;
use dw_ir::{Code, Program};

pub(crate) fn repo_from(text: &str) -> Repo {
    let program = dw_ir::parse(text).unwrap();
    repo_of(&program)
}

pub(crate) fn repo_of(program: &Program) -> Repo {
    let mut repo = Repo::new();
    repo.register_program(program, false).unwrap();
    repo.close_hierarchy().unwrap();
    repo
}

/// Extracts the body of `class_name.method_name`.
pub(crate) fn code_of(program: &Program, class_name: &str, method_name: &str) -> Code {
    program
        .class(class_name)
        .and_then(|class| class.method(method_name))
        .and_then(|method| method.code.clone())
        .unwrap()
}
