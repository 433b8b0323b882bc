//! Analysis errors definition.

use crate::typing::errors::TypeError;
use dw_ir::errors::IrError;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("the method has no implementation")]
    NoCode,

    #[error("typing error: {0}")]
    Type(#[from] TypeError),
}
