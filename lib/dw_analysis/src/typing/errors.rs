//! Typing errors definitions.

use dw_ir::lattice::TypeElement;
use dw_ir::{MethodDescr, ValueId};
use thiserror::Error;

/// An alias for result that can be a [`TypeError`].
pub type TypeResult<T> = Result<T, TypeError>;

/// The typing error type.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("precision loss on {value}: {from} became {to}")]
    PrecisionLoss {
        value: ValueId,
        from: TypeElement,
        to: TypeElement,
    },

    #[error("imprecise type {type_} computed for {value}")]
    ImpreciseType { value: ValueId, type_: TypeElement },

    /// Narrowing must never widen a type.
    #[error("narrowing of {value} from {from} to {to} is not monotone")]
    NotNarrower {
        value: ValueId,
        from: TypeElement,
        to: TypeElement,
    },

    #[error("argument #{index} does not exist in {method}")]
    ArgumentCount { index: usize, method: MethodDescr },
}
