//! SSA instructions kinds.

use crate::descriptors::{FieldDescr, MethodDescr};
use crate::types::Type;
use crate::InstrId;
use std::fmt;

/// Dispatch kind of a method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvokeKind {
    Virtual,
    Interface,
    Static,
    Direct,
    Super,
}

impl InvokeKind {
    #[must_use]
    pub const fn has_receiver(self) -> bool {
        !matches!(self, Self::Static)
    }

    #[must_use]
    pub const fn opcode(self) -> &'static str {
        match self {
            Self::Virtual => "invoke-virtual",
            Self::Interface => "invoke-interface",
            Self::Static => "invoke-static",
            Self::Direct => "invoke-direct",
            Self::Super => "invoke-super",
        }
    }

    #[must_use]
    pub fn from_opcode(opcode: &str) -> Option<Self> {
        match opcode {
            "invoke-virtual" => Some(Self::Virtual),
            "invoke-interface" => Some(Self::Interface),
            "invoke-static" => Some(Self::Static),
            "invoke-direct" => Some(Self::Direct),
            "invoke-super" => Some(Self::Super),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Null,
    Class(Type),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "const {n}"),
            Self::Long(n) => write!(f, "const-wide {n}"),
            Self::Float(x) => write!(f, "const-float {x:?}"),
            Self::Double(x) => write!(f, "const-double {x:?}"),
            Self::String(s) => write!(f, "const-string {s:?}"),
            Self::Null => write!(f, "const-null"),
            Self::Class(t) => write!(f, "const-class {t}"),
        }
    }
}

/// The closed set of instructions the SSA form is made of.
///
/// Operand values are not part of the kind, they are stored in the
/// [`Instruction`](crate::Instruction) itself.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    /// Pseudo instruction defining the n-th argument, receiver included.
    Argument,
    Const(Constant),
    NewInstance(String),
    NewArray(Type),
    CheckCast(Type),
    InstanceOf(Type),
    ArrayLength,
    ArrayGet,
    Move,
    /// Refines its operand to a non-null value. The origin is the instruction
    /// that justifies the assumption, for instance an invoke on the operand.
    AssumeNonNull { origin: Option<InstrId> },
    Invoke { kind: InvokeKind, method: MethodDescr },
    InstanceGet(FieldDescr),
    StaticGet(FieldDescr),
    If,
    Goto,
    Return,
    Throw,
}

impl InstrKind {
    /// Whether the out value type only depends on the instruction itself and
    /// never on the types of its operands.
    #[must_use]
    pub const fn has_invariant_out_type(&self) -> bool {
        matches!(
            self,
            Self::Argument
                | Self::Const(_)
                | Self::NewInstance(_)
                | Self::NewArray(_)
                | Self::InstanceOf(_)
                | Self::ArrayLength
                | Self::Invoke { .. }
                | Self::InstanceGet(_)
                | Self::StaticGet(_)
        )
    }

    #[must_use]
    pub const fn can_throw(&self) -> bool {
        matches!(
            self,
            Self::NewInstance(_)
                | Self::NewArray(_)
                | Self::CheckCast(_)
                | Self::ArrayLength
                | Self::ArrayGet
                | Self::Invoke { .. }
                | Self::InstanceGet(_)
                | Self::StaticGet(_)
                | Self::Throw
        )
    }

    #[must_use]
    pub const fn is_invoke_interface(&self) -> bool {
        matches!(
            self,
            Self::Invoke {
                kind: InvokeKind::Interface,
                ..
            }
        )
    }

    #[must_use]
    pub const fn is_invoke_virtual(&self) -> bool {
        matches!(
            self,
            Self::Invoke {
                kind: InvokeKind::Virtual,
                ..
            }
        )
    }

    #[must_use]
    pub const fn is_check_cast(&self) -> bool {
        matches!(self, Self::CheckCast(_))
    }

    /// Returns the invoked method of invoke instructions.
    #[must_use]
    pub const fn invoked_method(&self) -> Option<&MethodDescr> {
        if let Self::Invoke { method, .. } = self {
            Some(method)
        } else {
            None
        }
    }

    #[must_use]
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Argument => "argument",
            Self::Const(Constant::Int(_)) => "const",
            Self::Const(Constant::Long(_)) => "const-wide",
            Self::Const(Constant::Float(_)) => "const-float",
            Self::Const(Constant::Double(_)) => "const-double",
            Self::Const(Constant::String(_)) => "const-string",
            Self::Const(Constant::Null) => "const-null",
            Self::Const(Constant::Class(_)) => "const-class",
            Self::NewInstance(_) => "new-instance",
            Self::NewArray(_) => "new-array",
            Self::CheckCast(_) => "check-cast",
            Self::InstanceOf(_) => "instance-of",
            Self::ArrayLength => "array-length",
            Self::ArrayGet => "aget",
            Self::Move => "move",
            Self::AssumeNonNull { .. } => "assume-non-null",
            Self::Invoke { kind, .. } => kind.opcode(),
            Self::InstanceGet(_) => "iget",
            Self::StaticGet(_) => "sget",
            Self::If => "if",
            Self::Goto => "goto",
            Self::Return => "return",
            Self::Throw => "throw",
        }
    }
}
