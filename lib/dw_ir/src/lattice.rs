//! Abstract type elements attached to SSA values.
//!
//! This module only defines the element data and the operations that do not
//! depend on a class hierarchy. Ordering, join and meet over class types need
//! subtyping information and are provided by the analysis crate.

use crate::types::Type;
use std::collections::BTreeSet;
use std::fmt;

/// Nullability of a reference value.
///
/// `DefinitelyNull` and `DefinitelyNotNull` are both below `MaybeNull`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Nullability {
    DefinitelyNull,
    MaybeNull,
    DefinitelyNotNull,
}

impl Nullability {
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::MaybeNull
        }
    }

    /// Greatest lower bound, `None` when both facts contradict each other.
    #[must_use]
    pub fn meet(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Self::MaybeNull, x) | (x, Self::MaybeNull) => Some(x),
            _ => None,
        }
    }

    #[must_use]
    pub fn less_or_equal(self, other: Self) -> bool {
        self == other || other == Self::MaybeNull
    }

    #[must_use]
    pub const fn is_definitely_not_null(self) -> bool {
        matches!(self, Self::DefinitelyNotNull)
    }
}

impl fmt::Display for Nullability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DefinitelyNull => write!(f, "@Null"),
            Self::MaybeNull => write!(f, "@Nullable"),
            Self::DefinitelyNotNull => write!(f, "@NotNull"),
        }
    }
}

/// Primitive kinds as seen by registers: sub-word integers are all `Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveKind {
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    #[must_use]
    pub const fn from_type(t: &Type) -> Option<Self> {
        match t {
            Type::Boolean | Type::Byte | Type::Short | Type::Char | Type::Int => Some(Self::Int),
            Type::Long => Some(Self::Long),
            Type::Float => Some(Self::Float),
            Type::Double => Some(Self::Double),
            Type::Void | Type::Array(_, _) | Type::Class(_) => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
        }
    }
}

/// Innermost element type of an array element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArrayBase {
    /// Exact primitive type (`byte[]` and `int[]` are different types).
    Primitive(Type),
    /// Non-empty antichain of class names, as in [`TypeElement::Class`].
    Reference(BTreeSet<String>),
}

impl fmt::Display for ArrayBase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Primitive(t) => write!(f, "{t}"),
            Self::Reference(types) => fmt_class_set(f, types),
        }
    }
}

/// An element of the type lattice.
///
/// `Bottom` is below everything and `Top` above everything. A class element
/// holds a non-empty antichain of class (or interface) names, the value being
/// a subtype of every one of them, together with its nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeElement {
    Bottom,
    Top,
    Null,
    Primitive(PrimitiveKind),
    Array {
        dimensions: usize,
        base: ArrayBase,
        nullability: Nullability,
    },
    Class {
        types: BTreeSet<String>,
        nullability: Nullability,
    },
}

impl fmt::Display for TypeElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Bottom => write!(f, "⊥"),
            Self::Top => write!(f, "⊤"),
            Self::Null => write!(f, "null"),
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Array {
                dimensions,
                base,
                nullability,
            } => {
                for _ in 0..*dimensions {
                    write!(f, "[")?;
                }
                write!(f, "{base} {nullability}")
            }
            Self::Class { types, nullability } => {
                fmt_class_set(f, types)?;
                write!(f, " {nullability}")
            }
        }
    }
}

fn fmt_class_set(f: &mut fmt::Formatter, types: &BTreeSet<String>) -> fmt::Result {
    if types.len() == 1 {
        if let Some(t) = types.iter().next() {
            return write!(f, "L{t};");
        }
    }
    write!(f, "{{")?;
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "L{t};")?;
    }
    write!(f, "}}")
}

impl TypeElement {
    /// Builds the most precise element for a declared type.
    ///
    /// `void` has no value and maps to `Bottom`.
    #[must_use]
    pub fn from_type(t: &Type, nullability: Nullability) -> Self {
        match t {
            Type::Void => Self::Bottom,
            Type::Class(name) => Self::class(name, nullability),
            Type::Array(dimensions, inner) => {
                let base = match inner.as_ref() {
                    Type::Class(name) => ArrayBase::Reference(BTreeSet::from([name.clone()])),
                    other => ArrayBase::Primitive(other.clone()),
                };
                Self::Array {
                    dimensions: *dimensions,
                    base,
                    nullability,
                }
            }
            primitive => PrimitiveKind::from_type(primitive).map_or(Self::Top, Self::Primitive),
        }
    }

    #[must_use]
    pub fn class(name: &str, nullability: Nullability) -> Self {
        Self::Class {
            types: BTreeSet::from([name.to_string()]),
            nullability,
        }
    }

    #[must_use]
    pub const fn is_bottom(&self) -> bool {
        matches!(self, Self::Bottom)
    }

    #[must_use]
    pub const fn is_top(&self) -> bool {
        matches!(self, Self::Top)
    }

    /// Precise types are all types but `Top`, which stands for conflicting
    /// facts.
    #[must_use]
    pub const fn is_precise(&self) -> bool {
        !self.is_top()
    }

    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Null | Self::Array { .. } | Self::Class { .. })
    }

    #[must_use]
    pub const fn nullability(&self) -> Option<Nullability> {
        match self {
            Self::Null => Some(Nullability::DefinitelyNull),
            Self::Array { nullability, .. } | Self::Class { nullability, .. } => {
                Some(*nullability)
            }
            Self::Bottom | Self::Top | Self::Primitive(_) => None,
        }
    }

    /// Returns the class names antichain of a class element.
    #[must_use]
    pub const fn class_names(&self) -> Option<&BTreeSet<String>> {
        if let Self::Class { types, .. } = self {
            Some(types)
        } else {
            None
        }
    }

    #[must_use]
    pub fn with_nullability(&self, nullability: Nullability) -> Self {
        match self {
            Self::Class { types, .. } => Self::Class {
                types: types.clone(),
                nullability,
            },
            Self::Array {
                dimensions, base, ..
            } => Self::Array {
                dimensions: *dimensions,
                base: base.clone(),
                nullability,
            },
            Self::Null if nullability.is_definitely_not_null() => Self::Bottom,
            other => other.clone(),
        }
    }

    /// The type of a reference once it is known not to be null.
    #[must_use]
    pub fn as_non_null(&self) -> Self {
        self.with_nullability(Nullability::DefinitelyNotNull)
    }

    /// The type read out of an array of this type.
    #[must_use]
    pub fn array_member_type(&self) -> Self {
        match self {
            Self::Array {
                dimensions, base, ..
            } if *dimensions > 1 => Self::Array {
                dimensions: dimensions - 1,
                base: base.clone(),
                nullability: Nullability::MaybeNull,
            },
            Self::Array { base, .. } => match base {
                ArrayBase::Primitive(t) => Self::from_type(t, Nullability::MaybeNull),
                ArrayBase::Reference(types) => Self::Class {
                    types: types.clone(),
                    nullability: Nullability::MaybeNull,
                },
            },
            Self::Bottom | Self::Null => Self::Bottom,
            _ => Self::Top,
        }
    }
}
