//! Method and field references.

use crate::types::Type;
use std::fmt;

/// A method reference: holder class, name and prototype.
///
/// The holder (`definer`) is kept as an internal class name. Two descriptors
/// with the same name and prototype but different holders designate the same
/// virtual slot, see [`MethodDescr::same_signature`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodDescr {
    definer: String,
    name: String,
    parameters_types: Vec<Type>,
    return_type: Type,
}

impl fmt::Display for MethodDescr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{};->{}(", self.definer, self.name)?;
        for t in &self.parameters_types {
            write!(f, "{t}")?;
        }
        write!(f, "){}", self.return_type)
    }
}

impl MethodDescr {
    #[must_use]
    pub fn new(definer: &str, name: &str, parameters_types: Vec<Type>, return_type: Type) -> Self {
        Self {
            definer: definer.to_string(),
            name: name.to_string(),
            parameters_types,
            return_type,
        }
    }

    #[inline]
    #[must_use]
    pub fn definer(&self) -> &str {
        &self.definer
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn parameters_types(&self) -> &[Type] {
        &self.parameters_types
    }

    #[inline]
    #[must_use]
    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    /// Checks that both references share name and prototype, whatever
    /// their holders are.
    #[must_use]
    pub fn same_signature(&self, other: &Self) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.parameters_types == other.parameters_types
    }

    /// Returns the same reference re-homed onto another holder class.
    #[must_use]
    pub fn with_definer(&self, definer: &str) -> Self {
        Self {
            definer: definer.to_string(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }
}

/// A field reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldDescr {
    definer: String,
    name: String,
    type_: Type,
}

impl fmt::Display for FieldDescr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{};->{}:{}", self.definer, self.name, self.type_)
    }
}

impl FieldDescr {
    #[must_use]
    pub fn new(definer: &str, name: &str, type_: Type) -> Self {
        Self {
            definer: definer.to_string(),
            name: name.to_string(),
            type_,
        }
    }

    #[inline]
    #[must_use]
    pub fn definer(&self) -> &str {
        &self.definer
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn type_(&self) -> &Type {
        &self.type_
    }
}
