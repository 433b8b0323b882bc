//! Dalvik typing informations data structures.

use crate::errors::{IrError, IrResult};
use std::convert::TryFrom;
use std::fmt;

/// Name of the root of every class hierarchy.
pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";

/// Dalvik concrete type descriptor type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// `void` type, only valid for return types.
    Void,
    /// `boolean` type.
    Boolean,
    /// `byte` type.
    Byte,
    /// `short` type.
    Short,
    /// `char` type.
    Char,
    /// `int` type.
    Int,
    /// `long` type.
    Long,
    /// `float` type.
    Float,
    /// `double` type.
    Double,
    /// Array of the given type descriptor, usable recursively for arrays of arrays,
    /// though it is invalid to have more than 255 dimensions.
    Array(usize, Box<Self>),
    /// Type of a fully-qualified class, in its internal form (`java/lang/String`).
    Class(String),
}

impl Type {
    /// Shortcut to build a class type from an internal class name.
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::Class(name.to_string())
    }

    /// Returns a java-like representation of the type.
    /// This method is useful for pretty-printing. Its result differs
    /// from the `Display` implementation, which produces strings in the Dalvik
    /// format.
    #[must_use]
    pub fn to_java_string(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Byte => "byte".to_string(),
            Self::Short => "short".to_string(),
            Self::Char => "char".to_string(),
            Self::Int => "int".to_string(),
            Self::Long => "long".to_string(),
            Self::Float => "float".to_string(),
            Self::Double => "double".to_string(),
            Self::Array(n, sub) => {
                let mut s = sub.to_java_string();
                for _ in 0..*n {
                    s.push_str("[]");
                }
                s
            }
            Self::Class(name) => name.replace('/', "."),
        }
    }

    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        !matches!(self, Self::Void | Self::Array(_, _) | Self::Class(_))
    }

    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Array(_, _) | Self::Class(_))
    }

    pub fn as_class_name(&self) -> IrResult<&str> {
        if let Self::Class(name) = self {
            Ok(name)
        } else {
            Err(IrError::InvalidType)
        }
    }

    /// Returns the array type whose elements are of this type.
    #[must_use]
    pub fn to_array(&self) -> Self {
        match self {
            Self::Array(n, inner) => Self::Array(n + 1, inner.clone()),
            other => Self::Array(1, Box::new(other.clone())),
        }
    }
}

/// Returns the package part of an internal class name, `""` being the
/// default package.
#[must_use]
pub fn package_name(class_name: &str) -> &str {
    class_name
        .rfind('/')
        .map_or("", |idx| &class_name[..idx])
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Void => write!(f, "V"),
            Self::Boolean => write!(f, "Z"),
            Self::Byte => write!(f, "B"),
            Self::Short => write!(f, "S"),
            Self::Char => write!(f, "C"),
            Self::Int => write!(f, "I"),
            Self::Long => write!(f, "J"),
            Self::Float => write!(f, "F"),
            Self::Double => write!(f, "D"),
            Self::Array(n, inner) => {
                for _ in 0..*n {
                    write!(f, "[")?;
                }
                write!(f, "{inner}")
            }
            Self::Class(classname) => write!(f, "L{classname};"),
        }
    }
}

impl TryFrom<&str> for Type {
    type Error = IrError;

    fn try_from(s: &str) -> IrResult<Self> {
        let conversion_error = || IrError::Conversion {
            from: format!("&str ({s:?})"),
            to: "Type".to_string(),
        };

        if s.is_empty() {
            return Err(conversion_error());
        }

        if s == "V" {
            return Ok(Self::Void);
        }

        let i = s.bytes().take_while(|b| *b == b'[').count();
        if i >= s.len() || i >= 255 {
            return Err(conversion_error());
        }

        let t = match &s[i..] {
            "Z" => Self::Boolean,
            "B" => Self::Byte,
            "S" => Self::Short,
            "C" => Self::Char,
            "I" => Self::Int,
            "J" => Self::Long,
            "F" => Self::Float,
            "D" => Self::Double,
            sub => {
                let l = sub.len();
                if l > 2 && sub.starts_with('L') && sub.ends_with(';') {
                    Self::Class(sub[1..l - 1].to_string())
                } else {
                    return Err(conversion_error());
                }
            }
        };
        if i == 0 {
            Ok(t)
        } else {
            Ok(Self::Array(i, Box::new(t)))
        }
    }
}
