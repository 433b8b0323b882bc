//! Dalvik access flags of classes and methods.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Dalvik class flags
    pub struct ClassFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_INTERFACE             = 0x00200;
        const ACC_ABSTRACT              = 0x00400;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_ANNOTATION            = 0x02000;
        const ACC_ENUM                  = 0x04000;
    }
}

bitflags! {
    /// Dalvik method flags
    pub struct MethodFlags: u32 {
        const ACC_PUBLIC                = 0x00001;
        const ACC_PRIVATE               = 0x00002;
        const ACC_PROTECTED             = 0x00004;
        const ACC_STATIC                = 0x00008;
        const ACC_FINAL                 = 0x00010;
        const ACC_SYNCHRONIZED          = 0x00020;
        const ACC_BRIDGE                = 0x00040;
        const ACC_VARARGS               = 0x00080;
        const ACC_NATIVE                = 0x00100;
        const ACC_ABSTRACT              = 0x00400;
        const ACC_STRICT                = 0x00800;
        const ACC_SYNTHETIC             = 0x01000;
        const ACC_CONSTRUCTOR           = 0x10000;
        const ACC_DECLARED_SYNCHRONIZED = 0x20000;
    }
}

// Keywords used by the textual format, in printing order.
const CLASS_KEYWORDS: &[(&str, ClassFlags)] = &[
    ("public", ClassFlags::ACC_PUBLIC),
    ("private", ClassFlags::ACC_PRIVATE),
    ("protected", ClassFlags::ACC_PROTECTED),
    ("static", ClassFlags::ACC_STATIC),
    ("final", ClassFlags::ACC_FINAL),
    ("interface", ClassFlags::ACC_INTERFACE),
    ("abstract", ClassFlags::ACC_ABSTRACT),
    ("synthetic", ClassFlags::ACC_SYNTHETIC),
    ("annotation", ClassFlags::ACC_ANNOTATION),
    ("enum", ClassFlags::ACC_ENUM),
];

const METHOD_KEYWORDS: &[(&str, MethodFlags)] = &[
    ("public", MethodFlags::ACC_PUBLIC),
    ("private", MethodFlags::ACC_PRIVATE),
    ("protected", MethodFlags::ACC_PROTECTED),
    ("static", MethodFlags::ACC_STATIC),
    ("final", MethodFlags::ACC_FINAL),
    ("synchronized", MethodFlags::ACC_SYNCHRONIZED),
    ("bridge", MethodFlags::ACC_BRIDGE),
    ("varargs", MethodFlags::ACC_VARARGS),
    ("native", MethodFlags::ACC_NATIVE),
    ("abstract", MethodFlags::ACC_ABSTRACT),
    ("strict", MethodFlags::ACC_STRICT),
    ("synthetic", MethodFlags::ACC_SYNTHETIC),
    ("constructor", MethodFlags::ACC_CONSTRUCTOR),
    ("declared-synchronized", MethodFlags::ACC_DECLARED_SYNCHRONIZED),
];

impl ClassFlags {
    /// Returns the flag designated by a smali keyword, if any.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        CLASS_KEYWORDS
            .iter()
            .find_map(|(kw, flag)| (*kw == keyword).then_some(*flag))
    }
}

impl MethodFlags {
    /// Returns the flag designated by a smali keyword, if any.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        METHOD_KEYWORDS
            .iter()
            .find_map(|(kw, flag)| (*kw == keyword).then_some(*flag))
    }
}

impl fmt::Display for ClassFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (kw, flag) in CLASS_KEYWORDS {
            if self.contains(*flag) {
                write!(f, "{kw} ")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MethodFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (kw, flag) in METHOD_KEYWORDS {
            if self.contains(*flag) {
                write!(f, "{kw} ")?;
            }
        }
        Ok(())
    }
}
