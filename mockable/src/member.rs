// vim: tw=80
//! Identities of mockable operations.

use std::fmt::{self, Display};

/// How a member is reached: a plain method call, or one of the two halves of
/// a property.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Access {
    /// An ordinary method call
    Call,
    /// A property read
    Get,
    /// A property write
    Set,
}

/// Stable key of one mockable operation.
///
/// Two calls of the same method share a `Member` no matter which arguments
/// they carry.  The getter and the setter of a property are two different
/// members that share a name.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Member {
    name: &'static str,
    access: Access,
}

impl Member {
    /// Identity of the method called `name`.
    pub const fn method(name: &'static str) -> Self {
        Member { name, access: Access::Call }
    }

    /// Identity of the getter of the property called `name`.
    pub const fn getter(name: &'static str) -> Self {
        Member { name, access: Access::Get }
    }

    /// Identity of the setter of the property called `name`.
    pub const fn setter(name: &'static str) -> Self {
        Member { name, access: Access::Set }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.access {
            Access::Call => write!(f, "{}", self.name),
            Access::Get => write!(f, "{} (get)", self.name),
            Access::Set => write!(f, "{} (set)", self.name),
        }
    }
}
