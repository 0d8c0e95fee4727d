// vim: tw=80
//! Calls entering the resolution engine, and the log entries they leave.

use std::{
    any::Any,
    fmt::{self, Debug, Display},
};

use crate::Member;

/// One call to one member, on its way into [`Mocker::resolve`].
///
/// `args` is the tuple of owned argument values; `rendered` holds one display
/// string per argument for diagnostics.
///
/// [`Mocker::resolve`]: crate::Mocker::resolve
#[derive(Clone, Debug)]
pub struct Call<A> {
    pub(crate) member: Member,
    pub(crate) args: A,
    pub(crate) rendered: String,
}

impl<A> Call<A> {
    pub fn new(member: Member, args: A, rendered: Vec<String>) -> Self {
        Call { member, args, rendered: rendered.join(", ") }
    }

    pub fn member(&self) -> Member {
        self.member
    }

    pub fn args(&self) -> &A {
        &self.args
    }
}

/// A recorded call.  Immutable once it is in the log.
pub(crate) struct Invocation {
    member: Member,
    sequence: u64,
    args: Box<dyn Any + Send>,
    rendered: String,
}

impl Invocation {
    pub(crate) fn new<A>(call: &Call<A>, sequence: u64) -> Self
        where A: Clone + Send + 'static
    {
        Invocation {
            member: call.member,
            sequence,
            args: Box::new(call.args.clone()),
            rendered: call.rendered.clone(),
        }
    }

    /// The recorded arguments, if they have type `A`.
    pub(crate) fn args<A: 'static>(&self) -> Option<&A> {
        self.args.downcast_ref::<A>()
    }

    pub(crate) fn entry(&self) -> Entry {
        Entry {
            member: self.member,
            sequence: self.sequence,
            arguments: self.rendered.clone(),
        }
    }

    pub(crate) fn member(&self) -> Member {
        self.member
    }
}

/// Read-only view of one entry of a mock's invocation log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub member: Member,
    /// Position in the mock's global call order; strictly increasing.
    pub sequence: u64,
    /// The arguments, rendered with `Debug` where available.
    pub arguments: String,
}

impl Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}({})", self.sequence, self.member, self.arguments)
    }
}

// Autoref specialization: `(&&ArgPrinter(&x)).debug_string()` picks
// `ViaDebug` when `x: Debug` and `ViaNothing` otherwise.  Only works where the
// argument type is concrete, which is the case in generated code.
#[doc(hidden)]
pub struct ArgPrinter<'a, T>(pub &'a T);

#[doc(hidden)]
pub trait ViaDebug {
    fn debug_string(&self) -> String;
}

impl<'a, T: Debug> ViaDebug for &ArgPrinter<'a, T> {
    fn debug_string(&self) -> String {
        format!("{:?}", self.0)
    }
}

#[doc(hidden)]
pub trait ViaNothing {
    fn debug_string(&self) -> String;
}

impl<'a, T> ViaNothing for ArgPrinter<'a, T> {
    fn debug_string(&self) -> String {
        String::from("?")
    }
}
