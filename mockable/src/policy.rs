// vim: tw=80
//! Which unstubbed calls may be answered with a default value.

use std::{
    marker::PhantomData,
    ops::BitOr,
    sync::atomic::{AtomicU8, Ordering},
};

use cfg_if::cfg_if;

/// Fallback behavior of a mock for calls that no stub answers.
///
/// Members returning `()` always have a default.  Everything else depends on
/// the policy flags.  The built-in process default is
/// [`RELAXED_OPTIONAL`](Policy::RELAXED_OPTIONAL); change it with
/// [`Policy::set_default`] or per mock with `MockFoo::with_policy`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Policy(u8);

impl Policy {
    /// Unstubbed calls fault unless the member returns `()`.
    pub const STRICT: Policy = Policy(0);
    /// Members returning `Option<T>` answer `None`.
    pub const RELAXED_OPTIONAL: Policy = Policy(1);
    /// Members whose return type implements `Default` answer
    /// `Default::default()`.  Requires the `nightly` feature; ignored
    /// otherwise.
    pub const RELAXED_DEFAULT: Policy = Policy(2);
    /// Both relaxed flags
    pub const RELAXED: Policy = Policy(3);

    pub fn contains(self, other: Policy) -> bool {
        self.0 & other.0 == other.0
    }

    /// Change the policy of mocks created from now on with `MockFoo::new`.
    pub fn set_default(policy: Policy) {
        DEFAULT_POLICY.store(policy.0, Ordering::Relaxed);
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy(DEFAULT_POLICY.load(Ordering::Relaxed))
    }
}

impl BitOr for Policy {
    type Output = Policy;

    fn bitor(self, rhs: Policy) -> Policy {
        Policy(self.0 | rhs.0)
    }
}

static DEFAULT_POLICY: AtomicU8 = AtomicU8::new(Policy::RELAXED_OPTIONAL.0);

/// What a member can fall back to when no stub answers, as declared by the
/// generated surface.
#[derive(Debug)]
pub enum Fallback<R> {
    /// Nothing is declared
    Strict,
    /// The member returns `()`
    Void(fn() -> R),
    /// The member returns an `Option`; produces `None`
    Optional(fn() -> R),
}

impl<R> Clone for Fallback<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Fallback<R> {}

impl<R: 'static> Fallback<R> {
    /// The default answer allowed by `policy`, if any.
    pub(crate) fn resolve(self, policy: Policy) -> Option<R> {
        match self {
            Fallback::Void(f) => Some(f()),
            Fallback::Optional(f) if policy.contains(Policy::RELAXED_OPTIONAL)
                => Some(f()),
            _ if policy.contains(Policy::RELAXED_DEFAULT) =>
                DefaultReturner::<R>::return_default(),
            _ => None
        }
    }
}

#[doc(hidden)]
pub trait ReturnDefault<O> {
    fn return_default() -> Option<O>;
}

#[derive(Default)]
#[doc(hidden)]
pub struct DefaultReturner<O: 'static>(PhantomData<O>);

cfg_if! {
    if #[cfg(feature = "nightly")] {
        impl<O> ReturnDefault<O> for DefaultReturner<O> {
            default fn return_default() -> Option<O> {
                None
            }
        }

        impl<O: Default> ReturnDefault<O> for DefaultReturner<O> {
            fn return_default() -> Option<O> {
                Some(O::default())
            }
        }
    } else {
        impl<O> ReturnDefault<O> for DefaultReturner<O> {
            fn return_default() -> Option<O> {
                None
            }
        }
    }
}
