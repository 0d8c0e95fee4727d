// vim: tw=80
//! Behavior verification for trait objects.
//!
//! Mockable turns a trait into a mock: a stand-in implementation that answers
//! calls the way a test configured it, and records every call so the test
//! can check afterwards how the code under test used it.
//!
//! # Usage
//!
//! Annotate the trait with [`#[mockable]`](macro@mockable).  That generates a
//! struct named after the trait with "Mock" prepended, which implements the
//! trait.  Then, in the test:
//! * Declare what members return with [`given`], and their side effects with
//!   [`when`].  Each declaration takes one argument matcher per formal
//!   argument.
//! * Hand the mock to the code under test.
//! * Check how often members were called with [`verify`].
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Return values`](#return-values)
//! * [`Side effects`](#side-effects)
//! * [`Properties`](#properties)
//! * [`Verification`](#verification)
//! * [`Unstubbed calls`](#unstubbed-calls)
//! * [`Reference arguments`](#reference-arguments)
//! * [`Crate features`](#crate-features)
//!
//! ## Getting Started
//! ```
//! use mockable::*;
//!
//! #[mockable]
//! trait Catalog {
//!     fn price(&self, sku: u32) -> u32;
//! }
//!
//! fn total(catalog: &dyn Catalog, skus: &[u32]) -> u32 {
//!     skus.iter().map(|sku| catalog.price(*sku)).sum()
//! }
//!
//! let mock = MockCatalog::new();
//! given(&mock)
//!     .price(value(1)).will_return(10)
//!     .price(any()).will_return(3);
//! assert_eq!(16, total(&mock, &[1, 2, 2]));
//! verify(&mock)
//!     .price(any()).called(3)
//!     .price(value(2)).called(2);
//! ```
//!
//! ## Matching arguments
//!
//! Every declaration names one matcher per argument:
//! * [`any`] accepts every value.
//! * [`value`] accepts values equal to the given one.
//! * [`matching`] accepts values for which a closure returns `true`.
//! * [`satisfies`] accepts values for which any [`Predicate`] holds, such as
//!   those in the [`predicate`] module.
//!
//! Rules of one member are tried in the order they were declared, and the
//! first one that accepts the call answers it.  There is no notion of a more
//! specific matcher: an `any()` rule declared before a `value(x)` rule wins
//! for `x`.
//!
//! ## Return values
//!
//! A rule answers with a fixed value ([`will_return`]), with an error
//! ([`will_throw`], for members returning `Result`), or with the result of a
//! closure that receives the call's arguments as a tuple ([`will_produce`]).
//!
//! When several rules accept a call, the first one answers it and is then
//! used up.  The last rule that accepts a call is never used up.  So
//! declaring several rules for the same arguments describes a sequence of
//! answers, whose last element repeats forever:
//! ```
//! # use mockable::*;
//! #[mockable]
//! trait Feed {
//!     fn poll(&self) -> Result<u32, String>;
//! }
//!
//! let mock = MockFeed::new();
//! given(&mock)
//!     .poll().will_throw("try again".to_owned())
//!     .poll().will_return(Ok(7));
//! assert_eq!(Err("try again".to_owned()), mock.poll());
//! assert_eq!(Ok(7), mock.poll());
//! assert_eq!(Ok(7), mock.poll());
//! ```
//!
//! Closures given to [`will_produce`] must be `Send + Sync`.  For those that
//! are not, there is [`will_produce_st`], which may only be used from the
//! thread that declared it.
//!
//! ## Side effects
//!
//! [`when`] declares actions, which run before the return rule answers.  They
//! obey the same ordering as return rules, independently of them.
//! ```
//! # use mockable::*;
//! # use std::sync::{Arc, Mutex};
//! #[mockable]
//! trait Mailer {
//!     fn send(&self, to: &str, body: &str);
//! }
//!
//! let sent = Arc::new(Mutex::new(Vec::new()));
//! let s = sent.clone();
//! let mock = MockMailer::new();
//! when(&mock)
//!     .send(any(), any()).perform(move |(to, _)| s.lock().unwrap().push(to));
//! mock.send("alice@example.com", "hi");
//! assert_eq!(vec!["alice@example.com".to_owned()], *sent.lock().unwrap());
//! ```
//!
//! ## Properties
//!
//! A getter and a setter can be declared as the two halves of a property with
//! `#[mockable(get)]` and `#[mockable(set)]`.  The setter of property `p` must
//! be named `set_p`.  Reads and writes are tracked separately.
//! ```
//! # use mockable::*;
//! #[mockable]
//! trait Config {
//!     #[mockable(get)]
//!     fn endpoint(&self) -> Option<String>;
//!     #[mockable(set)]
//!     fn set_endpoint(&self, endpoint: Option<String>);
//! }
//!
//! let mock = MockConfig::new();
//! given(&mock).endpoint().will_return(Some("localhost".to_owned()));
//! assert_eq!(Some("localhost".to_owned()), mock.endpoint());
//! mock.set_endpoint(None);
//! verify(&mock)
//!     .endpoint().getter_called(1)
//!     .set_endpoint(value(None)).setter_called(1)
//!     .endpoint().setter_called(1);
//! ```
//!
//! ## Verification
//!
//! [`verify`] counts the recorded calls accepted by a set of matchers and
//! compares the count with an integer, a range, or a [`Count`].  A failed
//! verification does not stop the test: every failure on a mock is collected
//! and reported together by a panic when the mock is dropped, or earlier by
//! [`Mockable::checkpoint`].  Use [`verify_with`] to send the outcomes to
//! some other [`Reporter`] instead.
//!
//! ## Unstubbed calls
//!
//! A call that no rule answers panics with a "No stub configured" message,
//! unless the member has a default.  Members returning `()` always do.  By
//! default, members returning `Option` answer `None`.  This is controlled by
//! the mock's [`Policy`].
//!
//! ## Reference arguments
//!
//! Arguments of type `&T` are recorded as `T::Owned`, so a `&str` argument is
//! matched with a `Parameter<String>` and reaches closures as a `String`.
//! Every argument must be `Clone + Send + 'static` once owned.  Arguments are
//! rendered in diagnostics with their `Debug` implementation, or as `?` if
//! they have none.
//!
//! ## Crate features
//!
//! * **nightly** - With [`Policy::RELAXED_DEFAULT`], unstubbed members whose
//!   return type implements `Default` answer `Default::default()`.  Requires
//!   a nightly compiler.
//!
//! [`will_return`]: FunctionReturnBuilder::will_return
//! [`will_throw`]: FunctionReturnBuilder::will_throw
//! [`will_produce`]: FunctionReturnBuilder::will_produce
//! [`will_produce_st`]: FunctionReturnBuilder::will_produce_st

#![cfg_attr(feature = "nightly", feature(specialization))]
#![cfg_attr(feature = "nightly", allow(incomplete_features))]

use std::sync::Arc;

mod builder;
mod count;
mod error;
mod invocation;
mod matcher;
mod member;
mod mocker;
mod policy;
mod registry;
mod verify;

pub use builder::{
    FunctionActionBuilder,
    FunctionReturnBuilder,
    FunctionVerifyBuilder,
    PropertyActionBuilder,
    PropertyReturnBuilder,
    PropertyVerifyBuilder,
};
pub use count::Count;
pub use error::{CountMismatch, Fault};
pub use invocation::{Call, Entry};
pub use matcher::{any, matching, satisfies, value, ArgumentMatcher, Parameter};
pub use member::{Access, Member};
pub use mocker::Mocker;
pub use policy::{Fallback, Policy};
pub use registry::{EffectKind, Scope};
pub use verify::{Reporter, SoftAssert, Verifier};

pub use mockable_derive::mockable;
pub use predicates::prelude::{Predicate, predicate};

/// Implemented by every generated mock.
///
/// Tests usually go through the free functions [`given`], [`when`] and
/// [`verify`] instead.
pub trait Mockable {
    /// Declares return rules, one method per member
    type ReturnBuilder;
    /// Declares action rules, one method per member
    type ActionBuilder;
    /// Runs verifications, one method per member
    type VerifyBuilder;

    fn mocker(&self) -> &Mocker;

    fn given(&self) -> Self::ReturnBuilder;

    fn when(&self) -> Self::ActionBuilder;

    fn verify_with(&self, reporter: Arc<dyn Reporter>) -> Self::VerifyBuilder;

    /// Forget the rules, the recorded calls, or both.
    fn reset(&self, scope: Scope) {
        self.mocker().reset(scope)
    }

    /// Every recorded call, oldest first.
    fn history(&self) -> Vec<Entry> {
        self.mocker().history()
    }

    /// Panic now with the failures of every `verify` statement so far.
    fn checkpoint(&self) {
        self.mocker().checkpoint()
    }
}

/// Start declaring what `mock`'s members return.
pub fn given<M: Mockable>(mock: &M) -> M::ReturnBuilder {
    mock.given()
}

/// Start declaring side effects of `mock`'s members.
pub fn when<M: Mockable>(mock: &M) -> M::ActionBuilder {
    mock.when()
}

/// Start verifying how `mock` was called.
///
/// Failures go to the mock's own [`SoftAssert`].  They do not stop the test
/// until the mock is dropped or [`Mockable::checkpoint`] is called.
pub fn verify<M: Mockable>(mock: &M) -> M::VerifyBuilder {
    mock.verify_with(mock.mocker().soft_assert())
}

/// Start verifying how `mock` was called, reporting to `reporter`.
pub fn verify_with<M: Mockable>(mock: &M, reporter: Arc<dyn Reporter>)
    -> M::VerifyBuilder
{
    mock.verify_with(reporter)
}

// Used by generated code
#[doc(hidden)]
pub mod __private {
    pub use crate::invocation::{ArgPrinter, ViaDebug, ViaNothing};
}
