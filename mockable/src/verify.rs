// vim: tw=80
//! Cardinality verification against a mock's invocation log.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use tracing::{error, trace};

use crate::{
    error::CountMismatch,
    matcher::ArgumentMatcher,
    Count,
    Member,
    Mocker,
};

/// Receives the outcome of every verification.
///
/// Any `Fn(bool, &str) + Send + Sync` closure is a `Reporter`, so a test can
/// route verification results into its own assertion machinery:
///
/// ```
/// # use std::sync::{Arc, Mutex};
/// # use mockable::*;
/// let failures = Arc::new(Mutex::new(Vec::new()));
/// let f2 = failures.clone();
/// let reporter = move |ok: bool, msg: &str| {
///     if !ok {
///         f2.lock().unwrap().push(msg.to_owned());
///     }
/// };
/// # let _: Arc<dyn Reporter> = Arc::new(reporter);
/// ```
pub trait Reporter: Send + Sync {
    /// `condition` is `false` when the verification failed.  `message`
    /// describes the expectation either way.
    fn report(&self, condition: bool, message: &str);
}

impl<F> Reporter for F
    where F: Fn(bool, &str) + Send + Sync
{
    fn report(&self, condition: bool, message: &str) {
        self(condition, message)
    }
}

/// The default [`Reporter`] of [`verify`](crate::verify).
///
/// Failures do not panic where they are reported.  They are logged and
/// collected, so later verifications still run.  The `SoftAssert` panics
/// with all of them at [`checkpoint`](Self::checkpoint), or once it is
/// dropped.  Every mock owns one, which is dropped with the mock's last
/// clone.
#[derive(Debug, Default)]
pub struct SoftAssert {
    failures: Mutex<Vec<String>>,
}

impl SoftAssert {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the failures collected so far.  Once drained, they
    /// no longer cause a panic on drop.
    pub fn take_failures(&self) -> Vec<String> {
        let mut failures = self.failures.lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *failures)
    }

    /// Panic with every failure collected so far, if there are any.
    pub fn checkpoint(&self) {
        let failures = self.take_failures();
        if !failures.is_empty() {
            panic!("{}", failures.join("\n"));
        }
    }
}

impl Reporter for SoftAssert {
    fn report(&self, condition: bool, message: &str) {
        if !condition {
            error!(failure = message, "verification failed");
            self.failures.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.to_owned());
        }
    }
}

impl Drop for SoftAssert {
    fn drop(&mut self) {
        if !thread::panicking() {
            self.checkpoint();
        }
    }
}

/// Evaluates count constraints for one mock and reports the outcome.
///
/// Shared by the generated verify builder and by every member handle it
/// hands out.
#[derive(Clone)]
pub struct Verifier {
    mocker: Mocker,
    reporter: Arc<dyn Reporter>,
}

impl Verifier {
    pub fn new(mocker: Mocker, reporter: Arc<dyn Reporter>) -> Self {
        Verifier { mocker, reporter }
    }

    /// Count the recorded calls of `member` accepted by `matcher`, compare
    /// with `expected`, and report.
    pub(crate) fn check<A>(&self, member: Member,
                           matcher: &dyn ArgumentMatcher<A>, expected: Count)
        where A: 'static
    {
        let (actual, calls) = self.mocker.count(member, matcher);
        let mismatch = CountMismatch {
            service: self.mocker.service(),
            member,
            matchers: matcher.describe(),
            expected,
            actual,
            calls: calls.iter().map(ToString::to_string).collect(),
        };
        let condition = expected.contains(actual);
        trace!(service = mismatch.service, %member, %expected, actual,
               condition, "verified");
        self.reporter.report(condition, &mismatch.to_string());
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("mocker", &self.mocker)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::{
        invocation::Call,
        matcher::{any, value},
        policy::Fallback,
    };

    const FETCH: Member = Member::method("fetch");

    fn mocker_with_calls(args: &[u32]) -> Mocker {
        let mocker = Mocker::new("MockFoo");
        for &x in args {
            let call = Call::new(FETCH, (x,), vec![x.to_string()]);
            let _ = mocker.try_resolve::<_, ()>(call, Fallback::Void(|| ()));
        }
        mocker
    }

    fn collect() -> (Arc<Mutex<Vec<(bool, String)>>>, Arc<dyn Reporter>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let reporter = move |ok: bool, msg: &str| {
            s.lock().unwrap().push((ok, msg.to_owned()));
        };
        (seen, Arc::new(reporter))
    }

    #[test]
    fn reports_every_outcome() {
        let (seen, reporter) = collect();
        let verifier = Verifier::new(mocker_with_calls(&[1, 2]), reporter);
        verifier.check::<(u32,)>(FETCH, &(any(),), Count::from(2));
        verifier.check::<(u32,)>(FETCH, &(value(1),), Count::once());
        verifier.check::<(u32,)>(FETCH, &(value(3),), Count::never());
        verifier.check::<(u32,)>(FETCH, &(value(3),), Count::from(1));
        let seen = seen.lock().unwrap();
        let outcomes: Vec<bool> = seen.iter().map(|(ok, _)| *ok).collect();
        assert_eq!(vec![true, true, true, false], outcomes);
        assert_eq!(
            "MockFoo::fetch(3): expected to be called exactly once, but was called 0 times; recorded calls: #0 fetch(1), #1 fetch(2)",
            seen[3].1);
    }

    #[test]
    fn soft_assert_collects() {
        let soft = SoftAssert::new();
        soft.report(true, "fine");
        soft.report(false, "first");
        soft.report(false, "second");
        assert_eq!(vec!["first", "second"], soft.take_failures());
    }

    #[test]
    fn soft_assert_checkpoint() {
        let soft = SoftAssert::new();
        soft.checkpoint();
        soft.report(false, "first");
        let payload = std::panic::catch_unwind(|| soft.checkpoint())
            .unwrap_err();
        assert_eq!(Some("first"),
                   payload.downcast_ref::<String>().map(String::as_str));
        // Failures are only reported once
        soft.checkpoint();
    }

    #[test]
    #[should_panic(expected = "first\nsecond")]
    fn soft_assert_panics_on_drop() {
        let soft = SoftAssert::new();
        soft.report(false, "first");
        soft.report(false, "second");
    }
}
