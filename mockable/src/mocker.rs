// vim: tw=80
//! The resolution engine shared by every mock.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, error, trace, warn};

use crate::{
    error::Fault,
    invocation::{Call, Entry},
    matcher::ArgumentMatcher,
    policy::{Fallback, Policy},
    registry::{Effect, Registry, Scope},
    verify::SoftAssert,
    Member,
};

struct Inner {
    service: &'static str,
    policy: Policy,
    registry: Mutex<Registry>,
    soft: Arc<SoftAssert>,
}

/// The state behind one mock object.
///
/// Every generated mock holds a `Mocker`.  Clones share the same registry, so
/// a clone handed to the code under test is configured and verified through
/// the original.  All access goes through one mutex; stub effects and actions
/// run after it is released, so they may call back into the same mock.
///
/// Failed verifications are kept until [`checkpoint`](Self::checkpoint), or
/// until the last clone is dropped, which then panics with them.
#[derive(Clone)]
pub struct Mocker(Arc<Inner>);

impl Mocker {
    /// Create the state of a mock named `service`, with the process-wide
    /// default [`Policy`].
    pub fn new(service: &'static str) -> Self {
        Self::with_policy(service, Policy::default())
    }

    pub fn with_policy(service: &'static str, policy: Policy) -> Self {
        Mocker(Arc::new(Inner {
            service,
            policy,
            registry: Mutex::new(Registry::new(service)),
            soft: Arc::new(SoftAssert::new()),
        }))
    }

    pub fn service(&self) -> &'static str {
        self.0.service
    }

    pub fn policy(&self) -> Policy {
        self.0.policy
    }

    // A panic in a user predicate must not wedge the mock, so poisoning is
    // ignored.
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.0.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle one call: record it, then answer it with the first live
    /// matching action and return rule, or with the member's fallback.
    ///
    /// Returns [`Fault::NoStub`] when no return rule applies and the policy
    /// allows no default.  The call is recorded either way.
    pub fn try_resolve<A, R>(&self, call: Call<A>, fallback: Fallback<R>)
        -> Result<R, Fault>
        where A: Clone + Send + 'static, R: 'static
    {
        let member = call.member;
        let (action, answer, mismatches) = {
            let mut registry = self.lock();
            let sequence = registry.record(&call);
            debug!(service = self.service(), %member, sequence,
                   arguments = %call.rendered, "recorded call");
            let action = registry.select_action(member, &call.args)?;
            let answer = registry.select_return::<A, R>(member, &call.args)?;
            let mismatches = if answer.is_none() {
                registry.explain_return::<A, R>(member, &call.args)?
            } else {
                Vec::new()
            };
            (action, answer, mismatches)
        };

        if let Some(action) = action {
            debug!(service = self.service(), %member, kind = %action.kind,
                   "running action");
            action.call(call.args.clone());
        }
        if let Some(answer) = answer {
            debug!(service = self.service(), %member, kind = %answer.kind,
                   "answering");
            return Ok(answer.call(call.args));
        }
        let void = matches!(fallback, Fallback::Void(_));
        match fallback.resolve(self.policy()) {
            Some(r) => {
                if !void {
                    warn!(service = self.service(), %member,
                          arguments = %call.rendered,
                          "no stub configured, answering with a default");
                }
                Ok(r)
            }
            None => Err(Fault::NoStub {
                service: self.service(),
                member,
                arguments: call.rendered,
                mismatches,
            })
        }
    }

    /// Like [`try_resolve`](Self::try_resolve), but a fault aborts the
    /// current test.  This is what generated mock methods call.
    pub fn resolve<A, R>(&self, call: Call<A>, fallback: Fallback<R>) -> R
        where A: Clone + Send + 'static, R: 'static
    {
        match self.try_resolve(call, fallback) {
            Ok(r) => r,
            Err(fault) => abort(fault),
        }
    }

    pub(crate) fn add_return<A, R>(&self, member: Member,
                                   matcher: Box<dyn ArgumentMatcher<A>>,
                                   effect: Effect<A, R>)
        where A: 'static, R: 'static
    {
        trace!(service = self.service(), %member,
               matchers = %matcher.describe(), kind = %effect.kind,
               "adding return rule");
        if let Err(fault) = self.lock().add_return(member, matcher, effect) {
            abort(fault);
        }
    }

    pub(crate) fn add_action<A>(&self, member: Member,
                                matcher: Box<dyn ArgumentMatcher<A>>,
                                effect: Effect<A, ()>)
        where A: 'static
    {
        trace!(service = self.service(), %member,
               matchers = %matcher.describe(), kind = %effect.kind,
               "adding action rule");
        if let Err(fault) = self.lock().add_action(member, matcher, effect) {
            abort(fault);
        }
    }

    /// How many recorded calls of `member` does `matcher` accept?  Also
    /// returns every recorded call of `member`.
    pub(crate) fn count<A>(&self, member: Member,
                           matcher: &dyn ArgumentMatcher<A>)
        -> (usize, Vec<Entry>)
        where A: 'static
    {
        self.lock().count(member, matcher)
    }

    /// Snapshot of the invocation log, oldest first.
    pub fn history(&self) -> Vec<Entry> {
        self.lock().history()
    }

    pub fn reset(&self, scope: Scope) {
        trace!(service = self.service(), ?scope, "reset");
        self.lock().reset(scope);
    }

    /// The collector [`verify`](crate::verify) reports into.
    pub(crate) fn soft_assert(&self) -> Arc<SoftAssert> {
        self.0.soft.clone()
    }

    /// Panic now if any verification of this mock failed since the last
    /// checkpoint.
    pub fn checkpoint(&self) {
        self.0.soft.checkpoint();
    }
}

impl fmt::Debug for Mocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mocker")
            .field("service", &self.0.service)
            .field("policy", &self.0.policy)
            .finish_non_exhaustive()
    }
}

fn abort(fault: Fault) -> ! {
    error!(%fault, "mock configuration fault");
    panic!("{}", fault)
}

#[cfg(test)]
mod t {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        matcher::{any, value},
        registry::EffectKind,
    };

    const FETCH: Member = Member::method("fetch");

    fn fetch(mocker: &Mocker, x: u32) -> Result<u32, Fault> {
        let call = Call::new(FETCH, (x,), vec![x.to_string()]);
        mocker.try_resolve(call, Fallback::Strict)
    }

    #[test]
    fn no_stub() {
        let mocker = Mocker::new("MockFoo");
        let fault = fetch(&mocker, 4).unwrap_err();
        assert_eq!("MockFoo::fetch(4): No stub configured", fault.to_string());
        assert_eq!(1, mocker.history().len());
    }

    #[test]
    #[should_panic(expected = "MockFoo::fetch(4): No stub configured")]
    fn resolve_panics_on_fault() {
        let mocker = Mocker::new("MockFoo");
        let call = Call::new(FETCH, (4u32,), vec!["4".to_owned()]);
        let _: u32 = mocker.resolve(call, Fallback::Strict);
    }

    #[test]
    fn stubbed() {
        let mocker = Mocker::new("MockFoo");
        let double = Effect::new(EffectKind::Produce, |(x,): (u32,)| x * 2);
        mocker.add_return(FETCH, Box::new((value(4),)), double);
        assert_eq!(8, fetch(&mocker, 4).unwrap());
        let fault = fetch(&mocker, 5).unwrap_err();
        assert!(fault.to_string().contains("rule #0 (4) will_produce"),
                "{}", fault);
    }

    #[test]
    fn action_runs_before_return() {
        let mocker = Mocker::new("MockFoo");
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        mocker.add_action(FETCH, Box::new((any(),)),
                          Effect::new(EffectKind::Perform, move |_: (u32,)| {
                              c.fetch_add(1, Ordering::Relaxed);
                          }));
        let c = counter.clone();
        mocker.add_return(FETCH, Box::new((any(),)),
                          Effect::new(EffectKind::Produce, move |_: (u32,)| {
                              c.load(Ordering::Relaxed) as u32
                          }));
        assert_eq!(1, fetch(&mocker, 0).unwrap());
        assert_eq!(2, fetch(&mocker, 0).unwrap());
    }

    #[test]
    fn effects_may_reenter() {
        let mocker = Mocker::new("MockFoo");
        let inner = mocker.clone();
        let answer = Effect::new(EffectKind::Return, |_: (u32,)| 42u32);
        mocker.add_return(FETCH, Box::new((value(0),)), answer);
        let reenter = Effect::new(EffectKind::Produce,
                                  move |_: (u32,)| fetch(&inner, 0).unwrap());
        mocker.add_return(FETCH, Box::new((value(1),)), reenter);
        assert_eq!(42, fetch(&mocker, 1).unwrap());
        assert_eq!(2, mocker.history().len());
    }

    #[test]
    fn type_mismatch() {
        let mocker = Mocker::new("MockFoo");
        mocker.add_return(FETCH, Box::new((any(),)),
                          Effect::new(EffectKind::Return, |_: (u32,)| 1i64));
        let fault = fetch(&mocker, 1).unwrap_err();
        assert!(matches!(fault, Fault::TypeMismatch { service: "MockFoo", .. }),
                "{:?}", fault);
        let message = fault.to_string();
        assert!(message.starts_with("MockFoo::fetch: registered rules"),
                "{}", message);
    }

    #[test]
    fn void_fallback() {
        let mocker = Mocker::with_policy("MockFoo", Policy::STRICT);
        let call = Call::new(Member::method("poke"), (), Vec::new());
        mocker.resolve(call, Fallback::Void(|| ()));
    }

    #[test]
    fn optional_fallback() {
        let call = || Call::new(Member::method("find"), (), Vec::new());
        let none = Fallback::<Option<u32>>::Optional(|| None);
        let relaxed = Mocker::with_policy("MockFoo", Policy::RELAXED_OPTIONAL);
        assert_eq!(None, relaxed.resolve(call(), none));
        let strict = Mocker::with_policy("MockFoo", Policy::STRICT);
        assert!(strict.try_resolve(call(), none).is_err());
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let mocker = Mocker::new("MockFoo");
        mocker.add_return(FETCH,
                          Box::new((crate::matcher::matching(|x: &u32| {
                              if *x == 13 { panic!("unlucky") }
                              true
                          }),)),
                          Effect::new(EffectKind::Return, |_: (u32,)| 1u32));
        let m = mocker.clone();
        let r = std::thread::spawn(move || fetch(&m, 13)).join();
        assert!(r.is_err());
        assert_eq!(1, fetch(&mocker, 1).unwrap());
    }

    #[test]
    fn reset_given_clears_rules_only() {
        let mocker = Mocker::new("MockFoo");
        mocker.add_return(FETCH, Box::new((any(),)),
                          Effect::new(EffectKind::Return, |_: (u32,)| 1u32));
        fetch(&mocker, 0).unwrap();
        mocker.reset(Scope::Given);
        assert!(fetch(&mocker, 0).is_err());
        let seqs: Vec<u64> = mocker.history().iter()
            .map(|e| e.sequence)
            .collect();
        assert_eq!(vec![0, 1], seqs);
    }
}
