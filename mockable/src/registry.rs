// vim: tw=80
//! Per-mock storage: stub rules and the invocation log.

use std::{
    any::type_name,
    collections::hash_map::HashMap,
    fmt::{self, Display},
    sync::Arc,
};

use downcast::*;

use crate::{
    error::Fault,
    invocation::{Call, Entry, Invocation},
    matcher::ArgumentMatcher,
    Member,
};

/// What a [`reset`](crate::Mockable::reset) clears.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Scope {
    /// Return rules declared with `given`
    Given,
    /// Action rules declared with `when`
    When,
    /// The invocation log queried by `verify`
    Verify,
    All,
}

/// How a rule answers, for diagnostics.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EffectKind {
    Return,
    Throw,
    Produce,
    Perform,
    PerformOnGet,
    PerformOnSet,
}

impl Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EffectKind::Return => "will_return",
            EffectKind::Throw => "will_throw",
            EffectKind::Produce => "will_produce",
            EffectKind::Perform => "perform",
            EffectKind::PerformOnGet => "perform_on_get",
            EffectKind::PerformOnSet => "perform_on_set",
        };
        f.write_str(s)
    }
}

/// The callable part of a rule.  Actions are effects returning `()`.
pub(crate) struct Effect<A, R> {
    pub(crate) kind: EffectKind,
    pub(crate) func: Arc<dyn Fn(A) -> R + Send + Sync>,
}

impl<A, R> Effect<A, R> {
    pub(crate) fn new<F>(kind: EffectKind, f: F) -> Self
        where F: Fn(A) -> R + Send + Sync + 'static
    {
        Effect { kind, func: Arc::new(f) }
    }

    pub(crate) fn call(&self, args: A) -> R {
        (self.func)(args)
    }
}

impl<A, R> Clone for Effect<A, R> {
    fn clone(&self) -> Self {
        Effect { kind: self.kind, func: self.func.clone() }
    }
}

struct StubRule<A, R> {
    matcher: Box<dyn ArgumentMatcher<A>>,
    effect: Effect<A, R>,
    consumed: bool,
}

/// The ordered rule list of one member.
struct Rules<A, R> {
    rules: Vec<StubRule<A, R>>,
}

impl<A, R> Default for Rules<A, R> {
    fn default() -> Self {
        Rules { rules: Vec::new() }
    }
}

impl<A: 'static, R: 'static> Rules<A, R> {
    fn push(&mut self, matcher: Box<dyn ArgumentMatcher<A>>,
            effect: Effect<A, R>)
    {
        self.rules.push(StubRule { matcher, effect, consumed: false });
    }

    /// Pick the first live rule accepting `args`.  It is consumed only if
    /// another live rule would also have accepted them, so the last one
    /// answers forever.
    fn select(&mut self, args: &A) -> Option<Effect<A, R>> {
        let mut live = self.rules.iter_mut()
            .filter(|rule| !rule.consumed && rule.matcher.matches(args));
        let first = live.next()?;
        if live.next().is_some() {
            first.consumed = true;
        }
        Some(first.effect.clone())
    }

    fn explain(&self, args: &A) -> Vec<String> {
        self.rules.iter()
            .enumerate()
            .map(|(i, rule)| {
                let why = if rule.consumed {
                    String::from("consumed")
                } else {
                    rule.matcher.explain(args)
                        .unwrap_or_else(|| String::from("matches"))
                };
                format!("rule #{} ({}) {}: {}", i, rule.matcher.describe(),
                        rule.effect.kind, why)
            }).collect()
    }
}

trait AnyRules: Any + Send {}
downcast!(dyn AnyRules);

impl<A: 'static, R: 'static> AnyRules for Rules<A, R> {}

/// One rule list per member.  A member used with other argument or return
/// types than it was declared with fails to downcast.
#[derive(Default)]
struct RuleStore {
    store: HashMap<Member, Box<dyn AnyRules>>,
}

impl RuleStore {
    fn get<A: 'static, R: 'static>(&self, service: &'static str,
                                   member: Member)
        -> Result<Option<&Rules<A, R>>, Fault>
    {
        match self.store.get(&member) {
            None => Ok(None),
            Some(rules) => rules.downcast_ref::<Rules<A, R>>()
                .map(Some)
                .map_err(|_| type_mismatch::<A, R>(service, member)),
        }
    }

    fn get_mut<A: 'static, R: 'static>(&mut self, service: &'static str,
                                       member: Member)
        -> Result<Option<&mut Rules<A, R>>, Fault>
    {
        match self.store.get_mut(&member) {
            None => Ok(None),
            Some(rules) => rules.downcast_mut::<Rules<A, R>>()
                .map(Some)
                .map_err(|_| type_mismatch::<A, R>(service, member)),
        }
    }

    fn entry<A: 'static, R: 'static>(&mut self, service: &'static str,
                                     member: Member)
        -> Result<&mut Rules<A, R>, Fault>
    {
        self.store.entry(member)
            .or_insert_with(|| Box::new(Rules::<A, R>::default()))
            .downcast_mut::<Rules<A, R>>()
            .map_err(|_| type_mismatch::<A, R>(service, member))
    }

    fn clear(&mut self) {
        self.store.clear();
    }
}

fn type_mismatch<A, R>(service: &'static str, member: Member) -> Fault {
    Fault::TypeMismatch {
        service,
        member,
        expected: type_name::<Rules<A, R>>(),
    }
}

/// Return rules, action rules and the invocation log of one mock.
///
/// Not synchronized by itself; [`Mocker`](crate::Mocker) keeps it behind a
/// mutex.
pub(crate) struct Registry {
    service: &'static str,
    returns: RuleStore,
    actions: RuleStore,
    log: Vec<Invocation>,
    next_sequence: u64,
}

impl Registry {
    pub(crate) fn new(service: &'static str) -> Self {
        Registry {
            service,
            returns: RuleStore::default(),
            actions: RuleStore::default(),
            log: Vec::new(),
            next_sequence: 0,
        }
    }

    pub(crate) fn add_return<A, R>(&mut self, member: Member,
                                   matcher: Box<dyn ArgumentMatcher<A>>,
                                   effect: Effect<A, R>)
        -> Result<(), Fault>
        where A: 'static, R: 'static
    {
        self.returns.entry::<A, R>(self.service, member)?
            .push(matcher, effect);
        Ok(())
    }

    pub(crate) fn add_action<A>(&mut self, member: Member,
                                matcher: Box<dyn ArgumentMatcher<A>>,
                                effect: Effect<A, ()>)
        -> Result<(), Fault>
        where A: 'static
    {
        self.actions.entry::<A, ()>(self.service, member)?
            .push(matcher, effect);
        Ok(())
    }

    /// Append `call` to the log.  Returns its sequence number.
    pub(crate) fn record<A>(&mut self, call: &Call<A>) -> u64
        where A: Clone + Send + 'static
    {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.log.push(Invocation::new(call, sequence));
        sequence
    }

    pub(crate) fn select_return<A, R>(&mut self, member: Member, args: &A)
        -> Result<Option<Effect<A, R>>, Fault>
        where A: 'static, R: 'static
    {
        Ok(self.returns.get_mut::<A, R>(self.service, member)?
            .and_then(|rules| rules.select(args)))
    }

    pub(crate) fn select_action<A>(&mut self, member: Member, args: &A)
        -> Result<Option<Effect<A, ()>>, Fault>
        where A: 'static
    {
        Ok(self.actions.get_mut::<A, ()>(self.service, member)?
            .and_then(|rules| rules.select(args)))
    }

    /// Why each return rule of `member` did or did not answer `args`.
    pub(crate) fn explain_return<A, R>(&self, member: Member, args: &A)
        -> Result<Vec<String>, Fault>
        where A: 'static, R: 'static
    {
        Ok(self.returns.get::<A, R>(self.service, member)?
            .map(|rules| rules.explain(args))
            .unwrap_or_default())
    }

    /// Count the logged calls of `member` accepted by `matcher`.  Also
    /// returns every logged call of `member`, for diagnostics.
    pub(crate) fn count<A>(&self, member: Member,
                           matcher: &dyn ArgumentMatcher<A>)
        -> (usize, Vec<Entry>)
        where A: 'static
    {
        let calls: Vec<&Invocation> = self.log.iter()
            .filter(|inv| inv.member() == member)
            .collect();
        let matched = calls.iter()
            .filter(|inv| inv.args::<A>()
                .map(|args| matcher.matches(args))
                .unwrap_or(false))
            .count();
        (matched, calls.iter().map(|inv| inv.entry()).collect())
    }

    pub(crate) fn history(&self) -> Vec<Entry> {
        self.log.iter().map(Invocation::entry).collect()
    }

    pub(crate) fn reset(&mut self, scope: Scope) {
        match scope {
            Scope::Given => self.returns.clear(),
            Scope::When => self.actions.clear(),
            Scope::Verify => self.log.clear(),
            Scope::All => {
                self.returns.clear();
                self.actions.clear();
                self.log.clear();
            }
        }
    }
}
