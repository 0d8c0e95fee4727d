// vim: tw=80
//! Per-member declaration handles.
//!
//! The generated `MockFooReturnBuilder`, `MockFooActionBuilder` and
//! `MockFooVerifyBuilder` have one method per member of the trait.  Each
//! returns one of the handles below, whose terminal method registers a rule
//! (or runs a verification) and hands the service builder back, so that
//! declarations chain:
//!
//! ```ignore
//! given(&mock)
//!     .fetch(value(1)).will_return(Ok("one".into()))
//!     .fetch(any()).will_throw(Error::NotFound);
//! ```

use std::{fmt, marker::PhantomData};

use fragile::Fragile;

use crate::{
    matcher::{ArgumentMatcher, Parameter},
    registry::{Effect, EffectKind},
    verify::Verifier,
    Count,
    Member,
    Mocker,
};

/// Declares what a method returns, for calls matching a set of argument
/// matchers.
///
/// `P` is the service builder to return to, `A` the method's argument tuple
/// and `R` its return type.
pub struct FunctionReturnBuilder<P, A, R> {
    parent: P,
    mocker: Mocker,
    member: Member,
    matcher: Box<dyn ArgumentMatcher<A>>,
    _ret: PhantomData<fn() -> R>,
}

impl<P, A: 'static, R: 'static> FunctionReturnBuilder<P, A, R> {
    pub fn new<M>(parent: P, mocker: Mocker, member: Member, matcher: M)
        -> Self
        where M: ArgumentMatcher<A> + 'static
    {
        FunctionReturnBuilder {
            parent,
            mocker,
            member,
            matcher: Box::new(matcher),
            _ret: PhantomData,
        }
    }

    fn add<F>(self, kind: EffectKind, f: F) -> P
        where F: Fn(A) -> R + Send + Sync + 'static
    {
        self.mocker.add_return(self.member, self.matcher, Effect::new(kind, f));
        self.parent
    }

    /// Return a clone of `value` from every matching call this rule answers.
    pub fn will_return(self, value: R) -> P
        where R: Clone + Send + Sync
    {
        self.add(EffectKind::Return, move |_| value.clone())
    }

    /// Compute the return value from the call's arguments.
    ///
    /// The closure receives the argument tuple by value.  Reference
    /// arguments arrive as their owned counterparts.
    pub fn will_produce<F>(self, f: F) -> P
        where F: Fn(A) -> R + Send + Sync + 'static
    {
        self.add(EffectKind::Produce, f)
    }

    /// Single-threaded version of [`will_produce`](#method.will_produce).
    /// Can be used when the closure isn't `Send` or `Sync`.
    ///
    /// It is a runtime error to call the mock method from a different thread
    /// than the one that declared the rule.
    pub fn will_produce_st<F>(self, f: F) -> P
        where F: Fn(A) -> R + 'static
    {
        let fragile = Fragile::new(f);
        self.add(EffectKind::Produce, move |args| (fragile.get())(args))
    }
}

impl<P, A: 'static, T: 'static, E: 'static>
    FunctionReturnBuilder<P, A, Result<T, E>>
{
    /// Fail every matching call this rule answers with a clone of `error`.
    pub fn will_throw(self, error: E) -> P
        where E: Clone + Send + Sync
    {
        self.add(EffectKind::Throw, move |_| Err(error.clone()))
    }
}

impl<P, A, R> fmt::Debug for FunctionReturnBuilder<P, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionReturnBuilder")
            .field("member", &self.member)
            .field("matchers", &self.matcher.describe())
            .finish_non_exhaustive()
    }
}

/// Declares what a property getter returns.
pub struct PropertyReturnBuilder<P, T> {
    parent: P,
    mocker: Mocker,
    name: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<P, T: 'static> PropertyReturnBuilder<P, T> {
    pub fn new(parent: P, mocker: Mocker, name: &'static str) -> Self {
        PropertyReturnBuilder { parent, mocker, name, _value: PhantomData }
    }

    fn add<F>(self, kind: EffectKind, f: F) -> P
        where F: Fn(()) -> T + Send + Sync + 'static
    {
        self.mocker.add_return::<(), T>(Member::getter(self.name),
                                        Box::new(()), Effect::new(kind, f));
        self.parent
    }

    pub fn will_return(self, value: T) -> P
        where T: Clone + Send + Sync
    {
        self.add(EffectKind::Return, move |()| value.clone())
    }

    pub fn will_produce<F>(self, f: F) -> P
        where F: Fn() -> T + Send + Sync + 'static
    {
        self.add(EffectKind::Produce, move |()| f())
    }
}

impl<P, T> fmt::Debug for PropertyReturnBuilder<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyReturnBuilder")
            .field("property", &self.name)
            .finish_non_exhaustive()
    }
}

/// Declares a side effect of a method, for calls matching a set of argument
/// matchers.  Actions run before the return rule answers.
pub struct FunctionActionBuilder<P, A> {
    parent: P,
    mocker: Mocker,
    member: Member,
    matcher: Box<dyn ArgumentMatcher<A>>,
}

impl<P, A: 'static> FunctionActionBuilder<P, A> {
    pub fn new<M>(parent: P, mocker: Mocker, member: Member, matcher: M)
        -> Self
        where M: ArgumentMatcher<A> + 'static
    {
        FunctionActionBuilder {
            parent,
            mocker,
            member,
            matcher: Box::new(matcher),
        }
    }

    /// Run `f` with a copy of the arguments of each matching call.
    pub fn perform<F>(self, f: F) -> P
        where F: Fn(A) + Send + Sync + 'static
    {
        self.mocker.add_action(self.member, self.matcher,
                               Effect::new(EffectKind::Perform, f));
        self.parent
    }

    /// Single-threaded version of [`perform`](#method.perform).
    pub fn perform_st<F>(self, f: F) -> P
        where F: Fn(A) + 'static
    {
        let fragile = Fragile::new(f);
        self.perform(move |args| (fragile.get())(args))
    }
}

impl<P, A> fmt::Debug for FunctionActionBuilder<P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionActionBuilder")
            .field("member", &self.member)
            .field("matchers", &self.matcher.describe())
            .finish_non_exhaustive()
    }
}

/// Declares side effects of reading or writing a property.
///
/// `new_value` only restricts which writes trigger
/// [`perform_on_set`](#method.perform_on_set).
pub struct PropertyActionBuilder<P, T> {
    parent: P,
    mocker: Mocker,
    name: &'static str,
    new_value: Parameter<T>,
}

impl<P, T: 'static> PropertyActionBuilder<P, T> {
    pub fn new(parent: P, mocker: Mocker, name: &'static str,
               new_value: Parameter<T>) -> Self
    {
        PropertyActionBuilder { parent, mocker, name, new_value }
    }

    pub fn perform_on_get<F>(self, f: F) -> P
        where F: Fn() + Send + Sync + 'static
    {
        self.mocker.add_action::<()>(Member::getter(self.name), Box::new(()),
                                     Effect::new(EffectKind::PerformOnGet,
                                                 move |()| f()));
        self.parent
    }

    /// Run `f` with the value being written by each matching write.
    pub fn perform_on_set<F>(self, f: F) -> P
        where F: Fn(T) + Send + Sync + 'static
    {
        self.mocker.add_action::<(T,)>(Member::setter(self.name),
                                       Box::new((self.new_value,)),
                                       Effect::new(EffectKind::PerformOnSet,
                                                   move |(v,)| f(v)));
        self.parent
    }
}

impl<P, T> fmt::Debug for PropertyActionBuilder<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyActionBuilder")
            .field("property", &self.name)
            .field("new_value", &self.new_value)
            .finish_non_exhaustive()
    }
}

/// Verifies how often a method was called with matching arguments.
pub struct FunctionVerifyBuilder<P, A> {
    parent: P,
    verifier: Verifier,
    member: Member,
    matcher: Box<dyn ArgumentMatcher<A>>,
}

impl<P, A: 'static> FunctionVerifyBuilder<P, A> {
    pub fn new<M>(parent: P, verifier: Verifier, member: Member, matcher: M)
        -> Self
        where M: ArgumentMatcher<A> + 'static
    {
        FunctionVerifyBuilder {
            parent,
            verifier,
            member,
            matcher: Box::new(matcher),
        }
    }

    /// Check the number of matching calls against `count`: an integer, a
    /// range, or any [`Count`].
    pub fn called<C: Into<Count>>(self, count: C) -> P {
        self.verifier.check(self.member, &*self.matcher, count.into());
        self.parent
    }
}

impl<P, A> fmt::Debug for FunctionVerifyBuilder<P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionVerifyBuilder")
            .field("member", &self.member)
            .field("matchers", &self.matcher.describe())
            .finish_non_exhaustive()
    }
}

/// Verifies how often a property was read or written.
pub struct PropertyVerifyBuilder<P, T> {
    parent: P,
    verifier: Verifier,
    name: &'static str,
    new_value: Parameter<T>,
}

impl<P, T: 'static> PropertyVerifyBuilder<P, T> {
    pub fn new(parent: P, verifier: Verifier, name: &'static str,
               new_value: Parameter<T>) -> Self
    {
        PropertyVerifyBuilder { parent, verifier, name, new_value }
    }

    pub fn getter_called<C: Into<Count>>(self, count: C) -> P {
        self.verifier.check::<()>(Member::getter(self.name), &(),
                                  count.into());
        self.parent
    }

    /// Count only the writes whose value matches `new_value`.
    pub fn setter_called<C: Into<Count>>(self, count: C) -> P {
        self.verifier.check::<(T,)>(Member::setter(self.name),
                                    &(self.new_value,), count.into());
        self.parent
    }
}

impl<P, T> fmt::Debug for PropertyVerifyBuilder<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyVerifyBuilder")
            .field("property", &self.name)
            .field("new_value", &self.new_value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod t {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        invocation::Call,
        matcher::{any, value},
        policy::Fallback,
        Reporter,
    };

    const FETCH: Member = Member::method("fetch");

    type FetchReturns<P> =
        FunctionReturnBuilder<P, (u32,), Result<u32, String>>;

    fn fetch(mocker: &Mocker, x: u32) -> Result<u32, String> {
        let call = Call::new(FETCH, (x,), vec![x.to_string()]);
        mocker.resolve(call, Fallback::Strict)
    }

    fn get_url(mocker: &Mocker) -> String {
        mocker.resolve(Call::new(Member::getter("url"), (), Vec::new()),
                       Fallback::Strict)
    }

    fn set_url(mocker: &Mocker, v: String) {
        let rendered = vec![format!("{:?}", v)];
        mocker.resolve(Call::new(Member::setter("url"), (v,), rendered),
                       Fallback::Void(|| ()))
    }

    #[test]
    fn throw_then_return() {
        let mocker = Mocker::new("MockFoo");
        FetchReturns::new((), mocker.clone(), FETCH, (any(),))
            .will_throw("boom".to_owned());
        FetchReturns::new((), mocker.clone(), FETCH, (any(),))
            .will_return(Ok(5));
        assert_eq!(Err("boom".to_owned()), fetch(&mocker, 1));
        assert_eq!(Ok(5), fetch(&mocker, 1));
        assert_eq!(Ok(5), fetch(&mocker, 1));
    }

    #[test]
    fn produce_sees_arguments() {
        let mocker = Mocker::new("MockFoo");
        FetchReturns::new((), mocker.clone(), FETCH, (any(),))
            .will_produce(|(x,)| Ok(x + 1));
        assert_eq!(Ok(8), fetch(&mocker, 7));
    }

    #[test]
    fn produce_st() {
        let mocker = Mocker::new("MockFoo");
        let local = std::rc::Rc::new(3u32);
        FetchReturns::new((), mocker.clone(), FETCH, (any(),))
            .will_produce_st(move |(x,)| Ok(x * *local));
        assert_eq!(Ok(6), fetch(&mocker, 2));
    }

    #[test]
    fn parent_is_returned() {
        let mocker = Mocker::new("MockFoo");
        let parent = FetchReturns::new("parent", mocker, FETCH, (value(1),))
            .will_return(Ok(1));
        assert_eq!("parent", parent);
    }

    #[test]
    fn property_rules() {
        let mocker = Mocker::new("MockFoo");
        let written = Arc::new(Mutex::new(Vec::new()));
        let w = written.clone();
        PropertyReturnBuilder::new((), mocker.clone(), "url")
            .will_return("http://a".to_owned());
        PropertyActionBuilder::new((), mocker.clone(), "url",
                                   value("http://b".to_owned()))
            .perform_on_set(move |v| w.lock().unwrap().push(v));
        assert_eq!("http://a", get_url(&mocker));
        set_url(&mocker, "http://b".to_owned());
        set_url(&mocker, "http://c".to_owned());
        assert_eq!(vec!["http://b".to_owned()], *written.lock().unwrap());
    }

    #[test]
    fn verify_properties() {
        let mocker = Mocker::new("MockFoo");
        PropertyReturnBuilder::new((), mocker.clone(), "url")
            .will_return(String::new());
        get_url(&mocker);
        set_url(&mocker, "x".to_owned());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let reporter: Arc<dyn Reporter> = Arc::new(move |ok: bool, _: &str| {
            s.lock().unwrap().push(ok);
        });
        let verifier = Verifier::new(mocker.clone(), reporter);
        PropertyVerifyBuilder::new((), verifier.clone(), "url", any::<String>())
            .getter_called(1);
        PropertyVerifyBuilder::new((), verifier.clone(), "url", any::<String>())
            .setter_called(1);
        PropertyVerifyBuilder::new((), verifier.clone(), "url",
                                   value("y".to_owned()))
            .setter_called(Count::never());
        FunctionVerifyBuilder::<_, (u32,)>::new((), verifier, FETCH, (any(),))
            .called(0);
        assert_eq!(vec![true, true, true, true], *seen.lock().unwrap());
    }
}
