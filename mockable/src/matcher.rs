// vim: tw=80
//! Argument matchers.
//!
//! A [`Parameter`] decides whether one actual argument is acceptable.  Stub
//! declarations and verifications take one `Parameter` per formal argument;
//! the generated builders pack them into a tuple, which implements
//! [`ArgumentMatcher`] for the member's argument tuple.

use std::{
    fmt::{self, Debug, Display},
    sync::Arc,
};

use predicates::{prelude::*, reflection::PredicateReflection};
use predicates_tree::CaseTreeExt;

enum Kind<V> {
    Any,
    Value {
        predicate: Arc<dyn Predicate<V> + Send + Sync>,
        rendered: String,
    },
    Matching(Arc<dyn Predicate<V> + Send + Sync>),
}

/// Matcher for a single argument of type `V`.
///
/// Build one with [`any`], [`value`], [`matching`] or [`satisfies`].
/// Parameters are immutable and cheap to clone, so one matcher can be reused
/// in any number of declarations.
pub struct Parameter<V> {
    kind: Kind<V>,
}

/// Match any argument value.
pub fn any<V>() -> Parameter<V> {
    Parameter { kind: Kind::Any }
}

/// Match arguments equal to `expected`.
///
/// # Examples
/// ```
/// # use mockable::*;
/// let p = value(Some(42u32));
/// assert!(p.matches(&Some(42)));
/// assert!(!p.matches(&None));
/// ```
pub fn value<V>(expected: V) -> Parameter<V>
    where V: PartialEq + Debug + Send + Sync + 'static
{
    let rendered = format!("{:?}", expected);
    let predicate = Arc::new(predicate::eq(expected));
    Parameter { kind: Kind::Value { predicate, rendered } }
}

/// Match arguments for which `f` returns `true`.
///
/// # Examples
/// ```
/// # use mockable::*;
/// let even = matching(|x: &u32| x % 2 == 0);
/// assert!(even.matches(&4));
/// assert!(!even.matches(&5));
/// ```
pub fn matching<V, F>(f: F) -> Parameter<V>
    where F: Fn(&V) -> bool + Send + Sync + 'static, V: 'static
{
    Parameter { kind: Kind::Matching(Arc::new(Closure(f))) }
}

/// Match arguments accepted by any [`Predicate`] from the `predicates` crate.
///
/// # Examples
/// ```
/// # use mockable::*;
/// let p = satisfies(predicate::in_iter(vec![1, 2, 3]));
/// assert!(p.matches(&2));
/// assert!(!p.matches(&7));
/// ```
pub fn satisfies<V, P>(p: P) -> Parameter<V>
    where P: Predicate<V> + Send + Sync + 'static, V: 'static
{
    Parameter { kind: Kind::Matching(Arc::new(p)) }
}

impl<V> Parameter<V> {
    /// Does `actual` satisfy this matcher?
    ///
    /// A panic inside a user supplied predicate propagates to the caller.
    pub fn matches(&self, actual: &V) -> bool {
        match &self.kind {
            Kind::Any => true,
            Kind::Value { predicate, .. } | Kind::Matching(predicate) =>
                predicate.eval(actual)
        }
    }

    /// Describe why `actual` does not satisfy this matcher, or `None` if it
    /// does.
    pub fn explain(&self, actual: &V) -> Option<String> {
        match &self.kind {
            Kind::Any => None,
            Kind::Value { predicate, .. } | Kind::Matching(predicate) => {
                predicate.find_case(false, actual)
                    .map(|case| case.tree().to_string())
            }
        }
    }
}

impl<V> Clone for Parameter<V> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Any => Kind::Any,
            Kind::Value { predicate, rendered } => Kind::Value {
                predicate: predicate.clone(),
                rendered: rendered.clone()
            },
            Kind::Matching(predicate) => Kind::Matching(predicate.clone()),
        };
        Parameter { kind }
    }
}

impl<V> Debug for Parameter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl<V> Display for Parameter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Any => f.write_str("any"),
            Kind::Value { rendered, .. } => f.write_str(rendered),
            Kind::Matching(predicate) => write!(f, "{}", predicate),
        }
    }
}

/// Adapts a plain closure to the [`Predicate`] interface.
struct Closure<F>(F);

impl<F> Display for Closure<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("matching(..)")
    }
}

impl<F> PredicateReflection for Closure<F> {}

impl<V, F> Predicate<V> for Closure<F>
    where F: Fn(&V) -> bool
{
    fn eval(&self, variable: &V) -> bool {
        (self.0)(variable)
    }
}

/// An ordered set of matchers, one per formal argument of a member.
///
/// Implemented for `()` (members without arguments) and for tuples of
/// [`Parameter`]s matching tuples of the same arity.
pub trait ArgumentMatcher<A>: Send + Sync {
    /// Does every argument satisfy its matcher?
    fn matches(&self, args: &A) -> bool;

    /// Describe the first argument that fails its matcher.
    fn explain(&self, args: &A) -> Option<String>;

    /// Render the matchers, comma separated.
    fn describe(&self) -> String;
}

impl ArgumentMatcher<()> for () {
    fn matches(&self, _args: &()) -> bool {
        true
    }

    fn explain(&self, _args: &()) -> Option<String> {
        None
    }

    fn describe(&self) -> String {
        String::new()
    }
}

macro_rules! impl_argument_matcher {
    ($( $idx:tt: $ty:ident ),+) => {
        impl<$( $ty ),+> ArgumentMatcher<($( $ty, )+)>
            for ($( Parameter<$ty>, )+)
        {
            fn matches(&self, args: &($( $ty, )+)) -> bool {
                $( self.$idx.matches(&args.$idx) )&&+
            }

            fn explain(&self, args: &($( $ty, )+)) -> Option<String> {
                $(
                    if let Some(why) = self.$idx.explain(&args.$idx) {
                        return Some(format!("argument #{}: {}", $idx, why));
                    }
                )+
                None
            }

            fn describe(&self) -> String {
                [$( self.$idx.to_string() ),+].join(", ")
            }
        }
    };
}

impl_argument_matcher!(0: T0);
impl_argument_matcher!(0: T0, 1: T1);
impl_argument_matcher!(0: T0, 1: T1, 2: T2);
impl_argument_matcher!(0: T0, 1: T1, 2: T2, 3: T3);
impl_argument_matcher!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4);
impl_argument_matcher!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5);
impl_argument_matcher!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6);
impl_argument_matcher!(0: T0, 1: T1, 2: T2, 3: T3, 4: T4, 5: T5, 6: T6,
                       7: T7);
