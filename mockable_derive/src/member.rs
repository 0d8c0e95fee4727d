// vim: tw=80
//! Analysis of a single trait method.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_quote,
    spanned::Spanned,
    visit::{self, Visit},
    Error,
    FnArg,
    Ident,
    Lifetime,
    Pat,
    Result,
    ReturnType,
    Signature,
    TraitItemFn,
    Type,
    TypeImplTrait,
    TypePath,
    TypeReference,
};

/// Most arguments a mocked method may have.  Argument matchers are
/// implemented for tuples up to this size.
const MAX_ARGS: usize = 8;

/// How a method is mocked, as chosen with `#[mockable(get)]` and
/// `#[mockable(set)]`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Role {
    Method,
    Getter,
    Setter,
}

/// What an unstubbed call may fall back to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Fallback {
    Strict,
    Void,
    Optional,
}

pub(crate) struct MockArg {
    /// Name of the matcher parameter in the generated builders
    pub(crate) ident: Ident,
    /// Type recorded in the invocation log
    pub(crate) owned: Type,
    /// Converts the actual argument into `owned`
    pub(crate) to_owned: TokenStream,
}

pub(crate) struct MockMember {
    pub(crate) ident: Ident,
    pub(crate) role: Role,
    /// Name calls are recorded under.  For accessors, the property's name.
    pub(crate) name: String,
    /// Signature of the mock's implementation, with renamed arguments
    pub(crate) sig: Signature,
    pub(crate) args: Vec<MockArg>,
    /// `()` for methods without a return type
    pub(crate) output: Type,
    pub(crate) fallback: Fallback,
}

impl MockMember {
    pub(crate) fn new(item: &TraitItemFn, role: Role) -> Result<Self> {
        let sig = &item.sig;
        if !sig.generics.params.is_empty() ||
            sig.generics.where_clause.is_some()
        {
            return Err(Error::new(sig.generics.span(),
                "mockable does not support generic methods"));
        }
        if let Some(variadic) = &sig.variadic {
            return Err(Error::new(variadic.span(),
                "mockable does not support variadic methods"));
        }
        match sig.receiver() {
            None => return Err(Error::new(sig.ident.span(),
                "mockable does not support static methods")),
            Some(r) if r.reference.is_none() || r.colon_token.is_some() =>
                return Err(Error::new(r.span(),
                    "mockable only supports `&self` and `&mut self` receivers")),
            Some(_) => ()
        }

        let mut impl_sig = sig.clone();
        let mut args = Vec::new();
        for input in impl_sig.inputs.iter_mut() {
            let FnArg::Typed(pat_type) = input else {
                continue;
            };
            let i = args.len();
            let ident = match &*pat_type.pat {
                Pat::Ident(pi) if pi.subpat.is_none() => pi.ident.clone(),
                _ => format_ident!("arg{}", i)
            };
            let renamed = format_ident!("__mockable_arg{}", i);
            let (owned, to_owned) = owned_type(&pat_type.ty, &renamed)?;
            pat_type.attrs.clear();
            pat_type.pat = Box::new(parse_quote!(#renamed));
            args.push(MockArg { ident, owned, to_owned });
        }
        if args.len() > MAX_ARGS {
            return Err(Error::new(sig.inputs.span(),
                format!("mockable supports at most {} arguments", MAX_ARGS)));
        }

        let (output, fallback) = match &sig.output {
            ReturnType::Default => (parse_quote!(()), Fallback::Void),
            ReturnType::Type(_, ty) => {
                if let Type::Reference(r) = ungroup(ty) {
                    return Err(Error::new(r.span(),
                        "mockable does not support methods returning references"));
                }
                check_type(ty)?;
                let fallback = if is_unit(ty) {
                    Fallback::Void
                } else if is_option(ty) {
                    Fallback::Optional
                } else {
                    Fallback::Strict
                };
                ((**ty).clone(), fallback)
            }
        };

        let name = match role {
            Role::Method => sig.ident.to_string(),
            Role::Getter => {
                if !args.is_empty() {
                    return Err(Error::new(sig.inputs.span(),
                        "a #[mockable(get)] method takes no arguments"));
                }
                if fallback == Fallback::Void {
                    return Err(Error::new(sig.span(),
                        "a #[mockable(get)] method must return a value"));
                }
                sig.ident.to_string()
            }
            Role::Setter => {
                if args.len() != 1 {
                    return Err(Error::new(sig.inputs.span(),
                        "a #[mockable(set)] method takes exactly one argument"));
                }
                if !matches!(sig.output, ReturnType::Default) {
                    return Err(Error::new(sig.output.span(),
                        "a #[mockable(set)] method must not return a value"));
                }
                match sig.ident.to_string().strip_prefix("set_") {
                    Some(property) if !property.is_empty() =>
                        property.to_owned(),
                    _ => return Err(Error::new(sig.ident.span(),
                        "a #[mockable(set)] method must be named `set_<property>`"))
                }
            }
        };

        Ok(MockMember {
            ident: sig.ident.clone(),
            role,
            name,
            sig: impl_sig,
            args,
            output,
            fallback,
        })
    }

    /// Expression evaluating to the member's `Member` identity
    pub(crate) fn member_expr(&self) -> TokenStream {
        let name = &self.name;
        match self.role {
            Role::Method => quote!(::mockable::Member::method(#name)),
            Role::Getter => quote!(::mockable::Member::getter(#name)),
            Role::Setter => quote!(::mockable::Member::setter(#name)),
        }
    }

    pub(crate) fn fallback_expr(&self) -> TokenStream {
        match self.fallback {
            Fallback::Strict => quote!(::mockable::Fallback::Strict),
            Fallback::Void => quote!(::mockable::Fallback::Void(|| ())),
            Fallback::Optional => quote!(
                ::mockable::Fallback::Optional(|| ::std::option::Option::None)
            ),
        }
    }

    /// Tuple type of the recorded arguments
    pub(crate) fn args_type(&self) -> TokenStream {
        let owned = self.args.iter().map(|a| &a.owned);
        quote!((#(#owned,)*))
    }
}

/// The owned type recorded for an argument of type `ty`, and an expression
/// converting the argument `arg` into it.
fn owned_type(ty: &Type, arg: &Ident) -> Result<(Type, TokenStream)> {
    match ungroup(ty) {
        Type::Reference(r) => {
            check_type(&r.elem)?;
            let elem = &r.elem;
            Ok((parse_quote!(<#elem as ::std::borrow::ToOwned>::Owned),
                quote!(<#elem as ::std::borrow::ToOwned>::to_owned(#arg))))
        }
        _ => {
            check_type(ty)?;
            Ok((ty.clone(), quote!(#arg)))
        }
    }
}

fn ungroup(ty: &Type) -> &Type {
    match ty {
        Type::Group(g) => ungroup(&g.elem),
        Type::Paren(p) => ungroup(&p.elem),
        _ => ty
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ungroup(ty), Type::Tuple(t) if t.elems.is_empty())
}

fn is_option(ty: &Type) -> bool {
    match ungroup(ty) {
        Type::Path(tp) if tp.qself.is_none() => tp.path.segments.last()
            .map(|seg| seg.ident == "Option")
            .unwrap_or(false),
        _ => false
    }
}

/// Rejects types that cannot be stored in a mock's registry.
#[derive(Default)]
struct TypeChecker {
    error: Option<Error>,
}

impl TypeChecker {
    fn fail<S: Spanned>(&mut self, s: &S, msg: &str) {
        if self.error.is_none() {
            self.error = Some(Error::new(s.span(), msg));
        }
    }
}

impl<'ast> Visit<'ast> for TypeChecker {
    fn visit_lifetime(&mut self, lt: &'ast Lifetime) {
        if lt.ident != "static" {
            self.fail(lt, "mockable does not support non-'static lifetimes");
        }
    }

    fn visit_type_impl_trait(&mut self, it: &'ast TypeImplTrait) {
        self.fail(it, "mockable does not support `impl Trait`");
    }

    fn visit_type_path(&mut self, tp: &'ast TypePath) {
        let is_self = tp.qself.is_none() && tp.path.segments.first()
            .map(|seg| seg.ident == "Self")
            .unwrap_or(false);
        if is_self {
            self.fail(tp, "mockable does not support `Self` in signatures");
        }
        visit::visit_type_path(self, tp);
    }

    fn visit_type_reference(&mut self, r: &'ast TypeReference) {
        if r.lifetime.is_none() {
            self.fail(r,
                "mockable only supports references as top-level arguments");
        }
        visit::visit_type_reference(self, r);
    }
}

fn check_type(ty: &Type) -> Result<()> {
    let mut checker = TypeChecker::default();
    checker.visit_type(ty);
    checker.error.map_or(Ok(()), Err)
}
