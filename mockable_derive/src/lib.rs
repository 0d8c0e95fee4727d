// vim: tw=80
//! Proc Macros for use with Mockable
//!
//! You probably don't want to use this crate directly.  Instead, you use use
//! its reexports via the [`mockable`](../mockable/index.html) crate.

extern crate proc_macro;

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ItemTrait;

mod codegen;
mod member;
mod service;

use crate::service::Service;

/// Generate a mock implementation of a trait.
///
/// For a trait `Foo`, this emits
/// * `MockFoo`, which implements `Foo` and [`Mockable`],
/// * `MockFooReturnBuilder`, `MockFooActionBuilder` and
///   `MockFooVerifyBuilder`, with one method per member of `Foo`.
///
/// A method can be turned into one half of a property with
/// `#[mockable(get)]` (no arguments, returns the property's value) or
/// `#[mockable(set)]` (one argument, named `set_<property>`).
///
/// ```ignore
/// #[mockable]
/// pub trait Thermostat {
///     fn read(&self, sensor: &str) -> Result<f32, String>;
///     #[mockable(get)]
///     fn target(&self) -> f32;
///     #[mockable(set)]
///     fn set_target(&self, target: f32);
/// }
/// ```
///
/// Generic traits, associated types and constants, generic or static
/// methods, receivers other than `&self` and `&mut self`, `impl Trait`,
/// `Self`, borrowed types other than top-level reference arguments, and
/// reference return types are rejected.
///
/// [`Mockable`]: ../mockable/trait.Mockable.html
#[proc_macro_attribute]
pub fn mockable(attrs: proc_macro::TokenStream, input: proc_macro::TokenStream)
    -> proc_macro::TokenStream
{
    do_mockable(attrs.into(), input.into()).into()
}

fn do_mockable(attrs: TokenStream, input: TokenStream) -> TokenStream {
    let mut item: ItemTrait = match syn::parse2(input) {
        Ok(item) => item,
        Err(_) => return syn::Error::new(Span::call_site(),
            "#[mockable] can only be applied to traits").into_compile_error()
    };
    // Parse first: it strips the helper attributes even when it fails.
    let service = Service::parse(&mut item);
    let generated = check_attrs(&attrs)
        .and(service)
        .map(|service| service.generate())
        .unwrap_or_else(syn::Error::into_compile_error);
    quote! {
        #item
        #generated
    }
}

fn check_attrs(attrs: &TokenStream) -> syn::Result<()> {
    if attrs.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(attrs,
            "#[mockable] on a trait takes no arguments"))
    }
}
