// vim: tw=80
//! Code generation for `#[mockable]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Index};

use crate::{
    member::{MockMember, Role},
    service::{Property, Service},
};

impl Service {
    fn return_builder(&self) -> Ident {
        format_ident!("{}ReturnBuilder", self.mock)
    }

    fn action_builder(&self) -> Ident {
        format_ident!("{}ActionBuilder", self.mock)
    }

    fn verify_builder(&self) -> Ident {
        format_ident!("{}VerifyBuilder", self.mock)
    }

    /// Everything emitted after the trait itself.
    pub(crate) fn generate(&self) -> TokenStream {
        let mock_struct = self.gen_struct();
        let trait_impl = self.gen_trait_impl();
        let mockable_impl = self.gen_mockable_impl();
        let return_builder = self.gen_return_builder();
        let action_builder = self.gen_action_builder();
        let verify_builder = self.gen_verify_builder();
        quote! {
            #mock_struct
            #trait_impl
            #mockable_impl
            #return_builder
            #action_builder
            #verify_builder
        }
    }

    fn gen_struct(&self) -> TokenStream {
        let vis = &self.vis;
        let mock = &self.mock;
        let name = self.service_name();
        let doc = format!("Mock implementation of [`{}`]", self.trait_ident);
        quote! {
            #[doc = #doc]
            #[derive(Clone, Debug)]
            #vis struct #mock {
                mocker: ::mockable::Mocker,
            }

            #[allow(dead_code)]
            impl #mock {
                /// Create a mock with the process-wide default policy.
                #vis fn new() -> Self {
                    #mock { mocker: ::mockable::Mocker::new(#name) }
                }

                #vis fn with_policy(policy: ::mockable::Policy) -> Self {
                    #mock {
                        mocker: ::mockable::Mocker::with_policy(#name, policy)
                    }
                }
            }

            impl ::std::default::Default for #mock {
                fn default() -> Self {
                    Self::new()
                }
            }
        }
    }

    fn gen_trait_impl(&self) -> TokenStream {
        let mock = &self.mock;
        let trait_ident = &self.trait_ident;
        let unsafety = if self.is_unsafe { quote!(unsafe) } else { quote!() };
        let methods = self.members.iter().map(MockMember::gen_impl_fn);
        quote! {
            #unsafety impl #trait_ident for #mock {
                #(#methods)*
            }
        }
    }

    fn gen_mockable_impl(&self) -> TokenStream {
        let mock = &self.mock;
        let rb = self.return_builder();
        let ab = self.action_builder();
        let vb = self.verify_builder();
        quote! {
            impl ::mockable::Mockable for #mock {
                type ReturnBuilder = #rb;
                type ActionBuilder = #ab;
                type VerifyBuilder = #vb;

                fn mocker(&self) -> &::mockable::Mocker {
                    &self.mocker
                }

                fn given(&self) -> #rb {
                    #rb { mocker: self.mocker.clone() }
                }

                fn when(&self) -> #ab {
                    #ab { mocker: self.mocker.clone() }
                }

                fn verify_with(&self,
                    reporter: ::std::sync::Arc<dyn ::mockable::Reporter>)
                    -> #vb
                {
                    #vb {
                        verifier: ::mockable::Verifier::new(
                            self.mocker.clone(), reporter)
                    }
                }
            }
        }
    }

    fn gen_return_builder(&self) -> TokenStream {
        let vis = &self.vis;
        let rb = self.return_builder();
        let doc = format!("Declares what a [`{}`] returns", self.mock);
        let methods = self.members.iter().filter_map(|m| match m.role {
            Role::Method => Some(m.gen_function_builder(
                vis, quote!(FunctionReturnBuilder), Some(&m.output), "mocker")),
            Role::Getter => {
                let p = self.property(m);
                Some(gen_property_builder(vis, &m.ident, p,
                    quote!(PropertyReturnBuilder), "mocker", NewValue::Unused))
            }
            Role::Setter => None,
        });
        quote! {
            #[doc = #doc]
            #[allow(dead_code)]
            #[derive(Clone, Debug)]
            #vis struct #rb {
                mocker: ::mockable::Mocker,
            }

            #[allow(dead_code)]
            impl #rb {
                #(#methods)*
            }
        }
    }

    fn gen_action_builder(&self) -> TokenStream {
        self.gen_effect_builder(self.action_builder(),
            "Declares side effects of", quote!(FunctionActionBuilder),
            quote!(PropertyActionBuilder), quote!(mocker: ::mockable::Mocker),
            "mocker")
    }

    fn gen_verify_builder(&self) -> TokenStream {
        self.gen_effect_builder(self.verify_builder(), "Verifies calls to",
            quote!(FunctionVerifyBuilder), quote!(PropertyVerifyBuilder),
            quote!(verifier: ::mockable::Verifier), "verifier")
    }

    /// Action and verify builders have the same shape: one method per
    /// method, one per getter and one per setter.
    fn gen_effect_builder(&self, ident: Ident, what: &str,
                          function: TokenStream, property: TokenStream,
                          field: TokenStream, field_name: &str)
        -> TokenStream
    {
        let vis = &self.vis;
        let doc = format!("{} a [`{}`]", what, self.mock);
        let methods = self.members.iter().map(|m| match m.role {
            Role::Method => m.gen_function_builder(vis, function.clone(), None,
                                                   field_name),
            Role::Getter => gen_property_builder(vis, &m.ident,
                self.property(m), property.clone(), field_name, NewValue::Any),
            Role::Setter => gen_property_builder(vis, &m.ident,
                self.property(m), property.clone(), field_name,
                NewValue::Param(&m.args[0].ident)),
        });
        quote! {
            #[doc = #doc]
            #[allow(dead_code)]
            #[derive(Clone, Debug)]
            #vis struct #ident {
                #field,
            }

            #[allow(dead_code)]
            impl #ident {
                #(#methods)*
            }
        }
    }

    fn property(&self, m: &MockMember) -> &Property {
        self.properties.iter()
            .find(|p| p.name == m.name)
            .expect("every accessor belongs to a property")
    }
}

impl MockMember {
    /// The mock's implementation of this method: record the call and let the
    /// resolution engine answer it.
    fn gen_impl_fn(&self) -> TokenStream {
        let sig = &self.sig;
        let to_owned = self.args.iter().map(|a| &a.to_owned);
        let idx = (0..self.args.len()).map(Index::from);
        let member = self.member_expr();
        let fallback = self.fallback_expr();
        quote! {
            #sig {
                #[allow(unused_imports)]
                use ::mockable::__private::{ViaDebug as _, ViaNothing as _};
                let __mockable_args = (#(#to_owned,)*);
                let __mockable_rendered = ::std::vec![#(
                    (&&::mockable::__private::ArgPrinter(&__mockable_args.#idx))
                        .debug_string()
                ),*];
                self.mocker.resolve(
                    ::mockable::Call::new(#member, __mockable_args,
                                          __mockable_rendered),
                    #fallback)
            }
        }
    }

    /// A builder method handing out one of the generic function handles.
    /// `output` is only needed by return builders.
    fn gen_function_builder(&self, vis: &syn::Visibility, handle: TokenStream,
                            output: Option<&syn::Type>, field_name: &str)
        -> TokenStream
    {
        let ident = &self.ident;
        let params: Vec<&Ident> = self.args.iter().map(|a| &a.ident).collect();
        let owned = self.args.iter().map(|a| &a.owned);
        let args_type = self.args_type();
        let member = self.member_expr();
        let field = format_ident!("{}", field_name);
        let local = format_ident!("__mockable_{}", field_name);
        let output = output.map(|o| quote!(, #o));
        quote! {
            #vis fn #ident(self #(, #params: ::mockable::Parameter<#owned>)*)
                -> ::mockable::#handle<Self, #args_type #output>
            {
                let #local = self.#field.clone();
                ::mockable::#handle::new(self, #local, #member,
                                         (#(#params,)*))
            }
        }
    }
}

/// What a property builder method passes for the value being written.
#[derive(Clone, Copy)]
enum NewValue<'a> {
    /// Return builders only deal with reads
    Unused,
    /// Getters accept writes of any value
    Any,
    /// Setters take a matcher parameter of this name
    Param(&'a Ident),
}

/// A builder method handing out one of the generic property handles.
fn gen_property_builder(vis: &syn::Visibility, ident: &Ident, p: &Property,
                        handle: TokenStream, field_name: &str,
                        new_value: NewValue)
    -> TokenStream
{
    let name = &p.name;
    let ty = &p.ty;
    let field = format_ident!("{}", field_name);
    let local = format_ident!("__mockable_{}", field_name);
    let (param, ctor_args) = match new_value {
        NewValue::Unused => (None, quote!(self, #local, #name)),
        NewValue::Any =>
            (None, quote!(self, #local, #name, ::mockable::any())),
        NewValue::Param(nv) => (Some(quote!(, #nv: ::mockable::Parameter<#ty>)),
                                quote!(self, #local, #name, #nv)),
    };
    // Fails to compile if the setter's argument type differs from the
    // getter's return type.
    let same_type = match (&p.setter, new_value) {
        (Some((_, setter_ty)), NewValue::Param(_)) =>
            Some(quote!(let _: fn(#setter_ty) -> #ty = |v| v;)),
        _ => None
    };
    quote! {
        #vis fn #ident(self #param) -> ::mockable::#handle<Self, #ty> {
            #same_type
            let #local = self.#field.clone();
            ::mockable::#handle::new(#ctor_args)
        }
    }
}

#[cfg(test)]
mod t {
    use pretty_assertions::assert_eq;
    use syn::{ItemTrait, TraitItemFn};

    use super::*;

    fn member(item: TokenStream, role: Role) -> MockMember {
        let item: TraitItemFn = syn::parse2(item).unwrap();
        MockMember::new(&item, role).unwrap()
    }

    fn service(input: TokenStream) -> Service {
        let mut item: ItemTrait = syn::parse2(input).unwrap();
        Service::parse(&mut item).unwrap()
    }

    #[test]
    fn impl_fn() {
        let m = member(quote!(fn fetch(&self, id: u32, name: &str) -> u64;),
                       Role::Method);
        let expected = quote! {
            fn fetch(&self, __mockable_arg0: u32, __mockable_arg1: &str) -> u64 {
                #[allow(unused_imports)]
                use ::mockable::__private::{ViaDebug as _, ViaNothing as _};
                let __mockable_args = (
                    __mockable_arg0,
                    <str as ::std::borrow::ToOwned>::to_owned(__mockable_arg1),
                );
                let __mockable_rendered = ::std::vec![
                    (&&::mockable::__private::ArgPrinter(&__mockable_args.0))
                        .debug_string(),
                    (&&::mockable::__private::ArgPrinter(&__mockable_args.1))
                        .debug_string()
                ];
                self.mocker.resolve(
                    ::mockable::Call::new(::mockable::Member::method("fetch"),
                                          __mockable_args,
                                          __mockable_rendered),
                    ::mockable::Fallback::Strict)
            }
        };
        assert_eq!(expected.to_string(), m.gen_impl_fn().to_string());
    }

    #[test]
    fn impl_fn_without_arguments() {
        let m = member(quote!(async fn poll(&mut self) -> Option<u8>;),
                       Role::Method);
        let expected = quote! {
            async fn poll(&mut self) -> Option<u8> {
                #[allow(unused_imports)]
                use ::mockable::__private::{ViaDebug as _, ViaNothing as _};
                let __mockable_args = ();
                let __mockable_rendered = ::std::vec![];
                self.mocker.resolve(
                    ::mockable::Call::new(::mockable::Member::method("poll"),
                                          __mockable_args,
                                          __mockable_rendered),
                    ::mockable::Fallback::Optional(|| ::std::option::Option::None))
            }
        };
        assert_eq!(expected.to_string(), m.gen_impl_fn().to_string());
    }

    #[test]
    fn function_return_builder() {
        let m = member(quote!(fn fetch(&self, id: u32) -> Result<u32, E>;),
                       Role::Method);
        let vis: syn::Visibility = syn::parse_quote!(pub);
        // Compared as syntax trees, since nested generics may be rendered
        // with either `>>` or `> >`
        let expected: syn::ImplItemFn = syn::parse_quote! {
            pub fn fetch(self, id: ::mockable::Parameter<u32>)
                -> ::mockable::FunctionReturnBuilder<Self, (u32,), Result<u32, E>>
            {
                let __mockable_mocker = self.mocker.clone();
                ::mockable::FunctionReturnBuilder::new(self, __mockable_mocker,
                    ::mockable::Member::method("fetch"), (id,))
            }
        };
        let generated = m.gen_function_builder(&vis,
            quote!(FunctionReturnBuilder), Some(&m.output), "mocker");
        let generated: syn::ImplItemFn = syn::parse2(generated).unwrap();
        assert_eq!(expected, generated);
    }

    #[test]
    fn function_verify_builder() {
        let m = member(quote!(fn ping(&self);), Role::Method);
        let vis = syn::Visibility::Inherited;
        let expected = quote! {
            fn ping(self) -> ::mockable::FunctionVerifyBuilder<Self, ()> {
                let __mockable_verifier = self.verifier.clone();
                ::mockable::FunctionVerifyBuilder::new(self,
                    __mockable_verifier, ::mockable::Member::method("ping"), ())
            }
        };
        let generated = m.gen_function_builder(&vis,
            quote!(FunctionVerifyBuilder), None, "verifier");
        assert_eq!(expected.to_string(), generated.to_string());
    }

    #[test]
    fn property_builders() {
        let s = service(quote! {
            trait Config {
                #[mockable(get)]
                fn url(&self) -> String;
                #[mockable(set)]
                fn set_url(&self, url: String);
            }
        });
        let p = &s.properties[0];
        let getter = gen_property_builder(&s.vis, &format_ident!("url"), p,
            quote!(PropertyActionBuilder), "mocker", NewValue::Any);
        let expected = quote! {
            fn url(self) -> ::mockable::PropertyActionBuilder<Self, String> {
                let __mockable_mocker = self.mocker.clone();
                ::mockable::PropertyActionBuilder::new(self, __mockable_mocker,
                    "url", ::mockable::any())
            }
        };
        assert_eq!(expected.to_string(), getter.to_string());

        let setter = gen_property_builder(&s.vis, &format_ident!("set_url"), p,
            quote!(PropertyVerifyBuilder), "verifier",
            NewValue::Param(&format_ident!("url")));
        let expected = quote! {
            fn set_url(self, url: ::mockable::Parameter<String>)
                -> ::mockable::PropertyVerifyBuilder<Self, String>
            {
                let _: fn(String) -> String = |v| v;
                let __mockable_verifier = self.verifier.clone();
                ::mockable::PropertyVerifyBuilder::new(self,
                    __mockable_verifier, "url", url)
            }
        };
        assert_eq!(expected.to_string(), setter.to_string());
    }

    #[test]
    fn unsafe_trait_impl() {
        let s = service(quote! {
            unsafe trait Raw {
                unsafe fn peek(&self, addr: usize) -> u8;
            }
        });
        let generated = s.gen_trait_impl().to_string();
        let head = quote!(unsafe impl Raw for MockRaw).to_string();
        assert!(generated.starts_with(&head), "{}", generated);
        assert!(generated.contains(
            &quote!(unsafe fn peek(&self, __mockable_arg0: usize) -> u8)
                .to_string()));
    }

    #[test]
    fn setters_have_no_return_builder_method() {
        let s = service(quote! {
            trait Sink {
                #[mockable(set)]
                fn set_level(&self, level: u8);
            }
        });
        let generated = s.gen_return_builder().to_string();
        assert!(!generated.contains("set_level"), "{}", generated);
        let generated = s.gen_action_builder().to_string();
        assert!(generated.contains("set_level"), "{}", generated);
    }
}
