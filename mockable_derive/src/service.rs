// vim: tw=80
//! Validation of a trait annotated with `#[mockable]`.

use quote::format_ident;
use syn::{
    spanned::Spanned,
    Attribute,
    Error,
    Ident,
    ItemTrait,
    Result,
    TraitItem,
    Type,
    Visibility,
};

use crate::member::{MockMember, Role};

/// A getter, a setter, or both, sharing a name.
pub(crate) struct Property {
    pub(crate) name: String,
    /// The getter's return type, or the setter's argument type if there is
    /// no getter
    pub(crate) ty: Type,
    pub(crate) getter: Option<Ident>,
    /// The setter and the type of its argument
    pub(crate) setter: Option<(Ident, Type)>,
}

pub(crate) struct Service {
    pub(crate) vis: Visibility,
    pub(crate) trait_ident: Ident,
    pub(crate) mock: Ident,
    pub(crate) is_unsafe: bool,
    pub(crate) members: Vec<MockMember>,
    pub(crate) properties: Vec<Property>,
}

impl Service {
    /// Analyze `item`, removing the `#[mockable(..)]` helper attributes from
    /// its methods.  The attributes are removed even if analysis fails.
    pub(crate) fn parse(item: &mut ItemTrait) -> Result<Self> {
        let roles: Vec<Result<Role>> = item.items.iter_mut()
            .map(|ti| match ti {
                TraitItem::Fn(f) => take_role(&mut f.attrs),
                _ => Ok(Role::Method)
            }).collect();

        if !item.generics.params.is_empty() ||
            item.generics.where_clause.is_some()
        {
            return Err(Error::new(item.generics.span(),
                "mockable does not support generic traits"));
        }

        let mut members = Vec::new();
        for (ti, role) in item.items.iter().zip(roles) {
            match ti {
                TraitItem::Fn(f) => members.push(MockMember::new(f, role?)?),
                TraitItem::Type(t) => return Err(Error::new(t.span(),
                    "mockable does not support associated types")),
                TraitItem::Const(c) => return Err(Error::new(c.span(),
                    "mockable does not support associated constants")),
                other => return Err(Error::new(other.span(),
                    "mockable does not support this kind of trait item"))
            }
        }
        let properties = properties(&members);

        Ok(Service {
            vis: item.vis.clone(),
            trait_ident: item.ident.clone(),
            mock: format_ident!("Mock{}", item.ident),
            is_unsafe: item.unsafety.is_some(),
            members,
            properties,
        })
    }

    pub(crate) fn service_name(&self) -> String {
        self.mock.to_string()
    }
}

/// Remove `#[mockable(get)]` and `#[mockable(set)]` from `attrs`, returning
/// the role they select.
fn take_role(attrs: &mut Vec<Attribute>) -> Result<Role> {
    let mut role = Ok(Role::Method);
    attrs.retain(|attr| {
        if !attr.path().is_ident("mockable") {
            return true;
        }
        let selected = attr.parse_args::<Ident>().and_then(|ident| {
            if ident == "get" {
                Ok(Role::Getter)
            } else if ident == "set" {
                Ok(Role::Setter)
            } else {
                Err(Error::new(ident.span(), "expected `get` or `set`"))
            }
        });
        role = match (&role, selected) {
            (Err(_), _) => role.clone(),
            (Ok(Role::Method), selected) => selected,
            (Ok(_), _) => Err(Error::new(attr.span(),
                "only one #[mockable(..)] attribute is allowed per method")),
        };
        false
    });
    role
}

fn properties(members: &[MockMember]) -> Vec<Property> {
    let mut properties: Vec<Property> = Vec::new();
    for m in members {
        let i = match properties.iter().position(|p| p.name == m.name) {
            Some(i) => i,
            None if m.role == Role::Method => continue,
            None => {
                let ty = match m.role {
                    Role::Getter => m.output.clone(),
                    _ => m.args[0].owned.clone(),
                };
                properties.push(Property {
                    name: m.name.clone(),
                    ty,
                    getter: None,
                    setter: None,
                });
                properties.len() - 1
            }
        };
        let p = &mut properties[i];
        match m.role {
            Role::Method => (),
            Role::Getter => {
                p.getter = Some(m.ident.clone());
                p.ty = m.output.clone();
            }
            Role::Setter => {
                p.setter = Some((m.ident.clone(), m.args[0].owned.clone()));
            }
        }
    }
    properties
}
