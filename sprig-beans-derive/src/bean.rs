use crate::attributes::{BeanAttributes, FieldAttributes, BEAN};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::spanned::Spanned;
use syn::{Attribute, Data, DataStruct, DeriveInput, Error, Field, Fields, Index, Member, Result};

struct BeanField<'a> {
    field: &'a Field,
    member: Member,
    attributes: FieldAttributes,
}

impl BeanField<'_> {
    fn property_name(&self) -> Result<Option<String>> {
        match (&self.attributes.property, &self.member) {
            (None, _) => Ok(None),
            (Some(Some(name)), _) => Ok(Some(name.value())),
            (Some(None), Member::Named(ident)) => Ok(Some(ident.to_string())),
            (Some(None), Member::Unnamed(_)) => Err(Error::new(
                self.field.span(),
                "Properties of tuple structs need an explicit name!",
            )),
        }
    }
}

fn extract_field_attributes(attributes: &[Attribute]) -> Result<FieldAttributes> {
    attributes
        .iter()
        .find(|attribute| attribute.path().is_ident(BEAN))
        .map(FieldAttributes::try_from)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn extract_bean_attributes(attributes: &[Attribute]) -> Result<BeanAttributes> {
    attributes
        .iter()
        .find(|attribute| attribute.path().is_ident(BEAN))
        .map(BeanAttributes::try_from)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn collect_fields(fields: &Fields) -> Result<Vec<BeanField>> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let member = field
                .ident
                .clone()
                .map(Member::Named)
                .unwrap_or_else(|| Member::Unnamed(Index::from(index)));

            Ok(BeanField {
                field,
                member,
                attributes: extract_field_attributes(&field.attrs)?,
            })
        })
        .try_collect()
}

fn generate_constructor(ident: &Ident, fields: &Fields, bean_fields: &[BeanField]) -> TokenStream {
    let mut position = 0usize;
    let mut parameter_types = vec![];
    let values = bean_fields
        .iter()
        .map(|bean_field| {
            let member = &bean_field.member;
            let ty = &bean_field.field.ty;

            let value = if bean_field.attributes.skip || bean_field.attributes.autowired {
                quote!(std::default::Default::default())
            } else {
                parameter_types.push(quote! {
                    <#ty as sprig_beans::value::FromValue>::value_type()
                });

                let value = quote! {
                    sprig_beans::bean_class::internal::next_argument::<#ty>(&mut arguments, #position)?
                };
                position += 1;
                value
            };

            (member, value)
        })
        .collect_vec();

    let construction = match fields {
        Fields::Named(_) => {
            let fields = values
                .iter()
                .map(|(member, value)| quote!(#member: #value));
            quote!(#ident { #(#fields),* })
        }
        Fields::Unnamed(_) => {
            let fields = values.iter().map(|(_, value)| value);
            quote!(#ident(#(#fields),*))
        }
        Fields::Unit => quote!(#ident),
    };

    quote! {
        .with_constructor(
            vec![#(#parameter_types),*],
            |arguments| {
                #[allow(unused_mut, unused_variables)]
                let mut arguments = arguments.into_iter().enumerate();
                Ok(Box::new(#construction) as sprig_beans::bean_class::BeanBox)
            },
        )
    }
}

fn generate_properties(ident: &Ident, bean_fields: &[BeanField]) -> Result<Vec<TokenStream>> {
    bean_fields
        .iter()
        .filter_map(|bean_field| {
            bean_field
                .property_name()
                .map(|name| name.map(|name| (bean_field, name)))
                .transpose()
        })
        .map(|property| {
            let (bean_field, name) = property?;
            let member = &bean_field.member;
            let ty = &bean_field.field.ty;

            Ok(quote! {
                .with_property(
                    #name,
                    <#ty as sprig_beans::value::FromValue>::value_type(),
                    |bean, value| {
                        sprig_beans::bean_class::internal::set_property::<#ident, #ty>(
                            bean,
                            value,
                            |target, value| target.#member = value,
                        )
                    },
                )
            })
        })
        .try_collect()
}

fn generate_injection_points(ident: &Ident, bean_fields: &[BeanField]) -> Vec<TokenStream> {
    bean_fields
        .iter()
        .filter(|bean_field| bean_field.attributes.autowired)
        .map(|bean_field| {
            let member = &bean_field.member;
            let ty = &bean_field.field.ty;
            let field_name = quote!(#member).to_string();

            quote! {
                .with_injection_point(
                    #field_name,
                    <#ty as sprig_beans::autowired::Autowirable>::dependency_descriptor(),
                    |bean, dependency| {
                        sprig_beans::bean_class::internal::inject_dependency::<#ident, #ty>(
                            bean,
                            dependency,
                            |target, value| target.#member = value,
                        )
                    },
                )
            }
        })
        .collect()
}

pub fn expand_bean(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(input.span(), "Can only derive Bean on structs!"));
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Bean types cannot be generic!",
        ));
    }

    let ident = &input.ident;
    let attributes = extract_bean_attributes(&input.attrs)?;
    let bean_fields = collect_fields(fields)?;

    let name = attributes
        .name
        .as_ref()
        .map(|name| quote!(#name))
        .unwrap_or_else(|| quote!(concat!(module_path!(), "::", stringify!(#ident))));

    let default_constructor = attributes.default.then(|| {
        quote! {
            .with_default_constructor(sprig_beans::bean_class::internal::default_constructor::<#ident>)
        }
    });

    let constructor = attributes
        .constructor
        .then(|| generate_constructor(ident, fields, &bean_fields));

    let properties = generate_properties(ident, &bean_fields)?;
    let injection_points = generate_injection_points(ident, &bean_fields);

    let aliases = attributes.aliases.iter().map(|alias| {
        quote! {
            .with_alias::<#alias>(|bean| {
                bean.downcast::<#ident>()
                    .map(|bean| Box::new(bean as std::sync::Arc<#alias>) as Box<dyn std::any::Any>)
            })
        }
    });

    let factory_aware = attributes.factory_aware.then(|| {
        quote! {
            .with_factory_aware(sprig_beans::bean_class::internal::factory_aware::<#ident>)
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl sprig_beans::bean_class::BeanType for #ident {
            fn bean_class() -> sprig_beans::bean_class::BeanClass {
                sprig_beans::bean_class::BeanClass::of::<#ident>(#name)
                    #default_constructor
                    #constructor
                    #(#properties)*
                    #(#injection_points)*
                    #(#aliases)*
                    #factory_aware
            }
        }

        const _: () = {
            fn register() -> sprig_beans::bean_class::BeanClass {
                <#ident as sprig_beans::bean_class::BeanType>::bean_class()
            }

            sprig_beans::type_loader::internal::submit! {
                sprig_beans::type_loader::internal::BeanClassRegisterer {
                    register
                }
            };
        };
    })
}
