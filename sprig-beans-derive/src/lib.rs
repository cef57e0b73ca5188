use crate::bean::expand_bean;
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error};

mod attributes;
mod bean;

/// Generates a `BeanClass` for a struct and registers it for discovery by `TypeRegistry`. See the
/// `sprig_beans::bean_class` module for supported `#[bean]` attributes.
#[proc_macro_derive(Bean, attributes(bean))]
pub fn generate_bean(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_bean(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
