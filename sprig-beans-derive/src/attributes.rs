use syn::{Attribute, Error, LitStr, Token, Type};

pub const BEAN: &str = "bean";

#[derive(Default)]
pub struct FieldAttributes {
    /// `Some(None)` exposes the property under the field name.
    pub property: Option<Option<LitStr>>,
    pub autowired: bool,
    pub skip: bool,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut attributes = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("property") {
                if meta.input.peek(Token![=]) {
                    attributes.property = Some(Some(meta.value()?.parse()?));
                } else {
                    attributes.property = Some(None);
                }
            } else if meta.path.is_ident("autowired") {
                attributes.autowired = true;
            } else if meta.path.is_ident("skip") {
                attributes.skip = true;
            } else {
                return Err(meta.error("unsupported bean field attribute"));
            }

            Ok(())
        })?;

        if attributes.autowired && attributes.property.is_some() {
            return Err(Error::new_spanned(
                value,
                "A field cannot be both autowired and a property!",
            ));
        }

        Ok(attributes)
    }
}

#[derive(Default)]
pub struct BeanAttributes {
    pub name: Option<LitStr>,
    pub default: bool,
    pub constructor: bool,
    pub factory_aware: bool,
    pub aliases: Vec<Type>,
}

impl TryFrom<&Attribute> for BeanAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut attributes = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                attributes.name = Some(meta.value().and_then(|value| value.parse())?);
            } else if meta.path.is_ident("default") {
                attributes.default = true;
            } else if meta.path.is_ident("constructor") {
                attributes.constructor = true;
            } else if meta.path.is_ident("factory_aware") {
                attributes.factory_aware = true;
            } else if meta.path.is_ident("alias") {
                let alias: LitStr = meta.value()?.parse()?;
                attributes.aliases.push(alias.parse()?);
            } else {
                return Err(meta.error("unsupported bean attribute"));
            }

            Ok(())
        })?;

        Ok(attributes)
    }
}
