//! Runtime description of a bean type. A [BeanClass] is the only place the container learns how to
//! construct an object, which members it can set and which other types it can be viewed as. The
//! container itself never inspects bean types directly.
//!
//! Classes can be built by hand with the `with_*` methods, or generated for plain structs with
//! `#[derive(Bean)]` when the `derive` feature is enabled:
//!
//! ```
//! use sprig_beans::Bean;
//! use std::sync::Arc;
//!
//! #[derive(Bean, Default)]
//! #[bean(default, constructor, name = "doc::Repository")]
//! struct Repository {
//!     #[bean(property)]
//!     url: String,
//!     #[bean(property = "pool")]
//!     pool_size: u32,
//! }
//!
//! #[derive(Bean, Default)]
//! #[bean(default)]
//! struct Service {
//!     #[bean(autowired)]
//!     repository: Option<Arc<Repository>>,
//! }
//! ```
//!
//! ### Supported `#[bean]` struct configuration
//!
//! * `name = "name"` - type name used in definitions; defaults to the module path of the struct
//! followed by its identifier
//! * `default` - construct with `Default::default()` when a definition has no constructor arguments
//! * `constructor` - generate a positional constructor over all fields except `skip` and
//! `autowired` ones, which are default-initialized
//! * `alias = "dyn Trait + Send + Sync"` - the type is assignable to the given type; can be repeated
//! * `factory_aware` - call [BeanFactoryAware](crate::bean_factory::BeanFactoryAware) during
//! initialization
//!
//! ### Supported `#[bean]` field configuration
//!
//! * `property` or `property = "name"` - expose a setter under the field name or the given name
//! * `autowired` - inject by type through the
//! [AutowiredPostProcessor](crate::autowired::AutowiredPostProcessor); `Arc<T>` fields are required,
//! `Option<Arc<T>>` optional
//! * `skip` - leave out of the generated constructor

use crate::bean_factory::BeanFactoryRef;
use crate::error::ErrorPtr;
use crate::value::{Value, ValueType};
use derivative::Derivative;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

/// Shared pointer to a finished bean.
pub type BeanPtr = Arc<dyn Any + Send + Sync>;

/// Owned bean during construction, before it gets shared.
pub type BeanBox = Box<dyn Any + Send + Sync>;

pub type BeanClassPtr = Arc<BeanClass>;

pub type DefaultConstructor = fn() -> Result<BeanBox, ErrorPtr>;

pub type ConstructorFunction = fn(arguments: Vec<Value>) -> Result<BeanBox, ErrorPtr>;

pub type SetterFunction = fn(bean: &mut (dyn Any + Send + Sync), value: Value) -> Result<(), ErrorPtr>;

pub type InjectFunction =
    fn(bean: &mut (dyn Any + Send + Sync), dependency: Option<BeanPtr>) -> Result<(), ErrorPtr>;

pub type FactoryAwareFunction =
    fn(bean: &mut (dyn Any + Send + Sync), bean_factory: BeanFactoryRef) -> Result<(), ErrorPtr>;

/// Casts a type-erased bean to the type the function was registered for. On success, the returned
/// box contains an `Arc<T>` for that target type `T`.
pub type CastFunction = fn(bean: BeanPtr) -> Result<Box<dyn Any>, BeanPtr>;

/// Types with a generated [BeanClass], usually via `#[derive(Bean)]`.
pub trait BeanType: Any + Send + Sync {
    fn bean_class() -> BeanClass;
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ConstructorDescriptor {
    parameter_types: Vec<ValueType>,
    #[derivative(Debug = "ignore")]
    construct: ConstructorFunction,
}

impl ConstructorDescriptor {
    #[inline]
    pub fn parameter_types(&self) -> &[ValueType] {
        &self.parameter_types
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    #[inline]
    pub fn construct(&self, arguments: Vec<Value>) -> Result<BeanBox, ErrorPtr> {
        (self.construct)(arguments)
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct PropertyDescriptor {
    name: String,
    value_type: ValueType,
    #[derivative(Debug = "ignore")]
    setter: SetterFunction,
}

impl PropertyDescriptor {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[inline]
    pub fn set(&self, bean: &mut (dyn Any + Send + Sync), value: Value) -> Result<(), ErrorPtr> {
        (self.setter)(bean, value)
    }
}

/// Describes a dependency to be resolved by type, rather than by name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DependencyDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    required: bool,
}

impl DependencyDescriptor {
    pub fn of<T: ?Sized + 'static>(required: bool) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            required,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct InjectionPoint {
    field_name: String,
    dependency: DependencyDescriptor,
    #[derivative(Debug = "ignore")]
    inject: InjectFunction,
}

impl InjectionPoint {
    #[inline]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    #[inline]
    pub fn dependency(&self) -> &DependencyDescriptor {
        &self.dependency
    }

    #[inline]
    pub fn inject(
        &self,
        bean: &mut (dyn Any + Send + Sync),
        dependency: Option<BeanPtr>,
    ) -> Result<(), ErrorPtr> {
        (self.inject)(bean, dependency)
    }
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
struct AliasDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    #[derivative(Debug = "ignore")]
    cast: CastFunction,
}

fn identity_cast<T: Any + Send + Sync>(bean: BeanPtr) -> Result<Box<dyn Any>, BeanPtr> {
    bean.downcast::<T>().map(|bean| Box::new(bean) as Box<dyn Any>)
}

/// Runtime description of a bean type. See module documentation for details.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct BeanClass {
    name: String,
    type_name: &'static str,
    own_type: AliasDescriptor,
    #[derivative(Debug = "ignore")]
    default_constructor: Option<DefaultConstructor>,
    constructors: Vec<ConstructorDescriptor>,
    properties: Vec<PropertyDescriptor>,
    aliases: Vec<AliasDescriptor>,
    injection_points: Vec<InjectionPoint>,
    #[derivative(Debug = "ignore")]
    factory_aware: Option<FactoryAwareFunction>,
}

impl BeanClass {
    /// Creates an empty class for type `T`, known under the given name.
    pub fn of<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name::<T>(),
            own_type: AliasDescriptor {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                cast: identity_cast::<T>,
            },
            default_constructor: None,
            constructors: vec![],
            properties: vec![],
            aliases: vec![],
            injection_points: vec![],
            factory_aware: None,
        }
    }

    pub fn with_default_constructor(mut self, constructor: DefaultConstructor) -> Self {
        self.default_constructor = Some(constructor);
        self
    }

    /// Adds a constructor. Constructors are considered in the order they were added.
    pub fn with_constructor(
        mut self,
        parameter_types: Vec<ValueType>,
        construct: ConstructorFunction,
    ) -> Self {
        self.constructors.push(ConstructorDescriptor {
            parameter_types,
            construct,
        });
        self
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        setter: SetterFunction,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.into(),
            value_type,
            setter,
        });
        self
    }

    /// Declares `A` as a type this class is assignable to. The cast function must produce a boxed
    /// `Arc<A>`.
    pub fn with_alias<A: ?Sized + 'static>(mut self, cast: CastFunction) -> Self {
        self.aliases.push(AliasDescriptor {
            type_id: TypeId::of::<A>(),
            type_name: type_name::<A>(),
            cast,
        });
        self
    }

    pub fn with_injection_point(
        mut self,
        field_name: impl Into<String>,
        dependency: DependencyDescriptor,
        inject: InjectFunction,
    ) -> Self {
        self.injection_points.push(InjectionPoint {
            field_name: field_name.into(),
            dependency,
            inject,
        });
        self
    }

    pub fn with_factory_aware(mut self, factory_aware: FactoryAwareFunction) -> Self {
        self.factory_aware = Some(factory_aware);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the type this class instantiates. Named apart from [Any::type_id], which would
    /// otherwise be picked for `Arc<BeanClass>` receivers.
    #[inline]
    pub fn bean_type_id(&self) -> TypeId {
        self.own_type.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn default_constructor(&self) -> Option<DefaultConstructor> {
        self.default_constructor
    }

    #[inline]
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|property| property.name == name)
    }

    #[inline]
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.injection_points
    }

    #[inline]
    pub fn factory_aware(&self) -> Option<FactoryAwareFunction> {
        self.factory_aware
    }

    /// Names of all types this class can be viewed as, starting with its own.
    pub fn assignable_type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        [&self.own_type]
            .into_iter()
            .chain(self.aliases.iter())
            .map(|alias| alias.type_name)
    }

    /// Checks if instances of this class can be viewed as the given type.
    pub fn is_assignable_to(&self, type_id: TypeId) -> bool {
        self.own_type.type_id == type_id || self.aliases.iter().any(|alias| alias.type_id == type_id)
    }

    /// Casts a bean of this class to `Arc<T>` for its own type or any alias. Returns the bean back
    /// if `T` is not assignable or the bean is not an instance of this class, e.g. after being
    /// replaced by a post-processor.
    pub fn cast<T: ?Sized + 'static>(&self, bean: BeanPtr) -> Result<Arc<T>, BeanPtr> {
        let target = TypeId::of::<T>();
        let alias = [&self.own_type]
            .into_iter()
            .chain(self.aliases.iter())
            .find(|alias| alias.type_id == target);

        match alias {
            Some(alias) => (alias.cast)(bean.clone())
                .ok()
                .and_then(|cast| cast.downcast::<Arc<T>>().ok())
                .map(|cast| *cast)
                .ok_or(bean),
            None => Err(bean),
        }
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::bean_class::{BeanBox, BeanPtr};
    use crate::bean_factory::{BeanFactoryAware, BeanFactoryRef};
    use crate::error::{ConversionError, ErrorPtr};
    use crate::value::{FromValue, Value};
    use crate::autowired::Autowirable;
    use std::any::{type_name, Any};
    use std::sync::Arc;

    fn as_target<T: Any>(bean: &mut (dyn Any + Send + Sync)) -> Result<&mut T, ErrorPtr> {
        bean.downcast_mut::<T>()
            .ok_or_else(|| Arc::new(ConversionError::IncompatibleBean(type_name::<T>())) as ErrorPtr)
    }

    pub fn default_constructor<T: Default + Any + Send + Sync>() -> Result<BeanBox, ErrorPtr> {
        Ok(Box::new(T::default()))
    }

    pub fn next_argument<V: FromValue>(
        arguments: &mut impl Iterator<Item = (usize, Value)>,
        position: usize,
    ) -> Result<V, ErrorPtr> {
        let (_, value) = arguments
            .next()
            .ok_or_else(|| Arc::new(ConversionError::MissingArgument(position)) as ErrorPtr)?;
        V::from_value(value).map_err(|error| Arc::new(error) as ErrorPtr)
    }

    pub fn set_property<T: Any, V: FromValue>(
        bean: &mut (dyn Any + Send + Sync),
        value: Value,
        assign: fn(&mut T, V),
    ) -> Result<(), ErrorPtr> {
        let value = V::from_value(value).map_err(|error| Arc::new(error) as ErrorPtr)?;
        assign(as_target(bean)?, value);
        Ok(())
    }

    pub fn inject_dependency<T: Any, V: Autowirable>(
        bean: &mut (dyn Any + Send + Sync),
        dependency: Option<BeanPtr>,
        assign: fn(&mut T, V),
    ) -> Result<(), ErrorPtr> {
        let value = V::from_dependency(dependency).map_err(|error| Arc::new(error) as ErrorPtr)?;
        assign(as_target(bean)?, value);
        Ok(())
    }

    pub fn factory_aware<T: BeanFactoryAware + Any>(
        bean: &mut (dyn Any + Send + Sync),
        bean_factory: BeanFactoryRef,
    ) -> Result<(), ErrorPtr> {
        as_target::<T>(bean)?.set_bean_factory(bean_factory);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bean_class::{BeanClass, BeanPtr};
    use crate::value::{Value, ValueType};
    use std::sync::Arc;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    #[derive(Default)]
    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    fn create_class() -> BeanClass {
        BeanClass::of::<English>("english")
            .with_default_constructor(|| Ok(Box::<English>::default()))
            .with_property("ignored", ValueType::Text, |_, _| Ok(()))
            .with_alias::<dyn Greeter>(|bean| {
                bean.downcast::<English>()
                    .map(|bean| Box::new(bean as Arc<dyn Greeter>) as Box<dyn std::any::Any>)
            })
    }

    #[test]
    fn should_check_assignability() {
        let class = create_class();

        assert!(class.is_assignable_to(std::any::TypeId::of::<English>()));
        assert!(class.is_assignable_to(std::any::TypeId::of::<dyn Greeter>()));
        assert!(!class.is_assignable_to(std::any::TypeId::of::<String>()));
        assert_eq!(class.bean_type_id(), std::any::TypeId::of::<English>());

        let names: Vec<_> = class.assignable_type_names().collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("English"));
        assert!(names[1].ends_with("Greeter"));
    }

    #[test]
    fn should_cast_to_aliases() {
        let class = create_class();
        let bean = Arc::new(English) as BeanPtr;

        assert_eq!(class.cast::<dyn Greeter>(bean.clone()).unwrap().greet(), "hello");
        assert!(class.cast::<English>(bean.clone()).is_ok());
        assert!(class.cast::<String>(bean).is_err());
    }

    #[test]
    fn should_find_properties_by_name() {
        let class = create_class();

        assert!(class.property("ignored").is_some());
        assert!(class.property("missing").is_none());

        let mut bean = Box::new(English) as crate::bean_class::BeanBox;
        class
            .property("ignored")
            .unwrap()
            .set(bean.as_mut(), Value::Null)
            .unwrap();
    }
}
