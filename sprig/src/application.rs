//! Core application functionality.
//!
//! [ApplicationContextBuilder] bootstraps a [DefaultBeanFactory]: it reads the
//! [ApplicationConfig](crate::config::ApplicationConfig), installs a logger, registers definitions
//! from configured files and enables autowiring. The resulting [ApplicationContext] has all
//! eager singletons created.

use crate::config::{ApplicationConfigProvider, DefaultApplicationConfigProvider};
use crate::definition_reader::{DefinitionReader, ReaderError};
use config::FileFormat;
use derive_more::Constructor;
use sprig_beans::autowired::AutowiredPostProcessor;
use sprig_beans::definition::BeanDefinition;
use sprig_beans::definition_registry::{DefaultDefinitionRegistry, DefinitionRegistry};
use sprig_beans::error::{BeanFactoryError, DefinitionRegistryError, ErrorPtr};
use sprig_beans::factory::{DefaultBeanFactory, DefaultBeanFactoryBuilder, TypeLoaderPtr};
use sprig_beans::post_processor::BeanPostProcessorPtr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Error retrieving configuration: {0}")]
    ConfigurationError(ErrorPtr),
    #[error("Error loading bean definitions: {0}")]
    DefinitionLoadError(#[from] ReaderError),
    #[error("Error registering bean definition: {0}")]
    DefinitionRegistrationError(#[from] DefinitionRegistryError),
    #[error("Error creating singletons: {0}")]
    BeanCreationError(#[from] BeanFactoryError),
}

/// Installs a `fmt` subscriber filtered by the `RUST_LOG` environment variable, unless a global
/// subscriber is already set.
fn install_tracing_logger() {
    if tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .is_err()
    {
        debug!("Global tracing subscriber already installed.");
    }
}

/// A running container with all eager singletons created.
#[derive(Constructor)]
pub struct ApplicationContext {
    bean_factory: Arc<DefaultBeanFactory>,
}

impl ApplicationContext {
    #[inline]
    pub fn bean_factory(&self) -> &Arc<DefaultBeanFactory> {
        &self.bean_factory
    }
}

/// Builder for [ApplicationContext] with sensible defaults, for easy construction.
pub struct ApplicationContextBuilder {
    config_provider: Box<dyn ApplicationConfigProvider>,
    type_loader: Option<TypeLoaderPtr>,
    definitions: Vec<BeanDefinition>,
    documents: Vec<(String, FileFormat)>,
    post_processors: Vec<BeanPostProcessorPtr>,
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationContextBuilder {
    /// Creates a new builder, which reads configuration from the environment.
    pub fn new() -> Self {
        Self {
            config_provider: Box::<DefaultApplicationConfigProvider>::default(),
            type_loader: None,
            definitions: vec![],
            documents: vec![],
            post_processors: vec![],
        }
    }

    /// Sets new [ApplicationConfigProvider].
    pub fn with_config_provider(mut self, config_provider: Box<dyn ApplicationConfigProvider>) -> Self {
        self.config_provider = config_provider;
        self
    }

    /// Sets the type loader used by the factory. Defaults to all discovered bean classes.
    pub fn with_type_loader(mut self, type_loader: TypeLoaderPtr) -> Self {
        self.type_loader = Some(type_loader);
        self
    }

    /// Adds a definition, registered after definitions from configured files.
    pub fn with_bean_definition(mut self, definition: BeanDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Adds an in-memory definition document, read after configured files.
    pub fn with_definition_document<T: Into<String>>(mut self, content: T, format: FileFormat) -> Self {
        self.documents.push((content.into(), format));
        self
    }

    /// Adds a post-processor, invoked after the built-in autowiring one.
    pub fn with_bean_post_processor(mut self, post_processor: BeanPostProcessorPtr) -> Self {
        self.post_processors.push(post_processor);
        self
    }

    /// Builds the factory, registers all definitions and creates eager singletons.
    pub fn build(self) -> Result<ApplicationContext, ApplicationError> {
        let config = self
            .config_provider
            .config()
            .map_err(ApplicationError::ConfigurationError)?;

        if config.install_tracing_logger {
            install_tracing_logger();
        }

        info!("Creating bean factory...");

        let mut builder = DefaultBeanFactoryBuilder::new().with_definition_registry(Box::new(
            DefaultDefinitionRegistry::new(config.allow_definition_overriding),
        ));
        if let Some(type_loader) = self.type_loader {
            builder = builder.with_type_loader(type_loader);
        }

        let bean_factory = builder.build();

        bean_factory.add_bean_post_processor(Arc::new(AutowiredPostProcessor::new(
            bean_factory.bean_factory_ref(),
        )));
        for post_processor in self.post_processors {
            bean_factory.add_bean_post_processor(post_processor);
        }

        let reader = DefinitionReader::new(bean_factory.as_ref());
        for path in &config.definition_files {
            let count = reader.load_file(path)?;
            info!(path = %path, count, "Loaded bean definitions.");
        }
        for (content, format) in &self.documents {
            reader.load_str(content, *format)?;
        }
        for definition in self.definitions {
            bean_factory.register_bean_definition(definition)?;
        }

        info!("Pre-instantiating singletons...");

        bean_factory.preinstantiate_singletons()?;

        Ok(ApplicationContext::new(bean_factory))
    }
}

#[cfg(test)]
mod tests {
    use crate::application::{ApplicationContextBuilder, ApplicationError};
    use crate::config::{ApplicationConfig, ApplicationConfigProvider};
    use crate::definition_reader::ReaderError;
    use config::FileFormat;
    use sprig_beans::bean_class::BeanClass;
    use sprig_beans::bean_factory::TypedBeanFactory;
    use sprig_beans::definition::BeanDefinition;
    use sprig_beans::definition_registry::DefinitionRegistry;
    use sprig_beans::error::{BeanFactoryError, DefinitionRegistryError, ErrorPtr};
    use sprig_beans::type_loader::TypeRegistry;
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter;

    struct FailingConfigProvider;

    impl ApplicationConfigProvider for FailingConfigProvider {
        fn config(&self) -> Result<&ApplicationConfig, ErrorPtr> {
            Err(Arc::new(DefinitionRegistryError::DuplicateBeanName(
                "config".to_string(),
            )))
        }
    }

    fn create_config() -> ApplicationConfig {
        let mut config = ApplicationConfig::default();
        config.install_tracing_logger = false;
        config
    }

    fn create_builder(config: ApplicationConfig) -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
            .with_config_provider(Box::new(config))
            .with_type_loader(Box::new(TypeRegistry::new().with_class(
                BeanClass::of::<Counter>("test::Counter")
                    .with_default_constructor(|| Ok(Box::<Counter>::default())),
            )))
    }

    #[test]
    fn should_return_config_error() {
        assert!(matches!(
            ApplicationContextBuilder::new()
                .with_config_provider(Box::new(FailingConfigProvider))
                .build()
                .err()
                .unwrap(),
            ApplicationError::ConfigurationError(_)
        ));
    }

    #[test]
    fn should_preinstantiate_singletons() {
        let context = create_builder(create_config())
            .with_definition_document(
                r#"{ "beans": [
                    { "id": "eager", "class": "test::Counter" },
                    { "id": "lazy", "class": "test::Counter", "lazy_init": true }
                ] }"#,
                FileFormat::Json,
            )
            .with_bean_definition(
                BeanDefinition::new("prototype", "test::Counter")
                    .with_scope(sprig_beans::scope::Scope::Prototype),
            )
            .build()
            .unwrap();

        let bean_factory = context.bean_factory();
        assert!(bean_factory.contains_singleton("eager"));
        assert!(!bean_factory.contains_singleton("lazy"));
        assert_eq!(bean_factory.singleton_count(), 1);
        assert_eq!(bean_factory.post_processor_count(), 1);
        assert!(bean_factory.bean_typed::<Counter>("lazy").unwrap().is_some());
        assert_eq!(bean_factory.bean_definition_names(), ["eager", "lazy", "prototype"]);
    }

    #[test]
    fn should_respect_definition_overriding_config() {
        let mut config = create_config();
        config.allow_definition_overriding = false;

        assert!(matches!(
            create_builder(config)
                .with_bean_definition(BeanDefinition::new("a", "test::Counter"))
                .with_bean_definition(BeanDefinition::new("a", "test::Counter"))
                .build()
                .err()
                .unwrap(),
            ApplicationError::DefinitionRegistrationError(_)
        ));
    }

    #[test]
    fn should_fail_on_missing_definition_file() {
        let mut config = create_config();
        config.definition_files = vec!["definitely/missing/beans.json".to_string()];

        assert!(matches!(
            create_builder(config).build().err().unwrap(),
            ApplicationError::DefinitionLoadError(ReaderError::Read(_))
        ));
    }

    #[test]
    fn should_fail_on_eager_singleton_errors() {
        assert!(matches!(
            create_builder(create_config())
                .with_bean_definition(BeanDefinition::new("broken", "test::Missing"))
                .build()
                .err()
                .unwrap(),
            ApplicationError::BeanCreationError(BeanFactoryError::BeanCreation { .. })
        ));
    }
}
