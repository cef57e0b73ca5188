use sprig::application::{ApplicationContextBuilder, ApplicationError};
use sprig::config::ApplicationConfig;
use sprig_beans::bean_factory::{BeanFactory, TypedBeanFactory};
use sprig_beans::error::BeanFactoryError;
use sprig_beans::post_processor::BeanPostProcessor;
use sprig_beans::Bean;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Bean, Default)]
#[bean(default, name = "it::Store")]
struct Store {
    #[bean(property)]
    capacity: usize,
    #[bean(property)]
    tags: Vec<String>,
}

#[derive(Bean)]
#[bean(constructor, name = "it::Catalog")]
struct Catalog {
    store: Arc<Store>,
    section: String,
}

#[derive(Bean, Default)]
#[bean(default, name = "it::Draft")]
struct Draft {
    #[bean(autowired)]
    catalog: Option<Arc<Catalog>>,
}

#[derive(Bean, Default)]
#[bean(default, name = "it::Orphan")]
struct Orphan {
    #[bean(autowired)]
    store: Option<Arc<Store>>,
}

#[derive(Default)]
struct CountingPostProcessor {
    count: AtomicUsize,
}

impl BeanPostProcessor for CountingPostProcessor {
    fn post_process_after_initialization(
        &self,
        bean: sprig_beans::bean_class::BeanPtr,
        _bean_name: &str,
    ) -> Result<Option<sprig_beans::bean_class::BeanPtr>, sprig_beans::error::ErrorPtr> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(Some(bean))
    }
}

fn create_config(definition_files: Vec<String>) -> ApplicationConfig {
    let mut config = ApplicationConfig::default();
    config.install_tracing_logger = false;
    config.definition_files = definition_files;
    config
}

#[test]
fn should_load_definition_files() {
    let post_processor = Arc::new(CountingPostProcessor::default());
    let context = ApplicationContextBuilder::new()
        .with_config_provider(Box::new(create_config(vec![
            "tests/beans.json".to_string()
        ])))
        .with_bean_post_processor(post_processor.clone())
        .build()
        .unwrap();

    let bean_factory = context.bean_factory();
    assert_eq!(bean_factory.singleton_count(), 2);
    assert_eq!(post_processor.count.load(Ordering::SeqCst), 2);

    let catalog = bean_factory.bean_typed::<Catalog>("catalog").unwrap().unwrap();
    assert_eq!(catalog.section, "books");
    assert_eq!(catalog.store.capacity, 16);
    assert_eq!(catalog.store.tags, ["primary", "local"]);

    let draft = bean_factory.bean_typed::<Draft>("draft").unwrap().unwrap();
    assert!(Arc::ptr_eq(draft.catalog.as_ref().unwrap(), &catalog));
    assert_eq!(post_processor.count.load(Ordering::SeqCst), 3);
}

#[test]
fn should_leave_optional_dependencies_empty() {
    let context = ApplicationContextBuilder::new()
        .with_config_provider(Box::new(create_config(vec![])))
        .with_definition_document(
            r#"{ "beans": [{ "id": "orphan", "class": "it::Orphan" }] }"#,
            config::FileFormat::Json,
        )
        .build()
        .unwrap();

    let orphan = context
        .bean_factory()
        .bean_typed::<Orphan>("orphan")
        .unwrap()
        .unwrap();
    assert!(orphan.store.is_none());
}

#[test]
fn should_report_circular_references() {
    let result = ApplicationContextBuilder::new()
        .with_config_provider(Box::new(create_config(vec![])))
        .with_definition_document(
            r#"{ "beans": [
                { "id": "first", "class": "it::Catalog", "constructor_args": [{ "ref": "second" }, "a"] },
                { "id": "second", "class": "it::Catalog", "constructor_args": [{ "ref": "first" }, "b"] }
            ] }"#,
            config::FileFormat::Json,
        )
        .build();

    assert!(matches!(
        result.err().unwrap(),
        ApplicationError::BeanCreationError(BeanFactoryError::CircularDependency(_))
    ));
}

#[test]
fn should_skip_lazy_singletons() {
    let context = ApplicationContextBuilder::new()
        .with_config_provider(Box::new(create_config(vec![])))
        .with_definition_document(
            r#"
            [[beans]]
            id = "store"
            class = "it::Store"
            lazy_init = true
            "#,
            config::FileFormat::Toml,
        )
        .build()
        .unwrap();

    let bean_factory = context.bean_factory();
    assert!(!bean_factory.contains_singleton("store"));
    assert!(bean_factory.contains_bean("store"));
    assert!(bean_factory.bean("store").unwrap().is_some());
    assert!(bean_factory.contains_singleton("store"));
}
