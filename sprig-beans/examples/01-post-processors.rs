use sprig_beans::autowired::AutowiredPostProcessor;
use sprig_beans::bean_class::BeanPtr;
use sprig_beans::bean_factory::TypedBeanFactory;
use sprig_beans::definition::BeanDefinition;
use sprig_beans::definition_registry::DefinitionRegistry;
use sprig_beans::error::ErrorPtr;
use sprig_beans::factory::DefaultBeanFactoryBuilder;
use sprig_beans::post_processor::BeanPostProcessor;
use sprig_beans::scope::Scope;
use sprig_beans::Bean;
use std::sync::Arc;

#[derive(Bean, Default)]
#[bean(default, name = "example::Clock")]
struct Clock;

// autowired fields are not constructor arguments; they get filled by type after instantiation
#[derive(Bean, Default)]
#[bean(default, name = "example::Task")]
struct Task {
    #[bean(autowired)]
    clock: Option<Arc<Clock>>,
}

// a post-processor can observe, replace or discard every created bean
struct LoggingPostProcessor;

impl BeanPostProcessor for LoggingPostProcessor {
    fn post_process_after_initialization(
        &self,
        bean: BeanPtr,
        bean_name: &str,
    ) -> Result<Option<BeanPtr>, ErrorPtr> {
        println!("Created bean: {bean_name}");
        Ok(Some(bean))
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let bean_factory = DefaultBeanFactoryBuilder::new()
        .with_bean_post_processor(Arc::new(LoggingPostProcessor))
        .build();

    // autowiring needs access to the factory, so the post-processor is added after building
    bean_factory.add_bean_post_processor(Arc::new(AutowiredPostProcessor::new(
        bean_factory.bean_factory_ref(),
    )));

    bean_factory
        .register_bean_definition(BeanDefinition::new("clock", "example::Clock"))
        .expect("error registering clock");
    bean_factory
        .register_bean_definition(
            BeanDefinition::new("task", "example::Task").with_scope(Scope::Prototype),
        )
        .expect("error registering task");

    // prints "Created bean: clock" once and "Created bean: task" twice, since tasks are
    // prototypes, while the clock is a shared singleton
    let first = bean_factory
        .bean_typed::<Task>("task")
        .expect("error creating task")
        .expect("task was discarded");
    let second = bean_factory
        .bean_typed::<Task>("task")
        .expect("error creating task")
        .expect("task was discarded");

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(
        first.clock.as_ref().expect("missing clock"),
        second.clock.as_ref().expect("missing clock")
    ));
}
