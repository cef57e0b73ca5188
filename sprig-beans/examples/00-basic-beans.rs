use sprig_beans::bean_factory::TypedBeanFactory;
use sprig_beans::definition::BeanDefinition;
use sprig_beans::definition_registry::DefinitionRegistry;
use sprig_beans::factory::DefaultBeanFactoryBuilder;
use sprig_beans::value::ConfiguredValue;
use sprig_beans::Bean;
use std::sync::Arc;

// a bean class which can be created with its default constructor and then configured with
// properties
#[derive(Bean, Default)]
#[bean(default, name = "example::Greeting")]
struct Greeting {
    #[bean(property)]
    text: String,
}

// a bean class created by passing constructor arguments, in field order
#[derive(Bean)]
#[bean(constructor, name = "example::Greeter")]
struct Greeter {
    greeting: Arc<Greeting>,
    repeat: u32,
}

impl Greeter {
    fn greet(&self) {
        for _ in 0..self.repeat {
            println!("{}", self.greeting.text);
        }
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // the builder discovers all classes deriving Bean
    let bean_factory = DefaultBeanFactoryBuilder::new().build();

    // definitions tell the factory which class to instantiate under which name, and how to
    // configure it
    bean_factory
        .register_bean_definition(
            BeanDefinition::new("greeting", "example::Greeting")
                .with_property_value("text", ConfiguredValue::literal("Hello world!")),
        )
        .expect("error registering greeting");
    bean_factory
        .register_bean_definition(
            BeanDefinition::new("greeter", "example::Greeter").with_constructor_arguments([
                ConfiguredValue::reference("greeting"),
                ConfiguredValue::literal(2),
            ]),
        )
        .expect("error registering greeter");

    let greeter = bean_factory
        .bean_typed::<Greeter>("greeter")
        .expect("error creating greeter")
        .expect("greeter was discarded");

    // prints "Hello world!" twice
    greeter.greet();
}
