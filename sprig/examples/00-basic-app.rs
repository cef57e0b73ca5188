use config::FileFormat;
use sprig::application::ApplicationContextBuilder;
use sprig_beans::bean_factory::TypedBeanFactory;
use sprig_beans::Bean;
use std::sync::Arc;

#[derive(Bean, Default)]
#[bean(default, name = "app::Settings")]
struct Settings {
    #[bean(property)]
    motd: String,
}

#[derive(Bean, Default)]
#[bean(default, name = "app::Server")]
struct Server {
    #[bean(autowired)]
    settings: Option<Arc<Settings>>,
}

// definitions are usually loaded from files listed in the "definition_files" config entry
// (e.g. SPRIG_DEFINITION_FILES=beans.json,more.toml), but can also be given in-memory
const DEFINITIONS: &str = r#"
[[beans]]
id = "settings"
class = "app::Settings"
properties = { motd = "Hello world!" }

[[beans]]
id = "server"
class = "app::Server"
"#;

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // the context installs a logger (try RUST_LOG=debug), enables autowiring and creates all
    // eager singletons
    let context = ApplicationContextBuilder::new()
        .with_definition_document(DEFINITIONS, FileFormat::Toml)
        .build()
        .expect("error creating application context");

    let server = context
        .bean_factory()
        .bean_typed::<Server>("server")
        .expect("error creating server")
        .expect("server was discarded");

    // prints "Hello world!"
    if let Some(settings) = &server.settings {
        println!("{}", settings.motd);
    }
}
