//! Framework configuration is based on an [ApplicationConfigProvider], which can later be used to
//! retrieve [ApplicationConfig]. [ApplicationContext](crate::application::ApplicationContext) uses
//! this config to configure itself.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `SPRIG_` or `sprig.json` file. List values, such as
//! `SPRIG_DEFINITION_FILES`, are comma-separated.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use sprig_beans::error::ErrorPtr;
use std::sync::Arc;

const CONFIG_ENV_PREFIX: &str = "SPRIG";

const LIST_SEPARATOR: &str = ",";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "sprig.json";

/// Framework configuration which can be provided by an [ApplicationConfigProvider].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicationConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Can bean definitions replace previously registered ones with the same name.
    pub allow_definition_overriding: bool,
    /// Definition files to load on startup, in any format supported by the `config` crate.
    pub definition_files: Vec<String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            allow_definition_overriding: true,
            definition_files: vec![],
        }
    }
}

impl From<OptionalApplicationConfig> for ApplicationConfig {
    fn from(value: OptionalApplicationConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            allow_definition_overriding: value
                .allow_definition_overriding
                .unwrap_or(default.allow_definition_overriding),
            definition_files: value
                .definition_files
                .unwrap_or(default.definition_files),
        }
    }
}

impl ApplicationConfig {
    /// Loads the config from the default config file and environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Self::init_from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(
                    Environment::with_prefix(CONFIG_ENV_PREFIX)
                        .try_parsing(true)
                        .list_separator(LIST_SEPARATOR)
                        .with_list_parse_key("definition_files"),
                ),
        )
    }

    fn init_from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .build()
            .and_then(|config| config.try_deserialize::<OptionalApplicationConfig>())
            .map(|config| config.into())
    }
}

/// Provider for [ApplicationConfig].
pub trait ApplicationConfigProvider {
    fn config(&self) -> Result<&ApplicationConfig, ErrorPtr>;
}

impl ApplicationConfigProvider for ApplicationConfig {
    #[inline]
    fn config(&self) -> Result<&ApplicationConfig, ErrorPtr> {
        Ok(self)
    }
}

/// Provider loading the config from the environment once, on creation.
pub struct DefaultApplicationConfigProvider {
    // cached init result
    config: Result<ApplicationConfig, ErrorPtr>,
}

impl Default for DefaultApplicationConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultApplicationConfigProvider {
    pub fn new() -> Self {
        Self {
            config: ApplicationConfig::init_from_environment()
                .map_err(|error| Arc::new(error) as ErrorPtr),
        }
    }
}

impl ApplicationConfigProvider for DefaultApplicationConfigProvider {
    fn config(&self) -> Result<&ApplicationConfig, ErrorPtr> {
        match &self.config {
            Ok(config) => Ok(config),
            Err(error) => Err(error.clone()),
        }
    }
}

#[derive(Deserialize)]
struct OptionalApplicationConfig {
    install_tracing_logger: Option<bool>,
    allow_definition_overriding: Option<bool>,
    definition_files: Option<Vec<String>>,
}
