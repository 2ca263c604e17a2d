use crate::{
    conf::{AuthConfig, CacheConfig, DatabaseConfig, LoggingConfig, PoolConfig, ServerConfig},
    core::GatewayError::{self, ConfigParsingError},
};
use config::{Config as CConfig, Environment};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "SQLGATE";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, GatewayError> {
        let config = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.pool.validate()?;
        config.logging.validate()?;
        Ok(config)
    }

    /// Optional TOML file, then `SQLGATE_*` variables such as
    /// `SQLGATE_DATABASE__PATH` or `SQLGATE_POOL__MAX_SIZE`.
    pub fn load(path: Option<&str>) -> Result<Config, GatewayError> {
        Self::load_with_env(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env(path: Option<&str>, env: Environment) -> Result<Config, GatewayError> {
        let mut builder = CConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::new(path, config::FileFormat::Toml));
        }
        let config = builder
            .add_source(env)
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.pool.validate()?;
        config.logging.validate()?;
        Ok(config)
    }
}
