use std::env;

/// Prefix of environment variables overriding file settings, e.g. `ZAPBRIDGE_JWT_SECRET`.
pub const ENV_PREFIX: &str = "ZAPBRIDGE";

/// Loads settings from `{FILE_NAME}.{ENV}.toml` when `FILE_NAME` is set, overlaid with
/// `ZAPBRIDGE_*` environment variables.
pub fn get_config_from_env<T>() -> Result<T, config::ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    let environment: String = env::var("ENV").unwrap_or_else(|_| "dev".into());

    let mut builder = config::Config::builder();
    if let Ok(file_name) = env::var("FILE_NAME") {
        let file_path = format!("{}.{}.toml", file_name, environment);
        builder = builder.add_source(config::File::with_name(&file_path));
    }

    builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()
}
