use api::{start, ApiSettings};
use std::io::{Error, ErrorKind};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let settings = utils::config::get_config_from_env::<ApiSettings>()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("Failed to load settings: {}", e)))?;
    let logger = utils::xlogging::init_log(&settings.logging_settings)?;
    start(settings, logger).await
}
