use actix_web::{get, web::Path, HttpRequest, HttpResponse};
use slog as log;
use slog::o;
use url::form_urlencoded;
use uuid::Uuid;
use xerror::api::*;

use utils::time::{elapsed_ms, time_now};

use crate::zap::relay_zap;
use crate::WebBridge;

#[get("/api/c/{token}")]
pub async fn zap_callback(token: Path<String>, req: HttpRequest, bridge: WebBridge) -> Result<HttpResponse, ApiError> {
    let req_id = Uuid::new_v4();
    let logger = bridge.logger.new(o!("req_id" => req_id.to_string()));
    let started = time_now();

    let amount = form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, _)| key == "amount")
        .map(|(_, value)| value.into_owned());

    let result = relay_zap(&bridge, &token, amount.as_deref(), &logger).await;
    match &result {
        Ok(response) => log::info!(
            logger,
            "Relayed zap callback in {}ms, wallet answered {}",
            elapsed_ms(started),
            response.status()
        ),
        Err(err) => log::info!(logger, "Rejected zap callback: {}", err.code()),
    }
    result
}
