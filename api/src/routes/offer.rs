use actix_web::{get, HttpRequest, HttpResponse};
use slog as log;
use slog::o;
use uuid::Uuid;
use xerror::api::*;

use utils::time::{elapsed_ms, time_now};

use crate::resolver::{resolve_offer, OfferParams};
use crate::routes::base_url;
use crate::WebBridge;

#[get("/api/p")]
pub async fn offer(req: HttpRequest, bridge: WebBridge) -> Result<HttpResponse, ApiError> {
    let req_id = Uuid::new_v4();
    let logger = bridge.logger.new(o!("req_id" => req_id.to_string()));
    let started = time_now();

    let params = match OfferParams::from_query(req.query_string()) {
        Ok(params) => params,
        Err(err) => {
            log::info!(logger, "Rejected offer request: {}", err.code());
            return Err(ApiError::Request(err));
        }
    };

    let base_url = base_url(&bridge, &req);
    match resolve_offer(&bridge, &params, &base_url, &logger).await {
        Ok(offer) => {
            log::info!(logger, "Resolved offer for {} in {}ms", params.pubkey, elapsed_ms(started));
            Ok(HttpResponse::Ok().json(offer))
        }
        Err(err) => {
            log::info!(
                logger,
                "Failed to resolve offer for {} after {}ms: {}",
                params.pubkey,
                elapsed_ms(started),
                err.code()
            );
            Err(err)
        }
    }
}
