use actix_web::{web, HttpRequest};

use crate::Bridge;

pub mod offer;
pub mod zap;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(offer::offer).service(zap::zap_callback);
}

/// Base the callback urls are built on, the configured one or else the one the request
/// came in through, honouring forwarded headers.
pub fn base_url(bridge: &Bridge, req: &HttpRequest) -> String {
    match &bridge.public_base_url {
        Some(base) => base.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}
