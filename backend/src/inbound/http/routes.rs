//! Route tables for each service process.
//!
//! Every process serves the health probes plus the RPC endpoints of the
//! service it hosts. Extractor failures are reported in the same JSON error
//! envelope as domain failures.

use actix_web::{HttpRequest, error::JsonPayloadError, error::QueryPayloadError, web};

use crate::domain::Error;

use super::{applications, health, pets, users};

/// Parse a paging value, treating anything non-numeric as absent.
pub(crate) fn lenient_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid query string: {err}")).into()
}

fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error));
}

fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::ready).service(health::live);
}

/// User service: `/rpc/users`.
pub fn user_service(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    health_routes(cfg);
    cfg.service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user);
}

/// Pet service: `/rpc/pets`.
pub fn pet_service(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    health_routes(cfg);
    cfg.service(pets::create_pet)
        .service(pets::list_pets)
        .service(pets::get_pet)
        .service(pets::update_pet)
        .service(pets::delete_pet)
        .service(pets::update_adoption_status);
}

/// Application service: `/rpc/applications` and per-applicant listing.
pub fn application_service(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    health_routes(cfg);
    cfg.service(applications::create_application)
        .service(applications::get_application)
        .service(applications::update_status)
        .service(applications::list_by_applicant);
}

/// Health probes only; used by the notification worker.
pub fn probes_only(cfg: &mut web::ServiceConfig) {
    health_routes(cfg);
}
