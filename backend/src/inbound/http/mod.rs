//! HTTP inbound adapter exposing the RPC endpoints of each service.

pub mod applications;
pub mod error;
pub mod health;
pub mod pets;
pub mod request_span;
pub mod routes;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;
pub use request_span::RequestSpan;
