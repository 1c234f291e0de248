//! Pet adoption backend.
//!
//! Purpose: user, pet and adoption-application services backed by a
//! cache-aside repository, plus a notification worker that turns
//! application events into emails.
//!
//! Layout:
//! - [`domain`]: entities, services, events, the dispatcher and the ports
//!   every adapter implements.
//! - [`inbound`]: actix-web RPC endpoints and health probes.
//! - [`outbound`]: Postgres, Redis, in-memory, HTTP directory and mail
//!   adapters.
//! - [`server`]: settings and the composition root for each process.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
