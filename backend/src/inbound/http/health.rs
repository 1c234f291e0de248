//! `/health/ready` and `/health/live` for every service role.
//!
//! A process moves through three phases: starting, serving, draining. Readiness
//! holds only while serving. Liveness fails once draining begins, so the
//! orchestrator stops routing to a role that is shutting down.
use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};

const STARTING: u8 = 0;
const SERVING: u8 = 1;
const DRAINING: u8 = 2;

/// Lifecycle phase shared between the server loop and the health handlers.
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(STARTING),
        }
    }
}

impl HealthState {
    /// Starts out live but not yet ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// The listener is bound and adapters are connected.
    pub fn mark_serving(&self) {
        // A draining process never returns to serving.
        let _ = self.phase.compare_exchange(
            STARTING,
            SERVING,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// The server loop has stopped accepting work.
    pub fn mark_draining(&self) {
        self.phase.store(DRAINING, Ordering::Release);
    }

    /// True only while serving.
    pub fn is_ready(&self) -> bool {
        self.phase.load(Ordering::Acquire) == SERVING
    }

    /// False once draining.
    pub fn is_alive(&self) -> bool {
        self.phase.load(Ordering::Acquire) != DRAINING
    }
}

fn phase_response(ok: bool) -> HttpResponse {
    let mut response = if ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// 200 while serving; 503 before startup finishes and after draining starts.
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    phase_response(state.is_ready())
}

/// 200 until draining starts.
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    phase_response(state.is_alive())
}
