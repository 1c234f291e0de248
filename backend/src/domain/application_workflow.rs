//! Adoption application workflow.
//!
//! Owns the application lifecycle: creation, status changes and listing.
//! Every successful mutation is announced on the event publisher, but a
//! publish failure never fails the mutation; it is logged and dropped.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::ApplicationEventPublisher;
use crate::domain::{
    Application, ApplicationPatch, ApplicationStatus, CacheAsideRepository, EntityId, Error,
    ListQuery, NewApplication, Page, PageRequest,
};

/// Application service backed by the cache-aside repository.
#[derive(Clone)]
pub struct ApplicationWorkflow {
    repository: CacheAsideRepository<Application>,
    publisher: Arc<dyn ApplicationEventPublisher>,
}

impl ApplicationWorkflow {
    /// Create the workflow from its repository and publisher.
    pub fn new(
        repository: CacheAsideRepository<Application>,
        publisher: Arc<dyn ApplicationEventPublisher>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Submit a new application. It always starts in `PENDING_REVIEW`.
    pub async fn create_application(&self, draft: NewApplication) -> Result<Application, Error> {
        let application = self.repository.create(draft).await?;
        info!(
            application_id = %application.id,
            user_id = %application.applicant_id,
            pet_id = %application.subject_id,
            "application created"
        );

        if let Err(err) = self.publisher.publish_created(&application).await {
            warn!(
                application_id = %application.id,
                error = %err,
                "failed to publish application created event"
            );
        }
        Ok(application)
    }

    /// Fetch one application.
    pub async fn get_application(&self, id: &EntityId) -> Result<Application, Error> {
        self.repository.get(id).await
    }

    /// Move an application to `status`, replacing its review notes.
    ///
    /// Any specified status may follow any other; only the unspecified
    /// sentinel is refused.
    pub async fn update_status(
        &self,
        id: &EntityId,
        status: ApplicationStatus,
        review_notes: Option<String>,
    ) -> Result<Application, Error> {
        if !status.is_specified() {
            return Err(Error::invalid_request("new status must be specified")
                .with_details(json!({ "field": "status", "code": "unspecified_status" })));
        }

        let patch = ApplicationPatch {
            status: Some(status),
            review_notes: Some(review_notes),
        };
        let application = self.repository.update(id, patch).await?;
        info!(
            application_id = %application.id,
            status = %application.status,
            "application status updated"
        );

        if let Err(err) = self.publisher.publish_status_updated(&application).await {
            warn!(
                application_id = %application.id,
                error = %err,
                "failed to publish application status updated event"
            );
        }
        Ok(application)
    }

    /// Page through one applicant's applications, newest first.
    ///
    /// Invalid `page` or `limit` values fall back to 1 and 10. An
    /// `UNSPECIFIED` status filter is treated as no filter.
    pub async fn list_by_applicant(
        &self,
        applicant_id: &EntityId,
        page: Option<i64>,
        limit: Option<i64>,
        status: Option<ApplicationStatus>,
    ) -> Result<Page<Application>, Error> {
        let mut query = ListQuery::new(PageRequest::clamped(page, limit))
            .with_field("user_id", applicant_id.as_str());
        if let Some(status) = status.filter(|status| status.is_specified()) {
            query = query.with_field("status", status.as_str());
        }
        self.repository.list(&query).await
    }
}

#[cfg(test)]
#[path = "application_workflow_tests.rs"]
mod tests;
