//! Email notifications for application events.
//!
//! The composer enriches each event with the applicant's contact details and
//! the pet's name, renders a fixed template, and sends exactly one email.
//! Any enrichment failure aborts the notification; nothing partial is sent.

mod templates;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{
    ApplicationEventHandler, DirectoryError, EventHandlerError, Mailer, OutboundEmail,
    PetDirectory, PetSummary, UserContact, UserDirectory,
};
use crate::domain::{ApplicationCreated, ApplicationStatusUpdated, EntityId};

use self::templates::TemplateContext;

/// Per-lookup timeout applied to directory calls unless configured otherwise.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Event handler that turns application events into emails.
#[derive(Clone)]
pub struct NotificationComposer {
    users: Arc<dyn UserDirectory>,
    pets: Arc<dyn PetDirectory>,
    mailer: Arc<dyn Mailer>,
    lookup_timeout: Duration,
}

impl NotificationComposer {
    /// Build a composer using [`DEFAULT_LOOKUP_TIMEOUT`].
    pub fn new(
        users: Arc<dyn UserDirectory>,
        pets: Arc<dyn PetDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            pets,
            mailer,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Override the per-lookup timeout.
    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    async fn lookup<T>(
        &self,
        what: &str,
        id: &EntityId,
        call: impl Future<Output = Result<T, DirectoryError>> + Send,
    ) -> Result<T, EventHandlerError> {
        match tokio::time::timeout(self.lookup_timeout, call).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(err)) => Err(EventHandlerError::enrichment(format!(
                "failed to fetch {what} {id}: {err}"
            ))),
            Err(_) => Err(EventHandlerError::enrichment(format!(
                "{what} {id} lookup timed out after {}ms",
                self.lookup_timeout.as_millis()
            ))),
        }
    }

    async fn enrich(
        &self,
        user_id: &EntityId,
        pet_id: &EntityId,
    ) -> Result<(UserContact, PetSummary), EventHandlerError> {
        let user = self
            .lookup("user", user_id, self.users.get_user(user_id))
            .await?;
        if user.email.trim().is_empty() {
            return Err(EventHandlerError::enrichment(format!(
                "user {user_id} has no email address"
            )));
        }

        let pet = self
            .lookup("pet", pet_id, self.pets.get_pet(pet_id))
            .await?;
        if pet.name.trim().is_empty() {
            return Err(EventHandlerError::enrichment(format!(
                "pet {pet_id} has no name"
            )));
        }
        Ok((user, pet))
    }

    async fn deliver(
        &self,
        application_id: &EntityId,
        email: OutboundEmail,
    ) -> Result<(), EventHandlerError> {
        self.mailer.send(&email).await.map_err(|err| {
            warn!(%application_id, to = %email.to, error = %err, "notification delivery failed");
            EventHandlerError::delivery(err.to_string())
        })?;
        info!(%application_id, to = %email.to, subject = %email.subject, "notification sent");
        Ok(())
    }
}

#[async_trait]
impl ApplicationEventHandler for NotificationComposer {
    async fn on_created(&self, event: &ApplicationCreated) -> Result<(), EventHandlerError> {
        let (user, pet) = self.enrich(&event.user_id, &event.pet_id).await?;
        let context = TemplateContext {
            user: &user,
            pet: &pet,
            application_id: event.application_id.as_str(),
        };
        let email = templates::application_received(&context, event.status);
        self.deliver(&event.application_id, email).await
    }

    async fn on_status_updated(
        &self,
        event: &ApplicationStatusUpdated,
    ) -> Result<(), EventHandlerError> {
        let (user, pet) = self.enrich(&event.user_id, &event.pet_id).await?;
        let context = TemplateContext {
            user: &user,
            pet: &pet,
            application_id: event.application_id.as_str(),
        };
        let email = templates::status_updated(&context, event.new_status, &event.review_notes);
        self.deliver(&event.application_id, email).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockMailer, MockPetDirectory, MockUserDirectory};
    use crate::domain::{
        APPLICATION_CREATED_EVENT, APPLICATION_STATUS_UPDATED_EVENT, ApplicationStatus,
    };
    use crate::test_support::doubles::{RecordingMailer, StaticPetDirectory, StaticUserDirectory};

    fn id(raw: &str) -> EntityId {
        EntityId::new(raw).expect("valid id")
    }

    fn created_event() -> ApplicationCreated {
        ApplicationCreated {
            event_type: APPLICATION_CREATED_EVENT.to_owned(),
            application_id: id("app789"),
            user_id: id("user123"),
            pet_id: id("pet456"),
            status: ApplicationStatus::PendingReview,
            applied_at: Utc
                .with_ymd_and_hms(2026, 2, 14, 10, 0, 0)
                .single()
                .expect("valid instant"),
        }
    }

    fn status_event(status: ApplicationStatus, notes: &str) -> ApplicationStatusUpdated {
        ApplicationStatusUpdated {
            event_type: APPLICATION_STATUS_UPDATED_EVENT.to_owned(),
            application_id: id("app789"),
            user_id: id("user123"),
            pet_id: id("pet456"),
            new_status: status,
            updated_at: Utc
                .with_ymd_and_hms(2026, 2, 15, 10, 0, 0)
                .single()
                .expect("valid instant"),
            review_notes: notes.to_owned(),
        }
    }

    fn directories() -> (Arc<StaticUserDirectory>, Arc<StaticPetDirectory>) {
        (
            Arc::new(StaticUserDirectory::default().with_user(
                "user123",
                "ada@example.com",
                Some("Ada Lovelace"),
            )),
            Arc::new(StaticPetDirectory::default().with_pet("pet456", "Rex")),
        )
    }

    #[tokio::test]
    async fn approved_update_sends_one_email_with_notes() {
        let (users, pets) = directories();
        let mailer = Arc::new(RecordingMailer::new());
        let composer = NotificationComposer::new(users, pets, mailer.clone());

        composer
            .on_status_updated(&status_event(ApplicationStatus::Approved, "looks good"))
            .await
            .expect("delivered");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let email = sent.first().expect("one email");
        assert_eq!(email.to, "ada@example.com");
        assert!(email.html_body.contains("APPROVED"));
        assert!(email.html_body.contains("looks good"));
    }

    #[tokio::test]
    async fn created_event_sends_received_email() {
        let (users, pets) = directories();
        let mailer = Arc::new(RecordingMailer::new());
        let composer = NotificationComposer::new(users, pets, mailer.clone());

        composer.on_created(&created_event()).await.expect("delivered");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent.first().map(|email| email.subject.as_str()),
            Some("Adoption Application Received for Rex (ID: app789)")
        );
    }

    #[tokio::test]
    async fn user_lookup_failure_sends_nothing() {
        let mut users = MockUserDirectory::new();
        users
            .expect_get_user()
            .times(1)
            .returning(|_| Err(DirectoryError::unavailable("connection refused")));
        let mut pets = MockPetDirectory::new();
        pets.expect_get_pet().never();
        let mut mailer = MockMailer::new();
        mailer.expect_send().never();
        let composer = NotificationComposer::new(Arc::new(users), Arc::new(pets), Arc::new(mailer));

        let error = composer
            .on_created(&created_event())
            .await
            .expect_err("enrichment fails");
        assert!(matches!(error, EventHandlerError::Enrichment { .. }));
    }

    #[rstest]
    #[case("", "Rex")]
    #[case("ada@example.com", "")]
    #[tokio::test]
    async fn incomplete_records_abort_notification(#[case] email: &str, #[case] pet_name: &str) {
        let users = Arc::new(StaticUserDirectory::default().with_user("user123", email, None));
        let pets = Arc::new(StaticPetDirectory::default().with_pet("pet456", pet_name));
        let mailer = Arc::new(RecordingMailer::new());
        let composer = NotificationComposer::new(users, pets, mailer.clone());

        let error = composer
            .on_status_updated(&status_event(ApplicationStatus::Rejected, ""))
            .await
            .expect_err("incomplete record");

        assert!(matches!(error, EventHandlerError::Enrichment { .. }));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn missing_pet_aborts_notification() {
        let users = Arc::new(StaticUserDirectory::default().with_user(
            "user123",
            "ada@example.com",
            None,
        ));
        let pets = Arc::new(StaticPetDirectory::default());
        let mailer = Arc::new(RecordingMailer::new());
        let composer = NotificationComposer::new(users, pets, mailer.clone());

        assert!(composer.on_created(&created_event()).await.is_err());
        assert!(mailer.sent().is_empty());
    }

    struct SlowUsers;

    #[async_trait]
    impl UserDirectory for SlowUsers {
        async fn get_user(&self, id: &EntityId) -> Result<UserContact, DirectoryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(DirectoryError::not_found(id.as_str()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookups_time_out() {
        let (_, pets) = directories();
        let mailer = Arc::new(RecordingMailer::new());
        let composer = NotificationComposer::new(Arc::new(SlowUsers), pets, mailer.clone())
            .with_lookup_timeout(Duration::from_millis(50));

        let error = composer
            .on_created(&created_event())
            .await
            .expect_err("lookup times out");

        assert!(error.to_string().contains("timed out"));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn delivery_failures_surface_to_caller() {
        let (users, pets) = directories();
        let mailer = Arc::new(RecordingMailer::failing());
        let composer = NotificationComposer::new(users, pets, mailer);

        let error = composer
            .on_created(&created_event())
            .await
            .expect_err("delivery fails");
        assert!(matches!(error, EventHandlerError::Delivery { .. }));
    }
}
