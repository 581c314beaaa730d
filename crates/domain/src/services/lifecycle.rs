//! Application lifecycle controller.
//!
//! Owns every status transition of an application and the side effects that
//! follow it: registration code issuance, code delivery, recipient binding and
//! view notifications. Store writes always complete before any notification
//! is attempted. Notifications run on detached tasks, so neither their
//! latency nor their failures reach the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use shared::code::{generate_registration_code, parse_registration_code};
use shared::validation::{contact_link_for_handle, normalize_handle, ANONYMOUS_HANDLE};
use uuid::Uuid;
use validator::Validate;

use crate::errors::LifecycleError;
use crate::models::{
    Application, ApplicationPatch, ApplicationStatus, ApplicationView, Locale, NewApplication,
    NewView, PublicCompany, PublishWindow, ReviewDecision, SubmitApplicationRequest,
    TrackViewRequest,
};
use crate::services::messages;
use crate::services::notification::{NotificationGateway, Notifier, Recipient};
use crate::services::store::{ApplicationStore, StoreError, ViewStore};

/// Attempts at storing a fresh registration code before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Default bound on a single outbound notification.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle configuration.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Chat ids that receive submissions and undeliverable codes.
    pub admin_recipients: Vec<String>,
    pub notify_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            admin_recipients: Vec::new(),
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

/// Result of a review decision.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub application: Application,
    /// Registration code of a published application.
    pub notify_code: Option<String>,
    /// Whether this decision issued the code.
    pub code_issued: bool,
}

/// Orchestrates submission, review, publication, registration and views.
#[derive(Clone)]
pub struct ApplicationLifecycle {
    applications: Arc<dyn ApplicationStore>,
    views: Arc<dyn ViewStore>,
    notifier: Notifier,
    admin_recipients: Arc<[Recipient]>,
}

impl ApplicationLifecycle {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        views: Arc<dyn ViewStore>,
        gateway: Arc<dyn NotificationGateway>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            applications,
            views,
            notifier: Notifier::new(gateway, config.notify_timeout),
            admin_recipients: config
                .admin_recipients
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(Recipient::Chat)
                .collect(),
        }
    }

    /// Creates a pending application.
    pub async fn submit(
        &self,
        request: SubmitApplicationRequest,
    ) -> Result<Application, LifecycleError> {
        request.validate()?;

        let manager_username =
            normalize_handle(request.manager_username.as_deref().unwrap_or_default());
        let contact_link = non_blank(request.contact_link)
            .unwrap_or_else(|| contact_link_for_handle(&manager_username));

        let new = NewApplication {
            category: trimmed(request.category),
            name: trimmed(request.name),
            description: trimmed(request.description),
            description_en: non_blank(request.description_en),
            logo_url: non_blank(request.logo_url),
            manager_username,
            contact_link,
        };

        let application = self.applications.insert(new).await?;
        counter!("applications_submitted_total").increment(1);
        tracing::info!(
            application_id = %application.id,
            category = %application.category,
            manager = %application.manager_username,
            "Application submitted"
        );

        if !self.admin_recipients.is_empty() {
            let notifier = self.notifier.clone();
            let admins = self.admin_recipients.clone();
            let announcement = messages::new_application_for_admin(&application);
            self.notifier.spawn(async move {
                notifier
                    .broadcast(&admins, &announcement, "new_application")
                    .await;
            });
        }

        Ok(application)
    }

    /// Applications with the given status (default `pending`), newest first.
    pub async fn list_for_review(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<Application>, LifecycleError> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw
                .parse::<ApplicationStatus>()
                .map_err(LifecycleError::Validation)?,
            None => ApplicationStatus::Pending,
        };
        Ok(self.applications.list_by_status(status).await?)
    }

    /// Applies an approve or reject decision.
    pub async fn review(&self, decision: ReviewDecision) -> Result<ReviewOutcome, LifecycleError> {
        let window = decision.publish_window();
        if window.is_inverted() {
            return Err(LifecycleError::Validation(
                "publishEnd must not precede publishStart".to_string(),
            ));
        }

        let existing = self
            .applications
            .find_by_id(decision.id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("application {}", decision.id)))?;

        if decision.approved {
            self.publish(existing, window).await
        } else {
            self.reject(existing).await
        }
    }

    async fn publish(
        &self,
        existing: Application,
        window: PublishWindow,
    ) -> Result<ReviewOutcome, LifecycleError> {
        if existing.status == ApplicationStatus::Rejected {
            return Err(LifecycleError::Conflict(format!(
                "application {} was rejected",
                existing.id
            )));
        }

        let mut attempt = 0;
        let (application, candidate) = loop {
            attempt += 1;
            let candidate = existing
                .registration_code
                .is_none()
                .then(generate_registration_code);

            match self
                .applications
                .publish(existing.id, candidate.as_deref(), window)
                .await
            {
                Ok(Some(application)) => break (application, candidate),
                Ok(None) => {
                    return Err(LifecycleError::Conflict(format!(
                        "application {} is no longer reviewable",
                        existing.id
                    )))
                }
                Err(StoreError::CodeCollision) if attempt < MAX_CODE_ATTEMPTS => {
                    tracing::warn!(
                        application_id = %existing.id,
                        attempt = attempt,
                        "Registration code collision, reissuing"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        };

        // A concurrent approval may have stored its own code first.
        let code_issued = candidate.is_some() && application.registration_code == candidate;

        counter!("applications_reviewed_total", "decision" => "approved").increment(1);
        tracing::info!(
            application_id = %application.id,
            code_issued = code_issued,
            publish_start = ?application.publish_start,
            publish_end = ?application.publish_end,
            "Application published"
        );

        if code_issued {
            if let Some(code) = application.registration_code.clone() {
                self.spawn_code_delivery(application.clone(), code);
            }
        }

        Ok(ReviewOutcome {
            notify_code: application.registration_code.clone(),
            application,
            code_issued,
        })
    }

    async fn reject(&self, existing: Application) -> Result<ReviewOutcome, LifecycleError> {
        let application = match existing.status {
            ApplicationStatus::Rejected => existing,
            ApplicationStatus::Published => {
                return Err(LifecycleError::Conflict(format!(
                    "application {} is already published",
                    existing.id
                )))
            }
            ApplicationStatus::Pending => {
                let id = existing.id;
                let application = self.applications.reject(id).await?.ok_or_else(|| {
                    LifecycleError::Conflict(format!("application {} is no longer pending", id))
                })?;
                counter!("applications_reviewed_total", "decision" => "rejected").increment(1);
                tracing::info!(application_id = %application.id, "Application rejected");
                application
            }
        };

        Ok(ReviewOutcome {
            application,
            notify_code: None,
            code_issued: false,
        })
    }

    /// Sends a fresh code to the manager, falling back to the admins.
    fn spawn_code_delivery(&self, application: Application, code: String) {
        let notifier = self.notifier.clone();
        let admins = self.admin_recipients.clone();
        self.notifier.spawn(async move {
            let manager = Recipient::Handle(application.manager_username.clone());
            let text = messages::code_for_manager(&application, &code);
            if notifier
                .send_best_effort(&manager, &text, "registration_code")
                .await
            {
                return;
            }

            if admins.is_empty() {
                tracing::warn!(
                    application_id = %application.id,
                    "Registration code undelivered and no admin recipients configured"
                );
                return;
            }

            let fallback = messages::code_for_admin(&application, &code);
            notifier
                .broadcast(&admins, &fallback, "registration_code_fallback")
                .await;
        });
    }

    /// Applies the fields present in `patch`; status is never touched.
    pub async fn update(
        &self,
        id: Uuid,
        mut patch: ApplicationPatch,
    ) -> Result<Application, LifecycleError> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(LifecycleError::Validation("no fields to update".to_string()));
        }
        if let Some(handle) = patch.manager_username.as_deref() {
            patch.manager_username = Some(normalize_handle(handle));
        }

        let existing = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("application {}", id)))?;

        let window = PublishWindow::new(
            patch.publish_start.unwrap_or(existing.publish_start),
            patch.publish_end.unwrap_or(existing.publish_end),
        );
        if window.is_inverted() {
            return Err(LifecycleError::Validation(
                "publishEnd must not precede publishStart".to_string(),
            ));
        }

        let application = self
            .applications
            .update(id, &patch)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("application {}", id)))?;
        tracing::info!(application_id = %id, "Application updated");
        Ok(application)
    }

    /// Hard-deletes an application. Recorded views are left in place.
    pub async fn delete(&self, id: Uuid) -> Result<(), LifecycleError> {
        if !self.applications.delete(id).await? {
            return Err(LifecycleError::NotFound(format!("application {}", id)));
        }
        tracing::info!(application_id = %id, "Application deleted");
        Ok(())
    }

    /// Live applications shaped for the public catalog.
    pub async fn list_public(
        &self,
        category: Option<&str>,
        locale: Locale,
        today: NaiveDate,
    ) -> Result<Vec<PublicCompany>, LifecycleError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let applications = self.applications.list_live(category, today).await?;
        Ok(applications
            .iter()
            .filter(|app| app.is_live(today))
            .map(|app| PublicCompany::from_application(app, locale))
            .collect())
    }

    /// A single live application. Missing, unpublished and out-of-window
    /// records are all reported as not found.
    pub async fn get_public(
        &self,
        id: Uuid,
        locale: Locale,
        today: NaiveDate,
    ) -> Result<PublicCompany, LifecycleError> {
        self.applications
            .find_by_id(id)
            .await?
            .filter(|app| app.is_live(today))
            .map(|app| PublicCompany::from_application(&app, locale))
            .ok_or_else(|| LifecycleError::NotFound(format!("company {}", id)))
    }

    /// Records a view and notifies the bound recipient, if any.
    pub async fn track_view(
        &self,
        request: TrackViewRequest,
    ) -> Result<ApplicationView, LifecycleError> {
        request.validate()?;

        let application_id = request.application_id.unwrap_or_default();
        let viewer_username = request
            .viewer_username
            .as_deref()
            .map(normalize_handle)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| ANONYMOUS_HANDLE.to_string());

        let view = self
            .views
            .record_view(NewView {
                application_id,
                viewer_id: request.viewer_id.unwrap_or_default(),
                viewer_username,
            })
            .await?;
        counter!("application_views_total").increment(1);
        tracing::debug!(
            application_id = %view.application_id,
            viewer_id = %view.viewer_id,
            "View recorded"
        );

        match self.applications.find_by_id(application_id).await {
            Ok(Some(application)) => {
                if let Some(recipient_id) = application.bound_recipient_id {
                    let text = messages::view_notification(
                        &application.name,
                        Some(view.viewer_username.as_str()),
                        view.viewed_at,
                    );
                    let notifier = self.notifier.clone();
                    self.notifier.spawn(async move {
                        notifier
                            .send_best_effort(&Recipient::Chat(recipient_id), &text, "view")
                            .await;
                    });
                }
            }
            Ok(None) => {
                tracing::debug!(application_id = %application_id, "View recorded for unknown application");
            }
            Err(err) => {
                tracing::warn!(
                    application_id = %application_id,
                    error = %err,
                    "Failed to look up application after recording view"
                );
            }
        }

        Ok(view)
    }

    /// Binds `recipient_id` to the published application holding `code`.
    ///
    /// First binding wins. Unknown codes yield `NotFound`; codes that are
    /// already claimed yield `Conflict`.
    pub async fn redeem_code(
        &self,
        code: &str,
        recipient_id: &str,
    ) -> Result<Application, LifecycleError> {
        let code = parse_registration_code(code)
            .map_err(|err| LifecycleError::Validation(err.to_string()))?;

        if let Some(application) = self.applications.bind_recipient(&code, recipient_id).await? {
            counter!("registration_codes_bound_total").increment(1);
            tracing::info!(
                application_id = %application.id,
                recipient_id = %recipient_id,
                "Registration code bound"
            );
            return Ok(application);
        }

        match self.applications.find_by_code(&code).await {
            Ok(Some(application)) if application.bound_recipient_id.is_some() => {
                tracing::info!(
                    application_id = %application.id,
                    recipient_id = %recipient_id,
                    "Registration code already claimed"
                );
                Err(LifecycleError::Conflict("registration code already claimed".to_string()))
            }
            Ok(Some(application)) => {
                tracing::info!(
                    application_id = %application.id,
                    status = %application.status,
                    "Registration code not claimable"
                );
                Err(LifecycleError::NotFound("registration code".to_string()))
            }
            Ok(None) => Err(LifecycleError::NotFound("registration code".to_string())),
            Err(err) => {
                tracing::warn!(error = %err, "Registration code diagnostic lookup failed");
                Err(LifecycleError::NotFound("registration code".to_string()))
            }
        }
    }

    /// Waits for notifications spawned so far to finish.
    pub async fn flush_notifications(&self) {
        self.notifier.flush().await;
    }

    /// Today's date for live-window checks.
    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
