//! Application domain models for catalog submissions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_handle, validate_not_blank};
use uuid::Uuid;
use validator::Validate;

/// Review status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Published,
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Pending => write!(f, "pending"),
            ApplicationStatus::Published => write!(f, "published"),
            ApplicationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "published" => Ok(ApplicationStatus::Published),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("Unknown application status: {}", other)),
        }
    }
}

/// Date range during which a published application is publicly visible.
///
/// An unset bound is open on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PublishWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether both bounds are set and the end precedes the start.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if end < start)
    }

    /// Whether `today` falls inside the window (bounds inclusive).
    pub fn contains(&self, today: NaiveDate) -> bool {
        self.start.map_or(true, |start| start <= today) && self.end.map_or(true, |end| today <= end)
    }
}

/// A catalog submission and its review state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub description: String,
    pub description_en: Option<String>,
    pub logo_url: Option<String>,
    pub manager_username: String,
    pub contact_link: String,
    pub status: ApplicationStatus,
    pub publish_start: Option<NaiveDate>,
    pub publish_end: Option<NaiveDate>,
    pub registration_code: Option<String>,
    pub bound_recipient_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn publish_window(&self) -> PublishWindow {
        PublishWindow::new(self.publish_start, self.publish_end)
    }

    /// Published and inside the publish window.
    pub fn is_live(&self, today: NaiveDate) -> bool {
        self.status == ApplicationStatus::Published && self.publish_window().contains(today)
    }

    /// Description in the requested locale, falling back to the default one.
    pub fn description_for(&self, locale: Locale) -> &str {
        match locale {
            Locale::English => self
                .description_en
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(&self.description),
            Locale::Default => &self.description,
        }
    }
}

/// Fields required to insert a new pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub category: String,
    pub name: String,
    pub description: String,
    pub description_en: Option<String>,
    pub logo_url: Option<String>,
    pub manager_username: String,
    pub contact_link: String,
}

/// Locale requested by a catalog reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Default,
    English,
}

impl Locale {
    /// Parses a locale query value such as `en` or `en-US`; anything else is the default.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "en" || v.starts_with("en-") || v.starts_with("en_") => {
                Locale::English
            }
            _ => Locale::Default,
        }
    }
}

/// Request to submit a new application.
///
/// Required fields are optional at the serde level so a missing field is
/// reported as a validation error instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    #[serde(default)]
    #[validate(
        required(message = "category is required"),
        custom(function = "validate_not_blank")
    )]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "name is required"),
        custom(function = "validate_not_blank"),
        length(max = 120, message = "name must be at most 120 characters")
    )]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "description is required"),
        custom(function = "validate_not_blank"),
        length(max = 4000, message = "description must be at most 4000 characters")
    )]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(max = 4000, message = "descriptionEn must be at most 4000 characters"))]
    pub description_en: Option<String>,

    #[serde(default, alias = "logoData")]
    pub logo_url: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "managerUsername is required"),
        custom(function = "validate_handle")
    )]
    pub manager_username: Option<String>,

    #[serde(default)]
    pub contact_link: Option<String>,
}

/// Response after submitting an application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationResponse {
    pub success: bool,
    pub application_id: Uuid,
}

/// Partial update of an application; absent fields are left untouched.
///
/// Nullable columns use `Option<Option<T>>`: an absent key keeps the stored
/// value, an explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    #[validate(custom(function = "validate_not_blank"))]
    pub category: Option<String>,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 120, message = "name must be at most 120 characters")
    )]
    pub name: Option<String>,

    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 4000, message = "description must be at most 4000 characters")
    )]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 4000, message = "descriptionEn must be at most 4000 characters"))]
    pub description_en: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub logo_url: Option<Option<String>>,

    #[validate(custom(function = "validate_handle"))]
    pub manager_username: Option<String>,

    #[validate(custom(function = "validate_not_blank"))]
    pub contact_link: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub publish_start: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "present")]
    pub publish_end: Option<Option<NaiveDate>>,
}

/// Marks a key as present so `null` deserializes to `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        *self == ApplicationPatch::default()
    }
}

/// Reviewer decision on an application.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub id: Uuid,
    pub approved: bool,
    #[serde(default, alias = "startDate")]
    pub publish_start: Option<NaiveDate>,
    #[serde(default, alias = "endDate")]
    pub publish_end: Option<NaiveDate>,
}

impl ReviewDecision {
    pub fn publish_window(&self) -> PublishWindow {
        PublishWindow::new(self.publish_start, self.publish_end)
    }
}

/// Response after a review decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_code: Option<String>,
}

/// Query parameters for the review listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListApplicationsQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// Query parameters for the public catalog listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCompaniesQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "lang")]
    pub locale: Option<String>,
}

/// Query parameters for the public detail endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyDetailQuery {
    #[serde(default, alias = "lang")]
    pub locale: Option<String>,
}

/// Public view of a live application.
///
/// Registration code, bound recipient, status and review timestamps are
/// deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCompany {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub manager_username: String,
    pub contact_link: String,
}

impl PublicCompany {
    pub fn from_application(app: &Application, locale: Locale) -> Self {
        Self {
            id: app.id,
            category: app.category.clone(),
            name: app.name.clone(),
            description: app.description_for(locale).to_string(),
            logo_url: app.logo_url.clone(),
            manager_username: app.manager_username.clone(),
            contact_link: app.contact_link.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_application() -> Application {
        let now = Utc::now();
        Application {
            id: Uuid::new_v4(),
            category: "SMM".to_string(),
            name: "Acme".to_string(),
            description: "описание".to_string(),
            description_en: Some("description".to_string()),
            logo_url: None,
            manager_username: "alice".to_string(),
            contact_link: "https://t.me/alice".to_string(),
            status: ApplicationStatus::Published,
            publish_start: None,
            publish_end: None,
            registration_code: Some("OFB-12345678".to_string()),
            bound_recipient_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Published,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(status.to_string().parse::<ApplicationStatus>(), Ok(status));
        }
        assert!("archived".parse::<ApplicationStatus>().is_err());
        assert_eq!(" Published ".parse(), Ok(ApplicationStatus::Published));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = PublishWindow::new(Some(date(2026, 1, 1)), Some(date(2026, 1, 31)));
        assert!(!window.contains(date(2025, 12, 31)));
        assert!(window.contains(date(2026, 1, 1)));
        assert!(window.contains(date(2026, 1, 15)));
        assert!(window.contains(date(2026, 1, 31)));
        assert!(!window.contains(date(2026, 2, 1)));
    }

    #[test]
    fn test_window_open_sides() {
        assert!(PublishWindow::unbounded().contains(date(1999, 1, 1)));
        let from = PublishWindow::new(Some(date(2026, 3, 1)), None);
        assert!(!from.contains(date(2026, 2, 28)));
        assert!(from.contains(date(2099, 1, 1)));
        let until = PublishWindow::new(None, Some(date(2026, 3, 1)));
        assert!(until.contains(date(2000, 1, 1)));
        assert!(!until.contains(date(2026, 3, 2)));
    }

    #[test]
    fn test_window_inverted() {
        assert!(PublishWindow::new(Some(date(2026, 2, 1)), Some(date(2026, 1, 1))).is_inverted());
        assert!(!PublishWindow::new(Some(date(2026, 1, 1)), Some(date(2026, 1, 1))).is_inverted());
        assert!(!PublishWindow::new(None, Some(date(2026, 1, 1))).is_inverted());
    }

    #[test]
    fn test_is_live_requires_published_status() {
        let mut app = sample_application();
        let today = date(2026, 5, 5);
        assert!(app.is_live(today));

        app.status = ApplicationStatus::Pending;
        assert!(!app.is_live(today));

        app.status = ApplicationStatus::Rejected;
        assert!(!app.is_live(today));
    }

    #[test]
    fn test_is_live_respects_window() {
        let mut app = sample_application();
        app.publish_end = Some(date(2026, 5, 4));
        assert!(!app.is_live(date(2026, 5, 5)));
    }

    #[test]
    fn test_description_locale_fallback() {
        let mut app = sample_application();
        assert_eq!(app.description_for(Locale::English), "description");
        assert_eq!(app.description_for(Locale::Default), "описание");

        app.description_en = None;
        assert_eq!(app.description_for(Locale::English), "описание");

        app.description_en = Some("  ".to_string());
        assert_eq!(app.description_for(Locale::English), "описание");
    }

    #[test]
    fn test_locale_from_query() {
        assert_eq!(Locale::from_query(Some("en")), Locale::English);
        assert_eq!(Locale::from_query(Some("EN-us")), Locale::English);
        assert_eq!(Locale::from_query(Some("ru")), Locale::Default);
        assert_eq!(Locale::from_query(None), Locale::Default);
    }

    #[test]
    fn test_public_company_hides_internal_fields() {
        let app = sample_application();
        let public = PublicCompany::from_application(&app, Locale::English);
        let json = serde_json::to_value(&public).unwrap();

        assert_eq!(json["name"], "Acme");
        assert_eq!(json["description"], "description");
        assert!(json.get("registrationCode").is_none());
        assert!(json.get("boundRecipientId").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_submit_request_validation() {
        let valid: SubmitApplicationRequest = serde_json::from_value(serde_json::json!({
            "category": "SMM",
            "name": "Acme",
            "description": "desc",
            "managerUsername": "alice"
        }))
        .unwrap();
        assert!(valid.validate().is_ok());

        let missing_name = SubmitApplicationRequest {
            name: None,
            ..valid.clone()
        };
        assert!(missing_name.validate().is_err());

        let blank_category = SubmitApplicationRequest {
            category: Some("   ".to_string()),
            ..valid.clone()
        };
        assert!(blank_category.validate().is_err());

        let bad_handle = SubmitApplicationRequest {
            manager_username: Some("not a handle".to_string()),
            ..valid
        };
        assert!(bad_handle.validate().is_err());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ApplicationPatch::default().is_empty());
        let patch = ApplicationPatch {
            name: Some("New".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: ApplicationPatch = serde_json::from_value(serde_json::json!({
            "publishEnd": null,
            "logoUrl": "https://cdn.example/new.png"
        }))
        .unwrap();

        assert_eq!(patch.publish_end, Some(None));
        assert_eq!(patch.publish_start, None);
        assert_eq!(patch.description_en, None);
        assert_eq!(
            patch.logo_url,
            Some(Some("https://cdn.example/new.png".to_string()))
        );
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_review_decision_accepts_date_aliases() {
        let decision: ReviewDecision = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "approved": true,
            "startDate": "2026-01-01",
            "endDate": "2026-12-31"
        }))
        .unwrap();
        assert_eq!(decision.publish_start, Some(date(2026, 1, 1)));
        assert_eq!(decision.publish_end, Some(date(2026, 12, 31)));
    }

    #[test]
    fn test_review_response_omits_missing_code() {
        let json = serde_json::to_value(ReviewResponse {
            success: true,
            status: ApplicationStatus::Rejected,
            notify_code: None,
        })
        .unwrap();
        assert!(json.get("notifyCode").is_none());
        assert_eq!(json["status"], "rejected");
    }
}
