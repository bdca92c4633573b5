//! Partial profile update payloads and per-section results.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::{ProfileVisibility, Theme, tables};
use crate::dto::validation::validate_hex_color;

/// Body of `PUT /profile`; any subset of the four writable sections.
///
/// Sections stay raw JSON here so a malformed section fails on its own instead of rejecting
/// the whole body.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(value_type = Option<ProfilePatch>)]
    pub profile: Option<Value>,
    #[schema(value_type = Option<NotificationsPatch>)]
    pub notifications: Option<Value>,
    #[schema(value_type = Option<PrivacyPatch>)]
    pub privacy: Option<Value>,
    #[schema(value_type = Option<AppearancePatch>)]
    pub appearance: Option<Value>,
}

impl UpdateProfileRequest {
    /// Present sections in a stable order.
    pub fn into_sections(self) -> Vec<(SectionKind, Value)> {
        [
            (SectionKind::Profile, self.profile),
            (SectionKind::Notifications, self.notifications),
            (SectionKind::Privacy, self.privacy),
            (SectionKind::Appearance, self.appearance),
        ]
        .into_iter()
        .filter_map(|(kind, body)| body.map(|body| (kind, body)))
        .collect()
    }
}

/// Writable sections of a profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Profile,
    Notifications,
    Privacy,
    Appearance,
}

impl SectionKind {
    /// Table written by the section.
    pub fn table(self) -> &'static str {
        match self {
            SectionKind::Profile => tables::PROFILES,
            SectionKind::Notifications => tables::NOTIFICATION_SETTINGS,
            SectionKind::Privacy => tables::PRIVACY_SETTINGS,
            SectionKind::Appearance => tables::APPEARANCE_SETTINGS,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::Profile => "profile",
            SectionKind::Notifications => "notifications",
            SectionKind::Privacy => "privacy",
            SectionKind::Appearance => "appearance",
        };
        f.write_str(name)
    }
}

/// Core profile fields a user may edit.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfilePatch {
    #[serde(alias = "displayName", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 50))]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub website: Option<String>,
    #[serde(alias = "avatarUrl", skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[serde(alias = "bannerUrl", skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub banner_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct NotificationsPatch {
    #[serde(alias = "emailNotifications", skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(alias = "pushNotifications", skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(alias = "matchInvites", skip_serializing_if = "Option::is_none")]
    pub match_invites: Option<bool>,
    #[serde(alias = "clanUpdates", skip_serializing_if = "Option::is_none")]
    pub clan_updates: Option<bool>,
    #[serde(alias = "tournamentReminders", skip_serializing_if = "Option::is_none")]
    pub tournament_reminders: Option<bool>,
    #[serde(alias = "marketingEmails", skip_serializing_if = "Option::is_none")]
    pub marketing_emails: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct PrivacyPatch {
    #[serde(alias = "profileVisibility", skip_serializing_if = "Option::is_none")]
    pub profile_visibility: Option<ProfileVisibility>,
    #[serde(alias = "showOnlineStatus", skip_serializing_if = "Option::is_none")]
    pub show_online_status: Option<bool>,
    #[serde(alias = "showMatchHistory", skip_serializing_if = "Option::is_none")]
    pub show_match_history: Option<bool>,
    #[serde(alias = "showEarnings", skip_serializing_if = "Option::is_none")]
    pub show_earnings: Option<bool>,
    #[serde(alias = "allowFriendRequests", skip_serializing_if = "Option::is_none")]
    pub allow_friend_requests: Option<bool>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppearancePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    /// `#rrggbb`
    #[serde(alias = "accentColor", skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_hex_color"))]
    pub accent_color: Option<String>,
    #[serde(alias = "reduceMotion", skip_serializing_if = "Option::is_none")]
    pub reduce_motion: Option<bool>,
    #[serde(alias = "compactMode", skip_serializing_if = "Option::is_none")]
    pub compact_mode: Option<bool>,
    #[serde(alias = "soundEffects", skip_serializing_if = "Option::is_none")]
    pub sound_effects: Option<bool>,
}

/// One decoded and validated section of an update request.
#[derive(Debug)]
pub enum SectionUpdate {
    Profile(ProfilePatch),
    Notifications(NotificationsPatch),
    Privacy(PrivacyPatch),
    Appearance(AppearancePatch),
}

impl SectionUpdate {
    /// Decode and validate the raw body of section `kind`.
    ///
    /// The error is a client-facing description of what is wrong with the section.
    pub fn parse(kind: SectionKind, body: Value) -> Result<Self, String> {
        let update = match kind {
            SectionKind::Profile => SectionUpdate::Profile(decode(body)?),
            SectionKind::Notifications => SectionUpdate::Notifications(decode(body)?),
            SectionKind::Privacy => SectionUpdate::Privacy(decode(body)?),
            SectionKind::Appearance => SectionUpdate::Appearance(decode(body)?),
        };
        if update.is_empty() {
            return Err(format!("{kind} section has no fields to update"));
        }
        Ok(update)
    }

    pub fn kind(&self) -> SectionKind {
        match self {
            SectionUpdate::Profile(_) => SectionKind::Profile,
            SectionUpdate::Notifications(_) => SectionKind::Notifications,
            SectionUpdate::Privacy(_) => SectionKind::Privacy,
            SectionUpdate::Appearance(_) => SectionKind::Appearance,
        }
    }

    /// Column values carried by the patch, keyed by column name.
    pub fn into_row(self) -> Map<String, Value> {
        self.row()
    }

    fn is_empty(&self) -> bool {
        self.row().is_empty()
    }

    fn row(&self) -> Map<String, Value> {
        let encoded = match self {
            SectionUpdate::Profile(patch) => serde_json::to_value(patch),
            SectionUpdate::Notifications(patch) => serde_json::to_value(patch),
            SectionUpdate::Privacy(patch) => serde_json::to_value(patch),
            SectionUpdate::Appearance(patch) => serde_json::to_value(patch),
        };
        match encoded {
            Ok(Value::Object(row)) => row,
            _ => Map::new(),
        }
    }
}

fn decode<T>(body: Value) -> Result<T, String>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let patch: T = serde_json::from_value(body).map_err(|err| format!("invalid payload: {err}"))?;
    patch
        .validate()
        .map_err(|err| format!("validation failed: {err}"))?;
    Ok(patch)
}

/// Why a section could not be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionFailure {
    /// The section body was malformed or failed validation.
    Validation,
    /// The row the section targets does not exist.
    NotFound,
    /// The store rejected or could not process the write.
    Storage,
}

/// Result of one attempted section write.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectionOutcome {
    pub section: SectionKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub reason: Option<SectionFailure>,
}

impl SectionOutcome {
    pub fn succeeded(section: SectionKind) -> Self {
        Self {
            section,
            success: true,
            error: None,
            reason: None,
        }
    }

    pub fn failed(section: SectionKind, reason: SectionFailure, error: String) -> Self {
        Self {
            section,
            success: false,
            error: Some(error),
            reason: Some(reason),
        }
    }
}

/// Outcome of every section attempted by one update request.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    sections: Vec<SectionOutcome>,
}

impl UpdateReport {
    pub fn new(sections: Vec<SectionOutcome>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[SectionOutcome] {
        &self.sections
    }

    pub fn is_success(&self) -> bool {
        self.sections.iter().all(|outcome| outcome.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SectionOutcome> {
        self.sections.iter().filter(|outcome| !outcome.success)
    }

    /// True when something failed and every failure is a client mistake.
    pub fn only_validation_failures(&self) -> bool {
        let mut failures = self.failed().peekable();
        failures.peek().is_some()
            && failures.all(|outcome| outcome.reason == Some(SectionFailure::Validation))
    }
}

/// Body returned by `PUT /profile`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateProfileResponse {
    pub success: bool,
    /// Names the failed sections, e.g. "Failed to update notifications, privacy".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sections: Vec<SectionOutcome>,
}

impl From<UpdateReport> for UpdateProfileResponse {
    fn from(report: UpdateReport) -> Self {
        let failed: Vec<String> = report
            .failed()
            .map(|outcome| outcome.section.to_string())
            .collect();
        let error = (!failed.is_empty()).then(|| format!("Failed to update {}", failed.join(", ")));
        Self {
            success: failed.is_empty(),
            error,
            sections: report.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_lists_only_present_sections() {
        let request: UpdateProfileRequest = serde_json::from_value(json!({
            "privacy": {"showEarnings": true},
            "profile": {"bio": "hi"},
            "appearance": null
        }))
        .unwrap();
        let kinds: Vec<SectionKind> = request
            .into_sections()
            .into_iter()
            .map(|(kind, _)| kind)
            .collect();
        assert_eq!(kinds, vec![SectionKind::Profile, SectionKind::Privacy]);
    }

    #[test]
    fn camel_case_input_becomes_column_names() {
        let update = SectionUpdate::parse(
            SectionKind::Privacy,
            json!({"profileVisibility": "friends", "showEarnings": true}),
        )
        .unwrap();
        let row = update.into_row();
        assert_eq!(row.get("profile_visibility"), Some(&json!("friends")));
        assert_eq!(row.get("show_earnings"), Some(&json!(true)));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn malformed_sections_are_rejected() {
        let rejected = [
            (SectionKind::Notifications, json!({"emailNotifications": "yes"})),
            (SectionKind::Notifications, json!({"unknownToggle": true})),
            (SectionKind::Appearance, json!({"accentColor": "purple"})),
            (SectionKind::Profile, json!({"displayName": ""})),
            (SectionKind::Profile, json!({"website": "not a url"})),
            (SectionKind::Privacy, json!({})),
        ];
        for (kind, body) in rejected {
            assert!(SectionUpdate::parse(kind, body.clone()).is_err(), "{kind}: {body}");
        }
    }

    #[test]
    fn response_names_failed_sections() {
        let report = UpdateReport::new(vec![
            SectionOutcome::failed(
                SectionKind::Notifications,
                SectionFailure::Validation,
                "bad".into(),
            ),
            SectionOutcome::succeeded(SectionKind::Privacy),
            SectionOutcome::failed(SectionKind::Appearance, SectionFailure::Storage, "down".into()),
        ]);
        assert!(!report.is_success());
        assert!(!report.only_validation_failures());

        let body = serde_json::to_value(UpdateProfileResponse::from(report)).unwrap();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Failed to update notifications, appearance"));
        assert_eq!(body["sections"][1], json!({"section": "privacy", "success": true}));
    }

    #[test]
    fn successful_report_has_no_error() {
        let report = UpdateReport::new(vec![SectionOutcome::succeeded(SectionKind::Profile)]);
        assert!(report.is_success());
        assert!(!report.only_validation_failures());
        let body = serde_json::to_value(UpdateProfileResponse::from(report)).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "sections": [{"section": "profile", "success": true}]})
        );
    }
}
