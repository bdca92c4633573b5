use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnNull, serde_as};
use utoipa::ToSchema;
use uuid::Uuid;

/// Table names shared by every store implementation.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const SOCIAL_LINKS: &str = "social_links";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const CLAN_MEMBERS: &str = "clan_members";
    pub const CLANS: &str = "clans";
    pub const USER_STATS: &str = "user_stats";
    pub const USER_GAME_STATS: &str = "user_game_stats";
    pub const GAME_STAT_DETAILS: &str = "game_stat_details";
    pub const GAMES: &str = "games";
    pub const MATCHES: &str = "matches";
    pub const CLIPS: &str = "clips";
    pub const NOTIFICATION_SETTINGS: &str = "notification_settings";
    pub const PRIVACY_SETTINGS: &str = "privacy_settings";
    pub const APPEARANCE_SETTINGS: &str = "appearance_settings";
    pub const PAYMENT_METHODS: &str = "payment_methods";
    pub const CONNECTED_ACCOUNTS: &str = "connected_accounts";
    pub const COACHES: &str = "coaches";
    pub const COACH_SPECIALTIES: &str = "coach_specialties";
}

/// Core profile row, one per registered user.
///
/// The store returns every column, so nullable non-`Option` columns read `null` as their default.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileEntity {
    /// Internal identifier used as foreign key by every dependent table.
    pub id: Uuid,
    /// Identity issued by the hosted auth service.
    #[serde(default)]
    pub auth_user_id: Option<Uuid>,
    /// Unique public handle.
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Blob storage URL of the avatar image.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Blob storage URL of the banner image.
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_tier: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Insert payload for a freshly created profile.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfileEntity {
    pub id: Uuid,
    pub auth_user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_premium: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocialLinkEntity {
    pub platform: String,
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AchievementEntity {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub unlocked_at: Option<String>,
}

/// Membership row linking a profile to at most one clan.
#[derive(Debug, Clone, Deserialize)]
pub struct ClanMembershipEntity {
    pub clan_id: Uuid,
    #[serde(default)]
    pub role: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ClanEntity {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub points: i64,
}

/// Aggregate competitive counters for a profile.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserStatsEntity {
    #[serde_as(as = "DefaultOnNull")]
    pub total_matches: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub wins: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub losses: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub win_rate: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub earnings: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub hours_played: f64,
    #[serde_as(as = "DefaultOnNull")]
    pub current_streak: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub best_streak: i64,
}

/// Parent row of the per-game statistics; detail rows reference its `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserGameStatEntity {
    pub id: Uuid,
    #[serde(default)]
    pub game_id: Option<Uuid>,
    #[serde(default)]
    pub last_played: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameStatDetailEntity {
    pub label: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameEntity {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchEntity {
    pub id: Uuid,
    #[serde(default)]
    pub game_id: Option<Uuid>,
    #[serde(default)]
    pub opponent_name: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub prize: Option<f64>,
    #[serde(default)]
    pub played_at: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ClipEntity {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub views: i64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub likes: i64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationSettingsEntity {
    #[serde_as(as = "DefaultOnNull")]
    pub email_notifications: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub push_notifications: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub match_invites: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub clan_updates: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub tournament_reminders: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub marketing_emails: bool,
}

impl Default for NotificationSettingsEntity {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            match_invites: true,
            clan_updates: true,
            tournament_reminders: true,
            marketing_emails: false,
        }
    }
}

/// Who may see a profile page.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    #[default]
    Public,
    Friends,
    Private,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrivacySettingsEntity {
    #[serde_as(as = "DefaultOnNull")]
    pub profile_visibility: ProfileVisibility,
    #[serde_as(as = "DefaultOnNull")]
    pub show_online_status: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub show_match_history: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub show_earnings: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub allow_friend_requests: bool,
}

impl Default for PrivacySettingsEntity {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Public,
            show_online_status: true,
            show_match_history: true,
            show_earnings: false,
            allow_friend_requests: true,
        }
    }
}

/// Color scheme of the client UI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    System,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppearanceSettingsEntity {
    #[serde_as(as = "DefaultOnNull")]
    pub theme: Theme,
    #[serde_as(as = "DefaultOnNull")]
    pub accent_color: AccentColor,
    #[serde_as(as = "DefaultOnNull")]
    pub reduce_motion: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub compact_mode: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub sound_effects: bool,
}

/// `#rrggbb` accent of the client UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AccentColor(pub String);

impl Default for AccentColor {
    fn default() -> Self {
        Self("#8b5cf6".into())
    }
}

impl Default for AppearanceSettingsEntity {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            accent_color: AccentColor::default(),
            reduce_motion: false,
            compact_mode: false,
            sound_effects: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoachEntity {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoachSpecialtyEntity {
    pub specialty: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn null_columns_read_as_defaults() {
        let profile: ProfileEntity = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "username": "gamer254",
            "display_name": null,
            "is_premium": null
        }))
        .unwrap();
        assert!(!profile.is_premium);
        assert_eq!(profile.display_name, None);

        let clip: ClipEntity = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "views": null,
            "likes": 4,
            "comments": null
        }))
        .unwrap();
        assert_eq!((clip.views, clip.likes, clip.comments), (0, 4, 0));

        let stats: UserStatsEntity =
            serde_json::from_value(json!({"wins": 3, "earnings": null})).unwrap();
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.earnings, 0.0);
    }

    #[test]
    fn settings_rows_fill_missing_and_null_columns() {
        let appearance: AppearanceSettingsEntity =
            serde_json::from_value(json!({"theme": null, "accent_color": null})).unwrap();
        assert_eq!(appearance.theme, Theme::Dark);
        assert_eq!(appearance.accent_color, AccentColor::default());
        assert!(appearance.sound_effects);

        let privacy: PrivacySettingsEntity =
            serde_json::from_value(json!({"profile_visibility": null, "show_earnings": null}))
                .unwrap();
        assert_eq!(privacy.profile_visibility, ProfileVisibility::Public);
        assert!(!privacy.show_earnings);
        assert!(privacy.show_match_history);
    }
}
