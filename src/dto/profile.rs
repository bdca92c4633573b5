//! Response shapes of the aggregated profile read path.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{
    AchievementEntity, AppearanceSettingsEntity, NotificationSettingsEntity,
    PrivacySettingsEntity, ProfileEntity, ProfileVisibility, Theme, UserStatsEntity,
};
use crate::dto::or_empty_object;

/// Every section of a user's profile page assembled into one document.
///
/// Collections default to `[]`, single-row sections to `{}`. `clan` is the only section that
/// is `null` when absent.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAggregate {
    pub profile: ProfileView,
    /// Handles keyed by platform name.
    #[schema(value_type = Object)]
    pub social_links: IndexMap<String, String>,
    pub achievements: Vec<AchievementView>,
    pub clan: Option<ClanView>,
    #[serde(serialize_with = "or_empty_object")]
    pub stats: Option<StatsView>,
    pub game_stats: Vec<GameStatView>,
    pub recent_matches: Vec<MatchView>,
    pub clips: Vec<ClipView>,
    #[serde(serialize_with = "or_empty_object")]
    pub notifications: Option<NotificationSettingsView>,
    #[serde(serialize_with = "or_empty_object")]
    pub privacy: Option<PrivacySettingsView>,
    #[serde(serialize_with = "or_empty_object")]
    pub appearance: Option<AppearanceSettingsView>,
    #[schema(value_type = Vec<Object>)]
    pub payment_methods: Vec<Value>,
    #[schema(value_type = Vec<Object>)]
    pub connected_accounts: Vec<Value>,
    pub coaches: Vec<CoachView>,
}

/// Core profile fields.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub is_premium: bool,
    pub premium_tier: Option<String>,
    pub joined_at: Option<String>,
}

impl From<ProfileEntity> for ProfileView {
    fn from(entity: ProfileEntity) -> Self {
        let display_name = entity
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| entity.username.clone());
        Self {
            id: entity.id,
            username: entity.username,
            display_name,
            email: entity.email,
            phone: entity.phone,
            bio: entity.bio,
            location: entity.location,
            country: entity.country,
            website: entity.website,
            avatar: entity.avatar_url,
            banner: entity.banner_url,
            is_premium: entity.is_premium,
            premium_tier: entity.premium_tier,
            joined_at: entity.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub unlocked_at: Option<String>,
}

impl From<AchievementEntity> for AchievementView {
    fn from(entity: AchievementEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            icon: entity.icon,
            unlocked_at: entity.unlocked_at,
        }
    }
}

/// Clan membership flattened with the clan it points to.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClanView {
    pub id: Uuid,
    pub name: String,
    pub tag: Option<String>,
    pub logo: Option<String>,
    pub role: String,
    /// Number of membership rows referencing the clan.
    pub members: usize,
    pub points: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_matches: i64,
    pub wins: i64,
    pub losses: i64,
    pub win_rate: f64,
    /// `null` when the owner hides earnings from visitors.
    pub earnings: Option<f64>,
    pub hours_played: f64,
    pub current_streak: i64,
    pub best_streak: i64,
}

impl From<UserStatsEntity> for StatsView {
    fn from(entity: UserStatsEntity) -> Self {
        Self {
            total_matches: entity.total_matches,
            wins: entity.wins,
            losses: entity.losses,
            win_rate: entity.win_rate,
            earnings: Some(entity.earnings),
            hours_played: entity.hours_played,
            current_streak: entity.current_streak,
            best_streak: entity.best_streak,
        }
    }
}

/// Statistics for one game the user played.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStatView {
    pub game: String,
    pub icon: Option<String>,
    /// Relative label such as "3 days ago".
    pub last_played: String,
    pub stats: Vec<GameStatDetailView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GameStatDetailView {
    pub label: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MatchView {
    pub id: Uuid,
    pub game: String,
    pub opponent: Option<String>,
    pub result: Option<String>,
    pub score: Option<String>,
    pub prize: Option<f64>,
    /// Relative label such as "2 hours ago".
    pub date: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipView {
    pub id: Uuid,
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub uploaded: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettingsView {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub match_invites: bool,
    pub clan_updates: bool,
    pub tournament_reminders: bool,
    pub marketing_emails: bool,
}

impl From<NotificationSettingsEntity> for NotificationSettingsView {
    fn from(entity: NotificationSettingsEntity) -> Self {
        Self {
            email_notifications: entity.email_notifications,
            push_notifications: entity.push_notifications,
            match_invites: entity.match_invites,
            clan_updates: entity.clan_updates,
            tournament_reminders: entity.tournament_reminders,
            marketing_emails: entity.marketing_emails,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettingsView {
    pub profile_visibility: ProfileVisibility,
    pub show_online_status: bool,
    pub show_match_history: bool,
    pub show_earnings: bool,
    pub allow_friend_requests: bool,
}

impl From<PrivacySettingsEntity> for PrivacySettingsView {
    fn from(entity: PrivacySettingsEntity) -> Self {
        Self {
            profile_visibility: entity.profile_visibility,
            show_online_status: entity.show_online_status,
            show_match_history: entity.show_match_history,
            show_earnings: entity.show_earnings,
            allow_friend_requests: entity.allow_friend_requests,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceSettingsView {
    pub theme: Theme,
    pub accent_color: String,
    pub reduce_motion: bool,
    pub compact_mode: bool,
    pub sound_effects: bool,
}

impl From<AppearanceSettingsEntity> for AppearanceSettingsView {
    fn from(entity: AppearanceSettingsEntity) -> Self {
        Self {
            theme: entity.theme,
            accent_color: entity.accent_color.0,
            reduce_motion: entity.reduce_motion,
            compact_mode: entity.compact_mode,
            sound_effects: entity.sound_effects,
        }
    }
}

/// Coach listing shown on the profile page, with specialties attached.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoachView {
    pub id: Uuid,
    pub name: String,
    pub avatar: Option<String>,
    pub rating: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub specialties: Vec<String>,
}
