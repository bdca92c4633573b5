use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::warn;
use uuid::Uuid;

use crate::dao::{
    data_store::DataStore,
    models::{
        AchievementEntity, AppearanceSettingsEntity, ClanEntity, ClanMembershipEntity, ClipEntity,
        CoachEntity, CoachSpecialtyEntity, GameEntity, GameStatDetailEntity, MatchEntity,
        NewProfileEntity, NotificationSettingsEntity, PrivacySettingsEntity, ProfileEntity,
        SocialLinkEntity, UserGameStatEntity, UserStatsEntity, tables,
    },
    query::Query,
    storage::{StorageError, StorageResult},
};

/// Per-user tables seeded with a default row when a profile is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRow {
    Notifications,
    Privacy,
    Appearance,
    Stats,
}

impl DefaultRow {
    pub const ALL: [DefaultRow; 4] = [
        DefaultRow::Notifications,
        DefaultRow::Privacy,
        DefaultRow::Appearance,
        DefaultRow::Stats,
    ];

    pub fn table(self) -> &'static str {
        match self {
            DefaultRow::Notifications => tables::NOTIFICATION_SETTINGS,
            DefaultRow::Privacy => tables::PRIVACY_SETTINGS,
            DefaultRow::Appearance => tables::APPEARANCE_SETTINGS,
            DefaultRow::Stats => tables::USER_STATS,
        }
    }

    fn defaults(self) -> Value {
        let encoded = match self {
            DefaultRow::Notifications => {
                serde_json::to_value(NotificationSettingsEntity::default())
            }
            DefaultRow::Privacy => serde_json::to_value(PrivacySettingsEntity::default()),
            DefaultRow::Appearance => serde_json::to_value(AppearanceSettingsEntity::default()),
            DefaultRow::Stats => serde_json::to_value(UserStatsEntity::default()),
        };
        encoded.unwrap_or_else(|_| json!({}))
    }
}

/// Typed access to the profile table and every table keyed by a profile id.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DataStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Decode every row of `query`; rows that do not decode are logged and skipped.
    async fn fetch_all<T: DeserializeOwned>(&self, query: Query) -> StorageResult<Vec<T>> {
        let table = query.table_name();
        let rows = self.store.select(query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                decode(table, row)
                    .inspect_err(|err| warn!(table, error = %err, "skipping undecodable row"))
                    .ok()
            })
            .collect())
    }

    async fn fetch_one<T: DeserializeOwned>(&self, query: Query) -> StorageResult<Option<T>> {
        let table = query.table_name();
        self.store
            .select_single(query)
            .await?
            .map(|row| decode(table, row))
            .transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> StorageResult<Option<ProfileEntity>> {
        self.fetch_one(Query::table(tables::PROFILES).eq("username", username))
            .await
    }

    pub async fn find_by_auth_user(
        &self,
        auth_user_id: Uuid,
    ) -> StorageResult<Option<ProfileEntity>> {
        self.fetch_one(Query::table(tables::PROFILES).eq("auth_user_id", auth_user_id))
            .await
    }

    /// Insert a profile row and return it as confirmed by the store.
    pub async fn insert_profile(&self, profile: NewProfileEntity) -> StorageResult<ProfileEntity> {
        let row = serde_json::to_value(&profile)
            .map_err(|source| StorageError::decode(tables::PROFILES, source))?;
        let stored = self.store.insert(tables::PROFILES, row).await?;
        decode(tables::PROFILES, stored)
    }

    /// Insert the default settings row of `kind` for `profile_id`.
    pub async fn insert_default_row(
        &self,
        kind: DefaultRow,
        profile_id: Uuid,
    ) -> StorageResult<()> {
        let mut row = kind.defaults();
        if let Value::Object(fields) = &mut row {
            fields.insert("user_id".into(), Value::String(profile_id.to_string()));
        }
        self.store.insert(kind.table(), row).await?;
        Ok(())
    }

    pub async fn social_links(&self, profile_id: Uuid) -> StorageResult<Vec<SocialLinkEntity>> {
        self.fetch_all(Query::table(tables::SOCIAL_LINKS).eq("user_id", profile_id))
            .await
    }

    pub async fn achievements(&self, profile_id: Uuid) -> StorageResult<Vec<AchievementEntity>> {
        self.fetch_all(
            Query::table(tables::ACHIEVEMENTS)
                .eq("user_id", profile_id)
                .order_by("unlocked_at", true),
        )
        .await
    }

    pub async fn clan_membership(
        &self,
        profile_id: Uuid,
    ) -> StorageResult<Option<ClanMembershipEntity>> {
        self.fetch_one(Query::table(tables::CLAN_MEMBERS).eq("user_id", profile_id))
            .await
    }

    pub async fn clan(&self, clan_id: Uuid) -> StorageResult<Option<ClanEntity>> {
        self.fetch_one(Query::table(tables::CLANS).eq("id", clan_id))
            .await
    }

    pub async fn clan_member_count(&self, clan_id: Uuid) -> StorageResult<usize> {
        let rows = self
            .store
            .select(
                Query::table(tables::CLAN_MEMBERS)
                    .columns("user_id")
                    .eq("clan_id", clan_id),
            )
            .await?;
        Ok(rows.len())
    }

    pub async fn user_stats(&self, profile_id: Uuid) -> StorageResult<Option<UserStatsEntity>> {
        self.fetch_one(Query::table(tables::USER_STATS).eq("user_id", profile_id))
            .await
    }

    pub async fn game_stats(&self, profile_id: Uuid) -> StorageResult<Vec<UserGameStatEntity>> {
        self.fetch_all(
            Query::table(tables::USER_GAME_STATS)
                .eq("user_id", profile_id)
                .order_by("last_played", true),
        )
        .await
    }

    pub async fn game_stat_details(
        &self,
        stat_id: Uuid,
    ) -> StorageResult<Vec<GameStatDetailEntity>> {
        self.fetch_all(Query::table(tables::GAME_STAT_DETAILS).eq("user_game_stat_id", stat_id))
            .await
    }

    pub async fn game(&self, game_id: Uuid) -> StorageResult<Option<GameEntity>> {
        self.fetch_one(Query::table(tables::GAMES).eq("id", game_id))
            .await
    }

    pub async fn recent_matches(
        &self,
        profile_id: Uuid,
        limit: usize,
    ) -> StorageResult<Vec<MatchEntity>> {
        self.fetch_all(
            Query::table(tables::MATCHES)
                .eq("user_id", profile_id)
                .order_by("played_at", true)
                .limit(limit),
        )
        .await
    }

    pub async fn clips(&self, profile_id: Uuid) -> StorageResult<Vec<ClipEntity>> {
        self.fetch_all(
            Query::table(tables::CLIPS)
                .eq("user_id", profile_id)
                .order_by("created_at", true),
        )
        .await
    }

    pub async fn notification_settings(
        &self,
        profile_id: Uuid,
    ) -> StorageResult<Option<NotificationSettingsEntity>> {
        self.fetch_one(Query::table(tables::NOTIFICATION_SETTINGS).eq("user_id", profile_id))
            .await
    }

    pub async fn privacy_settings(
        &self,
        profile_id: Uuid,
    ) -> StorageResult<Option<PrivacySettingsEntity>> {
        self.fetch_one(Query::table(tables::PRIVACY_SETTINGS).eq("user_id", profile_id))
            .await
    }

    pub async fn appearance_settings(
        &self,
        profile_id: Uuid,
    ) -> StorageResult<Option<AppearanceSettingsEntity>> {
        self.fetch_one(Query::table(tables::APPEARANCE_SETTINGS).eq("user_id", profile_id))
            .await
    }

    /// Payment method rows, passed through untouched.
    pub async fn payment_methods(&self, profile_id: Uuid) -> StorageResult<Vec<Value>> {
        self.store
            .select(Query::table(tables::PAYMENT_METHODS).eq("user_id", profile_id))
            .await
    }

    /// Connected third-party account rows, passed through untouched.
    pub async fn connected_accounts(&self, profile_id: Uuid) -> StorageResult<Vec<Value>> {
        self.store
            .select(Query::table(tables::CONNECTED_ACCOUNTS).eq("user_id", profile_id))
            .await
    }

    pub async fn coaches(&self) -> StorageResult<Vec<CoachEntity>> {
        self.fetch_all(Query::table(tables::COACHES).order_by("rating", true))
            .await
    }

    pub async fn coach_specialties(
        &self,
        coach_id: Uuid,
    ) -> StorageResult<Vec<CoachSpecialtyEntity>> {
        self.fetch_all(Query::table(tables::COACH_SPECIALTIES).eq("coach_id", coach_id))
            .await
    }

    /// Patch the profile row; `Ok(false)` when no row carried `profile_id`.
    pub async fn update_profile(
        &self,
        profile_id: Uuid,
        patch: Map<String, Value>,
    ) -> StorageResult<bool> {
        let updated = self
            .store
            .update(
                Query::table(tables::PROFILES).eq("id", profile_id),
                Value::Object(patch),
            )
            .await?;
        Ok(!updated.is_empty())
    }

    /// Merge `patch` into the settings row of `table` owned by `profile_id`, creating it if needed.
    pub async fn upsert_settings(
        &self,
        table: &'static str,
        profile_id: Uuid,
        mut patch: Map<String, Value>,
    ) -> StorageResult<()> {
        patch.insert("user_id".into(), Value::String(profile_id.to_string()));
        self.store
            .upsert(table, Value::Object(patch), "user_id")
            .await?;
        Ok(())
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        self.store.health_check().await
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }
}

fn decode<T: DeserializeOwned>(table: &str, row: Value) -> StorageResult<T> {
    serde_json::from_value(row).map_err(|source| StorageError::decode(table, source))
}

#[cfg(test)]
mod tests {
    use crate::dao::data_store::memory::MemoryDataStore;

    use super::*;

    const PROFILE_ID: Uuid = Uuid::from_u128(0x9A3E);

    fn repository(store: &MemoryDataStore) -> ProfileRepository {
        ProfileRepository::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn undecodable_rows_do_not_hide_their_siblings() {
        let store = MemoryDataStore::new();
        store.seed(
            tables::CLIPS,
            [
                json!({"id": Uuid::new_v4(), "user_id": PROFILE_ID, "views": null}),
                json!({"id": "not-a-uuid", "user_id": PROFILE_ID}),
                json!({"id": Uuid::new_v4(), "user_id": PROFILE_ID, "views": 12}),
            ],
        );

        let clips = repository(&store).clips(PROFILE_ID).await.unwrap();
        let mut views: Vec<i64> = clips.iter().map(|clip| clip.views).collect();
        views.sort_unstable();
        assert_eq!(views, vec![0, 12]);
    }

    #[tokio::test]
    async fn profile_with_null_columns_is_found() {
        let store = MemoryDataStore::new();
        store.seed(
            tables::PROFILES,
            [json!({
                "id": PROFILE_ID,
                "username": "gamer254",
                "display_name": null,
                "is_premium": null,
                "premium_tier": null
            })],
        );

        let profile = repository(&store)
            .find_by_username("gamer254")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.id, PROFILE_ID);
        assert!(!profile.is_premium);
    }

    #[tokio::test]
    async fn default_rows_carry_the_owner() {
        let store = MemoryDataStore::new();
        let repo = repository(&store);
        repo.insert_default_row(DefaultRow::Appearance, PROFILE_ID)
            .await
            .unwrap();

        let row = repo.appearance_settings(PROFILE_ID).await.unwrap().unwrap();
        assert_eq!(row, AppearanceSettingsEntity::default());
        let stored = store.rows(tables::APPEARANCE_SETTINGS);
        assert_eq!(stored[0]["user_id"], json!(PROFILE_ID.to_string()));
    }
}
