//! Aggregated profile reads, profile bootstrap and sectioned partial updates.

use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
};

use futures::future::join_all;
use indexmap::IndexMap;
use rand::{Rng, rng};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUserId,
    dao::{
        models::{
            ClipEntity, CoachEntity, CoachSpecialtyEntity, GameEntity, NewProfileEntity,
            PrivacySettingsEntity, ProfileEntity, ProfileVisibility,
        },
        profile::{DefaultRow, ProfileRepository},
        storage::{StorageError, StorageResult},
    },
    dto::{
        profile::{
            AchievementView, ClanView, ClipView, CoachView, GameStatDetailView, GameStatView,
            MatchView, ProfileAggregate, ProfileView,
        },
        profile_update::{
            SectionFailure, SectionKind, SectionOutcome, SectionUpdate, UpdateProfileRequest,
            UpdateReport,
        },
        validation::validate_username,
    },
    error::ServiceError,
    services::relative_time::format_relative,
    state::SharedState,
};

const PROFILE_NOT_FOUND: &str = "Profile not found";
const FETCH_FAILED: &str = "Failed to fetch profile";
const CREATE_FAILED: &str = "Failed to create profile";
const NOT_OWNER: &str = "Not allowed to update this profile";
const UNKNOWN_GAME: &str = "Unknown Game";
const USERNAME_SUFFIX: std::ops::Range<u32> = 100..100_000;

/// How the target profile of a request is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLookup {
    /// Public lookup by handle.
    ByUsername(String),
    /// The authenticated caller's own profile, created on first access.
    Current(AuthUserId),
}

/// What happens to the aggregate when a section's fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPolicy {
    /// The whole read fails.
    Critical,
    /// The section degrades to its empty default and the failure is logged.
    BestEffort,
}

/// Sections of the profile aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Profile,
    SocialLinks,
    Achievements,
    Clan,
    Stats,
    GameStats,
    RecentMatches,
    Clips,
    Notifications,
    Privacy,
    Appearance,
    PaymentMethods,
    ConnectedAccounts,
    Coaches,
}

impl Section {
    pub const ALL: [Section; 14] = [
        Section::Profile,
        Section::SocialLinks,
        Section::Achievements,
        Section::Clan,
        Section::Stats,
        Section::GameStats,
        Section::RecentMatches,
        Section::Clips,
        Section::Notifications,
        Section::Privacy,
        Section::Appearance,
        Section::PaymentMethods,
        Section::ConnectedAccounts,
        Section::Coaches,
    ];

    /// Failure policy of every section, in one place.
    pub fn policy(self) -> SectionPolicy {
        match self {
            Section::Profile => SectionPolicy::Critical,
            Section::SocialLinks
            | Section::Achievements
            | Section::Clan
            | Section::Stats
            | Section::GameStats
            | Section::RecentMatches
            | Section::Clips
            | Section::Notifications
            | Section::Privacy
            | Section::Appearance
            | Section::PaymentMethods
            | Section::ConnectedAccounts
            | Section::Coaches => SectionPolicy::BestEffort,
        }
    }

    /// Sections only the profile's owner may read.
    pub fn owner_only(self) -> bool {
        matches!(
            self,
            Section::Notifications
                | Section::Privacy
                | Section::Appearance
                | Section::PaymentMethods
                | Section::ConnectedAccounts
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Section::Profile => "profile",
            Section::SocialLinks => "socialLinks",
            Section::Achievements => "achievements",
            Section::Clan => "clan",
            Section::Stats => "stats",
            Section::GameStats => "gameStats",
            Section::RecentMatches => "recentMatches",
            Section::Clips => "clips",
            Section::Notifications => "notifications",
            Section::Privacy => "privacy",
            Section::Appearance => "appearance",
            Section::PaymentMethods => "paymentMethods",
            Section::ConnectedAccounts => "connectedAccounts",
            Section::Coaches => "coaches",
        }
    }
}

/// Unwrap a section fetch according to the section's [`SectionPolicy`].
///
/// A failed critical section fails the read; a failed best-effort section is logged and
/// replaced by its empty default.
fn settle<T: Default>(
    section: Section,
    subject: impl Display,
    result: StorageResult<T>,
) -> Result<T, ServiceError> {
    match (result, section.policy()) {
        (Ok(value), _) => Ok(value),
        (Err(err), SectionPolicy::Critical) => {
            error!(section = section.name(), subject = %subject, error = %err, "{FETCH_FAILED}");
            Err(ServiceError::internal(FETCH_FAILED, err))
        }
        (Err(err), SectionPolicy::BestEffort) => {
            warn!(
                section = section.name(),
                subject = %subject,
                error = %err,
                "section fetch failed; serving empty default"
            );
            Ok(T::default())
        }
    }
}

/// Fetch `section` only when the reader may see it.
async fn fetch_visible<T: Default>(
    section: Section,
    is_owner: bool,
    fetch: impl Future<Output = StorageResult<T>>,
) -> StorageResult<T> {
    if is_owner || !section.owner_only() {
        fetch.await
    } else {
        Ok(T::default())
    }
}

/// Assemble every section of the profile identified by `lookup`, as seen by `viewer`.
///
/// Only the base profile read is critical; each dependent section degrades independently.
/// Readers other than the owner never receive owner-only sections, and the owner's privacy
/// settings decide what else they see.
pub async fn get_aggregated_profile(
    state: &SharedState,
    lookup: ProfileLookup,
    viewer: Option<AuthUserId>,
) -> Result<ProfileAggregate, ServiceError> {
    let profile = resolve_profile(state, &lookup).await?;
    let is_owner = match lookup {
        ProfileLookup::Current(_) => true,
        ProfileLookup::ByUsername(_) => {
            viewer.is_some_and(|viewer| profile.auth_user_id == Some(viewer.0))
        }
    };
    let repo = state.profiles();
    let id = profile.id;
    let now = OffsetDateTime::now_utc();
    let matches_limit = state.config().recent_matches_limit;

    let (
        social_links,
        achievements,
        clan,
        stats,
        game_stats,
        recent_matches,
        clips,
        notifications,
        privacy,
        appearance,
        payment_methods,
        connected_accounts,
        coaches,
    ) = tokio::join!(
        repo.social_links(id),
        repo.achievements(id),
        load_clan(repo, id),
        repo.user_stats(id),
        load_game_stats(repo, id, now),
        load_recent_matches(repo, id, matches_limit, now),
        repo.clips(id),
        fetch_visible(Section::Notifications, is_owner, repo.notification_settings(id)),
        repo.privacy_settings(id),
        fetch_visible(Section::Appearance, is_owner, repo.appearance_settings(id)),
        fetch_visible(Section::PaymentMethods, is_owner, repo.payment_methods(id)),
        fetch_visible(Section::ConnectedAccounts, is_owner, repo.connected_accounts(id)),
        load_coaches(repo),
    );

    // Visitors fall back to a private page when the owner's privacy settings cannot be read.
    let visitor_rules = match &privacy {
        Ok(Some(settings)) => settings.clone(),
        Ok(None) => PrivacySettingsEntity::default(),
        Err(_) => PrivacySettingsEntity {
            profile_visibility: ProfileVisibility::Private,
            ..PrivacySettingsEntity::default()
        },
    };

    let social_links: IndexMap<String, String> = settle(Section::SocialLinks, id, social_links)?
        .into_iter()
        .map(|link| (link.platform, link.handle))
        .collect();

    let mut aggregate = ProfileAggregate {
        profile: ProfileView::from(profile),
        social_links,
        achievements: settle(Section::Achievements, id, achievements)?
            .into_iter()
            .map(AchievementView::from)
            .collect(),
        clan: settle(Section::Clan, id, clan)?,
        stats: settle(Section::Stats, id, stats)?.map(Into::into),
        game_stats: settle(Section::GameStats, id, game_stats)?,
        recent_matches: settle(Section::RecentMatches, id, recent_matches)?,
        clips: settle(Section::Clips, id, clips)?
            .into_iter()
            .map(|clip| clip_view(clip, now))
            .collect(),
        notifications: settle(Section::Notifications, id, notifications)?.map(Into::into),
        privacy: settle(Section::Privacy, id, privacy)?.map(Into::into),
        appearance: settle(Section::Appearance, id, appearance)?.map(Into::into),
        payment_methods: settle(Section::PaymentMethods, id, payment_methods)?,
        connected_accounts: settle(Section::ConnectedAccounts, id, connected_accounts)?,
        coaches: settle(Section::Coaches, id, coaches)?,
    };
    if !is_owner {
        restrict_for_visitor(&mut aggregate, &visitor_rules);
    }
    Ok(aggregate)
}

/// Strip what a reader other than the owner may not see.
///
/// Owner-only sections and contact details are always blanked. A friends-only or private
/// page keeps its header and the coach listing only.
fn restrict_for_visitor(aggregate: &mut ProfileAggregate, rules: &PrivacySettingsEntity) {
    aggregate.profile.email = None;
    aggregate.profile.phone = None;
    aggregate.notifications = None;
    aggregate.privacy = None;
    aggregate.appearance = None;
    aggregate.payment_methods.clear();
    aggregate.connected_accounts.clear();

    if rules.profile_visibility != ProfileVisibility::Public {
        aggregate.social_links.clear();
        aggregate.achievements.clear();
        aggregate.clan = None;
        aggregate.stats = None;
        aggregate.game_stats.clear();
        aggregate.recent_matches.clear();
        aggregate.clips.clear();
        return;
    }
    if !rules.show_match_history {
        aggregate.recent_matches.clear();
    }
    if !rules.show_earnings {
        if let Some(stats) = aggregate.stats.as_mut() {
            stats.earnings = None;
        }
        for entry in &mut aggregate.recent_matches {
            entry.prize = None;
        }
    }
}

/// Return the caller's profile, creating it with default settings rows on first access.
pub async fn get_or_create_profile(
    state: &SharedState,
    auth_user: AuthUserId,
) -> Result<ProfileEntity, ServiceError> {
    let repo = state.profiles();
    let existing = repo.find_by_auth_user(auth_user.0).await;
    if let Some(profile) = settle(Section::Profile, auth_user, existing)? {
        return Ok(profile);
    }

    let config = state.config();
    let mut attempt = 0;
    let profile = loop {
        attempt += 1;
        let username = generate_username(&config.username_prefix);
        let stamp = timestamp(OffsetDateTime::now_utc());
        let candidate = NewProfileEntity {
            id: Uuid::new_v4(),
            auth_user_id: auth_user.0,
            username: username.clone(),
            display_name: username.clone(),
            is_premium: false,
            created_at: stamp.clone(),
            updated_at: stamp,
        };

        match repo.insert_profile(candidate).await {
            Ok(profile) => break profile,
            Err(err) if err.is_conflict() => {
                // A concurrent request may have created the profile for this identity.
                if let Some(existing) = repo
                    .find_by_auth_user(auth_user.0)
                    .await
                    .map_err(|err| critical_failure(CREATE_FAILED, err))?
                {
                    return Ok(existing);
                }
                if attempt >= config.username_attempts {
                    return Err(critical_failure(CREATE_FAILED, err));
                }
                warn!(username = %username, attempt, "generated username taken; retrying");
            }
            Err(err) => return Err(critical_failure(CREATE_FAILED, err)),
        }
    };
    info!(
        profile_id = %profile.id,
        username = %profile.username,
        auth_user = %auth_user,
        "created profile"
    );

    let results = join_all(
        DefaultRow::ALL
            .into_iter()
            .map(|kind| repo.insert_default_row(kind, profile.id)),
    )
    .await;
    for (kind, result) in DefaultRow::ALL.into_iter().zip(results) {
        if let Err(err) = result {
            warn!(
                table = kind.table(),
                profile_id = %profile.id,
                error = %err,
                "failed to create default row"
            );
        }
    }

    Ok(profile)
}

/// Apply every section present in `request` to the profile identified by `lookup`.
///
/// The profile must belong to `caller`. Sections are validated and written independently;
/// any failed section turns the result into [`ServiceError::PartialUpdate`].
pub async fn update_profile_sections(
    state: &SharedState,
    caller: AuthUserId,
    lookup: ProfileLookup,
    request: UpdateProfileRequest,
) -> Result<UpdateReport, ServiceError> {
    let sections = request.into_sections();
    if sections.is_empty() {
        return Err(ServiceError::InvalidInput(
            "No profile sections to update".into(),
        ));
    }

    let profile = resolve_profile(state, &lookup).await?;
    if profile.auth_user_id != Some(caller.0) {
        return Err(ServiceError::Forbidden(NOT_OWNER.into()));
    }

    let stamp = timestamp(OffsetDateTime::now_utc());
    let mut outcomes = Vec::with_capacity(sections.len());
    let mut updates = Vec::with_capacity(sections.len());
    for (kind, body) in sections {
        match SectionUpdate::parse(kind, body) {
            Ok(update) => updates.push(update),
            Err(message) => {
                warn!(
                    section = %kind,
                    profile_id = %profile.id,
                    error = %message,
                    "rejected section update"
                );
                outcomes.push(SectionOutcome::failed(
                    kind,
                    SectionFailure::Validation,
                    message,
                ));
            }
        }
    }

    let repo = state.profiles();
    let applied = join_all(
        updates
            .into_iter()
            .map(|update| apply_section(repo, profile.id, update, &stamp)),
    )
    .await;
    outcomes.extend(applied);
    outcomes.sort_by_key(|outcome| outcome.section);

    let report = UpdateReport::new(outcomes);
    if report.is_success() {
        info!(profile_id = %profile.id, sections = report.sections().len(), "profile updated");
        Ok(report)
    } else {
        Err(ServiceError::PartialUpdate(report))
    }
}

/// Write one validated section, stamping `updated_at`.
async fn apply_section(
    repo: &ProfileRepository,
    profile_id: Uuid,
    update: SectionUpdate,
    stamp: &str,
) -> SectionOutcome {
    let kind = update.kind();
    let mut row = update.into_row();
    row.insert("updated_at".into(), Value::String(stamp.to_owned()));

    let written = match kind {
        SectionKind::Profile => match repo.update_profile(profile_id, row).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                return SectionOutcome::failed(
                    kind,
                    SectionFailure::NotFound,
                    PROFILE_NOT_FOUND.into(),
                );
            }
            Err(err) => Err(err),
        },
        SectionKind::Notifications | SectionKind::Privacy | SectionKind::Appearance => {
            repo.upsert_settings(kind.table(), profile_id, row).await
        }
    };

    match written {
        Ok(()) => {
            debug!(section = %kind, profile_id = %profile_id, "section updated");
            SectionOutcome::succeeded(kind)
        }
        Err(err) => {
            error!(
                section = %kind,
                profile_id = %profile_id,
                error = %err,
                "section update failed"
            );
            SectionOutcome::failed(
                kind,
                SectionFailure::Storage,
                format!("Failed to update {kind}"),
            )
        }
    }
}

async fn resolve_profile(
    state: &SharedState,
    lookup: &ProfileLookup,
) -> Result<ProfileEntity, ServiceError> {
    match lookup {
        ProfileLookup::ByUsername(username) => {
            // Handles that can never exist are not worth a round trip.
            if validate_username(username).is_err() {
                return Err(ServiceError::NotFound(PROFILE_NOT_FOUND.into()));
            }
            let found = state.profiles().find_by_username(username).await;
            settle(Section::Profile, username, found)?
                .ok_or_else(|| ServiceError::NotFound(PROFILE_NOT_FOUND.into()))
        }
        ProfileLookup::Current(auth_user) => get_or_create_profile(state, *auth_user).await,
    }
}

fn critical_failure(message: &str, err: StorageError) -> ServiceError {
    error!(section = Section::Profile.name(), error = %err, "{message}");
    ServiceError::internal(message, err)
}

async fn load_clan(
    repo: &ProfileRepository,
    profile_id: Uuid,
) -> StorageResult<Option<ClanView>> {
    let Some(membership) = repo.clan_membership(profile_id).await? else {
        return Ok(None);
    };
    let (clan, members) = tokio::join!(
        repo.clan(membership.clan_id),
        repo.clan_member_count(membership.clan_id)
    );
    let Some(clan) = clan? else {
        warn!(clan_id = %membership.clan_id, "membership references a missing clan");
        return Ok(None);
    };
    let members = members.unwrap_or_else(|err| {
        warn!(clan_id = %clan.id, error = %err, "failed to count clan members");
        0
    });

    Ok(Some(ClanView {
        id: clan.id,
        name: clan.name,
        tag: clan.tag,
        logo: clan.logo_url,
        role: membership.role.unwrap_or_else(|| "member".into()),
        members,
        points: clan.points,
    }))
}

/// Fetch the distinct games in `ids`; games that fail to load are left out.
async fn load_games(
    repo: &ProfileRepository,
    ids: impl IntoIterator<Item = Uuid>,
) -> HashMap<Uuid, GameEntity> {
    let ids: HashSet<Uuid> = ids.into_iter().collect();
    let fetched =
        join_all(ids.into_iter().map(|id| async move { (id, repo.game(id).await) })).await;
    fetched
        .into_iter()
        .filter_map(|(id, result)| match result {
            Ok(game) => game,
            Err(err) => {
                warn!(game_id = %id, error = %err, "failed to load game");
                None
            }
        })
        .map(|game| (game.id, game))
        .collect()
}

async fn load_game_stats(
    repo: &ProfileRepository,
    profile_id: Uuid,
    now: OffsetDateTime,
) -> StorageResult<Vec<GameStatView>> {
    let parents = repo.game_stats(profile_id).await?;
    if parents.is_empty() {
        return Ok(Vec::new());
    }

    let (details, games) = tokio::join!(
        join_all(parents.iter().map(|parent| repo.game_stat_details(parent.id))),
        load_games(repo, parents.iter().filter_map(|parent| parent.game_id)),
    );

    Ok(parents
        .into_iter()
        .zip(details)
        .map(|(parent, details)| {
            let details = details.unwrap_or_else(|err| {
                warn!(stat_id = %parent.id, error = %err, "failed to load game stat details");
                Vec::new()
            });
            let game = parent.game_id.and_then(|id| games.get(&id));
            GameStatView {
                game: game.map_or_else(|| UNKNOWN_GAME.into(), |game| game.name.clone()),
                icon: game.and_then(|game| game.icon_url.clone()),
                last_played: format_relative(parent.last_played.as_deref(), now),
                stats: details
                    .into_iter()
                    .map(|detail| GameStatDetailView {
                        label: detail.label,
                        value: detail.value,
                    })
                    .collect(),
            }
        })
        .collect())
}

async fn load_recent_matches(
    repo: &ProfileRepository,
    profile_id: Uuid,
    limit: usize,
    now: OffsetDateTime,
) -> StorageResult<Vec<MatchView>> {
    let matches = repo.recent_matches(profile_id, limit).await?;
    let games = load_games(repo, matches.iter().filter_map(|entry| entry.game_id)).await;

    Ok(matches
        .into_iter()
        .map(|entry| MatchView {
            id: entry.id,
            game: entry
                .game_id
                .and_then(|id| games.get(&id))
                .map_or_else(|| UNKNOWN_GAME.into(), |game| game.name.clone()),
            opponent: entry.opponent_name,
            result: entry.result,
            score: entry.score,
            prize: entry.prize,
            date: format_relative(entry.played_at.as_deref(), now),
        })
        .collect())
}

async fn load_coaches(repo: &ProfileRepository) -> StorageResult<Vec<CoachView>> {
    let coaches = repo.coaches().await?;
    let specialties =
        join_all(coaches.iter().map(|coach| repo.coach_specialties(coach.id))).await;

    Ok(coaches
        .into_iter()
        .zip(specialties)
        .map(|(coach, specialties)| coach_view(coach, specialties))
        .collect())
}

fn coach_view(
    coach: CoachEntity,
    specialties: StorageResult<Vec<CoachSpecialtyEntity>>,
) -> CoachView {
    let specialties = specialties.unwrap_or_else(|err| {
        warn!(coach_id = %coach.id, error = %err, "failed to load coach specialties");
        Vec::new()
    });
    CoachView {
        id: coach.id,
        name: coach.name,
        avatar: coach.avatar_url,
        rating: coach.rating,
        hourly_rate: coach.hourly_rate,
        specialties: specialties.into_iter().map(|row| row.specialty).collect(),
    }
}

fn clip_view(clip: ClipEntity, now: OffsetDateTime) -> ClipView {
    ClipView {
        id: clip.id,
        title: clip.title,
        video_url: clip.video_url,
        thumbnail: clip.thumbnail_url,
        views: clip.views,
        likes: clip.likes,
        comments: clip.comments,
        uploaded: format_relative(clip.created_at.as_deref(), now),
    }
}

fn generate_username(prefix: &str) -> String {
    format!("{prefix}{}", rng().random_range(USERNAME_SUFFIX))
}

fn timestamp(now: OffsetDateTime) -> String {
    now.format(&Rfc3339).unwrap_or_default()
}
