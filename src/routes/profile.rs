use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
    routing::get,
};
use tracing::{error, warn};

use crate::{
    auth::{AuthUserId, bearer_token},
    dto::{
        profile::ProfileAggregate,
        profile_update::{UpdateProfileRequest, UpdateProfileResponse},
    },
    error::{AppError, ServiceError},
    services::profile_service::{self, ProfileLookup},
    state::SharedState,
};

const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Profile read and update endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/profile", get(get_own_profile).put(update_own_profile))
        .route("/profile/{username}", get(get_profile).put(update_profile))
}

/// Resolve the bearer token of the request into the caller's identity.
async fn authenticate(
    state: &SharedState,
    headers: &HeaderMap,
) -> Result<AuthUserId, ServiceError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ServiceError::Unauthorized(NOT_AUTHENTICATED.into()))?;
    state
        .identity()
        .resolve(token)
        .await
        .inspect_err(|err| error!(error = %err, "failed to resolve bearer token"))?
        .ok_or_else(|| ServiceError::Unauthorized(NOT_AUTHENTICATED.into()))
}

/// Identify the reader of a public route; anonymous when no token resolves.
async fn viewer(state: &SharedState, headers: &HeaderMap) -> Option<AuthUserId> {
    let token = bearer_token(headers)?;
    state
        .identity()
        .resolve(token)
        .await
        .inspect_err(|err| warn!(error = %err, "reading profile anonymously"))
        .ok()
        .flatten()
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Aggregated profile of the caller", body = ProfileAggregate),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Profile could not be loaded")
    )
)]
/// Return the caller's aggregated profile, creating the profile on first access.
pub async fn get_own_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ProfileAggregate>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    let aggregate = profile_service::get_aggregated_profile(
        &state,
        ProfileLookup::Current(caller),
        Some(caller),
    )
    .await?;
    Ok(Json(aggregate))
}

#[utoipa::path(
    get,
    path = "/profile/{username}",
    tag = "profile",
    params(("username" = String, Path, description = "Public handle of the profile")),
    responses(
        (
            status = 200,
            description = "Aggregated profile as seen by the reader",
            body = ProfileAggregate
        ),
        (status = 404, description = "Profile not found"),
        (status = 500, description = "Profile could not be loaded")
    )
)]
/// Return the aggregated profile of `username`.
///
/// A bearer token is optional; owner-only sections are served only when it belongs to the
/// profile's owner.
pub async fn get_profile(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ProfileAggregate>, AppError> {
    let viewer = viewer(&state, &headers).await;
    let aggregate = profile_service::get_aggregated_profile(
        &state,
        ProfileLookup::ByUsername(username),
        viewer,
    )
    .await?;
    Ok(Json(aggregate))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "profile",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Every section was written", body = UpdateProfileResponse),
        (status = 400, description = "Invalid sections or malformed body"),
        (status = 401, description = "Missing or invalid bearer token"),
        (
            status = 500,
            description = "Some sections could not be written",
            body = UpdateProfileResponse
        )
    )
)]
/// Update any subset of the caller's writable profile sections.
pub async fn update_own_profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    let Json(request) = payload?;
    let report = profile_service::update_profile_sections(
        &state,
        caller,
        ProfileLookup::Current(caller),
        request,
    )
    .await?;
    Ok(Json(report.into()))
}

#[utoipa::path(
    put,
    path = "/profile/{username}",
    tag = "profile",
    security(("bearer" = [])),
    params(("username" = String, Path, description = "Public handle of the profile")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Every section was written", body = UpdateProfileResponse),
        (status = 400, description = "Invalid sections or malformed body"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Profile belongs to someone else"),
        (status = 404, description = "Profile not found"),
        (
            status = 500,
            description = "Some sections could not be written",
            body = UpdateProfileResponse
        )
    )
)]
/// Update any subset of the writable sections of `username`, which must belong to the caller.
pub async fn update_profile(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    let caller = authenticate(&state, &headers).await?;
    let Json(request) = payload?;
    let report = profile_service::update_profile_sections(
        &state,
        caller,
        ProfileLookup::ByUsername(username),
        request,
    )
    .await?;
    Ok(Json(report.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::{
        auth::StaticIdentityProvider,
        config::AppConfig,
        dao::{data_store::memory::MemoryDataStore, models::tables},
        state::AppState,
    };

    use super::*;

    const OWNER: Uuid = Uuid::from_u128(0xA11CE);
    const OWNER_TOKEN: &str = "owner-token";
    const STRANGER_TOKEN: &str = "stranger-token";

    fn app(store: &MemoryDataStore) -> Router {
        let identity = StaticIdentityProvider::new()
            .with_token(OWNER_TOKEN, AuthUserId(OWNER))
            .with_token(STRANGER_TOKEN, AuthUserId(Uuid::new_v4()));
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(identity),
            AppConfig::default(),
        );
        router().with_state(state)
    }

    fn seeded_store() -> MemoryDataStore {
        let store = MemoryDataStore::new();
        store.seed(
            tables::PROFILES,
            [json!({
                "id": Uuid::new_v4().to_string(),
                "auth_user_id": OWNER.to_string(),
                "username": "gamer254",
                "email": "owner@kclash.gg"
            })],
        );
        store
    }

    fn profile_id(store: &MemoryDataStore) -> Value {
        store.rows(tables::PROFILES)[0]["id"].clone()
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn own_profile_requires_a_known_token() {
        let store = seeded_store();
        let (status, body) = send(app(&store), Method::GET, "/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Not authenticated"}));

        let (status, _) = send(app(&store), Method::GET, "/profile", Some("bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            send(app(&store), Method::GET, "/profile", Some(OWNER_TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["username"], json!("gamer254"));
    }

    #[tokio::test]
    async fn public_profile_lookup() {
        let store = seeded_store();
        let (status, body) = send(app(&store), Method::GET, "/profile/gamer254", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clan"], Value::Null);
        assert_eq!(body["socialLinks"], json!({}));

        let (status, body) = send(app(&store), Method::GET, "/profile/ghost42", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Profile not found"}));
    }

    #[tokio::test]
    async fn public_lookup_hides_owner_only_data() {
        let store = seeded_store();
        store.seed(
            tables::PAYMENT_METHODS,
            [json!({"user_id": profile_id(&store), "card_last4": "4242"})],
        );
        store.seed(
            tables::NOTIFICATION_SETTINGS,
            [json!({"user_id": profile_id(&store), "marketing_emails": true})],
        );

        for token in [None, Some(STRANGER_TOKEN), Some("bogus")] {
            let (status, body) =
                send(app(&store), Method::GET, "/profile/gamer254", token, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["paymentMethods"], json!([]), "{token:?}");
            assert_eq!(body["connectedAccounts"], json!([]), "{token:?}");
            assert_eq!(body["notifications"], json!({}), "{token:?}");
            assert_eq!(body["privacy"], json!({}), "{token:?}");
            assert_eq!(body["appearance"], json!({}), "{token:?}");
            assert_eq!(body["profile"]["email"], Value::Null, "{token:?}");
        }

        let (status, body) = send(
            app(&store),
            Method::GET,
            "/profile/gamer254",
            Some(OWNER_TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["email"], json!("owner@kclash.gg"));
        assert_eq!(body["paymentMethods"][0]["card_last4"], json!("4242"));
        assert_eq!(body["notifications"]["marketingEmails"], json!(true));
    }

    #[tokio::test]
    async fn malformed_json_body_gets_an_error_object() {
        let store = seeded_store();
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/profile")
            .header(header::AUTHORIZATION, format!("Bearer {OWNER_TOKEN}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"privacy\": "))
            .unwrap();
        let response = app(&store).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().is_some_and(|message| !message.is_empty()));
    }

    #[tokio::test]
    async fn primary_fetch_failure_is_generic() {
        let store = seeded_store();
        store.fail_table(tables::PROFILES);
        let (status, body) = send(app(&store), Method::GET, "/profile/gamer254", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to fetch profile"}));
    }

    #[tokio::test]
    async fn update_reports_every_section() {
        let store = seeded_store();
        let (status, body) = send(
            app(&store),
            Method::PUT,
            "/profile",
            Some(OWNER_TOKEN),
            Some(json!({"privacy": {"showEarnings": true}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "sections": [{"section": "privacy", "success": true}]})
        );
    }

    #[tokio::test]
    async fn invalid_section_is_a_bad_request() {
        let store = seeded_store();
        let (status, body) = send(
            app(&store),
            Method::PUT,
            "/profile/gamer254",
            Some(OWNER_TOKEN),
            Some(json!({
                "notifications": {"emailNotifications": "loud"},
                "privacy": {"showEarnings": true}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Failed to update notifications"));
        assert_eq!(body["sections"][1], json!({"section": "privacy", "success": true}));
        assert_eq!(store.rows(tables::PRIVACY_SETTINGS).len(), 1);
    }

    #[tokio::test]
    async fn store_failure_on_a_section_is_a_server_error() {
        let store = seeded_store();
        store.fail_table(tables::APPEARANCE_SETTINGS);
        let (status, body) = send(
            app(&store),
            Method::PUT,
            "/profile",
            Some(OWNER_TOKEN),
            Some(json!({"appearance": {"theme": "light"}})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Failed to update appearance"));
    }

    #[tokio::test]
    async fn updating_someone_elses_profile_is_forbidden() {
        let store = seeded_store();
        let update = json!({"privacy": {"showEarnings": true}});

        let (status, _) = send(
            app(&store),
            Method::PUT,
            "/profile/gamer254",
            None,
            Some(update.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            app(&store),
            Method::PUT,
            "/profile/gamer254",
            Some(STRANGER_TOKEN),
            Some(update),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Not allowed to update this profile"}));
        assert!(store.rows(tables::PRIVACY_SETTINGS).is_empty());
    }
}
