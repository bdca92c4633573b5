use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for K-Clash Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::profile::get_own_profile,
        crate::routes::profile::get_profile,
        crate::routes::profile::update_own_profile,
        crate::routes::profile::update_profile,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::profile::ProfileAggregate,
            crate::dto::profile_update::UpdateProfileRequest,
            crate::dto::profile_update::UpdateProfileResponse,
            crate::dto::profile_update::ProfilePatch,
            crate::dto::profile_update::NotificationsPatch,
            crate::dto::profile_update::PrivacyPatch,
            crate::dto::profile_update::AppearancePatch,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "profile", description = "Aggregated profile reads and partial updates"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by authenticated routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_profile_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/profile"));
        assert!(doc.paths.paths.contains_key("/profile/{username}"));
        assert!(doc.paths.paths.contains_key("/healthcheck"));
    }
}
