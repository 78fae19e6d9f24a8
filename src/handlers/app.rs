use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::error::AppError;
use crate::handlers::current_member_and_organization;
use crate::models::{AuthSession, Member, Organization};
use crate::services::stytch::StytchClient;

#[derive(Template)]
#[template(path = "discovery_login.html")]
pub struct DiscoveryLoginTemplate {}

#[derive(Template)]
#[template(path = "logged_in.html")]
pub struct LoggedInTemplate {
    pub member: Member,
    pub organization: Organization,
}

/// Home. Logged-in members see who they are and where; everyone else gets
/// the discovery login form.
pub async fn index(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
) -> Result<Response, AppError> {
    match current_member_and_organization(&stytch, &session).await? {
        Some((member, organization)) => Ok(LoggedInTemplate {
            member,
            organization,
        }
        .into_response()),
        None => Ok(DiscoveryLoginTemplate {}.into_response()),
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn metrics() -> impl IntoResponse {
    crate::services::metrics::get_metrics()
}
