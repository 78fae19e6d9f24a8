use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{AuthSession, Organization};
use crate::services::stytch::StytchClient;

#[derive(Template)]
#[template(path = "email_sent.html")]
pub struct EmailSentTemplate {}

/// Organization picker shown after discovery authentication and on the
/// switcher page. `is_login` controls whether the create-organization form
/// is offered.
#[derive(Template)]
#[template(path = "discovered_organizations.html")]
pub struct DiscoveredOrganizationsTemplate {
    pub email_address: String,
    pub organizations: Vec<Organization>,
    pub is_login: bool,
}

#[derive(Deserialize)]
pub struct SendMagicLinkRequest {
    pub email: Option<String>,
    pub organization_id: Option<String>,
}

/// Email a magic link. With an `organization_id` the link is scoped to that
/// organization; without one it goes through discovery.
pub async fn send_magic_link(
    State(stytch): State<Arc<StytchClient>>,
    Form(payload): Form<SendMagicLinkRequest>,
) -> Result<Response, AppError> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    match payload.organization_id.as_deref().filter(|id| !id.is_empty()) {
        Some(organization_id) => {
            stytch
                .send_organization_magic_link(email, organization_id)
                .await?;
            tracing::info!(organization_id, "Organization magic link sent");
        }
        None => {
            stytch.send_discovery_magic_link(email).await?;
            tracing::info!("Discovery magic link sent");
        }
    }

    Ok(EmailSentTemplate {}.into_response())
}

/// Token types the authenticate callback understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenType {
    Discovery,
    MultiTenantMagicLinks,
}

impl TokenType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "discovery" => Some(Self::Discovery),
            "multi_tenant_magic_links" => Some(Self::MultiTenantMagicLinks),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
pub struct AuthenticateParams {
    pub stytch_token_type: String,
    pub token: String,
}

/// Redirect target for clicked magic links. Stytch appends the token and
/// its type to the redirect URL configured in the project dashboard.
pub async fn authenticate(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
    Query(params): Query<AuthenticateParams>,
) -> Result<Response, AppError> {
    let token_type = TokenType::parse(&params.stytch_token_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unsupported token type: {}",
            params.stytch_token_type
        ))
    })?;

    match token_type {
        TokenType::Discovery => {
            let discovery = stytch
                .authenticate_discovery_magic_link(&params.token)
                .await?;
            session.set_ist(&discovery.intermediate_session_token).await?;
            tracing::info!(
                discovered = discovery.discovered_organizations.len(),
                "Discovery magic link authenticated"
            );

            let organizations = discovery
                .discovered_organizations
                .into_iter()
                .map(|discovered| discovered.organization)
                .collect();
            Ok(DiscoveredOrganizationsTemplate {
                email_address: discovery.email_address,
                organizations,
                is_login: true,
            }
            .into_response())
        }
        TokenType::MultiTenantMagicLinks => {
            let authenticated = stytch
                .authenticate_organization_magic_link(&params.token)
                .await?;
            session
                .set_session_token(&authenticated.session_token)
                .await?;
            tracing::info!(
                organization_id = %authenticated.organization.organization_id,
                "Organization magic link authenticated"
            );
            Ok(Redirect::to("/").into_response())
        }
    }
}

/// Drop the stored session token and go home. Safe to repeat; the
/// Stytch-side session is left to expire on its own.
pub async fn logout(session: AuthSession) -> Result<Response, AppError> {
    session.clear_session_token().await?;
    Ok(Redirect::to("/").into_response())
}
