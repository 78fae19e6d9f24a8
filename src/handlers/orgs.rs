use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::handlers::auth::DiscoveredOrganizationsTemplate;
use crate::handlers::current_member_and_organization;
use crate::models::{AuthSession, JitProvisioning};
use crate::services::stytch::StytchClient;

#[derive(Template)]
#[template(path = "organization_login.html")]
pub struct OrganizationLoginTemplate {
    pub organization_id: String,
    pub organization_name: String,
}

#[derive(Deserialize)]
pub struct CreateOrganizationRequest {
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub org_slug: String,
}

fn normalize_slug(slug: &str) -> String {
    slug.replace(' ', "-")
}

/// Create an organization from the discovery flow. Requires an IST: the
/// email was verified but no organization chosen yet. The IST is consumed
/// and the member lands logged into the new organization.
pub async fn create_organization(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
    Form(payload): Form<CreateOrganizationRequest>,
) -> Result<Response, AppError> {
    let Some(ist) = session.ist().await? else {
        return Err(AppError::BadRequest(
            "An intermediate session is required to create an organization".to_string(),
        ));
    };

    let organization_slug = normalize_slug(&payload.org_slug);
    let created = stytch
        .create_organization(&ist, &payload.org_name, &organization_slug)
        .await?;

    session.clear_ist().await?;
    session.set_session_token(&created.session_token).await?;
    tracing::info!(
        organization_id = %created.organization.organization_id,
        "Organization created from discovery"
    );
    Ok(Redirect::to("/").into_response())
}

/// Log into one organization. An IST (fresh discovery) takes precedence;
/// otherwise an existing session is exchanged, which only works for
/// organizations the member already belongs to.
pub async fn exchange(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
    Path(organization_id): Path<String>,
) -> Result<Response, AppError> {
    if let Some(ist) = session.ist().await? {
        let exchanged = stytch
            .exchange_intermediate_session(&ist, &organization_id)
            .await?;
        session.clear_ist().await?;
        session.set_session_token(&exchanged.session_token).await?;
        tracing::info!(
            organization_id = %organization_id,
            "Intermediate session exchanged into organization"
        );
        return Ok(Redirect::to("/").into_response());
    }

    let Some(session_token) = session.session_token().await? else {
        return Err(AppError::BadRequest(
            "Either an intermediate session or a session is required".to_string(),
        ));
    };

    let exchanged = stytch
        .exchange_session(&session_token, &organization_id)
        .await?;
    session.set_session_token(&exchanged.session_token).await?;
    tracing::info!(
        organization_id = %organization_id,
        "Session exchanged into organization"
    );
    Ok(Redirect::to("/").into_response())
}

/// List the organizations the current session could switch into.
pub async fn switch_orgs(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
) -> Result<Response, AppError> {
    let Some(session_token) = session.session_token().await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let discovered = stytch.list_discovered_organizations(&session_token).await?;
    let organizations = discovered
        .discovered_organizations
        .into_iter()
        .map(|discovered| discovered.organization)
        .collect();
    Ok(DiscoveredOrganizationsTemplate {
        email_address: discovered.email_address,
        organizations,
        is_login: false,
    }
    .into_response())
}

/// Organization deep link, addressed by slug.
///
/// Members of the organization land on the home page; members logged into
/// a sibling organization get exchanged over when discovery allows it;
/// everyone else sees the organization-scoped login form.
pub async fn organization_index(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
    Path(organization_slug): Path<String>,
) -> Result<Response, AppError> {
    if let Some((_, organization)) = current_member_and_organization(&stytch, &session).await? {
        if organization.organization_slug == organization_slug {
            return Ok(Redirect::to("/").into_response());
        }

        // Logged in elsewhere. A discovered organization with this slug
        // means we can exchange instead of asking for another magic link.
        if let Some(session_token) = session.session_token().await? {
            let discovered = stytch.list_discovered_organizations(&session_token).await?;
            if let Some(found) = discovered
                .discovered_organizations
                .iter()
                .find(|d| d.organization.organization_slug == organization_slug)
            {
                let target = format!("/exchange/{}", found.organization.organization_id);
                return Ok(Redirect::to(&target).into_response());
            }
        }
    }

    let mut organizations = stytch
        .search_organizations_by_slug(&organization_slug)
        .await?;
    if organizations.len() != 1 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "expected exactly one organization for slug {organization_slug}, found {}",
            organizations.len()
        )));
    }

    let organization = organizations.remove(0);
    Ok(OrganizationLoginTemplate {
        organization_id: organization.organization_id,
        organization_name: organization.organization_name,
    }
    .into_response())
}

/// Restrict the organization's email JIT provisioning to the current
/// member's email domain, so teammates on that domain can join without an
/// invite. Stytch rejects common domains like gmail.com on its side.
pub async fn enable_jit(
    State(stytch): State<Arc<StytchClient>>,
    session: AuthSession,
) -> Result<Response, AppError> {
    let Some((member, organization)) = current_member_and_organization(&stytch, &session).await?
    else {
        return Ok(Redirect::to("/").into_response());
    };

    let domain = member
        .email_domain()
        .ok_or_else(|| anyhow::anyhow!("member {} has no email domain", member.member_id))?;

    // current_member_and_organization just stored the rotated token.
    let session_token = session
        .session_token()
        .await?
        .ok_or_else(|| anyhow::anyhow!("session token missing after session resolution"))?;

    stytch
        .update_organization_provisioning(
            &organization.organization_id,
            JitProvisioning::Restricted,
            &[domain.to_string()],
            &session_token,
        )
        .await?;

    tracing::info!(
        organization_id = %organization.organization_id,
        "Email JIT provisioning restricted to the member's domain"
    );
    Ok(Redirect::to("/").into_response())
}
