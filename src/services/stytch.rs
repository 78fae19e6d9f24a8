//! HTTP client for the Stytch B2B API.
//!
//! Every call authenticates with HTTP Basic auth (project id / secret) and
//! returns either a typed payload or a [`StytchError`] carrying the API's
//! own error taxonomy. Session tokens rotate on each authenticate and
//! exchange call; callers are expected to persist the token they get back.

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::StytchSettings;
use crate::models::{DiscoveredOrganization, JitProvisioning, Member, Organization};
use crate::services::metrics;

const MEMBER_SESSION_HEADER: &str = "X-Stytch-Member-Session";

#[derive(Debug, Error)]
pub enum StytchError {
    #[error("request to Stytch failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Stytch rejected the call ({status} {error_type}): {error_message}")]
    Api {
        status: u16,
        error_type: String,
        error_message: String,
        request_id: Option<String>,
    },

    #[error("failed to decode Stytch response: {0}")]
    Decode(String),
}

impl StytchError {
    fn metric_label(&self) -> &'static str {
        match self {
            StytchError::Transport(_) => "transport_error",
            StytchError::Api { .. } => "api_error",
            StytchError::Decode(_) => "decode_error",
        }
    }
}

/// Error body Stytch sends on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    request_id: Option<String>,
}

/// Result of authenticating a discovery magic-link token: not a login yet,
/// just a verified email plus the organizations it may enter.
#[derive(Debug, Deserialize)]
pub struct DiscoveryAuthenticateResponse {
    pub intermediate_session_token: String,
    pub email_address: String,
    #[serde(default)]
    pub discovered_organizations: Vec<DiscoveredOrganization>,
}

/// A full organization-scoped login. Returned by every call that mints or
/// rotates a session token.
#[derive(Debug, Deserialize)]
pub struct MemberSession {
    pub session_token: String,
    pub member: Member,
    pub organization: Organization,
}

/// Organizations an already-authenticated session may switch into.
#[derive(Debug, Deserialize)]
pub struct DiscoveredOrganizationsResponse {
    pub email_address: String,
    #[serde(default)]
    pub discovered_organizations: Vec<DiscoveredOrganization>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organizations: Vec<Organization>,
}

#[derive(Debug, Deserialize)]
struct UpdateOrganizationResponse {
    organization: Organization,
}

pub struct StytchClient {
    http: Client,
    base_url: String,
    project_id: String,
    secret: Secret<String>,
}

impl StytchClient {
    pub fn new(settings: StytchSettings) -> Self {
        let base_url = settings.environment.base_url().to_string();
        Self::with_base_url(settings, base_url)
    }

    /// Point the client at an explicit base URL. Tests use this to swap in a
    /// mock server.
    pub fn with_base_url(settings: StytchSettings, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: settings.project_id,
            secret: settings.secret,
        }
    }

    /// Email a discovery magic link: the signup-or-login entry point when no
    /// organization is known yet.
    pub async fn send_discovery_magic_link(&self, email_address: &str) -> Result<(), StytchError> {
        self.post_unit(
            "magic_links.email.discovery.send",
            "/v1/b2b/magic_links/email/discovery/send",
            json!({ "email_address": email_address }),
        )
        .await
    }

    /// Email an organization-scoped magic link. Whether an unknown email is
    /// accepted depends on the organization's JIT provisioning settings.
    pub async fn send_organization_magic_link(
        &self,
        email_address: &str,
        organization_id: &str,
    ) -> Result<(), StytchError> {
        self.post_unit(
            "magic_links.email.login_or_signup",
            "/v1/b2b/magic_links/email/login_or_signup",
            json!({
                "email_address": email_address,
                "organization_id": organization_id,
            }),
        )
        .await
    }

    pub async fn authenticate_discovery_magic_link(
        &self,
        token: &str,
    ) -> Result<DiscoveryAuthenticateResponse, StytchError> {
        self.post_json(
            "magic_links.discovery.authenticate",
            "/v1/b2b/magic_links/discovery/authenticate",
            json!({ "discovery_magic_links_token": token }),
        )
        .await
    }

    pub async fn authenticate_organization_magic_link(
        &self,
        token: &str,
    ) -> Result<MemberSession, StytchError> {
        self.post_json(
            "magic_links.authenticate",
            "/v1/b2b/magic_links/authenticate",
            json!({ "magic_links_token": token }),
        )
        .await
    }

    /// Create an organization from an intermediate session. Consumes the IST
    /// and logs the member straight into the new organization.
    pub async fn create_organization(
        &self,
        intermediate_session_token: &str,
        organization_name: &str,
        organization_slug: &str,
    ) -> Result<MemberSession, StytchError> {
        self.post_json(
            "discovery.organizations.create",
            "/v1/b2b/discovery/organizations/create",
            json!({
                "intermediate_session_token": intermediate_session_token,
                "organization_name": organization_name,
                "organization_slug": organization_slug,
            }),
        )
        .await
    }

    /// Trade an intermediate session for a full login to one discovered
    /// organization.
    pub async fn exchange_intermediate_session(
        &self,
        intermediate_session_token: &str,
        organization_id: &str,
    ) -> Result<MemberSession, StytchError> {
        self.post_json(
            "discovery.intermediate_sessions.exchange",
            "/v1/b2b/discovery/intermediate_sessions/exchange",
            json!({
                "intermediate_session_token": intermediate_session_token,
                "organization_id": organization_id,
            }),
        )
        .await
    }

    /// Move an existing session to another organization the member belongs
    /// to, without another magic link.
    pub async fn exchange_session(
        &self,
        session_token: &str,
        organization_id: &str,
    ) -> Result<MemberSession, StytchError> {
        self.post_json(
            "sessions.exchange",
            "/v1/b2b/sessions/exchange",
            json!({
                "session_token": session_token,
                "organization_id": organization_id,
            }),
        )
        .await
    }

    pub async fn list_discovered_organizations(
        &self,
        session_token: &str,
    ) -> Result<DiscoveredOrganizationsResponse, StytchError> {
        self.post_json(
            "discovery.organizations.list",
            "/v1/b2b/discovery/organizations",
            json!({ "session_token": session_token }),
        )
        .await
    }

    pub async fn search_organizations_by_slug(
        &self,
        organization_slug: &str,
    ) -> Result<Vec<Organization>, StytchError> {
        let response: SearchResponse = self
            .post_json(
                "organizations.search",
                "/v1/b2b/organizations/search",
                json!({
                    "query": {
                        "operator": "AND",
                        "operands": [{
                            "filter_name": "organization_slugs",
                            "filter_value": [organization_slug],
                        }],
                    },
                }),
            )
            .await?;
        Ok(response.organizations)
    }

    /// Update an organization's email JIT provisioning policy. The member
    /// session token rides along in a header so Stytch can enforce its RBAC
    /// rules for settings changes.
    pub async fn update_organization_provisioning(
        &self,
        organization_id: &str,
        email_jit_provisioning: JitProvisioning,
        email_allowed_domains: &[String],
        session_token: &str,
    ) -> Result<Organization, StytchError> {
        let path = format!("/v1/b2b/organizations/{organization_id}");
        let response: UpdateOrganizationResponse = self
            .put_json(
                "organizations.update",
                &path,
                json!({
                    "email_jit_provisioning": email_jit_provisioning,
                    "email_allowed_domains": email_allowed_domains,
                }),
                session_token,
            )
            .await?;
        Ok(response.organization)
    }

    /// Validate a stored session token. On success Stytch returns a rotated
    /// token; the old one is dead either way.
    pub async fn authenticate_session(
        &self,
        session_token: &str,
    ) -> Result<MemberSession, StytchError> {
        self.post_json(
            "sessions.authenticate",
            "/v1/b2b/sessions/authenticate",
            json!({ "session_token": session_token }),
        )
        .await
    }

    async fn post_unit(
        &self,
        operation: &'static str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<(), StytchError> {
        let _: serde_json::Value = self.post_json(operation, path, body).await?;
        Ok(())
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, StytchError> {
        let request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&body);
        self.execute(operation, request).await
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: serde_json::Value,
        member_session_token: &str,
    ) -> Result<T, StytchError> {
        let request = self
            .http
            .put(format!("{}{}", self.base_url, path))
            .header(MEMBER_SESSION_HEADER, member_session_token)
            .json(&body);
        self.execute(operation, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StytchError> {
        let result = self.dispatch(request).await;
        match &result {
            Ok(_) => metrics::observe_stytch_request(operation, "ok"),
            Err(err) => {
                tracing::error!(operation, error = %err, "Stytch API call failed");
                metrics::observe_stytch_request(operation, err.metric_label());
            }
        }
        result
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StytchError> {
        let response = request
            .basic_auth(&self.project_id, Some(self.secret.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| StytchError::Decode(e.to_string()))
        } else {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            Err(StytchError::Api {
                status: status.as_u16(),
                error_type: body.error_type,
                error_message: body.error_message,
                request_id: body.request_id,
            })
        }
    }
}
