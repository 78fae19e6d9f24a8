pub mod app;
pub mod auth;
pub mod orgs;

use crate::error::AppError;
use crate::models::{AuthSession, Member, Organization};
use crate::services::stytch::StytchClient;

/// Resolve the member and organization behind the stored session token.
///
/// Stytch rotates the session token on every authenticate call, so the
/// token that comes back replaces the stored one. Any failure, whether a
/// rejection or a transport problem, means "not logged in": the stored
/// token is dropped and the caller renders the logged-out view.
pub(crate) async fn current_member_and_organization(
    stytch: &StytchClient,
    session: &AuthSession,
) -> Result<Option<(Member, Organization)>, AppError> {
    let Some(session_token) = session.session_token().await? else {
        return Ok(None);
    };

    match stytch.authenticate_session(&session_token).await {
        Ok(authenticated) => {
            session
                .set_session_token(&authenticated.session_token)
                .await?;
            Ok(Some((authenticated.member, authenticated.organization)))
        }
        Err(err) => {
            tracing::warn!(error = %err, "Stored session no longer valid, treating as logged out");
            session.clear_session_token().await?;
            Ok(None)
        }
    }
}
