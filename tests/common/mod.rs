use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use b2b_magic_links::config::StytchSettings;
use b2b_magic_links::services::stytch::StytchClient;
use b2b_magic_links::startup::build_router;
use http_body_util::BodyExt;
use secrecy::Secret;
use std::sync::Arc;
use tower::util::ServiceExt;
use wiremock::MockServer;

/// The app under test, wired to a wiremock stand-in for the Stytch API.
///
/// Requests go through `Router::oneshot`, so no port is bound for the app
/// itself. The session store lives inside the router; carrying the session
/// cookie between requests is the caller's job.
pub struct TestApp {
    pub router: Router,
    #[allow(dead_code)]
    pub stytch: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let stytch = MockServer::start().await;

        let settings = StytchSettings {
            project_id: "project-test-00000000".to_string(),
            secret: Secret::new("secret-test-00000000".to_string()),
            environment: Default::default(),
        };
        let client = StytchClient::with_base_url(settings, stytch.uri());
        let router = build_router(Arc::new(client));

        TestApp { router, stytch }
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    #[allow(dead_code)]
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Response<Body> {
        let body = serde_urlencoded::to_string(form).unwrap();
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::from(body)).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// The session cookie pair from a response, present when the request
/// touched the session.
#[allow(dead_code)]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).to_string())
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub fn organization_json(id: &str, name: &str, slug: &str) -> serde_json::Value {
    serde_json::json!({
        "organization_id": id,
        "organization_name": name,
        "organization_slug": slug,
    })
}

#[allow(dead_code)]
pub fn member_json(email: &str) -> serde_json::Value {
    serde_json::json!({
        "member_id": "member-test-0001",
        "email_address": email,
    })
}

#[allow(dead_code)]
pub fn member_session_json(
    session_token: &str,
    email: &str,
    organization: serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "session_token": session_token,
        "member": member_json(email),
        "organization": organization,
    })
}

/// Error body in the shape Stytch actually returns.
#[allow(dead_code)]
pub fn stytch_error_json(status: u16, error_type: &str) -> serde_json::Value {
    serde_json::json!({
        "status_code": status,
        "error_type": error_type,
        "error_message": "See https://stytch.com/docs/api/errors for more information.",
        "request_id": "request-id-test-0001",
    })
}
