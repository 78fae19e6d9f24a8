use serde::Deserialize;

/// A member identity scoped to one organization, as Stytch returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub member_id: String,
    pub email_address: String,
}

impl Member {
    /// Domain part of the member's email, used for JIT provisioning rules.
    pub fn email_domain(&self) -> Option<&str> {
        self.email_address
            .rsplit_once('@')
            .map(|(_, domain)| domain)
    }
}
