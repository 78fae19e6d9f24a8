use serde::{Deserialize, Serialize};

/// A tenant. Stytch owns the record; we only ever render it or pass its id
/// back on exchange and update calls.
#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub organization_id: String,
    pub organization_name: String,
    pub organization_slug: String,
    #[serde(default)]
    pub email_jit_provisioning: Option<String>,
    #[serde(default)]
    pub email_allowed_domains: Option<Vec<String>>,
}

/// An organization a verified email may log into or join, as listed by the
/// discovery endpoints. Valid only for the response it arrived in.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveredOrganization {
    pub organization: Organization,
    #[serde(default)]
    pub membership: Option<Membership>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Membership {
    #[serde(rename = "type")]
    pub membership_type: String,
}

/// Wire values for an organization's email JIT provisioning setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JitProvisioning {
    AllAllowed,
    Restricted,
    NotAllowed,
}
