pub mod member;
pub mod organization;
pub mod session;

pub use member::Member;
pub use organization::{DiscoveredOrganization, JitProvisioning, Membership, Organization};
pub use session::AuthSession;
