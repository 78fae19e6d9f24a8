pub mod metrics;
pub mod stytch;
