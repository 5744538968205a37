//! Well-known side-channel values.
//!
//! The side-channel is keyed by type: middleware store one of these (or a
//! caller-defined type) with `Context::set`, downstream links read it back
//! with `Context::get::<T>()` and get `None` when it was never set.

/// Language resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of the externally supplied authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    Denied,
}

impl AuthDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, AuthDecision::Allowed)
    }
}

impl From<bool> for AuthDecision {
    fn from(allowed: bool) -> Self {
        if allowed {
            AuthDecision::Allowed
        } else {
            AuthDecision::Denied
        }
    }
}
