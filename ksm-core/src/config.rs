//! Resolver configuration.

use ksm_common::error::parse_flag;

use crate::error::KsmResult;

/// Default service identity recorded on audit events.
pub const DEFAULT_SERVICE_ID: &str = "ksm-notation";

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Out-of-range index is "not found" instead of falling back to element 0
    pub strict_index: bool,
    /// Service identity on audit events
    pub service_id: String,
    /// Emit audit events
    pub audit_enabled: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strict_index: false,
            service_id: DEFAULT_SERVICE_ID.to_string(),
            audit_enabled: true,
        }
    }
}

impl ResolverConfig {
    /// Load from `KSM_STRICT_INDEX`, `KSM_SERVICE_ID` and `KSM_AUDIT_ENABLED`.
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// A flag variable that is not a boolean.
    pub fn from_env() -> KsmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// A flag value that is not a boolean.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> KsmResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup("KSM_STRICT_INDEX") {
            config.strict_index = parse_flag("KSM_STRICT_INDEX", &raw)?;
        }
        if let Some(id) = lookup("KSM_SERVICE_ID").filter(|id| !id.trim().is_empty()) {
            config.service_id = id;
        }
        if let Some(raw) = lookup("KSM_AUDIT_ENABLED") {
            config.audit_enabled = parse_flag("KSM_AUDIT_ENABLED", &raw)?;
        }
        Ok(config)
    }

    /// Set strict index handling.
    #[must_use]
    pub const fn with_strict_index(mut self, strict: bool) -> Self {
        self.strict_index = strict;
        self
    }

    /// Set the service identity.
    #[must_use]
    pub fn with_service_id(mut self, id: impl Into<String>) -> Self {
        self.service_id = id.into();
        self
    }

    /// Enable or disable audit events.
    #[must_use]
    pub const fn with_audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }
}
