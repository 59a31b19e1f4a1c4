use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{SharedParameters, TARGETING_SESSION_ENABLED};

/// The two flags every handler checks before acting.
///
/// Implementations must read fresh state on every call: a configuration
/// change takes effect on the next request, not the next process.
pub trait FeatureGate: Send + Sync {
    /// Global targeting switch.
    fn targeting_enabled(&self) -> bool;

    /// Feature-local switch for the session bags.
    fn session_bags_enabled(&self) -> bool;
}

/// Process-wide targeting enable switch, constructed once at application
/// start and injected wherever targeting behavior is gated.
#[derive(Debug)]
pub struct TargetingState {
    enabled: AtomicBool,
}

impl TargetingState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for TargetingState {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Gate backed by the global switch and the
/// `pimcore_personalization.targeting.session.enabled` parameter.
pub struct ConfigFeatureGate {
    state: Arc<TargetingState>,
    params: SharedParameters,
}

impl ConfigFeatureGate {
    pub fn new(state: Arc<TargetingState>, params: SharedParameters) -> Self {
        Self { state, params }
    }
}

impl FeatureGate for ConfigFeatureGate {
    fn targeting_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    fn session_bags_enabled(&self) -> bool {
        // an absent parameter means enabled
        self.params
            .read()
            .ok()
            .and_then(|params| params.bool(TARGETING_SESSION_ENABLED))
            .unwrap_or(true)
    }
}
