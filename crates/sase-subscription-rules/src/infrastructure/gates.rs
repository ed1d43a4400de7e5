//! Static feature gates

use std::collections::BTreeSet;

use crate::ports::outbound::FeatureGates;

/// Gates fixed at construction
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureGates {
    commerce_providers: BTreeSet<String>,
    recurring_billing: bool,
}

impl StaticFeatureGates {
    pub fn new<I, S>(commerce_providers: I, recurring_billing: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commerce_providers: commerce_providers.into_iter().map(Into::into).collect(),
            recurring_billing,
        }
    }

    /// Everything off
    pub fn disabled() -> Self {
        Self::default()
    }
}

impl FeatureGates for StaticFeatureGates {
    fn commerce_enabled(&self, provider: &str) -> bool {
        self.commerce_providers.contains(provider)
    }

    fn recurring_billing_available(&self) -> bool {
        self.recurring_billing
    }
}
