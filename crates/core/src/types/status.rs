//! Checkout progress status shown by the cart UI.

use serde::{Deserialize, Serialize};

/// Checkout progress for display purposes.
///
/// The normal cycle is `Idle -> Loading -> Success | Failure -> Idle`, but any
/// value may be set from any other through [`crate::CartStore::update_cart_ui`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UiStatus {
    /// No checkout in progress; the cart is editable.
    #[default]
    Idle,
    /// A checkout is talking to the payment or order service.
    Loading,
    /// Payment went through.
    Success,
    /// Payment was declined or a service call failed.
    Failure,
}

impl UiStatus {
    /// Whether the UI should block cart edits and further checkout attempts.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl std::fmt::Display for UiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl std::str::FromStr for UiStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "loading" => Ok(Self::Loading),
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            _ => Err(format!("invalid cart UI status: {s}")),
        }
    }
}
