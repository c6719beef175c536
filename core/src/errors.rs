//! Quote and gas failure taxonomy, and the action button state derived from it.

use std::sync::OnceLock;

use portal_types::{ChainId, PortalMode};
use regex::Regex;
use thiserror::Error;

/// Shown instead of any other error while the quoted price impact is too high.
pub const HIGH_IMPACT_ERROR: &str = "Price impact too high";

/// Why the current quote cannot be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Insufficient funds for fees")]
    InsufficientFundsForFees,
    #[error("Bad from or to chains")]
    WrongNetwork,
    /// The router needs an ERC-20 allowance first. Unlike the others this
    /// does not disable the action: the action becomes the approval.
    #[error("Token approval required")]
    TokenApprovalRequired,
    #[error("Something went wrong")]
    UnknownError,
}

impl BridgeError {
    #[must_use]
    pub fn blocks_action(self) -> bool {
        !matches!(self, Self::TokenApprovalRequired)
    }
}

struct FailurePatterns {
    wrong_network: Regex,
    insufficient_funds: Regex,
    exceeds_balance: Regex,
}

impl FailurePatterns {
    fn new() -> Self {
        Self {
            wrong_network: Regex::new(r"(?i)wrong network").expect("valid wrong network regex"),
            insufficient_funds: Regex::new(
                r"(?i)insufficient funds|exceeds transaction sender account balance",
            )
            .expect("valid insufficient funds regex"),
            exceeds_balance: Regex::new(r"amount exceeds balance")
                .expect("valid amount exceeds balance regex"),
        }
    }
}

static FAILURE_PATTERNS: OnceLock<FailurePatterns> = OnceLock::new();

fn failure_patterns() -> &'static FailurePatterns {
    FAILURE_PATTERNS.get_or_init(FailurePatterns::new)
}

/// Map a routing API failure to a bridge error.
///
/// Anything but a wrong-network rejection is unknown and logged in full.
#[must_use]
pub fn classify_quote_failure(message: &str) -> BridgeError {
    if failure_patterns().wrong_network.is_match(message) {
        return BridgeError::WrongNetwork;
    }
    tracing::error!(error = message, "Quote request failed");
    BridgeError::UnknownError
}

/// Map a gas estimation failure.
///
/// `None` means the node did not blame the balance; the caller should check
/// whether a token allowance is missing.
#[must_use]
pub fn classify_gas_failure(message: &str) -> Option<BridgeError> {
    let patterns = failure_patterns();
    if patterns.insufficient_funds.is_match(message) || patterns.exceeds_balance.is_match(message) {
        return Some(BridgeError::InsufficientFunds);
    }
    None
}

/// Message displayed for the combined error state, if any.
#[must_use]
pub fn bridge_error_message(error: Option<BridgeError>, high_impact: bool) -> Option<String> {
    if high_impact {
        return Some(HIGH_IMPACT_ERROR.to_string());
    }
    error
        .filter(|error| error.blocks_action())
        .map(|error| error.to_string())
}

/// Inputs to the primary action button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGate {
    pub mode: PortalMode,
    pub wallet_connected: bool,
    /// Chain the wallet must switch to, when it is on the wrong one.
    pub switch_to: Option<ChainId>,
    pub error: Option<BridgeError>,
    pub high_impact: bool,
    pub amounts_empty: bool,
}

impl ActionGate {
    #[must_use]
    pub fn label(&self) -> String {
        if !self.wallet_connected {
            return "Connect Wallet".to_string();
        }
        if let Some(chain) = self.switch_to {
            let name = chain.name().map_or_else(|| chain.to_string(), str::to_string);
            return format!("Switch Network to {name}");
        }
        if let Some(message) = bridge_error_message(self.error, self.high_impact) {
            return message;
        }
        if self.amounts_empty {
            return "Enter Amount".to_string();
        }
        if self.error == Some(BridgeError::TokenApprovalRequired) {
            return "Approve token for spend".to_string();
        }
        match self.mode {
            PortalMode::Swap => "Swap".to_string(),
            PortalMode::Bridge | PortalMode::OnRamp => "Bridge".to_string(),
        }
    }

    /// A wallet on the wrong chain keeps the button live so it can switch.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.switch_to.is_none()
            && self.wallet_connected
            && (bridge_error_message(self.error, self.high_impact).is_some() || self.amounts_empty)
    }
}
