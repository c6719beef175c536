use serde::{Deserialize, Serialize};

use crate::{TokenAmount, TokenInfo};

/// One side of the portal: a token plus what the user entered for it.
///
/// Never edited in place. Every `with_*` call builds a new value so the
/// chain, address and decimals always travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSelection {
    pub token: TokenInfo,
    pub amount: TokenAmount,
    /// Display string, derived from a price feed. Not authoritative.
    pub amount_usd: String,
}

impl TokenSelection {
    #[must_use]
    pub fn new(token: TokenInfo) -> Self {
        Self {
            token,
            amount: TokenAmount::empty(),
            amount_usd: String::new(),
        }
    }

    /// Swap the token. The typed amount carries over; its USD value does not.
    #[must_use]
    pub fn with_token(&self, token: TokenInfo) -> Self {
        Self {
            token,
            amount: self.amount.clone(),
            amount_usd: String::new(),
        }
    }

    #[must_use]
    pub fn with_amount(&self, amount: TokenAmount) -> Self {
        Self {
            token: self.token.clone(),
            amount,
            amount_usd: self.amount_usd.clone(),
        }
    }

    #[must_use]
    pub fn with_amount_usd(&self, amount_usd: impl Into<String>) -> Self {
        Self {
            token: self.token.clone(),
            amount: self.amount.clone(),
            amount_usd: amount_usd.into(),
        }
    }
}

/// Source and destination tokens, without amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub source: TokenInfo,
    pub destination: TokenInfo,
}

impl TokenPair {
    #[must_use]
    pub fn new(source: TokenInfo, destination: TokenInfo) -> Self {
        Self {
            source,
            destination,
        }
    }

    #[must_use]
    pub fn same_chain(&self) -> bool {
        self.source.chain_id == self.destination.chain_id
    }

    /// Both sides point at the same contract on the same chain.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.source.is_same_token(&self.destination)
    }

    /// Same chain and address on both sides. Metadata differences are ignored.
    #[must_use]
    pub fn same_tokens_as(&self, other: &TokenPair) -> bool {
        self.source.is_same_token(&other.source)
            && self.destination.is_same_token(&other.destination)
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        Self::new(self.destination.clone(), self.source.clone())
    }
}
