//! Async seams to the outside world: routing API, gas oracle, prices,
//! allowances and balances.
//!
//! Every call returns a boxed future so implementations can be swapped at
//! runtime behind `Arc<dyn …>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use portal_types::{Address, ChainId, EvmTransaction, Quote, QuoteRequest, TokenId, U256};
use thiserror::Error;

/// Collaborator future type alias.
pub type CollabFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, CollaboratorError>> + Send + 'a>>;

/// Any collaborator failure. Timeouts are treated like every other error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("{service} failed: {message}")]
    Failed {
        service: &'static str,
        message: String,
    },
    #[error("{service} timed out")]
    Timeout { service: &'static str },
    #[error("{service} is unavailable")]
    Unavailable { service: &'static str },
}

impl CollaboratorError {
    pub fn failed(service: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            service,
            message: message.into(),
        }
    }

    /// Raw collaborator text, used for error classification.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Failed { message, .. } => message,
            Self::Timeout { .. } => "timeout",
            Self::Unavailable { .. } => "unavailable",
        }
    }
}

pub trait QuoteService: Send + Sync {
    fn fetch_quote<'a>(&'a self, request: &'a QuoteRequest) -> CollabFut<'a, Quote>;
}

pub trait GasOracle: Send + Sync {
    /// Gas units `tx` would consume when sent by `from`.
    fn estimate_gas<'a>(
        &'a self,
        chain: ChainId,
        from: Address,
        tx: &'a EvmTransaction,
    ) -> CollabFut<'a, u64>;

    fn max_fee_per_gas(&self, chain: ChainId) -> CollabFut<'_, U256>;
}

pub trait PriceOracle: Send + Sync {
    /// `None` when no price is known for the token.
    fn usd_price(&self, token: TokenId) -> CollabFut<'_, Option<f64>>;
}

pub trait AllowanceChecker: Send + Sync {
    /// Whether `owner` must approve `spender` before `amount` of `token` can move.
    fn is_approval_needed(
        &self,
        owner: Address,
        token: TokenId,
        spender: Address,
        amount: U256,
    ) -> CollabFut<'_, bool>;
}

pub trait BalanceReader: Send + Sync {
    fn native_balance(&self, owner: Address, chain: ChainId) -> CollabFut<'_, U256>;

    fn token_balance(&self, owner: Address, token: TokenId) -> CollabFut<'_, U256>;
}

/// Every collaborator a session needs. Cheap to clone.
#[derive(Clone)]
pub struct Collaborators {
    pub quotes: Arc<dyn QuoteService>,
    pub gas: Arc<dyn GasOracle>,
    pub prices: Arc<dyn PriceOracle>,
    pub allowances: Arc<dyn AllowanceChecker>,
    pub balances: Arc<dyn BalanceReader>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
