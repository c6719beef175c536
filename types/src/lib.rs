//! Core domain types for the portal.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod amount;
pub mod format;
mod quote;
mod selection;
mod slippage;

pub use alloy_primitives::{Address, U256};
pub use amount::{AmountError, TokenAmount};
pub use quote::{BridgeId, EvmTransaction, GasEstimate, Payment, Quote, QuoteRequest};
pub use selection::{TokenPair, TokenSelection};
pub use slippage::{Slippage, SlippageError};

use std::fmt;

use alloy_primitives::address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Chains
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const ARBITRUM: ChainId = ChainId(42161);
    pub const APE: ChainId = ChainId(33139);
    pub const APE_CURTIS: ChainId = ChainId(33111);

    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// ApeChain mainnet or its Curtis testnet.
    #[must_use]
    pub fn is_apechain(self) -> bool {
        self == Self::APE || self == Self::APE_CURTIS
    }

    /// Human name for well-known chains.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::ETHEREUM => Some("Ethereum"),
            Self::ARBITRUM => Some("Arbitrum One"),
            Self::APE => Some("ApeChain"),
            Self::APE_CURTIS => Some("Curtis"),
            _ => None,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Address used by the routing API for a chain's gas token.
pub const NATIVE_TOKEN_ADDRESS: Address = Address::ZERO;

pub const APECOIN_ETHEREUM: Address = address!("0x4d224452801ACEd8B2F0aebE155379bb5D594381");
pub const APECOIN_ARBITRUM: Address = address!("0x7f9FBf9bDd3F4105C478b996B648FE6e828a1e98");
pub const APE_USD_OMNICHAIN: Address = address!("0xA2235d059F80e176D931Ef76b6C51953Eb3fBEf4");
pub const APE_ETH_OMNICHAIN: Address = address!("0xcF800F4948D16F23333508191B1B1591daF70438");
pub const STETH_ETHEREUM: Address = address!("0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84");

/// A token reference without metadata: where it lives and what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId {
    pub chain_id: ChainId,
    pub address: Address,
}

impl TokenId {
    #[must_use]
    pub const fn new(chain_id: ChainId, address: Address) -> Self {
        Self { chain_id, address }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chain_id, self.address)
    }
}

/// Token metadata as reported by the chain-data collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub chain_id: ChainId,
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub logo: Option<String>,
}

impl TokenInfo {
    #[must_use]
    pub fn id(&self) -> TokenId {
        TokenId::new(self.chain_id, self.address)
    }

    /// Same chain and same contract. Metadata is ignored.
    #[must_use]
    pub fn is_same_token(&self, other: &TokenInfo) -> bool {
        self.chain_id == other.chain_id && self.address == other.address
    }

    #[must_use]
    pub fn is_apecoin(&self) -> bool {
        self.address == APECOIN_ETHEREUM || self.address == APECOIN_ARBITRUM
    }
}

/// ApeCoin as listed on Ethereum or Arbitrum. On those chains it is an
/// ERC-20, so spending it needs an allowance.
#[must_use]
pub fn apecoin_token(chain_id: ChainId, address: Address) -> TokenInfo {
    TokenInfo {
        chain_id,
        address,
        name: "ApeCoin".to_string(),
        symbol: "APE".to_string(),
        decimals: 18,
        is_native: false,
        logo: Some("https://box-v3.api.decent.xyz/tokens/apecoin.svg".to_string()),
    }
}

// ============================================================================
// Portal Modes
// ============================================================================

/// Mutually exclusive operating modes of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortalMode {
    #[default]
    Bridge,
    Swap,
    OnRamp,
}

impl PortalMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PortalMode::Bridge => "bridge",
            PortalMode::Swap => "swap",
            PortalMode::OnRamp => "onramp",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bridge" => Some(PortalMode::Bridge),
            "swap" => Some(PortalMode::Swap),
            "onramp" | "buy" => Some(PortalMode::OnRamp),
            _ => None,
        }
    }

    /// The token-pair mode this tab operates, if any. OnRamp works on the
    /// wallet's native balance only and never owns a pair.
    #[must_use]
    pub fn pair_mode(self) -> Option<PairMode> {
        match self {
            PortalMode::Bridge => Some(PairMode::Bridge),
            PortalMode::Swap => Some(PairMode::Swap),
            PortalMode::OnRamp => None,
        }
    }

    /// Visual tab slot. Bridge and Swap share one slot.
    #[must_use]
    pub fn tab_index(self) -> usize {
        match self {
            PortalMode::Bridge | PortalMode::Swap => 0,
            PortalMode::OnRamp => 1,
        }
    }
}

impl fmt::Display for PortalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modes that own a (source, destination) token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairMode {
    Bridge,
    Swap,
}

impl PairMode {
    #[must_use]
    pub fn portal_mode(self) -> PortalMode {
        match self {
            PairMode::Bridge => PortalMode::Bridge,
            PairMode::Swap => PortalMode::Swap,
        }
    }

    /// Whether `pair` is a legal active pair for this mode.
    ///
    /// Swap needs both tokens on one chain; both modes reject a pair whose
    /// two sides are the same token.
    #[must_use]
    pub fn accepts(self, pair: &TokenPair) -> bool {
        if pair.is_identical() {
            return false;
        }
        match self {
            PairMode::Bridge => true,
            PairMode::Swap => pair.same_chain(),
        }
    }

    #[must_use]
    pub fn other(self) -> PairMode {
        match self {
            PairMode::Bridge => PairMode::Swap,
            PairMode::Swap => PairMode::Bridge,
        }
    }
}

impl fmt::Display for PairMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.portal_mode().as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown tab entry `{0}`")]
pub struct TabEntryError(String);

/// One element of the configured tab list. An `Initial` marker also picks
/// the startup mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TabEntry {
    Plain(PortalMode),
    Initial(PortalMode),
}

impl TabEntry {
    #[must_use]
    pub fn mode(self) -> PortalMode {
        match self {
            TabEntry::Plain(mode) | TabEntry::Initial(mode) => mode,
        }
    }

    #[must_use]
    pub fn is_initial(self) -> bool {
        matches!(self, TabEntry::Initial(_))
    }

    pub fn parse(raw: &str) -> Result<Self, TabEntryError> {
        let trimmed = raw.trim();
        if let Some(rest) = trimmed.strip_prefix("initial_") {
            return PortalMode::parse(rest)
                .map(TabEntry::Initial)
                .ok_or_else(|| TabEntryError(raw.to_string()));
        }
        PortalMode::parse(trimmed)
            .map(TabEntry::Plain)
            .ok_or_else(|| TabEntryError(raw.to_string()))
    }
}

impl TryFrom<String> for TabEntry {
    type Error = TabEntryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl fmt::Display for TabEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabEntry::Plain(mode) => write!(f, "{mode}"),
            TabEntry::Initial(mode) => write!(f, "initial_{mode}"),
        }
    }
}

// ============================================================================
// Input Direction
// ============================================================================

/// Which amount field the user edited last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSide {
    #[default]
    Source,
    Destination,
}

impl InputSide {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            InputSide::Source => InputSide::Destination,
            InputSide::Destination => InputSide::Source,
        }
    }

    #[must_use]
    pub fn direction(self) -> SwapDirection {
        match self {
            InputSide::Source => SwapDirection::ExactAmountIn,
            InputSide::Destination => SwapDirection::ExactAmountOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    ExactAmountIn,
    ExactAmountOut,
}
