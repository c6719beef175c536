//! Token list file: the per-chain token catalog, USD reference prices,
//! stable classification and route restrictions.
//!
//! ```toml
//! [[tokens]]
//! chain_id = 1
//! address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
//! name = "USDC"
//! symbol = "USDC"
//! decimals = 6
//! price_usd = 1.0
//! stable = true
//!
//! [[routes]]
//! source_chain = 1
//! source = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
//! destination_chain = 33139
//! allow = ["0xA2235d059F80e176D931Ef76b6C51953Eb3fBEf4"]
//!
//! [[stable_pairs]]
//! first = { chain_id = 1, address = "0x…" }
//! second = { chain_id = 33139, address = "0x…" }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use portal_types::{Address, ChainId, TokenId, TokenInfo};
use serde::Deserialize;
use thiserror::Error;

const BUILTIN_TOKEN_LIST: &str = include_str!("../tokens.toml");

#[derive(Debug, Error)]
pub enum TokenListError {
    #[error("failed to read token list at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse token list: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("token {0} is listed twice")]
    Duplicate(TokenId),
}

/// Destinations reachable from one source token on one destination chain.
///
/// Anything not covered by a rule is unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRule {
    pub source_chain: ChainId,
    pub source: Address,
    pub destination_chain: ChainId,
    pub allow: Vec<Address>,
}

impl RouteRule {
    #[must_use]
    pub fn applies_to(&self, source: TokenId, destination_chain: ChainId) -> bool {
        self.source_chain == source.chain_id
            && self.source == source.address
            && self.destination_chain == destination_chain
    }
}

/// Two tokens priced as one, on top of the per-token `stable` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StablePair {
    pub first: TokenId,
    pub second: TokenId,
}

impl StablePair {
    #[must_use]
    pub fn matches(&self, a: TokenId, b: TokenId) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

#[derive(Debug, Deserialize)]
struct RawTokenList {
    #[serde(default)]
    tokens: Vec<RawToken>,
    #[serde(default)]
    routes: Vec<RouteRule>,
    #[serde(default)]
    stable_pairs: Vec<StablePair>,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    chain_id: ChainId,
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    #[serde(default)]
    is_native: bool,
    logo: Option<String>,
    price_usd: Option<f64>,
    #[serde(default)]
    stable: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenList {
    /// In file order; order matters for next-token resolution.
    pub tokens: Vec<TokenInfo>,
    pub prices: HashMap<TokenId, f64>,
    pub stable: Vec<TokenId>,
    pub stable_pairs: Vec<StablePair>,
    pub routes: Vec<RouteRule>,
}

impl TokenList {
    pub fn load_from(path: &Path) -> Result<Self, TokenListError> {
        let content = fs::read_to_string(path).map_err(|source| TokenListError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TokenListError> {
        let raw: RawTokenList = toml::from_str(content)?;
        let mut list = TokenList {
            routes: raw.routes,
            stable_pairs: raw.stable_pairs,
            ..TokenList::default()
        };
        for token in raw.tokens {
            let id = TokenId::new(token.chain_id, token.address);
            if list.tokens.iter().any(|known| known.id() == id) {
                return Err(TokenListError::Duplicate(id));
            }
            if let Some(price) = token.price_usd {
                list.prices.insert(id, price);
            }
            if token.stable {
                list.stable.push(id);
            }
            list.tokens.push(TokenInfo {
                chain_id: token.chain_id,
                address: token.address,
                name: token.name,
                symbol: token.symbol,
                decimals: token.decimals,
                is_native: token.is_native,
                logo: token.logo,
            });
        }
        Ok(list)
    }

    /// The list shipped with the portal: Ethereum, Arbitrum and ApeChain.
    pub fn builtin() -> Result<Self, TokenListError> {
        Self::from_toml_str(BUILTIN_TOKEN_LIST)
    }

    #[must_use]
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = Vec::new();
        for token in &self.tokens {
            if !chains.contains(&token.chain_id) {
                chains.push(token.chain_id);
            }
        }
        chains
    }

    #[must_use]
    pub fn price_usd(&self, token: TokenId) -> Option<f64> {
        self.prices.get(&token).copied()
    }
}
