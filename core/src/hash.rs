//! Location hash routing: `#bridge`, `#swap`, `#onramp` and
//! `#swap/<chainId>/<address>`.

use std::sync::OnceLock;

use portal_types::{Address, ChainId, PortalMode, TokenId};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("hash `{0}` names no portal route")]
    NoRoute(String),
    #[error("hash chain id `{0}` is not a valid chain id")]
    InvalidChain(String),
    #[error("hash token address `{0}` is not a valid address")]
    InvalidAddress(String),
}

/// What a location hash asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRoute {
    pub mode: PortalMode,
    /// Swap destination to pre-fill.
    pub token: Option<TokenId>,
}

struct HashPatterns {
    modes: [(Regex, PortalMode); 3],
    swap_token: Regex,
}

impl HashPatterns {
    fn new() -> Self {
        Self {
            modes: [
                (
                    Regex::new(r"#bridge/?").expect("valid bridge hash regex"),
                    PortalMode::Bridge,
                ),
                (
                    Regex::new(r"#swap/?").expect("valid swap hash regex"),
                    PortalMode::Swap,
                ),
                (
                    Regex::new(r"#onramp/?").expect("valid onramp hash regex"),
                    PortalMode::OnRamp,
                ),
            ],
            swap_token: Regex::new(r"#swap/(\d+)/(0x[\dA-Fa-f]{40})")
                .expect("valid swap token hash regex"),
        }
    }
}

static HASH_PATTERNS: OnceLock<HashPatterns> = OnceLock::new();

fn hash_patterns() -> &'static HashPatterns {
    HASH_PATTERNS.get_or_init(HashPatterns::new)
}

impl HashRoute {
    /// Parse a location hash. Route names are checked in the order bridge,
    /// swap, onramp; the first one found anywhere in the hash wins.
    pub fn parse(hash: &str) -> Result<Self, HashError> {
        let patterns = hash_patterns();
        let mode = patterns
            .modes
            .iter()
            .find(|(regex, _)| regex.is_match(hash))
            .map(|(_, mode)| *mode)
            .ok_or_else(|| HashError::NoRoute(hash.to_string()))?;

        let token = match patterns.swap_token.captures(hash) {
            Some(captures) if mode == PortalMode::Swap => {
                let chain = &captures[1];
                let address = &captures[2];
                let chain_id = chain
                    .parse::<u64>()
                    .map_err(|_| HashError::InvalidChain(chain.to_string()))?;
                let address = address
                    .parse::<Address>()
                    .map_err(|_| HashError::InvalidAddress(address.to_string()))?;
                Some(TokenId::new(ChainId::new(chain_id), address))
            }
            _ => None,
        };

        Ok(Self { mode, token })
    }
}
