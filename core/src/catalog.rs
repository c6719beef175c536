//! Chain-data seams: which tokens exist, which are stable, which routes work.

use std::collections::HashSet;

use portal_config::{RouteRule, StablePair, TokenList};
use portal_types::{
    APE_ETH_OMNICHAIN, Address, ChainId, NATIVE_TOKEN_ADDRESS, STETH_ETHEREUM, TokenId, TokenInfo,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("no native token known for chain {0}")]
    NativeNotFound(ChainId),
    #[error("token {0} is not in the catalog")]
    UnknownToken(TokenId),
}

/// Token metadata provider.
pub trait TokenCatalog {
    /// The chain's gas token.
    fn native_token(&self, chain: ChainId) -> Result<TokenInfo, CatalogError>;

    /// Every token offered on `chain`, or `None` when the chain is unknown.
    fn chain_tokens(&self, chain: ChainId) -> Option<Vec<TokenInfo>>;

    fn find(&self, id: &TokenId) -> Option<TokenInfo>;

    /// Whether the router currently serves `source` → `destination`.
    fn is_route_allowed(&self, _source: &TokenId, _destination: &TokenId) -> bool {
        true
    }
}

pub trait StableClassifier {
    fn is_stable(&self, token: &TokenId) -> bool;

    /// stETH on one side and ApeETH on the other, on any chain.
    fn is_steth_apeeth_pair(&self, a: &TokenId, b: &TokenId) -> bool {
        let is = |t: &TokenId, address: Address| t.address == address;
        (is(a, STETH_ETHEREUM) && is(b, APE_ETH_OMNICHAIN))
            || (is(a, APE_ETH_OMNICHAIN) && is(b, STETH_ETHEREUM))
    }

    /// Both sides hold a peg, so the tight stable slippage applies.
    fn is_pair_stable(&self, a: &TokenId, b: &TokenId) -> bool {
        (self.is_stable(a) && self.is_stable(b)) || self.is_steth_apeeth_pair(a, b)
    }
}

/// In-memory catalog backed by a token list file.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tokens: Vec<TokenInfo>,
    routes: Vec<RouteRule>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self {
            tokens,
            routes: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_list(list: &TokenList) -> Self {
        Self {
            tokens: list.tokens.clone(),
            routes: list.routes.clone(),
        }
    }

    #[must_use]
    pub fn with_routes(mut self, routes: Vec<RouteRule>) -> Self {
        self.routes = routes;
        self
    }

    #[must_use]
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains = Vec::new();
        for token in &self.tokens {
            if !chains.contains(&token.chain_id) {
                chains.push(token.chain_id);
            }
        }
        chains
    }
}

impl TokenCatalog for StaticCatalog {
    fn native_token(&self, chain: ChainId) -> Result<TokenInfo, CatalogError> {
        self.tokens
            .iter()
            .find(|token| token.chain_id == chain && token.address == NATIVE_TOKEN_ADDRESS)
            .cloned()
            .ok_or(CatalogError::NativeNotFound(chain))
    }

    fn chain_tokens(&self, chain: ChainId) -> Option<Vec<TokenInfo>> {
        let tokens: Vec<TokenInfo> = self
            .tokens
            .iter()
            .filter(|token| token.chain_id == chain)
            .cloned()
            .collect();
        if tokens.is_empty() { None } else { Some(tokens) }
    }

    fn find(&self, id: &TokenId) -> Option<TokenInfo> {
        self.tokens.iter().find(|token| token.id() == *id).cloned()
    }

    fn is_route_allowed(&self, source: &TokenId, destination: &TokenId) -> bool {
        match self
            .routes
            .iter()
            .find(|rule| rule.applies_to(*source, destination.chain_id))
        {
            Some(rule) => rule.allow.contains(&destination.address),
            None => true,
        }
    }
}

/// Stable classification from token list flags plus explicit pairs.
#[derive(Debug, Clone, Default)]
pub struct StableSet {
    stable: HashSet<TokenId>,
    pairs: Vec<StablePair>,
}

impl StableSet {
    #[must_use]
    pub fn new(stable: impl IntoIterator<Item = TokenId>) -> Self {
        Self {
            stable: stable.into_iter().collect(),
            pairs: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_list(list: &TokenList) -> Self {
        Self {
            stable: list.stable.iter().copied().collect(),
            pairs: list.stable_pairs.clone(),
        }
    }
}

impl StableClassifier for StableSet {
    fn is_stable(&self, token: &TokenId) -> bool {
        self.stable.contains(token)
    }

    fn is_pair_stable(&self, a: &TokenId, b: &TokenId) -> bool {
        (self.is_stable(a) && self.is_stable(b))
            || self.is_steth_apeeth_pair(a, b)
            || self.pairs.iter().any(|pair| pair.matches(*a, *b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_types::APE_USD_OMNICHAIN;

    fn token(chain: ChainId, address: Address, name: &str) -> TokenInfo {
        TokenInfo {
            chain_id: chain,
            address,
            name: name.to_string(),
            symbol: name.to_string(),
            decimals: 18,
            is_native: address == NATIVE_TOKEN_ADDRESS,
            logo: None,
        }
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog::new(vec![
            token(ChainId::ETHEREUM, NATIVE_TOKEN_ADDRESS, "ETH"),
            token(ChainId::ETHEREUM, Address::with_last_byte(1), "USDC"),
            token(ChainId::APE, NATIVE_TOKEN_ADDRESS, "APE"),
            token(ChainId::APE, APE_USD_OMNICHAIN, "ApeUSD"),
        ])
    }

    #[test]
    fn native_lookup_uses_zero_address() {
        let catalog = catalog();
        assert_eq!(catalog.native_token(ChainId::APE).unwrap().name, "APE");
        assert_eq!(
            catalog.native_token(ChainId::ARBITRUM),
            Err(CatalogError::NativeNotFound(ChainId::ARBITRUM))
        );
    }

    #[test]
    fn unknown_chain_has_no_token_list() {
        assert!(catalog().chain_tokens(ChainId::ARBITRUM).is_none());
        assert_eq!(catalog().chain_tokens(ChainId::ETHEREUM).unwrap().len(), 2);
    }

    #[test]
    fn routes_restrict_only_matching_rows() {
        let eth = TokenId::new(ChainId::ETHEREUM, NATIVE_TOKEN_ADDRESS);
        let catalog = catalog().with_routes(vec![RouteRule {
            source_chain: ChainId::ETHEREUM,
            source: NATIVE_TOKEN_ADDRESS,
            destination_chain: ChainId::APE,
            allow: vec![APE_USD_OMNICHAIN],
        }]);

        let ape_usd = TokenId::new(ChainId::APE, APE_USD_OMNICHAIN);
        let ape = TokenId::new(ChainId::APE, NATIVE_TOKEN_ADDRESS);
        assert!(catalog.is_route_allowed(&eth, &ape_usd));
        assert!(!catalog.is_route_allowed(&eth, &ape));

        let usdc = TokenId::new(ChainId::ETHEREUM, Address::with_last_byte(1));
        assert!(catalog.is_route_allowed(&usdc, &ape));
    }

    #[test]
    fn stable_pairs_need_both_sides() {
        let usdc = TokenId::new(ChainId::ETHEREUM, Address::with_last_byte(1));
        let ape_usd = TokenId::new(ChainId::APE, APE_USD_OMNICHAIN);
        let eth = TokenId::new(ChainId::ETHEREUM, NATIVE_TOKEN_ADDRESS);
        let stable = StableSet::new([usdc, ape_usd]);

        assert!(stable.is_pair_stable(&usdc, &ape_usd));
        assert!(!stable.is_pair_stable(&usdc, &eth));
    }

    #[test]
    fn steth_apeeth_counts_as_stable_in_either_order() {
        let steth = TokenId::new(ChainId::ETHEREUM, STETH_ETHEREUM);
        let ape_eth = TokenId::new(ChainId::APE, APE_ETH_OMNICHAIN);
        let stable = StableSet::default();

        assert!(stable.is_pair_stable(&steth, &ape_eth));
        assert!(stable.is_pair_stable(&ape_eth, &steth));
        assert!(!stable.is_stable(&steth));
    }

    #[test]
    fn explicit_stable_pairs_apply() {
        let a = TokenId::new(ChainId::ETHEREUM, Address::with_last_byte(5));
        let b = TokenId::new(ChainId::ARBITRUM, Address::with_last_byte(6));
        let mut list = TokenList::default();
        list.stable_pairs.push(StablePair { first: a, second: b });

        assert!(StableSet::from_list(&list).is_pair_stable(&b, &a));
    }
}
