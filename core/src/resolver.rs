//! Picks a sensible token to pair with a given one on the same chain.

use portal_types::{ChainId, TokenId, TokenInfo};
use thiserror::Error;

use crate::catalog::TokenCatalog;

/// Preferred pairing when the gas token is excluded.
pub const PREFERRED_STABLE_NAME: &str = "USDC";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no other tokens found on chain {0}")]
    NotFound(ChainId),
}

/// Next token on `exclude.chain_id` that is not `exclude`.
///
/// Order of preference: the chain's gas token, the token named `USDC`, then
/// the first listed token with a different address. A chain with no token
/// list resolves to [`ResolveError::NotFound`]. A failed gas-token lookup
/// only skips the first preference.
pub fn resolve_next_token(
    catalog: &dyn TokenCatalog,
    exclude: &TokenId,
) -> Result<TokenInfo, ResolveError> {
    let chain = exclude.chain_id;
    match catalog.native_token(chain) {
        Ok(gas) if gas.address != exclude.address => return Ok(gas),
        Ok(_) => {}
        Err(err) => tracing::debug!(%err, "Gas token unknown; trying chain token list"),
    }

    let Some(tokens) = catalog.chain_tokens(chain) else {
        return Err(ResolveError::NotFound(chain));
    };

    if let Some(usdc) = tokens
        .iter()
        .find(|token| token.name == PREFERRED_STABLE_NAME && token.address != exclude.address)
    {
        return Ok(usdc.clone());
    }

    tokens
        .into_iter()
        .find(|token| token.address != exclude.address)
        .ok_or(ResolveError::NotFound(chain))
}

/// Like [`resolve_next_token`], but skips candidates the router cannot reach
/// from `source`.
pub fn resolve_routable_token(
    catalog: &dyn TokenCatalog,
    source: &TokenId,
) -> Result<TokenInfo, ResolveError> {
    let first = resolve_next_token(catalog, source)?;
    if catalog.is_route_allowed(source, &first.id()) {
        return Ok(first);
    }
    catalog
        .chain_tokens(source.chain_id)
        .unwrap_or_default()
        .into_iter()
        .find(|token| token.address != source.address && catalog.is_route_allowed(source, &token.id()))
        .ok_or(ResolveError::NotFound(source.chain_id))
}
