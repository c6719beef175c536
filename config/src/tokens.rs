use portal_types::{ChainId, InputSide, PortalMode, TokenAmount, TokenId};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenConfigError {
    #[error("chain {0} is not supported")]
    UnsupportedChain(ChainId),
    #[error("swap tokens must be on chain {expected}, found chain {found}")]
    SwapChainMismatch { found: ChainId, expected: ChainId },
}

/// Amount to pre-fill, and which field it goes in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DefaultAmount {
    pub side: InputSide,
    pub amount: TokenAmount,
}

/// Embedder-provided token overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenConfig {
    pub default_source: Option<TokenId>,
    pub default_destination: Option<TokenId>,
    pub default_amount: Option<DefaultAmount>,
    /// Users may not change the destination token.
    #[serde(default)]
    pub lock_destination: bool,
}

impl TokenConfig {
    #[must_use]
    pub fn has_tokens(&self) -> bool {
        self.default_source.is_some() || self.default_destination.is_some()
    }

    /// Check the configured tokens against the rules of `mode`.
    ///
    /// Bridge: every provided token must sit on a supported chain.
    /// Swap: provided tokens must share `swap_chain`.
    /// OnRamp carries no token pair and always passes.
    pub fn validate(
        &self,
        mode: PortalMode,
        supported_chains: &[ChainId],
        swap_chain: ChainId,
    ) -> Result<(), TokenConfigError> {
        let provided = [self.default_source, self.default_destination];
        match mode {
            PortalMode::Bridge => {
                for token in provided.into_iter().flatten() {
                    if !supported_chains.contains(&token.chain_id) {
                        return Err(TokenConfigError::UnsupportedChain(token.chain_id));
                    }
                }
                Ok(())
            }
            PortalMode::Swap => {
                for token in provided.into_iter().flatten() {
                    if token.chain_id != swap_chain {
                        return Err(TokenConfigError::SwapChainMismatch {
                            found: token.chain_id,
                            expected: swap_chain,
                        });
                    }
                }
                Ok(())
            }
            PortalMode::OnRamp => Ok(()),
        }
    }
}
