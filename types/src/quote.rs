//! Payloads exchanged with the routing API and the gas oracle.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::{ChainId, Slippage, SwapDirection, TokenId};

/// A token amount in base units, as the routing API reports it.
///
/// `decimals` is optional because the API omits it on malformed responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub chain_id: ChainId,
    pub token_address: Address,
    #[serde(default)]
    pub is_native: bool,
    pub amount: U256,
    pub decimals: Option<u8>,
}

impl Payment {
    #[must_use]
    pub fn new(token: TokenId, amount: U256, decimals: u8) -> Self {
        Self {
            chain_id: token.chain_id,
            token_address: token.address,
            is_native: false,
            amount,
            decimals: Some(decimals),
        }
    }

    #[must_use]
    pub fn native(mut self) -> Self {
        self.is_native = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvmTransaction {
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub value: U256,
}

/// Routing API response for a prospective bridge or swap.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quote {
    pub token_payment: Option<Payment>,
    pub amount_out: Option<Payment>,
    pub application_fee: Option<Payment>,
    pub bridge_fee: Option<Payment>,
    pub protocol_fee: Option<Payment>,
    pub exchange_rate: Option<f64>,
    pub estimated_tx_time_seconds: Option<f64>,
    /// Fraction, not percent: `0.02` is two percent.
    pub estimated_price_impact: Option<f64>,
    pub tx: Option<EvmTransaction>,
}

impl Quote {
    /// Chain the output lands on, when the quote says.
    #[must_use]
    pub fn amount_out_chain(&self) -> Option<ChainId> {
        self.amount_out.as_ref().map(|payment| payment.chain_id)
    }

    /// Application, bridge and protocol fees added together.
    #[must_use]
    pub fn total_fee_amount(&self) -> U256 {
        [&self.application_fee, &self.bridge_fee, &self.protocol_fee]
            .into_iter()
            .flatten()
            .fold(U256::ZERO, |acc, fee| acc.saturating_add(fee.amount))
    }
}

/// Gas oracle output. Either part may be missing when the oracle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GasEstimate {
    pub gas_units: Option<u64>,
    pub max_fee_per_gas: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeId {
    /// LayerZero omnichain fungible token bridge.
    Oft,
}

/// Everything the routing API needs to price a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub sender: Address,
    pub receiver: Option<Address>,
    pub source: TokenId,
    pub destination: TokenId,
    pub amount: U256,
    pub direction: SwapDirection,
    pub slippage: Slippage,
    pub bridge_id: Option<BridgeId>,
}
