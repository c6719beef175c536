//! Fees, slippage and warnings derived from a quote and a gas estimate.

use portal_types::format::{
    self, EMPTY_CURRENCY, format_usd, is_high_price_impact, price_impact_warning, time_warning,
};
use portal_types::{ChainId, GasEstimate, Quote, Slippage, SlippageError, TokenInfo, U256};
use thiserror::Error;

/// Gas units assumed for a cross-chain transfer when estimation is unavailable.
pub const FALLBACK_BRIDGE_GAS_UNITS: u64 = 700_000;
/// Gas units assumed for a same-chain swap when estimation is unavailable.
pub const FALLBACK_SWAP_GAS_UNITS: u64 = 50_000;
/// 5 gwei.
pub const FALLBACK_MAX_FEE_PER_GAS_WEI: u64 = 5_000_000_000;

#[derive(Debug, Error)]
pub enum AggregateError {
    /// The routing API omitted payment decimals or the exchange rate.
    #[error("quote is missing payment decimals or exchange rate")]
    IncompleteQuote,
    #[error("no gas token known for chain {0}")]
    GasTokenUnknown(ChainId),
    #[error("failed to format quote amount: {0}")]
    Units(#[from] format::UnitsError),
}

/// Displayed transaction figures. Mutated only through the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFigures {
    /// Quote fees in source-token units.
    pub application_fee: f64,
    pub application_fee_usd: f64,
    /// Gas cost in gas-token units.
    pub gas_fee: f64,
    pub gas_fee_usd: f64,
    pub gas_fee_wei: U256,
    pub slippage: Slippage,
    /// Slippage to restore once the pair stops being stable.
    pub non_stable_slippage: Slippage,
    pub time_warning: Option<String>,
    pub price_impact_warning: Option<String>,
    pub estimated_tx_time_seconds: Option<u64>,
    pub is_high_impact: bool,
    /// USD price of the source chain's gas token; zero when unknown.
    pub gas_token_usd_price: f64,
}

impl Default for TransactionFigures {
    fn default() -> Self {
        Self {
            application_fee: 0.0,
            application_fee_usd: 0.0,
            gas_fee: 0.0,
            gas_fee_usd: 0.0,
            gas_fee_wei: U256::ZERO,
            slippage: Slippage::DEFAULT,
            non_stable_slippage: Slippage::DEFAULT,
            time_warning: None,
            price_impact_warning: None,
            estimated_tx_time_seconds: None,
            is_high_impact: false,
            gas_token_usd_price: 0.0,
        }
    }
}

fn usd_or_empty(value: f64) -> String {
    if value > 0.0 {
        format_usd(value)
    } else {
        EMPTY_CURRENCY.to_string()
    }
}

impl TransactionFigures {
    #[must_use]
    pub fn gas_fee_usd_display(&self) -> String {
        usd_or_empty(self.gas_fee_usd)
    }

    #[must_use]
    pub fn application_fee_usd_display(&self) -> String {
        usd_or_empty(self.application_fee_usd)
    }

    #[must_use]
    pub fn total_fee_usd_display(&self) -> String {
        usd_or_empty(self.application_fee_usd + self.gas_fee_usd)
    }
}

/// Human amounts read back from a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteAmounts {
    pub amount_in: String,
    pub amount_out: String,
}

#[derive(Debug, Default)]
pub struct TransactionDataAggregator {
    figures: TransactionFigures,
    /// Last successful gas units estimate, so displayed fees do not jump
    /// back to the fallback while a refreshed estimate is pending.
    last_gas_units: Option<u64>,
}

impl TransactionDataAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn figures(&self) -> &TransactionFigures {
        &self.figures
    }

    #[must_use]
    pub fn slippage(&self) -> Slippage {
        self.figures.slippage
    }

    /// User-chosen slippage. Also becomes the value restored after a stable pair.
    ///
    /// Out-of-range values are rejected and the stored value is left as is.
    pub fn set_slippage(&mut self, percent: f64) -> Result<Slippage, SlippageError> {
        let slippage = Slippage::new(percent)?;
        self.figures.slippage = slippage;
        self.figures.non_stable_slippage = slippage;
        Ok(slippage)
    }

    pub fn reset_slippage(&mut self) {
        self.figures.slippage = Slippage::DEFAULT;
    }

    /// Apply the stable-pair slippage rule after a token change.
    ///
    /// Entering a stable pair memoizes the current slippage and forces the
    /// stable value; staying stable keeps the memo. Leaving a stable pair
    /// restores the memo when it differs.
    pub fn apply_pair_stability(&mut self, was_stable: bool, now_stable: bool) {
        if now_stable {
            if !was_stable {
                self.figures.non_stable_slippage = self.figures.slippage;
            }
            self.figures.slippage = Slippage::STABLE;
            return;
        }
        if self.figures.slippage != self.figures.non_stable_slippage {
            tracing::debug!(
                restored = %self.figures.non_stable_slippage,
                "Pair no longer stable; restoring slippage"
            );
            self.figures.slippage = self.figures.non_stable_slippage;
        }
    }

    /// Clear fees and warnings. Slippage and the gas token price survive.
    pub fn reset_for_token_change(&mut self) {
        let figures = &mut self.figures;
        figures.application_fee = 0.0;
        figures.application_fee_usd = 0.0;
        figures.gas_fee = 0.0;
        figures.gas_fee_usd = 0.0;
        figures.gas_fee_wei = U256::ZERO;
        figures.time_warning = None;
        figures.price_impact_warning = None;
        figures.estimated_tx_time_seconds = None;
        figures.is_high_impact = false;
    }

    pub fn set_gas_token_usd_price(&mut self, price: Option<f64>) {
        self.figures.gas_token_usd_price = price.filter(|p| p.is_finite() && *p > 0.0).unwrap_or(0.0);
        self.figures.gas_fee_usd = self.figures.gas_fee * self.figures.gas_token_usd_price;
        self.figures.application_fee_usd =
            self.figures.application_fee * self.figures.gas_token_usd_price;
    }

    /// Gas units and max fee with fallbacks applied, multiplied out in wei.
    #[must_use]
    pub fn gas_fee_wei(&self, quote: &Quote, gas: &GasEstimate, source: &TokenInfo) -> U256 {
        let is_bridge = quote.amount_out_chain() != Some(source.chain_id);
        let units = gas.gas_units.or(self.last_gas_units).unwrap_or(if is_bridge {
            FALLBACK_BRIDGE_GAS_UNITS
        } else {
            FALLBACK_SWAP_GAS_UNITS
        });
        let max_fee = gas
            .max_fee_per_gas
            .unwrap_or(U256::from(FALLBACK_MAX_FEE_PER_GAS_WEI));
        U256::from(units).saturating_mul(max_fee)
    }

    /// Recompute every figure from a fresh quote.
    ///
    /// `source` is the token paid with, `gas_decimals` the decimals of the
    /// source chain's gas token. Fees are priced in the gas token.
    pub fn update(
        &mut self,
        quote: &Quote,
        gas: &GasEstimate,
        source: &TokenInfo,
        gas_decimals: u8,
        gas_token_usd_price: Option<f64>,
    ) -> Result<QuoteAmounts, AggregateError> {
        let (Some(payment), Some(amount_out), Some(_rate)) =
            (&quote.token_payment, &quote.amount_out, quote.exchange_rate)
        else {
            return Err(AggregateError::IncompleteQuote);
        };
        let (Some(in_decimals), Some(out_decimals)) = (payment.decimals, amount_out.decimals)
        else {
            return Err(AggregateError::IncompleteQuote);
        };

        let gas_fee_wei = self.gas_fee_wei(quote, gas, source);
        if let Some(units) = gas.gas_units {
            self.last_gas_units = Some(units);
        }

        let fee_decimals = quote
            .application_fee
            .as_ref()
            .and_then(|fee| fee.decimals)
            .unwrap_or(source.decimals);

        let amounts = QuoteAmounts {
            amount_in: format::format_units(payment.amount, in_decimals)?,
            amount_out: format::format_units(amount_out.amount, out_decimals)?,
        };

        self.figures.application_fee = format::units_to_f64(quote.total_fee_amount(), fee_decimals);
        self.figures.gas_fee = format::units_to_f64(gas_fee_wei, gas_decimals);
        self.figures.gas_fee_wei = gas_fee_wei;
        self.set_gas_token_usd_price(gas_token_usd_price);

        let seconds = quote
            .estimated_tx_time_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.ceil() as u64);
        self.figures.estimated_tx_time_seconds = seconds;
        self.figures.time_warning = seconds.and_then(time_warning);

        let impact = quote.estimated_price_impact.filter(|i| *i != 0.0);
        self.figures.price_impact_warning = impact.and_then(price_impact_warning);
        self.figures.is_high_impact = is_high_price_impact(impact);

        Ok(amounts)
    }
}
