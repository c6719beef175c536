//! In-process collaborators priced from the token list.
//!
//! Nothing here touches the network. Quotes convert at list prices, gas uses
//! per-chain constants and every wallet holds a fixed stock of each token.

use std::collections::HashMap;
use std::sync::Arc;

use portal_config::TokenList;
use portal_engine::{
    AllowanceChecker, BalanceReader, CollabFut, CollaboratorError, Collaborators, GasOracle,
    PriceOracle, QuoteService,
};
use portal_types::format::units_to_f64;
use portal_types::{
    Address, ChainId, EvmTransaction, NATIVE_TOKEN_ADDRESS, Payment, Quote, QuoteRequest,
    SwapDirection, TokenAmount, TokenId, U256,
};

/// Fraction of the output kept by the simulated router.
const ROUTER_FEE: f64 = 0.003;
/// Flat cross-chain messaging fee, in wei of the source chain's gas token.
const BRIDGE_FEE_WEI: u64 = 100_000_000_000_000;
const SWAP_SECONDS: f64 = 15.0;
const BRIDGE_SECONDS: f64 = 90.0;
const GAS_UNITS: u64 = 180_000;
const NATIVE_STOCK: u64 = 10;
const TOKEN_STOCK: u64 = 5_000;

fn router() -> Address {
    Address::repeat_byte(0x5e)
}

#[derive(Debug, Clone, Copy)]
struct Listing {
    decimals: u8,
    price_usd: Option<f64>,
}

/// Token facts shared by the simulated collaborators.
#[derive(Debug, Default)]
pub struct Listings {
    tokens: HashMap<TokenId, Listing>,
}

impl Listings {
    #[must_use]
    pub fn from_list(list: &TokenList) -> Self {
        let tokens = list
            .tokens
            .iter()
            .map(|token| {
                let id = token.id();
                (
                    id,
                    Listing {
                        decimals: token.decimals,
                        price_usd: list.price_usd(id),
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    fn decimals(&self, id: TokenId) -> u8 {
        self.tokens.get(&id).map_or(18, |listing| listing.decimals)
    }

    fn price(&self, id: TokenId) -> Option<f64> {
        self.tokens.get(&id).and_then(|listing| listing.price_usd)
    }
}

fn to_base_units(value: f64, decimals: u8) -> Option<U256> {
    let text = format!("{value:.prec$}", prec = usize::from(decimals));
    TokenAmount::sanitize(&text, decimals)
        .to_base_units(decimals)
        .ok()
}

pub struct SimulatedQuoter {
    listings: Arc<Listings>,
}

impl SimulatedQuoter {
    #[must_use]
    pub fn new(listings: Arc<Listings>) -> Self {
        Self { listings }
    }

    fn quote(&self, request: &QuoteRequest) -> Result<Quote, CollaboratorError> {
        let no_price =
            |id: TokenId| CollaboratorError::failed("quote", format!("no price for {id}"));
        let source_price = self
            .listings
            .price(request.source)
            .ok_or_else(|| no_price(request.source))?;
        let destination_price = self
            .listings
            .price(request.destination)
            .ok_or_else(|| no_price(request.destination))?;
        let source_decimals = self.listings.decimals(request.source);
        let destination_decimals = self.listings.decimals(request.destination);
        let rate = source_price / destination_price * (1.0 - ROUTER_FEE);

        let (amount_in, amount_out) = match request.direction {
            SwapDirection::ExactAmountIn => {
                let input = units_to_f64(request.amount, source_decimals);
                let output = to_base_units(input * rate, destination_decimals);
                (Some(request.amount), output)
            }
            SwapDirection::ExactAmountOut => {
                let output = units_to_f64(request.amount, destination_decimals);
                let input = to_base_units(output / rate, source_decimals);
                (input, Some(request.amount))
            }
        };
        let (Some(amount_in), Some(amount_out)) = (amount_in, amount_out) else {
            return Err(CollaboratorError::failed("quote", "amount out of range"));
        };

        let mut payment = Payment::new(request.source, amount_in, source_decimals);
        if request.source.address == NATIVE_TOKEN_ADDRESS {
            payment = payment.native();
        }
        let cross_chain = request.source.chain_id != request.destination.chain_id;
        let bridge_fee = cross_chain.then(|| {
            Payment::new(
                TokenId::new(request.source.chain_id, NATIVE_TOKEN_ADDRESS),
                U256::from(BRIDGE_FEE_WEI),
                18,
            )
            .native()
        });

        Ok(Quote {
            token_payment: Some(payment),
            amount_out: Some(Payment::new(
                request.destination,
                amount_out,
                destination_decimals,
            )),
            bridge_fee,
            exchange_rate: Some(rate),
            estimated_tx_time_seconds: Some(if cross_chain {
                BRIDGE_SECONDS
            } else {
                SWAP_SECONDS
            }),
            estimated_price_impact: Some(ROUTER_FEE),
            tx: Some(EvmTransaction {
                to: router(),
                value: if request.source.address == NATIVE_TOKEN_ADDRESS {
                    amount_in
                } else {
                    U256::ZERO
                },
                ..EvmTransaction::default()
            }),
            ..Quote::default()
        })
    }
}

impl QuoteService for SimulatedQuoter {
    fn fetch_quote<'a>(&'a self, request: &'a QuoteRequest) -> CollabFut<'a, Quote> {
        Box::pin(async move { self.quote(request) })
    }
}

pub struct SimulatedGas;

impl SimulatedGas {
    fn max_fee_wei(chain: ChainId) -> u64 {
        match chain {
            ChainId::ETHEREUM => 20_000_000_000,
            ChainId::ARBITRUM => 100_000_000,
            _ => 25_000_000_000,
        }
    }
}

impl GasOracle for SimulatedGas {
    fn estimate_gas<'a>(
        &'a self,
        _chain: ChainId,
        _from: Address,
        _tx: &'a EvmTransaction,
    ) -> CollabFut<'a, u64> {
        Box::pin(async { Ok(GAS_UNITS) })
    }

    fn max_fee_per_gas(&self, chain: ChainId) -> CollabFut<'_, U256> {
        let fee = U256::from(Self::max_fee_wei(chain));
        Box::pin(async move { Ok(fee) })
    }
}

pub struct ListPrices {
    listings: Arc<Listings>,
}

impl PriceOracle for ListPrices {
    fn usd_price(&self, token: TokenId) -> CollabFut<'_, Option<f64>> {
        Box::pin(async move { Ok(self.listings.price(token)) })
    }
}

/// Allowances are always in place.
pub struct Preapproved;

impl AllowanceChecker for Preapproved {
    fn is_approval_needed(
        &self,
        _owner: Address,
        _token: TokenId,
        _spender: Address,
        _amount: U256,
    ) -> CollabFut<'_, bool> {
        Box::pin(async { Ok(false) })
    }
}

/// Every wallet holds the same stock of every token.
pub struct StockedWallet {
    listings: Arc<Listings>,
}

impl StockedWallet {
    fn whole_units(amount: u64, decimals: u8) -> U256 {
        U256::from(amount).saturating_mul(U256::from(10u64).pow(U256::from(decimals)))
    }
}

impl BalanceReader for StockedWallet {
    fn native_balance(&self, _owner: Address, _chain: ChainId) -> CollabFut<'_, U256> {
        Box::pin(async { Ok(Self::whole_units(NATIVE_STOCK, 18)) })
    }

    fn token_balance(&self, _owner: Address, token: TokenId) -> CollabFut<'_, U256> {
        let decimals = self.listings.decimals(token);
        Box::pin(async move { Ok(Self::whole_units(TOKEN_STOCK, decimals)) })
    }
}

#[must_use]
pub fn collaborators(list: &TokenList) -> Collaborators {
    let listings = Arc::new(Listings::from_list(list));
    Collaborators {
        quotes: Arc::new(SimulatedQuoter::new(Arc::clone(&listings))),
        gas: Arc::new(SimulatedGas),
        prices: Arc::new(ListPrices {
            listings: Arc::clone(&listings),
        }),
        allowances: Arc::new(Preapproved),
        balances: Arc::new(StockedWallet { listings }),
    }
}
