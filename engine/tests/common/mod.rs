//! Shared fixtures: scripted collaborators and a portal over the builtin
//! token list.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use portal_config::{ResolvedConfig, TokenList};
use portal_engine::portal_core::{Portal, StableSet, StaticCatalog, WalletContext};
use portal_engine::{
    AllowanceChecker, BalanceReader, CollabFut, CollaboratorError, Collaborators, GasOracle,
    PortalSession, PriceOracle, QuoteService,
};
use portal_types::{
    Address, ChainId, EvmTransaction, NATIVE_TOKEN_ADDRESS, Payment, Quote, QuoteRequest,
    SwapDirection, TokenId, U256,
};

/// Destination units per source unit.
pub const RATE: u64 = 3;
pub const ONE: u128 = 1_000_000_000_000_000_000;
pub const GAS_UNITS: u64 = 100_000;
/// 10 gwei.
pub const MAX_FEE: u64 = 10_000_000_000;
pub const DEBOUNCE: Duration = Duration::from_millis(300);

pub fn router() -> Address {
    Address::with_last_byte(0xaa)
}

pub fn wallet() -> Address {
    Address::with_last_byte(0x07)
}

pub fn connected(chain: ChainId) -> WalletContext {
    WalletContext::connected(wallet(), chain)
}

pub fn units(amount: u128) -> U256 {
    U256::from(amount)
}

/// Quotes at a fixed rate, logging every request.
pub struct ScriptedQuoter {
    pub log: Arc<Mutex<Vec<QuoteRequest>>>,
    failure: Option<String>,
    delay: Duration,
}

impl ScriptedQuoter {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn requests(&self) -> Vec<QuoteRequest> {
        self.log.lock().expect("log lock").clone()
    }
}

pub fn quote_for(request: &QuoteRequest) -> Quote {
    let rate = U256::from(RATE);
    let (amount_in, amount_out) = match request.direction {
        SwapDirection::ExactAmountIn => (request.amount, request.amount * rate),
        SwapDirection::ExactAmountOut => (request.amount / rate, request.amount),
    };
    let mut payment = Payment::new(request.source, amount_in, 18);
    if request.source.address == NATIVE_TOKEN_ADDRESS {
        payment = payment.native();
    }
    Quote {
        token_payment: Some(payment),
        amount_out: Some(Payment::new(request.destination, amount_out, 18)),
        exchange_rate: Some(RATE as f64),
        estimated_tx_time_seconds: Some(30.0),
        tx: Some(EvmTransaction {
            to: router(),
            ..EvmTransaction::default()
        }),
        ..Quote::default()
    }
}

impl QuoteService for ScriptedQuoter {
    fn fetch_quote<'a>(&'a self, request: &'a QuoteRequest) -> CollabFut<'a, Quote> {
        let log = Arc::clone(&self.log);
        let failure = self.failure.clone();
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            log.lock().expect("log lock").push(request.clone());
            match failure {
                Some(message) => Err(CollaboratorError::failed("quote", message)),
                None => Ok(quote_for(request)),
            }
        })
    }
}

pub struct FixedGas {
    pub estimate: Result<u64, String>,
}

impl FixedGas {
    pub fn ok() -> Self {
        Self {
            estimate: Ok(GAS_UNITS),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            estimate: Err(message.to_string()),
        }
    }
}

impl GasOracle for FixedGas {
    fn estimate_gas<'a>(
        &'a self,
        _chain: ChainId,
        _from: Address,
        _tx: &'a EvmTransaction,
    ) -> CollabFut<'a, u64> {
        let estimate = self
            .estimate
            .clone()
            .map_err(|message| CollaboratorError::failed("gas", message));
        Box::pin(async move { estimate })
    }

    fn max_fee_per_gas(&self, _chain: ChainId) -> CollabFut<'_, U256> {
        Box::pin(async { Ok(U256::from(MAX_FEE)) })
    }
}

pub struct FixedPrice(pub Option<f64>);

impl PriceOracle for FixedPrice {
    fn usd_price(&self, _token: TokenId) -> CollabFut<'_, Option<f64>> {
        let price = self.0;
        Box::pin(async move { Ok(price) })
    }
}

pub struct FixedAllowance(pub bool);

impl AllowanceChecker for FixedAllowance {
    fn is_approval_needed(
        &self,
        _owner: Address,
        _token: TokenId,
        _spender: Address,
        _amount: U256,
    ) -> CollabFut<'_, bool> {
        let needed = self.0;
        Box::pin(async move { Ok(needed) })
    }
}

pub struct FixedBalances {
    pub native: U256,
    pub token: U256,
}

impl FixedBalances {
    pub fn plenty() -> Self {
        Self {
            native: units(100 * ONE),
            token: units(100 * ONE),
        }
    }
}

impl BalanceReader for FixedBalances {
    fn native_balance(&self, _owner: Address, _chain: ChainId) -> CollabFut<'_, U256> {
        let balance = self.native;
        Box::pin(async move { Ok(balance) })
    }

    fn token_balance(&self, _owner: Address, _token: TokenId) -> CollabFut<'_, U256> {
        let balance = self.token;
        Box::pin(async move { Ok(balance) })
    }
}

pub struct Harness {
    pub quoter: Arc<ScriptedQuoter>,
    pub gas: FixedGas,
    pub balances: FixedBalances,
    pub approval_needed: bool,
    pub price: Option<f64>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            quoter: Arc::new(ScriptedQuoter::new()),
            gas: FixedGas::ok(),
            balances: FixedBalances::plenty(),
            approval_needed: false,
            price: Some(2000.0),
        }
    }

    pub fn with_quoter(mut self, quoter: ScriptedQuoter) -> Self {
        self.quoter = Arc::new(quoter);
        self
    }

    pub fn with_gas(mut self, gas: FixedGas) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_balances(mut self, balances: FixedBalances) -> Self {
        self.balances = balances;
        self
    }

    pub fn with_approval_needed(mut self) -> Self {
        self.approval_needed = true;
        self
    }

    /// Returns the collaborators and a handle on the quoter's log.
    pub fn build(self) -> (Collaborators, Arc<ScriptedQuoter>) {
        let collaborators = Collaborators {
            quotes: Arc::clone(&self.quoter) as Arc<dyn QuoteService>,
            gas: Arc::new(self.gas),
            prices: Arc::new(FixedPrice(self.price)),
            allowances: Arc::new(FixedAllowance(self.approval_needed)),
            balances: Arc::new(self.balances),
        };
        (collaborators, self.quoter)
    }
}

pub fn builtin_portal() -> Portal {
    let list = TokenList::builtin().expect("builtin token list");
    Portal::new(
        &ResolvedConfig::default(),
        Arc::new(StaticCatalog::from_list(&list)),
        Arc::new(StableSet::from_list(&list)),
    )
    .expect("canonical pairs resolve")
}

pub fn session(collaborators: Collaborators) -> PortalSession {
    PortalSession::new(builtin_portal(), collaborators, DEBOUNCE)
}
