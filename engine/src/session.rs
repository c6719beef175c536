//! The portal session: one [`Portal`] driven by user actions, wallet changes
//! and collaborator results.
//!
//! Mutation is synchronous and happens only on the session's task. Network
//! work runs as [`PendingRefresh`] futures that own everything they need, so
//! a refresh never borrows the portal while it waits. Results come back as
//! [`QuoteResolution`]s and are dropped when their ticket is stale.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use portal_config::ResolvedConfig;
use portal_core::{
    BridgeError, CatalogError, Generation, Portal, SelectError, SharedCatalog, SharedClassifier,
    TabError, TransactionFigures, WalletContext, check_balance, classify_gas_failure,
    classify_quote_failure, total_native_fees,
};
use portal_types::{
    Address, EvmTransaction, GasEstimate, InputSide, NATIVE_TOKEN_ADDRESS, PortalMode, Quote,
    QuoteRequest, SlippageError, TokenAmount, TokenId, TokenInfo, TokenSelection, U256,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::collaborators::{CollaboratorError, Collaborators};
use crate::debounce::Debouncer;
use crate::generation::Ticket;

/// Everything a user can do to the portal.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SelectSource(TokenId),
    SelectDestination(TokenId),
    Flip,
    SourceAmount(String),
    DestinationAmount(String),
    /// Fill the source with the given wallet balance.
    MaxOut(TokenAmount),
    Slippage(f64),
    ResetSlippage,
    Mode(PortalMode),
    LocationHash(String),
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("token {0} is not in the catalog")]
    UnknownToken(TokenId),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error(transparent)]
    Tab(#[from] TabError),
    #[error(transparent)]
    Slippage(#[from] SlippageError),
}

/// Collaborator answers for one quote request.
#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub quote: Quote,
    pub gas: GasEstimate,
    pub gas_token_usd_price: Option<f64>,
    pub source_usd_price: Option<f64>,
    pub destination_usd_price: Option<f64>,
    pub native_balance: Option<U256>,
    pub token_balance: Option<U256>,
    /// Classified gas estimation failure, or a pending approval.
    pub gas_error: Option<BridgeError>,
}

#[derive(Debug, Clone)]
pub struct QuoteResolution {
    pub ticket: Ticket,
    pub outcome: Result<QuoteOutcome, BridgeError>,
}

/// A quote refresh detached from the session.
#[derive(Debug, Clone)]
pub struct PendingRefresh {
    ticket: Ticket,
    request: QuoteRequest,
    owner: Option<Address>,
    source: TokenInfo,
    destination: TokenId,
}

impl PendingRefresh {
    #[must_use]
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    #[must_use]
    pub fn request(&self) -> &QuoteRequest {
        &self.request
    }

    /// Ask every collaborator in turn. Errors and timeouts are not retried.
    pub async fn resolve(self, collaborators: &Collaborators) -> QuoteResolution {
        let ticket = self.ticket;
        let quote = match collaborators.quotes.fetch_quote(&self.request).await {
            Ok(quote) => quote,
            Err(err) => {
                let error = classify_quote_failure(err.message());
                return QuoteResolution {
                    ticket,
                    outcome: Err(error),
                };
            }
        };

        let chain = self.source.chain_id;
        let (native_balance, token_balance) = self.read_balances(collaborators).await;

        let max_fee_per_gas = match collaborators.gas.max_fee_per_gas(chain).await {
            Ok(fee) => Some(fee),
            Err(err) => {
                tracing::debug!(%err, %chain, "Max fee unavailable; using fallback");
                None
            }
        };
        let mut gas_units = None;
        let mut gas_error = None;
        if let Some(tx) = &quote.tx {
            match collaborators
                .gas
                .estimate_gas(chain, self.request.sender, tx)
                .await
            {
                Ok(units) => gas_units = Some(units),
                Err(err) => {
                    gas_error = self.gas_failure(collaborators, &quote, tx, &err).await;
                }
            }
        }

        let gas_token_usd_price =
            usd_price(collaborators, TokenId::new(chain, NATIVE_TOKEN_ADDRESS)).await;
        let source_usd_price = usd_price(collaborators, self.source.id()).await;
        let destination_usd_price = usd_price(collaborators, self.destination).await;

        QuoteResolution {
            ticket,
            outcome: Ok(QuoteOutcome {
                quote,
                gas: GasEstimate {
                    gas_units,
                    max_fee_per_gas,
                },
                gas_token_usd_price,
                source_usd_price,
                destination_usd_price,
                native_balance,
                token_balance,
                gas_error,
            }),
        }
    }

    async fn read_balances(&self, collaborators: &Collaborators) -> (Option<U256>, Option<U256>) {
        let Some(owner) = self.owner else {
            return (None, None);
        };
        let native = match collaborators
            .balances
            .native_balance(owner, self.source.chain_id)
            .await
        {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::debug!(%err, "Native balance unavailable");
                None
            }
        };
        if self.source.address == NATIVE_TOKEN_ADDRESS {
            return (native, None);
        }
        let token = match collaborators
            .balances
            .token_balance(owner, self.source.id())
            .await
        {
            Ok(balance) => Some(balance),
            Err(err) => {
                tracing::debug!(%err, token = %self.source.id(), "Token balance unavailable");
                None
            }
        };
        (native, token)
    }

    /// A failed estimate is either a funds problem or a missing approval.
    async fn gas_failure(
        &self,
        collaborators: &Collaborators,
        quote: &Quote,
        tx: &EvmTransaction,
        err: &CollaboratorError,
    ) -> Option<BridgeError> {
        if let Some(error) = classify_gas_failure(err.message()) {
            return Some(error);
        }
        let owner = self.owner?;
        if self.source.address == NATIVE_TOKEN_ADDRESS {
            return None;
        }
        let amount = quote
            .token_payment
            .as_ref()
            .map_or(self.request.amount, |payment| payment.amount);
        match collaborators
            .allowances
            .is_approval_needed(owner, self.source.id(), tx.to, amount)
            .await
        {
            Ok(true) => Some(BridgeError::TokenApprovalRequired),
            Ok(false) => {
                tracing::debug!(%err, "Gas estimation failed with allowance in place");
                None
            }
            Err(allowance_err) => {
                tracing::debug!(%allowance_err, "Allowance check failed");
                None
            }
        }
    }
}

async fn usd_price(collaborators: &Collaborators, token: TokenId) -> Option<f64> {
    match collaborators.prices.usd_price(token).await {
        Ok(price) => price,
        Err(err) => {
            tracing::debug!(%err, %token, "USD price unavailable");
            None
        }
    }
}

/// What a renderer needs after each event.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSnapshot {
    pub mode: PortalMode,
    pub available_modes: Vec<PortalMode>,
    pub selected_index: usize,
    pub source: TokenSelection,
    pub destination: TokenSelection,
    pub figures: TransactionFigures,
    /// Slippage above the default tolerance.
    pub slippage_high: bool,
    pub wallet: WalletContext,
    pub action_label: String,
    pub action_disabled: bool,
    pub notice: Option<&'static str>,
    pub bridge_error: Option<BridgeError>,
    pub generation: Generation,
    pub refreshing: bool,
}

#[derive(Debug)]
pub struct PortalSession {
    portal: Portal,
    collaborators: Collaborators,
    debouncer: Debouncer,
    in_flight: Option<Ticket>,
}

impl PortalSession {
    #[must_use]
    pub fn new(portal: Portal, collaborators: Collaborators, debounce: Duration) -> Self {
        Self {
            portal,
            collaborators,
            debouncer: Debouncer::new(debounce),
            in_flight: None,
        }
    }

    pub fn from_config(
        config: &ResolvedConfig,
        catalog: SharedCatalog,
        stable: SharedClassifier,
        collaborators: Collaborators,
    ) -> Result<Self, CatalogError> {
        let portal = Portal::new(config, catalog, stable)?;
        Ok(Self::new(portal, collaborators, config.debounce))
    }

    #[must_use]
    pub fn portal(&self) -> &Portal {
        &self.portal
    }

    #[must_use]
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    #[must_use]
    pub fn into_portal(self) -> Portal {
        self.portal
    }

    /// Apply one user action. Any change that invalidates the quote restarts
    /// the debounce countdown.
    pub fn handle(&mut self, action: UserAction) -> Result<(), ActionError> {
        let before = self.portal.generation();
        let result = self.apply_action(action);
        if self.portal.generation() != before {
            self.debouncer.arm();
        }
        result
    }

    fn apply_action(&mut self, action: UserAction) -> Result<(), ActionError> {
        match action {
            UserAction::SelectSource(id) => {
                let token = self.find(id)?;
                self.portal.select_source_token(token)?;
            }
            UserAction::SelectDestination(id) => {
                let token = self.find(id)?;
                self.portal.select_destination_token(token)?;
            }
            UserAction::Flip => self.portal.swap_source_destination()?,
            UserAction::SourceAmount(raw) => {
                self.portal.set_source_amount(&raw);
            }
            UserAction::DestinationAmount(raw) => {
                self.portal.set_destination_amount(&raw);
            }
            UserAction::MaxOut(balance) => self.portal.max_out_source(&balance),
            UserAction::Slippage(percent) => {
                self.portal.set_slippage(percent)?;
            }
            UserAction::ResetSlippage => self.portal.reset_slippage(),
            UserAction::Mode(mode) => self.portal.request_mode(mode)?,
            UserAction::LocationHash(hash) => self.portal.apply_location_hash(&hash),
            UserAction::DismissNotice => {
                self.portal.take_notice();
            }
        }
        Ok(())
    }

    fn find(&self, id: TokenId) -> Result<TokenInfo, ActionError> {
        self.portal
            .catalog()
            .find(&id)
            .ok_or(ActionError::UnknownToken(id))
    }

    pub fn on_wallet_changed(&mut self, wallet: WalletContext) {
        let before = self.portal.generation();
        self.portal.on_wallet_changed(wallet);
        if self.portal.generation() != before {
            self.debouncer.arm();
        }
    }

    /// Capture the current request, or `None` when there is nothing to quote.
    ///
    /// A disconnected wallet quotes from the zero address and skips balance
    /// and allowance checks.
    pub fn begin_refresh(&mut self) -> Option<PendingRefresh> {
        let owner = self.portal.wallet().address;
        let request = self.portal.quote_request(owner.unwrap_or(Address::ZERO))?;
        let ticket = Ticket::issue(&self.portal);
        self.in_flight = Some(ticket);
        tracing::debug!(
            generation = ticket.generation().value(),
            source = %request.source,
            destination = %request.destination,
            "Requesting quote"
        );
        Some(PendingRefresh {
            ticket,
            request,
            owner,
            source: self.portal.source().token.clone(),
            destination: self.portal.destination().token.id(),
        })
    }

    /// Quote immediately, skipping the debounce countdown. Returns `false`
    /// when there was nothing to quote.
    pub async fn refresh_now(&mut self) -> bool {
        self.debouncer.disarm();
        let Some(pending) = self.begin_refresh() else {
            return false;
        };
        let resolution = pending.resolve(&self.collaborators).await;
        self.apply(resolution)
    }

    /// Fold a resolution into the portal. Returns `false` when it was stale.
    pub fn apply(&mut self, resolution: QuoteResolution) -> bool {
        let QuoteResolution { ticket, outcome } = resolution;
        if !ticket.is_current(&self.portal) {
            tracing::debug!(
                stale = ticket.generation().value(),
                current = self.portal.generation().value(),
                "Discarding stale quote"
            );
            return false;
        }
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(%error, "Quote failed");
                self.portal.clear_quote_outputs();
                self.portal.set_bridge_error(Some(error));
                return true;
            }
        };

        if self
            .portal
            .apply_quote(&outcome.quote, &outcome.gas, outcome.gas_token_usd_price)
            .is_err()
        {
            return true;
        }
        self.portal
            .set_amount_usd(InputSide::Source, outcome.source_usd_price);
        self.portal
            .set_amount_usd(InputSide::Destination, outcome.destination_usd_price);

        let balance_error = outcome.quote.token_payment.as_ref().and_then(|payment| {
            let fees = total_native_fees(&outcome.quote, self.portal.figures().gas_fee_wei);
            check_balance(payment, fees, outcome.native_balance, outcome.token_balance).err()
        });
        self.portal
            .set_bridge_error(balance_error.or(outcome.gas_error));
        true
    }

    #[must_use]
    pub fn snapshot(&self) -> PortalSnapshot {
        let portal = &self.portal;
        let gate = portal.action_gate();
        PortalSnapshot {
            mode: portal.mode(),
            available_modes: portal.available_modes().to_vec(),
            selected_index: portal.selected_index(),
            source: portal.source().clone(),
            destination: portal.destination().clone(),
            figures: portal.figures().clone(),
            slippage_high: portal.figures().slippage.is_high(),
            wallet: portal.wallet(),
            action_label: gate.label(),
            action_disabled: gate.is_disabled(),
            notice: portal.notice().map(|notice| notice.message()),
            bridge_error: portal.bridge_error(),
            generation: portal.generation(),
            refreshing: self
                .in_flight
                .is_some_and(|ticket| ticket.is_current(portal)),
        }
    }

    /// Event loop. Runs until the action channel closes, publishing a
    /// snapshot after every handled event.
    pub async fn run(
        mut self,
        mut actions: mpsc::Receiver<UserAction>,
        mut wallet: watch::Receiver<WalletContext>,
        snapshots: watch::Sender<PortalSnapshot>,
    ) -> Self {
        let mut in_flight: FuturesUnordered<BoxFuture<'static, QuoteResolution>> =
            FuturesUnordered::new();
        let mut wallet_open = true;

        let initial = *wallet.borrow_and_update();
        self.on_wallet_changed(initial);
        snapshots.send_replace(self.snapshot());

        loop {
            tokio::select! {
                action = actions.recv() => {
                    let Some(action) = action else {
                        break;
                    };
                    if let Err(err) = self.handle(action) {
                        tracing::warn!(%err, "Action rejected");
                    }
                }
                changed = wallet.changed(), if wallet_open => {
                    if changed.is_err() {
                        tracing::debug!("Wallet channel closed");
                        wallet_open = false;
                        continue;
                    }
                    let context = *wallet.borrow_and_update();
                    self.on_wallet_changed(context);
                }
                () = self.debouncer.wait(), if self.debouncer.is_armed() => {
                    self.debouncer.disarm();
                    if let Some(pending) = self.begin_refresh() {
                        let collaborators = self.collaborators.clone();
                        in_flight.push(Box::pin(async move { pending.resolve(&collaborators).await }));
                    }
                }
                Some(resolution) = in_flight.next(), if !in_flight.is_empty() => {
                    self.apply(resolution);
                }
            }
            snapshots.send_replace(self.snapshot());
        }

        self
    }
}
