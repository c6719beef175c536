//! The portal aggregate: one owned state value behind every user action.
//!
//! All mutation goes through the methods below. Each one leaves the portal in
//! a displayable state; failures fall back to a known-good pair and post a
//! notice instead of aborting.

use std::sync::Arc;

use portal_config::{FeatureFlags, ResolvedConfig, TokenConfig};
use portal_types::format::usd_value;
use portal_types::{
    Address, ChainId, GasEstimate, InputSide, PairMode, PortalMode, Quote, QuoteRequest, Slippage,
    SlippageError, TokenAmount, TokenId, TokenInfo, TokenPair, TokenSelection,
};
use thiserror::Error;

use crate::catalog::{CatalogError, StableClassifier, TokenCatalog};
use crate::errors::{ActionGate, BridgeError};
use crate::figures::{AggregateError, TransactionDataAggregator, TransactionFigures};
use crate::hash::HashRoute;
use crate::notices::{NoticeBoard, PortalNotice};
use crate::request::build_quote_request;
use crate::resolver::{ResolveError, resolve_next_token, resolve_routable_token};
use crate::stash::StashManager;
use crate::tabs::{CanonicalPairs, TabContext, TabError, TabManager};

pub type SharedCatalog = Arc<dyn TokenCatalog + Send + Sync>;
pub type SharedClassifier = Arc<dyn StableClassifier + Send + Sync>;

/// Monotonic counter bumped on every change that invalidates in-flight quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Connected wallet, as last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletContext {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
}

impl WalletContext {
    #[must_use]
    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Wallet chain, only while connected.
    #[must_use]
    pub fn active_chain(&self) -> Option<ChainId> {
        self.address.and(self.chain_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("source and destination cannot be the same token")]
    SameToken,
    #[error("the destination token is fixed by configuration")]
    DestinationLocked,
    #[error("no route from {from} to {destination}")]
    RouteUnavailable { from: TokenId, destination: TokenId },
}

pub struct Portal {
    tabs: TabManager,
    source: TokenSelection,
    destination: TokenSelection,
    aggregator: TransactionDataAggregator,
    has_user_updated_tokens: bool,
    last_changed: InputSide,
    wallet: WalletContext,
    notices: NoticeBoard,
    canonical: CanonicalPairs,
    flags: FeatureFlags,
    supported_chains: Vec<ChainId>,
    destination_address: Option<Address>,
    lock_destination: bool,
    bridge_error: Option<BridgeError>,
    generation: Generation,
    catalog: SharedCatalog,
    stable: SharedClassifier,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("mode", &self.tabs.mode())
            .field("source", &self.source.token.id())
            .field("destination", &self.destination.token.id())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Portal {
    /// Build a portal from resolved configuration.
    ///
    /// Configured default pairs that cannot be used fall back to the
    /// built-in ones with a notice. Fails only when the catalog lacks a
    /// built-in pair.
    pub fn new(
        config: &ResolvedConfig,
        catalog: SharedCatalog,
        stable: SharedClassifier,
    ) -> Result<Self, CatalogError> {
        let (canonical, rejected) = CanonicalPairs::resolve(
            &config.canonical,
            catalog.as_ref(),
            &config.supported_chains,
        )?;
        let tabs = TabManager::new(&config.tabs, &config.flags);
        let initial = canonical.for_mode(tabs.pair_mode()).clone();
        let initial_stable =
            stable.is_pair_stable(&initial.source.id(), &initial.destination.id());

        let mut portal = Self {
            tabs,
            source: TokenSelection::new(initial.source),
            destination: TokenSelection::new(initial.destination),
            aggregator: TransactionDataAggregator::new(),
            has_user_updated_tokens: false,
            last_changed: InputSide::Source,
            wallet: WalletContext::default(),
            notices: NoticeBoard::new(),
            canonical,
            flags: config.flags,
            supported_chains: config.supported_chains.clone(),
            destination_address: config.destination_address,
            lock_destination: config.tokens.lock_destination,
            bridge_error: None,
            generation: Generation::default(),
            catalog,
            stable,
        };
        portal.aggregator.apply_pair_stability(false, initial_stable);
        if !rejected.is_empty() {
            portal.notices.post(PortalNotice::MalformedConfig);
        }
        portal.apply_config_defaults(&config.tokens);
        Ok(portal)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn mode(&self) -> PortalMode {
        self.tabs.mode()
    }

    #[must_use]
    pub fn pair_mode(&self) -> PairMode {
        self.tabs.pair_mode()
    }

    #[must_use]
    pub fn available_modes(&self) -> &[PortalMode] {
        self.tabs.available()
    }

    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.tabs.selected_index()
    }

    #[must_use]
    pub fn stash(&self) -> &StashManager {
        self.tabs.stash()
    }

    #[must_use]
    pub fn source(&self) -> &TokenSelection {
        &self.source
    }

    #[must_use]
    pub fn destination(&self) -> &TokenSelection {
        &self.destination
    }

    #[must_use]
    pub fn pair(&self) -> TokenPair {
        TokenPair::new(self.source.token.clone(), self.destination.token.clone())
    }

    #[must_use]
    pub fn figures(&self) -> &TransactionFigures {
        self.aggregator.figures()
    }

    #[must_use]
    pub fn has_user_updated_tokens(&self) -> bool {
        self.has_user_updated_tokens
    }

    #[must_use]
    pub fn last_changed(&self) -> InputSide {
        self.last_changed
    }

    #[must_use]
    pub fn wallet(&self) -> WalletContext {
        self.wallet
    }

    #[must_use]
    pub fn notice(&self) -> Option<&PortalNotice> {
        self.notices.current()
    }

    pub fn take_notice(&mut self) -> Option<PortalNotice> {
        self.notices.take()
    }

    #[must_use]
    pub fn canonical(&self) -> &CanonicalPairs {
        &self.canonical
    }

    #[must_use]
    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    #[must_use]
    pub fn supported_chains(&self) -> &[ChainId] {
        &self.supported_chains
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn bridge_error(&self) -> Option<BridgeError> {
        self.bridge_error
    }

    #[must_use]
    pub fn catalog(&self) -> SharedCatalog {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn is_pair_stable(&self) -> bool {
        self.stable
            .is_pair_stable(&self.source.token.id(), &self.destination.token.id())
    }

    /// Wallet chain differs from the chain the transaction starts on.
    #[must_use]
    pub fn is_wrong_chain(&self) -> bool {
        self.wallet
            .active_chain()
            .is_some_and(|chain| chain != self.source.token.chain_id)
    }

    #[must_use]
    pub fn action_gate(&self) -> ActionGate {
        ActionGate {
            mode: self.mode(),
            wallet_connected: self.wallet.is_connected(),
            switch_to: self.is_wrong_chain().then_some(self.source.token.chain_id),
            error: self.bridge_error,
            high_impact: self.figures().is_high_impact,
            amounts_empty: !(self.source.amount.is_positive()
                && self.destination.amount.is_positive()),
        }
    }

    // ========================================================================
    // Token selection
    // ========================================================================

    /// User picks a source token.
    ///
    /// In Swap, a token on another chain pulls the destination onto that
    /// chain through the resolver.
    pub fn select_source_token(&mut self, token: TokenInfo) -> Result<(), SelectError> {
        if token.is_same_token(&self.destination.token) {
            return Err(SelectError::SameToken);
        }
        self.has_user_updated_tokens = true;

        if self.mode() == PortalMode::Swap && token.chain_id != self.destination.token.chain_id {
            let pair = match resolve_routable_token(self.catalog.as_ref(), &token.id()) {
                Ok(destination) => TokenPair::new(token, destination),
                Err(err) => self.canonical_after_resolve_failure(&err),
            };
            self.replace_pair(pair);
            return Ok(());
        }

        let pair = TokenPair::new(token, self.destination.token.clone());
        self.replace_pair(pair);
        Ok(())
    }

    /// User picks a destination token.
    pub fn select_destination_token(&mut self, token: TokenInfo) -> Result<(), SelectError> {
        if self.lock_destination {
            return Err(SelectError::DestinationLocked);
        }
        if token.is_same_token(&self.source.token) {
            return Err(SelectError::SameToken);
        }
        let source_id = self.source.token.id();
        let destination_id = token.id();
        let cross_chain_swap =
            self.mode() == PortalMode::Swap && token.chain_id != self.source.token.chain_id;
        if !cross_chain_swap && !self.catalog.is_route_allowed(&source_id, &destination_id) {
            return Err(SelectError::RouteUnavailable {
                from: source_id,
                destination: destination_id,
            });
        }
        self.has_user_updated_tokens = true;

        if cross_chain_swap {
            let pair = match resolve_next_token(self.catalog.as_ref(), &destination_id) {
                Ok(source) => TokenPair::new(source, token),
                Err(err) => self.canonical_after_resolve_failure(&err),
            };
            self.replace_pair(pair);
            return Ok(());
        }

        let pair = TokenPair::new(self.source.token.clone(), token);
        self.replace_pair(pair);
        Ok(())
    }

    /// Flip source and destination, amounts included.
    pub fn swap_source_destination(&mut self) -> Result<(), SelectError> {
        if self.lock_destination {
            return Err(SelectError::DestinationLocked);
        }
        let from = self.destination.token.id();
        let destination = self.source.token.id();
        if !self.catalog.is_route_allowed(&from, &destination) {
            return Err(SelectError::RouteUnavailable { from, destination });
        }
        self.has_user_updated_tokens = true;
        std::mem::swap(&mut self.source, &mut self.destination);
        self.last_changed = self.last_changed.opposite();
        self.reset_for_token_change();
        tracing::debug!(
            source = %self.source.token.id(),
            destination = %self.destination.token.id(),
            "Swapped source and destination"
        );
        Ok(())
    }

    fn canonical_after_resolve_failure(&mut self, err: &ResolveError) -> TokenPair {
        tracing::warn!(%err, "Falling back to canonical pair");
        self.notices.post(PortalNotice::NoTokensFound);
        self.canonical.for_mode(self.pair_mode()).clone()
    }

    /// Install `pair` as the active pair, keeping typed amounts.
    ///
    /// Runs the stable-pair slippage rule, resets derived figures and
    /// invalidates in-flight quotes. A pair equal to the current one is
    /// ignored.
    fn replace_pair(&mut self, pair: TokenPair) {
        if pair.same_tokens_as(&self.pair()) {
            return;
        }
        let was_stable = self.is_pair_stable();
        self.source = self.source.with_token(pair.source);
        self.destination = self.destination.with_token(pair.destination);
        let now_stable = self.is_pair_stable();
        self.aggregator.apply_pair_stability(was_stable, now_stable);
        self.reset_for_token_change();
    }

    /// Clear figures, errors and the amount the user did not type.
    fn reset_for_token_change(&mut self) {
        self.clear_quote_outputs();
        self.bump_generation();
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.next();
    }

    // ========================================================================
    // Amounts and slippage
    // ========================================================================

    pub fn set_source_amount(&mut self, raw: &str) -> &TokenAmount {
        let amount = TokenAmount::sanitize(raw, self.source.token.decimals);
        self.source = self.source.with_amount(amount);
        self.amount_edited(InputSide::Source);
        &self.source.amount
    }

    pub fn set_destination_amount(&mut self, raw: &str) -> &TokenAmount {
        let amount = TokenAmount::sanitize(raw, self.destination.token.decimals);
        self.destination = self.destination.with_amount(amount);
        self.amount_edited(InputSide::Destination);
        &self.destination.amount
    }

    /// Fill the source with the whole wallet balance.
    pub fn max_out_source(&mut self, balance: &TokenAmount) {
        self.source = self.source.with_amount(balance.clone());
        self.amount_edited(InputSide::Source);
    }

    fn amount_edited(&mut self, side: InputSide) {
        self.last_changed = side;
        let edited = match side {
            InputSide::Source => &self.source.amount,
            InputSide::Destination => &self.destination.amount,
        };
        if !edited.is_positive() {
            self.clear_quote_outputs();
        }
        self.bump_generation();
    }

    /// Refresh the USD display string for one side.
    pub fn set_amount_usd(&mut self, side: InputSide, price: Option<f64>) {
        match side {
            InputSide::Source => {
                let usd = usd_value(price, self.source.amount.to_f64());
                self.source = self.source.with_amount_usd(usd);
            }
            InputSide::Destination => {
                let usd = usd_value(price, self.destination.amount.to_f64());
                self.destination = self.destination.with_amount_usd(usd);
            }
        }
    }

    pub fn set_slippage(&mut self, percent: f64) -> Result<Slippage, SlippageError> {
        let slippage = self.aggregator.set_slippage(percent)?;
        self.bump_generation();
        Ok(slippage)
    }

    pub fn reset_slippage(&mut self) {
        self.aggregator.reset_slippage();
        self.bump_generation();
    }

    // ========================================================================
    // Modes
    // ========================================================================

    pub fn request_mode(&mut self, next: PortalMode) -> Result<(), TabError> {
        let current = self.pair();
        let ctx = TabContext {
            pair: &current,
            wallet_chain: self.wallet.active_chain(),
            has_user_updated_tokens: self.has_user_updated_tokens,
            canonical: &self.canonical,
            catalog: self.catalog.as_ref(),
        };
        let Some(transition) = self.tabs.request_mode(next, &ctx)? else {
            return Ok(());
        };
        if let Some(notice) = transition.notice {
            self.notices.post(notice);
        }
        if let Some(pair) = transition.pair {
            self.replace_pair(pair);
        }
        Ok(())
    }

    // ========================================================================
    // Wallet observation
    // ========================================================================

    /// React to a wallet connect, disconnect or chain switch.
    ///
    /// Only the automatic defaults are re-evaluated: the canonical pair on the
    /// default chain, and in Bridge the wallet chain's gas token as source.
    pub fn on_wallet_changed(&mut self, wallet: WalletContext) {
        if wallet == self.wallet {
            return;
        }
        if wallet.address != self.wallet.address {
            self.bump_generation();
        }
        self.wallet = wallet;
        let Some(chain) = wallet.active_chain() else {
            return;
        };

        if !self.has_user_updated_tokens && chain == self.canonical.default_source_chain() {
            let canonical = self.canonical.for_mode(self.pair_mode()).clone();
            tracing::debug!(%chain, "Wallet on default chain; applying canonical pair");
            self.replace_pair(canonical);
            return;
        }

        if self.mode() == PortalMode::Bridge
            && !self.has_user_updated_tokens
            && !self.source.amount.is_positive()
            && self.supported_chains.contains(&chain)
            && chain != self.source.token.chain_id
        {
            match self.catalog.native_token(chain) {
                Ok(native) if !native.is_same_token(&self.destination.token) => {
                    tracing::debug!(%chain, "Defaulting source to wallet chain gas token");
                    let pair = TokenPair::new(native, self.destination.token.clone());
                    self.replace_pair(pair);
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(%err, "No gas token for wallet chain"),
            }
        }
    }

    // ========================================================================
    // Location hash
    // ========================================================================

    /// Apply a `#bridge`, `#swap`, `#onramp` or `#swap/<chain>/<token>` hash.
    ///
    /// Ignored unless hash routing is enabled; malformed hashes are logged.
    pub fn apply_location_hash(&mut self, hash: &str) {
        if !self.flags.use_hash_router {
            tracing::debug!(hash, "Hash routing disabled; ignoring");
            return;
        }
        let route = match HashRoute::parse(hash) {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!(%err, "Ignoring location hash");
                return;
            }
        };
        if let Err(err) = self.request_mode(route.mode) {
            tracing::warn!(%err, "Ignoring location hash");
            return;
        }
        let Some(token_id) = route.token else {
            return;
        };
        if self.mode() != PortalMode::Swap {
            return;
        }
        if !self.supported_chains.contains(&token_id.chain_id) {
            tracing::warn!(
                chain = %token_id.chain_id,
                supported = ?self.supported_chains,
                "URL hash requested an unsupported chain"
            );
            return;
        }
        let Some(token) = self.catalog.find(&token_id) else {
            tracing::warn!(token = %token_id, "URL hash requested an unknown token");
            return;
        };

        if token.chain_id == self.source.token.chain_id {
            if token.is_same_token(&self.source.token) {
                tracing::warn!(token = %token_id, "URL hash token is already the source");
                return;
            }
            let pair = TokenPair::new(self.source.token.clone(), token);
            self.replace_pair(pair);
            return;
        }
        match resolve_next_token(self.catalog.as_ref(), &token_id) {
            Ok(source) => self.replace_pair(TokenPair::new(source, token)),
            Err(err) => tracing::warn!(%err, "No source token for URL hash destination"),
        }
    }

    // ========================================================================
    // Configuration defaults
    // ========================================================================

    fn apply_config_defaults(&mut self, tokens: &TokenConfig) {
        if let Some(default) = &tokens.default_amount {
            match default.side {
                InputSide::Source => {
                    self.source = self.source.with_amount(default.amount.clone());
                }
                InputSide::Destination => {
                    self.destination = self.destination.with_amount(default.amount.clone());
                }
            }
            self.last_changed = default.side;
        }
        if !tokens.has_tokens() {
            return;
        }

        let mode = self.pair_mode();
        if let Err(err) = tokens.validate(
            mode.portal_mode(),
            &self.supported_chains,
            self.canonical.swap_chain(),
        ) {
            tracing::error!(%err, "Malformed token configuration");
            self.malformed_config(mode);
            return;
        }

        let source = tokens.default_source.map(|id| (id, self.catalog.find(&id)));
        let destination = tokens
            .default_destination
            .map(|id| (id, self.catalog.find(&id)));
        for (id, found) in source.iter().chain(destination.iter()) {
            if found.is_none() {
                tracing::error!(token = %id, "Configured token is not in the catalog");
                self.malformed_config(mode);
                return;
            }
        }
        let source = source.and_then(|(_, token)| token);
        let destination = destination.and_then(|(_, token)| token);

        let pair = match (source, destination) {
            (Some(source), Some(destination)) => TokenPair::new(source, destination),
            (Some(source), None) if mode == PairMode::Swap => {
                match resolve_next_token(self.catalog.as_ref(), &source.id()) {
                    Ok(destination) => TokenPair::new(source, destination),
                    Err(err) => {
                        let pair = self.canonical_after_resolve_failure(&err);
                        self.replace_pair(pair);
                        return;
                    }
                }
            }
            (None, Some(destination)) if mode == PairMode::Swap => {
                match resolve_next_token(self.catalog.as_ref(), &destination.id()) {
                    Ok(source) => TokenPair::new(source, destination),
                    Err(err) => {
                        let pair = self.canonical_after_resolve_failure(&err);
                        self.replace_pair(pair);
                        return;
                    }
                }
            }
            (Some(source), None) => TokenPair::new(source, self.destination.token.clone()),
            (None, Some(destination)) => TokenPair::new(self.source.token.clone(), destination),
            (None, None) => return,
        };

        if !mode.accepts(&pair) {
            tracing::error!(?pair, "Configured tokens do not form a valid pair");
            self.malformed_config(mode);
            return;
        }
        tracing::info!(
            %mode,
            source = %pair.source.id(),
            destination = %pair.destination.id(),
            "Using configured token pair"
        );
        self.canonical.replace(mode, pair.clone());
        self.replace_pair(pair);
    }

    fn malformed_config(&mut self, mode: PairMode) {
        self.notices.post(PortalNotice::MalformedConfig);
        let canonical = self.canonical.for_mode(mode).clone();
        self.replace_pair(canonical);
    }

    // ========================================================================
    // Quotes
    // ========================================================================

    /// Request for the routing API, or `None` when nothing is to be quoted.
    #[must_use]
    pub fn quote_request(&self, sender: Address) -> Option<QuoteRequest> {
        if self.mode() == PortalMode::OnRamp {
            return None;
        }
        build_quote_request(
            sender,
            self.destination_address,
            &self.source,
            &self.destination,
            self.last_changed,
            self.aggregator.slippage(),
        )
    }

    /// Fold a fresh quote into the figures and fill the side the user did not type.
    ///
    /// A quote the aggregator cannot use sets [`BridgeError::UnknownError`]
    /// and clears the outputs.
    pub fn apply_quote(
        &mut self,
        quote: &Quote,
        gas: &GasEstimate,
        gas_token_usd_price: Option<f64>,
    ) -> Result<(), AggregateError> {
        let source_chain = self.source.token.chain_id;
        let gas_decimals = match self.catalog.native_token(source_chain) {
            Ok(native) => native.decimals,
            Err(err) => {
                tracing::error!(%err, "Source chain gas token unknown");
                self.set_unknown_error_and_clear();
                return Err(AggregateError::GasTokenUnknown(source_chain));
            }
        };
        let source = self.source.token.clone();
        match self
            .aggregator
            .update(quote, gas, &source, gas_decimals, gas_token_usd_price)
        {
            Ok(amounts) => {
                match self.last_changed {
                    InputSide::Source => {
                        let amount = TokenAmount::sanitize(
                            &amounts.amount_out,
                            self.destination.token.decimals,
                        );
                        self.destination = self.destination.with_amount(amount);
                    }
                    InputSide::Destination => {
                        let amount =
                            TokenAmount::sanitize(&amounts.amount_in, self.source.token.decimals);
                        self.source = self.source.with_amount(amount);
                    }
                }
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "Quote could not be applied");
                self.set_unknown_error_and_clear();
                Err(err)
            }
        }
    }

    pub fn set_bridge_error(&mut self, error: Option<BridgeError>) {
        self.bridge_error = error;
    }

    fn set_unknown_error_and_clear(&mut self) {
        self.clear_quote_outputs();
        self.bridge_error = Some(BridgeError::UnknownError);
    }

    /// Reset figures and the amount the user did not type.
    pub fn clear_quote_outputs(&mut self) {
        self.aggregator.reset_for_token_change();
        self.bridge_error = None;
        match self.last_changed {
            InputSide::Source => {
                self.destination = self.destination.with_amount(TokenAmount::empty());
            }
            InputSide::Destination => {
                self.source = self.source.with_amount(TokenAmount::empty());
            }
        }
    }

    /// Reset figures and both amounts.
    pub fn reset_transaction_data_and_amounts(&mut self) {
        self.aggregator.reset_for_token_change();
        self.bridge_error = None;
        self.source = self.source.with_amount(TokenAmount::empty());
        self.destination = self.destination.with_amount(TokenAmount::empty());
        self.bump_generation();
    }

    pub fn set_gas_token_usd_price(&mut self, price: Option<f64>) {
        self.aggregator.set_gas_token_usd_price(price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{StableSet, StaticCatalog};
    use portal_config::{DefaultAmount, TabConfig, TokenList};
    use portal_types::{
        APE_ETH_OMNICHAIN, APE_USD_OMNICHAIN, APECOIN_ETHEREUM, BridgeId, NATIVE_TOKEN_ADDRESS,
        Payment, SwapDirection, TabEntry, U256,
    };

    const ONE: u128 = 1_000_000_000_000_000_000;

    fn addr(hex: &str) -> Address {
        hex.parse().unwrap()
    }

    fn usdc() -> TokenId {
        TokenId::new(ChainId::ETHEREUM, addr("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"))
    }

    fn dai() -> TokenId {
        TokenId::new(ChainId::ETHEREUM, addr("0x6B175474E89094C44Da98b954EedeAC495271d0F"))
    }

    fn eth_native() -> TokenId {
        TokenId::new(ChainId::ETHEREUM, NATIVE_TOKEN_ADDRESS)
    }

    fn ape_native() -> TokenId {
        TokenId::new(ChainId::APE, NATIVE_TOKEN_ADDRESS)
    }

    fn ape_usd() -> TokenId {
        TokenId::new(ChainId::APE, APE_USD_OMNICHAIN)
    }

    fn apecoin_eth() -> TokenId {
        TokenId::new(ChainId::ETHEREUM, APECOIN_ETHEREUM)
    }

    fn portal_with(config: &ResolvedConfig) -> Portal {
        let list = TokenList::builtin().unwrap();
        Portal::new(
            config,
            Arc::new(StaticCatalog::from_list(&list)),
            Arc::new(StableSet::from_list(&list)),
        )
        .unwrap()
    }

    fn default_portal() -> Portal {
        portal_with(&ResolvedConfig::default())
    }

    fn token(portal: &Portal, id: TokenId) -> TokenInfo {
        portal.catalog().find(&id).unwrap()
    }

    fn ids(portal: &Portal) -> (TokenId, TokenId) {
        (portal.source().token.id(), portal.destination().token.id())
    }

    fn wallet_on(chain: ChainId) -> WalletContext {
        WalletContext::connected(Address::with_last_byte(7), chain)
    }

    #[test]
    fn starts_on_canonical_bridge_pair() {
        let portal = default_portal();
        assert_eq!(portal.mode(), PortalMode::Bridge);
        assert_eq!(ids(&portal), (apecoin_eth(), ape_native()));
        assert_eq!(portal.figures().slippage, Slippage::DEFAULT);
        assert!(portal.notice().is_none());
        assert!(!portal.has_user_updated_tokens());
    }

    #[test]
    fn test_repeated_mode_request_changes_nothing() {
        let mut portal = default_portal();
        portal.request_mode(PortalMode::Swap).unwrap();
        let pair = ids(&portal);
        let stash = portal.stash().clone();
        let generation = portal.generation();

        portal.request_mode(PortalMode::Swap).unwrap();
        assert_eq!(ids(&portal), pair);
        assert_eq!(portal.stash(), &stash);
        assert_eq!(portal.generation(), generation);
    }

    #[test]
    fn bridge_swap_bridge_restores_bridge_pair() {
        let mut portal = default_portal();
        let before = ids(&portal);

        portal.request_mode(PortalMode::Swap).unwrap();
        assert_eq!(portal.mode(), PortalMode::Swap);
        assert_eq!(ids(&portal), (apecoin_eth(), eth_native()));

        portal.request_mode(PortalMode::Bridge).unwrap();
        assert_eq!(ids(&portal), before);
    }

    #[test]
    fn eth_native_default_enters_swap_paired_with_usdc() {
        let mut config = ResolvedConfig::default();
        config.tokens.default_source = Some(eth_native());
        config.tokens.default_destination = Some(ape_native());
        let mut portal = portal_with(&config);
        assert_eq!(ids(&portal), (eth_native(), ape_native()));

        portal.request_mode(PortalMode::Swap).unwrap();
        assert_eq!(ids(&portal), (eth_native(), usdc()));
        assert!(portal.notice().is_none());
    }

    #[test]
    fn onramp_round_trip_restores_swap_pair() {
        let mut portal = default_portal();
        portal.request_mode(PortalMode::Swap).unwrap();
        portal.select_destination_token(token(&portal, dai())).unwrap();
        let swap_pair = ids(&portal);

        portal.request_mode(PortalMode::OnRamp).unwrap();
        assert_eq!(portal.selected_index(), PortalMode::OnRamp.tab_index());
        portal.request_mode(PortalMode::Swap).unwrap();
        assert_eq!(ids(&portal), swap_pair);
    }

    #[test]
    fn wallet_on_default_chain_gets_canonical_swap_pair() {
        let mut portal = default_portal();
        portal.on_wallet_changed(wallet_on(ChainId::ETHEREUM));
        portal.request_mode(PortalMode::Swap).unwrap();
        assert_eq!(ids(&portal), (ape_native(), ape_usd()));
    }

    #[test]
    fn manual_change_suppresses_canonical_pair() {
        let mut portal = default_portal();
        portal.on_wallet_changed(wallet_on(ChainId::ETHEREUM));
        portal.select_source_token(token(&portal, usdc())).unwrap();
        assert!(portal.has_user_updated_tokens());

        portal.request_mode(PortalMode::Swap).unwrap();
        assert_ne!(ids(&portal), (ape_native(), ape_usd()));
        assert_eq!(ids(&portal), (usdc(), eth_native()));

        portal.request_mode(PortalMode::Bridge).unwrap();
        assert_eq!(ids(&portal), (usdc(), ape_native()));
    }

    #[test]
    fn flip_also_suppresses_canonical_pair() {
        let mut portal = default_portal();
        portal.swap_source_destination().unwrap();
        portal.on_wallet_changed(wallet_on(ChainId::ETHEREUM));
        assert_eq!(ids(&portal), (ape_native(), apecoin_eth()));
    }

    #[test]
    fn slippage_out_of_range_keeps_prior_value() {
        let mut portal = default_portal();
        assert!(matches!(portal.set_slippage(0.05), Err(SlippageError::BelowMinimum(_))));
        assert!(matches!(portal.set_slippage(51.0), Err(SlippageError::AboveMaximum(_))));
        assert_eq!(portal.figures().slippage, Slippage::DEFAULT);

        let set = portal.set_slippage(5.0).unwrap();
        assert!((set.percent() - 5.0).abs() < f64::EPSILON);
        assert_eq!(portal.figures().slippage, set);

        portal.reset_slippage();
        assert_eq!(portal.figures().slippage, Slippage::DEFAULT);
    }

    #[test]
    fn stable_pair_overrides_then_restores_slippage() {
        let mut portal = default_portal();
        let five = portal.set_slippage(5.0).unwrap();

        portal.select_source_token(token(&portal, usdc())).unwrap();
        assert_eq!(portal.figures().slippage, five);

        portal.select_destination_token(token(&portal, ape_usd())).unwrap();
        assert!(portal.is_pair_stable());
        assert_eq!(portal.figures().slippage, Slippage::STABLE);

        portal.select_source_token(token(&portal, eth_native())).unwrap();
        assert_eq!(portal.figures().slippage, five);
    }

    #[test]
    fn route_restriction_rejects_destination() {
        let mut portal = default_portal();
        portal.select_source_token(token(&portal, eth_native())).unwrap();
        let native = token(&portal, ape_native());
        let err = portal.select_destination_token(native).unwrap_err();
        assert_eq!(
            err,
            SelectError::RouteUnavailable {
                from: eth_native(),
                destination: ape_native(),
            }
        );
        assert_eq!(
            err.to_string(),
            format!("no route from {} to {}", eth_native(), ape_native())
        );

        let ape_eth = TokenId::new(ChainId::APE, APE_ETH_OMNICHAIN);
        portal.select_destination_token(token(&portal, ape_eth)).unwrap();
        assert_eq!(portal.destination().token.id(), ape_eth);
    }

    #[test]
    fn same_token_is_rejected() {
        let mut portal = default_portal();
        let destination = portal.destination().token.clone();
        assert_eq!(portal.select_source_token(destination), Err(SelectError::SameToken));
        assert!(!portal.has_user_updated_tokens());
    }

    #[test]
    fn locked_destination_rejects_changes() {
        let mut config = ResolvedConfig::default();
        config.tokens.lock_destination = true;
        let mut portal = portal_with(&config);
        let ape_eth = TokenId::new(ChainId::APE, APE_ETH_OMNICHAIN);
        assert_eq!(
            portal.select_destination_token(token(&portal, ape_eth)),
            Err(SelectError::DestinationLocked)
        );
        assert_eq!(portal.swap_source_destination(), Err(SelectError::DestinationLocked));
        portal.select_source_token(token(&portal, usdc())).unwrap();
        assert_eq!(portal.destination().token.id(), ape_native());
    }

    #[test]
    fn cross_chain_swap_source_pulls_destination() {
        let mut portal = default_portal();
        portal.request_mode(PortalMode::Swap).unwrap();
        portal.select_source_token(token(&portal, ape_usd())).unwrap();
        assert_eq!(ids(&portal), (ape_usd(), ape_native()));
    }

    #[test]
    fn cross_chain_swap_destination_pulls_source() {
        let mut portal = default_portal();
        portal.request_mode(PortalMode::Swap).unwrap();
        portal.select_destination_token(token(&portal, ape_usd())).unwrap();
        assert_eq!(ids(&portal), (ape_native(), ape_usd()));
    }

    #[test]
    fn flip_swaps_sides_and_edit_direction() {
        let mut portal = default_portal();
        portal.set_source_amount("2");
        let generation = portal.generation();

        portal.swap_source_destination().unwrap();
        assert_eq!(ids(&portal), (ape_native(), apecoin_eth()));
        assert_eq!(portal.last_changed(), InputSide::Destination);
        assert_eq!(portal.destination().amount.as_str(), "2");
        assert!(portal.generation() > generation);
    }

    #[test]
    fn amount_edits_sanitize_and_bump_generation() {
        let mut portal = default_portal();
        let generation = portal.generation();
        assert_eq!(portal.set_source_amount("1,5x").as_str(), "1.5");
        assert_eq!(portal.last_changed(), InputSide::Source);
        assert!(portal.generation() > generation);

        portal.set_destination_amount("3");
        assert_eq!(portal.last_changed(), InputSide::Destination);
    }

    #[test]
    fn token_change_keeps_typed_amount_and_clears_other_side() {
        let mut portal = default_portal();
        portal.set_source_amount("1");
        portal.destination = portal
            .destination
            .with_amount(TokenAmount::parse("3").unwrap());

        portal.select_source_token(token(&portal, usdc())).unwrap();
        assert_eq!(portal.source().amount.as_str(), "1");
        assert!(portal.destination().amount.is_empty());
    }

    #[test]
    fn malformed_config_falls_back_with_notice() {
        let mut config = ResolvedConfig::default();
        config.tokens.default_source = Some(TokenId::new(ChainId::APE_CURTIS, NATIVE_TOKEN_ADDRESS));
        let portal = portal_with(&config);
        assert_eq!(portal.notice(), Some(&PortalNotice::MalformedConfig));
        assert_eq!(ids(&portal), (apecoin_eth(), ape_native()));
    }

    #[test]
    fn unknown_config_token_falls_back_with_notice() {
        let mut config = ResolvedConfig::default();
        config.tokens.default_destination =
            Some(TokenId::new(ChainId::APE, Address::with_last_byte(0x42)));
        let portal = portal_with(&config);
        assert_eq!(portal.notice(), Some(&PortalNotice::MalformedConfig));
        assert_eq!(ids(&portal), (apecoin_eth(), ape_native()));
    }

    #[test]
    fn single_swap_default_resolves_other_side() {
        let mut config = ResolvedConfig::default();
        config.tabs = TabConfig::new(vec![
            TabEntry::Initial(PortalMode::Swap),
            TabEntry::Plain(PortalMode::Bridge),
        ])
        .unwrap();
        config.tokens.default_source = Some(ape_usd());
        config.tokens.default_amount = Some(DefaultAmount {
            side: InputSide::Destination,
            amount: TokenAmount::parse("2").unwrap(),
        });
        let portal = portal_with(&config);

        assert_eq!(portal.mode(), PortalMode::Swap);
        assert_eq!(ids(&portal), (ape_usd(), ape_native()));
        assert_eq!(portal.canonical().for_mode(PairMode::Swap).source.id(), ape_usd());
        assert_eq!(portal.last_changed(), InputSide::Destination);
        assert_eq!(portal.destination().amount.as_str(), "2");
        assert!(portal.notice().is_none());
    }

    #[test]
    fn swap_default_on_other_chain_is_malformed() {
        let mut config = ResolvedConfig::default();
        config.tabs = TabConfig::new(vec![TabEntry::Initial(PortalMode::Swap)]).unwrap();
        config.tokens.default_source = Some(usdc());
        let portal = portal_with(&config);
        assert_eq!(portal.notice(), Some(&PortalNotice::MalformedConfig));
        assert_eq!(ids(&portal), (ape_native(), ape_usd()));
    }

    #[test]
    fn unusable_default_pair_is_not_fatal() {
        let mut config = ResolvedConfig::default();
        config.canonical.bridge.source =
            TokenId::new(ChainId::ETHEREUM, Address::with_last_byte(0xee));
        let portal = portal_with(&config);
        assert_eq!(portal.notice(), Some(&PortalNotice::MalformedConfig));
        assert_eq!(ids(&portal), (apecoin_eth(), ape_native()));
    }

    #[test]
    fn cross_chain_swap_default_pair_is_not_fatal() {
        let mut config = ResolvedConfig::default();
        config.canonical.swap.source = eth_native();
        let mut portal = portal_with(&config);
        assert_eq!(portal.notice(), Some(&PortalNotice::MalformedConfig));
        portal.on_wallet_changed(wallet_on(ChainId::ETHEREUM));
        portal.request_mode(PortalMode::Swap).unwrap();
        assert_eq!(ids(&portal), (ape_native(), ape_usd()));
    }

    #[test]
    fn flip_respects_route_restrictions() {
        let mut portal = default_portal();
        portal.swap_source_destination().unwrap();
        portal.select_destination_token(token(&portal, eth_native())).unwrap();
        let before = ids(&portal);
        assert_eq!(before, (ape_native(), eth_native()));
        let generation = portal.generation();
        assert!(matches!(
            portal.swap_source_destination(),
            Err(SelectError::RouteUnavailable { .. })
        ));
        assert_eq!(ids(&portal), before);
        assert_eq!(portal.generation(), generation);
    }

    #[test]
    fn wallet_address_change_invalidates_quotes() {
        let mut portal = default_portal();
        portal.on_wallet_changed(wallet_on(ChainId::ARBITRUM));
        let generation = portal.generation();

        let other = WalletContext::connected(Address::with_last_byte(8), ChainId::ARBITRUM);
        portal.on_wallet_changed(other);
        assert!(portal.generation() > generation);
    }

    #[test]
    fn wallet_chain_native_becomes_bridge_source() {
        let mut portal = default_portal();
        portal.on_wallet_changed(wallet_on(ChainId::ARBITRUM));
        assert_eq!(
            portal.source().token.id(),
            TokenId::new(ChainId::ARBITRUM, NATIVE_TOKEN_ADDRESS)
        );
        assert!(!portal.has_user_updated_tokens());

        portal.on_wallet_changed(wallet_on(ChainId::ETHEREUM));
        assert_eq!(ids(&portal), (apecoin_eth(), ape_native()));
    }

    #[test]
    fn typed_amount_blocks_wallet_default() {
        let mut portal = default_portal();
        portal.set_source_amount("1");
        portal.on_wallet_changed(wallet_on(ChainId::ARBITRUM));
        assert_eq!(portal.source().token.id(), apecoin_eth());
        assert!(portal.is_wrong_chain());
        assert_eq!(portal.action_gate().label(), "Switch Network to Ethereum");
        assert!(!portal.action_gate().is_disabled());
    }

    #[test]
    fn disconnected_wallet_asks_to_connect() {
        let portal = default_portal();
        assert_eq!(portal.action_gate().label(), "Connect Wallet");
    }

    fn hash_portal() -> Portal {
        let mut config = ResolvedConfig::default();
        config.flags.use_hash_router = true;
        portal_with(&config)
    }

    #[test]
    fn hash_selects_swap_and_destination() {
        let mut portal = hash_portal();
        portal.apply_location_hash("#swap/33139/0xa2235d059f80e176d931ef76b6c51953eb3fbef4");
        assert_eq!(portal.mode(), PortalMode::Swap);
        assert_eq!(ids(&portal), (ape_native(), ape_usd()));
    }

    #[test]
    fn hash_on_source_chain_sets_destination_only() {
        let mut portal = hash_portal();
        portal.apply_location_hash("#swap/1/0x6b175474e89094c44da98b954eedeac495271d0f");
        assert_eq!(ids(&portal), (apecoin_eth(), dai()));
    }

    #[test]
    fn hash_ignored_when_disabled_or_malformed() {
        let mut portal = default_portal();
        portal.apply_location_hash("#swap");
        assert_eq!(portal.mode(), PortalMode::Bridge);

        let mut portal = hash_portal();
        portal.apply_location_hash("#lend");
        assert_eq!(portal.mode(), PortalMode::Bridge);

        portal.apply_location_hash("#swap/33111/0xa2235d059f80e176d931ef76b6c51953eb3fbef4");
        assert_eq!(portal.mode(), PortalMode::Swap);
        assert_eq!(ids(&portal).0.chain_id, ChainId::ETHEREUM);
    }

    #[test]
    fn quote_request_follows_edited_side() {
        let mut portal = default_portal();
        let sender = Address::with_last_byte(1);
        assert!(portal.quote_request(sender).is_none());

        portal.set_source_amount("1.5");
        let request = portal.quote_request(sender).unwrap();
        assert_eq!(request.amount, U256::from(3 * ONE / 2));
        assert_eq!(request.direction, SwapDirection::ExactAmountIn);
        assert_eq!(request.bridge_id, Some(BridgeId::Oft));

        portal.request_mode(PortalMode::OnRamp).unwrap();
        assert!(portal.quote_request(sender).is_none());
    }

    fn quote_for(portal: &Portal, amount_in: u128, amount_out: u128) -> Quote {
        Quote {
            token_payment: Some(Payment::new(portal.source().token.id(), U256::from(amount_in), 18)),
            amount_out: Some(Payment::new(
                portal.destination().token.id(),
                U256::from(amount_out),
                18,
            )),
            exchange_rate: Some(3.0),
            ..Quote::default()
        }
    }

    #[test]
    fn applied_quote_fills_other_side() {
        let mut portal = default_portal();
        portal.set_source_amount("1");
        let quote = quote_for(&portal, ONE, 3 * ONE);
        portal
            .apply_quote(&quote, &GasEstimate::default(), Some(3200.0))
            .unwrap();
        assert_eq!(portal.destination().amount.as_str(), "3");
        assert!(portal.figures().gas_fee > 0.0);
        assert!(portal.bridge_error().is_none());
    }

    #[test]
    fn exact_out_quote_fills_source() {
        let mut portal = default_portal();
        portal.set_destination_amount("3");
        let quote = quote_for(&portal, ONE / 2, 3 * ONE);
        portal.apply_quote(&quote, &GasEstimate::default(), None).unwrap();
        assert_eq!(portal.source().amount.as_str(), "0.5");
        assert_eq!(portal.destination().amount.as_str(), "3");
    }

    #[test]
    fn incomplete_quote_sets_unknown_error() {
        let mut portal = default_portal();
        portal.set_source_amount("1");
        let mut quote = quote_for(&portal, ONE, 3 * ONE);
        quote.exchange_rate = None;
        assert!(matches!(
            portal.apply_quote(&quote, &GasEstimate::default(), None),
            Err(AggregateError::IncompleteQuote)
        ));
        assert_eq!(portal.bridge_error(), Some(BridgeError::UnknownError));
        assert!(portal.destination().amount.is_empty());
        assert_eq!(portal.source().amount.as_str(), "1");
    }

    #[test]
    fn full_reset_clears_both_amounts() {
        let mut portal = default_portal();
        portal.set_source_amount("1");
        let quote = quote_for(&portal, ONE, 3 * ONE);
        portal.apply_quote(&quote, &GasEstimate::default(), None).unwrap();

        portal.reset_transaction_data_and_amounts();
        assert!(portal.source().amount.is_empty());
        assert!(portal.destination().amount.is_empty());
        assert!(portal.figures().gas_fee.abs() < f64::EPSILON);
    }

    #[test]
    fn zero_amount_clears_quote_outputs() {
        let mut portal = default_portal();
        portal.set_source_amount("1");
        let quote = quote_for(&portal, ONE, 3 * ONE);
        portal.apply_quote(&quote, &GasEstimate::default(), None).unwrap();

        portal.set_source_amount("0");
        assert!(portal.destination().amount.is_empty());
        assert!(portal.figures().gas_fee.abs() < f64::EPSILON);
    }
}
