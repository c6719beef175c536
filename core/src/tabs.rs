//! Mode state machine: which tab is active and which pair each mode keeps.
//!
//! Transitions are computed and applied in one call. The caller hands in the
//! active pair and gets back the pair to display, so no observer ever sees the
//! new mode with the old tokens.

use portal_config::{CanonicalSpec, FeatureFlags, PairSpec, TabConfig};
use portal_types::{ChainId, PairMode, PortalMode, TokenPair};
use thiserror::Error;

use crate::catalog::{CatalogError, TokenCatalog};
use crate::notices::PortalNotice;
use crate::resolver::resolve_routable_token;
use crate::stash::{Stash, StashManager};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabError {
    #[error("mode {0} is not available")]
    Unavailable(PortalMode),
}

/// Known-good pairs with full token metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPairs {
    pub bridge: TokenPair,
    pub swap: TokenPair,
}

/// Why a configured default pair was not used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("chain {0} is not supported")]
    UnsupportedChain(ChainId),
    #[error("{0} pair must name two different tokens, on one chain for swap")]
    InvalidPair(PairMode),
}

fn lookup_pair(spec: PairSpec, catalog: &dyn TokenCatalog) -> Result<TokenPair, CatalogError> {
    let source = catalog
        .find(&spec.source)
        .ok_or(CatalogError::UnknownToken(spec.source))?;
    let destination = catalog
        .find(&spec.destination)
        .ok_or(CatalogError::UnknownToken(spec.destination))?;
    Ok(TokenPair::new(source, destination))
}

fn configured_pair(
    mode: PairMode,
    spec: PairSpec,
    catalog: &dyn TokenCatalog,
    supported_chains: &[ChainId],
) -> Result<TokenPair, CanonicalError> {
    for chain in [spec.source.chain_id, spec.destination.chain_id] {
        if !supported_chains.contains(&chain) {
            return Err(CanonicalError::UnsupportedChain(chain));
        }
    }
    let pair = lookup_pair(spec, catalog)?;
    if !mode.accepts(&pair) {
        return Err(CanonicalError::InvalidPair(mode));
    }
    Ok(pair)
}

impl CanonicalPairs {
    /// Look up the configured pairs.
    ///
    /// A configured pair that differs from the built-in one is checked
    /// against the catalog and the supported chains. When it fails, the
    /// built-in pair is used and the mode is listed in the second value.
    /// Errors only when a built-in pair is missing from the catalog.
    pub fn resolve(
        spec: &CanonicalSpec,
        catalog: &dyn TokenCatalog,
        supported_chains: &[ChainId],
    ) -> Result<(Self, Vec<PairMode>), CatalogError> {
        let builtin = CanonicalSpec::default();
        let mut rejected = Vec::new();
        let mut pick = |mode: PairMode, configured: PairSpec, fallback: PairSpec| {
            if configured != fallback {
                match configured_pair(mode, configured, catalog, supported_chains) {
                    Ok(pair) => return Ok(pair),
                    Err(err) => {
                        tracing::warn!(%mode, %err, "Ignoring configured default pair");
                        rejected.push(mode);
                    }
                }
            }
            lookup_pair(fallback, catalog)
        };
        let bridge = pick(PairMode::Bridge, spec.bridge, builtin.bridge)?;
        let swap = pick(PairMode::Swap, spec.swap, builtin.swap)?;
        Ok((Self { bridge, swap }, rejected))
    }

    #[must_use]
    pub fn for_mode(&self, mode: PairMode) -> &TokenPair {
        match mode {
            PairMode::Bridge => &self.bridge,
            PairMode::Swap => &self.swap,
        }
    }

    pub fn replace(&mut self, mode: PairMode, pair: TokenPair) {
        match mode {
            PairMode::Bridge => self.bridge = pair,
            PairMode::Swap => self.swap = pair,
        }
    }

    /// Wallet chain on which the canonical pair is forced.
    #[must_use]
    pub fn default_source_chain(&self) -> ChainId {
        self.bridge.source.chain_id
    }

    #[must_use]
    pub fn swap_chain(&self) -> ChainId {
        self.swap.source.chain_id
    }
}

/// What a transition needs to know about the rest of the portal.
pub struct TabContext<'a> {
    pub pair: &'a TokenPair,
    /// `None` while no wallet is connected.
    pub wallet_chain: Option<ChainId>,
    pub has_user_updated_tokens: bool,
    pub canonical: &'a CanonicalPairs,
    pub catalog: &'a dyn TokenCatalog,
}

impl TabContext<'_> {
    /// A wallet on the default chain with untouched tokens gets the canonical pair.
    #[must_use]
    pub fn canonical_applies(&self) -> bool {
        !self.has_user_updated_tokens
            && self.wallet_chain == Some(self.canonical.default_source_chain())
    }
}

/// Outcome of a mode change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: PortalMode,
    pub to: PortalMode,
    /// New active pair; `None` keeps the current one.
    pub pair: Option<TokenPair>,
    pub notice: Option<PortalNotice>,
}

/// Modes offered to the user. OnRamp disappears when disabled.
#[must_use]
pub fn available_modes(tabs: &TabConfig, flags: &FeatureFlags) -> Vec<PortalMode> {
    let mut modes: Vec<PortalMode> = Vec::new();
    for mode in tabs.modes() {
        if mode == PortalMode::OnRamp && !flags.enable_onramp {
            continue;
        }
        if !modes.contains(&mode) {
            modes.push(mode);
        }
    }
    if modes.is_empty() {
        tracing::warn!("No tabs left after applying feature flags; offering Bridge");
        modes.push(PortalMode::Bridge);
    }
    modes
}

/// Startup mode: the first initial marker, defaulting to Bridge.
///
/// An OnRamp marker while OnRamp is disabled becomes Bridge. A mode that is
/// not offered falls back to the first offered mode.
#[must_use]
pub fn initial_mode(tabs: &TabConfig, flags: &FeatureFlags) -> PortalMode {
    let available = available_modes(tabs, flags);
    let mut initial = tabs.initial_marker().unwrap_or(PortalMode::Bridge);
    if initial == PortalMode::OnRamp && !flags.enable_onramp {
        tracing::warn!("Cannot set initial tab to OnRamp when OnRamp is disabled");
        initial = PortalMode::Bridge;
    }
    if available.contains(&initial) {
        initial
    } else {
        available[0]
    }
}

#[derive(Debug, Clone)]
pub struct TabManager {
    mode: PortalMode,
    /// Mode owning the active pair. Equal to `mode` outside OnRamp.
    pair_mode: PairMode,
    available: Vec<PortalMode>,
    stash: StashManager,
}

impl TabManager {
    #[must_use]
    pub fn new(tabs: &TabConfig, flags: &FeatureFlags) -> Self {
        let available = available_modes(tabs, flags);
        let mode = initial_mode(tabs, flags);
        let pair_mode = mode
            .pair_mode()
            .or_else(|| available.iter().find_map(|m| m.pair_mode()))
            .unwrap_or(PairMode::Bridge);
        tracing::debug!(%mode, ?available, "Tab manager initialised");
        Self {
            mode,
            pair_mode,
            available,
            stash: StashManager::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> PortalMode {
        self.mode
    }

    #[must_use]
    pub fn pair_mode(&self) -> PairMode {
        self.pair_mode
    }

    #[must_use]
    pub fn available(&self) -> &[PortalMode] {
        &self.available
    }

    #[must_use]
    pub fn stash(&self) -> &StashManager {
        &self.stash
    }

    /// Visual tab slot: Bridge and Swap share one.
    #[must_use]
    pub fn selected_index(&self) -> usize {
        self.mode.tab_index()
    }

    /// Switch to `next`. Returns `Ok(None)` when already there; nothing changes.
    pub fn request_mode(
        &mut self,
        next: PortalMode,
        ctx: &TabContext<'_>,
    ) -> Result<Option<Transition>, TabError> {
        if next == self.mode {
            return Ok(None);
        }
        if !self.available.contains(&next) {
            tracing::warn!(mode = %next, "Requested mode is not available");
            return Err(TabError::Unavailable(next));
        }

        let from = self.mode;
        let mut transition = Transition {
            from,
            to: next,
            pair: None,
            notice: None,
        };

        match next.pair_mode() {
            None => {
                self.stash.stash(from, ctx.pair.clone());
            }
            Some(target) if from == PortalMode::OnRamp && target == self.pair_mode => {
                transition.pair = self.stash.usable(target);
            }
            Some(target) => {
                let (pair, notice) = self.enter_pair_mode(self.pair_mode, target, ctx);
                transition.pair = pair;
                transition.notice = notice;
                self.pair_mode = target;
            }
        }

        self.mode = next;
        tracing::info!(from = %from, to = %next, "Mode changed");
        Ok(Some(transition))
    }

    fn enter_pair_mode(
        &mut self,
        from: PairMode,
        target: PairMode,
        ctx: &TabContext<'_>,
    ) -> (Option<TokenPair>, Option<PortalNotice>) {
        let current = ctx.pair.clone();

        if ctx.canonical_applies() {
            self.stash.set(from, Stash::Held(current));
            self.stash.clear(target);
            return (Some(ctx.canonical.for_mode(target).clone()), None);
        }

        if let Some(stashed) = self.stash.usable(target) {
            self.stash.set(from, Stash::Held(current));
            return (Some(stashed), None);
        }

        if target == PairMode::Swap && target.accepts(&current) {
            self.stash.set(from, Stash::Held(current));
            return (None, None);
        }

        let source_id = current.source.id();
        let outcome = match resolve_routable_token(ctx.catalog, &source_id) {
            Ok(next) => (Some(TokenPair::new(current.source.clone(), next)), None),
            Err(err) => {
                tracing::warn!(%err, "No pairing token; using canonical pair");
                (
                    Some(ctx.canonical.for_mode(target).clone()),
                    Some(PortalNotice::NoTokensFound),
                )
            }
        };
        self.stash.set(from, Stash::Held(current));
        outcome
    }
}
