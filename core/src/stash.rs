//! Per-mode memory of the token pair that was active when a mode was left.

use portal_types::{PairMode, PortalMode, TokenPair};

/// One stash slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stash {
    #[default]
    Empty,
    Held(TokenPair),
}

impl Stash {
    #[must_use]
    pub fn pair(&self) -> Option<&TokenPair> {
        match self {
            Stash::Empty => None,
            Stash::Held(pair) => Some(pair),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Stash::Empty)
    }
}

/// Stash slots for the two pair-owning modes. OnRamp has no slot.
///
/// Reading a slot never clears it; callers overwrite the slot of the mode
/// they leave with the pair being displaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StashManager {
    bridge: Stash,
    swap: Stash,
}

impl StashManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, mode: PairMode) -> &mut Stash {
        match mode {
            PairMode::Bridge => &mut self.bridge,
            PairMode::Swap => &mut self.swap,
        }
    }

    #[must_use]
    pub fn slot(&self, mode: PairMode) -> &Stash {
        match mode {
            PairMode::Bridge => &self.bridge,
            PairMode::Swap => &self.swap,
        }
    }

    /// Remember `pair` for `mode`. Stashing for OnRamp does nothing.
    pub fn stash(&mut self, mode: PortalMode, pair: TokenPair) {
        match mode.pair_mode() {
            Some(mode) => *self.slot_mut(mode) = Stash::Held(pair),
            None => tracing::debug!("OnRamp owns no stash; ignoring"),
        }
    }

    /// Copy of the pair stashed for `mode`, if any.
    #[must_use]
    pub fn unstash(&self, mode: PortalMode) -> Option<TokenPair> {
        mode.pair_mode()
            .and_then(|mode| self.slot(mode).pair().cloned())
    }

    /// Stashed pair for `mode`, only if it is still legal there.
    #[must_use]
    pub fn usable(&self, mode: PairMode) -> Option<TokenPair> {
        self.slot(mode)
            .pair()
            .filter(|pair| mode.accepts(pair))
            .cloned()
    }

    pub(crate) fn set(&mut self, mode: PairMode, stash: Stash) {
        *self.slot_mut(mode) = stash;
    }

    pub fn clear(&mut self, mode: PairMode) {
        *self.slot_mut(mode) = Stash::Empty;
    }
}
