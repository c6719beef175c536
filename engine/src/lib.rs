//! Async engine for the token portal.
//!
//! Wraps the synchronous [`portal_core::Portal`] in a session that talks to
//! the routing API, gas oracle and price feeds, debounces amount edits and
//! throws away results that arrive after their inputs changed.

pub mod collaborators;
pub mod debounce;
pub mod generation;
pub mod session;

pub use collaborators::{
    AllowanceChecker, BalanceReader, CollabFut, CollaboratorError, Collaborators, GasOracle,
    PriceOracle, QuoteService,
};
pub use debounce::Debouncer;
pub use generation::Ticket;
pub use portal_core;
pub use session::{
    ActionError, PendingRefresh, PortalSession, PortalSnapshot, QuoteOutcome, QuoteResolution,
    UserAction,
};
