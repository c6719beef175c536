//! Core state machine for the token portal.
//!
//! Everything here is synchronous and free of IO. The engine crate drives a
//! [`Portal`] from async collaborator results; this crate only decides what
//! the portal looks like after each event.

pub mod balance;
pub mod catalog;
pub mod errors;
pub mod figures;
pub mod hash;
pub mod notices;
pub mod portal;
pub mod request;
pub mod resolver;
pub mod stash;
pub mod tabs;

pub use balance::{check_balance, total_native_fees};
pub use catalog::{CatalogError, StableClassifier, StableSet, StaticCatalog, TokenCatalog};
pub use errors::{
    ActionGate, BridgeError, HIGH_IMPACT_ERROR, bridge_error_message, classify_gas_failure,
    classify_quote_failure,
};
pub use figures::{AggregateError, QuoteAmounts, TransactionDataAggregator, TransactionFigures};
pub use hash::{HashError, HashRoute};
pub use notices::{NoticeBoard, PortalNotice};
pub use portal::{Generation, Portal, SelectError, SharedCatalog, SharedClassifier, WalletContext};
pub use request::{bridge_id_for, build_quote_request};
pub use resolver::{ResolveError, resolve_next_token, resolve_routable_token};
pub use stash::{Stash, StashManager};
pub use tabs::{
    CanonicalError, CanonicalPairs, TabError, TabManager, Transition, available_modes, initial_mode,
};
