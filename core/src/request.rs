//! Routing API request derivation from the active selections.

use portal_types::{
    Address, BridgeId, InputSide, QuoteRequest, Slippage, TokenInfo, TokenPair, TokenSelection,
};

fn is_apechain_or_apecoin(token: &TokenInfo) -> bool {
    token.chain_id.is_apechain() || token.is_apecoin()
}

/// ApeChain and ApeCoin transfers across chains go through the OFT bridge.
#[must_use]
pub fn bridge_id_for(pair: &TokenPair) -> Option<BridgeId> {
    if pair.same_chain() {
        return None;
    }
    (is_apechain_or_apecoin(&pair.source) || is_apechain_or_apecoin(&pair.destination))
        .then_some(BridgeId::Oft)
}

/// Build the quote request for the side the user typed into last.
///
/// `None` when that side holds no positive amount, or the amount does not fit
/// the token's decimals.
#[must_use]
pub fn build_quote_request(
    sender: Address,
    receiver: Option<Address>,
    source: &TokenSelection,
    destination: &TokenSelection,
    last_changed: InputSide,
    slippage: Slippage,
) -> Option<QuoteRequest> {
    let edited = match last_changed {
        InputSide::Source => source,
        InputSide::Destination => destination,
    };
    if !edited.amount.is_positive() {
        return None;
    }
    let amount = match edited.amount.to_base_units(edited.token.decimals) {
        Ok(amount) => amount,
        Err(err) => {
            tracing::warn!(%err, amount = %edited.amount, "Amount not representable in base units");
            return None;
        }
    };

    let pair = TokenPair::new(source.token.clone(), destination.token.clone());
    Some(QuoteRequest {
        sender,
        receiver,
        source: source.token.id(),
        destination: destination.token.id(),
        amount,
        direction: last_changed.direction(),
        slippage,
        bridge_id: bridge_id_for(&pair),
    })
}
