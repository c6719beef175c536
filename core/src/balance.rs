//! Wallet balance sufficiency for a quoted payment.

use portal_types::{Payment, Quote, U256};

use crate::errors::BridgeError;

/// Native-token fees the transaction costs: quote fees plus gas, in wei.
#[must_use]
pub fn total_native_fees(quote: &Quote, gas_fee_wei: U256) -> U256 {
    quote.total_fee_amount().saturating_add(gas_fee_wei)
}

/// Check whether the wallet can cover `payment` plus `total_fees`.
///
/// Paying in the native token, the balance must cover the amount and then
/// the amount plus fees. Paying in an ERC-20, the token balance covers the
/// amount and the native balance covers the fees. Unknown balances pass.
pub fn check_balance(
    payment: &Payment,
    total_fees: U256,
    native_balance: Option<U256>,
    token_balance: Option<U256>,
) -> Result<(), BridgeError> {
    if payment.is_native {
        let Some(balance) = native_balance else {
            return Ok(());
        };
        if balance < payment.amount {
            return Err(BridgeError::InsufficientFunds);
        }
        if balance < payment.amount.saturating_add(total_fees) {
            return Err(BridgeError::InsufficientFundsForFees);
        }
        return Ok(());
    }

    if let Some(balance) = token_balance
        && balance < payment.amount
    {
        return Err(BridgeError::InsufficientFunds);
    }
    if let Some(balance) = native_balance
        && balance < total_fees
    {
        return Err(BridgeError::InsufficientFundsForFees);
    }
    Ok(())
}
