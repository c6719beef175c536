//! Plain-text view of a [`PortalSnapshot`].

use portal_engine::PortalSnapshot;
use portal_engine::portal_core::WalletContext;
use portal_types::format::{HIGH_SLIPPAGE_WARNING, seconds_to_readable_time};
use portal_types::{ChainId, TokenSelection};

fn chain_label(chain: ChainId) -> String {
    chain
        .name()
        .map_or_else(|| format!("chain {chain}"), str::to_string)
}

fn side_line(label: &str, selection: &TokenSelection) -> String {
    let amount = if selection.amount.is_empty() {
        "0"
    } else {
        selection.amount.as_str()
    };
    let mut line = format!(
        "{label:<6}{amount} {} on {}",
        selection.token.symbol,
        chain_label(selection.token.chain_id)
    );
    if !selection.amount_usd.is_empty() {
        line.push_str(&format!("  ({})", selection.amount_usd));
    }
    line
}

fn wallet_line(wallet: &WalletContext) -> String {
    match (wallet.address, wallet.active_chain()) {
        (Some(address), Some(chain)) => format!("wallet {address} on {}", chain_label(chain)),
        _ => "wallet not connected".to_string(),
    }
}

#[must_use]
pub fn render(snapshot: &PortalSnapshot) -> String {
    let tabs: Vec<String> = snapshot
        .available_modes
        .iter()
        .map(|mode| {
            if *mode == snapshot.mode {
                format!("[{mode}]")
            } else {
                mode.to_string()
            }
        })
        .collect();

    let mut out = String::new();
    out.push_str(&tabs.join(" "));
    out.push('\n');
    out.push_str(&wallet_line(&snapshot.wallet));
    out.push('\n');
    out.push_str(&side_line("from", &snapshot.source));
    out.push('\n');
    out.push_str(&side_line("to", &snapshot.destination));
    out.push('\n');

    let figures = &snapshot.figures;
    out.push_str(&format!(
        "slippage {} | gas {} | fees {} | total {}\n",
        figures.slippage,
        figures.gas_fee_usd_display(),
        figures.application_fee_usd_display(),
        figures.total_fee_usd_display()
    ));
    if let Some(seconds) = figures.estimated_tx_time_seconds {
        out.push_str(&format!("time {}\n", seconds_to_readable_time(seconds)));
    }
    if snapshot.slippage_high {
        out.push_str(&format!("warning: {HIGH_SLIPPAGE_WARNING}\n"));
    }
    for warning in [&figures.time_warning, &figures.price_impact_warning]
        .into_iter()
        .flatten()
    {
        out.push_str(&format!("warning: {warning}\n"));
    }
    if let Some(notice) = snapshot.notice {
        out.push_str(&format!("notice: {notice}\n"));
    }

    let state = if snapshot.refreshing {
        " (quoting)"
    } else if snapshot.action_disabled {
        " (disabled)"
    } else {
        ""
    };
    out.push_str(&format!("> {}{state}", snapshot.action_label));
    out
}
