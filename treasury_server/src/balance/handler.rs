use std::sync::Arc;

use axum::{extract::State, response::Html};
use chrono::{DateTime, Utc};
use treasury_core::aggregate::dto::field_name;
use treasury_core::config::{AXS, WETH};
use treasury_core::export::dto::ExportedDailyRow;
use treasury_core::snapshots::dto::{BalanceSnapshot, CurrencySnapshot};
use treasury_core::transfers::dto::FeeCategory;

use crate::{
    error::ErrorServer,
    render::{format_amount, layout, metric},
    state::ServerState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub as_of: DateTime<Utc>,
    pub axs_price: f64,
    pub weth_price: f64,
    pub axs: f64,
    pub weth: f64,
    /// WETH received as marketplace fees over every exported day.
    pub weth_accumulated: f64,
    pub weth_unbacked: f64,
    pub weth_unbacked_pct: Option<f64>,
}

pub async fn balance_page(
    State(server_state): State<Arc<ServerState>>,
) -> Result<Html<String>, ErrorServer> {
    let balances = server_state.balance().await?;
    let currency = server_state.currency().await?;
    let rows = server_state.frontend_rows().await?;

    let view = build_balance_view(&balances, &currency, &rows)?;
    Ok(Html(render_balance(&view)))
}

pub fn build_balance_view(
    balances: &[BalanceSnapshot],
    currency: &[CurrencySnapshot],
    rows: &[ExportedDailyRow],
) -> Result<BalanceView, ErrorServer> {
    let balance = balances
        .last()
        .ok_or_else(|| ErrorServer::unavailable("No balance snapshot has been exported yet"))?;
    let prices = currency
        .last()
        .ok_or_else(|| ErrorServer::unavailable("No currency snapshot has been exported yet"))?;

    let price = |symbol: &str| {
        prices
            .price(symbol)
            .ok_or_else(|| ErrorServer::unavailable(format!("Latest currency snapshot has no {} price", symbol)))
    };

    let weth = balance.scaled_balance(WETH.symbol);
    let marketplace = field_name(WETH.symbol, FeeCategory::Marketplace);
    let weth_accumulated: f64 = rows.iter().map(|row| row.value(&marketplace)).sum();
    let weth_unbacked = weth - weth_accumulated;

    Ok(BalanceView {
        as_of: prices.timestamp,
        axs_price: price(AXS.symbol)?,
        weth_price: price(WETH.symbol)?,
        axs: balance.scaled_balance(AXS.symbol),
        weth,
        weth_accumulated,
        weth_unbacked,
        weth_unbacked_pct: (weth > 0.0).then(|| (1.0 - weth_accumulated / weth) * 100.0),
    })
}

fn render_balance(view: &BalanceView) -> String {
    let unbacked_pct = view
        .weth_unbacked_pct
        .map(|pct| format!(" ({:.2}%)", pct))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Treasury Balance</h1>
<h5>As of: {as_of}</h5>
<p><strong>WETH Price:</strong> ${weth_price} | <strong>AXS Price:</strong> ${axs_price}</p>
<div class="metrics">
{weth}
{axs}
</div>
<h4>WETH Accumulated Since the Hack: {accumulated}</h4>
<h4>Unbacked WETH from the Hack: {unbacked}<strong>{unbacked_pct}</strong></h4>
<p>The <strong>{unbacked} ETH</strong> compromised from the Axie DAO treasury remains undercollateralized while recovery of the funds is pursued.</p>"#,
        as_of = view.as_of.format("%d %B %Y, %H:%M:%S"),
        weth_price = format_amount(view.weth_price),
        axs_price = format_amount(view.axs_price),
        weth = metric(
            "WETH",
            &format!("{} (${})", format_amount(view.weth), format_amount(view.weth * view.weth_price))
        ),
        axs = metric(
            "AXS",
            &format!("{} (${})", format_amount(view.axs), format_amount(view.axs * view.axs_price))
        ),
        accumulated = format_amount(view.weth_accumulated),
        unbacked = format_amount(view.weth_unbacked),
    );

    layout("Treasury Balance", &body)
}
