use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::NaiveDate;
use serde_json::{Value, json};
use treasury_core::aggregate::dto::field_name;
use treasury_core::export::dto::ExportedDailyRow;
use treasury_core::helpers::dates::{DAY_KEY_FORMAT, parse_day};

use crate::{
    error::ErrorServer,
    inflows::dto::{AXS_PAGE, CategoryTotal, DayPoint, InflowPage, InflowView, RangeQuery, WETH_PAGE},
    render::{bar_chart, embed_chart, escape, format_amount, layout, metric},
    state::ServerState,
};

pub async fn axs_inflows(
    State(server_state): State<Arc<ServerState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Html<String>, ErrorServer> {
    inflow_page(&AXS_PAGE, &server_state, &query).await
}

pub async fn weth_inflows(
    State(server_state): State<Arc<ServerState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Html<String>, ErrorServer> {
    inflow_page(&WETH_PAGE, &server_state, &query).await
}

async fn inflow_page(
    page: &InflowPage,
    server_state: &ServerState,
    query: &RangeQuery,
) -> Result<Html<String>, ErrorServer> {
    let start = parse_query_day("start", query.start.as_deref())?;
    let end = parse_query_day("end", query.end.as_deref())?;

    let rows = server_state.frontend_rows().await?;
    let view = build_inflow_view(page, &rows, start, end)?;

    let price = server_state
        .currency()
        .await
        .ok()
        .and_then(|snapshots| snapshots.last().and_then(|latest| latest.price(page.symbol)));

    Ok(Html(render_inflows(page, &view, price)))
}

fn parse_query_day(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ErrorServer> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => parse_day(raw)
            .map(Some)
            .ok_or_else(|| ErrorServer::bad_request(format!("`{}` must be a YYYY-MM-DD date, got `{}`", name, raw))),
        None => Ok(None),
    }
}

/// Daily and running totals of the page's categories between `start` and `end`
/// (inclusive). Missing fields count as zero.
pub fn build_inflow_view(
    page: &InflowPage,
    rows: &[ExportedDailyRow],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<InflowView, ErrorServer> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(ErrorServer::unavailable("No daily data has been exported yet"));
    };

    let start = start.or(page.default_start()).unwrap_or(first.day());
    let end = end.unwrap_or(last.day());
    if start > end {
        return Err(ErrorServer::bad_request(format!(
            "start {} is after end {}",
            start.format(DAY_KEY_FORMAT),
            end.format(DAY_KEY_FORMAT)
        )));
    }

    let fields: Vec<String> = page
        .categories
        .iter()
        .map(|category| field_name(page.symbol, *category))
        .collect();

    let mut running = vec![0.0; fields.len()];
    let mut totals = vec![0.0; fields.len()];
    let mut points = Vec::new();

    for row in rows {
        let day = row.day();
        let in_range = day >= start && day <= end;
        if !in_range && !(page.cumulative_from_origin && day < start) {
            continue;
        }

        let daily: Vec<f64> = fields.iter().map(|field| row.value(field)).collect();
        for (i, value) in daily.iter().enumerate() {
            running[i] += value;
        }

        if in_range {
            for (i, value) in daily.iter().enumerate() {
                totals[i] += value;
            }
            points.push(DayPoint {
                day,
                daily,
                cumulative: running.clone(),
            });
        }
    }

    let totals: Vec<CategoryTotal> = page
        .categories
        .iter()
        .zip(totals)
        .map(|(category, total)| CategoryTotal {
            category: *category,
            total,
        })
        .collect();

    Ok(InflowView {
        start,
        end,
        total: totals.iter().map(|t| t.total).sum(),
        totals,
        points,
    })
}

fn render_inflows(page: &InflowPage, view: &InflowView, price: Option<f64>) -> String {
    let symbol = page.symbol;
    let headline = match price {
        Some(price) => format!(
            "Total {}: {} (${})",
            symbol,
            format_amount(view.total),
            format_amount(view.total * price)
        ),
        None => format!(
            "Total {}: {} (Price data not available)",
            symbol,
            format_amount(view.total)
        ),
    };

    let metrics = if view.totals.len() > 1 {
        let boxes: String = view
            .totals
            .iter()
            .map(|t| metric(t.category.display_name(), &format_amount(t.total)))
            .collect();
        format!(r#"<div class="metrics">{}</div>"#, boxes)
    } else {
        String::new()
    };

    let stacked = view.totals.len() > 1;
    let mut cumulative = Vec::new();
    let mut daily = Vec::new();
    for point in &view.points {
        let date = point.day.format(DAY_KEY_FORMAT).to_string();
        for (i, total) in view.totals.iter().enumerate() {
            let category = total.category.display_name();
            cumulative.push(chart_value(&date, category, symbol, point.cumulative[i]));
            daily.push(chart_value(&date, category, symbol, point.daily[i]));
        }
    }
    let color = stacked.then_some("category");

    let cumulative_chart = bar_chart(
        &format!("Cumulative Sum of {} Values", symbol),
        cumulative,
        symbol,
        &format!("Cumulative {}", symbol),
        color,
    );
    let daily_chart = bar_chart(
        &format!("Daily {} Values", symbol),
        daily,
        symbol,
        &format!("Daily {}", symbol),
        color,
    );

    let body = format!(
        r#"<h1 class="center">{title}</h1>
<form method="get" class="center">
<label>Start date <input type="date" name="start" value="{start}"></label>
<label>End date <input type="date" name="end" value="{end}"></label>
<button type="submit">Apply</button>
</form>
<h3 class="center">{headline}</h3>
{metrics}
{cumulative}
{daily}"#,
        title = escape(page.title),
        start = view.start.format(DAY_KEY_FORMAT),
        end = view.end.format(DAY_KEY_FORMAT),
        headline = escape(&headline),
        cumulative = embed_chart("cumulative", &cumulative_chart),
        daily = embed_chart("daily", &daily_chart),
    );

    layout(page.title, &body)
}

fn chart_value(date: &str, category: &str, symbol: &str, value: f64) -> Value {
    let mut point = json!({"date": date, "category": category});
    point[symbol] = json!(value);
    point
}
