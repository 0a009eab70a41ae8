use axum::response::Html;

use treasury_core::transfers::dto::FeeCategory;

use crate::render::{escape, layout};

pub async fn home() -> Html<String> {
    let sources = FeeCategory::AGGREGATED
        .iter()
        .map(|category| format!("<li>{}</li>", escape(category.display_name())))
        .collect::<String>();

    let body = format!(
        r#"<h1>The Axie Infinity Treasury</h1>
<p>The community treasury collects part of the value moved by in-game actions. Inflows are tracked per source:</p>
<ul>{sources}</ul>
<p>These charts show how many tokens reach the treasury from each source, to help with distribution decisions.</p>
<ul>
<li><a href="/axs">AXS daily inflows and accumulation</a></li>
<li><a href="/weth">WETH daily inflows and accumulation</a></li>
<li><a href="/balance">Treasury balance</a></li>
</ul>"#
    );

    Html(layout("Axie Infinity Treasury", &body))
}
