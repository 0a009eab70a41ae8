use serde_json::{Value, json};

const VEGA_SCRIPTS: &str = r#"<script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
<script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>"#;

const STYLE: &str = r#"<style>
body { font-family: sans-serif; max-width: 1100px; margin: 0 auto; padding: 1rem; color: #222; }
nav a { margin-right: 1rem; }
.metrics { display: flex; gap: 1rem; flex-wrap: wrap; }
.metric { border: 1px solid #ddd; border-radius: 6px; padding: 0.75rem 1rem; min-width: 180px; }
.metric .label { color: #777; font-size: 0.9em; }
.metric .value { font-size: 1.4em; font-weight: bold; }
.center { text-align: center; }
.error { color: #b00020; }
.chart { width: 100%; margin: 1.5rem 0; }
</style>"#;

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
{STYLE}
{VEGA_SCRIPTS}
</head>
<body>
<nav><a href="/">Home</a><a href="/axs">AXS inflows</a><a href="/weth">WETH inflows</a><a href="/balance">Treasury balance</a></nav>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Two decimals with thousands separators: `1234567.891` -> `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn metric(label: &str, value: &str) -> String {
    format!(
        r#"<div class="metric"><div class="label">{}</div><div class="value">{}</div></div>"#,
        escape(label),
        escape(value)
    )
}

/// Bar chart over `values`, one bar per (date, category) when `color` is set.
pub fn bar_chart(title: &str, values: Vec<Value>, y_field: &str, y_title: &str, color: Option<&str>) -> Value {
    let mut encoding = json!({
        "x": {"field": "date", "type": "temporal", "title": "Date", "axis": {"format": "%d-%m-%Y"}},
        "y": {"field": y_field, "type": "quantitative", "title": y_title},
        "tooltip": [
            {"field": "date", "type": "temporal", "title": "Date"},
            {"field": y_field, "type": "quantitative", "title": y_title, "format": ",.2f"}
        ]
    });
    if let Some(color) = color {
        encoding["color"] = json!({"field": color, "type": "nominal", "title": "Category"});
        if let Some(tooltip) = encoding["tooltip"].as_array_mut() {
            tooltip.push(json!({"field": color, "type": "nominal", "title": "Category"}));
        }
    }

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": title,
        "width": "container",
        "height": 320,
        "data": {"values": values},
        "mark": "bar",
        "encoding": encoding,
        "params": [{"name": "zoom", "select": "interval", "bind": "scales"}]
    })
}

pub fn embed_chart(id: &str, spec: &Value) -> String {
    // `</` inside the JSON would close the script element.
    let spec = spec.to_string().replace("</", "<\\/");
    format!(
        r##"<div id="{id}" class="chart"></div>
<script>vegaEmbed("#{id}", {spec}, {{"actions": false}});</script>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1500.5), "-1,500.50");
        assert_eq!(format_amount(-0.001), "0.00");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("R&C <Mint>"), "R&amp;C &lt;Mint&gt;");
    }

    #[test]
    fn test_chart_spec_has_category_color() {
        let spec = bar_chart("Daily", vec![json!({"date": "2024-01-01", "AXS": 1.0})], "AXS", "Daily AXS", Some("category"));
        assert_eq!(spec["encoding"]["color"]["field"], "category");
        assert_eq!(spec["data"]["values"][0]["AXS"], 1.0);
        assert!(embed_chart("daily", &spec).contains("vegaEmbed(\"#daily\""));
    }
}
