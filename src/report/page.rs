//! HTML page wrapping the Plotly chart.

use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use plotly::Plot;

use super::layout::{ChartSummary, CurrentReading, View, format_temperature};
use crate::series::Point;

const PAGE_TITLE: &str = "Temperature & Dew Point";
const PAGE_DESCRIPTION: &str =
    "Hourly temperature and dew point forecast from the National Weather Service, with night shading.";
const PLOT_ID: &str = "weather-plot";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const SOURCE_URL: &str = "https://www.weather.gov/documentation/services-web-api";
const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
const READING_TIME_FORMAT: &str = "%a %-m/%-d %-I %p";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const MISSING: &str = "n/a";

#[allow(clippy::too_many_lines)]
pub(super) fn render_plot_page(
    plot: &Plot,
    summary: &ChartSummary,
    generated_at: DateTime<Utc>,
) -> String {
    let plot_html = plot.to_inline_html(Some(PLOT_ID));
    let generated_label = generated_at.format(GENERATED_AT_FORMAT).to_string();
    let coordinates_label = summary.coordinates.to_string();
    let zone_label = summary.zone.to_string();
    let reading_time = |point: &Point| {
        summary
            .zone
            .local(point.time)
            .format(READING_TIME_FORMAT)
            .to_string()
    };
    let extreme = |point: Option<&Point>| {
        point.map_or_else(
            || (MISSING.to_string(), String::new()),
            |p| (format!("{}F", format_temperature(p.value)), reading_time(p)),
        )
    };
    let (high_value, high_time) = extreme(summary.high.as_ref());
    let (low_value, low_time) = extreme(summary.low.as_ref());
    let view_label = match summary.view {
        View::Day => "Hourly view",
        View::Week => "Weekly view · daily highs and lows",
    };

    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="description" content=(PAGE_DESCRIPTION);
                title { (PAGE_TITLE) " · " (coordinates_label) }
                script src=(PLOTLY_CDN) {}
                style {
                    "
                    :root {
                        color-scheme: light;
                        --bg: #fafaf9;
                        --card: #ffffff;
                        --ink: #1c1917;
                        --muted: #78716c;
                        --border: rgba(28, 25, 23, 0.08);
                    }
                    * { box-sizing: border-box; }
                    body {
                        margin: 0;
                        background: var(--bg);
                        color: var(--ink);
                        font-family: \"IBM Plex Sans\", Arial, sans-serif;
                    }
                    .page {
                        max-width: 1240px;
                        margin: 32px auto 48px;
                        padding: 0 20px;
                    }
                    .title {
                        font-size: 22px;
                        font-weight: 600;
                        margin: 0;
                    }
                    .subtitle {
                        margin: 6px 0 18px;
                        color: var(--muted);
                        font-size: 13px;
                    }
                    .summary-grid {
                        display: grid;
                        grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
                        gap: 12px;
                        margin-bottom: 16px;
                    }
                    .summary-card {
                        background: var(--card);
                        border-radius: 14px;
                        padding: 12px 14px;
                        border: 1px solid var(--border);
                    }
                    .summary-label {
                        font-size: 11px;
                        text-transform: uppercase;
                        letter-spacing: 0.08em;
                        color: var(--muted);
                    }
                    .summary-value {
                        font-size: 20px;
                        font-weight: 600;
                        margin-top: 6px;
                    }
                    .summary-sub {
                        margin-top: 4px;
                        font-size: 12px;
                        color: var(--muted);
                    }
                    .card {
                        background: var(--card);
                        border-radius: 14px;
                        padding: 12px;
                        border: 1px solid var(--border);
                        overflow-x: auto;
                        overflow-y: hidden;
                    }
                    footer {
                        margin-top: 14px;
                        font-size: 12px;
                        color: var(--muted);
                        text-align: right;
                    }
                    footer a {
                        color: inherit;
                    }
                    "
                }
            }
            body {
                div class="page" {
                    header {
                        h1 class="title" { (PAGE_TITLE) }
                        p class="subtitle" {
                            (coordinates_label) " · " (view_label) " · times in " (zone_label)
                        }
                    }
                    section class="summary-grid" {
                        @for reading in &summary.current {
                            (current_card(reading, &reading_time))
                        }
                        div class="summary-card" {
                            div class="summary-label" { "High" }
                            div class="summary-value" { (high_value) }
                            div class="summary-sub" { (high_time) }
                        }
                        div class="summary-card" {
                            div class="summary-label" { "Low" }
                            div class="summary-value" { (low_value) }
                            div class="summary-sub" { (low_time) }
                        }
                    }
                    div class="card" {
                        (PreEscaped(plot_html))
                    }
                    footer {
                        "Version " (APP_VERSION) " · Generated " (generated_label) " · Data: "
                        a href=(SOURCE_URL) { "api.weather.gov" }
                    }
                }
            }
        }
    };
    page.into_string()
}

fn current_card(reading: &CurrentReading, reading_time: &impl Fn(&Point) -> String) -> Markup {
    html! {
        div class="summary-card" {
            div class="summary-label" { "Now · " (reading.label) }
            @match &reading.point {
                Some(point) => {
                    div class="summary-value" { (format_temperature(point.value)) "F" }
                    div class="summary-sub" { "as of " (reading_time(point)) }
                }
                None => {
                    div class="summary-value" { (MISSING) }
                    div class="summary-sub" { "no reading yet" }
                }
            }
        }
    }
}
