//! Chart assembly and the HTML page around it.

mod chart;
mod layout;
mod page;

use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use minify_html::{Cfg, minify};
use tracing::{debug, info};

use crate::config::ChartConfig;
use crate::location::Coordinates;
use crate::series::WeatherReport;

pub use layout::{
    AxisLabel, ChartLayout, ChartSummary, CurrentReading, PointLabel, SeriesLine, View,
    ValueTick, celsius_to_fahrenheit, format_temperature, layout_chart, summarize,
};

/// Everything needed to render one page.
#[derive(Clone, Copy, Debug)]
pub struct ChartRequest<'a> {
    pub report: &'a WeatherReport,
    pub coordinates: Coordinates,
    pub view: View,
    pub now: DateTime<Utc>,
    pub config: &'a ChartConfig,
}

/// Renders the page for `request` into a string.
pub fn render_page(request: &ChartRequest<'_>, minify_html: bool) -> Result<String, Box<dyn Error>> {
    let layout = layout_chart(
        request.report,
        request.coordinates,
        request.view,
        request.now,
        request.config,
    )?;
    debug!(
        labels = layout.labels.len(),
        nights = layout.nights.len(),
        axis_labels = layout.axis_labels.len(),
        "Chart laid out"
    );
    let summary = summarize(request.report, &layout, request.coordinates, request.now);
    let plot = chart::build_plot(&layout);
    let page = page::render_plot_page(&plot, &summary, Utc::now());

    if minify_html {
        let mut cfg = Cfg::new();
        cfg.minify_css = true;
        let minified = minify(page.as_bytes(), &cfg);
        return Ok(String::from_utf8(minified)?);
    }
    Ok(page)
}

/// Renders and writes the page, creating the output directory.
pub fn draw_weather_chart(
    request: &ChartRequest<'_>,
    output_html: &Path,
    minify_html: bool,
) -> Result<(), Box<dyn Error>> {
    let page = render_page(request, minify_html)?;
    if let Some(parent) = output_html.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_html, &page)?;
    info!(bytes = page.len(), path = %output_html.display(), "Wrote chart page");
    Ok(())
}
