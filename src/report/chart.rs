//! Plotly figure for a laid-out chart.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use plotly::color::{Rgb, Rgba};
use plotly::common::{Anchor, Font, HoverInfo, Line, LineShape, Marker, Mode, TickMode};
use plotly::layout::{
    Annotation, Axis, AxisType, Layout, Margin, Shape, ShapeLayer, ShapeLine, ShapeType,
};
use plotly::{Configuration, Plot, Scatter};

use super::layout::{ChartLayout, PointLabel, format_temperature};
use crate::color::Color;
use crate::placement::{Baseline, TextAnchor};
use crate::scale::millis;

const AXIS_REF_X: &str = "x";
const AXIS_REF_Y: &str = "y";
const AXIS_REF_PAPER: &str = "paper";
const FONT_FAMILY: &str = "IBM Plex Sans, Arial, sans-serif";
const HOVER_TIME_FORMAT: &str = "%a %-m/%-d %H:%M";
const FONT_SIZE_BASE: usize = 12;
const FONT_SIZE_LABEL: usize = 12;
const FONT_SIZE_TICK: usize = 11;
const LINE_WIDTH_SERIES: f64 = 2.0;
const LINE_WIDTH_GRID: f64 = 1.0;
const MARKER_SIZE: usize = 7;
const MARKER_OUTLINE_WIDTH: f64 = 2.0;
const MARGIN_BOTTOM: usize = 18;
const COLOR_TEXT_BASE: (u8, u8, u8) = (120, 113, 108);
const COLOR_GRID: (u8, u8, u8) = (245, 245, 244);
const COLOR_NIGHT: (u8, u8, u8, f64) = (120, 113, 108, 0.05);
const COLOR_BACKGROUND: (u8, u8, u8) = (255, 255, 255);

fn rgb(color: (u8, u8, u8)) -> Rgb {
    Rgb::new(color.0, color.1, color.2)
}

fn rgba(color: (u8, u8, u8, f64)) -> Rgba {
    Rgba::new(color.0, color.1, color.2, color.3)
}

fn plotly_color(color: Color) -> Rgb {
    rgb(color.to_rgb8())
}

const fn x_anchor(anchor: TextAnchor) -> Anchor {
    match anchor {
        TextAnchor::Start => Anchor::Left,
        TextAnchor::Middle => Anchor::Center,
        TextAnchor::End => Anchor::Right,
    }
}

const fn y_anchor(baseline: Baseline) -> Anchor {
    match baseline {
        Baseline::Top => Anchor::Top,
        Baseline::Middle => Anchor::Middle,
        Baseline::Bottom => Anchor::Bottom,
    }
}

/// Builds the figure; pixel sizes match the layout so placement offsets hold.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn build_plot(layout: &ChartLayout) -> Plot {
    let mut plot = Plot::new();
    let hover_time = |time: DateTime<Utc>| {
        layout.zone.local(time).format(HOVER_TIME_FORMAT).to_string()
    };

    for line in &layout.lines {
        let (xs, ys): (Vec<f64>, Vec<f64>) = line
            .points
            .iter()
            .map(|p| (millis(p.time), p.value))
            .unzip();
        let hover = line
            .points
            .iter()
            .map(|p| format!("{} · {}F", hover_time(p.time), format_temperature(p.value)))
            .collect_vec();
        plot.add_trace(
            Scatter::new(xs, ys)
                .mode(Mode::Lines)
                .name(&line.label)
                .line(
                    Line::new()
                        .color(plotly_color(line.color))
                        .width(LINE_WIDTH_SERIES)
                        .shape(LineShape::Spline),
                )
                .text_array(hover)
                .hover_info(HoverInfo::Text),
        );
    }

    for (series, labels) in &layout.labels.iter().chunk_by(|label| label.series.clone()) {
        let labels = labels.collect_vec();
        let xs = labels.iter().map(|l| millis(l.point.time)).collect_vec();
        let ys = labels.iter().map(|l| l.point.value).collect_vec();
        let colors = labels
            .iter()
            .map(|l| plotly_color(l.marker_color))
            .collect_vec();
        plot.add_trace(
            Scatter::new(xs, ys)
                .mode(Mode::Markers)
                .name(&series)
                .show_legend(false)
                .hover_info(HoverInfo::Skip)
                .marker(
                    Marker::new()
                        .size(MARKER_SIZE)
                        .color_array(colors)
                        .line(
                            Line::new()
                                .color(rgb(COLOR_BACKGROUND))
                                .width(MARKER_OUTLINE_WIDTH),
                        ),
                ),
        );
    }

    let annotations = layout.labels.iter().map(label_annotation).collect_vec();

    let grid_lines = layout.axis_labels.iter().map(|label| {
        let x = millis(label.boundary.start);
        Shape::new()
            .shape_type(ShapeType::Line)
            .layer(ShapeLayer::Below)
            .x_ref(AXIS_REF_X)
            .y_ref(AXIS_REF_PAPER)
            .x0(x)
            .x1(x)
            .y0(0)
            .y1(1)
            .line(ShapeLine::new().color(rgb(COLOR_GRID)).width(LINE_WIDTH_GRID))
    });
    let value_grid_lines = layout.value_ticks.iter().map(|tick| {
        Shape::new()
            .shape_type(ShapeType::Line)
            .layer(ShapeLayer::Below)
            .x_ref(AXIS_REF_PAPER)
            .y_ref(AXIS_REF_Y)
            .x0(0)
            .x1(1)
            .y0(tick.value)
            .y1(tick.value)
            .line(ShapeLine::new().color(rgb(COLOR_GRID)).width(LINE_WIDTH_GRID))
    });
    let night_shading = layout.nights.iter().map(|night| {
        Shape::new()
            .shape_type(ShapeType::Rect)
            .layer(ShapeLayer::Below)
            .x_ref(AXIS_REF_X)
            .y_ref(AXIS_REF_PAPER)
            .x0(millis(night.start))
            .x1(millis(night.end))
            .y0(0)
            .y1(1)
            .fill_color(rgba(COLOR_NIGHT))
            .line(ShapeLine::new().width(0.0))
    });
    let shapes = grid_lines
        .chain(value_grid_lines)
        .chain(night_shading)
        .collect_vec();

    let [x0, x1] = layout.x_domain;
    let plot_layout = Layout::new()
        .font(
            Font::new()
                .family(FONT_FAMILY)
                .size(FONT_SIZE_BASE)
                .color(rgb(COLOR_TEXT_BASE)),
        )
        .width(layout.width.round() as usize)
        .height(layout.height.round() as usize)
        .margin(Margin::new().left(0).right(0).top(0).bottom(MARGIN_BOTTOM).pad(0))
        .plot_background_color(rgb(COLOR_BACKGROUND))
        .paper_background_color(rgb(COLOR_BACKGROUND))
        .show_legend(false)
        .annotations(annotations)
        .shapes(shapes)
        .x_axis(
            Axis::new()
                .type_(AxisType::Date)
                .range(vec![millis(x0), millis(x1)])
                .fixed_range(true)
                .show_grid(false)
                .zero_line(false)
                .tick_mode(TickMode::Array)
                .tick_values(
                    layout
                        .axis_labels
                        .iter()
                        .map(|label| millis(label.boundary.midpoint()))
                        .collect_vec(),
                )
                .tick_text(layout.axis_labels.iter().map(|l| l.text.clone()).collect_vec())
                .tick_font(Font::new().size(FONT_SIZE_TICK)),
        )
        .y_axis(
            Axis::new()
                .range(layout.y_range.to_vec())
                .fixed_range(true)
                .show_tick_labels(false)
                .show_grid(false)
                .zero_line(false),
        );

    plot.set_layout(plot_layout);
    plot.set_configuration(
        Configuration::new()
            .responsive(false)
            .display_logo(false),
    );
    plot
}

fn label_annotation(label: &PointLabel) -> Annotation {
    let decision = label.decision;
    Annotation::new()
        .text(label.text.clone())
        .x(millis(label.point.time))
        .y(label.point.value)
        .x_anchor(x_anchor(decision.anchor))
        .y_anchor(y_anchor(decision.baseline))
        .x_shift(decision.offset_x)
        // Plotly shifts up for positive y; placement offsets grow downwards.
        .y_shift(-decision.offset_y)
        .show_arrow(false)
        .font(
            Font::new()
                .size(FONT_SIZE_LABEL)
                .color(plotly_color(label.text_color)),
        )
}
