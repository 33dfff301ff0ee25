use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt::Display;
use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::info;

use crate::error::Ko2PathwayError;
use crate::summary::SummaryRow;

const CANVAS: u32 = 1400;
const INNER_RADIUS: f64 = 90.0;
const OUTER_RADIUS: f64 = 430.0;
const LABEL_GAP: f64 = 14.0;
const MAX_BAR_WIDTH: f64 = 0.25;
const ARC_SEGMENTS: usize = 12;
const LABEL_MAX_CHARS: usize = 42;

const BAR_FILL: RGBColor = RGBColor(135, 206, 235);
const GRID: RGBColor = RGBColor(211, 211, 211);
const GUIDE: RGBColor = RGBColor(150, 150, 150);

/// Renders `rows` as an SVG polar bar chart, one bar per pathway, clockwise from 12 o'clock.
pub fn render_circular_barplot(path: &Path, rows: &[SummaryRow]) -> Result<(), Ko2PathwayError> {
    let max_count = rows.iter().map(|row| row.ko_count).max().unwrap_or(0);
    if max_count == 0 {
        return Err(Ko2PathwayError::Plot("no pathways to plot".to_string()));
    }

    let root = SVGBackend::new(path, (CANVAS, CANVAS)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let center = (CANVAS as f64 / 2.0, CANVAS as f64 / 2.0);
    let ticks = radial_ticks(max_count);
    let scale_max = ticks.last().copied().unwrap_or(max_count).max(1) as f64;
    let radius_of = |count: usize| INNER_RADIUS + (OUTER_RADIUS - INNER_RADIUS) * count as f64 / scale_max;

    for &tick in &ticks {
        let ring = arc_points(center, radius_of(tick), 0.0, TAU, 120);
        root.draw(&PathElement::new(ring, GRID.stroke_width(1)))
            .map_err(plot_error)?;
        root.draw(&Text::new(
            tick.to_string(),
            to_pixel(center, radius_of(tick) + 4.0, 0.0),
            ("sans-serif", 11)
                .into_font()
                .color(&GUIDE)
                .pos(Pos::new(HPos::Left, VPos::Bottom)),
        ))
        .map_err(plot_error)?;
    }

    let step = TAU / rows.len() as f64;
    let half_width = (step * 0.8).min(MAX_BAR_WIDTH) / 2.0;
    for (index, row) in rows.iter().enumerate() {
        let angle = index as f64 * step;
        let top = radius_of(row.ko_count);

        root.draw(&PathElement::new(
            vec![
                to_pixel(center, top, angle),
                to_pixel(center, OUTER_RADIUS, angle),
            ],
            GUIDE.stroke_width(1),
        ))
        .map_err(plot_error)?;

        let outline = bar_polygon(center, INNER_RADIUS, top, angle - half_width, angle + half_width);
        root.draw(&Polygon::new(outline.clone(), BAR_FILL.filled()))
            .map_err(plot_error)?;
        let mut closed = outline;
        if let Some(first) = closed.first().copied() {
            closed.push(first);
        }
        root.draw(&PathElement::new(closed, BLACK.stroke_width(1)))
            .map_err(plot_error)?;

        let on_right = angle <= PI;
        let anchor = if on_right { HPos::Left } else { HPos::Right };
        root.draw(&Text::new(
            label_text(row),
            to_pixel(center, OUTER_RADIUS + LABEL_GAP, angle),
            ("sans-serif", 13)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(anchor, VPos::Center)),
        ))
        .map_err(plot_error)?;
    }

    root.present().map_err(plot_error)?;
    info!(path = %path.display(), pathways = rows.len(), "chart written");
    Ok(())
}

/// Ring values: `ceil(max / 5)` apart, ending at or above `max`.
pub fn radial_ticks(max: usize) -> Vec<usize> {
    if max == 0 {
        return Vec::new();
    }
    let step = max.div_ceil(5).max(1);
    (1..)
        .map(|i| i * step)
        .take_while(|&value| value < max + step)
        .collect()
}

/// Annular sector between two radii. Angles run clockwise from 12 o'clock.
pub fn bar_polygon(
    center: (f64, f64),
    inner: f64,
    outer: f64,
    start: f64,
    end: f64,
) -> Vec<(i32, i32)> {
    let mut points = arc_points(center, outer, start, end, ARC_SEGMENTS);
    let mut inner_arc = arc_points(center, inner, start, end, ARC_SEGMENTS);
    inner_arc.reverse();
    points.extend(inner_arc);
    points
}

fn arc_points(center: (f64, f64), radius: f64, start: f64, end: f64, segments: usize) -> Vec<(i32, i32)> {
    (0..=segments)
        .map(|i| {
            let angle = start + (end - start) * i as f64 / segments as f64;
            to_pixel(center, radius, angle)
        })
        .collect()
}

fn to_pixel(center: (f64, f64), radius: f64, angle: f64) -> (i32, i32) {
    let theta = angle - FRAC_PI_2;
    (
        (center.0 + radius * theta.cos()).round() as i32,
        (center.1 + radius * theta.sin()).round() as i32,
    )
}

fn label_text(row: &SummaryRow) -> String {
    let description = &row.pathway_description;
    let shortened = if description.chars().count() > LABEL_MAX_CHARS {
        let head: String = description.chars().take(LABEL_MAX_CHARS - 1).collect();
        format!("{}…", head.trim_end())
    } else {
        description.clone()
    };
    format!("{shortened} ({})", row.ko_count)
}

fn plot_error<E: Display>(err: E) -> Ko2PathwayError {
    Ko2PathwayError::Plot(err.to_string())
}
