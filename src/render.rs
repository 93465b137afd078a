use crate::chart::{Chart, Geom, Panel, Style};
use anyhow::{anyhow, Error, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_SIZE: (u32, u32) = (960, 640);

const CHAIN_COLORS: [RGBColor; 6] = [
    RGBColor(0x01, 0x1f, 0x4b),
    RGBColor(0x03, 0x39, 0x6c),
    RGBColor(0x00, 0x5b, 0x96),
    RGBColor(0x64, 0x97, 0xb1),
    RGBColor(0xb3, 0xcd, 0xe0),
    RGBColor(0xd1, 0xe1, 0xec),
];

fn color(style: Style) -> RGBColor {
    match style {
        Style::Chain(c) => CHAIN_COLORS[c % CHAIN_COLORS.len()],
        Style::Highlight | Style::Dark | Style::High => RGBColor(0x01, 0x1f, 0x4b),
        Style::Muted => RGBColor(0xd1, 0xe1, 0xec),
        Style::Divergence => RGBColor(0xd7, 0x30, 0x27),
        Style::Warmup => RGBColor(0xe5, 0xe5, 0xe5),
        Style::Reference => RGBColor(0x80, 0x80, 0x80),
        Style::Light | Style::Low => RGBColor(0xb3, 0xcd, 0xe0),
        Style::Ok => RGBColor(0x64, 0x97, 0xb1),
    }
}

fn draw_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> Error {
    anyhow!("Failed to render chart: {}", e)
}

fn padded(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.04;
            (lo - pad, hi + pad)
        }
        Some((lo, _)) => (lo - 0.5, lo + 0.5),
        None => (0.0, 1.0),
    }
}

/// Renders `chart` as an SVG document.
pub fn render_svg(chart: &Chart, size: (u32, u32)) -> Result<String, Error> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_chart(&root, chart)?;
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Renders `chart` as SVG and writes it to `path`.
pub fn save_svg<P: AsRef<Path>>(chart: &Chart, path: P, size: (u32, u32)) -> Result<(), Error> {
    let path = path.as_ref();
    let svg = render_svg(chart, size)?;
    std::fs::write(path, svg).map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
    debug!(path = %path.display(), "wrote chart");
    Ok(())
}

fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    chart: &Chart,
) -> Result<(), Error> {
    if chart.panels.is_empty() {
        return Err(anyhow!("Chart has no panels to render"));
    }
    root.fill(&WHITE).map_err(draw_err)?;
    let n = chart.panels.len();
    let ncol = chart.ncol.unwrap_or_else(|| n.min(3)).clamp(1, n);
    let nrow = (n + ncol - 1) / ncol;
    let areas = root.split_evenly((nrow, ncol));
    for (panel, area) in chart.panels.iter().zip(areas.iter()) {
        draw_panel(area, chart, panel)?;
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    chart: &Chart,
    panel: &Panel,
) -> Result<(), Error> {
    let (x0, x1) = chart.x_limits.unwrap_or_else(|| padded(panel.x_extent()));
    let (y0, y1) = chart.y_limits.unwrap_or_else(|| padded(panel.y_extent()));
    let in_window = |x: f64| x >= x0 && x <= x1;

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(8)
        .x_label_area_size(36)
        .y_label_area_size(if chart.y_ticks.is_empty() { 50 } else { 90 });
    if !panel.label.is_empty() {
        builder.caption(panel.label.as_str(), ("sans-serif", 16));
    }
    let mut ctx = builder.build_cartesian_2d(x0..x1, y0..y1).map_err(draw_err)?;

    let ticks = &chart.y_ticks;
    let y_format = |y: &f64| {
        if ticks.is_empty() {
            format!("{:.2}", y)
        } else {
            ticks
                .iter()
                .find(|(t, _)| (t - y).abs() < 0.25)
                .map(|(_, label)| label.clone())
                .unwrap_or_default()
        }
    };
    {
        let mut mesh = ctx.configure_mesh();
        mesh.disable_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .y_label_formatter(&y_format);
        if !ticks.is_empty() {
            mesh.y_labels(ticks.len() * 2 + 1);
        }
        mesh.draw().map_err(draw_err)?;
    }

    for layer in &panel.layers {
        let c = color(layer.style);
        match &layer.geom {
            Geom::Line { points } => {
                let visible = points.iter().copied().filter(|(x, _)| in_window(*x));
                ctx.draw_series(LineSeries::new(visible, c.stroke_width(1)))
                    .map_err(draw_err)?;
            }
            Geom::Points { points } => {
                ctx.draw_series(
                    points
                        .iter()
                        .filter(|(x, _)| in_window(*x))
                        .map(|p| Circle::new(*p, 2, c.filled())),
                )
                .map_err(draw_err)?;
            }
            Geom::Rects { rects } => {
                ctx.draw_series(rects.iter().map(|r| {
                    let left = r.x0.max(x0);
                    let right = r.x1.min(x1).max(left);
                    Rectangle::new([(left, r.y0), (right, r.y1)], c.mix(0.8).filled())
                }))
                .map_err(draw_err)?;
            }
            Geom::Segments { segments } => {
                ctx.draw_series(segments.iter().map(|s| {
                    PathElement::new(vec![(s.x0, s.y0), (s.x1, s.y1)], c.stroke_width(2))
                }))
                .map_err(draw_err)?;
            }
            Geom::Rug { xs } => {
                let tick = (y1 - y0) * 0.03;
                ctx.draw_series(xs.iter().filter(|x| in_window(**x)).map(|x| {
                    PathElement::new(vec![(*x, y0), (*x, y0 + tick)], c.stroke_width(1))
                }))
                .map_err(draw_err)?;
            }
            Geom::HLine { y } => {
                ctx.draw_series(std::iter::once(PathElement::new(
                    vec![(x0, *y), (x1, *y)],
                    c.stroke_width(1),
                )))
                .map_err(draw_err)?;
            }
            Geom::VLine { x } => {
                ctx.draw_series(std::iter::once(PathElement::new(
                    vec![(*x, y0), (*x, y1)],
                    c.stroke_width(1),
                )))
                .map_err(draw_err)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divergences::Divergences;
    use crate::plots::{self, fixtures, IntervalOptions, TraceOptions};

    #[test]
    fn test_render_trace_with_overlays() {
        let mut flags = vec![0.0; 40];
        flags[7] = 1.0;
        let options = TraceOptions::new()
            .n_warmup(10)
            .window(5.0, 35.0)
            .divergences(Divergences::from_vector(&flags).unwrap());
        let chart = plots::trace(&fixtures::draws(40, 2), &options).unwrap();
        let svg = render_svg(&chart, DEFAULT_SIZE).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("alpha"));
    }

    #[test]
    fn test_render_categorical_chart() {
        let chart = plots::intervals(&fixtures::draws(40, 2), &IntervalOptions::new()).unwrap();
        assert!(render_svg(&chart, (400, 300)).unwrap().contains("</svg>"));
    }

    #[test]
    fn test_save_svg_writes_file() {
        let path = std::env::temp_dir().join(format!("mcmc-plots-{}.svg", std::process::id()));
        let chart = plots::trace(&fixtures::draws(20, 2), &TraceOptions::new()).unwrap();
        save_svg(&chart, &path, (480, 320)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(written.contains("<svg"));
        assert!(written.contains("sigma"));

        let missing = std::env::temp_dir().join("mcmc-plots-missing-dir").join("chart.svg");
        assert!(save_svg(&chart, missing, (480, 320)).is_err());
    }

    #[test]
    fn test_render_empty_chart_fails() {
        assert!(render_svg(&Chart::new("", ""), DEFAULT_SIZE).is_err());
    }
}
