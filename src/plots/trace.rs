use super::{prepare_setters, Prepare};
use crate::chart::{Chart, Geom, Layer, Panel, Rect, Style};
use crate::divergences::Divergences;
use crate::draws::Draws;
use anyhow::{anyhow, Error, Result};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TraceOptions {
    prepare: Prepare,
    window: Option<(f64, f64)>,
    n_warmup: usize,
    divergences: Option<Divergences>,
}

impl TraceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    /// Shows only iterations `start..=end`; the data are kept.
    pub fn window(mut self, start: f64, end: f64) -> Self {
        self.window = Some((start, end));
        self
    }

    /// Shades the first `n` iterations as warm-up.
    pub fn n_warmup(mut self, n: usize) -> Self {
        self.n_warmup = n;
        self
    }

    /// Marks divergent iterations below the traces.
    pub fn divergences(mut self, divergences: Divergences) -> Self {
        self.divergences = Some(divergences);
        self
    }
}

fn trace_line(draws: &Draws, p: usize, c: usize) -> Geom {
    Geom::Line {
        points: draws
            .chain(p, c)
            .iter()
            .enumerate()
            .map(|(i, v)| ((i + 1) as f64, *v))
            .collect(),
    }
}

fn warmup_layer(draws: &Draws, p: usize, n_warmup: usize) -> Option<Layer> {
    if n_warmup == 0 {
        return None;
    }
    let pooled = draws.pooled(p);
    let lo = pooled.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = pooled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(Layer::new(
        "warmup",
        Style::Warmup,
        Geom::Rects {
            rects: vec![Rect {
                x0: 0.0,
                x1: n_warmup as f64,
                y0: lo,
                y1: hi,
            }],
        },
    ))
}

/// Trace plot: one line per chain in a panel per parameter, with optional
/// warm-up shading, iteration window and divergence rug.
pub fn trace(draws: &Draws, options: &TraceOptions) -> Result<Chart, Error> {
    let draws = options.prepare.apply(draws)?;
    if let Some((start, end)) = options.window {
        if !(start.is_finite() && end.is_finite()) || start >= end {
            return Err(anyhow!(
                "Iteration window must be an increasing pair of finite numbers, got ({}, {})",
                start,
                end
            ));
        }
    }
    if options.n_warmup > draws.num_iterations() {
        return Err(anyhow!(
            "n_warmup ({}) exceeds the number of iterations ({})",
            options.n_warmup,
            draws.num_iterations()
        ));
    }
    let divergences = match &options.divergences {
        Some(d) => Some(d.align(&draws)?),
        None => None,
    };

    let mut chart = Chart::new("Iteration", "");
    chart.x_limits = options.window;
    for (p, name) in draws.parameters().iter().enumerate() {
        let mut panel = Panel::new(name.as_str());
        if let Some(layer) = warmup_layer(&draws, p, options.n_warmup) {
            panel.push(layer);
        }
        for c in 0..draws.num_chains() {
            panel.push(Layer::new("draws", Style::Chain(c), trace_line(&draws, p, c)));
        }
        if let Some(div) = divergences.as_ref().filter(|d| !d.is_empty()) {
            for c in 0..draws.num_chains() {
                let xs: Vec<f64> = div.iterations(c).into_iter().map(|i| i as f64).collect();
                if !xs.is_empty() {
                    panel.push(Layer::new("divergences", Style::Divergence, Geom::Rug { xs }));
                }
            }
        }
        chart.push_panel(panel);
    }
    if let Some(notice) = divergences.as_ref().and_then(|d| d.notice()) {
        chart.notice(notice);
    }
    debug!(panels = chart.panels.len(), "assembled trace plot");
    Ok(chart)
}

#[derive(Debug, Clone)]
pub struct TraceHighlightOptions {
    prepare: Prepare,
    highlight: usize,
}

impl Default for TraceHighlightOptions {
    fn default() -> Self {
        TraceHighlightOptions {
            prepare: Prepare::default(),
            highlight: 1,
        }
    }
}

impl TraceHighlightOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    /// 1-based chain to highlight.
    pub fn highlight(mut self, chain: usize) -> Self {
        self.highlight = chain;
        self
    }
}

/// Trace plot with every chain muted except one.
pub fn trace_highlight(draws: &Draws, options: &TraceHighlightOptions) -> Result<Chart, Error> {
    draws.require_multiple_chains("trace_highlight")?;
    let draws = options.prepare.apply(draws)?;
    if options.highlight == 0 || options.highlight > draws.num_chains() {
        return Err(anyhow!(
            "highlight must be a chain between 1 and {}, got {}",
            draws.num_chains(),
            options.highlight
        ));
    }
    let highlighted = options.highlight - 1;

    let mut chart = Chart::new("Iteration", "");
    for (p, name) in draws.parameters().iter().enumerate() {
        let mut panel = Panel::new(name.as_str());
        for c in (0..draws.num_chains()).filter(|c| *c != highlighted) {
            panel.push(Layer::new("draws", Style::Muted, trace_line(&draws, p, c)));
        }
        panel.push(Layer::new(
            "highlight",
            Style::Highlight,
            trace_line(&draws, p, highlighted),
        ));
        chart.push_panel(panel);
    }
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divergences::NO_DIVERGENCES;
    use crate::plots::fixtures;
    use crate::transform::{Transformation, Transformations};
    use ndarray::Array2;

    #[test]
    fn test_one_line_per_chain_per_parameter() {
        let chart = trace(&fixtures::draws(50, 3), &TraceOptions::new()).unwrap();
        assert_eq!(chart.panels.len(), 2);
        let panel = chart.panel("sigma").unwrap();
        assert_eq!(panel.layers_named("draws").count(), 3);
        assert_eq!(panel.x_extent(), Some((1.0, 50.0)));
        assert_eq!(chart.x_limits, None);
        assert!(chart.notices.is_empty());
    }

    #[test]
    fn test_window_sets_axis_limits_exactly() {
        let options = TraceOptions::new().window(10.0, 25.0);
        let chart = trace(&fixtures::draws(50, 2), &options).unwrap();
        assert_eq!(chart.x_limits, Some((10.0, 25.0)));
        assert_eq!(chart.x_range(), Some((10.0, 25.0)));
        // data outside the window are kept
        assert_eq!(chart.panels[0].x_extent(), Some((1.0, 50.0)));

        assert!(trace(&fixtures::draws(50, 2), &TraceOptions::new().window(25.0, 10.0)).is_err());
    }

    #[test]
    fn test_warmup_shading() {
        let chart = trace(&fixtures::draws(50, 2), &TraceOptions::new().n_warmup(20)).unwrap();
        let layer = &chart.panels[0].layers[0];
        assert_eq!(layer.name, "warmup");
        match &layer.geom {
            Geom::Rects { rects } => {
                assert_eq!(rects[0].x0, 0.0);
                assert_eq!(rects[0].x1, 20.0);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        assert!(trace(&fixtures::draws(50, 2), &TraceOptions::new().n_warmup(51)).is_err());
    }

    #[test]
    fn test_divergence_overlay() {
        let mut table = Array2::zeros((30, 2));
        table[[4, 0]] = 1.0;
        table[[9, 1]] = 1.0;
        table[[19, 1]] = 1.0;
        let options = TraceOptions::new().divergences(Divergences::from_table(&table).unwrap());
        let chart = trace(&fixtures::draws(30, 2), &options).unwrap();
        let panel = chart.panel("alpha").unwrap();
        let rugs: Vec<&Layer> = panel.layers_named("divergences").collect();
        assert_eq!(rugs.len(), 2);
        assert_eq!(rugs[0].geom, Geom::Rug { xs: vec![5.0] });
        assert_eq!(rugs[1].geom, Geom::Rug { xs: vec![10.0, 20.0] });
        // overlay is drawn on top of the traces
        assert_eq!(panel.layers.last().map(|l| l.name.as_str()), Some("divergences"));
        assert!(chart.notices.is_empty());
    }

    #[test]
    fn test_no_divergences_is_a_notice_not_an_error() {
        let divergences = Divergences::from_vector(&[0.0; 30]).unwrap();
        let options = TraceOptions::new().divergences(divergences);
        let chart = trace(&fixtures::draws(30, 2), &options).unwrap();
        assert!(!chart.has_layer("divergences"));
        assert_eq!(chart.notices, vec![NO_DIVERGENCES.to_string()]);
    }

    #[test]
    fn test_divergence_dimension_mismatch_fails() {
        let divergences = Divergences::from_vector(&[0.0; 29]).unwrap();
        let options = TraceOptions::new().divergences(divergences);
        assert!(trace(&fixtures::draws(30, 2), &options).is_err());

        let table = Array2::zeros((30, 3));
        let options = TraceOptions::new().divergences(Divergences::from_table(&table).unwrap());
        assert!(trace(&fixtures::draws(30, 2), &options).is_err());
    }

    #[test]
    fn test_selection_and_transformation() {
        let options = TraceOptions::new()
            .pars(["sigma"])
            .transformations(Transformations::new().with("sigma", Transformation::Log));
        let chart = trace(&fixtures::draws(10, 2), &options).unwrap();
        assert_eq!(chart.panels.len(), 1);
        assert_eq!(chart.panels[0].label, "log(sigma)");
    }

    #[test]
    fn test_trace_highlight() {
        let options = TraceHighlightOptions::new().highlight(2);
        let chart = trace_highlight(&fixtures::draws(20, 3), &options).unwrap();
        let panel = &chart.panels[0];
        assert_eq!(panel.layers_named("draws").count(), 2);
        assert_eq!(panel.layers_named("highlight").count(), 1);

        let options = TraceHighlightOptions::new();
        let err = trace_highlight(&fixtures::draws(20, 1), &options).unwrap_err();
        assert!(err.to_string().contains("requires multiple chains"));
        let options = TraceHighlightOptions::new().highlight(4);
        assert!(trace_highlight(&fixtures::draws(20, 3), &options).is_err());
    }
}
