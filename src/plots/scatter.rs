use super::{prepare_setters, Prepare};
use crate::chart::{Chart, Geom, Layer, Panel, Style};
use crate::divergences::Divergences;
use crate::draws::Draws;
use anyhow::{anyhow, Error, Result};

#[derive(Debug, Clone, Default)]
pub struct ScatterOptions {
    prepare: Prepare,
    divergences: Option<Divergences>,
}

impl ScatterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    /// Draws divergent transitions as a separate point layer.
    pub fn divergences(mut self, divergences: Divergences) -> Self {
        self.divergences = Some(divergences);
        self
    }
}

/// Scatter plot of exactly two parameters, all chains pooled.
pub fn scatter(draws: &Draws, options: &ScatterOptions) -> Result<Chart, Error> {
    let draws = options.prepare.apply(draws)?;
    if draws.num_parameters() != 2 {
        return Err(anyhow!(
            "scatter requires exactly 2 parameters, got {}",
            draws.num_parameters()
        ));
    }
    let divergences = match &options.divergences {
        Some(d) => Some(d.align(&draws)?),
        None => None,
    };

    let mut base = Vec::with_capacity(draws.num_draws());
    let mut divergent = Vec::new();
    for c in 0..draws.num_chains() {
        let xs = draws.chain(0, c);
        let ys = draws.chain(1, c);
        for (i, (x, y)) in xs.iter().zip(ys.iter()).enumerate() {
            match &divergences {
                Some(d) if d.is_divergent(i, c) => divergent.push((*x, *y)),
                _ => base.push((*x, *y)),
            }
        }
    }

    let params = draws.parameters();
    let mut chart = Chart::new(params[0].as_str(), params[1].as_str());
    let mut panel = Panel::new("");
    panel.push(Layer::new("draws", Style::Dark, Geom::Points { points: base }));
    if !divergent.is_empty() {
        panel.push(Layer::new(
            "divergences",
            Style::Divergence,
            Geom::Points { points: divergent },
        ));
    }
    chart.push_panel(panel);
    if let Some(notice) = divergences.as_ref().and_then(|d| d.notice()) {
        chart.notice(notice);
    }
    Ok(chart)
}
