use super::{prepare_setters, Prepare};
use crate::chart::{Chart, Geom, Layer, Panel, Rect, Style};
use crate::draws::Draws;
use crate::utils::{average_ranks, bin_counts, histogram, kernel_density};
use anyhow::{anyhow, Error, Result};

#[derive(Debug, Clone)]
pub struct HistOptions {
    prepare: Prepare,
    bins: usize,
}

impl Default for HistOptions {
    fn default() -> Self {
        HistOptions {
            prepare: Prepare::default(),
            bins: 30,
        }
    }
}

impl HistOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }
}

pub(super) fn bars(bins: Vec<(f64, f64, usize)>) -> Geom {
    Geom::Rects {
        rects: bins
            .into_iter()
            .map(|(x0, x1, n)| Rect {
                x0,
                x1,
                y0: 0.0,
                y1: n as f64,
            })
            .collect(),
    }
}

pub(super) fn check_bins(bins: usize) -> Result<(), Error> {
    if bins == 0 {
        return Err(anyhow!("Number of bins must be positive"));
    }
    Ok(())
}

/// Histogram of each parameter with all chains pooled.
pub fn hist(draws: &Draws, options: &HistOptions) -> Result<Chart, Error> {
    check_bins(options.bins)?;
    let draws = options.prepare.apply(draws)?;
    let mut chart = Chart::new("", "");
    for (p, name) in draws.parameters().iter().enumerate() {
        let mut panel = Panel::new(name.as_str());
        let counts = histogram(&draws.pooled(p), options.bins)?;
        panel.push(Layer::new("hist", Style::Light, bars(counts)));
        chart.push_panel(panel);
    }
    Ok(chart)
}

/// Histogram per parameter and chain, panels labelled `parameter, chain c`.
pub fn hist_by_chain(draws: &Draws, options: &HistOptions) -> Result<Chart, Error> {
    check_bins(options.bins)?;
    let draws = options.prepare.apply(draws)?;
    let mut chart = Chart::new("", "Chain");
    chart.ncol = Some(draws.num_chains());
    for (p, name) in draws.parameters().iter().enumerate() {
        for c in 0..draws.num_chains() {
            let chain = draws.chain(p, c).to_vec();
            let mut panel = Panel::new(format!("{}, chain {}", name, c + 1));
            panel.push(Layer::new("hist", Style::Chain(c), bars(histogram(&chain, options.bins)?)));
            chart.push_panel(panel);
        }
    }
    Ok(chart)
}

#[derive(Debug, Clone, Default)]
pub struct DensOptions {
    prepare: Prepare,
}

impl DensOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();
}

/// Kernel density of each parameter with all chains pooled.
pub fn dens(draws: &Draws, options: &DensOptions) -> Result<Chart, Error> {
    let draws = options.prepare.apply(draws)?;
    let mut chart = Chart::new("", "");
    for (p, name) in draws.parameters().iter().enumerate() {
        let points = kernel_density(&draws.pooled(p))
            .map_err(|e| anyhow!("Density of '{}': {}", name, e))?;
        let mut panel = Panel::new(name.as_str());
        panel.push(Layer::new("density", Style::Dark, Geom::Line { points }));
        chart.push_panel(panel);
    }
    Ok(chart)
}

/// One kernel density per chain, overlaid in a panel per parameter.
pub fn dens_overlay(draws: &Draws, options: &DensOptions) -> Result<Chart, Error> {
    draws.require_multiple_chains("dens_overlay")?;
    let draws = options.prepare.apply(draws)?;
    let mut chart = Chart::new("", "");
    for (p, name) in draws.parameters().iter().enumerate() {
        let mut panel = Panel::new(name.as_str());
        for c in 0..draws.num_chains() {
            let points = kernel_density(&draws.chain(p, c).to_vec())
                .map_err(|e| anyhow!("Density of '{}', chain {}: {}", name, c + 1, e))?;
            panel.push(Layer::new("density", Style::Chain(c), Geom::Line { points }));
        }
        chart.push_panel(panel);
    }
    Ok(chart)
}

#[derive(Debug, Clone)]
pub struct RankOptions {
    prepare: Prepare,
    bins: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        RankOptions {
            prepare: Prepare::default(),
            bins: 20,
        }
    }
}

impl RankOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }
}

/// Rank histograms: draws of each parameter are ranked across all chains,
/// then the ranks of every chain are binned separately.  Well-mixed chains
/// give flat histograms.
pub fn rank_hist(draws: &Draws, options: &RankOptions) -> Result<Chart, Error> {
    draws.require_multiple_chains("rank_hist")?;
    check_bins(options.bins)?;
    let draws = options.prepare.apply(draws)?;
    let n = draws.num_iterations();
    let total = draws.num_draws() as f64;

    let mut chart = Chart::new("Rank", "");
    chart.ncol = Some(draws.num_chains());
    for (p, name) in draws.parameters().iter().enumerate() {
        // pooled is chain-major, so chain c owns ranks[c*n..(c+1)*n]
        let ranks = average_ranks(&draws.pooled(p));
        for (c, chain_ranks) in ranks.chunks(n).enumerate() {
            let mut panel = Panel::new(format!("{}, chain {}", name, c + 1));
            panel.push(Layer::new(
                "ranks",
                Style::Chain(c),
                bars(bin_counts(chain_ranks, options.bins, 1.0, total)?),
            ));
            chart.push_panel(panel);
        }
    }
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::fixtures;

    fn bar_total(layer: &Layer) -> f64 {
        match &layer.geom {
            Geom::Rects { rects } => rects.iter().map(|r| r.y1).sum(),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_hist_pools_chains() {
        let chart = hist(&fixtures::draws(40, 3), &HistOptions::new().bins(10)).unwrap();
        assert_eq!(chart.panels.len(), 2);
        let layer = &chart.panels[0].layers[0];
        assert_eq!(bar_total(layer), 120.0);
        assert!(hist(&fixtures::draws(40, 3), &HistOptions::new().bins(0)).is_err());
    }

    #[test]
    fn test_hist_by_chain() {
        let options = HistOptions::new().pars(["alpha"]);
        let chart = hist_by_chain(&fixtures::draws(40, 3), &options).unwrap();
        assert_eq!(chart.panels.len(), 3);
        assert_eq!(chart.panels[2].label, "alpha, chain 3");
        assert_eq!(bar_total(&chart.panels[2].layers[0]), 40.0);
    }

    #[test]
    fn test_dens_and_overlay() {
        let chart = dens(&fixtures::draws(40, 2), &DensOptions::new()).unwrap();
        assert_eq!(chart.panels[0].layers.len(), 1);

        let options = DensOptions::new().regex_pars(["^sig"]);
        let chart = dens_overlay(&fixtures::draws(40, 3), &options).unwrap();
        assert_eq!(chart.panels.len(), 1);
        assert_eq!(chart.panels[0].layers_named("density").count(), 3);

        let err = dens_overlay(&fixtures::draws(40, 1), &DensOptions::new()).unwrap_err();
        assert!(err.to_string().contains("requires multiple chains"));
    }

    #[test]
    fn test_rank_hist_counts_each_chain() {
        let chart = rank_hist(&fixtures::draws(40, 4), &RankOptions::new().bins(5)).unwrap();
        assert_eq!(chart.panels.len(), 8);
        for panel in &chart.panels {
            assert_eq!(bar_total(&panel.layers[0]), 40.0);
        }
        assert!(rank_hist(&fixtures::draws(40, 1), &RankOptions::new()).is_err());
    }
}
