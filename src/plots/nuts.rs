use super::distributions::{bars, check_bins};
use crate::chart::{Chart, Geom, Layer, Panel, Rect, Style};
use crate::nuts::{NutsParams, ACCEPT_STAT, ENERGY, N_LEAPFROG, STEPSIZE, TREEDEPTH};
use crate::utils::{histogram, mean};
use anyhow::{anyhow, Error, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct NutsOptions {
    bins: usize,
}

impl Default for NutsOptions {
    fn default() -> Self {
        NutsOptions { bins: 30 }
    }
}

impl NutsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }
}

/// One bar per distinct integer value, centred on the value.
fn integer_bars(values: &[f64]) -> Geom {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v.round() as i64).or_insert(0) += 1;
    }
    Geom::Rects {
        rects: counts
            .into_iter()
            .map(|(v, n)| Rect {
                x0: v as f64 - 0.5,
                x1: v as f64 + 0.5,
                y0: 0.0,
                y1: n as f64,
            })
            .collect(),
    }
}

/// Energy diagnostic: per chain, the histogram of centred energy overlaid
/// with the histogram of energy changes between transitions.  A transition
/// histogram much narrower than the marginal one signals poor exploration.
pub fn nuts_energy(np: &NutsParams, options: &NutsOptions) -> Result<Chart, Error> {
    check_bins(options.bins)?;
    let table = np.table(ENERGY)?;
    if table.nrows() < 2 {
        return Err(anyhow!(
            "Energy plot needs at least 2 iterations, got {}",
            table.nrows()
        ));
    }
    let mut chart = Chart::new("Energy", "");
    chart.ncol = Some(np.num_chains().min(2));
    for (c, energy) in table.columns().into_iter().enumerate() {
        let energy = energy.to_vec();
        let m = mean(&energy)?;
        let centred: Vec<f64> = energy.iter().map(|e| e - m).collect();
        let changes: Vec<f64> = energy.windows(2).map(|w| w[1] - w[0]).collect();

        let mut panel = Panel::new(format!("chain {}", c + 1));
        panel.push(Layer::new(
            "energy",
            Style::Light,
            bars(histogram(&centred, options.bins)?),
        ));
        panel.push(Layer::new(
            "energy_transition",
            Style::Dark,
            bars(histogram(&changes, options.bins)?),
        ));
        chart.push_panel(panel);
    }
    Ok(chart)
}

/// Distribution of tree depth and of leapfrog steps, all chains pooled.
/// Sampler output without `n_leapfrog__` gets the tree depth panel only.
pub fn nuts_treedepth(np: &NutsParams) -> Result<Chart, Error> {
    let mut chart = Chart::new("", "Transitions");
    let depth: Vec<f64> = np.table(TREEDEPTH)?.iter().copied().collect();
    let mut panel = Panel::new(TREEDEPTH);
    panel.push(Layer::new("treedepth", Style::Dark, integer_bars(&depth)));
    chart.push_panel(panel);

    if let Ok(steps) = np.table(N_LEAPFROG) {
        let steps: Vec<f64> = steps.iter().copied().collect();
        let mut panel = Panel::new(N_LEAPFROG);
        panel.push(Layer::new("n_leapfrog", Style::Light, integer_bars(&steps)));
        chart.push_panel(panel);
    }
    Ok(chart)
}

/// Histogram of the acceptance statistic in a panel per chain, with the
/// chain's mean acceptance marked.
pub fn nuts_acceptance(np: &NutsParams, options: &NutsOptions) -> Result<Chart, Error> {
    check_bins(options.bins)?;
    let table = np.table(ACCEPT_STAT)?;
    let mut chart = Chart::new(ACCEPT_STAT, "");
    chart.ncol = Some(np.num_chains());
    for (c, accept) in table.columns().into_iter().enumerate() {
        let accept = accept.to_vec();
        let mut panel = Panel::new(format!("chain {}", c + 1));
        panel.push(Layer::new(
            "accept_stat",
            Style::Chain(c),
            bars(histogram(&accept, options.bins)?),
        ));
        panel.push(Layer::new(
            "mean",
            Style::Reference,
            Geom::VLine { x: mean(&accept)? },
        ));
        chart.push_panel(panel);
    }
    Ok(chart)
}

/// Acceptance statistic of every transition against the step size of its
/// chain.
pub fn nuts_stepsize(np: &NutsParams) -> Result<Chart, Error> {
    let stepsize = np.table(STEPSIZE)?;
    let accept = np.table(ACCEPT_STAT)?;
    let mut chart = Chart::new(STEPSIZE, ACCEPT_STAT);
    let mut panel = Panel::new("");
    for c in 0..np.num_chains() {
        let points: Vec<(f64, f64)> = stepsize
            .column(c)
            .iter()
            .zip(accept.column(c).iter())
            .map(|(s, a)| (*s, *a))
            .collect();
        panel.push(Layer::new("draws", Style::Chain(c), Geom::Points { points }));
    }
    chart.push_panel(panel);
    Ok(chart)
}
