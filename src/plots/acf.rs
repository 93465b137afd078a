use super::{prepare_setters, Prepare};
use crate::chart::{Chart, Geom, Layer, Panel, Segment, Style};
use crate::draws::Draws;
use crate::utils::autocorrelation;
use anyhow::{anyhow, Error, Result};

#[derive(Debug, Clone)]
pub struct AcfOptions {
    prepare: Prepare,
    lags: usize,
}

impl Default for AcfOptions {
    fn default() -> Self {
        AcfOptions {
            prepare: Prepare::default(),
            lags: 20,
        }
    }
}

impl AcfOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    pub fn lags(mut self, lags: usize) -> Self {
        self.lags = lags;
        self
    }
}

/// Autocorrelation bars for lags `0..=lags`, a panel per parameter and chain.
pub fn acf(draws: &Draws, options: &AcfOptions) -> Result<Chart, Error> {
    let draws = options.prepare.apply(draws)?;
    if options.lags >= draws.num_iterations() {
        return Err(anyhow!(
            "Number of lags ({}) must be smaller than the number of iterations ({})",
            options.lags,
            draws.num_iterations()
        ));
    }
    let mut chart = Chart::new("Lag", "Autocorrelation");
    chart.ncol = Some(draws.num_chains());
    chart.y_limits = Some((-1.0, 1.0));
    for (p, name) in draws.parameters().iter().enumerate() {
        for c in 0..draws.num_chains() {
            let rho = autocorrelation(&draws.chain(p, c).to_vec(), options.lags)
                .map_err(|e| anyhow!("Autocorrelation of '{}', chain {}: {}", name, c + 1, e))?;
            let segments = rho
                .iter()
                .enumerate()
                .map(|(lag, r)| Segment {
                    x0: lag as f64,
                    y0: 0.0,
                    x1: lag as f64,
                    y1: *r,
                })
                .collect();
            let mut panel = Panel::new(format!("{}, chain {}", name, c + 1));
            panel.push(Layer::new("zero", Style::Reference, Geom::HLine { y: 0.0 }));
            panel.push(Layer::new("acf", Style::Chain(c), Geom::Segments { segments }));
            chart.push_panel(panel);
        }
    }
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plots::fixtures;

    #[test]
    fn test_panel_per_parameter_and_chain() {
        let chart = acf(&fixtures::draws(50, 2), &AcfOptions::new().lags(10)).unwrap();
        assert_eq!(chart.panels.len(), 4);
        assert_eq!(chart.panels[1].label, "alpha, chain 2");
        match &chart.panels[0].layers[1].geom {
            Geom::Segments { segments } => {
                assert_eq!(segments.len(), 11);
                assert_abs_diff_eq!(segments[0].y1, 1.0, epsilon = 1e-12);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_too_many_lags() {
        assert!(acf(&fixtures::draws(20, 2), &AcfOptions::new()).is_err());
    }
}
