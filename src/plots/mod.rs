//! Plot assembly.  Every function validates its options, narrows the draws to
//! the selected (and transformed) parameters and returns a [`Chart`].
//!
//! [`Chart`]: crate::chart::Chart
use crate::draws::Draws;
use crate::select::ParameterSelection;
use crate::transform::Transformations;
use anyhow::{Error, Result};

/// Autocorrelation
pub mod acf;
/// R hat and effective sample size ratios
pub mod diagnostics;
/// Histograms, densities and rank histograms
pub mod distributions;
/// Posterior uncertainty intervals
pub mod intervals;
/// NUTS sampler diagnostics
pub mod nuts;
/// Bivariate scatter plots
pub mod scatter;
/// Trace plots
pub mod trace;

pub use acf::{acf, AcfOptions};
pub use diagnostics::{neff, rhat};
pub use distributions::{
    dens, dens_overlay, hist, hist_by_chain, rank_hist, DensOptions, HistOptions, RankOptions,
};
pub use intervals::{intervals, IntervalOptions, PointEstimate};
pub use nuts::{nuts_acceptance, nuts_energy, nuts_stepsize, nuts_treedepth, NutsOptions};
pub use scatter::{scatter, ScatterOptions};
pub use trace::{trace, trace_highlight, TraceHighlightOptions, TraceOptions};

/// Parameter selection and transformations shared by all draws-based plots.
#[derive(Debug, Clone, Default)]
pub struct Prepare {
    pub selection: ParameterSelection,
    pub transformations: Transformations,
}

impl Prepare {
    /// Selects first, then transforms, so transformations name parameters
    /// by their original names.
    pub fn apply(&self, draws: &Draws) -> Result<Draws, Error> {
        let selected = self.selection.apply(draws)?;
        self.transformations.apply(&selected)
    }
}

/// Generates the chainable setters for the [`Prepare`] part of an options
/// struct.
macro_rules! prepare_setters {
    () => {
        pub fn pars<I, S>(mut self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.prepare.selection = self.prepare.selection.and_pars(names);
            self
        }

        pub fn regex_pars<I, S>(mut self, patterns: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.prepare.selection = self.prepare.selection.and_regex_pars(patterns);
            self
        }

        pub fn selection(mut self, selection: crate::select::ParameterSelection) -> Self {
            self.prepare.selection = selection;
            self
        }

        pub fn transformations(
            mut self,
            transformations: crate::transform::Transformations,
        ) -> Self {
            self.prepare.transformations = transformations;
            self
        }
    };
}
pub(crate) use prepare_setters;
