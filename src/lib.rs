//! A Rust library for validating MCMC posterior draws and assembling diagnostic
//! and summary plots from them: trace plots with divergence overlays, histograms,
//! densities, posterior intervals, rank histograms, autocorrelation, R hat and
//! effective sample size.
//!
//! Draws may arrive as a three-dimensional array, a single-chain matrix, a tabular
//! frame or a list of per-chain matrices. Every plot function normalizes its input
//! to [`Draws`] (iteration x chain x parameter), builds a [`chart::Chart`] and
//! leaves rendering to [`render`], so charts can be inspected without a backend.
//!
//! This crate is language agnostic and intended to work with the outputs of any MCMC
//! sampler (e.g. Stan, PyMC, Turing.jl, etc.)
#[cfg(test)]
#[macro_use]
extern crate approx;

/// Chart model returned by every plot function
pub mod chart;
/// Divergence indicators aligned against draws
pub mod divergences;
/// Canonical iteration x chain x parameter storage
pub mod draws;
/// Effective Sample Size (ESS)
pub mod ess;
/// Normalization of the supported input containers
pub mod input;
/// NUTS sampler diagnostics in long form
pub mod nuts;
/// Plot assembly
pub mod plots;
/// SVG rendering of charts
pub mod render;
/// Gelman-Rubin split potential scale reducation (Rhat)
pub mod rhat;
/// Parameter selection by exact name and regular expression
pub mod select;
/// Reader for CmdStan output files
pub mod stan_csv;
/// Elementwise parameter transformations
pub mod transform;
/// Convenience utilities like chain splitting, quantiles, histograms and kernel
/// density estimates
pub mod utils;

/// Draws of one parameter within one chain
pub type Chain = Vec<f64>;
/// Draws of one parameter, one vector per chain
pub type Chains = Vec<Chain>;

pub use chart::Chart;
pub use divergences::{AlignedDivergences, Divergences};
pub use draws::{DrawRow, Draws};
pub use input::{normalize, DrawsFrame, DrawsInput};
pub use nuts::{NutsParams, NutsRow};
pub use select::ParameterSelection;
pub use transform::{Transformation, Transformations};
