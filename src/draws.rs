use crate::Chains;
use anyhow::{anyhow, Error, Result};
use ndarray::{s, Array3, ArrayView1, Axis};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Posterior draws in canonical `iteration x chain x parameter` layout.
///
/// Construction validates that every axis is non-empty, that there is one
/// unique, non-empty name per parameter and that every draw is finite.  Once built,
/// all chains share the same iteration count and parameter set by
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Draws {
    values: Array3<f64>,
    parameters: Vec<String>,
}

/// One row of the long ("molten") form of draws.  Iteration and chain are
/// 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawRow {
    pub iteration: usize,
    pub chain: usize,
    pub parameter: String,
    pub value: f64,
}

impl Draws {
    pub fn new(values: Array3<f64>, parameters: Vec<String>) -> Result<Self, Error> {
        let (num_iterations, num_chains, num_parameters) = values.dim();
        if num_iterations == 0 {
            return Err(anyhow!("Draws must contain at least one iteration"));
        }
        if num_chains == 0 {
            return Err(anyhow!("Draws must contain at least one chain"));
        }
        if num_parameters == 0 {
            return Err(anyhow!("Draws must contain at least one parameter"));
        }
        if parameters.len() != num_parameters {
            return Err(anyhow!(
                "Got {} parameter names for {} parameters",
                parameters.len(),
                num_parameters
            ));
        }
        let mut seen = HashSet::with_capacity(parameters.len());
        for name in &parameters {
            if name.is_empty() {
                return Err(anyhow!("Parameter names must not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(anyhow!("Parameter names must be unique, '{}' is repeated", name));
            }
        }
        if let Some(((i, c, p), v)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(anyhow!(
                "Draws must be finite, got {} (parameter '{}', chain {}, iteration {})",
                v,
                parameters[p],
                c + 1,
                i + 1
            ));
        }
        debug!(num_iterations, num_chains, num_parameters, "validated draws");
        Ok(Draws { values, parameters })
    }

    pub fn num_iterations(&self) -> usize {
        self.values.dim().0
    }

    pub fn num_chains(&self) -> usize {
        self.values.dim().1
    }

    pub fn num_parameters(&self) -> usize {
        self.values.dim().2
    }

    /// Total draws per parameter across all chains.
    pub fn num_draws(&self) -> usize {
        self.num_iterations() * self.num_chains()
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    pub fn has_multiple_chains(&self) -> bool {
        self.num_chains() > 1
    }

    /// Fails unless the draws hold at least two chains.
    pub fn require_multiple_chains(&self, what: &str) -> Result<(), Error> {
        if self.has_multiple_chains() {
            Ok(())
        } else {
            Err(anyhow!(
                "{} requires multiple chains, but the draws contain a single chain",
                what
            ))
        }
    }

    pub fn parameter_index(&self, name: &str) -> Result<usize, Error> {
        self.parameters
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| anyhow!("Parameter '{}' not found in draws", name))
    }

    /// Draws of parameter `p` in chain `c`, both 0-based.
    pub fn chain(&self, p: usize, c: usize) -> ArrayView1<'_, f64> {
        self.values.slice(s![.., c, p])
    }

    /// Draws of one parameter, one vector per chain.
    pub fn chains(&self, name: &str) -> Result<Chains, Error> {
        let p = self.parameter_index(name)?;
        Ok((0..self.num_chains())
            .map(|c| self.chain(p, c).to_vec())
            .collect())
    }

    /// Draws of parameter `p` with all chains concatenated in chain order.
    pub fn pooled(&self, p: usize) -> Vec<f64> {
        (0..self.num_chains())
            .flat_map(|c| self.chain(p, c).to_vec())
            .collect()
    }

    /// Keeps the named parameters, in the order given.
    pub fn subset(&self, names: &[String]) -> Result<Draws, Error> {
        let indices = names
            .iter()
            .map(|n| self.parameter_index(n))
            .collect::<Result<Vec<_>, _>>()?;
        Draws::new(self.values.select(Axis(2), &indices), names.to_vec())
    }

    /// Drops the first `n_warmup` iterations of every chain.
    pub fn drop_warmup(&self, n_warmup: usize) -> Result<Draws, Error> {
        if n_warmup >= self.num_iterations() {
            return Err(anyhow!(
                "Warm-up length ({}) must be smaller than the number of iterations ({})",
                n_warmup,
                self.num_iterations()
            ));
        }
        Draws::new(
            self.values.slice(s![n_warmup.., .., ..]).to_owned(),
            self.parameters.clone(),
        )
    }

    /// Long form, ordered by parameter, then chain, then iteration.
    pub fn melt(&self) -> Vec<DrawRow> {
        let mut rows = Vec::with_capacity(self.values.len());
        for (p, name) in self.parameters.iter().enumerate() {
            for c in 0..self.num_chains() {
                for (i, value) in self.chain(p, c).iter().enumerate() {
                    rows.push(DrawRow {
                        iteration: i + 1,
                        chain: c + 1,
                        parameter: name.clone(),
                        value: *value,
                    });
                }
            }
        }
        rows
    }

    pub(crate) fn into_parts(self) -> (Array3<f64>, Vec<String>) {
        (self.values, self.parameters)
    }
}
