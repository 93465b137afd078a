use crate::draws::Draws;
use crate::nuts::{NutsParams, DIVERGENT};
use anyhow::{anyhow, Error, Result};
use ndarray::{Array2, Axis};
use tracing::info;

/// Notice attached to charts when a divergence overlay was requested but no
/// transition diverged.
pub const NO_DIVERGENCES: &str = "No divergences to plot.";

/// Divergence indicators before alignment against draws.
///
/// Either a full `iterations x chains` table or a per-iteration vector that
/// is broadcast across every chain of the draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Divergences {
    flags: Array2<bool>,
    broadcast: bool,
}

fn flag(value: f64, iteration: usize) -> Result<bool, Error> {
    if value == 0.0 {
        Ok(false)
    } else if value == 1.0 {
        Ok(true)
    } else {
        Err(anyhow!(
            "Divergence indicators must be 0 or 1, got {} at iteration {}",
            value,
            iteration + 1
        ))
    }
}

impl Divergences {
    /// `iterations x chains` table of 0/1 indicators.
    pub fn from_table(table: &Array2<f64>) -> Result<Self, Error> {
        let mut flags = Array2::from_elem(table.dim(), false);
        for ((i, c), v) in table.indexed_iter() {
            flags[[i, c]] = flag(*v, i)?;
        }
        Ok(Divergences {
            flags,
            broadcast: false,
        })
    }

    pub fn from_flags(flags: Array2<bool>) -> Self {
        Divergences {
            flags,
            broadcast: false,
        }
    }

    /// Per-iteration 0/1 indicators shared by every chain.
    pub fn from_vector(values: &[f64]) -> Result<Self, Error> {
        let flags = values
            .iter()
            .enumerate()
            .map(|(i, v)| flag(*v, i))
            .collect::<Result<Vec<_>, _>>()?;
        let n = flags.len();
        Ok(Divergences {
            flags: Array2::from_shape_vec((n, 1), flags)?,
            broadcast: true,
        })
    }

    /// The `divergent__` indicators of NUTS sampler output.
    pub fn from_nuts(np: &NutsParams) -> Result<Self, Error> {
        Divergences::from_table(np.table(DIVERGENT)?)
    }

    pub fn num_iterations(&self) -> usize {
        self.flags.nrows()
    }

    /// Number of chains, `None` for a broadcast vector.
    pub fn num_chains(&self) -> Option<usize> {
        if self.broadcast {
            None
        } else {
            Some(self.flags.ncols())
        }
    }

    /// Checks the indicators against the iteration/chain grid of `draws`.
    pub fn align(&self, draws: &Draws) -> Result<AlignedDivergences, Error> {
        if self.num_iterations() != draws.num_iterations() {
            return Err(anyhow!(
                "Number of iterations in divergence indicators ({}) does not match the draws ({})",
                self.num_iterations(),
                draws.num_iterations()
            ));
        }
        let flags = match self.num_chains() {
            None => {
                let column = self.flags.column(0);
                Array2::from_shape_fn((draws.num_iterations(), draws.num_chains()), |(i, _)| {
                    column[i]
                })
            }
            Some(n) if n != draws.num_chains() => {
                return Err(anyhow!(
                    "Number of chains in divergence indicators ({}) does not match the draws ({})",
                    n,
                    draws.num_chains()
                ));
            }
            Some(_) => self.flags.clone(),
        };
        let aligned = AlignedDivergences { flags };
        if aligned.is_empty() {
            info!("{}", NO_DIVERGENCES);
        }
        Ok(aligned)
    }
}

/// Divergence indicators on the same `iterations x chains` grid as a set of
/// draws.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedDivergences {
    flags: Array2<bool>,
}

impl AlignedDivergences {
    pub fn flags(&self) -> &Array2<bool> {
        &self.flags
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// `Some(NO_DIVERGENCES)` when nothing diverged.
    pub fn notice(&self) -> Option<&'static str> {
        if self.is_empty() {
            Some(NO_DIVERGENCES)
        } else {
            None
        }
    }

    /// 0-based indices `(iteration, chain)` of divergent transitions.
    pub fn is_divergent(&self, iteration: usize, chain: usize) -> bool {
        self.flags[[iteration, chain]]
    }

    /// 1-based divergent iterations of one 0-based chain.
    pub fn iterations(&self, chain: usize) -> Vec<usize> {
        self.flags
            .index_axis(Axis(1), chain)
            .iter()
            .enumerate()
            .filter(|(_, f)| **f)
            .map(|(i, _)| i + 1)
            .collect()
    }
}
