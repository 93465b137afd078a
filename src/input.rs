use crate::draws::Draws;
use anyhow::{anyhow, Error, Result};
use ndarray::{stack, Array2, Array3, ArrayView2, Axis};
use tracing::debug;

/// Name of the optional frame column assigning rows to chains.
pub const CHAIN_COLUMN: &str = "chain";
/// Name of the optional frame column holding iteration numbers; it is dropped.
pub const ITERATION_COLUMN: &str = "iteration";

/// Tabular draws: named numeric columns of equal length, one row per draw.
///
/// A [`CHAIN_COLUMN`] splits rows into chains (rows of each chain keep their
/// order); without it every row belongs to a single chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawsFrame {
    columns: Vec<(String, Vec<f64>)>,
}

impl DrawsFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column<S: Into<String>>(mut self, name: S, values: Vec<f64>) -> Self {
        self.push_column(name, values);
        self
    }

    pub fn push_column<S: Into<String>>(&mut self, name: S, values: Vec<f64>) {
        self.columns.push((name.into(), values));
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    fn num_rows(&self) -> Result<usize, Error> {
        let n = self.columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, v)) = self.columns.iter().find(|(_, v)| v.len() != n) {
            return Err(anyhow!(
                "All frame columns must have the same length, column '{}' has {} rows, expected {}",
                name,
                v.len(),
                n
            ));
        }
        Ok(n)
    }
}

/// The container shapes posterior draws are accepted in.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawsInput {
    /// `iterations x chains x parameters`
    Array {
        values: Array3<f64>,
        parameters: Vec<String>,
    },
    /// `iterations x parameters`, a single chain
    Matrix {
        values: Array2<f64>,
        parameters: Vec<String>,
    },
    Frame(DrawsFrame),
    /// One `iterations x parameters` matrix per chain
    ChainList {
        chains: Vec<Array2<f64>>,
        parameters: Vec<String>,
    },
}

impl From<DrawsFrame> for DrawsInput {
    fn from(frame: DrawsFrame) -> Self {
        DrawsInput::Frame(frame)
    }
}

impl TryFrom<DrawsInput> for Draws {
    type Error = Error;

    fn try_from(input: DrawsInput) -> Result<Self, Self::Error> {
        normalize(input)
    }
}

/// Converts any supported container into canonical [`Draws`].
pub fn normalize(input: DrawsInput) -> Result<Draws, Error> {
    match input {
        DrawsInput::Array { values, parameters } => Draws::new(values, parameters),
        DrawsInput::Matrix { values, parameters } => {
            debug!("matrix input tagged as a single chain");
            Draws::new(values.insert_axis(Axis(1)), parameters)
        }
        DrawsInput::Frame(frame) => from_frame(frame),
        DrawsInput::ChainList { chains, parameters } => {
            let views: Vec<ArrayView2<f64>> = chains.iter().map(|c| c.view()).collect();
            from_chain_views(&views, parameters)
        }
    }
}

fn from_chain_views(chains: &[ArrayView2<f64>], parameters: Vec<String>) -> Result<Draws, Error> {
    let first = chains
        .first()
        .ok_or_else(|| anyhow!("Chain list must contain at least one chain"))?;
    let dim = first.dim();
    for (c, chain) in chains.iter().enumerate().skip(1) {
        if chain.nrows() != dim.0 {
            return Err(anyhow!(
                "All chains must have the same number of iterations, chain {} has {}, chain 1 has {}",
                c + 1,
                chain.nrows(),
                dim.0
            ));
        }
        if chain.ncols() != dim.1 {
            return Err(anyhow!(
                "All chains must have the same parameters, chain {} has {} columns, chain 1 has {}",
                c + 1,
                chain.ncols(),
                dim.1
            ));
        }
    }
    Draws::new(stack(Axis(1), chains)?, parameters)
}

/// 2^53; integers above it are not all representable as `f64`.
const MAX_CHAIN_ID: f64 = 9_007_199_254_740_992.0;

fn chain_id(value: f64, row: usize) -> Result<usize, Error> {
    if value.fract() != 0.0 || value < 1.0 {
        return Err(anyhow!(
            "Values in the '{}' column must be positive integers, row {} has {}",
            CHAIN_COLUMN,
            row + 1,
            value
        ));
    }
    if value > MAX_CHAIN_ID.min(usize::MAX as f64) {
        return Err(anyhow!(
            "Chain id {} in row {} is too large to identify a chain exactly",
            value,
            row + 1
        ));
    }
    Ok(value as usize)
}

fn from_frame(frame: DrawsFrame) -> Result<Draws, Error> {
    let num_rows = frame.num_rows()?;
    if num_rows == 0 {
        return Err(anyhow!("Frame must contain at least one row"));
    }

    let mut chain_column = None;
    let mut parameters = Vec::new();
    let mut columns = Vec::new();
    for (name, values) in frame.columns {
        match name.as_str() {
            CHAIN_COLUMN => chain_column = Some(values),
            ITERATION_COLUMN => debug!("dropping '{}' column", ITERATION_COLUMN),
            _ => {
                parameters.push(name);
                columns.push(values);
            }
        }
    }

    // chain index (0-based, in order of sorted chain ids) per row
    let row_chain: Vec<usize> = match chain_column {
        None => vec![0; num_rows],
        Some(ids) => {
            let ids = ids
                .iter()
                .enumerate()
                .map(|(row, v)| chain_id(*v, row))
                .collect::<Result<Vec<_>, _>>()?;
            let mut distinct = ids.clone();
            distinct.sort_unstable();
            distinct.dedup();
            ids.iter()
                .map(|id| distinct.binary_search(id).unwrap_or_default())
                .collect()
        }
    };
    let num_chains = row_chain.iter().max().map_or(0, |m| m + 1);
    let mut per_chain = vec![0usize; num_chains];
    for c in &row_chain {
        per_chain[*c] += 1;
    }
    let num_iterations = per_chain[0];
    if let Some((c, n)) = per_chain.iter().enumerate().find(|(_, n)| **n != num_iterations) {
        return Err(anyhow!(
            "All chains must have the same number of iterations, chain {} has {}, chain 1 has {}",
            c + 1,
            n,
            num_iterations
        ));
    }

    let mut values = Array3::zeros((num_iterations, num_chains, columns.len()));
    let mut next = vec![0usize; num_chains];
    for (row, c) in row_chain.iter().enumerate() {
        let i = next[*c];
        for (p, column) in columns.iter().enumerate() {
            values[[i, *c, p]] = column[row];
        }
        next[*c] += 1;
    }
    debug!(num_iterations, num_chains, "normalized frame input");
    Draws::new(values, parameters)
}
