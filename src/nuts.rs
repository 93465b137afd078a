use anyhow::{anyhow, Error, Result};
use ndarray::Array2;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Sampler parameter flagging divergent transitions.
pub const DIVERGENT: &str = "divergent__";
/// Sampler parameter holding the tree depth of each transition.
pub const TREEDEPTH: &str = "treedepth__";
/// Sampler parameter holding the Hamiltonian energy.
pub const ENERGY: &str = "energy__";
/// Sampler parameter holding the acceptance statistic.
pub const ACCEPT_STAT: &str = "accept_stat__";
/// Sampler parameter holding the step size.
pub const STEPSIZE: &str = "stepsize__";
/// Sampler parameter holding the number of leapfrog steps.
pub const N_LEAPFROG: &str = "n_leapfrog__";

/// One NUTS diagnostic value; iteration and chain are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutsRow {
    pub iteration: usize,
    pub chain: usize,
    pub parameter: String,
    pub value: f64,
}

impl NutsRow {
    pub fn new<S: Into<String>>(iteration: usize, chain: usize, parameter: S, value: f64) -> Self {
        NutsRow {
            iteration,
            chain,
            parameter: parameter.into(),
            value,
        }
    }
}

/// NUTS sampler diagnostics in long form.  Every parameter covers the same
/// complete `iterations x chains` grid exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct NutsParams {
    parameters: Vec<String>,
    // one `iterations x chains` table per parameter
    tables: Vec<Array2<f64>>,
}

impl NutsParams {
    pub fn new(rows: Vec<NutsRow>) -> Result<Self, Error> {
        if rows.is_empty() {
            return Err(anyhow!("NUTS parameters must contain at least one row"));
        }
        if let Some(row) = rows.iter().find(|r| r.iteration == 0 || r.chain == 0) {
            return Err(anyhow!(
                "NUTS iterations and chains are 1-based, got iteration {} chain {} for '{}'",
                row.iteration,
                row.chain,
                row.parameter
            ));
        }
        let num_iterations = rows.iter().map(|r| r.iteration).max().unwrap_or(0);
        let num_chains = rows.iter().map(|r| r.chain).max().unwrap_or(0);

        let mut parameters: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut tables: Vec<Array2<f64>> = Vec::new();
        let mut seen: Vec<Array2<bool>> = Vec::new();
        for row in &rows {
            let p = match index.get(&row.parameter) {
                Some(p) => *p,
                None => {
                    index.insert(row.parameter.clone(), parameters.len());
                    parameters.push(row.parameter.clone());
                    tables.push(Array2::zeros((num_iterations, num_chains)));
                    seen.push(Array2::from_elem((num_iterations, num_chains), false));
                    parameters.len() - 1
                }
            };
            let cell = [row.iteration - 1, row.chain - 1];
            if seen[p][cell] {
                return Err(anyhow!(
                    "Duplicate NUTS row for '{}' at iteration {} chain {}",
                    row.parameter,
                    row.iteration,
                    row.chain
                ));
            }
            seen[p][cell] = true;
            tables[p][cell] = row.value;
        }
        for (p, s) in seen.iter().enumerate() {
            if let Some(((i, c), _)) = s.indexed_iter().find(|(_, v)| !**v) {
                return Err(anyhow!(
                    "NUTS parameter '{}' is missing iteration {} of chain {}",
                    parameters[p],
                    i + 1,
                    c + 1
                ));
            }
        }
        debug!(
            num_iterations,
            num_chains,
            num_parameters = parameters.len(),
            "validated NUTS parameters"
        );
        Ok(NutsParams { parameters, tables })
    }

    /// Builds NUTS parameters from per-chain columns, chain `c` of `chains`
    /// becoming chain `c + 1`.
    pub fn from_chain_columns(chains: &[Vec<(String, Vec<f64>)>]) -> Result<Self, Error> {
        let mut rows = Vec::new();
        for (c, columns) in chains.iter().enumerate() {
            for (name, values) in columns {
                for (i, v) in values.iter().enumerate() {
                    rows.push(NutsRow::new(i + 1, c + 1, name.as_str(), *v));
                }
            }
        }
        NutsParams::new(rows)
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn num_iterations(&self) -> usize {
        self.tables[0].nrows()
    }

    pub fn num_chains(&self) -> usize {
        self.tables[0].ncols()
    }

    /// `iterations x chains` values of one sampler parameter.
    pub fn table(&self, parameter: &str) -> Result<&Array2<f64>, Error> {
        self.parameters
            .iter()
            .position(|p| p == parameter)
            .map(|p| &self.tables[p])
            .ok_or_else(|| anyhow!("NUTS parameters do not include '{}'", parameter))
    }

    /// Long form, ordered by parameter, then chain, then iteration.
    pub fn rows(&self) -> Vec<NutsRow> {
        let mut rows = Vec::new();
        for (name, table) in self.parameters.iter().zip(&self.tables) {
            for c in 0..table.ncols() {
                for i in 0..table.nrows() {
                    rows.push(NutsRow::new(i + 1, c + 1, name.as_str(), table[[i, c]]));
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(parameter: &str, values: &[[f64; 2]]) -> Vec<NutsRow> {
        let mut rows = Vec::new();
        for (i, per_chain) in values.iter().enumerate() {
            for (c, v) in per_chain.iter().enumerate() {
                rows.push(NutsRow::new(i + 1, c + 1, parameter, *v));
            }
        }
        rows
    }

    #[test]
    fn test_tables_from_rows() {
        let mut rows = grid(DIVERGENT, &[[0.0, 1.0], [0.0, 0.0], [1.0, 0.0]]);
        rows.extend(grid(TREEDEPTH, &[[3.0, 4.0], [3.0, 3.0], [5.0, 2.0]]));
        let np = NutsParams::new(rows.clone()).unwrap();
        assert_eq!(np.num_iterations(), 3);
        assert_eq!(np.num_chains(), 2);
        assert_eq!(np.parameters(), &[DIVERGENT.to_string(), TREEDEPTH.to_string()][..]);
        assert_eq!(np.table(DIVERGENT).unwrap()[[0, 1]], 1.0);
        assert_eq!(np.table(TREEDEPTH).unwrap()[[2, 0]], 5.0);
        assert!(np.table(ENERGY).is_err());
        assert_eq!(np.rows().len(), rows.len());
    }

    #[test]
    fn test_incomplete_grid_fails() {
        let mut rows = grid(DIVERGENT, &[[0.0, 1.0], [0.0, 0.0]]);
        rows.pop();
        let err = NutsParams::new(rows).unwrap_err();
        assert!(err.to_string().contains("missing iteration 2 of chain 2"));
    }

    #[test]
    fn test_duplicate_and_zero_based_rows_fail() {
        let mut rows = grid(DIVERGENT, &[[0.0, 1.0]]);
        rows.push(NutsRow::new(1, 1, DIVERGENT, 1.0));
        assert!(NutsParams::new(rows).is_err());
        assert!(NutsParams::new(vec![NutsRow::new(0, 1, DIVERGENT, 0.0)]).is_err());
        assert!(NutsParams::new(vec![]).is_err());
    }

    #[test]
    fn test_from_chain_columns() {
        let chains = vec![
            vec![(DIVERGENT.to_string(), vec![0.0, 1.0])],
            vec![(DIVERGENT.to_string(), vec![0.0, 0.0])],
        ];
        let np = NutsParams::from_chain_columns(&chains).unwrap();
        assert_eq!(np.num_chains(), 2);
        assert_eq!(np.table(DIVERGENT).unwrap()[[1, 0]], 1.0);
    }
}
