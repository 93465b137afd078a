use crate::draws::Draws;
use crate::input::{normalize, DrawsInput};
use crate::nuts::NutsParams;
use anyhow::{anyhow, Error, Result};
use ndarray::Array2;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::debug;

/// Log density column; kept with the model parameters.
pub const LP: &str = "lp__";

/// Columns of one CmdStan output file.
#[derive(Debug, Clone, PartialEq)]
pub struct StanCsv {
    pub header: Vec<String>,
    /// `rows x columns`
    pub values: Array2<f64>,
}

impl StanCsv {
    fn is_sampler_column(name: &str) -> bool {
        name.ends_with("__") && name != LP
    }

    /// Names of the model parameters (and `lp__`).
    pub fn parameters(&self) -> Vec<String> {
        self.header
            .iter()
            .filter(|n| !Self::is_sampler_column(n))
            .cloned()
            .collect()
    }

    /// `iterations x parameters` draws of the model parameters.
    pub fn parameter_matrix(&self) -> Array2<f64> {
        let indices: Vec<usize> = self
            .header
            .iter()
            .enumerate()
            .filter(|(_, n)| !Self::is_sampler_column(n))
            .map(|(i, _)| i)
            .collect();
        self.values.select(ndarray::Axis(1), &indices)
    }

    /// Sampler diagnostic columns such as `divergent__`.
    pub fn sampler_columns(&self) -> Vec<(String, Vec<f64>)> {
        self.header
            .iter()
            .enumerate()
            .filter(|(_, n)| Self::is_sampler_column(n))
            .map(|(i, n)| (n.clone(), self.values.column(i).to_vec()))
            .collect()
    }
}

/// Parses CmdStan CSV text.  Lines starting with `#` are comments, the first
/// other line is the header, every following non-empty line a draw.
pub fn parse_stan_csv<R: BufRead>(reader: R) -> Result<StanCsv, Error> {
    let mut header: Option<Vec<String>> = None;
    let mut data: Vec<f64> = Vec::new();
    let mut rows = 0;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let names = match &header {
            Some(names) => names,
            None => {
                header = Some(line.split(',').map(|s| s.trim().to_string()).collect());
                continue;
            }
        };
        let start = data.len();
        for value in line.split(',') {
            let value = value.trim();
            data.push(value.parse::<f64>().map_err(|_| {
                anyhow!("Line {}: can't parse '{}' as a number", lineno + 1, value)
            })?);
        }
        if data.len() - start != names.len() {
            return Err(anyhow!(
                "Line {}: expected {} values, found {}",
                lineno + 1,
                names.len(),
                data.len() - start
            ));
        }
        rows += 1;
    }
    let header = header.ok_or_else(|| anyhow!("No header row found"))?;
    if rows == 0 {
        return Err(anyhow!("No draws found"));
    }
    let values = Array2::from_shape_vec((rows, header.len()), data)?;
    Ok(StanCsv { header, values })
}

pub fn read_stan_csv<P: AsRef<Path>>(path: P) -> Result<StanCsv, Error> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| anyhow!("Can't open {}: {}", path.display(), e))?;
    parse_stan_csv(BufReader::new(f)).map_err(|e| anyhow!("{}: {}", path.display(), e))
}

/// Combines one parsed file per chain into draws and NUTS parameters.
pub fn combine_chains(files: &[StanCsv]) -> Result<(Draws, NutsParams), Error> {
    let first = files
        .first()
        .ok_or_else(|| anyhow!("At least one Stan CSV file is required"))?;
    if let Some((c, _)) = files
        .iter()
        .enumerate()
        .find(|(_, f)| f.header != first.header)
    {
        return Err(anyhow!(
            "Chain {} has different columns than chain 1",
            c + 1
        ));
    }
    let draws = normalize(DrawsInput::ChainList {
        chains: files.iter().map(StanCsv::parameter_matrix).collect(),
        parameters: first.parameters(),
    })?;
    let sampler: Vec<_> = files.iter().map(StanCsv::sampler_columns).collect();
    let nuts = NutsParams::from_chain_columns(&sampler)?;
    debug!(
        chains = draws.num_chains(),
        iterations = draws.num_iterations(),
        "read Stan CSV output"
    );
    Ok((draws, nuts))
}

/// Reads one CmdStan output file per chain.
pub fn read_stan_csv_files<P: AsRef<Path>>(paths: &[P]) -> Result<(Draws, NutsParams), Error> {
    let files = paths
        .iter()
        .map(read_stan_csv)
        .collect::<Result<Vec<_>, _>>()?;
    combine_chains(&files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::divergences::Divergences;
    use crate::nuts::DIVERGENT;
    use crate::plots::{self, NutsOptions};

    const CHAIN_1: &str = "\
# model = eight_schools
# num_samples = 4
lp__,accept_stat__,divergent__,mu,tau
-4.1,0.91,0,1.5,2.0
-3.9,0.85,1,1.7,0.4
# Adaptation terminated
-4.4,0.99,0,1.2,3.1
-4.0,0.77,0,1.9,2.2
";

    const CHAIN_2: &str = "\
lp__,accept_stat__,divergent__,mu,tau
-4.2,0.93,0,1.1,2.5
-3.8,0.88,0,1.6,1.0
-4.3,0.97,0,1.0,2.9
-4.1,0.80,1,1.4,0.2
";

    #[test]
    fn test_parse_skips_comments() {
        let csv = parse_stan_csv(CHAIN_1.as_bytes()).unwrap();
        assert_eq!(csv.values.dim(), (4, 5));
        assert_eq!(csv.parameters(), vec!["lp__", "mu", "tau"]);
        let sampler = csv.sampler_columns();
        assert_eq!(sampler[1], (DIVERGENT.to_string(), vec![0.0, 1.0, 0.0, 0.0]));
        assert_eq!(csv.parameter_matrix()[[2, 2]], 3.1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_stan_csv("# only comments\n".as_bytes()).is_err());
        assert!(parse_stan_csv("a,b\n".as_bytes()).is_err());
        let err = parse_stan_csv("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Line 3"));
        assert!(parse_stan_csv("a,b\n1,x\n".as_bytes()).is_err());
    }

    #[test]
    fn test_combine_chains() {
        let files = vec![
            parse_stan_csv(CHAIN_1.as_bytes()).unwrap(),
            parse_stan_csv(CHAIN_2.as_bytes()).unwrap(),
        ];
        let (draws, nuts) = combine_chains(&files).unwrap();
        assert_eq!(draws.num_chains(), 2);
        assert_eq!(draws.num_iterations(), 4);
        assert_eq!(draws.chains("mu").unwrap()[1], vec![1.1, 1.6, 1.0, 1.4]);

        let aligned = Divergences::from_nuts(&nuts).unwrap().align(&draws).unwrap();
        assert_eq!(aligned.iterations(0), vec![2]);
        assert_eq!(aligned.iterations(1), vec![4]);

        let chart = plots::nuts_acceptance(&nuts, &NutsOptions::new().bins(4)).unwrap();
        assert_eq!(chart.panels.len(), 2);
        assert!(plots::nuts_energy(&nuts, &NutsOptions::new()).is_err());
    }

    #[test]
    fn test_mismatched_headers() {
        let other = parse_stan_csv("lp__,mu\n1,2\n".as_bytes()).unwrap();
        let files = vec![parse_stan_csv(CHAIN_1.as_bytes()).unwrap(), other];
        assert!(combine_chains(&files).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(read_stan_csv_files(&["/nonexistent/chain-1.csv"]).is_err());
    }
}
