use crate::draws::Draws;
use anyhow::{anyhow, Error, Result};
use regex::Regex;
use tracing::debug;

/// Which parameters a plot should show.
///
/// Exact names in `pars` come first, in the order given, followed by every
/// parameter matching one of `regex_pars` in the order the draws hold them.
/// An empty selection keeps all parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSelection {
    pars: Vec<String>,
    regex_pars: Vec<String>,
}

impl ParameterSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn pars<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().and_pars(names)
    }

    pub fn regex_pars<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().and_regex_pars(patterns)
    }

    pub fn and_pars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pars.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn and_regex_pars<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regex_pars.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pars.is_empty() && self.regex_pars.is_empty()
    }

    /// Resolves the selection against the available parameter names.
    pub fn resolve(&self, available: &[String]) -> Result<Vec<String>, Error> {
        if self.is_empty() {
            return Ok(available.to_vec());
        }

        let missing: Vec<&str> = self
            .pars
            .iter()
            .filter(|p| !available.contains(p))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(anyhow!(
                "Some 'pars' don't match parameter names: {}",
                missing.join(", ")
            ));
        }

        let mut selected: Vec<String> = Vec::new();
        for p in &self.pars {
            if !selected.contains(p) {
                selected.push(p.clone());
            }
        }

        for pattern in &self.regex_pars {
            let re = Regex::new(pattern)
                .map_err(|e| anyhow!("Invalid pattern '{}' in 'regex_pars': {}", pattern, e))?;
            let matches: Vec<&String> = available.iter().filter(|a| re.is_match(a)).collect();
            if matches.is_empty() {
                return Err(anyhow!("No matches for 'regex_pars' pattern '{}'", pattern));
            }
            debug!(pattern = pattern.as_str(), matched = matches.len(), "regex_pars");
            for m in matches {
                if !selected.contains(m) {
                    selected.push(m.clone());
                }
            }
        }
        Ok(selected)
    }

    /// Restricts `draws` to the selected parameters.
    pub fn apply(&self, draws: &Draws) -> Result<Draws, Error> {
        if self.is_empty() {
            return Ok(draws.clone());
        }
        draws.subset(&self.resolve(draws.parameters())?)
    }
}
