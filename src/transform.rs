use crate::draws::Draws;
use anyhow::{anyhow, Error, Result};
use ndarray::s;

/// A function applied elementwise to the draws of a parameter.  The
/// transformed parameter is renamed `name(parameter)`.
#[derive(Debug, Clone)]
pub enum Transformation {
    Log,
    Exp,
    Sqrt,
    Logit,
    InvLogit,
    Custom { name: String, f: fn(f64) -> f64 },
}

impl Transformation {
    pub fn custom<S: Into<String>>(name: S, f: fn(f64) -> f64) -> Self {
        Transformation::Custom { name: name.into(), f }
    }

    pub fn name(&self) -> &str {
        match self {
            Transformation::Log => "log",
            Transformation::Exp => "exp",
            Transformation::Sqrt => "sqrt",
            Transformation::Logit => "logit",
            Transformation::InvLogit => "inv_logit",
            Transformation::Custom { name, .. } => name.as_str(),
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Transformation::Log => x.ln(),
            Transformation::Exp => x.exp(),
            Transformation::Sqrt => x.sqrt(),
            Transformation::Logit => (x / (1.0 - x)).ln(),
            Transformation::InvLogit => 1.0 / (1.0 + (-x).exp()),
            Transformation::Custom { f, .. } => f(x),
        }
    }

    fn label(&self, parameter: &str) -> String {
        format!("{}({})", self.name(), parameter)
    }
}

#[derive(Debug, Clone)]
enum Target {
    All,
    Parameter(String),
}

/// Transformations to apply before plotting, keyed by parameter.
#[derive(Debug, Clone, Default)]
pub struct Transformations {
    entries: Vec<(Target, Transformation)>,
}

impl Transformations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `t` to every parameter.
    pub fn all(t: Transformation) -> Self {
        Transformations {
            entries: vec![(Target::All, t)],
        }
    }

    pub fn with<S: Into<String>>(mut self, parameter: S, t: Transformation) -> Self {
        self.entries.push((Target::Parameter(parameter.into()), t));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns new draws with every transformation applied.  Fails when a
    /// named parameter is absent or a transformation produces a non-finite value.
    pub fn apply(&self, draws: &Draws) -> Result<Draws, Error> {
        if self.is_empty() {
            return Ok(draws.clone());
        }
        let (mut values, mut parameters) = draws.clone().into_parts();
        for (target, t) in &self.entries {
            let indices: Vec<usize> = match target {
                Target::All => (0..parameters.len()).collect(),
                Target::Parameter(name) => vec![parameters
                    .iter()
                    .position(|p| p == name)
                    .ok_or_else(|| {
                        anyhow!("Can't transform '{}', parameter not found in draws", name)
                    })?],
            };
            for p in indices {
                let mut column = values.slice_mut(s![.., .., p]);
                column.mapv_inplace(|x| t.apply(x));
                if column.iter().any(|v| !v.is_finite()) {
                    return Err(anyhow!(
                        "Transformation '{}' produced a non-finite value for parameter '{}'",
                        t.name(),
                        parameters[p]
                    ));
                }
                parameters[p] = t.label(&parameters[p]);
            }
        }
        Draws::new(values, parameters)
    }
}
