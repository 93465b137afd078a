use super::{prepare_setters, Prepare};
use crate::chart::{Chart, Geom, Layer, Panel, Segment, Style};
use crate::draws::Draws;
use crate::utils::{mean, quantile, sorted};
use anyhow::{anyhow, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointEstimate {
    Median,
    Mean,
    None,
}

#[derive(Debug, Clone)]
pub struct IntervalOptions {
    prepare: Prepare,
    prob: f64,
    prob_outer: f64,
    point_est: PointEstimate,
}

impl Default for IntervalOptions {
    fn default() -> Self {
        IntervalOptions {
            prepare: Prepare::default(),
            prob: 0.5,
            prob_outer: 0.9,
            point_est: PointEstimate::Median,
        }
    }
}

impl IntervalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    prepare_setters!();

    /// Probability mass of the inner interval.
    pub fn prob(mut self, prob: f64) -> Self {
        self.prob = prob;
        self
    }

    /// Probability mass of the outer interval.
    pub fn prob_outer(mut self, prob_outer: f64) -> Self {
        self.prob_outer = prob_outer;
        self
    }

    pub fn point_est(mut self, point_est: PointEstimate) -> Self {
        self.point_est = point_est;
        self
    }
}

/// Central interval and point estimate of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSummary {
    pub parameter: String,
    pub outer: (f64, f64),
    pub inner: (f64, f64),
    pub point: Option<f64>,
}

fn central(sorted: &[f64], prob: f64) -> Result<(f64, f64), Error> {
    let tail = (1.0 - prob) / 2.0;
    Ok((quantile(sorted, tail)?, quantile(sorted, 1.0 - tail)?))
}

/// Interval summaries of every selected parameter, in draws order.
pub fn summarize(draws: &Draws, options: &IntervalOptions) -> Result<Vec<IntervalSummary>, Error> {
    let (prob, prob_outer) = (options.prob, options.prob_outer);
    if !(prob > 0.0 && prob <= prob_outer && prob_outer <= 1.0) {
        return Err(anyhow!(
            "Interval probabilities must satisfy 0 < prob <= prob_outer <= 1, got prob={} prob_outer={}",
            prob,
            prob_outer
        ));
    }
    let draws = options.prepare.apply(draws)?;
    draws
        .parameters()
        .iter()
        .enumerate()
        .map(|(p, name)| {
            let values = sorted(&draws.pooled(p));
            let point = match options.point_est {
                PointEstimate::Median => Some(quantile(&values, 0.5)?),
                PointEstimate::Mean => Some(mean(&values)?),
                PointEstimate::None => None,
            };
            Ok(IntervalSummary {
                parameter: name.clone(),
                outer: central(&values, prob_outer)?,
                inner: central(&values, prob)?,
                point,
            })
        })
        .collect()
}

/// Posterior intervals: one row per parameter, first parameter on top, with
/// a thin outer interval, a thick inner interval and a point estimate.
pub fn intervals(draws: &Draws, options: &IntervalOptions) -> Result<Chart, Error> {
    let summaries = summarize(draws, options)?;
    let n = summaries.len();
    let y = |k: usize| (n - k) as f64;

    let mut chart = Chart::new("", "");
    chart.y_ticks = summaries
        .iter()
        .enumerate()
        .map(|(k, s)| (y(k), s.parameter.clone()))
        .collect();
    chart.y_limits = Some((0.5, n as f64 + 0.5));

    let segments = |pick: fn(&IntervalSummary) -> (f64, f64)| Geom::Segments {
        segments: summaries
            .iter()
            .enumerate()
            .map(|(k, s)| {
                let (lo, hi) = pick(s);
                Segment {
                    x0: lo,
                    y0: y(k),
                    x1: hi,
                    y1: y(k),
                }
            })
            .collect(),
    };
    let mut panel = Panel::new("");
    panel.push(Layer::new("outer", Style::Dark, segments(|s| s.outer)));
    panel.push(Layer::new("inner", Style::Highlight, segments(|s| s.inner)));
    let points: Vec<(f64, f64)> = summaries
        .iter()
        .enumerate()
        .filter_map(|(k, s)| s.point.map(|x| (x, y(k))))
        .collect();
    if !points.is_empty() {
        panel.push(Layer::new("point", Style::Light, Geom::Points { points }));
    }
    chart.push_panel(panel);
    Ok(chart)
}
