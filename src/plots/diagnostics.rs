use crate::chart::{Chart, Geom, Layer, Panel, Segment, Style};
use anyhow::{anyhow, Error, Result};

/// R hat class boundaries.
pub const RHAT_OK: f64 = 1.05;
pub const RHAT_HIGH: f64 = 1.1;
/// Effective sample size ratio class boundaries.
pub const NEFF_LOW: f64 = 0.1;
pub const NEFF_OK: f64 = 0.5;

pub fn rhat_class(rhat: f64) -> Style {
    if rhat <= RHAT_OK {
        Style::Low
    } else if rhat <= RHAT_HIGH {
        Style::Ok
    } else {
        Style::High
    }
}

pub fn neff_class(ratio: f64) -> Style {
    if ratio <= NEFF_LOW {
        Style::Low
    } else if ratio <= NEFF_OK {
        Style::Ok
    } else {
        Style::High
    }
}

fn validate(values: &[(String, f64)], what: &str) -> Result<(), Error> {
    if values.is_empty() {
        return Err(anyhow!("No {} values to plot", what));
    }
    if let Some((name, v)) = values.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
        return Err(anyhow!(
            "{} values must be positive and finite, '{}' has {}",
            what,
            name,
            v
        ));
    }
    Ok(())
}

/// Horizontal bars from `origin` to each value, one row per parameter and a
/// point layer per class so classes can be told apart.
fn dot_chart(
    values: &[(String, f64)],
    origin: f64,
    classify: fn(f64) -> Style,
    x_label: &str,
    references: &[f64],
) -> Chart {
    let n = values.len();
    let y = |k: usize| (n - k) as f64;

    let mut chart = Chart::new(x_label, "");
    chart.y_ticks = values
        .iter()
        .enumerate()
        .map(|(k, (name, _))| (y(k), name.clone()))
        .collect();
    chart.y_limits = Some((0.5, n as f64 + 0.5));

    let mut panel = Panel::new("");
    for r in references {
        panel.push(Layer::new("reference", Style::Reference, Geom::VLine { x: *r }));
    }
    let segments = values
        .iter()
        .enumerate()
        .map(|(k, (_, v))| Segment {
            x0: origin,
            y0: y(k),
            x1: *v,
            y1: y(k),
        })
        .collect();
    panel.push(Layer::new("bars", Style::Light, Geom::Segments { segments }));
    for class in [Style::Low, Style::Ok, Style::High] {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter(|(_, (_, v))| classify(*v) == class)
            .map(|(k, (_, v))| (*v, y(k)))
            .collect();
        if !points.is_empty() {
            panel.push(Layer::new("values", class, Geom::Points { points }));
        }
    }
    chart.push_panel(panel);
    chart
}

/// R hat per parameter, classed at 1.05 and 1.1, with a reference line at 1.
/// Values usually come from [`crate::rhat::rhat_all`].
pub fn rhat(values: &[(String, f64)]) -> Result<Chart, Error> {
    validate(values, "R hat")?;
    Ok(dot_chart(values, 1.0, rhat_class, "R hat", &[1.0]))
}

/// Effective sample size ratios per parameter, classed at 0.1 and 0.5.
/// Values usually come from [`crate::ess::neff_ratio_all`].
pub fn neff(ratios: &[(String, f64)]) -> Result<Chart, Error> {
    validate(ratios, "Effective sample size ratio")?;
    Ok(dot_chart(
        ratios,
        0.0,
        neff_class,
        "N_eff / N",
        &[NEFF_LOW, NEFF_OK, 1.0],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ess::neff_ratio_all;
    use crate::plots::fixtures;
    use crate::rhat::rhat_all;

    fn named(values: &[(&str, f64)]) -> Vec<(String, f64)> {
        values.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_rhat_classes() {
        let chart = rhat(&named(&[("a", 1.01), ("b", 1.07), ("c", 1.3), ("d", 1.02)])).unwrap();
        let panel = &chart.panels[0];
        let classes: Vec<(Style, usize)> = panel
            .layers_named("values")
            .map(|l| match &l.geom {
                Geom::Points { points } => (l.style, points.len()),
                other => panic!("unexpected geometry {:?}", other),
            })
            .collect();
        assert_eq!(classes, vec![(Style::Low, 2), (Style::Ok, 1), (Style::High, 1)]);
        assert_eq!(chart.y_ticks[0], (4.0, "a".to_string()));
    }

    #[test]
    fn test_rhat_rejects_bad_values() {
        assert!(rhat(&[]).is_err());
        assert!(rhat(&named(&[("a", f64::NAN)])).is_err());
    }

    #[test]
    fn test_neff_from_draws() {
        let ratios = neff_ratio_all(&fixtures::draws(60, 2)).unwrap();
        let chart = neff(&ratios).unwrap();
        assert_eq!(chart.panels[0].layers_named("reference").count(), 3);
        assert_eq!(chart.y_ticks.len(), 2);
    }

    #[test]
    fn test_rhat_from_draws() {
        let values = rhat_all(&fixtures::draws(60, 4)).unwrap();
        assert!(rhat(&values).is_ok());
    }
}
