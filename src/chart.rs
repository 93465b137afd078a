use anyhow::{Error, Result};
use serde::Serialize;

/// Visual role of a layer.  The renderer maps roles to colours; charts only
/// record what a layer means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Style {
    /// 0-based chain index
    Chain(usize),
    Highlight,
    Muted,
    Divergence,
    Warmup,
    Reference,
    Dark,
    Light,
    /// Diagnostic classes, e.g. R hat <= 1.05
    Low,
    Ok,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// Geometry of one layer, in data coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geom {
    Line { points: Vec<(f64, f64)> },
    Points { points: Vec<(f64, f64)> },
    Rects { rects: Vec<Rect> },
    Segments { segments: Vec<Segment> },
    /// Tick marks along the bottom of the panel
    Rug { xs: Vec<f64> },
    HLine { y: f64 },
    VLine { x: f64 },
}

fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn merge(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some((a0, a1)), Some((b0, b1))) => Some((a0.min(b0), a1.max(b1))),
        (a, None) => a,
        (None, b) => b,
    }
}

impl Geom {
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        match self {
            Geom::Line { points } | Geom::Points { points } => extent(points.iter().map(|p| p.0)),
            Geom::Rects { rects } => extent(rects.iter().flat_map(|r| vec![r.x0, r.x1])),
            Geom::Segments { segments } => {
                extent(segments.iter().flat_map(|s| vec![s.x0, s.x1]))
            }
            Geom::Rug { xs } => extent(xs.iter().copied()),
            Geom::HLine { .. } => None,
            Geom::VLine { x } => Some((*x, *x)),
        }
    }

    pub fn y_extent(&self) -> Option<(f64, f64)> {
        match self {
            Geom::Line { points } | Geom::Points { points } => extent(points.iter().map(|p| p.1)),
            Geom::Rects { rects } => extent(rects.iter().flat_map(|r| vec![r.y0, r.y1])),
            Geom::Segments { segments } => {
                extent(segments.iter().flat_map(|s| vec![s.y0, s.y1]))
            }
            Geom::HLine { y } => Some((*y, *y)),
            Geom::Rug { .. } | Geom::VLine { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub style: Style,
    pub geom: Geom,
}

impl Layer {
    pub fn new<S: Into<String>>(name: S, style: Style, geom: Geom) -> Self {
        Layer {
            name: name.into(),
            style,
            geom,
        }
    }
}

/// One facet of a chart, layers drawn in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub label: String,
    pub layers: Vec<Layer>,
}

impl Panel {
    pub fn new<S: Into<String>>(label: S) -> Self {
        Panel {
            label: label.into(),
            layers: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layers_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Layer> + 'a {
        self.layers.iter().filter(move |l| l.name == name)
    }

    pub fn x_extent(&self) -> Option<(f64, f64)> {
        self.layers
            .iter()
            .fold(None, |acc, l| merge(acc, l.geom.x_extent()))
    }

    pub fn y_extent(&self) -> Option<(f64, f64)> {
        self.layers
            .iter()
            .fold(None, |acc, l| merge(acc, l.geom.y_extent()))
    }
}

/// A layered, faceted chart.  Plot functions build these; [`crate::render`]
/// turns them into images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub panels: Vec<Panel>,
    pub x_label: String,
    pub y_label: String,
    /// Displayed x range; data outside it are kept but not shown.
    pub x_limits: Option<(f64, f64)>,
    pub y_limits: Option<(f64, f64)>,
    /// Labels for categorical y positions, e.g. parameter names.
    pub y_ticks: Vec<(f64, String)>,
    /// Facet columns when rendering, `None` for the default.
    pub ncol: Option<usize>,
    /// Informational messages produced while building the chart.
    pub notices: Vec<String>,
}

impl Chart {
    pub fn new<X: Into<String>, Y: Into<String>>(x_label: X, y_label: Y) -> Self {
        Chart {
            panels: Vec::new(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_limits: None,
            y_limits: None,
            y_ticks: Vec::new(),
            ncol: None,
            notices: Vec::new(),
        }
    }

    pub fn push_panel(&mut self, panel: Panel) {
        self.panels.push(panel);
    }

    pub fn panel(&self, label: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.label == label)
    }

    /// True if any panel holds a layer called `name`.
    pub fn has_layer(&self, name: &str) -> bool {
        self.panels.iter().any(|p| p.layers_named(name).next().is_some())
    }

    pub fn notice<S: Into<String>>(&mut self, message: S) {
        self.notices.push(message.into());
    }

    /// The x range a renderer should display: the explicit limits when set,
    /// otherwise the union of the panels' data.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        self.x_limits.or_else(|| {
            self.panels
                .iter()
                .fold(None, |acc, p| merge(acc, p.x_extent()))
        })
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}
