//! PNG plots of functions of `x` drawn with plotters.
use crate::Utils::config::PlotConfig;
use crate::symbolic::errors::ComputeError;
use crate::symbolic::symbolic_engine::Expr;
use chrono::Local;
use log::{debug, info, warn};
use plotters::prelude::*;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// the only symbol a plotted expression may contain
pub const PLOT_VARIABLE: &str = "x";

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("plotting is disabled")]
    Disabled,
    #[error(transparent)]
    Compute(#[from] ComputeError),
    #[error("no finite values on [{x_min}, {x_max}]")]
    NoFinitePoints { x_min: f64, x_max: f64 },
    #[error("values from {y_min:e} to {y_max:e} are too far apart to draw")]
    RangeTooWide { y_min: f64, y_max: f64 },
    #[error("drawing failed: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn backend_error<E: Display>(e: E) -> PlotError {
    PlotError::Backend(e.to_string())
}

/// `"Original Function"` -> `"original_function"`
pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

/// Samples of a curve split at undefined points: every segment is a run of finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub segments: Vec<Vec<(f64, f64)>>,
    pub y_min: f64,
    pub y_max: f64,
}

impl Curve {
    pub fn sample(expr: &Expr, config: &PlotConfig) -> Result<Curve, PlotError> {
        let others: Vec<String> = expr
            .free_symbols()
            .into_iter()
            .filter(|s| s != PLOT_VARIABLE)
            .collect();
        if !others.is_empty() {
            return Err(ComputeError::new(format!(
                "cannot plot over {}: unknown symbols {}",
                PLOT_VARIABLE,
                others.join(", ")
            ))
            .into());
        }
        let (xs, ys) = expr.eval_on_linspace(PLOT_VARIABLE, config.x_min, config.x_max, config.samples)?;
        let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current = Vec::new();
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (x, y) in xs.into_iter().zip(ys) {
            if y.is_finite() {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
                current.push((x, y));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        if segments.is_empty() {
            return Err(PlotError::NoFinitePoints {
                x_min: config.x_min,
                x_max: config.x_max,
            });
        }
        // the padded span must stay finite, plotters does not return on an infinite axis
        if !(1.1 * (y_max - y_min)).is_finite() {
            return Err(PlotError::RangeTooWide { y_min, y_max });
        }
        // a constant function still needs a non-empty y range
        if y_max - y_min <= 1e-12 * y_min.abs().max(y_max.abs()) {
            y_min -= 1.0;
            y_max += 1.0;
        }
        Ok(Curve {
            segments,
            y_min,
            y_max,
        })
    }

    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }
}

pub struct PlotRenderer {
    pub config: PlotConfig,
}

impl PlotRenderer {
    pub fn new(config: PlotConfig) -> Self {
        PlotRenderer { config }
    }

    /// File the plot with this title is written to.
    pub fn file_path(&self, title: &str) -> PathBuf {
        let mut stem = slugify(title);
        if self.config.unique_names {
            stem.push_str(&Local::now().format("_%Y%m%d_%H%M%S%3f").to_string());
        }
        let file_name = format!("{}.png", stem);
        if self.config.output_dir == Path::new(".") {
            PathBuf::from(file_name)
        } else {
            self.config.output_dir.join(file_name)
        }
    }

    /// Samples `expr` over the configured domain and writes it as a PNG. Returns the path
    /// of the written file.
    pub fn render(&self, expr: &Expr, title: &str) -> Result<PathBuf, PlotError> {
        if !self.config.enabled {
            return Err(PlotError::Disabled);
        }
        let curve = Curve::sample(expr, &self.config)?;
        if self.config.output_dir != Path::new(".") {
            fs::create_dir_all(&self.config.output_dir)?;
        }
        let path = self.file_path(title);
        debug!("plotting {} with {} points into {}", expr, curve.len(), path.display());
        if let Err(e) = self.draw(&path, &curve, Some(title)) {
            // text needs a system font; without one the curve is still worth drawing
            warn!("plot '{}' failed ({}), retrying without labels", title, e);
            self.draw(&path, &curve, None)?;
        }
        info!("plot saved as {}", path.display());
        Ok(path)
    }

    fn draw(&self, path: &Path, curve: &Curve, title: Option<&str>) -> Result<(), PlotError> {
        let config = &self.config;
        let root_area = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
        root_area.fill(&WHITE).map_err(backend_error)?;
        let pad = 0.05 * (curve.y_max - curve.y_min);
        let mut builder = ChartBuilder::on(&root_area);
        builder.margin(10);
        if let Some(title) = title {
            builder
                .caption(title, ("sans-serif", 50))
                .x_label_area_size(30)
                .y_label_area_size(50);
        }
        let mut chart = builder
            .build_cartesian_2d(
                config.x_min..config.x_max,
                (curve.y_min - pad)..(curve.y_max + pad),
            )
            .map_err(backend_error)?;

        let mut mesh = chart.configure_mesh();
        if title.is_some() {
            mesh.x_desc(PLOT_VARIABLE);
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(backend_error)?;

        for segment in &curve.segments {
            chart
                .draw_series(LineSeries::new(segment.iter().copied(), &BLUE))
                .map_err(backend_error)?;
        }
        root_area.present().map_err(backend_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer_in(dir: &Path) -> PlotRenderer {
        PlotRenderer::new(PlotConfig {
            output_dir: dir.to_path_buf(),
            samples: 101,
            width: 320,
            height: 240,
            ..PlotConfig::default()
        })
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Original Function"), "original_function");
        assert_eq!(slugify("Derivative"), "derivative");
    }

    #[test]
    fn test_file_names() {
        let renderer = PlotRenderer::new(PlotConfig::default());
        assert_eq!(renderer.file_path("Original Function"), PathBuf::from("original_function.png"));
        let renderer = PlotRenderer::new(PlotConfig {
            unique_names: true,
            output_dir: PathBuf::from("plots"),
            ..PlotConfig::default()
        });
        let path = renderer.file_path("Integral");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(path.starts_with("plots"));
        assert!(name.starts_with("integral_") && name.ends_with(".png"));
    }

    #[test]
    fn test_sampling_splits_at_poles() {
        let config = PlotConfig {
            x_min: -1.0,
            x_max: 1.0,
            samples: 5,
            ..PlotConfig::default()
        };
        // 1/x is undefined at the middle sample
        let curve = Curve::sample(&Expr::parse_expression("1/x").unwrap(), &config).unwrap();
        assert_eq!(curve.segments.len(), 2);
        assert_eq!(curve.len(), 4);
        // log is undefined on the left half
        let curve = Curve::sample(&Expr::parse_expression("log(x)").unwrap(), &config).unwrap();
        assert_eq!(curve.segments.len(), 1);
        assert_eq!(curve.len(), 2);
        let constant = Curve::sample(&Expr::Const(3.0), &config).unwrap();
        assert!(constant.y_min < 3.0 && constant.y_max > 3.0);
    }

    #[test]
    fn test_sampling_failures() {
        let config = PlotConfig::default();
        let e = Expr::parse_expression("log(-1 - x**2)").unwrap();
        assert!(matches!(Curve::sample(&e, &config), Err(PlotError::NoFinitePoints { .. })));
        let e = Expr::parse_expression("x*y").unwrap();
        assert!(matches!(Curve::sample(&e, &config), Err(PlotError::Compute(_))));
    }

    #[test]
    fn test_span_beyond_f64_is_rejected() {
        let config = PlotConfig::default();
        // finite samples near -1.7e308 and 1.7e308
        let e = Expr::parse_expression("308*x**307").unwrap();
        assert!(matches!(Curve::sample(&e, &config), Err(PlotError::RangeTooWide { .. })));
        let dir = tempfile::tempdir().unwrap();
        let renderer = PlotRenderer::new(PlotConfig {
            output_dir: dir.path().to_path_buf(),
            ..PlotConfig::default()
        });
        let result = renderer.render(&e, "Derivative");
        assert!(matches!(result, Err(PlotError::RangeTooWide { .. })));
        assert!(!dir.path().join("derivative.png").exists());
        // wide but drawable
        let e = Expr::parse_expression("x**300").unwrap();
        let curve = Curve::sample(&e, &config).unwrap();
        assert!((curve.y_max - curve.y_min).is_finite());
    }

    #[test]
    fn test_render_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = renderer_in(dir.path());
        let expr = Expr::parse_expression("x**2").unwrap();
        let path = renderer.render(&expr, "Original Function").unwrap();
        assert_eq!(path, dir.path().join("original_function.png"));
        assert!(fs::metadata(&path).unwrap().len() > 0);
        // the same title overwrites the same file
        let again = renderer.render(&Expr::parse_expression("2*x").unwrap(), "Original Function").unwrap();
        assert_eq!(again, path);
    }

    #[test]
    fn test_disabled_renderer() {
        let renderer = PlotRenderer::new(PlotConfig {
            enabled: false,
            ..PlotConfig::default()
        });
        let result = renderer.render(&Expr::var("x"), "Original Function");
        assert!(matches!(result, Err(PlotError::Disabled)));
    }
}
