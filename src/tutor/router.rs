//! Keyword routing of free-text queries.
//!
//! The lowercased query is matched against the intent keywords in a fixed priority order,
//! the first match wins. The operand is the text that follows the keyword; for
//! `derivative of ...`/`integral of ...` it follows the first word `of`, and a limit point
//! follows the word `at`.
use crate::Utils::config::TutorConfig;
use crate::Utils::plots::PlotRenderer;
use crate::symbolic::errors::MathError;
use crate::tutor::evaluator::{self, Outcome};
use crate::tutor::response::{self, Visuals};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

lazy_static! {
    /// the word `plot` together with an `and` joining it to the rest of the query
    static ref PLOT_WORD: Regex = Regex::new(r"(?i)\s*\b(?:and\s+)?plot\b(?:\s+and\b)?\s*").unwrap();
    static ref OF_WORD: Regex = Regex::new(r"(?i)\bof\b").unwrap();
    static ref AT_WORD: Regex = Regex::new(r"(?i)\bat\b").unwrap();
    static ref LIMIT_WORD: Regex = Regex::new(r"(?i)limit(?:\s+of\b)?").unwrap();
}

/// The operation a query asks for. Variants are listed in matching priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Intent {
    Solve,
    Differentiate,
    Integrate,
    Limit,
    Simplify,
}

impl Intent {
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Intent::Solve => &["solve"],
            Intent::Differentiate => &["differentiate", "derivative"],
            Intent::Integrate => &["integrate", "integral"],
            Intent::Limit => &["limit"],
            Intent::Simplify => &["simplify"],
        }
    }

    /// First intent whose keyword occurs in the query.
    pub fn detect(query: &str) -> Option<Intent> {
        let lower = query.to_ascii_lowercase();
        Intent::iter().find(|intent| intent.keywords().iter().any(|k| lower.contains(k)))
    }

    /// what the failure message says could not be done
    pub fn verb(&self) -> &'static str {
        match self {
            Intent::Limit => "find the limit of",
            _ => self.keywords()[0],
        }
    }

    pub fn example(&self) -> &'static str {
        match self {
            Intent::Solve => "solve x**2 - 4 = 0",
            Intent::Differentiate => "differentiate x**3 + sin(x)",
            Intent::Integrate => "integrate x**2",
            Intent::Limit => "limit sin(x)/x at 0",
            Intent::Simplify => "simplify (x**2 - 1)/(x - 1)",
        }
    }

    /// title of the plot of the result; `None` when the result is not a function of `x`
    pub fn result_title(&self) -> Option<&'static str> {
        match self {
            Intent::Differentiate => Some("Derivative"),
            Intent::Integrate => Some("Integral"),
            Intent::Simplify => Some("Simplified"),
            Intent::Solve | Intent::Limit => None,
        }
    }
}

pub const ORIGINAL_TITLE: &str = "Original Function";

/// A query taken apart: what to do, with which expression, and whether to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub intent: Intent,
    pub expr: String,
    /// limit point as typed, `0` when the query names none
    pub point: Option<String>,
    pub plot: bool,
}

/// byte offset just past the last occurrence of `keyword` in `lower`
fn after_last(lower: &str, keyword: &str) -> Option<usize> {
    lower.rfind(keyword).map(|at| at + keyword.len())
}

fn strip_plot_word(text: &str) -> String {
    PLOT_WORD.replace_all(text, " ").trim().to_string()
}

impl Request {
    pub fn parse(query: &str) -> Option<Request> {
        let intent = Intent::detect(query)?;
        // ASCII lowercasing keeps byte offsets, so positions found in `lower` slice `query`
        let lower = query.to_ascii_lowercase();
        let plot = lower.contains("plot");
        let (expr, point) = match intent {
            Intent::Solve | Intent::Simplify => {
                let start = after_last(&lower, intent.keywords()[0]).unwrap_or(0);
                (query[start..].to_string(), None)
            }
            Intent::Differentiate | Intent::Integrate => {
                let [verb, noun] = [intent.keywords()[0], intent.keywords()[1]];
                let start = after_last(&lower, verb)
                    .or_else(|| OF_WORD.find(&lower).map(|m| m.end()))
                    .or_else(|| after_last(&lower, noun))
                    .unwrap_or(0);
                (query[start..].to_string(), None)
            }
            Intent::Limit => {
                let start = LIMIT_WORD.find_iter(&lower).last().map_or(0, |m| m.end());
                let rest = &lower[start..];
                match AT_WORD.find(rest) {
                    Some(m) => (rest[..m.start()].to_string(), Some(strip_plot_word(&rest[m.end()..]))),
                    None => (rest.to_string(), None),
                }
            }
        };
        let point = match point {
            Some(p) if !p.is_empty() => Some(p),
            _ if intent == Intent::Limit => Some("0".to_string()),
            _ => None,
        };
        Some(Request {
            intent,
            expr: strip_plot_word(&expr),
            point,
            plot,
        })
    }

    fn evaluate(&self) -> Result<(Outcome, String), MathError> {
        match self.intent {
            Intent::Solve => evaluator::solve(&self.expr),
            Intent::Differentiate => evaluator::differentiate(&self.expr),
            Intent::Integrate => evaluator::integrate(&self.expr),
            Intent::Limit => evaluator::limit(&self.expr, self.point.as_deref().unwrap_or("0")),
            Intent::Simplify => evaluator::simplify(&self.expr),
        }
    }

    /// operand as shown in a failure message
    fn operand(&self) -> String {
        match (&self.intent, &self.point) {
            (Intent::Limit, Some(point)) => format!("{} at {}", self.expr, point).trim().to_string(),
            _ => self.expr.clone(),
        }
    }
}

/// Answers queries: routes them, evaluates them and renders requested plots.
pub struct Tutor {
    renderer: PlotRenderer,
}

impl Tutor {
    pub fn new(config: &TutorConfig) -> Tutor {
        Tutor {
            renderer: PlotRenderer::new(config.plot.clone()),
        }
    }

    /// The response line for one query. Never fails: errors become messages.
    pub fn respond(&self, query: &str) -> String {
        let Some(request) = Request::parse(query) else {
            debug!("no intent in '{}'", query);
            return response::HELP.to_string();
        };
        info!("intent {} on '{}'", request.intent, request.expr);
        match request.evaluate() {
            Ok((outcome, explanation)) => {
                let visuals = self.visuals(&request, &outcome);
                response::format_success(request.intent, &outcome, &explanation, visuals.as_ref())
            }
            Err(e) => {
                info!("{} failed: {}", request.intent, e);
                response::format_failure(request.intent, &request.operand(), &e)
            }
        }
    }

    /// Renders the original function and the result when the query asks for a plot.
    fn visuals(&self, request: &Request, outcome: &Outcome) -> Option<Visuals> {
        let title = request.intent.result_title()?;
        let result = outcome.expression()?;
        if !request.plot {
            return None;
        }
        let original = match evaluator::parse(&request.expr) {
            Ok(f) => response::plot_status(&self.renderer.render(&f, ORIGINAL_TITLE)),
            Err(_) => response::PLOT_FAILED.to_string(),
        };
        let result = response::plot_status(&self.renderer.render(result, title));
        Some(Visuals { original, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> Request {
        Request::parse(query).unwrap()
    }

    #[test]
    fn test_intent_priority() {
        assert_eq!(Intent::detect("solve x**2 - 4 = 0"), Some(Intent::Solve));
        assert_eq!(Intent::detect("Find the DERIVATIVE of x**2"), Some(Intent::Differentiate));
        assert_eq!(Intent::detect("simplify the integral of x"), Some(Intent::Integrate));
        assert_eq!(Intent::detect("solve the limit"), Some(Intent::Solve));
        assert_eq!(Intent::detect("limit then simplify"), Some(Intent::Limit));
        assert_eq!(Intent::detect("what is 2 + 2"), None);
        assert_eq!(Intent::Differentiate.to_string(), "differentiate");
    }

    #[test]
    fn test_solve_and_simplify_operands() {
        let r = request("Please solve x**2 - 4 = 0");
        assert_eq!(r.intent, Intent::Solve);
        assert_eq!(r.expr, "x**2 - 4 = 0");
        assert_eq!(r.point, None);
        assert!(!r.plot);
        assert_eq!(request("simplify x + x").expr, "x + x");
        assert_eq!(request("SIMPLIFY X + X").expr, "X + X");
    }

    #[test]
    fn test_derivative_operands() {
        assert_eq!(request("differentiate x**3").expr, "x**3");
        assert_eq!(request("what is the derivative of sin(x)").expr, "sin(x)");
        assert_eq!(request("derivative x**2").expr, "x**2");
        assert_eq!(request("integral of x**2").expr, "x**2");
        assert_eq!(request("integrate cos(x) and plot").expr, "cos(x)");
        let r = request("Plot and differentiate x**2");
        assert_eq!(r.expr, "x**2");
        assert!(r.plot);
    }

    #[test]
    fn test_limit_operands() {
        let r = request("limit sin(x)/x at 0");
        assert_eq!(r.expr, "sin(x)/x");
        assert_eq!(r.point.as_deref(), Some("0"));
        let r = request("Find the limit of atan(x) at oo");
        assert_eq!(r.expr, "atan(x)");
        assert_eq!(r.point.as_deref(), Some("oo"));
        let r = request("limit  of 1/x");
        assert_eq!(r.expr, "1/x");
        assert_eq!(r.point.as_deref(), Some("0"));
        let r = request("limit at 0");
        assert_eq!(r.expr, "");
        assert_eq!(r.operand(), "at 0");
        assert_eq!(request("limit sin(x)/x at oo").operand(), "sin(x)/x at oo");
    }

    #[test]
    fn test_unknown_query_gets_help() {
        let tutor = Tutor::new(&TutorConfig::default());
        for query in ["hello", "", "2 + 2", "plot x**2"] {
            assert_eq!(tutor.respond(query), response::HELP);
        }
    }

    #[test]
    fn test_respond_success() {
        let tutor = Tutor::new(&TutorConfig::default());
        assert_eq!(
            tutor.respond("solve x**2 - 4 = 0"),
            "Solutions: [-2, 2]. Explanation: Simplify: x**2 - 4. Solve: [-2, 2]. Steps: Set to zero, factor if quadratic. (LaTeX: \\left[ -2, \\  2\\right])"
        );
        assert_eq!(
            tutor.respond("integrate x**2"),
            "Result: x**3/3 + C. Explanation: Integral: x**3/3 + C. Steps: Reverse differentiation rules. (LaTeX: \\frac{x^{3}}{3})"
        );
        assert_eq!(
            tutor.respond("limit sin(x)/x at 0"),
            "Result: 1. Explanation: Limit as x->0: 1. Steps: Substitute if direct, or L'Hôpital if indeterminate."
        );
        assert_eq!(
            tutor.respond("simplify x + x"),
            "Result: 2*x. Explanation: Simplified: 2*x. Steps: Combine like terms, factor. (LaTeX: 2 x)"
        );
    }

    #[test]
    fn test_respond_failure_names_input() {
        let tutor = Tutor::new(&TutorConfig::default());
        let answer = tutor.respond("differentiate sin(x");
        assert!(answer.starts_with("Error: could not differentiate 'sin(x'"), "{}", answer);
        assert!(answer.ends_with("Try e.g. 'differentiate x**3 + sin(x)'."));
        let answer = tutor.respond("limit 1/x at 0");
        assert!(answer.contains("'1/x at 0'"), "{}", answer);
        assert!(answer.contains("limit does not exist"), "{}", answer);
    }

    #[test]
    fn test_respond_with_plots() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TutorConfig::default();
        config.plot.output_dir = dir.path().to_path_buf();
        config.plot.width = 320;
        config.plot.height = 240;
        let tutor = Tutor::new(&config);
        let answer = tutor.respond("differentiate x**2 and plot");
        let original = dir.path().join("original_function.png");
        let derivative = dir.path().join("derivative.png");
        assert_eq!(
            answer,
            format!(
                "Result: 2*x. Explanation: Derivative: 2*x. Steps: Power rule for polynomials, chain rule for composites. (LaTeX: 2 x). Visuals: Plot saved as {} & Plot saved as {}",
                original.display(),
                derivative.display()
            )
        );
        assert!(original.exists() && derivative.exists());
        // no plots for roots
        let answer = tutor.respond("solve x - 1 = 0 and plot");
        assert!(!answer.contains("Visuals"));
    }

    #[test]
    fn test_plot_failure_is_contained() {
        let mut config = TutorConfig::default();
        config.plot.enabled = false;
        let tutor = Tutor::new(&config);
        let answer = tutor.respond("simplify x + x plot");
        assert!(answer.starts_with("Result: 2*x."));
        assert!(answer.ends_with(". Visuals: Plotting error & Plotting error"), "{}", answer);
    }

    #[test]
    fn test_unbounded_plot_range_is_a_plot_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TutorConfig::default();
        config.plot.output_dir = dir.path().to_path_buf();
        let tutor = Tutor::new(&config);
        let answer = tutor.respond("simplify 308*x**307 and plot");
        assert!(answer.starts_with("Result: 308*x**307."), "{}", answer);
        assert!(answer.ends_with(". Visuals: Plotting error & Plotting error"), "{}", answer);
    }
}
