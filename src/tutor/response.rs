//! Fixed response templates.
use crate::Utils::plots::PlotError;
use crate::symbolic::errors::MathError;
use crate::tutor::evaluator::Outcome;
use crate::tutor::router::Intent;
use std::path::PathBuf;

pub const HELP: &str = "I handle solve, differentiate, integrate, limit, simplify. E.g., 'integrate x**2', 'limit sin(x)/x at 0'.";
pub const PLOT_FAILED: &str = "Plotting error";

/// Confirmations of the two plots of a query, original function first.
#[derive(Debug, Clone, PartialEq)]
pub struct Visuals {
    pub original: String,
    pub result: String,
}

pub fn plot_status(rendered: &Result<PathBuf, PlotError>) -> String {
    match rendered {
        Ok(path) => format!("Plot saved as {}", path.display()),
        Err(_) => PLOT_FAILED.to_string(),
    }
}

pub fn format_success(
    intent: Intent,
    outcome: &Outcome,
    explanation: &str,
    visuals: Option<&Visuals>,
) -> String {
    let result = outcome.display();
    let latex = outcome.latex();
    let mut out = match intent {
        Intent::Solve => format!("Solutions: {}. Explanation: {} (LaTeX: {})", result, explanation, latex),
        Intent::Integrate => format!("Result: {} + C. Explanation: {} (LaTeX: {})", result, explanation, latex),
        Intent::Limit => format!("Result: {}. Explanation: {}", result, explanation),
        Intent::Differentiate | Intent::Simplify => {
            format!("Result: {}. Explanation: {} (LaTeX: {})", result, explanation, latex)
        }
    };
    if let Some(visuals) = visuals {
        out.push_str(&format!(". Visuals: {} & {}", visuals.original, visuals.result));
    }
    out
}

/// `Error: could not {verb} '{operand}': {reason}. Try e.g. '{example}'.`
pub fn format_failure(intent: Intent, operand: &str, error: &MathError) -> String {
    let reason = match error {
        MathError::Parse(e) => e.reason.clone(),
        MathError::Compute(e) => e.to_string(),
    };
    format!(
        "Error: could not {} '{}': {}. Try e.g. '{}'.",
        intent.verb(),
        operand,
        reason,
        intent.example()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::errors::{ComputeError, ParseError};
    use crate::symbolic::symbolic_engine::Expr;

    #[test]
    fn test_success_templates() {
        let outcome = Outcome::Expression(Expr::Const(2.0) * Expr::var("x"));
        let explanation = "Derivative: 2*x. Steps: Power rule for polynomials, chain rule for composites.";
        let visuals = Visuals {
            original: "Plot saved as original_function.png".to_string(),
            result: "Plot saved as derivative.png".to_string(),
        };
        assert_eq!(
            format_success(Intent::Differentiate, &outcome, explanation, Some(&visuals)),
            "Result: 2*x. Explanation: Derivative: 2*x. Steps: Power rule for polynomials, chain rule for composites. (LaTeX: 2 x). Visuals: Plot saved as original_function.png & Plot saved as derivative.png"
        );
        let roots = Outcome::Solutions(vec![]);
        assert_eq!(
            format_success(Intent::Solve, &roots, "Simplify: 5. Solve: []. Steps: Set to zero, factor if quadratic.", None),
            "Solutions: []. Explanation: Simplify: 5. Solve: []. Steps: Set to zero, factor if quadratic. (LaTeX: \\left[ \\right])"
        );
        let value = Outcome::Value(Expr::infinity());
        assert_eq!(
            format_success(Intent::Limit, &value, "Limit as x->0: oo.", None),
            "Result: oo. Explanation: Limit as x->0: oo."
        );
    }

    #[test]
    fn test_failure_template() {
        let err: MathError = ParseError::new("sin(x", "unbalanced parentheses").into();
        assert_eq!(
            format_failure(Intent::Integrate, "sin(x", &err),
            "Error: could not integrate 'sin(x': unbalanced parentheses. Try e.g. 'integrate x**2'."
        );
        let err: MathError = ComputeError::new("limit does not exist").into();
        assert_eq!(
            format_failure(Intent::Limit, "1/x at 0", &err),
            "Error: could not find the limit of '1/x at 0': limit does not exist. Try e.g. 'limit sin(x)/x at 0'."
        );
    }

    #[test]
    fn test_plot_status() {
        assert_eq!(
            plot_status(&Ok(PathBuf::from("derivative.png"))),
            "Plot saved as derivative.png"
        );
        assert_eq!(plot_status(&Err(PlotError::Disabled)), PLOT_FAILED);
    }
}
