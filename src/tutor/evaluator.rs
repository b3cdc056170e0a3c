//! The five operations of the tutor over the single free variable `x`.
//!
//! Every operation takes the operand text as the user typed it and returns the computed
//! [`Outcome`] together with the explanation sentence of the response, or a
//! [`MathError`] telling whether the text did not parse or nothing could be computed.
use crate::symbolic::errors::{ComputeError, MathError, ParseError};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_latex::list_to_latex;
use crate::symbolic::symbolic_limit::LimitPoint;
use crate::symbolic::utils::find_char_positions_outside_brackets;
use itertools::Itertools;
use log::debug;

/// the variable every query is about
pub const FREE_VARIABLE: &str = "x";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// roots of an equation, real ones first in ascending order
    Solutions(Vec<Expr>),
    /// an expression of `x`: derivative, antiderivative or simplified form
    Expression(Expr),
    /// value of a limit, possibly `oo` or `-oo`
    Value(Expr),
}

impl Outcome {
    /// `[-2, 2]` for roots, the plain expression otherwise
    pub fn display(&self) -> String {
        match self {
            Outcome::Solutions(roots) => roots_to_string(roots),
            Outcome::Expression(e) | Outcome::Value(e) => e.to_string(),
        }
    }

    pub fn latex(&self) -> String {
        match self {
            Outcome::Solutions(roots) => list_to_latex(roots),
            Outcome::Expression(e) | Outcome::Value(e) => e.to_latex(),
        }
    }

    /// the result as a single expression, if it is one
    pub fn expression(&self) -> Option<&Expr> {
        match self {
            Outcome::Solutions(_) => None,
            Outcome::Expression(e) | Outcome::Value(e) => Some(e),
        }
    }
}

pub fn roots_to_string(roots: &[Expr]) -> String {
    format!("[{}]", roots.iter().join(", "))
}

pub fn parse(text: &str) -> Result<Expr, ParseError> {
    Expr::parse_expression(text.trim())
}

/// `lhs = rhs` becomes `lhs - (rhs)`; text without a top-level `=` is taken as is.
pub fn parse_equation(text: &str) -> Result<Expr, ParseError> {
    let equals = find_char_positions_outside_brackets(text, '=');
    match equals.as_slice() {
        [] => parse(text),
        [at] => {
            let lhs = parse(&text[..*at])?;
            let rhs = parse(&text[at + 1..])?;
            if rhs.is_zero() {
                Ok(lhs)
            } else {
                Ok(Expr::Sub(lhs.boxed(), rhs.boxed()))
            }
        }
        _ => Err(ParseError::new(text.trim(), "an equation has exactly one '='")),
    }
}

/// `1/0` and `0/0` have no value
fn defined(expr: Expr) -> Result<Expr, ComputeError> {
    if expr.divides_by_zero() {
        return Err(ComputeError::new(format!("{} is undefined (division by zero)", expr)));
    }
    Ok(expr)
}

pub fn solve(text: &str) -> Result<(Outcome, String), MathError> {
    let equation = parse_equation(text)?.simplify();
    let roots = equation.solve(FREE_VARIABLE)?;
    debug!("solve {} = 0: {} roots", equation, roots.len());
    let explanation = format!(
        "Simplify: {}. Solve: {}. Steps: Set to zero, factor if quadratic.",
        equation,
        roots_to_string(&roots)
    );
    Ok((Outcome::Solutions(roots), explanation))
}

pub fn differentiate(text: &str) -> Result<(Outcome, String), MathError> {
    let f = parse(text)?;
    let derivative = defined(f.diff(FREE_VARIABLE).simplify())?;
    debug!("d/dx {} = {}", f, derivative);
    let explanation = format!(
        "Derivative: {}. Steps: Power rule for polynomials, chain rule for composites.",
        derivative
    );
    Ok((Outcome::Expression(derivative), explanation))
}

/// Antiderivative without the integration constant; the response adds `+ C`.
pub fn integrate(text: &str) -> Result<(Outcome, String), MathError> {
    let f = parse(text)?;
    let integral = f.integrate(FREE_VARIABLE)?.simplify();
    debug!("integral of {} = {}", f, integral);
    let explanation = format!("Integral: {} + C. Steps: Reverse differentiation rules.", integral);
    Ok((Outcome::Expression(integral), explanation))
}

/// Two-sided limit of `text` as `x` approaches `point`; the explanation names the point
/// the way it was typed.
pub fn limit(text: &str, point: &str) -> Result<(Outcome, String), MathError> {
    let f = parse(text)?;
    let at = LimitPoint::parse(point)?;
    let value = f.limit(FREE_VARIABLE, &at)?;
    debug!("limit of {} at {} = {}", f, at, value);
    let explanation = format!(
        "Limit as x->{}: {}. Steps: Substitute if direct, or L'Hôpital if indeterminate.",
        point.trim(),
        value
    );
    Ok((Outcome::Value(value), explanation))
}

pub fn simplify(text: &str) -> Result<(Outcome, String), MathError> {
    let f = parse(text)?;
    let simplified = defined(f.simplify())?;
    debug!("simplify {} = {}", f, simplified);
    let explanation = format!("Simplified: {}. Steps: Combine like terms, factor.", simplified);
    Ok((Outcome::Expression(simplified), explanation))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(result: Result<(Outcome, String), MathError>) -> String {
        result.unwrap().0.display()
    }

    #[test]
    fn test_solve_equation_forms() {
        assert_eq!(shown(solve("x**2 - 4 = 0")), "[-2, 2]");
        assert_eq!(shown(solve("x**2 - 4")), "[-2, 2]");
        assert_eq!(shown(solve("x**2 = 4")), "[-2, 2]");
        assert_eq!(shown(solve("2*x + 1 = x")), "[-1]");
        let (outcome, explanation) = solve("x**2 - 4 = 0").unwrap();
        assert_eq!(
            explanation,
            "Simplify: x**2 - 4. Solve: [-2, 2]. Steps: Set to zero, factor if quadratic."
        );
        assert_eq!(outcome.latex(), r"\left[ -2, \  2\right]");
    }

    #[test]
    fn test_solve_errors() {
        assert!(solve("x = 1 = 2").unwrap_err().is_parse_error());
        assert!(solve("x**2 = ").unwrap_err().is_parse_error());
        assert!(!solve("x + y = 0").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_differentiate() {
        let (outcome, explanation) = differentiate("x**2").unwrap();
        assert_eq!(outcome.display(), "2*x");
        assert_eq!(
            explanation,
            "Derivative: 2*x. Steps: Power rule for polynomials, chain rule for composites."
        );
        assert_eq!(outcome.latex(), "2 x");
    }

    #[test]
    fn test_integrate() {
        let (outcome, explanation) = integrate("x**2").unwrap();
        assert_eq!(outcome.display(), "x**3/3");
        assert_eq!(explanation, "Integral: x**3/3 + C. Steps: Reverse differentiation rules.");
        assert_eq!(outcome.latex(), r"\frac{x^{3}}{3}");
    }

    #[test]
    fn test_limit() {
        let (outcome, explanation) = limit("sin(x)/x", "0").unwrap();
        assert_eq!(outcome.display(), "1");
        assert_eq!(
            explanation,
            "Limit as x->0: 1. Steps: Substitute if direct, or L'Hôpital if indeterminate."
        );
        assert_eq!(shown(limit("1/x**2", "0")), "oo");
        assert!(limit("1/x", "0").is_err());
        assert!(limit("sin(x)", "nowhere").is_err());
    }

    #[test]
    fn test_simplify() {
        assert_eq!(shown(simplify("x + x")), "2*x");
        assert_eq!(shown(simplify("(x**2 - 1)/(x - 1)")), "x + 1");
    }

    #[test]
    fn test_division_by_zero_has_no_value() {
        for text in ["1/0", "0/0", "x/(x - x)"] {
            let err = simplify(text).unwrap_err();
            assert!(!err.is_parse_error());
            assert!(err.to_string().ends_with("is undefined (division by zero)"), "{}", err);
        }
        assert!(differentiate("x/0").is_err());
        assert_eq!(shown(simplify("0/x")), "0");
    }

    #[test]
    fn test_malformed_input_is_parse_error() {
        for text in ["sin(x", "x +", "(x))", "x $ 2", ""] {
            assert!(differentiate(text).unwrap_err().is_parse_error(), "{}", text);
            assert!(simplify(text).unwrap_err().is_parse_error(), "{}", text);
        }
    }
}
