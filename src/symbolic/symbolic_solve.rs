//! # Equation solving
//!
//! Roots of `f(x) = 0` for a single unknown.
//!
//! - Rational functions are reduced to their numerator polynomial. Linear and quadratic
//!   polynomials are solved exactly (surds as `sqrt(n)`, complex roots with `I`); higher
//!   degrees are deflated by their rational roots first, what is left is solved exactly when
//!   it is quadratic or binomial (`x^n = c`) and numerically otherwise.
//! - Any other equation is searched numerically on an interval: sign changes on a grid are
//!   bracketed by bisection and polished with Newton-Raphson using the symbolic derivative,
//!   touching roots are found from local minima of `|f|`. Numeric roots are snapped to
//!   integers, rational multiples of `pi` and small fractions.
//!
//! Real roots come first in ascending order, then complex roots.

use crate::symbolic::errors::ComputeError;
use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_simplify::recognize_constant;
use crate::symbolic::utils::{clean_float, linspace, to_fraction};
use log::debug;
use std::cmp::Ordering;

/// tolerance for recognizing a numeric root as a closed form
const SNAP_TOLERANCE: f64 = 1e-9;

/// Settings of the numeric root search used for equations that are not polynomial.
#[derive(Debug, Clone)]
pub struct RootFindingConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    /// interval searched for roots
    pub x_min: f64,
    pub x_max: f64,
    /// number of grid points scanned for sign changes
    pub grid_points: usize,
}

impl Default for RootFindingConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
            x_min: -10.0,
            x_max: 10.0,
            grid_points: 2000,
        }
    }
}

/// a root with its numeric value used for ordering and deduplication
#[derive(Debug, Clone)]
struct Root {
    expr: Expr,
    re: f64,
    im: f64,
}

impl Root {
    fn real(expr: Expr, re: f64) -> Root {
        Root { expr, re, im: 0.0 }
    }

    fn order(a: &Root, b: &Root) -> Ordering {
        (a.im != 0.0)
            .cmp(&(b.im != 0.0))
            .then(a.re.total_cmp(&b.re))
            .then(a.im.total_cmp(&b.im))
    }

    fn same_as(&self, other: &Root) -> bool {
        let scale = self.re.abs().max(self.im.abs()).max(1.0);
        (self.re - other.re).abs() < 1e-9 * scale && (self.im - other.im).abs() < 1e-9 * scale
    }
}

impl Expr {
    /// Solves `self = 0` for `var`.
    ///
    /// # Examples
    /// ```
    /// use RustedMathTutor::symbolic::symbolic_engine::Expr;
    /// let f = Expr::parse_expression("x**2 - 4").unwrap();
    /// let roots: Vec<String> = f.solve("x").unwrap().iter().map(|r| r.to_string()).collect();
    /// assert_eq!(roots, vec!["-2", "2"]);
    /// ```
    pub fn solve(&self, var: &str) -> Result<Vec<Expr>, ComputeError> {
        self.solve_with_config(var, &RootFindingConfig::default())
    }

    pub fn solve_with_config(
        &self,
        var: &str,
        config: &RootFindingConfig,
    ) -> Result<Vec<Expr>, ComputeError> {
        let f = self.simplify();
        let others: Vec<String> = f.free_symbols().into_iter().filter(|s| s != var).collect();
        if !others.is_empty() {
            return Err(ComputeError::new(format!(
                "cannot solve for {}: unknown symbols {}",
                var,
                others.join(", ")
            )));
        }
        let mut roots = match Polynomial::rational_from_expr(&f, var) {
            Some((num, _)) => polynomial_roots(&num),
            None => numeric_roots(&f, var, config),
        };
        roots.sort_by(Root::order);
        roots.dedup_by(|a, b| a.same_as(b));
        debug!("roots of {} = 0: {:?}", f, roots);
        Ok(roots.into_iter().map(|r| r.expr).collect())
    }
}

fn polynomial_roots(p: &Polynomial) -> Vec<Root> {
    let mut roots = Vec::new();
    if p.degree() == 0 {
        return roots;
    }
    let mut rest = p.clone();
    if rest.degree() > 2 {
        for r in p.rational_roots().unwrap_or_default() {
            let value = *r.numer() as f64 / *r.denom() as f64;
            roots.push(Root::real(Expr::Const(value), value));
            let factor = Polynomial::new(vec![-value, 1.0]);
            while rest.degree() >= 1 && rest.vanishes_at(value, 1e-9) {
                match rest.div_rem(&factor) {
                    Some((quotient, _)) => rest = quotient,
                    None => break,
                }
            }
        }
    }
    match rest.degree() {
        0 => {}
        1 => {
            let value = clean_float(-rest.coeffs[0] / rest.coeffs[1]);
            roots.push(Root::real(Expr::Const(value), value));
        }
        2 => roots.extend(quadratic_roots(&rest)),
        _ => match binomial_roots(&rest) {
            Some(exact) => roots.extend(exact),
            None => roots.extend(
                rest.real_roots()
                    .into_iter()
                    .map(|value| Root::real(recognize_constant(value, SNAP_TOLERANCE), value)),
            ),
        },
    }
    roots
}

/// roots of a x² + b x + c by the quadratic formula, written as re ± offset
fn quadratic_roots(q: &Polynomial) -> Vec<Root> {
    let (c, b, a) = (q.coeffs[0], q.coeffs[1], q.coeffs[2]);
    let re = clean_float(-b / (2.0 * a));
    // (b² - 4ac)/(4a²) = offset²
    let discriminant = b * b - 4.0 * a * c;
    let squared = discriminant / (4.0 * a * a);
    if discriminant.abs() <= 1e-12 * (b * b).max((4.0 * a * c).abs()) {
        return vec![Root::real(Expr::Const(re), re)];
    }
    let magnitude = squared.abs().sqrt();
    let offset = sqrt_rational(squared.abs());
    if squared > 0.0 {
        return vec![
            Root::real(shifted(re, &offset, -1.0), re - magnitude),
            Root::real(shifted(re, &offset, 1.0), re + magnitude),
        ];
    }
    let imaginary = if offset.is_one() {
        Expr::imaginary_unit()
    } else {
        offset * Expr::imaginary_unit()
    };
    vec![
        Root {
            expr: shifted(re, &imaginary, -1.0),
            re,
            im: -magnitude,
        },
        Root {
            expr: shifted(re, &imaginary, 1.0),
            re,
            im: magnitude,
        },
    ]
}

/// `re + sign*offset` printed as `1 - sqrt(2)`, `-sqrt(3)*I/2`, `3`
fn shifted(re: f64, offset: &Expr, sign: f64) -> Expr {
    if let Some(o) = offset.as_const() {
        return Expr::Const(clean_float(re + sign * o));
    }
    match (re == 0.0, sign < 0.0) {
        (true, true) => -offset.clone(),
        (true, false) => offset.clone(),
        (false, true) => Expr::Sub(Box::new(Expr::Const(re)), offset.clone().boxed()),
        (false, false) => Expr::Add(Box::new(Expr::Const(re)), offset.clone().boxed()),
    }
}

/// sqrt(p/q) = sqrt(p*q)/q in simplest surd form
fn sqrt_rational(value: f64) -> Expr {
    if let Some(r) = to_fraction(value, 10_000) {
        if let Some(product) = r.numer().checked_mul(*r.denom()) {
            let surd = Expr::Const(product as f64).sqrt() / Expr::Const(*r.denom() as f64);
            return surd.simplify();
        }
    }
    Expr::Const(value.sqrt())
}

/// real roots of a xⁿ + c = 0
fn binomial_roots(p: &Polynomial) -> Option<Vec<Root>> {
    let n = p.degree();
    if p.coeffs[1..n].iter().any(|c| *c != 0.0) {
        return None;
    }
    let value = -p.coeffs[0] / p.coeffs[n];
    if value == 0.0 {
        return Some(vec![Root::real(Expr::Const(0.0), 0.0)]);
    }
    let magnitude = value.abs().powf(1.0 / n as f64);
    let principal =
        Expr::Const(value.abs()).pow(Expr::Const(1.0 / n as f64)).simplify();
    let roots = if n % 2 == 1 {
        let expr = if value < 0.0 { -principal } else { principal };
        vec![Root::real(expr.simplify(), value.signum() * magnitude)]
    } else if value > 0.0 {
        vec![
            Root::real((-principal.clone()).simplify(), -magnitude),
            Root::real(principal, magnitude),
        ]
    } else {
        Vec::new()
    };
    Some(roots)
}

fn numeric_roots(f: &Expr, var: &str, config: &RootFindingConfig) -> Vec<Root> {
    let derivative = f.diff(var).simplify();
    let value = |x: f64| f.eval1D(var, x).unwrap_or(f64::NAN);
    let slope = |x: f64| derivative.eval1D(var, x).unwrap_or(f64::NAN);
    let grid = linspace(config.x_min, config.x_max, config.grid_points);
    let values: Vec<f64> = grid.iter().map(|x| value(*x)).collect();

    let mut found: Vec<f64> = Vec::new();
    for i in 0..grid.len() {
        let fx = values[i];
        if !fx.is_finite() {
            continue;
        }
        if fx == 0.0 {
            found.push(grid[i]);
            continue;
        }
        if let Some(&fy) = values.get(i + 1) {
            if fy.is_finite() && fx * fy < 0.0 {
                if let Some(r) = bisection(&value, grid[i], grid[i + 1], config) {
                    let r = newton_raphson(&value, &slope, r, config)
                        .filter(|p| (p - r).abs() < 1e-6)
                        .unwrap_or(r);
                    // a sign change across a pole leaves |f| large
                    if value(r).abs() < fx.abs().min(fy.abs()) {
                        found.push(r);
                    }
                }
                continue;
            }
        }
        // touching root: |f| has a small local minimum at a grid point
        if i > 0 && i + 1 < grid.len() {
            let (left, right) = (values[i - 1].abs(), values[i + 1].abs());
            if fx.abs() < 1e-3 && fx.abs() <= left && fx.abs() <= right {
                if let Some(r) = newton_raphson(&value, &slope, grid[i], config) {
                    if value(r).abs() < 1e-10 && (r - grid[i]).abs() < 0.1 {
                        found.push(r);
                    }
                }
            }
        }
    }
    found
        .into_iter()
        .map(|r| Root::real(recognize_constant(r, SNAP_TOLERANCE), r))
        .collect()
}

/// root of `function` in [a, b] where it changes sign
fn bisection<F>(function: &F, mut a: f64, mut b: f64, config: &RootFindingConfig) -> Option<f64>
where
    F: Fn(f64) -> f64,
{
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }
    let mut fa = function(a);
    let fb = function(b);
    if fa * fb > 0.0 {
        return None;
    }
    if fa == 0.0 {
        return Some(a);
    }
    if fb == 0.0 {
        return Some(b);
    }
    for _ in 0..config.max_iterations {
        let c = (a + b) / 2.0;
        let fc = function(c);
        if fc == 0.0 || (b - a) / 2.0 < config.tolerance * c.abs().max(1.0) {
            return Some(c);
        }
        if fa * fc < 0.0 {
            b = c;
        } else {
            a = c;
            fa = fc;
        }
    }
    Some((a + b) / 2.0)
}

/// Newton-Raphson iteration from `x`; `None` if it stalls or diverges
fn newton_raphson<F, D>(function: &F, derivative: &D, mut x: f64, config: &RootFindingConfig) -> Option<f64>
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    for _ in 0..config.max_iterations {
        let fx = function(x);
        if fx == 0.0 {
            return Some(x);
        }
        let dfx = derivative(x);
        if !dfx.is_finite() || dfx.abs() < 1e-300 {
            return None;
        }
        let step = fx / dfx;
        if !step.is_finite() {
            return None;
        }
        x -= step;
        if step.abs() < config.tolerance * x.abs().max(1.0) {
            return Some(x);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn roots(s: &str) -> Vec<String> {
        Expr::parse_expression(s)
            .unwrap()
            .solve("x")
            .unwrap()
            .iter()
            .map(|r| r.to_string())
            .collect()
    }

    #[test]
    fn test_solve_linear_and_quadratic() {
        assert_eq!(roots("x**2 - 4"), vec!["-2", "2"]);
        assert_eq!(roots("2*x + 1"), vec!["-1/2"]);
        assert_eq!(roots("x**2 - 3*x + 2"), vec!["1", "2"]);
        assert_eq!(roots("x**2 - 2"), vec!["-sqrt(2)", "sqrt(2)"]);
        assert_eq!(roots("x**2 - x - 1"), vec!["1/2 - sqrt(5)/2", "1/2 + sqrt(5)/2"]);
        assert_eq!(roots("(x - 1)**2"), vec!["1"]);
    }

    #[test]
    fn test_solve_complex_roots() {
        assert_eq!(roots("x**2 + 1"), vec!["-I", "I"]);
        assert_eq!(roots("x**2 + 2*x + 5"), vec!["-1 - 2*I", "-1 + 2*I"]);
        assert_eq!(roots("x**2 + x + 1"), vec!["-1/2 - sqrt(3)*I/2", "-1/2 + sqrt(3)*I/2"]);
    }

    #[test]
    fn test_solve_higher_degree() {
        assert_eq!(roots("x**3 - 6*x**2 + 11*x - 6"), vec!["1", "2", "3"]);
        assert_eq!(roots("x**3 - x"), vec!["-1", "0", "1"]);
        assert_eq!(roots("x**3 - 8"), vec!["2", "-1 - sqrt(3)*I", "-1 + sqrt(3)*I"]);
        assert_eq!(roots("x**4 - 16"), vec!["-2", "2", "-2*I", "2*I"]);
        assert_eq!(roots("x**3 - 2").len(), 1);
    }

    #[test]
    fn test_solve_rational_and_constant() {
        assert_eq!(roots("(x**2 - 1)/(x - 1)"), vec!["-1"]);
        assert!(roots("5").is_empty());
        assert!(roots("1/x").is_empty());
    }

    #[test]
    fn test_solve_transcendental() {
        assert_eq!(roots("exp(x) - 1"), vec!["0"]);
        let sin_roots = roots("sin(x)");
        assert!(sin_roots.contains(&"0".to_string()));
        assert!(sin_roots.contains(&"pi".to_string()));
        assert!(sin_roots.contains(&"-pi".to_string()));
        assert_eq!(sin_roots.len(), 7);
        assert_eq!(roots("cos(x)**2").len(), 6);
        assert!(roots("tan(x)").iter().all(|r| !r.contains("pi/2")));
        assert!(roots("exp(x)").is_empty());
    }

    #[test]
    fn test_solve_with_extreme_coefficients() {
        assert_eq!(roots("x - 1e13"), vec!["10000000000000"]);
        assert_eq!(roots("x - 1e-13"), vec!["0.0000000000001"]);
        assert_eq!(roots("x**2 - 1e14"), vec!["-10000000", "10000000"]);
        let tiny: Vec<f64> = Expr::parse_expression("x**2 - 1e-14")
            .unwrap()
            .solve("x")
            .unwrap()
            .iter()
            .map(|r| r.eval_constant().unwrap())
            .collect();
        assert_eq!(tiny.len(), 2);
        assert_relative_eq!(tiny[0], -1e-7, max_relative = 1e-12);
        assert_relative_eq!(tiny[1], 1e-7, max_relative = 1e-12);
    }

    #[test]
    fn test_solve_rejects_other_symbols() {
        let e = Expr::parse_expression("x - y").unwrap();
        let err = e.solve("x").unwrap_err();
        assert_eq!(err.to_string(), "cannot solve for x: unknown symbols y");
    }

    #[test]
    fn test_root_finders() {
        let config = RootFindingConfig::default();
        let f = |x: f64| x * x - 2.0;
        let root = bisection(&f, 0.0, 2.0, &config).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-10);
        assert!(bisection(&f, 2.0, 3.0, &config).is_none());
        let root = newton_raphson(&f, &|x: f64| 2.0 * x, 1.0, &config).unwrap();
        assert_relative_eq!(root, 2f64.sqrt(), epsilon = 1e-12);
    }
}
