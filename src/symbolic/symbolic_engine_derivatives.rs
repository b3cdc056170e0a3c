//! # Symbolic Engine Derivatives Module
//!
//! This module extends the symbolic engine with analytical differentiation and
//! numerical evaluation.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - Analytical derivative
//! - `n_th_derivative1D()` - Higher-order derivatives
//!
//! ### Function evaluation
//! - `eval_expression()` - Direct evaluation for given variable values
//! - `eval1D()` - Evaluation of a function of one variable
//! - `eval_on_linspace()` - Sampling over an evenly spaced grid
//!
//! ### Numerical Analysis
//! - `compare_num1D()` - Validate 1D derivatives numerically
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Differentiation Rules**: Implements complete calculus rules including
//!    product rule, quotient rule, chain rule for all supported functions
//!
//! 2. **Named constants**: `pi`, `E` and `oo` evaluate to their numerical values; the
//!    imaginary unit and unknown symbols are reported as errors instead of panicking

use crate::symbolic::errors::ComputeError;
use crate::symbolic::symbolic_engine::{
    E_SYMBOL, Expr, IMAGINARY_SYMBOL, INFINITY_SYMBOL, PI_SYMBOL,
};
use crate::symbolic::utils::linspace;
use std::f64::consts::{E, PI};

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// Implements all standard differentiation rules from calculus:
    /// - Power rule: d/dx(x^n) = n*x^(n-1)
    /// - Product rule: d/dx(f*g) = f'*g + f*g'
    /// - Quotient rule: d/dx(f/g) = (f'*g - f*g')/g^2
    /// - Chain rule: d/dx(f(g(x))) = f'(g(x))*g'(x)
    ///
    /// The result is not simplified.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::Const(2.0)); // x^2
    /// let df_dx = f.diff("x"); // 2*x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            // constant factors give no 0*f terms: 0*log(0) would evaluate to NaN
            Expr::Mul(lhs, rhs) if !lhs.contains_variable(var) => {
                Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))
            }
            Expr::Mul(lhs, rhs) if !rhs.contains_variable(var) => {
                Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())
            }
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
            ),
            Expr::Div(lhs, rhs) if !rhs.contains_variable(var) => {
                Expr::Div(Box::new(lhs.diff(var)), rhs.clone())
            }
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
                )),
                Box::new(Expr::Pow(rhs.clone(), Box::new(Expr::Const(2.0)))),
            ),
            // power rule while the exponent does not depend on var
            Expr::Pow(base, exp) if !exp.contains_variable(var) => Expr::Mul(
                Box::new(Expr::Mul(
                    exp.clone(),
                    Box::new(Expr::Pow(
                        base.clone(),
                        Box::new(Expr::Sub(exp.clone(), Box::new(Expr::Const(1.0)))),
                    )),
                )),
                Box::new(base.diff(var)),
            ),
            // d(a^b) = a^b * (b' * ln(a) + b * a' / a)
            Expr::Pow(base, exp) => Expr::Mul(
                Box::new(self.clone()),
                Box::new(Expr::Add(
                    Box::new(Expr::Mul(Box::new(exp.diff(var)), Box::new(Expr::Ln(base.clone())))),
                    Box::new(Expr::Div(
                        Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var)))),
                        base.clone(),
                    )),
                )),
            ),
            Expr::Exp(expr) => {
                Expr::Mul(Box::new(Expr::Exp(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::Ln(expr) => Expr::Div(Box::new(expr.diff(var)), expr.clone()),
            Expr::sin(expr) => {
                Expr::Mul(Box::new(Expr::cos(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::cos(expr) => Expr::Mul(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::sin(expr.clone())),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::tg(expr) => Expr::Mul(
                Box::new(Expr::Div(
                    Box::new(Expr::Const(1.0)),
                    Box::new(Expr::Pow(
                        Box::new(Expr::cos(expr.clone())),
                        Box::new(Expr::Const(2.0)),
                    )),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::ctg(expr) => Expr::Mul(
                Box::new(Expr::Div(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(Expr::Pow(
                        Box::new(Expr::sin(expr.clone())),
                        Box::new(Expr::Const(2.0)),
                    )),
                )),
                Box::new(expr.diff(var)),
            ),
            Expr::arcsin(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Pow(
                    Box::new(Expr::Sub(
                        Box::new(Expr::Const(1.0)),
                        Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    )),
                    Box::new(Expr::Const(0.5)),
                )),
            ),
            Expr::arccos(expr) => Expr::Div(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(expr.diff(var)),
                )),
                Box::new(Expr::Pow(
                    Box::new(Expr::Sub(
                        Box::new(Expr::Const(1.0)),
                        Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    )),
                    Box::new(Expr::Const(0.5)),
                )),
            ),
            Expr::arctg(expr) => Expr::Div(
                Box::new(expr.diff(var)),
                Box::new(Expr::Add(
                    Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    Box::new(Expr::Const(1.0)),
                )),
            ),
            Expr::arcctg(expr) => Expr::Div(
                Box::new(Expr::Mul(
                    Box::new(Expr::Const(-1.0)),
                    Box::new(expr.diff(var)),
                )),
                Box::new(Expr::Add(
                    Box::new(Expr::Pow(expr.clone(), Box::new(Expr::Const(2.0)))),
                    Box::new(Expr::Const(1.0)),
                )),
            ),
        }
    } // end of diff

    /// Computes the nth derivative of a single-variable expression, simplifying after
    /// every step.
    pub fn n_th_derivative1D(&self, var_name: &str, n: usize) -> Expr {
        let mut expr = self.clone();
        for _ in 0..n {
            expr = expr.diff(var_name).simplify();
        }
        expr
    }

    /// EVALUATION

    /// Evaluates the expression for the given variable values.
    ///
    /// `vars` and `values` are parallel slices. Named constants evaluate to their
    /// numerical values, `oo` to `f64::INFINITY`. A symbol without a value, or the
    /// imaginary unit, gives a `ComputeError`. Domain errors (log of a negative
    /// number, 0/0...) are not errors: they produce NaN or infinity like f64 does.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> Result<f64, ComputeError> {
        let value = match self {
            Expr::Var(name) => match vars.iter().position(|&v| v == name) {
                Some(index) => values[index],
                None => match name.as_str() {
                    PI_SYMBOL => PI,
                    E_SYMBOL => E,
                    INFINITY_SYMBOL => f64::INFINITY,
                    IMAGINARY_SYMBOL => {
                        return Err(ComputeError::new("expression has a complex value"));
                    }
                    _ => {
                        return Err(ComputeError::new(format!(
                            "symbol '{}' has no value",
                            name
                        )));
                    }
                },
            },
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => {
                lhs.eval_expression(vars, values)? + rhs.eval_expression(vars, values)?
            }
            Expr::Sub(lhs, rhs) => {
                lhs.eval_expression(vars, values)? - rhs.eval_expression(vars, values)?
            }
            Expr::Mul(lhs, rhs) => {
                lhs.eval_expression(vars, values)? * rhs.eval_expression(vars, values)?
            }
            Expr::Div(lhs, rhs) => {
                lhs.eval_expression(vars, values)? / rhs.eval_expression(vars, values)?
            }
            Expr::Pow(base, exp) => {
                let base_fn = base.eval_expression(vars, values)?;
                let exp_fn = exp.eval_expression(vars, values)?;
                base_fn.powf(exp_fn)
            }
            Expr::Exp(expr) => expr.eval_expression(vars, values)?.exp(),
            Expr::Ln(expr) => expr.eval_expression(vars, values)?.ln(),
            Expr::sin(expr) => expr.eval_expression(vars, values)?.sin(),
            Expr::cos(expr) => expr.eval_expression(vars, values)?.cos(),
            Expr::tg(expr) => expr.eval_expression(vars, values)?.tan(),
            Expr::ctg(expr) => 1.0 / expr.eval_expression(vars, values)?.tan(),
            Expr::arcsin(expr) => expr.eval_expression(vars, values)?.asin(),
            Expr::arccos(expr) => expr.eval_expression(vars, values)?.acos(),
            Expr::arctg(expr) => expr.eval_expression(vars, values)?.atan(),
            Expr::arcctg(expr) => PI / 2.0 - expr.eval_expression(vars, values)?.atan(),
        };
        Ok(value)
    } // end of eval_expression

    /// value of a function of one variable at `x`
    pub fn eval1D(&self, var: &str, x: f64) -> Result<f64, ComputeError> {
        self.eval_expression(&[var], &[x])
    }

    /// value of an expression without free symbols
    pub fn eval_constant(&self) -> Result<f64, ComputeError> {
        self.eval_expression(&[], &[])
    }

    /// Evaluates a function of one variable over a linearly spaced domain.
    /// Returns the grid and the values; points where the value is undefined hold NaN.
    pub fn eval_on_linspace(
        &self,
        var: &str,
        start: f64,
        end: f64,
        num_values: usize,
    ) -> Result<(Vec<f64>, Vec<f64>), ComputeError> {
        let x = linspace(start, end, num_values);
        let y = x
            .iter()
            .map(|xi| self.eval1D(var, *xi))
            .collect::<Result<Vec<f64>, ComputeError>>()?;
        Ok((x, y))
    }

    /// Validates analytical derivative against a central finite difference over a grid.
    ///
    /// # Returns
    /// Tuple of (largest deviation found, is_within_tolerance); grid points where either
    /// derivative is not finite are skipped
    pub fn compare_num1D(
        &self,
        var: &str,
        start: f64,
        end: f64,
        num_values: usize,
        max_norm: f64,
    ) -> Result<(f64, bool), ComputeError> {
        let analytical = self.diff(var);
        let h = 1e-6;
        let mut worst: f64 = 0.0;
        for xi in linspace(start, end, num_values) {
            let numerical = (self.eval1D(var, xi + h)? - self.eval1D(var, xi - h)?) / (2.0 * h);
            let exact = analytical.eval1D(var, xi)?;
            if numerical.is_finite() && exact.is_finite() {
                worst = worst.max((numerical - exact).abs() / exact.abs().max(1.0));
            }
        }
        Ok((worst, worst <= max_norm))
    }
}
