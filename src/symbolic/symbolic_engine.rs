//! # Symbolic Engine Module
//!
//! This module provides the symbolic expression type the tutor works with. Every other
//! part of the engine (parsing, differentiation, simplification, integration, solving,
//! limits, LaTeX output) is implemented as further `impl Expr` blocks in sibling modules.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! The core symbolic expression type supporting:
//! - **Variables**: `Var(String)` - symbolic variables like "x"
//! - **Constants**: `Const(f64)` - numerical constants
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, etc. - mathematical functions
//!
//! Named mathematical constants are reserved variable names: `pi`, `E` (Euler's number),
//! `I` (imaginary unit) and `oo` (infinity). They are never treated as free symbols.
//!
//! ### Printing
//! `Display` renders expressions in the conventional computer-algebra text form:
//! `x**3/3`, `2*x + 1`, `sqrt(2)`, `-pi/2`, `log(x)`, `tan(x)`. Constants that are
//! small-denominator rationals are printed as fractions.
//!
//! ## Interesting Code Features
//!
//! 1. **Recursive Expression Tree**: Uses Box<Expr> for nested expressions, enabling
//!    arbitrarily complex mathematical structures
//!
//! 2. **Operator Overloading**: Implements std::ops traits (Add, Sub, Mul, Div, Neg) for
//!    natural mathematical syntax: `x + y * z`
//!
//! 3. **Non-standard Function Names**: Uses mathematical notation (tg, ctg) instead
//!    of programming conventions (tan, cot) for trigonometric functions internally

#![allow(non_camel_case_types)]

use crate::symbolic::utils::{as_integer, printable_fraction};
use std::collections::BTreeSet;
use std::fmt;

/// name of the circle constant
pub const PI_SYMBOL: &str = "pi";
/// name of Euler's number
pub const E_SYMBOL: &str = "E";
/// name of the imaginary unit
pub const IMAGINARY_SYMBOL: &str = "I";
/// name of positive infinity
pub const INFINITY_SYMBOL: &str = "oo";

/// largest denominator printed as a fraction
pub(crate) const MAX_PRINTED_DENOMINATOR: i64 = 1000;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// Each variant represents a different type of mathematical construct, from simple variables
/// and constants to complex nested operations. The enum uses Box<Expr> for recursive structures,
/// allowing arbitrarily deep expression trees.
///
/// # Examples
/// ```rust, ignore
/// use symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::Const(2.0)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x") or a named constant ("pi", "E", "I", "oo")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function: tan(x) - uses mathematical notation 'tg'
    tg(Box<Expr>),
    /// Cotangent function: cot(x) - uses mathematical notation 'ctg'
    ctg(Box<Expr>),
    /// Arcsine function: arcsin(x)
    arcsin(Box<Expr>),
    /// Arccosine function: arccos(x)
    arccos(Box<Expr>),
    /// Arctangent function: arctan(x) - uses mathematical notation 'arctg'
    arctg(Box<Expr>),
    /// Arccotangent function: arccot(x) - uses mathematical notation 'arcctg'
    arcctg(Box<Expr>),
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::Const(-1.0)), Box::new(self))
    }
}

/// true for the reserved names of mathematical constants
pub fn is_named_constant(name: &str) -> bool {
    matches!(name, PI_SYMBOL | E_SYMBOL | IMAGINARY_SYMBOL | INFINITY_SYMBOL)
}

impl Expr {
    /// BASIC FEATURES

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn pi() -> Expr {
        Expr::Var(PI_SYMBOL.to_string())
    }

    pub fn euler() -> Expr {
        Expr::Var(E_SYMBOL.to_string())
    }

    pub fn imaginary_unit() -> Expr {
        Expr::Var(IMAGINARY_SYMBOL.to_string())
    }

    pub fn infinity() -> Expr {
        Expr::Var(INFINITY_SYMBOL.to_string())
    }

    pub fn neg_infinity() -> Expr {
        -Expr::infinity()
    }

    /// Substitutes a variable with a constant value throughout the expression.
    ///
    /// # Arguments
    /// * `var` - Name of the variable to substitute
    /// * `value` - Numerical value to substitute for the variable
    ///
    /// # Returns
    /// New expression with the variable substituted
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::Const(value))
    }

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Sub(lhs, rhs) => Expr::Sub(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Mul(lhs, rhs) => Expr::Mul(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(lhs.substitute_variable(var, expr)),
                Box::new(rhs.substitute_variable(var, expr)),
            ),
            Expr::Pow(base, exp) => Expr::Pow(
                Box::new(base.substitute_variable(var, expr)),
                Box::new(exp.substitute_variable(var, expr)),
            ),
            _ => match self.unary_arg() {
                Some(arg) => self.with_unary_arg(arg.substitute_variable(var, expr)),
                None => self.clone(),
            },
        }
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::Pow(left, right) => {
                left.contains_variable(var_name) || right.contains_variable(var_name)
            }
            _ => self
                .unary_arg()
                .is_some_and(|arg| arg.contains_variable(var_name)),
        }
    }

    /// names of all variables that are not reserved constants
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Var(name) => {
                if !is_named_constant(name) {
                    out.insert(name.clone());
                }
            }
            Expr::Const(_) => {}
            Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) | Expr::Pow(l, r) => {
                l.collect_symbols(out);
                r.collect_symbols(out);
            }
            _ => {
                if let Some(arg) = self.unary_arg() {
                    arg.collect_symbols(out);
                }
            }
        }
    }

    /// argument of a function variant (`exp`, `ln`, trigonometric...)
    pub(crate) fn unary_arg(&self) -> Option<&Expr> {
        match self {
            Expr::Exp(a)
            | Expr::Ln(a)
            | Expr::sin(a)
            | Expr::cos(a)
            | Expr::tg(a)
            | Expr::ctg(a)
            | Expr::arcsin(a)
            | Expr::arccos(a)
            | Expr::arctg(a)
            | Expr::arcctg(a) => Some(a.as_ref()),
            _ => None,
        }
    }

    /// same function variant applied to a new argument
    pub(crate) fn with_unary_arg(&self, arg: Expr) -> Expr {
        let arg = Box::new(arg);
        match self {
            Expr::Exp(_) => Expr::Exp(arg),
            Expr::Ln(_) => Expr::Ln(arg),
            Expr::sin(_) => Expr::sin(arg),
            Expr::cos(_) => Expr::cos(arg),
            Expr::tg(_) => Expr::tg(arg),
            Expr::ctg(_) => Expr::ctg(arg),
            Expr::arcsin(_) => Expr::arcsin(arg),
            Expr::arccos(_) => Expr::arccos(arg),
            Expr::arctg(_) => Expr::arctg(arg),
            Expr::arcctg(_) => Expr::arcctg(arg),
            _ => self.clone(),
        }
    }

    /// printed name of a function variant
    pub(crate) fn function_name(&self) -> Option<&'static str> {
        let name = match self {
            Expr::Exp(_) => "exp",
            Expr::Ln(_) => "log",
            Expr::sin(_) => "sin",
            Expr::cos(_) => "cos",
            Expr::tg(_) => "tan",
            Expr::ctg(_) => "cot",
            Expr::arcsin(_) => "asin",
            Expr::arccos(_) => "acos",
            Expr::arctg(_) => "atan",
            Expr::arcctg(_) => "acot",
            _ => return None,
        };
        Some(name)
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates exponential function e^(self).
    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    /// Creates natural logarithm ln(self).
    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn sqrt(self) -> Expr {
        Expr::Pow(self.boxed(), Box::new(Expr::Const(0.5)))
    }

    /// Checks if expression is exactly zero (constant 0.0).
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    /// true for `oo` and `-oo`
    pub fn is_infinite(&self) -> bool {
        match self {
            Expr::Var(name) => name == INFINITY_SYMBOL,
            Expr::Mul(l, r) => matches!(l.as_ref(), Expr::Const(c) if *c < 0.0) && r.is_infinite(),
            _ => false,
        }
    }

    /// If the expression reads with a leading minus sign, returns its absolute part:
    /// `-3` -> `3`, `-2*x` -> `2*x`, `-x/2` -> `x/2`.
    pub(crate) fn split_negative(&self) -> Option<Expr> {
        match self {
            Expr::Const(c) if *c < 0.0 => Some(Expr::Const(-c)),
            Expr::Mul(lhs, rhs) => match lhs.as_ref() {
                Expr::Const(c) if *c == -1.0 => Some(rhs.as_ref().clone()),
                Expr::Const(c) if *c < 0.0 => Some(Expr::Mul(Box::new(Expr::Const(-c)), rhs.clone())),
                _ => lhs
                    .split_negative()
                    .map(|pos| Expr::Mul(Box::new(pos), rhs.clone())),
            },
            Expr::Div(num, den) => num
                .split_negative()
                .map(|pos| Expr::Div(Box::new(pos), den.clone())),
            _ => None,
        }
    }

    /// binding strength used to decide where parentheses are needed
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => 1,
            Expr::Const(c) if *c < 0.0 => 1,
            Expr::Mul(_, _) if self.split_negative().is_some() => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Const(c) if as_integer(*c).is_none() => 2,
            Expr::Pow(_, exp) if is_sqrt_exponent(exp) => 5,
            Expr::Pow(_, _) => 3,
            _ => 5,
        }
    }
}

pub(crate) fn is_sqrt_exponent(exp: &Expr) -> bool {
    matches!(exp, Expr::Const(e) if *e == 0.5)
}

/// text of a number: integers without fraction part, small rationals as p/q
pub(crate) fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "oo".to_string() } else { "-oo".to_string() };
    }
    if let Some(n) = as_integer(value) {
        return n.to_string();
    }
    if let Some(r) = printable_fraction(value, MAX_PRINTED_DENOMINATOR) {
        return format!("{}/{}", r.numer(), r.denom());
    }
    format!("{}", value)
}

/// flattens a product into its factors
pub(crate) fn product_factors(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            product_factors(a, out);
            product_factors(b, out);
        }
        _ => out.push(expr.clone()),
    }
}

/// flattens a sum into signed terms: (is_negative, absolute term)
pub(crate) fn signed_terms(expr: &Expr, negate: bool, out: &mut Vec<(bool, Expr)>) {
    match expr {
        Expr::Add(a, b) => {
            signed_terms(a, negate, out);
            signed_terms(b, negate, out);
        }
        Expr::Sub(a, b) => {
            signed_terms(a, negate, out);
            signed_terms(b, !negate, out);
        }
        _ => match expr.split_negative() {
            Some(pos) => out.push((!negate, pos)),
            None => out.push((negate, expr.clone())),
        },
    }
}

fn wrap(f: &mut fmt::Formatter, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

impl Expr {
    fn fmt_sum(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut terms = Vec::new();
        signed_terms(self, false, &mut terms);
        for (i, (negative, term)) in terms.iter().enumerate() {
            match (i, negative) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            wrap(f, term, term.precedence() < 2)?;
        }
        Ok(())
    }

    fn fmt_product(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(pos) = self.split_negative() {
            write!(f, "-")?;
            return wrap(f, &pos, pos.precedence() < 2);
        }
        let mut factors = Vec::new();
        product_factors(self, &mut factors);
        let mut coeff = 1.0;
        let mut others = Vec::new();
        for factor in factors {
            match factor {
                Expr::Const(c) => coeff *= c,
                other => others.push(other),
            }
        }
        if others.is_empty() {
            return write!(f, "{}", format_number(coeff));
        }
        if coeff < 0.0 {
            write!(f, "-")?;
            coeff = -coeff;
        }
        let rest = others
            .iter()
            .map(|factor| {
                if factor.precedence() < 2 {
                    format!("({})", factor)
                } else {
                    format!("{}", factor)
                }
            })
            .collect::<Vec<_>>()
            .join("*");
        if coeff == 1.0 {
            return write!(f, "{}", rest);
        }
        if as_integer(coeff).is_none() {
            if let Some(r) = printable_fraction(coeff, MAX_PRINTED_DENOMINATOR) {
                // 2*x**3/3 rather than 2/3*x**3
                let numer = *r.numer();
                if numer == 1 {
                    return write!(f, "{}/{}", rest, r.denom());
                }
                return write!(f, "{}*{}/{}", numer, rest, r.denom());
            }
        }
        write!(f, "{}*{}", format_number(coeff), rest)
    }
}

/// Display implementation for pretty printing symbolic expressions.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", format_number(*val)),
            Expr::Add(_, _) | Expr::Sub(_, _) => self.fmt_sum(f),
            Expr::Mul(_, _) => self.fmt_product(f),
            Expr::Div(num, den) => {
                if let Some(pos) = self.split_negative() {
                    write!(f, "-")?;
                    return write!(f, "{}", pos);
                }
                wrap(f, num, num.precedence() < 2)?;
                write!(f, "/")?;
                wrap(f, den, den.precedence() <= 2)
            }
            Expr::Pow(base, exp) => match exp.as_ref() {
                Expr::Const(e) if *e == 0.5 => write!(f, "sqrt({})", base),
                Expr::Const(e) if *e == -0.5 => write!(f, "1/sqrt({})", base),
                _ => {
                    let base_parens = match base.as_ref() {
                        Expr::Const(c) => *c < 0.0 || as_integer(*c).is_none(),
                        other => other.precedence() <= 3,
                    };
                    wrap(f, base, base_parens)?;
                    write!(f, "**")?;
                    let exp_atom = match exp.as_ref() {
                        Expr::Const(e) => *e >= 0.0 && as_integer(*e).is_some(),
                        other => other.precedence() > 3,
                    };
                    wrap(f, exp, !exp_atom)
                }
            },
            Expr::Exp(arg) if arg.is_one() => write!(f, "{}", E_SYMBOL),
            _ => match (self.function_name(), self.unary_arg()) {
                (Some(name), Some(arg)) => write!(f, "{}({})", name, arg),
                _ => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_display_polynomial() {
        let e = x().pow(Expr::Const(2.0)) - Expr::Const(4.0);
        assert_eq!(e.to_string(), "x**2 - 4");
        let e = Expr::Const(2.0) * x() + Expr::Const(-1.0) * x().pow(Expr::Const(3.0));
        assert_eq!(e.to_string(), "2*x - x**3");
        let e = Expr::Const(-3.0) * x().pow(Expr::Const(2.0)) + Expr::Const(1.0);
        assert_eq!(e.to_string(), "-3*x**2 + 1");
    }

    #[test]
    fn test_display_rational_coefficients() {
        let e = Expr::Const(1.0 / 3.0) * x().pow(Expr::Const(3.0));
        assert_eq!(e.to_string(), "x**3/3");
        let e = Expr::Const(2.0 / 3.0) * x().pow(Expr::Const(3.0));
        assert_eq!(e.to_string(), "2*x**3/3");
        let e = Expr::Const(-0.5) * x();
        assert_eq!(e.to_string(), "-x/2");
        assert_eq!(Expr::Const(0.25).to_string(), "1/4");
        assert_eq!(Expr::Const(2.0).to_string(), "2");
    }

    #[test]
    fn test_display_functions_and_constants() {
        let e = Expr::sin(x().boxed()) / x();
        assert_eq!(e.to_string(), "sin(x)/x");
        assert_eq!(Expr::Ln(x().boxed()).to_string(), "log(x)");
        assert_eq!(Expr::tg(x().boxed()).to_string(), "tan(x)");
        assert_eq!(Expr::Const(2.0).sqrt().to_string(), "sqrt(2)");
        assert_eq!(Expr::neg_infinity().to_string(), "-oo");
        assert_eq!((Expr::Const(0.5) * Expr::pi()).to_string(), "pi/2");
        assert_eq!(Expr::Exp(Box::new(Expr::Const(1.0))).to_string(), "E");
    }

    #[test]
    fn test_display_parentheses() {
        let e = (x() + Expr::Const(1.0)).pow(Expr::Const(2.0));
        assert_eq!(e.to_string(), "(x + 1)**2");
        let e = (x().pow(Expr::Const(2.0)) - Expr::Const(1.0)) / (x() - Expr::Const(1.0));
        assert_eq!(e.to_string(), "(x**2 - 1)/(x - 1)");
        let e = Expr::Const(1.0) / (Expr::Const(2.0) * x());
        assert_eq!(e.to_string(), "1/(2*x)");
        let e = x() - (x() + Expr::Const(1.0));
        assert_eq!(e.to_string(), "x - x - 1");
        let e = x().pow(Expr::Const(-2.0));
        assert_eq!(e.to_string(), "x**(-2)");
    }

    #[test]
    fn test_symbols_and_substitution() {
        let e = Expr::pi() * x() + Expr::var("y");
        let symbols: Vec<String> = e.free_symbols().into_iter().collect();
        assert_eq!(symbols, vec!["x".to_string(), "y".to_string()]);
        let s = e.set_variable("x", 2.0);
        assert!(!s.contains_variable("x"));
        assert!(s.contains_variable("y"));
        assert!(Expr::neg_infinity().is_infinite());
        assert!(!Expr::Const(-1.0).is_infinite());
    }
}
