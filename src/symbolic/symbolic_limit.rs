//! # Limits
//!
//! Two-sided limits of a function of one variable at a finite point or at `±oo`.
//!
//! The rules are tried from exact to numeric:
//! 1. direct substitution when the function is defined at the point
//! 2. rational functions: cancellation at finite points, degree comparison at infinity
//! 3. at infinity, sums of products of exponentials, powers and logarithms: the fastest
//!    growing term decides, exponentials beat powers and powers beat logarithms
//! 4. limits composed from the limits of the parts, with L'Hôpital's rule for `0/0` and
//!    `oo/oo`, `0*oo` rewritten as a quotient, `oo - oo` brought to a common denominator and
//!    `f^g` rewritten as `exp(g*log(f))`
//! 5. numeric sampling of both one-sided limits, the result recognized as an integer,
//!    fraction, multiple of pi or E when close enough to one
//!
//! A chain of L'Hôpital steps that does not settle within the depth bound is reported as
//! undetermined rather than guessed from samples.
//!
//! A limit whose one-sided limits differ is an error (`1/x` at 0). When the function is
//! undefined on one side of the point (`log(x)` at 0) the other side decides.

use crate::symbolic::errors::{ComputeError, MathError};
use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::symbolic_engine::{Expr, signed_terms};
use crate::symbolic::symbolic_simplify::recognize_constant;
use crate::symbolic::utils::as_integer;
use log::debug;
use std::cmp::Ordering;
use std::fmt;

/// nesting bound for composed limits and repeated L'Hôpital steps
const MAX_LIMIT_DEPTH: usize = 12;
/// relative distances from a finite point at which one-sided limits are sampled
const SAMPLE_DELTAS: [f64; 6] = [1e-2, 1e-3, 1e-4, 1e-5, 1e-6, 1e-7];
/// abscissas standing in for infinity
const LARGE_SAMPLES: [f64; 2] = [1e6, 1e7];
/// tolerance for recognizing a numerically found limit as a closed form
const SNAP_TOLERANCE: f64 = 1e-6;

/// The point a limit is taken at.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitPoint {
    /// finite point, kept exact for substitution and as a float for sampling
    Finite { expr: Expr, value: f64 },
    PosInfinity,
    NegInfinity,
}

impl LimitPoint {
    /// Reads a limit point: `oo`, `inf` or `infinity` with an optional sign, or any
    /// expression without free symbols (`0`, `-1/2`, `pi/2`).
    pub fn parse(text: &str) -> Result<LimitPoint, MathError> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed).trim()),
        };
        if matches!(body.to_lowercase().as_str(), "oo" | "inf" | "infinity") {
            return Ok(if negative {
                LimitPoint::NegInfinity
            } else {
                LimitPoint::PosInfinity
            });
        }
        let expr = Expr::parse_expression(trimmed)?.simplify();
        let value = if expr.free_symbols().is_empty() {
            expr.eval_constant().ok().filter(|v| v.is_finite())
        } else {
            None
        };
        match value {
            Some(value) => Ok(LimitPoint::Finite { expr, value }),
            None => Err(ComputeError::new(format!("limit point '{}' is not a number", trimmed)).into()),
        }
    }

    pub fn is_infinite(&self) -> bool {
        !matches!(self, LimitPoint::Finite { .. })
    }

    fn as_f64(&self) -> f64 {
        match self {
            LimitPoint::Finite { value, .. } => *value,
            LimitPoint::PosInfinity => f64::INFINITY,
            LimitPoint::NegInfinity => f64::NEG_INFINITY,
        }
    }

    pub fn as_expr(&self) -> Expr {
        match self {
            LimitPoint::Finite { expr, .. } => expr.clone(),
            LimitPoint::PosInfinity => Expr::infinity(),
            LimitPoint::NegInfinity => Expr::neg_infinity(),
        }
    }
}

impl fmt::Display for LimitPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_expr())
    }
}

/// limit of a sampled sequence of values
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bound {
    Value(f64),
    PosInfinity,
    NegInfinity,
}

impl Bound {
    fn infinite(sign: f64) -> Bound {
        if sign > 0.0 {
            Bound::PosInfinity
        } else {
            Bound::NegInfinity
        }
    }

    fn to_expr(self) -> Expr {
        match self {
            Bound::Value(v) => recognize_constant(v, SNAP_TOLERANCE),
            Bound::PosInfinity => Expr::infinity(),
            Bound::NegInfinity => Expr::neg_infinity(),
        }
    }
}

/// behaviour of the function on one side of the point
#[derive(Debug, Clone, Copy, PartialEq)]
enum Approach {
    /// not defined (NaN) close to the point
    Undefined,
    /// no limit: oscillation or too slow convergence
    NoLimit,
    Limit(Bound),
}

fn infinity_with_sign(sign: f64) -> Expr {
    if sign > 0.0 {
        Expr::infinity()
    } else {
        Expr::neg_infinity()
    }
}

fn does_not_exist() -> ComputeError {
    ComputeError::new("limit does not exist")
}

fn undetermined() -> ComputeError {
    ComputeError::new("cannot determine the limit")
}

/// Growth of a product `c * exp(a*x) * x^k * log(x)^m` as `x` tends to `±oo`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Growth {
    /// rates of the exponential, power and logarithmic factors, in order of dominance
    rates: [f64; 3],
    /// sign the product settles to
    sign: f64,
}

impl Growth {
    fn constant(sign: f64) -> Growth {
        Growth {
            rates: [0.0; 3],
            sign,
        }
    }

    fn times(self, other: Growth) -> Growth {
        Growth {
            rates: [
                self.rates[0] + other.rates[0],
                self.rates[1] + other.rates[1],
                self.rates[2] + other.rates[2],
            ],
            sign: self.sign * other.sign,
        }
    }

    /// `None` for a negative base under a non-integer power
    fn powf(self, n: f64) -> Option<Growth> {
        let sign = if self.sign > 0.0 {
            1.0
        } else {
            match as_integer(n)? {
                k if k % 2 == 0 => 1.0,
                _ => -1.0,
            }
        };
        Some(Growth {
            rates: self.rates.map(|r| r * n),
            sign,
        })
    }

    /// 1 if the product grows without bound, -1 if it decays to zero, 0 if neither
    fn trend(&self) -> f64 {
        self.rates
            .iter()
            .find(|r| **r != 0.0)
            .map_or(0.0, |r| r.signum())
    }

    fn compare(&self, other: &Growth) -> Ordering {
        self.rates
            .iter()
            .zip(other.rates.iter())
            .map(|(a, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// growth of a product of exponentials, powers, logarithms and polynomials as `var` tends
/// to `direction * oo`; `None` for any other factor
fn growth_of(expr: &Expr, var: &str, direction: f64) -> Option<Growth> {
    if !expr.contains_variable(var) {
        let c = expr.eval_constant().ok().filter(|c| c.is_finite() && *c != 0.0)?;
        return Some(Growth::constant(c.signum()));
    }
    if let Some(p) = Polynomial::from_expr(expr, var) {
        if p.is_zero() {
            return None;
        }
        let d = p.degree();
        let lead = p.leading_coefficient().signum();
        let sign = if direction < 0.0 && d % 2 == 1 { -lead } else { lead };
        return Some(Growth {
            rates: [0.0, d as f64, 0.0],
            sign,
        });
    }
    match expr {
        Expr::Mul(a, b) => Some(growth_of(a, var, direction)?.times(growth_of(b, var, direction)?)),
        Expr::Div(a, b) => {
            let denominator = growth_of(b, var, direction)?.powf(-1.0)?;
            Some(growth_of(a, var, direction)?.times(denominator))
        }
        Expr::Pow(base, exp) => growth_of(base, var, direction)?.powf(exp.as_const()?),
        Expr::Exp(arg) => {
            let p = Polynomial::from_expr(arg, var)?;
            if p.degree() > 1 {
                return None;
            }
            let slope = p.coeffs.get(1).copied().unwrap_or(0.0);
            Some(Growth {
                rates: [slope * direction, 0.0, 0.0],
                sign: 1.0,
            })
        }
        Expr::Ln(arg) if direction > 0.0 => {
            let p = Polynomial::from_expr(arg, var)?;
            (p.degree() >= 1 && p.leading_coefficient() > 0.0).then_some(Growth {
                rates: [0.0, 0.0, 1.0],
                sign: 1.0,
            })
        }
        _ => None,
    }
}

/// finite and not the rounded image of a pole (`tan(pi/2)` evaluates to about 1.6e16)
fn is_finite(value: f64) -> bool {
    value.abs() < 1e15
}

/// numeric value of an already computed limit, `±inf` for `±oo`
fn value_of(limit: &Expr) -> Option<f64> {
    limit.eval_constant().ok().filter(|v| !v.is_nan())
}

/// `n/d` split of a quotient, `e/1` otherwise
fn as_fraction(expr: &Expr) -> (Expr, Expr) {
    match expr {
        Expr::Div(num, den) => (num.as_ref().clone(), den.as_ref().clone()),
        _ => (expr.clone(), Expr::Const(1.0)),
    }
}

/// true if some power with a varying exponent has the form `1^oo`, `0^0` or `oo^0` at `x`
fn has_indeterminate_power(expr: &Expr, var: &str, x: f64) -> bool {
    match expr {
        Expr::Var(_) | Expr::Const(_) => false,
        Expr::Pow(base, exp) => {
            if exp.contains_variable(var) {
                let b = base.eval1D(var, x).unwrap_or(f64::NAN);
                let e = exp.eval1D(var, x).unwrap_or(f64::NAN);
                if (b == 1.0 && e.is_infinite()) || (e == 0.0 && (b == 0.0 || b.is_infinite())) {
                    return true;
                }
            }
            has_indeterminate_power(base, var, x) || has_indeterminate_power(exp, var, x)
        }
        Expr::Add(l, r) | Expr::Sub(l, r) | Expr::Mul(l, r) | Expr::Div(l, r) => {
            has_indeterminate_power(l, var, x) || has_indeterminate_power(r, var, x)
        }
        _ => expr
            .unary_arg()
            .is_some_and(|arg| has_indeterminate_power(arg, var, x)),
    }
}

/// limit of an elementary function whose argument tends to `±oo`
fn function_at_infinity(function: &Expr, positive: bool) -> Option<Expr> {
    match function {
        Expr::Exp(_) if positive => Some(Expr::infinity()),
        Expr::Exp(_) => Some(Expr::Const(0.0)),
        Expr::Ln(_) if positive => Some(Expr::infinity()),
        Expr::arctg(_) => {
            let half_pi = Expr::Mul(Box::new(Expr::Const(0.5)), Box::new(Expr::pi()));
            Some(if positive { half_pi } else { -half_pi }.simplify())
        }
        Expr::arcctg(_) if positive => Some(Expr::Const(0.0)),
        Expr::arcctg(_) => Some(Expr::pi()),
        _ => None,
    }
}

impl Expr {
    /// Two-sided limit of the expression as `var` tends to `point`.
    ///
    /// # Examples
    /// ```
    /// use RustedMathTutor::symbolic::symbolic_engine::Expr;
    /// use RustedMathTutor::symbolic::symbolic_limit::LimitPoint;
    /// let e = Expr::parse_expression("sin(x)/x").unwrap();
    /// let point = LimitPoint::parse("0").unwrap();
    /// assert_eq!(e.limit("x", &point).unwrap().to_string(), "1");
    /// ```
    pub fn limit(&self, var: &str, point: &LimitPoint) -> Result<Expr, ComputeError> {
        let f = self.simplify();
        let others: Vec<String> = f.free_symbols().into_iter().filter(|s| s != var).collect();
        if !others.is_empty() {
            return Err(ComputeError::new(format!(
                "cannot take the limit in {}: unknown symbols {}",
                var,
                others.join(", ")
            )));
        }
        let result = f.limit_(var, point, 0)?;
        let result = if result.is_infinite() {
            result
        } else {
            result.simplify()
        };
        debug!("limit of {} as {} -> {} is {}", f, var, point, result);
        Ok(result)
    }

    fn limit_(&self, var: &str, point: &LimitPoint, depth: usize) -> Result<Expr, ComputeError> {
        if !self.contains_variable(var) {
            return Ok(self.clone());
        }
        if let Some(value) = self.direct_substitution(var, point) {
            return Ok(value);
        }
        if depth >= MAX_LIMIT_DEPTH {
            return Err(undetermined());
        }
        if let Some((p, q)) = Polynomial::rational_from_expr(self, var) {
            return self.rational_limit(&p, &q, var, point);
        }
        if let Some(result) = self.growth_limit(var, point) {
            return Ok(result);
        }
        if let Some(result) = self.composite_limit(var, point, depth)? {
            return Ok(result);
        }
        self.numeric_limit(var, point)
    }

    /// Limit at `±oo` of a sum of exponential, power and logarithmic products decided by its
    /// single fastest growing term. `None` when the terms are of another kind, when two
    /// terms grow alike or when the leading term tends to a non-zero constant.
    fn growth_limit(&self, var: &str, point: &LimitPoint) -> Option<Expr> {
        let direction = match point {
            LimitPoint::PosInfinity => 1.0,
            LimitPoint::NegInfinity => -1.0,
            LimitPoint::Finite { .. } => return None,
        };
        let mut terms = Vec::new();
        signed_terms(self, false, &mut terms);
        let growths = terms
            .iter()
            .map(|(negative, term)| {
                let g = growth_of(term, var, direction)?;
                Some(if *negative { Growth { sign: -g.sign, ..g } } else { g })
            })
            .collect::<Option<Vec<Growth>>>()?;
        let top = growths.iter().copied().max_by(|a, b| a.compare(b))?;
        if growths.iter().filter(|g| g.compare(&top) == Ordering::Equal).count() > 1 {
            return None;
        }
        debug!("dominant growth of {} at {}: {:?}", self, point, top);
        match top.trend() {
            t if t > 0.0 => Some(infinity_with_sign(top.sign)),
            t if t < 0.0 => Some(Expr::Const(0.0)),
            _ => None,
        }
    }

    /// value at the point if the function is defined there
    fn direct_substitution(&self, var: &str, point: &LimitPoint) -> Option<Expr> {
        let x = point.as_f64();
        if has_indeterminate_power(self, var, x) {
            return None;
        }
        let value = self.eval1D(var, x).ok().filter(|v| !v.is_nan())?;
        match point {
            LimitPoint::Finite { expr, .. } => {
                if !is_finite(value) {
                    return None;
                }
                let exact = self.substitute_variable(var, expr).simplify();
                let agrees = exact
                    .eval_constant()
                    .is_ok_and(|e| (e - value).abs() <= 1e-9 * value.abs().max(1.0));
                Some(if agrees {
                    exact
                } else {
                    recognize_constant(value, 1e-12)
                })
            }
            _ => Some(recognize_constant(value, 1e-9)),
        }
    }

    fn rational_limit(
        &self,
        p: &Polynomial,
        q: &Polynomial,
        var: &str,
        point: &LimitPoint,
    ) -> Result<Expr, ComputeError> {
        match point {
            LimitPoint::Finite { expr, value } => {
                if q.eval(*value).abs() > 1e-12 {
                    let reduced = Expr::Div(p.to_expr(var).boxed(), q.to_expr(var).boxed());
                    return Ok(reduced.substitute_variable(var, expr).simplify());
                }
                self.pole_limit(var, point)
            }
            _ => {
                if p.is_zero() {
                    return Ok(Expr::Const(0.0));
                }
                let ratio = p.leading_coefficient() / q.leading_coefficient();
                let (dp, dq) = (p.degree(), q.degree());
                Ok(if dp < dq {
                    Expr::Const(0.0)
                } else if dp == dq {
                    recognize_constant(ratio, 1e-12)
                } else {
                    let odd = (dp - dq) % 2 == 1;
                    let sign = match point {
                        LimitPoint::NegInfinity if odd => -ratio.signum(),
                        _ => ratio.signum(),
                    };
                    infinity_with_sign(sign)
                })
            }
        }
    }

    /// `c/0` with `c != 0`: infinite when both sides agree in sign
    fn pole_limit(&self, var: &str, point: &LimitPoint) -> Result<Expr, ComputeError> {
        let LimitPoint::Finite { value, .. } = point else {
            return self.numeric_limit(var, point);
        };
        let h = 1e-7 * value.abs().max(1.0);
        let below = self.eval1D(var, value - h).unwrap_or(f64::NAN);
        let above = self.eval1D(var, value + h).unwrap_or(f64::NAN);
        match (below.is_nan(), above.is_nan()) {
            (false, false) if below.signum() == above.signum() => Ok(infinity_with_sign(above)),
            (true, false) => Ok(infinity_with_sign(above)),
            (false, true) => Ok(infinity_with_sign(below)),
            _ => Err(does_not_exist()),
        }
    }

    fn sub_limit(&self, var: &str, point: &LimitPoint, depth: usize) -> Option<(Expr, f64)> {
        let limit = self.limit_(var, point, depth + 1).ok()?;
        let value = value_of(&limit)?;
        Some((limit, value))
    }

    /// L'Hôpital's rule applied to `num/den`. A chain of steps cut off by the depth bound
    /// is an error, any other failure leaves the limit to the next rule.
    fn lhopital(
        num: &Expr,
        den: &Expr,
        var: &str,
        point: &LimitPoint,
        depth: usize,
    ) -> Result<Option<Expr>, ComputeError> {
        let ratio = (num.diff(var) / den.diff(var)).simplify();
        debug!("L'Hopital: {}/{} -> {}", num, den, ratio);
        match ratio.limit_(var, point, depth + 1) {
            Ok(limit) => Ok(Some(limit)),
            Err(e) if e == undetermined() => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Limit assembled from the limits of the parts. `Ok(None)` when the parts do not decide
    /// it and sampling has to.
    fn composite_limit(
        &self,
        var: &str,
        point: &LimitPoint,
        depth: usize,
    ) -> Result<Option<Expr>, ComputeError> {
        match self {
            // f^g = exp(g*log(f))
            Expr::Pow(base, exp) if base.contains_variable(var) && exp.contains_variable(var) => {
                let exponent = (exp.as_ref().clone() * base.as_ref().clone().ln()).simplify();
                let Some((limit, value)) = exponent.sub_limit(var, point, depth) else {
                    return Ok(None);
                };
                Ok(Some(if value == f64::INFINITY {
                    Expr::infinity()
                } else if value == f64::NEG_INFINITY {
                    Expr::Const(0.0)
                } else {
                    limit.exp().simplify()
                }))
            }
            Expr::Div(num, den) => {
                let (Some((ln, vn)), Some((ld, vd))) = (
                    num.sub_limit(var, point, depth),
                    den.sub_limit(var, point, depth),
                ) else {
                    return Ok(None);
                };
                if (vn == 0.0 && vd == 0.0) || (vn.is_infinite() && vd.is_infinite()) {
                    return Expr::lhopital(num, den, var, point, depth);
                }
                if vd == 0.0 {
                    if vn.is_infinite() {
                        return Ok(None);
                    }
                    return self.pole_limit(var, point).map(Some);
                }
                if vd.is_infinite() {
                    return Ok(Some(Expr::Const(0.0)));
                }
                if vn.is_infinite() {
                    return Ok(Some(infinity_with_sign(vn.signum() * vd.signum())));
                }
                Ok(Some((ln / ld).simplify()))
            }
            Expr::Mul(a, b) => {
                let (Some((la, va)), Some((lb, vb))) =
                    (a.sub_limit(var, point, depth), b.sub_limit(var, point, depth))
                else {
                    return Ok(None);
                };
                if (va == 0.0 && vb.is_infinite()) || (va.is_infinite() && vb == 0.0) {
                    // 0*oo = 0/(1/oo) = oo/(1/0)
                    let (infinite, zero) = if va.is_infinite() { (a, b) } else { (b, a) };
                    let reciprocal = |e: &Expr| Expr::Pow(Box::new(e.clone()), Expr::Const(-1.0).boxed());
                    return match Expr::lhopital(zero, &reciprocal(infinite), var, point, depth)? {
                        Some(result) => Ok(Some(result)),
                        None => Expr::lhopital(infinite, &reciprocal(zero), var, point, depth),
                    };
                }
                if va.is_infinite() || vb.is_infinite() {
                    return Ok(Some(infinity_with_sign(va.signum() * vb.signum())));
                }
                Ok(Some((la * lb).simplify()))
            }
            Expr::Add(a, b) | Expr::Sub(a, b) => {
                let subtract = matches!(self, Expr::Sub(..));
                let (Some((la, va)), Some((lb, vb))) =
                    (a.sub_limit(var, point, depth), b.sub_limit(var, point, depth))
                else {
                    return Ok(None);
                };
                let vb = if subtract { -vb } else { vb };
                if va.is_infinite() && vb.is_infinite() && va.signum() != vb.signum() {
                    // oo - oo over a common denominator
                    let (na, da) = as_fraction(a);
                    let (nb, db) = as_fraction(b);
                    let (left, right) = (na * db.clone(), nb * da.clone());
                    let num = if subtract { left - right } else { left + right };
                    let combined = (num / (da * db)).simplify();
                    if combined == *self {
                        return Ok(None);
                    }
                    return Ok(combined.limit_(var, point, depth + 1).ok());
                }
                if va.is_infinite() {
                    return Ok(Some(infinity_with_sign(va)));
                }
                if vb.is_infinite() {
                    return Ok(Some(infinity_with_sign(vb)));
                }
                let sum = if subtract { la - lb } else { la + lb };
                Ok(Some(sum.simplify()))
            }
            Expr::Pow(base, exp) if base.contains_variable(var) => {
                let (Some((lb, vb)), Ok(c)) = (base.sub_limit(var, point, depth), exp.eval_constant())
                else {
                    return Ok(None);
                };
                if vb.is_infinite() {
                    if c < 0.0 {
                        return Ok(Some(Expr::Const(0.0)));
                    }
                    if vb > 0.0 {
                        return Ok(Some(Expr::infinity()));
                    }
                    return Ok(match as_integer(c) {
                        Some(n) if n % 2 == 0 => Some(Expr::infinity()),
                        Some(_) => Some(Expr::neg_infinity()),
                        None => None,
                    });
                }
                if vb == 0.0 && c < 0.0 {
                    return self.pole_limit(var, point).map(Some);
                }
                let candidate = lb.pow(exp.as_ref().clone()).simplify();
                Ok(value_of(&candidate).filter(|v| v.is_finite()).map(|_| candidate))
            }
            Expr::Pow(base, exp) => {
                let (Ok(c), Some((le, ve))) = (base.eval_constant(), exp.sub_limit(var, point, depth))
                else {
                    return Ok(None);
                };
                if ve.is_infinite() {
                    let grows = if ve > 0.0 { c > 1.0 } else { c > 0.0 && c < 1.0 };
                    let decays = if ve > 0.0 { c >= 0.0 && c < 1.0 } else { c > 1.0 };
                    return Ok(if grows {
                        Some(Expr::infinity())
                    } else if decays {
                        Some(Expr::Const(0.0))
                    } else {
                        None
                    });
                }
                Ok(Some(base.as_ref().clone().pow(le).simplify()))
            }
            _ => {
                let Some(arg) = self.unary_arg() else {
                    return Ok(None);
                };
                let Some((la, va)) = arg.sub_limit(var, point, depth) else {
                    return Ok(None);
                };
                if va.is_infinite() {
                    return Ok(function_at_infinity(self, va > 0.0));
                }
                let candidate = self.with_unary_arg(la).simplify();
                match value_of(&candidate) {
                    Some(v) if is_finite(v) => Ok(Some(candidate)),
                    Some(_) => self.pole_limit(var, point).map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    /// Both one-sided limits estimated from samples approaching the point.
    fn numeric_limit(&self, var: &str, point: &LimitPoint) -> Result<Expr, ComputeError> {
        let bound = match point {
            LimitPoint::Finite { value, .. } => {
                let below = approach_point(self, var, *value, -1.0);
                let above = approach_point(self, var, *value, 1.0);
                debug!("one-sided limits at {}: {:?}, {:?}", value, below, above);
                match (below, above) {
                    (Approach::Limit(b), Approach::Limit(a)) => {
                        agreeing(b, a).ok_or_else(does_not_exist)?
                    }
                    (Approach::Undefined, Approach::Limit(side))
                    | (Approach::Limit(side), Approach::Undefined) => side,
                    _ => return Err(does_not_exist()),
                }
            }
            // samples far out may overflow to oo/oo: undefined there says nothing
            LimitPoint::PosInfinity => match approach_infinity(self, var, 1.0) {
                Approach::Limit(bound) => bound,
                Approach::Undefined => return Err(undetermined()),
                Approach::NoLimit => return Err(does_not_exist()),
            },
            LimitPoint::NegInfinity => match approach_infinity(self, var, -1.0) {
                Approach::Limit(bound) => bound,
                Approach::Undefined => return Err(undetermined()),
                Approach::NoLimit => return Err(does_not_exist()),
            },
        };
        Ok(bound.to_expr())
    }
}

fn close(a: f64, b: f64) -> bool {
    let diff = (a - b).abs();
    diff < 1e-10 || diff / a.abs().max(b.abs()) < 0.01
}

fn agreeing(below: Bound, above: Bound) -> Option<Bound> {
    match (below, above) {
        (Bound::Value(b), Bound::Value(a)) if close(a, b) => Some(Bound::Value((a + b) / 2.0)),
        (b, a) if b == a => Some(a),
        _ => None,
    }
}

/// samples `f` at `a + direction*delta` for shrinking deltas
fn approach_point(f: &Expr, var: &str, a: f64, direction: f64) -> Approach {
    let scale = a.abs().max(1.0);
    let mut values = Vec::with_capacity(SAMPLE_DELTAS.len());
    for delta in SAMPLE_DELTAS {
        match f.eval1D(var, a + direction * delta * scale) {
            Ok(v) if !v.is_nan() => values.push(v),
            _ => return Approach::Undefined,
        }
    }
    if let Some(v) = values.iter().find(|v| v.is_infinite()) {
        return Approach::Limit(Bound::infinite(*v));
    }
    let n = values.len();
    let (first, last, prev) = (values[0], values[n - 1], values[n - 2]);
    let same_sign = values.iter().all(|v| *v > 0.0) || values.iter().all(|v| *v < 0.0);
    let growing = values.windows(2).all(|w| w[1].abs() > w[0].abs());
    // a converging sequence has geometrically shrinking increments
    let steady = (last - prev).abs() > 0.5 * (prev - values[n - 3]).abs();
    if same_sign && growing && steady && last.abs() > 2.0 * first.abs() {
        return Approach::Limit(Bound::infinite(last));
    }
    if close(last, prev) {
        return Approach::Limit(Bound::Value(last));
    }
    if last.abs() < 1e-5 && last.abs() < prev.abs() {
        return Approach::Limit(Bound::Value(0.0));
    }
    Approach::NoLimit
}

/// samples `f` at large abscissas of the given sign
fn approach_infinity(f: &Expr, var: &str, sign: f64) -> Approach {
    let mut values = [0.0; LARGE_SAMPLES.len()];
    for (slot, x) in values.iter_mut().zip(LARGE_SAMPLES) {
        match f.eval1D(var, sign * x) {
            Ok(v) if !v.is_nan() => *slot = v,
            _ => return Approach::Undefined,
        }
    }
    let [f1, f2] = values;
    if f2.is_infinite() {
        return Approach::Limit(Bound::infinite(f2));
    }
    if f1 > 1e5 && f2 > f1 {
        return Approach::Limit(Bound::PosInfinity);
    }
    if f1 < -1e5 && f2 < f1 {
        return Approach::Limit(Bound::NegInfinity);
    }
    if f2.abs() < 1e-4 && f2.abs() < f1.abs() {
        return Approach::Limit(Bound::Value(0.0));
    }
    if close(f1, f2) {
        return Approach::Limit(Bound::Value(f2));
    }
    Approach::NoLimit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_of(expr: &str, point: &str) -> Result<String, ComputeError> {
        let e = Expr::parse_expression(expr).unwrap();
        let point = LimitPoint::parse(point).unwrap();
        e.limit("x", &point).map(|l| l.to_string())
    }

    #[test]
    fn test_limit_point_parse() {
        assert_eq!(LimitPoint::parse("oo").unwrap(), LimitPoint::PosInfinity);
        assert_eq!(LimitPoint::parse("-inf").unwrap(), LimitPoint::NegInfinity);
        assert_eq!(LimitPoint::parse(" +infinity ").unwrap(), LimitPoint::PosInfinity);
        let half_pi = LimitPoint::parse("pi/2").unwrap();
        assert_eq!(half_pi.to_string(), "pi/2");
        assert!(!half_pi.is_infinite());
        assert!(LimitPoint::parse("y").is_err());
        assert!(LimitPoint::parse("2*").unwrap_err().is_parse_error());
    }

    #[test]
    fn test_direct_substitution() {
        assert_eq!(limit_of("x**2 + 1", "2").unwrap(), "5");
        assert_eq!(limit_of("sin(x)", "pi/2").unwrap(), "1");
        assert_eq!(limit_of("sqrt(x)", "0").unwrap(), "0");
        assert_eq!(limit_of("7", "3").unwrap(), "7");
    }

    #[test]
    fn test_removable_singularities() {
        assert_eq!(limit_of("sin(x)/x", "0").unwrap(), "1");
        assert_eq!(limit_of("(x**2 - 1)/(x - 1)", "1").unwrap(), "2");
        assert_eq!(limit_of("(exp(x) - 1)/x", "0").unwrap(), "1");
        assert_eq!(limit_of("(1 - cos(x))/x**2", "0").unwrap(), "1/2");
    }

    #[test]
    fn test_limits_at_infinity() {
        assert_eq!(limit_of("1/x", "oo").unwrap(), "0");
        assert_eq!(limit_of("x**2", "oo").unwrap(), "oo");
        assert_eq!(limit_of("-x**3", "oo").unwrap(), "-oo");
        assert_eq!(limit_of("(2*x**2 + 1)/(x**2 - 3)", "oo").unwrap(), "2");
        assert_eq!(limit_of("x**3/(x + 1)", "-oo").unwrap(), "oo");
        assert_eq!(limit_of("exp(x)", "-oo").unwrap(), "0");
        assert_eq!(limit_of("atan(x)", "oo").unwrap(), "pi/2");
        assert_eq!(limit_of("x*exp(-x)", "oo").unwrap(), "0");
        assert_eq!(limit_of("sqrt(x**2 + 1) - x", "oo").unwrap(), "0");
    }

    #[test]
    fn test_exponentials_dominate_powers() {
        assert_eq!(limit_of("exp(x)/x**20", "oo").unwrap(), "oo");
        assert_eq!(limit_of("x**1000/exp(x)", "oo").unwrap(), "0");
        assert_eq!(limit_of("x**1000*exp(-x)", "oo").unwrap(), "0");
        assert_eq!(limit_of("exp(x) - x**50", "oo").unwrap(), "oo");
        assert_eq!(limit_of("x**50 - exp(x)", "oo").unwrap(), "-oo");
        assert_eq!(limit_of("x*exp(-x)", "-oo").unwrap(), "-oo");
        assert_eq!(limit_of("x**2*exp(x)", "-oo").unwrap(), "0");
        assert_eq!(limit_of("log(x)**3/x", "oo").unwrap(), "0");
        assert_eq!(limit_of("x/log(x)", "oo").unwrap(), "oo");
        assert_eq!(limit_of("-exp(2*x)/(x**2 + 1)", "oo").unwrap(), "-oo");
    }

    #[test]
    fn test_depth_bound_is_an_error() {
        let f = Expr::parse_expression("sin(x)/x").unwrap();
        let zero = LimitPoint::parse("0").unwrap();
        let err = f.limit_("x", &zero, MAX_LIMIT_DEPTH).unwrap_err();
        assert_eq!(err, undetermined());
        assert_eq!(err.to_string(), "cannot determine the limit");
        assert_eq!(f.limit_("x", &zero, MAX_LIMIT_DEPTH - 3).unwrap().simplify().to_string(), "1");
    }

    #[test]
    fn test_growth_classes() {
        let growth = |s: &str, direction: f64| {
            growth_of(&Expr::parse_expression(s).unwrap(), "x", direction)
        };
        let g = growth("x**3*exp(2*x)/log(x)", 1.0).unwrap();
        assert_eq!(g.rates, [2.0, 3.0, -1.0]);
        assert_eq!(g.trend(), 1.0);
        assert_eq!(growth("-x**3", -1.0).unwrap().sign, 1.0);
        assert!(growth("sin(x)*x", 1.0).is_none());
        assert!(growth("log(x)", -1.0).is_none());
        assert!(growth("exp(x**2)", 1.0).is_none());
    }

    #[test]
    fn test_indeterminate_powers_and_products() {
        assert_eq!(limit_of("(1 + 1/x)**x", "oo").unwrap(), "E");
        assert_eq!(limit_of("x*log(x)", "0").unwrap(), "0");
        assert_eq!(limit_of("x**x", "0").unwrap(), "1");
    }

    #[test]
    fn test_infinite_limits() {
        assert_eq!(limit_of("1/x**2", "0").unwrap(), "oo");
        assert_eq!(limit_of("-1/x**2", "0").unwrap(), "-oo");
        assert_eq!(limit_of("log(x)", "0").unwrap(), "-oo");
    }

    #[test]
    fn test_limits_that_do_not_exist() {
        let err = limit_of("1/x", "0").unwrap_err();
        assert_eq!(err.to_string(), "limit does not exist");
        assert!(limit_of("sin(1/x)", "0").is_err());
        assert!(limit_of("sin(x)", "oo").is_err());
        assert!(limit_of("tan(x)", "pi/2").is_err());
    }

    #[test]
    fn test_limit_rejects_other_symbols() {
        let err = limit_of("x + y", "0").unwrap_err();
        assert_eq!(err.to_string(), "cannot take the limit in x: unknown symbols y");
    }

    #[test]
    fn test_numeric_approach() {
        let f = Expr::parse_expression("1/x").unwrap();
        assert_eq!(approach_point(&f, "x", 0.0, 1.0), Approach::Limit(Bound::PosInfinity));
        assert_eq!(approach_point(&f, "x", 0.0, -1.0), Approach::Limit(Bound::NegInfinity));
        let g = Expr::parse_expression("log(x)").unwrap();
        assert_eq!(approach_point(&g, "x", 0.0, -1.0), Approach::Undefined);
        let h = Expr::parse_expression("sin(1/x)").unwrap();
        assert_eq!(approach_point(&h, "x", 0.0, 1.0), Approach::NoLimit);
        assert_eq!(approach_infinity(&f, "x", 1.0), Approach::Limit(Bound::Value(0.0)));
    }
}
