//! # Symbolic integration
//!
//! Indefinite integrals of elementary functions of one variable. The integrand is
//! simplified first and then handled by the first rule that applies:
//!
//! 1. integrands free of the variable: `∫ c dx = c*x`
//! 2. polynomials, term by term
//! 3. rational functions: polynomial division, then partial fractions over linear factors
//!    and `atan` terms for irreducible quadratics
//! 4. linearity over sums and differences; `c^(ax+b)`, `sin(ax+b)^2`, `cos(ax+b)^2`
//! 5. constant factors are pulled out of products and quotients, the remaining factors are
//!    integrated by substitution `∫ F'(g(x)) g'(x) dx = F(g(x))`, by the closed forms of
//!    `∫ exp(ax) sin(bx) dx`, or by parts (polynomial times `exp`, `sin`, `cos`, `log` or an
//!    inverse trigonometric function)
//!
//! Integrands such as `exp(x**2)` or `sin(x)/x` have no elementary antiderivative and yield a
//! `ComputeError`. Results carry no constant of integration and are not simplified.

use crate::symbolic::errors::ComputeError;
use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::to_fraction;
use log::debug;

/// bound on nested integrations started by integration by parts
const MAX_INTEGRATION_DEPTH: usize = 8;

impl Expr {
    /// SYMBOLIC INTEGRATION

    /// Main integration method - integrates with respect to a variable.
    /// Returns the indefinite integral (without constant of integration).
    ///
    /// # Examples
    /// ```
    /// use RustedMathTutor::symbolic::symbolic_engine::Expr;
    /// let f = Expr::parse_expression("x**2").unwrap();
    /// assert_eq!(f.integrate("x").unwrap().simplify().to_string(), "x**3/3");
    /// ```
    pub fn integrate(&self, var: &str) -> Result<Expr, ComputeError> {
        let integrand = self.simplify();
        let result = integrand.integrate_(var, 0)?;
        debug!("integral of {} d{} = {}", integrand, var, result);
        Ok(result)
    }

    fn integrate_(&self, var: &str, depth: usize) -> Result<Expr, ComputeError> {
        if depth > MAX_INTEGRATION_DEPTH {
            return Err(self.no_antiderivative());
        }
        // ∫ c dx = c*x
        if !self.contains_variable(var) {
            return Ok(self.clone() * Expr::var(var));
        }
        // ∫ p(x) dx term by term
        if let Some(p) = Polynomial::from_expr(self, var) {
            return Ok(p.integrate().to_expr(var));
        }
        // ∫ p(x)/q(x) dx
        if let Some((num, den)) = Polynomial::rational_from_expr(self, var) {
            return integrate_rational(&num, &den, var).ok_or_else(|| self.no_antiderivative());
        }
        match self {
            // ∫ (f + g) dx = ∫ f dx + ∫ g dx
            Expr::Add(lhs, rhs) => {
                let lhs_int = lhs.integrate_(var, depth)?;
                let rhs_int = rhs.integrate_(var, depth)?;
                Ok(lhs_int + rhs_int)
            }
            // ∫ (f - g) dx = ∫ f dx - ∫ g dx
            Expr::Sub(lhs, rhs) => {
                let lhs_int = lhs.integrate_(var, depth)?;
                let rhs_int = rhs.integrate_(var, depth)?;
                Ok(lhs_int - rhs_int)
            }
            Expr::Pow(base, exp) => self.integrate_power(base, exp, var, depth),
            _ => self.integrate_multiplication(var, depth),
        }
    }

    fn integrate_power(
        &self,
        base: &Expr,
        exp: &Expr,
        var: &str,
        depth: usize,
    ) -> Result<Expr, ComputeError> {
        // ∫ c^(ax+b) dx = c^(ax+b)/(a*ln(c))
        if !base.contains_variable(var) {
            if let Some((a, _)) = linear_coefficients(exp, var) {
                return Ok(self.clone() / (Expr::Const(a) * base.clone().ln()));
            }
        }
        // ∫ sin²(u) dx = x/2 - sin(2u)/(4a), ∫ cos²(u) dx = x/2 + sin(2u)/(4a), u = ax + b
        if exp.as_const() == Some(2.0) && matches!(base, Expr::sin(_) | Expr::cos(_)) {
            if let Some(arg) = base.unary_arg() {
                if let Some((a, _)) = linear_coefficients(arg, var) {
                    let half = Expr::var(var) / Expr::Const(2.0);
                    let wave = Expr::sin((Expr::Const(2.0) * arg.clone()).boxed())
                        / Expr::Const(4.0 * a);
                    return Ok(match base {
                        Expr::sin(_) => half - wave,
                        _ => half + wave,
                    });
                }
            }
        }
        if exp.as_const() == Some(-0.5) {
            if let Some(result) = integrate_inverse_sqrt_quadratic(base, var) {
                return Ok(result);
            }
        }
        self.integrate_multiplication(var, depth)
    }

    /// ∫ c*f(x)*g(x)... dx: constant factors go in front of the integral of the others
    fn integrate_multiplication(&self, var: &str, depth: usize) -> Result<Expr, ComputeError> {
        let mut factors = Vec::new();
        split_factors(self, false, &mut factors);
        let (constants, varying): (Vec<Expr>, Vec<Expr>) =
            factors.into_iter().partition(|f| !f.contains_variable(var));
        if constants
            .iter()
            .any(|c| matches!(c, Expr::Const(v) if !v.is_finite()))
        {
            return Err(ComputeError::new(format!("{} is undefined (division by zero)", self)));
        }
        let integral = match varying.as_slice() {
            [single] if !constants.is_empty() => single.integrate_(var, depth + 1)?,
            _ => integrate_factors(&varying, var, depth).ok_or_else(|| self.no_antiderivative())?,
        };
        Ok(constants.into_iter().fold(integral, |acc, c| c * acc))
    }

    fn no_antiderivative(&self) -> ComputeError {
        ComputeError::new(format!("no elementary antiderivative found for {}", self))
    }
}

/// `(a, b)` if `expr` is `a*var + b` with a != 0
fn linear_coefficients(expr: &Expr, var: &str) -> Option<(f64, f64)> {
    let p = Polynomial::from_expr(expr, var)?;
    if p.degree() != 1 {
        return None;
    }
    Some((p.coeffs[1], p.coeffs[0]))
}

/// `sqrt(value)` folded to an exact number or surd where possible
fn sqrt_const(value: f64) -> Expr {
    Expr::Const(value).sqrt().simplify()
}

/// Integers and small-denominator fractions for numerically found roots and weights;
/// `scale` is the size of the largest value of the same computation.
fn snap(value: f64, scale: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= 1e-9 * scale {
        // -0.0 becomes 0.0
        return rounded + 0.0;
    }
    to_fraction(value, 1000).map_or(value, |r| *r.numer() as f64 / *r.denom() as f64)
}

/// flattens products and quotients into factors; divisors become negative powers
fn split_factors(expr: &Expr, inverted: bool, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            split_factors(a, inverted, out);
            split_factors(b, inverted, out);
        }
        Expr::Div(a, b) => {
            split_factors(a, inverted, out);
            split_factors(b, !inverted, out);
        }
        _ if !inverted => out.push(expr.clone()),
        Expr::Const(c) => out.push(Expr::Const(1.0 / c)),
        Expr::Pow(base, exp) => {
            let negated = match exp.as_const() {
                Some(e) => Expr::Const(-e),
                None => -exp.as_ref().clone(),
            };
            out.push(Expr::Pow(base.clone(), Box::new(negated)));
        }
        _ => out.push(expr.clone().pow(Expr::Const(-1.0))),
    }
}

/// integral of the product of factors that all depend on `var`
fn integrate_factors(factors: &[Expr], var: &str, depth: usize) -> Option<Expr> {
    if let Some(result) = integrate_by_substitution(factors, var) {
        return Some(result);
    }
    let mut poly = Polynomial::constant(1.0);
    let mut others = Vec::new();
    for factor in factors {
        match Polynomial::from_expr(factor, var) {
            Some(p) => poly = poly.mul(&p),
            None => others.push(factor.clone()),
        }
    }
    match others.as_slice() {
        [f] if poly.degree() >= 1 => integrate_polynomial_times_function(&poly, f, var, depth),
        [f, g] if poly.degree() == 0 => integrate_exp_times_trig(f, g, var)
            .or_else(|| integrate_exp_times_trig(g, f, var))
            .map(|r| Expr::Const(poly.leading_coefficient()) * r),
        _ => None,
    }
}

/// ∫ F'(g(x)) g'(x) dx = F(g(x)): one factor is read as F'(g), the product of the other
/// factors must be a constant multiple of g'
fn integrate_by_substitution(factors: &[Expr], var: &str) -> Option<Expr> {
    for (i, candidate) in factors.iter().enumerate() {
        let rest = factors
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, f)| f.clone())
            .reduce(|acc, f| acc * f)
            .unwrap_or(Expr::Const(1.0));
        for (inner, outer) in substitution_forms(candidate) {
            let inner_derivative = inner.diff(var).simplify();
            if inner_derivative.is_zero() {
                continue;
            }
            let ratio = (rest.clone() / inner_derivative).simplify();
            if !ratio.contains_variable(var) {
                return Some(ratio * outer);
            }
        }
    }
    None
}

/// pairs (g, F(g)) for which `candidate` is F'(g)
fn substitution_forms(candidate: &Expr) -> Vec<(Expr, Expr)> {
    let mut forms = Vec::new();
    if let Some(inner) = candidate.unary_arg() {
        if let Some(outer) = function_antiderivative(candidate, inner.clone()) {
            forms.push((inner.clone(), outer));
        }
    }
    if let Expr::Pow(base, exp) = candidate {
        if let Some(n) = exp.as_const() {
            let g = base.as_ref().clone();
            let outer = if n == -1.0 {
                g.clone().ln()
            } else {
                g.clone().pow(Expr::Const(n + 1.0)) / Expr::Const(n + 1.0)
            };
            forms.push((g, outer));
        }
    }
    // ∫ g g' dx = g²/2
    forms.push((
        candidate.clone(),
        candidate.clone().pow(Expr::Const(2.0)) / Expr::Const(2.0),
    ));
    forms
}

/// antiderivative F(u) of the function variant of `f`
fn function_antiderivative(f: &Expr, u: Expr) -> Option<Expr> {
    let square = u.clone().pow(Expr::Const(2.0));
    let result = match f {
        Expr::Exp(_) => u.exp(),
        // ∫ ln(u) du = u*ln(u) - u
        Expr::Ln(_) => u.clone() * u.clone().ln() - u,
        Expr::sin(_) => -Expr::cos(u.boxed()),
        Expr::cos(_) => Expr::sin(u.boxed()),
        // ∫ tan(u) du = -ln(cos(u))
        Expr::tg(_) => -Expr::cos(u.boxed()).ln(),
        // ∫ cot(u) du = ln(sin(u))
        Expr::ctg(_) => Expr::sin(u.boxed()).ln(),
        // ∫ asin(u) du = u*asin(u) + sqrt(1 - u²)
        Expr::arcsin(_) => {
            u.clone() * Expr::arcsin(u.boxed()) + (Expr::Const(1.0) - square).sqrt()
        }
        // ∫ acos(u) du = u*acos(u) - sqrt(1 - u²)
        Expr::arccos(_) => {
            u.clone() * Expr::arccos(u.boxed()) - (Expr::Const(1.0) - square).sqrt()
        }
        // ∫ atan(u) du = u*atan(u) - ln(u² + 1)/2
        Expr::arctg(_) => {
            u.clone() * Expr::arctg(u.boxed())
                - (square + Expr::Const(1.0)).ln() / Expr::Const(2.0)
        }
        // ∫ acot(u) du = u*acot(u) + ln(u² + 1)/2
        Expr::arcctg(_) => {
            u.clone() * Expr::arcctg(u.boxed())
                + (square + Expr::Const(1.0)).ln() / Expr::Const(2.0)
        }
        _ => return None,
    };
    Some(result)
}

/// ∫ P(x) f(ax+b) dx by parts
fn integrate_polynomial_times_function(
    poly: &Polynomial,
    f: &Expr,
    var: &str,
    depth: usize,
) -> Option<Expr> {
    let arg = f.unary_arg()?;
    linear_coefficients(arg, var)?;
    match f {
        // tabular integration: ∫ P f = P F₁ - P' F₂ + P'' F₃ - ...
        Expr::Exp(_) | Expr::sin(_) | Expr::cos(_) => {
            let mut result: Option<Expr> = None;
            let mut derivative = poly.clone();
            let mut antiderivative = f.clone();
            let mut negative = false;
            while !derivative.is_zero() {
                antiderivative = antiderivative.integrate_(var, depth + 1).ok()?.simplify();
                let term = derivative.to_expr(var) * antiderivative.clone();
                result = Some(match result {
                    None => term,
                    Some(acc) if negative => acc - term,
                    Some(acc) => acc + term,
                });
                derivative = derivative.derivative();
                negative = !negative;
            }
            result
        }
        // ∫ P f dx = V f - ∫ V f' dx with V = ∫ P dx
        Expr::Ln(_) | Expr::arcsin(_) | Expr::arccos(_) | Expr::arctg(_) | Expr::arcctg(_) => {
            let v = poly.integrate().to_expr(var);
            let remaining = (v.clone() * f.diff(var))
                .simplify()
                .integrate_(var, depth + 1)
                .ok()?;
            Some(v * f.clone() - remaining)
        }
        _ => None,
    }
}

/// ∫ exp(ax+c) sin(bx+d) dx = exp(ax+c) (a sin(bx+d) - b cos(bx+d))/(a² + b²)
/// ∫ exp(ax+c) cos(bx+d) dx = exp(ax+c) (a cos(bx+d) + b sin(bx+d))/(a² + b²)
fn integrate_exp_times_trig(f: &Expr, g: &Expr, var: &str) -> Option<Expr> {
    let Expr::Exp(u) = f else {
        return None;
    };
    let (a, _) = linear_coefficients(u, var)?;
    let v = g.unary_arg()?;
    let (b, _) = linear_coefficients(v, var)?;
    let sin = Expr::sin(v.clone().boxed());
    let cos = Expr::cos(v.clone().boxed());
    let combination = match g {
        Expr::sin(_) => Expr::Const(a) * sin - Expr::Const(b) * cos,
        Expr::cos(_) => Expr::Const(a) * cos + Expr::Const(b) * sin,
        _ => return None,
    };
    Some(f.clone() * combination / Expr::Const(a * a + b * b))
}

/// ∫ dx/sqrt(r² - k²(x - h)²) = asin(k(x - h)/r)/k for a quadratic with negative leading
/// coefficient `-k²` and a positive maximum `r²` at `h`
fn integrate_inverse_sqrt_quadratic(base: &Expr, var: &str) -> Option<Expr> {
    let p = Polynomial::from_expr(base, var)?;
    if p.degree() != 2 {
        return None;
    }
    let (c, b, a) = (p.coeffs[0], p.coeffs[1], p.coeffs[2]);
    let top = c - b * b / (4.0 * a);
    if a >= 0.0 || top <= 0.0 {
        return None;
    }
    let h = -b / (2.0 * a);
    let k = sqrt_const(-a);
    let u = (k.clone() * (Expr::var(var) - Expr::Const(h)) / sqrt_const(top)).simplify();
    Some(Expr::arcsin(u.boxed()) / k)
}

/// ∫ p(x)/q(x) dx: polynomial part plus partial fractions of the proper remainder
fn integrate_rational(num: &Polynomial, den: &Polynomial, var: &str) -> Option<Expr> {
    let (quotient, remainder) = num.div_rem(den)?;
    let polynomial_part = quotient.integrate().to_expr(var);
    if remainder.is_zero() {
        return Some(polynomial_part);
    }
    let lead = den.leading_coefficient();
    let monic = den.monic();
    let rem = remainder.scale(1.0 / lead);
    let fractions = match monic.degree() {
        // ∫ c/(ax + b) dx = (c/a) ln(ax + b)
        1 => Expr::Const(rem.leading_coefficient()) * den.to_expr(var).ln(),
        2 => integrate_over_quadratic(&rem, &monic, var),
        _ => integrate_over_distinct_roots(&rem, &monic, var)?,
    };
    if quotient.is_zero() {
        Some(fractions)
    } else {
        Some(polynomial_part + fractions)
    }
}

/// ∫ (αx + β)/(x² + bx + c) dx
fn integrate_over_quadratic(rem: &Polynomial, den: &Polynomial, var: &str) -> Expr {
    let (c, b) = (den.coeffs[0], den.coeffs[1]);
    let beta = rem.coeffs.first().copied().unwrap_or(0.0);
    let alpha = rem.coeffs.get(1).copied().unwrap_or(0.0);
    let x = Expr::var(var);
    let disc = b * b - 4.0 * c;
    if disc.abs() < 1e-12 * (b * b).max(c.abs()).max(1.0) {
        // double root r: (α(x - r) + αr + β)/(x - r)²
        let r = -b / 2.0;
        let shifted = x - Expr::Const(r);
        let pole = -(Expr::Const(alpha * r + beta) / shifted.clone());
        if alpha == 0.0 {
            return pole;
        }
        return Expr::Const(alpha) * shifted.ln() + pole;
    }
    if disc > 0.0 {
        // A/(x - r₁) + B/(x - r₂) with r₁ - r₂ = sqrt(disc)
        let root = |sign: f64| {
            ((Expr::Const(-b) + Expr::Const(sign) * sqrt_const(disc)) / Expr::Const(2.0)).simplify()
        };
        let (r1, r2) = (root(1.0), root(-1.0));
        let weight1 = ((Expr::Const(alpha) * r1.clone() + Expr::Const(beta)) / sqrt_const(disc))
            .simplify();
        let weight2 = (-(Expr::Const(alpha) * r2.clone() + Expr::Const(beta)) / sqrt_const(disc))
            .simplify();
        return weight1 * (x.clone() - r1).ln() + weight2 * (x - r2).ln();
    }
    // α/2 ln(x² + bx + c) + (β - αb/2) 2/sqrt(-disc) atan((2x + b)/sqrt(-disc))
    let root = sqrt_const(-disc);
    let angle = Expr::arctg(((Expr::Const(2.0) * x + Expr::Const(b)) / root.clone()).boxed());
    let arc = Expr::Const(beta - alpha * b / 2.0) * Expr::Const(2.0) / root * angle;
    if alpha == 0.0 {
        return arc;
    }
    Expr::Const(alpha / 2.0) * den.to_expr(var).ln() + arc
}

/// ∫ r(x)/q(x) dx = Σ r(xᵢ)/q'(xᵢ) ln(x - xᵢ) when monic q has deg q distinct real roots xᵢ
fn integrate_over_distinct_roots(rem: &Polynomial, den: &Polynomial, var: &str) -> Option<Expr> {
    let roots = den.real_roots();
    if roots.len() != den.degree() {
        return None;
    }
    let slope = den.derivative();
    let root_scale = roots.iter().fold(0.0f64, |m, r| m.max(r.abs()));
    let mut weighted = Vec::new();
    for root in roots {
        if slope.vanishes_at(root, 1e-9) {
            return None;
        }
        let weight = if rem.vanishes_at(root, 1e-9) {
            0.0
        } else {
            rem.eval(root) / slope.eval(root)
        };
        weighted.push((snap(root, root_scale), weight));
    }
    let weight_scale = weighted.iter().fold(0.0f64, |m, (_, w)| m.max(w.abs()));
    let mut result: Option<Expr> = None;
    for (root, weight) in weighted {
        let weight = snap(weight, weight_scale);
        if weight == 0.0 {
            continue;
        }
        let term = Expr::Const(weight) * (Expr::var(var) - Expr::Const(root)).ln();
        result = Some(match result {
            None => term,
            Some(acc) => acc + term,
        });
    }
    Some(result.unwrap_or(Expr::Const(0.0)))
}
