//! # Univariate polynomials with floating point coefficients
//!
//! Dense coefficient representation (`coeffs[k]` is the coefficient of `var^k`) used by the
//! simplifier (expansion, cancellation of common factors in quotients), the integrator
//! (term-wise integration) and the equation solver (exact roots for low degrees, rational
//! roots, numeric real roots).
//!
//! Conversion from `Expr` expands sums, products and non-negative integer powers; anything
//! else (functions, symbolic exponents, other symbols) makes `from_expr` return `None`.

use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{clean_float, divisors, to_fraction};
use num::integer::lcm;
use num::rational::Ratio;

/// a sum this small relative to the magnitude of its summands is rounding residue of a
/// cancellation and becomes an exact zero
const CANCELLATION_TOLERANCE: f64 = 1e-13;
/// looser residue bound for the remainders of Euclid's algorithm
const GCD_TOLERANCE: f64 = 1e-9;
/// highest power expanded by `from_expr`
const MAX_EXPANDED_POWER: usize = 32;

#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    /// ascending order, no trailing zeros; the zero polynomial has no coefficients
    pub coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn new(coeffs: Vec<f64>) -> Polynomial {
        let mut p = Polynomial { coeffs };
        p.trim();
        p
    }

    pub fn zero() -> Polynomial {
        Polynomial { coeffs: Vec::new() }
    }

    pub fn constant(c: f64) -> Polynomial {
        Polynomial::new(vec![c])
    }

    /// `c * var^degree`
    pub fn monomial(degree: usize, c: f64) -> Polynomial {
        let mut coeffs = vec![0.0; degree + 1];
        coeffs[degree] = c;
        Polynomial::new(coeffs)
    }

    /// drops trailing exact zeros; small coefficients are kept whatever their size
    fn trim(&mut self) {
        while self.coeffs.last() == Some(&0.0) {
            self.coeffs.pop();
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// degree; 0 for constants and for the zero polynomial
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn leading_coefficient(&self) -> f64 {
        self.coeffs.last().copied().unwrap_or(0.0)
    }

    /// Horner evaluation
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// `p(x)` is zero up to `tolerance` times the largest term `|c_k x^k|`
    pub fn vanishes_at(&self, x: f64, tolerance: f64) -> bool {
        let terms = self
            .coeffs
            .iter()
            .enumerate()
            .fold(0.0f64, |m, (k, c)| m.max((c * x.powi(k as i32)).abs()));
        self.eval(x).abs() <= tolerance * terms
    }

    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, c)| k as f64 * c)
                .collect(),
        )
    }

    /// antiderivative with zero constant term
    pub fn integrate(&self) -> Polynomial {
        let mut coeffs = vec![0.0];
        coeffs.extend(
            self.coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| c / (k as f64 + 1.0)),
        );
        Polynomial::new(coeffs)
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        Polynomial::new(
            (0..n)
                .map(|k| {
                    let a = self.coeffs.get(k).copied().unwrap_or(0.0);
                    let b = other.coeffs.get(k).copied().unwrap_or(0.0);
                    cancel_residue(a + b, a.abs() + b.abs(), CANCELLATION_TOLERANCE)
                })
                .collect(),
        )
    }

    pub fn sub(&self, other: &Polynomial) -> Polynomial {
        self.add(&other.scale(-1.0))
    }

    pub fn scale(&self, factor: f64) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|c| c * factor).collect())
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        let n = self.coeffs.len() + other.coeffs.len() - 1;
        let mut coeffs = vec![0.0; n];
        let mut magnitude = vec![0.0; n];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
                magnitude[i + j] += (a * b).abs();
            }
        }
        Polynomial::new(
            coeffs
                .into_iter()
                .zip(magnitude)
                .map(|(c, m)| cancel_residue(c, m, CANCELLATION_TOLERANCE))
                .collect(),
        )
    }

    pub fn powi(&self, n: usize) -> Polynomial {
        (0..n).fold(Polynomial::constant(1.0), |acc, _| acc.mul(self))
    }

    /// Long division: returns (quotient, remainder). `None` for the zero divisor.
    pub fn div_rem(&self, divisor: &Polynomial) -> Option<(Polynomial, Polynomial)> {
        self.div_rem_within(divisor, CANCELLATION_TOLERANCE)
    }

    /// Long division where every remainder coefficient remembers the magnitude of what was
    /// subtracted from it, so that only the residue of those subtractions is zeroed.
    fn div_rem_within(
        &self,
        divisor: &Polynomial,
        tolerance: f64,
    ) -> Option<(Polynomial, Polynomial)> {
        if divisor.is_zero() {
            return None;
        }
        let d = divisor.degree();
        let lead = divisor.leading_coefficient();
        let mut rem = self.coeffs.clone();
        if rem.len() <= d {
            return Some((Polynomial::zero(), self.clone()));
        }
        let mut magnitude: Vec<f64> = rem.iter().map(|c| c.abs()).collect();
        let mut quotient = vec![0.0; rem.len() - d];
        for k in (0..quotient.len()).rev() {
            let top = cancel_residue(rem[k + d], magnitude[k + d], tolerance);
            let q = top / lead;
            quotient[k] = q;
            for (j, c) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= q * c;
                magnitude[k + j] += (q * c).abs();
            }
        }
        rem.truncate(d);
        let rem = rem
            .into_iter()
            .zip(magnitude)
            .map(|(c, m)| cancel_residue(c, m, tolerance))
            .collect();
        Some((Polynomial::new(quotient), Polynomial::new(rem)))
    }

    /// same polynomial scaled to leading coefficient 1
    pub fn monic(&self) -> Polynomial {
        match self.leading_coefficient() {
            lead if lead != 0.0 => self.scale(1.0 / lead),
            _ => self.clone(),
        }
    }

    /// Monic greatest common divisor. Euclid's algorithm; a remainder coefficient counts as
    /// zero when it is residue of the subtractions that produced it.
    pub fn gcd(&self, other: &Polynomial) -> Polynomial {
        let mut a = self.monic();
        let mut b = other.monic();
        while !b.is_zero() {
            let Some((_, r)) = a.div_rem_within(&b, GCD_TOLERANCE) else {
                break;
            };
            a = b;
            b = r.monic();
        }
        a.monic()
    }

    /// Expands `expr` into a polynomial in `var`; `None` if it is not one.
    pub fn from_expr(expr: &Expr, var: &str) -> Option<Polynomial> {
        match expr {
            Expr::Const(c) => Some(Polynomial::constant(*c)),
            Expr::Var(name) if name == var => Some(Polynomial::monomial(1, 1.0)),
            Expr::Var(_) => None,
            Expr::Add(a, b) => {
                Some(Polynomial::from_expr(a, var)?.add(&Polynomial::from_expr(b, var)?))
            }
            Expr::Sub(a, b) => {
                Some(Polynomial::from_expr(a, var)?.sub(&Polynomial::from_expr(b, var)?))
            }
            Expr::Mul(a, b) => {
                Some(Polynomial::from_expr(a, var)?.mul(&Polynomial::from_expr(b, var)?))
            }
            Expr::Div(a, b) => {
                let den = Polynomial::from_expr(b, var)?;
                if den.is_zero() || den.degree() > 0 {
                    return None;
                }
                Some(Polynomial::from_expr(a, var)?.scale(1.0 / den.coeffs[0]))
            }
            Expr::Pow(base, exp) => {
                let n = exp.as_const()?;
                if n < 0.0 || n.fract() != 0.0 || n as usize > MAX_EXPANDED_POWER {
                    return None;
                }
                Some(Polynomial::from_expr(base, var)?.powi(n as usize))
            }
            _ => None,
        }
    }

    /// Writes `expr` as a quotient of two polynomials in `var` reduced by their gcd;
    /// `None` if it is not a rational function.
    pub fn rational_from_expr(expr: &Expr, var: &str) -> Option<(Polynomial, Polynomial)> {
        let (num, den) = rational_parts(expr, var)?;
        if den.is_zero() {
            return None;
        }
        let g = num.gcd(&den);
        if g.degree() == 0 {
            return Some((num, den));
        }
        let (num, _) = num.div_rem(&g)?;
        let (den, _) = den.div_rem(&g)?;
        Some((num, den))
    }

    /// Builds the expression in descending powers: `3*x**2 - 2*x + 1`.
    pub fn to_expr(&self, var: &str) -> Expr {
        let mut result: Option<Expr> = None;
        for (k, c) in self.coeffs.iter().enumerate().rev() {
            let c = clean_float(*c);
            if c == 0.0 {
                continue;
            }
            result = Some(match result {
                None => term_expr(c, k, var),
                Some(acc) if c < 0.0 => Expr::Sub(acc.boxed(), term_expr(-c, k, var).boxed()),
                Some(acc) => Expr::Add(acc.boxed(), term_expr(c, k, var).boxed()),
            });
        }
        result.unwrap_or(Expr::Const(0.0))
    }

    /// Exact rational coefficients when every coefficient is a small-denominator rational.
    pub fn rational_coefficients(&self) -> Option<Vec<Ratio<i64>>> {
        self.coeffs.iter().map(|c| to_fraction(*c, 10_000)).collect()
    }

    /// Rational roots by the rational root theorem; each root listed once.
    /// `None` when the coefficients are not rational.
    pub fn rational_roots(&self) -> Option<Vec<Ratio<i64>>> {
        let rational = self.rational_coefficients()?;
        let common = rational.iter().fold(1i64, |acc, r| lcm(acc, *r.denom()));
        let ints: Vec<i64> = rational
            .iter()
            .map(|r| r.numer().checked_mul(common / r.denom()))
            .collect::<Option<Vec<i64>>>()?;
        let mut roots = Vec::new();
        // zero roots first, then strip the x^k factor
        let shift = ints.iter().take_while(|c| **c == 0).count();
        if shift > 0 && shift < ints.len() {
            roots.push(Ratio::from_integer(0));
        }
        let ints = &ints[shift..];
        let (Some(&a0), Some(&an)) = (ints.first(), ints.last()) else {
            return Some(roots);
        };
        if ints.len() < 2 || a0.unsigned_abs() > 1_000_000 || an.unsigned_abs() > 1_000_000 {
            return Some(roots);
        }
        let reduced = Polynomial::new(ints.iter().map(|c| *c as f64).collect());
        for p in divisors(a0) {
            for q in divisors(an) {
                for candidate in [Ratio::new(p, q), Ratio::new(-p, q)] {
                    if roots.contains(&candidate) {
                        continue;
                    }
                    let x = *candidate.numer() as f64 / *candidate.denom() as f64;
                    if reduced.vanishes_at(x, 1e-9) {
                        roots.push(candidate);
                    }
                }
            }
        }
        Some(roots)
    }

    /// Real roots found numerically: the real roots of the derivative split the real line
    /// into monotonic pieces, each holding at most one root. Roots of even multiplicity are
    /// picked up at the critical points.
    pub fn real_roots(&self) -> Vec<f64> {
        if self.is_zero() || self.degree() == 0 {
            return Vec::new();
        }
        if self.degree() == 1 {
            return vec![-self.coeffs[0] / self.coeffs[1]];
        }
        let monic = self.monic();
        // Cauchy bound
        let bound = 1.0
            + monic.coeffs[..monic.degree()]
                .iter()
                .fold(0.0f64, |m, c| m.max(c.abs()));
        let mut points = vec![-bound];
        points.extend(monic.derivative().real_roots());
        points.push(bound);
        points.sort_by(|a, b| a.total_cmp(b));

        let mut roots: Vec<f64> = Vec::new();
        for window in points.windows(2) {
            let (a, b) = (window[0], window[1]);
            let (fa, fb) = (monic.eval(a), monic.eval(b));
            if monic.vanishes_at(a, 1e-10) {
                push_unique(&mut roots, a);
            }
            if fa * fb < 0.0 {
                push_unique(&mut roots, bisect(&monic, a, b));
            }
        }
        if let Some(&last) = points.last() {
            if monic.vanishes_at(last, 1e-10) {
                push_unique(&mut roots, last);
            }
        }
        roots.sort_by(|a, b| a.total_cmp(b));
        roots
    }
}

fn rational_parts(expr: &Expr, var: &str) -> Option<(Polynomial, Polynomial)> {
    let one = || Polynomial::constant(1.0);
    match expr {
        Expr::Const(_) | Expr::Var(_) => Some((Polynomial::from_expr(expr, var)?, one())),
        Expr::Add(a, b) | Expr::Sub(a, b) => {
            let (pa, qa) = rational_parts(a, var)?;
            let (pb, qb) = rational_parts(b, var)?;
            let left = pa.mul(&qb);
            let right = pb.mul(&qa);
            let num = match expr {
                Expr::Add(..) => left.add(&right),
                _ => left.sub(&right),
            };
            Some((num, qa.mul(&qb)))
        }
        Expr::Mul(a, b) => {
            let (pa, qa) = rational_parts(a, var)?;
            let (pb, qb) = rational_parts(b, var)?;
            Some((pa.mul(&pb), qa.mul(&qb)))
        }
        Expr::Div(a, b) => {
            let (pa, qa) = rational_parts(a, var)?;
            let (pb, qb) = rational_parts(b, var)?;
            Some((pa.mul(&qb), qa.mul(&pb)))
        }
        Expr::Pow(base, exp) => {
            let n = exp.as_const()?;
            if n.fract() != 0.0 || n.abs() as usize > MAX_EXPANDED_POWER {
                return None;
            }
            let (p, q) = rational_parts(base, var)?;
            let k = n.abs() as usize;
            if n >= 0.0 {
                Some((p.powi(k), q.powi(k)))
            } else {
                Some((q.powi(k), p.powi(k)))
            }
        }
        _ => None,
    }
}

/// `sum` set to exactly zero when it is within `tolerance` of cancelling `magnitude`
fn cancel_residue(sum: f64, magnitude: f64, tolerance: f64) -> f64 {
    if sum.abs() <= tolerance * magnitude {
        0.0
    } else {
        sum
    }
}

fn push_unique(roots: &mut Vec<f64>, r: f64) {
    if !roots.iter().any(|x| (x - r).abs() <= 1e-7 * r.abs().max(x.abs())) {
        roots.push(r);
    }
}

/// root of `p` inside [a, b] where p changes sign
fn bisect(p: &Polynomial, mut a: f64, mut b: f64) -> f64 {
    let mut fa = p.eval(a);
    for _ in 0..200 {
        let c = 0.5 * (a + b);
        let fc = p.eval(c);
        if fc == 0.0 || (b - a).abs() < 1e-15 * c.abs().max(1.0) {
            return c;
        }
        if fa * fc < 0.0 {
            b = c;
        } else {
            a = c;
            fa = fc;
        }
    }
    0.5 * (a + b)
}

/// `c * var^k` for c > 0, without unit factors
fn term_expr(c: f64, k: usize, var: &str) -> Expr {
    let power = match k {
        0 => return Expr::Const(c),
        1 => Expr::var(var),
        _ => Expr::var(var).pow(Expr::Const(k as f64)),
    };
    if c == 1.0 {
        power
    } else if c == -1.0 {
        -power
    } else {
        Expr::Mul(Box::new(Expr::Const(c)), Box::new(power))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn poly(s: &str) -> Polynomial {
        Polynomial::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_from_expr_expands() {
        assert_eq!(poly("(x + 1)**2").coeffs, vec![1.0, 2.0, 1.0]);
        assert_eq!(poly("(x - 1)*(x + 1)").coeffs, vec![-1.0, 0.0, 1.0]);
        assert_eq!(poly("x**2/2 - x/2").coeffs, vec![0.0, -0.5, 0.5]);
        assert!(poly("x - x").is_zero());
        let not_poly = Expr::parse_expression("sin(x) + x").unwrap();
        assert!(Polynomial::from_expr(&not_poly, "x").is_none());
        let not_poly = Expr::parse_expression("1/x").unwrap();
        assert!(Polynomial::from_expr(&not_poly, "x").is_none());
    }

    #[test]
    fn test_to_expr_descending() {
        assert_eq!(poly("1 - 2*x + 3*x**2").to_expr("x").to_string(), "3*x**2 - 2*x + 1");
        assert_eq!(poly("-x**3 + x").to_expr("x").to_string(), "-x**3 + x");
        assert_eq!(poly("x**3/3").to_expr("x").to_string(), "x**3/3");
        assert_eq!(Polynomial::zero().to_expr("x"), Expr::Const(0.0));
    }

    #[test]
    fn test_division_and_gcd() {
        let (q, r) = poly("x**2 - 1").div_rem(&poly("x - 1")).unwrap();
        assert_eq!(q.coeffs, vec![1.0, 1.0]);
        assert!(r.is_zero());
        let g = poly("x**2 - 1").gcd(&poly("x**2 - 2*x + 1"));
        assert_eq!(g.coeffs, vec![-1.0, 1.0]);
        let g = poly("x**2 + 1").gcd(&poly("x - 3"));
        assert_eq!(g.degree(), 0);
    }

    #[test]
    fn test_rational_from_expr() {
        let e = Expr::parse_expression("1/x + 1/(x + 1)").unwrap();
        let (num, den) = Polynomial::rational_from_expr(&e, "x").unwrap();
        assert_eq!(num.monic().coeffs, vec![0.5, 1.0]);
        assert_eq!(den.monic().coeffs, vec![0.0, 1.0, 1.0]);
        let e = Expr::parse_expression("(x**2 - 1)/(x - 1)").unwrap();
        let (num, den) = Polynomial::rational_from_expr(&e, "x").unwrap();
        assert_eq!(num.degree(), 1);
        assert_eq!(den.degree(), 0);
        let e = Expr::parse_expression("sqrt(x)/x").unwrap();
        assert!(Polynomial::rational_from_expr(&e, "x").is_none());
    }

    #[test]
    fn test_calculus() {
        let p = poly("x**3 + 2*x");
        assert_eq!(p.derivative().coeffs, vec![2.0, 0.0, 3.0]);
        let i = poly("x**2").integrate();
        assert_relative_eq!(i.coeffs[3], 1.0 / 3.0);
        assert_relative_eq!(p.eval(2.0), 12.0);
    }

    #[test]
    fn test_rational_roots() {
        let roots = poly("2*x**3 - 3*x**2 - 2*x").rational_roots().unwrap();
        assert!(roots.contains(&Ratio::new(0, 1)));
        assert!(roots.contains(&Ratio::new(2, 1)));
        assert!(roots.contains(&Ratio::new(-1, 2)));
        assert_eq!(roots.len(), 3);
        assert!(poly("x**2 - 2").rational_roots().unwrap().is_empty());
    }

    #[test]
    fn test_real_roots() {
        let roots = poly("x**3 - 2").real_roots();
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], 2f64.powf(1.0 / 3.0), epsilon = 1e-10);
        let roots = poly("(x - 1)**2*(x + 3)").real_roots();
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0], -3.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 1.0, epsilon = 1e-6);
        assert!(poly("x**4 + 1").real_roots().is_empty());
    }

    #[test]
    fn test_coefficients_far_apart_in_size_are_kept() {
        assert_eq!(poly("x - 1e13").coeffs, vec![-1e13, 1.0]);
        assert_eq!(poly("1e-13*x + 1").coeffs, vec![1.0, 1e-13]);
        assert_eq!(poly("x**2 - 1e-14").coeffs, vec![-1e-14, 0.0, 1.0]);
        let (q, r) = poly("x**2 - 1e14").div_rem(&poly("x - 1e7")).unwrap();
        assert_eq!(q.coeffs, vec![1e7, 1.0]);
        assert!(r.is_zero());
        assert_eq!(poly("1e-15*x**2").derivative().coeffs, vec![0.0, 2e-15]);
    }

    #[test]
    fn test_rounding_residue_cancels() {
        // 0.1 + 0.2 - 0.3 is 5.55e-17 in floating point
        assert!(poly("0.1*x + 0.2*x - 0.3*x").is_zero());
        assert_eq!(poly("(x + 0.1)*(x - 0.1) + 0.01").coeffs, vec![0.0, 0.0, 1.0]);
        let g = poly("x**2 - 0.01").gcd(&poly("x - 0.1"));
        assert_eq!(g.degree(), 1);
        assert_relative_eq!(g.coeffs[0], -0.1, epsilon = 1e-15);
    }
}
