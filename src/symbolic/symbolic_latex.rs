//! LaTeX rendering of expressions:
//! `\frac{x^{3}}{3}`, `2 x`, `\sin{\left(x \right)}`, `\sqrt{2}`, `e^{x}`.

use crate::symbolic::symbolic_engine::{
    E_SYMBOL, Expr, IMAGINARY_SYMBOL, INFINITY_SYMBOL, MAX_PRINTED_DENOMINATOR, PI_SYMBOL,
    is_sqrt_exponent, product_factors, signed_terms,
};
use crate::symbolic::utils::{as_integer, printable_fraction};
use itertools::Itertools;

impl Expr {
    /// LaTeX source of the expression.
    ///
    /// # Examples
    /// ```
    /// use RustedMathTutor::symbolic::symbolic_engine::Expr;
    /// let e = Expr::parse_expression("x**3/3").unwrap().simplify();
    /// assert_eq!(e.to_latex(), r"\frac{x^{3}}{3}");
    /// ```
    pub fn to_latex(&self) -> String {
        match self {
            Expr::Var(name) => symbol_latex(name),
            Expr::Const(value) => number_latex(*value),
            Expr::Add(..) | Expr::Sub(..) => sum_latex(self),
            Expr::Mul(..) => product_latex(self),
            Expr::Div(num, den) => match self.split_negative() {
                Some(pos) => format!("- {}", pos.to_latex()),
                None => format!(r"\frac{{{}}}{{{}}}", num.to_latex(), den.to_latex()),
            },
            Expr::Pow(base, exp) => power_latex(base, exp),
            Expr::Exp(arg) if arg.is_one() => "e".to_string(),
            Expr::Exp(arg) => format!("e^{{{}}}", arg.to_latex()),
            _ => match self.unary_arg() {
                Some(arg) => format!(r"{}{{\left({} \right)}}", function_latex(self), arg.to_latex()),
                None => String::new(),
            },
        }
    }
}

/// LaTeX of a list of expressions, e.g. the roots of an equation: `\left[ -2, \  2\right]`
pub fn list_to_latex(items: &[Expr]) -> String {
    if items.is_empty() {
        return r"\left[ \right]".to_string();
    }
    let body = items.iter().map(|e| e.to_latex()).join(r", \  ");
    format!(r"\left[ {}\right]", body)
}

fn symbol_latex(name: &str) -> String {
    match name {
        PI_SYMBOL => r"\pi".to_string(),
        E_SYMBOL => "e".to_string(),
        IMAGINARY_SYMBOL => "i".to_string(),
        INFINITY_SYMBOL => r"\infty".to_string(),
        _ => name.to_string(),
    }
}

fn number_latex(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { r"\infty" } else { r"- \infty" }.to_string();
    }
    if let Some(n) = as_integer(value) {
        return n.to_string();
    }
    match printable_fraction(value.abs(), MAX_PRINTED_DENOMINATOR) {
        Some(r) => {
            let sign = if value < 0.0 { "- " } else { "" };
            format!(r"{}\frac{{{}}}{{{}}}", sign, r.numer(), r.denom())
        }
        None => format!("{}", value),
    }
}

fn function_latex(function: &Expr) -> &'static str {
    match function {
        Expr::Ln(_) => r"\log",
        Expr::sin(_) => r"\sin",
        Expr::cos(_) => r"\cos",
        Expr::tg(_) => r"\tan",
        Expr::ctg(_) => r"\cot",
        Expr::arcsin(_) => r"\operatorname{asin}",
        Expr::arccos(_) => r"\operatorname{acos}",
        Expr::arctg(_) => r"\operatorname{atan}",
        Expr::arcctg(_) => r"\operatorname{acot}",
        _ => r"\operatorname{exp}",
    }
}

fn parenthesized(expr: &Expr, parens: bool) -> String {
    if parens {
        format!(r"\left({}\right)", expr.to_latex())
    } else {
        expr.to_latex()
    }
}

fn sum_latex(expr: &Expr) -> String {
    let mut terms = Vec::new();
    signed_terms(expr, false, &mut terms);
    let mut out = String::new();
    for (i, (negative, term)) in terms.iter().enumerate() {
        let body = parenthesized(term, term.precedence() < 2);
        match (i, negative) {
            // -1 - 2 i, but - x + 1
            (0, true) if matches!(term, Expr::Const(_)) => out.push('-'),
            (0, true) => out.push_str("- "),
            (0, false) => {}
            (_, true) => out.push_str(" - "),
            (_, false) => out.push_str(" + "),
        }
        out.push_str(&body);
    }
    out
}

fn product_latex(expr: &Expr) -> String {
    if let Some(pos) = expr.split_negative() {
        let body = parenthesized(&pos, pos.precedence() < 2);
        return match pos {
            Expr::Const(_) => format!("-{}", body),
            _ => format!("- {}", body),
        };
    }
    let mut factors = Vec::new();
    product_factors(expr, &mut factors);
    let mut coeff = 1.0;
    let mut others = Vec::new();
    for factor in factors {
        match factor {
            Expr::Const(c) => coeff *= c,
            other => others.push(other),
        }
    }
    if others.is_empty() {
        return number_latex(coeff);
    }
    let rest = others
        .iter()
        .map(|factor| parenthesized(factor, factor.precedence() < 2))
        .collect::<Vec<_>>()
        .join(" ");
    if coeff == 1.0 {
        return rest;
    }
    if as_integer(coeff).is_none() {
        if let Some(r) = printable_fraction(coeff, MAX_PRINTED_DENOMINATOR) {
            let numer = if *r.numer() == 1 {
                rest
            } else {
                format!("{} {}", r.numer(), rest)
            };
            return format!(r"\frac{{{}}}{{{}}}", numer, r.denom());
        }
    }
    format!("{} {}", number_latex(coeff), rest)
}

fn power_latex(base: &Expr, exp: &Expr) -> String {
    if is_sqrt_exponent(exp) {
        return format!(r"\sqrt{{{}}}", base.to_latex());
    }
    match exp.as_const() {
        Some(e) if e == -0.5 => return format!(r"\frac{{1}}{{\sqrt{{{}}}}}", base.to_latex()),
        Some(e) if e == -1.0 => return format!(r"\frac{{1}}{{{}}}", base.to_latex()),
        Some(e) if e < 0.0 && as_integer(e).is_some() => {
            return format!(r"\frac{{1}}{{{}}}", power_latex(base, &Expr::Const(-e)));
        }
        _ => {}
    }
    // sin(x)**2 as \sin^{2}{\left(x \right)}
    if let (Some(arg), Some(n)) = (base.unary_arg(), exp.as_const().and_then(as_integer)) {
        if !matches!(base, Expr::Exp(_)) && n > 0 {
            return format!(
                r"{}^{{{}}}{{\left({} \right)}}",
                function_latex(base),
                n,
                arg.to_latex()
            );
        }
    }
    let base_parens = match base {
        Expr::Const(c) => *c < 0.0 || as_integer(*c).is_none(),
        other => other.precedence() <= 3,
    };
    format!("{}^{{{}}}", parenthesized(base, base_parens), exp.to_latex())
}
