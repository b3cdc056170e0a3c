use crate::symbolic::errors::ParseError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{brackets_balanced, find_pair_to_this_bracket};
use log::debug;
/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use RustedMathTutor::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x**2 + sin(x)/x").unwrap();
/// assert_eq!(parsed_expression.to_string(), "x**2 + sin(x)/x");
/// ```
//                  search recursion diagram
//                "y^2+exp(x)+log(x)/y-x^2.3"       |
//                |       left  | right             |
//                |_________________________________|
//                |           div by    -           |
//                |_________________________________|
//                |y^2+exp(x)+log(x)/y | x^2.3      |
//                |       |            |            |
//                |_____ \|/___________|____________|
//                |           div by   +            |
//                |____________________|____________|
//                |   y^2+exp(x) | log(x)/y         |
//                |       |      |      |           |
//                |_____ \|/_____|_____\|/__________|
//                  etc...
// every level splits the string at the operator that binds weakest and sits outside
// brackets: the rightmost + or - (left associativity), then the rightmost * or /,
// then a leading unary sign, then the leftmost ^ (right associativity)

const BINARY_OPERATORS: [char; 5] = ['+', '-', '*', '/', '^'];

/// Parses `input` into an expression. `**` is accepted as the power operator.
pub fn parse_expression_func(input: &str) -> Result<Expr, ParseError> {
    let normalized = input.trim().replace("**", "^");
    if normalized.is_empty() {
        return Err(ParseError::new(input, "empty expression"));
    }
    if let Some(bad) = normalized
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || c.is_whitespace() || "+-*/^()._".contains(*c)))
    {
        return Err(ParseError::new(input, format!("unexpected character '{}'", bad)));
    }
    if !brackets_balanced(&normalized) {
        return Err(ParseError::new(input, "unbalanced parentheses"));
    }
    let parsed = parse_inner(&normalized).map_err(|reason| ParseError::new(input, reason))?;
    debug!("parsed '{}' into {}", input, parsed);
    Ok(parsed)
}

/// true if the sign at byte `pos` is a binary operator and not a unary sign or
/// the sign of an exponent in a number literal like 2e-3
fn is_binary_sign(input: &str, pos: usize) -> bool {
    let before = input[..pos].trim_end();
    let Some(prev) = before.chars().last() else {
        return false;
    };
    if BINARY_OPERATORS.contains(&prev) || prev == '(' {
        return false;
    }
    if prev == 'e' || prev == 'E' {
        // the token ending in e/E is a number literal if it starts with a digit
        let token_start = before
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let token = &before[token_start..];
        if token.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.')
            && token[..token.len() - 1].chars().all(|c| c.is_ascii_digit() || c == '.')
        {
            return false;
        }
    }
    true
}

// function to find the rightmost occurrence of operators at the same precedence level,
fn find_rightmost_operator_outside_brackets(
    input: &str,
    operators: &[char],
) -> Option<(usize, char)> {
    let mut bracket_depth = 0;
    let mut last_op = None;
    for (i, c) in input.char_indices() {
        match c {
            '(' => bracket_depth += 1,
            ')' => bracket_depth -= 1,
            _ if bracket_depth == 0 && operators.contains(&c) => {
                if (c != '+' && c != '-') || is_binary_sign(input, i) {
                    last_op = Some((i, c));
                }
            }
            _ => {}
        }
    }
    last_op
}

fn find_leftmost_operator_outside_brackets(input: &str, operator: char) -> Option<usize> {
    let mut bracket_depth = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => bracket_depth += 1,
            ')' => bracket_depth -= 1,
            _ if bracket_depth == 0 && c == operator => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_inner(input: &str) -> Result<Expr, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("missing operand".to_string());
    }

    // Handling addition and subtraction
    if let Some((pos, op)) = find_rightmost_operator_outside_brackets(input, &['+', '-']) {
        let left = parse_inner(&input[..pos])?;
        let right = parse_inner(&input[pos + 1..])?;
        return Ok(match op {
            '+' => Expr::Add(Box::new(left), Box::new(right)),
            _ => Expr::Sub(Box::new(left), Box::new(right)),
        });
    }

    // Handling multiplication and division
    if let Some((pos, op)) = find_rightmost_operator_outside_brackets(input, &['*', '/']) {
        let left = parse_inner(&input[..pos])?;
        let right = parse_inner(&input[pos + 1..])?;
        return Ok(match op {
            '*' => Expr::Mul(Box::new(left), Box::new(right)),
            _ => Expr::Div(Box::new(left), Box::new(right)),
        });
    }

    // unary sign binds weaker than ^ : -x^2 = -(x^2)
    if let Some(rest) = input.strip_prefix('-') {
        return Ok(match parse_inner(rest)? {
            Expr::Const(c) => Expr::Const(-c),
            inner => -inner,
        });
    }
    if let Some(rest) = input.strip_prefix('+') {
        return parse_inner(rest);
    }

    // Handling power
    if let Some(pos) = find_leftmost_operator_outside_brackets(input, '^') {
        let base = parse_inner(&input[..pos])?;
        let exp = parse_inner(&input[pos + 1..])?;
        return Ok(Expr::Pow(Box::new(base), Box::new(exp)));
    }

    // expression in brackets or function call
    if let Some(bracket_start) = input.find('(') {
        let bracket_end = find_pair_to_this_bracket(input, bracket_start)
            .ok_or_else(|| "unbalanced parentheses".to_string())?;
        if bracket_end != input.len() - 1 {
            return Err(format!("unexpected text after ')': '{}'", &input[bracket_end + 1..]));
        }
        let inner = parse_inner(&input[bracket_start + 1..bracket_end])?;
        let name = input[..bracket_start].trim();
        if name.is_empty() {
            return Ok(inner);
        }
        return apply_function(name, inner);
    }

    parse_atom(input)
}

fn apply_function(name: &str, arg: Expr) -> Result<Expr, String> {
    let arg = Box::new(arg);
    let expr = match name {
        "exp" => Expr::Exp(arg),
        "log" | "ln" => Expr::Ln(arg),
        "sin" => Expr::sin(arg),
        "cos" => Expr::cos(arg),
        "tan" | "tg" => Expr::tg(arg),
        "cot" | "ctg" => Expr::ctg(arg),
        "asin" | "arcsin" => Expr::arcsin(arg),
        "acos" | "arccos" => Expr::arccos(arg),
        "atan" | "arctan" | "arctg" => Expr::arctg(arg),
        "acot" | "arccot" | "arcctg" => Expr::arcctg(arg),
        "sqrt" => Expr::Pow(arg, Box::new(Expr::Const(0.5))),
        _ => return Err(format!("unknown function '{}'", name)),
    };
    Ok(expr)
}

fn parse_atom(input: &str) -> Result<Expr, String> {
    let first = input.chars().next().unwrap_or(' ');
    if first.is_ascii_digit() || first == '.' {
        return input
            .parse::<f64>()
            .map(Expr::Const)
            .map_err(|_| format!("invalid number '{}'", input));
    }
    if (first.is_ascii_alphabetic() || first == '_')
        && input.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Ok(Expr::Var(input.to_string()));
    }
    Err(format!("unexpected token '{}'", input))
}

impl Expr {
    /// String to symbolic expression
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression_func(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    #[test]
    fn test_parse_polynomial() {
        let parsed = parse_expression_func("x**2 - 4").unwrap();
        assert_eq!(
            parsed,
            Expr::Sub(Box::new(x().pow(Expr::Const(2.0))), Box::new(Expr::Const(4.0)))
        );
        let parsed = parse_expression_func("x^2-4").unwrap();
        assert_eq!(parsed.to_string(), "x**2 - 4");
    }

    #[test]
    fn test_parse_left_associative() {
        let parsed = parse_expression_func("x - 1 - 2").unwrap();
        assert_eq!(
            parsed,
            Expr::Sub(
                Box::new(Expr::Sub(Box::new(x()), Box::new(Expr::Const(1.0)))),
                Box::new(Expr::Const(2.0))
            )
        );
        let parsed = parse_expression_func("8/2/2").unwrap();
        assert_eq!(
            parsed,
            Expr::Div(
                Box::new(Expr::Div(Box::new(Expr::Const(8.0)), Box::new(Expr::Const(2.0)))),
                Box::new(Expr::Const(2.0))
            )
        );
    }

    #[test]
    fn test_parse_power_right_associative_and_unary_minus() {
        let parsed = parse_expression_func("2^3^2").unwrap();
        assert_eq!(
            parsed,
            Expr::Const(2.0).pow(Expr::Const(3.0).pow(Expr::Const(2.0)))
        );
        let parsed = parse_expression_func("-x**2").unwrap();
        assert_eq!(parsed, -(x().pow(Expr::Const(2.0))));
        let parsed = parse_expression_func("x^-1").unwrap();
        assert_eq!(parsed, x().pow(Expr::Const(-1.0)));
        let parsed = parse_expression_func("2*-x").unwrap();
        assert_eq!(parsed, Expr::Const(2.0) * -x());
    }

    #[test]
    fn test_parse_functions() {
        let parsed = parse_expression_func("sin(x)/x").unwrap();
        assert_eq!(parsed, Expr::sin(x().boxed()) / x());
        let parsed = parse_expression_func("sqrt(x+1)").unwrap();
        assert_eq!(parsed, (x() + Expr::Const(1.0)).sqrt());
        let parsed = parse_expression_func("log(exp(x))").unwrap();
        assert_eq!(parsed, Expr::Ln(Box::new(Expr::Exp(x().boxed()))));
        let parsed = parse_expression_func("atan(x) + tan(x)").unwrap();
        assert_eq!(parsed, Expr::arctg(x().boxed()) + Expr::tg(x().boxed()));
        let parsed = parse_expression_func("((x))").unwrap();
        assert_eq!(parsed, x());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_expression_func("2.5").unwrap(), Expr::Const(2.5));
        assert_eq!(parse_expression_func("1e-3").unwrap(), Expr::Const(1e-3));
        let parsed = parse_expression_func("2e-3*x - 1").unwrap();
        assert_eq!(
            parsed,
            Expr::Sub(
                Box::new(Expr::Const(2e-3) * x()),
                Box::new(Expr::Const(1.0))
            )
        );
        assert_eq!(parse_expression_func("-3").unwrap(), Expr::Const(-3.0));
        assert_eq!(parse_expression_func("pi").unwrap(), Expr::pi());
    }

    #[test]
    fn test_parse_errors() {
        let err = parse_expression_func("sin(x").unwrap_err();
        assert_eq!(err.input, "sin(x");
        assert_eq!(err.reason, "unbalanced parentheses");
        assert!(parse_expression_func("x +").is_err());
        assert!(parse_expression_func("").is_err());
        assert!(parse_expression_func("2 x").is_err());
        assert!(parse_expression_func("foo(x)").is_err());
        assert!(parse_expression_func("x = 2").is_err());
        assert!(parse_expression_func("(x)(y)").is_err());
        assert!(parse_expression_func("inf").is_ok());
        assert!(parse_expression_func("x ** * 2").is_err());
    }
}
