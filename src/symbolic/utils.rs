// the collection of utility functions mainly for bracket parsing and number recognition
use num::rational::Ratio;

/// true if every '(' has its pair and no ')' comes before its '('
pub fn brackets_balanced(s: &str) -> bool {
    let mut depth: i32 = 0;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// byte position of the bracket closing the one opened at `bracket_start`
pub fn find_pair_to_this_bracket(input: &str, bracket_start: usize) -> Option<usize> {
    let mut stack = 0;
    for (i, c) in input.char_indices().skip_while(|(i, _)| *i < bracket_start) {
        if c == '(' {
            stack += 1;
        } else if c == ')' {
            stack -= 1;
            if stack == 0 {
                return Some(i);
            }
        }
    }
    None
}

// find positions of giving char that are  outside brackets only
pub fn find_char_positions_outside_brackets(s: &str, c: char) -> Vec<usize> {
    let mut depth = 0;
    let mut positions = Vec::new();
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if ch == c && depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

pub fn linspace(start: f64, end: f64, num_values: usize) -> Vec<f64> {
    if num_values < 2 {
        return vec![start; num_values];
    }
    let step = (end - start) / (num_values as f64 - 1.0);
    (0..num_values).map(|i| start + (i as f64 * step)).collect()
}

/// Best rational approximation of `value` with denominator not larger than `max_den`,
/// found by expanding the continued fraction. Returns `None` when no such fraction
/// reproduces the value to ~1e-12 relative accuracy.
pub fn to_fraction(value: f64, max_den: i64) -> Option<Ratio<i64>> {
    if !value.is_finite() || value.abs() > 1e15 {
        return None;
    }
    let tolerance = 1e-12 * value.abs();
    let (mut h_prev, mut h) = (1i64, value.floor() as i64);
    let (mut k_prev, mut k) = (0i64, 1i64);
    let mut x = value - value.floor();
    for _ in 0..40 {
        if (value - h as f64 / k as f64).abs() <= tolerance {
            return Some(Ratio::new(h, k));
        }
        if x.abs() < 1e-15 {
            break;
        }
        x = 1.0 / x;
        let a = x.floor();
        if a > max_den as f64 {
            break;
        }
        let a = a as i64;
        x -= a as f64;
        let h_next = a.checked_mul(h)?.checked_add(h_prev)?;
        let k_next = a.checked_mul(k)?.checked_add(k_prev)?;
        if k_next > max_den {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);
    }
    None
}

/// Fraction to print `value` as: a continued-fraction approximation with denominator up to
/// `max_den`, or `1/n` for the reciprocal of any integer (`1/1000001`).
pub fn printable_fraction(value: f64, max_den: i64) -> Option<Ratio<i64>> {
    to_fraction(value, max_den).or_else(|| {
        let n = as_integer(1.0 / value)?;
        (n.abs() > 1).then(|| Ratio::new(1, n))
    })
}

/// integer value if `value` is one up to rounding noise relative to its size;
/// small non-zero values such as `1e-13` are not integers
pub fn as_integer(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() > 1e15 {
        return None;
    }
    let rounded = value.round();
    if (value - rounded).abs() <= 1e-9 * value.abs() {
        Some(rounded as i64)
    } else {
        None
    }
}

/// snaps floating noise such as 1.9999999999999996 to 2.0 and -0.0 to 0.0
pub fn clean_float(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    match as_integer(value) {
        Some(n) => n as f64,
        None => value,
    }
}

/// n = k^2 * m with m square free; returns (k, m)
pub fn split_square_factor(n: u64) -> (u64, u64) {
    let mut k = 1;
    let mut m = n;
    let mut f = 2u64;
    while f * f <= m {
        while m % (f * f) == 0 {
            m /= f * f;
            k *= f;
        }
        f += 1;
    }
    (k, m)
}

/// positive divisors of |n| (n != 0), ascending
pub fn divisors(n: i64) -> Vec<i64> {
    let n = n.unsigned_abs();
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1u64;
    while d * d <= n {
        if n % d == 0 {
            small.push(d as i64);
            if d * d != n {
                large.push((n / d) as i64);
            }
        }
        d += 1;
    }
    large.reverse();
    small.extend(large);
    small
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_brackets() {
        assert!(brackets_balanced("sin(x)*(x+1)"));
        assert!(!brackets_balanced("sin(x"));
        assert!(!brackets_balanced(")x("));
        assert_eq!(find_pair_to_this_bracket("(a+(b))+c", 0), Some(6));
        assert_eq!(find_pair_to_this_bracket("f(a+(b)", 1), None);
        assert_eq!(find_char_positions_outside_brackets("a+(b+c)+d", '+'), vec![1, 7]);
    }

    #[test]
    fn test_linspace() {
        let v = linspace(-10.0, 10.0, 400);
        assert_eq!(v.len(), 400);
        assert_relative_eq!(v[0], -10.0);
        assert_relative_eq!(v[399], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_fraction() {
        assert_eq!(to_fraction(1.0 / 3.0, 1000), Some(Ratio::new(1, 3)));
        assert_eq!(to_fraction(-2.5, 1000), Some(Ratio::new(-5, 2)));
        assert_eq!(to_fraction(4.0, 1000), Some(Ratio::new(4, 1)));
        assert_eq!(to_fraction(std::f64::consts::PI, 1000), None);
        assert_eq!(to_fraction(2f64.sqrt(), 1000), None);
        assert_eq!(to_fraction(0.0, 1000), Some(Ratio::new(0, 1)));
        assert_eq!(to_fraction(1e-13, 1000), None);
        assert_eq!(printable_fraction(1.0 / 1000001.0, 1000), Some(Ratio::new(1, 1000001)));
        assert_eq!(printable_fraction(-1.0 / 4096.0, 1000), Some(Ratio::new(-1, 4096)));
        assert_eq!(printable_fraction(2.0 / 1000001.0, 1000), None);
        assert_eq!(printable_fraction(0.75, 1000), Some(Ratio::new(3, 4)));
    }

    #[test]
    fn test_integer_helpers() {
        assert_eq!(as_integer(1.9999999999999996), Some(2));
        assert_eq!(as_integer(0.5), None);
        assert!(clean_float(-0.0).is_sign_positive());
        assert_eq!(clean_float(-1e-13), -1e-13);
        assert_eq!(as_integer(1e-13), None);
        assert_eq!(as_integer(0.0), Some(0));
        assert_eq!(split_square_factor(8), (2, 2));
        assert_eq!(split_square_factor(45), (3, 5));
        assert_eq!(split_square_factor(7), (1, 7));
        assert_eq!(divisors(12), vec![1, 2, 3, 4, 6, 12]);
        assert_eq!(divisors(-9), vec![1, 3, 9]);
    }
}
