#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// error types of the engine: the text is not an expression, or no result can be computed
pub mod errors;
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedMathTutor::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("x**2 - 4*x + 4").unwrap();
/// println!(" parsed_expression {}", parsed_expression);
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) holds the symbolic expression tree
/// 2) turns a symbolic expression into a string in the usual `x**2 + 1` notation
/// 3) evaluates, differentiates and simplifies symbolic expressions
///# Example#
/// ```
/// use RustedMathTutor::symbolic::symbolic_engine::Expr;
/// let input = "exp(x) + log(x)";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// // differentiate with respect to x
/// let df_dx = parsed_expression.diff("x").simplify();
/// println!("df_dx = {}", df_dx);
/// // evaluate the function at x = 1
/// let f_res = parsed_expression.eval1D("x", 1.0).unwrap();
/// println!("f(1) = {}", f_res);
/// // compare numerical and analytical derivatives on a grid
/// let (norm, res) = parsed_expression.compare_num1D("x", 0.5, 10.0, 100, 1e-6).unwrap();
/// println!("norm = {}, res = {}", norm, res);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
/// algebraic simplification: constant folding, like terms, cancellation of common factors
pub mod symbolic_simplify;
/// dense polynomials in one variable: arithmetic, gcd, roots
pub mod polynomial;
///________________________________________________________________________________________________________________________________________________
/// # Calculus
/// indefinite integrals, roots of equations and limits
///# Example#
/// ```
/// use RustedMathTutor::symbolic::symbolic_engine::Expr;
/// use RustedMathTutor::symbolic::symbolic_limit::LimitPoint;
/// let f = Expr::parse_expression("x**2 - 4").unwrap();
/// let integral = f.integrate("x").unwrap().simplify();
/// println!("integral = {} + C", integral);
/// let roots = f.solve("x").unwrap();
/// println!("roots = {:?}", roots.iter().map(|r| r.to_string()).collect::<Vec<_>>());
/// let point = LimitPoint::parse("oo").unwrap();
/// let lim = (Expr::Const(1.0) / f).limit("x", &point).unwrap();
/// println!("limit = {}", lim);
/// ```
pub mod symbolic_integration;
pub mod symbolic_limit;
pub mod symbolic_solve;
/// LaTeX output
pub mod symbolic_latex;
///______________________________________________________________________________________________________________________________________________
/// the collection of utility functions mainly for bracket parsing and proceeding
/// _____________________________________________________________________________________________________________________________________________
pub mod utils;
