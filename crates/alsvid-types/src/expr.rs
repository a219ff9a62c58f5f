//! Symbolic parameter expressions.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A symbolic or concrete expression.
///
/// Used for gate parameters, global phases and Pauli coefficients.
/// Purely numeric expressions fold eagerly under [`Expr::simplify`];
/// symbolic ones survive until a substitution binds their symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// The imaginary unit.
    I,
    /// Negation.
    Neg(Box<Expr>),
    /// Addition.
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction.
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication.
    Mul(Box<Expr>, Box<Expr>),
    /// Division.
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Create a constant expression.
    pub fn constant(value: f64) -> Self {
        Expr::Constant(value)
    }

    /// Create a symbolic expression.
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        Expr::Pi
    }

    /// The zero expression.
    pub fn zero() -> Self {
        Expr::Constant(0.0)
    }

    /// The unit expression.
    pub fn one() -> Self {
        Expr::Constant(1.0)
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            Expr::Symbol(_) => true,
            Expr::Constant(_) | Expr::Pi | Expr::I => false,
            Expr::Neg(e) => e.is_symbolic(),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.is_symbolic() || b.is_symbolic()
            }
        }
    }

    /// Try to evaluate as a concrete real value.
    ///
    /// Returns `None` for symbolic expressions and for numeric expressions
    /// with a non-zero imaginary part.
    pub fn eval(&self) -> Option<f64> {
        let v = self.eval_complex()?;
        if v.im == 0.0 { Some(v.re) } else { None }
    }

    /// Try to evaluate as a concrete complex value.
    pub fn eval_complex(&self) -> Option<Complex64> {
        match self {
            Expr::Constant(v) => Some(Complex64::new(*v, 0.0)),
            Expr::Symbol(_) => None,
            Expr::Pi => Some(Complex64::new(PI, 0.0)),
            Expr::I => Some(Complex64::new(0.0, 1.0)),
            Expr::Neg(e) => e.eval_complex().map(|v| -v),
            Expr::Add(a, b) => Some(a.eval_complex()? + b.eval_complex()?),
            Expr::Sub(a, b) => Some(a.eval_complex()? - b.eval_complex()?),
            Expr::Mul(a, b) => Some(a.eval_complex()? * b.eval_complex()?),
            Expr::Div(a, b) => {
                let divisor = b.eval_complex()?;
                if divisor == Complex64::new(0.0, 0.0) {
                    return None;
                }
                Some(a.eval_complex()? / divisor)
            }
        }
    }

    /// Get all symbol names in this expression.
    pub fn free_symbols(&self) -> HashSet<String> {
        let mut set = HashSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut HashSet<String>) {
        match self {
            Expr::Constant(_) | Expr::Pi | Expr::I => {}
            Expr::Symbol(name) => {
                set.insert(name.clone());
            }
            Expr::Neg(e) => e.collect_symbols(set),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Bind a single symbol to a value, returning a new expression.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let mut map = FxHashMap::default();
        map.insert(name.to_string(), Expr::Constant(value));
        self.substitute(&map)
    }

    /// Replace symbols according to a map, folding numeric subexpressions.
    ///
    /// Symbols absent from the map are left untouched.
    pub fn substitute(&self, map: &FxHashMap<String, Expr>) -> Self {
        let replaced = match self {
            Expr::Symbol(n) => match map.get(n) {
                Some(e) => e.clone(),
                None => self.clone(),
            },
            Expr::Constant(_) | Expr::Pi | Expr::I => self.clone(),
            Expr::Neg(e) => Expr::Neg(Box::new(e.substitute(map))),
            Expr::Add(a, b) => {
                Expr::Add(Box::new(a.substitute(map)), Box::new(b.substitute(map)))
            }
            Expr::Sub(a, b) => {
                Expr::Sub(Box::new(a.substitute(map)), Box::new(b.substitute(map)))
            }
            Expr::Mul(a, b) => {
                Expr::Mul(Box::new(a.substitute(map)), Box::new(b.substitute(map)))
            }
            Expr::Div(a, b) => {
                Expr::Div(Box::new(a.substitute(map)), Box::new(b.substitute(map)))
            }
        };
        replaced.simplify()
    }

    /// Simplify the expression by evaluating numeric subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.eval_complex() {
            if v.im == 0.0 {
                return Expr::Constant(v.re);
            }
            // Complex constants keep their tree form; only pure-real
            // expressions collapse to a Constant.
            return self.clone();
        }
        match self {
            Expr::Neg(e) => Expr::Neg(Box::new(e.simplify())),
            Expr::Add(a, b) => Expr::Add(Box::new(a.simplify()), Box::new(b.simplify())),
            Expr::Sub(a, b) => Expr::Sub(Box::new(a.simplify()), Box::new(b.simplify())),
            Expr::Mul(a, b) => Expr::Mul(Box::new(a.simplify()), Box::new(b.simplify())),
            Expr::Div(a, b) => Expr::Div(Box::new(a.simplify()), Box::new(b.simplify())),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Pi => write!(f, "π"),
            Expr::I => write!(f, "i"),
            Expr::Neg(e) => write!(f, "-({e})"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::Sub(a, b) => write!(f, "({a} - {b})"),
            Expr::Mul(a, b) => write!(f, "({a} * {b})"),
            Expr::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

// f64 payloads are hashed by bit pattern. Equal expressions hash equally
// because structural equality on Constant is also bitwise (via PartialEq
// on f64, modulo -0.0/0.0 which we normalise here).
impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Expr::Constant(v) => {
                let v = if *v == 0.0 { 0.0 } else { *v };
                v.to_bits().hash(state);
            }
            Expr::Symbol(name) => name.hash(state),
            Expr::Pi | Expr::I => {}
            Expr::Neg(e) => e.hash(state),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.hash(state);
                b.hash(state);
            }
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Constant(f64::from(value))
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant() {
        let p = Expr::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.eval(), Some(1.5));
    }

    #[test]
    fn test_symbol() {
        let p = Expr::symbol("theta");
        assert!(p.is_symbolic());
        assert_eq!(p.eval(), None);
        assert!(p.free_symbols().contains("theta"));
    }

    #[test]
    fn test_imaginary_unit() {
        let p = Expr::I * Expr::I;
        assert_eq!(p.eval_complex(), Some(Complex64::new(-1.0, 0.0)));
        assert_eq!(p.simplify(), Expr::Constant(-1.0));
    }

    #[test]
    fn test_bind() {
        let p = Expr::symbol("theta");
        let bound = p.bind("theta", PI / 2.0);
        assert!(!bound.is_symbolic());
        assert!((bound.eval().unwrap() - PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_substitute_folds_when_fully_bound() {
        let e = Expr::symbol("a") + Expr::symbol("b");
        let mut map = FxHashMap::default();
        map.insert("a".to_string(), Expr::constant(2.0));
        map.insert("b".to_string(), Expr::constant(3.0));
        assert_eq!(e.substitute(&map), Expr::Constant(5.0));
    }

    #[test]
    fn test_substitute_keeps_unbound() {
        let e = Expr::symbol("a") + Expr::symbol("b");
        let mut map = FxHashMap::default();
        map.insert("a".to_string(), Expr::constant(2.0));
        let sub = e.substitute(&map);
        assert!(sub.is_symbolic());
        assert_eq!(sub.free_symbols().len(), 1);
    }

    #[test]
    fn test_substitution_with_expression_value() {
        let e = Expr::symbol("x");
        let mut map = FxHashMap::default();
        map.insert("x".to_string(), Expr::symbol("y") * Expr::constant(2.0));
        let sub = e.substitute(&map);
        assert!(sub.free_symbols().contains("y"));
        assert!(!sub.free_symbols().contains("x"));
    }

    #[test]
    fn test_arithmetic() {
        let a = Expr::constant(2.0);
        let b = Expr::constant(3.0);

        let sum = (a.clone() + b.clone()).simplify();
        assert_eq!(sum.eval(), Some(5.0));

        let prod = (a * b).simplify();
        assert_eq!(prod.eval(), Some(6.0));
    }
}
