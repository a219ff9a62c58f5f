//! Fresh-symbol registry.

use rustc_hash::FxHashSet;

use crate::error::SymbolError;
use crate::expr::Expr;

/// Registry of symbol names in use.
///
/// Registration is additive; symbols are never deregistered. The
/// registry is an explicit value: callers that want process-wide
/// freshness thread one registry through their passes and serialize
/// access themselves.
#[derive(Debug, Default, Clone)]
pub struct SymbolRegistry {
    used: FxHashSet<String>,
}

impl SymbolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symbol name as used.
    pub fn register(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    /// Record every free symbol of an expression as used.
    pub fn register_expr(&mut self, expr: &Expr) {
        for s in expr.free_symbols() {
            self.used.insert(s);
        }
    }

    /// Check whether a name is already registered.
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Return a symbol named `preferred` if unused, else `preferred_k`
    /// with the smallest unused `k ≥ 1`. The returned name is registered.
    pub fn fresh_symbol(&mut self, preferred: &str) -> Result<Expr, SymbolError> {
        if preferred.is_empty() || preferred.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(SymbolError::SymbolClash {
                name: preferred.to_string(),
            });
        }
        let name = if !self.used.contains(preferred) {
            preferred.to_string()
        } else {
            let mut k = 1u64;
            loop {
                let candidate = format!("{preferred}_{k}");
                if !self.used.contains(&candidate) {
                    break candidate;
                }
                k += 1;
            }
        };
        self.used.insert(name.clone());
        Ok(Expr::symbol(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_symbol_prefers_name() {
        let mut reg = SymbolRegistry::new();
        assert_eq!(reg.fresh_symbol("a").unwrap(), Expr::symbol("a"));
        assert_eq!(reg.fresh_symbol("a").unwrap(), Expr::symbol("a_1"));
        assert_eq!(reg.fresh_symbol("a").unwrap(), Expr::symbol("a_2"));
    }

    #[test]
    fn test_fresh_symbol_skips_registered() {
        let mut reg = SymbolRegistry::new();
        reg.register("b");
        reg.register("b_1");
        assert_eq!(reg.fresh_symbol("b").unwrap(), Expr::symbol("b_2"));
    }

    #[test]
    fn test_unprintable_name_rejected() {
        let mut reg = SymbolRegistry::new();
        assert!(reg.fresh_symbol("").is_err());
        assert!(reg.fresh_symbol("a b").is_err());
        assert!(reg.fresh_symbol("a\tb").is_err());
    }

    #[test]
    fn test_register_expr() {
        let mut reg = SymbolRegistry::new();
        reg.register_expr(&(Expr::symbol("x") + Expr::symbol("y")));
        assert!(reg.contains("x"));
        assert!(reg.contains("y"));
        assert_eq!(reg.fresh_symbol("x").unwrap(), Expr::symbol("x_1"));
    }
}
