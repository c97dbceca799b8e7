//! Name -> native handler table for built-in functions.
//!
//! The registry is populated once at interpreter startup with the built-in
//! operator set and never changes afterwards: users cannot define new
//! built-ins at runtime, so registering a name twice is a programming error
//! and panics rather than returning a recoverable condition.
//!
//! A handler receives the operator cell it was dispatched through (useful
//! for diagnostics) and the *unevaluated* argument list; each handler alone
//! decides whether and when to evaluate its arguments.

use std::collections::HashMap;

use crate::Error;
use crate::builtins;
use crate::cell::CellRef;
use crate::evaluator::Interpreter;

/// Native handler signature: `(interpreter, operator cell, argument list)`.
pub type BuiltinFn = fn(&mut Interpreter, &CellRef, &CellRef) -> Result<CellRef, Error>;

/// Fixed mapping from operator name to native handler.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    handlers: HashMap<&'static str, BuiltinFn>,
}

impl FunctionRegistry {
    /// An empty registry. Most callers want [`FunctionRegistry::with_builtins`].
    pub fn new() -> Self {
        FunctionRegistry {
            handlers: HashMap::new(),
        }
    }

    /// The standard registry: every built-in operator plus the reader
    /// compatibility aliases, mapped to the handlers in [`crate::builtins`].
    pub fn with_builtins() -> Self {
        let mut registry = FunctionRegistry::new();

        registry.register("ceiling", builtins::builtin_ceiling);
        registry.register("floor", builtins::builtin_floor);
        registry.register("quote", builtins::builtin_quote);
        registry.register("cons", builtins::builtin_cons);
        registry.register("car", builtins::builtin_car);
        registry.register("cdr", builtins::builtin_cdr);
        registry.register("intp", builtins::builtin_intp);
        registry.register("doublep", builtins::builtin_doublep);
        registry.register("symbolp", builtins::builtin_symbolp);
        registry.register("nullp", builtins::builtin_nullp);
        registry.register("listp", builtins::builtin_listp);
        registry.register("if", builtins::builtin_if);
        registry.register("define", builtins::builtin_define);
        registry.register("<", builtins::builtin_less_than);
        registry.register("not", builtins::builtin_not);
        registry.register("print", builtins::builtin_print);
        registry.register("eval", builtins::builtin_eval);
        registry.register("lambda", builtins::builtin_lambda);
        registry.register("apply", builtins::builtin_apply);
        registry.register("let", builtins::builtin_let);

        // Scheme-flavored aliases for the predicates and quote.
        registry.register("int?", builtins::builtin_intp);
        registry.register("double?", builtins::builtin_doublep);
        registry.register("symbol?", builtins::builtin_symbolp);
        registry.register("null?", builtins::builtin_nullp);
        registry.register("list?", builtins::builtin_listp);
        registry.register("'", builtins::builtin_quote);

        registry
    }

    /// Add a handler under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. Built-ins are wired up once
    /// at startup; a duplicate means two handlers claim the same operator.
    pub fn register(&mut self, name: &'static str, handler: BuiltinFn) {
        if self.handlers.insert(name, handler).is_some() {
            panic!("built-in operator `{name}` registered twice");
        }
    }

    /// True if `name` has a registered handler.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Fetch the handler for `name`.
    pub fn lookup(&self, name: &str) -> Option<BuiltinFn> {
        self.handlers.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_contains_every_mandated_name() {
        let registry = FunctionRegistry::with_builtins();
        let names = [
            "ceiling", "floor", "quote", "cons", "car", "cdr", "intp", "doublep", "symbolp",
            "nullp", "listp", "if", "define", "<", "not", "print", "eval", "lambda", "apply",
            "let",
        ];
        for name in names {
            assert!(registry.contains(name), "missing built-in: {name}");
            assert!(registry.lookup(name).is_some());
        }
    }

    #[test]
    fn aliases_share_handlers_with_their_targets() {
        let registry = FunctionRegistry::with_builtins();
        let pairs = [
            ("int?", "intp"),
            ("double?", "doublep"),
            ("symbol?", "symbolp"),
            ("null?", "nullp"),
            ("list?", "listp"),
            ("'", "quote"),
        ];
        for (alias, target) in pairs {
            let alias_fn = registry.lookup(alias).unwrap_or_else(|| panic!("missing {alias}"));
            let target_fn = registry.lookup(target).unwrap();
            assert!(
                std::ptr::fn_addr_eq(alias_fn, target_fn),
                "{alias} does not share {target}'s handler"
            );
        }
    }

    #[test]
    fn arithmetic_operators_are_not_registry_entries() {
        let registry = FunctionRegistry::with_builtins();
        for op in ["+", "-", "*", "/"] {
            assert!(!registry.contains(op));
        }
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_is_fatal() {
        let mut registry = FunctionRegistry::with_builtins();
        registry.register("car", builtins::builtin_car);
    }
}
