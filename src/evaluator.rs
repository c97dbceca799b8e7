//! The recursive expression evaluator and its operator-dispatch protocol.
//!
//! [`Interpreter`] owns the two pieces of process-wide state, the
//! environment and the function registry, as explicit context objects:
//! there is one shared instance per interpreter rather than hidden global
//! statics, so running several interpreters side by side is just a matter
//! of constructing several values.
//!
//! Evaluation is purely recursive and single-threaded. `eval` resolves the
//! head of a list through `resolve_operator` to an operator cell, then
//! hands the *unevaluated* argument list to the operator's apply behavior:
//!
//! - arithmetic handles fold their operator over the evaluated arguments,
//! - built-in handles delegate to the registry handler, which controls
//!   evaluation of its own arguments,
//! - procedures check arity, push a frame, bind, and evaluate their body.
//!
//! Evaluation order is therefore a property of the operator kind, not a
//! uniform eval-then-apply rule. Recursion depth is bounded only by the
//! host call stack.

use std::rc::Rc;

use crate::cell::{ArithmeticOp, Cell, CellRef, ParamSpec};
use crate::env::Environment;
use crate::registry::FunctionRegistry;
use crate::{Arity, Error};

/// The evaluation context: environment plus built-in registry.
#[derive(Debug, Clone)]
pub struct Interpreter {
    env: Environment,
    registry: FunctionRegistry,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with an empty global frame and the standard
    /// built-in registry.
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            registry: FunctionRegistry::with_builtins(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Evaluate an expression tree.
    ///
    /// Non-list cells evaluate to themselves, except symbols, which resolve
    /// against the environment. A list is a call: the head is resolved to
    /// an operator and applied to the rest of the list.
    pub fn eval(&mut self, expr: &CellRef) -> Result<CellRef, Error> {
        if !expr.is_list() {
            if let Cell::Symbol(name) = expr.as_ref() {
                return self.env.resolve(name);
            }
            return Ok(Rc::clone(expr));
        }

        let operator = self.resolve_operator(expr.car()?)?;
        self.apply(&operator, expr.cdr()?)
    }

    /// Resolve the head of a call to an applicable operator cell.
    ///
    /// A list head is evaluated first, which is how an inline
    /// `((lambda (x) x) 5)` finds its procedure. A symbol head resolves,
    /// in order, to a bound procedure, a built-in
    /// handle, or an arithmetic handle; a procedure binding therefore
    /// shadows a built-in of the same name, while any other binding does
    /// not. Handles are minted fresh here and never persisted.
    fn resolve_operator(&mut self, head: &CellRef) -> Result<CellRef, Error> {
        if head.is_list() {
            return self.eval(head);
        }

        if let Cell::Symbol(name) = head.as_ref() {
            if self.env.is_defined(name) {
                let definition = self.env.resolve(name)?;
                if definition.is_procedure() {
                    return Ok(definition);
                }
            }
            if self.registry.contains(name) {
                return Ok(Rc::new(Cell::Builtin(name.clone())));
            }
            if let Some(op) = ArithmeticOp::from_symbol(name) {
                return Ok(Rc::new(Cell::Arithmetic(op)));
            }
        }

        let rendered = head
            .sexpr()
            .unwrap_or_else(|_| "#<malformed list>".to_owned());
        Err(Error::UnknownOperator(rendered))
    }

    /// Dispatch an operator cell on an unevaluated argument list.
    pub fn apply(&mut self, operator: &CellRef, args: &CellRef) -> Result<CellRef, Error> {
        match operator.as_ref() {
            Cell::Arithmetic(op) => self.apply_arithmetic(*op, args),
            Cell::Builtin(name) => {
                // Only `<` may be called with no arguments at all.
                if args.is_nil() && name.as_str() != "<" {
                    return Err(Error::arity_in(Arity::AtLeast(1), 0, name.as_str()));
                }
                // Handles are minted only for registered names, so a miss
                // here is an internal invariant violation, not user input.
                let handler = self.registry.lookup(name).unwrap_or_else(|| {
                    panic!("built-in handle minted for unregistered operator `{name}`")
                });
                handler(self, operator, args)
            }
            Cell::Procedure { params, body } => self.apply_procedure(params, body, args),
            other => Err(Error::TypeMismatch {
                expected: "an applicable operator",
                actual: other.type_name(),
            }),
        }
    }

    /// Variadic fold of one of `+ - * /` over its evaluated arguments.
    ///
    /// Zero arguments yield the operator's identity element where one
    /// exists. One argument applies the unary form. Two or more evaluate
    /// the first argument, then left-fold the operator pairwise over the
    /// evaluated rest, strictly left to right.
    fn apply_arithmetic(&mut self, op: ArithmeticOp, args: &CellRef) -> Result<CellRef, Error> {
        if args.is_nil() {
            return identity(op);
        }

        if args.cdr()?.is_nil() {
            let value = self.eval(args.car()?)?;
            return unary_step(op, &value);
        }

        let mut result = self.eval(args.car()?)?;
        let mut pos = Rc::clone(args.cdr()?);
        while !pos.is_nil() {
            let operand = self.eval(pos.car()?)?;
            result = fold_step(op, &result, &operand)?;

            let next = Rc::clone(pos.cdr()?);
            pos = next;
        }
        Ok(result)
    }

    /// Invoke a user-defined procedure.
    ///
    /// Fixed-arity procedures require the argument count to match exactly
    /// and bind each formal to its evaluated actual, in order, inside a
    /// fresh frame. Variadic procedures bind their single formal to the
    /// *unevaluated* argument list; their bodies run one evaluation level
    /// behind, which the extra evaluation of non-nil intermediate results
    /// mirrors. The frame is popped on success and on error alike.
    fn apply_procedure(
        &mut self,
        params: &ParamSpec,
        body: &[CellRef],
        args: &CellRef,
    ) -> Result<CellRef, Error> {
        if let ParamSpec::Fixed(names) = params {
            let got = args.list_len()?;
            if got != names.len() {
                return Err(Error::arity_in(
                    Arity::Exactly(names.len()),
                    got,
                    render_body(body),
                ));
            }
        }

        let variadic = matches!(params, ParamSpec::Variadic(_));
        self.with_frame(|interp| {
            match params {
                ParamSpec::Variadic(name) => {
                    interp.env.define(name, Rc::clone(args))?;
                }
                ParamSpec::Fixed(names) => {
                    let actuals = args.list_items()?;
                    for (name, actual) in names.iter().zip(actuals.iter()) {
                        let value = interp.eval(actual)?;
                        interp.env.define(name, value)?;
                    }
                }
            }

            let mut result = Cell::nil();
            for expr in body {
                result = interp.eval(expr)?;
                if variadic && !result.is_nil() {
                    result = interp.eval(&result)?;
                }
            }
            Ok(result)
        })
    }

    /// Run `body` inside a freshly pushed frame, popping it again on every
    /// exit path. All frame pushers go through here so that frame balance
    /// holds by construction, error unwinding included.
    pub(crate) fn with_frame<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.env.push_frame();
        let result = body(self);
        self.env.pop_frame();
        result
    }
}

fn identity(op: ArithmeticOp) -> Result<CellRef, Error> {
    match op {
        ArithmeticOp::Add => Ok(Cell::int(0)),
        ArithmeticOp::Mul => Ok(Cell::int(1)),
        ArithmeticOp::Sub | ArithmeticOp::Div => Err(Error::NoIdentity {
            operator: op.symbol(),
        }),
    }
}

/// Single-operand form: `+`/`*` pass the operand through, `-` negates,
/// `/` takes the reciprocal. The result keeps the operand's width.
fn unary_step(op: ArithmeticOp, value: &Cell) -> Result<CellRef, Error> {
    let mut num = value.as_numeral()?;
    match op {
        ArithmeticOp::Add | ArithmeticOp::Mul => {}
        ArithmeticOp::Sub => num = -num,
        ArithmeticOp::Div => {
            if num == 0.0 {
                return Err(Error::DivideByZero);
            }
            num = 1.0 / num;
        }
    }

    if value.is_double() {
        Ok(Cell::double(num))
    } else {
        Ok(Cell::int(num as i64))
    }
}

/// One pairwise fold step, computed in double precision. If either operand
/// is a double the result is a double; otherwise it is the integer result
/// truncated toward zero.
fn fold_step(op: ArithmeticOp, lhs: &Cell, rhs: &Cell) -> Result<CellRef, Error> {
    let a = lhs.as_numeral()?;
    let b = rhs.as_numeral()?;

    let result = match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div => {
            if b == 0.0 {
                return Err(Error::DivideByZero);
            }
            a / b
        }
    };

    if lhs.is_double() || rhs.is_double() {
        Ok(Cell::double(result))
    } else {
        Ok(Cell::int(result as i64))
    }
}

/// Render a procedure body for arity diagnostics.
fn render_body(body: &[CellRef]) -> String {
    let parts: Vec<String> = body
        .iter()
        .map(|expr| {
            expr.sexpr()
                .unwrap_or_else(|_| "#<malformed list>".to_owned())
        })
        .collect();
    format!("({})", parts.join(" "))
}
