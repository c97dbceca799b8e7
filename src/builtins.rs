//! Bodies of the registered built-in functions.
//!
//! Every handler has the registry signature
//! `(interpreter, operator cell, unevaluated argument list)` and decides for
//! itself when to evaluate. Most evaluate eagerly through
//! [`single_argument`] or a slice match over the collected argument
//! expressions; `quote` never evaluates, `if` evaluates only the selected
//! branch, and `define`/`lambda`/`let` treat some positions as syntax.

use std::rc::Rc;

use crate::cell::{Cell, CellRef};
use crate::evaluator::Interpreter;
use crate::{Arity, Error};

/// Display name of an operator cell for diagnostics.
fn operator_name(operator: &Cell) -> &str {
    match operator {
        Cell::Builtin(name) => name,
        Cell::Symbol(name) => name,
        Cell::Arithmetic(op) => op.symbol(),
        _ => "#<operator>",
    }
}

/// Check for exactly one argument and return it evaluated.
fn single_argument(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let got = args.list_len()?;
    if got != 1 {
        return Err(Error::arity_in(
            Arity::Exactly(1),
            got,
            operator_name(operator),
        ));
    }
    interp.eval(args.car()?)
}

/// Predicates answer with integer truth values.
fn bool_cell(truth: bool) -> CellRef {
    Cell::int(i64::from(truth))
}

pub fn builtin_ceiling(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(Cell::int(value.as_double()?.ceil() as i64))
}

pub fn builtin_floor(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(Cell::int(value.as_double()?.floor() as i64))
}

/// Return the single argument unevaluated.
pub fn builtin_quote(
    _interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let got = args.list_len()?;
    if got != 1 {
        return Err(Error::arity_in(
            Arity::Exactly(1),
            got,
            operator_name(operator),
        ));
    }
    Ok(Rc::clone(args.car()?))
}

pub fn builtin_cons(
    interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let items = args.list_items()?;
    match items.as_slice() {
        [car_expr, cdr_expr] => {
            let head = interp.eval(car_expr)?;
            let tail = interp.eval(cdr_expr)?;
            Ok(Cell::cons(head, tail))
        }
        _ => Err(Error::arity_in(Arity::Exactly(2), items.len(), "cons")),
    }
}

pub fn builtin_car(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(Rc::clone(value.car()?))
}

pub fn builtin_cdr(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(Rc::clone(value.cdr()?))
}

pub fn builtin_intp(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(bool_cell(value.is_int()))
}

pub fn builtin_doublep(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(bool_cell(value.is_double()))
}

pub fn builtin_symbolp(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(bool_cell(value.is_symbol()))
}

pub fn builtin_nullp(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(bool_cell(value.is_nil()))
}

pub fn builtin_listp(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(bool_cell(value.is_list()))
}

/// Evaluate the condition, then only the branch it selects. A falsy
/// condition with no else-branch yields nil.
pub fn builtin_if(
    interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let items = args.list_items()?;
    match items.as_slice() {
        [condition, consequent] => {
            if interp.eval(condition)?.is_truthy() {
                interp.eval(consequent)
            } else {
                Ok(Cell::nil())
            }
        }
        [condition, consequent, alternative] => {
            if interp.eval(condition)?.is_truthy() {
                interp.eval(consequent)
            } else {
                interp.eval(alternative)
            }
        }
        _ => Err(Error::arity_in(Arity::Between(2, 3), items.len(), "if")),
    }
}

/// Bind a symbol in the current innermost frame. The name position is
/// syntax (never evaluated); the value position is evaluated.
pub fn builtin_define(
    interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let items = args.list_items()?;
    match items.as_slice() {
        [name_expr, value_expr] => {
            let name = name_expr.as_symbol()?.to_owned();
            let value = interp.eval(value_expr)?;
            interp.env_mut().define(&name, value)?;
            Ok(Cell::nil())
        }
        _ => Err(Error::arity_in(Arity::Exactly(2), items.len(), "define")),
    }
}

/// Chained comparison. With fewer than two arguments the result is truthy
/// by convention; this is the one built-in callable with no arguments at
/// all. Symbol chains test adjacent distinctness, numeral chains test
/// strict increase.
pub fn builtin_less_than(
    interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let items = args.list_items()?;
    if items.len() < 2 {
        return Ok(Cell::int(1));
    }

    let mut values = Vec::with_capacity(items.len());
    for expr in &items {
        values.push(interp.eval(expr)?);
    }

    let ordered = if values[0].is_symbol() {
        distinct_symbol_chain(&values)?
    } else {
        increasing_numeral_chain(&values)?
    };
    Ok(bool_cell(ordered))
}

/// Symbols compare as "all adjacent pairs distinct". The whole chain is
/// walked even after a failed pair so that a type error anywhere in the
/// arguments is still reported.
fn distinct_symbol_chain(values: &[CellRef]) -> Result<bool, Error> {
    let mut ordered = true;
    for pair in values.windows(2) {
        if pair[0].as_symbol()? == pair[1].as_symbol()? {
            ordered = false;
        }
    }
    Ok(ordered)
}

fn increasing_numeral_chain(values: &[CellRef]) -> Result<bool, Error> {
    let mut ordered = true;
    for pair in values.windows(2) {
        if pair[0].as_numeral()? >= pair[1].as_numeral()? {
            ordered = false;
        }
    }
    Ok(ordered)
}

pub fn builtin_not(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    Ok(bool_cell(!value.is_truthy()))
}

/// Write the rendered S-expression of the evaluated argument to stdout.
pub fn builtin_print(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    println!("{}", value.sexpr()?);
    Ok(Cell::nil())
}

/// Evaluate the argument, then evaluate the result once more.
pub fn builtin_eval(
    interp: &mut Interpreter,
    operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let value = single_argument(interp, operator, args)?;
    interp.eval(&value)
}

/// Build a procedure: the first argument is the parameter form, the rest
/// are the body sequence. Both are taken unevaluated.
pub fn builtin_lambda(
    _interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let items = args.list_items()?;
    if items.len() < 2 {
        return Err(Error::arity_in(Arity::AtLeast(2), items.len(), "lambda"));
    }
    Cell::lambda(&items[0], &items[1..])
}

/// Evaluate an applicable value and an argument list, then dispatch
/// through the apply protocol. Arguments past the second are ignored.
pub fn builtin_apply(
    interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    if args.is_nil() {
        return Err(Error::arity_in(Arity::AtLeast(2), 0, "apply"));
    }
    if args.cdr()?.is_nil() {
        return Err(Error::arity_in(Arity::AtLeast(2), 1, "apply"));
    }

    let procedure = interp.eval(args.car()?)?;
    let arguments = interp.eval(args.cdr()?.car()?)?;
    interp.apply(&procedure, &arguments)
}

/// Local bindings: `(let ((name expr) ...) body)`. A fresh frame is pushed
/// for the whole form; binding expressions evaluate inside it, so later
/// bindings see earlier ones.
pub fn builtin_let(
    interp: &mut Interpreter,
    _operator: &CellRef,
    args: &CellRef,
) -> Result<CellRef, Error> {
    let items = args.list_items()?;
    match items.as_slice() {
        [bindings, body] => interp.with_frame(|interp| {
            let mut pos = Rc::clone(bindings);
            while !pos.is_nil() {
                let binding = pos.car()?;
                let name = binding.car()?.as_symbol()?.to_owned();
                let value_expr = Rc::clone(binding.cdr()?.car()?);
                let value = interp.eval(&value_expr)?;
                interp.env_mut().define(&name, value)?;

                let next = Rc::clone(pos.cdr()?);
                pos = next;
            }
            interp.eval(body)
        }),
        _ => Err(Error::arity_in(Arity::Exactly(2), items.len(), "let")),
    }
}
