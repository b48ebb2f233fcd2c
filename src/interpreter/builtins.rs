use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use rand::Rng;

use crate::ast::Expression;

use super::error::RuntimeError;
use super::value::Value;
use super::Interpreter;

/// Built-in operations, recognised by name when a call's callee is an
/// identifier. They are not first-class values: a bare reference to one of
/// these names is a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Builtin {
    Print,
    Println,
    Len,
    Push,
    Pop,
    Insert,
    Remove,
    Sort,
    Range,
    Abs,
    Ceil,
    Floor,
    Round,
    Sqrt,
    Rnd,
    ParseNum,
    ToString,
    Lower,
    Upper,
    Split,
    Join,
    Replace,
    Read,
    Stacktrace,
}

impl Builtin {
    pub(super) fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "print" => Self::Print,
            "println" => Self::Println,
            "len" => Self::Len,
            "push" => Self::Push,
            "pop" => Self::Pop,
            "insert" => Self::Insert,
            "remove" => Self::Remove,
            "sort" => Self::Sort,
            "range" => Self::Range,
            "abs" => Self::Abs,
            "ceil" => Self::Ceil,
            "floor" => Self::Floor,
            "round" => Self::Round,
            "sqrt" => Self::Sqrt,
            "rnd" => Self::Rnd,
            "parse_num" => Self::ParseNum,
            "to_string" => Self::ToString,
            "lower" => Self::Lower,
            "upper" => Self::Upper,
            "split" => Self::Split,
            "join" => Self::Join,
            "replace" => Self::Replace,
            "read" => Self::Read,
            "stacktrace" => Self::Stacktrace,
            _ => return None,
        };
        Some(builtin)
    }
}

type BuiltinResult = Result<Value, RuntimeError>;

impl Interpreter<'_> {
    pub(super) fn call_builtin(&mut self, builtin: Builtin, args: &[Expression]) -> BuiltinResult {
        match builtin {
            Builtin::Print => self.builtin_print(args, false),
            Builtin::Println => self.builtin_print(args, true),
            Builtin::Len => self.builtin_len(args),
            Builtin::Push => self.builtin_push(args),
            Builtin::Pop => self.builtin_pop(args),
            Builtin::Insert => self.builtin_insert(args),
            Builtin::Remove => self.builtin_remove(args),
            Builtin::Sort => self.builtin_sort(args),
            Builtin::Range => self.builtin_range(args),
            Builtin::Abs => self.numeric_builtin("abs", args, f64::abs),
            Builtin::Ceil => self.numeric_builtin("ceil", args, f64::ceil),
            Builtin::Floor => self.numeric_builtin("floor", args, f64::floor),
            Builtin::Round => self.numeric_builtin("round", args, f64::round),
            Builtin::Sqrt => self.builtin_sqrt(args),
            Builtin::Rnd => self.builtin_rnd(args),
            Builtin::ParseNum => self.builtin_parse_num(args),
            Builtin::ToString => self.builtin_to_string(args),
            Builtin::Lower => self.builtin_lower(args),
            Builtin::Upper => self.builtin_upper(args),
            Builtin::Split => self.builtin_split(args),
            Builtin::Join => self.builtin_join(args),
            Builtin::Replace => self.builtin_replace(args),
            Builtin::Read => self.builtin_read(args),
            Builtin::Stacktrace => self.builtin_stacktrace(args),
        }
    }

    // Arguments are evaluated and written one by one, so side effects of a
    // later argument interleave with the output of earlier ones.
    fn builtin_print(&mut self, args: &[Expression], newline: bool) -> BuiltinResult {
        for arg in args {
            let value = self.eval_expression(arg)?;
            write!(self.output, "{}", value.display())?;
        }
        if newline {
            writeln!(self.output)?;
        }
        Ok(Value::Nil)
    }

    fn builtin_len(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("len", args, 1, "exactly 1 argument")?;
        match self.eval_expression(&args[0])? {
            Value::Str(text) => Ok(Value::Number(text.len() as f64)),
            Value::List(values) => Ok(Value::Number(values.borrow().len() as f64)),
            other => Err(argument_type("len", "argument", "a string or list", &other)),
        }
    }

    fn builtin_push(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("push", args, 2, "2 arguments: list and value")?;
        let item = self.eval_expression(&args[1])?;
        let list = self.list_variable("push", &args[0])?;
        list.borrow_mut().push(item);
        Ok(Value::Nil)
    }

    fn builtin_pop(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("pop", args, 1, "1 argument: list")?;
        let list = self.list_variable("pop", &args[0])?;
        let popped = list.borrow_mut().pop();
        popped.ok_or(RuntimeError::PopFromEmptyList)
    }

    fn builtin_insert(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("insert", args, 3, "3 arguments: list, index, value")?;
        let index = self.eval_expression(&args[1])?;
        let item = self.eval_expression(&args[2])?;
        let list = self.list_variable("insert", &args[0])?;

        let mut values = list.borrow_mut();
        let index = list_index("insert", "second argument (index)", &index)?;
        if index < 0 || index as usize > values.len() {
            return Err(RuntimeError::ListIndexOutOfBounds {
                name: "insert",
                index,
                len: values.len(),
            });
        }
        values.insert(index as usize, item);
        Ok(Value::Nil)
    }

    fn builtin_remove(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("remove", args, 2, "2 arguments: list, index")?;
        let index = self.eval_expression(&args[1])?;
        let list = self.list_variable("remove", &args[0])?;

        let mut values = list.borrow_mut();
        let index = list_index("remove", "second argument (index)", &index)?;
        if index < 0 || index as usize >= values.len() {
            return Err(RuntimeError::ListIndexOutOfBounds {
                name: "remove",
                index,
                len: values.len(),
            });
        }
        Ok(values.remove(index as usize))
    }

    fn builtin_sort(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("sort", args, 1, "1 argument: list")?;
        let list = self.list_variable("sort", &args[0])?;
        let mut values = list.borrow_mut();

        // The first element selects the ordering; every element must share
        // its type.
        match values.first() {
            None => Ok(Value::Nil),
            Some(Value::Number(_)) => {
                if values.iter().any(|value| !matches!(value, Value::Number(_))) {
                    return Err(RuntimeError::MixedSortTypes { expected: "numbers" });
                }
                values.sort_by(|a, b| match (a, b) {
                    (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
                    _ => std::cmp::Ordering::Equal,
                });
                Ok(Value::Nil)
            }
            Some(Value::Str(_)) => {
                if values.iter().any(|value| !matches!(value, Value::Str(_))) {
                    return Err(RuntimeError::MixedSortTypes { expected: "strings" });
                }
                values.sort_by(|a, b| match (a, b) {
                    (Value::Str(x), Value::Str(y)) => x.cmp(y),
                    _ => std::cmp::Ordering::Equal,
                });
                Ok(Value::Nil)
            }
            Some(other) => Err(RuntimeError::UnsortableElementType {
                type_name: other.type_name(),
            }),
        }
    }

    fn builtin_range(&mut self, args: &[Expression]) -> BuiltinResult {
        if args.is_empty() || args.len() > 3 {
            return Err(RuntimeError::BuiltinArity {
                name: "range",
                expected: "1, 2, or 3 arguments",
            });
        }

        let mut bounds = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.eval_expression(arg)?;
            bounds.push(number_argument("range", "argument", &value)?);
        }
        let (start, stop, step) = match bounds[..] {
            [stop] => (0.0, stop, 1.0),
            [start, stop] => (start, stop, 1.0),
            [start, stop, step] => (start, stop, step),
            _ => unreachable!("argument count checked above"),
        };
        if step == 0.0 {
            return Err(RuntimeError::RangeStepZero);
        }

        let mut values = Vec::new();
        let mut i = start;
        if step > 0.0 {
            while i < stop {
                values.push(Value::Number(i));
                i += step;
            }
        } else {
            while i > stop {
                values.push(Value::Number(i));
                i += step;
            }
        }
        Ok(Value::list(values))
    }

    fn numeric_builtin(
        &mut self,
        name: &'static str,
        args: &[Expression],
        apply: fn(f64) -> f64,
    ) -> BuiltinResult {
        expect_arity(name, args, 1, "1 argument")?;
        let value = self.eval_expression(&args[0])?;
        let number = number_argument(name, "argument", &value)?;
        Ok(Value::Number(apply(number)))
    }

    fn builtin_sqrt(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("sqrt", args, 1, "1 argument")?;
        let value = self.eval_expression(&args[0])?;
        let number = number_argument("sqrt", "argument", &value)?;
        if number < 0.0 {
            return Err(RuntimeError::SqrtOfNegative);
        }
        Ok(Value::Number(number.sqrt()))
    }

    fn builtin_rnd(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("rnd", args, 0, "0 arguments")?;
        Ok(Value::Number(self.rng.gen::<f64>()))
    }

    fn builtin_parse_num(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("parse_num", args, 1, "1 argument")?;
        let value = self.eval_expression(&args[0])?;
        let text = string_argument("parse_num", "argument", &value)?;
        match text.parse::<f64>() {
            Ok(number) => Ok(Value::Number(number)),
            Err(_) => Ok(Value::Nil),
        }
    }

    fn builtin_to_string(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("to_string", args, 1, "1 argument")?;
        let value = self.eval_expression(&args[0])?;
        Ok(Value::Str(value.display()))
    }

    fn builtin_lower(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("lower", args, 1, "1 argument")?;
        let value = self.eval_expression(&args[0])?;
        let text = string_argument("lower", "argument", &value)?;
        Ok(Value::Str(text.to_ascii_lowercase()))
    }

    fn builtin_upper(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("upper", args, 1, "1 argument")?;
        let value = self.eval_expression(&args[0])?;
        let text = string_argument("upper", "argument", &value)?;
        Ok(Value::Str(text.to_ascii_uppercase()))
    }

    fn builtin_split(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("split", args, 2, "2 arguments: string and delimiter")?;
        let value = self.eval_expression(&args[0])?;
        let delimiter = self.eval_expression(&args[1])?;
        let text = string_argument("split", "first argument", &value)?;
        let delimiter = string_argument("split", "second argument (delimiter)", &delimiter)?;

        let parts: Vec<Value> = if delimiter.is_empty() {
            text.bytes()
                .map(|byte| Value::Str((byte as char).to_string()))
                .collect()
        } else {
            text.split(delimiter.as_str())
                .map(|part| Value::Str(part.to_string()))
                .collect()
        };
        Ok(Value::list(parts))
    }

    fn builtin_join(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("join", args, 2, "2 arguments: list of strings and separator")?;
        let list = self.eval_expression(&args[0])?;
        let separator = self.eval_expression(&args[1])?;
        let Value::List(values) = &list else {
            return Err(argument_type("join", "first argument", "a list of strings", &list));
        };
        let separator = string_argument("join", "second argument (separator)", &separator)?;

        let mut parts = Vec::with_capacity(values.borrow().len());
        for value in values.borrow().iter() {
            let Value::Str(text) = value else {
                return Err(RuntimeError::JoinNonStringElement {
                    type_name: value.type_name(),
                });
            };
            parts.push(text.clone());
        }
        Ok(Value::Str(parts.join(&separator)))
    }

    fn builtin_replace(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("replace", args, 3, "3 arguments: string, old substring, new substring")?;
        let value = self.eval_expression(&args[0])?;
        let old = self.eval_expression(&args[1])?;
        let new = self.eval_expression(&args[2])?;
        let text = string_argument("replace", "first argument", &value)?;
        let old = string_argument("replace", "second argument", &old)?;
        let new = string_argument("replace", "third argument", &new)?;

        if old.is_empty() {
            return Err(RuntimeError::ReplaceEmptyPattern);
        }
        Ok(Value::Str(text.replace(&old, &new)))
    }

    fn builtin_read(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("read", args, 0, "0 arguments")?;
        Ok(Value::Str(String::new()))
    }

    fn builtin_stacktrace(&mut self, args: &[Expression]) -> BuiltinResult {
        expect_arity("stacktrace", args, 0, "0 arguments")?;
        Ok(Value::list(Vec::new()))
    }

    /// Resolves the target of a mutating list built-in. The argument must be
    /// a bare identifier bound to a list; arbitrary expressions are rejected.
    fn list_variable(
        &self,
        name: &'static str,
        expr: &Expression,
    ) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
        let Expression::Identifier(variable) = expr else {
            return Err(RuntimeError::ListVariableRequired { name });
        };
        match self.globals.get(variable) {
            Some(Value::List(values)) => Ok(Rc::clone(values)),
            _ => Err(RuntimeError::ListVariableNotFound {
                name,
                variable: variable.clone(),
            }),
        }
    }
}

fn expect_arity(
    name: &'static str,
    args: &[Expression],
    count: usize,
    expected: &'static str,
) -> Result<(), RuntimeError> {
    if args.len() != count {
        return Err(RuntimeError::BuiltinArity { name, expected });
    }
    Ok(())
}

fn number_argument(
    name: &'static str,
    argument: &'static str,
    value: &Value,
) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(number) => Ok(*number),
        other => Err(argument_type(name, argument, "a number", other)),
    }
}

fn string_argument(
    name: &'static str,
    argument: &'static str,
    value: &Value,
) -> Result<String, RuntimeError> {
    match value {
        Value::Str(text) => Ok(text.clone()),
        other => Err(argument_type(name, argument, "a string", other)),
    }
}

fn argument_type(
    name: &'static str,
    argument: &'static str,
    expected: &'static str,
    got: &Value,
) -> RuntimeError {
    RuntimeError::BuiltinArgumentType {
        name,
        argument,
        expected,
        got: got.type_name(),
    }
}

fn list_index(
    name: &'static str,
    argument: &'static str,
    value: &Value,
) -> Result<i64, RuntimeError> {
    let number = number_argument(name, argument, value)?;
    if !number.is_finite() || number.trunc() != number {
        return Err(RuntimeError::NonIntegerListIndex {
            name,
            value: number,
        });
    }
    Ok(number as i64)
}
