use std::rc::Rc;

use crate::ast::{BinaryOperator, Block, Expression, Statement, UnaryOperator};

use super::builtins::Builtin;
use super::error::RuntimeError;
use super::value::Value;
use super::Interpreter;

/// Control-flow signal threaded through statement execution.
///
/// `Return` unwinds to the enclosing call boundary; `Break` and `Continue`
/// unwind to the nearest enclosing loop of the same function.
pub(super) enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub(super) type ExecResult = Result<Flow, RuntimeError>;
pub(super) type EvalResult = Result<Value, RuntimeError>;

impl Interpreter<'_> {
    pub(super) fn exec_block(&mut self, block: &Block) -> ExecResult {
        for statement in &block.statements {
            match self.exec_statement(statement)? {
                Flow::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_statement(&mut self, statement: &Statement) -> ExecResult {
        match statement {
            Statement::Expr(expr) => {
                self.eval_expression(expr)?;
                Ok(Flow::Normal)
            }
            Statement::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
            Statement::Break => Ok(Flow::Break),
            Statement::Continue => Ok(Flow::Continue),
            Statement::If {
                condition,
                then_block,
                else_ifs,
                else_block,
            } => {
                if self.eval_expression(condition)?.is_truthy() {
                    return self.exec_block(then_block);
                }
                for (else_if_condition, block) in else_ifs {
                    if self.eval_expression(else_if_condition)?.is_truthy() {
                        return self.exec_block(block);
                    }
                }
                match else_block {
                    Some(block) => self.exec_block(block),
                    None => Ok(Flow::Normal),
                }
            }
            Statement::While { condition, body } => {
                while self.eval_expression(condition)?.is_truthy() {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::For {
                variable,
                iterable,
                body,
            } => {
                let iterable = self.eval_expression(iterable)?;
                // The element sequence is fixed before the first iteration;
                // mutating the iterated list inside the body does not change
                // what the loop visits.
                let items: Vec<Value> = match &iterable {
                    Value::List(values) => values.borrow().clone(),
                    Value::Str(text) => text
                        .bytes()
                        .map(|byte| Value::Str((byte as char).to_string()))
                        .collect(),
                    other => {
                        return Err(RuntimeError::InvalidIterable {
                            type_name: other.type_name(),
                        });
                    }
                };
                for item in items {
                    self.globals.insert(variable.clone(), item);
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    pub(super) fn eval_expression(&mut self, expr: &Expression) -> EvalResult {
        match expr {
            Expression::Number(value) => Ok(Value::Number(*value)),
            Expression::Str(value) => Ok(Value::Str(value.clone())),
            Expression::Nil => Ok(Value::Nil),
            Expression::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element)?);
                }
                Ok(Value::list(values))
            }
            Expression::Identifier(name) => {
                if Builtin::from_name(name).is_some() {
                    return Err(RuntimeError::BareBuiltinReference { name: name.clone() });
                }
                self.globals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })
            }
            Expression::Function(literal) => Ok(Value::Function(Rc::clone(literal))),
            Expression::Unary { op, operand } => {
                let operand = self.eval_expression(operand)?;
                apply_unary(*op, &operand)
            }
            Expression::Binary { op, left, right } => {
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                apply_binary(*op, &left, &right)
            }
            Expression::Call { callee, args } => self.eval_call(callee, args),
            Expression::Index { target, index } => {
                let target = self.eval_expression(target)?;
                let index = self.eval_expression(index)?;
                index_value(&target, &index)
            }
            Expression::Slice {
                target,
                start,
                end,
                step,
            } => self.eval_slice(target, start.as_deref(), end.as_deref(), step.as_deref()),
            Expression::Assign { name, op, value } => {
                let rhs = self.eval_expression(value)?;
                match op.binary() {
                    None => {
                        self.globals.insert(name.clone(), rhs.clone());
                        Ok(rhs)
                    }
                    Some(binary_op) => {
                        let current = self.globals.get(name).cloned().ok_or_else(|| {
                            RuntimeError::UndefinedCompoundTarget { name: name.clone() }
                        })?;
                        let result = apply_binary(binary_op, &current, &rhs)?;
                        self.globals.insert(name.clone(), result.clone());
                        Ok(result)
                    }
                }
            }
        }
    }

    fn eval_call(&mut self, callee: &Expression, args: &[Expression]) -> EvalResult {
        if let Expression::Identifier(name) = callee {
            if let Some(builtin) = Builtin::from_name(name) {
                return self.call_builtin(builtin, args);
            }
        }

        let callee = self.eval_expression(callee)?;
        let function = match &callee {
            Value::Function(function) => Rc::clone(function),
            other => {
                return Err(RuntimeError::NotCallable {
                    type_name: other.type_name(),
                });
            }
        };
        if args.len() != function.params.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: function.params.len(),
                found: args.len(),
            });
        }

        // The environment snapshot is taken before argument evaluation, so
        // assignments performed while evaluating arguments are also rolled
        // back when the call exits.
        let snapshot = self.globals.clone();
        let outcome = (|| {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(self.eval_expression(arg)?);
            }
            for (param, value) in function.params.iter().zip(evaluated) {
                self.globals.insert(param.clone(), value);
            }
            self.exec_block(&function.body)
        })();
        self.globals = snapshot;

        match outcome? {
            Flow::Normal => Ok(Value::Nil),
            Flow::Return(value) => Ok(value),
            Flow::Break => Err(RuntimeError::BreakOutsideLoop),
            Flow::Continue => Err(RuntimeError::ContinueOutsideLoop),
        }
    }

    fn eval_slice(
        &mut self,
        target: &Expression,
        start: Option<&Expression>,
        end: Option<&Expression>,
        step: Option<&Expression>,
    ) -> EvalResult {
        let target = self.eval_expression(target)?;
        if !matches!(target, Value::Str(_) | Value::List(_)) {
            return Err(RuntimeError::NotSliceable {
                type_name: target.type_name(),
            });
        }

        let start = self.slice_bound(start, "start index")?;
        let end = self.slice_bound(end, "end index")?;
        let step = match self.slice_bound(step, "step")? {
            None => 1,
            Some(0) => return Err(RuntimeError::SliceStepZero),
            Some(step) => step,
        };

        match &target {
            Value::Str(text) => {
                let bytes = text.as_bytes();
                let result: String = slice_positions(bytes.len(), start, end, step)
                    .into_iter()
                    .map(|i| bytes[i] as char)
                    .collect();
                Ok(Value::Str(result))
            }
            Value::List(values) => {
                let values = values.borrow();
                let result: Vec<Value> = slice_positions(values.len(), start, end, step)
                    .into_iter()
                    .map(|i| values[i].clone())
                    .collect();
                Ok(Value::list(result))
            }
            _ => unreachable!("slice target checked above"),
        }
    }

    fn slice_bound(
        &mut self,
        expr: Option<&Expression>,
        bound: &'static str,
    ) -> Result<Option<i64>, RuntimeError> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        match self.eval_expression(expr)? {
            Value::Number(value) => Ok(Some(value as i64)),
            other => Err(RuntimeError::SliceBoundNotNumber {
                bound,
                type_name: other.type_name(),
            }),
        }
    }
}

/// Positions visited by a slice over a sequence of `len` elements.
///
/// Defaults are `0` and `len` regardless of step sign; negative bounds are
/// offset by `len` once, then clamped to `[0, len]`. A negative step only
/// emits positions that are in range.
fn slice_positions(len: usize, start: Option<i64>, end: Option<i64>, step: i64) -> Vec<usize> {
    let len = len as i64;
    let mut start = start.unwrap_or(0);
    let mut end = end.unwrap_or(len);
    if start < 0 {
        start += len;
    }
    if end < 0 {
        end += len;
    }
    start = start.clamp(0, len);
    end = end.clamp(0, len);

    let mut positions = Vec::new();
    let mut i = start;
    if step > 0 {
        while i < end {
            positions.push(i as usize);
            i += step;
        }
    } else {
        while i > end {
            if i >= 0 && i < len {
                positions.push(i as usize);
            }
            i += step;
        }
    }
    positions
}

fn index_value(target: &Value, index: &Value) -> EvalResult {
    let Value::Number(raw) = index else {
        return Err(RuntimeError::IndexNotNumber {
            type_name: index.type_name(),
        });
    };
    if !raw.is_finite() || raw.trunc() != *raw {
        return Err(RuntimeError::NonIntegerIndex { value: *raw });
    }
    let requested = *raw as i64;

    match target {
        Value::Str(text) => {
            let len = text.len() as i64;
            let index = if requested < 0 { requested + len } else { requested };
            if index < 0 || index >= len {
                return Err(RuntimeError::IndexOutOfBounds {
                    type_name: "String",
                    index,
                    len: text.len(),
                });
            }
            Ok(Value::Str((text.as_bytes()[index as usize] as char).to_string()))
        }
        Value::List(values) => {
            let values = values.borrow();
            let len = values.len() as i64;
            let index = if requested < 0 { requested + len } else { requested };
            if index < 0 || index >= len {
                return Err(RuntimeError::IndexOutOfBounds {
                    type_name: "List",
                    index,
                    len: values.len(),
                });
            }
            Ok(values[index as usize].clone())
        }
        other => Err(RuntimeError::NotIndexable {
            type_name: other.type_name(),
        }),
    }
}

fn apply_unary(op: UnaryOperator, operand: &Value) -> EvalResult {
    match op {
        UnaryOperator::Not => Ok(bool_value(!operand.is_truthy())),
        UnaryOperator::Neg => match operand {
            Value::Number(value) => Ok(Value::Number(-value)),
            other => Err(RuntimeError::InvalidNegationOperand {
                type_name: other.type_name(),
            }),
        },
    }
}

/// Binary operator semantics shared by expressions and compound assignment.
pub(super) fn apply_binary(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult {
    match op {
        BinaryOperator::Add => {
            reject_nil_operand(op, left, right)?;
            match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::Str(l), Value::Str(r)) => Ok(Value::Str(format!("{l}{r}"))),
                (Value::List(l), Value::List(r)) => {
                    let mut values = l.borrow().clone();
                    values.extend(r.borrow().iter().cloned());
                    Ok(Value::list(values))
                }
                _ => Err(invalid_operands(op, left, right)),
            }
        }
        BinaryOperator::Sub => {
            reject_nil_operand(op, left, right)?;
            match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l - r)),
                // String subtraction strips the right operand as a suffix;
                // without a suffix match the left string is unchanged.
                (Value::Str(l), Value::Str(r)) => match l.strip_suffix(r.as_str()) {
                    Some(stripped) => Ok(Value::Str(stripped.to_string())),
                    None => Ok(Value::Str(l.clone())),
                },
                _ => Err(invalid_operands(op, left, right)),
            }
        }
        BinaryOperator::Mul => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l * r)),
            (Value::Str(text), Value::Number(count))
            | (Value::Number(count), Value::Str(text)) => {
                if *count < 0.0 {
                    return Err(RuntimeError::NegativeRepeat { type_name: "string" });
                }
                Ok(Value::Str(text.repeat(*count as usize)))
            }
            (Value::List(values), Value::Number(count))
            | (Value::Number(count), Value::List(values)) => {
                if *count < 0.0 {
                    return Err(RuntimeError::NegativeRepeat { type_name: "list" });
                }
                let values = values.borrow();
                let mut repeated = Vec::with_capacity(values.len() * *count as usize);
                for _ in 0..*count as usize {
                    repeated.extend(values.iter().cloned());
                }
                Ok(Value::list(repeated))
            }
            _ => Err(invalid_operands(op, left, right)),
        },
        BinaryOperator::Div | BinaryOperator::Mod | BinaryOperator::Pow => {
            reject_nil_operand(op, left, right)?;
            let (Value::Number(l), Value::Number(r)) = (left, right) else {
                return Err(invalid_operands(op, left, right));
            };
            match op {
                BinaryOperator::Div => {
                    if *r == 0.0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Ok(Value::Number(l / r))
                }
                BinaryOperator::Mod => {
                    if *r == 0.0 {
                        return Err(RuntimeError::ModuloByZero);
                    }
                    Ok(Value::Number(l % r))
                }
                _ => Ok(Value::Number(l.powf(*r))),
            }
        }
        BinaryOperator::Equal | BinaryOperator::NotEqual => {
            let negated = op == BinaryOperator::NotEqual;
            match (left, right) {
                (Value::Nil, Value::Nil) => Ok(bool_value(!negated)),
                (Value::Nil, _) | (_, Value::Nil) => Ok(bool_value(negated)),
                (Value::Number(l), Value::Number(r)) => Ok(bool_value((l == r) != negated)),
                (Value::Str(l), Value::Str(r)) => Ok(bool_value((l == r) != negated)),
                _ => Err(invalid_operands(op, left, right)),
            }
        }
        BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEqual => {
            reject_nil_operand(op, left, right)?;
            match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(bool_value(compare(op, l, r))),
                (Value::Str(l), Value::Str(r)) => Ok(bool_value(compare(op, l, r))),
                _ => Err(invalid_operands(op, left, right)),
            }
        }
        // Both operands are always evaluated; `and`/`or` do not short-circuit.
        BinaryOperator::And => Ok(bool_value(left.is_truthy() && right.is_truthy())),
        BinaryOperator::Or => Ok(bool_value(left.is_truthy() || right.is_truthy())),
    }
}

fn compare<T: PartialOrd>(op: BinaryOperator, left: &T, right: &T) -> bool {
    match op {
        BinaryOperator::Less => left < right,
        BinaryOperator::LessEqual => left <= right,
        BinaryOperator::Greater => left > right,
        BinaryOperator::GreaterEqual => left >= right,
        _ => unreachable!("compare called with a non-relational operator"),
    }
}

fn bool_value(value: bool) -> Value {
    Value::Number(if value { 1.0 } else { 0.0 })
}

fn reject_nil_operand(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<(), RuntimeError> {
    if matches!(left, Value::Nil) || matches!(right, Value::Nil) {
        return Err(RuntimeError::NilOperand { op: op.to_string() });
    }
    Ok(())
}

fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::InvalidBinaryOperands {
        op: op.to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}
