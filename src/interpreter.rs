//! Tree-walking evaluator.
//!
//! Runtime failures are values of the object language (`Value::Error`), not
//! host errors: every dispatch arm checks its operands and propagates the
//! first error it sees without evaluating the rest of the path. `return` is
//! modeled the same way, as a `Value::Return` sentinel that bubbles through
//! blocks until the nearest function boundary unwraps it.

pub mod builtins;
pub mod environment;
pub mod sort;
pub mod value;

use std::collections::HashMap;
use std::rc::Rc;

use crate::parser::ast::{Block, Expression, InfixOp, PrefixOp, Program, Statement};
use environment::{Env, Environment};
use value::{DictPair, FunctionValue, Value};

/// Evaluates a whole program. `None` means the final statement produced no
/// value (a binding or a loop); a top-level `return` unwraps to its payload.
pub fn eval_program(program: &Program, env: &Env) -> Option<Value> {
    let mut result = None;
    for statement in &program.statements {
        match eval_statement(statement, env) {
            Some(Value::Return(value)) => return Some(*value),
            Some(error @ Value::Error(_)) => return Some(error),
            other => result = other,
        }
    }
    result
}

fn eval_statement(statement: &Statement, env: &Env) -> Option<Value> {
    match statement {
        Statement::Let { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return Some(value);
            }
            env.borrow_mut().set(name, value);
            None
        }
        Statement::Return(value) => {
            let value = match value {
                Some(expr) => eval_expression(expr, env),
                None => Value::Null,
            };
            if value.is_error() {
                return Some(value);
            }
            Some(Value::Return(Box::new(value)))
        }
        Statement::Function { name, params, body } => {
            let function = FunctionValue {
                name: name.clone(),
                params: params.clone(),
                body: body.clone(),
                env: env.clone(),
            };
            env.borrow_mut().set(name, Value::Function(Rc::new(function)));
            None
        }
        Statement::For {
            iterator,
            iterable,
            body,
        } => eval_for_loop(iterator, iterable, body, env),
        Statement::While { condition, body } => eval_while_loop(condition, body, env),
        Statement::Expr(expr) => Some(eval_expression(expr, env)),
    }
}

fn eval_block(block: &Block, env: &Env) -> Option<Value> {
    let mut result = None;
    for statement in &block.statements {
        let value = eval_statement(statement, env);
        if matches!(value, Some(Value::Return(_)) | Some(Value::Error(_))) {
            return value;
        }
        result = value;
    }
    result
}

fn eval_for_loop(
    iterator: &str,
    iterable: &Expression,
    body: &Block,
    env: &Env,
) -> Option<Value> {
    let iterable = eval_expression(iterable, env);
    if iterable.is_error() {
        return Some(iterable);
    }
    // Snapshot the elements so the body may mutate the list freely.
    let elements = match &iterable {
        Value::List(elements) => elements.borrow().clone(),
        other => {
            return Some(Value::Error(format!(
                "for loop iterable must be LIST, got {}",
                other.type_name()
            )));
        }
    };
    for element in elements {
        env.borrow_mut().set(iterator, element);
        let value = eval_block(body, env);
        if matches!(value, Some(Value::Return(_)) | Some(Value::Error(_))) {
            return value;
        }
    }
    None
}

fn eval_while_loop(condition: &Expression, body: &Block, env: &Env) -> Option<Value> {
    loop {
        let outcome = eval_expression(condition, env);
        if outcome.is_error() {
            return Some(outcome);
        }
        if !outcome.is_truthy() {
            return None;
        }

        let value = eval_block(body, env);
        if matches!(value, Some(Value::Return(_)) | Some(Value::Error(_))) {
            return value;
        }
    }
}

fn eval_expression(expr: &Expression, env: &Env) -> Value {
    match expr {
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Integer(value) => Value::Integer(*value),
        Expression::Float(value) => Value::Float(*value),
        Expression::Boolean(value) => Value::Boolean(*value),
        Expression::Str(value) => Value::Str(value.clone()),
        Expression::List(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Value::list(elements),
            Err(error) => error,
        },
        Expression::Dict(pairs) => eval_dict_literal(pairs, env),
        Expression::Prefix { op, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix(*op, right)
        }
        Expression::Infix { left, op, right } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix(*op, left, right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_block(consequence, env).unwrap_or(Value::Null)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env).unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        }
        Expression::Call { callee, args } => {
            let callee = eval_expression(callee, env);
            if callee.is_error() {
                return callee;
            }
            let args = match eval_expressions(args, env) {
                Ok(args) => args,
                Err(error) => return error,
            };
            apply_function(callee, args)
        }
        Expression::MethodCall {
            object,
            method,
            args,
        } => {
            let object = eval_expression(object, env);
            if object.is_error() {
                return object;
            }
            let args = match eval_expressions(args, env) {
                Ok(args) => args,
                Err(error) => return error,
            };
            apply_method(object, method, args)
        }
        Expression::Index { object, start, end } => {
            let object = eval_expression(object, env);
            if object.is_error() {
                return object;
            }
            let start = eval_expression(start, env);
            if start.is_error() {
                return start;
            }
            let end = match end {
                Some(end) => {
                    let end = eval_expression(end, env);
                    if end.is_error() {
                        return end;
                    }
                    Some(end)
                }
                None => None,
            };
            eval_index(object, start, end)
        }
        Expression::IndexAssign {
            object,
            start,
            end: _,
            value,
        } => {
            let object = eval_expression(object, env);
            if object.is_error() {
                return object;
            }
            let index = eval_expression(start, env);
            if index.is_error() {
                return index;
            }
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            eval_index_assign(object, index, value)
        }
        Expression::In { left, right } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_in(left, right)
        }
    }
}

fn eval_identifier(name: &str, env: &Env) -> Value {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }
    if let Some(builtin) = builtins::lookup(name) {
        return builtin;
    }
    Value::Error(format!("identifier not found: {name}"))
}

/// Left-to-right evaluation, stopping at the first error.
fn eval_expressions(exprs: &[Expression], env: &Env) -> Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let value = eval_expression(expr, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_dict_literal(pairs: &[(Expression, Expression)], env: &Env) -> Value {
    let mut entries = HashMap::new();
    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env);
        if key.is_error() {
            return key;
        }
        let Some(hash) = key.hash_key() else {
            return Value::Error(format!("unusable as hash key: {}", key.type_name()));
        };

        let value = eval_expression(value_expr, env);
        if value.is_error() {
            return value;
        }
        entries.insert(hash, DictPair { key, value });
    }
    Value::dict(entries)
}

fn eval_prefix(op: PrefixOp, right: Value) -> Value {
    match op {
        PrefixOp::Bang => Value::Boolean(!right.is_truthy()),
        PrefixOp::Minus => match right {
            Value::Integer(value) => Value::Integer(value.wrapping_neg()),
            Value::Float(value) => Value::Float(-value),
            other => Value::Error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix(op: InfixOp, left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Integer(l), Value::Integer(r)) => eval_integer_infix(op, *l, *r),
        (Value::Float(l), Value::Float(r)) => eval_float_infix(op, *l, *r),
        (Value::Float(l), Value::Integer(r)) => eval_float_infix(op, *l, *r as f64),
        (Value::Integer(l), Value::Float(r)) => eval_float_infix(op, *l as f64, *r),
        (Value::Str(l), Value::Str(r)) => eval_string_infix(op, l, r),
        _ => match op {
            InfixOp::Eq => Value::Boolean(identity_eq(&left, &right)),
            InfixOp::NotEq => Value::Boolean(!identity_eq(&left, &right)),
            _ if left.type_name() != right.type_name() => Value::Error(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                op.as_str(),
                right.type_name()
            )),
            _ => Value::Error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                op.as_str(),
                right.type_name()
            )),
        },
    }
}

fn eval_integer_infix(op: InfixOp, left: i64, right: i64) -> Value {
    match op {
        InfixOp::Plus => Value::Integer(left.wrapping_add(right)),
        InfixOp::Minus => Value::Integer(left.wrapping_sub(right)),
        InfixOp::Asterisk => Value::Integer(left.wrapping_mul(right)),
        InfixOp::Slash => {
            if right == 0 {
                Value::Error("division by zero".to_string())
            } else {
                Value::Integer(left.wrapping_div(right))
            }
        }
        InfixOp::Lt => Value::Boolean(left < right),
        InfixOp::Gt => Value::Boolean(left > right),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
    }
}

fn eval_float_infix(op: InfixOp, left: f64, right: f64) -> Value {
    match op {
        InfixOp::Plus => Value::Float(left + right),
        InfixOp::Minus => Value::Float(left - right),
        InfixOp::Asterisk => Value::Float(left * right),
        InfixOp::Slash => Value::Float(left / right),
        InfixOp::Lt => Value::Boolean(left < right),
        InfixOp::Gt => Value::Boolean(left > right),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
    }
}

fn eval_string_infix(op: InfixOp, left: &str, right: &str) -> Value {
    match op {
        InfixOp::Plus => Value::Str(format!("{left}{right}")),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
        _ => Value::Error(format!(
            "unknown operator: STRING {} STRING",
            op.as_str()
        )),
    }
}

/// `==`/`!=` between non-numeric, non-string operands: value identity for the
/// boolean/null singletons, reference identity for containers and functions.
fn identity_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Boolean(l), Value::Boolean(r)) => l == r,
        (Value::Null, Value::Null) => true,
        (Value::List(l), Value::List(r)) => Rc::ptr_eq(l, r),
        (Value::Dict(l), Value::Dict(r)) => Rc::ptr_eq(l, r),
        (Value::Set(l), Value::Set(r)) => Rc::ptr_eq(l, r),
        (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}

fn apply_function(callee: Value, args: Vec<Value>) -> Value {
    match callee {
        Value::Function(function) => {
            if args.len() != function.params.len() {
                return Value::Error(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    function.params.len()
                ));
            }

            let call_env = Environment::new_enclosed(function.env.clone());
            for (param, value) in function.params.iter().zip(args) {
                call_env.borrow_mut().set(param, value);
            }

            match eval_block(&function.body, &call_env) {
                Some(Value::Return(value)) => *value,
                Some(value) => value,
                None => Value::Null,
            }
        }
        Value::Builtin(builtin) => (builtin.func)(args),
        other => Value::Error(format!("not a function: {}", other.type_name())),
    }
}

fn apply_method(object: Value, method: &str, args: Vec<Value>) -> Value {
    let resolved = match &object {
        Value::List(_) => builtins::list_method(method),
        Value::Str(_) => builtins::string_method(method),
        Value::Dict(_) => builtins::dict_method(method),
        Value::Set(_) => builtins::set_method(method),
        other => return Value::Error(format!("not a function: {}", other.type_name())),
    };

    match resolved {
        Some(func) => func(object, args),
        None => Value::Error(format!("not a function: {method}")),
    }
}

fn eval_index(object: Value, index: Value, end: Option<Value>) -> Value {
    match (&object, &index) {
        (Value::List(elements), Value::Integer(idx)) => match end {
            Some(end) => eval_list_slice(elements, *idx, end),
            None => eval_list_index(elements, *idx),
        },
        (Value::Dict(pairs), _) => {
            let Some(hash) = index.hash_key() else {
                return Value::Error(format!("unusable as hash key: {}", index.type_name()));
            };
            match pairs.borrow().get(&hash) {
                Some(pair) => pair.value.clone(),
                None => Value::Null,
            }
        }
        _ => Value::Error(format!(
            "index operator not supported: {}",
            object.type_name()
        )),
    }
}

fn eval_list_index(elements: &std::cell::RefCell<Vec<Value>>, index: i64) -> Value {
    let elements = elements.borrow();
    let len = elements.len() as i64;

    // Negative indices count from the end; anything out of range reads null.
    let index = if index < 0 { len + index } else { index };
    if index < 0 || index >= len {
        return Value::Null;
    }
    elements[index as usize].clone()
}

fn eval_list_slice(elements: &std::cell::RefCell<Vec<Value>>, start: i64, end: Value) -> Value {
    let Value::Integer(end) = end else {
        return Value::Error(format!(
            "slice indices must be INTEGER, got {}",
            end.type_name()
        ));
    };

    let elements = elements.borrow();
    let len = elements.len() as i64;
    let start = if start < 0 { len + start } else { start };
    let end = if end < 0 { len + end } else { end };

    if end <= start {
        return Value::Error("Starting index must be before ending index".to_string());
    }
    if start < 0 || end > len {
        return Value::Error("slice index out of range".to_string());
    }

    Value::list(elements[start as usize..end as usize].to_vec())
}

fn eval_index_assign(object: Value, index: Value, value: Value) -> Value {
    match (&object, &index) {
        (Value::List(elements), Value::Integer(idx)) => {
            {
                let mut elements = elements.borrow_mut();
                let len = elements.len() as i64;
                let idx = if *idx < 0 { len + idx } else { *idx };
                // Out-of-range writes are dropped silently; the list never
                // grows.
                if idx < 0 || idx >= len {
                    return Value::Null;
                }
                elements[idx as usize] = value;
            }
            object.clone()
        }
        (Value::Dict(pairs), _) => {
            let Some(hash) = index.hash_key() else {
                return Value::Error(format!("unusable as dict key: {}", index.type_name()));
            };
            pairs.borrow_mut().insert(
                hash,
                DictPair {
                    key: index.clone(),
                    value,
                },
            );
            object.clone()
        }
        _ => Value::Error(format!(
            "index operator not supported: {}",
            object.type_name()
        )),
    }
}

fn eval_in(left: Value, right: Value) -> Value {
    match &right {
        Value::List(elements) => {
            for element in elements.borrow().iter() {
                if element.type_name() != left.type_name() {
                    continue;
                }
                let matched = match (&left, element) {
                    (Value::Integer(l), Value::Integer(r)) => l == r,
                    (Value::Float(l), Value::Float(r)) => l == r,
                    (Value::Boolean(l), Value::Boolean(r)) => l == r,
                    (Value::Str(l), Value::Str(r)) => l == r,
                    (Value::List(l), Value::List(r)) => lists_equal_by_inspection(l, r),
                    (Value::Set(l), Value::Set(r)) => sets_equal_by_inspection(l, r),
                    _ => {
                        return Value::Error(format!(
                            "cannot search list for object of type {}",
                            left.type_name()
                        ));
                    }
                };
                if matched {
                    return Value::Boolean(true);
                }
            }
            Value::Boolean(false)
        }
        Value::Set(values) => {
            let Some(hash) = left.hash_key() else {
                return Value::Error(format!("object cannot be hashed: {}", left.type_name()));
            };
            Value::Boolean(values.borrow().contains_key(&hash))
        }
        other => Value::Error(format!(
            "cannot check if object of type {} contains an object",
            other.type_name()
        )),
    }
}

// Composite membership compares rendered forms, so 1 and 1.0 stay distinct
// even though numeric == would promote.
fn lists_equal_by_inspection(
    left: &std::cell::RefCell<Vec<Value>>,
    right: &std::cell::RefCell<Vec<Value>>,
) -> bool {
    let left = left.borrow();
    let right = right.borrow();
    left.len() == right.len()
        && left
            .iter()
            .zip(right.iter())
            .all(|(l, r)| l.inspect() == r.inspect())
}

fn sets_equal_by_inspection(
    left: &std::cell::RefCell<HashMap<value::HashKey, Value>>,
    right: &std::cell::RefCell<HashMap<value::HashKey, Value>>,
) -> bool {
    let left = left.borrow();
    let right = right.borrow();
    left.len() == right.len()
        && left.iter().all(|(hash, value)| {
            right
                .get(hash)
                .is_some_and(|other| other.inspect() == value.inspect())
        })
}
