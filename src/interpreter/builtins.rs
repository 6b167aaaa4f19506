//! Global builtin functions and the per-type method tables.
//!
//! Builtins are plain function pointers resolved through fixed string-indexed
//! tables; methods receive the receiver value as their first argument.

use std::collections::HashMap;

use super::sort;
use super::value::{Builtin, BuiltinFn, MethodFn, Value};

const BUILTINS: &[(&str, BuiltinFn)] = &[
    ("print", builtin_print),
    ("len", builtin_len),
    ("range", builtin_range),
    ("min", builtin_min),
    ("max", builtin_max),
    ("abs", builtin_abs),
    ("sum", builtin_sum),
    ("str", builtin_str),
    ("reversed", builtin_reversed),
    ("round", builtin_round),
    ("sorted", builtin_sorted),
    ("list", builtin_list),
    ("dict", builtin_dict),
    ("set", builtin_set),
];

pub fn lookup(name: &str) -> Option<Value> {
    BUILTINS
        .iter()
        .copied()
        .find(|(candidate, _)| *candidate == name)
        .map(|(name, func)| Value::Builtin(Builtin { name, func }))
}

pub fn list_method(name: &str) -> Option<MethodFn> {
    match name {
        "append" => Some(list_append),
        "reverse" => Some(list_reverse),
        "copy" => Some(list_copy),
        "pop" => Some(list_pop),
        "sort" => Some(list_sort),
        _ => None,
    }
}

pub fn string_method(name: &str) -> Option<MethodFn> {
    match name {
        "join" => Some(string_join),
        "upper" => Some(string_upper),
        "lower" => Some(string_lower),
        "isupper" => Some(string_isupper),
        "islower" => Some(string_islower),
        "swapcase" => Some(string_swapcase),
        _ => None,
    }
}

pub fn dict_method(name: &str) -> Option<MethodFn> {
    match name {
        "keys" => Some(dict_keys),
        "values" => Some(dict_values),
        "items" => Some(dict_items),
        "pop" => Some(dict_pop),
        _ => None,
    }
}

pub fn set_method(name: &str) -> Option<MethodFn> {
    match name {
        "add" => Some(set_add),
        "remove" => Some(set_remove),
        "discard" => Some(set_discard),
        "pop" => Some(set_pop),
        "intersection" => Some(set_intersection),
        "union" => Some(set_union),
        "difference" => Some(set_difference),
        _ => None,
    }
}

fn new_error(message: String) -> Value {
    Value::Error(message)
}

fn wrong_arg_count(got: usize, want: usize) -> Value {
    new_error(format!("wrong number of arguments. got={got}, want={want}"))
}

fn unsupported_argument(name: &str, value: &Value) -> Value {
    new_error(format!(
        "argument to `{name}` not supported, got {}",
        value.type_name()
    ))
}

/*
 * Builtin functions
 */

fn builtin_print(args: Vec<Value>) -> Value {
    for arg in &args {
        println!("{}", arg.inspect());
    }
    Value::Null
}

fn builtin_len(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &args[0] {
        Value::List(elements) => Value::Integer(elements.borrow().len() as i64),
        Value::Str(value) => Value::Integer(value.len() as i64),
        other => unsupported_argument("len", other),
    }
}

fn builtin_range(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &args[0] {
        Value::Integer(n) => Value::list((0..*n).map(Value::Integer).collect()),
        other => unsupported_argument("range", other),
    }
}

fn builtin_min(args: Vec<Value>) -> Value {
    fold_numeric_list(args, "min", f64::min)
}

fn builtin_max(args: Vec<Value>) -> Value {
    fold_numeric_list(args, "max", f64::max)
}

/// Shared min/max walk. The result is Float when any element is a Float,
/// even if the extreme itself came from an Integer.
fn fold_numeric_list(args: Vec<Value>, name: &'static str, pick: fn(f64, f64) -> f64) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Value::List(elements) = &args[0] else {
        return unsupported_argument(name, &args[0]);
    };
    let elements = elements.borrow();
    if elements.is_empty() {
        return new_error(format!("cannot take {name} of empty list"));
    }

    let mut best = 0f64;
    let mut has_float = false;
    for (index, element) in elements.iter().enumerate() {
        let v = match element {
            Value::Integer(value) => *value as f64,
            Value::Float(value) => {
                has_float = true;
                *value
            }
            other => return unsupported_argument(name, other),
        };
        best = if index == 0 { v } else { pick(best, v) };
    }

    if has_float {
        Value::Float(best)
    } else {
        Value::Integer(best as i64)
    }
}

fn builtin_abs(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &args[0] {
        Value::Integer(value) => Value::Integer(value.wrapping_abs()),
        Value::Float(value) => Value::Float(value.abs()),
        other => unsupported_argument("abs", other),
    }
}

fn builtin_sum(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Value::List(elements) = &args[0] else {
        return unsupported_argument("sum", &args[0]);
    };
    let elements = elements.borrow();
    if elements.is_empty() {
        return new_error("cannot take sum of empty list".to_string());
    }

    let mut total = 0f64;
    let mut has_float = false;
    for element in elements.iter() {
        match element {
            Value::Integer(value) => total += *value as f64,
            Value::Float(value) => {
                has_float = true;
                total += *value;
            }
            other => return unsupported_argument("sum", other),
        }
    }

    if has_float {
        Value::Float(total)
    } else {
        Value::Integer(total as i64)
    }
}

fn builtin_str(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    Value::Str(args[0].inspect())
}

// Reverses in place and returns the same list. Callers observe the argument
// mutate.
fn builtin_reversed(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &args[0] {
        Value::List(elements) => {
            elements.borrow_mut().reverse();
            args[0].clone()
        }
        other => unsupported_argument("reversed", other),
    }
}

fn builtin_round(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &args[0] {
        Value::Integer(value) => Value::Integer(*value),
        Value::Float(value) => Value::Integer(value.round() as i64),
        other => unsupported_argument("round", other),
    }
}

fn builtin_sorted(args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &args[0] {
        Value::List(elements) => Value::list(sort::merge_sort(&elements.borrow())),
        other => unsupported_argument("sorted", other),
    }
}

fn builtin_list(args: Vec<Value>) -> Value {
    if args.len() == 1
        && let Value::Set(values) = &args[0]
    {
        return Value::list(values.borrow().values().cloned().collect());
    }
    Value::list(args)
}

fn builtin_dict(_args: Vec<Value>) -> Value {
    Value::dict(HashMap::new())
}

fn builtin_set(args: Vec<Value>) -> Value {
    let mut values = HashMap::new();
    for arg in args {
        let Some(key) = arg.hash_key() else {
            return new_error(format!("argument cannot be hashed: {}", arg.type_name()));
        };
        values.entry(key).or_insert(arg);
    }
    Value::set(values)
}

/*
 * List methods
 */

fn receiver_error(method: &str, want: &str, got: &Value) -> Value {
    new_error(format!(
        "{method} must be called on {want}, got {}",
        got.type_name()
    ))
}

fn list_append(receiver: Value, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    match &receiver {
        Value::List(elements) => {
            elements
                .borrow_mut()
                .push(args.pop().expect("length checked above"));
        }
        other => return receiver_error("list.append()", "LIST", other),
    }
    receiver
}

fn list_reverse(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("list.reverse() takes no arguments".to_string());
    }
    match &receiver {
        Value::List(elements) => {
            elements.borrow_mut().reverse();
            Value::Null
        }
        other => receiver_error("list.reverse()", "LIST", other),
    }
}

fn list_copy(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("list.copy() takes no arguments".to_string());
    }
    match &receiver {
        Value::List(elements) => Value::list(elements.borrow().clone()),
        other => receiver_error("list.copy()", "LIST", other),
    }
}

fn list_pop(receiver: Value, args: Vec<Value>) -> Value {
    let mut index: i64 = -1;
    if args.len() == 1 {
        match &args[0] {
            Value::Integer(value) => index = *value,
            other => {
                return new_error(format!(
                    "index of list.pop() must be INTEGER, got {}",
                    other.type_name()
                ));
            }
        }
    } else if args.len() > 1 {
        return new_error(format!("list.pop() takes at most 1 index, got={}", args.len()));
    }

    match &receiver {
        Value::List(elements) => {
            let mut elements = elements.borrow_mut();
            let len = elements.len() as i64;
            if index < 0 {
                index += len;
            }
            if index < 0 || index >= len {
                return new_error("index out of range of list.pop()".to_string());
            }
            elements.remove(index as usize)
        }
        other => receiver_error("list.pop()", "LIST", other),
    }
}

fn list_sort(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("list.sort() takes no arguments".to_string());
    }
    match &receiver {
        Value::List(elements) => {
            let sorted = sort::merge_sort(&elements.borrow());
            *elements.borrow_mut() = sorted;
            Value::Null
        }
        other => receiver_error("list.sort()", "LIST", other),
    }
}

/*
 * String methods
 */

fn string_join(receiver: Value, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Value::Str(separator) = &receiver else {
        return receiver_error("string.join()", "STRING", &receiver);
    };
    let Value::List(elements) = &args[0] else {
        return new_error(format!(
            "string.join() takes a list, got {}",
            args[0].type_name()
        ));
    };

    let elements = elements.borrow();
    if elements.is_empty() {
        return new_error("cannot join empty list".to_string());
    }
    let joined = elements
        .iter()
        .map(Value::inspect)
        .collect::<Vec<_>>()
        .join(separator);
    Value::Str(joined)
}

fn string_upper(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("string.upper() takes no arguments".to_string());
    }
    match &receiver {
        Value::Str(value) => Value::Str(value.to_uppercase()),
        other => receiver_error("string.upper()", "STRING", other),
    }
}

fn string_lower(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("string.lower() takes no arguments".to_string());
    }
    match &receiver {
        Value::Str(value) => Value::Str(value.to_lowercase()),
        other => receiver_error("string.lower()", "STRING", other),
    }
}

// Case predicates ignore characters that carry no case; an empty or
// letterless string satisfies both.
fn string_isupper(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("string.isupper() takes no arguments".to_string());
    }
    match &receiver {
        Value::Str(value) => {
            Value::Boolean(value.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()))
        }
        other => receiver_error("string.isupper()", "STRING", other),
    }
}

fn string_islower(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("string.islower() takes no arguments".to_string());
    }
    match &receiver {
        Value::Str(value) => {
            Value::Boolean(value.chars().all(|c| !c.is_alphabetic() || c.is_lowercase()))
        }
        other => receiver_error("string.islower()", "STRING", other),
    }
}

fn string_swapcase(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("string.swapcase() takes no arguments".to_string());
    }
    match &receiver {
        Value::Str(value) => {
            let swapped = value
                .chars()
                .flat_map(|c| {
                    if c.is_lowercase() {
                        c.to_uppercase().collect::<Vec<_>>()
                    } else if c.is_uppercase() {
                        c.to_lowercase().collect::<Vec<_>>()
                    } else {
                        vec![c]
                    }
                })
                .collect::<String>();
            Value::Str(swapped)
        }
        other => receiver_error("string.swapcase()", "STRING", other),
    }
}

/*
 * Dict methods
 */

fn dict_keys(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("dict.keys() takes no arguments".to_string());
    }
    match &receiver {
        Value::Dict(pairs) => Value::list(
            pairs
                .borrow()
                .values()
                .map(|pair| pair.key.clone())
                .collect(),
        ),
        other => receiver_error("dict.keys()", "DICT", other),
    }
}

fn dict_values(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("dict.values() takes no arguments".to_string());
    }
    match &receiver {
        Value::Dict(pairs) => Value::list(
            pairs
                .borrow()
                .values()
                .map(|pair| pair.value.clone())
                .collect(),
        ),
        other => receiver_error("dict.values()", "DICT", other),
    }
}

fn dict_items(receiver: Value, args: Vec<Value>) -> Value {
    if !args.is_empty() {
        return new_error("dict.items() takes no arguments".to_string());
    }
    match &receiver {
        Value::Dict(pairs) => Value::list(
            pairs
                .borrow()
                .values()
                .map(|pair| Value::list(vec![pair.key.clone(), pair.value.clone()]))
                .collect(),
        ),
        other => receiver_error("dict.items()", "DICT", other),
    }
}

fn dict_pop(receiver: Value, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Some(key) = args[0].hash_key() else {
        return new_error(format!("unusable as hash key: {}", args[0].type_name()));
    };
    match &receiver {
        Value::Dict(pairs) => match pairs.borrow_mut().remove(&key) {
            Some(pair) => pair.value,
            None => new_error(format!("{} not found in dict", args[0].inspect())),
        },
        other => receiver_error("dict.pop()", "DICT", other),
    }
}

/*
 * Set methods
 */

fn set_add(receiver: Value, mut args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let value = args.pop().expect("length checked above");
    let Some(key) = value.hash_key() else {
        return new_error(format!("argument cannot be hashed: {}", value.type_name()));
    };
    match &receiver {
        Value::Set(values) => {
            values.borrow_mut().entry(key).or_insert(value);
            Value::Null
        }
        other => receiver_error("set.add()", "SET", other),
    }
}

fn set_remove(receiver: Value, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Some(key) = args[0].hash_key() else {
        return new_error(format!("argument cannot be hashed: {}", args[0].type_name()));
    };
    match &receiver {
        Value::Set(values) => {
            if values.borrow_mut().remove(&key).is_none() {
                return new_error(format!("{} not found in set", args[0].inspect()));
            }
            Value::Null
        }
        other => receiver_error("set.remove()", "SET", other),
    }
}

fn set_discard(receiver: Value, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Some(key) = args[0].hash_key() else {
        return new_error(format!("argument cannot be hashed: {}", args[0].type_name()));
    };
    match &receiver {
        Value::Set(values) => {
            values.borrow_mut().remove(&key);
            Value::Null
        }
        other => receiver_error("set.discard()", "SET", other),
    }
}

// Takes the value to remove rather than popping an arbitrary element.
fn set_pop(receiver: Value, args: Vec<Value>) -> Value {
    if args.len() != 1 {
        return wrong_arg_count(args.len(), 1);
    }
    let Some(key) = args[0].hash_key() else {
        return new_error(format!("argument cannot be hashed: {}", args[0].type_name()));
    };
    match &receiver {
        Value::Set(values) => match values.borrow_mut().remove(&key) {
            Some(value) => value,
            None => new_error(format!("{} not found in set", args[0].inspect())),
        },
        other => receiver_error("set.pop()", "SET", other),
    }
}

fn set_operand<'a>(method: &str, receiver: &'a Value, args: &'a [Value]) -> Result<(&'a Value, &'a Value), Value> {
    if args.len() != 1 {
        return Err(wrong_arg_count(args.len(), 1));
    }
    if !matches!(receiver, Value::Set(_)) {
        return Err(receiver_error(method, "SET", receiver));
    }
    if !matches!(args[0], Value::Set(_)) {
        return Err(new_error(format!(
            "{method} takes a set as argument, got {}",
            args[0].type_name()
        )));
    }
    Ok((receiver, &args[0]))
}

fn set_intersection(receiver: Value, args: Vec<Value>) -> Value {
    let (a, b) = match set_operand("set.intersection()", &receiver, &args) {
        Ok(pair) => pair,
        Err(error) => return error,
    };
    let (Value::Set(a), Value::Set(b)) = (a, b) else {
        unreachable!("set_operand verified both operands");
    };

    let a = a.borrow();
    let b = b.borrow();
    let mut result = HashMap::new();
    // Rounded float keys can collide; the rendered value breaks the tie.
    for (hash, value) in a.iter() {
        if let Some(other) = b.get(hash)
            && other.inspect() == value.inspect()
        {
            result.entry(*hash).or_insert_with(|| value.clone());
        }
    }
    Value::set(result)
}

fn set_union(receiver: Value, args: Vec<Value>) -> Value {
    let (a, b) = match set_operand("set.union()", &receiver, &args) {
        Ok(pair) => pair,
        Err(error) => return error,
    };
    let (Value::Set(a), Value::Set(b)) = (a, b) else {
        unreachable!("set_operand verified both operands");
    };

    let mut result = a.borrow().clone();
    for (hash, value) in b.borrow().iter() {
        result.entry(*hash).or_insert_with(|| value.clone());
    }
    Value::set(result)
}

/// Symmetric difference: members of either set with no matching entry in the
/// other.
fn set_difference(receiver: Value, args: Vec<Value>) -> Value {
    let (a, b) = match set_operand("set.difference()", &receiver, &args) {
        Ok(pair) => pair,
        Err(error) => return error,
    };
    let (Value::Set(a), Value::Set(b)) = (a, b) else {
        unreachable!("set_operand verified both operands");
    };

    let a = a.borrow();
    let b = b.borrow();
    let mut result = HashMap::new();
    for (hash, value) in a.iter() {
        let matched = b
            .get(hash)
            .is_some_and(|other| other.inspect() == value.inspect());
        if !matched {
            result.entry(*hash).or_insert_with(|| value.clone());
        }
    }
    for (hash, value) in b.iter() {
        let matched = a
            .get(hash)
            .is_some_and(|other| other.inspect() == value.inspect());
        if !matched {
            result.entry(*hash).or_insert_with(|| value.clone());
        }
    }
    Value::set(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::DictPair;
    use std::rc::Rc;

    fn ints(values: &[i64]) -> Value {
        Value::list(values.iter().map(|v| Value::Integer(*v)).collect())
    }

    fn make_set(values: Vec<Value>) -> Value {
        builtin_set(values)
    }

    #[test]
    fn lookup_knows_every_builtin() {
        for name in [
            "print", "len", "range", "min", "max", "abs", "sum", "str", "reversed", "round",
            "sorted", "list", "dict", "set",
        ] {
            assert!(lookup(name).is_some(), "missing builtin {name}");
        }
        assert!(lookup("missing").is_none());
    }

    #[test]
    fn len_handles_lists_strings_and_errors() {
        assert_eq!(builtin_len(vec![ints(&[1, 2, 3])]).inspect(), "3");
        assert_eq!(
            builtin_len(vec![Value::Str("four".to_string())]).inspect(),
            "4"
        );
        assert_eq!(
            builtin_len(vec![Value::Integer(1)]).inspect(),
            "ERROR: argument to `len` not supported, got INTEGER"
        );
        assert_eq!(
            builtin_len(vec![Value::Integer(1), Value::Integer(2)]).inspect(),
            "ERROR: wrong number of arguments. got=2, want=1"
        );
    }

    #[test]
    fn range_builds_zero_based_lists() {
        assert_eq!(builtin_range(vec![Value::Integer(3)]).inspect(), "[0, 1, 2]");
        assert_eq!(builtin_range(vec![Value::Integer(0)]).inspect(), "[]");
        assert_eq!(builtin_range(vec![Value::Integer(-2)]).inspect(), "[]");
    }

    #[test]
    fn min_and_max_promote_to_float_when_any_element_is_float() {
        assert_eq!(builtin_min(vec![ints(&[3, 1, 2])]).inspect(), "1");
        assert_eq!(builtin_max(vec![ints(&[3, 1, 2])]).inspect(), "3");

        let mixed = Value::list(vec![Value::Integer(1), Value::Float(2.5)]);
        assert_eq!(builtin_min(vec![mixed.clone()]).inspect(), "1.000000");
        assert_eq!(builtin_max(vec![mixed]).inspect(), "2.500000");
    }

    #[test]
    fn min_of_empty_list_is_an_error() {
        assert_eq!(
            builtin_min(vec![ints(&[])]).inspect(),
            "ERROR: cannot take min of empty list"
        );
        assert_eq!(
            builtin_max(vec![ints(&[])]).inspect(),
            "ERROR: cannot take max of empty list"
        );
    }

    #[test]
    fn abs_preserves_the_numeric_type() {
        assert_eq!(builtin_abs(vec![Value::Integer(-5)]).inspect(), "5");
        assert_eq!(builtin_abs(vec![Value::Float(-2.5)]).inspect(), "2.500000");
    }

    #[test]
    fn sum_follows_the_float_flag() {
        assert_eq!(builtin_sum(vec![ints(&[1, 2, 3])]).inspect(), "6");
        let mixed = Value::list(vec![Value::Integer(1), Value::Float(0.5)]);
        assert_eq!(builtin_sum(vec![mixed]).inspect(), "1.500000");
        assert_eq!(
            builtin_sum(vec![ints(&[])]).inspect(),
            "ERROR: cannot take sum of empty list"
        );
    }

    #[test]
    fn str_uses_the_inspect_form() {
        assert_eq!(builtin_str(vec![Value::Integer(1)]).inspect(), "1");
        assert_eq!(builtin_str(vec![Value::Float(1.5)]).inspect(), "1.500000");
        assert_eq!(builtin_str(vec![Value::Null]).inspect(), "null");
    }

    #[test]
    fn reversed_mutates_and_returns_the_same_list() {
        let list = ints(&[1, 2, 3]);
        let result = builtin_reversed(vec![list.clone()]);

        assert_eq!(list.inspect(), "[3, 2, 1]");
        match (&list, &result) {
            (Value::List(original), Value::List(returned)) => {
                assert!(Rc::ptr_eq(original, returned));
            }
            _ => panic!("expected lists"),
        }
    }

    #[test]
    fn round_rounds_half_away_from_zero() {
        assert_eq!(builtin_round(vec![Value::Float(2.5)]).inspect(), "3");
        assert_eq!(builtin_round(vec![Value::Float(-2.5)]).inspect(), "-3");
        assert_eq!(builtin_round(vec![Value::Float(2.4)]).inspect(), "2");
        assert_eq!(builtin_round(vec![Value::Integer(7)]).inspect(), "7");
    }

    #[test]
    fn sorted_returns_a_new_list() {
        let list = ints(&[3, 1, 2]);
        let sorted = builtin_sorted(vec![list.clone()]);
        assert_eq!(sorted.inspect(), "[1, 2, 3]");
        assert_eq!(list.inspect(), "[3, 1, 2]");
    }

    #[test]
    fn list_builtin_collects_args_or_converts_a_set() {
        assert_eq!(
            builtin_list(vec![Value::Integer(1), Value::Integer(2)]).inspect(),
            "[1, 2]"
        );
        let set = make_set(vec![Value::Integer(1)]);
        assert_eq!(builtin_list(vec![set]).inspect(), "[1]");
    }

    #[test]
    fn set_builtin_dedupes_and_rejects_unhashable_args() {
        let set = make_set(vec![
            Value::Integer(1),
            Value::Integer(1),
            Value::Integer(2),
        ]);
        match &set {
            Value::Set(values) => assert_eq!(values.borrow().len(), 2),
            _ => panic!("expected a set"),
        }
        assert_eq!(
            make_set(vec![ints(&[1])]).inspect(),
            "ERROR: argument cannot be hashed: LIST"
        );
    }

    #[test]
    fn list_append_pushes_and_returns_the_receiver() {
        let list = ints(&[1]);
        let result = list_append(list.clone(), vec![Value::Integer(2)]);
        assert_eq!(result.inspect(), "[1, 2]");
        assert_eq!(list.inspect(), "[1, 2]");
    }

    #[test]
    fn list_pop_defaults_to_the_last_element() {
        let list = ints(&[1, 2, 3]);
        assert_eq!(list_pop(list.clone(), vec![]).inspect(), "3");
        assert_eq!(list_pop(list.clone(), vec![Value::Integer(0)]).inspect(), "1");
        assert_eq!(list.inspect(), "[2]");
        assert_eq!(
            list_pop(list, vec![Value::Integer(5)]).inspect(),
            "ERROR: index out of range of list.pop()"
        );
    }

    #[test]
    fn list_copy_is_independent_of_the_original() {
        let list = ints(&[1, 2]);
        let copy = list_copy(list.clone(), vec![]);
        list_append(list.clone(), vec![Value::Integer(3)]);
        assert_eq!(list.inspect(), "[1, 2, 3]");
        assert_eq!(copy.inspect(), "[1, 2]");
    }

    #[test]
    fn list_reverse_and_sort_work_in_place() {
        let list = ints(&[2, 3, 1]);
        assert_eq!(list_reverse(list.clone(), vec![]).inspect(), "null");
        assert_eq!(list.inspect(), "[1, 3, 2]");
        assert_eq!(list_sort(list.clone(), vec![]).inspect(), "null");
        assert_eq!(list.inspect(), "[1, 2, 3]");
    }

    #[test]
    fn string_join_uses_the_receiver_as_separator() {
        let receiver = Value::Str(", ".to_string());
        let parts = Value::list(vec![
            Value::Str("a".to_string()),
            Value::Integer(1),
            Value::Str("b".to_string()),
        ]);
        assert_eq!(string_join(receiver.clone(), vec![parts]).inspect(), "a, 1, b");
        assert_eq!(
            string_join(receiver, vec![ints(&[])]).inspect(),
            "ERROR: cannot join empty list"
        );
    }

    #[test]
    fn string_case_methods() {
        let s = Value::Str("Hello World".to_string());
        assert_eq!(string_upper(s.clone(), vec![]).inspect(), "HELLO WORLD");
        assert_eq!(string_lower(s.clone(), vec![]).inspect(), "hello world");
        assert_eq!(string_swapcase(s.clone(), vec![]).inspect(), "hELLO wORLD");
        assert_eq!(string_isupper(s.clone(), vec![]).inspect(), "false");
        assert_eq!(string_islower(s, vec![]).inspect(), "false");

        let upper = Value::Str("ABC 123".to_string());
        assert_eq!(string_isupper(upper, vec![]).inspect(), "true");
        let lower = Value::Str("abc 123".to_string());
        assert_eq!(string_islower(lower, vec![]).inspect(), "true");
    }

    #[test]
    fn dict_accessors_return_fresh_lists() {
        let dict = {
            let mut pairs = HashMap::new();
            let key = Value::Str("a".to_string());
            pairs.insert(
                key.hash_key().unwrap(),
                DictPair {
                    key,
                    value: Value::Integer(1),
                },
            );
            Value::dict(pairs)
        };

        assert_eq!(dict_keys(dict.clone(), vec![]).inspect(), "[a]");
        assert_eq!(dict_values(dict.clone(), vec![]).inspect(), "[1]");
        assert_eq!(dict_items(dict.clone(), vec![]).inspect(), "[[a, 1]]");

        assert_eq!(
            dict_pop(dict.clone(), vec![Value::Str("a".to_string())]).inspect(),
            "1"
        );
        assert_eq!(
            dict_pop(dict, vec![Value::Str("a".to_string())]).inspect(),
            "ERROR: a not found in dict"
        );
    }

    #[test]
    fn set_add_remove_discard_and_pop() {
        let set = make_set(vec![]);
        assert_eq!(set_add(set.clone(), vec![Value::Integer(1)]).inspect(), "null");
        assert_eq!(set_add(set.clone(), vec![Value::Integer(1)]).inspect(), "null");
        match &set {
            Value::Set(values) => assert_eq!(values.borrow().len(), 1),
            _ => panic!("expected a set"),
        }

        assert_eq!(
            set_remove(set.clone(), vec![Value::Integer(2)]).inspect(),
            "ERROR: 2 not found in set"
        );
        assert_eq!(set_discard(set.clone(), vec![Value::Integer(2)]).inspect(), "null");
        assert_eq!(set_pop(set.clone(), vec![Value::Integer(1)]).inspect(), "1");
        assert_eq!(
            set_pop(set, vec![Value::Integer(1)]).inspect(),
            "ERROR: 1 not found in set"
        );
    }

    #[test]
    fn set_algebra() {
        let a = make_set(vec![Value::Integer(1), Value::Integer(2)]);
        let b = make_set(vec![Value::Integer(2), Value::Integer(3)]);

        let intersection = set_intersection(a.clone(), vec![b.clone()]);
        assert_eq!(intersection.inspect(), "{2}");

        let union = set_union(a.clone(), vec![b.clone()]);
        match &union {
            Value::Set(values) => assert_eq!(values.borrow().len(), 3),
            _ => panic!("expected a set"),
        }

        let difference = set_difference(a, vec![b]);
        match &difference {
            Value::Set(values) => {
                let mut rendered = values.borrow().values().map(Value::inspect).collect::<Vec<_>>();
                rendered.sort();
                assert_eq!(rendered, vec!["1", "3"]);
            }
            _ => panic!("expected a set"),
        }
    }
}
