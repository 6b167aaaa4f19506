use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::parser::ast::Block;

use super::environment::Env;

pub const INTEGER: &str = "INTEGER";
pub const FLOAT: &str = "FLOAT";
pub const BOOLEAN: &str = "BOOLEAN";
pub const STRING: &str = "STRING";
pub const NULL: &str = "NULL";
pub const LIST: &str = "LIST";
pub const DICT: &str = "DICT";
pub const SET: &str = "SET";
pub const FUNCTION: &str = "FUNCTION";
pub const BUILTIN: &str = "BUILTIN";
pub const RETURN_VALUE: &str = "RETURN_VALUE";
pub const ERROR: &str = "ERROR";

pub type BuiltinFn = fn(Vec<Value>) -> Value;
pub type MethodFn = fn(Value, Vec<Value>) -> Value;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

#[derive(Clone)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub env: Env,
}

/// Canonical storage key for dict and set entries. Only Integer, Float,
/// Boolean, and String values hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: &'static str,
    pub value: u64,
}

/// A dict entry keeps the original key value alongside the stored value so
/// `keys()` and rendering can reproduce it.
#[derive(Clone)]
pub struct DictPair {
    pub key: Value,
    pub value: Value,
}

/// Runtime value universe. Containers are shared by reference; cloning a
/// Value aliases the same list/dict/set storage.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(String),
    Null,
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<HashMap<HashKey, DictPair>>>),
    Set(Rc<RefCell<HashMap<HashKey, Value>>>),
    Function(Rc<FunctionValue>),
    Builtin(Builtin),
    Return(Box<Value>),
    Error(String),
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn dict(pairs: HashMap<HashKey, DictPair>) -> Self {
        Value::Dict(Rc::new(RefCell::new(pairs)))
    }

    pub fn set(values: HashMap<HashKey, Value>) -> Self {
        Value::Set(Rc::new(RefCell::new(values)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => INTEGER,
            Value::Float(_) => FLOAT,
            Value::Boolean(_) => BOOLEAN,
            Value::Str(_) => STRING,
            Value::Null => NULL,
            Value::List(_) => LIST,
            Value::Dict(_) => DICT,
            Value::Set(_) => SET,
            Value::Function(_) => FUNCTION,
            Value::Builtin(_) => BUILTIN,
            Value::Return(_) => RETURN_VALUE,
            Value::Error(_) => ERROR,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The boolean projection used by `if`, `while`, and `!`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(value) => *value,
            Value::Integer(0) => false,
            _ => true,
        }
    }

    /// Hash key for dict/set storage; `None` for unhashable types.
    ///
    /// Floats hash by their rounded value, so 1.4 and 1.49 land in the same
    /// bucket while 1.4 and 1.5 do not.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey {
                kind: INTEGER,
                value: *value as u64,
            }),
            Value::Float(value) => Some(HashKey {
                kind: FLOAT,
                value: value.round() as i64 as u64,
            }),
            Value::Boolean(value) => Some(HashKey {
                kind: BOOLEAN,
                value: u64::from(*value),
            }),
            Value::Str(value) => Some(HashKey {
                kind: STRING,
                value: fnv1a(value.as_bytes()),
            }),
            _ => None,
        }
    }

    /// Human-readable rendering, also the basis for `str`, `print`, and the
    /// deep-equality checks used by `in`.
    pub fn inspect(&self) -> String {
        match self {
            Value::Integer(value) => value.to_string(),
            Value::Float(value) => format!("{value:.6}"),
            Value::Boolean(value) => value.to_string(),
            Value::Str(value) => value.clone(),
            Value::Null => "null".to_string(),
            Value::List(elements) => {
                let rendered = elements
                    .borrow()
                    .iter()
                    .map(Value::inspect)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{rendered}]")
            }
            Value::Dict(pairs) => {
                let rendered = pairs
                    .borrow()
                    .values()
                    .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{rendered}}}")
            }
            Value::Set(values) => {
                let rendered = values
                    .borrow()
                    .values()
                    .map(Value::inspect)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{rendered}}}")
            }
            Value::Function(function) => {
                format!(
                    "{}({}) {{\n{}\n}}",
                    function.name,
                    function.params.join(", "),
                    function.body
                )
            }
            Value::Builtin(_) => "builtin function".to_string(),
            Value::Return(value) => value.inspect(),
            Value::Error(message) => format!("ERROR: {message}"),
        }
    }
}

// Functions close over their defining environment, which may in turn hold the
// function itself; Debug stays shallow to avoid walking that cycle.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.type_name())
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_with_equal_content_share_a_hash_key() {
        let hello1 = Value::Str("Hello World".to_string());
        let hello2 = Value::Str("Hello World".to_string());
        let other = Value::Str("My name is johnny".to_string());

        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), other.hash_key());
    }

    #[test]
    fn floats_hash_by_rounded_value() {
        let low = Value::Float(1.4);
        let close = Value::Float(1.49);
        let high = Value::Float(1.5);

        assert_eq!(low.hash_key(), close.hash_key());
        assert_ne!(low.hash_key(), high.hash_key());
    }

    #[test]
    fn integer_and_float_keys_do_not_collide() {
        let int_key = Value::Integer(1).hash_key().unwrap();
        let float_key = Value::Float(1.0).hash_key().unwrap();
        assert_ne!(int_key, float_key);
    }

    #[test]
    fn containers_and_functions_are_unhashable() {
        assert!(Value::list(vec![]).hash_key().is_none());
        assert!(Value::dict(HashMap::new()).hash_key().is_none());
        assert!(Value::set(HashMap::new()).hash_key().is_none());
        assert!(Value::Null.hash_key().is_none());
    }

    #[test]
    fn truthiness_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(5).is_truthy());
        assert!(Value::Float(0.0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn inspect_renders_each_type() {
        assert_eq!(Value::Integer(5).inspect(), "5");
        assert_eq!(Value::Float(3.14).inspect(), "3.140000");
        assert_eq!(Value::Boolean(true).inspect(), "true");
        assert_eq!(Value::Str("hi".to_string()).inspect(), "hi");
        assert_eq!(Value::Null.inspect(), "null");
        assert_eq!(
            Value::list(vec![Value::Integer(1), Value::Integer(2)]).inspect(),
            "[1, 2]"
        );
        assert_eq!(
            Value::Error("boom".to_string()).inspect(),
            "ERROR: boom"
        );
        assert_eq!(
            Value::Return(Box::new(Value::Integer(7))).inspect(),
            "7"
        );
    }
}
