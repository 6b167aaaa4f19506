//! Syntax tree produced by the parser and walked by the interpreter.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let x = expr` and the implicit form `x = expr`.
    Let { name: String, value: Expression },
    Return(Option<Expression>),
    Function {
        name: String,
        params: Vec<String>,
        body: Block,
    },
    For {
        iterator: String,
        iterable: Expression,
        body: Block,
    },
    While {
        condition: Expression,
        body: Block,
    },
    Expr(Expression),
}

/// Statements introduced by a `:` header and delimited by indentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Str(String),
    List(Vec<Expression>),
    Dict(Vec<(Expression, Expression)>),
    Prefix {
        op: PrefixOp,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        op: InfixOp,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Index {
        object: Box<Expression>,
        start: Box<Expression>,
        end: Option<Box<Expression>>,
    },
    IndexAssign {
        object: Box<Expression>,
        start: Box<Expression>,
        end: Option<Box<Expression>>,
        value: Box<Expression>,
    },
    MethodCall {
        object: Box<Expression>,
        method: String,
        args: Vec<Expression>,
    },
    In {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Bang,
    Minus,
}

impl PrefixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefixOp::Bang => "!",
            PrefixOp::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    NotEq,
}

impl InfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            InfixOp::Plus => "+",
            InfixOp::Minus => "-",
            InfixOp::Asterisk => "*",
            InfixOp::Slash => "/",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {name} = {value};"),
            Statement::Return(Some(value)) => write!(f, "return {value};"),
            Statement::Return(None) => write!(f, "return;"),
            Statement::Function { name, params, body } => {
                write!(f, "def {name}({}): {body}", params.join(", "))
            }
            Statement::For {
                iterator,
                iterable,
                body,
            } => write!(f, "for {iterator} in {iterable}: {body}"),
            Statement::While { condition, body } => write!(f, "while {condition}: {body}"),
            Statement::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{statement}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{name}"),
            Expression::Integer(value) => write!(f, "{value}"),
            Expression::Float(value) => write!(f, "{value}"),
            Expression::Boolean(value) => write!(f, "{value}"),
            Expression::Str(value) => write!(f, "{value}"),
            Expression::List(elements) => {
                let rendered = elements
                    .iter()
                    .map(Expression::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{rendered}]")
            }
            Expression::Dict(pairs) => {
                let rendered = pairs
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{rendered}}}")
            }
            Expression::Prefix { op, right } => write!(f, "({}{right})", op.as_str()),
            Expression::Infix { left, op, right } => {
                write!(f, "({left} {} {right})", op.as_str())
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {condition} {consequence}")?;
                if let Some(alternative) = alternative {
                    write!(f, " else {alternative}")?;
                }
                Ok(())
            }
            Expression::Call { callee, args } => {
                let rendered = args
                    .iter()
                    .map(Expression::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{callee}({rendered})")
            }
            Expression::Index { object, start, end } => match end {
                Some(end) => write!(f, "({object}[{start}:{end}])"),
                None => write!(f, "({object}[{start}])"),
            },
            Expression::IndexAssign {
                object,
                start,
                end,
                value,
            } => match end {
                Some(end) => write!(f, "({object}[{start}:{end}] = {value})"),
                None => write!(f, "({object}[{start}] = {value})"),
            },
            Expression::MethodCall {
                object,
                method,
                args,
            } => {
                let rendered = args
                    .iter()
                    .map(Expression::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{object}.{method}({rendered})")
            }
            Expression::In { left, right } => write!(f, "({left} in {right})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_let_statement() {
        let program = Program {
            statements: vec![Statement::Let {
                name: "myVar".to_string(),
                value: Expression::Identifier("anotherVar".to_string()),
            }],
        };
        assert_eq!(program.to_string(), "let myVar = anotherVar;");
    }

    #[test]
    fn renders_nested_expressions_parenthesized() {
        let expr = Expression::Infix {
            left: Box::new(Expression::Prefix {
                op: PrefixOp::Minus,
                right: Box::new(Expression::Integer(1)),
            }),
            op: InfixOp::Asterisk,
            right: Box::new(Expression::Integer(2)),
        };
        assert_eq!(expr.to_string(), "((-1) * 2)");
    }
}
