//! CFG construction helpers so tests read like the method bodies they
//! encode.

use crate::ir::{BinaryOperator, Block, BlockId, Expr, MethodCfg, Terminator, UnaryOperator};

/// Builds a method whose entry is the first block.
pub(crate) fn method(name: &str, parameters: &[&str], blocks: Vec<Block>) -> MethodCfg {
    let entry = blocks.first().map(|block| block.id).unwrap_or(0);
    MethodCfg {
        name: name.to_string(),
        parameters: parameters.iter().map(|name| name.to_string()).collect(),
        entry,
        blocks,
    }
}

pub(crate) fn block(id: BlockId, instructions: Vec<Expr>, terminator: Terminator) -> Block {
    Block {
        id,
        instructions,
        terminator,
    }
}

pub(crate) fn null_literal(line: u32) -> Expr {
    Expr::NullLiteral { line }
}

pub(crate) fn string_literal(line: u32) -> Expr {
    Expr::StringLiteral { line }
}

pub(crate) fn char_literal(line: u32) -> Expr {
    Expr::CharLiteral { line }
}

pub(crate) fn bool_literal(value: bool, line: u32) -> Expr {
    Expr::BoolLiteral { value, line }
}

pub(crate) fn identifier(name: &str, line: u32) -> Expr {
    Expr::Identifier {
        name: name.to_string(),
        line,
    }
}

pub(crate) fn assign(target: &str, value: Expr, line: u32) -> Expr {
    Expr::Assign {
        target: target.to_string(),
        value: Box::new(value),
        line,
    }
}

/// Method call without arguments, `receiver.method()`.
pub(crate) fn call(receiver: Expr, method: &str, line: u32) -> Expr {
    call_with_args(receiver, method, Vec::new(), line)
}

pub(crate) fn call_with_args(
    receiver: Expr,
    method: &str,
    arguments: Vec<Expr>,
    line: u32,
) -> Expr {
    Expr::Invoke {
        receiver: Some(Box::new(receiver)),
        method: method.to_string(),
        arguments,
        line,
    }
}

/// Unqualified call such as `getString()`.
pub(crate) fn call_unqualified(method: &str, line: u32) -> Expr {
    Expr::Invoke {
        receiver: None,
        method: method.to_string(),
        arguments: Vec::new(),
        line,
    }
}

pub(crate) fn binary(operator: BinaryOperator, left: Expr, right: Expr, line: u32) -> Expr {
    Expr::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
        line,
    }
}

pub(crate) fn eq(left: Expr, right: Expr, line: u32) -> Expr {
    binary(BinaryOperator::Equal, left, right, line)
}

pub(crate) fn ne(left: Expr, right: Expr, line: u32) -> Expr {
    binary(BinaryOperator::NotEqual, left, right, line)
}

pub(crate) fn and(left: Expr, right: Expr, line: u32) -> Expr {
    binary(BinaryOperator::And, left, right, line)
}

pub(crate) fn or(left: Expr, right: Expr, line: u32) -> Expr {
    binary(BinaryOperator::Or, left, right, line)
}

pub(crate) fn not(operand: Expr, line: u32) -> Expr {
    Expr::Unary {
        operator: UnaryOperator::Not,
        operand: Box::new(operand),
        line,
    }
}
