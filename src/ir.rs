#![allow(dead_code)]

use serde::{Deserialize, Deserializer};

/// Lowered control-flow graphs for the methods of one source file.
///
/// Documents are produced by the upstream parser and CFG builder; `source`
/// is the URI of the file the methods were lowered from.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CfgDocument {
    pub(crate) source: String,
    pub(crate) methods: Vec<MethodCfg>,
}

pub(crate) type BlockId = u32;

/// Control-flow graph of a single method body.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct MethodCfg {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) parameters: Vec<String>,
    pub(crate) entry: BlockId,
    pub(crate) blocks: Vec<Block>,
}

/// Basic block: ordered instructions plus a terminator.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Block {
    pub(crate) id: BlockId,
    #[serde(default)]
    pub(crate) instructions: Vec<Expr>,
    pub(crate) terminator: Terminator,
}

/// Block terminator. A conditional branch takes its condition from the
/// value of the block's last instruction; the true successor comes first.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Terminator {
    Jump {
        target: BlockId,
    },
    Branch {
        true_target: BlockId,
        false_target: BlockId,
    },
    Return,
    Exit,
}

impl Terminator {
    /// Successor blocks in evaluation order. Return and exit follow none.
    pub(crate) fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Jump { target } => vec![*target],
            Terminator::Branch {
                true_target,
                false_target,
            } => vec![*true_target, *false_target],
            Terminator::Return | Terminator::Exit => Vec::new(),
        }
    }
}

/// Expression-shaped instruction as lowered by the CFG builder.
///
/// Every node carries the source line of the token it came from.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Expr {
    NullLiteral {
        line: u32,
    },
    StringLiteral {
        line: u32,
    },
    CharLiteral {
        line: u32,
    },
    NumberLiteral {
        line: u32,
    },
    BoolLiteral {
        value: bool,
        line: u32,
    },
    Identifier {
        name: String,
        line: u32,
    },
    Assign {
        target: String,
        value: Box<Expr>,
        line: u32,
    },
    MemberSelect {
        receiver: Box<Expr>,
        member: String,
        line: u32,
    },
    Invoke {
        receiver: Option<Box<Expr>>,
        method: String,
        #[serde(default)]
        arguments: Vec<Expr>,
        line: u32,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
        line: u32,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expr>,
        line: u32,
    },
}

impl Expr {
    pub(crate) fn line(&self) -> u32 {
        match self {
            Expr::NullLiteral { line }
            | Expr::StringLiteral { line }
            | Expr::CharLiteral { line }
            | Expr::NumberLiteral { line }
            | Expr::BoolLiteral { line, .. }
            | Expr::Identifier { line, .. }
            | Expr::Assign { line, .. }
            | Expr::MemberSelect { line, .. }
            | Expr::Invoke { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Unary { line, .. } => *line,
        }
    }
}

/// Binary operators the executor distinguishes; everything else is opaque.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BinaryOperator {
    Equal,
    NotEqual,
    And,
    Or,
    Other,
}

impl<'de> Deserialize<'de> for BinaryOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(match name.as_str() {
            "equal" => BinaryOperator::Equal,
            "not_equal" => BinaryOperator::NotEqual,
            "and" => BinaryOperator::And,
            "or" => BinaryOperator::Or,
            _ => BinaryOperator::Other,
        })
    }
}

/// Unary operators the executor distinguishes; everything else is opaque.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum UnaryOperator {
    Not,
    Other,
}

impl<'de> Deserialize<'de> for UnaryOperator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(match name.as_str() {
            "not" => UnaryOperator::Not,
            _ => UnaryOperator::Other,
        })
    }
}
