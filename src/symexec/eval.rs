use anyhow::Result;

use crate::diagnostics::{nullable_dereference_message, DiagnosticSink};
use crate::ir::{BinaryOperator, Expr, UnaryOperator};
use crate::symexec::state::ProgramState;
use crate::symexec::value::{join, Nullability, RefIds, SymbolicValue};
use crate::symexec::ExecutorConfig;

/// A value paired with the identifier it was loaded from, when any.
///
/// The origin is what names the receiver in null-dereference messages: the
/// innermost identifier that resolves to the nullable value.
#[derive(Clone, Debug)]
pub(crate) struct Operand {
    pub(crate) value: SymbolicValue,
    pub(crate) origin: Option<String>,
}

impl Operand {
    fn anonymous(value: SymbolicValue) -> Self {
        Self {
            value,
            origin: None,
        }
    }
}

/// Feasible continuations of a condition, one state set per outcome.
///
/// Cascaded short-circuit operators keep every refined path separate
/// instead of flattening to a scalar. An arm with no states is infeasible
/// under the incoming constraints.
#[derive(Debug, Default)]
pub(crate) struct ConditionOutcome {
    pub(crate) true_states: Vec<ProgramState>,
    pub(crate) false_states: Vec<ProgramState>,
}

impl ConditionOutcome {
    fn constant(state: ProgramState, value: bool) -> Self {
        if value {
            Self {
                true_states: vec![state],
                false_states: Vec::new(),
            }
        } else {
            Self {
                true_states: Vec::new(),
                false_states: vec![state],
            }
        }
    }

    fn opaque(state: ProgramState) -> Self {
        Self {
            true_states: vec![state.fork()],
            false_states: vec![state],
        }
    }

    pub(crate) fn is_always_true(&self) -> bool {
        self.false_states.is_empty() && !self.true_states.is_empty()
    }

    pub(crate) fn is_always_false(&self) -> bool {
        self.true_states.is_empty() && !self.false_states.is_empty()
    }
}

/// Interprets CFG instructions under a program state.
pub(crate) struct Evaluator<'a> {
    config: &'a ExecutorConfig,
    refs: &'a mut RefIds,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        config: &'a ExecutorConfig,
        refs: &'a mut RefIds,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        Self { config, refs, sink }
    }

    /// Evaluates an instruction for its value, updating bindings in place.
    pub(crate) fn eval_operand(&mut self, state: &mut ProgramState, expr: &Expr) -> Result<Operand> {
        let operand = match expr {
            Expr::NullLiteral { .. } => Operand::anonymous(SymbolicValue::Null),
            Expr::StringLiteral { .. } | Expr::CharLiteral { .. } | Expr::NumberLiteral { .. } => {
                Operand::anonymous(SymbolicValue::NonNull)
            }
            Expr::BoolLiteral { value, .. } => {
                Operand::anonymous(SymbolicValue::from_bool(*value))
            }
            Expr::Identifier { name, .. } => Operand {
                value: state.lookup(name),
                origin: Some(name.clone()),
            },
            Expr::Assign { target, value, .. } => {
                let operand = self.eval_operand(state, value)?;
                state.bind(target, operand.value);
                Operand {
                    value: operand.value,
                    origin: Some(target.clone()),
                }
            }
            Expr::MemberSelect { receiver, line, .. } => {
                let receiver = self.eval_operand(state, receiver)?;
                self.check_dereference(state, &receiver, *line);
                Operand::anonymous(SymbolicValue::Ref(self.refs.fresh()))
            }
            Expr::Invoke {
                receiver,
                arguments,
                line,
                ..
            } => {
                if let Some(receiver) = receiver {
                    let receiver = self.eval_operand(state, receiver)?;
                    self.check_dereference(state, &receiver, *line);
                }
                for argument in arguments {
                    self.eval_operand(state, argument)?;
                }
                Operand::anonymous(SymbolicValue::Ref(self.refs.fresh()))
            }
            Expr::Binary {
                operator: BinaryOperator::Other,
                left,
                right,
                ..
            } => {
                self.eval_operand(state, left)?;
                self.eval_operand(state, right)?;
                Operand::anonymous(SymbolicValue::Unknown)
            }
            Expr::Binary { .. } => self.eval_collapsed(state, expr)?,
            Expr::Unary {
                operator: UnaryOperator::Other,
                operand,
                ..
            } => {
                self.eval_operand(state, operand)?;
                Operand::anonymous(SymbolicValue::Unknown)
            }
            Expr::Unary { .. } => self.eval_collapsed(state, expr)?,
        };
        Ok(operand)
    }

    /// Evaluates a branch condition into per-arm feasible states.
    pub(crate) fn eval_condition(
        &mut self,
        state: &ProgramState,
        expr: &Expr,
    ) -> Result<ConditionOutcome> {
        match expr {
            Expr::Unary {
                operator: UnaryOperator::Not,
                operand,
                ..
            } => {
                let inner = self.eval_condition(state, operand)?;
                Ok(ConditionOutcome {
                    true_states: inner.false_states,
                    false_states: inner.true_states,
                })
            }
            Expr::Binary {
                operator: BinaryOperator::And,
                left,
                right,
                ..
            } => {
                // The right operand only runs on paths where the left did
                // not short-circuit.
                let left = self.eval_condition(state, left)?;
                let mut outcome = ConditionOutcome {
                    true_states: Vec::new(),
                    false_states: left.false_states,
                };
                for left_true in left.true_states {
                    let right = self.eval_condition(&left_true, right)?;
                    outcome.true_states.extend(right.true_states);
                    outcome.false_states.extend(right.false_states);
                }
                Ok(outcome)
            }
            Expr::Binary {
                operator: BinaryOperator::Or,
                left,
                right,
                ..
            } => {
                let left = self.eval_condition(state, left)?;
                let mut outcome = ConditionOutcome {
                    true_states: left.true_states,
                    false_states: Vec::new(),
                };
                for left_false in left.false_states {
                    let right = self.eval_condition(&left_false, right)?;
                    outcome.true_states.extend(right.true_states);
                    outcome.false_states.extend(right.false_states);
                }
                Ok(outcome)
            }
            Expr::Binary {
                operator: operator @ (BinaryOperator::Equal | BinaryOperator::NotEqual),
                left,
                right,
                ..
            } => self.eval_comparison(state, *operator, left, right),
            _ => {
                let mut base = state.fork();
                let operand = self.eval_operand(&mut base, expr)?;
                Ok(match operand.value {
                    SymbolicValue::True => ConditionOutcome::constant(base, true),
                    SymbolicValue::False => ConditionOutcome::constant(base, false),
                    _ => ConditionOutcome::opaque(base),
                })
            }
        }
    }

    /// `==` / `!=` against a null literal refines the other side; comparing
    /// two boolean constants folds; anything else stays opaque.
    fn eval_comparison(
        &mut self,
        state: &ProgramState,
        operator: BinaryOperator,
        left: &Expr,
        right: &Expr,
    ) -> Result<ConditionOutcome> {
        let negate = operator == BinaryOperator::NotEqual;
        if let Some(other) = null_comparison_operand(left, right) {
            let mut base = state.fork();
            let operand = self.eval_operand(&mut base, other)?;
            return Ok(refine_against_null(base, operand.value, negate));
        }
        let mut base = state.fork();
        let left = self.eval_operand(&mut base, left)?;
        let right = self.eval_operand(&mut base, right)?;
        if let (Some(left), Some(right)) = (as_bool(left.value), as_bool(right.value)) {
            let holds = (left == right) != negate;
            return Ok(ConditionOutcome::constant(base, holds));
        }
        Ok(ConditionOutcome::opaque(base))
    }

    /// Evaluates a condition-shaped expression consumed as a plain value.
    ///
    /// Diagnostics fire under the refined per-arm states; the surviving arms
    /// then fold back into a single lattice value. Constraints learned while
    /// deciding the condition stay local to it.
    fn eval_collapsed(&mut self, state: &mut ProgramState, expr: &Expr) -> Result<Operand> {
        let outcome = self.eval_condition(state, expr)?;
        let mut value = None;
        if !outcome.true_states.is_empty() {
            value = Some(SymbolicValue::True);
        }
        if !outcome.false_states.is_empty() {
            value = Some(match value {
                Some(existing) => join(existing, SymbolicValue::False),
                None => SymbolicValue::False,
            });
        }
        Ok(Operand::anonymous(value.unwrap_or(SymbolicValue::Unknown)))
    }

    /// Flags a dereference whose receiver is nullable on this path.
    ///
    /// Only provably-null receivers are reported by default; the message
    /// contract needs an identifier to name, so anonymous receivers stay
    /// silent.
    fn check_dereference(&mut self, state: &ProgramState, receiver: &Operand, line: u32) {
        let nullable = if self.config.report_unknown_dereferences {
            receiver.value.may_be_null(state)
        } else {
            receiver.value.is_definitely_null(state)
        };
        if !nullable {
            return;
        }
        let Some(name) = receiver.origin.as_deref() else {
            return;
        };
        self.sink.report(line, nullable_dereference_message(name));
    }
}

fn null_comparison_operand<'e>(left: &'e Expr, right: &'e Expr) -> Option<&'e Expr> {
    if matches!(left, Expr::NullLiteral { .. }) {
        Some(right)
    } else if matches!(right, Expr::NullLiteral { .. }) {
        Some(left)
    } else {
        None
    }
}

fn refine_against_null(base: ProgramState, value: SymbolicValue, negate: bool) -> ConditionOutcome {
    match value {
        SymbolicValue::Null => ConditionOutcome::constant(base, !negate),
        SymbolicValue::NonNull | SymbolicValue::True | SymbolicValue::False => {
            ConditionOutcome::constant(base, negate)
        }
        SymbolicValue::Ref(id) => {
            let mut outcome = ConditionOutcome::default();
            if let Some(on_null) = base.constrain(id, Nullability::Null) {
                if negate {
                    outcome.false_states.push(on_null);
                } else {
                    outcome.true_states.push(on_null);
                }
            }
            if let Some(on_non_null) = base.constrain(id, Nullability::NonNull) {
                if negate {
                    outcome.true_states.push(on_non_null);
                } else {
                    outcome.false_states.push(on_non_null);
                }
            }
            outcome
        }
        SymbolicValue::Unknown => ConditionOutcome::opaque(base),
    }
}

fn as_bool(value: SymbolicValue) -> Option<bool> {
    match value {
        SymbolicValue::True => Some(true),
        SymbolicValue::False => Some(false),
        _ => None,
    }
}
