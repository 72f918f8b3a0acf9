use std::collections::{BTreeMap, VecDeque};

use anyhow::{bail, Result};
use tracing::trace;

use crate::diagnostics::{constant_condition_message, DiagnosticSink};
use crate::ir::{Block, BlockId, MethodCfg, Terminator};
use crate::symexec::eval::Evaluator;
use crate::symexec::state::ProgramState;
use crate::symexec::value::{RefIds, SymbolicValue};
use crate::symexec::ExecutorConfig;

/// Worklist exploration of one method CFG.
///
/// The worklist is FIFO; each entry is an independent path snapshot.
/// Conditional branches fork the state, refine each side with the
/// condition's constraints, and drop infeasible or over-visited
/// continuations. When one side of a branch is infeasible on every path
/// through the condition, the condition itself is reported as constant.
pub(crate) fn explore(
    method: &MethodCfg,
    config: &ExecutorConfig,
    refs: &mut RefIds,
    sink: &mut dyn DiagnosticSink,
) -> Result<()> {
    let graph = BlockGraph::new(method)?;

    let mut initial = ProgramState::new();
    for parameter in &method.parameters {
        initial.bind(parameter, SymbolicValue::Ref(refs.fresh()));
    }

    let mut queue = VecDeque::new();
    queue.push_back((method.entry, initial));

    while let Some((block_id, mut state)) = queue.pop_front() {
        if state.visit_count(block_id) >= config.max_block_visits {
            trace!(block = block_id, "visit bound reached, dropping path");
            continue;
        }
        state.record_visit(block_id);
        let Some(block) = graph.block(block_id) else {
            continue;
        };

        let mut evaluator = Evaluator::new(config, refs, sink);
        match &block.terminator {
            Terminator::Jump { target } => {
                for instruction in &block.instructions {
                    evaluator.eval_operand(&mut state, instruction)?;
                }
                queue.push_back((*target, state));
            }
            Terminator::Return | Terminator::Exit => {
                for instruction in &block.instructions {
                    evaluator.eval_operand(&mut state, instruction)?;
                }
            }
            Terminator::Branch {
                true_target,
                false_target,
            } => {
                let Some((condition, body)) = block.instructions.split_last() else {
                    bail!(
                        "conditional block {} of '{}' has no condition instruction",
                        block.id,
                        method.name
                    );
                };
                for instruction in body {
                    evaluator.eval_operand(&mut state, instruction)?;
                }
                let outcome = evaluator.eval_condition(&state, condition)?;
                if outcome.is_always_true() {
                    sink.report(condition.line(), constant_condition_message(true));
                } else if outcome.is_always_false() {
                    sink.report(condition.line(), constant_condition_message(false));
                }
                for next in outcome.true_states {
                    queue.push_back((*true_target, next));
                }
                for next in outcome.false_states {
                    queue.push_back((*false_target, next));
                }
            }
        }
    }

    Ok(())
}

/// Block lookup table with CFG well-formedness checks.
struct BlockGraph<'a> {
    blocks: BTreeMap<BlockId, &'a Block>,
}

impl<'a> BlockGraph<'a> {
    fn new(method: &'a MethodCfg) -> Result<Self> {
        let mut blocks = BTreeMap::new();
        for block in &method.blocks {
            if blocks.insert(block.id, block).is_some() {
                bail!("duplicate block {} in method '{}'", block.id, method.name);
            }
        }
        if !blocks.contains_key(&method.entry) {
            bail!(
                "entry block {} missing from method '{}'",
                method.entry,
                method.name
            );
        }
        for block in &method.blocks {
            for target in block.terminator.successors() {
                if !blocks.contains_key(&target) {
                    bail!(
                        "block {} of method '{}' jumps to missing block {}",
                        block.id,
                        method.name,
                        target
                    );
                }
            }
        }
        Ok(Self { blocks })
    }

    fn block(&self, id: BlockId) -> Option<&'a Block> {
        self.blocks.get(&id).copied()
    }
}
