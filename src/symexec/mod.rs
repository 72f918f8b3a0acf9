mod eval;
mod explorer;
mod state;
mod value;

use anyhow::Result;

use crate::diagnostics::{DedupSink, DiagnosticSink};
use crate::ir::MethodCfg;
use crate::symexec::value::RefIds;

/// Options recognized by the executor.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ExecutorConfig {
    /// Upper bound on per-path visits of a block, for loop termination.
    pub(crate) max_block_visits: u32,
    /// Also report dereferences of receivers the analysis knows nothing
    /// about. Off by default: a finding should mean some concrete path
    /// pins the receiver to null.
    pub(crate) report_unknown_dereferences: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_block_visits: 2,
            report_unknown_dereferences: false,
        }
    }
}

/// Path-sensitive executor for one method CFG.
///
/// Non-reentrant; use one instance per analyzed method. Reference
/// identities are allocated per instance, so independent executors may run
/// in parallel on distinct CFGs as long as each owns its sink.
pub(crate) struct SymbolicExecutor<'a> {
    config: ExecutorConfig,
    sink: DedupSink<'a>,
    refs: RefIds,
}

impl<'a> SymbolicExecutor<'a> {
    pub(crate) fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self::with_config(ExecutorConfig::default(), sink)
    }

    pub(crate) fn with_config(config: ExecutorConfig, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            config,
            sink: DedupSink::new(sink),
            refs: RefIds::default(),
        }
    }

    /// Explores every feasible path of the method and reports diagnostics
    /// to the sink. Findings never abort exploration; an error means the
    /// CFG itself is malformed.
    pub(crate) fn execute(&mut self, method: &MethodCfg) -> Result<()> {
        explorer::explore(method, &self.config, &mut self.refs, &mut self.sink)
    }
}
