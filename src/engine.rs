use anyhow::Result;
use rayon::prelude::*;
use serde_sarif::sarif::{
    ArtifactLocation, Location, LogicalLocation, Message, MultiformatMessageString,
    PhysicalLocation, Region, ReportingDescriptor, Result as SarifResult,
};
use tracing::debug;

use crate::diagnostics::DiagnosticRecorder;
use crate::ir::{CfgDocument, MethodCfg};
use crate::symexec::{ExecutorConfig, SymbolicExecutor};

pub(crate) const NULL_DEREFERENCE_RULE: &str = "NULL_DEREFERENCE";
pub(crate) const GRATUITOUS_CONDITION_RULE: &str = "GRATUITOUS_CONDITION";

/// Analysis engine running one executor instance per method.
pub(crate) struct Engine {
    config: ExecutorConfig,
}

/// Aggregated SARIF payload from analysis.
pub(crate) struct EngineOutput {
    pub(crate) rules: Vec<ReportingDescriptor>,
    pub(crate) results: Vec<SarifResult>,
    pub(crate) method_count: usize,
}

/// One recorded diagnostic with enough context to locate it.
struct Finding {
    source: String,
    method: String,
    line: u32,
    message: String,
}

impl Engine {
    pub(crate) fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    pub(crate) fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Analyzes every method of every document. Methods are independent, so
    /// they run in parallel; results come back in a deterministic order
    /// regardless of scheduling.
    pub(crate) fn analyze(&self, documents: &[CfgDocument]) -> Result<EngineOutput> {
        let units: Vec<(&CfgDocument, &MethodCfg)> = documents
            .iter()
            .flat_map(|document| {
                document
                    .methods
                    .iter()
                    .map(move |method| (document, method))
            })
            .collect();

        let mut findings: Vec<Finding> = units
            .par_iter()
            .map(|(document, method)| self.analyze_method(document, method))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        findings.sort_by(|left, right| {
            (
                &left.source,
                left.line,
                rule_id_for(&left.message),
                &left.message,
            )
                .cmp(&(
                    &right.source,
                    right.line,
                    rule_id_for(&right.message),
                    &right.message,
                ))
        });

        debug!(
            methods = units.len(),
            findings = findings.len(),
            "analysis complete"
        );
        Ok(EngineOutput {
            rules: rule_descriptors(),
            results: findings.iter().map(build_result).collect(),
            method_count: units.len(),
        })
    }

    fn analyze_method(&self, document: &CfgDocument, method: &MethodCfg) -> Result<Vec<Finding>> {
        let mut recorder = DiagnosticRecorder::new();
        SymbolicExecutor::with_config(self.config, &mut recorder).execute(method)?;
        let findings = recorder
            .entries()
            .map(|(line, message)| Finding {
                source: document.source.clone(),
                method: method.name.clone(),
                line,
                message: message.to_string(),
            })
            .collect();
        Ok(findings)
    }
}

fn rule_descriptors() -> Vec<ReportingDescriptor> {
    vec![
        rule_descriptor(
            NULL_DEREFERENCE_RULE,
            "Null dereference",
            "Dereference of a value that is provably null on some path",
        ),
        rule_descriptor(
            GRATUITOUS_CONDITION_RULE,
            "Gratuitous condition",
            "Condition that evaluates the same way on every reachable path",
        ),
    ]
}

fn rule_descriptor(id: &str, name: &str, description: &str) -> ReportingDescriptor {
    ReportingDescriptor::builder()
        .id(id)
        .name(name)
        .short_description(
            MultiformatMessageString::builder()
                .text(description)
                .build(),
        )
        .build()
}

fn rule_id_for(message: &str) -> &'static str {
    if message.starts_with("NullPointerException") {
        NULL_DEREFERENCE_RULE
    } else {
        GRATUITOUS_CONDITION_RULE
    }
}

fn build_result(finding: &Finding) -> SarifResult {
    let logical = LogicalLocation::builder()
        .name(finding.method.clone())
        .kind("function")
        .build();
    let artifact_location = ArtifactLocation::builder()
        .uri(finding.source.clone())
        .build();
    let region = Region::builder().start_line(finding.line as i64).build();
    let physical = PhysicalLocation::builder()
        .artifact_location(artifact_location)
        .region(region)
        .build();
    let location = Location::builder()
        .logical_locations(vec![logical])
        .physical_location(physical)
        .build();
    SarifResult::builder()
        .rule_id(rule_id_for(&finding.message).to_string())
        .message(Message::builder().text(finding.message.clone()).build())
        .locations(vec![location])
        .build()
}
