mod diagnostics;
mod engine;
mod ir;
mod load;
mod logging;
mod symexec;
#[cfg(test)]
mod test_harness;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use jsonschema::JSONSchema;
use serde_json::json;
use serde_sarif::sarif::{
    Invocation, PropertyBag, ReportingDescriptor, Result as SarifResult, Run, Sarif, Tool,
    ToolComponent, SCHEMA_URL,
};

use crate::engine::Engine;
use crate::load::load_inputs;
use crate::logging::init_logging;
use crate::symexec::ExecutorConfig;

/// CLI arguments for nullsweep execution.
#[derive(Parser, Debug)]
#[command(
    name = "nullsweep",
    about = "Path-sensitive null dereference and gratuitous condition analysis for method CFGs, SARIF output.",
    version
)]
struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        required = true,
        num_args = 1..,
        help = "Input CFG document or directory paths. Use @file to read paths (one per line)."
    )]
    input: Vec<String>,
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
    #[arg(long, value_name = "COUNT", default_value_t = 2)]
    max_block_visits: u32,
    #[arg(long)]
    report_unknown_dereferences: bool,
}

fn main() -> std::process::ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            std::process::ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let input = expand_inputs(&cli.input, &base_dir).context("expand --input arguments")?;
    if input.is_empty() {
        anyhow::bail!("nothing to analyze: every --input expanded to an empty list");
    }

    let load_started_at = Instant::now();
    let documents = load_inputs(&input)?;
    let load_duration_ms = load_started_at.elapsed().as_millis();

    let config = ExecutorConfig {
        max_block_visits: cli.max_block_visits,
        report_unknown_dereferences: cli.report_unknown_dereferences,
    };
    let analysis_started_at = Instant::now();
    let analysis = Engine::with_config(config).analyze(&documents)?;
    let analysis_duration_ms = analysis_started_at.elapsed().as_millis();

    let stats = InvocationStats {
        load_duration_ms,
        analysis_duration_ms,
        document_count: documents.len(),
        method_count: analysis.method_count,
    };
    let invocation = build_invocation(&stats);
    let sarif = build_sarif(invocation, analysis.rules, analysis.results);
    if should_validate_sarif() {
        validate_sarif(&sarif)?;
    }

    let write_started_at = Instant::now();
    let mut writer = output_writer(cli.output.as_deref())?;
    serde_json::to_writer(&mut writer, &sarif).context("failed to serialize SARIF output")?;
    writer
        .write_all(b"\n")
        .context("failed to write SARIF output")?;
    let write_duration_ms = write_started_at.elapsed().as_millis();

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: load_ms={} analysis_ms={} write_ms={} (documents={} methods={})",
            stats.load_duration_ms,
            stats.analysis_duration_ms,
            write_duration_ms,
            stats.document_count,
            stats.method_count
        );
    }
    Ok(())
}

/// Expands CLI path arguments into concrete input paths.
///
/// An argument of the form `@list` names a file with one entry per line
/// (blank lines and `#` comments ignored); its entries are spliced in
/// where the reference stood and resolved relative to the list file, so
/// lists can be shared across working directories. Lists may reference
/// further lists; a list that comes up a second time is rejected rather
/// than expanded again, which also cuts reference cycles.
fn expand_inputs(args: &[String], base_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pending: VecDeque<(String, PathBuf)> = args
        .iter()
        .map(|arg| (arg.clone(), base_dir.to_path_buf()))
        .collect();
    let mut seen_lists = BTreeSet::new();
    let mut paths = Vec::new();

    while let Some((arg, dir)) = pending.pop_front() {
        let Some(list) = arg.strip_prefix('@') else {
            paths.push(absolute_in(Path::new(&arg), &dir));
            continue;
        };
        if list.is_empty() {
            anyhow::bail!("'@' must be followed by a list file path");
        }
        let list_path = absolute_in(Path::new(list), &dir)
            .canonicalize()
            .with_context(|| format!("cannot locate list file {list}"))?;
        if !seen_lists.insert(list_path.clone()) {
            anyhow::bail!(
                "list file {} includes itself, directly or indirectly",
                list_path.display()
            );
        }
        let contents = fs::read_to_string(&list_path)
            .with_context(|| format!("cannot read list file {}", list_path.display()))?;
        let list_dir = list_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .to_path_buf();
        let entries = contents
            .lines()
            .map(str::trim)
            .filter(|entry| !entry.is_empty() && !entry.starts_with('#'))
            .map(|entry| (entry.to_string(), list_dir.clone()));
        for (offset, entry) in entries.enumerate() {
            pending.insert(offset, entry);
        }
    }

    Ok(paths)
}

fn absolute_in(path: &Path, dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => {
            Ok(Box::new(File::create(path).with_context(|| {
                format!("failed to open {}", path.display())
            })?))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Metadata captured for SARIF invocation properties.
struct InvocationStats {
    load_duration_ms: u128,
    analysis_duration_ms: u128,
    document_count: usize,
    method_count: usize,
}

fn build_invocation(stats: &InvocationStats) -> Invocation {
    let arguments: Vec<String> = std::env::args().collect();
    let command_line = arguments.join(" ");
    let mut properties = BTreeMap::new();
    properties.insert(
        "nullsweep.load_ms".to_string(),
        json!(stats.load_duration_ms),
    );
    properties.insert(
        "nullsweep.analysis_ms".to_string(),
        json!(stats.analysis_duration_ms),
    );
    properties.insert(
        "nullsweep.document_count".to_string(),
        json!(stats.document_count),
    );
    properties.insert(
        "nullsweep.method_count".to_string(),
        json!(stats.method_count),
    );

    Invocation::builder()
        .execution_successful(true)
        .arguments(arguments)
        .command_line(command_line)
        .properties(
            PropertyBag::builder()
                .additional_properties(properties)
                .build(),
        )
        .build()
}

fn should_validate_sarif() -> bool {
    std::env::var("NULLSWEEP_VALIDATE_SARIF")
        .ok()
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Validates the SARIF envelope against the embedded schema.
fn validate_sarif(sarif: &Sarif) -> Result<()> {
    let schema = serde_json::from_str(include_str!("assets/sarif-envelope.schema.json"))
        .context("load SARIF schema")?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| anyhow::anyhow!("compile SARIF schema: {err}"))?;
    let value = serde_json::to_value(sarif).context("serialize SARIF")?;
    if let Err(errors) = compiled.validate(&value) {
        let message = errors
            .map(|error| error.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        anyhow::bail!("SARIF schema validation failed:\n{message}");
    }
    Ok(())
}

fn build_sarif(
    invocation: Invocation,
    rules: Vec<ReportingDescriptor>,
    results: Vec<SarifResult>,
) -> Sarif {
    let semantic_version = env!("CARGO_PKG_VERSION").to_string();
    let driver = if rules.is_empty() {
        ToolComponent::builder()
            .name("nullsweep")
            .semantic_version(semantic_version)
            .build()
    } else {
        ToolComponent::builder()
            .name("nullsweep")
            .rules(rules)
            .semantic_version(semantic_version)
            .build()
    };
    let tool = Tool {
        driver,
        extensions: None,
        properties: None,
    };
    let run = Run::builder()
        .tool(tool)
        .invocations(vec![invocation])
        .results(results)
        .build();

    Sarif::builder()
        .schema(SCHEMA_URL)
        .runs(vec![run])
        .version(json!("2.1.0"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn expand_inputs_reads_list_files_and_resolves_relative_entries() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let canonical_temp_dir = temp_dir.path().canonicalize().expect("canonicalize");

        fs::write(temp_dir.path().join("nested.txt"), "lib/extra.json\n").expect("write nested");
        fs::write(
            temp_dir.path().join("inputs.txt"),
            "# input documents\ncfgs\n@nested.txt\n\n",
        )
        .expect("write inputs");

        let args = vec![format!("@{}", temp_dir.path().join("inputs.txt").display())];
        let expanded = expand_inputs(&args, Path::new(".")).expect("expand inputs");

        assert_eq!(
            expanded,
            vec![
                canonical_temp_dir.join("cfgs"),
                canonical_temp_dir.join("lib").join("extra.json"),
            ]
        );
    }

    #[test]
    fn expand_inputs_splices_list_entries_in_place() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let canonical_temp_dir = temp_dir.path().canonicalize().expect("canonicalize");
        fs::write(temp_dir.path().join("list.txt"), "first.json\nsecond.json\n")
            .expect("write list");

        let args = vec![
            format!("@{}", temp_dir.path().join("list.txt").display()),
            "direct.json".to_string(),
        ];
        let expanded = expand_inputs(&args, temp_dir.path()).expect("expand inputs");

        assert_eq!(
            expanded,
            vec![
                canonical_temp_dir.join("first.json"),
                canonical_temp_dir.join("second.json"),
                temp_dir.path().join("direct.json"),
            ]
        );
    }

    #[test]
    fn expand_inputs_errors_on_missing_list_file() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");

        let args = vec![format!("@{}", temp_dir.path().join("missing.txt").display())];

        assert!(expand_inputs(&args, Path::new(".")).is_err());
    }

    #[test]
    fn expand_inputs_rejects_self_referencing_lists() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let list = temp_dir.path().join("self.txt");
        fs::write(&list, "@self.txt\n").expect("write list");

        let args = vec![format!("@{}", list.display())];
        let error = expand_inputs(&args, Path::new(".")).expect_err("must fail");

        assert!(format!("{error:#}").contains("includes itself"));
    }

    #[test]
    fn sarif_is_minimal_and_valid_shape() {
        let invocation = build_invocation(&InvocationStats {
            load_duration_ms: 0,
            analysis_duration_ms: 0,
            document_count: 0,
            method_count: 0,
        });
        let sarif = build_sarif(invocation, Vec::new(), Vec::new());
        let value = serde_json::to_value(&sarif).expect("serialize SARIF");

        assert_eq!(value["version"], "2.1.0");
        assert_eq!(value["$schema"], SCHEMA_URL);
        assert_eq!(value["runs"][0]["tool"]["driver"]["name"], "nullsweep");
        assert_eq!(
            value["runs"][0]["tool"]["driver"]["semanticVersion"],
            env!("CARGO_PKG_VERSION")
        );
        assert!(
            value["runs"][0]["results"]
                .as_array()
                .expect("results array")
                .is_empty()
        );
        assert_eq!(
            value["runs"][0]["invocations"][0]["executionSuccessful"],
            true
        );
    }

    #[test]
    fn emitted_sarif_passes_schema_validation() {
        let invocation = build_invocation(&InvocationStats {
            load_duration_ms: 1,
            analysis_duration_ms: 2,
            document_count: 1,
            method_count: 1,
        });
        let sarif = build_sarif(invocation, Vec::new(), Vec::new());

        validate_sarif(&sarif).expect("schema validation");
    }
}
