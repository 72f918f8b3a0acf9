use std::collections::{BTreeMap, BTreeSet};

/// Sink receiving diagnostics keyed by source line.
pub(crate) trait DiagnosticSink {
    fn report(&mut self, line: u32, message: String);
}

/// Adapter that forwards at most one diagnostic per source line.
///
/// The first message recorded for a line wins; later findings on the same
/// line are dropped regardless of their text.
pub(crate) struct DedupSink<'a> {
    inner: &'a mut dyn DiagnosticSink,
    reported: BTreeSet<u32>,
}

impl<'a> DedupSink<'a> {
    pub(crate) fn new(inner: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            inner,
            reported: BTreeSet::new(),
        }
    }
}

impl DiagnosticSink for DedupSink<'_> {
    fn report(&mut self, line: u32, message: String) {
        if self.reported.insert(line) {
            self.inner.report(line, message);
        }
    }
}

/// In-memory sink used by the engine and by tests.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticRecorder {
    messages: BTreeMap<u32, String>,
}

impl DiagnosticRecorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub(crate) fn message(&self, line: u32) -> Option<&str> {
        self.messages.get(&line).map(String::as_str)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.messages
            .iter()
            .map(|(line, message)| (*line, message.as_str()))
    }
}

impl DiagnosticSink for DiagnosticRecorder {
    fn report(&mut self, line: u32, message: String) {
        self.messages.entry(line).or_insert(message);
    }
}

pub(crate) fn nullable_dereference_message(name: &str) -> String {
    format!("NullPointerException might be thrown as '{name}' is nullable here")
}

pub(crate) fn constant_condition_message(value: bool) -> String {
    let value = if value { "true" } else { "false" };
    format!("Change this condition so that it does not always evaluate to \"{value}\"")
}
