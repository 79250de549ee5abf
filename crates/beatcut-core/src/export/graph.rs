// crates/beatcut-core/src/export/graph.rs
//
// Labeled filter-graph builder.
//
// Elements and effects append `FilterNode`s instead of concatenating
// strings; `push()` checks the pad invariants at insertion time so a bad
// graph fails at the offending element, never inside ffmpeg:
//
//   - every labeled output pad is produced exactly once
//   - every labeled pad is consumed by at most one downstream filter
//     (`split` is the one sanctioned way to consume twice)
//   - a consumed pad must already have been produced
//
// Raw input-stream specifiers (`0:v`, `3:a`) are not graph-produced pads;
// they bypass the single-consumer rule and are validated only for shape.

use std::collections::HashSet;

use crate::error::ExportError;

#[derive(Clone, Debug)]
pub struct FilterNode {
    pub inputs:  Vec<String>,
    pub body:    String,
    pub outputs: Vec<String>,
}

#[derive(Default)]
pub struct FilterGraph {
    nodes:    Vec<FilterNode>,
    produced: HashSet<String>,
    consumed: HashSet<String>,
}

/// `0:v` / `12:a` style input-stream specifier (not a graph pad).
fn is_stream_ref(label: &str) -> bool {
    match label.split_once(':') {
        Some((idx, sel)) => {
            !idx.is_empty()
                && idx.bytes().all(|b| b.is_ascii_digit())
                && matches!(sel, "v" | "a")
        }
        None => false,
    }
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one filter statement. `context` names the element/effect for
    /// error reporting (e.g. `"video clip 3"`, `"cutout"`).
    pub fn push<I: AsRef<str>, O: AsRef<str>>(
        &mut self,
        inputs: &[I],
        body: impl Into<String>,
        outputs: &[O],
        context: &str,
    ) -> Result<(), ExportError> {
        for pad in inputs {
            let pad = pad.as_ref();
            if is_stream_ref(pad) {
                continue;
            }
            if !self.produced.contains(pad) {
                return Err(ExportError::UnknownPad {
                    pad:     pad.to_string(),
                    context: context.to_string(),
                });
            }
            if !self.consumed.insert(pad.to_string()) {
                return Err(ExportError::PadReuse {
                    pad:     pad.to_string(),
                    context: context.to_string(),
                });
            }
        }
        for pad in outputs {
            let pad = pad.as_ref();
            if !self.produced.insert(pad.to_string()) {
                return Err(ExportError::DuplicatePad {
                    pad:     pad.to_string(),
                    context: context.to_string(),
                });
            }
        }
        self.nodes.push(FilterNode {
            inputs:  inputs.iter().map(|s| s.as_ref().to_string()).collect(),
            body:    body.into(),
            outputs: outputs.iter().map(|s| s.as_ref().to_string()).collect(),
        });
        Ok(())
    }

    /// Append a source filter (no input pads): `color=`, `anullsrc=`, …
    pub fn push_source<O: AsRef<str>>(
        &mut self,
        body: impl Into<String>,
        outputs: &[O],
        context: &str,
    ) -> Result<(), ExportError> {
        let no_inputs: [&str; 0] = [];
        self.push(&no_inputs, body, outputs, context)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn produced(&self, pad: &str) -> bool {
        self.produced.contains(pad)
    }

    /// Verify `pad` exists and is unconsumed, then serialize. The terminal
    /// pads (`vout`, `aout`) must be left for the output `-map`s.
    pub fn finish<T: AsRef<str>>(&self, terminal_pads: &[T]) -> Result<String, ExportError> {
        for pad in terminal_pads {
            let pad = pad.as_ref();
            if !self.produced.contains(pad) || self.consumed.contains(pad) {
                return Err(ExportError::DanglingOutput(pad.to_string()));
            }
        }
        Ok(self.serialize())
    }

    /// `[in0][in1]body[out0];…` joined with `;`.
    pub fn serialize(&self) -> String {
        self.nodes
            .iter()
            .map(|n| {
                let ins: String = n.inputs.iter().map(|p| format!("[{p}]")).collect();
                let outs: String = n.outputs.iter().map(|p| format!("[{p}]")).collect();
                format!("{ins}{}{outs}", n.body)
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}
