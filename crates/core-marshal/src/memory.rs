//! In-memory parameter document
//!
//! A [`ParameterDocument`] that keeps values in a map and records every
//! operation performed on it. Used by the CLI to show what a marshal pass
//! would send, and by tests to observe both passes.

use async_trait::async_trait;
use progcall_interface::{
    DiagnosticMessage, InterfaceError, ParamValue, ParameterDocument, Result as InterfaceResult,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// One operation observed by a [`MemoryDocument`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum DocumentOp {
    Write {
        path: String,
        indices: Vec<usize>,
        value: ParamValue,
    },
    Read {
        path: String,
        indices: Vec<usize>,
    },
    Invoke {
        program: String,
    },
}

#[derive(Debug, Default)]
pub struct MemoryDocument {
    values: BTreeMap<(String, Vec<usize>), ParamValue>,
    messages: Vec<DiagnosticMessage>,
    ops: Mutex<Vec<DocumentOp>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value as if the remote program had produced it
    pub fn preset(&mut self, path: &str, indices: &[usize], value: impl Into<ParamValue>) {
        self.values
            .insert((path.to_string(), indices.to_vec()), value.into());
    }

    /// Messages returned by every subsequent `invoke`
    pub fn respond_with(&mut self, messages: Vec<DiagnosticMessage>) {
        self.messages = messages;
    }

    /// Stored value at an address, without recording a read
    pub fn value(&self, path: &str, indices: &[usize]) -> Option<ParamValue> {
        self.values.get(&(path.to_string(), indices.to_vec())).cloned()
    }

    pub fn ops(&self) -> Vec<DocumentOp> {
        self.log().to_vec()
    }

    /// Paths written, in order
    pub fn written_paths(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|op| match op {
                DocumentOp::Write { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths read, in order
    pub fn read_paths(&self) -> Vec<String> {
        self.log()
            .iter()
            .filter_map(|op| match op {
                DocumentOp::Read { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn log(&self) -> MutexGuard<'_, Vec<DocumentOp>> {
        self.ops.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ParameterDocument for MemoryDocument {
    fn write(&mut self, path: &str, indices: &[usize], value: ParamValue) -> InterfaceResult<()> {
        self.log().push(DocumentOp::Write {
            path: path.to_string(),
            indices: indices.to_vec(),
            value: value.clone(),
        });
        self.values.insert((path.to_string(), indices.to_vec()), value);
        Ok(())
    }

    fn read(&self, path: &str, indices: &[usize]) -> InterfaceResult<ParamValue> {
        self.log().push(DocumentOp::Read {
            path: path.to_string(),
            indices: indices.to_vec(),
        });
        self.value(path, indices).ok_or_else(|| {
            let reason = if indices.is_empty() {
                "no value".to_string()
            } else {
                format!("no value at {:?}", indices)
            };
            InterfaceError::document(path, reason)
        })
    }

    async fn invoke(&mut self, program: &str) -> InterfaceResult<Vec<DiagnosticMessage>> {
        self.log().push(DocumentOp::Invoke {
            program: program.to_string(),
        });
        Ok(self.messages.clone())
    }
}
