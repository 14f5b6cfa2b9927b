//! In-process host used by the integration tests
//!
//! `MockPool` hands out `MockSession`s that all share one `HostState`, so a
//! test can preset what the "remote program" returns and afterwards inspect
//! every write, read, call and pool operation.

#![allow(dead_code)]

use async_trait::async_trait;
use progcall::interface::{
    Credentials, DiagnosticMessage, Endpoint, InterfaceError, ParamValue, ParameterDocument,
    ProgramBinding, Result, Session, SessionPool,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
pub struct HostState {
    pub values: HashMap<(String, Vec<usize>), ParamValue>,
    /// Values the program stores when it is called
    pub results: HashMap<(String, Vec<usize>), ParamValue>,
    pub messages: Vec<DiagnosticMessage>,
    pub writes: Vec<(String, Vec<usize>)>,
    pub reads: Vec<(String, Vec<usize>)>,
    pub calls: Vec<String>,
    pub commands: Vec<String>,
    pub bindings: Vec<ProgramBinding>,
    pub fail_command: bool,
}

#[derive(Clone, Default)]
pub struct Host(Arc<Mutex<HostState>>);

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, HostState> {
        self.0.lock().unwrap()
    }

    pub fn preset(&self, path: &str, indices: &[usize], value: impl Into<ParamValue>) {
        self.state()
            .values
            .insert((path.to_string(), indices.to_vec()), value.into());
    }

    /// Have the program store `value` at `path`/`indices` when called
    pub fn returns(&self, path: &str, indices: &[usize], value: impl Into<ParamValue>) {
        self.state()
            .results
            .insert((path.to_string(), indices.to_vec()), value.into());
    }

    pub fn respond_with(&self, texts: &[&str]) {
        self.state().messages = texts.iter().map(|t| DiagnosticMessage::new(*t)).collect();
    }

    pub fn written_paths(&self) -> Vec<String> {
        self.state().writes.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn read_paths(&self) -> Vec<String> {
        self.state().reads.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn value(&self, path: &str, indices: &[usize]) -> Option<ParamValue> {
        self.state()
            .values
            .get(&(path.to_string(), indices.to_vec()))
            .cloned()
    }
}

pub struct MockDocument {
    host: Host,
}

#[async_trait]
impl ParameterDocument for MockDocument {
    fn write(&mut self, path: &str, indices: &[usize], value: ParamValue) -> Result<()> {
        let mut state = self.host.state();
        state.writes.push((path.to_string(), indices.to_vec()));
        state.values.insert((path.to_string(), indices.to_vec()), value);
        Ok(())
    }

    fn read(&self, path: &str, indices: &[usize]) -> Result<ParamValue> {
        let mut state = self.host.state();
        state.reads.push((path.to_string(), indices.to_vec()));
        state
            .values
            .get(&(path.to_string(), indices.to_vec()))
            .cloned()
            .ok_or_else(|| InterfaceError::document(path, "no value"))
    }

    async fn invoke(&mut self, program: &str) -> Result<Vec<DiagnosticMessage>> {
        let mut state = self.host.state();
        state.calls.push(program.to_string());
        let results: Vec<_> = state.results.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        state.values.extend(results);
        Ok(state.messages.clone())
    }
}

pub struct MockSession {
    host: Host,
}

#[async_trait]
impl Session for MockSession {
    async fn run_command(&mut self, command: &str) -> Result<Vec<DiagnosticMessage>> {
        let mut state = self.host.state();
        state.commands.push(command.to_string());
        if state.fail_command {
            return Err(InterfaceError::Command(format!("{} rejected", command)));
        }
        Ok(state.messages.clone())
    }

    async fn bind(&mut self, binding: &ProgramBinding) -> Result<Box<dyn ParameterDocument>> {
        self.host.state().bindings.push(binding.clone());
        Ok(Box::new(MockDocument {
            host: self.host.clone(),
        }))
    }
}

/// Pool counting acquisitions and releases
#[derive(Default)]
pub struct MockPool {
    pub host: Host,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub fail_acquire: bool,
    pub fail_release: bool,
}

impl MockPool {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionPool for MockPool {
    type Session = MockSession;

    async fn acquire(&self, _endpoint: &Endpoint, _credentials: &Credentials) -> Result<MockSession> {
        if self.fail_acquire {
            return Err(InterfaceError::Session("connection refused".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            host: self.host.clone(),
        })
    }

    async fn release(&self, _session: MockSession) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        if self.fail_release {
            return Err(InterfaceError::Session("socket closed".to_string()));
        }
        Ok(())
    }
}
