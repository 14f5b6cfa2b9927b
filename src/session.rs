/*!
 * Session orchestration
 *
 * One invocation is one scoped sequence: acquire a session, bind the program
 * document, write the inputs, call, read the outputs, release. The session is
 * handed back to the pool on every path out of that sequence.
 */

use progcall_core_marshal::{
    check_conformance, mixed_usage, read_plan, write_plan, AccessPlan, Direction,
    Error as MarshalError, RemoteProgram, SchemaSource,
};
use progcall_interface::{
    Credentials, DiagnosticMessage, Endpoint, ProgramBinding, Session, SessionPool,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::InvocationError;
use crate::schema::DirectorySchemaSource;

/// Lifecycle of a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No session held
    Idle,
    /// Session acquired and document bound
    Bound,
    /// Invocation failed; the session has still been released
    Failed,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallState::Idle => write!(f, "idle"),
            CallState::Bound => write!(f, "bound"),
            CallState::Failed => write!(f, "failed"),
        }
    }
}

/// Runs commands and program calls against one endpoint
///
/// Holds no per-call state, so one manager can serve concurrent invocations;
/// each invocation takes its own session from the pool.
pub struct SessionManager<P: SessionPool> {
    pool: P,
    endpoint: Endpoint,
    credentials: Credentials,
    schema_source: Option<Arc<dyn SchemaSource>>,
}

impl<P: SessionPool> SessionManager<P> {
    pub fn new(pool: P, endpoint: Endpoint, credentials: Credentials) -> Self {
        Self {
            pool,
            endpoint,
            credentials,
            schema_source: None,
        }
    }

    /// Manager for the configured connection, checking calls against
    /// `definitions_dir` when one is set
    pub fn from_config(pool: P, config: &Config) -> Self {
        let manager = Self::new(
            pool,
            config.connection.endpoint(),
            config.connection.credentials(),
        );
        match &config.definitions_dir {
            Some(dir) => manager.with_schema_source(Arc::new(DirectorySchemaSource::new(dir))),
            None => manager,
        }
    }

    /// Verify every program call against the definitions `source` returns
    pub fn with_schema_source(mut self, source: Arc<dyn SchemaSource>) -> Self {
        self.schema_source = Some(source);
        self
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Run an unstructured command
    ///
    /// Returns whatever messages the host produced; interpreting them is left
    /// to the caller.
    pub async fn invoke_command(
        &self,
        command: &str,
    ) -> Result<Vec<DiagnosticMessage>, InvocationError> {
        let mut session = self.acquire(command).await?;
        let outcome = session
            .run_command(command)
            .await
            .map_err(MarshalError::Session);
        self.release(command, session, outcome).await
    }

    /// Marshal `instance`, call its program and unmarshal the results into it
    pub async fn invoke_program<R: RemoteProgram>(
        &self,
        instance: &mut R,
    ) -> Result<(), InvocationError> {
        let binding = instance.binding().ok_or_else(|| {
            InvocationError::new(
                std::any::type_name::<R>(),
                MarshalError::schema("object graph does not declare a program binding"),
            )
        })?;
        let program = binding.program.clone();

        let (write, read) = self
            .prepare(&program, instance.descriptors())
            .await
            .map_err(|cause| InvocationError::new(&program, cause))?;

        let mut session = self.acquire(&program).await?;
        let outcome = Self::call(&mut session, &binding, &write, &read, instance).await;
        self.release(&program, session, outcome).await
    }

    /// Everything that can be checked before a session is taken
    async fn prepare(
        &self,
        program: &str,
        descriptors: &[progcall_core_marshal::FieldDescriptor],
    ) -> Result<(AccessPlan, AccessPlan), MarshalError> {
        if let Some(source) = &self.schema_source {
            let definition = source.definition(program).await.map_err(|e| {
                MarshalError::schema(format!("remote definition unavailable: {}", e))
            })?;
            check_conformance(program, descriptors, &definition.fields)?;
        }

        for member in mixed_usage(descriptors) {
            warn!(
                program,
                member = %member,
                "Member usage differs from its container; the container's usage decides"
            );
        }

        let write = AccessPlan::build(program, descriptors, Direction::Write)?;
        let read = AccessPlan::build(program, descriptors, Direction::Read)?;
        Ok((write, read))
    }

    async fn call<R: RemoteProgram>(
        session: &mut P::Session,
        binding: &ProgramBinding,
        write: &AccessPlan,
        read: &AccessPlan,
        instance: &mut R,
    ) -> Result<(), MarshalError> {
        let mut document = session
            .bind(binding)
            .await
            .map_err(MarshalError::Document)?;
        info!(program = %binding.program, state = %CallState::Bound, "Program document bound");

        let writes = write_plan(write, &*instance, document.as_mut())?;
        debug!(program = %binding.program, writes, "Inputs marshalled");

        let messages = document
            .invoke(&binding.program)
            .await
            .map_err(MarshalError::Document)?;
        if !messages.is_empty() {
            return Err(MarshalError::remote_program(&binding.program, &messages));
        }

        let reads = read_plan(read, instance, document.as_ref())?;
        debug!(program = %binding.program, reads, "Outputs unmarshalled");
        Ok(())
    }

    async fn acquire(&self, target: &str) -> Result<P::Session, InvocationError> {
        self.pool
            .acquire(&self.endpoint, &self.credentials)
            .await
            .map_err(|e| {
                error!(target_name = target, endpoint = %self.endpoint, error = %e, "Session acquisition failed");
                InvocationError::new(target, MarshalError::Session(e))
            })
    }

    /// Hand the session back and settle the invocation's result
    async fn release<T>(
        &self,
        target: &str,
        session: P::Session,
        outcome: Result<T, MarshalError>,
    ) -> Result<T, InvocationError> {
        let released = self.pool.release(session).await;
        match (outcome, released) {
            (Ok(value), Ok(())) => {
                info!(target_name = target, state = %CallState::Idle, "Invocation complete");
                Ok(value)
            }
            (Ok(_), Err(e)) => {
                error!(target_name = target, state = %CallState::Failed, error = %e, "Session release failed");
                Err(InvocationError::new(target, MarshalError::Session(e)))
            }
            (Err(cause), Ok(())) => {
                error!(target_name = target, state = %CallState::Failed, error = %cause, "Invocation failed");
                Err(InvocationError::new(target, cause))
            }
            (Err(cause), Err(e)) => {
                error!(target_name = target, state = %CallState::Failed, error = %cause, "Invocation failed");
                warn!(target_name = target, error = %e, "Session release failed after invocation failure");
                Err(InvocationError::new(target, cause).with_release_failure(e))
            }
        }
    }
}
