//! Execution middleware pipeline.
//!
//! Before an operation reaches the engine it passes through the middlewares
//! listed in `execution_middleware`, in order. Each stage receives the
//! current [`PipelineState`] and either hands a (possibly rewritten) state
//! to the next stage or answers the request itself. An answer skips the
//! remaining stages and the engine.
//!
//! # Example
//!
//! ```ignore
//! struct RequireOperationName;
//!
//! #[async_trait]
//! impl ExecutionMiddleware for RequireOperationName {
//!     async fn handle(&self, state: PipelineState) -> Flow {
//!         if state.options.operation_name.is_none() {
//!             return Flow::Respond(ExecutionResult::from_errors(vec![
//!                 ServerError::new("operationName is required", None),
//!             ]));
//!         }
//!         Flow::Continue(state)
//!     }
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_graphql::Data;
use async_trait::async_trait;
use tracing::trace;

use crate::result::ExecutionResult;
use crate::schema::SchemaSource;

/// Per-operation options.
#[derive(Debug)]
pub struct QueryOptions {
    /// Schema to execute against. Defaults to the configured default schema.
    pub schema: SchemaSource,
    /// Request context data made available to resolvers.
    pub context: Data,
    pub operation_name: Option<String>,
    /// Root value consulted by the default resolver for root fields.
    pub root_value: Option<serde_json::Value>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            schema: SchemaSource::default_schema(),
            context: Data::default(),
            operation_name: None,
            root_value: None,
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn schema(mut self, schema: impl Into<SchemaSource>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Adds a value to the request context.
    #[must_use]
    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.context.insert(data);
        self
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn root_value(mut self, value: serde_json::Value) -> Self {
        self.root_value = Some(value);
        self
    }
}

/// What a middleware sees and may rewrite.
#[derive(Debug)]
pub struct PipelineState {
    pub query: String,
    pub variables: Option<serde_json::Value>,
    pub options: QueryOptions,
}

impl PipelineState {
    #[must_use]
    pub fn new(
        query: impl Into<String>,
        variables: Option<serde_json::Value>,
        options: QueryOptions,
    ) -> Self {
        Self {
            query: query.into(),
            variables,
            options,
        }
    }
}

/// Outcome of a pipeline stage.
#[derive(Debug)]
pub enum Flow {
    /// Pass the state on.
    Continue(PipelineState),
    /// Answer without running later stages or the engine.
    Respond(ExecutionResult),
}

#[async_trait]
pub trait ExecutionMiddleware: Send + Sync {
    async fn handle(&self, state: PipelineState) -> Flow;
}

/// Ordered middleware stages.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn ExecutionMiddleware>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<Arc<dyn ExecutionMiddleware>>) -> Self {
        Self { stages }
    }

    #[must_use]
    pub fn through(mut self, stage: Arc<dyn ExecutionMiddleware>) -> Self {
        self.stages.push(stage);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs the stages in order, stopping at the first response.
    pub async fn run(&self, mut state: PipelineState) -> Flow {
        for (index, stage) in self.stages.iter().enumerate() {
            match stage.handle(state).await {
                Flow::Continue(next) => state = next,
                Flow::Respond(result) => {
                    trace!(stage = index, "Execution middleware answered the request");
                    return Flow::Respond(result);
                }
            }
        }
        Flow::Continue(state)
    }
}
