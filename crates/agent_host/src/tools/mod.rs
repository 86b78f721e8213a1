//! Tool registry: one [`Tool`] per non-chat mode.
//!
//! A tool validates the user's input, builds the backend request and shapes
//! the backend's answer. Running the request (including video polling) is the
//! executor's job, so tools stay synchronous and easy to test.

use std::collections::HashMap;
use std::sync::Arc;

use providers::{ContentRequest, ResponseEnvelope, VideoRequest};
use shared::settings::ModelCatalog;
use shared::tool::{MediaHandle, ToolInput, ToolKind, ToolOutput};
use shared::{OracleError, Result};

pub mod analyze;
pub mod image_edit;
pub mod image_gen;
pub mod video_gen;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    Content(ContentRequest),
    Video(VideoRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResponse {
    Content(ResponseEnvelope),
    Video(MediaHandle),
}

pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// Reject input before anything is sent
    fn validate_input(&self, _input: &ToolInput) -> Result<()> {
        Ok(())
    }

    fn build_request(&self, input: &ToolInput, models: &ModelCatalog) -> ToolRequest;

    fn normalize_result(&self, response: ToolResponse) -> Result<ToolOutput>;
}

pub(crate) fn require_prompt(input: &ToolInput) -> Result<()> {
    if input.prompt.trim().is_empty() {
        return Err(OracleError::invalid_input("Please enter a prompt."));
    }
    Ok(())
}

pub(crate) fn unexpected(kind: ToolKind) -> OracleError {
    OracleError::generation(format!(
        "{} received a response it cannot use",
        kind.display_name()
    ))
}

pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.kind(), tool);
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&kind)
    }

    pub fn kinds(&self) -> Vec<ToolKind> {
        ToolKind::all()
            .iter()
            .copied()
            .filter(|kind| self.tools.contains_key(kind))
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with every built-in tool
pub fn init_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(image_gen::ImageGenerationTool));
    registry.register(Arc::new(image_edit::ImageEditTool));
    registry.register(Arc::new(video_gen::VideoGenerationTool));
    registry.register(Arc::new(analyze::AnalysisTool));
    registry
}
