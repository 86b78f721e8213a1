//! Generative backend seam and its Gemini REST implementation.

pub mod backend;
pub mod gemini;

pub use backend::{
    BackendTool, ChatTurnRequest, Citation, ContentPart, ContentRequest, GenerativeBackend,
    ImageOptions, MediaOperation, OperationHandle, OperationStatus, ResponseEnvelope,
    VideoRequest,
};
pub use gemini::GeminiClient;
