//! Study companion backend: a chat service that augments each learner turn
//! with context from uploaded documents, live web search and image analysis.

pub mod context;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod session;
pub mod state;
pub mod tools;
pub mod vision;
