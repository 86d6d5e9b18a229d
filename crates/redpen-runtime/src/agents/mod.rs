//! Drafting agents.
//!
//! The research agent runs once before the first draft; the writer drafts
//! and then revises against reviewer feedback. Both reach the model through
//! a [`ResilientCaller`](crate::resilience::ResilientCaller).

mod research;
mod traits;
mod writer;

pub use research::ResearchAgent;
pub use traits::{AgentError, Researcher, Revision, Writer};
pub use writer::WriterAgent;
