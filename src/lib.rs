//! Document upload and extraction service.
//!
//! Uploaded files are stored under generated identifiers ([`ftms`]). On
//! request, a stored file is classified and run through an ordered cascade of
//! extraction strategies ([`extract`]); the text that comes out is sent to a
//! chat-completion model ([`llm`]) with a prompt chosen by content family
//! ([`pipeline`]). [`gateway`] exposes all of it over HTTP.

pub mod config;
pub mod extract;
pub mod ftms;
pub mod gateway;
pub mod llm;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{AiResult, DocumentProcessor, ProcessError};
