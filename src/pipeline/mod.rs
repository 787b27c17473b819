//! Pipeline stages for document-to-flashcard generation.
//!
//! Each submodule implements exactly one transformation step and is pure
//! over its inputs; cross-stage state lives only in the orchestrator
//! ([`crate::generate`]).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ tokenize ──▶ classify ──▶ select ──▶ synthesize
//! (path/URL)  (srt/vtt/pdf)  (stop list)  (dict + LLM)  (band + context)  (LLM)
//! ```
//!
//! 1. [`input`]     : resolve a path or URL to named bytes and a document kind
//! 2. [`normalize`] : flat text plus ordered context lines; PDF text
//!    extraction runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`tokenize`]  : ordered, deduplicated candidate words
//! 4. [`classify`]  : dictionary lookup, then batched remote fallback
//! 5. [`select`]    : CEFR band filter and context-sentence binding
//! 6. [`synthesize`]: chunked flashcard generation with schema checks
//!
//! [`llm`] and [`response`] hold the LLM-backed collaborators and the
//! validation of their raw output.

pub mod classify;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod response;
pub mod select;
pub mod synthesize;
pub mod tokenize;
