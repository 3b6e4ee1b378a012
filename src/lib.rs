//! # faqrag: spreadsheet-backed FAQ chat backend
//!
//! Answers customer questions from a small knowledge base: rows of a
//! spreadsheet are indexed with TF-IDF, the best matches are handed to a
//! hosted LLM as grounding context, and low-confidence results fall back to
//! a "wait for a human" reply.
//!
//! ## Architecture
//!
//! - **[`config`]**: Configuration loading, validation, and defaults
//! - **[`corpus`]**: Spreadsheet/CSV loading, TF-IDF vectorizer, lexical index
//! - **[`llm`]**: Language model trait, Gemini client, and mock backend
//! - **[`engine`]**: Lazy-initialized RAG engine with confidence gating
//! - **[`server`]**: axum chat endpoints, small talk, idle-reset session

pub mod config;
pub mod corpus;
pub mod engine;
pub mod llm;
pub mod server;
