//! # resume-search
//!
//! A Rust web service for retrieving resume candidates with a hybrid
//! pipeline combining field-weighted keyword search, vector semantic
//! search, and LLM re-ranking, plus a conversational filter over the
//! previous answer.
//!
//! ## Architecture
//!
//! ```text
//!                        ┌──────────────┐
//!                        │  User Query  │
//!                        └──────┬───────┘
//!                               │
//!                  ┌────────────┴────────────┐
//!                  ▼                         ▼
//!         ┌────────────────┐       ┌─────────────────┐
//!         │ Keyword Engine │       │  Vector Engine  │
//!         │ regex counts   │       │ embed + cosine  │
//!         └───────┬────────┘       └────────┬────────┘
//!                 │     concurrent          │
//!                 └────────────┬────────────┘
//!                              ▼
//!                 ┌───────────────────────┐
//!                 │   Weighted Merge      │
//!                 │  score = v·w_v + k·w_k│
//!                 │  keyed by name        │
//!                 └───────────┬───────────┘
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │   LLM Re-ranking      │
//!                 │ strict / lenient mode │
//!                 │ filter + re-score     │
//!                 └───────────┬───────────┘
//!                             ▼
//!                 ┌───────────────────────┐
//!                 │        Top-K          │
//!                 └───────────────────────┘
//!
//! Conversational follow-ups short-circuit past the store:
//!
//!   cached results ──► LLM filter ──► top-K
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the store, LLM and retrieval knobs
//! - [`error`] - Error taxonomy: store, embedding, chat, pipeline-not-ready
//! - [`models`] - Shared data types: `ResumeDocument`, `SearchResultItem`, request/response types
//! - [`store`] - Document store adapter: keyword plans and knn over the ingested snapshot
//! - [`search`] - The keyword, vector and hybrid engines behind one `SearchEngine` contract
//! - [`llm`] - Chat/embedding clients, the re-ranker, and the conversational filter
//! - [`pipeline`] - Two-stage retrieval: candidate generation, re-rank, top-K
//! - [`conversation`] - In-process conversation memory with bounded history
//! - [`api`] - Axum HTTP handlers for search, chat, history and config
//! - [`state`] - Shared application state wiring the collaborators together

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
pub mod store;
