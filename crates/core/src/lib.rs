//! Core library for communitytools
//!
//! This crate implements the **Functional Core** of the communitytools
//! application, following the Functional Core - Imperative Shell
//! architectural pattern.
//!
//! # Architecture Overview
//!
//! The communitytools project uses a two-crate architecture to enforce
//! separation of concerns:
//!
//! - **`communitytools_core`** (this crate): Pure transformation functions with zero I/O
//! - **`communitytools`**: I/O operations and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Deterministic**: Behavior is predictable and reproducible
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`query`]: Builders for the Atlassian Community search-language queries
//! - [`format`]: Normalization of raw search responses into stable envelopes
//!
//! Each module contains:
//!
//! - **Domain models**: Structured types representing API responses and outputs
//! - **Transformation functions**: Pure functions that convert API data to domain models
//! - **Comprehensive tests**: Unit tests using fixture data (no mocking)
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use communitytools_core::query::{search_query, SortOrder};
//!
//! let q = search_query("boards", None, 25, 0, SortOrder::Desc);
//! assert!(q.starts_with("SELECT * FROM messages WHERE depth = 0"));
//! ```

pub mod format;
pub mod query;
