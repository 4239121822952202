//! # srcinfo - compile metadata from CMake build logs
//!
//! srcinfo asks a configured CMake build directory's build program for a
//! dry-run transcript, picks out every compiler invocation and returns, per
//! source file, the include paths and preprocessor defines it is built with.
//! Static analysers and indexers consume these records; a bounded process pool
//! runs such tools over many files at once.
//!
//! ## Quick Start
//!
//! ```bash
//! cd build/
//! srcinfo extract --format json
//! srcinfo check -j 8 -- cppcheck --quiet
//! ```
//!
//! ## Module Organization
//!
//! - [`cache`] - `CMakeCache.txt` reader
//! - [`toolchain`] - compiler and build program identities
//! - [`build`] - dry-run log production and interpretation
//! - [`jobs`] - bounded concurrent process pool
//! - [`commands`] - CLI command handlers

/// Build log production and compile command interpretation.
pub mod build;

/// `CMakeCache.txt` parsing.
pub mod cache;

/// CLI command handlers extracted from main.
pub mod commands;

/// Configuration file parsing (`srcinfo.toml`).
pub mod config;

/// Error types.
pub mod error;

/// Bounded pool of external processes.
pub mod jobs;

/// Compiler and build program resolution.
pub mod toolchain;

/// Terminal UI utilities (tables).
pub mod ui;
