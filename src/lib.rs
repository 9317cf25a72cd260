//! # EmberKV
//!
//! A single-node durable key-value store with:
//! - Write-Ahead Logging (WAL) with ordered sequence numbers
//! - An in-memory index serving every read
//! - Background checkpointing into an atomically replaced snapshot
//! - Crash recovery that replays the unmerged log tail
//!
//! ## Architecture Overview
//!
//! ```text
//!   put / delete                         get
//!        │                                │
//! ┌──────▼──────┐     append first  ┌─────▼───────┐
//! │     WAL     │ ─────────────────▶│    Index    │
//! │  (Append)   │     then update   │  (RwLock)   │
//! └──────┬──────┘                   └─────▲───────┘
//!        │ window (C, H]                  │ once, at open
//! ┌──────▼──────┐                   ┌─────┴───────┐
//! │Checkpointer │ ── fold + merge ─▶│  Snapshot   │
//! │ (interval)  │ ── marker = H     │ (atomic     │
//! └─────────────┘                   │  replace)   │
//!                                   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use emberkv::{Config, Engine};
//!
//! # fn main() -> emberkv::Result<()> {
//! let engine = Engine::open(Config::in_dir("./data"))?;
//! engine.put("k1", "x")?;
//! assert_eq!(engine.get("k1").as_deref(), Some("x"));
//! engine.delete("k1")?;
//! assert_eq!(engine.get("k1"), None);
//! engine.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod index;
pub mod storage;
pub mod checkpoint;
pub mod recovery;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EmberError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
