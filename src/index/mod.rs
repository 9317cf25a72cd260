//! Index Module
//!
//! In-memory mapping from key to current value. Serves every read.
//!
//! ## Responsibilities
//! - Reflect the most recent acknowledged state (ahead of the snapshot)
//! - Many concurrent readers, serialized writers
//! - Rebuilt once at startup by the recovery loader
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in a `parking_lot::RwLock`:
//! - Ordered keys give stable dumps
//! - The checkpointer never touches the index, so reads never wait on it

mod table;

pub use table::InMemoryIndex;
