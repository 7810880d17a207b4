//! In-process adapters for every driven port.
//!
//! [`MemoryStore`] implements the repository ports over one shared state
//! map and [`MemoryOutboundQueue`] implements the queue with a binary heap.
//! Both are used by the integration tests and by `--storage memory` runs
//! where a single process hosts both the listener and the delivery worker.

mod queue;
mod store;

pub use queue::MemoryOutboundQueue;
pub use store::MemoryStore;
