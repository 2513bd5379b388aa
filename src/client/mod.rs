//! Caller-side half of degraded mode: a durable cache of personas that only
//! exist locally, and a client that falls back to it when the gateway's
//! backing service cannot answer reads.

pub mod degraded;
pub mod store;

pub use degraded::{cosmetic_stats, ClientError, DegradedClient, Listing};
pub use store::{FileKvStore, KvStore, LocalEntityCache, MemoryKvStore, StoreError};
