//! Rimio Replication - per-file write versioning and replica transfer
//! selection for rimio storage nodes
//!
//! - interval-versioned byte range index backed by an append-only log
//! - object sets with random and sequential selection
//! - round robin replica choice per stripe column
//! - the packed replication descriptor carried in location records

pub mod config;
pub mod error;
pub mod flags;
pub mod intervals;
pub mod transfer;

pub use config::{DEFAULT_PREFETCHING_COUNT, LogConfig, ReplicationConfig, TransferConfig};
pub use error::{ReplError, Result};
pub use flags::StrategyKind;
pub use intervals::{
    Interval, IntervalLogStore, IntervalVersionLog, IntervalVersionTree, RECORD_SIZE,
};
pub use transfer::{
    NextRequest, ObjectSet, PeerRef, Raid0Layout, RandomObjectSelection,
    RoundRobinPeerSelection, SequentialObjectSelection, StripeLayout, TransferState,
    TransferStrategy, TransferTable,
};
