pub mod log;
pub mod store;
pub mod tree;

pub use log::{IntervalVersionLog, RECORD_SIZE, decode_record, encode_record, load};
pub use store::IntervalLogStore;
pub use tree::{Interval, IntervalVersionTree};
