pub mod layout;
pub mod object_set;
pub mod selection;
pub mod strategy;
pub mod table;

pub use layout::{PeerRef, Raid0Layout, StripeLayout};
pub use object_set::ObjectSet;
pub use selection::{RandomObjectSelection, RoundRobinPeerSelection, SequentialObjectSelection};
pub use strategy::{NextRequest, TransferState, TransferStrategy};
pub use table::TransferTable;
