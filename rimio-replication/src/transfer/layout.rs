use crate::error::{ReplError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A storage node holding a replica of the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerRef {
    pub node_id: String,
    pub address: String,
}

impl PeerRef {
    pub fn new(node_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for PeerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node_id, self.address)
    }
}

/// Striping and replica placement of one file, as known from its location
/// record.
pub trait StripeLayout {
    fn stripe_width(&self) -> u32;

    /// Peers able to serve `object_no`, one per remote replica, in replica
    /// order.
    fn peers_for_object(&self, object_no: u64) -> &[PeerRef];

    /// Objects in `[from, to_exclusive)` stored by the peers of stripe
    /// `column`, ascending.
    fn peer_objects(
        &self,
        column: u32,
        from: u64,
        to_exclusive: u64,
    ) -> Box<dyn Iterator<Item = u64> + '_>;

    /// Last object number of the file, `None` for an empty file.
    fn last_object_no(&self) -> Option<u64>;
}

/// RAID0 striping: object `n` lives on column `n % stripe_width`, and
/// every replica holds one peer per column.
#[derive(Debug, Clone)]
pub struct Raid0Layout {
    stripe_width: u32,
    // columns[c][r] is the peer of replica r for stripe column c
    columns: Vec<Vec<PeerRef>>,
    object_count: u64,
}

impl Raid0Layout {
    pub fn new(stripe_width: u32, replicas: Vec<Vec<PeerRef>>, object_count: u64) -> Result<Self> {
        if stripe_width == 0 {
            return Err(ReplError::InvalidRequest(
                "stripe width must be positive".to_string(),
            ));
        }
        let mut layout = Self {
            stripe_width,
            columns: vec![Vec::new(); stripe_width as usize],
            object_count,
        };
        for peers in replicas {
            layout.add_replica(peers)?;
        }
        Ok(layout)
    }

    /// Layout for a file of `file_size` bytes cut into `stripe_size` objects.
    pub fn for_file_size(
        stripe_width: u32,
        replicas: Vec<Vec<PeerRef>>,
        file_size: u64,
        stripe_size: u64,
    ) -> Result<Self> {
        if stripe_size == 0 {
            return Err(ReplError::InvalidRequest(
                "stripe size must be positive".to_string(),
            ));
        }
        Self::new(stripe_width, replicas, file_size.div_ceil(stripe_size))
    }

    pub fn add_replica(&mut self, peers: Vec<PeerRef>) -> Result<()> {
        if peers.len() != self.stripe_width as usize {
            return Err(ReplError::InvalidRequest(format!(
                "replica has {} peers, stripe width is {}",
                peers.len(),
                self.stripe_width
            )));
        }
        for (column, peer) in peers.into_iter().enumerate() {
            self.columns[column].push(peer);
        }
        Ok(())
    }

    /// Drops every replica that places `node_id` on any column. Returns the
    /// number of replicas removed.
    pub fn remove_replicas_of(&mut self, node_id: &str) -> usize {
        let doomed: Vec<usize> = (0..self.replica_count())
            .filter(|&r| self.columns.iter().any(|col| col[r].node_id == node_id))
            .collect();
        for column in &mut self.columns {
            let mut index = 0;
            column.retain(|_| {
                let keep = !doomed.contains(&index);
                index += 1;
                keep
            });
        }
        doomed.len()
    }

    pub fn replica_count(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    pub fn set_object_count(&mut self, object_count: u64) {
        self.object_count = object_count;
    }
}

impl StripeLayout for Raid0Layout {
    fn stripe_width(&self) -> u32 {
        self.stripe_width
    }

    fn peers_for_object(&self, object_no: u64) -> &[PeerRef] {
        let column = (object_no % self.stripe_width as u64) as usize;
        &self.columns[column]
    }

    fn peer_objects(
        &self,
        column: u32,
        from: u64,
        to_exclusive: u64,
    ) -> Box<dyn Iterator<Item = u64> + '_> {
        let width = self.stripe_width as u64;
        let column = column as u64 % width;
        // first object >= from on the column
        let offset = (column + width - from % width) % width;
        let Some(first) = from.checked_add(offset) else {
            return Box::new(std::iter::empty());
        };
        Box::new(
            (0u64..)
                .map_while(move |step| step.checked_mul(width).and_then(|d| first.checked_add(d)))
                .take_while(move |&object_no| object_no < to_exclusive),
        )
    }

    fn last_object_no(&self) -> Option<u64> {
        self.object_count.checked_sub(1)
    }
}
