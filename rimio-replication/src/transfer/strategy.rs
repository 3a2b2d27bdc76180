use crate::config::TransferConfig;
use crate::error::{ReplError, Result};
use crate::flags::StrategyKind;
use crate::transfer::layout::{PeerRef, StripeLayout};
use crate::transfer::object_set::ObjectSet;
use crate::transfer::selection::{
    RandomObjectSelection, RoundRobinPeerSelection, SequentialObjectSelection,
};

/// The object to fetch next and the replica to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextRequest {
    pub object_no: u64,
    pub peer: PeerRef,
    pub preferred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Nothing left to fetch.
    Idle,
    /// Objects are pending and no fetch is outstanding.
    Selecting,
    /// At least one issued request has not been resolved.
    AwaitingFetch,
}

#[derive(Debug)]
enum Variant {
    Random(RandomObjectSelection),
    Sequential(SequentialObjectSelection),
    SequentialPrefetching {
        selection: SequentialObjectSelection,
        prefetched: ObjectSet,
        prefetching_count: usize,
    },
}

impl Variant {
    /// Picks an object of `set` that is not in flight.
    fn pick(&mut self, set: &ObjectSet, in_flight: &ObjectSet) -> Option<u64> {
        match self {
            Variant::Random(selection) => selection.select_next_object_excluding(set, in_flight),
            Variant::Sequential(selection)
            | Variant::SequentialPrefetching { selection, .. } => {
                let mut candidate = selection.select_next_object(set);
                while let Some(object_no) = candidate {
                    if !in_flight.contains(object_no) {
                        break;
                    }
                    candidate = selection.select_next_object_of_same_set(set);
                }
                candidate
            }
        }
    }

    fn kind(&self) -> StrategyKind {
        match self {
            Variant::Random(_) => StrategyKind::Random,
            Variant::Sequential(_) => StrategyKind::Sequential,
            Variant::SequentialPrefetching { .. } => StrategyKind::SequentialPrefetching,
        }
    }
}

/// Decides, for one file under repair, which missing object to fetch next
/// and from which replica.
///
/// Preferred objects always go before required ones. An object stays in its
/// set until `fetch_completed`; while a request for it is outstanding it is
/// not selected again, and `fetch_failed` makes it selectable once more.
#[derive(Debug)]
pub struct TransferStrategy<L> {
    file_id: String,
    layout: L,
    preferred: ObjectSet,
    required: ObjectSet,
    in_flight: ObjectSet,
    peers: RoundRobinPeerSelection,
    variant: Variant,
}

impl<L: StripeLayout> TransferStrategy<L> {
    pub fn new(
        kind: StrategyKind,
        file_id: impl Into<String>,
        layout: L,
        config: &TransferConfig,
    ) -> Result<Self> {
        match kind {
            StrategyKind::Random => Ok(Self::random(file_id, layout, config)),
            StrategyKind::Sequential => Ok(Self::sequential(file_id, layout)),
            StrategyKind::SequentialPrefetching => {
                Ok(Self::sequential_prefetching(file_id, layout, config))
            }
            StrategyKind::RarestFirst => Err(ReplError::UnsupportedStrategy(kind.bit())),
        }
    }

    /// Builds the strategy named by the strategy bits of a replication
    /// descriptor.
    pub fn from_flags(
        flags: u32,
        file_id: impl Into<String>,
        layout: L,
        config: &TransferConfig,
    ) -> Result<Self> {
        let kind = StrategyKind::from_flags(flags).ok_or(ReplError::UnsupportedStrategy(flags))?;
        Self::new(kind, file_id, layout, config)
    }

    pub fn random(file_id: impl Into<String>, layout: L, config: &TransferConfig) -> Self {
        Self::with_variant(
            file_id,
            layout,
            Variant::Random(RandomObjectSelection::new(config.rng_seed)),
        )
    }

    pub fn sequential(file_id: impl Into<String>, layout: L) -> Self {
        Self::with_variant(
            file_id,
            layout,
            Variant::Sequential(SequentialObjectSelection::new()),
        )
    }

    pub fn sequential_prefetching(
        file_id: impl Into<String>,
        layout: L,
        config: &TransferConfig,
    ) -> Self {
        Self::with_variant(
            file_id,
            layout,
            Variant::SequentialPrefetching {
                selection: SequentialObjectSelection::new(),
                prefetched: ObjectSet::new(),
                prefetching_count: config.prefetching_count,
            },
        )
    }

    fn with_variant(file_id: impl Into<String>, layout: L, variant: Variant) -> Self {
        let file_id = file_id.into();
        tracing::info!(
            "Created {:?} transfer strategy for file {}",
            variant.kind(),
            file_id
        );
        Self {
            file_id,
            peers: RoundRobinPeerSelection::new(layout.stripe_width()),
            layout,
            preferred: ObjectSet::new(),
            required: ObjectSet::new(),
            in_flight: ObjectSet::new(),
            variant,
        }
    }

    /// Queues `object_no`. A preferred object leaves the required set; an
    /// object already preferred stays preferred.
    pub fn add_object(&mut self, object_no: u64, preferred: bool) {
        if preferred {
            self.required.remove(object_no);
            self.preferred.add(object_no);
        } else if !self.preferred.contains(object_no) {
            self.required.add(object_no);
        }
    }

    /// Forgets `object_no` entirely. Returns true if it was queued.
    pub fn remove_object(&mut self, object_no: u64) -> bool {
        self.in_flight.remove(object_no);
        let preferred = self.preferred.remove(object_no);
        let required = self.required.remove(object_no);
        preferred || required
    }

    pub fn select_next(&mut self) -> Result<Option<NextRequest>> {
        let Some((object_no, preferred)) = self.select_object()? else {
            return Ok(None);
        };

        let peer = self
            .peers
            .select_next_peer(self.layout.peers_for_object(object_no), object_no)
            .cloned()
            .ok_or(ReplError::NoPeerAvailable { object_no })?;

        self.in_flight.add(object_no);
        if preferred {
            self.prefetch_after(object_no);
        }

        tracing::debug!(
            "File {}: fetch object {} from {} (preferred: {})",
            self.file_id,
            object_no,
            peer,
            preferred
        );
        Ok(Some(NextRequest {
            object_no,
            peer,
            preferred,
        }))
    }

    fn select_object(&mut self) -> Result<Option<(u64, bool)>> {
        for (set, preferred) in [(&self.preferred, true), (&self.required, false)] {
            if set.is_empty() {
                continue;
            }
            match self.variant.pick(set, &self.in_flight) {
                Some(object_no) if set.contains(object_no) => {
                    return Ok(Some((object_no, preferred)));
                }
                Some(object_no) => {
                    return Err(ReplError::StrategyInvariantViolation(format!(
                        "selected object {} is not queued for file {}",
                        object_no, self.file_id
                    )));
                }
                None if self.in_flight.is_empty() => {
                    return Err(ReplError::StrategyInvariantViolation(format!(
                        "no object selected from non-empty set of file {}",
                        self.file_id
                    )));
                }
                None => {}
            }
        }
        Ok(None)
    }

    /// Schedules the objects following `object_no` on the same stripe column
    /// as background fetches.
    fn prefetch_after(&mut self, object_no: u64) {
        let Variant::SequentialPrefetching {
            prefetched,
            prefetching_count,
            ..
        } = &mut self.variant
        else {
            return;
        };
        let Some(last) = self.layout.last_object_no() else {
            return;
        };

        let limit = *prefetching_count + self.preferred.len();
        let column = self.peers.column(object_no);
        let mut scheduled = 0usize;
        for candidate in self
            .layout
            .peer_objects(column, object_no.saturating_add(1), last.saturating_add(1))
        {
            if scheduled >= limit {
                break;
            }
            if self.preferred.contains(candidate)
                || self.required.contains(candidate)
                || prefetched.contains(candidate)
            {
                continue;
            }
            prefetched.add(candidate);
            self.required.add(candidate);
            scheduled += 1;
        }

        if scheduled > 0 {
            tracing::debug!(
                "File {}: prefetching {} objects after object {}",
                self.file_id,
                scheduled,
                object_no
            );
        }
    }

    /// Settles the request for `object_no`: the object is no longer wanted.
    /// Returns true if a request for it was outstanding.
    pub fn fetch_completed(&mut self, object_no: u64) -> bool {
        let was_in_flight = self.in_flight.remove(object_no);
        self.preferred.remove(object_no);
        self.required.remove(object_no);
        was_in_flight
    }

    /// The request for `object_no` failed or was cancelled; the object will
    /// be selected again.
    pub fn fetch_failed(&mut self, object_no: u64) -> bool {
        self.in_flight.remove(object_no)
    }

    pub fn state(&self) -> TransferState {
        if !self.in_flight.is_empty() {
            TransferState::AwaitingFetch
        } else if self.preferred.is_empty() && self.required.is_empty() {
            TransferState::Idle
        } else {
            TransferState::Selecting
        }
    }

    /// Number of queued objects, outstanding requests included.
    pub fn objects_count(&self) -> usize {
        self.preferred.len() + self.required.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_preferred(&self, object_no: u64) -> bool {
        self.preferred.contains(object_no)
    }

    pub fn is_required(&self, object_no: u64) -> bool {
        self.required.contains(object_no)
    }

    pub fn kind(&self) -> StrategyKind {
        self.variant.kind()
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Replica changes made here apply to the next selection; stripe column
    /// cursors are kept.
    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }
}
