use crate::config::TransferConfig;
use crate::error::{ReplError, Result};
use crate::transfer::layout::StripeLayout;
use crate::transfer::strategy::{NextRequest, TransferState, TransferStrategy};
use std::collections::HashMap;

/// Transfer strategies of all files this node is currently repairing.
///
/// The table does no locking. Calls for one file must come from a single
/// actor; distinct files are independent.
pub struct TransferTable<L> {
    config: TransferConfig,
    files: HashMap<String, TransferStrategy<L>>,
}

impl<L: StripeLayout> TransferTable<L> {
    pub fn new(config: TransferConfig) -> Self {
        Self {
            config,
            files: HashMap::new(),
        }
    }

    /// Starts tracking `file_id` with the strategy named by `flags`. A file
    /// already tracked keeps its strategy and queued objects.
    pub fn open_file(&mut self, file_id: &str, flags: u32, layout: L) -> Result<()> {
        if self.files.contains_key(file_id) {
            return Ok(());
        }
        let strategy = TransferStrategy::from_flags(flags, file_id, layout, &self.config)?;
        self.files.insert(file_id.to_string(), strategy);
        Ok(())
    }

    pub fn add_object(&mut self, file_id: &str, object_no: u64, preferred: bool) -> Result<()> {
        self.strategy_mut(file_id)?.add_object(object_no, preferred);
        Ok(())
    }

    pub fn select_next(&mut self, file_id: &str) -> Result<Option<NextRequest>> {
        self.strategy_mut(file_id)?.select_next()
    }

    /// Marks `object_no` fetched. A file with nothing left to fetch is
    /// dropped from the table.
    pub fn fetch_completed(&mut self, file_id: &str, object_no: u64) -> Result<bool> {
        let strategy = self.strategy_mut(file_id)?;
        let was_in_flight = strategy.fetch_completed(object_no);
        if strategy.state() == TransferState::Idle {
            self.files.remove(file_id);
            tracing::info!("Replication of file {} finished", file_id);
        }
        Ok(was_in_flight)
    }

    pub fn fetch_failed(&mut self, file_id: &str, object_no: u64) -> Result<bool> {
        let strategy = self.strategy_mut(file_id)?;
        let was_in_flight = strategy.fetch_failed(object_no);
        if was_in_flight {
            tracing::debug!(
                "Fetch of object {} of file {} failed, requeued",
                object_no,
                file_id
            );
        }
        Ok(was_in_flight)
    }

    pub fn close_file(&mut self, file_id: &str) -> Option<TransferStrategy<L>> {
        let strategy = self.files.remove(file_id);
        if let Some(strategy) = &strategy {
            tracing::info!(
                "Closed file {} with {} objects still queued",
                file_id,
                strategy.objects_count()
            );
        }
        strategy
    }

    pub fn get(&self, file_id: &str) -> Option<&TransferStrategy<L>> {
        self.files.get(file_id)
    }

    pub fn get_mut(&mut self, file_id: &str) -> Option<&mut TransferStrategy<L>> {
        self.files.get_mut(file_id)
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.files.contains_key(file_id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn strategy_mut(&mut self, file_id: &str) -> Result<&mut TransferStrategy<L>> {
        self.files
            .get_mut(file_id)
            .ok_or_else(|| ReplError::InvalidRequest(format!("file {} is not replicating", file_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags;
    use crate::transfer::layout::{PeerRef, Raid0Layout};

    fn layout() -> Raid0Layout {
        Raid0Layout::new(
            2,
            vec![
                vec![PeerRef::new("a0", "a:0"), PeerRef::new("a1", "a:1")],
                vec![PeerRef::new("b0", "b:0"), PeerRef::new("b1", "b:1")],
            ],
            16,
        )
        .unwrap()
    }

    #[test]
    fn finished_files_leave_the_table() {
        let mut table = TransferTable::new(TransferConfig::default());
        table
            .open_file("f1", flags::set_sequential_strategy(0), layout())
            .unwrap();
        table
            .open_file("f2", flags::set_random_strategy(0), layout())
            .unwrap();
        assert_eq!(table.len(), 2);

        table.add_object("f1", 4, true).unwrap();
        table.add_object("f1", 5, false).unwrap();
        table.add_object("f2", 1, false).unwrap();

        let next = table.select_next("f1").unwrap().unwrap();
        assert_eq!(next.object_no, 4);
        assert!(table.fetch_completed("f1", 4).unwrap());
        assert!(table.contains("f1"));

        let next = table.select_next("f1").unwrap().unwrap();
        assert_eq!(next.object_no, 5);
        assert!(table.fetch_failed("f1", 5).unwrap());
        let retry = table.select_next("f1").unwrap().unwrap();
        assert_eq!(retry.object_no, 5);
        assert!(table.fetch_completed("f1", 5).unwrap());
        assert!(!table.contains("f1"));

        assert!(table.contains("f2"));
        assert!(matches!(
            table.select_next("f1"),
            Err(ReplError::InvalidRequest(_))
        ));
    }

    #[test]
    fn reopening_keeps_queued_objects() {
        let mut table = TransferTable::new(TransferConfig::default());
        table
            .open_file("f1", flags::set_sequential_prefetching_strategy(0), layout())
            .unwrap();
        table.add_object("f1", 3, false).unwrap();
        table
            .open_file("f1", flags::set_random_strategy(0), layout())
            .unwrap();

        let strategy = table.get("f1").unwrap();
        assert_eq!(strategy.kind(), flags::StrategyKind::SequentialPrefetching);
        assert_eq!(strategy.objects_count(), 1);

        let closed = table.close_file("f1").unwrap();
        assert!(closed.is_required(3));
        assert!(table.is_empty());
    }

    #[test]
    fn unknown_strategy_is_not_tracked() {
        let mut table: TransferTable<Raid0Layout> = TransferTable::new(TransferConfig::default());
        assert!(matches!(
            table.open_file("f1", flags::set_full_replica(0), layout()),
            Err(ReplError::UnsupportedStrategy(_))
        ));
        assert!(!table.contains("f1"));
        assert!(table.add_object("f1", 0, true).is_err());
    }
}
