use crate::error::{ReplError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

/// A half-open byte range `[start, end)` last written under `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
    pub version: u64,
}

impl Interval {
    pub fn new(start: u64, end: u64, version: u64) -> Result<Self> {
        if start >= end {
            return Err(ReplError::InvalidRange { start, end });
        }
        Ok(Self {
            start,
            end,
            version,
        })
    }

    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    end: u64,
    version: u64,
}

/// Ordered, non-overlapping index of the latest version for every written
/// byte of one file.
///
/// Intervals are keyed by `start` in a B-tree, so lookups and inserts are
/// logarithmic. An insert touching `k` stored intervals costs
/// `O(log n + k)`.
#[derive(Debug, Clone, Default)]
pub struct IntervalVersionTree {
    spans: BTreeMap<u64, Span>,
    overwrites: u64,
}

impl IntervalVersionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `[start, end)` as written by `version`. Stored intervals fully
    /// inside the range are dropped, partially overlapping ones keep only the
    /// parts outside of it.
    pub fn insert(&mut self, start: u64, end: u64, version: u64) -> Result<()> {
        let interval = Interval::new(start, end, version)?;
        self.insert_interval(interval);
        Ok(())
    }

    pub fn insert_interval(&mut self, interval: Interval) {
        let Interval {
            start,
            end,
            version,
        } = interval;
        debug_assert!(start < end);

        // An interval starting left of `start` may reach into the new range.
        if let Some((&left_start, &left)) = self.spans.range(..start).next_back() {
            if left.end > start {
                self.spans.insert(
                    left_start,
                    Span {
                        end: start,
                        version: left.version,
                    },
                );
                if left.end > end {
                    self.spans.insert(
                        end,
                        Span {
                            end: left.end,
                            version: left.version,
                        },
                    );
                }
                self.overwrites += 1;
            }
        }

        let covered: Vec<u64> = self.spans.range(start..end).map(|(&key, _)| key).collect();
        for key in covered {
            if let Some(span) = self.spans.remove(&key) {
                if span.end > end {
                    self.spans.insert(
                        end,
                        Span {
                            end: span.end,
                            version: span.version,
                        },
                    );
                }
                self.overwrites += 1;
            }
        }

        self.spans.insert(start, Span { end, version });
    }

    /// Stored intervals intersecting `[start, end)` in ascending order, as
    /// stored (not clipped to the query window). Unwritten gaps are absent.
    pub fn get_versions(&self, start: u64, end: u64) -> Result<Vec<Interval>> {
        if start >= end {
            return Err(ReplError::InvalidRange { start, end });
        }

        let mut versions = Vec::new();
        if let Some((&left_start, &left)) = self.spans.range(..start).next_back() {
            let left = to_interval(left_start, left);
            if left.overlaps(start, end) {
                versions.push(left);
            }
        }
        versions.extend(
            self.spans
                .range(start..end)
                .map(|(&key, &span)| to_interval(key, span)),
        );
        Ok(versions)
    }

    /// Version of the interval holding byte `offset`, if it was ever written.
    pub fn version_at(&self, offset: u64) -> Option<u64> {
        self.spans
            .range(..=offset)
            .next_back()
            .filter(|(_, span)| span.end > offset)
            .map(|(_, span)| span.version)
    }

    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.spans.iter().map(|(&key, &span)| to_interval(key, span))
    }

    /// Intervals stored strictly after `offset` by start.
    pub fn iter_after(&self, offset: u64) -> impl Iterator<Item = Interval> + '_ {
        self.spans
            .range((Excluded(offset), Unbounded))
            .map(|(&key, &span)| to_interval(key, span))
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn max_end(&self) -> Option<u64> {
        self.spans.last_key_value().map(|(_, span)| span.end)
    }

    /// Number of stored intervals dropped or cut by later inserts. A high
    /// count relative to `len()` means the backing log has a lot of
    /// superseded records.
    pub fn overwrites(&self) -> u64 {
        self.overwrites
    }
}

fn to_interval(start: u64, span: Span) -> Interval {
    Interval {
        start,
        end: span.end,
        version: span.version,
    }
}
