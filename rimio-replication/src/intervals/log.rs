use crate::config::LogConfig;
use crate::error::{ReplError, Result};
use crate::intervals::tree::{Interval, IntervalVersionTree};
use bytes::{Buf, BufMut, BytesMut};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Size of one log record: big-endian `i64 start, i64 end, i64 version`.
pub const RECORD_SIZE: usize = 24;

pub fn encode_record(interval: &Interval, buf: &mut BytesMut) {
    buf.reserve(RECORD_SIZE);
    buf.put_i64(interval.start as i64);
    buf.put_i64(interval.end as i64);
    buf.put_i64(interval.version as i64);
}

/// Decodes one record from the front of `buf`. `buf` must hold at least
/// `RECORD_SIZE` bytes.
pub fn decode_record(buf: &mut impl Buf) -> Result<Interval> {
    if buf.remaining() < RECORD_SIZE {
        return Err(ReplError::Internal(format!(
            "record needs {} bytes, {} available",
            RECORD_SIZE,
            buf.remaining()
        )));
    }
    let start = buf.get_i64() as u64;
    let end = buf.get_i64() as u64;
    let version = buf.get_i64() as u64;
    Interval::new(start, end, version)
}

/// Replays every complete record of `source` into `tree` and returns the
/// number of records applied.
///
/// A trailing fragment shorter than a record fails with `LogCorruption`
/// after all records before it have been applied.
pub fn load(tree: &mut IntervalVersionTree, mut source: impl Read) -> Result<u64> {
    let mut record = [0u8; RECORD_SIZE];
    let mut applied = 0u64;

    loop {
        let filled = read_full(&mut source, &mut record)?;
        let offset = applied * RECORD_SIZE as u64;
        if filled == 0 {
            return Ok(applied);
        }
        if filled < RECORD_SIZE {
            return Err(ReplError::LogCorruption {
                offset,
                trailing: filled as u64,
                reason: "truncated record".to_string(),
            });
        }

        let interval =
            decode_record(&mut &record[..]).map_err(|err| ReplError::LogCorruption {
                offset,
                trailing: RECORD_SIZE as u64,
                reason: err.to_string(),
            })?;
        tree.insert_interval(interval);
        applied += 1;
    }
}

fn read_full(source: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}

/// Append-only log backing the interval tree of one file.
///
/// Every append reaches the file (and, with `sync_on_append`, the disk)
/// before the tree is updated, so replaying the file rebuilds exactly the
/// committed state.
pub struct IntervalVersionLog {
    path: PathBuf,
    file: File,
    tree: IntervalVersionTree,
    records: u64,
    sync_on_append: bool,
}

impl IntervalVersionLog {
    pub fn open(path: impl AsRef<Path>, config: &LogConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut tree = IntervalVersionTree::new();
        let replay = load(&mut tree, BufReader::new(&mut file));
        let records = match replay {
            Ok(records) => records,
            Err(ReplError::LogCorruption {
                offset, trailing, ..
            }) if config.truncate_corrupt_tail => {
                tracing::warn!(
                    "Truncating interval log {:?} at byte {} ({} trailing bytes dropped)",
                    path,
                    offset,
                    trailing
                );
                file.set_len(offset)?;
                file.sync_all()?;
                offset / RECORD_SIZE as u64
            }
            Err(err) => return Err(err),
        };
        file.seek(SeekFrom::End(0))?;

        tracing::info!(
            "Opened interval log {:?}: {} records, {} intervals",
            path,
            records,
            tree.len()
        );

        Ok(Self {
            path,
            file,
            tree,
            records,
            sync_on_append: config.sync_on_append,
        })
    }

    /// Durably appends `interval`, then applies it to the tree.
    pub fn append(&mut self, interval: Interval) -> Result<()> {
        if interval.start >= interval.end {
            return Err(ReplError::InvalidRange {
                start: interval.start,
                end: interval.end,
            });
        }

        let mut buf = BytesMut::with_capacity(RECORD_SIZE);
        encode_record(&interval, &mut buf);
        self.file.write_all(&buf)?;
        if self.sync_on_append {
            self.file.sync_data()?;
        }

        self.tree.insert_interval(interval);
        self.records += 1;
        tracing::debug!(
            "Appended interval [{}, {}) version {} to {:?}",
            interval.start,
            interval.end,
            interval.version,
            self.path
        );
        Ok(())
    }

    pub fn tree(&self) -> &IntervalVersionTree {
        &self.tree
    }

    pub fn get_versions(&self, start: u64, end: u64) -> Result<Vec<Interval>> {
        self.tree.get_versions(start, end)
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
