//! Bit layout of the 32-bit replication descriptor stored with every replica
//! in a file's location record.
//!
//! The strategy bits are mutually exclusive; the setters enforce that by
//! clearing the whole strategy group before setting one bit. Fullness is a
//! single bit: unset means the replica is partial.

use serde::{Deserialize, Serialize};

pub const IS_COMPLETE: u32 = 0x01;
pub const FULL_REPLICA: u32 = 0x02;
pub const STRATEGY_RANDOM: u32 = 0x04;
pub const STRATEGY_RAREST_FIRST: u32 = 0x08;
pub const STRATEGY_SEQUENTIAL: u32 = 0x10;
pub const STRATEGY_SEQUENTIAL_PREFETCHING: u32 = 0x20;

pub const STRATEGY_BITS: u32 =
    STRATEGY_RANDOM | STRATEGY_RAREST_FIRST | STRATEGY_SEQUENTIAL | STRATEGY_SEQUENTIAL_PREFETCHING;
pub const OTHER_BITS: u32 = IS_COMPLETE | FULL_REPLICA;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    RarestFirst,
    Sequential,
    SequentialPrefetching,
}

impl StrategyKind {
    pub fn bit(self) -> u32 {
        match self {
            StrategyKind::Random => STRATEGY_RANDOM,
            StrategyKind::RarestFirst => STRATEGY_RAREST_FIRST,
            StrategyKind::Sequential => STRATEGY_SEQUENTIAL,
            StrategyKind::SequentialPrefetching => STRATEGY_SEQUENTIAL_PREFETCHING,
        }
    }

    /// Decodes the strategy group of `flags`. `None` if no strategy bit or
    /// more than one is set.
    pub fn from_flags(flags: u32) -> Option<Self> {
        match get_strategy(flags) {
            STRATEGY_RANDOM => Some(StrategyKind::Random),
            STRATEGY_RAREST_FIRST => Some(StrategyKind::RarestFirst),
            STRATEGY_SEQUENTIAL => Some(StrategyKind::Sequential),
            STRATEGY_SEQUENTIAL_PREFETCHING => Some(StrategyKind::SequentialPrefetching),
            _ => None,
        }
    }
}

fn set_strategy(flags: u32, bit: u32) -> u32 {
    (flags & !STRATEGY_BITS) | bit
}

pub fn set_random_strategy(flags: u32) -> u32 {
    set_strategy(flags, STRATEGY_RANDOM)
}

pub fn set_rarest_first_strategy(flags: u32) -> u32 {
    set_strategy(flags, STRATEGY_RAREST_FIRST)
}

pub fn set_sequential_strategy(flags: u32) -> u32 {
    set_strategy(flags, STRATEGY_SEQUENTIAL)
}

pub fn set_sequential_prefetching_strategy(flags: u32) -> u32 {
    set_strategy(flags, STRATEGY_SEQUENTIAL_PREFETCHING)
}

pub fn set_strategy_kind(flags: u32, kind: StrategyKind) -> u32 {
    set_strategy(flags, kind.bit())
}

pub fn get_strategy(flags: u32) -> u32 {
    flags & STRATEGY_BITS
}

pub fn contains_strategy(flags: u32) -> bool {
    get_strategy(flags) != 0
}

pub fn is_random_strategy(flags: u32) -> bool {
    get_strategy(flags) == STRATEGY_RANDOM
}

pub fn is_rarest_first_strategy(flags: u32) -> bool {
    get_strategy(flags) == STRATEGY_RAREST_FIRST
}

pub fn is_sequential_strategy(flags: u32) -> bool {
    get_strategy(flags) == STRATEGY_SEQUENTIAL
}

pub fn is_sequential_prefetching_strategy(flags: u32) -> bool {
    get_strategy(flags) == STRATEGY_SEQUENTIAL_PREFETCHING
}

pub fn set_replica_is_complete(flags: u32) -> u32 {
    flags | IS_COMPLETE
}

pub fn set_replica_is_not_complete(flags: u32) -> u32 {
    flags & !IS_COMPLETE
}

pub fn is_replica_complete(flags: u32) -> bool {
    flags & IS_COMPLETE != 0
}

pub fn set_full_replica(flags: u32) -> u32 {
    flags | FULL_REPLICA
}

pub fn set_partial_replica(flags: u32) -> u32 {
    flags & !FULL_REPLICA
}

pub fn is_full_replica(flags: u32) -> bool {
    flags & FULL_REPLICA != 0
}

pub fn is_partial_replica(flags: u32) -> bool {
    !is_full_replica(flags)
}
