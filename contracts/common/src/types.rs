//! Core Types for TermVault
//!
//! Fundamental data structures shared by all contracts.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, TermVaultEvent};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for asset identifiers
pub type AssetId = [u8; 32];

/// The zero address, never a valid operator
pub const ZERO_ADDRESS: Address = [0u8; 32];

// ============ Pool Types ============

/// Lifecycle state of an investor pool.
///
/// The state is derived from stored flags and the current time; see
/// `InvestorPool::current_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolState {
    /// Registered, collateral not posted yet
    #[default]
    Created,
    /// Collateral posted, deposit window running
    Opened,
    /// Minimum reached at stage time; positions can be exited and re-staked
    Active,
    /// Cancelled by the operator or minimum not reached at stage time
    Reverted,
    /// Operator funded the settlement and the term ended
    Liquidated,
    /// Operator did not settle before the grace deadline
    Dishonored,
    /// Operator recovered the remaining collateral
    Closed,
}

impl PoolState {
    /// State name for display and indexing
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Opened => "Opened",
            Self::Active => "Active",
            Self::Reverted => "Reverted",
            Self::Liquidated => "Liquidated",
            Self::Dishonored => "Dishonored",
            Self::Closed => "Closed",
        }
    }

    /// No further transition out of this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Reverted | Self::Liquidated | Self::Dishonored | Self::Closed
        )
    }

    /// Participants may claim their settlement
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Liquidated | Self::Dishonored | Self::Closed)
    }
}

// ============ Call Context ============

/// Environment of a single contract call: who calls, when, and the
/// events the call emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller
    pub caller: Address,
    /// Current timestamp in seconds
    pub now: u64,
    /// Events emitted during this call
    pub events: EventLog,
}

impl CallContext {
    /// Create a context with an empty event log
    pub fn new(caller: Address, now: u64) -> Self {
        Self {
            caller,
            now,
            events: EventLog::new(),
        }
    }

    /// Record an event
    pub fn emit(&mut self, event: TermVaultEvent) {
        self.events.emit(event);
    }
}
