//! Protocol Events for TermVault
//!
//! Every successful state change emits a typed event. Events are collected
//! on the call's [`CallContext`](crate::types::CallContext) and can be
//! indexed off-chain for dashboards, accounting and notifications.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::{Address, AssetId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Pool Lifecycle Events (0x01 - 0x1F)
    PoolOpened = 0x01,
    PoolReverted = 0x02,
    PoolLiquidated = 0x03,
    PoolDishonored = 0x04,
    PoolClosed = 0x05,
    ExchangeRateUpdated = 0x06,

    // Position Events (0x20 - 0x3F)
    Deposited = 0x20,
    Withdrawn = 0x21,
    Exited = 0x22,
    Restaked = 0x23,
    Unstaked = 0x24,
    Claimed = 0x25,

    // Operator Events (0x40 - 0x5F)
    DepositPulled = 0x40,
    AssetRescued = 0x41,

    // Registry Events (0x60 - 0x7F)
    PoolCreated = 0x60,
    OwnerChanged = 0x61,

    // Vesting Events (0x80 - 0x9F)
    VestingReleased = 0x80,
    RecipientChanged = 0x81,
}

/// Main event enum containing all TermVault events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TermVaultEvent {
    // ============ Pool Lifecycle Events ============

    /// Operator posted the collateral for the full capacity
    PoolOpened {
        pool: Address,
        operator: Address,
        collateral_locked: u128,
        timestamp: u64,
    },

    /// Pool was cancelled and the operator's collateral refunded
    PoolReverted {
        pool: Address,
        collateral_refunded: u128,
        timestamp: u64,
    },

    /// Operator funded the settlement in deposit asset
    PoolLiquidated {
        pool: Address,
        obligation: u128,
        pulled: u128,
        /// Deposit asset held beyond the obligation, sent to the operator
        refunded: u128,
        timestamp: u64,
    },

    /// Grace deadline passed without settlement; balances snapshotted
    PoolDishonored {
        pool: Address,
        deposit_balance: u128,
        collateral_balance: u128,
        timestamp: u64,
    },

    /// Operator recovered what participants are no longer owed
    PoolClosed {
        pool: Address,
        deposit_returned: u128,
        collateral_returned: u128,
        timestamp: u64,
    },

    /// Operator changed the exchange rate and collateral was re-sized
    ExchangeRateUpdated {
        pool: Address,
        old_rate: u128,
        new_rate: u128,
        collateral_pulled: u128,
        collateral_refunded: u128,
        timestamp: u64,
    },

    // ============ Position Events ============

    /// Depositor committed principal
    Deposited {
        pool: Address,
        depositor: Address,
        amount: u128,
        total_funded: u128,
        timestamp: u64,
    },

    /// Depositor took principal back before stage time or after revert
    Withdrawn {
        pool: Address,
        depositor: Address,
        to: Address,
        amount: u128,
        total_funded: u128,
        timestamp: u64,
    },

    /// Depositor redeemed principal for collateral
    Exited {
        pool: Address,
        depositor: Address,
        to: Address,
        amount: u128,
        collateral_paid: u128,
        timestamp: u64,
    },

    /// Third party posted collateral into the uncollateralized gap
    Restaked {
        pool: Address,
        staker: Address,
        amount: u128,
        total_restaked: u128,
        timestamp: u64,
    },

    /// Re-staker withdrew collateral
    Unstaked {
        pool: Address,
        staker: Address,
        to: Address,
        amount: u128,
        total_restaked: u128,
        timestamp: u64,
    },

    /// Participant claimed their settlement
    Claimed {
        pool: Address,
        claimant: Address,
        to: Address,
        deposit_amount: u128,
        collateral_amount: u128,
        timestamp: u64,
    },

    // ============ Operator Events ============

    /// Operator took the pooled deposit asset
    DepositPulled {
        pool: Address,
        operator: Address,
        amount: u128,
        timestamp: u64,
    },

    /// Unrelated asset swept to the operator
    AssetRescued {
        pool: Address,
        asset: AssetId,
        amount: u128,
        timestamp: u64,
    },

    // ============ Registry Events ============

    /// Registry deployed a new pool
    PoolCreated {
        registry: Address,
        pool: Address,
        operator: Address,
        start_time: u64,
        timestamp: u64,
    },

    /// Registry owner transferred
    OwnerChanged {
        registry: Address,
        old_owner: Address,
        new_owner: Address,
        timestamp: u64,
    },

    // ============ Vesting Events ============

    /// Vested tokens released to the recipient
    VestingReleased {
        schedule: Address,
        recipient: Address,
        amount: u128,
        total_released: u128,
        timestamp: u64,
    },

    /// Recipient handed the schedule to a new address
    RecipientChanged {
        schedule: Address,
        old_recipient: Address,
        new_recipient: Address,
        timestamp: u64,
    },
}

impl TermVaultEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PoolOpened { .. } => EventType::PoolOpened,
            Self::PoolReverted { .. } => EventType::PoolReverted,
            Self::PoolLiquidated { .. } => EventType::PoolLiquidated,
            Self::PoolDishonored { .. } => EventType::PoolDishonored,
            Self::PoolClosed { .. } => EventType::PoolClosed,
            Self::ExchangeRateUpdated { .. } => EventType::ExchangeRateUpdated,
            Self::Deposited { .. } => EventType::Deposited,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::Exited { .. } => EventType::Exited,
            Self::Restaked { .. } => EventType::Restaked,
            Self::Unstaked { .. } => EventType::Unstaked,
            Self::Claimed { .. } => EventType::Claimed,
            Self::DepositPulled { .. } => EventType::DepositPulled,
            Self::AssetRescued { .. } => EventType::AssetRescued,
            Self::PoolCreated { .. } => EventType::PoolCreated,
            Self::OwnerChanged { .. } => EventType::OwnerChanged,
            Self::VestingReleased { .. } => EventType::VestingReleased,
            Self::RecipientChanged { .. } => EventType::RecipientChanged,
        }
    }

    /// Get the timestamp when the event occurred
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::PoolOpened { timestamp, .. }
            | Self::PoolReverted { timestamp, .. }
            | Self::PoolLiquidated { timestamp, .. }
            | Self::PoolDishonored { timestamp, .. }
            | Self::PoolClosed { timestamp, .. }
            | Self::ExchangeRateUpdated { timestamp, .. }
            | Self::Deposited { timestamp, .. }
            | Self::Withdrawn { timestamp, .. }
            | Self::Exited { timestamp, .. }
            | Self::Restaked { timestamp, .. }
            | Self::Unstaked { timestamp, .. }
            | Self::Claimed { timestamp, .. }
            | Self::DepositPulled { timestamp, .. }
            | Self::AssetRescued { timestamp, .. }
            | Self::PoolCreated { timestamp, .. }
            | Self::OwnerChanged { timestamp, .. }
            | Self::VestingReleased { timestamp, .. }
            | Self::RecipientChanged { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event collector for a single call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<TermVaultEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: TermVaultEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[TermVaultEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<TermVaultEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&TermVaultEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&TermVaultEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
