//! Error Types for TermVault
//!
//! Every fallible operation in the pool, registry and vesting contracts
//! returns [`TermVaultResult`]. Each variant maps to a stable code through
//! [`TermVaultError::code`] so callers and indexers can match on a string
//! without depending on the enum layout.

use core::fmt;

use crate::types::{Address, AssetId, PoolState};

/// Result type alias for TermVault operations
pub type TermVaultResult<T> = Result<T, TermVaultError>;

/// Reason a set of pool terms was rejected by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermsViolation {
    /// Operator is the zero address
    ZeroOperator,
    /// Maximum capacity is zero
    ZeroCapacity,
    /// Start time is not in the future
    StartTimeBeforeNow,
    /// Start time is not before end time
    StartAfterEnd,
    /// Start time is not before stage time
    StartAfterStage,
    /// Stage time is not before end time
    StageAfterEnd,
    /// Fee exceeds 10000 basis points
    FeeOverLimit,
    /// Exchange rate is zero
    ZeroExchangeRate,
}

impl TermsViolation {
    /// Human readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ZeroOperator => "operator is zero address",
            Self::ZeroCapacity => "maxCapacity is zero",
            Self::StartTimeBeforeNow => "startTime before now",
            Self::StartAfterEnd => "startTime after endTime",
            Self::StartAfterStage => "startTime after stageTime",
            Self::StageAfterEnd => "stageTime after endTime",
            Self::FeeOverLimit => "fee over 10000",
            Self::ZeroExchangeRate => "zero oraclePrice",
        }
    }
}

/// Reason a vesting schedule was rejected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleViolation {
    /// Vesting begins before the current time
    StartTooEarly,
    /// Cliff is before the vesting start
    CliffTooEarly,
    /// End is not after the cliff
    EndTooEarly,
}

/// Main error enum for all TermVault errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermVaultError {
    // ============ Authorization Errors ============
    /// Caller is not the pool operator
    NotOperator { expected: Address, actual: Address },

    /// Caller is not the registry owner
    NotOwner { expected: Address, actual: Address },

    /// Caller is not the vesting recipient
    NotRecipient { expected: Address, actual: Address },

    // ============ Pool State Errors ============
    /// Operation requires the Created state
    PoolNotCreated { state: PoolState },

    /// Operation requires the Opened state
    PoolNotOpened { state: PoolState },

    /// Operation requires the Active state
    PoolNotActive { state: PoolState },

    /// Operation requires a finalized pool (Liquidated, Dishonored or Closed)
    PoolNotFinalized { state: PoolState },

    /// Pool can only be reverted from Created or Opened
    NotRevertable { state: PoolState },

    /// Pool is in a terminal state and its parameters are frozen
    PoolTerminal { state: PoolState },

    /// Settlement already funded; positions are frozen
    SettlementLocked,

    // ============ Temporal Errors ============
    /// Deposit window has not started yet
    NotStarted { now: u64, start_time: u64 },

    /// Vesting cliff has not been reached
    VestingNotStarted { now: u64, cliff: u64 },

    /// Vesting schedule parameters are inconsistent
    InvalidSchedule { violation: ScheduleViolation },

    // ============ Capacity Errors ============
    /// Deposit would exceed the pool's maximum capacity
    DepositOverCapacity { requested: u128, available: u128 },

    /// Depositor has less pooled principal than requested
    InsufficientDeposit { available: u128, requested: u128 },

    /// Re-staker has less collateral staked than requested
    InsufficientRestake { available: u128, requested: u128 },

    /// Re-stake exceeds the uncollateralized gap
    NoRestakeCapacity { available: u128, requested: u128 },

    /// Caller has no entitlement in the pool
    NoClaim { account: Address },

    // ============ Asset Errors ============
    /// Account balance is too low for the transfer
    InsufficientBalance { available: u128, requested: u128 },

    /// Spender allowance is too low for the transfer
    InsufficientAllowance { available: u128, requested: u128 },

    /// No ledger registered for the asset
    UnknownAsset { asset: AssetId },

    /// Pool's own deposit or collateral asset cannot be rescued
    ProtectedAsset { asset: AssetId },

    // ============ Double Action Errors ============
    /// Account already claimed its settlement
    AlreadyClaimed { account: Address },

    /// A pool with the same operator, name and start time exists
    PoolExists { pool: Address },

    // ============ Parameter Errors ============
    /// Pool terms failed registry validation
    InvalidTerms { violation: TermsViolation },

    /// Zero amount not allowed
    ZeroAmount,

    /// Invalid input parameter
    InvalidInput {
        param: &'static str,
        reason: &'static str,
    },

    // ============ Math Errors ============
    /// Arithmetic overflow
    Overflow,

    /// Arithmetic underflow
    Underflow,

    /// Division by zero
    DivisionByZero,

    /// Pool accounting does not add up
    ConservationViolated { expected: u128, actual: u128 },
}

impl TermVaultError {
    /// Returns a unique error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOperator { .. } => "E001_NOT_OPERATOR",
            Self::NotOwner { .. } => "E002_NOT_OWNER",
            Self::NotRecipient { .. } => "E003_NOT_RECIPIENT",
            Self::PoolNotCreated { .. } => "E010_NOT_CREATE_STATE",
            Self::PoolNotOpened { .. } => "E011_POOL_NOT_OPENED",
            Self::PoolNotActive { .. } => "E012_POOL_NOT_ACTIVE",
            Self::PoolNotFinalized { .. } => "E013_POOL_NOT_FINALIZED",
            Self::NotRevertable { .. } => "E014_NOT_REVERTABLE",
            Self::PoolTerminal { .. } => "E015_POOL_TERMINAL",
            Self::SettlementLocked => "E016_SETTLEMENT_LOCKED",
            Self::NotStarted { .. } => "E020_NOT_STARTED",
            Self::VestingNotStarted { .. } => "E021_NOT_TIME_YET",
            Self::InvalidSchedule { .. } => "E022_INVALID_SCHEDULE",
            Self::DepositOverCapacity { .. } => "E030_DEPOSIT_OVER_CAPACITY",
            Self::InsufficientDeposit { .. } => "E031_NOT_ENOUGH_DEPOSIT",
            Self::InsufficientRestake { .. } => "E032_NOT_ENOUGH_RESTAKE",
            Self::NoRestakeCapacity { .. } => "E033_NO_RESTAKE_CAPACITY",
            Self::NoClaim { .. } => "E034_NO_CLAIM",
            Self::InsufficientBalance { .. } => "E040_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E041_INSUFFICIENT_ALLOWANCE",
            Self::UnknownAsset { .. } => "E042_UNKNOWN_ASSET",
            Self::ProtectedAsset { .. } => "E043_PROTECTED_ASSET",
            Self::AlreadyClaimed { .. } => "E050_ALREADY_CLAIMED",
            Self::PoolExists { .. } => "E051_POOL_EXISTS",
            Self::InvalidTerms { .. } => "E060_INVALID_TERMS",
            Self::ZeroAmount => "E061_ZERO_AMOUNT",
            Self::InvalidInput { .. } => "E062_INVALID_INPUT",
            Self::Overflow => "E090_OVERFLOW",
            Self::Underflow => "E091_UNDERFLOW",
            Self::DivisionByZero => "E092_DIVISION_BY_ZERO",
            Self::ConservationViolated { .. } => "E093_CONSERVATION_VIOLATED",
        }
    }

    /// Returns true if this error is recoverable (caller can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientBalance { .. } => true,   // Get more funds
            Self::InsufficientAllowance { .. } => true, // Approve more
            Self::NotStarted { .. } => true,            // Wait for start
            Self::VestingNotStarted { .. } => true,     // Wait for cliff
            _ => false,
        }
    }
}

impl fmt::Display for TermVaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTerms { violation } => {
                write!(f, "{}: {}", self.code(), violation.reason())
            }
            Self::InvalidInput { param, reason } => {
                write!(f, "{}: {} {}", self.code(), param, reason)
            }
            _ => f.write_str(self.code()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TermVaultError {}
