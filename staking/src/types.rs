//! Opaque identifiers used at the engine's API boundary.
//!
//! Token types, user identities, and object handles are all opaque to the
//! accounting core: it compares them for equality and orders them for
//! deterministic iteration, nothing more.  The surrounding system decides
//! what they actually denote.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::{
        fmt,
        sync::atomic::{AtomicU64, Ordering},
    },
};

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// Opaque identifier of a token type (e.g. `"smvr::SMVR"`).
///
/// The pool's principal balance and every incentive program's balance are
/// each tagged with exactly one `TokenType`; all custody transfers check the
/// tag before moving value.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, BorshSerialize,
    BorshDeserialize,
)]
pub struct TokenType(String);

impl TokenType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TokenType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// User identity
// ---------------------------------------------------------------------------

/// Opaque 32-byte user identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct UserId([u8; 32]);

impl UserId {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns a process-unique identity.  Intended for tests and local
    /// simulation; real identities come from the surrounding system.
    pub fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes());
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object handles
// ---------------------------------------------------------------------------

/// Stable identifier of an incentive program, assigned at creation from the
/// pool's monotonic counter and never reused.
///
/// Distinct from the *positional* `program_idx` used by the admin API: the
/// position of a program in the registry shifts when an earlier program is
/// removed, the id never does.  User ledgers snapshot indexes by id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct ProgramId(pub u64);

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program-{}", self.0)
    }
}

/// Process-unique pool handle identity, used to attribute events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    BorshSerialize, BorshDeserialize,
)]
pub struct PoolId(u64);

impl PoolId {
    pub(crate) fn new_unique() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Admin capability
// ---------------------------------------------------------------------------

/// Capability token required by every admin operation.
///
/// Possession is authority: the engine never inspects the value, it only
/// demands that one be presented.  The first cap is minted once at
/// deployment by the embedding system; the holder may duplicate it to
/// delegate admin rights.
#[derive(Debug)]
pub struct AdminCap {
    _marker: (),
}

impl AdminCap {
    /// Mints a capability.  Deployment-time action of the embedding system;
    /// access control over *who* may call this is outside the core.
    pub fn new() -> Self {
        Self { _marker: () }
    }

    /// Duplicates the capability, delegating admin rights to another holder.
    pub fn duplicate(&self) -> AdminCap {
        Self { _marker: () }
    }
}

impl Default for AdminCap {
    fn default() -> Self {
        Self::new()
    }
}
