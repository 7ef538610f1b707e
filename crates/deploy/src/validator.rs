//! Storage layout validation hook run before every upgrade.

use alloy_core::primitives::Address;

use crate::ImplementationRecord;

/// Reference to one side of an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplementationRef<'a> {
    /// The implementation behind `proxy` before the upgrade, as read from the
    /// proxy or, for beacon proxies, from its beacon. `None` if the read failed.
    Current {
        proxy: Address,
        implementation: Option<Address>,
    },
    /// A freshly deployed implementation.
    Deployed(&'a ImplementationRecord),
}

/// Decides whether an implementation pair is storage-compatible.
///
/// Returning `Err` aborts the upgrade before any upgrade transaction is sent.
pub trait StorageLayoutValidator: Send + Sync {
    fn validate(
        &self,
        old: &ImplementationRef<'_>,
        new: &ImplementationRef<'_>,
    ) -> Result<(), String>;
}

/// Accepts every pair. This is the default until a structural diff exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl StorageLayoutValidator for PassThrough {
    fn validate(&self, _: &ImplementationRef<'_>, _: &ImplementationRef<'_>) -> Result<(), String> {
        Ok(())
    }
}

impl<F> StorageLayoutValidator for F
where
    F: Fn(&ImplementationRef<'_>, &ImplementationRef<'_>) -> Result<(), String> + Send + Sync,
{
    fn validate(
        &self,
        old: &ImplementationRef<'_>,
        new: &ImplementationRef<'_>,
    ) -> Result<(), String> {
        self(old, new)
    }
}
