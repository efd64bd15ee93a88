//! Entitlement domain models.
//!
//! An entitlement is the purchase platform's confirmation that an identity
//! holds premium access. The platform SDK keeps its own local cache; the
//! types here are immutable snapshots of that cache.

mod premium_status;
mod snapshot;

pub use premium_status::{PremiumSource, PremiumStatus};
pub use snapshot::EntitlementSnapshot;
