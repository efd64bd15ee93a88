//! Port interfaces for the application layer
//!
//! Ports define the contract between the use cases and the external
//! collaborators: the purchase SDK, the remote profile store, the on-device
//! catalog, the auth provider and the UI shell. Implementations live in the
//! infrastructure layer or in the host application.
//!
//! Every async port is a suspension point. Callers must assume the world may
//! have changed (identity switched, gate unmounted) by the time it returns.

pub mod auth;
mod clock;
pub mod entitlement_oracle;
pub mod local_grants;
pub mod navigator;
pub mod premium_refresh;
pub mod profile_mirror;
pub mod restore_flag;

pub use auth::{AuthPort, AuthState};
pub use clock::*;
pub use entitlement_oracle::{EntitlementError, EntitlementOraclePort};
pub use local_grants::{GrantStoreError, LocalGrantStorePort};
pub use navigator::NavigatorPort;
pub use premium_refresh::PremiumRefreshPort;
pub use profile_mirror::{ProfileMirrorError, ProfileMirrorPort};
pub use restore_flag::SilentRestoreFlagPort;
