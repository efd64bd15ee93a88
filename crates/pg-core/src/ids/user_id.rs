use serde::{Deserialize, Serialize};

/// Identity of a signed-in account, as issued by the auth provider.
///
/// Purchase receipts attach to this identity once the entitlement oracle
/// has been told about it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl_id!(UserId);
