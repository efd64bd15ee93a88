use serde::{Deserialize, Serialize};

/// Identifier of one gated content unit (a daily puzzle).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl_id!(ContentId);
