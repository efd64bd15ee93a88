use crate::access::AccessReason;
use crate::ids::ContentId;

/// Navigation side effect of a denied gate.
///
/// Called from render code, so it must not block. Implementations enqueue
/// the navigation on the UI loop.
pub trait NavigatorPort: Send + Sync {
    fn navigate_away(&self, content_id: &ContentId, reason: AccessReason);
}

#[cfg(test)]
mockall::mock! {
    pub Navigator {}

    impl NavigatorPort for Navigator {
        fn navigate_away(&self, content_id: &ContentId, reason: AccessReason);
    }
}
