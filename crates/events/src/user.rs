use medtrack_core::UserId;

use crate::EventEnvelope;

/// Helper trait for user-scoped messages.
///
/// Marks types that carry an owning user, enabling user-aware processing in
/// consumer loops (workers, handlers).
///
/// ## Use Cases
///
/// - **Worker pinning**: a worker can be pinned to one user and ignore
///   everything else (defense in depth)
/// - **Message filtering**: filter messages by user in subscription loops
///
/// `EventEnvelope` implements this trait; other message types can implement
/// it if they need user scoping.
pub trait UserScoped {
    fn user_id(&self) -> UserId;
}

impl<E> UserScoped for EventEnvelope<E> {
    fn user_id(&self) -> UserId {
        self.user_id()
    }
}
