//! Bounded slots for concurrently running users.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of users running at once.
///
/// A slot is an owned semaphore permit that travels into the user task and
/// is released when the task ends, whichever way it ends. Clones share the
/// same underlying slots.
#[derive(Clone)]
pub struct UserSlots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl UserSlots {
    pub fn new(max_concurrent_users: u32) -> Self {
        let capacity = max_concurrent_users as usize;
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits until a slot is free and claims it.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("slot semaphore is never closed")
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of users currently holding a slot.
    pub fn active(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn slots_are_accounted_and_returned_on_drop() {
        let slots = UserSlots::new(2);
        assert_eq!(slots.active(), 0);

        let first = slots.acquire().await;
        let second = slots.acquire().await;
        assert_eq!(slots.active(), 2);

        drop(first);
        assert_eq!(slots.active(), 1);
        drop(second);
        assert_eq!(slots.active(), 0);
    }

    #[tokio::test]
    async fn acquire_blocks_at_capacity_until_a_slot_frees() {
        let slots = UserSlots::new(1);
        let held = slots.acquire().await;

        let blocked = timeout(Duration::from_millis(50), slots.acquire()).await;
        assert!(blocked.is_err(), "acquire should block while slot is held");

        drop(held);
        let granted = timeout(Duration::from_millis(50), slots.acquire()).await;
        assert!(granted.is_ok(), "acquire should succeed once slot is free");
    }

    #[tokio::test]
    async fn clones_share_the_same_slots() {
        let slots = UserSlots::new(1);
        let clone = slots.clone();

        let _held = slots.acquire().await;
        assert_eq!(clone.active(), 1);
        assert_eq!(clone.capacity(), 1);
    }
}
