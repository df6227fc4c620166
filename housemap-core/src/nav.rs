//! Navigation signal bus
//!
//! A single-slot channel carrying "jump to this coordinate" requests from the
//! list surface to the map surface. The slot starts empty (`None`). New
//! subscribers see the current slot value first and then every value
//! published after they subscribed, in publication order.

use crate::types::JumpRequest;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const BUS_CAPACITY: usize = 16;

/// Value carried by the bus: a pending jump or "nothing pending".
pub type JumpSignal = Option<JumpRequest>;

#[derive(Clone)]
pub struct NavigationBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    // Guards publication so a subscriber never misses or double-sees the
    // value current at subscription time.
    slot: Mutex<JumpSignal>,
    tx: broadcast::Sender<JumpSignal>,
}

impl NavigationBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            inner: Arc::new(BusInner { slot: Mutex::new(None), tx }),
        }
    }

    /// Publish a jump request; it replaces any request not yet consumed.
    pub fn jump_to(&self, request: JumpRequest) {
        log::debug!("Jump requested to {}, {}", request.lat, request.lng);
        self.publish(Some(request));
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    pub fn current(&self) -> JumpSignal {
        *self.inner.slot.lock()
    }

    pub fn subscribe(&self) -> JumpSubscription {
        let slot = self.inner.slot.lock();
        JumpSubscription {
            replay: Some(*slot),
            rx: self.inner.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    fn publish(&self, signal: JumpSignal) {
        let mut slot = self.inner.slot.lock();
        *slot = signal;
        // No receivers is fine: the slot still holds the value for replay.
        let _ = self.inner.tx.send(signal);
    }
}

impl Default for NavigationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving end of the bus. Dropping it unsubscribes.
pub struct JumpSubscription {
    replay: Option<JumpSignal>,
    rx: broadcast::Receiver<JumpSignal>,
}

impl JumpSubscription {
    /// Wait for the next value. Returns `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<JumpSignal> {
        if let Some(signal) = self.replay.take() {
            return Some(signal);
        }
        loop {
            match self.rx.recv().await {
                Ok(signal) => return Some(signal),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Navigation subscriber lagged, skipped {} signals", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next value if one is already available.
    pub fn try_next(&mut self) -> Option<JumpSignal> {
        if let Some(signal) = self.replay.take() {
            return Some(signal);
        }
        loop {
            match self.rx.try_recv() {
                Ok(signal) => return Some(signal),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Navigation subscriber lagged, skipped {} signals", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump(lat: f64, lng: f64) -> JumpRequest {
        JumpRequest { lat, lng, zoom: Some(16.0) }
    }

    #[test]
    fn test_new_subscriber_replays_empty_slot() {
        let bus = NavigationBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(sub.try_next(), Some(None));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_subscriber_after_clear_sees_none() {
        let bus = NavigationBus::new();
        bus.jump_to(jump(1.0, 2.0));
        bus.clear();
        let mut sub = bus.subscribe();
        assert_eq!(sub.try_next(), Some(None));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_active_subscriber_sees_jump_then_clear() {
        let bus = NavigationBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(sub.try_next(), Some(None));

        bus.jump_to(jump(1.0, 2.0));
        bus.clear();
        assert_eq!(sub.try_next(), Some(Some(jump(1.0, 2.0))));
        assert_eq!(sub.try_next(), Some(None));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_most_recent_jump_wins() {
        let bus = NavigationBus::new();
        bus.jump_to(jump(1.0, 1.0));
        bus.jump_to(jump(2.0, 2.0));
        assert_eq!(bus.current(), Some(jump(2.0, 2.0)));
        let mut late = bus.subscribe();
        assert_eq!(late.try_next(), Some(Some(jump(2.0, 2.0))));
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let bus = NavigationBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_async_next_waits_for_publication() {
        let bus = NavigationBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(sub.next().await, Some(None));

        let publisher = bus.clone();
        let waiter = tokio::spawn(async move { sub.next().await });
        tokio::task::yield_now().await;
        publisher.jump_to(jump(3.0, 4.0));
        assert_eq!(waiter.await.unwrap(), Some(Some(jump(3.0, 4.0))));
    }
}
