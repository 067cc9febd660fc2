//! Host suspend/resume notifications.
//!
//! The engine subscribes to a [`LifecycleSource`] when it is built and
//! unsubscribes when it is torn down. The host pushes events through a
//! [`LifecycleNotifier`] and then lets the engine drain them with
//! [`TimerEngine::pump_lifecycle`](super::TimerEngine::pump_lifecycle).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    /// Host went to the background or became inactive.
    Suspended,
    /// Host came back to the foreground.
    Resumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

pub trait LifecycleSource: Send {
    fn subscribe(&mut self) -> Subscription;

    fn unsubscribe(&mut self, subscription: Subscription);

    /// Next undelivered event for `subscription`, if any.
    fn try_next(&mut self, subscription: Subscription) -> Option<LifecycleEvent>;
}

/// Source for hosts that deliver suspend/resume by calling the engine
/// directly.
#[derive(Debug, Default)]
pub struct NoopLifecycle {
    next_id: u64,
}

impl LifecycleSource for NoopLifecycle {
    fn subscribe(&mut self) -> Subscription {
        self.next_id += 1;
        Subscription(self.next_id)
    }

    fn unsubscribe(&mut self, _subscription: Subscription) {}

    fn try_next(&mut self, _subscription: Subscription) -> Option<LifecycleEvent> {
        None
    }
}

const CHANNEL_CAPACITY: usize = 16;

/// Broadcast-channel backed source. Every subscriber sees every event sent
/// after it subscribed.
pub struct ChannelLifecycle {
    sender: broadcast::Sender<LifecycleEvent>,
    receivers: HashMap<Subscription, broadcast::Receiver<LifecycleEvent>>,
    next_id: u64,
}

/// Sending half handed to the host.
#[derive(Clone)]
pub struct LifecycleNotifier {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleNotifier {
    /// Publish an event. Returns the number of live subscriptions.
    pub fn notify(&self, event: LifecycleEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl ChannelLifecycle {
    pub fn new() -> (Self, LifecycleNotifier) {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let notifier = LifecycleNotifier {
            sender: sender.clone(),
        };
        let source = Self {
            sender,
            receivers: HashMap::new(),
            next_id: 0,
        };
        (source, notifier)
    }

    pub fn subscriber_count(&self) -> usize {
        self.receivers.len()
    }
}

impl LifecycleSource for ChannelLifecycle {
    fn subscribe(&mut self) -> Subscription {
        self.next_id += 1;
        let subscription = Subscription(self.next_id);
        self.receivers
            .insert(subscription, self.sender.subscribe());
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.receivers.remove(&subscription);
    }

    fn try_next(&mut self, subscription: Subscription) -> Option<LifecycleEvent> {
        let receiver = self.receivers.get_mut(&subscription)?;
        loop {
            match receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "lifecycle subscriber lagged; older events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_delivers_in_order_to_subscriber() {
        let (mut source, notifier) = ChannelLifecycle::new();
        let sub = source.subscribe();
        assert_eq!(notifier.notify(LifecycleEvent::Suspended), 1);
        notifier.notify(LifecycleEvent::Resumed);

        assert_eq!(source.try_next(sub), Some(LifecycleEvent::Suspended));
        assert_eq!(source.try_next(sub), Some(LifecycleEvent::Resumed));
        assert_eq!(source.try_next(sub), None);
    }

    #[test]
    fn unsubscribed_sees_nothing() {
        let (mut source, notifier) = ChannelLifecycle::new();
        let sub = source.subscribe();
        source.unsubscribe(sub);
        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(notifier.notify(LifecycleEvent::Suspended), 0);
        assert_eq!(source.try_next(sub), None);
    }

    #[test]
    fn events_before_subscribing_are_not_replayed() {
        let (mut source, notifier) = ChannelLifecycle::new();
        notifier.notify(LifecycleEvent::Suspended);
        let sub = source.subscribe();
        assert_eq!(source.try_next(sub), None);
    }
}
