// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for device events.

use tokio::sync::broadcast;

use super::DeviceEvent;

/// Number of events buffered per subscriber.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fans device events out to any number of subscribers.
///
/// Built on a tokio broadcast channel. A subscriber that falls more than the
/// capacity behind misses the oldest events and gets `RecvError::Lagged`.
/// Publishing never blocks, so fade step tasks can publish safely.
///
/// # Examples
///
/// ```
/// use ledctl_lib::event::{DeviceEvent, EventBus};
/// use ledctl_lib::types::DeviceKind;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DeviceEvent::device_added("kitchen", DeviceKind::Pwm));
/// assert_eq!(rx.try_recv().unwrap().device(), "kitchen");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event and returns how many subscribers received it.
    ///
    /// Without subscribers the event is dropped and 0 is returned.
    pub fn publish(&self, event: DeviceEvent) -> usize {
        tracing::trace!(device = %event.device(), "Publishing event");
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceKind;

    fn added(name: &str) -> DeviceEvent {
        DeviceEvent::device_added(name, DeviceKind::Pwm)
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(added("desk")), 0);
    }

    #[test]
    fn subscriber_count_follows_receivers() {
        let bus = EventBus::new();
        let rx = bus.subscribe();
        let _rx2 = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(rx);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_event() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(added("desk")), 2);

        assert_eq!(rx1.recv().await.unwrap().device(), "desk");
        assert_eq!(rx2.recv().await.unwrap().device(), "desk");
    }

    #[test]
    fn zero_capacity_is_raised() {
        let bus = EventBus::with_capacity(0);
        let mut rx = bus.subscribe();
        bus.publish(added("desk"));
        assert!(rx.try_recv().is_ok());
    }
}
