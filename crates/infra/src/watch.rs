//! Full-snapshot change notification.

use tokio::sync::broadcast;

/// Lossy fan-out channel carrying full state snapshots.
///
/// Each subscriber gets every published snapshot it can keep up with; a
/// lagging subscriber is skipped ahead rather than exerting backpressure on
/// the publisher. Dropping a receiver is the unsubscription.
#[derive(Debug)]
pub struct SnapshotChannel<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> SnapshotChannel<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish the latest snapshot. Having no subscribers is not an error.
    pub fn publish(&self, snapshot: T) {
        let _ = self.tx.send(snapshot);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Send + 'static> Default for SnapshotChannel<T> {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_snapshots() {
        let channel: SnapshotChannel<Vec<u32>> = SnapshotChannel::default();
        let mut rx = channel.subscribe();

        channel.publish(vec![1, 2, 3]);
        assert_eq!(rx.recv().await.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let channel: SnapshotChannel<Vec<u32>> = SnapshotChannel::default();
        channel.publish(vec![1]);
    }
}
