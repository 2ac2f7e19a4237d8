/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}

/// Publisher that drops every event; for wiring without subscribers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl<E: 'static> EventPublisher<E> for NoopPublisher {
    fn publish(&self, _event: &E) {}
}
