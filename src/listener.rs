use crate::records::{DataRecord, LineStatusRecord};

/// What a listener reports back after handling an item.
///
/// An error is logged by the loop which delivered the item, and the loop moves on to the next item.
pub type ListenerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receives data chunks, one at a time, on the data loop's thread.
///
/// Delivery is as fast as this returns.
pub trait DataListener: Send + 'static {
    /// A new chunk of data arrived.
    fn on_new_data(&mut self, record: DataRecord) -> ListenerResult;
}

/// Receives line status transitions, one at a time, on the event loop's thread.
pub trait EventListener: Send + 'static {
    /// The (masked) line state changed.
    fn on_new_line_event(&mut self, record: LineStatusRecord) -> ListenerResult;
}

impl<F> DataListener for F
where
    F: FnMut(DataRecord) -> ListenerResult + Send + 'static,
{
    fn on_new_data(&mut self, record: DataRecord) -> ListenerResult {
        self(record)
    }
}

impl<F> EventListener for F
where
    F: FnMut(LineStatusRecord) -> ListenerResult + Send + 'static,
{
    fn on_new_line_event(&mut self, record: LineStatusRecord) -> ListenerResult {
        self(record)
    }
}

/// Something a dispatch loop can hand items of type `T` to.
pub(crate) trait Deliver<T>: Send + 'static {
    fn deliver(&mut self, item: T) -> ListenerResult;
}

pub(crate) struct Data<L>(pub(crate) L);

impl<L: DataListener> Deliver<DataRecord> for Data<L> {
    fn deliver(&mut self, item: DataRecord) -> ListenerResult {
        self.0.on_new_data(item)
    }
}

pub(crate) struct Events<L>(pub(crate) L);

impl<L: EventListener> Deliver<LineStatusRecord> for Events<L> {
    fn deliver(&mut self, item: LineStatusRecord) -> ListenerResult {
        self.0.on_new_line_event(item)
    }
}
