//! Bounded FIFO hand-off between the producer and consumer loops.

use tokio::sync::mpsc;

use crate::events::Slide;

/// Slides decoded ahead of display. Caps memory held in decoded rasters and
/// keeps the producer from running far ahead of the consumer.
pub const SLIDE_QUEUE_CAPACITY: usize = 3;

pub type SlideSender = mpsc::Sender<Slide>;
pub type SlideReceiver = mpsc::Receiver<Slide>;

/// A push suspends while [`SLIDE_QUEUE_CAPACITY`] slides are waiting; a pop
/// suspends while the queue is empty.
pub fn slide_queue() -> (SlideSender, SlideReceiver) {
    mpsc::channel(SLIDE_QUEUE_CAPACITY)
}
