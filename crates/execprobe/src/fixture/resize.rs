use crate::model::ResizeEvent;
use crate::runner::{HarnessError, HarnessResult};
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// Create the single-slot resize channel and offer one event on it.
///
/// The event is sent from a detached thread with a non-blocking send. Nothing
/// waits on that thread: the driver may drain the slot before, during or
/// after starting the command, or never.
pub fn resize_channel(event: ResizeEvent) -> HarnessResult<Receiver<ResizeEvent>> {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("execprobe-resize".to_string())
        .spawn(move || {
            if tx.try_send(event).is_err() {
                tracing::trace!(?event, "resize event dropped, receiver gone");
            }
        })
        .map_err(|err| HarnessError::setup("failed to spawn resize producer", err))?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn delivers_exactly_one_event() {
        let rx = resize_channel(ResizeEvent::default()).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, ResizeEvent { height: 100, width: 100 });
        // Producer hangs up after its single send.
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
    }

    #[test]
    fn dropping_the_receiver_does_not_block_the_producer() {
        let rx = resize_channel(ResizeEvent::default()).unwrap();
        drop(rx);
    }
}
