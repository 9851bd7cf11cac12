//! Structured event log written as one JSON object per line.

use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

use marble_smash_core::Event;
use marble_smash_session::EventListener;

/// Shared view of the first write failure seen by a [`JsonLines`] log.
#[derive(Clone, Debug, Default)]
pub(crate) struct LogStatus(Rc<RefCell<Option<io::Error>>>);

impl LogStatus {
    /// Returns the recorded failure, if any, leaving the status clear.
    pub(crate) fn check(&self) -> io::Result<()> {
        match self.0.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn failed(&self) -> bool {
        self.0.borrow().is_some()
    }

    fn record(&self, error: io::Error) {
        let mut slot = self.0.borrow_mut();
        if slot.is_none() {
            *slot = Some(error);
        }
    }
}

/// Writes every event it observes as a JSON line.
///
/// Logging stops at the first write failure, which is kept in the
/// [`LogStatus`] handed out by [`JsonLines::status`].
#[derive(Debug)]
pub(crate) struct JsonLines<W> {
    out: W,
    status: LogStatus,
}

impl<W: Write> JsonLines<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            status: LogStatus::default(),
        }
    }

    pub(crate) fn status(&self) -> LogStatus {
        self.status.clone()
    }

    fn write_line(&mut self, event: &Event) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventListener for JsonLines<W> {
    fn on_event(&mut self, event: &Event) {
        if self.status.failed() {
            return;
        }
        if let Err(error) = self.write_line(event) {
            self.status.record(error);
        }
    }
}
