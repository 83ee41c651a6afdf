//! Single-threaded execution contexts.
//!
//! A [`Serial`] owns a value on a dedicated named thread. Other threads reach
//! the value only by posting closures, which run one at a time in submission
//! order. Between closures the worker calls [`Tick::tick`] on a fixed
//! interval so owned state can do timed housekeeping such as idle flushes.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::core::{Error, Result};

/// Timed housekeeping for state owned by a [`Serial`].
pub trait Tick {
    fn tick(&mut self, now: Instant);
}

type Job<T> = Box<dyn FnOnce(&mut T) + Send>;

enum Message<T> {
    Run(Job<T>),
    Shutdown,
}

pub struct Serial<T> {
    name: String,
    sender: Sender<Message<T>>,
    handle: Option<JoinHandle<T>>,
}

impl<T: Tick + Send + 'static> Serial<T> {
    /// Move `state` onto a new thread named `name`.
    pub fn spawn(name: impl Into<String>, state: T, tick_interval: Duration) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(state, receiver, tick_interval))
            .map_err(|source| Error::Spawn {
                name: name.clone(),
                source,
            })?;
        log::debug!("serial context `{name}` started");
        Ok(Self {
            name,
            sender,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `f` on the owning thread and wait for its result.
    ///
    /// Must not be called from inside a closure running on this same context;
    /// that would wait on itself.
    pub fn sync<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut T) -> R + Send + 'static,
    {
        let (reply, result) = mpsc::channel();
        self.post(move |state| {
            let _ = reply.send(f(state));
        })?;
        result.recv().map_err(|_| self.closed())
    }

    /// Queue `f` to run on the owning thread without waiting.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        self.sender
            .send(Message::Run(Box::new(f)))
            .map_err(|_| self.closed())
    }

    /// Run everything already queued, stop the thread and hand back the state.
    pub fn shutdown(mut self) -> Result<T> {
        let _ = self.sender.send(Message::Shutdown);
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Err(self.closed()),
        };
        let state = handle.join().map_err(|_| self.closed())?;
        log::debug!("serial context `{}` stopped", self.name);
        Ok(state)
    }

    fn closed(&self) -> Error {
        Error::ContextClosed(self.name.clone())
    }
}

impl<T> Drop for Serial<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(Message::Shutdown);
            if handle.join().is_err() {
                log::warn!("serial context `{}` panicked", self.name);
            }
        }
    }
}

fn run<T: Tick>(mut state: T, receiver: Receiver<Message<T>>, tick_interval: Duration) -> T {
    let mut next_tick = Instant::now() + tick_interval;
    loop {
        let now = Instant::now();
        if now >= next_tick {
            state.tick(now);
            next_tick = now + tick_interval;
        }
        match receiver.recv_timeout(next_tick.saturating_duration_since(now)) {
            Ok(Message::Run(job)) => job(&mut state),
            Ok(Message::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    state
}
