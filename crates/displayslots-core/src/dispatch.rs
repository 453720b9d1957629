//! Hand-off of work from any thread to the UI thread
//!
//! Background threads and tray callbacks never touch the window. They post a
//! [`UiCommand`] through a [`UiDispatcher`]; the UI event loop drains the
//! matching [`UiInbox`] once per frame and executes the commands with
//! exclusive access to the view.

use crate::tray::TrayAction;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, OnceLock};

/// Callback that wakes the UI event loop so it drains the inbox
pub type UiWaker = Arc<dyn Fn() + Send + Sync>;

/// Request executed on the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    /// Run a `FrameUpdater::update` pass
    Refresh,
    /// A tray menu item was activated
    Tray(TrayAction),
    /// Close the application gracefully
    Shutdown,
}

/// Create a connected dispatcher/inbox pair
pub fn ui_channel() -> (UiDispatcher, UiInbox) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        UiDispatcher {
            tx,
            waker: Arc::new(OnceLock::new()),
        },
        UiInbox { rx },
    )
}

/// Sending half, cheap to clone and usable from any thread
#[derive(Clone)]
pub struct UiDispatcher {
    tx: Sender<UiCommand>,
    waker: Arc<OnceLock<UiWaker>>,
}

impl UiDispatcher {
    /// Install the callback that wakes the UI loop
    ///
    /// Shared by every clone of this dispatcher. Only the first installation
    /// takes effect; later calls return `false`.
    pub fn set_waker(&self, waker: UiWaker) -> bool {
        self.waker.set(waker).is_ok()
    }

    /// Queue a command for the UI thread and wake it
    ///
    /// Returns `false` when the inbox has been dropped, i.e. the UI thread is
    /// gone and nothing will ever execute the command.
    pub fn post(&self, command: UiCommand) -> bool {
        if self.tx.send(command).is_err() {
            tracing::debug!(?command, "UI inbox closed, command dropped");
            return false;
        }
        if let Some(wake) = self.waker.get() {
            wake();
        }
        true
    }
}

impl std::fmt::Debug for UiDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiDispatcher")
            .field("queued", &self.tx.len())
            .field("has_waker", &self.waker.get().is_some())
            .finish()
    }
}

/// Receiving half, owned by the UI thread
#[derive(Debug)]
pub struct UiInbox {
    rx: Receiver<UiCommand>,
}

impl UiInbox {
    /// Take every command queued so far without blocking
    pub fn drain(&self) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        commands
    }

    /// Number of commands waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Destination of the refresh requests produced by the refresher thread
pub trait RefreshSink: Send + 'static {
    /// Ask the UI thread for one refresh pass
    ///
    /// Returns `false` once the UI side is gone for good; the refresher stops
    /// when that happens.
    fn request_refresh(&self) -> bool;
}

impl RefreshSink for UiDispatcher {
    fn request_refresh(&self) -> bool {
        self.post(UiCommand::Refresh)
    }
}
