//! Controller tying the refresher, the tray lifecycle and the view together
//!
//! Lives on the UI thread. Once per frame the UI loop calls [`Controller::pump`],
//! which executes everything posted through the UI dispatcher. The controller
//! owns the convention around minimize-to-tray: it suspends the refresher
//! after a successful `execute()`; Restore resumes it from inside the tray
//! manager.

use displayslots_core::{
    FrameUpdater, ProcessExit, RefresherError, Theme, TrayBackend, TrayError,
    TrayLifecycleManager, TrayState, UiCommand, UiInbox, ViewHandles, ViewRefresher,
};

/// What to do with a window close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Cancel the close; the window went to the tray
    HideToTray,
    /// Let the window close and the application end
    Close,
}

/// Outcome of draining the UI inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpResult {
    /// Commands executed
    pub executed: usize,
    /// A shutdown was requested; the window should close
    pub shutdown: bool,
}

/// UI-thread owner of the window lifecycle
pub struct Controller<V, B: TrayBackend, P> {
    view: V,
    inbox: UiInbox,
    frame: FrameUpdater,
    refresher: ViewRefresher,
    tray: TrayLifecycleManager<B>,
    process: P,
    theme: Theme,
    close_to_tray: bool,
    was_minimized: bool,
    shutting_down: bool,
    refresh_passes: u64,
}

impl<V, B, P> Controller<V, B, P>
where
    V: ViewHandles,
    B: TrayBackend,
    P: ProcessExit,
{
    pub fn new(
        view: V,
        inbox: UiInbox,
        refresher: ViewRefresher,
        tray: TrayLifecycleManager<B>,
        process: P,
        theme: Theme,
    ) -> Self {
        Self {
            view,
            inbox,
            frame: FrameUpdater::new(),
            refresher,
            tray,
            process,
            theme,
            close_to_tray: true,
            was_minimized: false,
            shutting_down: false,
            refresh_passes: 0,
        }
    }

    /// Whether closing the window hides it to the tray
    pub fn with_close_to_tray(mut self, close_to_tray: bool) -> Self {
        self.close_to_tray = close_to_tray;
        self
    }

    /// Start the background refresher
    pub fn start(&mut self) -> Result<(), RefresherError> {
        self.refresher.start()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn refresher(&self) -> &ViewRefresher {
        &self.refresher
    }

    pub fn tray(&self) -> &TrayLifecycleManager<B> {
        &self.tray
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Refresh passes executed on the view
    pub fn refresh_passes(&self) -> u64 {
        self.refresh_passes
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Execute every command queued for the UI thread
    pub fn pump(&mut self) -> PumpResult {
        let mut result = PumpResult::default();
        for command in self.inbox.drain() {
            result.executed += 1;
            if self.handle_command(command) {
                result.shutdown = true;
            }
        }
        result
    }

    /// Execute one command; returns `true` when it asks for shutdown
    pub fn handle_command(&mut self, command: UiCommand) -> bool {
        match command {
            UiCommand::Refresh => {
                // Passes already in flight when the window went away are dropped
                if self.tray.state() == TrayState::WindowVisible {
                    self.frame.update(&mut self.view);
                    self.refresh_passes += 1;
                } else {
                    tracing::trace!("Skipping refresh while in tray");
                }
                false
            }
            UiCommand::Tray(action) => {
                self.tray
                    .handle_action(action, &mut self.view, &self.refresher, &self.process);
                false
            }
            UiCommand::Shutdown => {
                self.shutdown();
                true
            }
        }
    }

    /// Hide the window to the tray and pause refreshing
    pub fn minimize_to_tray(&mut self) -> Result<(), TrayError> {
        match self.tray.execute(&mut self.view) {
            Ok(()) => {
                self.refresher.suspend();
                Ok(())
            }
            // Already hidden; a duplicate minimize is not an error for the user
            Err(TrayError::AlreadyResident) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Track the platform minimized flag and go to the tray on minimize
    ///
    /// Only the transition into minimized triggers; a flag that lags behind a
    /// restore does not send the window straight back.
    pub fn observe_minimized(&mut self, minimized: bool) -> Result<(), TrayError> {
        let entered = minimized && !self.was_minimized;
        self.was_minimized = minimized;
        if entered && self.tray.state() == TrayState::WindowVisible && !self.shutting_down {
            tracing::debug!("Window minimized by user");
            return self.minimize_to_tray();
        }
        Ok(())
    }

    /// Decide how to handle a close request from the window manager
    pub fn close_requested(&mut self) -> Result<CloseDecision, TrayError> {
        if self.shutting_down || !self.close_to_tray {
            self.shutdown();
            return Ok(CloseDecision::Close);
        }
        self.minimize_to_tray()?;
        Ok(CloseDecision::HideToTray)
    }

    /// Switch theme and propagate it through the component tree
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.frame.update_ui(&mut self.view, self.theme);
        tracing::info!(theme = ?self.theme, "Theme toggled");
        self.theme
    }

    /// Stop the refresher ahead of a graceful close
    pub fn shutdown(&mut self) {
        if !self.shutting_down {
            tracing::info!("Shutting down");
            self.shutting_down = true;
        }
        self.refresher.stop();
    }
}
