//! Minimize-to-tray lifecycle
//!
//! While the window is hidden the application is represented by a single tray
//! icon with two actions: Restore and Exit. The icon is created on every
//! [`TrayLifecycleManager::execute`] and destroyed again on Restore, so at
//! most one exists at any time.
//!
//! Menu activations arrive on whatever thread the platform tray runs its
//! callbacks on. Backends must not act on them directly; they post
//! `UiCommand::Tray(action)` through the UI dispatcher and the UI loop calls
//! [`TrayLifecycleManager::handle_action`].

use crate::refresher::ViewRefresher;
use crate::view::{ViewHandles, WindowState};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur with tray operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrayError {
    #[error("Application is already resident in the tray")]
    AlreadyResident,

    #[error("Failed to create tray icon: {0}")]
    CreationFailed(String),

    #[error("Failed to load tray image {path}: {reason}")]
    ImageLoadFailed { path: PathBuf, reason: String },

    #[error("Failed to add tray menu item '{label}': {reason}")]
    MenuFailed { label: String, reason: String },

    #[error("Failed to update tray icon: {0}")]
    UpdateFailed(String),
}

/// Whether the application shows its window or lives in the tray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrayState {
    #[default]
    WindowVisible,
    TrayResident,
}

/// Menu action from the tray context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrayAction {
    /// Bring the window back and leave the tray
    Restore,
    /// Terminate the application
    Exit,
}

impl TrayAction {
    /// Menu entries in display order
    pub const ALL: [TrayAction; 2] = [TrayAction::Restore, TrayAction::Exit];

    /// Stable menu item id
    pub fn menu_id(self) -> &'static str {
        match self {
            TrayAction::Restore => "restore",
            TrayAction::Exit => "exit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrayAction::Restore => "Restore",
            TrayAction::Exit => "Exit",
        }
    }

    /// Map a menu item id back to its action
    pub fn from_menu_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.menu_id() == id)
    }
}

/// Image shown by the tray icon
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrayImage {
    /// Image generated by the backend
    #[default]
    Builtin,
    /// Image file on disk
    File(PathBuf),
}

impl From<Option<PathBuf>> for TrayImage {
    fn from(path: Option<PathBuf>) -> Self {
        path.map_or(TrayImage::Builtin, TrayImage::File)
    }
}

/// Fixed appearance of the tray icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayConfig {
    /// Platform identifier of the icon
    pub name: String,
    pub tooltip: String,
    pub image: TrayImage,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            name: "displayslots".to_string(),
            tooltip: crate::DEFAULT_TRAY_TOOLTIP.to_string(),
            image: TrayImage::Builtin,
        }
    }
}

/// Platform tray facility
pub trait TrayBackend {
    type Icon: TrayIconHandle;

    /// Create a new tray icon
    fn create(&mut self, name: &str) -> Result<Self::Icon, TrayError>;
}

/// A live tray icon
///
/// Dropping a handle without [`shutdown`](Self::shutdown) is a leak in
/// backends that track native resources.
pub trait TrayIconHandle {
    fn set_tooltip(&mut self, tooltip: &str) -> Result<(), TrayError>;

    fn set_image(&mut self, image: &TrayImage) -> Result<(), TrayError>;

    /// Append a menu item whose activation is delivered as `action`
    fn add_menu_item(&mut self, label: &str, action: TrayAction) -> Result<(), TrayError>;

    fn set_enabled(&mut self, enabled: bool);

    /// Remove the icon from the tray and release it
    fn shutdown(self);
}

/// Process termination
pub trait ProcessExit {
    fn exit(&self, code: i32) -> !;
}

/// Terminates the current process with [`std::process::exit`]
#[derive(Debug, Clone, Copy, Default)]
pub struct StdProcessExit;

impl ProcessExit for StdProcessExit {
    fn exit(&self, code: i32) -> ! {
        tracing::info!(code, "Terminating process");
        std::process::exit(code)
    }
}

/// Owner of the window-visible / tray-resident transition
pub struct TrayLifecycleManager<B: TrayBackend> {
    backend: B,
    config: TrayConfig,
    state: TrayState,
    icon: Option<B::Icon>,
    /// Number of completed `execute()` calls
    sessions: u64,
}

impl<B: TrayBackend> TrayLifecycleManager<B> {
    pub fn new(backend: B, config: TrayConfig) -> Self {
        Self {
            backend,
            config,
            state: TrayState::WindowVisible,
            icon: None,
            sessions: 0,
        }
    }

    pub fn state(&self) -> TrayState {
        self.state
    }

    pub fn has_tray_icon(&self) -> bool {
        self.icon.is_some()
    }

    /// Number of times the application went to the tray
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    /// Hide the window and show the tray icon with Restore and Exit
    ///
    /// Not reentrant: while tray-resident this returns
    /// [`TrayError::AlreadyResident`] and changes nothing. If the platform
    /// fails to provide the icon, the window is shown again and the error is
    /// returned to the caller.
    pub fn execute(&mut self, view: &mut dyn ViewHandles) -> Result<(), TrayError> {
        if self.state == TrayState::TrayResident {
            tracing::warn!("Minimize to tray requested while already in tray");
            return Err(TrayError::AlreadyResident);
        }

        view.window().set_visible(false);

        match self.create_icon() {
            Ok(icon) => {
                self.icon = Some(icon);
                self.state = TrayState::TrayResident;
                self.sessions += 1;
                tracing::info!(session = self.sessions, "Application minimized to tray");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create tray icon");
                view.window().set_visible(true);
                Err(e)
            }
        }
    }

    fn create_icon(&mut self) -> Result<B::Icon, TrayError> {
        let mut icon = self.backend.create(&self.config.name)?;
        if let Err(e) = configure_icon(&mut icon, &self.config) {
            icon.shutdown();
            return Err(e);
        }
        Ok(icon)
    }

    /// Show the window again, drop the tray icon and resume refreshing
    ///
    /// A Restore delivered after the tray session already ended is ignored.
    pub fn restore(&mut self, view: &mut dyn ViewHandles, refresher: &ViewRefresher) {
        if self.state != TrayState::TrayResident {
            tracing::debug!("Ignoring restore, window already visible");
            return;
        }

        let window = view.window();
        window.set_extended_state(WindowState::Normal);
        window.set_visible(true);
        view.focus_anchor().request_focus();

        if let Some(icon) = self.icon.take() {
            icon.shutdown();
        }
        self.state = TrayState::WindowVisible;
        refresher.resume();

        tracing::info!("Application restored from tray");
    }

    /// Tear down the tray icon and terminate the process with status 0
    pub fn exit(&mut self, process: &dyn ProcessExit) -> ! {
        tracing::info!("Exit requested from tray");
        if let Some(mut icon) = self.icon.take() {
            icon.set_enabled(false);
            icon.shutdown();
        }
        process.exit(0)
    }

    /// Run a tray menu action on the UI thread
    pub fn handle_action(
        &mut self,
        action: TrayAction,
        view: &mut dyn ViewHandles,
        refresher: &ViewRefresher,
        process: &dyn ProcessExit,
    ) {
        tracing::debug!(?action, "Tray action");
        match action {
            TrayAction::Restore => self.restore(view, refresher),
            TrayAction::Exit => self.exit(process),
        }
    }
}

impl<B: TrayBackend> Drop for TrayLifecycleManager<B> {
    fn drop(&mut self) {
        if let Some(icon) = self.icon.take() {
            icon.shutdown();
        }
    }
}

fn configure_icon<I: TrayIconHandle>(icon: &mut I, config: &TrayConfig) -> Result<(), TrayError> {
    icon.set_tooltip(&config.tooltip)?;
    icon.set_image(&config.image)?;
    for action in TrayAction::ALL {
        icon.add_menu_item(action.label(), action)?;
    }
    icon.set_enabled(true);
    Ok(())
}
