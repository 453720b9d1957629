//! Display Slots Core - window lifecycle and background refresh
//!
//! This library keeps the application window current and moves the
//! application between a visible window and a tray-resident process:
//!
//! - [`frame::FrameUpdater`] relayouts and repaints the window on the UI thread
//! - [`refresher::ViewRefresher`] requests a refresh at a fixed interval from a
//!   dedicated background thread, with suspend/resume/stop
//! - [`tray::TrayLifecycleManager`] hides the window behind a tray icon and
//!   restores it on demand
//! - [`dispatch`] carries requests from any thread to the UI thread
//!
//! Window, container and tray access is abstracted behind the traits in
//! [`view`] and [`tray`], so the UI toolkit stays outside this crate.

pub mod dispatch;
pub mod frame;
pub mod refresher;
pub mod tray;
pub mod view;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use dispatch::{ui_channel, RefreshSink, UiCommand, UiDispatcher, UiInbox};
pub use frame::FrameUpdater;
pub use refresher::{RefreshInterval, RefresherError, RefresherState, ViewRefresher};
pub use tray::{
    ProcessExit, StdProcessExit, TrayAction, TrayBackend, TrayConfig, TrayError,
    TrayIconHandle, TrayImage, TrayLifecycleManager, TrayState,
};
pub use view::{ContainerHandle, FocusAnchor, Theme, ViewHandles, WindowHandle, WindowState};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default interval between automatic refresh passes
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;

/// Default tray tooltip
pub const DEFAULT_TRAY_TOOLTIP: &str = "Display Slots";
