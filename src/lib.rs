//! Display Slots - hot-key display presets
//!
//! This library re-exports the window lifecycle, refresh scheduler and tray
//! lifecycle from `displayslots-core` and adds the desktop shell:
//!
//! - [`controller`]: UI-thread owner of refresher, tray manager and view
//! - [`app`]: the eframe window
//! - [`ui`]: `tray-icon` backend and egui view binding
//! - [`config`]: persistent configuration

pub mod app;
pub mod config;
pub mod controller;
pub mod ui;

pub use displayslots_core::{dispatch, frame, refresher, tray, view};

pub use displayslots_core::{
    ui_channel, FrameUpdater, RefreshInterval, RefresherError, RefresherState, Theme,
    TrayAction, TrayConfig, TrayError, TrayImage, TrayLifecycleManager, TrayState, UiCommand,
    UiDispatcher, UiInbox, ViewRefresher, WindowState,
};
pub use displayslots_core::{DEFAULT_REFRESH_INTERVAL_MS, VERSION};
