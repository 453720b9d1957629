//! Test doubles for the view, tray backend, refresh sink and process exit
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for integration tests of dependent crates.

use crate::dispatch::RefreshSink;
use crate::tray::{ProcessExit, TrayAction, TrayBackend, TrayError, TrayIconHandle, TrayImage};
use crate::view::{ContainerHandle, FocusAnchor, Theme, ViewHandles, WindowHandle, WindowState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

// ============================================================================
// VIEW
// ============================================================================

/// Mutation observed on a [`RecordingView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOp {
    SetVisible(bool),
    SetExtendedState(WindowState),
    ResizeToFit,
    Repaint,
    Relayout,
    ApplyTheme(Theme),
    RequestFocus,
}

/// In-memory view that records every mutation in order
///
/// Starts visible, in the normal state, with the light theme.
#[derive(Debug)]
pub struct RecordingView {
    visible: bool,
    state: WindowState,
    theme: Theme,
    focus_requests: usize,
    ops: Vec<ViewOp>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self {
            visible: true,
            state: WindowState::Normal,
            theme: Theme::Light,
            focus_requests: 0,
            ops: Vec::new(),
        }
    }

    pub fn is_window_visible(&self) -> bool {
        self.visible
    }

    pub fn window_state(&self) -> WindowState {
        self.state
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn focus_requests(&self) -> usize {
        self.focus_requests
    }

    pub fn ops(&self) -> &[ViewOp] {
        &self.ops
    }

    /// Number of completed relayout passes
    pub fn relayouts(&self) -> usize {
        self.ops.iter().filter(|op| **op == ViewOp::Relayout).count()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl Default for RecordingView {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowHandle for RecordingView {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.ops.push(ViewOp::SetVisible(visible));
    }

    fn extended_state(&self) -> WindowState {
        self.state
    }

    fn set_extended_state(&mut self, state: WindowState) {
        self.state = state;
        self.ops.push(ViewOp::SetExtendedState(state));
    }

    fn resize_to_fit(&mut self) {
        self.ops.push(ViewOp::ResizeToFit);
    }

    fn repaint(&mut self) {
        self.ops.push(ViewOp::Repaint);
    }
}

impl ContainerHandle for RecordingView {
    fn relayout(&mut self) {
        self.ops.push(ViewOp::Relayout);
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.ops.push(ViewOp::ApplyTheme(theme));
    }
}

impl FocusAnchor for RecordingView {
    fn request_focus(&mut self) {
        self.focus_requests += 1;
        self.ops.push(ViewOp::RequestFocus);
    }
}

impl ViewHandles for RecordingView {
    fn window(&mut self) -> &mut dyn WindowHandle {
        self
    }

    fn root_container(&mut self) -> &mut dyn ContainerHandle {
        self
    }

    fn focus_anchor(&mut self) -> &mut dyn FocusAnchor {
        self
    }
}

// ============================================================================
// REFRESH SINK
// ============================================================================

/// Refresh sink that counts and timestamps requests
#[derive(Debug, Clone, Default)]
pub struct CountingSink {
    requests: Arc<Mutex<Vec<Instant>>>,
    disconnected: Arc<AtomicBool>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Instant>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of accepted requests
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Arrival time of every accepted request
    pub fn timestamps(&self) -> Vec<Instant> {
        self.lock().clone()
    }

    /// Reject all further requests, as if the UI thread were gone
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }
}

impl RefreshSink for CountingSink {
    fn request_refresh(&self) -> bool {
        if self.disconnected.load(Ordering::SeqCst) {
            return false;
        }
        self.lock().push(Instant::now());
        true
    }
}

// ============================================================================
// TRAY
// ============================================================================

/// Step at which [`FakeTray`] fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Create,
    Tooltip,
    Image,
    Menu,
}

#[derive(Debug, Default)]
struct TrayRecord {
    created: usize,
    live: usize,
    disabled: usize,
    tooltip: Option<String>,
    image: Option<TrayImage>,
    menu: Vec<(String, TrayAction)>,
    fail_at: Option<FailPoint>,
}

/// Tray backend that tracks live icons instead of touching the platform
///
/// Clones share their record, so a test can keep one clone for inspection
/// while the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeTray {
    record: Arc<Mutex<TrayRecord>>,
}

impl FakeTray {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TrayRecord> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every following icon creation fail at `point`
    pub fn fail_at(&self, point: FailPoint) {
        self.lock().fail_at = Some(point);
    }

    /// Icons created and not yet shut down
    pub fn live_icons(&self) -> usize {
        self.lock().live
    }

    /// Icons created so far
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Number of `set_enabled(false)` calls
    pub fn disabled(&self) -> usize {
        self.lock().disabled
    }

    /// Tooltip of the most recent icon
    pub fn tooltip(&self) -> Option<String> {
        self.lock().tooltip.clone()
    }

    /// Image of the most recent icon
    pub fn image(&self) -> Option<TrayImage> {
        self.lock().image.clone()
    }

    /// Menu of the most recent icon
    pub fn menu(&self) -> Vec<(String, TrayAction)> {
        self.lock().menu.clone()
    }
}

impl TrayBackend for FakeTray {
    type Icon = FakeTrayIcon;

    fn create(&mut self, name: &str) -> Result<FakeTrayIcon, TrayError> {
        let mut record = self.lock();
        if record.fail_at == Some(FailPoint::Create) {
            return Err(TrayError::CreationFailed(format!("{name}: no tray available")));
        }
        record.created += 1;
        record.live += 1;
        record.tooltip = None;
        record.image = None;
        record.menu.clear();

        Ok(FakeTrayIcon {
            tray: self.clone(),
        })
    }
}

/// Icon handed out by [`FakeTray`]
#[derive(Debug)]
pub struct FakeTrayIcon {
    tray: FakeTray,
}

impl TrayIconHandle for FakeTrayIcon {
    fn set_tooltip(&mut self, tooltip: &str) -> Result<(), TrayError> {
        let mut record = self.tray.lock();
        if record.fail_at == Some(FailPoint::Tooltip) {
            return Err(TrayError::UpdateFailed("tooltip rejected".to_string()));
        }
        record.tooltip = Some(tooltip.to_string());
        Ok(())
    }

    fn set_image(&mut self, image: &TrayImage) -> Result<(), TrayError> {
        let mut record = self.tray.lock();
        if record.fail_at == Some(FailPoint::Image) {
            return Err(TrayError::UpdateFailed("image rejected".to_string()));
        }
        record.image = Some(image.clone());
        Ok(())
    }

    fn add_menu_item(&mut self, label: &str, action: TrayAction) -> Result<(), TrayError> {
        let mut record = self.tray.lock();
        if record.fail_at == Some(FailPoint::Menu) {
            return Err(TrayError::MenuFailed {
                label: label.to_string(),
                reason: "menu rejected".to_string(),
            });
        }
        record.menu.push((label.to_string(), action));
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.tray.lock().disabled += 1;
        }
    }

    fn shutdown(self) {
        let mut record = self.tray.lock();
        record.live = record.live.saturating_sub(1);
    }
}

// ============================================================================
// PROCESS EXIT
// ============================================================================

/// Panic payload raised by [`PanickingExit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCalled(pub i32);

/// Process exit that unwinds with [`ExitCalled`] instead of terminating
///
/// Catch it with `std::panic::catch_unwind` to observe the exit status.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingExit;

impl ProcessExit for PanickingExit {
    fn exit(&self, code: i32) -> ! {
        std::panic::panic_any(ExitCalled(code))
    }
}
