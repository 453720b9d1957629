//! Native wake-up of the hidden main window
//!
//! While the window is hidden the windowing system stops delivering redraws,
//! so egui never runs a frame and queued tray actions stay in the inbox. On
//! Windows the tray handler shows the window through its native handle; the
//! next frame then drains the inbox and finishes the restore.

use raw_window_handle::{HasWindowHandle, RawWindowHandle};

/// Native handle of the main window, if the platform needs one to wake it
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeWindow {
    /// Win32 `HWND` as an integer so the handle can cross threads
    hwnd: Option<isize>,
}

impl NativeWindow {
    /// Capture the native handle of `window`
    pub fn capture(window: &impl HasWindowHandle) -> Self {
        let hwnd = match window.window_handle().map(|handle| handle.as_raw()) {
            Ok(RawWindowHandle::Win32(win32)) => Some(win32.hwnd.get()),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "No native window handle, tray wake-up disabled");
                None
            }
        };
        Self { hwnd }
    }

    /// Whether [`NativeWindow::show`] can reach the window
    pub fn is_attached(&self) -> bool {
        self.hwnd.is_some()
    }

    /// Show the window without activating it so its event loop paints again
    pub fn show(&self) {
        #[cfg(windows)]
        if let Some(hwnd) = self.hwnd {
            use windows::Win32::Foundation::HWND;
            use windows::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_SHOWNOACTIVATE};

            // Return value is the previous visibility, not an error
            unsafe {
                let _ = ShowWindow(HWND(hwnd as *mut _), SW_SHOWNOACTIVATE);
            }
            tracing::trace!("Hidden window shown for tray action");
        }
    }
}
