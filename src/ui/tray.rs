//! System tray backend built on `tray-icon`
//!
//! Menu and icon click events are delivered by `tray-icon` on its own event
//! thread. They are translated into `UiCommand::Tray` and posted to the UI
//! dispatcher, followed by a wake of the hidden window. Window state is only
//! changed by the UI thread when it drains the command.

use displayslots_core::dispatch::UiWaker;
use displayslots_core::{
    TrayAction, TrayBackend, TrayError, TrayIconHandle, TrayImage, UiCommand, UiDispatcher,
};
use std::path::Path;
use tray_icon::menu::{Menu, MenuEvent, MenuItem};
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

/// Built-in icon size in pixels
const ICON_SIZE: u32 = 32;

/// Icon color (blue monitor glyph)
const ICON_RGB: (u8, u8, u8) = (0x1E, 0x88, 0xE5);

/// Whether this platform can host the tray icon inside the eframe loop
///
/// `tray-icon` needs a running GTK main loop on Linux, which winit does not
/// provide, so the tray is only offered on Windows and macOS.
pub const TRAY_SUPPORTED: bool = cfg!(any(target_os = "windows", target_os = "macos"));

/// Platform tray facility
pub struct SystemTray {
    _handlers: (),
}

impl SystemTray {
    /// Create the backend and route tray events to `dispatcher`
    ///
    /// `wake` runs on the tray event thread after an action is posted and
    /// must make the hidden window paint again. Installs the process-wide
    /// `tray-icon` event handlers, so only one backend should exist.
    pub fn new(dispatcher: UiDispatcher, wake: UiWaker) -> Self {
        install_event_handlers(dispatcher, wake);
        Self { _handlers: () }
    }
}

/// Post a tray action to the UI thread and wake the hidden window
fn deliver(action: TrayAction, dispatcher: &UiDispatcher, wake: &UiWaker) -> bool {
    tracing::debug!(?action, "Tray action received");
    if !dispatcher.post(UiCommand::Tray(action)) {
        tracing::warn!(?action, "UI gone, tray action dropped");
        return false;
    }
    wake();
    true
}

fn install_event_handlers(dispatcher: UiDispatcher, wake: UiWaker) {
    let menu_dispatcher = dispatcher.clone();
    let menu_wake = wake.clone();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        match TrayAction::from_menu_id(event.id.as_ref()) {
            Some(action) => {
                deliver(action, &menu_dispatcher, &menu_wake);
            }
            None => tracing::trace!(id = ?event.id, "Unknown menu event"),
        }
    }));

    // Left-click on the icon restores the window, like the menu entry
    TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
        if let TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        } = event
        {
            deliver(TrayAction::Restore, &dispatcher, &wake);
        }
    }));
}

impl TrayBackend for SystemTray {
    type Icon = SystemTrayIcon;

    fn create(&mut self, name: &str) -> Result<SystemTrayIcon, TrayError> {
        if !TRAY_SUPPORTED {
            return Err(TrayError::CreationFailed(
                "system tray needs a GTK main loop on this platform".to_string(),
            ));
        }

        let menu = Menu::new();
        let tray = TrayIconBuilder::new()
            .with_id(name)
            .with_menu(Box::new(menu.clone()))
            .with_icon(builtin_icon()?)
            .build()
            .map_err(|e| TrayError::CreationFailed(e.to_string()))?;

        tracing::debug!(name, "Tray icon created");
        Ok(SystemTrayIcon {
            tray,
            menu,
            items: Vec::new(),
        })
    }
}

/// Live `tray-icon` icon with its context menu
pub struct SystemTrayIcon {
    tray: TrayIcon,
    menu: Menu,
    items: Vec<MenuItem>,
}

impl TrayIconHandle for SystemTrayIcon {
    fn set_tooltip(&mut self, tooltip: &str) -> Result<(), TrayError> {
        self.tray
            .set_tooltip(Some(tooltip))
            .map_err(|e| TrayError::UpdateFailed(e.to_string()))
    }

    fn set_image(&mut self, image: &TrayImage) -> Result<(), TrayError> {
        let icon = match image {
            TrayImage::Builtin => builtin_icon()?,
            TrayImage::File(path) => load_icon(path)?,
        };
        self.tray
            .set_icon(Some(icon))
            .map_err(|e| TrayError::UpdateFailed(e.to_string()))
    }

    fn add_menu_item(&mut self, label: &str, action: TrayAction) -> Result<(), TrayError> {
        let item = MenuItem::with_id(action.menu_id(), label, true, None);
        self.menu
            .append(&item)
            .map_err(|e| TrayError::MenuFailed {
                label: label.to_string(),
                reason: e.to_string(),
            })?;
        self.items.push(item);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        for item in &self.items {
            item.set_enabled(enabled);
        }
        if let Err(e) = self.tray.set_visible(enabled) {
            tracing::warn!(error = %e, enabled, "Failed to change tray icon visibility");
        }
    }

    fn shutdown(self) {
        // tray-icon removes the icon from the notification area on drop
        drop(self.tray);
        tracing::debug!("Tray icon removed");
    }
}

/// Load a tray image from disk
fn load_icon(path: &Path) -> Result<Icon, TrayError> {
    tracing::info!(path = %path.display(), "Loading tray icon");
    let failed = |reason: String| TrayError::ImageLoadFailed {
        path: path.to_path_buf(),
        reason,
    };

    let image = image::open(path).map_err(|e| failed(e.to_string()))?.into_rgba8();
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).map_err(|e| failed(e.to_string()))
}

fn builtin_icon() -> Result<Icon, TrayError> {
    Icon::from_rgba(builtin_icon_rgba(), ICON_SIZE, ICON_SIZE)
        .map_err(|e| TrayError::CreationFailed(format!("built-in icon: {e}")))
}

/// RGBA pixels of the built-in icon
///
/// Draws a monitor outline on a stand so the icon reads as "display".
pub fn builtin_icon_rgba() -> Vec<u8> {
    let (r, g, b) = ICON_RGB;
    let mut rgba = vec![0u8; (ICON_SIZE * ICON_SIZE * 4) as usize];
    let mut put = |x: u32, y: u32, alpha: u8| {
        let idx = ((y * ICON_SIZE + x) * 4) as usize;
        rgba[idx] = r;
        rgba[idx + 1] = g;
        rgba[idx + 2] = b;
        rgba[idx + 3] = alpha;
    };

    // Screen: 2px frame from (3,4) to (28,21), translucent fill inside
    for y in 4..=21 {
        for x in 3..=28 {
            let frame = x <= 4 || x >= 27 || y <= 5 || y >= 20;
            put(x, y, if frame { 255 } else { 70 });
        }
    }
    // Neck
    for y in 22..=25 {
        for x in 14..=17 {
            put(x, y, 255);
        }
    }
    // Base
    for y in 26..=27 {
        for x in 9..=22 {
            put(x, y, 255);
        }
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use displayslots_core::ui_channel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn alpha_at(rgba: &[u8], x: u32, y: u32) -> u8 {
        rgba[((y * ICON_SIZE + x) * 4 + 3) as usize]
    }

    #[test]
    fn test_builtin_icon_dimensions() {
        let rgba = builtin_icon_rgba();
        assert_eq!(rgba.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);
    }

    #[test]
    fn test_builtin_icon_shape() {
        let rgba = builtin_icon_rgba();
        // Corner is transparent, frame is opaque, screen is translucent
        assert_eq!(alpha_at(&rgba, 0, 0), 0);
        assert_eq!(alpha_at(&rgba, 3, 4), 255);
        assert_eq!(alpha_at(&rgba, 15, 12), 70);
        // Stand
        assert_eq!(alpha_at(&rgba, 15, 24), 255);
        assert_eq!(alpha_at(&rgba, 9, 27), 255);
        assert_eq!(alpha_at(&rgba, 8, 27), 0);
    }

    #[test]
    fn test_builtin_icon_color() {
        let rgba = builtin_icon_rgba();
        let idx = ((4 * ICON_SIZE + 3) * 4) as usize;
        assert_eq!((rgba[idx], rgba[idx + 1], rgba[idx + 2]), ICON_RGB);
    }

    fn counting_wake() -> (UiWaker, Arc<AtomicUsize>) {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        (
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            wakes,
        )
    }

    #[test]
    fn test_deliver_posts_then_wakes() {
        let (dispatcher, inbox) = ui_channel();
        let (wake, wakes) = counting_wake();

        assert!(deliver(TrayAction::Restore, &dispatcher, &wake));
        assert!(deliver(TrayAction::Exit, &dispatcher, &wake));

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(
            inbox.drain(),
            vec![
                UiCommand::Tray(TrayAction::Restore),
                UiCommand::Tray(TrayAction::Exit)
            ]
        );
    }

    #[test]
    fn test_deliver_without_ui_skips_wake() {
        let (dispatcher, inbox) = ui_channel();
        drop(inbox);
        let (wake, wakes) = counting_wake();

        assert!(!deliver(TrayAction::Restore, &dispatcher, &wake));
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn test_create_rejected_without_gtk_loop() {
        let mut tray = SystemTray { _handlers: () };
        let err = tray.create("displayslots").err();
        assert!(matches!(err, Some(TrayError::CreationFailed(_))));
    }

    #[test]
    fn test_load_icon_missing_file() {
        let err = load_icon(Path::new("/nonexistent/tray.png")).unwrap_err();
        assert!(matches!(err, TrayError::ImageLoadFailed { .. }));
    }
}
