//! egui binding of the view handles
//!
//! Window mutations become viewport commands; relayout and theme changes act
//! on the egui context. The view is owned by the app and only reachable from
//! `eframe::App::update`, i.e. the UI thread.

use displayslots_core::{ContainerHandle, FocusAnchor, Theme, ViewHandles, WindowHandle, WindowState};
use egui::{Context, Vec2, ViewportCommand};

/// Padding added around the measured content when fitting the window
const FIT_MARGIN: Vec2 = Vec2::new(16.0, 16.0);

/// Smallest window the fit pass will shrink to
const MIN_WINDOW_SIZE: Vec2 = Vec2::new(240.0, 160.0);

/// Main window and its content as seen by the frame updater and tray manager
pub struct EguiView {
    ctx: Context,
    visible: bool,
    state: WindowState,
    theme: Theme,
    /// Content size measured by the most recent frame
    content_size: Option<Vec2>,
    /// Size last sent with `InnerSize`
    fitted_size: Option<Vec2>,
    layout_generation: u64,
    focus_pending: bool,
}

impl EguiView {
    pub fn new(ctx: Context, theme: Theme) -> Self {
        let mut view = Self {
            ctx,
            visible: true,
            state: WindowState::Normal,
            theme,
            content_size: None,
            fitted_size: None,
            layout_generation: 0,
            focus_pending: false,
        };
        view.apply_theme(theme);
        view
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Number of relayout passes so far
    pub fn layout_generation(&self) -> u64 {
        self.layout_generation
    }

    /// Record the size the content needed this frame
    pub fn record_content_size(&mut self, size: Vec2) {
        self.content_size = Some(size);
    }

    /// Consume a pending focus request for the anchor widget
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_pending)
    }

    /// Sync the extended state with what the platform reports
    pub fn observe_minimized(&mut self, minimized: bool) {
        if minimized {
            self.state = WindowState::Minimized;
        } else if self.state == WindowState::Minimized {
            self.state = WindowState::Normal;
        }
    }
}

impl WindowHandle for EguiView {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.ctx.send_viewport_cmd(ViewportCommand::Visible(visible));
        if visible {
            self.ctx.send_viewport_cmd(ViewportCommand::Focus);
        }
    }

    fn extended_state(&self) -> WindowState {
        self.state
    }

    fn set_extended_state(&mut self, state: WindowState) {
        self.state = state;
        match state {
            WindowState::Normal => {
                self.ctx.send_viewport_cmd(ViewportCommand::Minimized(false));
                self.ctx.send_viewport_cmd(ViewportCommand::Maximized(false));
            }
            WindowState::Minimized => {
                self.ctx.send_viewport_cmd(ViewportCommand::Minimized(true));
            }
            WindowState::Maximized => {
                self.ctx.send_viewport_cmd(ViewportCommand::Maximized(true));
            }
        }
    }

    fn resize_to_fit(&mut self) {
        if self.state != WindowState::Normal {
            return;
        }
        let Some(content) = self.content_size else {
            return;
        };
        let target = (content + FIT_MARGIN).max(MIN_WINDOW_SIZE).round();
        if self.fitted_size == Some(target) {
            return;
        }
        self.fitted_size = Some(target);
        self.ctx.send_viewport_cmd(ViewportCommand::InnerSize(target));
        tracing::debug!(width = target.x, height = target.y, "Window fitted to content");
    }

    fn repaint(&mut self) {
        self.ctx.request_repaint();
    }
}

impl ContainerHandle for EguiView {
    fn relayout(&mut self) {
        // Immediate mode: the next frame measures everything again. The fit
        // that follows uses the latest measurement until then.
        self.layout_generation += 1;
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        let visuals = match theme {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        };
        self.ctx.set_visuals(visuals);
    }
}

impl FocusAnchor for EguiView {
    fn request_focus(&mut self) {
        self.focus_pending = true;
    }
}

impl ViewHandles for EguiView {
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

#[cfg(test)]
mod tests {
    use super::*;
    use displayslots_core::FrameUpdater;

    #[test]
    fn test_visibility_and_state() {
        let mut view = EguiView::new(Context::default(), Theme::Light);
        assert!(view.is_visible());

        view.set_visible(false);
        assert!(!view.is_visible());

        view.set_extended_state(WindowState::Minimized);
        view.set_extended_state(WindowState::Normal);
        assert_eq!(view.extended_state(), WindowState::Normal);
    }

    #[test]
    fn test_observe_minimized() {
        let mut view = EguiView::new(Context::default(), Theme::Light);
        view.observe_minimized(true);
        assert_eq!(view.extended_state(), WindowState::Minimized);
        view.observe_minimized(false);
        assert_eq!(view.extended_state(), WindowState::Normal);

        view.set_extended_state(WindowState::Maximized);
        view.observe_minimized(false);
        assert_eq!(view.extended_state(), WindowState::Maximized);
    }

    #[test]
    fn test_update_fits_window_to_content() {
        let mut view = EguiView::new(Context::default(), Theme::Light);
        view.record_content_size(Vec2::new(300.0, 200.0));

        FrameUpdater::new().update(&mut view);
        assert_eq!(view.layout_generation(), 1);
        assert_eq!(view.fitted_size, Some(Vec2::new(316.0, 216.0)));

        // Content grew between passes
        view.record_content_size(Vec2::new(400.0, 250.0));
        FrameUpdater::new().update(&mut view);
        assert_eq!(view.layout_generation(), 2);
        assert_eq!(view.fitted_size, Some(Vec2::new(416.0, 266.0)));
    }

    #[test]
    fn test_theme_change_refits() {
        let mut view = EguiView::new(Context::default(), Theme::Light);
        view.record_content_size(Vec2::new(500.0, 300.0));

        FrameUpdater::new().update_ui(&mut view, Theme::Dark);
        assert_eq!(view.theme(), Theme::Dark);
        assert_eq!(view.fitted_size, Some(Vec2::new(516.0, 316.0)));
    }

    #[test]
    fn test_no_fit_before_first_measurement() {
        let mut view = EguiView::new(Context::default(), Theme::Light);
        FrameUpdater::new().update(&mut view);
        assert_eq!(view.fitted_size, None);
    }

    #[test]
    fn test_resize_to_fit_only_on_change() {
        let mut view = EguiView::new(Context::default(), Theme::Light);
        view.record_content_size(Vec2::new(300.0, 200.0));
        view.resize_to_fit();
        assert_eq!(view.fitted_size, Some(Vec2::new(316.0, 216.0)));

        view.record_content_size(Vec2::new(10.0, 10.0));
        view.resize_to_fit();
        assert_eq!(view.fitted_size, Some(MIN_WINDOW_SIZE));
    }

    #[test]
    fn test_theme_and_focus() {
        let mut view = EguiView::new(Context::default(), Theme::Dark);
        assert_eq!(view.theme(), Theme::Dark);

        FrameUpdater::new().update_ui(&mut view, Theme::Light);
        assert_eq!(view.theme(), Theme::Light);

        assert!(!view.take_focus_request());
        view.request_focus();
        assert!(view.take_focus_request());
        assert!(!view.take_focus_request());
    }
}
