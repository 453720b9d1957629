//! Relayout and repaint of the application window
//!
//! Both passes mutate the window, so they take the view by `&mut` and can
//! only run where the view lives: the UI thread.

use crate::view::{Theme, ViewHandles};

/// Stateless relayout/repaint pass over the application window
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameUpdater;

impl FrameUpdater {
    pub fn new() -> Self {
        Self
    }

    /// Relayout the root container, fit the window around it and repaint
    pub fn update(&self, view: &mut dyn ViewHandles) {
        view.root_container().relayout();
        let window = view.window();
        window.resize_to_fit();
        window.repaint();
        tracing::trace!("Frame updated");
    }

    /// Propagate a theme change through the component tree, then update
    ///
    /// Called by controllers after a theme toggle, never by the refresh timer.
    pub fn update_ui(&self, view: &mut dyn ViewHandles, theme: Theme) {
        view.root_container().apply_theme(theme);
        tracing::debug!(?theme, "Theme applied to component tree");
        self.update(view);
    }
}
