//! Borrowed handles onto the application view
//!
//! The subsystem never owns the window or its components. The UI toolkit
//! implements these traits and lends them out from the UI thread.

/// Extended state of the top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowState {
    /// Regular, non-minimized window
    #[default]
    Normal,
    /// Iconified to the task bar
    Minimized,
    /// Filling the work area
    Maximized,
}

/// Visual theme propagated through the component tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Top-level application window
pub trait WindowHandle {
    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    fn extended_state(&self) -> WindowState;

    fn set_extended_state(&mut self, state: WindowState);

    /// Resize the window around the preferred size of its content
    fn resize_to_fit(&mut self);

    /// Schedule a repaint of the whole window
    fn repaint(&mut self);
}

/// Root content container of the window
pub trait ContainerHandle {
    /// Invalidate and recompute the requested sizes of all children
    fn relayout(&mut self);

    /// Apply a theme to this container and every descendant
    fn apply_theme(&mut self, theme: Theme);
}

/// Stable component that receives keyboard focus after a restore
pub trait FocusAnchor {
    fn request_focus(&mut self);
}

/// Provider of the handles the subsystem operates on
///
/// Implemented by the view that lives on the UI thread. Exclusive access
/// (`&mut self`) is what guarantees window mutation happens there.
pub trait ViewHandles {
    fn window(&mut self) -> &mut dyn WindowHandle;

    fn root_container(&mut self) -> &mut dyn ContainerHandle;

    fn focus_anchor(&mut self) -> &mut dyn FocusAnchor;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn test_default_window_state_is_normal() {
        assert_eq!(WindowState::default(), WindowState::Normal);
    }
}
