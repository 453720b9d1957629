//! Desktop shell
//!
//! Contains:
//! - System tray backend ([`tray`])
//! - egui binding of the view handles ([`view`])
//! - Native wake-up of the hidden window ([`wake`])

pub mod tray;
pub mod view;
pub mod wake;
