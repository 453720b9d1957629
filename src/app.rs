//! Main application window
//!
//! Wraps the [`Controller`] in an `eframe::App`. Every frame drains the UI
//! inbox, reacts to minimize and close requests from the window manager, and
//! renders the slot list.

use crate::config::AppConfig;
use crate::controller::{CloseDecision, Controller};
use crate::ui::tray::{SystemTray, TRAY_SUPPORTED};
use crate::ui::view::EguiView;
use crate::ui::wake::NativeWindow;
use displayslots_core::{
    RefresherError, StdProcessExit, Theme, TrayError, TrayLifecycleManager, UiDispatcher, UiInbox,
    ViewRefresher,
};
use egui::ViewportCommand;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Errors that end the application
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Refresher error: {0}")]
    Refresher(#[from] RefresherError),

    #[error("Tray unavailable: {0}")]
    Tray(#[from] TrayError),
}

/// Fatal error raised on the UI thread, read back once the event loop ends
pub type FatalSlot = Arc<OnceLock<AppError>>;

/// Startup options resolved by `main`
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub config: AppConfig,
    pub config_path: PathBuf,
    /// Go to the tray right after the first frame
    pub start_in_tray: bool,
}

/// Buttons pressed during a frame
#[derive(Debug, Default)]
struct PanelActions {
    toggle_theme: bool,
    minimize: bool,
}

/// eframe application
pub struct DisplaySlotsApp {
    controller: Controller<EguiView, SystemTray, StdProcessExit>,
    config: AppConfig,
    config_path: PathBuf,
    fatal: FatalSlot,
    pending_minimize: bool,
}

impl DisplaySlotsApp {
    /// Build the window controller and start the background refresher
    ///
    /// `dispatcher` and `inbox` must come from the same `ui_channel()`; other
    /// clones of the dispatcher (e.g. the Ctrl+C handler) keep posting to
    /// this window.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        options: AppOptions,
        dispatcher: UiDispatcher,
        inbox: UiInbox,
        fatal: FatalSlot,
    ) -> Result<Self, AppError> {
        let ctx = cc.egui_ctx.clone();
        let waker = ctx.clone();
        dispatcher.set_waker(Arc::new(move || waker.request_repaint()));

        let config = options.config;
        let theme = if config.dark_theme {
            Theme::Dark
        } else {
            Theme::Light
        };

        let native = NativeWindow::capture(cc);
        if cfg!(windows) && !native.is_attached() {
            tracing::warn!("Tray actions will wait for the next repaint");
        }
        if !TRAY_SUPPORTED {
            tracing::warn!("System tray unavailable on this platform, window stays visible");
        }

        let refresher = ViewRefresher::new(config.refresh_interval()?, dispatcher.clone());
        let tray = TrayLifecycleManager::new(
            SystemTray::new(dispatcher, Arc::new(move || native.show())),
            config.tray_config(),
        );
        let mut controller = Controller::new(
            EguiView::new(ctx, theme),
            inbox,
            refresher,
            tray,
            StdProcessExit,
            theme,
        )
        .with_close_to_tray(config.minimize_to_tray && TRAY_SUPPORTED);
        controller.start()?;

        Ok(Self {
            controller,
            config,
            config_path: options.config_path,
            fatal,
            pending_minimize: options.start_in_tray && TRAY_SUPPORTED,
        })
    }

    /// Record a fatal error and close the window
    fn fail(&mut self, ctx: &egui::Context, error: AppError) {
        tracing::error!(error = %error, "Fatal error, closing");
        let _ = self.fatal.set(error);
        self.controller.shutdown();
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }

    fn minimize_to_tray(&mut self, ctx: &egui::Context) {
        if let Err(e) = self.controller.minimize_to_tray() {
            self.fail(ctx, e.into());
        }
    }

    fn handle_window_events(&mut self, ctx: &egui::Context) {
        let (minimized, close_requested) = ctx.input(|i| {
            let viewport = i.viewport();
            (viewport.minimized.unwrap_or(false), viewport.close_requested())
        });

        self.controller.view_mut().observe_minimized(minimized);
        if TRAY_SUPPORTED {
            if let Err(e) = self.controller.observe_minimized(minimized) {
                self.fail(ctx, e.into());
                return;
            }
        }

        if close_requested {
            match self.controller.close_requested() {
                Ok(CloseDecision::HideToTray) => {
                    ctx.send_viewport_cmd(ViewportCommand::CancelClose);
                }
                Ok(CloseDecision::Close) => {}
                Err(e) => self.fail(ctx, e.into()),
            }
        }
    }

    fn toggle_theme(&mut self) {
        let theme = self.controller.toggle_theme();
        self.config.dark_theme = theme == Theme::Dark;
        if let Err(e) = self.config.save(&self.config_path) {
            tracing::warn!(error = %e, "Failed to persist theme");
        }
    }

    fn render(&mut self, ctx: &egui::Context) {
        let (actions, content_size) = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let actions = self.render_content(ui);
                (actions, ui.min_rect().size())
            })
            .inner;
        self.controller.view_mut().record_content_size(content_size);

        if actions.toggle_theme {
            self.toggle_theme();
        }
        if actions.minimize {
            self.minimize_to_tray(ctx);
        }
    }

    fn render_content(&mut self, ui: &mut egui::Ui) -> PanelActions {
        let mut actions = PanelActions::default();

        ui.heading("Display Slots");
        ui.separator();

        // The first slot is the focus anchor after a restore
        let focus_anchor = self.controller.view_mut().take_focus_request();
        for slot in 1..=self.config.slot_count {
            let response = ui.button(format!("Slot {slot}"));
            if slot == 1 && focus_anchor {
                response.request_focus();
            }
        }

        ui.separator();

        ui.horizontal(|ui| {
            actions.toggle_theme = ui.button("Toggle theme").clicked();
            actions.minimize = ui
                .add_enabled(TRAY_SUPPORTED, egui::Button::new("Minimize to tray"))
                .clicked();
        });

        ui.separator();

        ui.horizontal(|ui| {
            ui.label(format!(
                "Refresh every {} ms, {} passes",
                self.controller.refresher().interval().as_millis(),
                self.controller.refresh_passes()
            ));
        });

        actions
    }
}

impl eframe::App for DisplaySlotsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.controller.pump().shutdown {
            ctx.send_viewport_cmd(ViewportCommand::Close);
            return;
        }

        if std::mem::take(&mut self.pending_minimize) {
            self.minimize_to_tray(ctx);
        }

        self.handle_window_events(ctx);
        self.render(ctx);
    }
}
