//! E2E tests for the minimize-to-tray lifecycle
//!
//! Drives the tray manager through minimize, restore and exit with a
//! recording view and a fake tray backend, and checks that tray actions
//! arriving from a foreign thread are executed on the UI side.

use displayslots::controller::Controller;
use displayslots::{
    ui_channel, RefreshInterval, RefresherState, Theme, TrayAction, TrayConfig, TrayError,
    TrayLifecycleManager, TrayState, UiCommand, ViewRefresher, WindowState,
};
use displayslots_core::testing::{
    CountingSink, ExitCalled, FailPoint, FakeTray, PanickingExit, RecordingView, ViewOp,
};
use displayslots_core::WindowHandle;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

fn tray_config() -> TrayConfig {
    TrayConfig {
        name: "displayslots-test".to_string(),
        tooltip: "Display Slots (test)".to_string(),
        image: Some(PathBuf::from("assets/tray.png")).into(),
    }
}

/// execute() hides the window and creates one icon; Restore undoes both
#[test]
fn test_execute_then_restore_scenario() {
    let tray = FakeTray::new();
    let mut manager = TrayLifecycleManager::new(tray.clone(), tray_config());
    let mut view = RecordingView::new();
    let mut refresher = ViewRefresher::new(
        RefreshInterval::from_millis(100).unwrap(),
        CountingSink::new(),
    );
    refresher.start().unwrap();

    manager.execute(&mut view).unwrap();
    refresher.suspend();

    assert!(!view.is_window_visible(), "Window must be hidden in tray");
    assert_eq!(tray.live_icons(), 1, "Exactly one tray icon while resident");
    assert_eq!(tray.tooltip().as_deref(), Some("Display Slots (test)"));
    assert_eq!(manager.state(), TrayState::TrayResident);

    manager.handle_action(TrayAction::Restore, &mut view, &refresher, &PanickingExit);

    assert!(view.is_window_visible(), "Window must be visible after restore");
    assert_eq!(view.window_state(), WindowState::Normal);
    assert_eq!(tray.live_icons(), 0, "No tray icon after restore");
    assert_eq!(refresher.state(), RefresherState::Running);
    assert_eq!(manager.state(), TrayState::WindowVisible);

    refresher.stop();
}

/// Restore sets the state, shows the window, then focuses the anchor
#[test]
fn test_restore_order() {
    let mut manager = TrayLifecycleManager::new(FakeTray::new(), tray_config());
    let mut view = RecordingView::new();
    let refresher = ViewRefresher::new(RefreshInterval::default(), CountingSink::new());

    view.set_extended_state(WindowState::Minimized);
    manager.execute(&mut view).unwrap();
    view.clear_ops();

    manager.restore(&mut view, &refresher);
    assert_eq!(
        view.ops(),
        &[
            ViewOp::SetExtendedState(WindowState::Normal),
            ViewOp::SetVisible(true),
            ViewOp::RequestFocus,
        ]
    );
}

/// A second execute() while in the tray is rejected without a second icon
#[test]
fn test_execute_rejected_while_resident() {
    let tray = FakeTray::new();
    let mut manager = TrayLifecycleManager::new(tray.clone(), tray_config());
    let mut view = RecordingView::new();

    manager.execute(&mut view).unwrap();
    let result = manager.execute(&mut view);

    assert_eq!(result, Err(TrayError::AlreadyResident));
    assert_eq!(tray.created(), 1);
    assert_eq!(tray.live_icons(), 1);
}

/// Platform failure while configuring the icon propagates and leaks nothing
#[test]
fn test_platform_failure_propagates() {
    for point in [FailPoint::Create, FailPoint::Tooltip, FailPoint::Image, FailPoint::Menu] {
        let tray = FakeTray::new();
        tray.fail_at(point);
        let mut manager = TrayLifecycleManager::new(tray.clone(), tray_config());
        let mut view = RecordingView::new();

        assert!(manager.execute(&mut view).is_err(), "{:?} must fail", point);
        assert_eq!(tray.live_icons(), 0, "{:?} leaked an icon", point);
        assert!(view.is_window_visible(), "{:?} left the window hidden", point);
        assert_eq!(manager.state(), TrayState::WindowVisible);
    }
}

/// Exit tears down the icon and terminates with status 0, no window mutation after
#[test]
fn test_exit_terminates() {
    let tray = FakeTray::new();
    let mut manager = TrayLifecycleManager::new(tray.clone(), tray_config());
    let mut view = RecordingView::new();
    let refresher = ViewRefresher::new(RefreshInterval::default(), CountingSink::new());

    manager.execute(&mut view).unwrap();
    view.clear_ops();

    let result = catch_unwind(AssertUnwindSafe(|| {
        manager.handle_action(TrayAction::Exit, &mut view, &refresher, &PanickingExit);
        // Unreachable when exit terminates
        view.set_visible(true);
    }));

    let payload = result.expect_err("Exit must terminate");
    assert_eq!(payload.downcast_ref::<ExitCalled>(), Some(&ExitCalled(0)));
    assert_eq!(tray.live_icons(), 0);
    assert!(view.ops().is_empty(), "No window mutation after exit");
}

/// Restore posted from the tray's event thread runs when the UI pumps
#[test]
fn test_restore_marshalled_from_foreign_thread() {
    let (dispatcher, inbox) = ui_channel();
    let tray = FakeTray::new();
    let refresher = ViewRefresher::new(
        RefreshInterval::from_millis(1000).unwrap(),
        CountingSink::new(),
    );
    let mut controller = Controller::new(
        RecordingView::new(),
        inbox,
        refresher,
        TrayLifecycleManager::new(tray.clone(), tray_config()),
        PanickingExit,
        Theme::Light,
    );

    controller.minimize_to_tray().unwrap();
    assert_eq!(controller.refresher().state(), RefresherState::Suspended);

    let tray_thread = dispatcher.clone();
    std::thread::spawn(move || {
        tray_thread.post(UiCommand::Tray(TrayAction::Restore));
        // Duplicate delivery, e.g. menu entry plus icon click
        tray_thread.post(UiCommand::Tray(TrayAction::Restore));
    })
    .join()
    .unwrap();

    // Nothing happens until the UI thread drains its inbox
    assert!(!controller.view().is_window_visible());
    assert_eq!(tray.live_icons(), 1);

    let pumped = controller.pump();
    assert_eq!(pumped.executed, 2);
    assert!(!pumped.shutdown);
    assert!(controller.view().is_window_visible());
    assert_eq!(controller.view().focus_requests(), 1);
    assert_eq!(tray.live_icons(), 0);
    assert_eq!(controller.refresher().state(), RefresherState::Running);
}

/// Repeated minimize/restore cycles never leave more than one icon
#[test]
fn test_many_cycles() {
    let (_dispatcher, inbox) = ui_channel();
    let tray = FakeTray::new();
    let mut controller = Controller::new(
        RecordingView::new(),
        inbox,
        ViewRefresher::new(RefreshInterval::default(), CountingSink::new()),
        TrayLifecycleManager::new(tray.clone(), tray_config()),
        PanickingExit,
        Theme::Light,
    );

    for cycle in 1..=5 {
        controller.minimize_to_tray().unwrap();
        assert_eq!(tray.live_icons(), 1);
        controller.handle_command(UiCommand::Tray(TrayAction::Restore));
        assert_eq!(tray.live_icons(), 0);
        assert_eq!(tray.created(), cycle);
    }
    assert_eq!(controller.tray().sessions(), 5);
}
