//! Tests for the desktop work-area coordinator

use super::*;
use crate::layout::LayoutFile;
use crate::os::VirtualDisplay;
use proptest::prelude::*;

fn dual_display() -> VirtualDisplay {
    VirtualDisplay::new(&[
        Rect::new(0, 0, 1920, 1080),
        Rect::new(1920, 0, 3200, 1024),
    ])
}

fn coordinator_with(display: &VirtualDisplay, layout: &str) -> DesktopWorkAreaCoordinator {
    let layout = LayoutFile::parse(layout);
    let mut coordinator = DesktopWorkAreaCoordinator::new(Box::new(display.clone()));
    coordinator.load_from_config(layout.section("SkinHost"));
    coordinator
}

#[test]
fn test_shared_absolute_area() {
    let display = dual_display();
    let mut coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea=0,0,1000,950\n");

    assert!(coordinator.is_changed());
    assert_eq!(coordinator.area(0), Some(Rect::new(0, 0, 1000, 950)));

    let report = coordinator.apply().unwrap();
    assert_eq!(report, ApplyReport { applied: 1, failed: 0 });
    assert_eq!(display.applied(), vec![Rect::new(0, 0, 1000, 950)]);
    assert_eq!(display.work_areas()[0], Rect::new(0, 0, 1000, 950));
    assert_eq!(display.notifications(), 1);
}

#[test]
fn test_device_area_is_offset_to_device_origin() {
    let display = dual_display();
    let mut coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea@2=0,0,1280,1000\n");

    coordinator.apply().unwrap();
    assert_eq!(display.applied(), vec![Rect::new(1920, 0, 3200, 1000)]);
}

#[test]
fn test_margin_mode_insets_device_rect() {
    let display = dual_display();
    let mut coordinator = coordinator_with(
        &display,
        "[SkinHost]\nDesktopWorkAreaType=1\nDesktopWorkArea=0,0,0,40\nDesktopWorkArea@2=10,0,10,24\n",
    );
    assert_eq!(coordinator.mode(), WorkAreaMode::MarginRelative);

    coordinator.apply().unwrap();
    assert_eq!(
        display.applied(),
        vec![Rect::new(0, 0, 1920, 1040), Rect::new(1930, 0, 3190, 1000)]
    );
}

#[test]
fn test_indices_beyond_device_count_are_ignored() {
    let display = dual_display();
    let coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea@3=0,0,10,10\n");
    assert_eq!(coordinator.area(3), None);
    assert!(!coordinator.is_changed());
}

#[test]
fn test_invalid_rect_is_skipped() {
    let display = dual_display();
    let coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea=wide\nDesktopWorkArea@1=0,0,5,5\n");
    assert_eq!(coordinator.area(0), None);
    assert_eq!(coordinator.area(1), Some(Rect::new(0, 0, 5, 5)));
}

#[test]
fn test_out_of_range_rect_fails_without_panicking() {
    let display = dual_display();
    let mut coordinator = coordinator_with(
        &display,
        "[SkinHost]\nDesktopWorkArea@1=0,0,1920,1000\nDesktopWorkArea@2=2147483000,0,2147483600,100\n",
    );

    let report = coordinator.apply().unwrap();
    assert_eq!(report, ApplyReport { applied: 1, failed: 1 });
    assert_eq!(display.applied(), vec![Rect::new(0, 0, 1920, 1000)]);
}

#[test]
fn test_out_of_range_margins_fail() {
    let display = dual_display();
    let mut coordinator = coordinator_with(
        &display,
        "[SkinHost]\nDesktopWorkAreaType=1\nDesktopWorkArea=0,0,0,-2147483000\n",
    );

    let report = coordinator.apply().unwrap();
    assert_eq!(report, ApplyReport { applied: 0, failed: 1 });
    assert!(display.applied().is_empty());
}

#[test]
fn test_resolve_rect_without_devices() {
    let err = resolve_rect(Rect::new(0, 0, 5, 5), 1, WorkAreaMode::Absolute, &[]).unwrap_err();
    assert!(matches!(err, WorkAreaError::NoDevice { .. }));
    assert_eq!(err.to_string(), "DesktopWorkArea@1: no device to apply against");
}

#[test]
fn test_snapshot_taken_once() {
    let display = dual_display();
    let mut coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea@1=0,0,1920,1000\n");

    coordinator.apply().unwrap();
    coordinator.apply().unwrap();
    assert!(coordinator.has_snapshot());

    assert_eq!(coordinator.revert(), 2);
    assert_eq!(
        display.work_areas(),
        vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 3200, 1024)]
    );
    assert!(!coordinator.has_snapshot());
    assert_eq!(coordinator.revert(), 0);
}

#[test]
fn test_rejected_set_is_reported_not_notified() {
    let display = dual_display();
    display.reject_sets(true);
    let mut coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea=0,0,100,100\n");

    let report = coordinator.apply().unwrap();
    assert_eq!(report, ApplyReport { applied: 0, failed: 1 });
    assert_eq!(display.notifications(), 0);
}

#[test]
fn test_reset_keeps_snapshot() {
    let display = dual_display();
    let mut coordinator =
        coordinator_with(&display, "[SkinHost]\nDesktopWorkArea=0,0,100,100\n");
    coordinator.apply().unwrap();

    coordinator.reset();
    assert_eq!(coordinator.area(0), None);
    assert!(coordinator.is_changed());
    assert!(coordinator.has_snapshot());
}

#[test]
fn test_area_keys() {
    assert_eq!(area_key(0), "DesktopWorkArea");
    assert_eq!(area_key(3), "DesktopWorkArea@3");
}

fn screens_strategy() -> impl Strategy<Value = Vec<Rect>> {
    prop::collection::vec((640i32..2560, 480i32..1600), 1..5).prop_map(|sizes| {
        let mut left = 0;
        sizes
            .into_iter()
            .map(|(w, h)| {
                let rect = Rect::new(left, 0, left + w, h);
                left += w;
                rect
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Apply followed by revert restores every device's work rectangle.
    #[test]
    fn apply_then_revert_restores_every_device(
        screens in screens_strategy(),
        margins in prop::collection::vec((0i32..200, 0i32..200, 0i32..200, 0i32..200), 5),
        margin_mode in proptest::bool::ANY,
        shared in proptest::bool::ANY,
    ) {
        let display = VirtualDisplay::new(&screens);
        let before = display.work_areas();

        let mut text = String::from("[SkinHost]\n");
        if margin_mode {
            text.push_str("DesktopWorkAreaType=1\n");
        }
        for (index, (l, t, r, b)) in margins.iter().enumerate().take(screens.len() + 1) {
            if index == 0 && !shared {
                continue;
            }
            let rect = if margin_mode {
                Rect::new(*l, *t, *r, *b)
            } else {
                Rect::new(*l, *t, 300 + *r, 300 + *b)
            };
            text.push_str(&format!(
                "{}={},{},{},{}\n",
                area_key(index), rect.left, rect.top, rect.right, rect.bottom
            ));
        }

        let mut coordinator = coordinator_with(&display, &text);
        coordinator.apply().unwrap();
        coordinator.revert();

        prop_assert_eq!(display.work_areas(), before);
    }
}
