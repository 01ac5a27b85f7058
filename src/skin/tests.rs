//! Tests for the skin orchestrator

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use tempfile::TempDir;

use super::*;
use crate::boundary::NativeObject;
use crate::command::{Action, SkinTarget};
use crate::core::config::HostConfig;
use crate::core::error::SkinError;
use crate::os::{Rect, VirtualDisplay};

type EventLog = Arc<Mutex<Vec<String>>>;

/// Renderer that records its lifecycle calls
struct RecordingRenderer {
    name: String,
    log: EventLog,
    teardown: Teardown,
    groups: String,
    on_refresh: Option<Action>,
}

impl SkinRenderer for RecordingRenderer {
    fn initialize(&mut self, _cx: &mut SkinContext<'_>) -> Result<SkinManifest, SkinError> {
        self.log.lock().push(format!("init:{}", self.name));
        Ok(SkinManifest {
            groups: self.groups.clone(),
            sections: Vec::new(),
        })
    }

    fn refresh(&mut self, cx: &mut SkinContext<'_>) {
        self.log.lock().push(format!("refresh:{}", self.name));
        if let Some(action) = self.on_refresh.clone() {
            cx.post(action);
        }
    }

    fn deactivate(&mut self, _cx: &mut SkinContext<'_>) -> Teardown {
        self.log.lock().push(format!("deactivate:{}", self.name));
        self.teardown
    }

    fn close(&mut self, _cx: &mut SkinContext<'_>) {
        self.log.lock().push(format!("close:{}", self.name));
    }
}

struct Fixture {
    dir: TempDir,
    display: VirtualDisplay,
    config: HostConfig,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = HostConfig::with_work_directory(dir.path());
        fs::create_dir_all(config.skins_path()).unwrap();
        Self {
            dir,
            display: VirtualDisplay::single(Rect::new(0, 0, 1920, 1080)),
            config,
        }
    }

    fn skin(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.config.skins_path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn layout(&self, contents: &str) {
        fs::write(self.config.layout_path(), contents).unwrap();
    }

    fn headless(&self) -> SkinOrchestrator {
        SkinOrchestrator::new(&self.config, Box::new(self.display.clone()))
    }

    fn recording(&self, log: &EventLog, teardown: Teardown) -> SkinOrchestrator {
        self.recording_with_refresh(log, teardown, "", None)
    }

    /// Like `recording`, but the skin named `poster` posts `action` on refresh
    fn recording_with_refresh(
        &self,
        log: &EventLog,
        teardown: Teardown,
        poster: &str,
        action: Option<Action>,
    ) -> SkinOrchestrator {
        let log = log.clone();
        let poster = poster.to_string();
        let factory = move |key: &SkinKey| -> Box<dyn SkinRenderer> {
            let name = key
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let groups = if name.starts_with('g') { "Grouped" } else { "" };
            let on_refresh = if name == poster { action.clone() } else { None };
            Box::new(RecordingRenderer {
                name,
                log: log.clone(),
                teardown,
                groups: groups.to_string(),
                on_refresh,
            })
        };
        self.headless().with_factory(Box::new(factory))
    }
}

fn ordered_names(orchestrator: &SkinOrchestrator, group: Option<&str>) -> Vec<String> {
    orchestrator
        .meter_windows_by_load_order(group)
        .into_iter()
        .map(|w| {
            w.key()
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn test_activate_twice_is_noop() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();

    let first = orchestrator.activate_skin(Path::new("a.ini")).unwrap();
    let handles = orchestrator.registry().len();
    let second = orchestrator.activate_skin(Path::new("a.ini")).unwrap();

    assert!(matches!(first, Activation::Activated(_)));
    assert_eq!(second, Activation::AlreadyActive(first.id()));
    assert_eq!(orchestrator.registry().len(), handles);
    assert_eq!(orchestrator.window_count(), 1);
}

#[test]
fn test_case_variants_share_one_window() {
    let fx = Fixture::new();
    fx.skin("A.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();

    let upper = orchestrator.activate_skin(Path::new("A.ini")).unwrap();
    let lower = orchestrator.activate_skin(Path::new("a.ini")).unwrap();

    assert_eq!(lower, Activation::AlreadyActive(upper.id()));
    assert_eq!(orchestrator.window_count(), 1);
    let window = orchestrator.window(upper.id()).unwrap();
    assert_eq!(window.key().key(), window.key().key().to_lowercase());
}

#[test]
fn test_missing_skin_creates_nothing() {
    let fx = Fixture::new();
    let mut orchestrator = fx.headless();

    let err = orchestrator.activate_skin(Path::new("missing.ini")).unwrap_err();

    assert!(matches!(err, SkinError::NotFound { .. }));
    assert_eq!(orchestrator.window_count(), 0);
    assert!(orchestrator.registry().is_empty());
}

#[test]
fn test_skin_and_sections_are_published() {
    let fx = Fixture::new();
    fx.skin(
        "clock.ini",
        "[SkinHost]\nGroup=Clocks\n\n[Variables]\nx=1\n\n[MeterTime]\nUpdateDivider=5\n\n[MeterDate]\n",
    );
    let mut orchestrator = fx.headless();

    let id = orchestrator.activate_skin(Path::new("clock.ini")).unwrap().id();
    let window = orchestrator.window(id).unwrap();

    assert_eq!(window.section_handles().len(), 2);
    assert_eq!(orchestrator.registry().len(), 3);
    assert!(window.belongs_to_group("clocks"));

    let handle = window.handle().unwrap();
    let key = orchestrator.registry().with(handle, |o| o.is_skin_key(window.key().key()));
    assert_eq!(key, Ok(true));
}

#[test]
fn test_immediate_deactivate_removes_window() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let log = EventLog::default();
    let mut orchestrator = fx.recording(&log, Teardown::Immediate);

    let id = orchestrator.activate_skin(Path::new("a.ini")).unwrap().id();
    orchestrator.deactivate_skin(id).unwrap();

    assert_eq!(orchestrator.window_count(), 0);
    assert!(orchestrator.registry().is_empty());
    assert_eq!(*log.lock(), vec!["init:a", "deactivate:a", "close:a"]);
    assert!(matches!(
        orchestrator.deactivate_skin(id),
        Err(SkinError::UnknownWindow(_))
    ));
}

#[test]
fn test_deferred_deactivate_detaches_until_closed() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let log = EventLog::default();
    let mut orchestrator = fx.recording(&log, Teardown::Deferred(std::time::Duration::from_millis(250)));

    let id = orchestrator.activate_skin(Path::new("a.ini")).unwrap().id();
    orchestrator.deactivate_skin(id).unwrap();

    assert_eq!(orchestrator.window_count(), 0);
    assert_eq!(orchestrator.unmanaged_count(), 1);
    assert!(!orchestrator.has_meter_window(Path::new("a.ini")));

    let scheduled = orchestrator.take_scheduled_closes();
    assert_eq!(scheduled, vec![(id, std::time::Duration::from_millis(250))]);

    // The skin can be started again while the old window fades out
    let again = orchestrator.activate_skin(Path::new("a.ini")).unwrap();
    assert_ne!(again.id(), id);

    orchestrator.skin_closed(id);
    assert_eq!(orchestrator.unmanaged_count(), 0);
    assert_eq!(orchestrator.window_count(), 1);
    assert_eq!(log.lock().last().map(String::as_str), Some("close:a"));
}

#[test]
fn test_toggle_switches_state() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();

    orchestrator.toggle_skin(Path::new("a.ini")).unwrap();
    assert!(orchestrator.has_meter_window(Path::new("a.ini")));

    orchestrator.toggle_skin(Path::new("a.ini")).unwrap();
    assert!(!orchestrator.has_meter_window(Path::new("a.ini")));
}

#[test]
fn test_unmanaged_list_is_idempotent() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let log = EventLog::default();
    let mut orchestrator = fx.recording(&log, Teardown::Deferred(std::time::Duration::from_secs(1)));

    let id = orchestrator.activate_skin(Path::new("a.ini")).unwrap().id();
    orchestrator.deactivate_skin(id).unwrap();

    let window = orchestrator.remove_unmanaged_meter_window(id).unwrap();
    assert!(orchestrator.remove_unmanaged_meter_window(id).is_none());

    orchestrator.add_unmanaged_meter_window(window);
    assert_eq!(orchestrator.unmanaged_count(), 1);
}

#[test]
fn test_load_order_ties_keep_activation_order() {
    let fx = Fixture::new();
    for name in ["a.ini", "b.ini", "c.ini", "d.ini"] {
        fx.skin(name, "[SkinHost]\n");
    }
    let log = EventLog::default();
    let mut orchestrator = fx.recording(&log, Teardown::Immediate);

    orchestrator.set_load_order(Path::new("a.ini"), 2);
    orchestrator.set_load_order(Path::new("b.ini"), 1);
    orchestrator.set_load_order(Path::new("d.ini"), 1);
    for name in ["a.ini", "b.ini", "c.ini", "d.ini"] {
        orchestrator.activate_skin(Path::new(name)).unwrap();
    }

    assert_eq!(orchestrator.get_load_order(Path::new("c.ini")), None);
    assert_eq!(orchestrator.get_load_order(Path::new("B.INI")), Some(1));
    assert_eq!(ordered_names(&orchestrator, None), vec!["c", "b", "d", "a"]);
}

#[test]
fn test_group_filter() {
    let fx = Fixture::new();
    for name in ["g1.ini", "plain.ini", "g2.ini"] {
        fx.skin(name, "[SkinHost]\n");
    }
    let log = EventLog::default();
    let mut orchestrator = fx.recording(&log, Teardown::Immediate);
    for name in ["g1.ini", "plain.ini", "g2.ini"] {
        orchestrator.activate_skin(Path::new(name)).unwrap();
    }

    assert_eq!(ordered_names(&orchestrator, Some("grouped")), vec!["g1", "g2"]);
}

#[test]
fn test_layout_scenario() {
    let fx = Fixture::new();
    for name in ["SkinA", "SkinB", "SkinC"] {
        fx.skin(name, "[SkinHost]\n");
    }
    fx.layout(
        "[SkinHost]\nDesktopWorkArea=0,0,1000,950\n\n\
         [SkinA]\nActive=1\nLoadOrder=5\n\n\
         [SkinB]\nActive=1\nLoadOrder=1\n\n\
         [SkinC]\nLoadOrder=0\n",
    );
    let log = EventLog::default();
    let mut orchestrator = fx.recording(&log, Teardown::Immediate);

    orchestrator.load_layout(None).unwrap();

    assert!(orchestrator.has_meter_window(Path::new("SkinA")));
    assert!(orchestrator.has_meter_window(Path::new("SkinB")));
    assert!(!orchestrator.has_meter_window(Path::new("SkinC")));
    assert_eq!(fx.display.work_areas()[0], Rect::new(0, 0, 1000, 950));

    log.lock().clear();
    orchestrator.refresh_all();
    assert_eq!(*log.lock(), vec!["refresh:SkinB", "refresh:SkinA"]);
}

#[test]
fn test_refresh_all_applies_newly_configured_work_area() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    fx.layout("[a.ini]\nActive=1\n");
    let mut orchestrator = fx.headless();
    orchestrator.initialize();
    assert_eq!(fx.display.work_areas()[0], Rect::new(0, 0, 1920, 1080));

    fx.layout("[SkinHost]\nDesktopWorkArea=0,0,1000,950\n\n[a.ini]\nActive=1\n");
    orchestrator.refresh_all();

    assert_eq!(fx.display.work_areas()[0], Rect::new(0, 0, 1000, 950));
    assert!(orchestrator.has_meter_window(Path::new("a.ini")));
}

#[test]
fn test_lifecycle_requests_during_refresh_are_deferred() {
    let fx = Fixture::new();
    for name in ["a.ini", "b.ini", "c.ini"] {
        fx.skin(name, "[SkinHost]\n");
    }
    let log = EventLog::default();
    let deactivate_c = Action::Deactivate(SkinTarget::Path(PathBuf::from("c.ini")));
    let mut orchestrator =
        fx.recording_with_refresh(&log, Teardown::Immediate, "a", Some(deactivate_c));

    for (order, name) in ["a.ini", "b.ini", "c.ini"].into_iter().enumerate() {
        orchestrator.set_load_order(Path::new(name), order as i32);
        orchestrator.activate_skin(Path::new(name)).unwrap();
    }
    log.lock().clear();

    orchestrator.refresh_all();

    assert_eq!(
        *log.lock(),
        vec!["refresh:a", "refresh:b", "refresh:c", "deactivate:c", "close:c"]
    );
    assert!(!orchestrator.has_meter_window(Path::new("c.ini")));
    assert_eq!(orchestrator.window_count(), 2);
}

#[test]
fn test_unreadable_layout_changes_nothing() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();
    orchestrator.activate_skin(Path::new("a.ini")).unwrap();

    assert!(orchestrator.load_layout(Some(Path::new("nowhere"))).is_err());
    assert_eq!(orchestrator.window_count(), 1);
    assert_eq!(orchestrator.layout_path(), fx.config.layout_path());
}

#[test]
fn test_named_layout_resolves_directory() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let dir = fx.config.layouts_path().join("Work");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("SkinHost.ini"), "[a.ini]\nActive=1\n").unwrap();
    let mut orchestrator = fx.headless();

    orchestrator.load_layout(Some(Path::new("Work"))).unwrap();

    assert_eq!(orchestrator.layout_path(), dir.join("SkinHost.ini"));
    assert!(orchestrator.has_meter_window(Path::new("a.ini")));
}

#[test]
fn test_reentrant_clear_terminates() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\nOnCloseAction=!ActivateConfig b.ini\n");
    fx.skin("b.ini", "[SkinHost]\nOnCloseAction=!ActivateConfig a.ini\n");
    fx.layout("[a.ini]\nActive=1\n");
    let mut orchestrator = fx.headless();
    orchestrator.initialize();
    assert_eq!(orchestrator.window_count(), 1);

    orchestrator.load_layout(None).unwrap();

    assert_eq!(orchestrator.window_count(), 1);
    assert!(orchestrator.has_meter_window(Path::new("a.ini")));
    assert!(!orchestrator.has_meter_window(Path::new("b.ini")));
    assert_eq!(orchestrator.registry().len(), 1);

    orchestrator.finalize();
    assert_eq!(orchestrator.window_count(), 0);
    assert_eq!(orchestrator.unmanaged_count(), 0);
    assert!(orchestrator.registry().is_empty());
}

#[test]
fn test_refresh_action_runs_scoped_command() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\nOnRefreshAction=[!ActivateConfig b.ini]\n");
    fx.skin("b.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();

    orchestrator.activate_skin(Path::new("a.ini")).unwrap();

    assert!(orchestrator.has_meter_window(Path::new("b.ini")));
}

#[test]
fn test_refresh_counts_section_updates() {
    let fx = Fixture::new();
    fx.skin(
        "a.ini",
        "[SkinHost]\n\n[MeterTime]\nUpdateDivider=3\nOnUpdateAction=[!ActivateConfig b.ini]\n",
    );
    fx.skin("b.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();
    let id = orchestrator.activate_skin(Path::new("a.ini")).unwrap().id();
    let section = orchestrator.window(id).unwrap().section_handles()[0];
    let counter = |o: &SkinOrchestrator| {
        o.registry()
            .with(section, |object| match object {
                NativeObject::Section(s) => s.lock().update_counter(),
                _ => -1,
            })
            .unwrap()
    };

    orchestrator.refresh_all();
    orchestrator.refresh_all();
    assert_eq!(counter(&orchestrator), 2);
    assert!(!orchestrator.has_meter_window(Path::new("b.ini")));

    orchestrator.refresh_all();
    assert_eq!(counter(&orchestrator), 0);
    assert!(orchestrator.has_meter_window(Path::new("b.ini")));
}

#[test]
fn test_commands_drive_lifecycle() {
    let fx = Fixture::new();
    fx.skin("a.ini", "[SkinHost]\n");
    let mut orchestrator = fx.headless();

    assert_eq!(orchestrator.execute_command("!ToggleConfig a.ini", None), 1);
    let id = orchestrator.window_by_path(Path::new("a.ini")).unwrap().id();

    assert!(orchestrator.execute_bang("!DeactivateConfig", &[], Some(id)));
    assert_eq!(orchestrator.window_count(), 0);

    assert!(!orchestrator.execute_bang("!NoSuchBang", &[], None));
}

#[test]
fn test_finalize_writes_stats_and_restores_work_area() {
    let fx = Fixture::new();
    fx.layout("[SkinHost]\nDesktopWorkArea=0,0,1000,950\n");
    let mut orchestrator = fx.headless();
    orchestrator.initialize();
    assert_eq!(fx.display.work_areas()[0], Rect::new(0, 0, 1000, 950));

    orchestrator.finalize();

    assert_eq!(fx.display.work_areas()[0], Rect::new(0, 0, 1920, 1080));
    assert!(fx.config.stats_path().exists());
    assert!(fx.dir.path().join("SkinHost.stats").exists());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Windows come back in ascending load order, ties in activation order.
    #[test]
    fn load_order_is_stable(orders in prop::collection::vec(prop::option::of(-3i32..4), 1..8)) {
        let fx = Fixture::new();
        let log = EventLog::default();
        let mut orchestrator = fx.recording(&log, Teardown::Immediate);

        for (i, order) in orders.iter().enumerate() {
            let name = format!("s{}.ini", i);
            fx.skin(&name, "[SkinHost]\n");
            if let Some(order) = order {
                orchestrator.set_load_order(Path::new(&name), *order);
            }
            orchestrator.activate_skin(Path::new(&name)).unwrap();
        }

        let mut expected: Vec<(i32, usize)> = orders
            .iter()
            .enumerate()
            .map(|(i, order)| (order.unwrap_or(0), i))
            .collect();
        expected.sort();
        let expected: Vec<String> = expected.into_iter().map(|(_, i)| format!("s{}", i)).collect();

        prop_assert_eq!(ordered_names(&orchestrator, None), expected);
    }
}
