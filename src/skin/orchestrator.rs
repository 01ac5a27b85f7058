//! Skin lifecycle orchestration
//!
//! The orchestrator is the single owner of every skin window. All of its
//! methods run on the host's owning context; side effects raised by
//! renderers or commands are queued as [`Action`]s and applied in FIFO order
//! after the operation that raised them, never interleaved with it.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::load_order::LoadOrderTable;
use super::renderer::{HeadlessFactory, SkinFactory, Teardown};
use super::window::{SkinId, SkinKey, SkinState, SkinWindow};
use crate::boundary::NativeObject;
use crate::command::{parse_command, Action, BuiltinCommands, CommandDispatcher, SkinTarget};
use crate::core::config::HostConfig;
use crate::core::error::{log_failure, LayoutError, SkinError};
use crate::core::utils::normalize_skin_path;
use crate::handle::HandleRegistry;
use crate::layout::{LayoutFile, GLOBAL_SECTION, TRAY_SECTION};
use crate::os::DisplayEnvironment;
use crate::stats::{CounterProvider, StatsPersistence, TrafficCounters};
use crate::workarea::DesktopWorkAreaCoordinator;

/// File name of a layout inside a layout directory
const LAYOUT_FILE_NAME: &str = "SkinHost.ini";

/// Result of a successful activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A new window was created
    Activated(SkinId),
    /// The skin was already running; nothing changed
    AlreadyActive(SkinId),
}

impl Activation {
    pub fn id(&self) -> SkinId {
        match self {
            Activation::Activated(id) | Activation::AlreadyActive(id) => *id,
        }
    }
}

/// Owner of the skin collection
pub struct SkinOrchestrator {
    /// Base for relative skin paths
    skins_path: PathBuf,
    /// Base for relative layout names
    layouts_path: PathBuf,
    /// Layout used when none is named
    layout_path: PathBuf,
    /// Last successfully read layout
    layout: LayoutFile,
    /// Managed windows by normalized key
    windows: BTreeMap<String, SkinWindow>,
    /// Windows detached from the keyed collection, awaiting their own close
    unmanaged: Vec<SkinWindow>,
    load_order: LoadOrderTable,
    /// Deferred lifecycle requests
    pending: VecDeque<Action>,
    processing: bool,
    /// Keys torn down during the active bulk clear
    clearing: Option<HashSet<String>>,
    /// Deferred closes waiting for the host to schedule them
    scheduled_closes: Vec<(SkinId, Duration)>,
    next_id: u64,
    next_seq: u64,
    work_area: DesktopWorkAreaCoordinator,
    stats: StatsPersistence,
    registry: Arc<HandleRegistry<NativeObject>>,
    dispatcher: Box<dyn CommandDispatcher>,
    factory: Box<dyn SkinFactory>,
}

impl SkinOrchestrator {
    /// Create an orchestrator with the headless renderer, the built-in
    /// commands and traffic counters
    pub fn new(config: &HostConfig, environment: Box<dyn DisplayEnvironment>) -> Self {
        Self {
            skins_path: config.skins_path(),
            layouts_path: config.layouts_path(),
            layout_path: config.layout_path(),
            layout: LayoutFile::new(),
            windows: BTreeMap::new(),
            unmanaged: Vec::new(),
            load_order: LoadOrderTable::new(),
            pending: VecDeque::new(),
            processing: false,
            clearing: None,
            scheduled_closes: Vec::new(),
            next_id: 1,
            next_seq: 0,
            work_area: DesktopWorkAreaCoordinator::new(environment),
            stats: StatsPersistence::new(
                config.stats_path(),
                config.stats_interval(),
                Box::new(TrafficCounters::new()),
            ),
            registry: Arc::new(HandleRegistry::new()),
            dispatcher: Box::new(BuiltinCommands::new()),
            factory: Box::new(HeadlessFactory),
        }
    }

    /// Share an existing handle registry (e.g. with a boundary)
    pub fn with_registry(mut self, registry: Arc<HandleRegistry<NativeObject>>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Box<dyn CommandDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_factory(mut self, factory: Box<dyn SkinFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_counters(mut self, provider: Box<dyn CounterProvider>) -> Self {
        self.stats = StatsPersistence::new(
            self.stats.path().to_path_buf(),
            self.stats.interval(),
            provider,
        );
        self
    }

    pub fn registry(&self) -> &Arc<HandleRegistry<NativeObject>> {
        &self.registry
    }

    pub fn stats(&self) -> &StatsPersistence {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsPersistence {
        &mut self.stats
    }

    pub fn work_area(&self) -> &DesktopWorkAreaCoordinator {
        &self.work_area
    }

    pub fn layout_path(&self) -> &Path {
        &self.layout_path
    }

    pub fn skins_path(&self) -> &Path {
        &self.skins_path
    }

    /// Normalized identity for a skin path
    pub fn normalize(&self, path: &Path) -> SkinKey {
        let (absolute, key) = normalize_skin_path(path, &self.skins_path);
        SkinKey::new(absolute, key)
    }

    /// Managed window for a path
    pub fn window_by_path(&self, path: &Path) -> Option<&SkinWindow> {
        self.windows.get(self.normalize(path).key())
    }

    /// Managed or unmanaged window by id
    pub fn window(&self, id: SkinId) -> Option<&SkinWindow> {
        self.windows
            .values()
            .chain(self.unmanaged.iter())
            .find(|w| w.id() == id)
    }

    pub fn has_meter_window(&self, path: &Path) -> bool {
        self.window_by_path(path).is_some()
    }

    /// Number of managed windows
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn unmanaged_count(&self) -> usize {
        self.unmanaged.len()
    }

    /// Deferred closes the host must turn into `SkinClosed` tasks
    pub fn take_scheduled_closes(&mut self) -> Vec<(SkinId, Duration)> {
        std::mem::take(&mut self.scheduled_closes)
    }

    // ---- lifecycle -------------------------------------------------------

    /// Stamp the statistics label, read stored counters and load the
    /// configured layout
    pub fn initialize(&mut self) {
        self.stats.reset_stats();
        if let Err(e) = self.stats.read_stats() {
            tracing::warn!("Statistics unavailable, continuing without: {}", e);
        }

        if let Err(e) = self.load_layout_now(None) {
            tracing::warn!("Starting without a layout: {}", e);
        }
        self.process_pending();

        tracing::info!(
            skins = self.windows.len(),
            layout = %self.layout_path.display(),
            "Host initialized"
        );
    }

    /// Tear everything down, flush statistics and restore the work area
    pub fn finalize(&mut self) {
        self.clear_unmanaged();
        self.clear_managed();
        self.clear_unmanaged();

        if !self.pending.is_empty() {
            tracing::debug!(dropped = self.pending.len(), "Dropping actions queued during shutdown");
            self.pending.clear();
        }
        self.scheduled_closes.clear();

        self.stats.update();
        if let Err(e) = self.stats.write_stats(true) {
            tracing::warn!("Final statistics write failed: {}", e);
        }

        let restored = self.work_area.revert();
        tracing::info!(restored, "Host finalized");
    }

    /// Activate the skin at `path` (relative paths resolve against the skins
    /// directory)
    pub fn activate_skin(&mut self, path: &Path) -> Result<Activation, SkinError> {
        let result = self.activate_now(path);
        self.process_pending();
        result
    }

    /// Ask a window to deactivate. Removal happens once the window requests
    /// it, so the entry may outlive this call.
    pub fn deactivate_skin(&mut self, id: SkinId) -> Result<(), SkinError> {
        let result = self.deactivate_now(id);
        self.process_pending();
        result
    }

    /// Deactivate if running, activate otherwise
    pub fn toggle_skin(&mut self, path: &Path) -> Result<(), SkinError> {
        let result = self.toggle_now(path);
        self.process_pending();
        result
    }

    /// Erase a window from the keyed collection by identity and destroy it.
    /// Detached windows are looked up in the unmanaged list as well.
    pub fn remove_meter_window(&mut self, id: SkinId) -> bool {
        let removed = self.remove_now(id);
        self.process_pending();
        removed
    }

    /// Track a detached window; a window already tracked is left alone
    pub fn add_unmanaged_meter_window(&mut self, window: SkinWindow) {
        if self.unmanaged.iter().any(|w| w.id() == window.id()) {
            tracing::debug!(id = %window.id(), "Unmanaged window already tracked");
            return;
        }
        self.unmanaged.push(window);
    }

    /// Stop tracking a detached window, handing it back
    pub fn remove_unmanaged_meter_window(&mut self, id: SkinId) -> Option<SkinWindow> {
        let pos = self.unmanaged.iter().position(|w| w.id() == id)?;
        Some(self.unmanaged.remove(pos))
    }

    /// A deferred teardown finished
    pub fn skin_closed(&mut self, id: SkinId) {
        match self.remove_unmanaged_meter_window(id) {
            Some(window) => self.destroy(window),
            None => tracing::debug!(id = %id, "Closed skin is no longer tracked"),
        }
        self.process_pending();
    }

    /// Reload the layout, re-read the work-area settings and apply them if
    /// any were ever loaded, then refresh every active window in load order
    pub fn refresh_all(&mut self) {
        self.refresh_all_now();
        self.process_pending();
    }

    /// Load a layout, or reload the current one. Fails without touching any
    /// state when the file cannot be read.
    pub fn load_layout(&mut self, path: Option<&Path>) -> Result<(), LayoutError> {
        let result = self.load_layout_now(path);
        self.process_pending();
        result
    }

    pub fn set_load_order(&mut self, path: &Path, order: i32) {
        let key = self.normalize(path);
        self.load_order.set(key.key(), order);
    }

    /// Configured load order; `None` when never set
    pub fn get_load_order(&self, path: &Path) -> Option<i32> {
        self.load_order.get(self.normalize(path).key())
    }

    /// Active windows sorted by load order (unset sorts as 0), ties in
    /// activation order. `group` restricts to members of that group.
    pub fn meter_windows_by_load_order(&self, group: Option<&str>) -> Vec<&SkinWindow> {
        let mut windows: Vec<&SkinWindow> = self
            .windows
            .values()
            .filter(|w| w.state() == SkinState::Active)
            .filter(|w| group.map_or(true, |g| w.belongs_to_group(g)))
            .collect();
        windows.sort_by_key(|w| (self.load_order.get(w.key().key()).unwrap_or(0), w.seq()));
        windows
    }

    /// Run one bang. Returns whether the dispatcher understood it.
    pub fn execute_bang(&mut self, bang: &str, args: &[String], scope: Option<SkinId>) -> bool {
        let mut actions = Vec::new();
        let handled = self.dispatcher.execute_bang(bang, args, scope, &mut actions);
        self.pending.extend(actions);
        self.process_pending();
        handled
    }

    /// Run a command string. Returns how many bangs were understood.
    pub fn execute_command(&mut self, command: &str, scope: Option<SkinId>) -> usize {
        let handled = self.expand_command(command, scope);
        self.process_pending();
        handled
    }

    /// Sample counters and write them unless throttled
    pub fn flush_stats(&mut self) {
        self.stats.update();
        match self.stats.write_stats(false) {
            Ok(written) => tracing::trace!(written, "Statistics flush"),
            Err(e) => {
                log_failure("Statistics flush failed", &e);
            }
        }
    }

    // ---- internals -------------------------------------------------------

    fn activate_now(&mut self, path: &Path) -> Result<Activation, SkinError> {
        let key = self.normalize(path);

        if self
            .clearing
            .as_ref()
            .is_some_and(|torn| torn.contains(key.key()))
        {
            tracing::warn!(skin = %key, "Reactivation during teardown suppressed");
            return Err(SkinError::TornDown {
                key: key.key().to_string(),
            });
        }

        if let Some(existing) = self.windows.get(key.key()) {
            if existing.state() != SkinState::Deactivating {
                tracing::info!(skin = %key, id = %existing.id(), "Skin already active");
                return Ok(Activation::AlreadyActive(existing.id()));
            }
            if let Some(stale) = self.windows.remove(key.key()) {
                tracing::debug!(skin = %key, id = %stale.id(), "Detaching deactivating window");
                self.add_unmanaged_meter_window(stale);
            }
        }

        if !key.path().is_file() {
            tracing::warn!(skin = %key, path = %key.path().display(), "Skin file not found");
            return Err(SkinError::NotFound {
                path: key.path().to_path_buf(),
            });
        }

        let id = SkinId::from_raw(self.next_id);
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        let window = SkinWindow::new(id, key.clone(), seq, self.factory.create(&key));
        let window = match self.windows.entry(key.key().to_string()) {
            Entry::Vacant(entry) => entry.insert(window),
            Entry::Occupied(mut entry) => {
                entry.insert(window);
                entry.into_mut()
            }
        };

        match window.initialize(&mut self.pending) {
            Ok(manifest) => {
                window.register(&self.registry, manifest);
                tracing::info!(skin = %key, id = %id, "Skin activated");
                Ok(Activation::Activated(id))
            }
            Err(e) => {
                if let Some(mut failed) = self.windows.remove(key.key()) {
                    failed.close(&mut self.pending, &self.registry);
                }
                tracing::warn!(skin = %key, "Skin initialization failed: {}", e);
                Err(e)
            }
        }
    }

    fn deactivate_now(&mut self, id: SkinId) -> Result<(), SkinError> {
        let Some(key) = self.key_of(id) else {
            return Err(SkinError::UnknownWindow(id.as_raw()));
        };
        let Some(window) = self.windows.get_mut(&key) else {
            return Err(SkinError::UnknownWindow(id.as_raw()));
        };

        if window.state() == SkinState::Deactivating {
            tracing::debug!(id = %id, "Skin already deactivating");
            return Ok(());
        }

        match window.deactivate(&mut self.pending) {
            Teardown::Immediate => self.pending.push_back(Action::Remove(id)),
            Teardown::Deferred(delay) => {
                if let Some(window) = self.windows.remove(&key) {
                    self.add_unmanaged_meter_window(window);
                }
                self.scheduled_closes.push((id, delay));
            }
        }

        tracing::info!(skin = %key, id = %id, "Skin deactivating");
        Ok(())
    }

    fn toggle_now(&mut self, path: &Path) -> Result<(), SkinError> {
        let key = self.normalize(path);
        let running = self
            .windows
            .get(key.key())
            .filter(|w| w.state() != SkinState::Deactivating)
            .map(SkinWindow::id);

        match running {
            Some(id) => self.deactivate_now(id),
            None => self.activate_now(path).map(|_| ()),
        }
    }

    fn remove_now(&mut self, id: SkinId) -> bool {
        let window = match self.key_of(id) {
            Some(key) => self.windows.remove(&key),
            None => self.remove_unmanaged_meter_window(id),
        };
        match window {
            Some(window) => {
                self.destroy(window);
                true
            }
            None => {
                tracing::debug!(id = %id, "Remove request for unknown window");
                false
            }
        }
    }

    fn refresh_all_now(&mut self) {
        match LayoutFile::load(&self.layout_path) {
            Ok(layout) => {
                self.layout = layout;
                self.sync_load_orders();
                self.work_area.load_from_config(self.layout.section(GLOBAL_SECTION));
            }
            Err(e) => tracing::warn!("Keeping previous layout: {}", e),
        }

        if self.work_area.is_changed() {
            self.apply_work_area();
        }

        let order: Vec<SkinId> = self
            .meter_windows_by_load_order(None)
            .into_iter()
            .map(SkinWindow::id)
            .collect();
        tracing::debug!(count = order.len(), "Refreshing all skins");

        for id in order {
            self.refresh_window(id);
        }
    }

    fn refresh_window(&mut self, id: SkinId) {
        let Some(key) = self.key_of(id) else {
            tracing::debug!(id = %id, "Refresh for unknown window");
            return;
        };
        if let Some(window) = self.windows.get_mut(&key) {
            window.refresh(&mut self.pending, &self.registry);
        }
    }

    fn load_layout_now(&mut self, path: Option<&Path>) -> Result<(), LayoutError> {
        let path = match path {
            Some(path) => self.resolve_layout_path(path),
            None => self.layout_path.clone(),
        };
        let layout = LayoutFile::load(&path)?;
        tracing::info!(path = %path.display(), "Loading layout");

        self.clear_unmanaged();
        self.clear_managed();
        self.clear_unmanaged();

        self.work_area.reset();
        self.load_order.clear();
        self.layout = layout;
        self.layout_path = path;

        self.work_area.load_from_config(self.layout.section(GLOBAL_SECTION));
        if self.work_area.is_changed() {
            self.apply_work_area();
        }

        let skins: Vec<(String, Option<i32>)> = self
            .layout
            .section_names()
            .filter(|name| !is_reserved_section(name))
            .filter(|name| self.layout.read_int(name, "Active", 0) > 0)
            .map(|name| (name.to_string(), self.layout.read_int_opt(name, "LoadOrder")))
            .collect();

        for (name, order) in skins {
            let path = Path::new(&name);
            if let Some(order) = order {
                self.set_load_order(path, order);
            }
            if let Err(e) = self.activate_now(path) {
                log_failure(&format!("Layout skin {} not activated", name), &e);
            }
        }
        Ok(())
    }

    fn resolve_layout_path(&self, path: &Path) -> PathBuf {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.layouts_path.join(path)
        };
        if path.is_dir() {
            path.join(LAYOUT_FILE_NAME)
        } else {
            path
        }
    }

    fn sync_load_orders(&mut self) {
        let orders: Vec<(SkinKey, i32)> = self
            .layout
            .section_names()
            .filter(|name| !is_reserved_section(name))
            .filter_map(|name| {
                let order = self.layout.read_int_opt(name, "LoadOrder")?;
                Some((self.normalize(Path::new(name)), order))
            })
            .collect();
        for (key, order) in orders {
            self.load_order.set(key.key(), order);
        }
    }

    fn apply_work_area(&mut self) {
        match self.work_area.apply() {
            Ok(report) if report.failed > 0 => {
                tracing::warn!(applied = report.applied, failed = report.failed, "Work area partially applied");
            }
            Ok(report) => tracing::debug!(applied = report.applied, "Work area applied"),
            Err(e) => {
                log_failure("Work area not applied", &e);
            }
        }
    }

    /// Drain managed windows. Each window is erased from the collection
    /// before it is destroyed; lifecycle side effects of a round are applied
    /// before the next round, and a key torn down in this cycle cannot come
    /// back until the cycle ends.
    fn clear_managed(&mut self) {
        let top_level = self.clearing.is_none();
        if top_level {
            self.clearing = Some(HashSet::new());
        }
        let outer = std::mem::take(&mut self.pending);
        let mut deferred = Vec::new();

        loop {
            let batch: Vec<String> = self.windows.keys().cloned().collect();
            if batch.is_empty() {
                break;
            }
            for key in batch {
                let Some(mut window) = self.windows.remove(&key) else {
                    continue;
                };
                if let Some(torn) = self.clearing.as_mut() {
                    torn.insert(key);
                }
                if window.state() != SkinState::Deactivating {
                    window.deactivate(&mut self.pending);
                }
                self.destroy(window);
            }
            self.drain_lifecycle(&mut deferred);
        }

        self.pending = outer;
        self.pending.extend(deferred);
        if top_level {
            self.clearing = None;
        }
    }

    fn clear_unmanaged(&mut self) {
        while !self.unmanaged.is_empty() {
            let window = self.unmanaged.remove(0);
            self.destroy(window);
        }
    }

    /// Apply queued lifecycle actions now; everything else waits in `deferred`
    fn drain_lifecycle(&mut self, deferred: &mut Vec<Action>) {
        while let Some(action) = self.pending.pop_front() {
            match action {
                Action::Activate(_) | Action::Deactivate(_) | Action::Toggle(_) | Action::Remove(_) => {
                    self.apply(action)
                }
                Action::Execute { command, scope } => {
                    self.expand_command(&command, scope);
                }
                other => deferred.push(other),
            }
        }
    }

    fn destroy(&mut self, mut window: SkinWindow) {
        window.close(&mut self.pending, &self.registry);
        tracing::info!(skin = %window.key(), id = %window.id(), "Skin destroyed");
    }

    fn process_pending(&mut self) {
        if self.processing || self.clearing.is_some() {
            return;
        }
        self.processing = true;
        while let Some(action) = self.pending.pop_front() {
            self.apply(action);
        }
        self.processing = false;
    }

    fn apply(&mut self, action: Action) {
        tracing::trace!(?action, "Applying action");
        match action {
            Action::Activate(path) => {
                if let Err(e) = self.activate_now(&path) {
                    log_failure("Activation failed", &e);
                }
            }
            Action::Deactivate(target) => match self.resolve_target(&target) {
                Some(id) => {
                    if let Err(e) = self.deactivate_now(id) {
                        log_failure("Deactivation failed", &e);
                    }
                }
                None => tracing::warn!(?target, "Deactivation target is not active"),
            },
            Action::Toggle(path) => {
                if let Err(e) = self.toggle_now(&path) {
                    log_failure("Toggle failed", &e);
                }
            }
            Action::Remove(id) => {
                self.remove_now(id);
            }
            Action::Refresh(None) => self.refresh_all_now(),
            Action::Refresh(Some(target)) => match self.resolve_target(&target) {
                Some(id) => self.refresh_window(id),
                None => tracing::warn!(?target, "Refresh target is not active"),
            },
            Action::RefreshApp => {
                if let Err(e) = self.load_layout_now(None) {
                    log_failure("Reload failed", &e);
                }
            }
            Action::LoadLayout(path) => {
                if let Err(e) = self.load_layout_now(path.as_deref()) {
                    log_failure("Layout not loaded", &e);
                }
            }
            Action::ResetStats => self.stats.reset_stats(),
            Action::WriteStats => {
                if let Err(e) = self.stats.write_stats(true) {
                    log_failure("Statistics write failed", &e);
                }
            }
            Action::Execute { command, scope } => {
                self.expand_command(&command, scope);
            }
        }
    }

    fn expand_command(&mut self, command: &str, scope: Option<SkinId>) -> usize {
        let mut handled = 0;
        for bang in parse_command(command) {
            let mut actions = Vec::new();
            if self
                .dispatcher
                .execute_bang(&bang.name, &bang.args, scope, &mut actions)
            {
                handled += 1;
            }
            self.pending.extend(actions);
        }
        handled
    }

    fn resolve_target(&self, target: &SkinTarget) -> Option<SkinId> {
        match target {
            SkinTarget::Id(id) => self.key_of(*id).map(|_| *id),
            SkinTarget::Path(path) => self.window_by_path(path).map(SkinWindow::id),
        }
    }

    fn key_of(&self, id: SkinId) -> Option<String> {
        self.windows
            .iter()
            .find(|(_, w)| w.id() == id)
            .map(|(key, _)| key.clone())
    }
}

fn is_reserved_section(name: &str) -> bool {
    name.eq_ignore_ascii_case(GLOBAL_SECTION) || name.eq_ignore_ascii_case(TRAY_SECTION)
}
