//! Skin windows and their identity

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::renderer::{SkinContext, SkinManifest, SkinRenderer, Teardown};
use super::Group;
use crate::boundary::{NativeObject, SkinInfo};
use crate::command::Action;
use crate::core::error::SkinError;
use crate::handle::{Handle, HandleRegistry};

/// Stable identity of one window instance.
///
/// Actions and boundary objects refer to windows by id, never by reference;
/// the orchestrator stays the only owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkinId(u64);

impl SkinId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SkinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized skin identity: the absolute path used to open the skin and
/// the case-folded key used for lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkinKey {
    path: PathBuf,
    key: String,
}

impl SkinKey {
    pub fn new(path: PathBuf, key: String) -> Self {
        Self { path, key }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for SkinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Window lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinState {
    Activating,
    Active,
    Deactivating,
    Destroyed,
}

/// One active skin instance
pub struct SkinWindow {
    id: SkinId,
    key: SkinKey,
    /// Activation sequence, breaks load-order ties
    seq: u64,
    state: SkinState,
    groups: Group,
    renderer: Box<dyn SkinRenderer>,
    /// Boundary handle of the skin itself
    handle: Option<Handle>,
    /// Boundary handles of the skin's sections
    section_handles: Vec<Handle>,
}

impl SkinWindow {
    pub(crate) fn new(id: SkinId, key: SkinKey, seq: u64, renderer: Box<dyn SkinRenderer>) -> Self {
        Self {
            id,
            key,
            seq,
            state: SkinState::Activating,
            groups: Group::default(),
            renderer,
            handle: None,
            section_handles: Vec::new(),
        }
    }

    pub fn id(&self) -> SkinId {
        self.id
    }

    pub fn key(&self) -> &SkinKey {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn state(&self) -> SkinState {
        self.state
    }

    pub fn groups(&self) -> &Group {
        &self.groups
    }

    pub fn belongs_to_group(&self, group: &str) -> bool {
        self.groups.belongs_to(group)
    }

    /// Boundary handle of this skin, once initialized
    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub fn section_handles(&self) -> &[Handle] {
        &self.section_handles
    }

    pub(crate) fn initialize(
        &mut self,
        actions: &mut VecDeque<Action>,
    ) -> Result<SkinManifest, SkinError> {
        let mut cx = SkinContext::new(self.id, &self.key, actions);
        self.renderer.initialize(&mut cx)
    }

    /// Publish the skin and its sections through the handle registry
    pub(crate) fn register(&mut self, registry: &HandleRegistry<NativeObject>, manifest: SkinManifest) {
        self.groups = Group::new(&manifest.groups);

        let info = Arc::new(SkinInfo {
            id: self.id,
            path: self.key.path().to_path_buf(),
            key: self.key.key().to_string(),
            groups: self.groups.clone(),
        });
        self.handle = Some(registry.allocate(NativeObject::Skin(info)));

        self.section_handles = manifest
            .sections
            .into_iter()
            .map(|section| registry.allocate(NativeObject::Section(Arc::new(Mutex::new(section)))))
            .collect();

        self.state = SkinState::Active;
    }

    /// Refresh the renderer, then count one update cycle on every published
    /// section. Sections that come due queue their `OnUpdateAction`.
    pub(crate) fn refresh(&mut self, actions: &mut VecDeque<Action>, registry: &HandleRegistry<NativeObject>) {
        let mut cx = SkinContext::new(self.id, &self.key, actions);
        self.renderer.refresh(&mut cx);

        for &handle in &self.section_handles {
            let Ok(NativeObject::Section(section)) = registry.resolve(handle) else {
                continue;
            };
            let mut section = section.lock();
            if section.tick() && !section.on_update_action().is_empty() {
                actions.push_back(Action::Execute {
                    command: section.on_update_action().to_string(),
                    scope: Some(self.id),
                });
            }
        }
    }

    pub(crate) fn deactivate(&mut self, actions: &mut VecDeque<Action>) -> Teardown {
        self.state = SkinState::Deactivating;
        let mut cx = SkinContext::new(self.id, &self.key, actions);
        self.renderer.deactivate(&mut cx)
    }

    /// Final teardown. Handles still registered are released; sections the
    /// boundary already destroyed are skipped.
    pub(crate) fn close(&mut self, actions: &mut VecDeque<Action>, registry: &HandleRegistry<NativeObject>) {
        let mut cx = SkinContext::new(self.id, &self.key, actions);
        self.renderer.close(&mut cx);

        for handle in self.handle.take().into_iter().chain(self.section_handles.drain(..)) {
            if registry.contains(handle) {
                registry.release(handle);
            }
        }
        self.state = SkinState::Destroyed;
    }
}

impl fmt::Debug for SkinWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkinWindow")
            .field("id", &self.id)
            .field("key", &self.key.key)
            .field("seq", &self.seq)
            .field("state", &self.state)
            .finish()
    }
}
