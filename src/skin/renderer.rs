//! Rendering pipeline seam
//!
//! The orchestrator drives a [`SkinRenderer`] through its lifecycle. A
//! renderer reaches the rest of the host only through [`SkinContext`], which
//! queues actions instead of running them.

use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use super::window::{SkinId, SkinKey};
use crate::boundary::SectionObject;
use crate::command::Action;
use crate::core::error::SkinError;
use crate::layout::{LayoutFile, GLOBAL_SECTION};

/// Sections of a skin file that never become boundary sections
const RESERVED_SKIN_SECTIONS: [&str; 3] = [GLOBAL_SECTION, "Metadata", "Variables"];

/// How a window leaves after deactivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// Remove as soon as the current operation finishes
    Immediate,
    /// Keep running detached (e.g. a fade-out), then close
    Deferred(Duration),
}

/// What a renderer reports after initialization
#[derive(Debug, Clone, Default)]
pub struct SkinManifest {
    /// `|`-separated group list
    pub groups: String,
    pub sections: Vec<SectionObject>,
}

/// A renderer's view of the host during one callback
pub struct SkinContext<'a> {
    id: SkinId,
    key: &'a SkinKey,
    actions: &'a mut VecDeque<Action>,
}

impl<'a> SkinContext<'a> {
    pub(crate) fn new(id: SkinId, key: &'a SkinKey, actions: &'a mut VecDeque<Action>) -> Self {
        Self { id, key, actions }
    }

    pub fn id(&self) -> SkinId {
        self.id
    }

    pub fn key(&self) -> &SkinKey {
        self.key
    }

    pub fn path(&self) -> &Path {
        self.key.path()
    }

    /// Queue a command scoped to this skin
    pub fn execute(&mut self, command: impl Into<String>) {
        self.actions.push_back(Action::Execute {
            command: command.into(),
            scope: Some(self.id),
        });
    }

    /// Queue an arbitrary action
    pub fn post(&mut self, action: Action) {
        self.actions.push_back(action);
    }
}

/// Rendering pipeline for one skin window
pub trait SkinRenderer: Send {
    fn initialize(&mut self, cx: &mut SkinContext<'_>) -> Result<SkinManifest, SkinError>;

    fn refresh(&mut self, cx: &mut SkinContext<'_>);

    /// Start leaving; closing actions run here
    fn deactivate(&mut self, cx: &mut SkinContext<'_>) -> Teardown;

    /// Release everything. Called exactly once per initialized window.
    fn close(&mut self, cx: &mut SkinContext<'_>);
}

/// Creates a renderer per activation
pub trait SkinFactory: Send {
    fn create(&self, key: &SkinKey) -> Box<dyn SkinRenderer>;
}

impl<F> SkinFactory for F
where
    F: Fn(&SkinKey) -> Box<dyn SkinRenderer> + Send,
{
    fn create(&self, key: &SkinKey) -> Box<dyn SkinRenderer> {
        self(key)
    }
}

/// Factory for [`HeadlessRenderer`]
#[derive(Debug, Default)]
pub struct HeadlessFactory;

impl SkinFactory for HeadlessFactory {
    fn create(&self, _key: &SkinKey) -> Box<dyn SkinRenderer> {
        Box::<HeadlessRenderer>::default()
    }
}

/// Renderer that draws nothing but honours the skin file's lifecycle
/// settings: `Group`, `OnRefreshAction`, `OnCloseAction` and
/// `FadeDuration` in the `[SkinHost]` section.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    on_refresh: String,
    on_close: String,
    fade: Duration,
}

impl HeadlessRenderer {
    fn load(&mut self, path: &Path) -> Result<LayoutFile, SkinError> {
        let file = LayoutFile::load(path).map_err(|e| SkinError::InitializeFailed {
            key: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.on_refresh = file
            .read_string(GLOBAL_SECTION, "OnRefreshAction")
            .unwrap_or_default()
            .to_string();
        self.on_close = file
            .read_string(GLOBAL_SECTION, "OnCloseAction")
            .unwrap_or_default()
            .to_string();
        let fade = file.read_int(GLOBAL_SECTION, "FadeDuration", 0);
        self.fade = Duration::from_millis(u64::try_from(fade).unwrap_or(0));

        Ok(file)
    }
}

impl SkinRenderer for HeadlessRenderer {
    fn initialize(&mut self, cx: &mut SkinContext<'_>) -> Result<SkinManifest, SkinError> {
        let file = self.load(cx.path())?;

        let groups = file
            .read_string(GLOBAL_SECTION, "Group")
            .unwrap_or_default()
            .to_string();
        let sections = file
            .section_names()
            .filter(|name| {
                !RESERVED_SKIN_SECTIONS
                    .iter()
                    .any(|reserved| reserved.eq_ignore_ascii_case(name))
            })
            .filter_map(|name| file.section(name))
            .map(|section| SectionObject::from_section(section, cx.id()))
            .collect();

        if !self.on_refresh.is_empty() {
            cx.execute(self.on_refresh.clone());
        }

        Ok(SkinManifest { groups, sections })
    }

    fn refresh(&mut self, cx: &mut SkinContext<'_>) {
        if let Err(e) = self.load(cx.path()) {
            tracing::warn!(skin = %cx.key(), "Refresh kept previous settings: {}", e);
        }
        if !self.on_refresh.is_empty() {
            cx.execute(self.on_refresh.clone());
        }
    }

    fn deactivate(&mut self, cx: &mut SkinContext<'_>) -> Teardown {
        if !self.on_close.is_empty() {
            cx.execute(self.on_close.clone());
        }
        if self.fade.is_zero() {
            Teardown::Immediate
        } else {
            Teardown::Deferred(self.fade)
        }
    }

    fn close(&mut self, cx: &mut SkinContext<'_>) {
        tracing::trace!(skin = %cx.key(), "Renderer closed");
    }
}
