//! Native objects reachable through handles

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::layout::Section;
use crate::skin::{Group, SkinId};

/// Snapshot of a live skin, shared with the boundary
#[derive(Debug)]
pub struct SkinInfo {
    pub id: SkinId,
    /// Absolute path as activated
    pub path: PathBuf,
    /// Normalized identity key
    pub key: String,
    pub groups: Group,
}

pub type SkinRef = Arc<SkinInfo>;

/// Skin section exposed for update bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionObject {
    name: String,
    original_name: String,
    skin: SkinId,
    groups: Group,
    dynamic_variables: bool,
    update_counter: i32,
    update_divider: i32,
    on_update_action: String,
}

pub type SharedSection = Arc<Mutex<SectionObject>>;

impl SectionObject {
    pub fn new(name: &str, skin: SkinId) -> Self {
        Self {
            name: name.trim().to_string(),
            original_name: name.to_string(),
            skin,
            groups: Group::default(),
            dynamic_variables: false,
            update_counter: 0,
            update_divider: 1,
            on_update_action: String::new(),
        }
    }

    /// Build from a skin file section, reading `Group`, `DynamicVariables`,
    /// `UpdateDivider` and `OnUpdateAction`
    pub fn from_section(section: &Section, skin: SkinId) -> Self {
        let mut object = Self::new(section.name(), skin);
        object.groups = Group::new(section.get("Group").unwrap_or_default());
        object.dynamic_variables = section
            .get("DynamicVariables")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .is_some_and(|v| v != 0);
        object.update_divider = section
            .get("UpdateDivider")
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or(1);
        object.on_update_action = section.get("OnUpdateAction").unwrap_or_default().to_string();
        object
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Owning skin
    pub fn skin(&self) -> SkinId {
        self.skin
    }

    pub fn groups(&self) -> &Group {
        &self.groups
    }

    pub fn has_dynamic_variables(&self) -> bool {
        self.dynamic_variables
    }

    pub fn set_dynamic_variables(&mut self, value: bool) {
        self.dynamic_variables = value;
    }

    /// Count one update cycle; returns whether the section is due
    pub fn tick(&mut self) -> bool {
        self.update_counter += 1;
        if self.update_divider <= 0 || self.update_counter < self.update_divider {
            return false;
        }
        self.update_counter = 0;
        true
    }

    pub fn reset_update_counter(&mut self) {
        self.update_counter = 0;
    }

    pub fn update_counter(&self) -> i32 {
        self.update_counter
    }

    pub fn update_divider(&self) -> i32 {
        self.update_divider
    }

    pub fn on_update_action(&self) -> &str {
        &self.on_update_action
    }
}

/// Meter kinds the boundary can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterKind {
    String,
}

/// Meter created through the boundary, bound to a skin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterObject {
    name: String,
    kind: MeterKind,
    skin: SkinId,
    groups: Group,
}

pub type SharedMeter = Arc<Mutex<MeterObject>>;

impl MeterObject {
    pub fn new(kind: MeterKind, name: &str, skin: SkinId) -> Self {
        Self {
            name: name.to_string(),
            kind,
            skin,
            groups: Group::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MeterKind {
        self.kind
    }

    pub fn skin(&self) -> SkinId {
        self.skin
    }

    pub fn groups(&self) -> &Group {
        &self.groups
    }
}

/// Everything a handle can stand for
#[derive(Debug, Clone)]
pub enum NativeObject {
    Skin(SkinRef),
    Section(SharedSection),
    Meter(SharedMeter),
}

impl NativeObject {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NativeObject::Skin(_) => "skin",
            NativeObject::Section(_) => "section",
            NativeObject::Meter(_) => "meter",
        }
    }

    /// Group membership of whichever object this is
    pub fn belongs_to_group(&self, group: &str) -> bool {
        match self {
            NativeObject::Skin(skin) => skin.groups.belongs_to(group),
            NativeObject::Section(section) => section.lock().groups().belongs_to(group),
            NativeObject::Meter(meter) => meter.lock().groups().belongs_to(group),
        }
    }

    /// Skin this object belongs to
    pub fn skin_id(&self) -> SkinId {
        match self {
            NativeObject::Skin(skin) => skin.id,
            NativeObject::Section(section) => section.lock().skin(),
            NativeObject::Meter(meter) => meter.lock().skin(),
        }
    }

    /// Whether this is the skin handle for `key`
    pub fn is_skin_key(&self, key: &str) -> bool {
        matches!(self, NativeObject::Skin(skin) if skin.key == key)
    }

    /// Whether this is a section of `skin` named `name` (case-insensitive)
    pub fn is_section_of(&self, skin: SkinId, name: &str) -> bool {
        match self {
            NativeObject::Section(section) => {
                let section = section.lock();
                section.skin() == skin && section.name().eq_ignore_ascii_case(name)
            }
            _ => false,
        }
    }
}

impl SkinInfo {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
