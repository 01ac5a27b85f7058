//! Skin Module
//!
//! Skin windows, their load order, the rendering seam and the orchestrator
//! that owns them.

mod group;
mod load_order;
mod orchestrator;
mod renderer;
mod window;

#[cfg(test)]
mod tests;

pub use group::Group;
pub use load_order::LoadOrderTable;
pub use orchestrator::{Activation, SkinOrchestrator};
pub use renderer::{
    HeadlessFactory, HeadlessRenderer, SkinContext, SkinFactory, SkinManifest, SkinRenderer,
    Teardown,
};
pub use window::{SkinId, SkinKey, SkinState, SkinWindow};
