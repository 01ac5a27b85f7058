//! Built-in bangs understood by the host itself

use std::path::PathBuf;

use super::{Action, CommandDispatcher, SkinTarget};
use crate::skin::SkinId;

/// Dispatcher for the host-level bangs.
///
/// Bang names are case-insensitive. Skin-addressing bangs without a path
/// argument act on the scoped skin.
#[derive(Debug, Default)]
pub struct BuiltinCommands;

impl BuiltinCommands {
    pub fn new() -> Self {
        Self
    }
}

impl CommandDispatcher for BuiltinCommands {
    fn execute_bang(
        &mut self,
        bang: &str,
        args: &[String],
        scope: Option<SkinId>,
        actions: &mut Vec<Action>,
    ) -> bool {
        let name = bang.trim_start_matches('!').to_ascii_lowercase();
        let path = args.first().map(PathBuf::from);
        let target = path
            .clone()
            .map(SkinTarget::Path)
            .or(scope.map(SkinTarget::Id));

        match name.as_str() {
            "activateconfig" => match path {
                Some(path) => actions.push(Action::Activate(path)),
                None => return missing_argument(bang),
            },
            "deactivateconfig" => match target {
                Some(target) => actions.push(Action::Deactivate(target)),
                None => return missing_argument(bang),
            },
            "toggleconfig" => match path {
                Some(path) => actions.push(Action::Toggle(path)),
                None => return missing_argument(bang),
            },
            "refresh" => actions.push(Action::Refresh(target)),
            "refreshapp" => actions.push(Action::RefreshApp),
            "loadlayout" => actions.push(Action::LoadLayout(path)),
            "resetstats" => actions.push(Action::ResetStats),
            "writestats" => actions.push(Action::WriteStats),
            "log" => log_message(args, scope),
            _ => {
                tracing::warn!(bang, "Unknown bang");
                return false;
            }
        }
        true
    }
}

fn missing_argument(bang: &str) -> bool {
    tracing::warn!(bang, "Missing skin argument");
    false
}

fn log_message(args: &[String], scope: Option<SkinId>) {
    let message = args.first().map(String::as_str).unwrap_or_default();
    let level = args.get(1).map(|l| l.to_ascii_lowercase());
    let skin = scope.map(|id| id.to_string()).unwrap_or_default();

    match level.as_deref() {
        Some("error") => tracing::error!(skin = %skin, "{}", message),
        Some("warning") => tracing::warn!(skin = %skin, "{}", message),
        Some("debug") => tracing::debug!(skin = %skin, "{}", message),
        _ => tracing::info!(skin = %skin, "{}", message),
    }
}
