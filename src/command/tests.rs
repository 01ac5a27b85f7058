//! Tests for command parsing and the built-in bangs

use std::path::PathBuf;

use super::*;

fn dispatch(command: &str, scope: Option<SkinId>) -> (Vec<Action>, usize) {
    let mut dispatcher = BuiltinCommands::new();
    let mut actions = Vec::new();
    let mut handled = 0;
    for bang in parse_command(command) {
        if dispatcher.execute_bang(&bang.name, &bang.args, scope, &mut actions) {
            handled += 1;
        }
    }
    (actions, handled)
}

#[test]
fn test_single_bang_with_args() {
    let bangs = parse_command("!ActivateConfig Clock\\Clock.ini");
    assert_eq!(
        bangs,
        vec![Bang {
            name: "!ActivateConfig".to_string(),
            args: vec!["Clock\\Clock.ini".to_string()],
        }]
    );
}

#[test]
fn test_quoted_arguments_are_grouped() {
    let bangs = parse_command("!Log \"hello there\"   Warning");
    assert_eq!(bangs[0].args, vec!["hello there", "Warning"]);
}

#[test]
fn test_multi_command_splits_top_level_brackets() {
    let bangs = parse_command("[!ToggleConfig a.ini][!Log \"x [y] z\"] [!Refresh]");
    let names: Vec<_> = bangs.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["!ToggleConfig", "!Log", "!Refresh"]);
    assert_eq!(bangs[1].args, vec!["x [y] z"]);
}

#[test]
fn test_non_bang_text_is_skipped() {
    assert!(parse_command("notepad.exe").is_empty());
    assert!(parse_command("").is_empty());
    assert!(parse_command("[][ ]").is_empty());
}

#[test]
fn test_builtin_bangs_emit_actions() {
    let (actions, handled) = dispatch(
        "[!ActivateConfig a.ini][!toggleconfig b.ini][!LoadLayout work][!ResetStats][!WriteStats][!RefreshApp]",
        None,
    );
    assert_eq!(handled, 6);
    assert_eq!(
        actions,
        vec![
            Action::Activate(PathBuf::from("a.ini")),
            Action::Toggle(PathBuf::from("b.ini")),
            Action::LoadLayout(Some(PathBuf::from("work"))),
            Action::ResetStats,
            Action::WriteStats,
            Action::RefreshApp,
        ]
    );
}

#[test]
fn test_scope_fills_missing_skin_argument() {
    let scope = Some(SkinId::from_raw(4));
    let (actions, _) = dispatch("[!DeactivateConfig][!Refresh]", scope);
    assert_eq!(
        actions,
        vec![
            Action::Deactivate(SkinTarget::Id(SkinId::from_raw(4))),
            Action::Refresh(Some(SkinTarget::Id(SkinId::from_raw(4)))),
        ]
    );

    let (actions, _) = dispatch("!Refresh", None);
    assert_eq!(actions, vec![Action::Refresh(None)]);
}

#[test]
fn test_unknown_and_incomplete_bangs_are_rejected() {
    let (actions, handled) = dispatch("[!Frobnicate][!ActivateConfig][!DeactivateConfig]", None);
    assert_eq!(handled, 0);
    assert!(actions.is_empty());
}

#[test]
fn test_log_emits_no_action() {
    let (actions, handled) = dispatch("!Log \"done\" Error", None);
    assert_eq!(handled, 1);
    assert!(actions.is_empty());
}
