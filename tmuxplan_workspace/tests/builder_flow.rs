//! Builder tests against the in-memory control plane.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use tmuxplan_workspace::control::{ControlPlane, OptionScope};
use tmuxplan_workspace::document::{DocumentFormat, parse_workspace};
use tmuxplan_workspace::environment::MapEnvironment;
use tmuxplan_workspace::format::field;
use tmuxplan_workspace::memory::InMemoryControlPlane;
use tmuxplan_workspace::plugin::Plugin;
use tmuxplan_workspace::session::{LiveSession, find_session};
use tmuxplan_workspace::window::LiveWindow;
use tmuxplan_workspace::{
    BuildOptions, PaneConfig, WindowConfig, WorkspaceConfig, WorkspaceError, WorkspaceResult,
    build_workspace,
};

fn workspace(yaml: &str) -> WorkspaceConfig {
    let env = MapEnvironment::new().with_home("/home/dev");
    parse_workspace(yaml, DocumentFormat::Yaml, &env).unwrap()
}

fn build(client: &mut InMemoryControlPlane, config: &WorkspaceConfig) -> LiveSession {
    build_workspace(client, config, &BuildOptions::default()).unwrap()
}

fn active_window(client: &mut InMemoryControlPlane, session: &LiveSession) -> u32 {
    let windows = session.windows(client).unwrap();
    windows.iter().find(|window| window.active).map(|window| window.index).unwrap()
}

const TWO_WINDOWS: &str = "\
session_name: demo
windows:
  - window_name: A
    panes:
      - echo hello
      - echo world
  - window_name: B
    panes:
      - null
";

/// Two windows, three panes, and the first command submitted.
#[test]
fn builds_two_windows_three_panes() {
    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &workspace(TWO_WINDOWS));

    assert_eq!(session.name, "demo");
    assert_eq!(session.window_count, 2);

    let windows = session.windows(&mut client).unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].name, "A");
    assert_eq!(windows[1].name, "B");

    let panes_a = windows[0].panes(&mut client).unwrap();
    let panes_b = windows[1].panes(&mut client).unwrap();
    assert_eq!(panes_a.len() + panes_b.len(), 3);

    assert_eq!(client.submitted(&panes_a[0].id), ["echo hello"]);
    assert_eq!(client.submitted(&panes_a[1].id), ["echo world"]);
    assert!(client.submitted(&panes_b[0].id).is_empty());
}

/// The second of three windows is marked focused.
#[test]
fn focused_window_is_selected() {
    let config = workspace(
        "\
session_name: focus
windows:
  - window_name: one
  - window_name: two
    focus: true
  - window_name: three
",
    );
    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &config);
    assert_eq!(active_window(&mut client, &session), 1);

    // Focus is resolved once, after every window exists.
    let calls = client.calls();
    let select = calls.iter().position(|call| call.name == "select-window").unwrap();
    let last_create = calls.iter().rposition(|call| call.name == "new-window").unwrap();
    assert!(select > last_create);
}

/// Without any mark the first window ends up selected.
#[test]
fn first_window_is_default_focus() {
    let config =
        workspace("session_name: plain\nwindows:\n  - window_name: a\n  - window_name: b\n");
    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &config);
    assert_eq!(active_window(&mut client, &session), 0);
}

/// Several marks resolve to the first.
#[test]
fn first_focus_mark_wins() {
    let mut config = workspace(concat!(
        "session_name: many\n",
        "windows:\n  - window_name: a\n  - window_name: b\n  - window_name: c\n",
    ));
    config.windows[1].focus = true;
    config.windows[2].focus = true;
    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &config);
    assert_eq!(active_window(&mut client, &session), 1);
}

/// Pane focus follows the first marked pane.
#[test]
fn focused_pane_is_selected() {
    let config = workspace(
        "\
session_name: panes
windows:
  - window_name: w
    panes:
      - top
      - shell_command: htop
        focus: true
      - focus: true
",
    );
    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &config);
    let window = session.windows(&mut client).unwrap().remove(0);
    let panes = window.panes(&mut client).unwrap();
    let active: Vec<bool> = panes.iter().map(|pane| pane.active).collect();
    assert_eq!(active, [false, true, false]);
}

/// Creation and layout calls appear in the documented order.
#[test]
fn calls_follow_build_order() {
    let config = workspace(
        "\
session_name: order
global_options:
  mouse: true
options:
  base-index: 1
environment:
  APP_ENV: dev
windows:
  - window_name: main
    layout: tiled
    options:
      synchronize-panes: on
    panes: [a, b]
",
    );
    let mut client = InMemoryControlPlane::new();
    build(&mut client, &config);

    let names: Vec<&str> = client
        .calls()
        .iter()
        .map(|call| call.name)
        .filter(|name| !name.starts_with("list-"))
        .collect();
    assert_eq!(
        names,
        [
            "new-session",
            "set-option",
            "set-option",
            "set-environment",
            "set-option",
            "send-keys",
            "send-keys",
            "split-window",
            "send-keys",
            "send-keys",
            "select-layout",
            "select-window",
        ]
    );

    assert_eq!(client.options(&OptionScope::Global), [("mouse".to_string(), "on".to_string())]);
    let session_options = client.options(&OptionScope::Session("order".into()));
    assert_eq!(session_options, [("base-index".to_string(), "1".to_string())]);
    assert_eq!(client.session_environment("order"), [("APP_ENV".to_string(), "dev".to_string())]);
}

/// Layout is applied only after the last split.
#[test]
fn layout_after_all_splits() {
    let config = workspace(concat!(
        "session_name: l\nwindows:\n  - window_name: w\n",
        "    layout: even-horizontal\n    panes: [a, b, c]\n",
    ));
    let mut client = InMemoryControlPlane::new();
    build(&mut client, &config);

    let calls = client.calls();
    let layout = calls.iter().position(|call| call.name == "select-layout").unwrap();
    let last_split = calls.iter().rposition(|call| call.name == "split-window").unwrap();
    assert!(layout > last_split);
    assert_eq!(calls[layout].args, ["-t", "@0", "even-horizontal"]);
}

/// Split panes start in their trickled directory and stay in order.
#[test]
fn splits_carry_directories() {
    let config = workspace(
        "\
session_name: dirs
start_directory: /srv
windows:
  - window_name: w
    panes:
      - one
      - shell_command: two
        start_directory: /tmp
      - three
",
    );
    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &config);
    let window = session.windows(&mut client).unwrap().remove(0);
    let panes = window.panes(&mut client).unwrap();

    let paths: Vec<&str> = panes.iter().map(|pane| pane.current_path.as_str()).collect();
    assert_eq!(paths, ["/srv", "/tmp", "/srv"]);
    assert_eq!(client.submitted(&panes[2].id), ["three"]);
}

/// Window prelude comes before pane commands; `enter: false` leaves text typed.
#[test]
fn prelude_then_commands() {
    let config = workspace(
        "\
session_name: keys
shell_command_before: source .env
windows:
  - window_name: w
    panes:
      - shell_command: [cargo build, cargo run]
        enter: false
",
    );
    let mut client = InMemoryControlPlane::new();
    build(&mut client, &config);

    assert_eq!(client.submitted("%0"), ["source .env"]);
    assert_eq!(client.pending_input("%0"), Some("cargo buildcargo run"));
    let sends = client.calls_to("send-keys");
    assert!(sends.iter().all(|call| call.has_flag("-l") || call.args.last().unwrap() == "Enter"));
}

/// A failing call aborts the build and leaves what was created.
#[test]
fn failure_aborts_without_rollback() {
    let mut client = InMemoryControlPlane::new();
    client.fail_on("new-window");

    let config = workspace(TWO_WINDOWS);
    let err = build_workspace(&mut client, &config, &BuildOptions::default()).unwrap_err();
    match err {
        WorkspaceError::ControlPlane { command, stderr } => {
            assert_eq!(command, "new-window");
            assert_eq!(stderr, "injected failure");
        },
        other => panic!("unexpected error: {other}"),
    }

    let session = find_session(&mut client, "demo").unwrap().unwrap();
    assert_eq!(session.window_count, 1);
    assert!(client.calls_to("select-window").is_empty());
}

/// Layout failures are fatal too.
#[test]
fn layout_failure_is_fatal() {
    let mut client = InMemoryControlPlane::new();
    client.fail_on("select-layout");
    let config = workspace("session_name: l\nwindows:\n  - window_name: w\n    layout: tiled\n");
    let err = build_workspace(&mut client, &config, &BuildOptions::default()).unwrap_err();
    assert!(err.is_control_plane());
}

/// Focus failures are tolerated.
#[test]
fn focus_failure_is_tolerated() {
    let mut client = InMemoryControlPlane::new();
    client.fail_on("select-window");
    client.fail_on("select-pane");
    let mut config = workspace(TWO_WINDOWS);
    config.windows[0].panes[1].focus = true;
    build_workspace(&mut client, &config, &BuildOptions::default()).unwrap();
}

/// Building twice needs `kill_existing`.
#[test]
fn kill_existing_replaces_session() {
    let config = workspace(TWO_WINDOWS);
    let mut client = InMemoryControlPlane::new();
    build(&mut client, &config);

    let err = build_workspace(&mut client, &config, &BuildOptions::default()).unwrap_err();
    assert!(err.to_string().contains("duplicate session: demo"));

    let options = BuildOptions { kill_existing: true, ..BuildOptions::default() };
    let session = build_workspace(&mut client, &config, &options).unwrap();
    assert_eq!(client.list_sessions().unwrap().len(), 1);
    assert_eq!(session.window_count, 2);
}

/// A failed kill is only logged; the create reports the conflict.
#[test]
fn failed_kill_surfaces_as_create_error() {
    let config = workspace(TWO_WINDOWS);
    let mut client = InMemoryControlPlane::new();
    build(&mut client, &config);
    client.fail_on("kill-session");

    let options = BuildOptions { kill_existing: true, ..BuildOptions::default() };
    let err = build_workspace(&mut client, &config, &options).unwrap_err();
    assert!(err.to_string().starts_with("new-session failed"));
}

/// Records every hook invocation into a shared log.
struct Recorder {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn before_workspace_build(
        &self,
        client: &mut dyn ControlPlane,
        session: &LiveSession,
    ) -> WorkspaceResult<()> {
        // The session exists but no window has been configured yet.
        let windows = session.windows(client)?;
        self.log.borrow_mut().push(format!("{}:before:{}", self.name, windows.len()));
        Ok(())
    }

    fn on_window_create(
        &self,
        _client: &mut dyn ControlPlane,
        window: &LiveWindow,
    ) -> WorkspaceResult<()> {
        self.log.borrow_mut().push(format!("{}:create:{}", self.name, window.name));
        Ok(())
    }

    fn after_window_finished(
        &self,
        client: &mut dyn ControlPlane,
        window: &LiveWindow,
    ) -> WorkspaceResult<()> {
        let panes = window.panes(client)?.len();
        self.log.borrow_mut().push(format!("{}:finished:{}:{panes}", self.name, window.name));
        Ok(())
    }
}

/// Hooks run in plugin order at each lifecycle point.
#[test]
fn plugin_hooks_run_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let options = BuildOptions {
        plugins: vec![
            Box::new(Recorder { name: "first", log: Rc::clone(&log) }),
            Box::new(Recorder { name: "second", log: Rc::clone(&log) }),
        ],
        kill_existing: false,
    };

    build_workspace(&mut InMemoryControlPlane::new(), &workspace(TWO_WINDOWS), &options).unwrap();

    assert_eq!(
        *log.borrow(),
        [
            "first:before:1",
            "second:before:1",
            "first:create:A",
            "second:create:A",
            "first:finished:A:2",
            "second:finished:A:2",
            "first:create:B",
            "second:create:B",
            "first:finished:B:1",
            "second:finished:B:1",
        ]
    );
}

struct Veto;

impl Plugin for Veto {
    fn name(&self) -> &str {
        "veto"
    }

    fn on_window_create(
        &self,
        _client: &mut dyn ControlPlane,
        window: &LiveWindow,
    ) -> WorkspaceResult<()> {
        if window.name == "B" {
            let plugin = self.name().into();
            return Err(WorkspaceError::Plugin { plugin, message: "no B".into() });
        }
        Ok(())
    }
}

/// A hook error stops the build before anything else happens.
#[test]
fn plugin_error_aborts_build() {
    let mut client = InMemoryControlPlane::new();
    let options = BuildOptions { plugins: vec![Box::new(Veto)], kill_existing: false };
    let err = build_workspace(&mut client, &workspace(TWO_WINDOWS), &options).unwrap_err();
    assert_eq!(err.to_string(), "plugin veto: no B");

    // Window B was created, but none of its panes were configured.
    let session = find_session(&mut client, "demo").unwrap().unwrap();
    let windows = session.windows(&mut client).unwrap();
    let b = windows[1].panes(&mut client).unwrap();
    assert!(client.submitted(&b[0].id).is_empty());
}

/// Programmatic configs build without going through a document.
#[test]
fn typed_config_builds() {
    let mut window = WindowConfig::new("editor");
    window.panes = vec![PaneConfig::with_commands(["vim"]), PaneConfig::default()];
    window.options.insert("mode-keys".into(), json!("vi"));
    let config = WorkspaceConfig {
        session_name: "typed".into(),
        start_directory: Some("/work".into()),
        environment: Default::default(),
        global_options: Default::default(),
        options: Default::default(),
        shell_command_before: Vec::new(),
        suppress_history: None,
        windows: vec![window],
    };

    let mut client = InMemoryControlPlane::new();
    let session = build(&mut client, &config);
    assert_eq!(session.path, "/work");

    let window = session.windows(&mut client).unwrap().remove(0);
    let window_options = client.options(&OptionScope::Window(window.id.clone()));
    assert_eq!(window_options, [("mode-keys".to_string(), "vi".to_string())]);
    let panes = window.panes(&mut client).unwrap();
    assert_eq!(panes.len(), 2);
    assert_eq!(field(&client.list_panes(&window.id).unwrap()[1], "pane_current_path"), "/work");
}
