#![cfg(unix)]

use expectrl::{Eof, Error as ExpectError, Session};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path as path_matcher};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECT_TIMEOUT: Duration = Duration::from_secs(4);
const EXPECT_RETRIES: usize = 3;

struct App {
    session: Session,
    _config_home: TempDir,
    state_home: TempDir,
    _work_dir: TempDir,
}

#[test]
#[serial]
fn chat_starts_in_default_mode_and_switches_prompt() {
    let mut app = spawn_app(None);
    expect_text(&mut app.session, "Welcome to PathwayAI");
    expect_text(&mut app.session, "homework> ");

    submit_line(&mut app.session, "/mode artist");
    expect_text(&mut app.session, "Switched to Artist mode (artist)");
    expect_text(&mut app.session, "artist> ");

    exit_repl(&mut app.session);
}

#[test]
#[serial]
fn missing_key_is_reported_at_startup_and_per_turn() {
    let mut app = spawn_app(None);
    expect_text(&mut app.session, "OPENAI_API_KEY not configured");
    expect_text(&mut app.session, "homework> ");

    submit_line(&mut app.session, "what can you do?");
    expect_text(
        &mut app.session,
        "Request failed: OPENAI_API_KEY not configured",
    );
    expect_text(&mut app.session, "homework> ");

    exit_repl(&mut app.session);
}

#[test]
#[serial]
fn happy_path_with_mock_backend_writes_reply_and_trace() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_string_contains("PathwayAI Academic Assistant"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"choices":[{"message":{"role":"assistant","content":"Mock assistant says 4"}}]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;
    });

    let mut app = spawn_app(Some(&server));
    expect_text(&mut app.session, "homework> ");

    submit_line(&mut app.session, "What is 2+2?");
    expect_text(&mut app.session, "Mock assistant says 4");
    expect_text(&mut app.session, "homework> ");

    exit_repl(&mut app.session);
    let content = read_trace_file(&app.state_home);
    assert!(
        content.contains("[user.homework ] What is 2+2?"),
        "trace content:\n{content}"
    );
    assert!(
        content.contains("Mock assistant says 4"),
        "trace content:\n{content}"
    );
    assert!(
        !content.contains("Bearer test-key"),
        "trace must not contain the credential:\n{content}"
    );
}

#[test]
#[serial]
fn failed_turn_can_be_retried() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let server = rt.block_on(MockServer::start());
    rt.block_on(async {
        Mock::given(method("POST"))
            .and(path_matcher("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path_matcher("/v1/chat/completions"))
            .and(body_string_contains("pitch deck"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"choices":[{"message":{"content":"Recovered answer"}}]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
    });

    let mut app = spawn_app(Some(&server));
    expect_text(&mut app.session, "homework> ");

    submit_line(&mut app.session, "/mode business");
    expect_text(&mut app.session, "business> ");
    submit_line(&mut app.session, "Outline a pitch deck");
    expect_text(
        &mut app.session,
        "Request failed: OpenAI API error: 500 - backend down",
    );
    expect_text(&mut app.session, "business> ");

    submit_line(&mut app.session, "/retry");
    expect_text(&mut app.session, "Recovered answer");

    submit_line(&mut app.session, "/history");
    expect_text(&mut app.session, "you: Outline a pitch deck");
    expect_text(&mut app.session, "ai: Recovered answer");

    exit_repl(&mut app.session);
}

fn spawn_app(server: Option<&MockServer>) -> App {
    let config_home = tempfile::tempdir().expect("create XDG_CONFIG_HOME tempdir");
    let state_home = tempfile::tempdir().expect("create XDG_STATE_HOME tempdir");
    let work_dir = tempfile::tempdir().expect("working dir tempdir");

    let mut command = Command::new(binary_path());
    command
        .current_dir(work_dir.path())
        .env("NO_COLOR", "1")
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("XDG_STATE_HOME", state_home.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_MODEL")
        .env_remove("OPENAI_BASE_URL");
    if let Some(server) = server {
        command
            .env("OPENAI_API_KEY", "test-key")
            .env("OPENAI_MODEL", "gpt-test")
            .env("OPENAI_BASE_URL", server.uri());
    }

    let mut session = Session::spawn(command).expect("spawn pathway_ai in PTY");
    session.set_expect_timeout(Some(EXPECT_TIMEOUT));

    App {
        session,
        _config_home: config_home,
        state_home,
        _work_dir: work_dir,
    }
}

fn binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_pathway_ai")
        .unwrap_or_else(|_| "target/debug/pathway_ai".to_string())
}

fn submit_line(session: &mut Session, line: &str) {
    session.send(line).expect("send line text");
    session.send([b'\r']).expect("send Enter");
}

fn exit_repl(session: &mut Session) {
    submit_line(session, "quit");
    let _ = session.expect(Eof);
    thread::sleep(Duration::from_millis(25));
}

fn expect_text(session: &mut Session, text: &str) {
    for attempt in 1..=EXPECT_RETRIES {
        match session.expect(text) {
            Ok(_) => return,
            Err(ExpectError::ExpectTimeout) if attempt < EXPECT_RETRIES => continue,
            Err(err) => panic!(
                "failed to match text {:?} on attempt {}: {}",
                text, attempt, err
            ),
        }
    }

    panic!("unreachable: retries exhausted without returning");
}

fn read_trace_file(state_home: &TempDir) -> String {
    let trace_dir = state_home.path().join("pathway").join("traces");
    let mut entries = fs::read_dir(&trace_dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", trace_dir.display()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("failed to iterate {}: {err}", trace_dir.display()));
    assert_eq!(
        entries.len(),
        1,
        "expected exactly one trace file in {}",
        trace_dir.display()
    );
    let path: PathBuf = entries.remove(0).path();
    fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()))
}
