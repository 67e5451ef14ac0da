// ABOUTME: Integration tests for session start, restart, close and out-of-band exit

use aider_bridge::channel::{MemoryHandle, MemoryLauncher};
use aider_bridge::config::{AnthropicModel, AppConfig, ConfigError, ProviderConfig};
use aider_bridge::engine::{CloseReason, ReconciliationEngine};
use aider_bridge::filter::InMemoryIgnoreList;
use aider_bridge::session::{SessionError, SessionState};
use aider_bridge::sync::EditorDocument;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tempfile::TempDir;

fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

fn config_for(dir: &Path) -> AppConfig {
    AppConfig {
        working_directory: Some(dir.to_path_buf()),
        provider: ProviderConfig::Anthropic {
            api_key: "sk-test".to_string(),
            model: AnthropicModel::Sonnet,
        },
        ..AppConfig::default()
    }
}

fn engine() -> (ReconciliationEngine, MemoryHandle) {
    let launcher = MemoryLauncher::new();
    let handle = launcher.handle();
    let engine = ReconciliationEngine::new(launcher)
        .with_ignore_source(InMemoryIgnoreList::default());
    (engine, handle)
}

fn record_closes(engine: &mut ReconciliationEngine) -> Arc<Mutex<Vec<CloseReason>>> {
    let closes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&closes);
    engine.on_close(move |_, reason| sink.lock().unwrap().push(reason));
    closes
}

#[test]
fn test_open_launches_with_model_flag_and_credentials() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let session = engine.open(config_for(dir.path())).unwrap();

    assert_eq!(session.state, SessionState::Active);
    assert_eq!(session.working_directory, dir.path().to_path_buf());
    assert_eq!(session.environment_vars, vec!["ANTHROPIC_API_KEY".to_string()]);

    let launches = handle.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].command_line, "aider --sonnet");
    assert_eq!(
        launches[0].env,
        BTreeMap::from([("ANTHROPIC_API_KEY".to_string(), "sk-test".to_string())])
    );
}

#[test]
fn test_session_starts_in_nearest_project_directory() {
    let dir = workspace();
    let nested = dir.path().join("packages/web");
    std::fs::create_dir_all(nested.join("src")).unwrap();
    std::fs::write(nested.join("package.json"), "{}").unwrap();

    let (mut engine, handle) = engine();
    let session = engine.open(config_for(&nested.join("src"))).unwrap();

    assert_eq!(session.working_directory, nested);
    assert_eq!(session.root.path(), dir.path());

    // Paths are still expressed relative to the version-control root
    engine.add_file(&nested.join("src/index.ts"));
    assert_eq!(handle.lines(), vec!["/add packages/web/src/index.ts".to_string()]);
}

#[test]
fn test_restart_clears_known_set() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let closes = record_closes(&mut engine);

    let first = engine.open(config_for(dir.path())).unwrap();
    engine.add_file(&dir.path().join("a.rs"));
    assert_eq!(engine.known_files().len(), 1);

    let second = engine.open(config_for(dir.path())).unwrap();
    assert_ne!(first.id, second.id);
    assert!(engine.known_files().is_empty());
    assert_eq!(handle.lines(), vec!["/add a.rs".to_string(), "/exit".to_string()]);
    assert_eq!(*closes.lock().unwrap(), vec![CloseReason::Restarted]);
    assert_eq!(handle.launches().len(), 2);
}

#[test]
fn test_open_documents_are_re_added_after_reopen() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    engine.replace_documents(
        &[
            EditorDocument::file(dir.path().join("a.rs")),
            EditorDocument::file(dir.path().join("b.rs")),
        ],
        Instant::now(),
    );

    engine.open(config_for(dir.path())).unwrap();
    assert!(engine.close());
    engine.open(config_for(dir.path())).unwrap();

    assert_eq!(
        handle.lines(),
        vec![
            "/add a.rs b.rs".to_string(),
            "/exit".to_string(),
            "/add a.rs b.rs".to_string(),
        ]
    );
    assert_eq!(
        engine.known_files(),
        vec![dir.path().join("a.rs"), dir.path().join("b.rs")]
    );
}

#[test]
fn test_provider_restart_re_adds_open_documents() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    engine.replace_documents(
        &[
            EditorDocument::file(dir.path().join("a.rs")),
            EditorDocument::file(dir.path().join("b.rs")),
        ],
        Instant::now(),
    );
    engine.open(config_for(dir.path())).unwrap();

    let mut switched = config_for(dir.path());
    switched.provider = ProviderConfig::OpenAi {
        api_key: "sk-openai".to_string(),
        model: Default::default(),
    };
    engine.apply_config(switched).unwrap();

    assert_eq!(
        handle.lines(),
        vec![
            "/add a.rs b.rs".to_string(),
            "/exit".to_string(),
            "/add a.rs b.rs".to_string(),
        ]
    );
    assert_eq!(handle.launches()[1].command_line, "aider --4o");
    assert_eq!(engine.known_files().len(), 2);
}

#[test]
fn test_close_is_idempotent() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let closes = record_closes(&mut engine);
    engine.open(config_for(dir.path())).unwrap();

    assert!(engine.close());
    assert!(!engine.close());

    assert_eq!(handle.lines(), vec!["/exit".to_string()]);
    assert!(handle.is_disposed());
    assert_eq!(engine.session().map(|s| s.state), Some(SessionState::Closed));
    assert_eq!(*closes.lock().unwrap(), vec![CloseReason::Requested]);
}

#[test]
fn test_close_cancels_pending_sync() {
    let dir = workspace();
    let (mut engine, _handle) = engine();
    engine.open(config_for(dir.path())).unwrap();

    engine.document_opened(&EditorDocument::file(dir.path().join("a.rs")), Instant::now());
    assert!(engine.sync_pending());

    engine.close();
    assert!(!engine.sync_pending());
    assert_eq!(engine.next_deadline(), None);
}

#[test]
fn test_out_of_band_exit_runs_cleanup_without_exit_command() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let closes = record_closes(&mut engine);
    engine.open(config_for(dir.path())).unwrap();
    engine.add_file(&dir.path().join("a.rs"));

    assert!(!engine.poll_process());
    handle.terminate();
    assert!(engine.poll_process());
    assert!(!engine.poll_process());

    assert!(!engine.is_active());
    assert!(engine.known_files().is_empty());
    assert!(handle.lines_starting_with("/exit").is_empty());
    assert_eq!(*closes.lock().unwrap(), vec![CloseReason::ProcessExited]);
}

#[test]
fn test_missing_credential_launches_nothing() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let mut config = config_for(dir.path());
    config.provider = ProviderConfig::default();

    let err = engine.open(config).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Config(ConfigError::MissingCredential { env_var: "ANTHROPIC_API_KEY", .. })
    ));
    assert!(handle.launches().is_empty());
    assert!(!engine.is_active());
}

#[test]
fn test_custom_provider_requires_model_argument() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let mut config = config_for(dir.path());
    config.provider = ProviderConfig::Custom { env: BTreeMap::new() };

    let err = engine.open(config.clone()).unwrap_err();
    assert!(matches!(err, SessionError::Config(ConfigError::MissingModel)));
    assert!(handle.launches().is_empty());

    config.startup_args = "--model ollama/llama3".to_string();
    engine.open(config).unwrap();
    assert_eq!(handle.launches()[0].command_line, "aider --model ollama/llama3");
}

#[test]
fn test_invalid_working_directory_is_rejected() {
    let (mut engine, handle) = engine();
    let mut config = config_for(Path::new("relative/dir"));

    let err = engine.open(config.clone()).unwrap_err();
    assert!(matches!(err, SessionError::Config(ConfigError::InvalidWorkingDirectory(_))));

    config.working_directory = None;
    let err = engine.open(config).unwrap_err();
    assert!(matches!(err, SessionError::Config(ConfigError::NoWorkingDirectory)));
    assert!(handle.launches().is_empty());
}

#[test]
fn test_launch_failure_leaves_no_session() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    handle.refuse_launch("tmux unavailable");

    let err = engine.open(config_for(dir.path())).unwrap_err();
    assert!(matches!(err, SessionError::Launch(_)));
    assert!(!engine.is_active());
    assert!(engine.session().is_none());
}

#[test]
fn test_first_add_starts_session_on_demand() {
    let dir = workspace();
    let (engine, handle) = engine();
    let mut engine = engine.with_config(config_for(dir.path()));
    engine.replace_documents(&[EditorDocument::file(dir.path().join("a.rs"))], Instant::now());

    engine.add_files(&[dir.path().join("a.rs"), dir.path().join("b.rs")]);

    assert!(engine.is_active());
    assert_eq!(handle.launches().len(), 1);
    assert_eq!(
        handle.lines(),
        vec!["/add a.rs".to_string(), "/add b.rs".to_string()]
    );
}

#[test]
fn test_add_without_config_does_nothing() {
    let dir = workspace();
    let (mut engine, handle) = engine();

    engine.add_file(&dir.path().join("a.rs"));
    engine.drop_file(&dir.path().join("a.rs"));
    engine.send_command("/help");

    assert!(handle.launches().is_empty());
    assert!(handle.lines().is_empty());
}

#[test]
fn test_provider_change_restarts_session() {
    let dir = workspace();
    let (mut engine, handle) = engine();
    let closes = record_closes(&mut engine);
    engine.open(config_for(dir.path())).unwrap();

    let mut tweaked = config_for(dir.path());
    tweaked.sync_debounce_ms = 1000;
    engine.apply_config(tweaked.clone()).unwrap();
    assert_eq!(handle.launches().len(), 1);

    tweaked.provider = ProviderConfig::Anthropic {
        api_key: "sk-test".to_string(),
        model: AnthropicModel::Opus,
    };
    engine.apply_config(tweaked).unwrap();

    let launches = handle.launches();
    assert_eq!(launches.len(), 2);
    assert_eq!(launches[1].command_line, "aider --opus");
    assert_eq!(*closes.lock().unwrap(), vec![CloseReason::Restarted]);
}

#[test]
fn test_apply_config_without_session_only_stores_it() {
    let dir = workspace();
    let (mut engine, handle) = engine();

    engine.apply_config(config_for(dir.path())).unwrap();
    assert!(handle.launches().is_empty());
    assert!(engine.config().is_some());
}
