//! CLI integration tests.
//!
//! Parses real argument vectors and runs them against the mock backend,
//! with a temporary token file standing in for the user's home directory.
//! Each `invoke` builds a fresh controller, mirroring separate process runs.

use std::path::Path;

use clap::Parser;
use portal_cli::{commands, Cli, Commands, Config, FileTokenStore, Overrides, UreqTransport};
use portal_core::{ApiClient, Controller, Presenter, Role, Session, TokenStore};
use serde_json::Value;
use tempfile::TempDir;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Run `args` as one CLI invocation; returns success and the rendered envelope.
fn invoke(base_url: &str, token_file: &Path, args: &[&str]) -> (bool, Value) {
    let mut argv = vec!["portal", "--base-url", base_url, "--token-file"];
    argv.push(token_file.to_str().unwrap());
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let config = Config::resolve(Default::default(), cli.overrides(), None).unwrap();
    let session = Session::open(FileTokenStore::new(&config.token_file)).unwrap();
    let mut controller = Controller::new(
        ApiClient::new(&config.base_url),
        UreqTransport::new(),
        session,
        Presenter::new(Vec::new()),
    );

    let ok = commands::run(&mut controller, cli.command, &mut |_: &str| true);
    let raw = std::mem::take(controller.presenter_mut().get_mut());
    let shown = serde_json::from_slice(&raw).unwrap();
    (ok, shown)
}

#[test]
fn test_cli_parses_register_role() {
    let cli = Cli::try_parse_from([
        "portal", "register", "--username", "ann", "--email", "a@b.c", "--password", "pw", "--role",
        "moderator",
    ])
    .unwrap();
    match cli.command {
        Commands::Register { role, .. } => assert_eq!(role, Role::Moderator),
        _ => panic!("expected register"),
    }
}

#[test]
fn test_cli_rejects_unknown_role() {
    let result = Cli::try_parse_from([
        "portal", "register", "--username", "ann", "--email", "a@b.c", "--password", "pw", "--role",
        "root",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_cli_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["portal", "health", "--base-url", "http://x.test"]).unwrap();
    assert_eq!(cli.overrides().base_url.as_deref(), Some("http://x.test"));
}

#[test]
fn test_cli_request_parses_method() {
    let cli = Cli::try_parse_from(["portal", "request", "delete", "/api/feedback/3"]).unwrap();
    match cli.command {
        Commands::Request { method, path, body } => {
            assert_eq!(method, portal_core::HttpMethod::Delete);
            assert_eq!(path, "/api/feedback/3");
            assert!(body.is_none());
        }
        _ => panic!("expected request"),
    }
}

#[test]
fn test_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("portal.toml");
    std::fs::write(
        &path,
        "base_url = \"http://config.test:9000\"\ntoken_file = \"/tmp/portal-test-token\"\n",
    )
    .unwrap();

    let config = Config::load(Overrides {
        config: Some(path),
        ..Overrides::default()
    })
    .unwrap();

    assert_eq!(config.base_url, "http://config.test:9000");
    assert_eq!(config.token_file, std::path::PathBuf::from("/tmp/portal-test-token"));
}

#[test]
fn test_example_config_parses() {
    let content = include_str!("../../portal.toml.example");
    let file: portal_cli::config::FileConfig = toml::from_str(content).unwrap();
    assert_eq!(file.base_url.as_deref(), Some("http://localhost:8000"));
    assert!(file.token_file.is_none());
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = Config::load(Overrides {
        config: Some(dir.path().join("absent.toml")),
        ..Overrides::default()
    });
    assert!(matches!(result, Err(portal_cli::ConfigError::Read { .. })));
}

#[test]
fn test_token_survives_between_invocations() {
    let base_url = start_server();
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");

    let (ok, _) = invoke(
        &base_url,
        &token_file,
        &["register", "--username", "ann", "--email", "ann@example.com", "--password", "pw"],
    );
    assert!(ok);

    let (ok, shown) = invoke(&base_url, &token_file, &["login", "-u", "ann", "-p", "pw"]);
    assert!(ok);
    assert_eq!(shown["data"]["message"], "Login successful");
    assert!(FileTokenStore::new(&token_file).load().unwrap().is_some());

    let (ok, shown) = invoke(&base_url, &token_file, &["me"]);
    assert!(ok);
    assert_eq!(shown["status"], 200);
    assert_eq!(shown["data"]["username"], "ann");

    let (ok, shown) = invoke(&base_url, &token_file, &["status"]);
    assert!(ok);
    assert_eq!(shown["data"]["state"], "logged_in");
    assert_eq!(shown["data"]["user"]["email"], "ann@example.com");

    let (ok, shown) = invoke(&base_url, &token_file, &["logout"]);
    assert!(ok);
    assert_eq!(shown["data"]["message"], "Logout successful");
    assert!(!token_file.exists());

    let (ok, shown) = invoke(&base_url, &token_file, &["me"]);
    assert!(!ok);
    assert_eq!(shown["status"], 401);
    assert_eq!(shown["data"]["error"], "Not authenticated");
}

#[test]
fn test_rejected_token_is_removed_from_disk() {
    let base_url = start_server();
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "stale-token").unwrap();

    let (ok, shown) = invoke(&base_url, &token_file, &["feedbacks"]);

    assert!(!ok);
    assert_eq!(shown["data"]["error"], "Could not validate credentials");
    assert!(!token_file.exists());
}

#[test]
fn test_health_and_raw_request() {
    let base_url = start_server();
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");

    let (ok, shown) = invoke(&base_url, &token_file, &["health"]);
    assert!(ok);
    assert_eq!(shown["data"]["database"], "connected");

    let (ok, shown) = invoke(
        &base_url,
        &token_file,
        &[
            "request",
            "POST",
            "/auth/register",
            "--body",
            r#"{"username":"raw","email":"raw@example.com","password":"pw"}"#,
        ],
    );
    assert!(ok);
    assert_eq!(shown["data"]["role"], "user");
}
