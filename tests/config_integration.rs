use serial_test::serial;
use std::env;
use std::fs;
use weather_chat::config::{AppConfig, DEFAULT_AGENT_URL};

const ARGV0: &str = "weather-chat";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("WEATHER_CHAT_SERVER__PORT");
        env::remove_var("WEATHER_CHAT_SERVER__HOST");
        env::remove_var("WEATHER_CHAT_AGENT__URL");
        env::remove_var("WEATHER_CHAT_AGENT__DEV_PLAYGROUND");
        env::remove_var("WEATHER_CHAT_RELAY__CHANNEL_CAPACITY");
        env::remove_var("WEATHER_AGENT_API_URL");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("LOG_JSON");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([ARGV0]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.agent.url, DEFAULT_AGENT_URL);
    assert!(config.agent.dev_playground);
    assert_eq!(config.relay.channel_capacity, 16);
    assert!(!config.logging.json);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("WEATHER_CHAT_SERVER__PORT", "9090");
        env::set_var("WEATHER_CHAT_RELAY__CHANNEL_CAPACITY", "4");
    }

    let config = AppConfig::load_from_args([ARGV0]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.relay.channel_capacity, 4);

    clear_env_vars();
}

#[test]
#[serial]
fn test_legacy_agent_url_variable() {
    clear_env_vars();
    unsafe {
        env::set_var("WEATHER_CHAT_AGENT__URL", "http://prefixed.example/agent");
        env::set_var("WEATHER_AGENT_API_URL", "http://legacy.example/agent");
    }

    let config = AppConfig::load_from_args([ARGV0]).expect("Failed to load config");
    assert_eq!(config.agent.url, "http://legacy.example/agent");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("weather.toml");
    fs::write(
        &file_path,
        r#"
[server]
port = 7070

[agent]
url = "http://localhost:4111/api/agents/weather/stream"
dev_playground = false
"#,
    )
    .expect("Failed to write temp config");

    unsafe {
        env::set_var("CONFIG_FILE", &file_path);
    }

    let config = AppConfig::load_from_args([ARGV0]).expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(
        config.agent.url,
        "http://localhost:4111/api/agents/weather/stream"
    );
    assert!(!config.agent.dev_playground);
    // Untouched keys keep their defaults
    assert_eq!(config.server.host, "0.0.0.0");

    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let result = AppConfig::load_from_args([ARGV0, "--config", missing.to_str().unwrap()]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_precedence_file_env_cli() {
    clear_env_vars();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("weather.toml");
    fs::write(&file_path, "[server]\nport = 7070\nhost = \"127.0.0.1\"\n").unwrap();

    unsafe {
        env::set_var("WEATHER_CHAT_SERVER__PORT", "8080");
    }

    // Env beats file
    let config = AppConfig::load_from_args([ARGV0, "--config", file_path.to_str().unwrap()])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "127.0.0.1");

    // CLI beats env
    let config = AppConfig::load_from_args([
        ARGV0,
        "--config",
        file_path.to_str().unwrap(),
        "--port",
        "6060",
        "--agent-url",
        "http://cli.example/agent",
    ])
    .expect("Failed to load config");
    assert_eq!(config.server.port, 6060);
    assert_eq!(config.agent.url, "http://cli.example/agent");
    assert_eq!(config.bind_address(), "127.0.0.1:6060");

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_values_are_rejected() {
    clear_env_vars();

    assert!(AppConfig::load_from_args([ARGV0, "--agent-url", "not a url"]).is_err());
    assert!(AppConfig::load_from_args([ARGV0, "--channel-capacity", "0"]).is_err());
}
