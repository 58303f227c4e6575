use std::collections::BTreeMap;

use downfolio_store::{Config, MapEnv, ParseOutcome, Provider};
use downfolio_test_utils::TestProfile;

#[test]
fn save_then_load_round_trips_any_string_map() {
    let tp = TestProfile::new();
    let store = tp.config();

    let config: Config = BTreeMap::from([
        ("OPENAI_API_KEY".to_string(), "sk-123".to_string()),
        ("ANTHROPIC_MODEL".to_string(), "claude-opus-4-5".to_string()),
        ("custom key".to_string(), "quote \" and = sign # not a comment".to_string()),
        ("EMPTY".to_string(), String::new()),
    ]);
    store.save(&config).unwrap();

    assert_eq!(store.load_checked(), ParseOutcome::Parsed(config));
}

#[test]
fn config_lives_in_profile_root() {
    let tp = TestProfile::new();
    tp.set_config("OPENAI_MODEL", "gpt-4o");
    assert!(tp.root().join("config.toml").is_file());
}

#[test]
fn environment_beats_file_for_api_keys_only() {
    let tp = TestProfile::new().with_env(
        MapEnv::new()
            .with("OPENAI_API_KEY", "sk-env")
            .with("OPENAI_MODEL", "gpt-4-turbo"),
    );
    tp.set_config("OPENAI_API_KEY", "sk-file");
    tp.set_config("OPENAI_MODEL", "gpt-4o");

    let store = tp.config();
    assert_eq!(store.api_key(Provider::OpenAi).as_deref(), Some("sk-env"));
    assert_eq!(store.default_model(Provider::OpenAi).as_deref(), Some("gpt-4o"));
    assert_eq!(store.get_value("OPENAI_API_KEY").as_deref(), Some("sk-file"));
}

#[test]
fn all_lists_every_stored_key() {
    let tp = TestProfile::new();
    tp.set_config("B", "2");
    tp.set_config("A", "1");

    let keys: Vec<_> = tp.config().all().into_keys().collect();
    assert_eq!(keys, vec!["A", "B"]);
}
