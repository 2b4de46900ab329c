use std::io::Write;

use hydronet::{
    config::{ConfigError, Suite},
    models::{ModelConfig, ModelKind},
};

const SUITE: &str = r#"
seed = 7

[[model]]
kind = "lstm"
input_dim = 5
hidden_dim = 64
output_dim = 1
num_layers = 2
dropout = 0.2
bidirectional = true

[[model]]
kind = "fully_conv"
input_dim = 5
hidden_dim = 32
output_dim = 1
"#;

#[test]
fn parse_suite() {
    let suite = Suite::from_toml_str(SUITE).unwrap();
    assert_eq!(suite.seed, Some(7));
    assert_eq!(
        suite.models,
        vec![
            ModelConfig {
                num_layers: 2,
                dropout: 0.2,
                bidirectional: true,
                ..ModelConfig::new(ModelKind::Lstm, 5, 64, 1)
            },
            ModelConfig::new(ModelKind::FullyConv, 5, 32, 1),
        ]
    );
}

#[test]
fn kinds_use_snake_case() {
    for (name, kind) in [
        ("lstm", ModelKind::Lstm),
        ("gru", ModelKind::Gru),
        ("conv_gru", ModelKind::ConvGru),
        ("fully_conv", ModelKind::FullyConv),
        ("ffn", ModelKind::Ffn),
    ] {
        let text = format!(
            "[[model]]\nkind = \"{name}\"\ninput_dim = 1\nhidden_dim = 1\noutput_dim = 1\n"
        );
        let suite = Suite::from_toml_str(&text).unwrap();
        assert_eq!(suite.seed, None);
        assert_eq!(suite.models[0].kind, kind);
    }
}

#[test]
fn empty_suite() {
    let suite = Suite::from_toml_str("").unwrap();
    assert!(suite.models.is_empty());
}

#[test]
fn invalid_suites() {
    let unknown_kind = "[[model]]\nkind = \"transformer\"\ninput_dim = 1\nhidden_dim = 1\noutput_dim = 1\n";
    assert!(matches!(
        Suite::from_toml_str(unknown_kind),
        Err(ConfigError::Parse(_))
    ));
    let missing_dim = "[[model]]\nkind = \"gru\"\ninput_dim = 1\nhidden_dim = 1\n";
    assert!(matches!(
        Suite::from_toml_str(missing_dim),
        Err(ConfigError::Parse(_))
    ));
    let typo = "[[model]]\nkind = \"gru\"\ninput_dim = 1\nhidden_dim = 1\noutput_dim = 1\nlayers = 2\n";
    assert!(matches!(Suite::from_toml_str(typo), Err(ConfigError::Parse(_))));
}

#[test]
fn load_from_file() {
    let path = std::env::temp_dir().join(format!("hydronet-suite-{}.toml", std::process::id()));
    std::fs::File::create(&path)
        .and_then(|mut file| file.write_all(SUITE.as_bytes()))
        .unwrap();
    let suite = Suite::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(suite.unwrap().models.len(), 2);

    assert!(matches!(
        Suite::load("does/not/exist.toml"),
        Err(ConfigError::Io(_))
    ));
}
