//! Resolving command-line sources into one configuration

mod common;

use collector_launch::config::{ExpandConverter, ProviderError, ResolverError};
use collector_launch::{CollectorArgs, Resolver, ResolverSettings};
use common::{parse_args, write_config};
use serde_yaml::Value;

fn resolver(args: &CollectorArgs) -> Result<Resolver, ResolverError> {
    Resolver::new(ResolverSettings::new(args.source_list().into_locators()))
}

#[test]
fn test_two_files_and_an_override() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_config(
        dir.path(),
        "base.yaml",
        "receivers:\n  otlp:\n    protocols:\n      http:\n        endpoint: 0.0.0.0:4318\nexporters:\n  nop:\n",
    );
    let prod = write_config(
        dir.path(),
        "prod.yaml",
        "processors:\n  batch:\n    timeout: 1s\n",
    );

    let args = parse_args(&[
        "--config",
        base.to_str().unwrap(),
        "--config",
        prod.to_str().unwrap(),
        "--set",
        "receivers.otlp.protocols.http.endpoint=127.0.0.1:9999",
    ]);
    let conf = resolver(&args).unwrap().resolve().unwrap();

    assert_eq!(
        conf.get("receivers::otlp::protocols::http::endpoint"),
        Some(&Value::from("127.0.0.1:9999"))
    );
    assert_eq!(
        conf.get("processors::batch::timeout"),
        Some(&Value::from("1s"))
    );
    assert!(conf.get("exporters::nop").is_some());
}

#[test]
fn test_later_override_wins() {
    let args = parse_args(&[
        "--config",
        "yaml:processors: {batch: {timeout: 1s}}",
        "--set",
        "processors.batch.timeout=2s",
        "--set",
        "processors.batch.timeout=3s",
    ]);
    let conf = resolver(&args).unwrap().resolve().unwrap();
    assert_eq!(
        conf.get("processors::batch::timeout"),
        Some(&Value::from("3s"))
    );
}

#[test]
fn test_overrides_apply_after_every_config() {
    let args = parse_args(&[
        "--set",
        "exporters.nop.level=set",
        "--config",
        "yaml:exporters: {nop: {level: file}}",
    ]);
    let conf = resolver(&args).unwrap().resolve().unwrap();
    assert_eq!(conf.get("exporters::nop::level"), Some(&Value::from("set")));
}

#[test]
fn test_sequences_are_replaced_not_appended() {
    let args = parse_args(&[
        "-c",
        "yaml:service: {extensions: [a, b]}",
        "-c",
        "yaml:service: {extensions: [c]}",
    ]);
    let conf = resolver(&args).unwrap().resolve().unwrap();
    let extensions: Vec<Value> = serde_yaml::from_value(
        conf.get("service::extensions").unwrap().clone(),
    )
    .unwrap();
    assert_eq!(extensions, vec![Value::from("c")]);
}

#[test]
fn test_malformed_set_fails_before_any_io() {
    let args: Vec<String> = ["--config", "/does/not/exist.yaml", "--set", "missing-equal"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let err = CollectorArgs::parse("collector_launch", &args).unwrap_err();
    assert!(err.status.is_err());
    assert!(err.output.contains("missing equal sign"));
}

#[test]
fn test_malformed_inline_set_is_rejected() {
    let args: Vec<String> = ["--config", "/does/not/exist.yaml", "--set=timeout"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let err = CollectorArgs::parse("collector_launch", &args).unwrap_err();
    assert!(err.status.is_err());
    assert!(err.output.contains("missing equal sign"));
}

#[test]
fn test_no_config_flag() {
    let args = parse_args(&[]);
    assert!(matches!(resolver(&args), Err(ResolverError::NoLocators)));
}

#[test]
fn test_missing_file_names_the_locator() {
    let args = parse_args(&["--config", "/does/not/exist.yaml"]);
    let err = resolver(&args).unwrap().resolve().unwrap_err();
    match err {
        ResolverError::Retrieve { locator, source } => {
            assert_eq!(locator, "file:/does/not/exist.yaml");
            assert!(matches!(source, ProviderError::Io { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unsupported_scheme() {
    let args = parse_args(&["--config", "s3:bucket/collector.yaml"]);
    assert!(matches!(
        resolver(&args),
        Err(ResolverError::UnsupportedScheme { ref scheme, .. }) if scheme == "s3"
    ));
}

#[test]
fn test_expansion_per_layer() {
    let args = parse_args(&[
        "-c",
        "yaml:exporters: {nop: {token: \"${TOKEN}\"}}",
        "--set",
        "processors.batch.timeout=${env:TIMEOUT}",
    ]);
    let settings = ResolverSettings::new(args.source_list().into_locators()).with_converters(vec![
        Box::new(
            ExpandConverter::isolated()
                .with_env("TOKEN", "secret")
                .with_env("TIMEOUT", "5s"),
        ),
    ]);
    let conf = Resolver::new(settings).unwrap().resolve().unwrap();

    assert_eq!(conf.get("exporters::nop::token"), Some(&Value::from("secret")));
    assert_eq!(
        conf.get("processors::batch::timeout"),
        Some(&Value::from("5s"))
    );
}

#[test]
fn test_undefined_variable_fails() {
    let args = parse_args(&["-c", "yaml:exporters: {nop: {token: \"${UNSET_TOKEN}\"}}"]);
    let settings = ResolverSettings::new(args.source_list().into_locators())
        .with_converters(vec![Box::new(ExpandConverter::isolated())]);
    let err = Resolver::new(settings).unwrap().resolve().unwrap_err();
    assert!(matches!(err, ResolverError::Convert { .. }));
    assert!(err.to_string().contains("UNSET_TOKEN"));
}
