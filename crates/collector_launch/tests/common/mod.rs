//! Test helpers for launcher integration tests

#![allow(dead_code)]

use collector_launch::{builtin_factories, CollectorArgs, Factories};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write `content` to `dir/name` and return its path
pub fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A local port that was free a moment ago
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn factories() -> Arc<Factories> {
    Arc::new(builtin_factories().unwrap())
}

/// Parse a command line as the binary would
pub fn parse_args(args: &[&str]) -> CollectorArgs {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    CollectorArgs::parse("collector_launch", &args).unwrap()
}

/// A minimal valid configuration listening on the given local ports
pub fn minimal_config(health_port: u16, otlp_port: u16) -> String {
    format!(
        r#"
receivers:
  otlp:
    protocols:
      http:
        endpoint: 127.0.0.1:{otlp_port}
processors:
  batch:
exporters:
  nop:
extensions:
  health_check:
    endpoint: 127.0.0.1:{health_port}
service:
  extensions: [health_check]
  pipelines:
    traces:
      receivers: [otlp]
      processors: [batch]
      exporters: [nop]
"#
    )
}
