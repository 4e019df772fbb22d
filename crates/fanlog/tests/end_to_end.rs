//! End-to-end coverage: dispatch table fan-out into real sinks.

use std::fs;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use fanlog::{
    FileSink, FilterConfig, FilterOption, Level, LogRecord, Logger, OptionValue, Protocol,
    StructuredSocketSink,
};

#[test]
fn records_flow_from_logger_to_rotated_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("flow.log");

    let logger = Logger::new();
    logger.add_filter(
        "file",
        Level::Debug,
        Box::new(
            FileSink::new(&path, 2)
                .with_format("%M")
                .with_max_size(256)
                .with_flush_bytes(0),
        ),
    );

    for i in 0..40 {
        logger.log(Level::Info, "e2e", format!("a reasonably sized line {i}"));
    }
    // Below the file filter's threshold: must not appear.
    logger.log(Level::Finest, "e2e", "invisible".to_string());
    logger.close();

    let slot1 = dir.path().join("flow.001.log");
    assert!(slot1.exists(), "size rotation never produced a segment");
    assert!(!dir.path().join("flow.003.log").exists());

    let mut all = String::new();
    for candidate in [
        dir.path().join("flow.002.log"),
        slot1.clone(),
        path.clone(),
    ] {
        if let Ok(chunk) = fs::read_to_string(&candidate) {
            all.push_str(&chunk);
        }
    }
    assert!(all.contains("a reasonably sized line 39"));
    assert!(!all.contains("invisible"));
}

#[test]
fn one_record_fans_out_to_file_and_socket() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fan.log");

    let receiver = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
    receiver
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("timeout");
    let addr = receiver.local_addr().expect("addr").to_string();

    let logger = Logger::new();
    logger.add_filter(
        "file",
        Level::Debug,
        Box::new(FileSink::new(&path, 0).with_format("%M")),
    );
    logger.add_filter(
        "collector",
        Level::Warning,
        Box::new(StructuredSocketSink::new(Protocol::Udp, addr)),
    );

    logger.log(Level::Error, "fan.rs:1", "both destinations".to_string());
    logger.close();

    let contents = fs::read_to_string(&path).expect("read file");
    assert_eq!(contents, "both destinations\n");

    let mut buf = [0u8; 2048];
    let n = receiver.recv(&mut buf).expect("datagram");
    let decoded: LogRecord = serde_json::from_slice(&buf[..n]).expect("decode");
    assert_eq!(decoded.level, Level::Error);
    assert_eq!(decoded.message, "both destinations");
    assert_eq!(decoded.source, "fan.rs:1");
}

#[test]
fn declarative_config_drives_a_file_sink() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("declared.log");

    let raw = format!(
        r#"[{{
            "enabled": true,
            "name": "file",
            "level": "INFO",
            "kind": "file",
            "options": [
                {{"name": "filename", "value": {path:?}}},
                {{"name": "format", "value": "[%L] %M"}},
                {{"name": "maxsize", "value": "1M"}},
                {{"name": "rotate", "value": 3}}
            ]
        }}]"#,
        path = path.to_string_lossy()
    );
    let configs: Vec<FilterConfig> = serde_json::from_str(&raw).expect("parse config");
    assert_eq!(
        configs[0].options[2],
        FilterOption {
            name: "maxsize".to_string(),
            value: OptionValue::from("1M"),
        }
    );

    let logger = Logger::new();
    logger.apply_config(&configs).expect("apply config");

    logger.log(Level::Debug, "cfg", "filtered out".to_string());
    logger.log(Level::Warning, "cfg", "kept".to_string());
    logger.close();

    let contents = fs::read_to_string(&path).expect("read log");
    assert_eq!(contents, "[WARN] kept\n");
}

#[test]
fn concurrent_producers_drain_completely() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("herd.log");

    let logger = Arc::new(Logger::new());
    logger.add_filter(
        "file",
        Level::Finest,
        Box::new(FileSink::new(&path, 0).with_format("%M").with_queue_capacity(4)),
    );

    let mut handles = Vec::new();
    for t in 0..8 {
        let logger = Arc::clone(&logger);
        handles.push(std::thread::spawn(move || {
            for i in 0..25 {
                logger.log(Level::Info, "herd", format!("producer {t} item {i}"));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("producer");
    }
    logger.close();

    let contents = fs::read_to_string(&path).expect("read log");
    assert_eq!(contents.lines().count(), 200);
}
