//! Integration tests for the producer and the stock consumers.
//!
//! These tests wire a pump thread, followers, watchers, sinks, and
//! file-loaded configuration together the way a process supervisor would.

use std::fs::File;
use std::io::{BufReader, Cursor, Write};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use ringlog::error::{ConfigError, PumpError, WatchError};
use ringlog::{
    ChannelSink, Follower, LineFilter, RingLog, RingLogConfig, RingLogError, Watcher, WriterSink,
    pump,
};
use tempfile::tempdir;

/// Turns chat requests like `<alice> !save` into the command `save`.
struct CommandFilter;

impl LineFilter for CommandFilter {
    fn parse(&self, line: &str) -> Option<String> {
        let (_, rest) = line.split_once("> !")?;
        Some(rest.to_string())
    }
}

#[test]
fn test_config_file_drives_log() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("server.json");
    std::fs::write(
        &path,
        r#"{ "name": "server", "capacity": 3, "poll_interval_ms": 1 }"#,
    )
    .unwrap();

    let config = RingLogConfig::load(&path).unwrap();
    let log = RingLog::from_config(&config).unwrap();
    log.write_lines(["1", "2", "3", "4"]);

    assert_eq!(log.name(), "server");
    assert_eq!(log.poll_interval(), Duration::from_millis(1));
    assert_eq!(log.list_all(), vec!["2", "3", "4"]);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("zero.json");
    std::fs::write(&path, r#"{ "capacity": 0 }"#).unwrap();

    let err = RingLogConfig::load(&path).unwrap_err();
    assert!(matches!(
        err,
        RingLogError::InvalidConfiguration(ConfigError::InvalidCapacity { capacity: 0 })
    ));
    assert!(err.to_string().contains("invalid capacity 0"));
}

#[test]
fn test_pump_from_file_with_mirror_sink() {
    let temp_dir = tempdir().unwrap();
    let input_path = temp_dir.path().join("server.log");
    let mirror_path = temp_dir.path().join("mirror.log");

    let mut input = File::create(&input_path).unwrap();
    for k in 0..20 {
        writeln!(input, "[Server thread/INFO]: tick {k}").unwrap();
    }
    drop(input);

    let log = Arc::new(
        RingLog::new(8)
            .unwrap()
            .with_sink(WriterSink::new(File::create(&mirror_path).unwrap())),
    );
    let reader = BufReader::new(File::open(&input_path).unwrap());
    let handle = pump::spawn_pump(Arc::clone(&log), reader, "file-pump").unwrap();

    assert_eq!(handle.join().unwrap(), 20);
    assert_eq!(log.len(), 8);
    assert_eq!(log.list_all()[0], "[Server thread/INFO]: tick 12");

    // The mirror saw every line, not just the retained ones.
    let mirrored = std::fs::read_to_string(&mirror_path).unwrap();
    assert_eq!(mirrored, std::fs::read_to_string(&input_path).unwrap());
}

#[test]
fn test_pump_read_error_is_reported_by_join() {
    let log = Arc::new(RingLog::new(8).unwrap());
    let input: &'static [u8] = b"first\nsecond\n\xc3\x28\n";
    let handle = pump::spawn_pump(Arc::clone(&log), input, "bad-pump").unwrap();

    let err = handle.join().unwrap_err();
    assert!(matches!(
        err,
        RingLogError::Pump(PumpError::Read { lines_read: 2, .. })
    ));
    assert_eq!(log.list_all(), vec!["first", "second"]);
}

#[test]
fn test_follower_relays_pumped_lines() {
    let log = Arc::new(RingLog::new(256).unwrap());
    log.write("before attach");

    let (history, mut follower) = Follower::attach(Arc::clone(&log));
    assert_eq!(history, vec!["before attach"]);

    let input = (0..100).map(|k| format!("line {k}\n")).collect::<String>();
    let handle = pump::spawn_pump(Arc::clone(&log), Cursor::new(input), "relay-pump").unwrap();

    let mut relayed = Vec::new();
    while relayed.len() < 100 {
        relayed.extend(follower.poll_timeout(Duration::from_secs(5)));
    }
    handle.join().unwrap();

    let expected: Vec<_> = (0..100).map(|k| format!("line {k}")).collect();
    assert_eq!(relayed, expected);
    assert_eq!(follower.dropped(), 0);
}

#[test]
fn test_backup_watcher_waits_for_save() {
    let (tx, rx) = mpsc::channel();
    let log = Arc::new(
        RingLog::new(64)
            .unwrap()
            .with_filter(CommandFilter)
            .with_control(ChannelSink::new(tx)),
    );
    log.write("Saved the world");

    let mut watcher = Watcher::attach(Arc::clone(&log));

    let server = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            log.write("<alice> !save");
            thread::sleep(Duration::from_millis(10));
            log.write("Saving the game");
            log.write("Saved the world");
        })
    };

    let line = watcher
        .wait_for(|line| line.ends_with("Saved the world"), Duration::from_secs(5))
        .unwrap();
    server.join().unwrap();

    assert_eq!(line, "Saved the world");
    assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "save");
}

#[test]
fn test_watcher_deadline_is_an_error() {
    let config = RingLogConfig::new("quiet", 4, Duration::from_millis(2)).unwrap();
    let log = Arc::new(RingLog::from_config(&config).unwrap());
    let mut watcher = Watcher::attach(log);

    let err = watcher
        .wait_for(|line| line.contains("never"), Duration::from_millis(15))
        .unwrap_err();
    assert!(matches!(
        err,
        RingLogError::Watch(WatchError::DeadlineExpired { .. })
    ));
}
