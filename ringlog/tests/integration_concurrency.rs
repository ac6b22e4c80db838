//! Integration tests for one writer and many readers running at once.
//!
//! Each reader must see a strictly increasing subsequence of what was
//! written, and all of it when the log is large enough to never lap.

use std::sync::{Arc, Barrier};
use std::thread;

use ringlog::{Follower, RingLog};

const LINES: u64 = 5_000;

fn parse(lines: &[String]) -> Vec<u64> {
    lines.iter().map(|line| line.parse().unwrap()).collect()
}

/// Spawns `readers` followers that poll until they have seen the last line.
fn run_followers(log: &Arc<RingLog>, readers: usize) -> Vec<thread::JoinHandle<(Vec<u64>, u64)>> {
    (0..readers)
        .map(|_| {
            let (history, mut follower) = Follower::attach(Arc::clone(log));
            thread::spawn(move || {
                let mut seen = parse(&history);
                while seen.last() != Some(&(LINES - 1)) {
                    let batch = follower.poll();
                    if batch.is_empty() {
                        thread::yield_now();
                    }
                    seen.extend(parse(&batch));
                }
                (seen, follower.dropped())
            })
        })
        .collect()
}

#[test]
fn test_followers_see_everything_without_lapping() {
    let log = Arc::new(RingLog::new(8192).unwrap());
    let followers = run_followers(&log, 4);

    let writer = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for k in 0..LINES {
                log.write(k.to_string());
            }
        })
    };

    writer.join().unwrap();
    for handle in followers {
        let (seen, dropped) = handle.join().unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(seen, (0..LINES).collect::<Vec<_>>());
    }
}

#[test]
fn test_lapped_followers_see_increasing_subsequence() {
    let log = Arc::new(RingLog::new(16).unwrap());
    let followers = run_followers(&log, 3);

    let writer = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for k in 0..LINES {
                log.write(k.to_string());
            }
        })
    };

    writer.join().unwrap();
    for handle in followers {
        let (seen, dropped) = handle.join().unwrap();
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "out of order");
        assert_eq!(seen.len() as u64 + dropped, LINES);
    }
}

#[test]
fn test_readers_during_writes_never_see_torn_state() {
    let log = Arc::new(RingLog::new(32).unwrap());
    let start = Arc::new(Barrier::new(3));

    let writer = {
        let log = Arc::clone(&log);
        let start = Arc::clone(&start);
        thread::spawn(move || {
            start.wait();
            for k in 0..LINES {
                log.write(k.to_string());
            }
        })
    };

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let log = Arc::clone(&log);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                while log.total_written() < LINES {
                    let all = parse(&log.list_all());
                    assert!(all.len() <= 32);
                    assert!(all.windows(2).all(|pair| pair[1] == pair[0] + 1));

                    let screen = parse(&log.list_backward(log.most_recent_read_pos(), Some(10)));
                    assert!(screen.windows(2).all(|pair| pair[0] > pair[1]));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(parse(&log.list_all()), (LINES - 32..LINES).collect::<Vec<_>>());
}

#[test]
fn test_default_cursor_drain_with_concurrent_writer() {
    let log = Arc::new(RingLog::new(64).unwrap());

    let writer = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for k in 0..LINES {
                log.write(k.to_string());
            }
        })
    };

    let mut seen = Vec::new();
    while seen.last() != Some(&(LINES - 1)) {
        seen.extend(parse(&log.list_new_lines()));
    }
    writer.join().unwrap();

    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(seen.len() as u64 + log.stats().lapped, LINES);
}
