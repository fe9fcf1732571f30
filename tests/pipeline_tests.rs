//! End-to-end pipeline tests against a scripted in-memory remote.

use mailsweep::pipeline::run_job;
use mailsweep::remote::{AuthError, FetchError, ListError, Page, Remote, Session};
use mailsweep::types::{JobConfig, MessageRecord, Tuning};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Shared state behind every mock session. References are `identity#index`.
struct MockState {
    mailboxes: HashMap<String, Vec<MessageRecord>>,
    /// identity -> authorize calls that fail before one succeeds
    auth_failures: Mutex<HashMap<String, u32>>,
    /// reference -> fetch calls that fail before one succeeds
    fetch_failures: Mutex<HashMap<String, u32>>,
    /// identities whose list call always fails
    list_poisoned: Vec<String>,
    /// identity -> total authorize calls observed
    auth_attempts: Mutex<HashMap<String, u32>>,
}

struct MockRemote {
    state: Arc<MockState>,
}

struct MockSession {
    state: Arc<MockState>,
    identity: String,
}

impl Remote for MockRemote {
    type Session = MockSession;

    fn authorize(&self, identity: &str) -> Result<MockSession, AuthError> {
        *self
            .state
            .auth_attempts
            .lock()
            .unwrap()
            .entry(identity.to_string())
            .or_insert(0) += 1;
        if let Some(left) = self.state.auth_failures.lock().unwrap().get_mut(identity)
            && *left > 0
        {
            *left -= 1;
            return Err(AuthError::Transport("connection reset".to_string()));
        }
        Ok(MockSession {
            state: Arc::clone(&self.state),
            identity: identity.to_string(),
        })
    }
}

impl Session for MockSession {
    fn list_matching(
        &self,
        _query: &str,
        page_size: u32,
        cursor: Option<&str>,
    ) -> Result<Page<String>, ListError> {
        if self.state.list_poisoned.contains(&self.identity) {
            return Err(ListError::Status {
                status: 500,
                detail: "search backend down".to_string(),
            });
        }
        let total = self.state.mailboxes.get(&self.identity).map_or(0, Vec::len);
        let start: usize = cursor.map_or(0, |c| c.parse().unwrap());
        let end = total.min(start + page_size as usize);
        let items = (start..end).map(|i| format!("{}#{i}", self.identity)).collect();
        let next_cursor = (end < total).then(|| end.to_string());
        Ok(Page { items, next_cursor })
    }

    fn fetch(&self, reference: &str) -> Result<MessageRecord, FetchError> {
        if let Some(left) = self.state.fetch_failures.lock().unwrap().get_mut(reference)
            && *left > 0
        {
            *left -= 1;
            return Err(FetchError::Transport("connection reset".to_string()));
        }
        let (identity, index) = reference
            .split_once('#')
            .ok_or_else(|| FetchError::Malformed(reference.to_string()))?;
        let index: usize = index
            .parse()
            .map_err(|_| FetchError::Malformed(reference.to_string()))?;
        self.state
            .mailboxes
            .get(identity)
            .and_then(|mailbox| mailbox.get(index))
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                detail: reference.to_string(),
            })
    }
}

fn message(identity: &str, n: usize) -> MessageRecord {
    MessageRecord {
        to: Some(identity.to_string()),
        from: Some(format!("sender{n}@example.com")),
        subject: Some(format!("match {n}")),
        message_id: Some(format!("<{n}@{identity}>")),
        date: Some("Mon, 24 Aug 2026 10:00:00 +0000".to_string()),
        snippet: format!("snippet {n} for {identity}"),
    }
}

fn mailbox(identity: &str, count: usize) -> (String, Vec<MessageRecord>) {
    (
        identity.to_string(),
        (0..count).map(|n| message(identity, n)).collect(),
    )
}

fn state(mailboxes: Vec<(String, Vec<MessageRecord>)>) -> MockState {
    MockState {
        mailboxes: mailboxes.into_iter().collect(),
        auth_failures: Mutex::new(HashMap::new()),
        fetch_failures: Mutex::new(HashMap::new()),
        list_poisoned: Vec::new(),
        auth_attempts: Mutex::new(HashMap::new()),
    }
}

/// Page size 2 so any mailbox with three or more messages spans pages.
fn config(dir: &Path, process_count: usize, thread_count: usize) -> JobConfig {
    JobConfig {
        query: "subject:match".to_string(),
        page_size: 2,
        process_count,
        thread_count,
        output_path: dir.join("out.jsonl"),
        error_log_path: dir.join("errors.jsonl"),
        tuning: Tuning::immediate(),
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => text.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_round_robin_scenario_writes_exact_record_set() {
    let dir = TempDir::new().unwrap();
    let state = state(vec![mailbox("a", 2), mailbox("b", 0), mailbox("c", 1)]);
    let remote = Arc::new(MockRemote {
        state: Arc::new(state),
    });
    let config = config(dir.path(), 2, 4);
    let output_path = config.output_path.clone();

    let summary = run_job(
        remote,
        config,
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
    )
    .unwrap();

    assert_eq!(summary.identities, 3);
    assert_eq!(summary.records, 3);
    assert_eq!(summary.errors, 0);

    let lines = read_lines(&output_path);
    assert_eq!(lines.len(), 3);
    let mut per_identity: HashMap<String, usize> = HashMap::new();
    for line in &lines {
        let record: MessageRecord = serde_json::from_str(line).unwrap();
        *per_identity.entry(record.to.unwrap()).or_insert(0) += 1;
    }
    assert_eq!(per_identity.get("a"), Some(&2));
    assert_eq!(per_identity.get("c"), Some(&1));
    assert_eq!(per_identity.get("b"), None);
}

#[test]
fn test_auth_flake_recovers_without_logging() {
    let dir = TempDir::new().unwrap();
    let mut state = state(vec![mailbox("a", 1)]);
    state
        .auth_failures
        .get_mut()
        .unwrap()
        .insert("a".to_string(), 2);
    let state = Arc::new(state);
    let remote = Arc::new(MockRemote {
        state: Arc::clone(&state),
    });
    let config = config(dir.path(), 1, 1);
    let error_path = config.error_log_path.clone();

    let summary = run_job(remote, config, vec!["a".to_string()]).unwrap();

    // Third attempt succeeded; listing and fetching proceeded, nothing logged.
    assert_eq!(summary.records, 1);
    assert_eq!(summary.errors, 0);
    assert!(read_lines(&error_path).is_empty());
    assert_eq!(state.auth_attempts.lock().unwrap().get("a"), Some(&3));
}

#[test]
fn test_auth_exhaustion_logs_once_and_worker_continues() {
    let dir = TempDir::new().unwrap();
    let mut state = state(vec![mailbox("a", 1), mailbox("b", 2)]);
    state
        .auth_failures
        .get_mut()
        .unwrap()
        .insert("a".to_string(), u32::MAX);
    let state = Arc::new(state);
    let remote = Arc::new(MockRemote {
        state: Arc::clone(&state),
    });
    let config = config(dir.path(), 1, 1);
    let error_path = config.error_log_path.clone();

    // One worker owns both identities, so `b` completing proves the worker
    // survived `a`'s terminal auth failure and the queue drained.
    let summary = run_job(remote, config, vec!["a".to_string(), "b".to_string()]).unwrap();

    assert_eq!(summary.identities, 2);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(state.auth_attempts.lock().unwrap().get("a"), Some(&3));

    let errors = read_lines(&error_path);
    assert_eq!(errors.len(), 1);
    let entry: serde_json::Value = serde_json::from_str(&errors[0]).unwrap();
    assert_eq!(entry["operation"], "authorize");
    assert_eq!(entry["identity"], "a");
}

#[test]
fn test_fetch_retry_yields_single_record() {
    let dir = TempDir::new().unwrap();
    let mut state = state(vec![mailbox("a", 1)]);
    state
        .fetch_failures
        .get_mut()
        .unwrap()
        .insert("a#0".to_string(), 1);
    let remote = Arc::new(MockRemote {
        state: Arc::new(state),
    });
    let config = config(dir.path(), 1, 1);
    let output_path = config.output_path.clone();

    let summary = run_job(remote, config, vec!["a".to_string()]).unwrap();

    // Failed once, succeeded on the retry: exactly one record, no duplicate.
    assert_eq!(summary.records, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(read_lines(&output_path).len(), 1);
}

#[test]
fn test_fetch_exhaustion_drops_only_that_message() {
    let dir = TempDir::new().unwrap();
    let mut state = state(vec![mailbox("a", 3)]);
    state
        .fetch_failures
        .get_mut()
        .unwrap()
        .insert("a#1".to_string(), u32::MAX);
    let remote = Arc::new(MockRemote {
        state: Arc::new(state),
    });
    let config = config(dir.path(), 1, 1);
    let output_path = config.output_path.clone();
    let error_path = config.error_log_path.clone();

    let summary = run_job(remote, config, vec!["a".to_string()]).unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(read_lines(&output_path).len(), 2);

    let errors = read_lines(&error_path);
    assert_eq!(errors.len(), 1);
    let entry: serde_json::Value = serde_json::from_str(&errors[0]).unwrap();
    assert_eq!(entry["operation"], "fetch");
    assert_eq!(entry["identity"], "a");
    assert_eq!(entry["reference"], "a#1");
}

#[test]
fn test_list_failure_abandons_identity_but_not_siblings() {
    let dir = TempDir::new().unwrap();
    let mut state = state(vec![mailbox("a", 2), mailbox("b", 2), mailbox("c", 1)]);
    state.list_poisoned.push("b".to_string());
    let remote = Arc::new(MockRemote {
        state: Arc::new(state),
    });
    let config = config(dir.path(), 2, 2);
    let error_path = config.error_log_path.clone();

    let summary = run_job(
        remote,
        config,
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
    )
    .unwrap();

    assert_eq!(summary.identities, 3);
    assert_eq!(summary.records, 3);

    let errors = read_lines(&error_path);
    assert_eq!(errors.len(), 1);
    let entry: serde_json::Value = serde_json::from_str(&errors[0]).unwrap();
    assert_eq!(entry["operation"], "list");
    assert_eq!(entry["identity"], "b");
}

#[test]
fn test_record_multiset_invariant_across_configurations() {
    let mailboxes = || {
        vec![
            mailbox("a", 5),
            mailbox("b", 0),
            mailbox("c", 3),
            mailbox("d", 1),
            mailbox("e", 7),
            mailbox("f", 2),
            mailbox("g", 0),
            mailbox("h", 4),
            mailbox("i", 1),
        ]
    };
    let identities: Vec<String> = ["a", "b", "c", "d", "e", "f", "g", "h", "i"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut outputs = Vec::new();
    for (process_count, thread_count) in [(1, 1), (3, 4)] {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(MockRemote {
            state: Arc::new(state(mailboxes())),
        });
        let config = config(dir.path(), process_count, thread_count);
        let output_path = config.output_path.clone();
        let summary = run_job(remote, config, identities.clone()).unwrap();
        assert_eq!(summary.errors, 0);

        let mut lines = read_lines(&output_path);
        lines.sort();
        outputs.push(lines);
    }

    // Same multiset of records; only arrival order may differ.
    assert_eq!(outputs[0].len(), 23);
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_concurrent_load_never_interleaves_lines() {
    let dir = TempDir::new().unwrap();
    let mailboxes: Vec<_> = (0..30)
        .map(|i| mailbox(&format!("user{i}@example.com"), 4))
        .collect();
    let identities: Vec<String> = mailboxes.iter().map(|(id, _)| id.clone()).collect();
    let remote = Arc::new(MockRemote {
        state: Arc::new(state(mailboxes)),
    });
    let config = config(dir.path(), 3, 6);
    let output_path = config.output_path.clone();

    let summary = run_job(remote, config, identities).unwrap();
    assert_eq!(summary.records, 120);

    let lines = read_lines(&output_path);
    assert_eq!(lines.len(), 120);
    for line in &lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.as_object().unwrap().contains_key("snippet"));
    }
}

#[test]
#[cfg(target_os = "linux")]
fn test_write_failure_stops_workers_and_job_still_terminates() {
    let dir = TempDir::new().unwrap();
    let identities: Vec<String> = (0..6).map(|i| format!("user{i}@example.com")).collect();
    let mailboxes = identities.iter().map(|id| mailbox(id, 1)).collect();
    let remote = Arc::new(MockRemote {
        state: Arc::new(state(mailboxes)),
    });
    let mut config = config(dir.path(), 1, 2);
    // Every append to /dev/full fails with ENOSPC; the error log stays writable.
    config.output_path = PathBuf::from("/dev/full");
    let error_path = config.error_log_path.clone();

    // Returning at all proves the feeder gave up once every worker had exited
    // instead of blocking on a full queue forever.
    let summary = run_job(remote, config, identities).unwrap();

    // Each worker stops after its first failed append, so at most one identity
    // per worker was consumed and nothing was written.
    assert_eq!(summary.records, 0);
    assert!(summary.identities <= 2);
    assert!(summary.errors >= 1);

    let errors = read_lines(&error_path);
    assert_eq!(errors.len() as u64, summary.errors);
    for line in &errors {
        let entry: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(entry["operation"], "write");
    }
}

#[test]
fn test_empty_identity_list_is_fatal_before_any_work() {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(MockRemote {
        state: Arc::new(state(Vec::new())),
    });
    let config = config(dir.path(), 2, 2);
    let output_path = config.output_path.clone();

    assert!(run_job(remote, config, Vec::new()).is_err());
    // Failed loudly before opening any sink.
    assert!(!output_path.exists());
}
