use readygate::config::ServerConfig;
use readygate::error::GateError;
use readygate::service::{GateState, Handoff, Launcher, ReadinessGate, ServerCommand};
use readygate::types::SeedAccount;
use readygate::Initializer;
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::time::Instant;

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "readygate-launch-{tag}-{}-{}",
        std::process::id(),
        nanos
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Records when and with what the launcher handed off.
#[derive(Clone, Default)]
struct RecordingHandoff {
    calls: Arc<Mutex<Vec<(Instant, ServerCommand)>>>,
}

impl RecordingHandoff {
    fn calls(&self) -> Vec<(Instant, ServerCommand)> {
        self.calls.lock().expect("lock").clone()
    }
}

impl Handoff for RecordingHandoff {
    fn hand_off(&self, command: &ServerCommand) -> Result<(), GateError> {
        self.calls
            .lock()
            .expect("lock")
            .push((Instant::now(), command.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn no_handoff_until_signal_then_within_one_interval() {
    let dir = temp_dir("gate");
    let signal = dir.join(".ready");
    let interval = Duration::from_millis(100);

    let handoff = RecordingHandoff::default();
    let gate = ReadinessGate::new(&signal, interval, None);
    let command = ServerCommand::from(&ServerConfig::default());
    let launcher = Launcher::new(gate, command.clone(), handoff.clone());
    let task = tokio::spawn(launcher.run());

    tokio::time::sleep(interval * 3).await;
    assert!(handoff.calls().is_empty(), "handed off before signal existed");
    assert!(!task.is_finished());

    let created_at = Instant::now();
    fs::write(&signal, b"").expect("create signal");

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("launcher finished")
        .expect("task joined")
        .expect("launcher ok");

    let calls = handoff.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, command);
    let lag = calls[0].0.duration_since(created_at);
    // one interval plus scheduling slack
    assert!(lag <= interval + Duration::from_millis(50), "lag was {lag:?}");

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn bounded_launcher_fails_without_handoff() {
    let dir = temp_dir("timeout");
    let handoff = RecordingHandoff::default();
    let gate = ReadinessGate::new(
        dir.join(".ready"),
        Duration::from_millis(20),
        Some(Duration::from_millis(120)),
    );
    let launcher = Launcher::new(
        gate,
        ServerCommand::from(&ServerConfig::default()),
        handoff.clone(),
    );

    let err = launcher.run().await.expect_err("signal never appears");
    assert!(matches!(err, GateError::ReadinessTimeout { .. }));
    assert!(handoff.calls().is_empty());
    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn initializer_marker_opens_the_gate() {
    let dir = temp_dir("handshake");
    let instance = dir.join("instance");
    let init = Initializer::new(&instance, vec![SeedAccount::new("admin", "admin")]);

    let mut gate = ReadinessGate::new(init.marker_path(), Duration::from_millis(25), None);
    assert_eq!(gate.check().await.expect("check"), GateState::Waiting);

    let waiter = tokio::spawn(async move {
        gate.wait().await.map(|_| gate.state())
    });
    init.run().await.expect("init succeeds");

    let state = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("gate opened")
        .expect("task joined")
        .expect("wait ok");
    assert_eq!(state, GateState::Ready);
    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn database_file_alone_does_not_open_marker_gate() {
    let dir = temp_dir("db-only");
    let init = Initializer::new(&dir, vec![SeedAccount::new("admin", "admin")]);
    fs::write(init.database_path(), b"").expect("create bare database file");

    let handoff = RecordingHandoff::default();
    let gate = ReadinessGate::new(
        init.marker_path(),
        Duration::from_millis(20),
        Some(Duration::from_millis(120)),
    );
    let command = ServerCommand::from(&ServerConfig::default());
    let err = Launcher::new(gate, command.clone(), handoff.clone())
        .run()
        .await
        .expect_err("database file is not the readiness signal");
    match err {
        GateError::ReadinessTimeout { path, .. } => assert_eq!(path, init.marker_path()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(handoff.calls().is_empty());

    let _ = fs::remove_file(init.database_path());
    init.run().await.expect("init succeeds");
    let gate = ReadinessGate::new(init.marker_path(), Duration::from_millis(20), None);
    Launcher::new(gate, command.clone(), handoff.clone())
        .run()
        .await
        .expect("marker opens the gate");
    assert_eq!(handoff.calls().len(), 1);
    let _ = fs::remove_dir_all(&dir);
}
