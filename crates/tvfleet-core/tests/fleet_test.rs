#![allow(clippy::unwrap_used)]
// Integration tests for `Fleet` using in-process fakes for the prober,
// wake signaler and session channel.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use tvfleet_api::{
    Endpoint, Error as ApiError, Greeting, Prober, RemoteControl, Session, SessionChannel,
    WakeSignaler,
};
use tvfleet_core::{
    AuthToken, CancellationToken, Collaborators, CoreError, DeviceDirectory, DevicePatch,
    DeviceRecord, Fleet, FleetConfig, KeyMap, MemoryDirectory, Pairing,
};

// ── Fakes ───────────────────────────────────────────────────────────

/// Reachability by address; unknown addresses are unreachable.
#[derive(Default)]
struct FakeProber {
    up: Mutex<HashSet<String>>,
    calls: Mutex<usize>,
}

impl FakeProber {
    fn set(&self, address: &str, up: bool) {
        let mut set = self.up.lock().unwrap();
        if up {
            set.insert(address.to_owned());
        } else {
            set.remove(address);
        }
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn is_reachable(&self, address: &str) -> bool {
        *self.calls.lock().unwrap() += 1;
        self.up.lock().unwrap().contains(address)
    }
}

/// Records wake calls. Optionally brings the device up when woken.
struct SpyWake {
    calls: Mutex<Vec<(String, Ipv4Addr)>>,
    wakes_device: Option<Arc<FakeProber>>,
    woken_address: String,
    fail: bool,
}

impl SpyWake {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            wakes_device: None,
            woken_address: String::new(),
            fail: false,
        }
    }

    fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WakeSignaler for SpyWake {
    async fn wake(&self, mac: &str, broadcast: Ipv4Addr) -> Result<String, ApiError> {
        self.calls.lock().unwrap().push((mac.to_owned(), broadcast));
        if self.fail {
            return Err(ApiError::Wake(std::io::Error::other("network down")));
        }
        if let Some(prober) = &self.wakes_device {
            prober.set(&self.woken_address, true);
        }
        Ok(format!("Wake packet sent to {broadcast}"))
    }
}

/// What the fake device answers when a session is opened.
#[derive(Clone)]
enum Script {
    /// Token-less opens get `Paired`, token opens get `Ready`.
    Normal { issued: &'static str },
    /// Token opens get `Unauthorized`.
    RejectToken,
    /// Token opens get a non-connect event carrying `message`; token-less
    /// opens get `Ready` without issuing a token.
    RejectEvent { message: Option<&'static str> },
    /// Opening panics.
    Panic,
    /// Opening fails with a timeout.
    Timeout,
}

#[derive(Default)]
struct Log {
    opens: Vec<(String, bool, Duration)>,
    sent: Vec<(String, String)>,
    closed: usize,
}

struct FakeChannel {
    scripts: Mutex<HashMap<String, Script>>,
    log: Arc<Mutex<Log>>,
}

impl FakeChannel {
    fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    fn script(&self, address: &str, script: Script) {
        self.scripts.lock().unwrap().insert(address.to_owned(), script);
    }

    fn opens(&self) -> usize {
        self.log.lock().unwrap().opens.len()
    }
}

struct FakeSession {
    address: String,
    greeting: Greeting,
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl Session for FakeSession {
    fn greeting(&self) -> &Greeting {
        &self.greeting
    }

    async fn send(&mut self, command: &RemoteControl) -> Result<(), ApiError> {
        self.log
            .lock()
            .unwrap()
            .sent
            .push((self.address.clone(), command.key().to_owned()));
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().closed += 1;
    }
}

#[async_trait]
impl SessionChannel for FakeChannel {
    async fn open(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> Result<Box<dyn Session>, ApiError> {
        let address = endpoint.url().host_str().unwrap().to_owned();
        let with_token = endpoint.has_token();
        self.log
            .lock()
            .unwrap()
            .opens
            .push((address.clone(), with_token, timeout));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&address)
            .cloned()
            .unwrap_or(Script::Normal { issued: "issued-token" });

        let greeting = match (script, with_token) {
            (Script::Panic, _) => panic!("device {address} exploded"),
            (Script::Timeout, _) => return Err(ApiError::Timeout { timeout_secs: 5 }),
            (Script::Normal { issued }, false) => Greeting::Paired {
                token: SecretString::from(issued.to_owned()),
            },
            (Script::Normal { .. }, true) => Greeting::Ready,
            (Script::RejectToken, true) => Greeting::Unauthorized {
                message: Some("Unauthorized".into()),
            },
            (Script::RejectEvent { message }, true) => Greeting::Rejected {
                event: Some("ms.error".into()),
                message: message.map(str::to_owned),
            },
            (Script::RejectEvent { .. }, false) => Greeting::Ready,
            (Script::RejectToken, false) => Greeting::Rejected {
                event: Some("ms.channel.timeOut".into()),
                message: None,
            },
        };

        Ok(Box::new(FakeSession {
            address,
            greeting,
            log: Arc::clone(&self.log),
        }))
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    fleet: Fleet,
    directory: Arc<MemoryDirectory>,
    prober: Arc<FakeProber>,
    wake: Arc<SpyWake>,
    channel: Arc<FakeChannel>,
}

fn device(address: &str, mac: Option<&str>, token: Option<&str>) -> DeviceRecord {
    let mut record = DeviceRecord::new(address);
    record.name = Some(format!("TV {address}"));
    record.mac = mac.map(str::to_owned);
    record.token = token.map(AuthToken::new);
    record
}

fn harness_with(devices: Vec<DeviceRecord>, config: FleetConfig, wake: SpyWake) -> Harness {
    let directory = Arc::new(MemoryDirectory::with_devices(devices));
    let prober = wake
        .wakes_device
        .clone()
        .unwrap_or_else(|| Arc::new(FakeProber::default()));
    let wake = Arc::new(wake);
    let channel = Arc::new(FakeChannel::new());

    let fleet = Fleet::new(
        config,
        Collaborators {
            directory: directory.clone(),
            registry: Arc::new(KeyMap::default()),
            channel: channel.clone(),
            wake: wake.clone(),
            prober: prober.clone(),
        },
    );
    Harness {
        fleet,
        directory,
        prober,
        wake,
        channel,
    }
}

fn harness(devices: Vec<DeviceRecord>) -> Harness {
    harness_with(devices, FleetConfig::default(), SpyWake::new())
}

fn targets(addresses: &[&str]) -> Vec<String> {
    addresses.iter().map(|a| (*a).to_owned()).collect()
}

// ── Power-on ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_power_on_already_reachable_sends_no_wake() {
    let h = harness(vec![device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None)]);
    h.prober.set("10.0.0.1", true);

    let outcome = h.fleet.power_on("10.0.0.1").await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Device is already on.");
    assert_eq!(outcome.name, "TV 10.0.0.1");
    assert_eq!(h.wake.count(), 0);
    assert_eq!(h.channel.opens(), 0);
}

#[tokio::test]
async fn test_power_on_without_mac_fails_without_io() {
    let h = harness(vec![device("10.0.0.1", None, None)]);

    let outcome = h.fleet.power_on("10.0.0.1").await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "No MAC address configured.");
    assert_eq!(h.wake.count(), 0);
    assert_eq!(h.channel.opens(), 0);
}

#[tokio::test]
async fn test_power_on_unknown_device() {
    let h = harness(vec![]);
    let outcome = h.fleet.power_on("10.9.9.9").await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Device 10.9.9.9 is not registered.");
    assert_eq!(outcome.name, "Unknown device (10.9.9.9)");
}

#[tokio::test]
async fn test_power_on_wake_send_error_fails() {
    let mut wake = SpyWake::new();
    wake.fail = true;
    let h = harness_with(
        vec![device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None)],
        FleetConfig::default(),
        wake,
    );

    let outcome = h.fleet.power_on("10.0.0.1").await;

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Error sending wake packet"), "{}", outcome.message);
}

#[tokio::test(start_paused = true)]
async fn test_power_on_unverified_is_optimistic_success() {
    let h = harness(vec![device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None)]);

    let outcome = h.fleet.power_on("10.0.0.1").await;

    assert!(outcome.success);
    assert_eq!(
        outcome.message,
        "Wake packet sent, but verification timed out. Device may be booting slowly."
    );
    assert_eq!(h.wake.count(), 1);
    // 10 polls, 3 s apart.
    assert!(outcome.elapsed >= Duration::from_secs(30));
    // Initial check plus ten polls.
    assert_eq!(*h.prober.calls.lock().unwrap(), 11);
}

#[tokio::test(start_paused = true)]
async fn test_power_on_uses_broadcast_override() {
    let mut record = device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None);
    record.broadcast = Some(Ipv4Addr::new(10, 0, 0, 255));
    let h = harness(vec![record, device("10.0.0.2", Some("a4:30:7a:01:bc:f0"), None)]);

    h.fleet.power_on("10.0.0.1").await;
    h.fleet.power_on("10.0.0.2").await;

    let calls = h.wake.calls.lock().unwrap().clone();
    assert_eq!(calls[0].1, Ipv4Addr::new(10, 0, 0, 255));
    assert_eq!(calls[1].1, Ipv4Addr::BROADCAST);
}

#[tokio::test(start_paused = true)]
async fn test_power_on_is_idempotent() {
    let prober = Arc::new(FakeProber::default());
    let mut wake = SpyWake::new();
    wake.wakes_device = Some(prober.clone());
    wake.woken_address = "10.0.0.1".into();
    let h = harness_with(
        vec![device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None)],
        FleetConfig::default(),
        wake,
    );

    let first = h.fleet.power_on("10.0.0.1").await;
    assert!(first.success);
    assert_eq!(first.message, "Device successfully powered on.");

    let second = h.fleet.power_on("10.0.0.1").await;
    assert!(second.success);
    assert_eq!(second.message, "Device is already on.");
    assert!(second.elapsed < first.elapsed);
    assert_eq!(h.wake.count(), 1);
}

// ── Power-off ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_power_off_unreachable_is_already_off() {
    let h = harness(vec![device("10.0.0.1", None, Some("t"))]);

    let outcome = h.fleet.power_off("10.0.0.1").await;

    assert!(outcome.success);
    assert_eq!(outcome.message, "Device is already off (unresponsive to probe).");
    assert_eq!(h.channel.opens(), 0);
}

#[tokio::test]
async fn test_power_off_reports_dispatcher_result_verbatim() {
    let h = harness(vec![
        device("10.0.0.1", None, Some("t")),
        device("10.0.0.2", None, Some("stale")),
    ]);
    h.prober.set("10.0.0.1", true);
    h.prober.set("10.0.0.2", true);
    h.channel.script("10.0.0.2", Script::RejectToken);

    let ok = h.fleet.power_off("10.0.0.1").await;
    assert!(ok.success);
    assert_eq!(ok.message, "Sent KEY_POWER");

    let rejected = h.fleet.power_off("10.0.0.2").await;
    assert!(!rejected.success);
    assert_eq!(rejected.message, "Unauthorized");
}

// ── Dispatch & tokens ───────────────────────────────────────────────

#[tokio::test]
async fn test_generic_command_on_off_device_skips_channel() {
    let h = harness(vec![device("10.0.0.1", None, Some("t"))]);

    let outcome = h.fleet.send_command("10.0.0.1", "volup").await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Device is off.");
    assert_eq!(h.channel.opens(), 0);
}

#[tokio::test]
async fn test_token_rejection_clears_cached_token() {
    let h = harness(vec![device("10.0.0.1", None, Some("stale"))]);
    h.prober.set("10.0.0.1", true);
    h.channel.script("10.0.0.1", Script::RejectToken);

    let outcome = h.fleet.send_command("10.0.0.1", "mute").await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Unauthorized");
    assert!(!h.directory.get("10.0.0.1").unwrap().has_token());
    assert_eq!(h.channel.log.lock().unwrap().closed, 1);
    assert!(h.channel.log.lock().unwrap().sent.is_empty());
}

#[tokio::test]
async fn test_pairing_then_send_end_to_end() {
    let h = harness(vec![device("10.0.0.1", None, None)]);
    h.prober.set("10.0.0.1", true);
    h.channel.script("10.0.0.1", Script::Normal { issued: "T1" });

    let outcome = h.fleet.send_key("10.0.0.1", "KEY_VOLUP").await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.message, "Sent KEY_VOLUP");

    let log = h.channel.log.lock().unwrap();
    assert_eq!(
        log.opens,
        vec![
            ("10.0.0.1".to_owned(), false, Duration::from_secs(60)),
            ("10.0.0.1".to_owned(), true, Duration::from_secs(5)),
        ]
    );
    assert_eq!(log.sent, vec![("10.0.0.1".to_owned(), "KEY_VOLUP".to_owned())]);
    assert_eq!(log.closed, 2);
    drop(log);

    let stored = h.directory.get("10.0.0.1").unwrap();
    assert_eq!(stored.token.unwrap().expose(), "T1");
}

#[tokio::test]
async fn test_unexpected_event_fails_but_keeps_token() {
    let h = harness(vec![
        device("10.0.0.1", None, Some("t1")),
        device("10.0.0.2", None, Some("t2")),
    ]);
    h.prober.set("10.0.0.1", true);
    h.prober.set("10.0.0.2", true);
    h.channel.script(
        "10.0.0.1",
        Script::RejectEvent {
            message: Some("Remote control is busy"),
        },
    );
    h.channel.script("10.0.0.2", Script::RejectEvent { message: None });

    let busy = h.fleet.send_command("10.0.0.1", "mute").await.unwrap();
    assert!(!busy.success);
    assert_eq!(busy.message, "Remote control is busy");

    let silent = h.fleet.send_command("10.0.0.2", "mute").await.unwrap();
    assert!(!silent.success);
    assert_eq!(silent.message, "Connection issue");

    assert_eq!(h.directory.get("10.0.0.1").unwrap().token.unwrap().expose(), "t1");
    assert_eq!(h.directory.get("10.0.0.2").unwrap().token.unwrap().expose(), "t2");
    let log = h.channel.log.lock().unwrap();
    assert!(log.sent.is_empty());
    assert_eq!(log.closed, 2);
}

#[tokio::test]
async fn test_pairing_without_issued_token_stores_nothing() {
    let h = harness(vec![device("10.0.0.1", None, None)]);
    h.prober.set("10.0.0.1", true);
    h.channel.script("10.0.0.1", Script::RejectEvent { message: None });

    let err = h.fleet.pair("10.0.0.1", true).await.unwrap_err();
    assert_eq!(err.to_string(), "Device did not issue a token");
    assert!(!h.directory.get("10.0.0.1").unwrap().has_token());
    assert_eq!(h.channel.log.lock().unwrap().closed, 1);

    let outcome = h.fleet.send_command("10.0.0.1", "mute").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Authentication token not available");
}

#[tokio::test]
async fn test_failed_pairing_reports_token_unavailable() {
    let h = harness(vec![device("10.0.0.1", None, None)]);
    h.prober.set("10.0.0.1", true);
    h.channel.script("10.0.0.1", Script::Timeout);

    let outcome = h.fleet.send_command("10.0.0.1", "home").await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Authentication token not available");
    assert!(!h.directory.get("10.0.0.1").unwrap().has_token());
}

#[tokio::test]
async fn test_pair_uses_cache_unless_forced() {
    let h = harness(vec![device("10.0.0.1", None, Some("old"))]);
    h.channel.script("10.0.0.1", Script::Normal { issued: "new" });

    assert_eq!(h.fleet.pair("10.0.0.1", false).await.unwrap(), Pairing::Cached);
    assert_eq!(h.channel.opens(), 0);

    assert_eq!(h.fleet.pair("10.0.0.1", true).await.unwrap(), Pairing::Issued);
    let token = h.directory.get("10.0.0.1").unwrap().token.unwrap();
    assert_eq!(token.expose(), "new");

    let err = h.fleet.pair("10.9.9.9", false).await.unwrap_err();
    assert!(matches!(err, CoreError::DeviceNotFound { .. }));
}

#[tokio::test]
async fn test_forget_token() {
    let h = harness(vec![device("10.0.0.1", None, Some("t"))]);
    h.fleet.forget_token("10.0.0.1").unwrap();
    assert!(!h.directory.get("10.0.0.1").unwrap().has_token());
    assert!(h.fleet.forget_token("10.9.9.9").is_err());
}

#[tokio::test]
async fn test_unknown_command_fails_whole_call() {
    let h = harness(vec![device("10.0.0.1", None, Some("t"))]);

    let err = h.fleet.send_command("10.0.0.1", "warp").await.unwrap_err();
    assert!(matches!(err, CoreError::UnknownCommand { .. }));

    let err = h
        .fleet
        .execute_bulk(&targets(&["10.0.0.1"]), "warp")
        .await
        .unwrap_err();
    assert!(err.is_config());
    assert_eq!(*h.prober.calls.lock().unwrap(), 0);
}

// ── Bulk ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bulk_isolates_panicking_device() {
    let addresses = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"];
    let h = harness(addresses.iter().map(|a| device(a, None, Some("t"))).collect());
    for a in addresses {
        h.prober.set(a, true);
    }
    h.channel.script("10.0.0.3", Script::Panic);

    let result = h.fleet.execute_bulk(&targets(&addresses), "mute").await.unwrap();

    assert_eq!(result.outcomes.len(), 4);
    assert_eq!(result.success_count + result.failure_count, 4);
    assert_eq!(result.failure_count, 1);

    let failed = result.failures().next().unwrap();
    assert_eq!(failed.address, "10.0.0.3");
    assert!(failed.message.contains("exploded"), "{}", failed.message);

    let mut seen: Vec<_> = result.outcomes.iter().map(|o| o.address.clone()).collect();
    seen.sort();
    assert_eq!(seen, targets(&addresses));
}

#[tokio::test]
async fn test_bulk_mixed_outcomes_and_dedupe() {
    let h = harness(vec![
        device("10.0.0.1", None, Some("t")),
        device("10.0.0.2", None, Some("t")),
    ]);
    h.prober.set("10.0.0.1", true);

    let result = h
        .fleet
        .execute_bulk(&targets(&["10.0.0.1", "10.0.0.2", "10.0.0.1"]), "volup")
        .await
        .unwrap();

    assert_eq!(result.command, "volup");
    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.success_count, 1);
    let off = result.failures().next().unwrap();
    assert_eq!(off.address, "10.0.0.2");
    assert_eq!(off.message, "Device is off.");
}

#[tokio::test]
async fn test_bulk_without_targets_is_an_error() {
    let h = harness(vec![]);
    let err = h.fleet.execute_bulk(&[], "mute").await.unwrap_err();
    assert!(matches!(err, CoreError::NoTargets));
}

#[tokio::test]
async fn test_bulk_cancelled_before_start() {
    let h = harness(vec![device("10.0.0.1", None, Some("t"))]);
    h.prober.set("10.0.0.1", true);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = h
        .fleet
        .execute_bulk_with(&targets(&["10.0.0.1"]), "mute", &cancel)
        .await
        .unwrap();

    assert_eq!(result.failure_count, 1);
    assert_eq!(result.outcomes[0].message, "Cancelled");
    assert_eq!(h.channel.opens(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_bulk_deadline_fails_slow_device() {
    let config = FleetConfig {
        bulk_deadline: Some(Duration::from_secs(5)),
        ..FleetConfig::default()
    };
    let h = harness_with(
        vec![
            device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None),
            device("10.0.0.2", Some("a4:30:7a:01:bc:f0"), None),
        ],
        config,
        SpyWake::new(),
    );
    h.prober.set("10.0.0.2", true);

    let result = h
        .fleet
        .execute_bulk(&targets(&["10.0.0.1", "10.0.0.2"]), "power-on")
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    let slow = result.failures().next().unwrap();
    assert_eq!(slow.address, "10.0.0.1");
    assert_eq!(slow.message, "Deadline of 5s exceeded");
}

#[tokio::test(start_paused = true)]
async fn test_bulk_subsecond_deadline_rounds_up() {
    let config = FleetConfig {
        bulk_deadline: Some(Duration::from_millis(300)),
        ..FleetConfig::default()
    };
    let h = harness_with(
        vec![device("10.0.0.1", Some("a4:30:7a:01:bc:ef"), None)],
        config,
        SpyWake::new(),
    );

    let result = h
        .fleet
        .execute_bulk(&targets(&["10.0.0.1"]), "power-on")
        .await
        .unwrap();

    assert_eq!(result.outcomes[0].message, "Deadline of 1s exceeded");
}

#[tokio::test]
async fn test_bulk_respects_single_worker_pool() {
    let config = FleetConfig {
        workers: Some(1),
        ..FleetConfig::default()
    };
    let devices: Vec<_> = (1..=5)
        .map(|i| device(&format!("10.0.0.{i}"), None, Some("t")))
        .collect();
    let h = harness_with(devices, config, SpyWake::new());
    for i in 1..=5 {
        h.prober.set(&format!("10.0.0.{i}"), true);
    }

    let addresses: Vec<String> = (1..=5).map(|i| format!("10.0.0.{i}")).collect();
    let result = h.fleet.execute_bulk(&addresses, "enter").await.unwrap();

    assert!(result.all_succeeded());
    assert_eq!(h.channel.log.lock().unwrap().sent.len(), 5);
}

#[tokio::test]
async fn test_directory_upsert_via_fleet_accessor() {
    let h = harness(vec![]);
    h.fleet
        .directory()
        .upsert(
            "10.0.0.7",
            DevicePatch {
                name: Some("Kitchen".into()),
                ..DevicePatch::default()
            },
        )
        .unwrap();
    let outcome = h.fleet.power_off("10.0.0.7").await;
    assert_eq!(outcome.name, "Kitchen");
}
