use anyhow::{bail, Result};
use callprobe::registry::SessionRegistry;
use callprobe::runner::{CallRunner, RunnerSettings};
use callprobe::telephony::CallPlacer;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Stands in for the provider plus the session that would answer the call
struct FakePlacer {
    registry: Arc<SessionRegistry>,
    /// When set, the "session" completes this long after placement
    completes_after: Option<Duration>,
    placed: Mutex<Vec<String>>,
    hung_up: Mutex<Vec<String>>,
}

impl FakePlacer {
    fn new(registry: Arc<SessionRegistry>, completes_after: Option<Duration>) -> Self {
        Self {
            registry,
            completes_after,
            placed: Mutex::new(Vec::new()),
            hung_up: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl CallPlacer for FakePlacer {
    async fn place_call(&self, scenario: &str) -> Result<String> {
        if scenario == "unreachable" {
            bail!("provider rejected the call");
        }

        let call_sid = {
            let mut placed = self.placed.lock().unwrap();
            placed.push(scenario.to_string());
            format!("CA{}", placed.len())
        };

        if let Some(delay) = self.completes_after {
            self.registry.register(&call_sid).await;
            let registry = Arc::clone(&self.registry);
            let sid = call_sid.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                registry.complete(&sid).await;
            });
        }

        Ok(call_sid)
    }

    async fn hang_up(&self, call_sid: &str) -> Result<()> {
        self.hung_up.lock().unwrap().push(call_sid.to_string());
        Ok(())
    }
}

fn runner(completes_after: Option<Duration>) -> (CallRunner, Arc<FakePlacer>, Arc<SessionRegistry>) {
    let registry = Arc::new(SessionRegistry::new());
    let placer = Arc::new(FakePlacer::new(Arc::clone(&registry), completes_after));
    let runner = CallRunner::new(
        placer.clone(),
        Arc::clone(&registry),
        RunnerSettings::default(),
    );
    (runner, placer, registry)
}

#[tokio::test(start_paused = true)]
async fn test_completed_call() {
    let (runner, placer, registry) = runner(Some(Duration::from_secs(30)));
    let started = Instant::now();

    let result = runner.run_scenario("reschedule").await.unwrap();

    assert!(result.completed);
    assert_eq!(result.call_sid, "CA1");
    assert_eq!(result.scenario, "reschedule");
    assert!(started.elapsed() < Duration::from_secs(31));
    assert!(placer.hung_up.lock().unwrap().is_empty());
    assert!(registry.get("CA1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_call_is_hung_up() {
    let (runner, placer, registry) = runner(None);
    let started = Instant::now();

    let result = runner.run_scenario("office_hours").await.unwrap();

    assert!(!result.completed);
    assert_eq!(*placer.hung_up.lock().unwrap(), vec!["CA1".to_string()]);
    assert!(started.elapsed() >= Duration::from_secs(122));
    assert!(registry.get("CA1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_run_all_is_sequential_and_skips_failures() {
    let (runner, placer, _registry) = runner(Some(Duration::from_secs(5)));
    let started = Instant::now();

    let scenarios = vec![
        "simple_scheduling".to_string(),
        "unreachable".to_string(),
        "reschedule".to_string(),
    ];
    let results = runner.run_all(&scenarios).await;

    let completed: Vec<_> = results
        .iter()
        .map(|r| (r.scenario.as_str(), r.call_sid.as_str()))
        .collect();
    assert_eq!(
        completed,
        vec![("simple_scheduling", "CA1"), ("reschedule", "CA2")]
    );
    assert_eq!(placer.placed.lock().unwrap().len(), 2);

    // Two calls of 5s plus two 10s gaps
    assert!(started.elapsed() >= Duration::from_secs(30));
}
