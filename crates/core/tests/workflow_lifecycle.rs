//! End-to-end pipeline tests with mock providers and the background runner.

use std::sync::Arc;
use std::time::Duration;

use leadflow_core::testing::{MockEntryProvider, MockVoiceProvider};
use leadflow_core::{
    ActionOutcome, ActivityTracker, AgentRole, AgentRunner, Coordinator, LeadStatus, LeadStore,
    NewLead, OutreachCoordinator, RetryPolicy, SqliteLeadStore, SubmissionCoordinator,
    WorkScheduler, WorkflowConfig,
};

struct Fixture {
    store: Arc<SqliteLeadStore>,
    voice: Arc<MockVoiceProvider>,
    entry: Arc<MockEntryProvider>,
    activity: ActivityTracker,
    runner: AgentRunner,
}

fn fixture(config: WorkflowConfig) -> Fixture {
    let store = Arc::new(SqliteLeadStore::in_memory().unwrap());
    let voice = Arc::new(MockVoiceProvider::new());
    let entry = Arc::new(MockEntryProvider::new());
    let activity = ActivityTracker::new();
    let policy = RetryPolicy::new(&config);

    let store_dyn: Arc<dyn LeadStore> = store.clone();
    let coordinators: Vec<Arc<dyn Coordinator>> = vec![
        Arc::new(OutreachCoordinator::new(
            store_dyn.clone(),
            voice.clone(),
            policy.clone(),
            activity.clone(),
        )),
        Arc::new(SubmissionCoordinator::new(
            store_dyn.clone(),
            entry.clone(),
            policy,
            activity.clone(),
        )),
    ];
    let scheduler = Arc::new(WorkScheduler::new(store_dyn, config.clone()));
    let runner = AgentRunner::new(scheduler, coordinators, config);

    Fixture {
        store,
        voice,
        entry,
        activity,
        runner,
    }
}

fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        enabled: true,
        poll_interval_secs: 1,
        retry_backoff_secs: 0,
        ..WorkflowConfig::default()
    }
}

fn sample_lead() -> NewLead {
    NewLead {
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        phone: "555-123-4567".to_string(),
        email: "john@example.com".to_string(),
        address: None,
        city: None,
        state: None,
        zip_code: None,
        notes: None,
    }
}

/// Poll the store until the lead reaches `status` or the timeout lapses.
async fn wait_for_status(store: &SqliteLeadStore, id: &str, status: LeadStatus) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    loop {
        let lead = store.get(id).unwrap().unwrap();
        if lead.status == status {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "lead {} never reached {}, stuck at {}",
                id, status, lead.status
            );
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn lead_travels_the_whole_pipeline() {
    let fx = fixture(fast_config());
    let lead = fx.store.create(sample_lead()).unwrap();

    fx.runner.start();
    wait_for_status(&fx.store, &lead.id, LeadStatus::Entered).await;
    fx.runner.stop();

    let done = fx.store.get(&lead.id).unwrap().unwrap();
    assert!(done.claim.is_none());
    assert_eq!(done.recording_reference.as_deref(), Some("mock-recording"));
    assert_eq!(done.call_attempts, 0);
    assert_eq!(done.entry_attempts, 0);

    assert_eq!(fx.voice.recorded_calls().await, vec![lead.id.clone()]);
    assert_eq!(fx.entry.recorded_submissions().await, vec![lead.id]);

    assert!(fx.activity.last_activity(AgentRole::Voice).is_some());
    assert!(fx.activity.last_activity(AgentRole::Entry).is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn declined_lead_stops_at_not_interested() {
    let fx = fixture(fast_config());
    fx.voice.set_outcome(ActionOutcome::Declined).await;
    let lead = fx.store.create(sample_lead()).unwrap();

    fx.runner.start();
    wait_for_status(&fx.store, &lead.id, LeadStatus::NotInterested).await;

    // Give the entry loop a chance to (wrongly) pick it up
    tokio::time::sleep(Duration::from_secs(2)).await;
    fx.runner.stop();

    assert_eq!(fx.entry.submission_count().await, 0);
    let done = fx.store.get(&lead.id).unwrap().unwrap();
    assert_eq!(done.status, LeadStatus::NotInterested);
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_call_failure_is_retried_to_success() {
    let fx = fixture(fast_config());
    fx.voice
        .queue_outcome(ActionOutcome::TransientFailure("no answer".to_string()))
        .await;
    let lead = fx.store.create(sample_lead()).unwrap();

    fx.runner.start();
    wait_for_status(&fx.store, &lead.id, LeadStatus::Entered).await;
    fx.runner.stop();

    let done = fx.store.get(&lead.id).unwrap().unwrap();
    assert_eq!(done.call_attempts, 1);
    assert_eq!(fx.voice.call_count().await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_retries_leave_lead_in_call_failed() {
    let config = WorkflowConfig {
        max_voice_attempts: 2,
        ..fast_config()
    };
    let fx = fixture(config);
    fx.voice
        .set_outcome(ActionOutcome::TransientFailure("no answer".to_string()))
        .await;
    let lead = fx.store.create(sample_lead()).unwrap();

    fx.runner.start();

    // Wait until both attempts are burned
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    loop {
        let current = fx.store.get(&lead.id).unwrap().unwrap();
        if current.call_attempts == 2 && current.status == LeadStatus::CallFailed {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "lead never exhausted its attempts"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // No further calls happen once the limit is reached
    tokio::time::sleep(Duration::from_secs(3)).await;
    fx.runner.stop();

    assert_eq!(fx.voice.call_count().await, 2);
    let done = fx.store.get(&lead.id).unwrap().unwrap();
    assert_eq!(done.status, LeadStatus::CallFailed);
    assert!(done.retry_after.is_none());
    assert_eq!(done.last_error.as_deref(), Some("no answer"));
}

#[tokio::test(flavor = "multi_thread")]
async fn stopped_runner_leaves_work_untouched() {
    let fx = fixture(fast_config());
    fx.runner.start();
    fx.runner.stop();

    let lead = fx.store.create(sample_lead()).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(fx.voice.call_count().await, 0);
    let untouched = fx.store.get(&lead.id).unwrap().unwrap();
    assert_eq!(untouched.status, LeadStatus::Pending);
}
