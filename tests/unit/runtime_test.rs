//! Tests for the status surface and the tokio activity bridge

use std::sync::Arc;
use std::time::Duration;

use corescale::config::Tunables;
use corescale::core::{ActivityEvent, ActivityNotifier, Controller, CoordinatorState, CpuPool};
use corescale::infra::{ChannelNotifier, SimulatedPool};
use corescale::runtime::{list_params, status, update_param, TokioActivityBridge};

fn controller(
    notifier: Arc<ChannelNotifier>,
) -> (Controller<Arc<SimulatedPool>, Arc<SimulatedPool>, Arc<ChannelNotifier>>, Arc<SimulatedPool>) {
    let pool = Arc::new(SimulatedPool::new(4, 1_000));
    pool.set_all_rates(500);
    let controller = Controller::new(
        Arc::clone(&pool),
        Arc::clone(&pool),
        notifier,
        Arc::new(Tunables::with_defaults(4)),
        Duration::from_secs(3_600),
    )
    .unwrap();
    (controller, pool)
}

#[test]
fn test_status_serializes() {
    let (controller, _pool) = controller(Arc::new(ChannelNotifier::new()));
    let snapshot = status(&controller);
    assert!(!snapshot.enabled);
    assert_eq!(snapshot.state, CoordinatorState::Running);
    assert_eq!(snapshot.active_units, vec![0, 1, 2, 3]);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["state"], "running");
    assert_eq!(json["tunables"]["max_active_units"], 4);
    assert_eq!(json["stats"]["cycles"], 0);
}

#[test]
fn test_update_param_round_trips_value() {
    let (controller, _pool) = controller(Arc::new(ChannelNotifier::new()));
    let entry = update_param(&controller, "scale_down_percent", "35").unwrap();
    assert_eq!(entry.value, 35);
    assert!(update_param(&controller, "scale_down_percent", "0").is_err());

    let listed = list_params(&controller);
    assert_eq!(listed[0].name, "enabled");
    assert!(listed.iter().any(|p| p.name == "scale_down_percent" && p.value == 35));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_bridge_forwards_changes() {
    let notifier = Arc::new(ChannelNotifier::new());
    let (controller, pool) = controller(Arc::clone(&notifier));
    controller.enable().unwrap();

    let (tx, rx) = tokio::sync::watch::channel(ActivityEvent::Active);
    let bridge = TokioActivityBridge::current();
    let task = bridge.forward(rx, Arc::clone(&notifier));

    tx.send(ActivityEvent::Suspended).unwrap();
    tokio::time::timeout(Duration::from_secs(10), async {
        while controller.state() != CoordinatorState::Collapsed {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(pool.active_units(), vec![0]);

    drop(tx);
    task.await.unwrap();
    controller.disable().unwrap();
    assert_eq!(pool.active_count(), 4);
}

#[tokio::test]
async fn test_tokio_bridge_delivers_change_sent_before_task_runs() {
    let notifier = Arc::new(ChannelNotifier::new());
    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    notifier.register(events_tx).unwrap();

    let (tx, rx) = tokio::sync::watch::channel(ActivityEvent::Active);
    let task = TokioActivityBridge::current().forward(rx, Arc::clone(&notifier));
    // Single-threaded runtime: the bridge task has not been polled yet.
    tx.send(ActivityEvent::Suspended).unwrap();

    let first = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(event) = events_rx.try_recv() {
                return event;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(first, ActivityEvent::Suspended);

    drop(tx);
    task.await.unwrap();
    assert!(events_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_tokio_bridge_skips_value_present_at_start() {
    let notifier = Arc::new(ChannelNotifier::new());
    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    notifier.register(events_tx).unwrap();

    let (tx, rx) = tokio::sync::watch::channel(ActivityEvent::Suspended);
    let task = TokioActivityBridge::current().forward(rx, Arc::clone(&notifier));
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(tx);
    task.await.unwrap();
    assert!(events_rx.try_recv().is_err());
}
