//! Monitor runs over scripted feeds

use crate::common::{Recorder, ScriptedFeed, TableAuthority};
use block_race::contestant::Roster;
use block_race::feed::BlockFeed;
use block_race::monitor::Monitor;
use block_race::race::SettlementEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

fn monitor(
    names: &[&str],
    scripts: Vec<Vec<(u64, i64)>>,
    timestamps: &[(u64, u64)],
    period: u64,
    hold_open: bool,
) -> (Monitor, Arc<Recorder>) {
    let roster = Roster::new(names.iter().copied()).unwrap();
    let feeds: Vec<Box<dyn BlockFeed>> = roster
        .ids()
        .zip(scripts)
        .map(|(contestant, script)| {
            Box::new(ScriptedFeed {
                contestant,
                script,
                hold_open,
            }) as Box<dyn BlockFeed>
        })
        .collect();

    let recorder = Arc::new(Recorder::default());
    let engine = SettlementEngine::new(
        roster,
        Arc::new(TableAuthority::new(timestamps)),
        recorder.clone(),
        period,
    );
    let monitor = Monitor::new(Arc::new(engine), feeds, recorder.clone());
    (monitor, recorder)
}

#[tokio::test]
async fn test_two_contestant_race() {
    let (monitor, recorder) = monitor(
        &["X", "Y"],
        vec![vec![(1, 1000)], vec![(1, 1050)]],
        &[(1, 1)],
        10,
        false,
    );

    let snapshot = monitor
        .run_until(std::future::pending())
        .await
        .unwrap();

    assert_eq!(snapshot.block_count, 1);
    assert_eq!(snapshot.contestants[0].name, "X");
    assert_eq!(snapshot.contestants[0].wins, 1);
    assert_eq!(snapshot.contestants[0].average_lag_ms, 0.0);
    assert_eq!(snapshot.contestants[1].wins, 0);
    assert_eq!(snapshot.contestants[1].average_lag_ms, 50.0);
    assert_eq!(snapshot.average_timestamp_lag_ms, 0.0);

    let blocks = recorder.blocks.lock();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].winner_name, "X");
    assert_eq!(blocks[0].trailing[0].lag_ms, 50);

    // Final snapshot is reported on the way out
    assert_eq!(recorder.snapshots.lock().last(), Some(&snapshot));
}

#[tokio::test]
async fn test_periodic_and_final_snapshots() {
    let a: Vec<_> = (1..=5).map(|b| (b, b as i64 * 1000)).collect();
    let b: Vec<_> = (1..=5).map(|b| (b, b as i64 * 1000 + 20)).collect();
    let timestamps: Vec<_> = (1..=5).map(|b| (b, b)).collect();
    let (monitor, recorder) = monitor(&["A", "B"], vec![a, b], &timestamps, 2, false);

    let snapshot = monitor
        .run_until(std::future::pending())
        .await
        .unwrap();

    assert_eq!(snapshot.block_count, 5);
    assert_eq!(snapshot.contestants[0].wins, 5);
    assert_eq!(snapshot.contestants[1].average_lag_ms, 20.0);

    let counts: Vec<_> = recorder
        .snapshots
        .lock()
        .iter()
        .map(|s| s.block_count)
        .collect();
    assert_eq!(counts, vec![2, 4, 5]);
}

#[tokio::test]
async fn test_unannounced_block_never_settles() {
    let (monitor, recorder) = monitor(
        &["A", "B"],
        vec![vec![(1, 100), (2, 200)], vec![(2, 210)]],
        &[(1, 0), (2, 0)],
        10,
        false,
    );
    let engine = Arc::clone(monitor.engine());

    let snapshot = monitor
        .run_until(std::future::pending())
        .await
        .unwrap();

    assert_eq!(snapshot.block_count, 1);
    assert_eq!(recorder.blocks.lock()[0].block, 2);
    assert_eq!(engine.pending_blocks(), 1);
    let a = engine.roster().id("A").unwrap();
    assert_eq!(engine.arrival(a, 1), Some(100));
}

#[tokio::test]
async fn test_missing_timestamp_drops_block() {
    let (monitor, recorder) = monitor(
        &["A", "B"],
        vec![vec![(1, 100), (2, 200)], vec![(1, 150), (2, 230)]],
        &[(2, 0)],
        10,
        false,
    );
    let engine = Arc::clone(monitor.engine());

    let snapshot = monitor
        .run_until(std::future::pending())
        .await
        .unwrap();

    assert_eq!(snapshot.block_count, 1);
    assert_eq!(recorder.blocks.lock().len(), 1);
    assert_eq!(engine.pending_blocks(), 0);
}

#[tokio::test]
async fn test_shutdown_stops_open_feeds() {
    let (monitor, recorder) = monitor(
        &["A", "B", "C"],
        vec![vec![(7, 10)], vec![(7, 30)], vec![(7, 5)]],
        &[(7, 0)],
        10,
        true,
    );
    let engine = Arc::clone(monitor.engine());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let run = tokio::spawn(monitor.run_until(async {
        let _ = stop_rx.await;
    }));

    tokio::time::timeout(Duration::from_secs(5), async {
        while engine.snapshot().block_count < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("block 7 should settle");

    stop_tx.send(()).unwrap();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("monitor should stop")
        .unwrap()
        .unwrap();

    assert_eq!(snapshot.block_count, 1);
    let blocks = recorder.blocks.lock();
    assert_eq!(blocks[0].winner_name, "C");
    let lags: Vec<_> = blocks[0]
        .trailing
        .iter()
        .map(|l| (l.name.as_str(), l.lag_ms))
        .collect();
    assert_eq!(lags, vec![("A", 5), ("B", 25)]);
}
