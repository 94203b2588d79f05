//! Feeds and the full pipeline against local JSON-RPC nodes

use crate::common::{spawn_http_node, spawn_ws_node, Recorder};
use block_race::authority::{HttpTimeAuthority, TimeAuthority};
use block_race::contestant::Roster;
use block_race::feed::{BlockFeed, NewHeadsFeed};
use block_race::monitor::Monitor;
use block_race::race::SettlementEngine;
use block_race::ws::WsConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::test]
async fn test_new_heads_feed_delivers_blocks() {
    let url = spawn_ws_node(vec![100, 101, 102]).await;
    let roster = Roster::new(["Local"]).unwrap();
    let id = roster.id("Local").unwrap();

    let feed = NewHeadsFeed::new(id, "Local", WsConfig::new(url));
    assert_eq!(feed.contestant(), id);
    let mut notices = feed.subscribe().await.unwrap();

    let mut blocks = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while blocks.len() < 3 {
            let notice = notices.recv().await.unwrap();
            assert_eq!(notice.contestant, id);
            blocks.push(notice.block);
        }
    })
    .await
    .expect("Test timed out");

    assert_eq!(blocks, vec![100, 101, 102]);
}

#[tokio::test]
async fn test_http_authority_against_local_node() {
    let url = spawn_http_node(1_700_000_000).await;
    let authority = HttpTimeAuthority::new(url, Duration::from_secs(5)).unwrap();

    assert_eq!(authority.block_timestamp(1).await.unwrap(), 1_700_000_000);
    // A fresh connection per request still works
    assert_eq!(authority.block_timestamp(2).await.unwrap(), 1_700_000_000);
}

#[tokio::test]
async fn test_race_between_local_nodes() {
    let fast = spawn_ws_node(vec![10, 11]).await;
    let slow = spawn_ws_node(vec![10, 11]).await;
    let http = spawn_http_node(0).await;

    let roster = Roster::new(["Fast", "Slow"]).unwrap();
    let feeds: Vec<Box<dyn BlockFeed>> = vec![
        Box::new(NewHeadsFeed::new(
            roster.id("Fast").unwrap(),
            "Fast",
            WsConfig::new(fast),
        )),
        Box::new(NewHeadsFeed::new(
            roster.id("Slow").unwrap(),
            "Slow",
            WsConfig::new(slow),
        )),
    ];

    let recorder = Arc::new(Recorder::default());
    let engine = Arc::new(SettlementEngine::new(
        roster,
        Arc::new(HttpTimeAuthority::new(http, Duration::from_secs(5)).unwrap()),
        recorder.clone(),
        10,
    ));
    let monitor = Monitor::new(Arc::clone(&engine), feeds, recorder.clone());

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(monitor.run_until(async {
        let _ = stop_rx.await;
    }));

    tokio::time::timeout(Duration::from_secs(10), async {
        while engine.snapshot().block_count < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("both blocks should settle");

    stop_tx.send(()).unwrap();
    let snapshot = run.await.unwrap().unwrap();

    assert_eq!(snapshot.block_count, 2);
    let wins: u64 = snapshot.contestants.iter().map(|c| c.wins).sum();
    assert_eq!(wins, 2);

    let blocks = recorder.blocks.lock();
    let mut settled: Vec<_> = blocks.iter().map(|b| b.block).collect();
    settled.sort_unstable();
    assert_eq!(settled, vec![10, 11]);
    assert!(blocks.iter().all(|b| b.trailing[0].lag_ms >= 0));
    // Block timestamp 0 puts the lag at the wall-clock arrival time
    assert!(blocks.iter().all(|b| b.timestamp_lag_ms == b.winning_time_ms));
}
