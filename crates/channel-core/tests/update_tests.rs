//! Update protocol: staging, version checks and atomic commit

mod common;

use std::net::Ipv4Addr;

use chancfg_channel_core::{
    ChannelManager, ChannelRegistry, UpdateCoordinator, UpdateError, UpdateState,
};
use common::{document, simple, FEC, LOOKASIDE, SOURCE};

const GROUP: Ipv4Addr = Ipv4Addr::new(224, 1, 1, 1);

fn manager_with(doc: &str) -> ChannelManager {
    let manager = ChannelManager::default();
    manager.apply_document(doc).unwrap();
    manager
}

#[test]
fn test_initial_load() {
    let manager = ChannelManager::default();
    let doc = document(&[
        LOOKASIDE.to_string(),
        simple(1, 1, "224.1.1.2", 50000),
        simple(2, 1, "224.1.1.3", 50000),
    ]);
    let report = manager.apply_document(&doc).unwrap();
    assert_eq!(report.sessions, 3);
    assert_eq!(report.validated, 3);
    assert_eq!(report.added, 3);
    assert!(report.is_clean());

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.counters().sessions_seen, 3);
    assert!(snapshot.last_refresh().is_some());
}

#[test]
fn test_stale_version_is_rejected() {
    let manager = manager_with(LOOKASIDE);
    let older = LOOKASIDE.replace("o=- 1001 7 ", "o=- 1001 6 ");

    let err = manager.apply_document(&older).unwrap_err();
    let report = err.report().unwrap();
    assert_eq!(report.stale, 1);
    assert_eq!(report.conflicting, 0);

    let (_, channel) = manager.lookup_primary(GROUP, 50000).unwrap();
    assert_eq!(channel.version, 7);
}

#[test]
fn test_same_version_same_content_is_a_no_op() {
    let manager = manager_with(LOOKASIDE);
    let before = manager.lookup_primary(GROUP, 50000).unwrap().1;

    // Formatting differences only
    let again = LOOKASIDE.replace('\n', "\r\n");
    let report = manager.apply_document(&again).unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.updated, 0);

    let after = manager.lookup_primary(GROUP, 50000).unwrap().1;
    assert!(before.same_content(&after));
}

#[test]
fn test_same_version_different_content_is_rejected() {
    let manager = manager_with(LOOKASIDE);
    let changed = LOOKASIDE.replace("rtx-time=2500", "rtx-time=4000");

    let err = manager.apply_document(&changed).unwrap_err();
    assert!(matches!(err, UpdateError::Rejected(_)));
    assert_eq!(err.report().unwrap().conflicting, 1);

    let (_, channel) = manager.lookup_primary(GROUP, 50000).unwrap();
    assert_eq!(channel.rtx.unwrap().rtx_time_ms, 2500);
}

#[test]
fn test_newer_version_replaces_channel() {
    let manager = manager_with(LOOKASIDE);
    let newer = LOOKASIDE
        .replace("o=- 1001 7 ", "o=- 1001 8 ")
        .replace("rtx-time=2500", "rtx-time=4000");

    let report = manager.apply_document(&newer).unwrap();
    assert_eq!(report.updated, 1);
    let (_, channel) = manager.lookup_primary(GROUP, 50000).unwrap();
    assert_eq!(channel.version, 8);
    assert_eq!(channel.rtx.unwrap().rtx_time_ms, 4000);
}

#[test]
fn test_one_bad_session_leaves_live_untouched() {
    let manager = manager_with(&document(&[LOOKASIDE.to_string(), FEC.replace("224.1.1.1", "224.1.9.1")]));
    let before = manager.snapshot();
    let handles: Vec<_> = before.handles().collect();

    let doc = document(&[
        LOOKASIDE.replace("o=- 1001 7 ", "o=- 1001 8 "),
        SOURCE.replace("a=group:FID 2 3\n", ""),
    ]);
    let err = manager.apply_document(&doc).unwrap_err();
    let report = err.report().unwrap();
    assert_eq!(report.validation_errors, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].key.as_deref(), Some("- 2001 IN IP4 10.1.1.1"));

    let after = manager.snapshot();
    assert_eq!(after.handles().collect::<Vec<_>>(), handles);
    for handle in handles {
        assert!(manager.channel(handle).is_some());
    }
    assert_eq!(manager.lookup_primary(GROUP, 50000).unwrap().1.version, 7);
}

#[test]
fn test_duplicate_primary_in_document_fails_update() {
    let manager = ChannelManager::default();
    let doc = document(&[
        simple(1, 1, "224.1.1.1", 50000),
        simple(2, 1, "224.1.1.1", 50000),
    ]);
    let err = manager.apply_document(&doc).unwrap_err();
    assert_eq!(err.report().unwrap().failures.len(), 1);
    assert!(manager.snapshot().is_empty());
}

#[test]
fn test_removed_channels_are_counted() {
    let manager = manager_with(&document(&[
        simple(1, 1, "224.1.1.1", 50000),
        simple(2, 1, "224.1.1.2", 50000),
    ]));
    let report = manager.apply_document(&simple(1, 1, "224.1.1.1", 50000)).unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(manager.snapshot().len(), 1);
}

#[test]
fn test_coordinator_commits_once() {
    let live = ChannelRegistry::default();
    let mut coordinator = UpdateCoordinator::new();
    coordinator.stage(&live, &simple(1, 1, "224.1.1.1", 50000)).unwrap();
    coordinator.validate(&live).unwrap();
    assert_eq!(coordinator.state(), UpdateState::Validating);
    assert!(coordinator.shadow().is_some());
    coordinator.commit(&live).unwrap();

    let err = coordinator.commit(&live).unwrap_err();
    assert!(matches!(
        err,
        UpdateError::InvalidState { operation: "commit", state: UpdateState::Committed }
    ));
}

#[test]
fn test_fec_destination_is_not_a_primary_match() {
    let manager = manager_with(&FEC.replace("o=- 3001 1 ", "o=- 3001 9 "));
    let (fec_handle, _) = manager.lookup_primary(GROUP, 50002).unwrap();

    // New channel whose primary reuses the old FEC1 destination
    let report = manager.apply_document(&simple(7, 1, "224.1.1.1", 50002)).unwrap();
    assert_eq!(report.stale, 0);
    assert_eq!(report.added, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(report.removed, 1);

    let (handle, channel) = manager.lookup_primary(GROUP, 50002).unwrap();
    assert_ne!(handle, fec_handle);
    assert_eq!(channel.key.session_id, "7");
    assert_eq!(channel.version, 1);
}
