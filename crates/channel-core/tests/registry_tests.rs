//! Registry and uniqueness index behaviour

mod common;

use std::collections::HashSet;
use std::net::Ipv4Addr;

use chancfg_channel_core::error::MapError;
use chancfg_channel_core::map::{feedback_keys, primary_keys};
use chancfg_channel_core::{ChannelRegistry, RegistryConfig, RegistryError, SessionIdentity};
use common::{simple, FEC, LOOKASIDE, SOURCE};
use proptest::prelude::*;

#[test]
fn test_re_adding_a_session_reports_already_exists() {
    let mut registry = ChannelRegistry::default();
    let handle = registry.add_text(SOURCE).unwrap();
    assert!(registry.get(handle).unwrap().active);

    let err = registry.add_text(SOURCE).unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(_)));
    assert!(err.to_string().contains("already exists"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_map_conflict_leaves_no_trace() {
    let mut registry = ChannelRegistry::default();
    registry.add_text(&simple(1, 1, "224.1.1.1", 50000)).unwrap();

    // Different key, same primary group and port
    let err = registry.add_text(&simple(2, 1, "224.1.1.1", 50000)).unwrap_err();
    assert_eq!(
        err,
        RegistryError::map_conflict(
            "- 2 IN IP4 10.1.1.1",
            MapError::Duplicate {
                addr: Ipv4Addr::new(224, 1, 1, 1),
                port: 50000
            }
        )
    );

    // A third channel on the neighbouring ports still fits
    let third = registry.add_text(&simple(3, 1, "224.1.1.1", 50002)).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.lookup_primary(Ipv4Addr::new(224, 1, 1, 1), 50003),
        Some(third)
    );
}

#[test]
fn test_partial_index_insert_rolls_back() {
    let mut registry = ChannelRegistry::default();
    // Claims 224.1.1.1:50003 as its RTCP port
    registry.add_text(&simple(1, 1, "224.1.1.1", 50002)).unwrap();

    // The primary RTP port 50000 goes in before RTCP 50003 collides
    let text = simple(2, 1, "224.1.1.1", 50000).replace(
        "a=recvonly\n",
        "a=recvonly\na=rtcp:50003\n",
    );
    assert!(registry.add_text(&text).is_err());
    assert_eq!(registry.lookup_primary(Ipv4Addr::new(224, 1, 1, 1), 50000), None);

    registry.add_text(&simple(3, 1, "224.1.1.1", 50000)).unwrap();
}

#[test]
fn test_feedback_map_conflict() {
    let mut registry = ChannelRegistry::default();
    registry.add_text(LOOKASIDE).unwrap();

    // New primary group, same retransmission endpoint
    let other = LOOKASIDE
        .replace("o=- 1001", "o=- 1002")
        .replace("224.1.1.1", "224.1.1.2");
    let err = registry.add_text(&other).unwrap_err();
    assert!(matches!(err, RegistryError::MapConflict { .. }));
    assert_eq!(registry.lookup_primary(Ipv4Addr::new(224, 1, 1, 2), 50000), None);
}

#[test]
fn test_fec_ports_are_indexed() {
    let mut registry = ChannelRegistry::default();
    let handle = registry.add_text(FEC).unwrap();
    assert_eq!(registry.lookup_primary(Ipv4Addr::new(224, 1, 1, 1), 50005), Some(handle));

    let err = registry.add_text(&simple(9, 1, "224.1.1.1", 50004)).unwrap_err();
    assert!(matches!(err, RegistryError::MapConflict { .. }));
}

#[test]
fn test_lookup_by_identity_ignores_version() {
    let mut registry = ChannelRegistry::default();
    let handle = registry.add_text(LOOKASIDE).unwrap();

    let identity: SessionIdentity = "o=- 1001 99 IN IP4 10.1.1.1".parse().unwrap();
    assert_eq!(registry.find_by_identity(&identity), Some(handle));

    let identity: SessionIdentity = "- 1001 7 IN IP4 10.1.1.2".parse().unwrap();
    assert_eq!(registry.find_by_identity(&identity), None);

    assert_eq!(
        registry.lookup_feedback(Ipv4Addr::new(10, 1, 1, 1), 50001),
        Some(handle)
    );
    assert_eq!(
        registry.lookup_feedback(Ipv4Addr::new(10, 1, 1, 1), 50002),
        Some(handle)
    );
}

#[test]
fn test_deleted_handles_stay_dead() {
    let mut registry = ChannelRegistry::default();
    let first = registry.add_text(&simple(1, 1, "224.1.1.1", 50000)).unwrap();
    registry.add_text(&simple(2, 1, "224.1.1.2", 50000)).unwrap();

    registry.delete(first, true).unwrap();
    assert!(registry.get(first).is_none());
    assert!(matches!(
        registry.delete(first, true),
        Err(RegistryError::UnknownHandle(_))
    ));

    let reused = registry.add_text(&simple(3, 1, "224.1.1.3", 50000)).unwrap();
    assert_eq!(reused.index(), first.index());
    assert!(registry.get(first).is_none());
    assert_eq!(registry.get(reused).unwrap().name, "Channel 3");
    assert_eq!(registry.handles().next(), Some(reused));
}

#[test]
fn test_configured_capacity() {
    let mut registry = ChannelRegistry::new(&RegistryConfig::default().with_max_channels(2));
    registry.add_text(&simple(1, 1, "224.1.1.1", 50000)).unwrap();
    registry.add_text(&simple(2, 1, "224.1.1.2", 50000)).unwrap();
    let err = registry.add_text(&simple(3, 1, "224.1.1.3", 50000)).unwrap_err();
    assert_eq!(err, RegistryError::CapacityExceeded(2));
    assert_eq!(registry.counters().registry_conflicts, 1);
}

proptest! {
    #[test]
    fn prop_resident_channels_never_share_keys(
        offers in prop::collection::vec((0u8..4, 0u16..6), 1..24)
    ) {
        let mut registry = ChannelRegistry::default();
        for (id, (group, slot)) in offers.iter().enumerate() {
            let addr = format!("224.1.1.{}", group);
            let _ = registry.add_text(&simple(id as u32, 1, &addr, 50000 + slot));
        }

        let mut primary = HashSet::new();
        let mut feedback = HashSet::new();
        for (handle, channel) in registry.channels() {
            for key in primary_keys(channel) {
                prop_assert!(primary.insert(key));
                prop_assert_eq!(registry.lookup_primary(key.0, key.1), Some(handle));
            }
            for key in feedback_keys(channel) {
                prop_assert!(feedback.insert(key));
            }
        }
    }
}
