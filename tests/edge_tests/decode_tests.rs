//! Tests for edge decoding
//!
//! These tests verify:
//! - One event per differing bit, none for unchanged bits
//! - Direction follows the current bit
//! - Channel order A..H
//! - Timestamps attach unchanged

use chrono::Local;
use sdi_client::{decode, Channel, Direction, Edge, Snapshot};

// =============================================================================
// Helper Functions
// =============================================================================

fn edge(letter: char, direction: Direction) -> Edge {
    Edge {
        channel: Channel::from_letter(letter).unwrap(),
        direction,
    }
}

fn decode_bytes(previous: u8, current: u8) -> Vec<Edge> {
    decode(Snapshot(previous), Snapshot(current))
}

// =============================================================================
// Example Tests
// =============================================================================

#[test]
fn test_single_rising_edge() {
    assert_eq!(decode_bytes(0x00, 0x01), vec![edge('A', Direction::Rising)]);
}

#[test]
fn test_single_falling_edge() {
    assert_eq!(decode_bytes(0xFF, 0xFE), vec![edge('A', Direction::Falling)]);
}

#[test]
fn test_unchanged_bits_ignored() {
    // bit 2 stays high
    assert_eq!(decode_bytes(0x05, 0x04), vec![edge('A', Direction::Falling)]);
}

#[test]
fn test_empty_pair() {
    assert!(decode_bytes(0x00, 0x00).is_empty());
}

#[test]
fn test_mixed_edges_in_channel_order() {
    // H rises, C falls, A rises
    let edges = decode_bytes(0b0000_0100, 0b1000_0001);
    assert_eq!(
        edges,
        vec![
            edge('A', Direction::Rising),
            edge('C', Direction::Falling),
            edge('H', Direction::Rising),
        ]
    );
}

#[test]
fn test_all_channels_flip() {
    let edges = decode_bytes(0x00, 0xFF);
    let letters: String = edges.iter().map(|e| e.channel.letter()).collect();
    assert_eq!(letters, "ABCDEFGH");
    assert!(edges.iter().all(|e| e.direction == Direction::Rising));
}

// =============================================================================
// Property Tests
// =============================================================================

#[test]
fn test_every_pair_yields_one_event_per_changed_bit() {
    for previous in 0..=u8::MAX {
        for current in 0..=u8::MAX {
            let edges = decode_bytes(previous, current);
            let changed = previous ^ current;

            assert_eq!(edges.len(), changed.count_ones() as usize);
            for e in &edges {
                let bit = 1u8 << e.channel.index();
                assert_ne!(changed & bit, 0, "event for unchanged bit");
                let expected = if current & bit != 0 {
                    Direction::Rising
                } else {
                    Direction::Falling
                };
                assert_eq!(e.direction, expected);
            }
            assert!(edges.windows(2).all(|w| w[0].channel < w[1].channel));
        }
    }
}

#[test]
fn test_identical_snapshots_are_idempotent() {
    for x in 0..=u8::MAX {
        assert!(decode_bytes(x, x).is_empty());
        assert!(decode_bytes(x, x).is_empty());
    }
}

// =============================================================================
// Event Tests
// =============================================================================

#[test]
fn test_edge_event_keeps_timestamp() {
    let now = Local::now();
    let event = edge('D', Direction::Falling).at(now);
    assert_eq!(event.channel.letter(), 'D');
    assert_eq!(event.direction, Direction::Falling);
    assert_eq!(event.timestamp, now);
}

#[test]
fn test_edge_event_serializes_letter_and_direction() {
    let event = edge('B', Direction::Rising).at(Local::now());
    let json = serde_json::to_value(event).unwrap();
    assert_eq!(json["channel"], "B");
    assert_eq!(json["direction"], "RISING");
}
