//! Edge decoding
//!
//! Compares two 8-bit channel snapshots and reports which channels changed.
//! Bit 0 is channel `A`, bit 7 is channel `H`.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

/// Number of channels carried by one snapshot
pub const CHANNEL_COUNT: u8 = 8;

/// Instantaneous digital state of up to 8 channels, one bit each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Snapshot(pub u8);

impl Snapshot {
    /// State of one channel
    pub fn level(self, channel: Channel) -> bool {
        (self.0 >> channel.index()) & 0x1 == 1
    }
}

impl From<u8> for Snapshot {
    fn from(bits: u8) -> Self {
        Snapshot(bits)
    }
}

impl fmt::LowerHex for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A channel position, `A` through `H`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Channel for a bit position, `None` past bit 7
    pub fn new(index: u8) -> Option<Self> {
        (index < CHANNEL_COUNT).then_some(Channel(index))
    }

    /// Channel for a letter `A`..`H` (case-insensitive)
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if ('A'..='H').contains(&upper) {
            Some(Channel(upper as u8 - b'A'))
        } else {
            None
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    /// All channels in bit order
    pub fn all() -> impl Iterator<Item = Channel> {
        (0..CHANNEL_COUNT).map(Channel)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.letter())
    }
}

/// Transition direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Rising,
    Falling,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rising => write!(f, "RISING"),
            Direction::Falling => write!(f, "FALLING"),
        }
    }
}

/// One channel's transition between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub channel: Channel,
    pub direction: Direction,
}

impl Edge {
    /// Attach the capture timestamp
    pub fn at(self, timestamp: DateTime<Local>) -> EdgeEvent {
        EdgeEvent {
            channel: self.channel,
            direction: self.direction,
            timestamp,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.channel, self.direction)
    }
}

/// An edge stamped with the time its frame was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeEvent {
    pub channel: Channel,
    pub direction: Direction,
    pub timestamp: DateTime<Local>,
}

/// Decode the transitions between two snapshots
///
/// Events come out in bit order, `A` first. Unchanged bits produce nothing,
/// so `decode(x, x)` is always empty.
pub fn decode(previous: Snapshot, current: Snapshot) -> Vec<Edge> {
    let changed = previous.0 ^ current.0;
    if changed == 0 {
        return Vec::new();
    }

    Channel::all()
        .filter(|channel| (changed >> channel.index()) & 0x1 == 1)
        .map(|channel| Edge {
            channel,
            direction: if current.level(channel) {
                Direction::Rising
            } else {
                Direction::Falling
            },
        })
        .collect()
}
