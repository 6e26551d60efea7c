//! Mnemonic tables
//!
//! Long and short mnemonic of every setting, per group.

use super::{Mnemonic, SettingGroup};

const fn m(long: &'static str, short: &'static str) -> Mnemonic {
    Mnemonic::new(long, short)
}

// =============================================================================
// Shared Groups
// =============================================================================

pub static DEVICE_INFO: SettingGroup = SettingGroup {
    key: "info",
    title: "device info",
    prefix: m("", ""),
    channelized: false,
    settings: &[m("*IDN", "*IDN")],
};

pub static NETWORK: SettingGroup = SettingGroup {
    key: "lan",
    title: "network config",
    prefix: m(":SYSTEM:COMMUNICATE:LAN", ":SYST:COMM:LAN"),
    channelized: false,
    settings: &[
        m("MODE", "MOD"),
        m("MAC", "MAC"),
        m("IP", "IP"),
        m("GATEWAY", "GATE"),
        m("SUBNET", "SUB"),
        m("IP:STATIC", "IP:STAT"),
        m("GATEWAY:STATIC", "GATE:STAT"),
        m("SUBNET:STATIC", "SUB:STAT"),
    ],
};

// =============================================================================
// Pulse Generator
// =============================================================================

pub static TRIGGER: SettingGroup = SettingGroup {
    key: "trigger",
    title: "trigger config",
    prefix: m(":TRIGGER", ":TRIG"),
    channelized: false,
    settings: &[
        m("EDGE", "EDGE"),
        m("ARMED", "ARM"),
        m("READY", "READY"),
        m("REARM", "REARM"),
        m("COUNT", "COUN"),
    ],
};

pub static CLOCK: SettingGroup = SettingGroup {
    key: "clock",
    title: "clock config",
    prefix: m(":CLOCK", ":CLOCK"),
    channelized: false,
    settings: &[
        m("SRC", "SRC"),
        m("EDGE", "EDGE"),
        m("FREQUENCY", "FREQ"),
        m("FREQUENCY:MEASURE", "FREQ:MEAS"),
        m("FREQUENCY:INTERNAL", "FREQ:INT"),
        m("FREQUENCY:EXTERNAL", "FREQ:EXT"),
    ],
};

pub static PULSE: SettingGroup = SettingGroup {
    key: "pulse",
    title: "pulse config",
    prefix: m(":PULSE", ":PULS"),
    channelized: true,
    settings: &[
        m("DELAY", "DEL"),
        m("WIDTH", "WID"),
        m("PERIOD", "PER"),
        m("CYCLES", "CYC"),
        m("VALID", "VAL"),
        m("INVERT", "INV"),
    ],
};

// =============================================================================
// Slow Digital I/O
// =============================================================================

pub static DIO: SettingGroup = SettingGroup {
    key: "dio",
    title: "dio config",
    prefix: m(":DIO", ":DIO"),
    channelized: true,
    settings: &[
        m("DIRECTION", "DIR"),
        m("INVERT", "INV"),
        m("INPUT:PULLUP", "IN:PULL"),
        m("INPUT:VALUE", "IN:VAL"),
        m("OUTPUT:VALUE", "OUT:VAL"),
        m("VALUE", "VAL"),
    ],
};

// =============================================================================
// Edge Detector
// =============================================================================

pub static OUTPUT: SettingGroup = SettingGroup {
    key: "output",
    title: "output config",
    prefix: m(":OUTPUT", ":OUT"),
    channelized: false,
    settings: &[
        m("SERIAL:ENABLE", "SER:EN"),
        m("UDP:ENABLE", "UDP:EN"),
        m("UDP:DESTINATION", "UDP:DEST"),
        m("UDP:PORT", "UDP:PORT"),
    ],
};

pub static INPUT: SettingGroup = SettingGroup {
    key: "input",
    title: "input config",
    prefix: m(":INPUT", ":IN"),
    channelized: true,
    settings: &[
        m("MODE", "MOD"),
        m("PULLUP", "PULL"),
        m("INVERT", "INV"),
        m("COUNT", "COUN"),
        m("VALUE", "VAL"),
    ],
};

// =============================================================================
// Actions
// =============================================================================

pub const TRIGGER_CMD: Mnemonic = m("*TRG", "*TRG");
pub const SAVE_CMD: Mnemonic = m("*SAV", "*SAV");
pub const RECALL_CMD: Mnemonic = m("*RCL", "*RCL");
pub const RESET_CMD: Mnemonic = m("*RST", "*RST");
// Same spelling in both forms
pub const REBOOT_CMD: Mnemonic = m(":SYSTEM:REBOOT", ":SYSTEM:REBOOT");

// =============================================================================
// Families
// =============================================================================

pub static PULSEGEN_GROUPS: [&SettingGroup; 5] = [&DEVICE_INFO, &TRIGGER, &CLOCK, &PULSE, &NETWORK];
pub static SLOWDIO_GROUPS: [&SettingGroup; 3] = [&DEVICE_INFO, &DIO, &NETWORK];
pub static DETECTRON_GROUPS: [&SettingGroup; 4] = [&DEVICE_INFO, &OUTPUT, &INPUT, &NETWORK];
