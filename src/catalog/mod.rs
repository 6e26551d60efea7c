//! Catalog Module
//!
//! Maps logical settings to instrument command mnemonics.
//!
//! ## Layout
//! - `tables`: static long/short mnemonic tables, one per setting group
//! - `instrument`: get/set/dump/actions on top of any `Query` implementor
//!
//! Each family is a different set of groups. The mnemonic form (long or
//! short) is picked once when the `Catalog` is built.

mod instrument;
mod tables;

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SdiError};

pub use instrument::{DumpLine, DumpSection, Instrument, PulseSettings};

/// Which spelling of a mnemonic to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MnemonicForm {
    /// `:SYSTEM:COMMUNICATE:LAN:MODE`
    #[default]
    Long,

    /// `:SYST:COMM:LAN:MOD`
    Short,
}

/// A mnemonic in both spellings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mnemonic {
    pub long: &'static str,
    pub short: &'static str,
}

impl Mnemonic {
    pub const fn new(long: &'static str, short: &'static str) -> Self {
        Self { long, short }
    }

    pub fn get(&self, form: MnemonicForm) -> &'static str {
        match form {
            MnemonicForm::Long => self.long,
            MnemonicForm::Short => self.short,
        }
    }

    /// Case-insensitive match against either spelling
    pub fn matches(&self, name: &str) -> bool {
        self.long.eq_ignore_ascii_case(name) || self.short.eq_ignore_ascii_case(name)
    }
}

/// Related settings under one command prefix
#[derive(Debug)]
pub struct SettingGroup {
    /// Lookup name, e.g. `pulse`
    pub key: &'static str,

    /// Dump section title
    pub title: &'static str,

    /// Command prefix; empty for common commands like `*IDN`
    pub prefix: Mnemonic,

    /// Whether the prefix takes a 1-based channel number
    pub channelized: bool,

    pub settings: &'static [Mnemonic],
}

impl SettingGroup {
    /// Find a setting by either spelling
    pub fn setting(&self, name: &str) -> Option<&'static Mnemonic> {
        self.settings.iter().find(|s| s.matches(name))
    }

    fn path(&self, setting: &Mnemonic, channel: Option<u8>, form: MnemonicForm) -> String {
        let prefix = self.prefix.get(form);
        if prefix.is_empty() {
            return setting.get(form).to_string();
        }
        match channel {
            Some(n) => format!("{}{}:{}", prefix, n, setting.get(form)),
            None => format!("{}:{}", prefix, setting.get(form)),
        }
    }
}

/// Common instrument actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Trigger,
    Save,
    Recall,
    Reset,
    Reboot,
}

impl Action {
    fn mnemonic(self) -> Mnemonic {
        match self {
            Action::Trigger => tables::TRIGGER_CMD,
            Action::Save => tables::SAVE_CMD,
            Action::Recall => tables::RECALL_CMD,
            Action::Reset => tables::RESET_CMD,
            Action::Reboot => tables::REBOOT_CMD,
        }
    }
}

impl FromStr for Action {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trig" | "trigger" => Ok(Action::Trigger),
            "save" => Ok(Action::Save),
            "recall" => Ok(Action::Recall),
            "reset" => Ok(Action::Reset),
            "reboot" => Ok(Action::Reboot),
            other => Err(SdiError::InvalidCommand(format!("unknown action: {}", other))),
        }
    }
}

/// Instrument families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    /// 4-channel pulse generator
    Pulsegen,

    /// 7-channel slow digital I/O
    SlowDio,

    /// 7-input edge detector with serial/UDP notifications
    Detectron,
}

impl DeviceFamily {
    /// Number of channels in channelized groups
    pub fn channel_count(self) -> u8 {
        match self {
            DeviceFamily::Pulsegen => 4,
            DeviceFamily::SlowDio | DeviceFamily::Detectron => 7,
        }
    }

    pub fn groups(self) -> &'static [&'static SettingGroup] {
        match self {
            DeviceFamily::Pulsegen => &tables::PULSEGEN_GROUPS,
            DeviceFamily::SlowDio => &tables::SLOWDIO_GROUPS,
            DeviceFamily::Detectron => &tables::DETECTRON_GROUPS,
        }
    }

    pub fn supports(self, action: Action) -> bool {
        match action {
            Action::Trigger => !matches!(self, DeviceFamily::SlowDio),
            _ => true,
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFamily::Pulsegen => write!(f, "pulsegen"),
            DeviceFamily::SlowDio => write!(f, "slowdio"),
            DeviceFamily::Detectron => write!(f, "detectron"),
        }
    }
}

impl FromStr for DeviceFamily {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pulsegen" => Ok(DeviceFamily::Pulsegen),
            "slowdio" => Ok(DeviceFamily::SlowDio),
            "detectron" => Ok(DeviceFamily::Detectron),
            other => Err(SdiError::Config(format!("unknown device family: {}", other))),
        }
    }
}

/// Command builder for one family in one mnemonic form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    family: DeviceFamily,
    form: MnemonicForm,
}

impl Catalog {
    pub fn new(family: DeviceFamily, form: MnemonicForm) -> Self {
        Self { family, form }
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    pub fn form(&self) -> MnemonicForm {
        self.form
    }

    pub fn groups(&self) -> &'static [&'static SettingGroup] {
        self.family.groups()
    }

    /// Find a group by key
    pub fn group(&self, key: &str) -> Result<&'static SettingGroup> {
        self.groups()
            .iter()
            .copied()
            .find(|g| g.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| {
                SdiError::InvalidCommand(format!("{} has no setting group {:?}", self.family, key))
            })
    }

    /// Channels to visit when dumping a group, all of them for channelized groups
    pub fn channels(&self, group: &SettingGroup) -> Vec<Option<u8>> {
        if group.channelized {
            (1..=self.family.channel_count()).map(Some).collect()
        } else {
            vec![None]
        }
    }

    fn check_channel(&self, group: &SettingGroup, channel: Option<u8>) -> Result<()> {
        match (group.channelized, channel) {
            (true, Some(n)) if (1..=self.family.channel_count()).contains(&n) => Ok(()),
            (true, Some(n)) => Err(SdiError::InvalidCommand(format!(
                "{} channel {} out of range 1..={}",
                group.key,
                n,
                self.family.channel_count()
            ))),
            (true, None) => Err(SdiError::InvalidCommand(format!(
                "{} settings need a channel",
                group.key
            ))),
            (false, Some(_)) => Err(SdiError::InvalidCommand(format!(
                "{} settings take no channel",
                group.key
            ))),
            (false, None) => Ok(()),
        }
    }

    fn resolve(
        &self,
        group_key: &str,
        setting: &str,
        channel: Option<u8>,
    ) -> Result<String> {
        let group = self.group(group_key)?;
        let mnemonic = group.setting(setting).ok_or_else(|| {
            SdiError::InvalidCommand(format!("{} has no setting {:?}", group.key, setting))
        })?;
        self.check_channel(group, channel)?;
        Ok(group.path(mnemonic, channel, self.form))
    }

    /// `<path>?`
    pub fn query_command(&self, group: &str, setting: &str, channel: Option<u8>) -> Result<String> {
        Ok(format!("{}?", self.resolve(group, setting, channel)?))
    }

    /// `<path> <value>`
    pub fn set_command(
        &self,
        group: &str,
        setting: &str,
        channel: Option<u8>,
        value: &str,
    ) -> Result<String> {
        Ok(format!("{} {}", self.resolve(group, setting, channel)?, value))
    }

    /// Query commands for every setting of a group on one channel
    pub fn group_queries(&self, group: &SettingGroup, channel: Option<u8>) -> Result<Vec<String>> {
        self.check_channel(group, channel)?;
        Ok(group
            .settings
            .iter()
            .map(|s| format!("{}?", group.path(s, channel, self.form)))
            .collect())
    }

    pub fn action_command(&self, action: Action) -> Result<String> {
        if !self.family.supports(action) {
            return Err(SdiError::InvalidCommand(format!(
                "{} does not support {:?}",
                self.family, action
            )));
        }
        Ok(action.mnemonic().get(self.form).to_string())
    }
}
