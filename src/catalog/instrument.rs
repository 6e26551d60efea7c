//! Instrument layer
//!
//! Catalog-driven operations expressed as `query` calls.

use std::fmt;

use crate::client::Query;
use crate::error::{Result, SdiError};
use super::{Action, Catalog, DeviceFamily, SettingGroup};

/// One dumped setting: the query sent and the reply received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpLine {
    pub command: String,
    pub reply: String,
}

/// A titled block of dumped settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpSection {
    pub title: String,
    pub lines: Vec<DumpLine>,
}

impl DumpSection {
    /// Widest command in the section
    fn width(&self) -> usize {
        self.lines.iter().map(|l| l.command.len()).max().unwrap_or(0)
    }
}

impl fmt::Display for DumpSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.title)?;
        let width = self.width();
        for line in &self.lines {
            writeln!(f, "  {:<width$} {}", line.command, line.reply, width = width)?;
        }
        Ok(())
    }
}

/// Pulse channel parameters (times in seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSettings {
    pub delay: f64,
    pub width: f64,
    pub period: f64,
    pub cycles: u32,
    pub invert: bool,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            delay: 0.04,
            width: 0.005,
            period: 0.02,
            cycles: 3,
            invert: false,
        }
    }
}

/// A device family's operations over a query channel
pub struct Instrument<Q: Query> {
    client: Q,
    catalog: Catalog,
}

impl<Q: Query> Instrument<Q> {
    pub fn new(client: Q, catalog: Catalog) -> Self {
        Self { client, catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn client_mut(&mut self) -> &mut Q {
        &mut self.client
    }

    pub fn into_inner(self) -> Q {
        self.client
    }

    /// Raw passthrough
    pub fn query(&mut self, command: &str) -> Result<String> {
        self.client.query(command)
    }

    pub fn action(&mut self, action: Action) -> Result<String> {
        let command = self.catalog.action_command(action)?;
        self.client.query(&command)
    }

    pub fn trig(&mut self) -> Result<String> {
        self.action(Action::Trigger)
    }

    pub fn save(&mut self) -> Result<String> {
        self.action(Action::Save)
    }

    pub fn recall(&mut self) -> Result<String> {
        self.action(Action::Recall)
    }

    pub fn reset(&mut self) -> Result<String> {
        self.action(Action::Reset)
    }

    pub fn reboot(&mut self) -> Result<String> {
        self.action(Action::Reboot)
    }

    /// Read one setting
    pub fn get(&mut self, group: &str, setting: &str, channel: Option<u8>) -> Result<String> {
        let command = self.catalog.query_command(group, setting, channel)?;
        self.client.query(&command)
    }

    /// Assign one setting, returning the instrument's acknowledgement
    pub fn set(
        &mut self,
        group: &str,
        setting: &str,
        channel: Option<u8>,
        value: impl fmt::Display,
    ) -> Result<String> {
        let command = self
            .catalog
            .set_command(group, setting, channel, &value.to_string())?;
        self.client.query(&command)
    }

    /// Dump a group; `channel = None` on a channelized group dumps every channel
    pub fn dump(&mut self, group_key: &str, channel: Option<u8>) -> Result<DumpSection> {
        let group = self.catalog.group(group_key)?;
        let channels = match (group.channelized, channel) {
            (true, None) => self.catalog.channels(group),
            (_, channel) => vec![channel],
        };
        self.dump_channels(group, &channels)
    }

    /// Dump every group of the family in catalog order
    pub fn dump_all(&mut self) -> Result<Vec<DumpSection>> {
        let catalog = self.catalog;
        catalog
            .groups()
            .iter()
            .map(|group| self.dump_channels(group, &catalog.channels(group)))
            .collect()
    }

    fn dump_channels(&mut self, group: &SettingGroup, channels: &[Option<u8>]) -> Result<DumpSection> {
        let mut lines = Vec::new();
        for channel in channels {
            for command in self.catalog.group_queries(group, *channel)? {
                let reply = self.client.query(&command)?;
                lines.push(DumpLine { command, reply });
            }
        }
        Ok(DumpSection {
            title: group.title.to_string(),
            lines,
        })
    }

    /// Program one pulse channel, returning each assignment and its reply
    pub fn set_pulse(&mut self, channel: u8, settings: &PulseSettings) -> Result<Vec<DumpLine>> {
        if self.catalog.family() != DeviceFamily::Pulsegen {
            return Err(SdiError::InvalidCommand(format!(
                "{} has no pulse channels",
                self.catalog.family()
            )));
        }

        let values = [
            ("DELAY", format!("{:.6}", settings.delay)),
            ("WIDTH", format!("{:.6}", settings.width)),
            ("PERIOD", format!("{:.6}", settings.period)),
            ("CYCLES", settings.cycles.to_string()),
            ("INVERT", u8::from(settings.invert).to_string()),
        ];

        let mut lines = Vec::with_capacity(values.len());
        for (setting, value) in values {
            let command = self
                .catalog
                .set_command("pulse", setting, Some(channel), &value)?;
            let reply = self.client.query(&command)?;
            lines.push(DumpLine { command, reply });
        }
        Ok(lines)
    }
}
