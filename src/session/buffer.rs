//! Append-only storage for the readings of one session.

use crate::session::types::Reading;

/// Separator between readings in the serialized form.
pub const DELIMITER: &str = ",";

/// Readings in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleBuffer {
    readings: Vec<Reading>,
}

impl SampleBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reading. Never rejects.
    pub fn append(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings in capture order.
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Decimal readings joined by [`DELIMITER`]. Empty buffer gives `""`.
    pub fn serialize(&self) -> String {
        self.readings
            .iter()
            .map(Reading::to_string)
            .collect::<Vec<_>>()
            .join(DELIMITER)
    }

    /// Hand the readings over, leaving nothing behind.
    pub fn into_readings(self) -> Vec<Reading> {
        self.readings
    }
}

impl FromIterator<Reading> for SampleBuffer {
    fn from_iter<I: IntoIterator<Item = Reading>>(iter: I) -> Self {
        Self {
            readings: iter.into_iter().collect(),
        }
    }
}
