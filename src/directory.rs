/// Bounded, deduplicated registry of discovered access points.
///
/// Keyed by BSSID, kept in insertion order. Records are never removed
/// individually; once full, new BSSIDs are rejected rather than evicting
/// old ones. The whole directory is cleared only when a survey starts.

use core::fmt;

use heapless::Vec;

use crate::defaults::DIRECTORY_CAPACITY;
use crate::scanner::{BeaconInfo, Label};

/// One discovered access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointRecord {
    bssid: [u8; 6],
    label: Label,
    pub rssi: i8,
    pub channel: u8,
    /// Seen since the last sweep started
    pub live: bool,
}

impl AccessPointRecord {
    pub fn bssid(&self) -> &[u8; 6] {
        &self.bssid
    }

    /// Label as captured from the first sighting.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Outcome of a successful [`ApDirectory::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Returned when an unseen BSSID arrives at a full directory.
/// The sighting has been dropped; callers may ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded;

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "access point directory full ({} entries)", DIRECTORY_CAPACITY)
    }
}

#[derive(Debug, Default)]
pub struct ApDirectory {
    records: Vec<AccessPointRecord, DIRECTORY_CAPACITY>,
}

impl ApDirectory {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a beacon sighting.
    ///
    /// Known BSSIDs get their signal, channel and liveness refreshed; the
    /// label stays as first seen.
    pub fn upsert(&mut self, info: &BeaconInfo) -> Result<Upsert, CapacityExceeded> {
        if let Some(rec) = self.records.iter_mut().find(|r| r.bssid == info.bssid) {
            rec.rssi = info.rssi;
            rec.channel = info.channel;
            rec.live = true;
            return Ok(Upsert::Updated);
        }

        self.records
            .push(AccessPointRecord {
                bssid: info.bssid,
                label: info.label.clone(),
                rssi: info.rssi,
                channel: info.channel,
                live: true,
            })
            .map(|_| Upsert::Inserted)
            .map_err(|_| CapacityExceeded)
    }

    /// Mark every record as not yet seen in the current sweep.
    pub fn reset_liveness(&mut self) {
        for rec in self.records.iter_mut() {
            rec.live = false;
        }
    }

    /// Records in insertion order.
    pub fn entries(&self) -> &[AccessPointRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.is_full()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}
