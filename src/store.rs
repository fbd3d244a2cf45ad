//! Per-connection storage for the two external ("non-database") values
//!
//! Each connection slot holds the last value a peer wrote and a counter that
//! advances every time a peer reads it. Values live for the lifetime of the
//! process; nothing is persisted.

use crate::config::connections::MAX_CONNECTIONS;
use crate::events::ConnectionId;

/// Errors from connection id translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    /// Connection id outside `[0, MAX_CONNECTIONS)`
    OutOfRange(u8),
}

/// Validated index of one connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSlot(usize);

impl ConnectionSlot {
    /// Create a slot from a raw index
    pub fn new(index: usize) -> Result<Self, SlotError> {
        if index < MAX_CONNECTIONS {
            Ok(Self(index))
        } else {
            Err(SlotError::OutOfRange(index.min(u8::MAX as usize) as u8))
        }
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl TryFrom<ConnectionId> for ConnectionSlot {
    type Error = SlotError;

    fn try_from(conn: ConnectionId) -> Result<Self, Self::Error> {
        Self::new(usize::from(conn.0))
    }
}

/// Values returned by [`ConnectionValueStore::read_and_increment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Read counter after the increment
    pub read_counter: u16,
    /// Last written value, unchanged
    pub written_value: u16,
}

#[derive(Debug, Clone, Copy, Default)]
struct StoredValues {
    written_value: u16,
    read_counter: u16,
}

/// Fixed-size store indexed by connection slot
pub struct ConnectionValueStore {
    slots: [StoredValues; MAX_CONNECTIONS],
}

impl ConnectionValueStore {
    /// Create a store with every value zeroed
    pub const fn new() -> Self {
        Self {
            slots: [StoredValues {
                written_value: 0,
                read_counter: 0,
            }; MAX_CONNECTIONS],
        }
    }

    /// Copy an inbound value into `written_value`
    ///
    /// The value is the little-endian image of the u16: a one-byte write
    /// replaces the low byte only and bytes past the second are ignored.
    pub fn write(&mut self, slot: ConnectionSlot, bytes: &[u8]) {
        let stored = &mut self.slots[slot.index()];
        let mut image = stored.written_value.to_le_bytes();
        let len = bytes.len().min(image.len());
        image[..len].copy_from_slice(&bytes[..len]);
        stored.written_value = u16::from_le_bytes(image);

        self.printout_status();
    }

    /// Advance the read counter and return it with the written value
    pub fn read_and_increment(&mut self, slot: ConnectionSlot) -> ReadOutcome {
        let stored = &mut self.slots[slot.index()];
        stored.read_counter = stored.read_counter.wrapping_add(1);
        let outcome = ReadOutcome {
            read_counter: stored.read_counter,
            written_value: stored.written_value,
        };

        self.printout_status();
        outcome
    }

    /// Last value written on `slot`
    pub fn written(&self, slot: ConnectionSlot) -> u16 {
        self.slots[slot.index()].written_value
    }

    /// Current read counter of `slot`
    pub fn read_counter(&self, slot: ConnectionSlot) -> u16 {
        self.slots[slot.index()].read_counter
    }

    /// Log the stored values of every slot
    pub fn printout_status(&self) {
        for (index, stored) in self.slots.iter().enumerate() {
            log::info!(
                "conn {}: written {:#06x}, read counter {}",
                index,
                stored.written_value,
                stored.read_counter
            );
        }
    }
}

impl Default for ConnectionValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize) -> ConnectionSlot {
        ConnectionSlot::new(index).unwrap()
    }

    #[test]
    fn test_slot_bounds() {
        assert!(ConnectionSlot::new(MAX_CONNECTIONS - 1).is_ok());
        assert_eq!(
            ConnectionSlot::new(MAX_CONNECTIONS),
            Err(SlotError::OutOfRange(MAX_CONNECTIONS as u8))
        );
        assert_eq!(
            ConnectionSlot::try_from(ConnectionId(200)),
            Err(SlotError::OutOfRange(200))
        );
    }

    #[test]
    fn test_write_two_bytes_little_endian() {
        let mut store = ConnectionValueStore::new();
        store.write(slot(1), &[0x34, 0x12]);
        assert_eq!(store.written(slot(1)), 0x1234);
    }

    #[test]
    fn test_short_write_replaces_low_byte() {
        let mut store = ConnectionValueStore::new();
        store.write(slot(0), &[0xCD, 0xAB]);
        store.write(slot(0), &[0x01]);
        assert_eq!(store.written(slot(0)), 0xAB01);
    }

    #[test]
    fn test_long_write_truncated() {
        let mut store = ConnectionValueStore::new();
        store.write(slot(0), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(store.written(slot(0)), 0x0201);
        // Neighbouring slot untouched
        assert_eq!(store.written(slot(1)), 0);
    }

    #[test]
    fn test_fields_independent() {
        for index in 0..MAX_CONNECTIONS {
            let mut store = ConnectionValueStore::new();
            store.write(slot(index), &[0xEF, 0xBE]);
            let outcome = store.read_and_increment(slot(index));
            assert_eq!(outcome.read_counter, 1);
            assert_eq!(outcome.written_value, 0xBEEF);

            store.write(slot(index), &[0x00, 0x00]);
            assert_eq!(store.read_counter(slot(index)), 1);
        }
    }

    #[test]
    fn test_read_counter_monotonic_and_wraps() {
        let mut store = ConnectionValueStore::new();
        let s = slot(2);
        for _ in 0..(u16::MAX - 2) {
            store.read_and_increment(s);
        }
        assert_eq!(store.read_counter(s), u16::MAX - 2);

        let counters: heapless::Vec<u16, 5> = (0..5)
            .map(|_| store.read_and_increment(s).read_counter)
            .collect();
        assert_eq!(counters.as_slice(), &[u16::MAX - 1, u16::MAX, 0, 1, 2]);
    }

    #[test]
    fn test_slots_isolated() {
        let mut store = ConnectionValueStore::new();
        store.read_and_increment(slot(0));
        store.read_and_increment(slot(0));
        store.write(slot(2), &[0x05, 0x00]);

        assert_eq!(store.read_counter(slot(0)), 2);
        assert_eq!(store.read_counter(slot(1)), 0);
        assert_eq!(store.read_counter(slot(2)), 0);
        assert_eq!(store.written(slot(0)), 0);
        assert_eq!(store.written(slot(2)), 5);
    }
}
