//! Inbound and outbound event types of the custom service
//!
//! # Attribute map
//!
//! | Attribute      | Access                  | Storage       |
//! |----------------|-------------------------|---------------|
//! | ControlPoint   | write                   | database      |
//! | AdcValue1      | read, notify (200 B)    | database      |
//! | Led            | write                   | database      |
//! | LongValue      | read, write, notify     | database      |
//! | Indicateable   | read, indicate (2 B)    | database      |
//! | Button         | read, notify            | database      |
//! | ExternalWrite  | read, write (2 B)       | per connection|
//! | ExternalRead   | read (2 B)              | per connection|
//!
//! Multi-byte payloads produced by the service are little-endian, except the
//! indication counter which is sent big-endian.

use crate::config::service::{
    ADC_VAL_1_CHAR_LEN, EXTERNAL_VAL_CHAR_LEN, INDICATEABLE_CHAR_LEN, LONG_VALUE_CHAR_LEN,
};
use heapless::Vec;

/// Inbound write payload
pub type Value = Vec<u8, LONG_VALUE_CHAR_LEN>;

/// Connection identifier as reported by the link layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionId(pub u8);

/// Attributes of the custom service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    ControlPoint,
    AdcValue1,
    Led,
    LongValue,
    Indicateable,
    Button,
    /// Written value, stored per connection
    ExternalWrite,
    /// Read counter, stored per connection
    ExternalRead,
}

/// Access region queried by an attribute info request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttRegion {
    /// Region that accepts writes (the long value)
    Writable,
    /// Every other region
    ReadOnly,
}

/// ATT status codes surfaced by the service
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttStatus {
    /// No error (0x00)
    Ok = 0x00,
    /// Write not permitted (0x03)
    WriteNotPermitted = 0x03,
}

/// Inbound event from the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Control point write: start or stop sampling
    ControlWrite { conn: ConnectionId, value: Value },

    /// LED state write
    LedWrite { conn: ConnectionId, value: Value },

    /// Client characteristic configuration write on the indicateable value
    IndicateableSubscribeChange { conn: ConnectionId, value: Value },

    /// Write to the per-connection written value
    ExternalValueWrite { conn: ConnectionId, value: Value },

    /// Read of the per-connection read counter
    ExternalValueReadRequest { conn: ConnectionId },

    /// Read of the per-connection written value
    WrittenValueReadRequest { conn: ConnectionId },

    /// Attribute info query (prepared write length check)
    AttributeInfoRequest {
        conn: ConnectionId,
        attribute: Attribute,
        region: AttRegion,
    },

    LongValueWrite { conn: ConnectionId, value: Value },
    LongValueNotifyConfirm { conn: ConnectionId },
    AdcConfigWrite { conn: ConnectionId, value: Value },
    AdcNotifyConfirm { conn: ConnectionId },
    ButtonNotifyConfirm { conn: ConnectionId },
    IndicateableConfigWrite { conn: ConnectionId, value: Value },
    IndicateableIndicateConfirm { conn: ConnectionId },
}

impl Event {
    /// Connection the event arrived on
    pub fn conn(&self) -> ConnectionId {
        match self {
            Event::ControlWrite { conn, .. }
            | Event::LedWrite { conn, .. }
            | Event::IndicateableSubscribeChange { conn, .. }
            | Event::ExternalValueWrite { conn, .. }
            | Event::ExternalValueReadRequest { conn }
            | Event::WrittenValueReadRequest { conn }
            | Event::AttributeInfoRequest { conn, .. }
            | Event::LongValueWrite { conn, .. }
            | Event::LongValueNotifyConfirm { conn }
            | Event::AdcConfigWrite { conn, .. }
            | Event::AdcNotifyConfirm { conn }
            | Event::ButtonNotifyConfirm { conn }
            | Event::IndicateableConfigWrite { conn, .. }
            | Event::IndicateableIndicateConfirm { conn } => *conn,
        }
    }
}

/// Outbound event to the transport
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Unacknowledged value push to the subscribed peer
    Notify {
        attribute: Attribute,
        payload: [u8; ADC_VAL_1_CHAR_LEN],
    },

    /// Acknowledged value push
    ///
    /// Payload: `[counter_hi, counter_lo]`
    Indicate {
        conn: ConnectionId,
        attribute: Attribute,
        payload: [u8; INDICATEABLE_CHAR_LEN],
    },

    /// Response to a read of an external value
    ReadResponse {
        conn: ConnectionId,
        attribute: Attribute,
        status: AttStatus,
        payload: [u8; EXTERNAL_VAL_CHAR_LEN],
    },

    /// Response to an attribute info query
    AttributeInfoResponse {
        conn: ConnectionId,
        attribute: Attribute,
        status: AttStatus,
        length: u16,
    },
}

/// First byte of a write payload, zero when empty
pub fn first_byte(value: &[u8]) -> u8 {
    value.first().copied().unwrap_or(0)
}
