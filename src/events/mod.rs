pub mod types;

pub use types::{first_byte, AttRegion, AttStatus, Attribute, ConnectionId, Event, Outbound, Value};
