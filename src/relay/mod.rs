//! Relay socket client
//!
//! A single persistent WebSocket between the coordinator and the relay
//! endpoint: binary audio chunks out, one text reply per chunk back.

pub mod client;

pub use client::{
    ConnectionState, OutboundFrame, RelayConnection, RelayConnector, RelayEvent, RelayEventKind,
    WsRelayConnector, CLOSE_GRACE,
};
