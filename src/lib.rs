#![doc = include_str!("../README.md")]

pub use crate::codec::JsonLinesCodec;
pub use crate::config::Config;
pub use crate::context::ContextFormatter;
pub use crate::emitter::{emit_error, emit_event, emit_warning, global, init, EventEmitter};
pub use crate::error::Error;
pub use crate::helpers::{ApiOutcome, ApiResource, DbAccess, Outcome};
pub use crate::timezone::{resolve_timezone, TimezoneLookup};
pub use crate::transport::{
    select_transports, select_transports_with, LogLine, Mode, RuntimeContext, Transport, Transports,
};
pub use crate::types::*;

pub mod codec;
pub mod config;
pub mod context;
pub mod emitter;
pub mod error;
pub mod helpers;
pub mod timezone;
pub mod transport;
pub mod types;
