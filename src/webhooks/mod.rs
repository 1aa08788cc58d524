//! Webhook handling: signature verification, event types, and payload
//! parsing.

pub mod events;
pub mod parser;
pub mod signature;

pub use events::{HookEvent, RepositoryEvent, SystemEvent, WILDCARD_KEY};
pub use parser::{event_type_from_headers, parse_event, ParseError};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
    SignatureAlgorithm,
};
