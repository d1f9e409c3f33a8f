//! Sitemap core: streaming tag tokenizer, item state machine and plain list reader.
mod entities;
mod error;
mod item;
mod location;
mod normalize;
mod plain;
mod state;
mod tokenizer;
mod xml;

pub use entities::decode_entities;
pub use error::{ElementRejection, LocationError, ParseError};
pub use item::{parse_last_modified, parse_priority, Item, ItemKind};
pub use location::Location;
pub use normalize::normalize_location;
pub use plain::parse_stream_plain;
pub use state::ItemStateMachine;
pub use tokenizer::{scan_tag, Scan, TagTokens, MAX_TOKEN_LEN};
pub use xml::parse_stream_xml;
