use std::io::Read;

use crate::{Item, ItemStateMachine, ParseError, TagTokens};

/// Stream an XML sitemap or sitemap index, calling `callback` once per item in document order.
///
/// Elements without a usable `loc` are skipped. A read error ends the parse; items
/// already delivered stay delivered.
pub fn parse_stream_xml<R, F>(stream: R, mut callback: F) -> Result<(), ParseError>
where
    R: Read,
    F: FnMut(Item),
{
    let mut machine = ItemStateMachine::new();
    for token in TagTokens::new(stream) {
        if let Some(item) = machine.feed(&token?) {
            callback(item);
        }
    }
    Ok(())
}
