use std::collections::BTreeMap;
use std::mem;

use sitemap_logging::{sitemap_debug, sitemap_trace};

use crate::{decode_entities, parse_last_modified, parse_priority};
use crate::{ElementRejection, Item, ItemKind, Location};

/// Rebuilds sitemap items from the flat token stream produced by [`crate::TagTokens`].
///
/// Feed every token in order; [`ItemStateMachine::feed`] returns an item whenever a
/// `</sitemap>` or `</url>` closes an element that carried a usable `loc`.
#[derive(Debug, Default)]
pub struct ItemStateMachine {
    state: ElementState,
}

#[derive(Debug, Default)]
enum ElementState {
    #[default]
    Idle,
    Open(Accumulator),
}

/// Fields collected for the element currently open.
#[derive(Debug)]
struct Accumulator {
    kind: ItemKind,
    fields: BTreeMap<String, String>,
    pending: Option<PendingField>,
}

/// Child field whose closing tag has not been seen yet.
#[derive(Debug)]
struct PendingField {
    name: String,
    value: String,
}

impl ItemStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, token: &str) -> Option<Item> {
        let state = mem::take(&mut self.state);
        let (next, item) = step(state, token);
        self.state = next;
        item
    }
}

fn step(state: ElementState, token: &str) -> (ElementState, Option<Item>) {
    let chunk = token.trim();
    let Some((head, value)) = chunk.split_once('>') else {
        // No tag head: the previous value continued past a literal `<`.
        return match state {
            ElementState::Open(mut acc) => {
                acc.continue_value(token);
                (ElementState::Open(acc), None)
            }
            ElementState::Idle => (ElementState::Idle, None),
        };
    };

    let name = tag_name(head);
    if name.starts_with('?') || name.starts_with('!') {
        // Declarations, processing instructions and comments.
        return (state, None);
    }

    if let Some(kind) = ItemKind::from_element_name(&name) {
        if let ElementState::Open(acc) = &state {
            sitemap_debug!(
                "discarding unterminated <{}> element",
                acc.kind.element_name()
            );
        }
        return (ElementState::Open(Accumulator::new(kind)), None);
    }

    let mut acc = match state {
        ElementState::Open(acc) => acc,
        ElementState::Idle => return (ElementState::Idle, None),
    };

    match name.strip_prefix('/') {
        Some(closing) if closing == acc.kind.element_name() => {
            acc.commit_pending();
            (ElementState::Idle, acc.finish())
        }
        Some(_) => {
            acc.commit_pending();
            (ElementState::Open(acc), None)
        }
        None => {
            acc.open_field(name, value);
            (ElementState::Open(acc), None)
        }
    }
}

/// Lower-cased tag name: the head up to the first whitespace (attributes are ignored).
fn tag_name(head: &str) -> String {
    head.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

impl Accumulator {
    fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            fields: BTreeMap::new(),
            pending: None,
        }
    }

    fn open_field(&mut self, name: String, value: &str) {
        self.commit_pending();
        self.pending = Some(PendingField {
            name,
            value: value.to_string(),
        });
    }

    fn continue_value(&mut self, token: &str) {
        if let Some(pending) = self.pending.as_mut() {
            pending.value.push('<');
            pending.value.push_str(token);
        }
    }

    fn commit_pending(&mut self) {
        if let Some(PendingField { name, value }) = self.pending.take() {
            let value = decode_entities(value.trim()).into_owned();
            self.fields.insert(name, value);
        }
    }

    fn finish(self) -> Option<Item> {
        let kind = self.kind;
        match self.materialize() {
            Ok(item) => Some(item),
            Err(reason) => {
                sitemap_debug!("dropping <{}> element: {}", kind.element_name(), reason);
                None
            }
        }
    }

    fn materialize(self) -> Result<Item, ElementRejection> {
        let raw = self
            .fields
            .get("loc")
            .ok_or(ElementRejection::MissingLocation)?;
        let location = Location::parse(raw)?;

        let mut item = Item::new(location, self.kind);
        for (name, value) in self.fields {
            match name.as_str() {
                "changefreq" => item.change_frequency = Some(value),
                "priority" => item.priority = parse_priority(&value),
                "lastmod" => item.last_modified = parse_last_modified(&value),
                "loc" => {}
                _ => sitemap_trace!("ignoring unknown field <{}>", name),
            }
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(tokens: &[&str]) -> Vec<Item> {
        let mut machine = ItemStateMachine::new();
        tokens.iter().filter_map(|t| machine.feed(t)).collect()
    }

    #[test]
    fn closes_element_into_item() {
        let items = feed_all(&["", "url>", "loc>https://example.com/a", "/loc>", "/url>"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::LeafUrl);
        assert_eq!(items[0].location.to_string(), "https://example.com/a");
    }

    #[test]
    fn element_without_loc_is_dropped() {
        let items = feed_all(&["sitemap>", "changefreq>daily", "/changefreq>", "/sitemap>"]);
        assert!(items.is_empty());
    }

    #[test]
    fn value_continues_across_stray_delimiter() {
        let items = feed_all(&["url>", "loc>https://example.com/a", "b", "/loc>", "/url>"]);
        assert_eq!(items[0].location.to_string(), "https://example.com/a<b");
    }

    #[test]
    fn missing_field_close_is_committed_at_element_close() {
        let items = feed_all(&["url>", "loc>https://example.com/a\n", "/url>"]);
        assert_eq!(items[0].location.to_string(), "https://example.com/a");
    }

    #[test]
    fn state_returns_to_idle_after_close() {
        let is_open = |machine: &ItemStateMachine| matches!(machine.state, ElementState::Open(_));
        let mut machine = ItemStateMachine::new();
        assert!(!is_open(&machine));
        machine.feed("url>");
        assert!(is_open(&machine));
        machine.feed("/url>");
        assert!(!is_open(&machine));
        // Fields outside of an element are ignored.
        assert!(machine.feed("loc>https://example.com/").is_none());
        assert!(!is_open(&machine));
    }

    #[test]
    fn foreign_close_commits_field_and_keeps_element_open() {
        let items = feed_all(&["url>", "loc>https://example.com/a", "/sitemap>", "/url>"]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, ItemKind::LeafUrl);
        assert_eq!(items[0].location.to_string(), "https://example.com/a");
    }

    #[test]
    fn tag_names_ignore_case_and_attributes() {
        let items = feed_all(&["URL xmlns:x=\"y\">", "LOC>https://example.com/", "/LOC>", "/Url>"]);
        assert_eq!(items.len(), 1);
    }
}
