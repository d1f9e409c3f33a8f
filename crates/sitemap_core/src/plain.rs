use std::io::{BufRead, BufReader, Read};

use sitemap_logging::{sitemap_trace, sitemap_warn};

use crate::{Item, ItemKind, Location, MAX_TOKEN_LEN};

/// Read a newline-separated URL list, one [`ItemKind::LeafUrl`] per parsable line.
///
/// Blank and unparsable lines are skipped. This reader never fails: a read error
/// or a line longer than [`MAX_TOKEN_LEN`] is logged and simply ends the list.
pub fn parse_stream_plain<R, F>(stream: R, mut callback: F)
where
    R: Read,
    F: FnMut(Item),
{
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        let limit = MAX_TOKEN_LEN as u64 + 1;
        match (&mut reader).take(limit).read_until(b'\n', &mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(err) => {
                sitemap_warn!("stopping plain sitemap read: {}", err);
                return;
            }
        }
        if line.len() > MAX_TOKEN_LEN && line.last() != Some(&b'\n') {
            sitemap_warn!(
                "stopping plain sitemap read: line longer than {} bytes",
                MAX_TOKEN_LEN
            );
            return;
        }

        let text = String::from_utf8_lossy(&line);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match Location::parse(text) {
            Ok(location) => callback(Item::new(location, ItemKind::LeafUrl)),
            Err(err) => sitemap_trace!("skipping plain sitemap line {:?}: {}", text, err),
        }
    }
}
