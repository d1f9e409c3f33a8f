use std::io;

use sitemap_core::TagTokens;

fn tokens(input: &str) -> Vec<String> {
    TagTokens::new(input.as_bytes())
        .collect::<io::Result<_>>()
        .unwrap()
}

#[test]
fn rejoining_tokens_reproduces_the_input() {
    let input = "<?xml version=\"1.0\"?>\n<urlset>\n  <url><loc>https://example.com/?a=1&amp;b</loc></url>\n</urlset>\n";
    let split = tokens(input);
    assert_eq!(split.join("<"), input);

    // Splitting the rejoined text again gives the same tokens.
    assert_eq!(tokens(&split.join("<")), split);
}

#[test]
fn leading_text_becomes_first_token() {
    assert_eq!(tokens("junk<url>"), vec!["junk", "url>"]);
}

#[test]
fn read_errors_end_the_sequence() {
    struct Broken;
    impl io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("broken"))
        }
    }

    let mut iter = TagTokens::new(Broken);
    assert!(matches!(iter.next(), Some(Err(_))));
    assert!(iter.next().is_none());
}
