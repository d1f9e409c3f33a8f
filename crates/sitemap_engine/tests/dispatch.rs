use std::io::{Cursor, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use sitemap_engine::{parse_response, Item, ItemKind, SitemapError, SitemapResponse};
use url::Url;

const SITEMAP: &str = "<sitemap><url><loc>http://example.com/home</loc></url></sitemap>";

fn response(url: &str, body: impl Into<Vec<u8>>) -> SitemapResponse<Cursor<Vec<u8>>> {
    SitemapResponse::new(Url::parse(url).unwrap(), Cursor::new(body.into()))
}

fn collect(response: SitemapResponse<Cursor<Vec<u8>>>) -> (Result<(), SitemapError>, Vec<Item>) {
    let mut items = Vec::new();
    let result = parse_response(response, |item| items.push(item));
    (result, items)
}

fn gzip(data: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn xml_content_type_yields_leaf_item() {
    sitemap_logging::initialize_for_tests();
    let resp = response("http://example.com/sitemap.xml", SITEMAP).with_content_type("text/xml");
    let (result, items) = collect(resp);

    result.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ItemKind::LeafUrl);
    assert_eq!(items[0].location.to_string(), "http://example.com/home");
}

#[test]
fn unrecognized_content_type_is_an_error() {
    let resp = response("http://example.com/index.html", SITEMAP).with_content_type("text/html");
    let (result, items) = collect(resp);

    match result {
        Err(SitemapError::UnrecognizedContentType { content_type, path }) => {
            assert_eq!(content_type.as_deref(), Some("text/html"));
            assert_eq!(path, "/index.html");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(items.is_empty());
}

#[test]
fn locations_are_normalized_against_response_url() {
    let body = "<urlset>\
        <url><loc>/page?x=1</loc></url>\
        <url><loc>localhost/other</loc></url>\
        <url><loc>https://cdn.example.net/asset</loc></url>\
        </urlset>";
    let (result, items) = collect(response("https://example.com/sitemap.xml", body));

    result.unwrap();
    let locations: Vec<String> = items.iter().map(|i| i.location.to_string()).collect();
    assert_eq!(
        locations,
        vec![
            "https://example.com/page?x=1",
            "https://example.com/other",
            "https://cdn.example.net/asset",
        ]
    );
}

#[test]
fn plain_text_list_is_read_line_by_line() {
    let body = "https://example.com/a\n\nnot a url\n/b\n";
    let resp = response("https://example.com/urls", body).with_content_type("text/plain; charset=utf-8");
    let (result, items) = collect(resp);

    result.unwrap();
    let locations: Vec<String> = items.iter().map(|i| i.location.to_string()).collect();
    assert_eq!(locations, vec!["https://example.com/a", "https://example.com/b"]);
    assert!(items.iter().all(|i| i.kind == ItemKind::LeafUrl));
}

#[test]
fn txt_extension_selects_plain_reader() {
    let (result, items) = collect(response("https://example.com/sitemap.txt", "https://example.com/a\n"));
    result.unwrap();
    assert_eq!(items.len(), 1);
}

#[test]
fn gzip_path_is_decompressed() {
    let (result, items) = collect(response("https://example.com/sitemap.xml.gz", gzip(SITEMAP)));
    result.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].location.path(), "/home");
}

#[test]
fn gzip_content_encoding_is_decompressed() {
    let resp = response("https://example.com/sitemap", gzip(SITEMAP))
        .with_content_type("application/xml")
        .with_content_encoding("gzip");
    let (result, items) = collect(resp);
    result.unwrap();
    assert_eq!(items.len(), 1);
}

#[test]
fn invalid_gzip_stream_is_fatal() {
    let resp = response("https://example.com/sitemap.xml.gz", SITEMAP);
    let (result, items) = collect(resp);

    assert!(matches!(result, Err(SitemapError::Decompress(_))));
    assert!(items.is_empty());
}

#[test]
fn empty_gzip_body_is_fatal() {
    let (result, _) = collect(response("https://example.com/sitemap.xml.gz", Vec::new()));
    assert!(matches!(result, Err(SitemapError::Decompress(_))));
}

#[test]
fn decompressed_size_is_capped() {
    let mut body = String::from("<urlset>");
    for _ in 0..10_000 {
        body.push_str("<url><loc>http://example.com/page</loc></url>");
    }
    body.push_str("</urlset>");
    let compressed = gzip(&body);
    assert!(compressed.len() < body.len() / 10);

    let resp = response("https://example.com/sitemap.xml.gz", compressed).with_max_bytes(4096);
    let (result, items) = collect(resp);

    assert!(matches!(result, Err(SitemapError::TooLarge { max_bytes: 4096 })));
    assert!(!items.is_empty());
    assert!(items.len() < 10_000);
}

#[test]
fn plain_list_is_capped_too() {
    let body = "https://example.com/a\n".repeat(100);
    let resp = response("https://example.com/urls.txt", body).with_max_bytes(220);
    let (result, items) = collect(resp);

    assert!(matches!(result, Err(SitemapError::TooLarge { .. })));
    assert_eq!(items.len(), 10);
}

#[test]
fn body_of_exactly_max_bytes_is_accepted() {
    let resp = response("https://example.com/sitemap.xml", SITEMAP).with_max_bytes(SITEMAP.len() as u64);
    let (result, items) = collect(resp);
    result.unwrap();
    assert_eq!(items.len(), 1);
}
