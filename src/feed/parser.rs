use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use std::collections::BTreeMap;

use rss::extension::Extension as RssExtension;

use super::FeedEntry;

const MEDIA_RSS_NAMESPACE: &str = "http://search.yahoo.com/mrss/";

/// A media resource attached to an item, as declared in the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub url: String,
    pub mime_type: Option<String>,
}

impl MediaRef {
    fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|t| t.starts_with("image/"))
            .unwrap_or(false)
    }
}

/// One feed item with every optional field made explicit.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub media_content: Vec<MediaRef>,
    pub enclosures: Vec<MediaRef>,
}

impl RawEntry {
    /// First `media:content` image wins, then the first image enclosure.
    pub fn image_url(&self) -> Option<&str> {
        self.media_content
            .iter()
            .find(|m| m.is_image())
            .or_else(|| self.enclosures.iter().find(|e| e.is_image()))
            .map(|m| m.url.as_str())
    }

    pub fn into_entry(self) -> Option<FeedEntry> {
        let image_url = self.image_url().map(str::to_string);
        Some(FeedEntry {
            title: self.title?,
            link: self.link?,
            image_url,
        })
    }
}

/// Parses an RSS 2.0 document, falling back to Atom.
pub fn parse_feed(content: &[u8]) -> Result<Vec<RawEntry>> {
    let rss_err = match parse_rss(content) {
        Ok(entries) => return Ok(entries),
        Err(e) => e,
    };

    match parse_atom(content) {
        Ok(entries) => {
            tracing::warn!("Document is not RSS ({:#}), parsed as Atom", rss_err);
            Ok(entries)
        }
        Err(atom_err) => Err(anyhow!(
            "not a valid RSS ({:#}) or Atom ({:#}) document",
            rss_err,
            atom_err
        )),
    }
}

fn parse_rss(content: &[u8]) -> Result<Vec<RawEntry>> {
    let channel = rss::Channel::read_from(content).context("invalid RSS")?;
    let prefixes = media_prefixes(channel.namespaces());

    // The rss crate keeps only the last <enclosure> of an item.
    let mut scanned = match scan_enclosures(content) {
        Ok(scanned) if scanned.len() == channel.items().len() => Some(scanned.into_iter()),
        Ok(scanned) => {
            tracing::warn!(
                "Found {} items while scanning enclosures, expected {}",
                scanned.len(),
                channel.items().len()
            );
            None
        }
        Err(e) => {
            tracing::warn!("Failed to scan enclosures: {:#}", e);
            None
        }
    };

    let entries = channel
        .items()
        .iter()
        .map(|item| {
            let media_content = prefixes
                .iter()
                .filter_map(|prefix| item.extensions().get(*prefix))
                .flat_map(|m| media_refs(m, RssExtension::attrs, RssExtension::children))
                .collect();
            let enclosures = match scanned.as_mut().and_then(Iterator::next) {
                Some(enclosures) => enclosures,
                None => item
                    .enclosure()
                    .map(|e| MediaRef {
                        url: e.url().to_string(),
                        mime_type: Some(e.mime_type().to_string()),
                    })
                    .into_iter()
                    .collect(),
            };

            RawEntry {
                title: item.title().map(str::to_string),
                link: item.link().map(str::to_string),
                media_content,
                enclosures,
            }
        })
        .collect();

    Ok(entries)
}

fn parse_atom(content: &[u8]) -> Result<Vec<RawEntry>> {
    let feed = atom_syndication::Feed::read_from(content).context("invalid Atom")?;
    let prefixes = media_prefixes(feed.namespaces());

    let entries = feed
        .entries()
        .iter()
        .map(|entry| {
            let media_content = prefixes
                .iter()
                .filter_map(|prefix| entry.extensions().get(*prefix))
                .flat_map(|m| {
                    media_refs(
                        m,
                        atom_syndication::extension::Extension::attrs,
                        atom_syndication::extension::Extension::children,
                    )
                })
                .collect();
            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string());
            let enclosures = entry
                .links()
                .iter()
                .filter(|l| l.rel() == "enclosure")
                .map(|l| MediaRef {
                    url: l.href().to_string(),
                    mime_type: l.mime_type().map(str::to_string),
                })
                .collect();
            let title = entry.title().to_string();

            RawEntry {
                title: (!title.is_empty()).then_some(title),
                link,
                media_content,
                enclosures,
            }
        })
        .collect();

    Ok(entries)
}

/// Prefixes bound to the Media RSS namespace. `media` is assumed when the
/// document does not bind that prefix to anything.
fn media_prefixes(namespaces: &BTreeMap<String, String>) -> Vec<&str> {
    let mut prefixes: Vec<&str> = namespaces
        .iter()
        .filter(|(_, uri)| {
            uri.trim_end_matches('/') == MEDIA_RSS_NAMESPACE.trim_end_matches('/')
        })
        .map(|(prefix, _)| prefix.as_str())
        .collect();
    if !namespaces.contains_key("media") {
        prefixes.push("media");
    }
    prefixes
}

/// Every `<enclosure>` of every `<item>`, in document order.
fn scan_enclosures(content: &[u8]) -> Result<Vec<Vec<MediaRef>>> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut items: Vec<Vec<MediaRef>> = Vec::new();
    let mut in_item = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).context("invalid XML")? {
            Event::Start(e) if e.name().as_ref() == b"item" => {
                items.push(Vec::new());
                in_item = true;
            }
            Event::Empty(e) if e.name().as_ref() == b"item" => items.push(Vec::new()),
            Event::End(e) if e.name().as_ref() == b"item" => in_item = false,
            Event::Start(e) | Event::Empty(e)
                if in_item && e.name().as_ref() == b"enclosure" =>
            {
                if let (Some(enclosure), Some(current)) =
                    (enclosure_ref(&e, &reader), items.last_mut())
                {
                    current.push(enclosure);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn enclosure_ref(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Option<MediaRef> {
    let mut url = None;
    let mut mime_type = None;

    for attr in e.attributes().flatten() {
        let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) else {
            continue;
        };
        match attr.key.as_ref() {
            b"url" => url = Some(value.to_string()),
            b"type" => mime_type = Some(value.to_string()),
            _ => {}
        }
    }

    Some(MediaRef {
        url: url?,
        mime_type,
    })
}

/// Collects `media:content` descriptors in declaration order, including the
/// ones wrapped in `media:group`. The rss and atom crates have distinct
/// extension types with the same shape, hence the accessors.
fn media_refs<E>(
    media: &BTreeMap<String, Vec<E>>,
    attrs: fn(&E) -> &BTreeMap<String, String>,
    children: fn(&E) -> &BTreeMap<String, Vec<E>>,
) -> Vec<MediaRef> {
    let mut refs = Vec::new();

    let direct = media.get("content").into_iter().flatten();
    let grouped = media
        .get("group")
        .into_iter()
        .flatten()
        .filter_map(|group| children(group).get("content"))
        .flatten();

    for ext in direct.chain(grouped) {
        let attrs = attrs(ext);
        if let Some(url) = attrs.get("url") {
            refs.push(MediaRef {
                url: url.clone(),
                mime_type: attrs.get("type").cloned(),
            });
        }
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss_with_items(items: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel><title>Memes</title><link>http://example.com</link><description>d</description>
{items}
</channel></rss>"#
        )
    }

    #[test]
    fn test_media_content_wins_over_enclosure() {
        let xml = rss_with_items(
            r#"<item><title>Funny Cat</title><link>http://example.com/cat</link>
<enclosure url="http://img/enclosure.jpg" length="1" type="image/jpeg"/>
<media:content url="http://img/x.jpg" type="image/jpeg"/>
</item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].image_url(), Some("http://img/x.jpg"));
    }

    #[test]
    fn test_enclosure_used_without_media_content() {
        let xml = rss_with_items(
            r#"<item><title>Funny Cat</title><link>http://example.com/cat</link>
<enclosure url="http://img/enclosure.png" length="1" type="image/png"/>
</item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), Some("http://img/enclosure.png"));
    }

    #[test]
    fn test_non_image_media_is_ignored() {
        let xml = rss_with_items(
            r#"<item><title>Podcast</title><link>http://example.com/ep</link>
<media:content url="http://media/ep.mp4" type="video/mp4"/>
<enclosure url="http://media/ep.mp3" length="1" type="audio/mpeg"/>
</item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), None);
    }

    #[test]
    fn test_first_image_media_content_in_declaration_order() {
        let xml = rss_with_items(
            r#"<item><title>Gallery</title><link>http://example.com/g</link>
<media:content url="http://media/clip.mp4" type="video/mp4"/>
<media:content url="http://img/first.jpg" type="image/jpeg"/>
<media:content url="http://img/second.jpg" type="image/jpeg"/>
</item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), Some("http://img/first.jpg"));
    }

    #[test]
    fn test_first_image_enclosure_in_declaration_order() {
        let xml = rss_with_items(
            r#"<item><title>Two files</title><link>http://example.com/two</link>
<enclosure url="http://img/first.jpg" length="1" type="image/jpeg"/>
<enclosure url="http://media/second.mp3" length="1" type="audio/mpeg"/>
</item>
<item><title>Audio first</title><link>http://example.com/audio</link>
<enclosure url="http://media/ep.mp3" length="1" type="audio/mpeg"/>
<enclosure url="http://img/cover.png" length="1" type="image/png"/>
</item>
<item><title>Nothing attached</title><link>http://example.com/none</link></item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].enclosures.len(), 2);
        assert_eq!(entries[0].image_url(), Some("http://img/first.jpg"));
        assert_eq!(entries[1].image_url(), Some("http://img/cover.png"));
        assert!(entries[2].enclosures.is_empty());
    }

    #[test]
    fn test_media_namespace_bound_to_other_prefix() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:m="http://search.yahoo.com/mrss/">
<channel><title>Memes</title><link>http://example.com</link><description>d</description>
<item><title>Funny Cat</title><link>http://example.com/cat</link>
<m:content url="http://img/x.jpg" type="image/jpeg"/>
</item>
</channel></rss>"#;
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), Some("http://img/x.jpg"));
    }

    #[test]
    fn test_media_prefix_bound_elsewhere_is_ignored() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://example.com/not-mrss">
<channel><title>Memes</title><link>http://example.com</link><description>d</description>
<item><title>Funny Cat</title><link>http://example.com/cat</link>
<media:content url="http://img/x.jpg" type="image/jpeg"/>
</item>
</channel></rss>"#;
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), None);
    }

    #[test]
    fn test_escaped_enclosure_url_is_unescaped() {
        let xml = rss_with_items(
            r#"<item><title>Query</title><link>http://example.com/q</link>
<enclosure url="http://img/x.jpg?a=1&amp;b=2" length="1" type="image/jpeg"/>
</item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), Some("http://img/x.jpg?a=1&b=2"));
    }

    #[test]
    fn test_media_group_content() {
        let xml = rss_with_items(
            r#"<item><title>Grouped</title><link>http://example.com/g</link>
<media:group><media:content url="http://img/grouped.gif" type="image/gif"/></media:group>
</item>"#,
        );
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), Some("http://img/grouped.gif"));
    }

    #[test]
    fn test_atom_feed_with_enclosure_link() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Memes</title>
  <id>urn:memes</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Joke</title>
    <id>urn:memes:1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <link rel="alternate" href="http://example.com/joke"/>
    <link rel="enclosure" type="image/png" href="http://img/joke.png"/>
  </entry>
</feed>"#;
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries[0].clone().into_entry().unwrap();
        assert_eq!(entry.title, "Atom Joke");
        assert_eq!(entry.link, "http://example.com/joke");
        assert_eq!(entry.image_url.as_deref(), Some("http://img/joke.png"));
    }

    #[test]
    fn test_atom_media_content_with_custom_prefix() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:mrss="http://search.yahoo.com/mrss">
  <title>Memes</title>
  <id>urn:memes</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Cat</title>
    <id>urn:memes:2</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <link rel="alternate" href="http://example.com/cat"/>
    <mrss:content url="http://img/cat.gif" type="image/gif"/>
  </entry>
</feed>"#;
        let entries = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(entries[0].image_url(), Some("http://img/cat.gif"));
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        assert!(parse_feed(b"<not valid xml").is_err());
        assert!(parse_feed(b"").is_err());
    }

    #[test]
    fn test_entry_without_link_is_dropped() {
        let raw = RawEntry {
            title: Some("No link".into()),
            ..Default::default()
        };
        assert!(raw.into_entry().is_none());
    }
}
