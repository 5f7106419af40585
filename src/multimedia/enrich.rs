//! Answer enrichment
//!
//! Attaches multimedia to retrieved sources. Direct document/page
//! associations are authoritative; keyword search is only consulted as a
//! global fallback when no source carried any media at all.

use crate::types::SourceInfo;

use super::{MediaItem, MultimediaIndex};

/// Fallback breadth when no direct association matched
const KEYWORD_FALLBACK_TOP_K: usize = 2;

/// Attach media to each source and return the flat deduplicated list.
///
/// Each source gets the media directly associated with its (document,
/// page). The aggregate list is deduplicated by URL, first occurrence
/// wins. When the aggregate is empty, the question itself is run through
/// keyword search and those matches fill the aggregate instead; per-source
/// media stays empty in that case.
pub fn enrich_sources(
    index: &MultimediaIndex,
    question: &str,
    sources: &mut [SourceInfo],
) -> Vec<MediaItem> {
    let mut aggregate: Vec<MediaItem> = Vec::new();

    for source in sources.iter_mut() {
        source.media = index.find_by_document(&source.source, source.page);
        for item in &source.media {
            if !aggregate.iter().any(|seen| seen.url == item.url) {
                aggregate.push(item.clone());
            }
        }
    }

    if aggregate.is_empty() {
        for matched in index.find_by_keywords(question, KEYWORD_FALLBACK_TOP_K) {
            for item in matched.association.media_items {
                if !aggregate.iter().any(|seen| seen.url == item.url) {
                    aggregate.push(item);
                }
            }
        }
        if !aggregate.is_empty() {
            tracing::debug!(
                "no direct media for any source; keyword fallback found {}",
                aggregate.len()
            );
        }
    }

    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multimedia::{MediaAssociation, MediaType};
    use tempfile::TempDir;

    fn source(name: &str, page: Option<u32>) -> SourceInfo {
        SourceInfo {
            source: name.to_string(),
            page,
            title: "Title".to_string(),
            excerpt: "excerpt".to_string(),
            pdf_url: format!("http://localhost/pdfs/{}", name),
            media: Vec::new(),
        }
    }

    fn item(url: &str) -> MediaItem {
        MediaItem::new(MediaType::Image, url)
    }

    fn index_with(associations: Vec<MediaAssociation>) -> (MultimediaIndex, TempDir) {
        let dir = TempDir::new().unwrap();
        let index = MultimediaIndex::load(dir.path().join("media.json"));
        for association in associations {
            index.add_association(association);
        }
        (index, dir)
    }

    fn association(
        document: &str,
        page: Option<u32>,
        keywords: &[&str],
        media: Vec<MediaItem>,
    ) -> MediaAssociation {
        MediaAssociation {
            document_name: document.to_string(),
            page_number: page,
            section: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            media_items: media,
        }
    }

    #[test]
    fn direct_media_attached_per_source_and_aggregated() {
        let (index, _dir) = index_with(vec![
            association("a.pdf", Some(1), &[], vec![item("http://cdn/a.png")]),
            association("b.pdf", None, &[], vec![item("http://cdn/b.png")]),
        ]);

        let mut sources = vec![source("a.pdf", Some(1)), source("b.pdf", Some(4))];
        let media = enrich_sources(&index, "any question", &mut sources);

        assert_eq!(sources[0].media.len(), 1);
        assert_eq!(sources[1].media.len(), 1);
        assert_eq!(media.len(), 2);
    }

    #[test]
    fn aggregate_dedups_by_url_first_wins() {
        let shared = MediaItem::new(MediaType::Image, "http://cdn/shared.png")
            .with_title("From A");
        let duplicate = MediaItem::new(MediaType::Video, "http://cdn/shared.png")
            .with_title("From B");

        let (index, _dir) = index_with(vec![
            association("a.pdf", None, &[], vec![shared]),
            association("b.pdf", None, &[], vec![duplicate]),
        ]);

        let mut sources = vec![source("a.pdf", None), source("b.pdf", None)];
        let media = enrich_sources(&index, "question", &mut sources);

        // Different type and title, same URL: the later one is dropped
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].title.as_deref(), Some("From A"));
        assert_eq!(media[0].media_type, MediaType::Image);
    }

    #[test]
    fn keyword_fallback_only_when_aggregate_is_empty() {
        let (index, _dir) = index_with(vec![
            association("unrelated.pdf", None, &["cgnat"], vec![item("http://cdn/kw.png")]),
        ]);

        let mut sources = vec![source("retrieved.pdf", Some(2))];
        let media = enrich_sources(&index, "how does cgnat work", &mut sources);

        assert!(sources[0].media.is_empty());
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].url, "http://cdn/kw.png");
    }

    #[test]
    fn direct_match_suppresses_keyword_fallback() {
        let (index, _dir) = index_with(vec![
            association("retrieved.pdf", None, &[], vec![item("http://cdn/direct.png")]),
            association("unrelated.pdf", None, &["cgnat"], vec![item("http://cdn/kw.png")]),
        ]);

        let mut sources = vec![source("retrieved.pdf", Some(1))];
        let media = enrich_sources(&index, "how does cgnat work", &mut sources);

        assert_eq!(media.len(), 1);
        assert_eq!(media[0].url, "http://cdn/direct.png");
    }

    #[test]
    fn no_media_anywhere_yields_empty() {
        let (index, _dir) = index_with(vec![]);
        let mut sources = vec![source("doc.pdf", Some(1))];
        let media = enrich_sources(&index, "question", &mut sources);
        assert!(media.is_empty());
        assert!(sources[0].media.is_empty());
    }
}
