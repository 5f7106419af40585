//! Persistent index of document/media associations
//!
//! Associations live in an in-memory list guarded by a read-write lock and
//! are serialized to a single JSON file on explicit `save()`. The file is
//! read once at construction; a malformed file is logged and treated as
//! empty rather than refusing to start.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{MediaAssociation, MediaItem, MediaType};

const FILE_VERSION: &str = "1.0";

/// On-disk shape of the association file
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: String,
    associations: Vec<MediaAssociation>,
}

/// A keyword-search hit: the matched association and its score
#[derive(Debug, Clone, Serialize)]
pub struct KeywordMatch {
    pub association: MediaAssociation,
    pub score: u32,
}

/// Aggregate counts over the index
#[derive(Debug, Clone, Serialize)]
pub struct MultimediaStats {
    pub total_associations: usize,
    pub total_media_items: usize,
    pub documents_with_media: Vec<String>,
    pub media_by_type: HashMap<String, usize>,
}

/// Searchable mapping from documents, pages, and keywords to media
pub struct MultimediaIndex {
    associations: RwLock<Vec<MediaAssociation>>,
    file_path: PathBuf,
}

/// Strip any directory prefix so "pdfs/guide.pdf" and "guide.pdf" compare
/// equal. Comparison stays case-sensitive; "Guide.pdf" and "guide.pdf"
/// are distinct documents.
fn normalize_document_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

impl MultimediaIndex {
    /// Load the index from `file_path`, starting empty if the file is
    /// missing or unreadable.
    pub fn load(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let associations = match std::fs::read_to_string(&file_path) {
            Ok(raw) => match serde_json::from_str::<IndexFile>(&raw) {
                Ok(file) => {
                    tracing::info!(
                        "loaded {} multimedia associations from {}",
                        file.associations.len(),
                        file_path.display()
                    );
                    file.associations
                }
                Err(e) => {
                    tracing::warn!(
                        "malformed multimedia file {} ({}); starting empty",
                        file_path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Self {
            associations: RwLock::new(associations),
            file_path,
        }
    }

    /// Write the full association list to disk. Last writer wins; there is
    /// no merge with concurrent saves.
    pub fn save(&self) -> Result<()> {
        let file = IndexFile {
            version: FILE_VERSION.to_string(),
            associations: self.associations.read().clone(),
        };
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.file_path, json)?;
        Ok(())
    }

    /// Append a new association. Repeated calls for the same document or
    /// page create distinct associations on purpose; each call is one
    /// semantic grouping.
    pub fn add_association(&self, association: MediaAssociation) -> MediaAssociation {
        self.associations.write().push(association.clone());
        association
    }

    /// Media for a document, optionally narrowed to one page.
    ///
    /// Page rule: a query without a page matches every association for the
    /// document; a stored association without a page matches any queried
    /// page; otherwise the pages must be equal. Duplicate `(type, url)`
    /// pairs within the result are dropped.
    pub fn find_by_document(&self, document: &str, page: Option<u32>) -> Vec<MediaItem> {
        let wanted = normalize_document_name(document);
        let associations = self.associations.read();

        let mut seen: Vec<(MediaType, String)> = Vec::new();
        let mut items = Vec::new();
        for association in associations.iter() {
            if normalize_document_name(&association.document_name) != wanted {
                continue;
            }
            let page_matches = match (page, association.page_number) {
                (None, _) => true,
                (_, None) => true,
                (Some(q), Some(s)) => q == s,
            };
            if !page_matches {
                continue;
            }
            for item in &association.media_items {
                let key = (item.media_type, item.url.clone());
                if !seen.contains(&key) {
                    seen.push(key);
                    items.push(item.clone());
                }
            }
        }
        items
    }

    /// Score associations against a free-text query.
    ///
    /// Case-insensitive: +10 when the section appears in the query, +5 per
    /// keyword that appears in the query, +2 per word shared between a
    /// keyword and the query. Zero-score associations are excluded; ties
    /// keep insertion order.
    pub fn find_by_keywords(&self, query: &str, top_k: usize) -> Vec<KeywordMatch> {
        let query_lower = query.to_lowercase();
        let query_words: Vec<&str> = query_lower.split_whitespace().collect();

        let associations = self.associations.read();
        let mut matches: Vec<KeywordMatch> = associations
            .iter()
            .filter_map(|association| {
                let mut score = 0u32;
                if let Some(section) = &association.section {
                    if query_lower.contains(&section.to_lowercase()) {
                        score += 10;
                    }
                }
                for keyword in &association.keywords {
                    let keyword_lower = keyword.to_lowercase();
                    if query_lower.contains(&keyword_lower) {
                        score += 5;
                    }
                    // Word sets, not word lists: a word repeated inside one
                    // keyword counts once.
                    let mut keyword_words: Vec<&str> =
                        keyword_lower.split_whitespace().collect();
                    keyword_words.sort_unstable();
                    keyword_words.dedup();
                    let shared = keyword_words
                        .iter()
                        .filter(|word| query_words.contains(word))
                        .count();
                    score += 2 * shared as u32;
                }
                if score == 0 {
                    None
                } else {
                    Some(KeywordMatch {
                        association: association.clone(),
                        score,
                    })
                }
            })
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches.truncate(top_k);
        matches
    }

    /// Remove associations for a document. A `section` of `None` removes
    /// every association for the document, sectioned or not. Returns the
    /// number removed.
    pub fn remove_association(&self, document: &str, section: Option<&str>) -> usize {
        let mut associations = self.associations.write();
        let before = associations.len();
        associations.retain(|association| {
            let document_matches = association.document_name == document;
            let section_matches = match section {
                None => true,
                Some(s) => association.section.as_deref() == Some(s),
            };
            !(document_matches && section_matches)
        });
        before - associations.len()
    }

    /// All media of one type, across every association
    pub fn media_by_type(&self, media_type: MediaType) -> Vec<MediaItem> {
        let associations = self.associations.read();
        let mut seen: Vec<String> = Vec::new();
        let mut items = Vec::new();
        for association in associations.iter() {
            for item in &association.media_items {
                if item.media_type == media_type && !seen.contains(&item.url) {
                    seen.push(item.url.clone());
                    items.push(item.clone());
                }
            }
        }
        items
    }

    pub fn statistics(&self) -> MultimediaStats {
        let associations = self.associations.read();
        let mut documents: Vec<String> = associations
            .iter()
            .map(|a| normalize_document_name(&a.document_name))
            .collect();
        documents.sort();
        documents.dedup();

        let mut media_by_type: HashMap<String, usize> = HashMap::new();
        let mut total_media_items = 0;
        for association in associations.iter() {
            for item in &association.media_items {
                total_media_items += 1;
                let key = match item.media_type {
                    MediaType::Image => "image",
                    MediaType::Video => "video",
                    MediaType::Gif => "gif",
                };
                *media_by_type.entry(key.to_string()).or_insert(0) += 1;
            }
        }

        MultimediaStats {
            total_associations: associations.len(),
            total_media_items,
            documents_with_media: documents,
            media_by_type,
        }
    }

    /// Full snapshot, for listing endpoints
    pub fn all_associations(&self) -> Vec<MediaAssociation> {
        self.associations.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn image(url: &str) -> MediaItem {
        MediaItem::new(MediaType::Image, url)
    }

    fn video(url: &str) -> MediaItem {
        MediaItem::new(MediaType::Video, url)
    }

    fn association(
        document: &str,
        page: Option<u32>,
        section: Option<&str>,
        keywords: &[&str],
        media: Vec<MediaItem>,
    ) -> MediaAssociation {
        MediaAssociation {
            document_name: document.to_string(),
            page_number: page,
            section: section.map(String::from),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            media_items: media,
        }
    }

    fn empty_index() -> (MultimediaIndex, TempDir) {
        let dir = TempDir::new().unwrap();
        let index = MultimediaIndex::load(dir.path().join("media.json"));
        (index, dir)
    }

    #[test]
    fn document_lookup_strips_directory_prefixes() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "pdfs/network-guide.pdf",
            Some(1),
            None,
            &[],
            vec![image("http://cdn/a.png")],
        ));

        assert_eq!(index.find_by_document("network-guide.pdf", None).len(), 1);
        assert_eq!(
            index
                .find_by_document("/some/other/path/network-guide.pdf", None)
                .len(),
            1
        );
        assert!(index.find_by_document("unrelated.pdf", None).is_empty());
    }

    #[test]
    fn document_lookup_is_case_sensitive() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "Guide.pdf",
            None,
            None,
            &[],
            vec![image("http://cdn/upper.png")],
        ));

        assert_eq!(index.find_by_document("Guide.pdf", None).len(), 1);
        assert!(index.find_by_document("guide.pdf", None).is_empty());
    }

    #[test]
    fn page_wildcard_symmetry() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "doc.pdf",
            Some(5),
            None,
            &[],
            vec![image("http://cdn/page5.png")],
        ));
        index.add_association(association(
            "doc.pdf",
            None,
            None,
            &[],
            vec![image("http://cdn/global.png")],
        ));

        // No query page: everything for the document
        assert_eq!(index.find_by_document("doc.pdf", None).len(), 2);
        // Query page 5: the exact page plus document-wide media
        assert_eq!(index.find_by_document("doc.pdf", Some(5)).len(), 2);
        // Query page 9: only document-wide media
        let media = index.find_by_document("doc.pdf", Some(9));
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].url, "http://cdn/global.png");
    }

    #[test]
    fn document_lookup_dedups_repeated_media() {
        let (index, _dir) = empty_index();
        let item = image("http://cdn/shared.png");
        index.add_association(association("doc.pdf", Some(1), None, &[], vec![item.clone()]));
        index.add_association(association("doc.pdf", None, None, &[], vec![item]));

        assert_eq!(index.find_by_document("doc.pdf", Some(1)).len(), 1);
    }

    #[test]
    fn keyword_scoring_is_deterministic() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "nat.pdf",
            None,
            Some("CGNAT"),
            &["CGNAT", "NAT444"],
            vec![video("http://cdn/cgnat.mp4")],
        ));

        let matches = index.find_by_keywords("what is cgnat", 5);
        assert_eq!(matches.len(), 1);
        // 10 (section substring) + 5 (keyword substring) + 2 (shared word)
        assert_eq!(matches[0].score, 17);

        assert!(index.find_by_keywords("completely unrelated text", 5).is_empty());
    }

    #[test]
    fn repeated_words_inside_a_keyword_score_once() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "nat.pdf",
            None,
            None,
            &["nat nat gateway"],
            vec![video("http://cdn/nat.mp4")],
        ));

        // No substring match ("nat" does not contain the whole keyword);
        // the shared-word bonus counts "nat" once.
        let matches = index.find_by_keywords("nat", 5);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 2);
    }

    #[test]
    fn keyword_search_sorts_descending_and_truncates() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "a.pdf",
            None,
            None,
            &["routing"],
            vec![image("http://cdn/a.png")],
        ));
        index.add_association(association(
            "b.pdf",
            None,
            Some("routing"),
            &["routing", "bgp"],
            vec![image("http://cdn/b.png")],
        ));

        let matches = index.find_by_keywords("routing and bgp basics", 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].association.document_name, "b.pdf");
    }

    #[test]
    fn remove_without_section_removes_everything_for_document() {
        let (index, _dir) = empty_index();
        index.add_association(association("doc.pdf", None, Some("intro"), &[], vec![]));
        index.add_association(association("doc.pdf", None, None, &[], vec![]));
        index.add_association(association("other.pdf", None, None, &[], vec![]));

        assert_eq!(index.remove_association("doc.pdf", None), 2);
        assert_eq!(index.all_associations().len(), 1);
    }

    #[test]
    fn remove_with_section_is_selective() {
        let (index, _dir) = empty_index();
        index.add_association(association("doc.pdf", None, Some("intro"), &[], vec![]));
        index.add_association(association("doc.pdf", None, Some("outro"), &[], vec![]));

        assert_eq!(index.remove_association("doc.pdf", Some("intro")), 1);
        let remaining = index.all_associations();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].section.as_deref(), Some("outro"));
    }

    #[test]
    fn round_trip_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media.json");

        let index = MultimediaIndex::load(&path);
        index.add_association(association(
            "doc.pdf",
            Some(3),
            Some("setup"),
            &["install", "configure"],
            vec![
                image("http://cdn/setup.png").with_title("Setup"),
                video("http://cdn/setup.mp4"),
            ],
        ));
        index.save().unwrap();

        let reloaded = MultimediaIndex::load(&path);
        assert_eq!(reloaded.all_associations(), index.all_associations());
    }

    #[test]
    fn malformed_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media.json");
        std::fs::write(&path, "{not json").unwrap();

        let index = MultimediaIndex::load(&path);
        assert!(index.all_associations().is_empty());
    }

    #[test]
    fn persisted_file_omits_null_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("media.json");

        let index = MultimediaIndex::load(&path);
        index.add_association(association(
            "doc.pdf",
            None,
            None,
            &[],
            vec![image("http://cdn/a.png")],
        ));
        index.save().unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": \"1.0\""));
        assert!(!raw.contains("null"));
        assert!(!raw.contains("page_number"));
    }

    #[test]
    fn media_by_type_filters_and_dedups() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "a.pdf",
            None,
            None,
            &[],
            vec![image("http://cdn/a.png"), video("http://cdn/a.mp4")],
        ));
        index.add_association(association(
            "b.pdf",
            None,
            None,
            &[],
            vec![image("http://cdn/a.png")],
        ));

        assert_eq!(index.media_by_type(MediaType::Image).len(), 1);
        assert_eq!(index.media_by_type(MediaType::Video).len(), 1);
        assert!(index.media_by_type(MediaType::Gif).is_empty());
    }

    #[test]
    fn statistics_counts_by_type() {
        let (index, _dir) = empty_index();
        index.add_association(association(
            "a.pdf",
            None,
            None,
            &[],
            vec![image("http://cdn/1.png"), image("http://cdn/2.png")],
        ));
        index.add_association(association(
            "B.pdf",
            None,
            None,
            &[],
            vec![video("http://cdn/3.mp4")],
        ));

        let stats = index.statistics();
        assert_eq!(stats.total_associations, 2);
        assert_eq!(stats.total_media_items, 3);
        assert_eq!(stats.documents_with_media, vec!["B.pdf", "a.pdf"]);
        assert_eq!(stats.media_by_type.get("image"), Some(&2));
        assert_eq!(stats.media_by_type.get("video"), Some(&1));
    }
}
