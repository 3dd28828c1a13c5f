//! Documents grouped by front matter tag.

use std::collections::BTreeMap;

use serde::Serialize;

use super::document::Document;
use super::render::PageInfo;
use crate::site::date::parse_date;

/// Name of the collection holding every document.
pub const ALL: &str = "all";

/// Collections available to templates as `collections.<tag>`.
///
/// Every collection is sorted by date, oldest first; undated documents
/// keep their discovery order after the dated ones.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct Collections(BTreeMap<String, Vec<PageInfo>>);

impl Collections {
    pub fn from_documents(docs: &[Document]) -> Self {
        let mut sorted: Vec<&Document> = docs.iter().collect();
        sorted.sort_by_key(|doc| {
            let date = doc.front_matter.date.as_deref().and_then(parse_date);
            (date.is_none(), date)
        });

        let mut collections: BTreeMap<String, Vec<PageInfo>> = BTreeMap::new();
        for doc in sorted {
            collections
                .entry(ALL.to_string())
                .or_default()
                .push(PageInfo::from_document(doc));
            for tag in &doc.front_matter.tags {
                collections
                    .entry(tag.clone())
                    .or_default()
                    .push(PageInfo::from_document(doc));
            }
        }

        Self(collections)
    }

    /// The pages tagged `name`; empty for unknown tags.
    #[cfg(test)]
    pub fn get(&self, name: &str) -> &[PageInfo] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
