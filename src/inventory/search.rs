// SPDX-License-Identifier: GPL-3.0-only

//! Case-insensitive inventory search

use super::models::{Item, StorageBox};

/// A box that matched a query, with the items that matched inside it
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub storage_box: &'a StorageBox,
    pub items: Vec<&'a Item>,
}

impl SearchHit<'_> {
    /// The box matched on its own name or location rather than only via items
    pub fn box_matched(&self, query: &str) -> bool {
        box_matches(self.storage_box, &query.trim().to_lowercase())
    }
}

/// Search boxes and items
///
/// A blank query returns nothing. Boxes keep their list order; a box is
/// included when its name or location contains the query or when any of its
/// items does by name or note.
pub fn search_boxes<'a>(boxes: &'a [StorageBox], query: &str) -> Vec<SearchHit<'a>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    boxes
        .iter()
        .filter_map(|storage_box| {
            let items: Vec<&Item> = storage_box
                .items
                .iter()
                .filter(|item| item_matches(item, &needle))
                .collect();
            (box_matches(storage_box, &needle) || !items.is_empty()).then_some(SearchHit {
                storage_box,
                items,
            })
        })
        .collect()
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn box_matches(b: &StorageBox, needle: &str) -> bool {
    contains(Some(&b.name), needle) || contains(b.location.as_deref(), needle)
}

fn item_matches(item: &Item, needle: &str) -> bool {
    contains(Some(&item.name), needle) || contains(item.note.as_deref(), needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, note: Option<&str>) -> Item {
        Item {
            id: name.to_string(),
            box_id: "b".to_string(),
            name: name.to_string(),
            note: note.map(str::to_string),
            qty: 1,
            ..Default::default()
        }
    }

    fn inventory() -> Vec<StorageBox> {
        vec![
            StorageBox {
                id: "1".into(),
                name: "Kitchen spares".into(),
                location: Some("Garage shelf".into()),
                items: vec![item("Blender", None), item("Cable", Some("HDMI, 2m"))],
                ..Default::default()
            },
            StorageBox {
                id: "2".into(),
                name: "Electronics".into(),
                location: None,
                items: vec![item("Router", Some("spare hdmi cable inside"))],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        assert!(search_boxes(&inventory(), "   ").is_empty());
    }

    #[test]
    fn test_item_note_match_is_case_insensitive() {
        let boxes = inventory();
        let hits = search_boxes(&boxes, "HDMI");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].items.len(), 1);
        assert_eq!(hits[0].items[0].name, "Cable");
        assert_eq!(hits[1].items[0].name, "Router");
    }

    #[test]
    fn test_location_match_includes_box_without_items() {
        let boxes = inventory();
        let hits = search_boxes(&boxes, "garage");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].items.is_empty());
        assert!(hits[0].box_matched("garage"));
    }
}
