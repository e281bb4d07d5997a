use std::collections::BTreeSet;

use crate::core::distance::is_within_bounding_box;
use crate::core::normalizer::SynonymTable;
use crate::models::{BoundingBox, Coordinates, Store};

/// How a store can be placed relative to the request location
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Coordinates published by the directory
    Known(Coordinates),
    /// No coordinates, but an address to geocode
    NeedsGeocoding(String),
    /// Neither; the store cannot be ranked
    Unplaceable,
}

/// Decide how a store gets its coordinates
pub fn placement(store: &Store) -> Placement {
    match store.coordinates() {
        Some(coords) if coords.is_valid() => Placement::Known(coords),
        _ if !store.address.trim().is_empty() => Placement::NeedsGeocoding(store.address.clone()),
        _ => Placement::Unplaceable,
    }
}

/// Stage 1 pre-filter: cheap bounding box check before Haversine
#[inline]
pub fn within_search_area(coords: Coordinates, bbox: &BoundingBox) -> bool {
    is_within_bounding_box(coords, bbox)
}

/// Needed ingredients a store is known to carry
///
/// Stock entries are resolved through `synonyms`, so a store listing
/// "green onion" carries the canonical "scallion". Entries the table does not
/// know are compared as written. Returns `None` when the store publishes no
/// stock data: unknown stock is never reported as an empty list.
pub fn stock_annotation(
    store: &Store,
    needed: &BTreeSet<String>,
    synonyms: &SynonymTable,
) -> Option<Vec<String>> {
    store.stock.as_ref().map(|stock| {
        let carried: BTreeSet<&str> = stock
            .iter()
            .map(|item| synonyms.resolve(item).unwrap_or(item.as_str()))
            .collect();

        needed
            .iter()
            .filter(|id| carried.contains(id.as_str()))
            .cloned()
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Catalog;
    use crate::models::{Ingredient, Recipe, RecipeIngredient};

    fn store(stock: Option<&[&str]>) -> Store {
        Store {
            id: "s1".into(),
            name: "Safeway".into(),
            address: "456 College Ave".into(),
            latitude: Some(33.42),
            longitude: Some(-111.93),
            stock: stock.map(|s| s.iter().map(|i| i.to_string()).collect()),
        }
    }

    fn needed() -> BTreeSet<String> {
        ["onion", "scallion", "spices"].iter().map(|s| s.to_string()).collect()
    }

    fn synonyms() -> SynonymTable {
        let catalog = Catalog::new(
            vec![
                Ingredient { id: "scallion".into(), synonyms: vec!["Green Onion".into()] },
                Ingredient { id: "spices".into(), synonyms: vec!["garam masala".into()] },
            ],
            vec![Recipe {
                name: "Curry".into(),
                ingredients: vec![RecipeIngredient { ingredient: "onion".into(), quantity: None }],
                ..Recipe::default()
            }],
        )
        .unwrap();
        SynonymTable::from_catalog(&catalog)
    }

    #[test]
    fn test_stock_annotation_known() {
        let carries = stock_annotation(&store(Some(&["onion", "milk"])), &needed(), &synonyms());
        assert_eq!(carries, Some(vec!["onion".to_string()]));
    }

    #[test]
    fn test_stock_annotation_resolves_synonyms_and_plurals() {
        let carries = stock_annotation(
            &store(Some(&["green onion", "onions", "garam masala"])),
            &needed(),
            &synonyms(),
        );
        assert_eq!(
            carries,
            Some(vec!["onion".to_string(), "scallion".to_string(), "spices".to_string()])
        );
    }

    #[test]
    fn test_stock_annotation_known_but_carries_nothing() {
        assert_eq!(stock_annotation(&store(Some(&["milk"])), &needed(), &synonyms()), Some(vec![]));
    }

    #[test]
    fn test_stock_annotation_unknown() {
        assert_eq!(stock_annotation(&store(None), &needed(), &SynonymTable::default()), None);
    }

    #[test]
    fn test_placement() {
        let mut s = store(None);
        assert!(matches!(placement(&s), Placement::Known(_)));

        s.latitude = None;
        assert_eq!(placement(&s), Placement::NeedsGeocoding("456 College Ave".into()));

        s.address = "  ".into();
        assert_eq!(placement(&s), Placement::Unplaceable);
    }
}
