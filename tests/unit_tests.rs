// Unit tests for Pantry Match

use pantry_match::core::{
    distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box},
    format::{format_amount, format_duration},
    scoring::completeness_score,
    Catalog, Matcher, NormalizationMode, Normalizer, SynonymTable,
};
use pantry_match::models::{Coordinates, Location};
use pantry_match::services::FileCatalog;
use pantry_match::RecommendError;
use std::collections::BTreeSet;

fn sample_catalog() -> Catalog {
    FileCatalog::parse(include_str!("../data/catalog.toml")).unwrap()
}

fn owned(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn normalizer(catalog: &Catalog, mode: NormalizationMode) -> Normalizer {
    Normalizer::new(SynonymTable::from_catalog(catalog), mode)
}

#[test]
fn test_haversine_distance_zero() {
    let tempe = Coordinates::new(33.4255, -111.9400);
    assert!(haversine_distance(tempe, tempe) < 0.001);
}

#[test]
fn test_haversine_distance_tempe_to_phoenix() {
    // Downtown Tempe to downtown Phoenix is roughly 12-14 km
    let tempe = Coordinates::new(33.4255, -111.9400);
    let phoenix = Coordinates::new(33.4484, -112.0740);

    let distance = haversine_distance(tempe, phoenix);
    assert!(distance > 11.0 && distance < 15.0, "got {}", distance);
    assert!((distance - haversine_distance(phoenix, tempe)).abs() < 1e-9);
}

#[test]
fn test_point_within_bbox() {
    let center = Coordinates::new(33.4255, -111.9400);
    let bbox = calculate_bounding_box(center, 10.0);

    assert!(is_within_bounding_box(center, &bbox));
    assert!(is_within_bounding_box(Coordinates::new(33.43, -111.93), &bbox));
    assert!(!is_within_bounding_box(Coordinates::new(32.22, -110.97), &bbox));
    assert!(!is_within_bounding_box(Coordinates::new(bbox.max_lat + 0.01, -111.94), &bbox));
}

#[test]
fn test_location_parsing() {
    assert_eq!(
        Location::parse("33.4255, -111.94"),
        Location::Coordinates(Coordinates::new(33.4255, -111.94))
    );
    assert_eq!(Location::parse("Tempe, AZ"), Location::Address("Tempe, AZ".to_string()));
    // Out of range falls back to an address lookup
    assert_eq!(Location::parse("95,10"), Location::Address("95,10".to_string()));
}

#[test]
fn test_have_and_missing_partition_required() {
    let catalog = sample_catalog();
    let pantry = owned(&["tomato", "rice", "garlic", "egg"]);

    for result in Matcher::default().rank(&pantry, &catalog) {
        let recipe = catalog.recipes().iter().find(|r| r.name == result.name).unwrap();
        let required: BTreeSet<String> = recipe.required().into_iter().map(str::to_string).collect();

        let union: BTreeSet<String> = result.have.union(&result.missing).cloned().collect();
        assert_eq!(union, required, "{}", result.name);
        assert!(result.have.is_disjoint(&result.missing), "{}", result.name);

        let expected = result.have.len() as f64 / required.len() as f64;
        assert!((result.score - expected).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&result.score));
    }
}

#[test]
fn test_results_sorted_by_score_then_name() {
    let catalog = sample_catalog();
    let pantry = owned(&["rice", "onion", "garlic"]);
    let results: Vec<_> = Matcher::default().rank(&pantry, &catalog).collect();

    assert_eq!(results.len(), catalog.recipes().len());
    for pair in results.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].name <= pair[1].name),
            "{} ({}) before {} ({})",
            pair[0].name,
            pair[0].score,
            pair[1].name,
            pair[1].score
        );
    }
}

#[test]
fn test_empty_pantry_scores_zero() {
    let catalog = sample_catalog();
    let pantry = BTreeSet::new();

    let results: Vec<_> = Matcher::default().rank(&pantry, &catalog).collect();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r.score == 0.0 && r.have.is_empty()));
}

#[test]
fn test_min_score_filters_results() {
    let catalog = sample_catalog();
    let pantry = owned(&["tomato", "rice"]);

    let names: Vec<String> = Matcher::new(0.5).rank(&pantry, &catalog).map(|r| r.name).collect();
    assert_eq!(names, vec!["Tomato Rice".to_string()]);
}

#[test]
fn test_normalization_is_idempotent() {
    let catalog = sample_catalog();
    let normalizer = normalizer(&catalog, NormalizationMode::Lenient);

    let first = normalizer.normalize("Roma Tomatoes, basmati;  Green Onion | EVOO").unwrap();
    assert_eq!(first.ingredients, owned(&["olive oil", "rice", "scallion", "tomato"]));

    let rejoined = first.ingredients.iter().cloned().collect::<Vec<_>>().join(", ");
    let second = normalizer.normalize(&rejoined).unwrap();
    assert_eq!(first.ingredients, second.ingredients);
    assert!(second.unresolved.is_empty());
}

#[test]
fn test_strict_mode_names_unresolved_tokens() {
    let catalog = sample_catalog();
    let normalizer = normalizer(&catalog, NormalizationMode::Strict);

    let err = normalizer.normalize("tomato, dragonfruit, ").unwrap_err();
    assert_eq!(err, RecommendError::UnresolvedIngredient(vec!["dragonfruit".to_string()]));
}

#[test]
fn test_lenient_mode_reports_dropped_tokens() {
    let catalog = sample_catalog();
    let normalized = normalizer(&catalog, NormalizationMode::Lenient)
        .normalize("tomato, dragonfruit")
        .unwrap();

    assert_eq!(normalized.ingredients, owned(&["tomato"]));
    assert_eq!(normalized.unresolved, vec!["dragonfruit".to_string()]);
}

#[test]
fn test_display_formatting() {
    assert_eq!(format_amount("1.5 cup"), "1 1/2 cup");
    assert_eq!(format_duration("PT1H"), "1 hour");
}

#[test]
fn test_completeness_score_bounds() {
    for have in 0..6 {
        for missing in 0..6 {
            let score = completeness_score(have, missing);
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
