//! Resolution of user text to vegetable records.
//!
//! Two lookups feed the bot: "which vegetables are richest in X" when the
//! text names a nutrient, and a ranked name/alias search otherwise.

use crate::catalog::{CatalogError, Vegetable, VegetableCatalog};
use crate::nutrients::Nutrient;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// A vegetable selected for its amount of the queried nutrient.
#[derive(Debug, Clone, PartialEq)]
pub struct NutrientHit {
    pub vegetable: Vegetable,
    pub nutrient: Nutrient,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    ByNutrient {
        nutrient: Nutrient,
        hits: Vec<NutrientHit>,
    },
    ByName(Vec<Vegetable>),
    Nothing,
}

/// How well a vegetable matched a name query; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    ExactName,
    ExactAlias,
    NameContains,
    AliasContains,
    QueryContainsName,
}

fn match_rank(vegetable: &Vegetable, term: &str) -> Option<MatchRank> {
    let name = vegetable.name.trim();
    let aliases = vegetable.aliases.iter().map(|a| a.trim()).filter(|a| !a.is_empty());

    if name == term {
        return Some(MatchRank::ExactName);
    }
    if aliases.clone().any(|a| a == term) {
        return Some(MatchRank::ExactAlias);
    }
    if !name.is_empty() && name.contains(term) {
        return Some(MatchRank::NameContains);
    }
    if aliases.clone().any(|a| a.contains(term)) {
        return Some(MatchRank::AliasContains);
    }
    if !name.is_empty() && term.contains(name) {
        return Some(MatchRank::QueryContainsName);
    }
    None
}

/// Vegetables whose name or alias matches `term`, best matches first.
/// Input order is kept between equally ranked records.
pub fn search_by_name_or_alias(profiles: &[Vegetable], term: &str) -> Vec<Vegetable> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(MatchRank, &Vegetable)> = profiles
        .iter()
        .filter_map(|v| match_rank(v, term).map(|rank| (rank, v)))
        .collect();
    ranked.sort_by_key(|(rank, _)| *rank);

    ranked.into_iter().map(|(_, v)| v.clone()).collect()
}

/// The `n` vegetables with the most of `nutrient`. Records without a value
/// for it are skipped; ties fall back to name order.
pub fn top_by_nutrient(profiles: &[Vegetable], nutrient: Nutrient, n: usize) -> Vec<NutrientHit> {
    let mut hits: Vec<NutrientHit> = profiles
        .iter()
        .filter(|v| v.is_presentable())
        .filter_map(|v| {
            v.nutrients
                .get(nutrient)
                .filter(|value| value.is_finite())
                .map(|value| NutrientHit {
                    vegetable: v.clone(),
                    nutrient,
                    value,
                })
        })
        .collect();

    hits.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.vegetable.name.cmp(&b.vegetable.name))
    });
    hits.truncate(n);
    hits
}

/// Runs text queries against a catalog.
#[derive(Clone)]
pub struct Recommender {
    catalog: Arc<dyn VegetableCatalog>,
    nutrient_top_n: usize,
    name_limit: usize,
}

impl Recommender {
    pub fn new(catalog: Arc<dyn VegetableCatalog>, nutrient_top_n: usize, name_limit: usize) -> Self {
        Self {
            catalog,
            nutrient_top_n,
            name_limit,
        }
    }

    /// Nutrient ranking first, then name/alias search.
    pub async fn recommend(&self, query: &str) -> Result<Recommendation, CatalogError> {
        let query = query.trim();
        let profiles = self.catalog.profiles().await?;

        if let Some(nutrient) = Nutrient::resolve(query) {
            let hits = top_by_nutrient(&profiles, nutrient, self.nutrient_top_n);
            info!(nutrient = nutrient.key(), hits = hits.len(), "Nutrient ranking");
            if !hits.is_empty() {
                return Ok(Recommendation::ByNutrient { nutrient, hits });
            }
        }

        let found = self.presentable_matches(&profiles, query);
        debug!(query, found = found.len(), "Name search");
        if found.is_empty() {
            Ok(Recommendation::Nothing)
        } else {
            Ok(Recommendation::ByName(found))
        }
    }

    /// Name/alias lookup alone, for classifier labels.
    pub async fn lookup(&self, name: &str) -> Result<Vec<Vegetable>, CatalogError> {
        let profiles = self.catalog.profiles().await?;
        Ok(self.presentable_matches(&profiles, name))
    }

    fn presentable_matches(&self, profiles: &[Vegetable], term: &str) -> Vec<Vegetable> {
        search_by_name_or_alias(profiles, term)
            .into_iter()
            .filter(Vegetable::is_presentable)
            .take(self.name_limit)
            .collect()
    }
}
