//! Recipe search: remote API client and local catalog filtering
//!
//! The remote client talks to a Spoonacular-style search API and
//! transforms its results into the catalog [`Recipe`] shape, so the
//! session and interpreter never care where a recipe came from.
//! Failures are absorbed into empty result lists; search is never
//! fatal.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::recipe::{Difficulty, Recipe};
use crate::{Error, Result};

/// Cached query results kept per client
const CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// Query keywords that get the Indian cuisine hint attached
const INDIAN_KEYWORDS: &[&str] = &[
    "pani puri",
    "panipuri",
    "golgappa",
    "gulab jamun",
    "samosa",
    "pakora",
    "tikka",
    "biryani",
    "curry",
    "masala",
    "naan",
    "roti",
    "paratha",
    "dosa",
    "idli",
    "vada",
    "chaat",
    "bhel",
    "ladoo",
    "halwa",
    "tandoori",
    "korma",
    "vindaloo",
    "dal",
    "paneer",
    "butter chicken",
];

/// Response from the search endpoint
#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<ApiRecipe>,
}

/// Response from the random-recipes endpoint
#[derive(Deserialize)]
struct RandomResponse {
    recipes: Vec<ApiRecipe>,
}

/// A recipe as returned by the remote API
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRecipe {
    id: i64,
    title: String,
    #[serde(default)]
    ready_in_minutes: Option<u32>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    analyzed_instructions: Vec<AnalyzedInstructions>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    spoonacular_source_url: Option<String>,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    cuisines: Vec<String>,
    #[serde(default)]
    dish_types: Vec<String>,
}

#[derive(Deserialize)]
struct AnalyzedInstructions {
    #[serde(default)]
    steps: Vec<InstructionStep>,
}

#[derive(Deserialize)]
struct InstructionStep {
    step: String,
}

/// Remote recipe search client
pub struct RecipeSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    cache: Mutex<LruCache<String, Vec<Recipe>>>,
}

impl RecipeSearch {
    /// Create a new search client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(config: &SearchConfig, api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("search API key required".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size: config.page_size,
            cache: Mutex::new(LruCache::new(CACHE_CAPACITY)),
        })
    }

    /// Search remote recipes, absorbing failures into an empty list
    pub async fn search(&self, query: &str) -> Vec<Recipe> {
        let cache_key = format!("search_{query}_0");

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&cache_key) {
                tracing::debug!(query, "returning cached search results");
                return hit.clone();
            }
        }

        match self.fetch_search(query).await {
            Ok(recipes) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.put(cache_key, recipes.clone());
                }
                tracing::info!(query, count = recipes.len(), "remote search complete");
                recipes
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "remote search failed");
                Vec::new()
            }
        }
    }

    /// Fetch random recipes, absorbing failures into an empty list
    pub async fn random(&self, count: u32) -> Vec<Recipe> {
        match self.fetch_random(count).await {
            Ok(recipes) => recipes,
            Err(e) => {
                tracing::warn!(error = %e, "random recipe fetch failed");
                Vec::new()
            }
        }
    }

    async fn fetch_search(&self, query: &str) -> Result<Vec<Recipe>> {
        let url = format!("{}/recipes/complexSearch", self.base_url);

        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("query", query),
                ("addRecipeInformation", "true"),
                ("instructionsRequired", "true"),
                ("sort", "popularity"),
            ])
            .query(&[("number", self.page_size)]);

        if is_indian_dish(query) {
            request = request.query(&[("cuisine", "indian")]);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!("search API error {status}: {body}")));
        }

        let result: SearchResponse = response.json().await?;
        Ok(result.results.into_iter().map(transform_recipe).collect())
    }

    async fn fetch_random(&self, count: u32) -> Result<Vec<Recipe>> {
        let url = format!("{}/recipes/random", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(&[("number", count)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Search(format!("search API error {status}: {body}")));
        }

        let result: RandomResponse = response.json().await?;
        Ok(result.recipes.into_iter().map(transform_recipe).collect())
    }
}

/// Whether a query looks like an Indian dish
fn is_indian_dish(query: &str) -> bool {
    let query = query.to_lowercase();
    INDIAN_KEYWORDS.iter().any(|k| query.contains(k))
}

/// Transform an API recipe into the catalog shape
fn transform_recipe(api: ApiRecipe) -> Recipe {
    let time = api.ready_in_minutes.unwrap_or(30);

    let analyzed_steps = api
        .analyzed_instructions
        .first()
        .map_or(0, |i| i.steps.len());

    let difficulty = if time > 60 || analyzed_steps > 10 {
        Difficulty::Hard
    } else if time > 30 || analyzed_steps > 6 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    };

    let steps = extract_steps(&api);
    let category = extract_category(&api);

    let mut recipe = Recipe {
        id: Some(api.id),
        title: api.title,
        time: format!("{time} mins"),
        difficulty,
        category,
        image: api.image.unwrap_or_default(),
        steps,
        source_url: api.source_url.or(api.spoonacular_source_url),
        servings: Some(api.servings.unwrap_or(4)),
    };
    recipe.ensure_steps();
    recipe
}

/// Steps from analyzed instructions, else a sentence-split fallback
fn extract_steps(api: &ApiRecipe) -> Vec<String> {
    if let Some(instructions) = api.analyzed_instructions.first() {
        if !instructions.steps.is_empty() {
            return instructions.steps.iter().map(|s| s.step.clone()).collect();
        }
    }

    api.instructions.as_deref().map_or_else(Vec::new, |text| {
        text.split(['.', '\r', '\n'])
            .map(str::trim)
            .filter(|s| s.len() > 10)
            .map(String::from)
            .collect()
    })
}

/// Category from cuisines, else dish types, else "Other"
fn extract_category(api: &ApiRecipe) -> String {
    if let Some(cuisine) = api.cuisines.first() {
        return cuisine.clone();
    }

    if let Some(dish_type) = api.dish_types.first() {
        let mut chars = dish_type.chars();
        return chars.next().map_or_else(String::new, |c| {
            c.to_uppercase().collect::<String>() + chars.as_str()
        });
    }

    "Other".to_string()
}

/// Catalog filter selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFilter {
    All,
    /// Recipes under 30 minutes
    Quick,
    Difficulty(Difficulty),
}

/// Filter local catalog recipes by search term and filter
///
/// The term matches against title, category, and step text,
/// case-insensitively. An empty term matches everything.
#[must_use]
pub fn filter_catalog<'a>(
    recipes: &'a [Recipe],
    term: &str,
    filter: CatalogFilter,
) -> Vec<&'a Recipe> {
    let term = term.trim().to_lowercase();

    recipes
        .iter()
        .filter(|r| {
            term.is_empty()
                || r.title.to_lowercase().contains(&term)
                || r.category.to_lowercase().contains(&term)
                || r.steps.iter().any(|s| s.to_lowercase().contains(&term))
        })
        .filter(|r| match filter {
            CatalogFilter::All => true,
            CatalogFilter::Quick => r.time_minutes().is_some_and(|m| m < 30),
            CatalogFilter::Difficulty(d) => r.difficulty == d,
        })
        .collect()
}
