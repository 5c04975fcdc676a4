//! Local recipe catalog loader
//!
//! Loads the bundled catalog from a JSON file. Callers treat a load
//! failure as an empty catalog, not a fatal error.

use std::path::Path;

use crate::recipe::Recipe;
use crate::{Error, Result};

/// Load recipes from a JSON catalog file
///
/// Every loaded recipe is normalized so `steps` is never empty.
///
/// # Errors
///
/// Returns [`Error::Catalog`] if the file cannot be read or parsed.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<Recipe>> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;

    let mut recipes: Vec<Recipe> = serde_json::from_str(&content)
        .map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;

    for recipe in &mut recipes {
        recipe.ensure_steps();
    }

    tracing::info!(path = %path.display(), count = recipes.len(), "catalog loaded");
    Ok(recipes)
}

/// Load the catalog, absorbing failure into an empty list
///
/// Failures are logged; a missing or malformed catalog is presented as
/// "no recipes", never as a crash.
#[must_use]
pub fn load_catalog_or_empty<P: AsRef<Path>>(path: P) -> Vec<Recipe> {
    match load_catalog(&path) {
        Ok(recipes) => recipes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load catalog, starting empty");
            Vec::new()
        }
    }
}

/// Find a recipe in the catalog by title (case-insensitive)
#[must_use]
pub fn find_by_title<'a>(recipes: &'a [Recipe], title: &str) -> Option<&'a Recipe> {
    recipes
        .iter()
        .find(|r| r.title.eq_ignore_ascii_case(title.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title":"Pasta","time":"20 mins","difficulty":"easy","category":"Italian","image":"pasta.jpg","steps":["Boil water","Add pasta"]}}]"#
        )
        .unwrap();

        let recipes = load_catalog(file.path()).unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "Pasta");
        assert_eq!(recipes[0].steps.len(), 2);
    }

    #[test]
    fn test_load_catalog_substitutes_empty_steps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title":"Mystery","time":"5 mins","steps":[]}}]"#
        )
        .unwrap();

        let recipes = load_catalog(file.path()).unwrap();
        assert_eq!(recipes[0].steps.len(), 1);
    }

    #[test]
    fn test_missing_file_is_empty_not_fatal() {
        let recipes = load_catalog_or_empty("/nonexistent/recipes.json");
        assert!(recipes.is_empty());
    }

    #[test]
    fn test_find_by_title_case_insensitive() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title":"Masala Chai","time":"10 mins","steps":["Boil"]}}]"#
        )
        .unwrap();

        let recipes = load_catalog(file.path()).unwrap();
        assert!(find_by_title(&recipes, "masala chai").is_some());
        assert!(find_by_title(&recipes, " MASALA CHAI ").is_some());
        assert!(find_by_title(&recipes, "biryani").is_none());
    }
}
