//! Boycott/alternatives catalog — a JSON file the service reads its
//! domain knowledge from.
//!
//! Queries work on an in-memory snapshot ([`Catalog`]); [`JsonCatalog`]
//! loads one from disk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use badil_core::error::{BadilError, Result};
use badil_core::protocol::AlternativeEntry;

use crate::fuzzy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoycottCompany {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoycottProduct {
    pub name: String,
    pub product_type: String,
    /// Name of the boycotted company that makes it.
    pub company: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeCompany {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeProduct {
    pub name: String,
    pub product_type: String,
    /// Name of the alternative company that makes it.
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    /// Name of the boycott product this directly replaces, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_to: Option<String>,
}

/// Serialized catalog file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub boycott_companies: Vec<BoycottCompany>,
    #[serde(default)]
    pub boycott_products: Vec<BoycottProduct>,
    #[serde(default)]
    pub alternative_companies: Vec<AlternativeCompany>,
    #[serde(default)]
    pub alternative_products: Vec<AlternativeProduct>,
}

/// Queryable catalog snapshot.
#[derive(Debug)]
pub struct Catalog {
    data: CatalogData,
}

impl Catalog {
    pub fn from_data(data: CatalogData) -> Self {
        Self { data }
    }

    pub fn empty() -> Self {
        Self::from_data(CatalogData::default())
    }

    /// Best fuzzy match over the boycott companies, or `None` when the
    /// company is not boycotted.
    pub fn find_boycott(&self, company: &str) -> Option<(&BoycottCompany, f64)> {
        let mut best: Option<(&BoycottCompany, f64)> = None;
        for candidate in &self.data.boycott_companies {
            let score = fuzzy::similarity(company, &candidate.name);
            if score >= fuzzy::DEFAULT_THRESHOLD
                && best.is_none_or(|(_, best_score)| score > best_score)
            {
                best = Some((candidate, score));
            }
        }
        if let Some((hit, score)) = best {
            debug!(company, matched = %hit.name, score, "Boycott match");
        }
        best
    }

    /// Alternatives for a boycotted company's product. Direct replacements
    /// of that company's matching products come first (`is_exact_match`),
    /// followed by anything else of the same product type.
    pub fn alternatives_for(&self, company: &str, product_type: &str) -> Vec<AlternativeEntry> {
        // Products of the boycotted company in this category.
        let replaced: Vec<&str> = self
            .data
            .boycott_products
            .iter()
            .filter(|p| {
                fuzzy::is_match(&p.company, company, fuzzy::DEFAULT_THRESHOLD)
                    && fuzzy::is_match(&p.product_type, product_type, fuzzy::DEFAULT_THRESHOLD)
            })
            .map(|p| p.name.as_str())
            .collect();

        let mut exact = Vec::new();
        let mut by_type = Vec::new();

        for alt in &self.data.alternative_products {
            let is_exact = alt
                .alternative_to
                .as_deref()
                .is_some_and(|target| replaced.contains(&target));
            let same_type =
                fuzzy::is_match(&alt.product_type, product_type, fuzzy::DEFAULT_THRESHOLD);

            if is_exact {
                exact.push(self.entry_for(alt, true));
            } else if same_type {
                by_type.push(self.entry_for(alt, false));
            }
        }

        exact.extend(by_type);
        exact
    }

    fn entry_for(&self, alt: &AlternativeProduct, is_exact_match: bool) -> AlternativeEntry {
        let company_website = self
            .data
            .alternative_companies
            .iter()
            .find(|c| c.name == alt.company)
            .and_then(|c| c.website.clone());

        AlternativeEntry {
            product_name: alt.name.clone(),
            company_name: alt.company.clone(),
            product_type: alt.product_type.clone(),
            image_url: alt.image_url.clone(),
            company_website,
            is_exact_match,
        }
    }
}

/// File-backed catalog loader.
pub struct JsonCatalog {
    path: PathBuf,
}

impl JsonCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load a snapshot. A missing file is an empty catalog, not an error —
    /// a fresh deployment starts with nothing boycotted.
    pub async fn load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            return Ok(Catalog::empty());
        }
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| BadilError::StorageUnavailable(format!("{}: {e}", self.path.display())))?;
        let data: CatalogData = serde_json::from_str(&raw)
            .map_err(|e| BadilError::StorageUnavailable(format!("corrupt catalog: {e}")))?;
        Ok(Catalog::from_data(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_data(CatalogData {
            boycott_companies: vec![
                BoycottCompany {
                    name: "PepsiCo".into(),
                    cause: Some("funding reasons".into()),
                },
                BoycottCompany {
                    name: "Mondelez".into(),
                    cause: None,
                },
            ],
            boycott_products: vec![BoycottProduct {
                name: "7 Up".into(),
                product_type: "Soft Drink".into(),
                company: "PepsiCo".into(),
            }],
            alternative_companies: vec![AlternativeCompany {
                name: "Local Cola Co".into(),
                description: None,
                website: Some("https://localcola.example".into()),
            }],
            alternative_products: vec![
                AlternativeProduct {
                    name: "Cola Baladi".into(),
                    product_type: "Soft Drink".into(),
                    company: "Local Cola Co".into(),
                    image_url: None,
                    countries: vec!["EG".into()],
                    alternative_to: Some("7 Up".into()),
                },
                AlternativeProduct {
                    name: "Fizzy Pop".into(),
                    product_type: "Soft Drink".into(),
                    company: "Local Cola Co".into(),
                    image_url: None,
                    countries: vec![],
                    alternative_to: None,
                },
                AlternativeProduct {
                    name: "Choco Dream".into(),
                    product_type: "Chocolate".into(),
                    company: "Local Cola Co".into(),
                    image_url: None,
                    countries: vec![],
                    alternative_to: None,
                },
            ],
        })
    }

    #[test]
    fn test_find_boycott_fuzzy() {
        let catalog = sample();
        let (hit, score) = catalog.find_boycott("pepsico inc").unwrap();
        assert_eq!(hit.name, "PepsiCo");
        assert!(score >= fuzzy::DEFAULT_THRESHOLD);

        assert!(catalog.find_boycott("Totally Unrelated").is_none());
    }

    #[test]
    fn test_alternatives_exact_before_type() {
        let catalog = sample();
        let alts = catalog.alternatives_for("PepsiCo", "Soft Drink");
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].product_name, "Cola Baladi");
        assert!(alts[0].is_exact_match);
        assert_eq!(alts[1].product_name, "Fizzy Pop");
        assert!(!alts[1].is_exact_match);
        // Chocolate alternative stays out of a soft-drink query.
        assert!(alts.iter().all(|a| a.product_type == "Soft Drink"));
    }

    #[test]
    fn test_alternatives_carry_company_website() {
        let catalog = sample();
        let alts = catalog.alternatives_for("PepsiCo", "Soft Drink");
        assert_eq!(
            alts[0].company_website.as_deref(),
            Some("https://localcola.example")
        );
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let catalog = JsonCatalog::new("/nonexistent/catalog.json".into());
        let snapshot = catalog.load().await.unwrap();
        assert!(snapshot.find_boycott("PepsiCo").is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let data = CatalogData {
            boycott_companies: vec![BoycottCompany {
                name: "Mondelez".into(),
                cause: Some("cause text".into()),
            }],
            ..Default::default()
        };
        tokio::fs::write(&path, serde_json::to_string(&data).unwrap())
            .await
            .unwrap();

        let snapshot = JsonCatalog::new(path).load().await.unwrap();
        let (hit, _) = snapshot.find_boycott("Mondelez").unwrap();
        assert_eq!(hit.cause.as_deref(), Some("cause text"));
    }

    #[tokio::test]
    async fn test_corrupt_catalog_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, b"{{{{").await.unwrap();

        let err = JsonCatalog::new(path).load().await.unwrap_err();
        assert!(matches!(err, BadilError::StorageUnavailable(_)));
    }
}
