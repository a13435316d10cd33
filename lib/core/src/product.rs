use crate::{Error, Result};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// A catalog product record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub brand: String,
    pub price: f64,
    /// Image URL or local path
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl Product {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            brand: String::new(),
            price,
            image: image.into(),
            description: String::new(),
            tags: Vec::new(),
            color: None,
            material: None,
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// Case-insensitive substring match of a hint against tags, name and category
    pub fn matches_hint(&self, hint: &str) -> bool {
        let hint = hint.to_lowercase();
        if hint.is_empty() {
            return false;
        }
        self.tags.iter().any(|t| t.to_lowercase().contains(&hint))
            || self.name.to_lowercase().contains(&hint)
            || self.category.to_lowercase().contains(&hint)
    }
}

/// Ordered, read-only product list
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Arc<Product>>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and invalid prices
    pub fn new(products: Vec<Product>) -> Result<Self> {
        let mut seen = AHashSet::with_capacity(products.len());
        for product in &products {
            if !seen.insert(product.id.as_str()) {
                return Err(Error::Catalog(format!("duplicate product id: {}", product.id)));
            }
            if !product.price.is_finite() || product.price < 0.0 {
                return Err(Error::Catalog(format!(
                    "invalid price {} for product {}",
                    product.price, product.id
                )));
            }
        }

        Ok(Self {
            products: products.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.as_ref().display(),
            products = catalog.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Arc<Product>] {
        &self.products
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Product>> {
        self.products.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Product>> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<String> {
        self.products
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
