use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::ProductError;
use super::value_objects::{ProductCategory, ProductId};

// ============================================================================
// Product Entity
// ============================================================================
//
// `qty` is the ledger balance: the number of units still available for sale.
// Order placement reserves from it and cancellation gives units back; every
// other field belongs to catalog management.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub qty: i32,
    pub price: Decimal,
    pub category: ProductCategory,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for adding a product to the catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub qty: i32,
    pub price: Decimal,
    pub category: ProductCategory,
    #[serde(default)]
    pub image: Option<String>,
}

/// Full replacement of the editable catalog fields
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub qty: i32,
    pub price: Decimal,
    pub category: ProductCategory,
}

/// Catalog listing filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
}

impl ProductQuery {
    /// Name filter is a case-insensitive substring match
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = match self.name.as_deref() {
            Some(needle) if !needle.is_empty() => product
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };

        let category_ok = self.category.map_or(true, |c| c == product.category);

        name_ok && category_ok
    }
}

impl Product {
    pub fn create(input: NewProduct) -> Result<Self, ProductError> {
        validate(&input.name, input.qty, input.price)?;

        let now = Utc::now();
        Ok(Self {
            id: ProductId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            qty: input.qty,
            price: input.price,
            category: input.category,
            image: input.image,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: ProductUpdate) -> Result<(), ProductError> {
        validate(&update.name, update.qty, update.price)?;

        self.name = update.name.trim().to_string();
        self.description = update.description;
        self.qty = update.qty;
        self.price = update.price;
        self.category = update.category;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate(name: &str, qty: i32, price: Decimal) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::EmptyName);
    }
    if qty < 0 {
        return Err(ProductError::NegativeQuantity(qty));
    }
    if price < Decimal::ZERO {
        return Err(ProductError::NegativePrice);
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_vase() -> NewProduct {
        NewProduct {
            name: "Terracotta vase".to_string(),
            description: None,
            qty: 5,
            price: dec!(12.50),
            category: ProductCategory::Clay,
            image: None,
        }
    }

    #[test]
    fn test_create_product() {
        let product = Product::create(new_vase()).unwrap();
        assert_eq!(product.name, "Terracotta vase");
        assert_eq!(product.qty, 5);
        assert_eq!(product.price, dec!(12.50));
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_create_rejects_invalid_fields() {
        let mut input = new_vase();
        input.name = "   ".to_string();
        assert!(matches!(Product::create(input), Err(ProductError::EmptyName)));

        let mut input = new_vase();
        input.qty = -1;
        assert!(matches!(Product::create(input), Err(ProductError::NegativeQuantity(-1))));

        let mut input = new_vase();
        input.price = dec!(-0.01);
        assert!(matches!(Product::create(input), Err(ProductError::NegativePrice)));
    }

    #[test]
    fn test_zero_price_is_allowed() {
        let mut input = new_vase();
        input.price = Decimal::ZERO;
        assert!(Product::create(input).is_ok());
    }

    #[test]
    fn test_apply_update_replaces_fields() {
        let mut product = Product::create(new_vase()).unwrap();
        product
            .apply_update(ProductUpdate {
                name: "Oak bowl".to_string(),
                description: Some("Hand turned".to_string()),
                qty: 9,
                price: dec!(30),
                category: ProductCategory::Wood,
            })
            .unwrap();

        assert_eq!(product.name, "Oak bowl");
        assert_eq!(product.qty, 9);
        assert_eq!(product.category, ProductCategory::Wood);
        assert_eq!(product.description.as_deref(), Some("Hand turned"));
    }

    #[test]
    fn test_query_matches_name_case_insensitively() {
        let product = Product::create(new_vase()).unwrap();

        let query = ProductQuery { name: Some("VASE".to_string()), category: None };
        assert!(query.matches(&product));

        let query = ProductQuery { name: Some("bowl".to_string()), category: None };
        assert!(!query.matches(&product));

        let query = ProductQuery { name: None, category: Some(ProductCategory::Wood) };
        assert!(!query.matches(&product));
    }
}
