use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Product Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalog category. Closed set, persisted by its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Clay,
    Textiles,
    Wood,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Clay => "CLAY",
            ProductCategory::Textiles => "TEXTILES",
            ProductCategory::Wood => "WOOD",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLAY" => Ok(ProductCategory::Clay),
            "TEXTILES" => Ok(ProductCategory::Textiles),
            "WOOD" => Ok(ProductCategory::Wood),
            other => Err(format!("unknown product category: {other}")),
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_format() {
        let json = serde_json::to_string(&ProductCategory::Textiles).unwrap();
        assert_eq!(json, "\"TEXTILES\"");

        let parsed: ProductCategory = serde_json::from_str("\"WOOD\"").unwrap();
        assert_eq!(parsed, ProductCategory::Wood);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(serde_json::from_str::<ProductCategory>("\"METAL\"").is_err());
        assert!("clay".parse::<ProductCategory>().is_err());
        assert_eq!("CLAY".parse::<ProductCategory>().unwrap(), ProductCategory::Clay);
    }

    #[test]
    fn test_product_id_is_transparent_in_json() {
        let id = ProductId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
