use std::sync::Arc;

use crate::storage::{ProductLedger, ProductRepository, Stores};

use super::entity::{NewProduct, Product, ProductQuery, ProductUpdate};
use super::errors::ProductError;
use super::value_objects::ProductId;

/// Catalog management on top of the product store. Stock movements caused
/// by orders never go through here; they use the ledger directly.
pub struct ProductCatalog {
    products: Arc<dyn ProductRepository>,
    ledger: Arc<dyn ProductLedger>,
}

impl ProductCatalog {
    pub fn new(stores: &Stores) -> Self {
        Self {
            products: stores.products.clone(),
            ledger: stores.ledger.clone(),
        }
    }

    pub async fn create(&self, input: NewProduct) -> Result<Product, ProductError> {
        let product = Product::create(input)?;
        self.products.insert(&product).await?;

        tracing::info!(product_id = %product.id, name = %product.name, qty = product.qty, "Product created");
        Ok(product)
    }

    pub async fn update(&self, id: ProductId, update: ProductUpdate) -> Result<Product, ProductError> {
        let mut product = self.find_by_id(id).await?;
        product.apply_update(update)?;

        if !self.products.update(&product).await? {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, qty = product.qty, "Product updated");
        Ok(product)
    }

    /// Orders that reference a deleted product keep their items as-is.
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        if !self.products.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn find_by_id(&self, id: ProductId) -> Result<Product, ProductError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    pub async fn find_all(&self, query: &ProductQuery) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.find_all(query).await?)
    }

    /// Products among `ids` that exist, in no particular order
    pub async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, ProductError> {
        Ok(self.ledger.find_many(ids).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductCategory;
    use crate::storage::InMemoryStore;
    use rust_decimal_macros::dec;

    fn catalog() -> ProductCatalog {
        ProductCatalog::new(&Stores::from_backend(InMemoryStore::default()))
    }

    fn new_product(name: &str, category: ProductCategory) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            qty: 4,
            price: dec!(18),
            category,
            image: Some("https://cdn.example.com/p.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let catalog = catalog();
        let created = catalog
            .create(new_product("Clay lamp", ProductCategory::Clay))
            .await
            .unwrap();

        let found = catalog.find_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_product() {
        let catalog = catalog();
        let mut input = new_product("Clay lamp", ProductCategory::Clay);
        input.qty = -2;

        let result = catalog.create(input).await;
        assert!(matches!(result, Err(ProductError::NegativeQuantity(-2))));
        assert!(catalog.find_all(&ProductQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let catalog = catalog();
        let created = catalog
            .create(new_product("Clay lamp", ProductCategory::Clay))
            .await
            .unwrap();

        let updated = catalog
            .update(
                created.id,
                ProductUpdate {
                    name: "Clay lantern".to_string(),
                    description: None,
                    qty: 12,
                    price: dec!(21),
                    category: ProductCategory::Clay,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.qty, 12);
        assert_eq!(updated.image, created.image);
        assert_eq!(catalog.find_by_id(created.id).await.unwrap().name, "Clay lantern");
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let catalog = catalog();
        let id = ProductId::new();

        assert!(matches!(catalog.find_by_id(id).await, Err(ProductError::NotFound(_))));
        assert!(matches!(catalog.delete(id).await, Err(ProductError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_product() {
        let catalog = catalog();
        let created = catalog
            .create(new_product("Oak spoon", ProductCategory::Wood))
            .await
            .unwrap();

        catalog.delete(created.id).await.unwrap();
        assert!(catalog.find_by_ids(&[created.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_all_with_filters() {
        let catalog = catalog();
        catalog.create(new_product("Oak spoon", ProductCategory::Wood)).await.unwrap();
        catalog.create(new_product("oak bowl", ProductCategory::Wood)).await.unwrap();
        catalog.create(new_product("Cotton sarong", ProductCategory::Textiles)).await.unwrap();

        let oak = catalog
            .find_all(&ProductQuery { name: Some("OAK".to_string()), category: None })
            .await
            .unwrap();
        let names: Vec<&str> = oak.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["oak bowl", "Oak spoon"]);

        let textiles = catalog
            .find_all(&ProductQuery { name: None, category: Some(ProductCategory::Textiles) })
            .await
            .unwrap();
        assert_eq!(textiles.len(), 1);
    }
}
