//! # Inventory
//!
//! Product registration and lookup. Stock levels only move through sales,
//! returns, restocks and credits.

use std::sync::Arc;

use lonestar_core::period;
use lonestar_core::validation::{
    validate_price, validate_product_name, validate_stock, validate_store,
};
use lonestar_core::{CoreError, Money, NewProduct, Product, ValidationError};
use lonestar_db::{generate_id, Database, DbError};
use tracing::info;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
    config: Arc<EngineConfig>,
}

impl InventoryService {
    pub fn new(db: Database, config: Arc<EngineConfig>) -> Self {
        InventoryService { db, config }
    }

    /// Registers a product in a store.
    ///
    /// With a USD price, `price_lrd` is derived from the current rate and any
    /// LRD price in the request is ignored. Without one, `price_lrd` is
    /// required.
    pub async fn add_product(&self, request: NewProduct) -> EngineResult<Product> {
        let store = validate_store(&request.store)?;
        let name = validate_product_name(&request.name)?;
        validate_stock(request.quantity)?;
        if let Some(usd) = request.price_usd {
            validate_price("priceUsd", usd)?;
        }
        if let Some(lrd) = request.price_lrd {
            validate_price("priceLrd", lrd)?;
        }

        let mut uow = self.db.begin().await?;

        let price_lrd: Money = match request.price_usd {
            Some(usd) => {
                let current = uow.current_rate(self.config.default_rate()?).await?;
                let derived = current.rate.to_lrd(usd);
                validate_price("priceLrd", derived)?;
                derived
            }
            None => request
                .price_lrd
                .ok_or_else(|| ValidationError::required("priceLrd"))?,
        };

        let now = period::now();
        let product = Product {
            id: generate_id(),
            store,
            name,
            quantity: request.quantity,
            price_usd: request.price_usd,
            price_lrd,
            total_lrd: Some(price_lrd.times(request.quantity)),
            category: non_blank(request.category),
            barcode: non_blank(request.barcode),
            shelf_location: non_blank(request.shelf_location),
            created_at: now,
            updated_at: now,
        };

        uow.insert_product(&product)
            .await
            .map_err(|e| -> EngineError {
                match e {
                    DbError::UniqueViolation { .. } => ValidationError::Duplicate {
                        field: "name".to_string(),
                        value: product.name.clone(),
                    }
                    .into(),
                    other => other.into(),
                }
            })?;
        uow.commit().await?;

        info!(id = %product.id, store = %product.store, name = %product.name, "Product added");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str, store: &str) -> EngineResult<Product> {
        let store = validate_store(store)?;
        self.db
            .products()
            .get(id, &store)
            .await?
            .ok_or_else(|| {
                CoreError::ProductNotFound {
                    id: id.to_string(),
                    store,
                }
                .into()
            })
    }

    /// Every product in the store, by name.
    pub async fn list_products(&self, store: &str) -> EngineResult<Vec<Product>> {
        let store = validate_store(store)?;
        Ok(self.db.products().list_by_store(&store).await?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
