//! # Product Commands
//!
//! Catalog registration and listing for one store.

use lonestar_core::{NewProduct, Product};
use tracing::debug;

use super::{require, ApiResponse, CommandResult};
use crate::Engine;

pub async fn add_product(engine: &Engine, request: NewProduct) -> CommandResult<Product> {
    let product = engine.inventory().add_product(request).await?;
    Ok(ApiResponse::created(product))
}

pub async fn get_product(engine: &Engine, id: &str, store: Option<String>) -> CommandResult<Product> {
    let store = require(&store, "store")?;
    let product = engine.inventory().get_product(id, store).await?;
    Ok(ApiResponse::ok(product))
}

pub async fn list_products(engine: &Engine, store: Option<String>) -> CommandResult<Vec<Product>> {
    let store = require(&store, "store")?;
    let products = engine.inventory().list_products(store).await?;
    debug!(store, count = products.len(), "Products listed");
    Ok(ApiResponse::ok(products))
}
