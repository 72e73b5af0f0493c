use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        json_list,
        product::{self, ProductType, StockStatus},
        product_variation,
    },
    errors::ServiceError,
    models::money::to_cents,
    services::inventory::refresh_parent_stock,
};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub product_type: ProductType,
    pub vendor_id: Option<Uuid>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    pub price: Decimal,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub count_in_stock: i64,
    #[serde(default)]
    pub endless_stock: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVariationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i64,
    #[serde(default)]
    pub endless_stock: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductWithVariations {
    pub product: product::Model,
    pub variations: Vec<product_variation::Model>,
}

/// Minimal catalog writes: enough to stock the products orders draw from.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;
        if request.price.is_sign_negative() {
            return Err(ServiceError::ValidationError("price cannot be negative".into()));
        }

        // Variable products start empty; stock arrives with their variations.
        let stock = match request.product_type {
            ProductType::Simple => request.count_in_stock,
            ProductType::Variable => 0,
        };
        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            product_type: Set(request.product_type),
            vendor_id: Set(request.vendor_id),
            category_ids: Set(json_list(&request.category_ids)),
            price_cents: Set(to_cents(request.price)?),
            on_sale: Set(request.on_sale),
            count_in_stock: Set(stock),
            stock_status: Set(if request.endless_stock {
                StockStatus::InStock
            } else {
                StockStatus::for_quantity(stock)
            }),
            endless_stock: Set(request.endless_stock),
            sale: Set(0),
            total_sales: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %model.id, "Product created");
        Ok(model)
    }

    #[instrument(skip(self, request))]
    pub async fn add_variation(
        &self,
        product_id: Uuid,
        request: CreateVariationRequest,
    ) -> Result<product_variation::Model, ServiceError> {
        request.validate()?;
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ProductOrVariationNotFound(product_id.to_string()))?;
        if product.product_type != ProductType::Variable {
            return Err(ServiceError::InvalidInput(format!(
                "product {} is not a variable product",
                product_id
            )));
        }

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let variation = product_variation::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            name: Set(request.name),
            attributes: Set(request.attributes),
            price_cents: Set(to_cents(request.price)?),
            stock: Set(request.stock),
            stock_status: Set(if request.endless_stock {
                StockStatus::InStock
            } else {
                StockStatus::for_quantity(request.stock)
            }),
            endless_stock: Set(request.endless_stock),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        refresh_parent_stock(&txn, product_id).await?;
        txn.commit().await?;

        Ok(variation)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductWithVariations, ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::ProductOrVariationNotFound(product_id.to_string()))?;
        let variations = product_variation::Entity::find()
            .filter(product_variation::Column::ProductId.eq(product_id))
            .order_by_asc(product_variation::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(ProductWithVariations {
            product,
            variations,
        })
    }
}
