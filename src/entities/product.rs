use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::money::from_cents;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    #[sea_orm(string_value = "simple")]
    Simple,
    #[sea_orm(string_value = "variable")]
    Variable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[sea_orm(string_value = "in_stock")]
    InStock,
    #[sea_orm(string_value = "out_of_stock")]
    OutOfStock,
}

impl StockStatus {
    pub fn for_quantity(stock: i64) -> Self {
        if stock > 0 {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        }
    }
}

/// Catalog product. Stock and sales counters are mutated by order settlement.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub product_type: ProductType,
    pub vendor_id: Option<Uuid>,
    /// Category ids as a JSON array
    #[sea_orm(column_type = "Json")]
    pub category_ids: Json,
    pub price_cents: i64,
    pub on_sale: bool,
    /// For variable products, the sum of active variations' stock
    pub count_in_stock: i64,
    pub stock_status: StockStatus,
    pub endless_stock: bool,
    pub sale: i64,
    pub total_sales: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    pub fn price(&self) -> Decimal {
        from_cents(self.price_cents)
    }

    pub fn categories(&self) -> Vec<Uuid> {
        super::uuid_list(&self.category_ids)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_variation::Entity")]
    Variations,
}

impl Related<super::product_variation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
