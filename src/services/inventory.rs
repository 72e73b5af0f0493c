//! Stock and sales counter mutation for settled and cancelled orders.
//!
//! Every change is a single `UPDATE` whose new values are computed from the row's
//! current values, so concurrent orders never overwrite each other's decrements.

use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, Query, SimpleExpr, SubQueryStatement},
    ActiveEnum, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::StockPolicy,
    entities::{
        product::{self, ProductType, StockStatus},
        product_variation,
    },
    errors::ServiceError,
    metrics::STOCK_DEPLETIONS,
};

/// One order line as far as stock is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: Uuid,
    pub variation_id: Option<Uuid>,
    pub product_type: ProductType,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    Adjusted,
    /// This line took the last unit.
    Depleted,
    ProductMissing,
    VariationMissing,
}

#[derive(Debug, Clone, Copy)]
pub struct InventoryService {
    policy: StockPolicy,
}

impl InventoryService {
    pub fn new(policy: StockPolicy) -> Self {
        Self { policy }
    }

    /// Takes stock for one settled line and bumps the sales counters.
    ///
    /// A missing product or variation is logged and skipped. Under
    /// [`StockPolicy::Reject`] a short line fails with `InsufficientStock`.
    pub async fn decrement<C: ConnectionTrait>(
        &self,
        conn: &C,
        line: &StockLine,
    ) -> Result<StockOutcome, ServiceError> {
        let Some(product) = product::Entity::find_by_id(line.product_id).one(conn).await? else {
            warn!(product_id = %line.product_id, "Product not found, stock left untouched");
            return Ok(StockOutcome::ProductMissing);
        };

        match (line.product_type, line.variation_id) {
            (ProductType::Variable, Some(variation_id)) => {
                self.decrement_variation(conn, &product, variation_id, line.quantity)
                    .await
            }
            _ => self.decrement_simple(conn, &product, line.quantity).await,
        }
    }

    /// Gives stock back for one cancelled line and reverses `sale`. `total_sales` is a
    /// lifetime counter and keeps its value.
    pub async fn restore<C: ConnectionTrait>(
        &self,
        conn: &C,
        line: &StockLine,
    ) -> Result<StockOutcome, ServiceError> {
        let Some(product) = product::Entity::find_by_id(line.product_id).one(conn).await? else {
            warn!(product_id = %line.product_id, "Product not found, nothing to restore");
            return Ok(StockOutcome::ProductMissing);
        };
        let q = line.quantity;

        let mut outcome = StockOutcome::Adjusted;
        let mut update = product::Entity::update_many()
            .col_expr(product::Column::Sale, clamped_sub(product::Column::Sale, q))
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product.id));

        match (line.product_type, line.variation_id) {
            (ProductType::Variable, Some(variation_id)) => {
                let restored = product_variation::Entity::update_many()
                    .col_expr(
                        product_variation::Column::Stock,
                        Expr::col(product_variation::Column::Stock).add(q),
                    )
                    .col_expr(
                        product_variation::Column::StockStatus,
                        status_case(Expr::col(product_variation::Column::Stock).add(q)),
                    )
                    .col_expr(product_variation::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(product_variation::Column::Id.eq(variation_id))
                    .filter(product_variation::Column::ProductId.eq(product.id))
                    .filter(product_variation::Column::EndlessStock.eq(false))
                    .exec(conn)
                    .await?;
                if restored.rows_affected == 0 {
                    debug!(variation_id = %variation_id, "variation missing or endless, stock not restored");
                    outcome = StockOutcome::VariationMissing;
                }
                refresh_parent_stock(conn, product.id).await?;
            }
            _ if !product.endless_stock => {
                update = update
                    .col_expr(
                        product::Column::CountInStock,
                        Expr::col(product::Column::CountInStock).add(q),
                    )
                    .col_expr(
                        product::Column::StockStatus,
                        status_case(Expr::col(product::Column::CountInStock).add(q)),
                    );
            }
            _ => {}
        }

        update.exec(conn).await?;
        Ok(outcome)
    }

    async fn decrement_simple<C: ConnectionTrait>(
        &self,
        conn: &C,
        product: &product::Model,
        q: i64,
    ) -> Result<StockOutcome, ServiceError> {
        let mut update = product::Entity::update_many()
            .col_expr(product::Column::Sale, Expr::col(product::Column::Sale).add(q))
            .col_expr(
                product::Column::TotalSales,
                Expr::col(product::Column::TotalSales).add(q),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product.id));

        if !product.endless_stock {
            update = update
                .col_expr(
                    product::Column::CountInStock,
                    clamped_sub(product::Column::CountInStock, q),
                )
                .col_expr(
                    product::Column::StockStatus,
                    status_case(Expr::col(product::Column::CountInStock).sub(q)),
                );
            if self.policy == StockPolicy::Reject {
                update = update.filter(product::Column::CountInStock.gte(q));
            }
        }

        if update.exec(conn).await?.rows_affected == 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "product {} has fewer than {} units",
                product.id, q
            )));
        }

        if !product.endless_stock && product.count_in_stock > 0 && product.count_in_stock <= q {
            STOCK_DEPLETIONS.inc();
            return Ok(StockOutcome::Depleted);
        }
        Ok(StockOutcome::Adjusted)
    }

    async fn decrement_variation<C: ConnectionTrait>(
        &self,
        conn: &C,
        product: &product::Model,
        variation_id: Uuid,
        q: i64,
    ) -> Result<StockOutcome, ServiceError> {
        let variation = product_variation::Entity::find_by_id(variation_id)
            .filter(product_variation::Column::ProductId.eq(product.id))
            .one(conn)
            .await?;

        let mut outcome = StockOutcome::Adjusted;
        match &variation {
            None => {
                warn!(
                    product_id = %product.id,
                    variation_id = %variation_id,
                    "Variation not found, only sales counters updated"
                );
                outcome = StockOutcome::VariationMissing;
            }
            Some(v) if v.endless_stock => {}
            Some(v) => {
                let mut update = product_variation::Entity::update_many()
                    .col_expr(
                        product_variation::Column::Stock,
                        clamped_sub(product_variation::Column::Stock, q),
                    )
                    .col_expr(
                        product_variation::Column::StockStatus,
                        status_case(Expr::col(product_variation::Column::Stock).sub(q)),
                    )
                    .col_expr(product_variation::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(product_variation::Column::Id.eq(v.id));
                if self.policy == StockPolicy::Reject {
                    update = update.filter(product_variation::Column::Stock.gte(q));
                }
                if update.exec(conn).await?.rows_affected == 0 {
                    return Err(ServiceError::InsufficientStock(format!(
                        "variation {} has fewer than {} units",
                        v.id, q
                    )));
                }
                if v.stock > 0 && v.stock <= q {
                    STOCK_DEPLETIONS.inc();
                    outcome = StockOutcome::Depleted;
                }
                refresh_parent_stock(conn, product.id).await?;
            }
        }

        product::Entity::update_many()
            .col_expr(product::Column::Sale, Expr::col(product::Column::Sale).add(q))
            .col_expr(
                product::Column::TotalSales,
                Expr::col(product::Column::TotalSales).add(q),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product.id))
            .exec(conn)
            .await?;

        Ok(outcome)
    }
}

/// Recomputes a variable product's `count_in_stock` as the sum over its active
/// variations, in SQL. The parent stays in stock while any active variation is endless.
pub async fn refresh_parent_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> Result<(), ServiceError> {
    let active_stock = || {
        let select = Query::select()
            .expr(Func::coalesce([
                SimpleExpr::from(Func::sum(Expr::col(product_variation::Column::Stock))),
                Expr::val(0i64).into(),
            ]))
            .from(product_variation::Entity)
            .and_where(Expr::col(product_variation::Column::ProductId).eq(product_id))
            .and_where(Expr::col(product_variation::Column::IsActive).eq(true))
            .to_owned();
        SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(select)))
    };

    let endless = Query::select()
        .expr(Expr::val(1i64))
        .from(product_variation::Entity)
        .and_where(Expr::col(product_variation::Column::ProductId).eq(product_id))
        .and_where(Expr::col(product_variation::Column::IsActive).eq(true))
        .and_where(Expr::col(product_variation::Column::EndlessStock).eq(true))
        .to_owned();
    let available = Expr::expr(active_stock())
        .gt(0i64)
        .or(Expr::exists(endless));
    let status = Expr::case(available, StockStatus::InStock.to_value())
        .finally(StockStatus::OutOfStock.to_value());

    product::Entity::update_many()
        .col_expr(product::Column::CountInStock, active_stock())
        .col_expr(product::Column::StockStatus, status.into())
        .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// `CASE WHEN col > q THEN col - q ELSE 0 END`
fn clamped_sub<C>(column: C, q: i64) -> SimpleExpr
where
    C: ColumnTrait,
{
    Expr::case(Expr::col(column).gt(q), Expr::col(column).sub(q))
        .finally(0i64)
        .into()
}

/// Stock status for a computed stock expression.
fn status_case(stock: impl Into<SimpleExpr>) -> SimpleExpr {
    Expr::case(
        Expr::expr(stock).gt(0i64),
        StockStatus::InStock.to_value(),
    )
    .finally(StockStatus::OutOfStock.to_value())
    .into()
}
