use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        gift_card::{self, normalize_code},
        gift_card_transaction::{self, GiftCardTransactionKind},
    },
    errors::ServiceError,
    models::money::{from_cents, to_cents},
};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_GROUPS: usize = 4;
const CODE_GROUP_LEN: usize = 4;

/// Random code in `XXXX-XXXX-XXXX-XXXX` form.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_GROUPS)
        .map(|_| {
            (0..CODE_GROUP_LEN)
                .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueGiftCardRequest {
    #[validate(length(min = 4, max = 64))]
    pub code: Option<String>,
    pub initial_balance: Decimal,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub bound_user_id: Option<Uuid>,
    #[validate(email)]
    pub recipient_email: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCardBalance {
    pub code: String,
    pub currency: String,
    pub initial_balance: Decimal,
    pub current_balance: Decimal,
    pub is_redeemed: bool,
    pub is_active: bool,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl From<&gift_card::Model> for GiftCardBalance {
    fn from(card: &gift_card::Model) -> Self {
        Self {
            code: card.code.clone(),
            currency: card.currency.clone(),
            initial_balance: card.initial_balance(),
            current_balance: card.current_balance(),
            is_redeemed: card.is_redeemed,
            is_active: card.is_active,
            expiry_date: card.expiry_date,
        }
    }
}

#[derive(Clone)]
pub struct GiftCardService {
    db: Arc<DatabaseConnection>,
    default_currency: String,
}

impl GiftCardService {
    pub fn new(db: Arc<DatabaseConnection>, default_currency: String) -> Self {
        Self {
            db,
            default_currency,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn issue(
        &self,
        request: IssueGiftCardRequest,
    ) -> Result<gift_card::Model, ServiceError> {
        request.validate()?;
        if request.initial_balance <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "initialBalance must be positive".to_string(),
            ));
        }

        let code = normalize_code(&request.code.unwrap_or_else(generate_code));
        if find_gift_card(&*self.db, &code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "gift card {} already exists",
                code
            )));
        }

        let now = Utc::now();
        let balance = to_cents(request.initial_balance)?;
        let card = gift_card::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            initial_balance_cents: Set(balance),
            current_balance_cents: Set(balance),
            currency: Set(request
                .currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| self.default_currency.clone())),
            bound_user_id: Set(request.bound_user_id),
            recipient_email: Set(request.recipient_email.map(|e| e.trim().to_lowercase())),
            expiry_date: Set(request.expiry_date),
            is_redeemed: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to issue gift card");
            ServiceError::DatabaseError(e)
        })?;

        info!(gift_card_id = %card.id, balance_cents = balance, "Gift card issued");
        Ok(card)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<gift_card::Model>, ServiceError> {
        find_gift_card(&*self.db, code).await
    }

    pub async fn get_balance(&self, code: &str) -> Result<GiftCardBalance, ServiceError> {
        let card = self.require(code).await?;
        Ok(GiftCardBalance::from(&card))
    }

    /// Adds value to a card. The ledger records the credit as a negative debit.
    #[instrument(skip(self))]
    pub async fn top_up(
        &self,
        code: &str,
        amount: Decimal,
    ) -> Result<gift_card_transaction::Model, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "top-up amount must be positive".to_string(),
            ));
        }
        let card = self.require(code).await?;
        let amount_cents = to_cents(amount)?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start top-up transaction");
            ServiceError::DatabaseError(e)
        })?;

        gift_card::Entity::update_many()
            .col_expr(
                gift_card::Column::CurrentBalanceCents,
                Expr::col(gift_card::Column::CurrentBalanceCents).add(amount_cents),
            )
            .col_expr(gift_card::Column::IsRedeemed, Expr::value(false))
            .col_expr(gift_card::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(gift_card::Column::Id.eq(card.id))
            .exec(&txn)
            .await?;

        let balance_after = reload_balance(&txn, card.id).await?;
        let entry = append_ledger(
            &txn,
            card.id,
            None,
            GiftCardTransactionKind::TopUp,
            -amount_cents,
            balance_after,
        )
        .await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit top-up");
            ServiceError::DatabaseError(e)
        })?;

        info!(gift_card_id = %card.id, balance = %from_cents(balance_after), "Gift card topped up");
        Ok(entry)
    }

    pub async fn transactions(
        &self,
        code: &str,
    ) -> Result<Vec<gift_card_transaction::Model>, ServiceError> {
        let card = self.require(code).await?;
        Ok(gift_card_transaction::Entity::find()
            .filter(gift_card_transaction::Column::GiftCardId.eq(card.id))
            .order_by_asc(gift_card_transaction::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn require(&self, code: &str) -> Result<gift_card::Model, ServiceError> {
        self.find_by_code(code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("gift card {}", normalize_code(code))))
    }
}

pub async fn find_gift_card<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<gift_card::Model>, ServiceError> {
    Ok(gift_card::Entity::find()
        .filter(gift_card::Column::Code.eq(normalize_code(code)))
        .one(conn)
        .await?)
}

/// Debits a card for an order. The balance guard and the decrement are one statement,
/// so two orders cannot spend the same balance.
pub async fn redeem<C: ConnectionTrait>(
    conn: &C,
    gift_card_id: Uuid,
    order_id: Uuid,
    amount_cents: i64,
) -> Result<gift_card_transaction::Model, ServiceError> {
    let result = gift_card::Entity::update_many()
        .col_expr(
            gift_card::Column::CurrentBalanceCents,
            Expr::col(gift_card::Column::CurrentBalanceCents).sub(amount_cents),
        )
        .col_expr(
            gift_card::Column::IsRedeemed,
            Expr::case(
                Expr::col(gift_card::Column::CurrentBalanceCents).lte(amount_cents),
                true,
            )
            .finally(false)
            .into(),
        )
        .col_expr(gift_card::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(gift_card::Column::Id.eq(gift_card_id))
        .filter(gift_card::Column::IsActive.eq(true))
        .filter(gift_card::Column::IsRedeemed.eq(false))
        .filter(gift_card::Column::CurrentBalanceCents.gte(amount_cents))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::GiftCardExhaustedOrExpired(
            "gift card balance changed before it could be redeemed".to_string(),
        ));
    }

    let balance_after = reload_balance(conn, gift_card_id).await?;
    append_ledger(
        conn,
        gift_card_id,
        Some(order_id),
        GiftCardTransactionKind::Redemption,
        amount_cents,
        balance_after,
    )
    .await
}

async fn reload_balance<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<i64, ServiceError> {
    gift_card::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(|card| card.current_balance_cents)
        .ok_or_else(|| ServiceError::NotFound(format!("gift card {}", id)))
}

async fn append_ledger<C: ConnectionTrait>(
    conn: &C,
    gift_card_id: Uuid,
    order_id: Option<Uuid>,
    kind: GiftCardTransactionKind,
    amount_cents: i64,
    balance_after_cents: i64,
) -> Result<gift_card_transaction::Model, ServiceError> {
    Ok(gift_card_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        gift_card_id: Set(gift_card_id),
        order_id: Set(order_id),
        kind: Set(kind),
        amount_cents: Set(amount_cents),
        balance_before_cents: Set(balance_after_cents + amount_cents),
        balance_after_cents: Set(balance_after_cents),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_grouped_and_normalize_cleanly() {
        let code = generate_code();
        assert_eq!(code.len(), 19);
        assert_eq!(code.split('-').count(), 4);
        let normalized = normalize_code(&code);
        assert_eq!(normalized.len(), 16);
        assert!(normalized
            .bytes()
            .all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn codes_differ() {
        assert_ne!(generate_code(), generate_code());
    }
}
