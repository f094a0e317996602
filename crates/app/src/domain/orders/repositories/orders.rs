//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rebound::{cart::CartLineItem, coupons::DiscountType};
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};
use uuid::Uuid;

use crate::domain::{
    coupons::records::CouponUuid,
    orders::{
        data::OrderInsert,
        records::{CouponSnapshot, DeliveryAddress, OrderRecord, OrderStatus, OrderUuid},
    },
    users::UserUuid,
};

const ACQUIRE_ORDER_LOCK_SQL: &str = include_str!("../sql/acquire_order_lock.sql");
const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const FIND_ORDER_BY_IDEMPOTENCY_KEY_SQL: &str =
    include_str!("../sql/find_order_by_idempotency_key.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_BY_PROVIDER_ORDER_SQL: &str =
    include_str!("../sql/lock_order_by_provider_order.sql");
const MARK_ORDER_VERIFIED_SQL: &str = include_str!("../sql/mark_order_verified.sql");
const MARK_ORDER_FAILED_SQL: &str = include_str!("../sql/mark_order_failed.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Take a transaction-scoped advisory lock on `(user, idempotency_key)`.
    ///
    /// Concurrent checkouts with the same key queue here until the first commits.
    pub(crate) async fn acquire_order_lock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        idempotency_key: Uuid,
    ) -> Result<(), sqlx::Error> {
        query(ACQUIRE_ORDER_LOCK_SQL)
            .bind(format!("orders:{user}:{idempotency_key}"))
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Insert a new order; `None` if one already exists for the idempotency key.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderInsert,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let coupon = order.coupon.as_ref();

        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user_uuid.into_uuid())
            .bind(order.idempotency_key)
            .bind(order.provider_order_id)
            .bind(order.subtotal)
            .bind(order.amount_minor_units)
            .bind(order.currency)
            .bind(Json(&order.items))
            .bind(Json(&order.delivery_address))
            .bind(coupon.map(|c| c.coupon_uuid.into_uuid()))
            .bind(coupon.map(|c| c.code.as_str()))
            .bind(coupon.map(|c| c.discount_type.as_str()))
            .bind(coupon.map(|c| c.value))
            .bind(coupon.map(|c| c.discount))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_order_by_idempotency_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        idempotency_key: Uuid,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_IDEMPOTENCY_KEY_SQL)
            .bind(user.into_uuid())
            .bind(idempotency_key)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Select the user's order for a provider order `FOR UPDATE`.
    pub(crate) async fn lock_order_by_provider_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        provider_order_id: &str,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_BY_PROVIDER_ORDER_SQL)
            .bind(provider_order_id)
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Move a pending order to verified. Fails with `RowNotFound` if it is not pending.
    pub(crate) async fn mark_order_verified(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        provider_payment_id: &str,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(MARK_ORDER_VERIFIED_SQL)
            .bind(order.into_uuid())
            .bind(provider_payment_id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Move a pending order to failed. Fails with `RowNotFound` if it is not pending.
    pub(crate) async fn mark_order_failed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        reason: &str,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(MARK_ORDER_FAILED_SQL)
            .bind(order.into_uuid())
            .bind(reason)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        let Json(items) = row.try_get::<Json<Vec<CartLineItem>>, _>("items")?;
        let Json(delivery_address) = row.try_get::<Json<DeliveryAddress>, _>("delivery_address")?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            idempotency_key: row.try_get("idempotency_key")?,
            provider_order_id: row.try_get("provider_order_id")?,
            provider_payment_id: row.try_get("provider_payment_id")?,
            subtotal: row.try_get("subtotal")?,
            amount_minor_units: row.try_get("amount_minor_units")?,
            currency: row.try_get("currency")?,
            items,
            delivery_address,
            coupon: try_get_coupon_snapshot(row)?,
            status,
            failure_reason: row.try_get("failure_reason")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

fn try_get_coupon_snapshot(row: &PgRow) -> Result<Option<CouponSnapshot>, sqlx::Error> {
    let Some(coupon_uuid) = row.try_get::<Option<Uuid>, _>("coupon_uuid")? else {
        return Ok(None);
    };

    let discount_type: String = row.try_get("coupon_discount_type")?;
    let Ok(discount_type) = discount_type.parse::<DiscountType>();

    Ok(Some(CouponSnapshot {
        coupon_uuid: CouponUuid::from_uuid(coupon_uuid),
        code: row.try_get("coupon_code")?,
        discount_type,
        value: row.try_get::<Decimal, _>("coupon_value")?,
        discount: row.try_get::<Decimal, _>("coupon_discount")?,
    }))
}
