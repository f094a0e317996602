//! Coupon Usages Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    coupons::records::{CouponUsageRecord, CouponUsageUuid, CouponUuid},
    orders::records::OrderUuid,
    users::UserUuid,
};

const LIST_USER_COUPON_USAGES_SQL: &str = include_str!("../sql/list_user_coupon_usages.sql");
const CREATE_COUPON_USAGE_SQL: &str = include_str!("../sql/create_coupon_usage.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponUsagesRepository;

impl PgCouponUsagesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_user_usages(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        user: UserUuid,
    ) -> Result<Vec<CouponUsageRecord>, sqlx::Error> {
        query_as::<Postgres, CouponUsageRecord>(LIST_USER_COUPON_USAGES_SQL)
            .bind(coupon.into_uuid())
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_usage(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<CouponUsageRecord, sqlx::Error> {
        query_as::<Postgres, CouponUsageRecord>(CREATE_COUPON_USAGE_SQL)
            .bind(CouponUsageUuid::new().into_uuid())
            .bind(coupon.into_uuid())
            .bind(user.into_uuid())
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CouponUsageRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CouponUsageUuid::from_uuid(row.try_get("uuid")?),
            coupon_uuid: CouponUuid::from_uuid(row.try_get("coupon_uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            used_at: row.try_get::<SqlxTimestamp, _>("used_at")?.to_jiff(),
        })
    }
}
