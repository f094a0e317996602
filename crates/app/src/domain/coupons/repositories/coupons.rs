//! Coupons Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rebound::coupons::DiscountType;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::coupons::{
    data::NewCoupon,
    records::{CouponRecord, CouponUuid},
};

const COLUMN_USAGE_LIMIT_PER_USER: &str = "usage_limit_per_user";
const COLUMN_TOTAL_USAGE_LIMIT: &str = "total_usage_limit";
const COLUMN_TOTAL_USAGE_COUNT: &str = "total_usage_count";

const CREATE_COUPON_SQL: &str = include_str!("../sql/create_coupon.sql");
const FIND_COUPON_BY_CODE_SQL: &str = include_str!("../sql/find_coupon_by_code.sql");
const LOCK_COUPON_SQL: &str = include_str!("../sql/lock_coupon.sql");
const DEACTIVATE_COUPON_SQL: &str = include_str!("../sql/deactivate_coupon.sql");
const INCREMENT_COUPON_USAGE_SQL: &str = include_str!("../sql/increment_coupon_usage.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCouponsRepository;

impl PgCouponsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: NewCoupon,
    ) -> Result<CouponRecord, sqlx::Error> {
        let usage_limit_per_user =
            try_i32_from_u32(coupon.usage_limit_per_user, COLUMN_USAGE_LIMIT_PER_USER)?;

        let total_usage_limit = coupon
            .total_usage_limit
            .map(|limit| try_i32_from_u32(limit, COLUMN_TOTAL_USAGE_LIMIT))
            .transpose()?;

        query_as::<Postgres, CouponRecord>(CREATE_COUPON_SQL)
            .bind(coupon.uuid.into_uuid())
            .bind(coupon.code)
            .bind(coupon.discount_type.as_str())
            .bind(coupon.value)
            .bind(coupon.max_discount)
            .bind(coupon.min_cart_value)
            .bind(SqlxTimestamp::from(coupon.starts_at))
            .bind(SqlxTimestamp::from(coupon.ends_at))
            .bind(usage_limit_per_user)
            .bind(total_usage_limit)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_coupon_by_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<Option<CouponRecord>, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(FIND_COUPON_BY_CODE_SQL)
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Select the coupon row `FOR UPDATE`, serialising redemptions of the same coupon.
    pub(crate) async fn lock_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(LOCK_COUPON_SQL)
            .bind(coupon.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn deactivate_coupon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
    ) -> Result<CouponRecord, sqlx::Error> {
        query_as::<Postgres, CouponRecord>(DEACTIVATE_COUPON_SQL)
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn increment_usage_count(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        coupon: CouponUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(INCREMENT_COUPON_USAGE_SQL)
            .bind(coupon.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CouponRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let discount_type: String = row.try_get("discount_type")?;
        let Ok(discount_type) = discount_type.parse::<DiscountType>();

        Ok(Self {
            uuid: CouponUuid::from_uuid(row.try_get("uuid")?),
            code: row.try_get("code")?,
            discount_type,
            value: row.try_get("value")?,
            max_discount: row.try_get("max_discount")?,
            min_cart_value: row.try_get("min_cart_value")?,
            starts_at: row.try_get::<SqlxTimestamp, _>("starts_at")?.to_jiff(),
            ends_at: row.try_get::<SqlxTimestamp, _>("ends_at")?.to_jiff(),
            is_active: row.try_get("is_active")?,
            usage_limit_per_user: try_get_count(row, COLUMN_USAGE_LIMIT_PER_USER)?,
            total_usage_limit: row
                .try_get::<Option<i32>, _>(COLUMN_TOTAL_USAGE_LIMIT)?
                .map(|limit| try_u32_from_i32(limit, COLUMN_TOTAL_USAGE_LIMIT))
                .transpose()?,
            total_usage_count: try_get_count(row, COLUMN_TOTAL_USAGE_COUNT)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

fn try_get_count(row: &PgRow, column: &'static str) -> Result<u32, sqlx::Error> {
    try_u32_from_i32(row.try_get(column)?, column)
}

fn try_u32_from_i32(value: i32, column: &'static str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn try_i32_from_u32(value: u32, column: &'static str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
