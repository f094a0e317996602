//! Coupons Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rebound::{
    cart::Cart,
    coupons::{CouponUsage, normalize_code},
    money::DEFAULT_CURRENCY,
};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        coupons::{
            CouponsServiceError,
            data::{CouponPreview, CouponPreviewRequest, NewCoupon},
            records::CouponRecord,
            repositories::{PgCouponUsagesRepository, PgCouponsRepository},
        },
        users::UserUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCouponsService {
    db: Db,
    service_db: Db,
    coupons: PgCouponsRepository,
    usages: PgCouponUsagesRepository,
}

impl PgCouponsService {
    /// `db` serves user-scoped reads; `service_db` administers coupons.
    #[must_use]
    pub fn new(db: Db, service_db: Db) -> Self {
        Self {
            db,
            service_db,
            coupons: PgCouponsRepository::new(),
            usages: PgCouponUsagesRepository::new(),
        }
    }
}

#[async_trait]
impl CouponsService for PgCouponsService {
    async fn get_coupon(&self, code: String) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.service_db.begin_transaction().await?;

        let coupon = self
            .coupons
            .find_coupon_by_code(&mut tx, &normalize_code(&code))
            .await?
            .ok_or(CouponsServiceError::NotFound)?;

        tx.commit().await?;

        Ok(coupon)
    }

    #[tracing::instrument(
        name = "coupons.service.preview",
        skip(self, request),
        fields(user_uuid = %user, item_count = request.items.len()),
        err
    )]
    async fn preview(
        &self,
        user: UserUuid,
        request: CouponPreviewRequest,
    ) -> Result<CouponPreview, CouponsServiceError> {
        let code = normalize_code(&request.code);

        let mut tx = self.db.begin_user_transaction(user).await?;

        let record = self
            .coupons
            .find_coupon_by_code(&mut tx, &code)
            .await?
            .ok_or(CouponsServiceError::NotFound)?;

        let usages: Vec<CouponUsage> = self
            .usages
            .list_user_usages(&mut tx, record.uuid, user)
            .await?
            .iter()
            .map(|usage| usage.to_usage())
            .collect();

        tx.commit().await?;

        let mut cart = Cart::new(DEFAULT_CURRENCY);

        for item in request.items {
            let _update = cart.add_item(item.product_id, item.unit_price, item.quantity.get())?;
        }

        let discount = cart.apply_coupon(
            &record.to_coupon(),
            user.into_uuid(),
            &usages,
            Timestamp::now(),
        )?;

        Ok(CouponPreview {
            code: record.code,
            subtotal: cart.subtotal(),
            discount,
            total: cart.compute_total(),
            currency: cart.currency().iso_alpha_code,
        })
    }

    #[tracing::instrument(
        name = "coupons.service.create_coupon",
        skip(self, coupon),
        fields(coupon_uuid = %coupon.uuid, discount_type = %coupon.discount_type),
        err
    )]
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError> {
        let coupon = NewCoupon {
            code: normalize_code(&coupon.code),
            ..coupon
        };

        if coupon.code.is_empty() || coupon.ends_at < coupon.starts_at {
            return Err(CouponsServiceError::InvalidData);
        }

        let mut tx = self.service_db.begin_transaction().await?;

        let record = self.coupons.create_coupon(&mut tx, coupon).await?;

        tx.commit().await?;

        info!(coupon_uuid = %record.uuid, code = %record.code, "created coupon");

        Ok(record)
    }

    #[tracing::instrument(name = "coupons.service.deactivate_coupon", skip(self), err)]
    async fn deactivate_coupon(&self, code: String) -> Result<CouponRecord, CouponsServiceError> {
        let mut tx = self.service_db.begin_transaction().await?;

        let record = self
            .coupons
            .deactivate_coupon(&mut tx, &normalize_code(&code))
            .await?;

        tx.commit().await?;

        info!(coupon_uuid = %record.uuid, code = %record.code, "deactivated coupon");

        Ok(record)
    }
}

#[automock]
#[async_trait]
pub trait CouponsService: Send + Sync {
    /// Look up a coupon by code, case-insensitively.
    async fn get_coupon(&self, code: String) -> Result<CouponRecord, CouponsServiceError>;

    /// Price a cart with a coupon for a user without redeeming it.
    async fn preview(
        &self,
        user: UserUuid,
        request: CouponPreviewRequest,
    ) -> Result<CouponPreview, CouponsServiceError>;

    /// Creates a new coupon.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<CouponRecord, CouponsServiceError>;

    /// Stop a coupon from being redeemed.
    async fn deactivate_coupon(&self, code: String) -> Result<CouponRecord, CouponsServiceError>;
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use jiff::SignedDuration;
    use rebound::{
        cart::CartLineItem,
        coupons::{CouponRejection, DiscountType},
    };
    use rust_decimal::Decimal;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::test::{TestContext, helpers::new_coupon};

    use super::*;

    fn items(price: i64, quantity: u32) -> Result<Vec<CartLineItem>, std::num::TryFromIntError> {
        Ok(vec![CartLineItem::new(
            Uuid::now_v7(),
            Decimal::from(price),
            NonZeroU32::try_from(quantity)?,
        )])
    }

    #[tokio::test]
    async fn create_coupon_normalizes_code() -> TestResult {
        let ctx = TestContext::new().await;

        let coupon = ctx
            .coupons
            .create_coupon(new_coupon(" save20 ", DiscountType::Percentage, 20))
            .await?;

        assert_eq!(coupon.code, "SAVE20");
        assert!(coupon.is_active);
        assert_eq!(coupon.total_usage_count, 0);

        let found = ctx.coupons.get_coupon("Save20".to_string()).await?;

        assert_eq!(found.uuid, coupon.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn create_coupon_duplicate_code_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.coupons
            .create_coupon(new_coupon("FLAT50", DiscountType::Fixed, 50))
            .await?;

        let result = ctx
            .coupons
            .create_coupon(new_coupon("flat50", DiscountType::Fixed, 10))
            .await;

        assert!(
            matches!(result, Err(CouponsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_coupon_rejects_inverted_window() {
        let ctx = TestContext::new().await;
        let coupon = new_coupon("BACKWARDS", DiscountType::Fixed, 5);

        let result = ctx
            .coupons
            .create_coupon(NewCoupon {
                ends_at: coupon.starts_at - SignedDuration::from_secs(1),
                ..coupon
            })
            .await;

        assert!(matches!(result, Err(CouponsServiceError::InvalidData)));
    }

    #[tokio::test]
    async fn get_coupon_unknown_code_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.coupons.get_coupon("NOPE".to_string()).await;

        assert!(matches!(result, Err(CouponsServiceError::NotFound)));
    }

    #[tokio::test]
    async fn preview_caps_percentage_discount() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.coupons
            .create_coupon(NewCoupon {
                max_discount: Some(Decimal::from(150)),
                ..new_coupon("SAVE20", DiscountType::Percentage, 20)
            })
            .await?;

        let preview = ctx
            .coupons
            .preview(
                ctx.user_uuid,
                CouponPreviewRequest {
                    code: "save20".to_string(),
                    items: items(500, 2)?,
                },
            )
            .await?;

        assert_eq!(preview.code, "SAVE20");
        assert_eq!(preview.subtotal, Decimal::from(1000));
        assert_eq!(preview.discount, Decimal::from(150));
        assert_eq!(preview.total, Decimal::from(850));
        assert_eq!(preview.currency, "INR");

        Ok(())
    }

    #[tokio::test]
    async fn preview_reports_rejection_reason() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.coupons
            .create_coupon(NewCoupon {
                min_cart_value: Some(Decimal::from(500)),
                ..new_coupon("BIG500", DiscountType::Fixed, 100)
            })
            .await?;

        let result = ctx
            .coupons
            .preview(
                ctx.user_uuid,
                CouponPreviewRequest {
                    code: "BIG500".to_string(),
                    items: items(40, 1)?,
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(CouponsServiceError::Rejected(
                    CouponRejection::MinimumCartValueNotMet
                ))
            ),
            "expected MinimumCartValueNotMet, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn deactivated_coupon_is_rejected_in_preview() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.coupons
            .create_coupon(new_coupon("GONE", DiscountType::Fixed, 10))
            .await?;

        let deactivated = ctx.coupons.deactivate_coupon("gone".to_string()).await?;

        assert!(!deactivated.is_active);

        let result = ctx
            .coupons
            .preview(
                ctx.user_uuid,
                CouponPreviewRequest {
                    code: "GONE".to_string(),
                    items: items(100, 1)?,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(CouponsServiceError::Rejected(CouponRejection::CouponInactive))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn deactivate_unknown_coupon_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.coupons.deactivate_coupon("MISSING".to_string()).await;

        assert!(matches!(result, Err(CouponsServiceError::NotFound)));
    }
}
