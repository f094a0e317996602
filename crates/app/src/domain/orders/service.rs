//! Orders Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rebound::{
    cart::Cart,
    coupons::{CouponUsage, check_usage_limits, normalize_code},
    handoff::PaymentConfirmation,
    money::{DEFAULT_CURRENCY, to_minor_units},
};
use rusty_money::iso::Currency;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        coupons::repositories::{PgCouponUsagesRepository, PgCouponsRepository},
        orders::{
            OrdersServiceError,
            data::{NewOrder, OrderHandle, OrderInsert, VerifiedOrder},
            records::{
                CouponSnapshot, FAILURE_COUPON_REDEMPTION_REJECTED, FAILURE_SIGNATURE_MISMATCH,
                OrderRecord, OrderStatus, OrderUuid,
            },
            repositories::PgOrdersRepository,
        },
        users::UserUuid,
    },
    payments::{CreateProviderOrder, PaymentProvider, ProviderOrder, SignatureVerifier},
};

/// Authoritative checkout: reprices orders, talks to the provider and finalizes payments.
#[derive(Debug)]
pub struct PgOrdersService<P> {
    db: Db,
    service_db: Db,
    provider: P,
    verifier: SignatureVerifier,
    currency: &'static Currency,
    orders: PgOrdersRepository,
    coupons: PgCouponsRepository,
    usages: PgCouponUsagesRepository,
}

impl<P: PaymentProvider> PgOrdersService<P> {
    /// `db` serves user-scoped reads; `service_db` writes orders and redemptions.
    #[must_use]
    pub fn new(db: Db, service_db: Db, provider: P, verifier: SignatureVerifier) -> Self {
        Self {
            db,
            service_db,
            provider,
            verifier,
            currency: DEFAULT_CURRENCY,
            orders: PgOrdersRepository::new(),
            coupons: PgCouponsRepository::new(),
            usages: PgCouponUsagesRepository::new(),
        }
    }

    /// Build a cart from the requested items and apply the claimed coupon against live data.
    async fn price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        order: &NewOrder,
    ) -> Result<(Cart, Option<CouponSnapshot>), OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::EmptyOrder);
        }

        let mut cart = Cart::new(self.currency);

        for item in &order.items {
            // Each product appears on exactly one line.
            if cart.item(item.product_id).is_some() {
                return Err(OrdersServiceError::DuplicateItem(item.product_id));
            }

            let _update = cart.add_item(item.product_id, item.unit_price, item.quantity.get())?;
        }

        let Some(code) = order.coupon_code.as_deref() else {
            return Ok((cart, None));
        };

        let record = self
            .coupons
            .find_coupon_by_code(tx, &normalize_code(code))
            .await?
            .ok_or(OrdersServiceError::CouponNotFound)?;

        let usages: Vec<CouponUsage> = self
            .usages
            .list_user_usages(tx, record.uuid, user)
            .await?
            .iter()
            .map(|usage| usage.to_usage())
            .collect();

        let discount = cart
            .apply_coupon(
                &record.to_coupon(),
                user.into_uuid(),
                &usages,
                Timestamp::now(),
            )
            .map_err(OrdersServiceError::CouponRejected)?;

        Ok((
            cart,
            Some(CouponSnapshot {
                coupon_uuid: record.uuid,
                code: record.code,
                discount_type: record.discount_type,
                value: record.value,
                discount,
            }),
        ))
    }

    /// Reuse the provider order for `receipt` when it matches, otherwise create one.
    async fn provider_order(
        &self,
        receipt: String,
        amount: i64,
    ) -> Result<ProviderOrder, OrdersServiceError> {
        let currency = self.currency.iso_alpha_code;

        if let Some(existing) = self.provider.find_order_by_receipt(receipt.clone()).await? {
            if existing.amount == amount && existing.currency.eq_ignore_ascii_case(currency) {
                return Ok(existing);
            }

            warn!(
                receipt = %receipt,
                provider_order_id = %existing.id,
                "provider order for receipt does not match, creating a new one"
            );
        }

        Ok(self
            .provider
            .create_order(CreateProviderOrder {
                amount,
                currency: currency.to_string(),
                receipt,
            })
            .await?)
    }

    async fn fail_locked(
        &self,
        mut tx: Transaction<'_, Postgres>,
        order: &OrderRecord,
        reason: &str,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let failed = self.orders.mark_order_failed(&mut tx, order.uuid, reason).await?;

        tx.commit().await?;

        warn!(order_uuid = %failed.uuid, reason, "marked order failed");

        Ok(failed)
    }
}

#[async_trait]
impl<P: PaymentProvider> OrdersService for PgOrdersService<P> {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            user_uuid = %user,
            idempotency_key = %order.idempotency_key,
            item_count = order.items.len()
        ),
        err
    )]
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderHandle, OrdersServiceError> {
        let mut tx = self.service_db.begin_transaction().await?;

        self.orders
            .acquire_order_lock(&mut tx, user, order.idempotency_key)
            .await?;

        if let Some(existing) = self
            .orders
            .find_order_by_idempotency_key(&mut tx, user, order.idempotency_key)
            .await?
        {
            tx.commit().await?;

            info!(order_uuid = %existing.uuid, "returning existing order for idempotency key");

            return Ok(OrderHandle::from_record(&existing, self.provider.key_id()));
        }

        let (cart, coupon) = self.price(&mut tx, user, &order).await?;

        let amount_minor_units = to_minor_units(cart.compute_total(), self.currency)?;

        let receipt = format!("rcpt_{}", order.idempotency_key.simple());
        let provider_order = self.provider_order(receipt, amount_minor_units).await?;

        let insert = OrderInsert {
            uuid: OrderUuid::new(),
            user_uuid: user,
            idempotency_key: order.idempotency_key,
            provider_order_id: provider_order.id,
            subtotal: cart.subtotal(),
            amount_minor_units,
            currency: self.currency.iso_alpha_code,
            items: cart.snapshot().items,
            delivery_address: order.delivery_address,
            coupon,
        };

        let record = match self.orders.create_order(&mut tx, insert).await? {
            Some(record) => record,
            None => self
                .orders
                .find_order_by_idempotency_key(&mut tx, user, order.idempotency_key)
                .await?
                .ok_or(OrdersServiceError::OrderCreationConflict)?,
        };

        tx.commit().await?;

        info!(
            order_uuid = %record.uuid,
            provider_order_id = %record.provider_order_id,
            amount_minor_units = record.amount_minor_units,
            "created order"
        );

        Ok(OrderHandle::from_record(&record, self.provider.key_id()))
    }

    #[tracing::instrument(
        name = "orders.service.verify_payment",
        skip(self, confirmation),
        fields(
            user_uuid = %user,
            provider_order_id = %confirmation.provider_order_id,
            provider_payment_id = %confirmation.provider_payment_id
        ),
        err
    )]
    async fn verify_payment(
        &self,
        user: UserUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<VerifiedOrder, OrdersServiceError> {
        let mut tx = self.service_db.begin_transaction().await?;

        let order = self
            .orders
            .lock_order_by_provider_order(&mut tx, user, &confirmation.provider_order_id)
            .await?;

        match order.status {
            OrderStatus::Verified
                if order.provider_payment_id.as_deref()
                    == Some(confirmation.provider_payment_id.as_str()) =>
            {
                tx.commit().await?;

                return Ok(VerifiedOrder {
                    order_uuid: order.uuid,
                    status: order.status,
                });
            }
            OrderStatus::Verified => return Err(OrdersServiceError::AlreadyFinalized),
            OrderStatus::Failed => return Err(OrdersServiceError::VerificationFailed),
            OrderStatus::Pending => {}
        }

        if !self.verifier.verify(
            &confirmation.provider_order_id,
            &confirmation.provider_payment_id,
            &confirmation.provider_signature,
        ) {
            self.fail_locked(tx, &order, FAILURE_SIGNATURE_MISMATCH)
                .await?;

            return Err(OrdersServiceError::VerificationFailed);
        }

        if let Some(snapshot) = &order.coupon {
            let coupon = self.coupons.lock_coupon(&mut tx, snapshot.coupon_uuid).await?;

            let user_usage_count = self
                .usages
                .list_user_usages(&mut tx, snapshot.coupon_uuid, user)
                .await?
                .len();

            if let Err(rejection) = check_usage_limits(&coupon.to_coupon(), user_usage_count) {
                self.fail_locked(tx, &order, FAILURE_COUPON_REDEMPTION_REJECTED)
                    .await?;

                return Err(OrdersServiceError::CouponRedemptionRejected(rejection));
            }

            self.usages
                .create_usage(&mut tx, snapshot.coupon_uuid, user, order.uuid)
                .await?;

            self.coupons
                .increment_usage_count(&mut tx, snapshot.coupon_uuid)
                .await?;
        }

        let verified = self
            .orders
            .mark_order_verified(&mut tx, order.uuid, &confirmation.provider_payment_id)
            .await?;

        tx.commit().await?;

        info!(order_uuid = %verified.uuid, "verified order payment");

        Ok(VerifiedOrder {
            order_uuid: verified.uuid,
            status: verified.status,
        })
    }

    #[tracing::instrument(name = "orders.service.get_order", skip(self), err)]
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_user_transaction(user).await?;

        let record = self.orders.get_order(&mut tx, user, order).await?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(name = "orders.service.fail_order", skip(self), err)]
    async fn fail_order(
        &self,
        user: UserUuid,
        provider_order_id: String,
        reason: String,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.service_db.begin_transaction().await?;

        let order = self
            .orders
            .lock_order_by_provider_order(&mut tx, user, &provider_order_id)
            .await?;

        if order.status != OrderStatus::Pending {
            tx.commit().await?;

            return Ok(order);
        }

        self.fail_locked(tx, &order, &reason).await
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Reprice a checkout request and open a pending order with the provider.
    ///
    /// Repeating a request with the same idempotency key returns the original order.
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<OrderHandle, OrdersServiceError>;

    /// Check a payment confirmation and finalize the order it belongs to.
    async fn verify_payment(
        &self,
        user: UserUuid,
        confirmation: PaymentConfirmation,
    ) -> Result<VerifiedOrder, OrdersServiceError>;

    /// Read one of the user's orders.
    async fn get_order(
        &self,
        user: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Mark a pending order failed, e.g. after the user abandoned payment.
    async fn fail_order(
        &self,
        user: UserUuid,
        provider_order_id: String,
        reason: String,
    ) -> Result<OrderRecord, OrdersServiceError>;
}
