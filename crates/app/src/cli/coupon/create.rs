use clap::{Args, ValueEnum};
use jiff::Timestamp;
use rebound::coupons::DiscountType;
use rebound_app::domain::coupons::{CouponsService, data::NewCoupon, records::CouponUuid};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DiscountKind {
    Percentage,
    Fixed,
}

impl From<DiscountKind> for DiscountType {
    fn from(kind: DiscountKind) -> Self {
        match kind {
            DiscountKind::Percentage => Self::Percentage,
            DiscountKind::Fixed => Self::Fixed,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct CreateCouponArgs {
    /// Redemption code; stored upper-case
    #[arg(long)]
    code: String,

    #[arg(long, value_enum)]
    discount_type: DiscountKind,

    /// Percent off, or a fixed amount in major currency units
    #[arg(long)]
    value: Decimal,

    /// Cap on a percentage discount
    #[arg(long)]
    max_discount: Option<Decimal>,

    /// Minimum subtotal the coupon applies to
    #[arg(long)]
    min_cart_value: Option<Decimal>,

    /// Start of the validity window, e.g. 2026-11-01T00:00:00Z; defaults to now
    #[arg(long)]
    starts_at: Option<Timestamp>,

    /// End of the validity window
    #[arg(long)]
    ends_at: Timestamp,

    #[arg(long, default_value_t = 1)]
    usage_limit_per_user: u32,

    /// Redemptions allowed across all users; unlimited when omitted
    #[arg(long)]
    total_usage_limit: Option<u32>,

    /// PostgreSQL connection string for the service role
    #[arg(long, env = "SERVICE_DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: CreateCouponArgs) -> Result<(), String> {
    if args.value <= Decimal::ZERO {
        return Err("value must be positive".to_string());
    }

    let service = super::service(&args.database_url).await?;

    let coupon = service
        .create_coupon(NewCoupon {
            uuid: CouponUuid::new(),
            code: args.code,
            discount_type: args.discount_type.into(),
            value: args.value,
            max_discount: args.max_discount,
            min_cart_value: args.min_cart_value,
            starts_at: args.starts_at.unwrap_or_else(Timestamp::now),
            ends_at: args.ends_at,
            usage_limit_per_user: args.usage_limit_per_user,
            total_usage_limit: args.total_usage_limit,
        })
        .await
        .map_err(|error| format!("failed to create coupon: {error}"))?;

    super::print_coupon(&coupon);

    Ok(())
}
