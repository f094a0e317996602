use clap::{Args, Subcommand};
use rebound_app::{
    database::{self, Db},
    domain::coupons::{PgCouponsService, records::CouponRecord},
};

mod create;
mod deactivate;
mod show;

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    Create(create::CreateCouponArgs),
    Show(show::ShowCouponArgs),
    Deactivate(deactivate::DeactivateCouponArgs),
}

pub(crate) async fn run(command: CouponCommand) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Create(args) => create::run(args).await,
        CouponSubcommand::Show(args) => show::run(args).await,
        CouponSubcommand::Deactivate(args) => deactivate::run(args).await,
    }
}

/// Coupon administration runs as the service role on both pools.
async fn service(database_url: &str) -> Result<PgCouponsService, String> {
    let db = Db::new(
        database::connect(database_url)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?,
    );

    Ok(PgCouponsService::new(db.clone(), db))
}

fn print_coupon(coupon: &CouponRecord) {
    println!("coupon_uuid: {}", coupon.uuid);
    println!("code: {}", coupon.code);
    println!("discount_type: {}", coupon.discount_type);
    println!("value: {}", coupon.value);

    if let Some(max_discount) = coupon.max_discount {
        println!("max_discount: {max_discount}");
    }

    if let Some(min_cart_value) = coupon.min_cart_value {
        println!("min_cart_value: {min_cart_value}");
    }

    println!("window: {} .. {}", coupon.starts_at, coupon.ends_at);
    println!("active: {}", coupon.is_active);
    println!("usage_limit_per_user: {}", coupon.usage_limit_per_user);

    match coupon.total_usage_limit {
        Some(limit) => println!("usage: {}/{limit}", coupon.total_usage_count),
        None => println!("usage: {}", coupon.total_usage_count),
    }
}
