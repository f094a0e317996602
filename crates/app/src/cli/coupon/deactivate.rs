use clap::Args;
use rebound_app::domain::coupons::CouponsService;

#[derive(Debug, Args)]
pub(crate) struct DeactivateCouponArgs {
    /// Redemption code, any case
    #[arg(long)]
    code: String,

    /// PostgreSQL connection string for the service role
    #[arg(long, env = "SERVICE_DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: DeactivateCouponArgs) -> Result<(), String> {
    let coupon = super::service(&args.database_url)
        .await?
        .deactivate_coupon(args.code)
        .await
        .map_err(|error| format!("failed to deactivate coupon: {error}"))?;

    println!("deactivated coupon {} ({})", coupon.code, coupon.uuid);

    Ok(())
}
