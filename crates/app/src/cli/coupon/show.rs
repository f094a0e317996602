use clap::Args;
use rebound_app::domain::coupons::CouponsService;

#[derive(Debug, Args)]
pub(crate) struct ShowCouponArgs {
    /// Redemption code, any case
    #[arg(long)]
    code: String,

    /// PostgreSQL connection string for the service role
    #[arg(long, env = "SERVICE_DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: ShowCouponArgs) -> Result<(), String> {
    let coupon = super::service(&args.database_url)
        .await?
        .get_coupon(args.code)
        .await
        .map_err(|error| format!("failed to load coupon: {error}"))?;

    super::print_coupon(&coupon);

    Ok(())
}
