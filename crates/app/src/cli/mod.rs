use clap::{Parser, Subcommand};

mod coupon;
mod db;

#[derive(Debug, Parser)]
#[command(name = "rebound-app", about = "Rebound CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Coupon(coupon::CouponCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Coupon(command) => coupon::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}
