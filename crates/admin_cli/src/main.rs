use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, FeeSchedule, Money, Percent};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "mobipay_admin")]
#[command(about = "Admin utilities for MobiPay (bootstrap admins, fees, wallet credits)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./mobipay.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Fees(Fees),
    Wallet(Wallet),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    CreateAdmin(CreateAdminArgs),
}

#[derive(Args, Debug)]
struct CreateAdminArgs {
    #[arg(long)]
    username: String,
    #[arg(long, env = "MOBIPAY_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct Fees {
    #[command(subcommand)]
    command: FeesCommand,
}

#[derive(Subcommand, Debug)]
enum FeesCommand {
    Set(FeesSetArgs),
}

#[derive(Args, Debug)]
struct FeesSetArgs {
    /// Admin recorded as the author of the schedule.
    #[arg(long)]
    admin: String,
    /// Wallet transfer fee in percent (`1.5` or `1.5%`).
    #[arg(long, default_value = "0")]
    transfer: Percent,
    /// Mobile money fee in percent.
    #[arg(long, default_value = "0")]
    mobile_money: Percent,
    /// Minimum fee in taka (`5` or `5.50`); `0` means no minimum.
    #[arg(long, default_value = "0")]
    minimum: Money,
    /// Maximum fee in taka; `0` means no maximum.
    #[arg(long, default_value = "0")]
    maximum: Money,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Credit(WalletCreditArgs),
}

#[derive(Args, Debug)]
struct WalletCreditArgs {
    #[arg(long)]
    admin: String,
    #[arg(long)]
    user: String,
    /// Amount in taka (`10.50`).
    #[arg(long)]
    amount: Money,
    #[arg(long)]
    description: Option<String>,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::CreateAdmin(args),
        }) => {
            let admin = engine.create_admin(&args.username, &args.password).await?;
            println!("created admin: {} ({})", admin.username, admin.id);
        }
        Command::Fees(Fees {
            command: FeesCommand::Set(args),
        }) => {
            let admin = engine.user_by_username(&args.admin).await?;
            let schedule =
                FeeSchedule::new(args.transfer, args.mobile_money, args.minimum, args.maximum)?;
            let saved = engine.set_fee_schedule(admin.id, schedule).await?;
            println!(
                "fee schedule set: transfer {}, mobile money {}, min {}, max {}",
                saved.transfer_fee,
                saved.mobile_money_fee,
                saved.minimum_fee,
                saved.maximum_fee
            );
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Credit(args),
        }) => {
            let admin = engine.user_by_username(&args.admin).await?;
            let user = engine.user_by_username(&args.user).await?;
            let entry = engine
                .admin_credit(
                    admin.id,
                    user.id,
                    args.amount,
                    args.description.as_deref(),
                )
                .await?;
            println!(
                "credited {} to {} ({}), balance {}",
                entry.amount, user.username, entry.reference, entry.balance_after
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_credit_parses_decimal_taka() {
        let cli = Cli::try_parse_from([
            "mobipay_admin",
            "wallet",
            "credit",
            "--admin",
            "root",
            "--user",
            "alice",
            "--amount",
            "10.50",
        ])
        .unwrap();
        let Command::Wallet(Wallet {
            command: WalletCommand::Credit(args),
        }) = cli.command
        else {
            panic!("expected wallet credit");
        };
        assert_eq!(args.amount, Money::new(1050));
    }

    #[test]
    fn fees_set_parses_percentages_and_bounds() {
        let cli = Cli::try_parse_from([
            "mobipay_admin",
            "fees",
            "set",
            "--admin",
            "root",
            "--mobile-money",
            "1.5%",
            "--minimum",
            "5",
            "--maximum",
            "100",
        ])
        .unwrap();
        let Command::Fees(Fees {
            command: FeesCommand::Set(args),
        }) = cli.command
        else {
            panic!("expected fees set");
        };
        assert_eq!(args.mobile_money.basis_points(), 150);
        assert_eq!(args.transfer, Percent::ZERO);
        assert_eq!(args.minimum, Money::from_major(5));
        assert_eq!(args.maximum, Money::from_major(100));
    }

    #[test]
    fn amount_with_three_decimals_is_rejected() {
        let err = Cli::try_parse_from([
            "mobipay_admin",
            "wallet",
            "credit",
            "--admin",
            "root",
            "--user",
            "alice",
            "--amount",
            "1.005",
        ]);
        assert!(err.is_err());
    }
}
