//! ATM CLI
//!
//! Command-line front end for the ATM API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use atm_client::AtmClient;
use atm_types::{AccountId, DenominationSet, DepositAccumulator, DepositRequest, RegisterRequest};

#[derive(Parser)]
#[command(name = "atm")]
#[command(author, version, about = "ATM API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the ATM API
    #[arg(long, env = "ATM_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Note values the machine accepts, used to compose deposits
    #[arg(long, env = "ATM_DENOMINATIONS", default_value = "50,100,200,500")]
    denominations: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and show the session
    Login {
        mobile: String,
        #[arg(long)]
        pin: String,
    },
    /// Register a customer account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        pin: String,
    },
    /// Show the balance
    Balance { mobile: String },
    /// Deposit notes, e.g. `--note 500 --note 100x3`
    Deposit {
        mobile: String,
        /// A note value, optionally followed by `x<count>`
        #[arg(long = "note", required = true)]
        notes: Vec<String>,
    },
    /// Withdraw cash
    Withdraw {
        mobile: String,
        #[arg(long)]
        amount: i64,
    },
    /// Show the transaction history
    Transactions { mobile: String },
    /// Change the PIN
    ChangePin {
        mobile: String,
        #[arg(long)]
        old_pin: String,
        #[arg(long)]
        new_pin: String,
    },
    /// Administrator operations
    Admin {
        /// Administrator mobile number
        #[arg(long, env = "ATM_ADMIN_MOBILE")]
        admin_mobile: String,
        #[command(subcommand)]
        action: AdminCommands,
    },
    /// Check API health
    Health,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Add a customer account
    AddUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        pin: String,
    },
    /// Delete a customer account
    DeleteUser {
        /// Account ID (UUID)
        id: String,
    },
    /// List accounts
    Users,
    /// Transactions of one account, or of every account
    Transactions {
        /// Account ID (UUID)
        #[arg(long)]
        user: Option<String>,
    },
    /// Load notes into the machine, e.g. `--note 500x20`
    LoadCash {
        #[arg(long = "note", required = true)]
        notes: Vec<String>,
    },
    /// Cash held by the machine
    AtmBalance,
    /// Notes held by the machine
    Inventory,
    /// Compare the cash pool with its saved copy
    Reconcile,
}

fn parse_account_id(s: &str) -> Result<AccountId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid account ID: {}", s))
}

/// Parses `500` or `500x3` into a note value and a count.
fn parse_note(s: &str) -> Result<(u32, u32)> {
    let (value, count) = match s.split_once(['x', 'X']) {
        Some((value, count)) => (value, count),
        None => (s, "1"),
    };
    let value = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid note value: {}", s))?;
    let count = count
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid note count: {}", s))?;
    Ok((value, count))
}

/// Composes a deposit note by note, so the amount always matches the notes.
fn compose_deposit(allowed: DenominationSet, notes: &[String]) -> Result<DepositRequest> {
    let mut accumulator = DepositAccumulator::new(allowed);
    for note in notes {
        let (value, count) = parse_note(note)?;
        for _ in 0..count {
            accumulator.add_note(value)?;
        }
    }
    if accumulator.is_empty() {
        anyhow::bail!("A deposit needs at least one note");
    }
    Ok(accumulator.snapshot())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let allowed: DenominationSet = cli.denominations.parse()?;
    let client = AtmClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Login { mobile, pin } => print_json(&client.login(&mobile, &pin).await?)?,

        Commands::Register {
            name,
            email,
            mobile,
            pin,
        } => {
            let req = RegisterRequest {
                name,
                email,
                mobile,
                pin,
            };
            print_json(&client.register(&req).await?)?;
        }

        Commands::Balance { mobile } => {
            println!("Balance: {}", client.balance(&mobile).await?);
        }

        Commands::Deposit { mobile, notes } => {
            let req = compose_deposit(allowed, &notes)?;
            println!("Depositing {} ({})", req.amount, req.denominations);
            let balance = client.deposit(&mobile, &req).await?;
            println!("✓ New balance: {}", balance);
        }

        Commands::Withdraw { mobile, amount } => {
            let withdrawal = client.withdraw(&mobile, amount).await?;
            println!("✓ Dispensed: {}", withdrawal.dispensed);
            println!("  New balance: {}", withdrawal.balance);
        }

        Commands::Transactions { mobile } => print_json(&client.transactions(&mobile).await?)?,

        Commands::ChangePin {
            mobile,
            old_pin,
            new_pin,
        } => {
            let resp = client.change_pin(&mobile, &old_pin, &new_pin).await?;
            println!("✓ {}", resp.message);
        }

        Commands::Admin {
            admin_mobile,
            action,
        } => {
            let admin = client.with_admin_mobile(admin_mobile);
            match action {
                AdminCommands::AddUser {
                    name,
                    email,
                    mobile,
                    pin,
                } => {
                    let req = RegisterRequest {
                        name,
                        email,
                        mobile,
                        pin,
                    };
                    print_json(&admin.add_user(&req).await?)?;
                }
                AdminCommands::DeleteUser { id } => {
                    admin.delete_user(parse_account_id(&id)?).await?;
                    println!("✓ Account deleted");
                }
                AdminCommands::Users => print_json(&admin.list_users().await?)?,
                AdminCommands::Transactions { user } => match user {
                    Some(id) => {
                        print_json(&admin.user_transactions(parse_account_id(&id)?).await?)?
                    }
                    None => print_json(&admin.all_transactions().await?)?,
                },
                AdminCommands::LoadCash { notes } => {
                    let req = compose_deposit(allowed, &notes)?;
                    let total = admin.load_cash(&req).await?;
                    println!("✓ Loaded {}; machine now holds {}", req.amount, total);
                }
                AdminCommands::AtmBalance => {
                    println!("ATM balance: {}", admin.atm_balance().await?);
                }
                AdminCommands::Inventory => print_json(&admin.atm_inventory().await?)?,
                AdminCommands::Reconcile => print_json(&admin.reconcile().await?)?,
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note() {
        assert_eq!(parse_note("500").unwrap(), (500, 1));
        assert_eq!(parse_note("100x3").unwrap(), (100, 3));
        assert_eq!(parse_note("50X2").unwrap(), (50, 2));
        assert!(parse_note("abc").is_err());
        assert!(parse_note("100x").is_err());
    }

    #[test]
    fn test_compose_deposit_matches_notes() {
        let notes = vec!["500".to_string(), "100x3".to_string(), "500".to_string()];

        let req = compose_deposit(DenominationSet::default(), &notes).unwrap();

        assert_eq!(req.amount, 1300);
        assert_eq!(req.denominations.total_value().unwrap(), 1300);
        assert!(req.validate(&DenominationSet::default()).is_ok());
    }

    #[test]
    fn test_compose_deposit_rejects_foreign_note() {
        let notes = vec!["2000".to_string()];

        assert!(compose_deposit(DenominationSet::default(), &notes).is_err());
    }

    #[test]
    fn test_compose_deposit_rejects_empty() {
        let notes = vec!["100x0".to_string()];

        assert!(compose_deposit(DenominationSet::default(), &notes).is_err());
    }
}
