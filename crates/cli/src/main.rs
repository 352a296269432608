use std::error::Error;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    AddTransactionCmd, Category, DateRange, Engine, EntryKind, MoneyCents, Transaction,
    TransactionListFilter, TransactionSnapshot, UpdateTransactionCmd, Wallet,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

mod settings;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "pocketbook")]
#[command(about = "Personal finance ledger (wallets, categories, transactions)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Print results as JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run migrations and install the default category set.
    Init,
    Wallet(WalletArgs),
    Category(CategoryArgs),
    Tx(TxArgs),
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct WalletArgs {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    /// Create a wallet with an opening balance.
    Create {
        #[arg(long)]
        name: String,
        /// Opening balance, e.g. "120.50".
        #[arg(long, default_value = "0")]
        balance: MoneyCents,
    },
    /// List wallets and the total balance.
    List,
    /// Rename a wallet.
    Rename {
        /// Wallet name or id.
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        name: String,
    },
    /// Delete a wallet with no transactions.
    Delete {
        /// Wallet name or id.
        #[arg(long)]
        wallet: String,
    },
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Add a category (no-op if it already exists).
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_kind)]
        kind: EntryKind,
    },
    /// List categories.
    List {
        #[arg(long, value_parser = parse_kind)]
        kind: Option<EntryKind>,
    },
    /// Rename a category.
    Rename {
        /// Category name or id.
        #[arg(long)]
        category: String,
        #[arg(long, value_parser = parse_kind)]
        kind: EntryKind,
        #[arg(long)]
        name: String,
    },
    /// Delete a category, detaching its transactions.
    Delete {
        /// Category name or id.
        #[arg(long)]
        category: String,
        #[arg(long, value_parser = parse_kind)]
        kind: EntryKind,
    },
}

#[derive(Args, Debug)]
struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    /// Record an income or expense.
    Add {
        #[arg(long)]
        name: String,
        /// Amount, e.g. "12.30".
        #[arg(long)]
        amount: MoneyCents,
        #[arg(long, value_parser = parse_kind)]
        kind: EntryKind,
        /// Wallet name or id.
        #[arg(long)]
        wallet: String,
        /// Category name or id; must match the transaction kind.
        #[arg(long)]
        category: Option<String>,
        /// Date of the event (YYYY-MM-DD), defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Edit an existing transaction; omitted fields keep their value.
    Edit {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<MoneyCents>,
        #[arg(long, value_parser = parse_kind)]
        kind: Option<EntryKind>,
        /// Wallet name or id; moving wallets rebalances both.
        #[arg(long)]
        wallet: Option<String>,
        /// Category name or id.
        #[arg(long)]
        category: Option<String>,
        /// Remove the category assignment.
        #[arg(long, conflicts_with = "category")]
        clear_category: bool,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a transaction, reversing its balance effect.
    Rm {
        #[arg(long)]
        id: Uuid,
    },
    /// List transactions, newest first.
    List {
        #[arg(long, value_parser = parse_kind)]
        kind: Option<EntryKind>,
        /// Restrict to a month (YYYY-MM).
        #[arg(long, value_parser = parse_month_range)]
        month: Option<DateRange>,
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Show one transaction with its category.
    Show {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(subcommand)]
    command: StatsCommand,
}

#[derive(Subcommand, Debug)]
enum StatsCommand {
    /// Income, expenses and net for a month (default: current).
    Month {
        #[arg(long, value_parser = parse_month_range)]
        month: Option<DateRange>,
    },
    /// Per-category totals for a month (default: current).
    Categories {
        #[arg(long, value_parser = parse_kind)]
        kind: EntryKind,
        #[arg(long, value_parser = parse_month_range)]
        month: Option<DateRange>,
    },
    /// Daily totals for the week containing a date (default: today).
    Weekly {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Monthly totals for a year (default: current).
    Yearly {
        #[arg(long)]
        year: Option<i32>,
    },
}

fn parse_kind(raw: &str) -> Result<EntryKind, String> {
    EntryKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_month_range(raw: &str) -> Result<DateRange, String> {
    let (year, month) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got: {raw}"))?;
    let year: i32 = year.parse().map_err(|_| format!("invalid year: {year}"))?;
    let month: u32 = month
        .parse()
        .map_err(|_| format!("invalid month: {month}"))?;
    DateRange::month(year, month).map_err(|err| err.to_string())
}

fn date_to_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::debug!(database_url, "database ready");
    Ok(db)
}

/// Resolve a wallet from a raw CLI argument: an id first, then a
/// case-insensitive name.
async fn resolve_wallet(engine: &Engine, raw: &str) -> CliResult<Wallet> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(engine.wallet(id).await?);
    }
    let wallets = engine.list_wallets().await?;
    wallets
        .into_iter()
        .find(|w| w.name.eq_ignore_ascii_case(raw))
        .ok_or_else(|| format!("wallet not found: {raw}").into())
}

/// Resolve a category from a raw CLI argument within one kind.
async fn resolve_category(engine: &Engine, raw: &str, kind: EntryKind) -> CliResult<Category> {
    let categories = engine.list_categories(Some(kind)).await?;
    if let Ok(id) = Uuid::parse_str(raw) {
        if let Some(category) = categories.into_iter().find(|c| c.id == id) {
            return Ok(category);
        }
        return Err(format!("category not found: {raw}").into());
    }
    categories
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(raw))
        .ok_or_else(|| format!("category not found: {raw}").into())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_transaction(tx: &Transaction, category_name: Option<&str>) {
    println!(
        "{}  {:7}  {:>12}  {}  [{}]  {}",
        tx.occurred_at.format("%Y-%m-%d"),
        tx.kind.as_str(),
        MoneyCents::new(tx.amount_minor).to_string(),
        tx.name,
        category_name.unwrap_or("-"),
        tx.id,
    );
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pocketbook={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let database_url = cli
        .database_url
        .unwrap_or_else(|| format!("sqlite:{}?mode=rwc", settings.sqlite.path));
    let db = connect_db(&database_url).await?;
    let engine = Engine::builder().database(db).build();
    let seeded = engine.ensure_default_categories().await?;

    match cli.command {
        Command::Init => {
            println!("database ready, {seeded} default categories installed");
        }
        Command::Wallet(WalletArgs { command }) => match command {
            WalletCommand::Create { name, balance } => {
                let wallet_id = engine.new_wallet(&name, balance.cents()).await?;
                println!("created wallet: {name} ({wallet_id})");
            }
            WalletCommand::List => {
                let wallets = engine.list_wallets().await?;
                if cli.json {
                    print_json(&wallets)?;
                } else {
                    for wallet in &wallets {
                        println!(
                            "{:>12}  {}  ({})",
                            MoneyCents::new(wallet.balance_minor).to_string(),
                            wallet.name,
                            wallet.id
                        );
                    }
                    let total = engine.total_balance().await?;
                    println!("{:>12}  total", MoneyCents::new(total).to_string());
                }
            }
            WalletCommand::Rename { wallet, name } => {
                let wallet = resolve_wallet(&engine, &wallet).await?;
                engine.rename_wallet(wallet.id, &name).await?;
                println!("renamed wallet: {} -> {name}", wallet.name);
            }
            WalletCommand::Delete { wallet } => {
                let wallet = resolve_wallet(&engine, &wallet).await?;
                engine.delete_wallet(wallet.id).await?;
                println!("deleted wallet: {}", wallet.name);
            }
        },
        Command::Category(CategoryArgs { command }) => match command {
            CategoryCommand::Add { name, kind } => {
                let category_id = engine.new_category(&name, kind).await?;
                println!("category: {name} ({category_id})");
            }
            CategoryCommand::List { kind } => {
                let categories = engine.list_categories(kind).await?;
                if cli.json {
                    print_json(&categories)?;
                } else {
                    for category in &categories {
                        println!(
                            "{:7}  {}  ({})",
                            category.kind.as_str(),
                            category.name,
                            category.id
                        );
                    }
                }
            }
            CategoryCommand::Rename {
                category,
                kind,
                name,
            } => {
                let category = resolve_category(&engine, &category, kind).await?;
                engine.update_category(category.id, &name, kind).await?;
                println!("renamed category: {} -> {name}", category.name);
            }
            CategoryCommand::Delete { category, kind } => {
                let category = resolve_category(&engine, &category, kind).await?;
                engine.delete_category(category.id).await?;
                println!("deleted category: {}", category.name);
            }
        },
        Command::Tx(TxArgs { command }) => match command {
            TxCommand::Add {
                name,
                amount,
                kind,
                wallet,
                category,
                date,
            } => {
                let wallet = resolve_wallet(&engine, &wallet).await?;
                let occurred_at = date.map_or_else(Utc::now, date_to_utc);

                let mut cmd =
                    AddTransactionCmd::new(&name, amount.cents(), kind, wallet.id, occurred_at);
                if let Some(category) = category {
                    let category = resolve_category(&engine, &category, kind).await?;
                    cmd = cmd.category_id(category.id);
                }

                let tx_id = engine.add_transaction(cmd).await?;
                println!("recorded {}: {name} ({tx_id})", kind.as_str());
            }
            TxCommand::Edit {
                id,
                name,
                amount,
                kind,
                wallet,
                category,
                clear_category,
                date,
            } => {
                let (current, _) = engine.transaction_with_category(id).await?;
                let old = TransactionSnapshot::from(&current);

                let kind = kind.unwrap_or(current.kind);
                let wallet_id = match wallet {
                    Some(raw) => resolve_wallet(&engine, &raw).await?.id,
                    None => current.wallet_id,
                };
                let category_id = if clear_category {
                    None
                } else {
                    match category {
                        Some(raw) => Some(resolve_category(&engine, &raw, kind).await?.id),
                        None => current.category_id,
                    }
                };

                let mut cmd = UpdateTransactionCmd::new(
                    id,
                    old,
                    name.unwrap_or(current.name),
                    amount.map_or(current.amount_minor, |m| m.cents()),
                    kind,
                    wallet_id,
                    date.map_or(current.occurred_at, date_to_utc),
                );
                if let Some(category_id) = category_id {
                    cmd = cmd.category_id(category_id);
                }

                engine.update_transaction(cmd).await?;
                println!("updated transaction: {id}");
            }
            TxCommand::Rm { id } => {
                engine.delete_transaction(id).await?;
                println!("deleted transaction: {id}");
            }
            TxCommand::List { kind, month, limit } => {
                let filter = TransactionListFilter {
                    kind,
                    range: month,
                    limit,
                };
                let txs = engine.list_transactions(&filter).await?;
                if cli.json {
                    print_json(&txs)?;
                } else {
                    for tx in &txs {
                        print_transaction(tx, None);
                    }
                }
            }
            TxCommand::Show { id } => {
                let (tx, category_name) = engine.transaction_with_category(id).await?;
                if cli.json {
                    print_json(&serde_json::json!({
                        "transaction": tx,
                        "category_name": category_name,
                    }))?;
                } else {
                    print_transaction(&tx, category_name.as_deref());
                }
            }
        },
        Command::Stats(StatsArgs { command }) => match command {
            StatsCommand::Month { month } => {
                let range = month.unwrap_or_else(|| DateRange::current_month(Utc::now()));
                let income = engine.sum_for_range(EntryKind::Income, &range).await?;
                let expenses = engine.sum_for_range(EntryKind::Expense, &range).await?;
                if cli.json {
                    print_json(&serde_json::json!({
                        "income_minor": income,
                        "expense_minor": expenses,
                        "net_minor": income - expenses,
                    }))?;
                } else {
                    println!("income:   {:>12}", MoneyCents::new(income).to_string());
                    println!("expenses: {:>12}", MoneyCents::new(expenses).to_string());
                    println!(
                        "net:      {:>12}",
                        MoneyCents::new(income - expenses).to_string()
                    );
                }
            }
            StatsCommand::Categories { kind, month } => {
                let range = month.unwrap_or_else(|| DateRange::current_month(Utc::now()));
                let totals = engine.category_totals(kind, &range).await?;
                if cli.json {
                    print_json(&totals)?;
                } else {
                    for total in &totals {
                        println!(
                            "{:>12}  {}",
                            MoneyCents::new(total.total_minor).to_string(),
                            total.category_name.as_deref().unwrap_or("(uncategorized)")
                        );
                    }
                }
            }
            StatsCommand::Weekly { date } => {
                let day = date.unwrap_or_else(|| Utc::now().date_naive());
                let range = DateRange::week_of(day);
                let buckets = engine.weekly_series(&range).await?;
                if cli.json {
                    print_json(&buckets)?;
                } else {
                    const DAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
                    for (day, bucket) in DAYS.iter().zip(buckets.iter()) {
                        println!(
                            "{day}  +{:>12}  -{:>12}",
                            MoneyCents::new(bucket.income_minor).to_string(),
                            MoneyCents::new(bucket.expense_minor).to_string()
                        );
                    }
                }
            }
            StatsCommand::Yearly { year } => {
                let year = year.unwrap_or_else(|| Utc::now().year());
                let buckets = engine.monthly_series(year).await?;
                if cli.json {
                    print_json(&buckets)?;
                } else {
                    for (month, bucket) in (1..=12).zip(buckets.iter()) {
                        println!(
                            "{year}-{month:02}  +{:>12}  -{:>12}",
                            MoneyCents::new(bucket.income_minor).to_string(),
                            MoneyCents::new(bucket.expense_minor).to_string()
                        );
                    }
                }
            }
        },
    }

    Ok(())
}
