//! txview main entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder;
use txview_config::{Config, DisplayConfig};
use txview_core::{
    FilePreferenceStore, FileTransactionSource, LoadState, SortConfig, SortField, SortOrder,
    Transaction, TransactionsView, ViewSettings,
};
use txview_utils::{format_amount, format_date};

#[derive(Parser, Debug)]
#[command(name = "txview")]
#[command(version = "0.1.0")]
#[command(about = "View, sort and delete pending transactions", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the transaction list
    List {
        /// Sort to apply and remember, e.g. amount-desc
        #[arg(long)]
        sort: Option<String>,
    },
    /// Select a sort column; repeating a column flips its direction
    Sort {
        field: String,
        #[arg(long)]
        order: Option<String>,
    },
    /// List the available sort options
    Sorts,
    /// Show the details of one transaction
    Show { id: String },
    /// Delete a pending authorization
    Delete { id: String },
    /// Print a default configuration file
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Command::InitConfig = args.command {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let config = if args.config.exists() {
        Config::load(&args.config)
            .map_err(|e| anyhow::anyhow!(e.to_details().to_string()))
            .with_context(|| format!("Failed to load {}", args.config.display()))?
    } else {
        Config::default()
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str()))
        .init();
    log::debug!(
        "Config loaded: source={}, preferences={}",
        config.source.path.display(),
        config.preferences.path.display()
    );

    let source = Arc::new(FileTransactionSource::new(config.source.path.clone()));
    let store = Arc::new(FilePreferenceStore::open(config.preferences.path.clone()));
    let view = TransactionsView::new(ViewSettings::from(&config), source, store);

    let rt = Builder::new_current_thread().enable_all().build()?;
    rt.block_on(run(args.command, &view, &config.display))
}

async fn run(command: Command, view: &TransactionsView, display: &DisplayConfig) -> anyhow::Result<()> {
    match command {
        Command::Sorts => {
            let current = view.sort_config();
            for option in SortConfig::options() {
                let marker = if option == current { "*" } else { " " };
                println!("{} {:<12} {}", marker, option.to_string(), option.label());
            }
            Ok(())
        }
        Command::Sort { field, order } => {
            let field: SortField = field.parse().map_err(|e| anyhow::anyhow!("{}", e))?;
            let order = order
                .map(|o| o.parse::<SortOrder>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            let config = view.set_sort(field, order);
            println!("Sorting by {}", config.label());
            Ok(())
        }
        Command::List { sort } => {
            if let Some(sort) = sort {
                view.set_sort_str(&sort).map_err(|e| anyhow::anyhow!(e.to_details().to_string()))?;
            }
            // a failed fetch is reported through the load state
            let _ = view.refresh().await;
            print_list(view, display);
            Ok(())
        }
        Command::Show { id } => {
            view.refresh().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            let transaction = view.select(&id).map_err(|e| anyhow::anyhow!(e.to_details().to_string()))?;
            print_detail(&transaction, display);
            view.clear_selection();
            Ok(())
        }
        Command::Delete { id } => {
            view.refresh().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            match view.delete_authorization(&id).await {
                Ok(()) => {
                    println!("Deleted {}", id);
                    print_list(view, display);
                    Ok(())
                }
                Err(e) => {
                    if let Some(notice) = view.delete_error() {
                        eprintln!("x {}", notice.message);
                        view.dismiss_delete_error();
                    }
                    Err(anyhow::anyhow!(e.to_details().to_string()))
                }
            }
        }
        Command::InitConfig => Ok(()),
    }
}

fn print_list(view: &TransactionsView, display: &DisplayConfig) {
    match view.load_state() {
        LoadState::Loading => println!("Loading transactions..."),
        LoadState::Failed { message } => {
            println!("Unable to load transactions: {}", message);
            println!("Run the command again to retry.");
        }
        LoadState::Empty => println!("No transactions found"),
        LoadState::Ready => {
            if let Some(error) = view.fetch_error() {
                println!("Showing the last loaded list; refresh failed: {}", error);
            }
            println!(
                "{:<28} {:>16}  {:<17} {:<14} {}",
                format!("Title {}", view.sort_indicator(SortField::Title)),
                format!("Amount {}", view.sort_indicator(SortField::Amount)),
                format!("Time {}", view.sort_indicator(SortField::Date)),
                format!("Status {}", view.sort_indicator(SortField::Status)),
                "Id"
            );
            for t in view.transactions().iter() {
                println!(
                    "{:<28} {:>16}  {:<17} {:<14} {}",
                    t.localizable_title,
                    money(t, display),
                    format_date(&t.time, &display.date_format),
                    t.status.as_str(),
                    t.id
                );
            }
        }
    }
}

fn money(t: &Transaction, display: &DisplayConfig) -> String {
    format_amount(
        t.billing_amount.amount,
        &t.billing_amount.currency,
        display.decimal_places,
        &display.thousands_separator,
    )
}

fn print_detail(t: &Transaction, display: &DisplayConfig) {
    println!("Transaction ID:  {}", t.id);
    println!("Title:           {}", t.localizable_title);
    println!("Type:            {}", t.kind);
    println!("Status:          {}", t.status);
    println!("Amount:          {}", money(t, display));
    println!("Date & Time:     {}", format_date(&t.time, &display.date_format));
    println!("Category:        {}", t.category_id);
    if let Some(original) = &t.transaction_amount {
        println!(
            "Original Amount: {}",
            format_amount(original.amount, &original.currency, display.decimal_places, &display.thousands_separator)
        );
    }
    if t.is_deletable() {
        println!("\nThis authorization can be deleted: txview delete {}", t.id);
    }
}
