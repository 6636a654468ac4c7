//! Command-line driver for the cart core.
//!
//! # Responsibility
//! - Run cart operations against an on-disk SQLite storage file.
//! - Print cart state and checkout payloads for local inspection.
//! - Submit the checkout through the order forwarder and its webhook.

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::error;
use sakura_cart_core::{
    core_version, default_log_level, format_usd, init_logging, load_order_note, save_order_note,
    AddItemRequest, CartLineItem, CartStore, CheckoutRequest, ForwardRequest, ForwardResponse,
    ForwarderConfig, OrderForwarder, ReqwestWebhookTransport, SqliteStorage,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "sakura-cart", version, about = "Inspect and edit a persisted Sakura Ramen cart")]
struct Cli {
    /// SQLite file backing the cart.
    #[arg(long, default_value = "sakura_cart.sqlite3")]
    db: PathBuf,
    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long)]
    log_dir: Option<String>,
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add units of a menu item.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        quantity: Option<u32>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Set the quantity of a line; below 1 removes it.
    SetQuantity {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: f64,
    },
    /// Remove a line.
    Remove { id: String },
    /// Replace the notes of a line.
    Note { id: String, note: String },
    /// Empty the cart and the stored order note.
    Clear,
    /// Print every line.
    List,
    /// Print item count and subtotal.
    Summary,
    /// Print the checkout request JSON.
    Checkout {
        /// Order note; the stored note is reused when omitted.
        #[arg(long)]
        note: Option<String>,
    },
    /// Run the checkout through the order forwarder and print its answer.
    Forward {
        /// Order note; the stored note is reused when omitted.
        #[arg(long)]
        note: Option<String>,
        /// Webhook endpoint; defaults to `ORDER_WEBHOOK_URL`.
        #[arg(long)]
        webhook_url: Option<String>,
    },
    /// Print the core version.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(&cli.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={}", message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Command::Version = cli.command {
        println!("sakura_cart_core version={}", core_version());
        return Ok(());
    }

    let storage = SqliteStorage::open(&cli.db)
        .map_err(|err| format!("cannot open `{}`: {err}", cli.db.display()))?;
    let mut cart = CartStore::new(storage);
    cart.initialize();

    match cli.command {
        Command::Add {
            name,
            price,
            id,
            description,
            quantity,
            notes,
        } => {
            let request = AddItemRequest {
                id,
                name,
                description,
                price,
                quantity,
                notes,
            };
            print_lines(&cart.add_item(request));
        }
        Command::SetQuantity { id, quantity } => print_lines(&cart.set_quantity(&id, quantity)),
        Command::Remove { id } => print_lines(&cart.remove_item(&id)),
        Command::Note { id, note } => print_lines(&cart.set_note(&id, note)),
        Command::Clear => {
            cart.clear();
            save_order_note(cart.storage(), cart.config(), "")
                .map_err(|err| format!("cannot clear order note: {err}"))?;
            println!("Cart cleared.");
        }
        Command::List => print_lines(&cart.snapshot()),
        Command::Summary => {
            println!("items={}", cart.item_count());
            println!("subtotal={}", format_usd(cart.subtotal()));
        }
        Command::Checkout { note } => {
            let request = checkout_request(&cart, note)?;
            let json = serde_json::to_string_pretty(&request).map_err(|err| err.to_string())?;
            println!("{json}");
        }
        Command::Forward { note, webhook_url } => {
            let request = checkout_request(&cart, note)?;
            let mut config = ForwarderConfig::from_env();
            if webhook_url.is_some() {
                config = config.with_webhook_url(webhook_url);
            }
            let transport = ReqwestWebhookTransport::new().map_err(|err| err.to_string())?;
            let forwarder = OrderForwarder::new(config, transport);

            let body = request.to_json().map_err(|err| err.to_string())?;
            let response = forwarder.handle(&ForwardRequest::post(body), Utc::now());
            println!(
                "status={} content_type={}",
                response.status_code,
                ForwardResponse::CONTENT_TYPE
            );
            println!("{}", response.body_text());
            if response.status_code != 200 {
                return Err(format!("order forwarding answered {}", response.status_code));
            }
        }
        Command::Version => {}
    }

    Ok(())
}

/// Builds the checkout request and stores the note it was built with.
fn checkout_request(
    cart: &CartStore<SqliteStorage>,
    note: Option<String>,
) -> Result<CheckoutRequest, String> {
    let note = match note {
        Some(note) => note,
        None => load_order_note(cart.storage(), cart.config()),
    };
    let request = CheckoutRequest::new(cart.order_summary(), &note, Utc::now())
        .map_err(|err| err.to_string())?;
    save_order_note(cart.storage(), cart.config(), &request.order_note)
        .map_err(|err| format!("cannot store order note: {err}"))?;
    Ok(request)
}

fn print_lines(items: &[CartLineItem]) {
    if items.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in items {
        println!(
            "{}\t{} x{}\t{} each\t{}",
            item.id,
            item.name,
            item.quantity,
            format_usd(item.price),
            format_usd(item.line_total())
        );
        if !item.notes.is_empty() {
            println!("\tnotes: {}", item.notes);
        }
    }
    let subtotal: f64 = items.iter().map(CartLineItem::line_total).sum();
    println!("Subtotal\t{}", format_usd(subtotal));
}
