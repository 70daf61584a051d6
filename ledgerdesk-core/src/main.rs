use dotenv::dotenv;
use ledgerdesk_core::listing::{customer_names, summarize_invoices, InvoiceStatus};
use ledgerdesk_core::models::{InvoiceQuery, PaymentQuery};
use ledgerdesk_core::{ClientConfig, HttpApi, RemoteSynchronizer, Session};
use rust_decimal::Decimal;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prints a summary of the remote books: customers, open invoices, payments.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let config = ClientConfig::from_env()?;
    info!("Connecting to {}", config.api_base_url);

    let session = match config.api_token.as_deref() {
        Some(token) => Session::with_token(token),
        None => {
            warn!("LEDGERDESK_API_TOKEN is not set; requests are sent unauthenticated");
            Session::new()
        }
    };

    let api = HttpApi::new(&config, session)?;
    let sync = RemoteSynchronizer::new(api);

    let customers = sync
        .list_customers()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;
    let invoices = sync
        .list_invoices(&InvoiceQuery::default())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;
    let payments = sync
        .list_payments(&PaymentQuery::default())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e.user_message()))?;

    let rows = summarize_invoices(&invoices.invoices, &customer_names(&customers));
    let open: Vec<_> = rows
        .iter()
        .filter(|row| row.status == InvoiceStatus::Open)
        .collect();
    let outstanding: Decimal = open.iter().map(|row| row.balance).sum();
    let received: Decimal = payments
        .payments
        .iter()
        .filter_map(|payment| payment.total_amount)
        .sum();

    println!("Customers:      {}", customers.len());
    println!("Invoices:       {} ({} open)", rows.len(), open.len());
    println!("Outstanding:    {}", outstanding);
    println!("Payments:       {}", payments.payments.len());
    println!("Received:       {}", received);

    Ok(())
}
