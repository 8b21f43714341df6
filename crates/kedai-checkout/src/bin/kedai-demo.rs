//! # Checkout Demo
//!
//! Runs one checkout against the in-memory backend and the sample catalog.
//!
//! ## Usage
//! ```bash
//! # Kiosk flow (default)
//! cargo run -p kedai-checkout --bin kedai-demo
//!
//! # Register flow with a split payment
//! KEDAI_CHECKOUT_FLOW=counter cargo run -p kedai-checkout --bin kedai-demo
//!
//! # Keep the cart slot somewhere disposable
//! KEDAI_DATA_DIR=/tmp/kedai RUST_LOG=debug cargo run -p kedai-checkout --bin kedai-demo
//! ```

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kedai_checkout::demo::demo_catalog;
use kedai_checkout::{
    Backend, CheckoutError, CheckoutFlow, CheckoutSession, ErrorResponse, InMemoryBackend,
    KioskPaymentMethod, PosConfig,
};
use kedai_core::{
    FulfillmentType, InventorySnapshot, PackageId, PaymentAllocation, PaymentSubCategory,
    ProductId, ProofAttachment, SaleUnitRef,
};
use kedai_store::CartService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = PosConfig::load_or_default(None);
    info!(
        device = %config.device.name,
        outlet = %config.location_id(),
        flow = %config.default_flow(),
        "Kedai demo starting"
    );

    let backend = InMemoryBackend::new(demo_catalog());
    let mut cart = CartService::open(config.cart_store()?, config.cart.storage_key.clone())?;

    let snapshot = InventorySnapshot::for_location(backend.fetch_catalog().await?, config.location_id());
    print_catalog(&snapshot);

    for (unit, times) in [
        (SaleUnitRef::Product(ProductId(1)), 2),
        (SaleUnitRef::Package(PackageId(1)), 1),
    ] {
        if let Some(sale_unit) = snapshot.sale_unit(unit) {
            for _ in 0..times {
                cart.add_to_cart(&sale_unit)?;
            }
        }
    }

    let totals = cart.totals();
    println!(
        "\nCart: {} lines, {} items, total {}",
        totals.item_count, totals.total_quantity, totals.total
    );

    let mut session = CheckoutSession::new(config.default_flow(), config.location_id(), &mut cart, &backend)
        .with_max_proof_bytes(config.checkout.max_proof_bytes);

    match config.default_flow() {
        CheckoutFlow::Kiosk => {
            session.set_fulfillment(FulfillmentType::Takeaway)?;
            session.choose_kiosk_method(KioskPaymentMethod::Qris)?;
            session.attach_proof(ProofAttachment {
                file_name: "bukti-qris.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: vec![0x89, b'P', b'N', b'G'],
            })?;
        }
        CheckoutFlow::Counter => {
            let total = session.total();
            let cash = session.add_allocation(PaymentAllocation::cash())?;
            let ewallet = session.add_allocation(PaymentAllocation::channel(
                PaymentSubCategory::EWallet,
                "GoPay",
            ))?;
            let half = total.units() / 2;
            session.set_allocation_amount(cash, &half.to_string())?;
            session.set_allocation_amount(ewallet, &(total.units() - half).to_string())?;
        }
    }

    match session.submit().await {
        Ok(receipt) => {
            println!("\nCommitted {}:", receipt.transaction_id);
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            for warning in &receipt.warnings {
                warn!(?warning, "Checkout finished with a warning");
            }
        }
        Err(CheckoutError::StockConflict(conflicts)) => {
            // A cart restored from an earlier run can outgrow the fresh catalog
            println!("\nStock changed, please adjust the cart:");
            for conflict in &conflicts {
                println!("  - {}", conflict);
            }
        }
        Err(e) => {
            println!("\n{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            return Err(e.into());
        }
    }

    for product in snapshot.products() {
        let left = backend.product_stock(product.id).unwrap_or(0);
        println!("{:<10} stock {:>3} → {:>3}", product.name, product.stock, left);
    }

    Ok(())
}

fn print_catalog(snapshot: &InventorySnapshot) {
    println!("Products:");
    for product in snapshot.products() {
        println!("  {:<14} {:>10}  stock {}", product.name, product.price.to_string(), product.stock);
    }
    println!("Packages:");
    for listed in snapshot.packages_with_stock() {
        println!(
            "  {:<14} {:>10}  stock {}",
            listed.package.name,
            listed.package.price.to_string(),
            listed.available_stock
        );
    }
    println!("Bundles:");
    for listed in snapshot.bundles_with_stock() {
        println!(
            "  {:<14} {:>10}  stock {}",
            listed.bundle.name,
            listed.bundle.price.to_string(),
            listed.available_stock
        );
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kedai_checkout=trace` - Trace the checkout only
/// - Default: INFO, DEBUG for kedai crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kedai=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
