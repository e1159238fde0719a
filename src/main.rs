mod domain;
mod clients;
mod messages;
mod authz;
mod notifications;
mod dashboard;

mod app_system;

#[cfg(test)]
mod mock_framework;

mod actor_framework;
mod profile_actor;
mod canteen_actor;
mod menu_actor;
mod order_service;

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info, warn, Instrument};

use crate::app_system::{setup_tracing, CanteenSystem, Config};
use crate::dashboard::{StudentDashboard, VendorDashboard};
use crate::domain::money::format_inr;
use crate::domain::{Cart, MenuItemCreate, NewCanteen, Principal, Role, SignUp};
use crate::notifications::{LogNotifier, NotificationPermission, Notifier};

#[tokio::main]
async fn main() -> Result<(), String> {
    // A missing .env is fine; real deployments set the variables directly.
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }
    let config = Config::from_env();
    // Setup tracing once for the entire application
    setup_tracing(&config.log_filter);

    info!(?config, "Starting CanteenGo order system");

    // Create the entire system (starts all actors)
    let system = CanteenSystem::new(&config);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    // Accounts, a canteen and its menu
    let span = tracing::info_span!("setup");
    let (vendor, student, menu) = async {
        let vendor = system
            .profile_client
            .register(SignUp::new("vendor@campus.edu", Some("Main Canteen Staff"), Role::Vendor))
            .await
            .map_err(|e| e.to_string())?;
        let student = system
            .profile_client
            .register(SignUp::new("asha@campus.edu", Some("Asha"), Role::Student))
            .await
            .map_err(|e| e.to_string())?;
        let vendor = Principal::from(&vendor);
        let student = Principal::from(&student);

        let canteen = system
            .canteen_client
            .create_canteen(&vendor, NewCanteen::new("Main Canteen", "Block A"))
            .await
            .map_err(|e| e.to_string())?;
        for (name, price) in [("Masala Dosa", 50), ("Chai", 30)] {
            system
                .menu_client
                .add_item(&vendor, MenuItemCreate::new(canteen.id.clone(), name, Decimal::new(price, 0)))
                .await
                .map_err(|e| e.to_string())?;
        }
        let menu = system
            .menu_client
            .list_menu(canteen.id.clone(), true)
            .await
            .map_err(|e| e.to_string())?;
        Ok::<_, String>((vendor, student, menu))
    }
    .instrument(span)
    .await?;

    info!(vendor_id = %vendor.user_id, student_id = %student.user_id, items = menu.len(), "Setup complete");

    let mut student_view = StudentDashboard::mount(
        &system,
        student.user_id.clone(),
        notifier.clone(),
        NotificationPermission::Granted,
    )
    .await
    .map_err(|e| e.to_string())?;
    let mut vendor_view = VendorDashboard::mount(&system, vendor.user_id.clone(), notifier.clone())
        .await
        .map_err(|e| e.to_string())?;

    // Student fills a cart: 2x dosa, 1x chai
    let mut cart = Cart::new();
    for item in &menu {
        let times = if item.name == "Masala Dosa" { 2 } else { 1 };
        for _ in 0..times {
            if let Err(e) = cart.add(item) {
                warn!(error = %e, "Could not add item to cart");
            }
        }
    }

    let span = tracing::info_span!("order_processing");
    let order_result = async {
        let total = cart.total().map(format_inr).unwrap_or_default();
        info!(%total, "Placing order");
        let order = student_view.place_order(&mut cart).await?;
        vendor_view.process_next_change().await;

        vendor_view.mark_ready(order.id.clone()).await?;
        student_view.process_next_change().await;

        vendor_view.mark_completed(order.id.clone()).await?;
        student_view.process_next_change().await;
        Ok::<_, crate::order_service::OrderError>(order)
    }
    .instrument(span)
    .await;

    match order_result {
        Ok(order) => {
            let code = order.pickup_code.map(|c| c.to_string()).unwrap_or_default();
            info!(order_id = %order.id, pickup_code = %code, "Order lifecycle completed successfully");
        }
        Err(e) => {
            error!(error = %e, "Order processing failed")
        }
    }

    student_view.teardown();
    vendor_view.teardown();

    // Shutdown system gracefully
    system.shutdown().await.map_err(|e| e.to_string())?;

    info!("Application completed successfully");
    Ok(())
}
