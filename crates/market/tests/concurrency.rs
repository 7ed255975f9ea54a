//! Concurrent purchases against one store never oversell.

use foodshare_geo::Coordinate;
use foodshare_market::{MarketError, Product, Store};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn kiosk(stock: u32) -> Store {
    Store::new("Kiosk", "snacks", Coordinate::new(37.98, 23.72))
        .with_products(vec![Product::new("chips", "snack", stock, 2.0)])
}

#[test]
fn concurrent_purchases_do_not_oversell() {
    let store = Arc::new(Mutex::new(kiosk(50)));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut bought = 0u32;
                for _ in 0..20 {
                    if store.lock().purchase("chips", 1).is_ok() {
                        bought += 1;
                    }
                }
                bought
            })
        })
        .collect();

    let bought: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let store = store.lock();

    assert_eq!(bought, 50);
    assert_eq!(store.product("chips").unwrap().available_amount, 0);
    assert_eq!(store.sales_for("chips"), 50);
    assert_eq!(store.total_revenue, 100.0);
}

proptest! {
    #[test]
    fn stock_plus_sales_is_conserved(quantities in proptest::collection::vec(0u32..15, 0..40)) {
        let mut store = kiosk(100);
        for qty in quantities {
            match store.purchase("chips", qty) {
                Ok(_) | Err(MarketError::InsufficientStock { .. }) | Err(MarketError::InvalidQuantity) => {}
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
        let left = store.product("chips").unwrap().available_amount;
        prop_assert_eq!(left + store.sales_for("chips"), 100);
    }
}
