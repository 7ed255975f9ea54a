//! Customer menu: search stores, buy, review.

use crate::prompt::Prompt;
use crate::render::{dispatch, outcome, show, show_result};
use anyhow::Result;
use foodshare_cli::output::Status;
use foodshare_cluster::{Command, MasterClient, MasterReply};
use foodshare_geo::Coordinate;
use foodshare_mapreduce::SearchFilter;

const MENU: [&str; 6] = [
    "Search by food category",
    "Search by stars",
    "Search by price range",
    "Search nearby stores",
    "Purchase a product",
    "Exit",
];

/// Where the customer is and how far they will travel.
#[derive(Debug, Clone, Copy)]
pub struct CustomerOptions {
    pub location: Coordinate,
    pub radius_km: f64,
}

pub async fn run(client: &MasterClient, prompt: &mut Prompt, options: CustomerOptions) -> Result<()> {
    loop {
        Status::header("Foodshare - Customer");
        for (i, label) in MENU.iter().enumerate() {
            Status::option(i + 1, label);
        }
        let Some(choice) = prompt
            .ask_parsed::<usize, _>("Choose an option:", |n| (1..=MENU.len()).contains(n))
            .await?
        else {
            break;
        };

        let filter = match choice {
            1 => match prompt.ask_required("Food category:").await? {
                Some(category) => SearchFilter::FoodCategory { category },
                None => break,
            },
            2 => match prompt.ask_parsed::<u32, _>("Minimum stars (1-5):", |s| (1..=5).contains(s)).await? {
                Some(min) => SearchFilter::Stars { min },
                None => break,
            },
            3 => {
                let label = "Price range (1 = $, 2 = $$, 3 = $$$):";
                match prompt.ask_parsed::<u8, _>(label, |l| (1..=3).contains(l)).await? {
                    Some(level) => SearchFilter::PriceTier { level },
                    None => break,
                }
            }
            4 => SearchFilter::Radius {
                km: options.radius_km,
                center: options.location,
            },
            5 => {
                if !purchase(client, prompt).await? {
                    break;
                }
                continue;
            }
            _ => break,
        };

        search(client, filter).await;
    }

    Status::info("Goodbye!");
    Ok(())
}

async fn search(client: &MasterClient, filter: SearchFilter) {
    Status::subheader(&format!("Stores matching {filter}"));
    match dispatch(client, Command::Search { filter }).await {
        Some(MasterReply::Reduced { result }) => show_result(&result, "No stores found."),
        Some(other) => show(&other),
        None => {}
    }
}

/// Buys a product and offers a review. False once stdin has closed.
async fn purchase(client: &MasterClient, prompt: &mut Prompt) -> Result<bool> {
    let Some(store) = prompt.ask_required("Store name:").await? else {
        return Ok(false);
    };
    let Some(product) = prompt.ask_required("Product name:").await? else {
        return Ok(false);
    };
    let Some(quantity) = prompt.ask_parsed::<u32, _>("Quantity:", |q| *q > 0).await? else {
        return Ok(false);
    };

    let command = Command::PurchaseProduct {
        store: store.clone(),
        product,
        quantity,
    };
    let Some(reply) = dispatch(client, command).await else {
        return Ok(true);
    };

    match outcome(&reply) {
        Some(Ok(message)) => {
            match message.split_once('|') {
                Some((text, remaining)) => {
                    Status::success(text);
                    Status::info(&format!("{remaining} left in stock"));
                }
                None => Status::success(message),
            }
            review(client, prompt, store).await
        }
        Some(Err(message)) => {
            Status::error(message);
            Ok(true)
        }
        None => {
            show(&reply);
            Ok(true)
        }
    }
}

async fn review(client: &MasterClient, prompt: &mut Prompt, store: String) -> Result<bool> {
    let label = "Rate the store 1-5 (blank to skip):";
    let Some(stars) = prompt.ask_optional::<u32, _>(label, |s| (1..=5).contains(s)).await? else {
        return Ok(true);
    };
    if let Some(reply) = dispatch(client, Command::Review { store, stars }).await {
        show(&reply);
    }
    Ok(true)
}
