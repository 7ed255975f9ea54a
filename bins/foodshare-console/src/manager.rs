//! Manager menu: catalogue and stock upkeep plus reports.

use crate::prompt::Prompt;
use crate::render::{dispatch, show, show_with_total};
use anyhow::Result;
use foodshare_cli::output::{format_count, Status};
use foodshare_cluster::{Command, MasterClient, MasterReply};
use foodshare_mapreduce::{DELETED_PRODUCTS_KEY, LIST_STORES_KEY};
use foodshare_market::{catalogue, Product};
use std::path::Path;

const MENU: [&str; 10] = [
    "Add store",
    "Remove store",
    "Add product",
    "Remove product",
    "Increase product amount",
    "Decrease product amount",
    "Deleted products report",
    "List stores",
    "Sales by product",
    "Exit",
];

pub async fn run(client: &MasterClient, prompt: &mut Prompt) -> Result<()> {
    loop {
        Status::header("Foodshare - Manager");
        for (i, label) in MENU.iter().enumerate() {
            Status::option(i + 1, label);
        }
        let Some(choice) = prompt
            .ask_parsed::<usize, _>("Choose an option:", |n| (1..=MENU.len()).contains(n))
            .await?
        else {
            break;
        };

        let command = match choice {
            1 => add_store(prompt).await?,
            2 => prompt
                .ask_required("Store name:")
                .await?
                .map(|store| Some(Command::RemoveStore { store })),
            3 => add_product(prompt).await?,
            4 => product_command(prompt, |store, product| Command::RemoveProduct { store, product })
                .await?,
            5 => amount_command(prompt, |store, product, amount| {
                Command::IncrementProductAmount { store, product, amount }
            })
            .await?,
            6 => amount_command(prompt, |store, product, amount| {
                Command::DecrementProductAmount { store, product, amount }
            })
            .await?,
            7 => Some(Some(Command::DeletedProducts)),
            8 => Some(Some(Command::ListStores)),
            9 => prompt
                .ask_required("Product name:")
                .await?
                .map(|product| Some(Command::AggregateSales { product })),
            _ => break,
        };

        // Outer None: stdin closed. Inner None: nothing to send.
        match command {
            Some(Some(command)) => execute(client, command).await,
            Some(None) => {}
            None => break,
        }
    }

    Status::info("Goodbye!");
    Ok(())
}

async fn execute(client: &MasterClient, command: Command) {
    let name = command.name();
    let Some(reply) = dispatch(client, command).await else {
        return;
    };

    match (&reply, name) {
        (MasterReply::Reduced { result }, "DELETED_PRODUCTS") => match result.get(DELETED_PRODUCTS_KEY) {
            Some(deleted) => Status::entry("DELETED PRODUCTS", deleted),
            None => Status::info("No products have been deleted."),
        },
        (MasterReply::Reduced { result }, "LIST_STORES") => match result.get(LIST_STORES_KEY) {
            Some(stores) => {
                let mut names: Vec<&str> = stores.split(", ").collect();
                names.sort_unstable();
                Status::subheader(&format_count(names.len(), "store", "stores"));
                for store in names {
                    println!("  {store}");
                }
            }
            None => Status::info("No stores."),
        },
        (MasterReply::Reduced { result }, "AGGREGATE_SALES_BY_PRODUCT_NAME") => show_with_total(result),
        _ => show(&reply),
    }
}

async fn add_store(prompt: &mut Prompt) -> Result<Option<Option<Command>>> {
    let Some(path) = prompt.ask_required("Path to store JSON file:").await? else {
        return Ok(None);
    };
    match catalogue::load_file(Path::new(&path)) {
        Ok(store) => Ok(Some(Some(Command::AddStore { store }))),
        Err(e) => {
            Status::error(&e.to_string());
            Ok(Some(None))
        }
    }
}

async fn add_product(prompt: &mut Prompt) -> Result<Option<Option<Command>>> {
    let Some(store) = prompt.ask_required("Store name:").await? else {
        return Ok(None);
    };
    let Some(name) = prompt.ask_required("Product name:").await? else {
        return Ok(None);
    };
    let Some(product_type) = prompt.ask_required("Product type:").await? else {
        return Ok(None);
    };
    let Some(amount) = prompt.ask_parsed::<u32, _>("Available amount:", |_| true).await? else {
        return Ok(None);
    };
    let Some(price) = prompt
        .ask_parsed::<f64, _>("Price:", |p| p.is_finite() && *p >= 0.0)
        .await?
    else {
        return Ok(None);
    };

    Ok(Some(Some(Command::AddProduct {
        store,
        product: Product::new(name, product_type, amount, price),
    })))
}

async fn product_command<F>(prompt: &mut Prompt, build: F) -> Result<Option<Option<Command>>>
where
    F: FnOnce(String, String) -> Command,
{
    let Some(store) = prompt.ask_required("Store name:").await? else {
        return Ok(None);
    };
    let Some(product) = prompt.ask_required("Product name:").await? else {
        return Ok(None);
    };
    Ok(Some(Some(build(store, product))))
}

async fn amount_command<F>(prompt: &mut Prompt, build: F) -> Result<Option<Option<Command>>>
where
    F: FnOnce(String, String, u32) -> Command,
{
    let Some(store) = prompt.ask_required("Store name:").await? else {
        return Ok(None);
    };
    let Some(product) = prompt.ask_required("Product name:").await? else {
        return Ok(None);
    };
    let Some(amount) = prompt.ask_parsed::<u32, _>("Amount:", |a| *a > 0).await? else {
        return Ok(None);
    };
    Ok(Some(Some(build(store, product, amount))))
}
