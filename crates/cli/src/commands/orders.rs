use fashiondesk_db::OrderStore;

use crate::commands::{exit, load_config, runtime, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("orders") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("orders") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let orders = runtime.block_on(async {
        let store = OrderStore::from_config(&config.store).await?;
        Ok::<_, fashiondesk_db::StoreError>(store.list().await)
    });

    match orders {
        Ok(orders) if orders.is_empty() => CommandResult::success("orders", "no orders stored"),
        Ok(orders) => {
            let rendered = orders.iter().map(ToString::to_string).collect::<Vec<_>>();
            CommandResult::success("orders", rendered.join("\n\n"))
        }
        Err(error) => {
            CommandResult::failure("orders", "store_open", error.to_string(), exit::STORE)
        }
    }
}
