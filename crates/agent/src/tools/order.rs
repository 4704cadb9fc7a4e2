use std::sync::Arc;

use async_trait::async_trait;
use fashiondesk_core::domain::order::OrderId;
use fashiondesk_db::{OrderStore, StoreError};
use tracing::warn;

use super::{
    ArgSpec, Tool, ToolArgs, ToolError, ToolOutcome, ToolSpec, ADDRESS_UPDATED,
    ADDRESS_UPDATE_FAILED, GET_ORDER_INFO, ORDER_NOT_FOUND, UPDATE_ORDER_ADDRESS,
};

const ORDER_ID_ARG: ArgSpec = ArgSpec::required("order_id", "Order number, for example 123");

pub struct GetOrderInfoTool {
    store: Arc<OrderStore>,
}

impl GetOrderInfoTool {
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetOrderInfoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: GET_ORDER_INFO,
            description: "Look up an order by its order number",
            args: vec![ORDER_ID_ARG],
        }
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutcome, ToolError> {
        let order_id = OrderId::from(args.require("order_id")?);
        let Some(record) = self.store.get(&order_id).await else {
            return Ok(ToolOutcome::error(ORDER_NOT_FOUND));
        };
        serde_json::to_value(&record)
            .map(ToolOutcome::Structured)
            .map_err(|error| ToolError::Execution(error.to_string()))
    }
}

pub struct UpdateOrderAddressTool {
    store: Arc<OrderStore>,
}

impl UpdateOrderAddressTool {
    pub fn new(store: Arc<OrderStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateOrderAddressTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: UPDATE_ORDER_ADDRESS,
            description: "Change the shipping address of an order",
            args: vec![
                ORDER_ID_ARG,
                ArgSpec::required("new_address", "New shipping address"),
            ],
        }
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutcome, ToolError> {
        let order_id = OrderId::from(args.require("order_id")?);
        let new_address = args.require("new_address")?;

        match self.store.update_address(&order_id, new_address).await {
            Ok(()) => Ok(ToolOutcome::Text(ADDRESS_UPDATED.to_string())),
            Err(StoreError::OrderNotFound(_)) => Ok(ToolOutcome::error(ADDRESS_UPDATE_FAILED)),
            Err(error) => {
                warn!(
                    event_name = "agent.tool.address_update_error",
                    order_id = %order_id,
                    error = %error,
                    "address update failed"
                );
                Ok(ToolOutcome::error(ADDRESS_UPDATE_FAILED))
            }
        }
    }
}
