use std::sync::Arc;

use async_trait::async_trait;
use fashiondesk_core::sop::SopRegistry;

use super::{
    ArgSpec, Tool, ToolArgs, ToolError, ToolOutcome, ToolSpec, GET_SOP_TREE, INVALID_SOP_TYPE,
};

pub struct GetSopTreeTool {
    sops: Arc<SopRegistry>,
}

impl GetSopTreeTool {
    pub fn new(sops: Arc<SopRegistry>) -> Self {
        Self { sops }
    }
}

#[async_trait]
impl Tool for GetSopTreeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: GET_SOP_TREE,
            description: "Fetch the standard operating procedure decision tree for a category",
            args: vec![ArgSpec::required("sop_type", "SOP category: order or logistics")
                .one_of(&["order", "logistics"])],
        }
    }

    async fn execute(&self, args: &ToolArgs) -> Result<ToolOutcome, ToolError> {
        match self.sops.lookup(args.require("sop_type")?) {
            Ok(text) => Ok(ToolOutcome::Text(text.to_string())),
            Err(_) => Ok(ToolOutcome::error(INVALID_SOP_TYPE)),
        }
    }
}
