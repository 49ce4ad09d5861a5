//! Module discovery: `listtypes`, `describe` and typed id construction

use super::client::VtigerClient;
use super::constants::{fields, operations};
use super::envelope::OperationEnvelope;
use super::error::{ApiError, ApiResult, require_non_blank};
use super::metadata::{ModuleInfo, ModuleList};
use super::transport::HttpMethod;

pub struct Modules<'a> {
    client: &'a VtigerClient,
}

impl<'a> Modules<'a> {
    pub fn new(client: &'a VtigerClient) -> Self {
        Self { client }
    }

    /// Modules accessible to the logged-in user
    pub async fn list_types(&self) -> ApiResult<ModuleList> {
        let envelope = OperationEnvelope::new(operations::LIST_TYPES);
        self.client.dispatch(envelope, HttpMethod::Get).await
    }

    pub async fn describe(&self, module: &str) -> ApiResult<ModuleInfo> {
        require_non_blank(fields::ELEMENT_TYPE, module)?;
        let envelope = OperationEnvelope::new(operations::DESCRIBE).with(fields::ELEMENT_TYPE, module);
        self.client.dispatch(envelope, HttpMethod::Get).await
    }

    /// `<idPrefix>x<id>` for a record of `module`
    pub async fn typed_id(&self, module: &str, id: i64) -> ApiResult<String> {
        if id < 1 {
            return Err(ApiError::invalid_argument(
                fields::ID,
                format!("numeric id must be positive, got {}", id),
            ));
        }

        let info = self.describe(module).await?;
        typed_id_for(&info, id)
    }
}

fn typed_id_for(info: &ModuleInfo, id: i64) -> ApiResult<String> {
    if info.id_prefix.trim().is_empty() {
        return Err(ApiError::invalid_argument(
            "module",
            format!("module {} has no id prefix", info.name),
        ));
    }
    Ok(format!("{}x{}", info.id_prefix, id))
}
