use std::borrow::Cow;

use datakit_core::DataKitError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Maps a `DataKit` failure to an MCP error carrying its full message.
pub fn map_err(err: DataKitError) -> ErrorData {
    let code = match &err {
        DataKitError::EndpointNotFound { .. } | DataKitError::InvalidEndpointReference { .. } => {
            ErrorCode::INVALID_PARAMS
        }
        DataKitError::TaskNotFound { .. } => ErrorCode::RESOURCE_NOT_FOUND,
        _ => ErrorCode::INTERNAL_ERROR,
    };
    mcp_err(code, err.to_string())
}
