use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// 统一响应信封：`{ code, msg, data }`，成功与失败共用。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 简写，处理器里用得最多。
pub type Res<T> = ApiResponse<T>;

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn with_data(data: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn created(data: T) -> Self {
        Self::with_code(StatusCode::CREATED, "created", Some(data))
    }

    pub fn with_code(code: StatusCode, msg: &str, data: Option<T>) -> Self {
        Self {
            code: code.as_u16(),
            msg: msg.to_string(),
            data,
        }
    }
}

impl ApiResponse<()> {
    pub fn with_msg(msg: &str) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            msg: msg.to_string(),
            data: None,
        }
    }

    pub fn with_error(code: StatusCode, msg: &str) -> Self {
        Self {
            code: code.as_u16(),
            msg: msg.to_string(),
            data: None,
        }
    }

    /// 204 语义的删除成功响应（仍返回信封，便于前端统一处理）。
    pub fn deleted() -> Self {
        Self::with_msg("deleted")
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
