//! 统一错误处理
//!
//! 请求级错误统一使用 `shared::error` 中的类型，这里补上仓储层错误的转换。
//!
//! | RepoError | ErrorCode |
//! |-----------|-----------|
//! | NotFound | NotFound (404) |
//! | Duplicate | AlreadyExists (409) |
//! | Validation | ValidationFailed (400) |
//! | Database | DatabaseError (500) |
//! | Business(code, _) | code |

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

use crate::db::repository::RepoError;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Business(code, msg) => AppError::with_message(code, msg),
        }
    }
}

/// 把仓储层的 `NotFound` 换成具体资源的错误码
pub fn not_found_as(code: ErrorCode) -> impl FnOnce(RepoError) -> AppError {
    move |err| match err {
        RepoError::NotFound(msg) => AppError::with_message(code, msg),
        other => other.into(),
    }
}

/// 成功响应
pub fn ok<T>(data: T) -> ApiResponse<T> {
    ApiResponse::success(data)
}

/// 带消息的成功响应
pub fn ok_with_message<T>(data: T, message: impl Into<String>) -> ApiResponse<T> {
    ApiResponse::success_with_message(message, data)
}
