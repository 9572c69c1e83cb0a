//! 领域错误 - 桌台 / 订单 / 换桌 / 结账
//!
//! [`FloorError`] 是引擎各组件的统一错误类型，
//! 在 API 层转换为带错误码的 [`AppError`] (前端负责本地化)。

use shared::error::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

use crate::storage::{Precondition, StoreError};

/// Resource kinds reported by [`FloorError::NotFound`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Table,
    OrderLine,
    Receipt,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "Table",
            Self::OrderLine => "Order line",
            Self::Receipt => "Receipt",
        };
        f.write_str(name)
    }
}

/// Checkout persistence steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    Header,
    Lines,
    Payment,
    ClearDraft,
    ClearTable,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Lines => "lines",
            Self::Payment => "payment",
            Self::ClearDraft => "clear_draft",
            Self::ClearTable => "clear_table",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Floor engine errors
#[derive(Debug, Error)]
pub enum FloorError {
    #[error("{resource} not found: {key}")]
    NotFound { resource: Resource, key: String },

    /// State changed under the caller (occupied, emptied, duplicate name, ...)
    #[error("{message}")]
    Conflict { code: ErrorCode, message: String },

    /// Business rule refused the request (empty order, short payment)
    #[error("{message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Persistence(#[source] StoreError),

    #[error("Checkout {receipt_number} failed at step {step}: {cause}")]
    CheckoutFailed {
        receipt_number: String,
        step: CheckoutStep,
        cause: StoreError,
    },
}

pub type FloorResult<T> = Result<T, FloorError>;

impl FloorError {
    pub fn table_not_found(name: &str) -> Self {
        Self::NotFound {
            resource: Resource::Table,
            key: name.to_string(),
        }
    }

    pub fn line_not_found(index: usize) -> Self {
        Self::NotFound {
            resource: Resource::OrderLine,
            key: index.to_string(),
        }
    }

    pub fn receipt_not_found(number: &str) -> Self {
        Self::NotFound {
            resource: Resource::Receipt,
            key: number.to_string(),
        }
    }

    pub fn table_occupied(name: &str) -> Self {
        Self::Conflict {
            code: ErrorCode::TableOccupied,
            message: format!("Table {} is occupied", name),
        }
    }

    pub fn table_not_occupied(name: &str) -> Self {
        Self::Conflict {
            code: ErrorCode::TableNotOccupied,
            message: format!("Table {} is not occupied", name),
        }
    }

    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// 写入批次的前置条件失败说明状态已被其他终端改变，按冲突处理
impl From<StoreError> for FloorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PreconditionFailed { table, expected } => match expected {
                Precondition::Vacant => Self::table_occupied(&table),
                Precondition::Occupied => Self::table_not_occupied(&table),
                Precondition::Absent => Self::Conflict {
                    code: ErrorCode::TableNameExists,
                    message: format!("Table {} already exists", table),
                },
                Precondition::Exists => Self::Conflict {
                    code: ErrorCode::TableNotFound,
                    message: format!("Table {} was removed", table),
                },
            },
            other => Self::Persistence(other),
        }
    }
}

/// 将存储错误转换为错误码
fn classify_storage_error(e: &StoreError) -> ErrorCode {
    match e {
        StoreError::Serialization(_) => return ErrorCode::StorageCorrupted,
        StoreError::PreconditionFailed { .. } => return ErrorCode::AlreadyExists,
        StoreError::Other(_) => return ErrorCode::DatabaseError,
        _ => {}
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // 默认：系统繁忙（redb 的 Database/Transaction/Table/Storage/Commit 错误）
    ErrorCode::SystemBusy
}

impl From<FloorError> for AppError {
    fn from(err: FloorError) -> Self {
        match err {
            FloorError::NotFound { resource, key } => {
                let code = match resource {
                    Resource::Table => ErrorCode::TableNotFound,
                    Resource::OrderLine => ErrorCode::OrderItemNotFound,
                    Resource::Receipt => ErrorCode::ReceiptNotFound,
                };
                let message = format!("{} not found: {}", resource, key);
                match resource {
                    Resource::Table => AppError::table(code, &key, message),
                    _ => AppError::with_message(code, message).with_detail("key", key),
                }
            }
            FloorError::Conflict { code, message } => AppError::with_message(code, message),
            FloorError::Rejected { code, message } => AppError::with_message(code, message),
            FloorError::InvalidMove(msg) => AppError::with_message(ErrorCode::InvalidMove, msg),
            FloorError::Validation(msg) => AppError::validation(msg),
            FloorError::Persistence(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                AppError::with_message(code, e.to_string())
            }
            FloorError::CheckoutFailed {
                receipt_number,
                step,
                cause,
            } => AppError::checkout_incomplete(
                &receipt_number,
                step.as_str(),
                format!("Checkout stopped at {}: {}", step, cause),
            ),
        }
    }
}
