//! Error types / 错误类型
//!
//! Two layers:
//! - [`Error`]: what the library returns (query algebra, request builder, Solr connection)
//! - [`ApiError`]: what the HTTP layer hands back to clients, `{errorType, message}`

use serde::Serialize;
use thiserror::Error;

/// Result alias for library operations / 库操作结果
pub type Result<T> = std::result::Result<T, Error>;

/// Library error / 库错误
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed argument, unknown type or field / 参数错误
    #[error("{0}")]
    InvalidArgument(String),

    /// Numeric factor outside its allowed range / 数值越界
    #[error("{0}")]
    OutOfRange(String),

    /// Core was not discovered when the connection was created / 未知核心
    #[error("No Solr core with the name {0} was found.")]
    UnknownCore(String),

    /// Solr could not be reached / 无法连接 Solr
    #[error("Could not reach Solr: {0}")]
    Connection(String),

    /// Solr rejected the request / Solr 拒绝了请求
    #[error("{message} (core: {core})")]
    Search { core: String, message: String },

    /// Solr answered with something we could not decode / 无法解析的响应
    #[error("Unexpected response from Solr: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// True for errors raised before any request is sent / 校验类错误
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::OutOfRange(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::UnexpectedResponse(e.to_string())
        } else {
            Error::Connection(e.to_string())
        }
    }
}

/// Errors the API may report to clients / API 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    /// Anything we did not anticipate while handling a request
    UnexpectedServerError,
    /// Solr is unreachable or the core does not exist
    SolrConnectionError,
    /// Solr rejected the query
    SolrSearchError,
    /// Missing query, unknown type or unknown return field
    InvalidSearchRequest,
    /// Missing id or unknown return field
    InvalidDocumentRequest,
}

impl ErrorType {
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorType::UnexpectedServerError => "An error occurred processing the request",
            ErrorType::SolrConnectionError => "Could not connect to the search index.",
            ErrorType::SolrSearchError => "The search index rejected the query.",
            ErrorType::InvalidSearchRequest => "Must supply a search term with the parameter \"q\".",
            ErrorType::InvalidDocumentRequest => "Must supply a document id with the parameter \"id\".",
        }
    }

    /// HTTP status code the API answers with / HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorType::UnexpectedServerError | ErrorType::SolrConnectionError => 500,
            ErrorType::SolrSearchError
            | ErrorType::InvalidSearchRequest
            | ErrorType::InvalidDocumentRequest => 400,
        }
    }
}

/// Error payload returned by the API / API 错误载荷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(rename = "errorType")]
    pub error_type: ErrorType,
    pub message: String,
}

impl ApiError {
    /// Error with the type's default message / 使用默认消息
    pub fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            message: error_type.default_message().to_string(),
        }
    }

    pub fn with_message(error_type: ErrorType, message: impl Into<String>) -> Self {
        Self {
            error_type,
            message: message.into(),
        }
    }

    /// Map a library error raised while serving `request_kind` / 将库错误转换为 API 错误
    ///
    /// Validation failures become the request-specific type, everything else is classified
    /// by where it went wrong.
    pub fn from_error(err: &Error, request_kind: ErrorType) -> Self {
        let error_type = match err {
            Error::InvalidArgument(_) | Error::OutOfRange(_) => request_kind,
            Error::UnknownCore(_) | Error::Connection(_) => ErrorType::SolrConnectionError,
            Error::Search { .. } => ErrorType::SolrSearchError,
            Error::UnexpectedResponse(_) => ErrorType::UnexpectedServerError,
        };
        Self::with_message(error_type, err.to_string())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"errorType":"UNEXPECTED_SERVER_ERROR","message":"{}"}}"#, self.message)
        })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.error_type, self.message)
    }
}
