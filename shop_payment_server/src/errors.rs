use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::*;
use shop_payment_engine::{AuthApiError, CheckoutError, OrderStatusError, ReportingError};
use thiserror::Error;

/// What clients see when storage or another backend fails. The details only go to the log.
pub const BACKEND_FAILURE: &str = "The request could not be completed";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("{0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    /// Every kind of authentication failure is reported to clients with this one message
    #[error("invalid auth credentials")]
    AuthenticationError,
    #[error("{0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    /// The message is the customer-facing text from the gateway adapter. Raw gateway errors are only logged.
    #[error("{0}")]
    GatewayError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("The payment gateway accepted the change, but the order record could not be updated. {0}")]
    ReconciliationError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ReconciliationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": true, "message": self.to_string() }).to_string())
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        if e.is_authentication_failure() {
            debug!("💻️ Authentication failed. {e}");
            return Self::AuthenticationError;
        }
        match e {
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::ValidationError(_) | AuthApiError::InvalidResetLink(_) | AuthApiError::Cipher(_) => {
                Self::ValidationError(e.to_string())
            },
            _ => {
                error!("💻️ Auth backend failure. {e}");
                Self::BackendError(BACKEND_FAILURE.into())
            },
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::Gateway(g) => {
                warn!("💻️💳️ Gateway refused a checkout request. {g}");
                Self::GatewayError(g.user_message().to_string())
            },
            CheckoutError::Store(e) => {
                error!("💻️🗃️ Checkout storage failure. {e}");
                Self::BackendError(BACKEND_FAILURE.into())
            },
            CheckoutError::ItemNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::ValidationError(m) => Self::ValidationError(m),
        }
    }
}

impl From<OrderStatusError> for ServerError {
    fn from(e: OrderStatusError) -> Self {
        match e {
            OrderStatusError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderStatusError::AlreadyTerminal { .. } | OrderStatusError::TransitionInProgress(_) => {
                Self::Conflict(e.to_string())
            },
            OrderStatusError::ChargeMismatch { .. } => Self::ValidationError(e.to_string()),
            OrderStatusError::Gateway(g) => {
                warn!("💻️💳️ Gateway refused an order status change. {g}");
                Self::GatewayError(g.user_message().to_string())
            },
            OrderStatusError::Store(e) => {
                error!("💻️🗃️ Order status storage failure. {e}");
                Self::BackendError(BACKEND_FAILURE.into())
            },
            OrderStatusError::ReconciliationRequired { order_id, reason } => {
                error!("💻️🚨️ Order #{order_id} needs manual reconciliation. {reason}");
                Self::ReconciliationError(format!("Order #{order_id} must be reconciled by hand."))
            },
        }
    }
}

impl From<ReportingError> for ServerError {
    fn from(e: ReportingError) -> Self {
        match e {
            ReportingError::InvalidPagination(m) => Self::ValidationError(m),
            ReportingError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            ReportingError::Store(e) => {
                error!("💻️🗃️ Reporting storage failure. {e}");
                Self::BackendError(BACKEND_FAILURE.into())
            },
        }
    }
}
