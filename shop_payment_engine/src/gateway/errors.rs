use thiserror::Error;

pub const GENERIC_DECLINE_MESSAGE: &str = "Your card was declined";
const GENERIC_FAILURE_MESSAGE: &str = "The payment could not be processed";
const UNAVAILABLE_MESSAGE: &str = "The payment service is unavailable. Please try again later";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The card or account was refused. `message` is suitable for showing to the customer.
    #[error("Card declined ({code}). {message}")]
    Declined { code: String, message: String },
    #[error("The gateway rejected the request with status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not reach the payment gateway. {0}")]
    Transport(String),
    #[error("The gateway returned an unexpected response. {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Builds a [`GatewayError::Declined`] with the customer-facing message for `code`.
    pub fn declined<S: Into<String>>(code: S) -> Self {
        let code = code.into();
        let message = card_error_message(&code).to_string();
        Self::Declined { code, message }
    }

    /// The text to show to a customer or admin. Raw gateway details stay in the logs.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Declined { message, .. } => message.as_str(),
            Self::Rejected { .. } | Self::InvalidResponse(_) => GENERIC_FAILURE_MESSAGE,
            Self::Transport(_) => UNAVAILABLE_MESSAGE,
        }
    }
}

/// Maps a gateway decline code to a human-readable message. Unknown codes get the generic decline message.
pub fn card_error_message(code: &str) -> &'static str {
    match code {
        "card_declined" => GENERIC_DECLINE_MESSAGE,
        "expired_card" => "Your card is expired",
        "incorrect_cvc" => "Invalid CVC code",
        "incorrect_zip" => "Invalid zip code",
        "amount_too_large" => "The amount is too large to charge to your card",
        "amount_too_small" => "The amount is too small to charge to your card",
        "balance_insufficient" => "Insufficient balance",
        "postal_code_invalid" => "Your postal code is invalid",
        _ => GENERIC_DECLINE_MESSAGE,
    }
}
