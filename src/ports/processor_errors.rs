//! Processor error taxonomy.
//!
//! The processor reports business-rule rejections as a numeric `code` plus
//! message. Several call sites branch on specific codes (handle failover,
//! settle-remainder recovery, idempotent already-settled handling), so the
//! taxonomy is a real enum with a numeric lookup, not ad hoc strings.

use thiserror::Error;

/// Named processor error conditions.
///
/// Subset of the processor's error catalogue covering every condition the
/// engine branches on, plus the common rejections worth naming in logs.
/// Codes not in this table surface as `ProcessorError::Api` with the raw
/// numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorCode {
    InvalidRequest,
    InternalProcessorError,
    InvalidApiKey,
    Unauthorized,
    CustomerNotFound,
    CustomerDeleted,
    PaymentMethodNotFound,
    PaymentMethodInactive,
    DuplicateHandle,
    InvoiceNotFound,
    InvoiceWrongState,
    TransactionNotFound,
    TransactionDeclined,
    CardExpired,
    InsufficientFunds,
    CustomerCannotBeChangedOnInvoice,
    CurrencyChangeNotAllowed,
    AmountTooLow,
    RefundAmountTooHigh,
    RefundNotAllowedInState,
    CreditNoteNotFound,
    InvoiceAlreadySettled,
    InvoiceAlreadyCancelled,
    SettleAmountTooHigh,
    SettleNotAllowedInState,
    PartialSettleNotSupported,
    InvoiceAlreadyAuthorized,
    InvoiceHasPendingTransaction,
    RecurringPaymentMethodRequired,
    SessionNotFound,
    SessionExpired,
    RequestRateLimitExceeded,
    ConcurrentRequestLimitExceeded,
    WebhookSettingsInvalid,
}

impl ApiErrorCode {
    /// Looks up a named condition by the processor's numeric code.
    pub fn from_code(code: u16) -> Option<Self> {
        use ApiErrorCode::*;
        let known = match code {
            1 => InvalidRequest,
            2 => InternalProcessorError,
            3 => InvalidApiKey,
            4 => Unauthorized,
            17 => CustomerNotFound,
            18 => CustomerDeleted,
            29 => PaymentMethodNotFound,
            30 => PaymentMethodInactive,
            37 => DuplicateHandle,
            41 => InvoiceNotFound,
            42 => InvoiceWrongState,
            45 => TransactionNotFound,
            48 => TransactionDeclined,
            49 => CardExpired,
            50 => InsufficientFunds,
            58 => CustomerCannotBeChangedOnInvoice,
            59 => CurrencyChangeNotAllowed,
            61 => AmountTooLow,
            72 => RefundAmountTooHigh,
            74 => RefundNotAllowedInState,
            76 => CreditNoteNotFound,
            79 => InvoiceAlreadySettled,
            80 => InvoiceAlreadyCancelled,
            85 => SettleAmountTooHigh,
            86 => SettleNotAllowedInState,
            87 => PartialSettleNotSupported,
            105 => InvoiceAlreadyAuthorized,
            106 => InvoiceHasPendingTransaction,
            110 => RecurringPaymentMethodRequired,
            115 => SessionNotFound,
            116 => SessionExpired,
            122 => RequestRateLimitExceeded,
            123 => ConcurrentRequestLimitExceeded,
            130 => WebhookSettingsInvalid,
            _ => return None,
        };
        Some(known)
    }

    /// The processor's numeric code for this condition.
    pub fn code(&self) -> u16 {
        use ApiErrorCode::*;
        match self {
            InvalidRequest => 1,
            InternalProcessorError => 2,
            InvalidApiKey => 3,
            Unauthorized => 4,
            CustomerNotFound => 17,
            CustomerDeleted => 18,
            PaymentMethodNotFound => 29,
            PaymentMethodInactive => 30,
            DuplicateHandle => 37,
            InvoiceNotFound => 41,
            InvoiceWrongState => 42,
            TransactionNotFound => 45,
            TransactionDeclined => 48,
            CardExpired => 49,
            InsufficientFunds => 50,
            CustomerCannotBeChangedOnInvoice => 58,
            CurrencyChangeNotAllowed => 59,
            AmountTooLow => 61,
            RefundAmountTooHigh => 72,
            RefundNotAllowedInState => 74,
            CreditNoteNotFound => 76,
            InvoiceAlreadySettled => 79,
            InvoiceAlreadyCancelled => 80,
            SettleAmountTooHigh => 85,
            SettleNotAllowedInState => 86,
            PartialSettleNotSupported => 87,
            InvoiceAlreadyAuthorized => 105,
            InvoiceHasPendingTransaction => 106,
            RecurringPaymentMethodRequired => 110,
            SessionNotFound => 115,
            SessionExpired => 116,
            RequestRateLimitExceeded => 122,
            ConcurrentRequestLimitExceeded => 123,
            WebhookSettingsInvalid => 130,
        }
    }

    /// True for codes meaning the stored invoice handle collides with an
    /// invoice that can no longer serve this order. The caller regenerates
    /// the handle once and retries.
    pub fn is_handle_collision(&self) -> bool {
        use ApiErrorCode::*;
        matches!(
            self,
            InvoiceAlreadyAuthorized
                | InvoiceAlreadySettled
                | InvoiceAlreadyCancelled
                | CustomerCannotBeChangedOnInvoice
                | CurrencyChangeNotAllowed
        )
    }
}

/// Errors from processor API operations.
#[derive(Debug, Clone, Error)]
pub enum ProcessorError {
    /// Network-level failure; no HTTP response received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response carried an HTTP status outside the valid classes (1xx).
    #[error("Invalid HTTP code {0}")]
    InvalidHttpCode(u16),

    /// Rate limited twice in a row; the one-shot backoff did not help.
    #[error("Request rate limit exceeded")]
    RateLimitExceeded,

    /// Processor business-rule rejection with its numeric code.
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    /// Non-2xx response without a parseable processor error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Request rejected locally before it was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anything the classification above does not cover.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProcessorError {
    /// The named condition, if the numeric code is in the table.
    pub fn api_code(&self) -> Option<ApiErrorCode> {
        match self {
            ProcessorError::Api { code, .. } => ApiErrorCode::from_code(*code),
            _ => None,
        }
    }

    /// True iff this is the given named API condition.
    pub fn is_api_code(&self, expected: ApiErrorCode) -> bool {
        self.api_code() == Some(expected)
    }

    /// True iff the stored handle should be regenerated and the call
    /// retried once.
    pub fn is_handle_collision(&self) -> bool {
        self.api_code()
            .map(|code| code.is_handle_collision())
            .unwrap_or(false)
    }
}
