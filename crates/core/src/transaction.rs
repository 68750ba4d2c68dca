//! Transaction types and boundary validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Sender identifier reserved for mining-reward transactions.
pub const REWARD_SENDER: &str = "network";

/// Errors that can occur while building a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("sender `{0}` is reserved for mining rewards")]
    ReservedSender(String),
}

pub type Result<T> = std::result::Result<T, TransactionError>;

/// A transfer of `amount` from `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender identifier.
    pub sender: String,
    /// Receiver identifier.
    pub receiver: String,
    /// Amount transferred.
    pub amount: u64,
}

impl Transaction {
    /// Create a user transaction.
    ///
    /// Fails if either identifier is empty or the sender is the reserved
    /// reward identifier.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        amount: u64,
    ) -> Result<Self> {
        let sender = identifier("sender", sender.into())?;
        let receiver = identifier("receiver", receiver.into())?;
        if sender == REWARD_SENDER {
            return Err(TransactionError::ReservedSender(sender));
        }
        Ok(Self {
            sender,
            receiver,
            amount,
        })
    }

    /// Create the mining-reward transaction credited to `receiver`.
    pub fn reward(receiver: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: REWARD_SENDER.to_string(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Check if this is a mining-reward transaction.
    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

fn identifier(field: &'static str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(TransactionError::InvalidField {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(value)
}

/// An untyped transaction submission, as decoded from a request body.
///
/// Every field is optional so that missing or mistyped fields surface as
/// [`TransactionError`] instead of a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub sender: Option<Value>,
    #[serde(default)]
    pub receiver: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
}

impl TransactionRequest {
    /// Build a request from typed values.
    pub fn new(sender: &str, receiver: &str, amount: u64) -> Self {
        Self {
            sender: Some(Value::from(sender)),
            receiver: Some(Value::from(receiver)),
            amount: Some(Value::from(amount)),
        }
    }
}

impl TryFrom<TransactionRequest> for Transaction {
    type Error = TransactionError;

    fn try_from(request: TransactionRequest) -> Result<Self> {
        let sender = string_field("sender", request.sender)?;
        let receiver = string_field("receiver", request.receiver)?;
        let amount = amount_field(request.amount)?;
        Transaction::new(sender, receiver, amount)
    }
}

fn string_field(field: &'static str, value: Option<Value>) -> Result<String> {
    match value {
        None | Some(Value::Null) => Err(TransactionError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(TransactionError::InvalidField {
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

fn amount_field(value: Option<Value>) -> Result<u64> {
    let invalid = |reason: String| TransactionError::InvalidField {
        field: "amount",
        reason,
    };

    let number = match value {
        None | Some(Value::Null) => return Err(TransactionError::MissingField("amount")),
        Some(Value::Number(n)) => n,
        Some(other) => return Err(invalid(format!("expected a number, got {other}"))),
    };

    if let Some(amount) = number.as_u64() {
        return Ok(amount);
    }
    if number.as_i64().is_some_and(|n| n < 0) {
        return Err(invalid(format!("must not be negative, got {number}")));
    }
    // Whole floats such as `25.0` are accepted; anything fractional is not.
    // `u64::MAX as f64` rounds up to 2^64, which itself is out of range.
    match number.as_f64() {
        Some(f) if f < 0.0 => Err(invalid(format!("must not be negative, got {number}"))),
        Some(f) if f >= u64::MAX as f64 => Err(invalid(format!("out of range, got {number}"))),
        Some(f) if f.fract() == 0.0 => Ok(f as u64),
        _ => Err(invalid(format!("must be a whole number, got {number}"))),
    }
}
