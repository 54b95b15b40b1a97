//! Failures observed while wrapping, reading, invoking, or settling values.
//!
//! Every failure is a plain value that can be cloned, because a single
//! settlement is shared by every observer of a [`Deferred`](crate::Deferred).

use crate::value::Value;

/// Reasons a wrapped chain can fail.
///
/// Access failures ([`Error::MemberOfAbsent`], [`Error::NotCallable`]) are raised
/// synchronously by the operation that hits them. When that operation runs as part
/// of a pending chain, the failure becomes the settle-failure of the derived handle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A handle settled-failure with an arbitrary reason.
    #[error("{0}")]
    Rejected(Value),

    /// A member was read from `undefined` or `null`.
    #[error("Cannot read properties of {target} (reading '{name}')")]
    MemberOfAbsent { target: &'static str, name: String },

    /// A value that cannot be invoked was called.
    #[error("{0} is not a function")]
    NotCallable(String),

    /// Native code raised a failure carrying a value.
    #[error("{0}")]
    Thrown(Value),

    /// The settling side of a channel-backed handle was dropped before settling.
    #[error("deferred value was dropped before it settled")]
    Abandoned,
}

impl Error {
    pub(crate) fn member_of_absent(target: &'static str, name: &str) -> Self {
        Error::MemberOfAbsent {
            target,
            name: name.to_owned(),
        }
    }

    /// A thrown `TypeError` record carrying `message`.
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Error::Thrown(Value::object([
            ("name", Value::from("TypeError")),
            ("message", Value::from(message.into())),
        ]))
    }

    /// The value handed to failure continuations.
    ///
    /// Rejections and thrown values pass through untouched. Access failures are
    /// described by an error record with `name` and `message` members.
    pub fn reason(&self) -> Value {
        match self {
            Error::Rejected(reason) | Error::Thrown(reason) => reason.clone(),
            Error::MemberOfAbsent { .. } | Error::NotCallable(_) => Value::object([
                ("name", Value::from("TypeError")),
                ("message", Value::from(self.to_string())),
            ]),
            Error::Abandoned => Value::object([
                ("name", Value::from("Error")),
                ("message", Value::from(self.to_string())),
            ]),
        }
    }

    /// Returns the `message` of the failure as observed through [`Error::reason`].
    pub fn message(&self) -> String {
        match self.reason() {
            Value::Object(record) => match record.get("message") {
                Some(message) => message.to_string(),
                None => self.to_string(),
            },
            other => other.to_string(),
        }
    }
}
