use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    // can't reach the database
    PostgresConnectionError(String),

    // issue loading subscriptions
    Subscriptions(String),

    // generic business logic error
    Walrus(String),

    // Unexpected result from SQL function
    SQLFunction(String),

    // value could not be coerced to its declared type
    Cast(CastError),

    // subscription rejected at create/update time
    Validation(String),

    // misuse of an entrypoint, e.g. statement level broadcast
    Usage(String),

    // direct broadcast could not be delivered
    Broadcast(String),

    // malformed wal2json line
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::PostgresConnectionError(x) => write!(f, "{}", x),
            Self::Subscriptions(x) => write!(f, "{}", x),
            Self::Walrus(x) => write!(f, "{}", x),
            Self::SQLFunction(x) => write!(f, "{}", x),
            Self::Cast(x) => write!(f, "{}", x),
            Self::Validation(x) => write!(f, "{}", x),
            Self::Usage(x) => write!(f, "{}", x),
            Self::Broadcast(x) => write!(f, "ErrorSendingBroadcastMessage: {}", x),
            Self::Parse(x) => write!(f, "{}", x),
        }
    }
}

impl std::error::Error for Error {}

impl From<CastError> for Error {
    fn from(err: CastError) -> Self {
        Self::Cast(err)
    }
}

/// Failures that reject a single WAL record for a single role. They are
/// reported to subscribers through `DispatchResult::errors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowError {
    // non-DELETE change on an entity without a primary key
    BadRequest,

    // role can not SELECT every primary key column
    Unauthorized,

    // record exceeded max_record_bytes, large fields were dropped
    PayloadTooLarge,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            Self::BadRequest => "Error 400: Bad Request, no primary key",
            Self::Unauthorized => "Error 401: Unauthorized",
            Self::PayloadTooLarge => "Error 413: Payload Too Large",
        };

        write!(f, "{}", msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    // type name/oid did not resolve
    UnknownType(String),

    // value is not a valid literal of the type
    InvalidInput { type_name: String, value: String },

    // operator is not defined for the type (e.g. `<` on json)
    UnsupportedOp { op: String, type_name: String },

    // op outside of eq/neq/lt/lte/gt/gte/in
    UnknownOp(String),
}

impl fmt::Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownType(x) => write!(f, "type \"{}\" does not exist", x),
            Self::InvalidInput { type_name, value } => {
                write!(f, "invalid input syntax for type {}: \"{}\"", type_name, value)
            }
            Self::UnsupportedOp { op, type_name } => {
                write!(f, "operator does not exist: {} {} {}", type_name, op, type_name)
            }
            Self::UnknownOp(_) => write!(f, "UNKNOWN OP"),
        }
    }
}

impl std::error::Error for CastError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_messages() {
        assert_eq!(
            RowError::BadRequest.to_string(),
            "Error 400: Bad Request, no primary key"
        );
        assert_eq!(RowError::Unauthorized.to_string(), "Error 401: Unauthorized");
        assert_eq!(
            RowError::PayloadTooLarge.to_string(),
            "Error 413: Payload Too Large"
        );
    }

    #[test]
    fn test_unknown_op_message() {
        let err = Error::from(CastError::UnknownOp("like".to_string()));
        assert_eq!(err.to_string(), "UNKNOWN OP");
    }
}
