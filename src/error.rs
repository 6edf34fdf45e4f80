//! Error taxonomy for the tenantry domain.
//!
//! Every fallible operation returns [`Error`], which pairs a typed
//! [`ErrorKind`] with audit context (key/value pairs), the time it was raised,
//! and an optional cause. [`Error::code`] gives a stable identifier for
//! logging and clients; [`Error::user_message`] renders a localized sentence
//! suitable for end users.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::membership::Role;
use crate::permissions::Permissions;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Languages supported by [`Error::user_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

/// Field-level validation failures raised by value-object and entity constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{field} is required")]
    RequiredField { field: &'static str },

    #[error("{field} has an invalid format (expected {expected})")]
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} is out of range ({value}, expected {constraint})")]
    OutOfRange {
        field: &'static str,
        value: String,
        constraint: String,
    },

    #[error("{field} must be between {min} and {max} characters (got {actual})")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("{field} '{value}' is already taken")]
    DuplicateValue { field: &'static str, value: String },
}

impl FieldError {
    /// The name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::RequiredField { field }
            | Self::InvalidFormat { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidLength { field, .. }
            | Self::DuplicateValue { field, .. } => field,
        }
    }
}

/// Authorization denials. All variants carry enough context for audit logs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("account {actor} lacks permissions {required}")]
    InsufficientPermission {
        actor: String,
        required: Permissions,
    },

    #[error("account {actor} needs role {required} or higher")]
    InsufficientRole {
        actor: String,
        required: Role,
        actual: Option<Role>,
    },

    #[error("account {actor} does not own {resource}")]
    NotResourceOwner { actor: String, resource: String },
}

/// The resource a quota check was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaType {
    Members,
    Storage,
    Projects,
}

impl QuotaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Storage => "storage",
            Self::Projects => "projects",
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("business rule violated ({rule}): {message}")]
    BusinessRule { rule: &'static str, message: String },

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("{quota_type} quota exceeded: {current_usage} used of {limit}")]
    QuotaExceeded {
        quota_type: QuotaType,
        current_usage: u64,
        limit: u64,
    },

    #[error("repository error: {0}")]
    Repository(String),
}

/// A domain error with audit metadata.
///
/// Equality compares the [`ErrorKind`] only; context, timestamp and cause are
/// ignored.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
    context: BTreeMap<String, String>,
    timestamp: DateTime<Utc>,
    #[source]
    cause: Option<Box<Error>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: BTreeMap::new(),
            timestamp: Utc::now(),
            cause: None,
        }
    }

    pub fn validation(error: FieldError) -> Self {
        let field = error.field();
        Self::new(ErrorKind::Validation(error)).with_context("field", field)
    }

    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound {
            entity,
            id: id.to_string(),
        })
    }

    pub fn conflict(entity: &'static str, field: &'static str, value: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Conflict {
            entity,
            field,
            value: value.to_string(),
        })
    }

    pub fn business_rule(rule: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BusinessRule {
            rule,
            message: message.into(),
        })
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorKind::Authorization(AuthorizationError::Unauthenticated))
    }

    pub fn quota_exceeded(quota_type: QuotaType, current_usage: u64, limit: u64) -> Self {
        Self::new(ErrorKind::QuotaExceeded {
            quota_type,
            current_usage,
            limit,
        })
    }

    pub fn repository(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Repository(message.into()))
    }

    /// Attach a key/value pair to the audit context.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Record the error that led to this one.
    #[must_use]
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }

    /// Stable, dot-separated identifier for this error.
    pub fn code(&self) -> &'static str {
        match &self.kind {
            ErrorKind::Validation(FieldError::RequiredField { .. }) => "validation.required_field",
            ErrorKind::Validation(FieldError::InvalidFormat { .. }) => "validation.invalid_format",
            ErrorKind::Validation(FieldError::OutOfRange { .. }) => "validation.out_of_range",
            ErrorKind::Validation(FieldError::InvalidLength { .. }) => "validation.invalid_length",
            ErrorKind::Validation(FieldError::DuplicateValue { .. }) => {
                "validation.duplicate_value"
            }
            ErrorKind::NotFound { .. } => "not_found",
            ErrorKind::Conflict { .. } => "conflict",
            ErrorKind::BusinessRule { .. } => "business_rule_violation",
            ErrorKind::Authorization(AuthorizationError::Unauthenticated) => {
                "authorization.unauthenticated"
            }
            ErrorKind::Authorization(AuthorizationError::InsufficientPermission { .. }) => {
                "authorization.insufficient_permission"
            }
            ErrorKind::Authorization(AuthorizationError::InsufficientRole { .. }) => {
                "authorization.insufficient_role"
            }
            ErrorKind::Authorization(AuthorizationError::NotResourceOwner { .. }) => {
                "authorization.not_resource_owner"
            }
            ErrorKind::QuotaExceeded { .. } => "quota_exceeded",
            ErrorKind::Repository(_) => "repository",
        }
    }

    /// Whether a caller may reasonably retry (possibly with different input).
    ///
    /// Validation, not-found, business-rule, authorization and quota errors
    /// never succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Conflict { .. } | ErrorKind::Repository(_)
        )
    }

    pub fn is_business_rule(&self) -> bool {
        matches!(self.kind, ErrorKind::BusinessRule { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation(_))
    }

    /// A sentence suitable for showing to an end user.
    pub fn user_message(&self, locale: Locale) -> String {
        match (locale, &self.kind) {
            (Locale::En, ErrorKind::Validation(FieldError::RequiredField { field })) => {
                format!("Please provide a value for {field}.")
            }
            (Locale::Es, ErrorKind::Validation(FieldError::RequiredField { field })) => {
                format!("Indique un valor para {field}.")
            }
            (Locale::En, ErrorKind::Validation(FieldError::DuplicateValue { field, .. })) => {
                format!("That {field} is already in use.")
            }
            (Locale::Es, ErrorKind::Validation(FieldError::DuplicateValue { field, .. })) => {
                format!("Ese valor de {field} ya está en uso.")
            }
            (Locale::En, ErrorKind::Validation(error)) => {
                format!("The value for {} is not valid.", error.field())
            }
            (Locale::Es, ErrorKind::Validation(error)) => {
                format!("El valor de {} no es válido.", error.field())
            }
            (Locale::En, ErrorKind::NotFound { entity, .. }) => {
                format!("The requested {entity} could not be found.")
            }
            (Locale::Es, ErrorKind::NotFound { entity, .. }) => {
                format!("No se encontró el recurso solicitado ({entity}).")
            }
            (Locale::En, ErrorKind::Conflict { field, .. }) => {
                format!("That {field} is already taken. Please choose another.")
            }
            (Locale::Es, ErrorKind::Conflict { field, .. }) => {
                format!("Ese valor de {field} ya existe. Elija otro.")
            }
            (Locale::En, ErrorKind::BusinessRule { .. }) => {
                "This action is not allowed in the current state.".to_owned()
            }
            (Locale::Es, ErrorKind::BusinessRule { .. }) => {
                "Esta acción no está permitida en el estado actual.".to_owned()
            }
            (Locale::En, ErrorKind::Authorization(AuthorizationError::Unauthenticated)) => {
                "Please sign in to continue.".to_owned()
            }
            (Locale::Es, ErrorKind::Authorization(AuthorizationError::Unauthenticated)) => {
                "Inicie sesión para continuar.".to_owned()
            }
            (Locale::En, ErrorKind::Authorization(_)) => {
                "You do not have access to perform this action.".to_owned()
            }
            (Locale::Es, ErrorKind::Authorization(_)) => {
                "No tiene acceso para realizar esta acción.".to_owned()
            }
            (Locale::En, ErrorKind::QuotaExceeded { quota_type, limit, .. }) => {
                format!("You have reached the {quota_type} limit of {limit} for this workspace.")
            }
            (Locale::Es, ErrorKind::QuotaExceeded { quota_type, limit, .. }) => {
                format!("Se alcanzó el límite de {quota_type} ({limit}) de este espacio de trabajo.")
            }
            (Locale::En, ErrorKind::Repository(_)) => {
                "Something went wrong. Please try again.".to_owned()
            }
            (Locale::Es, ErrorKind::Repository(_)) => {
                "Algo salió mal. Inténtelo de nuevo.".to_owned()
            }
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<FieldError> for Error {
    fn from(error: FieldError) -> Self {
        Self::validation(error)
    }
}

impl From<AuthorizationError> for Error {
    fn from(error: AuthorizationError) -> Self {
        Self::new(ErrorKind::Authorization(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            Error::from(FieldError::RequiredField { field: "name" }).code(),
            "validation.required_field"
        );
        assert_eq!(Error::not_found("workspace", "w1").code(), "not_found");
        assert_eq!(Error::unauthenticated().code(), "authorization.unauthenticated");
        assert_eq!(
            Error::quota_exceeded(QuotaType::Members, 5, 5).code(),
            "quota_exceeded"
        );
    }

    #[test]
    fn test_validation_records_field_in_context() {
        let err = Error::from(FieldError::InvalidFormat {
            field: "email",
            expected: "an email address",
        });

        assert!(err.is_validation());
        assert_eq!(err.context().get("field").map(String::as_str), Some("email"));
    }

    #[test]
    fn test_display() {
        let err = Error::quota_exceeded(QuotaType::Members, 5, 5);
        assert_eq!(err.to_string(), "members quota exceeded: 5 used of 5");

        let err = Error::business_rule("last_member", "cannot remove the last member");
        assert_eq!(
            err.to_string(),
            "business rule violated (last_member): cannot remove the last member"
        );
    }

    #[test]
    fn test_cause_is_exposed_as_source() {
        use std::error::Error as _;

        let root = Error::repository("connection reset");
        let err = Error::business_rule("compensation", "rolled back").with_cause(root);

        assert!(err.source().is_some());
        assert_eq!(err.cause().map(Error::code), Some("repository"));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::conflict("workspace", "slug", "acme").is_retryable());
        assert!(Error::repository("timeout").is_retryable());
        assert!(!Error::business_rule("x", "y").is_retryable());
        assert!(!Error::unauthenticated().is_retryable());
    }

    #[test]
    fn test_user_message_localized() {
        let err = Error::unauthenticated();
        assert_eq!(err.user_message(Locale::En), "Please sign in to continue.");
        assert_eq!(err.user_message(Locale::Es), "Inicie sesión para continuar.");

        let err = Error::quota_exceeded(QuotaType::Members, 5, 5);
        assert!(err.user_message(Locale::En).contains("members limit of 5"));
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let a = Error::not_found("membership", "m1").with_context("actor", "a1");
        let b = Error::not_found("membership", "m1");
        assert_eq!(a, b);
    }
}
