use failure::Fail;
use log::error;
use serde::Serialize;

use crate::store::StoreError;

/// Status of a failed operation, mirroring the HTTP codes an outer
/// transport layer would emit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    InternalServerError,
}

impl Status {
    pub fn as_u16(self) -> u16 {
        match self {
            Status::BadRequest => 400,
            Status::Unauthorized => 401,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::Conflict => 409,
            Status::InternalServerError => 500,
        }
    }
}

/// An error that occurred while handling an API operation.
pub trait ApiError: Fail {
    /// Status this error maps to.
    fn status(&self) -> Status;

    /// Internal code describing this error.
    ///
    /// This code is used to identify this error outside the system, and thus
    /// should only be present for errors which are intended to be reported
    /// to the user in detail.
    fn code(&self) -> Option<&str>;
}

/// A wrapper around many types of errors, including user-facing [`ApiError`]s
/// as well as many other errors that should not be reported to the user, such
/// as database connection errors.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "{}", _0)]
    Api(Box<dyn ApiError>),
    /// Generic system error.
    #[fail(display = "{}", _0)]
    System(#[cause] std::io::Error),
    /// Error communicating with the data store.
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
    /// Error obtaining a database connection from the pool.
    #[fail(display = "{}", _0)]
    DbPool(#[cause] r2d2::Error),
}

impl<T: ApiError> From<T> for Error {
    fn from(error: T) -> Error {
        Error::Api(Box::new(error))
    }
}

impl_from! { for Error ;
    std::io::Error => |e| Error::System(e),
    StoreError => |e| Error::Store(e),
    r2d2::Error => |e| Error::DbPool(e),
}

impl Error {
    /// Status an outer layer should report for this error.
    pub fn status(&self) -> Status {
        match self {
            Error::Api(e) => e.status(),
            _ => Status::InternalServerError,
        }
    }

    /// Serializable description of this error.
    ///
    /// User-facing errors carry their code and message; everything else is
    /// logged and collapsed into an opaque internal error. With `devel` set
    /// (see [`crate::Config::devel`]) the collapsed message carries the
    /// underlying error text instead.
    pub fn to_response(&self, devel: bool) -> ErrorResponse {
        if let Error::Api(e) = self {
            if let Some(code) = e.code() {
                return ErrorResponse {
                    error: code.to_string(),
                    mensaje: e.to_string(),
                };
            }
        }

        error!("{}", self);

        let mensaje = if devel {
            self.to_string()
        } else {
            "Error interno del servidor".to_string()
        };

        ErrorResponse {
            error: "internal:error".to_string(),
            mensaje,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub mensaje: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coded_errors_pass_through_unchanged() {
        let error = Error::from(crate::api::ValidationError::new(
            "El campo id_tipo es obligatorio."));

        let response = error.to_response(false);
        assert_eq!(response.error, "request:invalid");
        assert_eq!(response.mensaje, "El campo id_tipo es obligatorio.");
    }

    #[test]
    fn internal_errors_collapse_unless_devel() {
        let error = Error::from(StoreError::Database("boom".to_string()));

        let opaque = error.to_response(false);
        assert_eq!(opaque.error, "internal:error");
        assert_eq!(opaque.mensaje, "Error interno del servidor");

        let detailed = error.to_response(true);
        assert_eq!(detailed.error, "internal:error");
        assert_eq!(detailed.mensaje, "database error: boom");
    }
}
