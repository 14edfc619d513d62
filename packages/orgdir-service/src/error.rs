use orgdir_domain::{geo::LocationError, hierarchy::HierarchyError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Validation failed: {message}")]
	Validation { message: String },
	#[error("Invalid operation: {message}")]
	InvalidOperation { message: String },
	#[error("Invalid argument: {message}")]
	InvalidArgument { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn validation(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into() }
	}

	pub(crate) fn not_found(entity: &str, id: i64) -> Self {
		Self::NotFound { message: format!("{entity} {id} not found.") }
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<orgdir_storage::Error> for Error {
	fn from(err: orgdir_storage::Error) -> Self {
		match err {
			orgdir_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			orgdir_storage::Error::NotFound(message) => Self::NotFound { message },
			orgdir_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
impl From<HierarchyError> for Error {
	fn from(err: HierarchyError) -> Self {
		Self::InvalidOperation { message: err.to_string() }
	}
}
impl From<LocationError> for Error {
	fn from(err: LocationError) -> Self {
		Self::InvalidArgument { message: err.to_string() }
	}
}
