pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		// A dangling code reference is the caller's mistake, not a storage fault.
		if let Some(db_err) = err.as_database_error()
			&& db_err.is_foreign_key_violation()
		{
			return Self::InvalidRequest { message: db_err.message().to_string() };
		}

		Self::Storage { message: err.to_string() }
	}
}

impl From<rst_storage::Error> for Error {
	fn from(err: rst_storage::Error) -> Self {
		match err {
			rst_storage::Error::Sqlx(inner) => inner.into(),
			rst_storage::Error::UnknownTable(name) => Self::Configuration {
				message: format!("Association table {name:?} is not registered."),
			},
			rst_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}
