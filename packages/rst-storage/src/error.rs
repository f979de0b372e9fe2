#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Association table {0:?} is not registered on this storage handle.")]
	UnknownTable(String),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
}
