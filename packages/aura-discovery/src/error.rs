use time::OffsetDateTime;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Rate limit exceeded.")]
	RateLimited { remaining: u32, reset_at: OffsetDateTime },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<aura_storage::Error> for Error {
	fn from(err: aura_storage::Error) -> Self {
		match err {
			aura_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			aura_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			aura_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}
