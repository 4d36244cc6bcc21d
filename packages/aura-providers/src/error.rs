pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error(transparent)]
	HeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Invalid provider config: {message}")]
	InvalidConfig { message: String },
	#[error("Invalid provider response: {message}")]
	InvalidResponse { message: String },
}
