pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}: {source}")]
	Read { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}: {source}")]
	Parse { path: std::path::PathBuf, source: toml::de::Error },
	#[error("Invalid configuration: {message}")]
	Validation { message: String },
}
