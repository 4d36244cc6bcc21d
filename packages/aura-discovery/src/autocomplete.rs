use crate::{DiscoveryService, Error, Result, search::deny_when_limited};

const DEFAULT_LIMIT: u32 = 8;
const MAX_LIMIT: u32 = 20;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AutocompleteRequest {
	pub client_id: String,
	pub prefix: String,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AutocompleteResponse {
	pub terms: Vec<String>,
}

impl DiscoveryService {
	pub async fn autocomplete(&self, req: AutocompleteRequest) -> Result<AutocompleteResponse> {
		let client_id = req.client_id.trim();
		let prefix = req.prefix.trim();

		if client_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "client_id must be non-empty.".to_string(),
			});
		}
		if prefix.is_empty() {
			return Err(Error::InvalidRequest {
				message: "prefix must be non-empty.".to_string(),
			});
		}

		deny_when_limited(self.governors.autocomplete.check(client_id))?;

		let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
		let terms = self.store.autocomplete_terms(prefix, limit).await?;

		Ok(AutocompleteResponse { terms })
	}
}
