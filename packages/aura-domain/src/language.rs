/// Detects the dominant language of a query, returning an ISO 639-3 code.
/// Detection is best-effort; very short or ambiguous inputs return `None`
/// and callers fall back to the declared or index language.
pub fn detect(text: &str) -> Option<&'static str> {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return None;
	}

	whatlang::detect(trimmed).map(|info| info.lang().code())
}

pub fn is_english(code: &str) -> bool {
	matches!(code, "en" | "eng")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_plain_english() {
		let code = detect("strange lights hovering over the water all night long");

		assert_eq!(code, Some("eng"));
	}

	#[test]
	fn detects_spanish() {
		let code = detect("luces extrañas sobre el lago durante toda la noche");

		assert_eq!(code, Some("spa"));
	}

	#[test]
	fn empty_input_detects_nothing() {
		assert_eq!(detect("   "), None);
	}
}
