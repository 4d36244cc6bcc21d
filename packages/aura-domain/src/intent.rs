use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Weight split applied when a query reads as a natural-language description.
pub const NATURAL_VECTOR_WEIGHT: f32 = 0.8;
/// Weight split applied when a query reads as a bare keyword lookup.
pub const KEYWORD_VECTOR_WEIGHT: f32 = 0.3;
/// Weight split applied when neither signal is decisive.
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.6;

// Calibration constants. These are fixed policy values, not derived; tune
// them together with the weight splits above.
const BASE_CONFIDENCE: f32 = 0.5;
const KEYWORD_CONFIDENCE: f32 = 0.9;
const NATURAL_CONFIDENCE: f32 = 0.7;
const QUESTION_CONFIDENCE: f32 = 0.95;

const NATURAL_SCORE_THRESHOLD: f32 = 0.4;
const KEYWORD_MAX_WORDS: usize = 3;
const LONG_QUERY_WORDS: usize = 5;

const LONG_QUERY_SCORE: f32 = 0.3;
const PHRASE_SCORE: f32 = 0.4;
const SEPARATOR_SCORE: f32 = 0.2;
const FUNCTION_WORD_SCORE: f32 = 0.1;

const INTERROGATIVE_OPENERS: &[&str] = &[
	"what", "how", "why", "when", "where", "who", "which", "is there", "are there", "can", "could",
	"would", "should",
];

const CONVERSATIONAL_PHRASES: &[&str] = &[
	"looking for",
	"tell me about",
	"show me",
	"i want to",
	"i am trying to",
	"i need to find",
	"help me find",
];

const FUNCTION_WORDS: &[&str] =
	&["the", "a", "an", "of", "in", "on", "at", "to", "for", "with", "and", "or"];

const SENTENCE_SEPARATORS: &[char] = &['.', '!', '?', ';'];

struct ConceptRule {
	concept: &'static str,
	keywords: &'static [&'static str],
}

// New concepts are additive rows here, not new code paths.
const CONCEPT_RULES: &[ConceptRule] = &[
	ConceptRule {
		concept: "sighting",
		keywords: &["ufo", "sighting", "light", "craft", "object", "sky", "orb"],
	},
	ConceptRule {
		concept: "encounter",
		keywords: &["encounter", "being", "creature", "entity", "figure", "visitor"],
	},
	ConceptRule {
		concept: "haunting",
		keywords: &["ghost", "spirit", "haunted", "apparition", "shadow"],
	},
	ConceptRule { concept: "dream", keywords: &["dream", "sleep", "lucid", "nightmare"] },
	ConceptRule {
		concept: "synchronicity",
		keywords: &["coincidence", "synchronicity", "deja vu", "pattern"],
	},
];

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IntentResult {
	pub is_question: bool,
	pub is_natural_language: bool,
	pub is_keyword: bool,
	pub confidence: f32,
	pub vector_weight: f32,
	pub lexical_weight: f32,
	pub concepts: Vec<String>,
}
impl IntentResult {
	fn neutral() -> Self {
		Self {
			is_question: false,
			is_natural_language: false,
			is_keyword: false,
			confidence: 0.0,
			vector_weight: DEFAULT_VECTOR_WEIGHT,
			lexical_weight: 1.0 - DEFAULT_VECTOR_WEIGHT,
			concepts: Vec::new(),
		}
	}

	pub fn search_type(&self) -> &'static str {
		if self.is_question {
			"question"
		} else if self.is_keyword {
			"keyword"
		} else if self.is_natural_language {
			"natural_language"
		} else {
			"balanced"
		}
	}
}

/// Classifies free text into a retrieval-mode estimate and the
/// vector/lexical weight split the fusion step will use.
///
/// Pure and deterministic; an empty or whitespace-only query yields a
/// neutral result with confidence 0, which callers must treat as "do not
/// execute a fused search".
pub fn classify(query: &str) -> IntentResult {
	let normalized = query.trim().to_lowercase();

	if normalized.is_empty() {
		return IntentResult::neutral();
	}

	let words: Vec<&str> = normalized.unicode_words().collect();
	let word_count = words.len();
	let is_question = normalized.contains('?') || starts_with_opener(&normalized);
	let phrase_match = CONVERSATIONAL_PHRASES.iter().any(|phrase| normalized.contains(phrase));
	let separator_count =
		normalized.chars().filter(|ch| SENTENCE_SEPARATORS.contains(ch)).count();
	let has_function_word =
		words.iter().any(|word| FUNCTION_WORDS.iter().any(|function| function == word));

	let mut natural_score = 0.0;

	if word_count >= LONG_QUERY_WORDS {
		natural_score += LONG_QUERY_SCORE;
	}
	if phrase_match {
		natural_score += PHRASE_SCORE;
	}
	if separator_count > 1 {
		natural_score += SEPARATOR_SCORE;
	}
	if has_function_word {
		natural_score += FUNCTION_WORD_SCORE;
	}

	let is_natural_language = natural_score >= NATURAL_SCORE_THRESHOLD || is_question;
	let is_keyword = word_count <= KEYWORD_MAX_WORDS && !is_question && !phrase_match;
	let confidence = if is_question {
		QUESTION_CONFIDENCE
	} else if is_keyword {
		KEYWORD_CONFIDENCE
	} else if is_natural_language {
		NATURAL_CONFIDENCE
	} else {
		BASE_CONFIDENCE
	};
	let vector_weight = if is_natural_language {
		NATURAL_VECTOR_WEIGHT
	} else if is_keyword {
		KEYWORD_VECTOR_WEIGHT
	} else {
		DEFAULT_VECTOR_WEIGHT
	};

	IntentResult {
		is_question,
		is_natural_language,
		is_keyword,
		confidence,
		vector_weight,
		lexical_weight: 1.0 - vector_weight,
		concepts: detect_concepts(&normalized),
	}
}

fn starts_with_opener(normalized: &str) -> bool {
	INTERROGATIVE_OPENERS.iter().any(|opener| {
		normalized == *opener || normalized.starts_with(&format!("{opener} "))
	})
}

fn detect_concepts(normalized: &str) -> Vec<String> {
	let mut out = Vec::new();

	for rule in CONCEPT_RULES {
		if rule.keywords.iter().any(|keyword| normalized.contains(keyword)) {
			out.push(rule.concept.to_string());
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn weights_always_sum_to_one() {
		for query in [
			"ufo",
			"strange lights over the lake at night",
			"what did I see last night?",
			"looking for stories about shadow figures",
			"red orb",
		] {
			let intent = classify(query);

			assert_eq!(intent.vector_weight + intent.lexical_weight, 1.0, "query: {query}");
		}
	}

	#[test]
	fn question_mark_always_flags_question() {
		let intent = classify("glowing triangle?");

		assert!(intent.is_question);
		assert!(intent.is_natural_language);
		assert_eq!(intent.confidence, 0.95);
		assert_eq!(intent.vector_weight, 0.8);
	}

	#[test]
	fn interrogative_opener_flags_question_without_question_mark() {
		let intent = classify("where do most sightings happen");

		assert!(intent.is_question);
		assert!(!intent.is_keyword);
	}

	#[test]
	fn opener_must_be_a_whole_word() {
		// "cannery" starts with "can" but is not an interrogative opener.
		let intent = classify("cannery row lights");

		assert!(!intent.is_question);
		assert!(intent.is_keyword);
	}

	#[test]
	fn short_queries_classify_as_keyword() {
		let intent = classify("black triangle");

		assert!(intent.is_keyword);
		assert!(!intent.is_natural_language);
		assert!(!intent.is_question);
		assert_eq!(intent.confidence, 0.9);
		assert_eq!(intent.vector_weight, 0.3);
		assert_eq!(intent.lexical_weight, 0.7);
	}

	#[test]
	fn conversational_phrase_drives_natural_language() {
		let intent = classify("looking for reports of strange lights near the coast");

		assert!(intent.is_natural_language);
		assert!(!intent.is_keyword);
		assert_eq!(intent.confidence, 0.7);
		assert_eq!(intent.vector_weight, 0.8);
	}

	#[test]
	fn descriptive_query_with_function_words_is_natural_language() {
		let intent = classify("UFO sighting near the lake");

		assert!(intent.is_natural_language);
		assert!(!intent.is_question);
		assert!(!intent.is_keyword);
		assert_eq!(intent.vector_weight, 0.8);
		assert_eq!(intent.lexical_weight, 1.0 - 0.8);
	}

	#[test]
	fn empty_query_is_neutral() {
		let intent = classify("   ");

		assert!(!intent.is_question);
		assert!(!intent.is_natural_language);
		assert!(!intent.is_keyword);
		assert_eq!(intent.confidence, 0.0);
		assert_eq!(intent.vector_weight, 0.6);
	}

	#[test]
	fn concepts_come_from_the_rule_table() {
		let intent = classify("a ufo and a ghost in the same dream");

		assert!(intent.concepts.iter().any(|concept| concept == "sighting"));
		assert!(intent.concepts.iter().any(|concept| concept == "haunting"));
		assert!(intent.concepts.iter().any(|concept| concept == "dream"));
	}

	#[test]
	fn classification_is_deterministic() {
		let first = classify("strange humming sound in the valley");
		let second = classify("strange humming sound in the valley");

		assert_eq!(first.vector_weight, second.vector_weight);
		assert_eq!(first.confidence, second.confidence);
		assert_eq!(first.concepts, second.concepts);
	}
}
