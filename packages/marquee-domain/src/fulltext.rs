//! Weighted full-text expressions.
//!
//! The grammar is a small subset of the common search-engine DSL:
//!
//! ```text
//! @genres_names^1 +comedy~ @*^0.3,name^1.1 dark knight
//! ```
//!
//! `@` opens a field scope that applies to every following word until the next scope, `^w` sets a
//! field weight, `*` stands for every searchable field, a leading `+` makes a word required and a
//! trailing `~` asks for a typo-tolerant match.

pub const ALL_FIELDS: &str = "*";

#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoost {
	pub field: String,
	pub weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
	pub fields: Vec<FieldBoost>,
	pub text: String,
	pub required: bool,
	pub fuzzy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("Empty field scope at token {0:?}.")]
	EmptyScope(String),
	#[error("Invalid field weight at token {0:?}.")]
	InvalidWeight(String),
	#[error("Empty term at token {0:?}.")]
	EmptyTerm(String),
}

/// Accumulates scoped clauses into one expression string.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
	out: String,
}
impl ExpressionBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn scope(&mut self, fields: &[(&str, f32)], words: &[String], required: bool, fuzzy: bool) {
		if !self.out.is_empty() {
			self.out.push(' ');
		}

		self.out.push('@');

		for (i, (field, weight)) in fields.iter().enumerate() {
			if i > 0 {
				self.out.push(',');
			}

			self.out.push_str(&format!("{field}^{weight}"));
		}

		for word in words {
			self.out.push(' ');

			if required {
				self.out.push('+');
			}

			self.out.push_str(word);

			if fuzzy {
				self.out.push('~');
			}
		}
	}

	pub fn is_empty(&self) -> bool {
		self.out.is_empty()
	}

	pub fn finish(self) -> String {
		self.out
	}
}

/// Splits free text into lower-cased alphanumeric words.
///
/// Operator characters never survive, so user input cannot open scopes or change weights.
pub fn words(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|word| !word.is_empty())
		.map(str::to_lowercase)
		.collect()
}

pub fn parse(expression: &str) -> Result<Vec<Term>, ParseError> {
	let mut scope = vec![FieldBoost { field: ALL_FIELDS.to_string(), weight: 1.0 }];
	let mut terms = Vec::new();

	for token in expression.split_whitespace() {
		if let Some(fields) = token.strip_prefix('@') {
			scope = parse_scope(token, fields)?;

			continue;
		}

		let (required, rest) = match token.strip_prefix('+') {
			Some(rest) => (true, rest),
			None => (false, token),
		};
		let (fuzzy, text) = match rest.strip_suffix('~') {
			Some(text) => (true, text),
			None => (false, rest),
		};

		if text.is_empty() {
			return Err(ParseError::EmptyTerm(token.to_string()));
		}

		terms.push(Term { fields: scope.clone(), text: text.to_lowercase(), required, fuzzy });
	}

	Ok(terms)
}

fn parse_scope(token: &str, fields: &str) -> Result<Vec<FieldBoost>, ParseError> {
	let mut out = Vec::new();

	for part in fields.split(',') {
		let (field, weight) = match part.split_once('^') {
			Some((field, weight)) => {
				let weight: f32 =
					weight.parse().map_err(|_| ParseError::InvalidWeight(token.to_string()))?;

				if !weight.is_finite() || weight < 0.0 {
					return Err(ParseError::InvalidWeight(token.to_string()));
				}

				(field, weight)
			},
			None => (part, 1.0),
		};

		if field.is_empty() {
			return Err(ParseError::EmptyScope(token.to_string()));
		}

		out.push(FieldBoost { field: field.to_string(), weight });
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_renders_weights_compactly() {
		let mut builder = ExpressionBuilder::new();

		builder.scope(&[(ALL_FIELDS, 0.3), ("name", 1.1)], &words("Dark Knight"), false, false);

		assert_eq!(builder.finish(), "@*^0.3,name^1.1 dark knight");
	}

	#[test]
	fn words_drop_operator_characters() {
		assert_eq!(words("+@name^9 sci-fi~"), vec!["name", "9", "sci", "fi"]);
		assert_eq!(words("Брат 2"), vec!["брат", "2"]);
	}

	#[test]
	fn parses_scoped_terms() {
		let terms = parse("@genres_names^1 +comedy~ @*^0.3,name^1.1 knight").expect("Must parse.");

		assert_eq!(terms.len(), 2);
		assert_eq!(terms[0].fields, vec![FieldBoost { field: "genres_names".to_string(), weight: 1.0 }]);
		assert!(terms[0].required && terms[0].fuzzy);
		assert_eq!(terms[1].fields.len(), 2);
		assert_eq!(terms[1].fields[1].weight, 1.1);
		assert!(!terms[1].required && !terms[1].fuzzy);
	}

	#[test]
	fn terms_without_scope_search_everything() {
		let terms = parse("matrix").expect("Must parse.");

		assert_eq!(terms[0].fields[0].field, ALL_FIELDS);
	}

	#[test]
	fn scope_without_terms_yields_nothing() {
		assert_eq!(parse("@*^0.3,name^1.1"), Ok(Vec::new()));
	}

	#[test]
	fn rejects_malformed_tokens() {
		assert_eq!(parse("@name^x matrix"), Err(ParseError::InvalidWeight("@name^x".to_string())));
		assert_eq!(parse("@ matrix"), Err(ParseError::EmptyScope("@".to_string())));
		assert_eq!(parse("+~"), Err(ParseError::EmptyTerm("+~".to_string())));
	}
}
