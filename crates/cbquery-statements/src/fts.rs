//! Full-text search expressions.
//!
//! [`fts_match`] and its variants render an inline `SEARCH(index, "query")`
//! call for a `WHERE` clause; [`SearchService`] renders the object form,
//! `SEARCH({index: ..., query: ...})`. Search terms are written into the
//! query text, so none of these expressions bind arguments.
//!
//! # Examples
//!
//! ```
//! use cbquery_core::Fragment;
//! use cbquery_statements::fts::{SearchOptions, fts_match};
//! use cbquery_statements::select;
//!
//! let options = SearchOptions::new("product_index").fields(["name", "description"]);
//! let query = select(["id"]).from("products").with_search(fts_match("laptop", &options));
//!
//! let (sql, args) = query.render().unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT id FROM products WHERE \
//!      SEARCH(product_index, \"name:laptop OR description:laptop\")"
//! );
//! assert!(args.is_empty());
//! ```

use cbquery_core::fragment::{Fragment, Rendered, fragment};
use cbquery_core::{RenderError, RenderResult, Value};

use crate::expr::{And, Or};

const MISSING_INDEX: &str = "full-text search requires an index name";

/// Options shared by the inline `SEARCH(...)` expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
	pub index_name: String,
	pub analyzer: Option<String>,
	/// Written only when greater than zero.
	pub fuzziness: u32,
	/// Written only when greater than zero.
	pub boost: f64,
	/// Name the score is returned under, `SEARCH(...) AS <score>`.
	pub score: Option<String>,
	/// Restricts a match to these fields, `field:query OR ...`.
	pub fields: Vec<String>,
}

impl SearchOptions {
	pub fn new(index_name: impl Into<String>) -> Self {
		Self {
			index_name: index_name.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
		self.analyzer = Some(analyzer.into());
		self
	}

	#[must_use]
	pub fn fuzziness(mut self, fuzziness: u32) -> Self {
		self.fuzziness = fuzziness;
		self
	}

	#[must_use]
	pub fn boost(mut self, boost: f64) -> Self {
		self.boost = boost;
		self
	}

	#[must_use]
	pub fn score(mut self, score: impl Into<String>) -> Self {
		self.score = Some(score.into());
		self
	}

	#[must_use]
	pub fn fields<I, F>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = F>,
		F: Into<String>,
	{
		self.fields = fields.into_iter().map(Into::into).collect();
		self
	}

	fn params(&self) -> Vec<String> {
		let mut params = Vec::new();
		if let Some(analyzer) = &self.analyzer {
			params.push(format!("\"analyzer\": \"{analyzer}\""));
		}
		if self.fuzziness > 0 {
			params.push(format!("\"fuzziness\": {}", self.fuzziness));
		}
		if self.boost > 0.0 {
			params.push(format!("\"boost\": {}", self.boost));
		}
		params
	}
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
	/// Matched against the configured fields, if any.
	Query(String),
	/// Matched as an exact phrase; fields are ignored.
	Phrase(String),
	/// A range match given neither bound.
	Unbounded,
}

/// An inline `SEARCH(index, "query"[, {options}])` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
	term: Term,
	options: SearchOptions,
}

impl SearchMatch {
	fn new(term: Term, options: &SearchOptions) -> Self {
		Self {
			term,
			options: options.clone(),
		}
	}
}

/// Matches `query` using `options`.
pub fn fts_match(query: impl Into<String>, options: &SearchOptions) -> SearchMatch {
	SearchMatch::new(Term::Query(query.into()), options)
}

/// Matches `phrase` exactly. Surrounding double quotes are not repeated.
pub fn fts_phrase_match(phrase: impl Into<String>, options: &SearchOptions) -> SearchMatch {
	SearchMatch::new(Term::Phrase(phrase.into()), options)
}

/// Matches terms containing `pattern`, `*pattern*`.
pub fn fts_wildcard_match(pattern: impl AsRef<str>, options: &SearchOptions) -> SearchMatch {
	fts_match(format!("*{}*", pattern.as_ref()), options)
}

/// Matches terms starting with `prefix`, `prefix*`.
pub fn fts_prefix_match(prefix: impl AsRef<str>, options: &SearchOptions) -> SearchMatch {
	fts_match(format!("{}*", prefix.as_ref()), options)
}

/// Matches `field` between `min` and `max`; a `Null` bound is open.
///
/// Rendering fails when both bounds are open.
pub fn fts_range_match(
	field: impl AsRef<str>,
	min: impl Into<Value>,
	max: impl Into<Value>,
	options: &SearchOptions,
) -> SearchMatch {
	let field = field.as_ref();
	let term = match (min.into(), max.into()) {
		(Value::Null, Value::Null) => Term::Unbounded,
		(min, Value::Null) => Term::Query(format!("{field}:>={min}")),
		(Value::Null, max) => Term::Query(format!("{field}:<={max}")),
		(min, max) => Term::Query(format!("{field}:[{min} TO {max}]")),
	};
	SearchMatch::new(term, options)
}

impl Fragment for SearchMatch {
	fn render(&self) -> RenderResult<Rendered> {
		let options = &self.options;
		let body = match &self.term {
			Term::Unbounded => {
				return Err(RenderError::MissingClause(
					"range match needs a lower or upper bound".into(),
				));
			}
			Term::Phrase(phrase) => {
				let phrase = phrase
					.strip_prefix('"')
					.and_then(|inner| inner.strip_suffix('"'))
					.unwrap_or(phrase);
				format!("\"{phrase}\"")
			}
			Term::Query(query) if options.fields.is_empty() => format!("\"{query}\""),
			Term::Query(query) => {
				let per_field: Vec<String> =
					options.fields.iter().map(|field| format!("{field}:{query}")).collect();
				format!("\"{}\"", per_field.join(" OR "))
			}
		};
		if options.index_name.is_empty() {
			return Err(RenderError::MissingClause(MISSING_INDEX.into()));
		}

		let mut sql = format!("SEARCH({}, {body}", options.index_name);
		let params = options.params();
		if !params.is_empty() {
			sql.push_str(", {");
			sql.push_str(&params.join(", "));
			sql.push('}');
		}
		sql.push(')');
		if let Some(score) = &options.score {
			sql.push_str(" AS ");
			sql.push_str(score);
		}
		Ok((sql, Vec::new()))
	}
}

/// Requires every search to match: a single search renders bare, several are
/// joined with `AND` in parentheses.
pub fn fts_conjunction<I, F>(searches: I) -> And
where
	I: IntoIterator<Item = F>,
	F: Fragment + 'static,
{
	searches.into_iter().map(fragment).collect()
}

/// Requires any search to match, joined with `OR`.
pub fn fts_disjunction<I, F>(searches: I) -> Or
where
	I: IntoIterator<Item = F>,
	F: Fragment + 'static,
{
	searches.into_iter().map(fragment).collect()
}

/// A query against the search service, `SEARCH({index: ..., query: ...})`.
///
/// Limit and offset are written only when greater than zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchService {
	index_name: String,
	query: String,
	fields: Vec<String>,
	limit: u64,
	offset: u64,
	highlight: Option<String>,
	score: Option<String>,
	explain: bool,
}

impl SearchService {
	pub fn new(index_name: impl Into<String>, query: impl Into<String>) -> Self {
		Self {
			index_name: index_name.into(),
			query: query.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn fields<I, F>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = F>,
		F: Into<String>,
	{
		self.fields = fields.into_iter().map(Into::into).collect();
		self
	}

	#[must_use]
	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = limit;
		self
	}

	#[must_use]
	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = offset;
		self
	}

	/// Requests highlighted fragments in `style`, e.g. `html`.
	#[must_use]
	pub fn highlight(mut self, style: impl Into<String>) -> Self {
		self.highlight = Some(style.into());
		self
	}

	#[must_use]
	pub fn score(mut self, score: impl Into<String>) -> Self {
		self.score = Some(score.into());
		self
	}

	#[must_use]
	pub fn explain(mut self, explain: bool) -> Self {
		self.explain = explain;
		self
	}
}

impl Fragment for SearchService {
	fn render(&self) -> RenderResult<Rendered> {
		if self.index_name.is_empty() {
			return Err(RenderError::MissingClause(MISSING_INDEX.into()));
		}

		let mut entries = vec![
			format!("index: {}", self.index_name),
			format!("query: \"{}\"", self.query),
		];
		if !self.fields.is_empty() {
			let quoted: Vec<String> =
				self.fields.iter().map(|field| format!("\"{field}\"")).collect();
			entries.push(format!("fields: [{}]", quoted.join(", ")));
		}
		if self.limit > 0 {
			entries.push(format!("limit: {}", self.limit));
		}
		if self.offset > 0 {
			entries.push(format!("offset: {}", self.offset));
		}
		if let Some(style) = &self.highlight {
			entries.push(format!("highlight: {{\"style\":\"{style}\"}}"));
		}
		if self.explain {
			entries.push("explain: true".to_owned());
		}

		let mut sql = format!("SEARCH({{{}}})", entries.join(", "));
		if let Some(score) = &self.score {
			sql.push_str(" AS ");
			sql.push_str(score);
		}
		Ok((sql, Vec::new()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::statement::{Statement, select};
	use pretty_assertions::assert_eq;
	use rstest::{fixture, rstest};

	#[fixture]
	fn products() -> SearchOptions {
		SearchOptions::new("product_index")
	}

	fn sql_of(fragment: &dyn Fragment) -> String {
		let (sql, args) = fragment.render().unwrap();
		assert!(args.is_empty());
		sql
	}

	#[rstest]
	#[case::basic(SearchOptions::new("product_index"), r#"SEARCH(product_index, "laptop")"#)]
	#[case::fields(
		SearchOptions::new("product_index").fields(["name", "description"]),
		r#"SEARCH(product_index, "name:laptop OR description:laptop")"#
	)]
	#[case::analyzer(
		SearchOptions::new("product_index").analyzer("standard"),
		r#"SEARCH(product_index, "laptop", {"analyzer": "standard"})"#
	)]
	#[case::fuzziness(
		SearchOptions::new("product_index").fuzziness(2),
		r#"SEARCH(product_index, "laptop", {"fuzziness": 2})"#
	)]
	#[case::boost(
		SearchOptions::new("product_index").boost(1.5),
		r#"SEARCH(product_index, "laptop", {"boost": 1.5})"#
	)]
	#[case::score(
		SearchOptions::new("product_index").score("relevance"),
		r#"SEARCH(product_index, "laptop") AS relevance"#
	)]
	#[case::all_params(
		SearchOptions::new("users_fts").analyzer("en").fuzziness(1).boost(2.0),
		r#"SEARCH(users_fts, "laptop", {"analyzer": "en", "fuzziness": 1, "boost": 2})"#
	)]
	fn test_match(#[case] options: SearchOptions, #[case] expected: &str) {
		assert_eq!(sql_of(&fts_match("laptop", &options)), expected);
	}

	#[rstest]
	fn test_missing_index_is_an_error() {
		let result = fts_match("laptop", &SearchOptions::default()).render();

		assert_eq!(result, Err(RenderError::MissingClause(MISSING_INDEX.into())));
	}

	#[rstest]
	#[case::plain("gaming laptop")]
	#[case::pre_quoted("\"gaming laptop\"")]
	fn test_phrase_is_quoted_once(products: SearchOptions, #[case] phrase: &str) {
		assert_eq!(
			sql_of(&fts_phrase_match(phrase, &products)),
			r#"SEARCH(product_index, "gaming laptop")"#
		);
	}

	#[rstest]
	fn test_phrase_ignores_fields(products: SearchOptions) {
		let options = products.fields(["name"]);

		assert_eq!(sql_of(&fts_phrase_match("a b", &options)), r#"SEARCH(product_index, "a b")"#);
	}

	#[rstest]
	fn test_wildcard_and_prefix(products: SearchOptions) {
		assert_eq!(
			sql_of(&fts_wildcard_match("laptop", &products)),
			r#"SEARCH(product_index, "*laptop*")"#
		);
		assert_eq!(sql_of(&fts_prefix_match("lap", &products)), r#"SEARCH(product_index, "lap*")"#);
	}

	#[rstest]
	#[case::inclusive(Value::from(100), Value::from(500), "price:[100 TO 500]")]
	#[case::minimum_only(Value::from(100), Value::Null, "price:>=100")]
	#[case::maximum_only(Value::Null, Value::from(500), "price:<=500")]
	fn test_range(
		products: SearchOptions,
		#[case] min: Value,
		#[case] max: Value,
		#[case] term: &str,
	) {
		let sql = sql_of(&fts_range_match("price", min, max, &products));

		assert_eq!(sql, format!("SEARCH(product_index, \"{term}\")"));
	}

	#[rstest]
	fn test_range_without_bounds_is_an_error(products: SearchOptions) {
		let result = fts_range_match("price", Value::Null, Value::Null, &products).render();

		assert_eq!(
			result,
			Err(RenderError::MissingClause("range match needs a lower or upper bound".into()))
		);
	}

	#[rstest]
	fn test_conjunction_and_disjunction(products: SearchOptions) {
		// Arrange
		let laptop = fts_match("laptop", &products);
		let priced = fts_range_match("price", 100, 500, &products);
		let desktop = fts_match("desktop", &products);

		// Act
		let both = fts_conjunction([laptop.clone(), priced]);
		let either = fts_disjunction([laptop.clone(), desktop]);

		// Assert
		assert_eq!(
			sql_of(&both),
			r#"(SEARCH(product_index, "laptop") AND SEARCH(product_index, "price:[100 TO 500]"))"#
		);
		assert_eq!(
			sql_of(&either),
			r#"(SEARCH(product_index, "laptop") OR SEARCH(product_index, "desktop"))"#
		);
		assert_eq!(sql_of(&fts_conjunction([laptop.clone()])), sql_of(&laptop));
		assert_eq!(sql_of(&fts_conjunction(Vec::<SearchMatch>::new())), "");
	}

	#[rstest]
	#[case::basic(
		SearchService::new("product_index", "laptop"),
		r#"SEARCH({index: product_index, query: "laptop"})"#
	)]
	#[case::fields(
		SearchService::new("product_index", "laptop").fields(["name", "description"]),
		r#"SEARCH({index: product_index, query: "laptop", fields: ["name", "description"]})"#
	)]
	#[case::paging(
		SearchService::new("product_index", "laptop").limit(10).offset(20),
		r#"SEARCH({index: product_index, query: "laptop", limit: 10, offset: 20})"#
	)]
	#[case::highlight(
		SearchService::new("product_index", "laptop").highlight("html"),
		r#"SEARCH({index: product_index, query: "laptop", highlight: {"style":"html"}})"#
	)]
	#[case::score(
		SearchService::new("product_index", "laptop").score("relevance"),
		r#"SEARCH({index: product_index, query: "laptop"}) AS relevance"#
	)]
	#[case::explain(
		SearchService::new("product_index", "laptop").explain(true),
		r#"SEARCH({index: product_index, query: "laptop", explain: true})"#
	)]
	fn test_search_service(#[case] service: SearchService, #[case] expected: &str) {
		assert_eq!(sql_of(&service), expected);
	}

	#[rstest]
	fn test_search_service_needs_index() {
		let result = SearchService::new("", "laptop").render();

		assert_eq!(result, Err(RenderError::MissingClause(MISSING_INDEX.into())));
	}

	#[rstest]
	fn test_with_search_adds_where_predicate(products: SearchOptions) {
		// Arrange
		let query = select(["id", "name", "price"])
			.from("products")
			.where_("price < ?", [900])
			.with_search(fts_match("laptop", &products));

		// Act
		let (sql, args) = query.render().unwrap();

		// Assert
		assert_eq!(
			sql,
			"SELECT id, name, price FROM products \
			 WHERE price < ? AND SEARCH(product_index, \"laptop\")"
		);
		assert_eq!(args, vec![Value::from(900)]);
		assert!(query.must_render().0.contains("SEARCH"));
	}
}
