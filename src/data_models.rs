use serde::Deserialize;
use serde_json::Value;

/// What the user asked for. Built fresh on every submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub text: String,
    pub advanced: bool,
}

impl Query {
    pub fn new(text: impl Into<String>, advanced: bool) -> Query {
        Query {
            text: text.into(),
            advanced,
        }
    }

    /// The two URL parameters the search API understands, in wire order.
    pub fn params(&self) -> [(&'static str, &str); 2] {
        let advanced = if self.advanced { "true" } else { "false" };
        [("advanced", advanced), ("query", self.text.as_str())]
    }
}

/// A single hit returned by the search API.
///
/// The API answers with positional arrays. Two shapes exist: the current
/// `[docId, score, title, link]` and the older `[id, value]` that early
/// clients printed as a bare snippet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ResultRow")]
pub enum SearchResult {
    Article(ArticleResult),
    Snippet(SnippetResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleResult {
    pub id: Value,
    /// tf-idf score assigned by the backend.
    pub score: f64,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnippetResult {
    pub id: Value,
    pub snippet: String,
}

impl SearchResult {
    pub fn title(&self) -> Option<&str> {
        match self {
            SearchResult::Article(article) => Some(&article.title),
            SearchResult::Snippet(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResultRow {
    Article(Value, f64, String, String),
    Snippet(Value, Value),
}

impl From<ResultRow> for SearchResult {
    fn from(row: ResultRow) -> Self {
        match row {
            ResultRow::Article(id, score, title, link) => SearchResult::Article(ArticleResult {
                id,
                score,
                title,
                link,
            }),
            ResultRow::Snippet(id, value) => SearchResult::Snippet(SnippetResult {
                id,
                snippet: value_to_text(&value),
            }),
        }
    }
}

// Matches how a browser stringifies the value: arrays join with commas,
// whole floats drop the fraction, objects collapse to "[object Object]".
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => js_string(other),
    }
}

fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_params_are_in_wire_order() {
        let query = Query::new("cats", false);
        assert_eq!(query.params(), [("advanced", "false"), ("query", "cats")]);

        let query = Query::new("dogs and cats", true);
        assert_eq!(
            query.params(),
            [("advanced", "true"), ("query", "dogs and cats")]
        );
    }

    #[test]
    fn decodes_article_rows() {
        let rows: Vec<SearchResult> = serde_json::from_value(json!([
            [12, 0.75, "Cat", "https://en.wikipedia.org/wiki/Cat"],
            ["doc-7", 1, "Dog", "https://en.wikipedia.org/wiki/Dog"]
        ]))
        .unwrap();

        assert_eq!(
            rows[0],
            SearchResult::Article(ArticleResult {
                id: json!(12),
                score: 0.75,
                title: "Cat".into(),
                link: "https://en.wikipedia.org/wiki/Cat".into(),
            })
        );
        assert_eq!(rows[1].title(), Some("Dog"));
    }

    #[test]
    fn decodes_legacy_snippet_rows() {
        let rows: Vec<SearchResult> =
            serde_json::from_value(json!([[3, 0.5], [4, "plain text"]])).unwrap();

        assert_eq!(
            rows,
            vec![
                SearchResult::Snippet(SnippetResult {
                    id: json!(3),
                    snippet: "0.5".into(),
                }),
                SearchResult::Snippet(SnippetResult {
                    id: json!(4),
                    snippet: "plain text".into(),
                }),
            ]
        );
        assert_eq!(rows[0].title(), None);
    }

    #[test]
    fn mixed_rows_decode_independently() {
        let rows: Vec<SearchResult> =
            serde_json::from_value(json!([[1, 2.0, "A", "/a"], [2, 3]])).unwrap();
        assert!(matches!(rows[0], SearchResult::Article(_)));
        assert!(matches!(rows[1], SearchResult::Snippet(_)));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(serde_json::from_value::<Vec<SearchResult>>(json!([[1, 2, 3]])).is_err());
        assert!(serde_json::from_value::<Vec<SearchResult>>(json!([{"title": "Cat"}])).is_err());
        assert!(serde_json::from_value::<Vec<SearchResult>>(json!({"results": []})).is_err());
    }

    #[test]
    fn snippet_values_render_like_a_browser() {
        let rows: Vec<SearchResult> = serde_json::from_value(json!([
            [1, 1.0],
            [2, [1, 2]],
            [3, [null, "a", [true, 2.5]]],
            [4, {"k": 1}],
            [5, null],
            [6, -7]
        ]))
        .unwrap();

        let snippets: Vec<&str> = rows
            .iter()
            .map(|row| match row {
                SearchResult::Snippet(snippet) => snippet.snippet.as_str(),
                SearchResult::Article(_) => panic!("unexpected article row"),
            })
            .collect();
        assert_eq!(
            snippets,
            ["1", "1,2", ",a,true,2.5", "[object Object]", "null", "-7"]
        );
    }
}
