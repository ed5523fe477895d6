use serde::Deserialize;

use crate::data_models::Query;

/// Query string of the search form. `query` is absent on the first visit.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub advanced: Option<String>,
}

impl SearchParams {
    pub fn to_query(&self) -> Option<Query> {
        let text = self.query.as_ref()?;
        let advanced = matches!(
            self.advanced.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "on" | "1")
        );
        Some(Query::new(text.clone(), advanced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visit_has_no_query() {
        assert_eq!(SearchParams::default().to_query(), None);
    }

    #[test]
    fn checkbox_values() {
        for (raw, expected) in [
            (Some("true"), true),
            (Some("on"), true),
            (Some("1"), true),
            (Some("TRUE"), true),
            (Some("false"), false),
            (None, false),
        ] {
            let params = SearchParams {
                query: Some("cats".into()),
                advanced: raw.map(String::from),
            };
            assert_eq!(params.to_query(), Some(Query::new("cats", expected)), "{raw:?}");
        }
    }
}
