//! The search page: a [`Document`] plus the handful of elements the search
//! flow reads and writes, resolved once when the page is bound.

use tracing::debug;

use crate::data_models::{ArticleResult, Query, SearchResult, SnippetResult};
use crate::dom::{Document, NodeId};
use crate::error::{ClientError, Result};

pub const SEARCH_FORM_CLASS: &str = "search-form";
pub const SEARCH_INPUT_CLASS: &str = "search-input";
pub const RESULTS_CONTAINER_CLASS: &str = "search-results-container";
pub const ADVANCED_CHECKBOX_ID: &str = "advanced";
/// Marks the centred first-visit layout. Dropped after the first successful search.
pub const INITIAL_LAYOUT_CLASS: &str = "init";
pub const RESULT_ITEM_CLASS: &str = "result-item";
pub const LOADING_CLASS: &str = "loading-grad";

pub const NO_RESULTS_HTML: &str = "<h2>No Results</h2>";
const PLACEHOLDER_TITLE: &str = "Temp Result";
const PLACEHOLDER_LINK: &str = "./";

/// The built-in page used when no template is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("../static/index.html");

/// A summary placeholder waiting to be filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub node: NodeId,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    doc: Document,
    form: NodeId,
    input: NodeId,
    advanced: Option<NodeId>,
    results: NodeId,
    generation: u64,
}

impl SearchPage {
    /// Resolves the form, input, checkbox and results container. The checkbox
    /// is optional; pages without it always search in simple mode.
    pub fn bind(doc: Document) -> Result<SearchPage> {
        let form = first_by_class(&doc, SEARCH_FORM_CLASS)?;
        let input = first_by_class(&doc, SEARCH_INPUT_CLASS)?;
        let results = first_by_class(&doc, RESULTS_CONTAINER_CLASS)?;
        let advanced = doc.element_by_id(ADVANCED_CHECKBOX_ID);
        Ok(SearchPage {
            doc,
            form,
            input,
            advanced,
            results,
            generation: 0,
        })
    }

    pub fn from_html(html: &str) -> Result<SearchPage> {
        Self::bind(Document::parse(html))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn has_advanced_toggle(&self) -> bool {
        self.advanced.is_some()
    }

    /// Reads the current form state the way a submit would see it.
    pub fn query(&self) -> Query {
        let text = self.doc.attr(self.input, "value").unwrap_or_default();
        let advanced = self
            .advanced
            .is_some_and(|checkbox| self.doc.attr(checkbox, "checked").is_some());
        Query::new(text, advanced)
    }

    pub fn fill_form(&mut self, query: &Query) {
        self.doc.set_attr(self.input, "value", &query.text);
        if let Some(checkbox) = self.advanced {
            if query.advanced {
                self.doc.set_attr(checkbox, "checked", "");
            } else {
                self.doc.remove_attr(checkbox, "checked");
            }
        }
    }

    pub fn set_form_action(&mut self, action: &str) {
        self.doc.set_attr(self.form, "action", action);
        self.doc.set_attr(self.form, "method", "get");
    }

    /// Starts a new search cycle. Summaries requested under an older
    /// generation are ignored from now on.
    pub fn begin_search(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops the initial layout class from every element holding it.
    /// Returns how many elements changed.
    pub fn leave_initial_layout(&mut self) -> usize {
        let holders = self.doc.elements_by_class(INITIAL_LAYOUT_CLASS);
        for node in &holders {
            self.doc.remove_class(*node, INITIAL_LAYOUT_CLASS);
        }
        holders.len()
    }

    pub fn in_initial_layout(&self) -> bool {
        !self.doc.elements_by_class(INITIAL_LAYOUT_CLASS).is_empty()
    }

    /// Replaces the results area with one node per result, in order.
    pub fn render_results(&mut self, results: &[SearchResult]) -> Vec<PendingSummary> {
        self.doc.clear_children(self.results);

        if results.is_empty() {
            let heading = self.doc.create_element("h2", &[]);
            self.doc.set_text(heading, "No Results");
            self.doc.append_child(self.results, heading);
            return Vec::new();
        }

        let mut pending = Vec::new();
        for result in results {
            let item = match result {
                SearchResult::Article(article) => {
                    let (item, summary) = self.article_node(article);
                    pending.push(PendingSummary {
                        node: summary,
                        title: article.title.clone(),
                    });
                    item
                }
                SearchResult::Snippet(snippet) => self.snippet_node(snippet),
            };
            self.doc.append_child(self.results, item);
        }
        debug!(
            results = results.len(),
            nodes = self.doc.node_count(),
            "rendered results"
        );
        pending
    }

    // <div class="result-item"><a href=LINK><h2>TITLE</h2><small>LINK</small></a>
    // <p id=TITLE class="summary loading-grad"></p><hr></div>
    fn article_node(&mut self, article: &ArticleResult) -> (NodeId, NodeId) {
        let doc = &mut self.doc;
        let item = doc.create_element("div", &[("class", RESULT_ITEM_CLASS)]);

        let anchor = doc.create_element("a", &[("href", article.link.as_str())]);
        let heading = doc.create_element("h2", &[]);
        doc.set_text(heading, &article.title);
        let small = doc.create_element("small", &[]);
        doc.set_text(small, &article.link);
        doc.append_child(anchor, heading);
        doc.append_child(anchor, small);

        let summary = doc.create_element(
            "p",
            &[("id", article.title.as_str()), ("class", "summary loading-grad")],
        );
        let rule = doc.create_element("hr", &[]);

        doc.append_child(item, anchor);
        doc.append_child(item, summary);
        doc.append_child(item, rule);
        (item, summary)
    }

    // <div class="result-item"><h3><a href="./">Temp Result</a></h3><p>SNIPPET</p><hr></div>
    fn snippet_node(&mut self, snippet: &SnippetResult) -> NodeId {
        let doc = &mut self.doc;
        let item = doc.create_element("div", &[("class", RESULT_ITEM_CLASS)]);
        let heading = doc.create_element("h3", &[]);
        let anchor = doc.create_element("a", &[("href", PLACEHOLDER_LINK)]);
        doc.set_text(anchor, PLACEHOLDER_TITLE);
        doc.append_child(heading, anchor);
        let body = doc.create_element("p", &[]);
        doc.set_text(body, &snippet.snippet);
        let rule = doc.create_element("hr", &[]);
        doc.append_child(item, heading);
        doc.append_child(item, body);
        doc.append_child(item, rule);
        item
    }

    /// Fills a summary placeholder if it still belongs to the current search.
    pub fn apply_summary(&mut self, generation: u64, node: NodeId, text: &str) -> bool {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "dropping summary from an earlier search"
            );
            return false;
        }
        if !self.doc.is_connected(node) {
            return false;
        }
        self.doc.set_text(node, text);
        self.doc.remove_class(node, LOADING_CLASS);
        true
    }

    pub fn result_count(&self) -> usize {
        self.doc
            .children(self.results)
            .iter()
            .filter(|node| self.doc.has_class(**node, RESULT_ITEM_CLASS))
            .count()
    }

    /// Summary placeholders still waiting for text.
    pub fn loading_count(&self) -> usize {
        self.doc
            .elements_by_class(LOADING_CLASS)
            .into_iter()
            .filter(|node| self.is_inside_results(*node))
            .count()
    }

    fn is_inside_results(&self, node: NodeId) -> bool {
        let mut current = self.doc.parent(node);
        while let Some(parent) = current {
            if parent == self.results {
                return true;
            }
            current = self.doc.parent(parent);
        }
        false
    }

    pub fn results_html(&self) -> String {
        self.doc.inner_html(self.results)
    }

    pub fn to_html(&self) -> String {
        self.doc.to_html()
    }
}

fn first_by_class(doc: &Document, class: &str) -> Result<NodeId> {
    doc.elements_by_class(class)
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::MissingElement(format!(".{class}")))
}
