//! Free-text input to navigable URL

use url::Url;

use crate::error::{ShellError, ShellResult};

/// Search engine used when input is neither a URL nor a domain
pub const DEFAULT_SEARCH_TEMPLATE: &str = "https://duckduckgo.com/?q=%s";

/// Placeholder replaced by the encoded query in a search template
const QUERY_PLACEHOLDER: &str = "%s";

/// Turns whatever the user typed into something the surface can load.
///
/// Resolution never fails: absolute URLs win, then bare domains, and
/// everything else becomes a web search.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    search_template: String,
}

impl UrlResolver {
    /// Create a resolver with a custom search template containing `%s`
    pub fn new(search_template: impl Into<String>) -> ShellResult<Self> {
        let search_template = search_template.into();
        if !search_template.contains(QUERY_PLACEHOLDER) {
            return Err(ShellError::Config(format!(
                "search template must contain {}: {}",
                QUERY_PLACEHOLDER, search_template
            )));
        }
        Ok(Self { search_template })
    }

    /// Resolve input to a canonical URL string
    pub fn resolve(&self, input: &str) -> String {
        if let Ok(url) = Url::parse(input) {
            return url.into();
        }

        // Bare domain: only accept hosts that look like real domains
        if let Ok(url) = Url::parse(&format!("https://{}", input)) {
            if url.host_str().is_some_and(|host| host.contains('.')) {
                return url.into();
            }
        }

        self.search_url(input)
    }

    /// Search URL for a query
    pub fn search_url(&self, query: &str) -> String {
        self.search_template
            .replacen(QUERY_PLACEHOLDER, &urlencoding::encode(query), 1)
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self {
            search_template: DEFAULT_SEARCH_TEMPLATE.to_string(),
        }
    }
}
