//! HTML parser for extracting links, flags and form fields
//!
//! The crawler only needs three things from a page:
//! - The raw `href` of every `<a>` element, in document order
//! - The text of every flag-bearing element, in document order
//! - The `value` attribute of a named form field (the CSRF token)

use crate::config::CrawlerConfig;
use crate::ConfigError;
use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// `href` values of all anchors, unresolved
    pub links: Vec<String>,

    /// Text content of all flag-bearing elements
    pub flags: Vec<String>,
}

/// HTML-to-structured-data collaborator used by the crawler
pub trait Extractor {
    /// Extracts anchor targets and flag element texts from a page
    fn extract(&self, html: &str) -> ParsedPage;

    /// Finds the `value` attribute of the element whose `name` is `field`
    fn form_field(&self, html: &str, field: &str) -> Option<String>;
}

/// [`Extractor`] backed by the `scraper` HTML parser
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    anchor_selector: Selector,
    flag_selector: Selector,
}

impl HtmlExtractor {
    /// Creates an extractor that treats elements matching `flag_selector`
    /// (a CSS selector such as `.secret_flag`) as flag carriers
    pub fn new(flag_selector: &str) -> Result<Self, ConfigError> {
        let flag_selector = Selector::parse(flag_selector)
            .map_err(|_| ConfigError::InvalidSelector(flag_selector.to_string()))?;
        let anchor_selector = Selector::parse("a[href]")
            .map_err(|_| ConfigError::InvalidSelector("a[href]".to_string()))?;

        Ok(Self {
            anchor_selector,
            flag_selector,
        })
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        Self::new(&config.flag_selector)
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);

        let links = document
            .select(&self.anchor_selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect();

        let flags = document
            .select(&self.flag_selector)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();

        ParsedPage { links, flags }
    }

    fn form_field(&self, html: &str, field: &str) -> Option<String> {
        let selector = Selector::parse(&format!("[name=\"{}\"]", field)).ok()?;
        let document = Html::parse_document(html);

        document
            .select(&selector)
            .find_map(|element| element.value().attr("value"))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> HtmlExtractor {
        HtmlExtractor::new(".secret_flag").unwrap()
    }

    #[test]
    fn test_extract_links_in_order() {
        let html = r#"
            <html><body>
                <a href="/fakebook/1/">One</a>
                <a href="/fakebook/2/">Two</a>
                <a>No href</a>
                <a href="http://other.com/">Other</a>
            </body></html>
        "#;
        let parsed = extractor().extract(html);
        assert_eq!(
            parsed.links,
            vec!["/fakebook/1/", "/fakebook/2/", "http://other.com/"]
        );
    }

    #[test]
    fn test_links_are_not_resolved() {
        let html = r##"<a href="friends/">Friends</a><a href="#top">Top</a>"##;
        let parsed = extractor().extract(html);
        assert_eq!(parsed.links, vec!["friends/", "#top"]);
    }

    #[test]
    fn test_extract_flags() {
        let html = r#"
            <html><body>
                <h2 class="secret_flag" style="color:red">FLAG: abc123</h2>
                <h2 class="other">FLAG: not-a-flag</h2>
                <p class="secret_flag bold">  FLAG: def456  </p>
            </body></html>
        "#;
        let parsed = extractor().extract(html);
        assert_eq!(parsed.flags, vec!["FLAG: abc123", "FLAG: def456"]);
    }

    #[test]
    fn test_custom_flag_selector() {
        let extractor = HtmlExtractor::new("span[data-flag]").unwrap();
        let html = r#"<span data-flag>FLAG: x</span><span>FLAG: y</span>"#;
        assert_eq!(extractor.extract(html).flags, vec!["FLAG: x"]);
    }

    #[test]
    fn test_invalid_flag_selector() {
        assert!(matches!(
            HtmlExtractor::new("[["),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_form_field() {
        let html = r#"
            <form method="post" action="/accounts/login/">
                <input type="hidden" name="csrfmiddlewaretoken" value="tok-123">
                <input type="text" name="username">
            </form>
        "#;
        assert_eq!(
            extractor().form_field(html, "csrfmiddlewaretoken"),
            Some("tok-123".to_string())
        );
        assert_eq!(extractor().form_field(html, "username"), None);
        assert_eq!(extractor().form_field(html, "missing"), None);
    }

    #[test]
    fn test_empty_page() {
        assert_eq!(extractor().extract(""), ParsedPage::default());
    }
}
