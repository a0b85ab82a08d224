use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta").expect("static selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link").expect("static selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector"));

/// Which attribute carried a meta entry's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKey {
    Property,
    Name,
}

#[derive(Debug, Clone)]
pub struct MetaEntry {
    pub key: MetaKey,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct LinkEntry {
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub href: Option<String>,
    pub sizes: Option<String>,
}

/// Parsed page plus attribute-indexed views, built in a single walk.
///
/// Shared read-only by the extractor, icon selector and player resolver
/// within one run; never mutated after construction.
pub struct DocumentModel {
    base_url: Url,
    metas: Vec<MetaEntry>,
    links: Vec<LinkEntry>,
    title: Option<String>,
}

impl DocumentModel {
    pub fn parse(html: &str, base_url: Url) -> Self {
        let document = Html::parse_document(html);

        let mut metas = Vec::new();
        for element in document.select(&META_SELECTOR) {
            let content = match element.value().attr("content") {
                Some(v) => v,
                None => continue,
            };
            if let Some(property) = element.value().attr("property") {
                metas.push(MetaEntry {
                    key: MetaKey::Property,
                    name: property.to_string(),
                    content: content.to_string(),
                });
            }
            if let Some(name) = element.value().attr("name") {
                metas.push(MetaEntry {
                    key: MetaKey::Name,
                    name: name.to_string(),
                    content: content.to_string(),
                });
            }
        }

        let links = document
            .select(&LINK_SELECTOR)
            .map(|element| LinkEntry {
                rel: element.value().attr("rel").map(str::to_string),
                media_type: element.value().attr("type").map(str::to_string),
                href: element.value().attr("href").map(str::to_string),
                sizes: element.value().attr("sizes").map(str::to_string),
            })
            .collect();

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|element| element.text().collect::<String>());

        Self {
            base_url,
            metas,
            links,
            title,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Host of the page URL, port included when explicit.
    pub fn host(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    pub fn metas(&self) -> &[MetaEntry] {
        &self.metas
    }

    /// First non-empty content of `meta[property=name]`.
    pub fn meta_property(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|m| m.key == MetaKey::Property && m.name == name && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }

    /// First non-empty content of `meta[name=name]`.
    pub fn meta_name(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|m| m.key == MetaKey::Name && m.name == name && !m.content.is_empty())
            .map(|m| m.content.as_str())
    }

    /// `meta[property=..]` with a `meta[name=..]` fallback, the order the
    /// Twitter Card vocabulary appears in the wild.
    pub fn meta_any(&self, name: &str) -> Option<&str> {
        self.meta_property(name).or_else(|| self.meta_name(name))
    }

    pub fn links(&self) -> &[LinkEntry] {
        &self.links
    }

    /// First non-empty href of `link[rel=rel]` (exact attribute match).
    pub fn link_href_by_rel(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some(rel))
            .and_then(|l| l.href.as_deref())
            .filter(|href| !href.is_empty())
    }

    /// First non-empty href of `link[type=media_type]`.
    pub fn link_href_by_type(&self, media_type: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.media_type.as_deref() == Some(media_type))
            .and_then(|l| l.href.as_deref())
            .filter(|href| !href.is_empty())
    }

    /// Text of the first `<title>` element.
    pub fn title_text(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Resolve a possibly-relative URL against the page URL.
    pub fn resolve(&self, href: &str) -> Option<String> {
        self.base_url.join(href).ok().map(|u| u.to_string())
    }
}
