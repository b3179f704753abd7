use crate::core::catalog::PageTypeMapping;
use crate::domain::model::PageContext;

/// Turns the current page context into `pagetype` targeting values.
#[derive(Debug, Clone)]
pub struct PageTypeResolver<'a> {
    mapping: &'a PageTypeMapping,
    section_fronts: &'a [String],
}

impl<'a> PageTypeResolver<'a> {
    pub fn new(mapping: &'a PageTypeMapping, section_fronts: &'a [String]) -> Self {
        Self {
            mapping,
            section_fronts,
        }
    }

    pub fn map_slug(&self, slug: &str) -> &'a [String] {
        self.mapping.values_for(slug)
    }

    pub fn is_section_front(&self, slug: &str) -> bool {
        self.section_fronts.iter().any(|s| s == slug)
    }

    /// Slugs that drive archive-style targeting for this context.
    pub fn archive_slugs(&self, context: &PageContext) -> Vec<String> {
        match context {
            PageContext::Category { slug } | PageContext::Tag { slug } if !slug.is_empty() => {
                vec![slug.clone()]
            }
            PageContext::Page { slug, .. } if self.is_section_front(slug) => vec![slug.clone()],
            PageContext::Page { pagetype_meta, .. } => pagetype_meta
                .as_deref()
                .map(|meta| {
                    meta.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn archive_page_types(&self, context: &PageContext) -> Vec<String> {
        self.collect(self.archive_slugs(context).iter().map(String::as_str))
    }

    /// Page types for a single post: every category and tag slug it carries.
    pub fn post_page_types(&self, slugs: &[String]) -> Vec<String> {
        self.collect(slugs.iter().map(String::as_str))
    }

    /// Page types for any context, before the template adds its own marker.
    pub fn page_types(&self, context: &PageContext) -> Vec<String> {
        match context {
            PageContext::Single { slugs, .. } => self.post_page_types(slugs),
            other => self.archive_page_types(other),
        }
    }

    fn collect<'s>(&self, slugs: impl Iterator<Item = &'s str>) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for slug in slugs {
            for value in self.map_slug(slug) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn mapping() -> PageTypeMapping {
        let mut values = IndexMap::new();
        values.insert("sports".to_string(), vec!["sports".to_string(), "local".to_string()]);
        values.insert("news".to_string(), vec!["news".to_string(), "local".to_string()]);
        values.insert("travel".to_string(), vec!["travel".to_string()]);
        PageTypeMapping::new(values)
    }

    fn fronts() -> Vec<String> {
        vec!["news".to_string(), "sports".to_string()]
    }

    #[test]
    fn test_category_and_tag() {
        let mapping = mapping();
        let fronts = fronts();
        let resolver = PageTypeResolver::new(&mapping, &fronts);

        let category = PageContext::Category {
            slug: "sports".to_string(),
        };
        assert_eq!(resolver.archive_page_types(&category), vec!["sports", "local"]);

        let tag = PageContext::Tag {
            slug: "unmapped".to_string(),
        };
        assert!(resolver.archive_page_types(&tag).is_empty());
    }

    #[test]
    fn test_section_front_uses_page_slug() {
        let mapping = mapping();
        let fronts = fronts();
        let resolver = PageTypeResolver::new(&mapping, &fronts);

        let page = PageContext::Page {
            slug: "news".to_string(),
            item_id: None,
            pagetype_meta: Some("travel".to_string()),
        };
        assert_eq!(resolver.archive_slugs(&page), vec!["news"]);
    }

    #[test]
    fn test_page_meta_is_split_and_trimmed() {
        let mapping = mapping();
        let fronts = fronts();
        let resolver = PageTypeResolver::new(&mapping, &fronts);

        let page = PageContext::Page {
            slug: "about".to_string(),
            item_id: Some("42".to_string()),
            pagetype_meta: Some(" sports , news,, ".to_string()),
        };
        assert_eq!(resolver.archive_slugs(&page), vec!["sports", "news"]);
        assert_eq!(resolver.archive_page_types(&page), vec!["sports", "local", "news"]);
    }

    #[test]
    fn test_post_page_types_are_deduplicated() {
        let mapping = mapping();
        let fronts = fronts();
        let resolver = PageTypeResolver::new(&mapping, &fronts);

        let single = PageContext::Single {
            post_type: "post".to_string(),
            slugs: vec!["news".to_string(), "sports".to_string(), "news".to_string()],
        };
        assert_eq!(resolver.page_types(&single), vec!["news", "local", "sports"]);
    }

    #[test]
    fn test_contexts_without_slugs() {
        let mapping = mapping();
        let fronts = fronts();
        let resolver = PageTypeResolver::new(&mapping, &fronts);

        assert!(resolver.page_types(&PageContext::Home).is_empty());
        assert!(resolver.page_types(&PageContext::NotFound).is_empty());
        assert!(resolver.page_types(&PageContext::Archive).is_empty());
    }
}
