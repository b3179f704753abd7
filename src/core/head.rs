use crate::config::settings::AdSettings;
use crate::core::generator::{GeneratedScripts, ScriptGenerator};
use crate::core::page_type::PageTypeResolver;
use crate::core::resolver::AdConfigurationResolver;
use crate::core::runtime;
use crate::core::script::{Script, Stmt};
use crate::domain::model::{PageContext, ResolvedAdConfiguration};
use serde_json::Value;

pub const PAGETYPE_TARGETING_KEY: &str = "pagetype";
/// Only single items of this post type render the article layout.
pub const ARTICLE_POST_TYPE: &str = "post";

/// Which layout a request renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTemplate {
    Homepage,
    Article,
    Archive,
    NotFound,
    /// Static page that may carry its own stored override.
    Page,
}

impl PageTemplate {
    pub fn for_context(context: &PageContext) -> Option<Self> {
        match context {
            PageContext::Home => Some(PageTemplate::Homepage),
            PageContext::Single { post_type, .. } if post_type == ARTICLE_POST_TYPE => {
                Some(PageTemplate::Article)
            }
            PageContext::Single { .. } => None,
            PageContext::Category { .. } | PageContext::Tag { .. } | PageContext::Archive => {
                Some(PageTemplate::Archive)
            }
            PageContext::NotFound => Some(PageTemplate::NotFound),
            PageContext::Page { .. } => Some(PageTemplate::Page),
            PageContext::Other => None,
        }
    }

    /// Page type appended after the mapped values.
    pub fn marker(&self) -> &'static str {
        match self {
            PageTemplate::Homepage => "homepage",
            _ => "ros",
        }
    }
}

/// Everything produced for one head render, kept for inspection before
/// rendering to text.
#[derive(Debug, Clone)]
pub struct HeadScript {
    pub template: PageTemplate,
    pub configuration: ResolvedAdConfiguration,
    pub page_types: Vec<String>,
    pub generated: GeneratedScripts,
    pub body: Script,
}

impl HeadScript {
    pub fn render(&self) -> String {
        format!(
            "<script type='text/javascript'>\nwindow.googletag = window.googletag || {{cmd: []}};\n\ngoogletag.cmd.push(function() {{\n{}}});\n</script>\n",
            self.body.render_indented(1)
        )
    }
}

pub struct HeadScriptComposer<'a> {
    settings: &'a AdSettings,
}

impl<'a> HeadScriptComposer<'a> {
    pub fn new(settings: &'a AdSettings) -> Self {
        Self { settings }
    }

    /// `None` when the context has no template or ads are disabled for it.
    /// `stored_override` only applies to static pages.
    pub fn compose(
        &self,
        context: &PageContext,
        stored_override: Option<&str>,
        debug_console: bool,
    ) -> Option<HeadScript> {
        let template = PageTemplate::for_context(context)?;
        let configuration = self.configuration_for(template, stored_override);
        if configuration.disable_ads {
            tracing::info!("Ads disabled for this {:?} page, no head script", template);
            return None;
        }

        let mut page_types =
            PageTypeResolver::new(&self.settings.page_type_mapping, &self.settings.section_fronts)
                .page_types(context);
        let marker = template.marker().to_string();
        if !page_types.contains(&marker) {
            page_types.push(marker);
        }

        let generated = ScriptGenerator::new(
            &self.settings.taxonomy,
            &self.settings.size_mappings,
            &self.settings.network_id,
        )
        .with_lazy_load(self.settings.lazy_load_enabled)
        .with_refresh_targeting(self.settings.refresh.clone())
        .generate(&configuration);

        tracing::debug!(
            template = ?template,
            slots = generated.all_slots().count(),
            "Composed head script"
        );

        let body = self.body(&generated, &page_types, debug_console);
        Some(HeadScript {
            template,
            configuration,
            page_types,
            generated,
            body,
        })
    }

    fn configuration_for(&self, template: PageTemplate, stored_override: Option<&str>) -> ResolvedAdConfiguration {
        match template {
            PageTemplate::Homepage => self.settings.homepage_configuration.clone(),
            PageTemplate::Page => AdConfigurationResolver::new(&self.settings.taxonomy)
                .resolve(stored_override, &self.settings.default_configuration),
            PageTemplate::Article | PageTemplate::Archive | PageTemplate::NotFound => {
                self.settings.default_configuration.clone()
            }
        }
    }

    fn body(&self, generated: &GeneratedScripts, page_types: &[String], debug_console: bool) -> Script {
        let settings = self.settings;
        let mut body = Script::new();

        body.push(Stmt::Banner("Refresh key value".to_string()));
        body.extend(runtime::refresh_variables(
            &settings.refresh,
            settings.seconds_to_wait_after_viewability,
        ));
        body.push(Stmt::Blank);

        body.push(Stmt::Banner("Size mapping".to_string()));
        body.extend(generated.size_mapping_script.clone());
        body.push(Stmt::Blank);

        body.push(Stmt::Banner("Ad slot definitions".to_string()));
        body.extend(generated.slot_definition_script.clone());
        body.push(Stmt::Blank);

        body.push(Stmt::comment("Set page-level targeting"));
        let pagetype = Value::Array(page_types.iter().cloned().map(Value::String).collect());
        let pairs = std::iter::once((PAGETYPE_TARGETING_KEY, pagetype)).chain(
            settings
                .page_targeting
                .iter()
                .map(|(k, v)| (k.as_str(), Value::String(v.clone()))),
        );
        body.extend(runtime::page_targeting(pairs));
        body.push(Stmt::Blank);

        body.push(Stmt::comment("Set GPT impression viewable event listener"));
        body.extend(runtime::impression_viewable_listener(debug_console));
        body.push(Stmt::Blank);

        body.extend(runtime::enable_services());
        body.push(Stmt::Blank);

        body.extend(runtime::slot_loading(settings.lazy_load_enabled, settings.intersection_margin));
        body
    }
}
