//! Fixed client-side logic that cooperates with the generated slot batches.

use crate::core::generator::{RefreshTargeting, INITIAL_SLOTS_VAR, LAZY_SLOTS_VAR};
use crate::core::script::{json_literal, CallChain, Expr, Script, Stmt};
use serde_json::Value;

pub const REFRESH_KEY_VAR: &str = "REFRESH_KEY";
pub const REFRESH_VALUE_VAR: &str = "REFRESH_VALUE";
pub const SECONDS_TO_WAIT_VAR: &str = "SECONDS_TO_WAIT_AFTER_VIEWABILITY";

pub fn refresh_variables(refresh: &RefreshTargeting, seconds_to_wait: u32) -> Script {
    let mut script = Script::new();
    script.push(Stmt::var(REFRESH_KEY_VAR, Expr::Json(Value::String(refresh.key.clone()))));
    script.push(Stmt::var(REFRESH_VALUE_VAR, Expr::Json(Value::String(refresh.value.clone()))));
    script.push(Stmt::var(SECONDS_TO_WAIT_VAR, Expr::Json(Value::from(seconds_to_wait))));
    script
}

/// Refresh a viewed slot after the configured delay, but only slots that
/// still carry the refresh targeting pair.
pub fn impression_viewable_listener(debug_console: bool) -> Script {
    let viewed_log = if debug_console {
        "\n    console.log( 'IMPRESSION VIEWABLE FOR AD SLOT: ' + slot.getSlotElementId() );"
    } else {
        ""
    };
    let refreshed_log = if debug_console {
        "\n        console.log( 'REFRESHED AD SLOT: ' + slot.getSlotElementId() );"
    } else {
        ""
    };

    let mut script = Script::new();
    script.push(Stmt::Raw(format!(
        "googletag.pubads().addEventListener('impressionViewable', function(event) {{
    var slot = event.slot;{viewed_log}
    if (slot.getTargeting({key}).indexOf({value}) > -1) {{
        setTimeout(function() {{
            googletag.pubads().refresh([slot]);{refreshed_log}
        }}, {seconds} * 1000);
    }}
}});",
        key = REFRESH_KEY_VAR,
        value = REFRESH_VALUE_VAR,
        seconds = SECONDS_TO_WAIT_VAR,
    )));
    script
}

/// Page-level `setTargeting` calls; empty keys and values are skipped.
pub fn page_targeting<'a>(pairs: impl IntoIterator<Item = (&'a str, Value)>) -> Script {
    let mut script = Script::new();
    for (key, value) in pairs {
        let empty = match &value {
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Null => true,
            _ => false,
        };
        if key.is_empty() || empty {
            continue;
        }
        script.push(Stmt::Expr(Expr::Chain(
            CallChain::new("googletag")
                .call("pubads", vec![])
                .call("setTargeting", vec![Expr::str(key), Expr::Json(value)]),
        )));
    }
    script
}

/// Service setup issued after all slots are defined.
pub fn enable_services() -> Script {
    let mut script = Script::new();
    let pubads = |method: &str, args: Vec<Expr>| {
        Stmt::Expr(Expr::Chain(
            CallChain::new("googletag").call("pubads", vec![]).call(method, args),
        ))
    };
    script.push(pubads("collapseEmptyDivs", vec![]));
    script.push(pubads("setCentering", vec![Expr::ident("true")]));
    script.push(pubads("enableSingleRequest", vec![]));
    script.push(pubads("disableInitialLoad", vec![]));
    script.push(Stmt::Expr(Expr::Chain(
        CallChain::new("googletag").call("enableServices", vec![]),
    )));
    script
}

/// Either the intersection-observer dispatch or one unconditional batched
/// refresh of every defined slot.
pub fn slot_loading(lazy_load_enabled: bool, intersection_margin: u32) -> Script {
    let mut script = Script::new();
    if !lazy_load_enabled {
        script.push(Stmt::comment("Immediately load all ads above the fold"));
        script.push(Stmt::Raw(format!("googletag.pubads().refresh( {} );", INITIAL_SLOTS_VAR)));
        return script;
    }

    // Threshold stays at 0 so fetching starts as soon as any pixel enters the margin.
    let threshold = "0.0";
    let margin_literal = json_literal(&Value::String(format!("{}%", intersection_margin)));

    script.push(Stmt::Banner("Lazy loading".to_string()));
    script.push(Stmt::Raw(format!(
        "if ( document.readyState !== 'loading' ) {{
    lazyLoadAdScript();
}} else {{
    document.addEventListener(\"DOMContentLoaded\", () => {{
        lazyLoadAdScript();
    }});
}}

function lazyLoadAdScript() {{
    const topOfViewPort = window.scrollY;
    const bottomOfViewPort = window.scrollY + window.innerHeight;
    const rootMarginPadding = (({margin}/100) * window.innerHeight);

    const options = {{
        root: null,
        rootMargin: {margin_literal},
        threshold: {threshold}
    }};

    const observer = new IntersectionObserver(onIntersection, options);

    for (const key in {lazy}) {{
        var adSlot = document.getElementById(key);

        if ( adSlot != null ) {{
            var adSlotBoundingRect = adSlot.getBoundingClientRect();

            // Already inside the expanded viewport: join the initial SRA batch
            if (((topOfViewPort + adSlotBoundingRect.bottom) - (topOfViewPort - rootMarginPadding) > 0) && ((bottomOfViewPort + rootMarginPadding) - (adSlotBoundingRect.top + topOfViewPort) > 0)) {{
                {initial}.push({lazy}[key]);
            }} else {{
                observer.observe(adSlot);
            }}
        }}
    }}

    function onIntersection(entries, observer) {{
        entries.forEach(entry => {{
            if (entry.isIntersecting) {{
                observer.unobserve(entry.target);
                googletag.pubads().refresh([{lazy}[entry.target.id]]);
            }}
        }});
    }}

    if ( {initial}.length !== 0 ) {{
        googletag.pubads().refresh( {initial} );
    }}
}}",
        margin = intersection_margin,
        margin_literal = margin_literal,
        threshold = threshold,
        lazy = LAZY_SLOTS_VAR,
        initial = INITIAL_SLOTS_VAR,
    )));
    script.push(Stmt::Banner("End lazy loading".to_string()));
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_variables() {
        let script = refresh_variables(&RefreshTargeting::default(), 30);
        assert_eq!(
            script.render(),
            "var REFRESH_KEY = \"refresh\";\nvar REFRESH_VALUE = \"true\";\nvar SECONDS_TO_WAIT_AFTER_VIEWABILITY = 30;\n"
        );
    }

    #[test]
    fn test_listener_guards_on_refresh_targeting() {
        let text = impression_viewable_listener(false).render();
        assert!(text.contains("addEventListener('impressionViewable'"));
        assert!(text.contains("slot.getTargeting(REFRESH_KEY).indexOf(REFRESH_VALUE) > -1"));
        assert!(text.contains("SECONDS_TO_WAIT_AFTER_VIEWABILITY * 1000"));
        assert!(!text.contains("console.log"));

        let debug = impression_viewable_listener(true).render();
        assert!(debug.contains("IMPRESSION VIEWABLE FOR AD SLOT"));
        assert!(debug.contains("REFRESHED AD SLOT"));
    }

    #[test]
    fn test_lazy_loading_block() {
        let text = slot_loading(true, 150).render();
        assert!(text.contains("rootMargin: \"150%\""));
        assert!(text.contains("threshold: 0.0"));
        assert!(text.contains("((150/100) * window.innerHeight)"));
        assert!(text.contains("observer.unobserve(entry.target);"));
        // The batched refresh comes after the classification loop
        let loop_at = text.find("for (const key in lazyLoadedAdSlots)").unwrap();
        let batch_at = text.find("googletag.pubads().refresh( initialAdSlotsRequested );").unwrap();
        assert!(batch_at > loop_at);
    }

    #[test]
    fn test_unconditional_refresh_without_lazy_loading() {
        let text = slot_loading(false, 200).render();
        assert!(!text.contains("IntersectionObserver"));
        assert!(text.contains("googletag.pubads().refresh( initialAdSlotsRequested );"));
    }

    #[test]
    fn test_page_targeting_skips_empty_values() {
        let text = page_targeting(vec![
            ("pagetype", json!(["sports", "ros"])),
            ("site", json!("example.com")),
            ("empty", json!("")),
            ("", json!("orphan")),
            ("zero", json!("0")),
        ])
        .render();
        assert_eq!(
            text,
            "googletag.pubads().setTargeting('pagetype', [\"sports\",\"ros\"]);\ngoogletag.pubads().setTargeting('site', \"example.com\");\ngoogletag.pubads().setTargeting('zero', \"0\");\n"
        );
    }
}
