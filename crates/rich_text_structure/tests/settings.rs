use manos_rich_text_structure::{
    CreateOptions, NodeRule, Settings, SettingsConfig, SettingsError, create_from_markup,
    parse_markup, to_string,
};
use pretty_assertions::assert_eq;

fn cleaned(markup: &str, settings: &Settings) -> String {
    let rich = create_from_markup(markup, CreateOptions::new().with_settings(settings));
    to_string(&rich.value, None).unwrap()
}

#[test]
fn editing_surface_drops_widget_helpers() {
    let settings = Settings::editing_surface();

    assert_eq!(
        cleaned("a<span data-mce-bogus=\"all\">b</span>c", &settings),
        "ac"
    );
    assert_eq!(
        cleaned("a<span data-mce-bogus=\"1\">b</span>c", &settings),
        "abc"
    );
    assert_eq!(
        cleaned(
            "<strong data-mce-selected=\"inline-boundary\" class=\"x\">&#65279;t</strong>",
            &settings
        ),
        "<strong class=\"x\">t</strong>"
    );
}

#[test]
fn default_settings_keep_everything() {
    let settings = Settings::new();
    assert_eq!(
        cleaned("a<span data-mce-bogus=\"1\">b</span>c", &settings),
        "a<span data-mce-bogus=\"1\">b</span>c"
    );
}

#[test]
fn custom_hooks_run_on_the_parser() {
    let settings = Settings::new()
        .remove_node_when(|el| el.is("script"))
        .filter_text_with(|text| text.to_uppercase());

    assert_eq!(
        cleaned("one<script>x()</script> <em>two</em>", &settings),
        "ONE <em>TWO</em>"
    );
}

#[test]
fn config_loads_from_json() {
    let config = SettingsConfig::from_json_str(
        r#"{
            "remove_nodes": [{ "tag": "aside" }],
            "unwrap_nodes": [{ "attribute": "data-wrapper" }],
            "remove_attribute_prefixes": ["data-"],
            "strip_characters": "~"
        }"#,
    )
    .unwrap();

    assert_eq!(config.remove_nodes, vec![NodeRule::tag("aside")]);
    assert_eq!(config.unwrap_nodes, vec![NodeRule::attribute("data-wrapper")]);

    let settings = Settings::from_config(config);
    assert_eq!(
        cleaned(
            "a~b<aside>note</aside><span data-wrapper=\"y\">c</span><em data-id=\"3\">d</em>",
            &settings
        ),
        "abc<em>d</em>"
    );
}

#[test]
fn missing_json_fields_default_to_empty() {
    assert_eq!(
        SettingsConfig::from_json_str("{}").unwrap(),
        SettingsConfig::default()
    );
    assert!(matches!(
        SettingsConfig::from_json_str("{").unwrap_err(),
        SettingsError::Json(_)
    ));
}

#[test]
fn node_rules_match_tags_and_attributes() {
    let (dom, body) = parse_markup("<SPAN data-kind=\"all\" data-empty=\"\">x</SPAN>");
    let span = dom.element(dom.first_child(body).unwrap()).unwrap();

    assert!(NodeRule::tag("span").matches(span));
    assert!(!NodeRule::tag("em").matches(span));
    assert!(NodeRule::attribute("data-kind").matches(span));
    assert!(!NodeRule::attribute("data-empty").matches(span));
    assert!(NodeRule::attribute_equals("data-kind", "all").matches(span));
    assert!(!NodeRule::attribute_equals("data-kind", "1").matches(span));
    assert!(!NodeRule::default().matches(span));
}
