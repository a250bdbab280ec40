use manos_rich_text_structure::{
    CreateOptions, Format, Record, RichText, Selection, Value, create_from_markup, parse_markup,
    create_value, to_dom, to_string,
};
use pretty_assertions::assert_eq;

fn round_trip(markup: &str) -> String {
    let value = create_from_markup(markup, CreateOptions::new()).value;
    to_string(&value, None).unwrap()
}

fn round_trip_lines(markup: &str, line_tag: &str) -> String {
    let value = create_from_markup(markup, CreateOptions::new().multiline(line_tag)).value;
    to_string(&value, Some(line_tag)).unwrap()
}

#[test]
fn recreates_markup() {
    let cases = [
        "one <em>two 🍒</em> <a href=\"#\"><img src=\"\"><strong>three</strong></a><img src=\"\">",
        "one <em>two 🍒</em> <a href=\"#\">test <img src=\"\"><strong>three</strong></a><img src=\"\">",
        "<img src=\"\">",
        "<em>two 🍒</em>",
        "<em>If you want to learn more about how to build additional blocks, or if you are interested in helping with the project, head over to the <a href=\"https://github.com/WordPress/gutenberg\">GitHub repository</a>.</em>",
        "a<br>b<br><br>",
        "<strong>bold <em>both</em></strong><em> italic</em>",
        "x &lt; y &amp;&amp; &quot;z&quot; &#039;q&#039;",
    ];
    for markup in cases {
        assert_eq!(round_trip(markup), markup);
    }
}

#[test]
fn recreates_multiline_markup() {
    let markup = "<li>one<ul><li>two</li></ul></li><li>three</li>";
    let (dom, body) = parse_markup(&format!("<ul>{markup}</ul>"));
    let ul = dom.first_child(body).unwrap();
    let value = create_value(&dom, Some(ul), CreateOptions::new().multiline("li"));
    assert_eq!(to_string(&value, Some("li")).unwrap(), markup);

    assert_eq!(
        round_trip_lines("<p>one <em>two</em></p><p></p><p>three</p>", "p"),
        "<p>one <em>two</em></p><p></p><p>three</p>"
    );
}

#[test]
fn matches_the_built_tree() {
    let link = Format::new("a").with_attribute("href", "#");
    let img = Format::object("img").with_attribute("src", "x");
    let em = Format::new("em");
    let record = Record::with_formats(
        "ab\ncd",
        vec![
            Some(vec![link.clone(), em.clone()]),
            Some(vec![link.clone(), img.clone(), em.clone()]),
            Some(vec![link.clone()]),
            Some(vec![img.clone()]),
            Some(vec![em.clone()]),
            Some(vec![em, Format::new("strong")]),
        ],
    );

    let rich = RichText::new(record, Selection::none());
    let tree = to_dom(&rich, None).unwrap();
    assert_eq!(to_string(&rich.value, None).unwrap(), tree.inner_html());
}

#[test]
fn non_void_objects_are_closed() {
    let value = Value::SingleLine(Record::with_formats(
        "a",
        vec![Some(vec![Format::object("span").with_attribute("data-x", "1")])],
    ));
    assert_eq!(to_string(&value, None).unwrap(), "<span data-x=\"1\"></span>a");
}

#[test]
fn unknown_format_types_pass_through() {
    let value = Value::SingleLine(Record::with_formats(
        "hi",
        vec![Some(vec![Format::new("x-mark")]); 2],
    ));
    assert_eq!(to_string(&value, None).unwrap(), "<x-mark>hi</x-mark>");
}
