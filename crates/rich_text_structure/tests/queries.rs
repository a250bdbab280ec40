use manos_rich_text_structure::{
    Format, LinePoint, Record, RichText, Selection, Value, get_active_format, get_text_content,
    is_collapsed, is_empty, is_selection_equal,
};
use pretty_assertions::assert_eq;

fn em() -> Format {
    Format::new("em")
}

fn one_two_three() -> Record {
    let mut formats = vec![None; 13];
    for slot in &mut formats[4..7] {
        *slot = Some(vec![em()]);
    }
    Record::with_formats("one two three", formats)
}

#[test]
fn active_format_is_read_at_the_selection_start() {
    let at_start = RichText::new(
        Record::with_formats("one", vec![Some(vec![em()]), None, None]),
        Selection::caret(0),
    );
    assert_eq!(get_active_format(&at_start, "em"), Some(&em()));

    let between = RichText::new(
        Record::with_formats("one", vec![Some(vec![em()]), None, Some(vec![em()])]),
        Selection::caret(1),
    );
    assert_eq!(get_active_format(&between, "em"), None);

    let lines = RichText::new(
        vec![one_two_three()],
        Selection::lines(LinePoint::new(0, 4), LinePoint::new(0, 4)),
    );
    assert_eq!(get_active_format(&lines, "em"), Some(&em()));
    assert_eq!(get_active_format(&lines, "strong"), None);

    let unset = RichText::without_selection(one_two_three());
    assert_eq!(get_active_format(&unset, "em"), None);
}

#[test]
fn text_content_of_the_focused_line() {
    let single = RichText::without_selection(one_two_three());
    assert_eq!(get_text_content(&single), "one two three");

    let focused = RichText::new(
        vec![Record::from_text("zero"), one_two_three()],
        Selection::lines(LinePoint::new(1, 4), LinePoint::new(1, 4)),
    );
    assert_eq!(get_text_content(&focused), "one two three");

    let spanning = RichText::new(
        vec![Record::from_text("zero"), one_two_three()],
        Selection::lines(LinePoint::new(0, 1), LinePoint::new(1, 4)),
    );
    assert_eq!(get_text_content(&spanning), "");
}

#[test]
fn empty_values() {
    assert!(is_empty(&Value::from(Record::new())));
    assert!(is_empty(&Value::from(vec![Record::new()])));
    assert!(is_empty(&Value::from(Vec::<Record>::new())));

    let text = Record::from_text("test");
    let object = Record::with_formats("", vec![Some(vec![Format::object("image")])]);
    assert!(!is_empty(&Value::from(text.clone())));
    assert!(!is_empty(&Value::from(object)));
    assert!(!is_empty(&Value::from(vec![Record::new(), text.clone()])));
    assert!(!is_empty(&Value::from(vec![text])));
}

#[test]
fn selection_predicates() {
    assert!(is_collapsed(&Selection::caret(3)));
    assert!(!is_collapsed(&Selection::range(3, 4)));
    assert!(!is_collapsed(&Selection::none()));
    assert!(is_collapsed(&Selection::lines(
        LinePoint::boundary(1),
        LinePoint::boundary(1)
    )));
    assert!(!is_collapsed(&Selection::lines(
        LinePoint::new(0, 1),
        LinePoint::new(1, 1)
    )));

    assert!(is_selection_equal(&Selection::range(1, 2), &Selection::range(1, 2)));
    assert!(!is_selection_equal(&Selection::range(1, 2), &Selection::range(1, 3)));
    assert!(!is_selection_equal(&Selection::caret(0), &Selection::none()));
    assert!(is_selection_equal(
        &Selection::none_multiline(),
        &Selection::none_multiline()
    ));
}
