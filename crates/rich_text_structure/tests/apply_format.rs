use manos_rich_text_structure::{
    Format, LinePoint, Record, RichText, Selection, StructureError, Value, apply_format,
    apply_format_record, remove_format_record, toggle_format,
};
use pretty_assertions::assert_eq;

fn em() -> Format {
    Format::new("em")
}

fn strong() -> Format {
    Format::new("strong")
}

fn one_two_three() -> Record {
    let mut formats = vec![None; 13];
    for slot in &mut formats[4..7] {
        *slot = Some(vec![em()]);
    }
    Record::with_formats("one two three", formats)
}

fn strong_over_em() -> Record {
    let mut formats = vec![
        None,
        None,
        None,
        Some(vec![strong()]),
        Some(vec![em(), strong()]),
        Some(vec![em(), strong()]),
        Some(vec![em()]),
    ];
    formats.extend(vec![None; 6]);
    Record::with_formats("one two three", formats)
}

#[test]
fn applies_a_format() {
    assert_eq!(
        apply_format_record(one_two_three(), &strong(), 3, 6).unwrap(),
        strong_over_em()
    );
}

#[test]
fn applies_a_format_by_selection() {
    let rich = RichText::new(one_two_three(), Selection::range(3, 6));

    assert_eq!(
        apply_format(rich, &strong(), None).unwrap(),
        RichText::new(strong_over_em(), Selection::range(3, 6))
    );
}

#[test]
fn applies_a_format_across_lines() {
    let selection = Selection::lines(LinePoint::new(0, 2), LinePoint::new(2, 1));
    let rich = RichText::new(
        vec![
            Record::from_text("one"),
            Record::from_text("two"),
            Record::from_text("three"),
            Record::from_text("four"),
        ],
        selection,
    );

    let mut three = vec![Some(vec![em()])];
    three.extend(vec![None; 4]);
    assert_eq!(
        apply_format(rich, &em(), None).unwrap(),
        RichText::new(
            vec![
                Record::with_formats("one", vec![None, None, Some(vec![em()])]),
                Record::with_formats("two", vec![Some(vec![em()]); 3]),
                Record::with_formats("three", three),
                Record::from_text("four"),
            ],
            selection,
        )
    );
}

#[test]
fn reapplying_replaces_the_format_of_the_same_type() {
    let first = Format::new("a").with_attribute("href", "1");
    let second = Format::new("a").with_attribute("href", "2");
    let record = apply_format_record(Record::from_text("ab"), &first, 0, 2).unwrap();
    let record = apply_format_record(record, &em(), 0, 1).unwrap();

    let record = apply_format_record(record, &second, 0, 2).unwrap();

    assert_eq!(
        record,
        Record::with_formats(
            "ab",
            vec![Some(vec![em(), second.clone()]), Some(vec![second])],
        )
    );
}

#[test]
fn toggling_adds_then_removes() {
    let rich = RichText::new(Record::from_text("abc"), Selection::range(0, 2));

    let on = toggle_format(rich, &strong()).unwrap();
    assert_eq!(
        on.value,
        Value::from(Record::with_formats(
            "abc",
            vec![Some(vec![strong()]), Some(vec![strong()]), None],
        ))
    );

    let off = toggle_format(on, &strong()).unwrap();
    assert_eq!(off.value, Value::from(Record::from_text("abc")));
}

#[test]
fn rejects_out_of_range_spans() {
    assert_eq!(
        apply_format_record(Record::from_text("abc"), &em(), 2, 5).unwrap_err(),
        StructureError::OffsetOutOfRange { offset: 5, len: 3 }
    );
    let rich = RichText::new(
        vec![Record::from_text("abc")],
        Selection::lines(LinePoint::new(0, 0), LinePoint::new(3, 0)),
    );
    assert_eq!(
        apply_format(rich, &em(), None).unwrap_err(),
        StructureError::LineOutOfRange { line: 3, lines: 1 }
    );
}

#[test]
fn backward_ranges_are_empty_spans() {
    let rich = RichText::new(Record::from_text("abcdef"), Selection::range(5, 2));

    let applied = apply_format(rich, &em(), None).unwrap();
    assert_eq!(applied.value, Value::from(Record::from_text("abcdef")));
    assert_eq!(applied.selection, Selection::range(5, 2));

    let record = Record::with_formats("ab", vec![Some(vec![em()]); 2]);
    assert_eq!(
        remove_format_record(record.clone(), "em", 2, 0).unwrap(),
        record
    );
}
