use manos_rich_text_structure::{
    Format, LinePoint, Record, RichText, Selection, StructureError, Value, concat_records, split,
    split_by, split_record, split_record_by,
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

fn tw_and_o() -> (Record, Record) {
    let mut left = vec![None; 4];
    left.extend(vec![Some(vec![em()]); 2]);
    let mut right = vec![Some(vec![em()])];
    right.extend(vec![None; 6]);
    (
        Record::with_formats("one tw", left),
        Record::with_formats("o three", right),
    )
}

#[test]
fn splits_at_an_offset() {
    assert_eq!(split_record(&one_two_three(), 6, 6).unwrap(), tw_and_o());
}

#[test]
fn splits_at_the_selection() {
    let rich = RichText::new(one_two_three(), Selection::caret(6));
    let (left, right) = tw_and_o();

    assert_eq!(
        split(&rich, None).unwrap(),
        (
            RichText::without_selection(left),
            RichText::new(right, Selection::caret(0)),
        )
    );
}

#[test]
fn splits_around_every_separator() {
    assert_eq!(
        split_record_by(&one_two_three(), " "),
        vec![
            Record::from_text("one"),
            Record::with_formats("two", vec![Some(vec![em()]); 3]),
            Record::from_text("three"),
        ]
    );
    assert_eq!(
        split_by(&Value::from(Record::from_text("abc")), "").unwrap(),
        vec![Value::from(Record::from_text("abc"))]
    );
}

#[test]
fn concat_undoes_a_split() {
    let record = one_two_three();
    for at in 0..=record.char_len() {
        let (left, right) = split_record(&record, at, at).unwrap();
        assert_eq!(concat_records([left, right]), record, "split at {at}");
    }
}

#[test]
fn multiline_split_keeps_whole_lines() {
    let rich = RichText::new(
        vec![
            Record::from_text("one"),
            Record::from_text("two"),
            Record::from_text("three"),
            Record::from_text("four"),
        ],
        Selection::lines(LinePoint::new(1, 1), LinePoint::new(2, 2)),
    );

    let (left, right) = split(&rich, None).unwrap();

    assert_eq!(
        left,
        RichText::without_selection(vec![Record::from_text("one"), Record::from_text("t")])
    );
    assert_eq!(
        right,
        RichText::new(
            vec![Record::from_text("ree"), Record::from_text("four")],
            Selection::lines(LinePoint::new(0, 0), LinePoint::new(0, 0)),
        )
    );
}

#[test]
fn offsets_past_the_end_are_errors() {
    assert_eq!(
        split_record(&Record::new(), 6, 6).unwrap_err(),
        StructureError::OffsetOutOfRange { offset: 6, len: 0 }
    );
    assert_eq!(
        split_by(&Value::from(vec![Record::new()]), " ").unwrap_err(),
        StructureError::ShapeMismatch
    );
}

#[test]
fn backward_span_keeps_both_cuts() {
    let (left, right) = split_record(&Record::from_text("abcdef"), 4, 2).unwrap();
    assert_eq!(left, Record::from_text("abcd"));
    assert_eq!(right, Record::from_text("cdef"));
}
