mod common;

use common::setup_test_logging;
use rstest::rstest;
use tabflow_table::{
    Column, FlatRecord, FlatValue, LazyRow, Row, Scalar, Table, TableError, Value, record,
};

fn int(n: i64) -> FlatValue {
    FlatValue::Scalar(Scalar::Int(n))
}

fn flat(pairs: &[(&str, FlatValue)]) -> FlatRecord {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[test]
fn scenario_flat_records() -> Result<(), TableError> {
    setup_test_logging();

    let t = Table::from_records([record! { "a" => 1, "b" => 2 }, record! { "a" => 3, "b" => 4 }])?;
    assert_eq!(t.column_names(), ["a", "b"]);
    assert_eq!(t.len(), 2);

    let a = t.row(0)?.get("a")?.and_then(Value::as_scalar);
    assert_eq!(a, Some(&Scalar::Int(1)));
    Ok(())
}

#[test]
fn scenario_scalar_table() {
    setup_test_logging();

    let t = Table::from_scalar(5);
    assert_eq!(t.rank(), 0);
    assert!(t.shape().is_empty());
    assert_eq!(t.flatten(), int(5));
}

#[test]
fn scenario_nested_table() -> Result<(), TableError> {
    setup_test_logging();

    let inner = Table::from_records([record! { "y" => 1 }, record! { "y" => 2 }])?;
    let outer = Table::from_records([record! { "x" => inner }])?;

    assert_eq!(outer.shape(), [1, 2]);
    assert_eq!(outer.rank(), 2);

    let expected = flat(&[(
        "x",
        FlatValue::Rows(vec![flat(&[("y", int(1))]), flat(&[("y", int(2))])]),
    )]);
    assert_eq!(outer.row(0)?.to_mapping(false), expected);
    assert_eq!(outer.flatten().as_rows().map(<[_]>::len), Some(1));
    assert_eq!(
        outer.flatten().to_json().map_err(|e| TableError::invariant(e.to_string()))?,
        r#"[{"x":[{"y":1},{"y":2}]}]"#
    );
    Ok(())
}

#[test]
fn scenario_scope_chain() -> Result<(), TableError> {
    setup_test_logging();

    let parent = Table::from_records([record! { "topic" => "tables" }])?;
    let prow = parent.row(0)?;

    let linked = Table::from_records([Row::with_parent(record! { "n" => 1 }, prow)])?;
    let topic = linked.row(0)?.get("topic")?.and_then(Value::as_scalar);
    assert_eq!(topic, Some(&Scalar::from("tables")));

    let unlinked = Table::from_records([record! { "n" => 1 }])?;
    let err = unlinked.row(0)?.get("topic").unwrap_err();
    assert!(matches!(err, TableError::KeyNotFound(ref name) if name == "topic"));
    Ok(())
}

#[test]
fn scenario_unlinked_row_loses_ancestor_fields() -> Result<(), TableError> {
    setup_test_logging();

    let parent = Table::from_records([record! { "topic" => "tables" }])?;
    let mut row = Row::with_parent(record! { "n" => 1 }, parent.row(0)?);
    assert_eq!(
        row.field("n").and_then(Value::as_scalar),
        Some(&Scalar::Int(1))
    );

    let linked = Table::from_records([row.clone()])?;
    assert_eq!(
        linked.row(0)?.get("topic")?.and_then(Value::as_scalar),
        Some(&Scalar::from("tables"))
    );

    row.set_parent(None);
    assert!(row.parent().is_none());
    let unlinked = Table::from_records([row])?;
    let err = unlinked.row(0)?.get("topic").unwrap_err();
    assert!(matches!(err, TableError::KeyNotFound(ref name) if name == "topic"));
    Ok(())
}

#[test]
fn three_level_scope_chain() -> Result<(), TableError> {
    setup_test_logging();

    let source = Table::from_records([record! { "doc" => "d1" }, record! { "doc" => "d2" }])?;
    let mut stage1_rows = Vec::new();
    for view in source.rows() {
        stage1_rows.push(Row::with_parent(record! { "_words" => 3 }, view));
    }
    let stage1 = Table::from_records(stage1_rows)?.with_parent(&source);

    let second: LazyRow<'_> = stage1.row(1)?;
    let stage2 = Table::from_records([Row::with_parent(record! { "len" => 2 }, second)])?
        .with_parent(&stage1);
    let leaf = stage2.row(0)?;

    assert_eq!(
        leaf.get("doc")?.and_then(Value::as_scalar),
        Some(&Scalar::from("d2"))
    );
    assert_eq!(
        leaf.get("_words")?.and_then(Value::as_scalar),
        Some(&Scalar::Int(3))
    );
    assert!(stage2.parent().is_some_and(|p| p.parent().is_some()));
    Ok(())
}

#[rstest]
#[case(true, vec!["a"])]
#[case(false, vec!["a", "_"])]
fn hidden_current_column_projection(
    #[case] named_only: bool,
    #[case] keys: Vec<&str>,
) -> Result<(), TableError> {
    setup_test_logging();

    let t = Table::from_records([record! { "a" => 1, "_result" => "r" }])?;
    let m = t.row(0)?.to_mapping(named_only);
    assert_eq!(m.keys().map(String::as_str).collect::<Vec<_>>(), keys);
    Ok(())
}

#[test]
fn sibling_nested_sizes_do_not_change_shape() -> Result<(), TableError> {
    setup_test_logging();

    let wide = Table::from_records((0..5).map(|i| record! { "v" => i }))?;
    let narrow = Table::from_records([record! { "v" => 0 }, record! { "v" => 1 }])?;
    let t = Table::from_records([record! { "wide" => wide, "narrow" => narrow }])?;
    assert_eq!(t.shape(), [1, 2]);
    Ok(())
}

#[test]
fn rank_zero_cell_flattens_to_scalar() -> Result<(), TableError> {
    setup_test_logging();

    let t = Table::from_records([record! { "answer" => Table::from_scalar(42) }])?;
    assert_eq!(t.shape(), [1]);
    assert_eq!(t.row(0)?.to_mapping(true)["answer"], int(42));
    Ok(())
}

#[test]
fn sub_column_reads_joined_record() -> Result<(), TableError> {
    setup_test_logging();

    let mut t = Table::from_records([
        record! { "id" => 1, "author" => record! { "name" => "ada", "born" => 1815 } },
        record! { "id" => 2 },
    ])?;
    t.add_column(Column::sub("author", Column::new("born")))?;

    assert_eq!(t.column_names(), ["id", "author", "born"]);
    assert_eq!(
        t.row(0)?.get("born")?.and_then(Value::as_scalar),
        Some(&Scalar::Int(1815))
    );
    assert!(t.row(1)?.get("born")?.is_none());
    assert!(!t.row(1)?.to_mapping(true).contains_key("born"));
    Ok(())
}

#[test]
fn structural_copy_as_template() -> Result<(), TableError> {
    setup_test_logging();

    let source = Table::from_records((0..10).map(|i| record! { "i" => i, "sq" => i * i }))?;
    let mut result = source.structural_copy();
    assert!(result.is_empty());
    assert_eq!(result.column_names(), ["i", "sq"]);

    for view in source.rows().filter(|r| {
        r.get_opt("i")
            .and_then(Value::as_scalar)
            .and_then(Scalar::as_int)
            .is_some_and(|i| i % 2 == 0)
    }) {
        result.push(view)?;
    }
    assert_eq!(result.len(), 5);
    assert_eq!(
        result.row(4)?.get("sq")?.and_then(Value::as_scalar),
        Some(&Scalar::Int(64))
    );
    Ok(())
}
