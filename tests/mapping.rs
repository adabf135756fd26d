//! Row/object mapping: descriptors, construction paths, and entity writing.

mod common;

use std::sync::{Arc, OnceLock};

use futures_util::StreamExt;

use common::{row, FakeFactory, Script};
use sql_conduit::{
    ConversionService, DatabaseClient, EntityWriter, Mapped, MappingDescriptor,
    PropertyDescriptor, RowMapper, Select, SqlConduitError, SqlType, SqlValue,
};

#[derive(Debug, PartialEq)]
struct Person {
    id: i64,
    name: String,
    active: bool,
}

impl Mapped for Person {
    fn descriptor() -> &'static MappingDescriptor<Self> {
        static DESCRIPTOR: OnceLock<MappingDescriptor<Person>> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            MappingDescriptor::builder("person")
                .property(PropertyDescriptor::new("id", SqlType::Int).id().generated())
                .property(PropertyDescriptor::new("name", SqlType::Text))
                .property(PropertyDescriptor::new("active", SqlType::Bool))
                .constructor(|values| {
                    let mut values = values.into_iter();
                    let id = match values.next() {
                        Some(SqlValue::Int(i)) => i,
                        other => return Err(format!("id: unexpected {other:?}")),
                    };
                    let name = match values.next() {
                        Some(SqlValue::Text(t)) => t,
                        other => return Err(format!("name: unexpected {other:?}")),
                    };
                    let active = match values.next() {
                        Some(SqlValue::Bool(b)) => b,
                        other => return Err(format!("active: unexpected {other:?}")),
                    };
                    Ok(Person { id, name, active })
                })
                .read_with(|person, property| match property {
                    "id" => Some(SqlValue::Int(person.id)),
                    "name" => Some(SqlValue::Text(person.name.clone())),
                    "active" => Some(SqlValue::Bool(person.active)),
                    _ => None,
                })
                .build()
        })
    }
}

#[derive(Debug, Default, PartialEq)]
struct Widget {
    id: i64,
    label: String,
}

impl Mapped for Widget {
    fn descriptor() -> &'static MappingDescriptor<Self> {
        static DESCRIPTOR: OnceLock<MappingDescriptor<Widget>> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            MappingDescriptor::builder("widget")
                .property(PropertyDescriptor::new("id", SqlType::Int).id())
                .property(PropertyDescriptor::new("label", SqlType::Text))
                .assignable(Widget::default, |widget, property, value| match property {
                    "id" => match value {
                        SqlValue::Int(i) => {
                            widget.id = i;
                            Ok(())
                        }
                        other => Err(format!("id: unexpected {other:?}")),
                    },
                    "label" => match value {
                        SqlValue::Text(t) => {
                            widget.label = t;
                            Ok(())
                        }
                        other => Err(format!("label: unexpected {other:?}")),
                    },
                    other => Err(format!("unknown property `{other}`")),
                })
                .build()
        })
    }
}

fn mapper() -> RowMapper {
    RowMapper::new(Arc::new(ConversionService::standard()))
}

#[test]
fn a_complete_row_takes_the_constructor_path_with_conversions() {
    // `active` arrives as an integer and is coerced to the declared Bool.
    let row = row(
        &["id", "name", "active"],
        vec![
            SqlValue::Int(7),
            SqlValue::Text("alice".into()),
            SqlValue::Int(1),
        ],
    );
    let person: Person = mapper().map_row(&row).unwrap();
    assert_eq!(
        person,
        Person {
            id: 7,
            name: "alice".into(),
            active: true,
        }
    );
}

#[test]
fn extra_columns_are_tolerated() {
    let row = row(
        &["id", "name", "active", "internal_rank"],
        vec![
            SqlValue::Int(7),
            SqlValue::Text("alice".into()),
            SqlValue::Bool(true),
            SqlValue::Int(99),
        ],
    );
    let person: Person = mapper().map_row(&row).unwrap();
    assert_eq!(person.id, 7);
}

#[test]
fn missing_columns_stay_at_their_defaults_on_the_assign_path() {
    let row = row(&["id"], vec![SqlValue::Int(3)]);
    let widget: Widget = mapper().map_row(&row).unwrap();
    assert_eq!(
        widget,
        Widget {
            id: 3,
            label: String::new(),
        }
    );
}

#[test]
fn an_incomplete_row_without_an_assign_path_is_a_mapping_error() {
    let row = row(&["id"], vec![SqlValue::Int(3)]);
    let err = mapper().map_row::<Person>(&row).unwrap_err();
    assert!(matches!(err, SqlConduitError::Mapping(_)));
}

#[test]
fn an_inconvertible_value_is_a_mapping_error_naming_the_column() {
    let row = row(
        &["id", "name", "active"],
        vec![
            SqlValue::Int(7),
            SqlValue::Text("alice".into()),
            SqlValue::Text("yes".into()),
        ],
    );
    let err = mapper().map_row::<Person>(&row).unwrap_err();
    assert!(err.to_string().contains("active"));
}

#[test]
fn entity_writing_inverts_mapping() {
    let person = Person {
        id: 7,
        name: "alice".into(),
        active: true,
    };
    let assignments = EntityWriter::to_assignments(&person).unwrap();
    assert_eq!(
        assignments,
        vec![
            ("id".to_string(), SqlValue::Int(7)),
            ("name".to_string(), SqlValue::Text("alice".into())),
            ("active".to_string(), SqlValue::Bool(true)),
        ]
    );

    // Round trip: the written values map back to an equal object.
    let (columns, values): (Vec<_>, Vec<_>) = assignments.into_iter().unzip();
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let rebuilt: Person = mapper().map_row(&row(&columns, values)).unwrap();
    assert_eq!(rebuilt, person);
}

#[test]
fn insert_assignments_exclude_a_generated_identifier() {
    let person = Person {
        id: 7,
        name: "alice".into(),
        active: true,
    };
    let assignments = EntityWriter::insert_assignments(&person).unwrap();
    let columns: Vec<_> = assignments.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(columns, ["name", "active"]);
}

#[test]
fn a_type_without_a_reader_cannot_be_written() {
    let widget = Widget {
        id: 1,
        label: "w".into(),
    };
    let err = EntityWriter::to_assignments(&widget).unwrap_err();
    assert!(matches!(err, SqlConduitError::Mapping(_)));
}

#[tokio::test]
async fn fetch_as_maps_each_row_and_continues_past_a_bad_one() {
    let rows = vec![
        row(
            &["id", "name", "active"],
            vec![
                SqlValue::Int(1),
                SqlValue::Text("a".into()),
                SqlValue::Bool(true),
            ],
        ),
        // `active` cannot be coerced; this row alone should fail.
        row(
            &["id", "name", "active"],
            vec![
                SqlValue::Int(2),
                SqlValue::Text("b".into()),
                SqlValue::Text("maybe".into()),
            ],
        ),
        row(
            &["id", "name", "active"],
            vec![
                SqlValue::Int(3),
                SqlValue::Text("c".into()),
                SqlValue::Bool(false),
            ],
        ),
    ];
    let factory = FakeFactory::new("PostgreSQL", vec![Script::Rows(rows)]);
    let client = DatabaseClient::new(factory);

    let mut stream = client
        .execute(Select::from_table("person"))
        .fetch_as::<Person>();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.name, "a");

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, SqlConduitError::Mapping(_)));

    let third = stream.next().await.unwrap().unwrap();
    assert_eq!(third.name, "c");
    assert!(stream.next().await.is_none());
}
