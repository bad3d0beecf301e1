//! `INSERT ... SELECT` statements populating the fact and dimension tables.
//!
//! Every statement names its target columns explicitly. Dimension keys are picked with
//! `ROW_NUMBER()` so a key appears once per load even when staging rows disagree about
//! its attributes:
//!
//! | table     | partition   | first row by             |
//! |-----------|-------------|--------------------------|
//! | `users`   | `userid`    | latest `ts`, then level  |
//! | `songs`   | `song_id`   | title, then artist       |
//! | `artists` | `artist_id` | lowest `song_id`         |
//!
//! `songplays` and `time` use `DISTINCT` over the projected row.

use playlog_schemas::Table;

use super::tables::{STAGING_EVENTS, STAGING_SONGS};
use crate::dialect::{DatePart, Dialect};

/// A projected column: source expression and target column
struct Projection {
    expr: String,
    column: &'static str,
}

fn project(expr: String, column: &'static str) -> Projection {
    Projection { expr, column }
}

fn select_list(dialect: Dialect, projections: &[Projection]) -> String {
    projections
        .iter()
        .map(|p| format!("    {} AS {}", p.expr, dialect.ident(p.column)))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn column_list(dialect: Dialect, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| dialect.ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert_header(dialect: Dialect, table: &Table, projections: &[Projection]) -> String {
    let columns = projections.iter().map(|p| p.column).collect::<Vec<_>>();
    format!(
        "INSERT INTO {} ({})",
        dialect.ident(&table.name),
        column_list(dialect, &columns)
    )
}

/// `songplays`: `NextSong` events joined to the song they played.
///
/// Matching is on (title, artist name, exact duration). Several song rows with the same
/// triple produce one fact row each.
pub fn songplays(dialect: Dialect, table: &Table) -> String {
    let e = |c: &str| dialect.qualified("e", c);
    let s = |c: &str| dialect.qualified("s", c);

    let projections = vec![
        project(dialect.epoch_millis_to_timestamp(&e("ts")), "start_time"),
        project(e("userid"), "user_id"),
        project(e("level"), "level"),
        project(s("song_id"), "song_id"),
        project(s("artist_id"), "artist_id"),
        project(e("sessionid"), "session_id"),
        project(e("location"), "location"),
        project(e("useragent"), "user_agent"),
    ];

    let select = format!(
        "SELECT DISTINCT\n{}\nFROM {} e\nJOIN {} s\n    ON {} = {}\n    AND {} = {}\n    AND {} = {}\nWHERE {} = 'NextSong'",
        select_list(dialect, &projections),
        dialect.ident(STAGING_EVENTS),
        dialect.ident(STAGING_SONGS),
        e("song"),
        s("title"),
        e("artist"),
        s("artist_name"),
        e("length"),
        s("duration"),
        e("page"),
    );

    let identity = table.columns.iter().find(|c| c.identity);

    match identity {
        Some(identity) if !dialect.supports_identity() => {
            with_generated_identity(dialect, table, &identity.name, &projections, &select)
        }
        _ => format!("{}\n{select}", insert_header(dialect, table, &projections)),
    }
}

// Numbers the projected rows after the largest id already in the table, so ids keep
// increasing across appends the way an identity column would.
fn with_generated_identity(
    dialect: Dialect,
    table: &Table,
    identity: &str,
    projections: &[Projection],
    select: &str,
) -> String {
    let mut columns = vec![identity];
    columns.extend(projections.iter().map(|p| p.column));

    let ordering = projections
        .iter()
        .map(|p| dialect.qualified("p", p.column))
        .collect::<Vec<_>>()
        .join(", ");

    let values = projections
        .iter()
        .map(|p| format!("    {}", dialect.qualified("p", p.column)))
        .collect::<Vec<_>>()
        .join(",\n");

    let indented = select
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "INSERT INTO {table} ({columns})\n\
         SELECT\n    \
         CAST(ROW_NUMBER() OVER (ORDER BY {ordering}) AS BIGINT) + n.next_id - 1,\n\
         {values}\n\
         FROM (\n{indented}\n) p\n\
         CROSS JOIN (SELECT COALESCE(MAX({id}) + 1, 0) AS next_id FROM {table}) n",
        table = dialect.ident(&table.name),
        columns = column_list(dialect, &columns),
        id = dialect.ident(identity),
    )
}

/// Keep the first row per partition of a projection
fn ranked_pick(
    dialect: Dialect,
    table: &Table,
    projections: &[Projection],
    from: &str,
    filter: &str,
    partition: &str,
    order: &str,
) -> String {
    let outer = projections
        .iter()
        .map(|p| format!("    {}", dialect.qualified("ranked", p.column)))
        .collect::<Vec<_>>()
        .join(",\n");

    let inner = projections
        .iter()
        .map(|p| format!("        {} AS {}", p.expr, dialect.ident(p.column)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{header}\n\
         SELECT\n{outer}\n\
         FROM (\n    \
         SELECT\n{inner},\n        \
         ROW_NUMBER() OVER (PARTITION BY {partition} ORDER BY {order}) AS rn\n    \
         FROM {from}\n    \
         WHERE {filter}\n\
         ) ranked\n\
         WHERE ranked.rn = 1",
        header = insert_header(dialect, table, projections),
    )
}

/// `users`: one row per user seen playing a song, attributes from their latest event
pub fn users(dialect: Dialect, table: &Table) -> String {
    let e = |c: &str| dialect.qualified("e", c);

    let projections = vec![
        project(e("userid"), "user_id"),
        project(e("firstname"), "first_name"),
        project(e("lastname"), "last_name"),
        project(e("gender"), "gender"),
        project(e("level"), "level"),
    ];

    ranked_pick(
        dialect,
        table,
        &projections,
        &format!("{} e", dialect.ident(STAGING_EVENTS)),
        &format!("{} IS NOT NULL\n        AND {} = 'NextSong'", e("userid"), e("page")),
        &e("userid"),
        &format!("{} DESC, {}", e("ts"), e("level")),
    )
}

/// `songs`: one row per song id
pub fn songs(dialect: Dialect, table: &Table) -> String {
    let s = |c: &str| dialect.qualified("s", c);

    let projections = vec![
        project(s("song_id"), "song_id"),
        project(s("title"), "title"),
        project(s("artist_id"), "artist_id"),
        project(s("year"), "year"),
        project(s("duration"), "duration"),
    ];

    ranked_pick(
        dialect,
        table,
        &projections,
        &format!("{} s", dialect.ident(STAGING_SONGS)),
        &format!("{} IS NOT NULL", s("song_id")),
        &s("song_id"),
        &format!("{}, {}", s("title"), s("artist_id")),
    )
}

/// `artists`: one row per artist id, taken from the artist's lowest song id
pub fn artists(dialect: Dialect, table: &Table) -> String {
    let s = |c: &str| dialect.qualified("s", c);

    let projections = vec![
        project(s("artist_id"), "artist_id"),
        project(s("artist_name"), "name"),
        project(s("artist_location"), "location"),
        project(s("artist_latitude"), "latitude"),
        project(s("artist_longitude"), "longitude"),
    ];

    ranked_pick(
        dialect,
        table,
        &projections,
        &format!("{} s", dialect.ident(STAGING_SONGS)),
        &format!("{} IS NOT NULL", s("artist_id")),
        &s("artist_id"),
        &s("song_id"),
    )
}

/// `time`: every distinct event timestamp decomposed into calendar fields
pub fn time(dialect: Dialect, table: &Table) -> String {
    let converted = dialect.epoch_millis_to_timestamp(&dialect.qualified("e", "ts"));
    let ts = dialect.qualified("t", "ts");

    let mut projections = vec![project(ts.clone(), "start_time")];
    projections.extend(DatePart::ALL.iter().map(|part| {
        let expr = dialect.date_part(*part, &ts);
        let expr = match part {
            DatePart::Weekday => format!("CAST({expr} AS VARCHAR)"),
            _ => expr,
        };
        project(expr, part.column())
    }));

    let events = dialect.ident(STAGING_EVENTS);
    let filter = dialect.qualified("e", "ts");
    let select = select_list(dialect, &projections);
    let header = insert_header(dialect, table, &projections);

    match dialect {
        Dialect::Redshift => format!(
            "{header}\n\
             WITH t AS (\n    \
             SELECT {converted} AS ts\n    \
             FROM {events} e\n    \
             WHERE {filter} IS NOT NULL\n\
             )\n\
             SELECT DISTINCT\n{select}\n\
             FROM t"
        ),
        Dialect::DataFusion => format!(
            "{header}\n\
             SELECT DISTINCT\n{select}\n\
             FROM (\n    \
             SELECT {converted} AS {ts_alias}\n    \
             FROM {events} e\n    \
             WHERE {filter} IS NOT NULL\n\
             ) t",
            ts_alias = dialect.ident("ts"),
        ),
    }
}
