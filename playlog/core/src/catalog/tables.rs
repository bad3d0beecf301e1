//! The seven tables of the star schema.

use std::sync::OnceLock;

use playlog_schemas::{Column, ColumnType, Table, TableKind};

pub const STAGING_EVENTS: &str = "staging_events";
pub const STAGING_SONGS: &str = "staging_songs";
pub const SONGPLAYS: &str = "songplays";
pub const USERS: &str = "users";
pub const SONGS: &str = "songs";
pub const ARTISTS: &str = "artists";
pub const TIME: &str = "time";

/// All tables in declaration order: staging first, then the fact table, then dimensions
pub fn tables() -> &'static [Table] {
    static TABLES: OnceLock<Vec<Table>> = OnceLock::new();
    TABLES.get_or_init(|| {
        vec![
            staging_events(),
            staging_songs(),
            songplays(),
            users(),
            songs(),
            artists(),
            time(),
        ]
    })
}

/// Look up a table by name
pub fn table(name: &str) -> Option<&'static Table> {
    tables().iter().find(|t| t.name == name)
}

fn staging_events() -> Table {
    use ColumnType::*;

    Table::new(
        STAGING_EVENTS,
        TableKind::Staging,
        vec![
            Column::new("artist", Text),
            Column::new("auth", Text),
            Column::new("firstname", Text).from_key("firstName"),
            Column::new("gender", Text),
            Column::new("iteminsession", Integer).from_key("itemInSession"),
            Column::new("lastname", Text).from_key("lastName"),
            Column::new("length", Double),
            Column::new("level", Text),
            Column::new("location", Text),
            Column::new("method", Text),
            Column::new("page", Text),
            Column::new("registration", Text),
            Column::new("sessionid", Integer).from_key("sessionId"),
            Column::new("song", Text),
            Column::new("status", Integer),
            Column::new("ts", BigInt),
            Column::new("useragent", Text).from_key("userAgent"),
            Column::new("userid", Integer)
                .from_key("userId")
                .empty_as_null(),
        ],
    )
}

fn staging_songs() -> Table {
    use ColumnType::*;

    Table::new(
        STAGING_SONGS,
        TableKind::Staging,
        vec![
            Column::new("song_id", Text).primary_key(),
            Column::new("artist_id", Text),
            Column::new("artist_latitude", Double),
            Column::new("artist_longitude", Double),
            Column::new("artist_location", Text),
            Column::new("artist_name", Text),
            Column::new("duration", Double),
            Column::new("num_songs", Integer),
            Column::new("title", Text),
            Column::new("year", Integer),
        ],
    )
}

fn songplays() -> Table {
    use ColumnType::*;

    Table::new(
        SONGPLAYS,
        TableKind::Fact,
        vec![
            Column::new("songplay_id", Integer).identity().primary_key(),
            Column::new("start_time", Timestamp)
                .not_null()
                .sort_key()
                .dist_key(),
            Column::new("user_id", Integer).not_null(),
            Column::new("level", Text),
            Column::new("song_id", Text).not_null(),
            Column::new("artist_id", Text).not_null(),
            Column::new("session_id", Integer),
            Column::new("location", Text),
            Column::new("user_agent", Text),
        ],
    )
}

fn users() -> Table {
    use ColumnType::*;

    Table::new(
        USERS,
        TableKind::Dimension,
        vec![
            Column::new("user_id", Integer).not_null().primary_key(),
            Column::new("first_name", Text),
            Column::new("last_name", Text),
            Column::new("gender", Text),
            Column::new("level", Text),
        ],
    )
}

fn songs() -> Table {
    use ColumnType::*;

    Table::new(
        SONGS,
        TableKind::Dimension,
        vec![
            Column::new("song_id", Text).not_null().primary_key(),
            Column::new("title", Text).not_null(),
            Column::new("artist_id", Text).not_null(),
            Column::new("year", Integer),
            Column::new("duration", Double),
        ],
    )
}

fn artists() -> Table {
    use ColumnType::*;

    Table::new(
        ARTISTS,
        TableKind::Dimension,
        vec![
            Column::new("artist_id", Text).not_null().primary_key(),
            Column::new("name", Text),
            Column::new("location", Text),
            Column::new("latitude", Double),
            Column::new("longitude", Double),
        ],
    )
}

fn time() -> Table {
    use ColumnType::*;

    Table::new(
        TIME,
        TableKind::Dimension,
        vec![
            Column::new("start_time", Timestamp)
                .dist_key()
                .sort_key()
                .not_null()
                .primary_key(),
            Column::new("hour", Integer).not_null(),
            Column::new("day", Integer).not_null(),
            Column::new("week", Integer).not_null(),
            Column::new("month", Integer).not_null(),
            Column::new("year", Integer).not_null(),
            Column::new("weekday", Text).not_null(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order() {
        let names = tables().iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![STAGING_EVENTS, STAGING_SONGS, SONGPLAYS, USERS, SONGS, ARTISTS, TIME]
        );
    }

    #[test]
    fn test_dimension_keys() {
        assert_eq!(table(USERS).and_then(|t| t.primary_key()), Some("user_id"));
        assert_eq!(table(SONGS).and_then(|t| t.primary_key()), Some("song_id"));
        assert_eq!(table(ARTISTS).and_then(|t| t.primary_key()), Some("artist_id"));
        assert_eq!(table(TIME).and_then(|t| t.primary_key()), Some("start_time"));
    }

    #[test]
    fn test_staging_events_keeps_source_keys() {
        let events = table(STAGING_EVENTS).unwrap();
        assert_eq!(events.columns.len(), 18);
        assert_eq!(events.column("userid").unwrap().source_key(), "userId");
        assert!(events.column("userid").unwrap().empty_as_null);
        assert!(!events.column("sessionid").unwrap().empty_as_null);
        assert_eq!(events.column("ts").unwrap().data_type, ColumnType::BigInt);
    }

    #[test]
    fn test_only_staging_songs_declares_a_staging_key() {
        assert_eq!(table(STAGING_EVENTS).unwrap().primary_key(), None);
        assert_eq!(
            table(STAGING_SONGS).unwrap().primary_key(),
            Some("song_id")
        );
    }
}
