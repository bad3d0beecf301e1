//! Common test utilities for playlog core testing.
//!
//! Datasets are written as newline-delimited JSON into a temporary directory laid out
//! like the public song-play buckets: `log_data/<year>/<month>/<day>-events.json` and
//! one song per file under `song_data/`.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use datafusion::arrow::util::display::array_value_to_string;
use playlog_core::catalog::staging::jsonpaths;
use playlog_core::catalog::tables::{table, STAGING_EVENTS};
use playlog_core::prelude::*;
use playlog_schemas::{IamRole, RoleArn, S3Config};
use serde_json::{json, Value};
use tempfile::TempDir;

/// 2018-11-03 01:19:13.796 UTC
pub const SATURDAY_TS: i64 = 1541207953796;

/// A dataset on disk and the configuration pointing at it
pub struct Dataset {
    pub dir: TempDir,
    pub config: WarehouseConfig,
    pub events: usize,
    pub songs: usize,
}

/// A `NextSong` event
pub fn next_song(user_id: &str, song: &str, artist: &str, length: f64, ts: i64) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": format!("First{user_id}"),
        "gender": "F",
        "itemInSession": 0,
        "lastName": format!("Last{user_id}"),
        "length": length,
        "level": "free",
        "location": "Portland-South Portland, ME",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1540835983796.0,
        "sessionId": 139,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Windows NT 6.1; WOW64)",
        "userId": user_id,
    })
}

/// A non-playing page view; an empty user id is a logged-out visitor
pub fn page_view(page: &str, user_id: &str, ts: i64) -> Value {
    json!({
        "artist": null,
        "auth": if user_id.is_empty() { "Logged Out" } else { "Logged In" },
        "firstName": null,
        "gender": null,
        "itemInSession": 1,
        "lastName": null,
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": page,
        "registration": null,
        "sessionId": 52,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": user_id,
    })
}

/// A song metadata document
pub fn song(
    song_id: &str,
    artist_id: &str,
    artist_name: &str,
    title: &str,
    duration: f64,
    year: i32,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": 45.51,
        "artist_longitude": -122.67,
        "artist_location": "Portland, OR",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year,
    })
}

/// Set an event field, e.g. to change the subscription level
pub fn with(mut value: Value, key: &str, field: Value) -> Value {
    value[key] = field;
    value
}

fn write_ndjson<P: AsRef<Path>>(path: P, records: &[Value]) {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent).unwrap();
    }

    let mut file = File::create(path).unwrap();
    for record in records {
        writeln!(file, "{record}").unwrap();
    }
    file.flush().unwrap();
}

/// Write event log files and song files into a fresh directory
pub fn dataset(event_files: &[Vec<Value>], songs: &[Value]) -> Dataset {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    for (i, events) in event_files.iter().enumerate() {
        write_ndjson(
            root.join(format!("log_data/2018/11/2018-11-{:02}-events.json", i + 1)),
            events,
        );
    }

    for (i, song) in songs.iter().enumerate() {
        write_ndjson(
            root.join(format!("song_data/A/{}/TRA{i:05}.json", i % 3)),
            std::slice::from_ref(song),
        );
    }

    let descriptor = jsonpaths(table(STAGING_EVENTS).unwrap());
    fs::write(root.join("log_json_path.json"), descriptor.to_string()).unwrap();

    let location = |name: &str| Location::try_from(root.join(name).to_str().unwrap()).unwrap();

    let config = WarehouseConfig::builder()
        .iam_role(IamRole {
            arn: RoleArn::try_from("arn:aws:iam::123456789012:role/dwhRole").unwrap(),
        })
        .s3(S3Config::builder()
            .log_data(location("log_data"))
            .log_jsonpath(location("log_json_path.json"))
            .song_data(location("song_data"))
            .build())
        .build();

    Dataset {
        events: event_files.iter().map(Vec::len).sum(),
        songs: songs.len(),
        dir,
        config,
    }
}

/// Three songs by two artists, one song file duplicated, six events over two days:
///
/// - user 10 plays "Midnight Train" (free) and later "Sunrise" (paid)
/// - user 20 plays an unknown song and "Sunrise" with a slightly different length
/// - user 20 visits Home, a logged-out visitor visits Home
pub fn default_dataset() -> Dataset {
    let songs = vec![
        song("SOAAA", "AR1", "Blue Band", "Midnight Train", 200.5, 2001),
        song("SOBBB", "AR2", "Red Singer", "Sunrise", 180.25, 0),
        song("SOCCC", "AR1", "Blue Band", "Lonely Road", 240.0, 1999),
        song("SOAAA", "AR1", "Blue Band", "Midnight Train", 200.5, 2001),
    ];

    let day_one = vec![
        next_song("10", "Midnight Train", "Blue Band", 200.5, SATURDAY_TS),
        next_song("20", "Unknown Song", "Nobody", 100.0, SATURDAY_TS + 60_000),
        page_view("Home", "20", SATURDAY_TS + 120_000),
    ];

    let day_two = vec![
        with(
            next_song("10", "Sunrise", "Red Singer", 180.25, SATURDAY_TS + 86_400_000),
            "level",
            json!("paid"),
        ),
        next_song("20", "Sunrise", "Red Singer", 180.3, SATURDAY_TS + 86_460_000),
        page_view("Home", "", SATURDAY_TS + 86_520_000),
    ];

    dataset(&[day_one, day_two], &songs)
}

/// Run a query and render every value as a string, row by row
pub async fn rows(warehouse: &dyn Warehouse, sql: &str) -> Vec<Vec<String>> {
    let batches = warehouse.query(sql).await.unwrap();

    batches
        .iter()
        .flat_map(|batch| {
            (0..batch.num_rows()).map(move |row| {
                batch
                    .columns()
                    .iter()
                    .map(|column| array_value_to_string(column, row).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect()
}

/// Run a query returning a single number
pub async fn scalar(warehouse: &dyn Warehouse, sql: &str) -> u64 {
    let rows = rows(warehouse, sql).await;
    assert_eq!(rows.len(), 1, "expected a single row from {sql}");
    rows[0][0].parse().unwrap()
}

/// Row count of a table
pub async fn count(warehouse: &dyn Warehouse, table: &str) -> u64 {
    scalar(warehouse, &format!("SELECT COUNT(*) FROM \"{table}\"")).await
}
