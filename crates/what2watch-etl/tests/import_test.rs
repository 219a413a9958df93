//! End-to-end import tests over dataset files on disk.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;
use what2watch_core::model::{TitleId, TitleTypeFamily};
use what2watch_core::schema::{Database, TitleRepository};
use what2watch_etl::{import_datasets, DatasetError, ImportError};

const BASICS_HEADER: &str = "tconst\ttitleType\tprimaryTitle\toriginalTitle\tisAdult\tstartYear\tendYear\truntimeMinutes\tgenres";
const RATINGS_HEADER: &str = "tconst\taverageRating\tnumVotes";

fn basics_line(id: u32, kind: &str, name: &str, start_year: &str, genres: &str) -> String {
    format!("tt{id:07}\t{kind}\t{name}\t{name}\t0\t{start_year}\t\\N\t90\t{genres}")
}

fn ratings_line(id: u32, rating: f64, votes: u32) -> String {
    format!("tt{id:07}\t{rating:.1}\t{votes}")
}

fn write_tsv(path: &Path, header: &str, lines: &[String]) {
    let mut data = String::from(header);
    for line in lines {
        data.push('\n');
        data.push_str(line);
    }
    data.push('\n');
    std::fs::write(path, data).unwrap();
}

fn write_pair(dir: &Path, basics: &[String], ratings: &[String]) -> (PathBuf, PathBuf) {
    let basics_path = dir.join("title.basics.tsv");
    let ratings_path = dir.join("title.ratings.tsv");
    write_tsv(&basics_path, BASICS_HEADER, basics);
    write_tsv(&ratings_path, RATINGS_HEADER, ratings);
    (basics_path, ratings_path)
}

/// Everything an import writes, in a comparable form.
fn dump(db: &Database) -> Vec<String> {
    let ids: Vec<TitleId> = (1..=20_000).map(TitleId::new).collect();
    let mut titles = db.get_titles_by_ids(&ids).unwrap();
    titles.sort_by_key(|title| title.id);

    let type_names: std::collections::HashMap<_, _> = db
        .list_title_types()
        .unwrap()
        .into_iter()
        .map(|title_type| (title_type.id, title_type.name))
        .collect();

    titles
        .into_iter()
        .map(|title| {
            let genres: Vec<String> = db
                .title_genres(title.id)
                .unwrap()
                .into_iter()
                .map(|genre| genre.name)
                .collect();
            format!(
                "{}|{}|{}|{}|{:?}|{}|{}|{}",
                title.id,
                title.name,
                type_names[&title.title_type],
                title.start_year,
                title.end_year,
                title.rating,
                title.votes,
                genres.join(",")
            )
        })
        .collect()
}

#[test]
fn test_missing_start_year_is_never_imported() {
    let temp_dir = TempDir::new().unwrap();
    let (basics, ratings) = write_pair(
        temp_dir.path(),
        &[
            basics_line(1, "movie", "No Year", "\\N", "Drama"),
            basics_line(2, "movie", "Has Year", "2001", "Drama"),
        ],
        &[ratings_line(1, 7.0, 100), ratings_line(2, 7.0, 100)],
    );
    let db = Database::open_in_memory().unwrap();

    let summary = import_datasets(&db, &basics, &ratings, 10).unwrap();

    assert_eq!(summary.created, 1);
    assert!(db.get_title(TitleId::new(1)).unwrap().is_none());
    assert_eq!(db.get_title(TitleId::new(2)).unwrap().unwrap().start_year, 2001);
}

#[test]
fn test_only_titles_present_in_both_datasets_are_imported() {
    let temp_dir = TempDir::new().unwrap();
    let (basics, ratings) = write_pair(
        temp_dir.path(),
        &[
            basics_line(1, "movie", "Unrated", "1990", "Drama"),
            basics_line(2, "movie", "Rated", "1991", "Drama"),
            basics_line(3, "tvEpisode", "Episode", "1992", "Drama"),
        ],
        &[
            ratings_line(2, 8.1, 5000),
            ratings_line(3, 9.0, 10),
            ratings_line(4, 5.0, 10),
        ],
    );
    let db = Database::open_in_memory().unwrap();

    let summary = import_datasets(&db, &basics, &ratings, 10).unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(db.count_titles().unwrap(), 1);
    assert!(db.get_title(TitleId::new(2)).unwrap().is_some());
}

#[test]
fn test_reimport_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let (basics, ratings) = write_pair(
        temp_dir.path(),
        &[
            basics_line(1, "movie", "A Movie", "1990", "Drama"),
            basics_line(2, "tvMovie", "A TV Movie", "1991", "Comedy"),
            basics_line(3, "tvSeries", "A Series", "1992", "Crime,Drama"),
            basics_line(4, "tvMiniSeries", "A Mini Series", "1993", "History"),
        ],
        &[
            ratings_line(1, 7.0, 100),
            ratings_line(2, 6.0, 100),
            ratings_line(3, 9.0, 100),
            ratings_line(4, 8.0, 100),
        ],
    );
    let db = Database::open_in_memory().unwrap();

    import_datasets(&db, &basics, &ratings, 2).unwrap();
    let first = dump(&db);
    let summary = import_datasets(&db, &basics, &ratings, 2).unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 4);
    assert_eq!(summary.genres_created, 0);
    assert_eq!(dump(&db), first);
    assert_eq!(db.count_titles().unwrap(), 4);
    assert_eq!(db.count_title_types().unwrap(), 3);
    for title_type in db.list_title_types().unwrap() {
        assert!(title_type.family().is_some());
    }
    let movie = db.get_title(TitleId::new(2)).unwrap().unwrap();
    let movie_type = db
        .list_title_types()
        .unwrap()
        .into_iter()
        .find(|title_type| title_type.id == movie.title_type)
        .unwrap();
    assert_eq!(movie_type.family(), Some(TitleTypeFamily::Movie));
}

#[test]
fn test_reimport_replaces_genres() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open_in_memory().unwrap();
    let ratings = vec![ratings_line(1, 7.0, 100)];

    let (basics, ratings_path) = write_pair(
        temp_dir.path(),
        &[basics_line(1, "movie", "Movie", "2000", "A,B")],
        &ratings,
    );
    import_datasets(&db, &basics, &ratings_path, 10).unwrap();

    let (basics, ratings_path) = write_pair(
        temp_dir.path(),
        &[basics_line(1, "movie", "Movie", "2000", "B,C")],
        &ratings,
    );
    import_datasets(&db, &basics, &ratings_path, 10).unwrap();

    let genres: BTreeSet<String> = db
        .title_genres(TitleId::new(1))
        .unwrap()
        .into_iter()
        .map(|genre| genre.name)
        .collect();
    assert_eq!(genres, BTreeSet::from(["B".to_string(), "C".to_string()]));
    assert_eq!(db.count_genres().unwrap(), 3);
}

#[test]
fn test_batch_size_does_not_change_result() {
    const GENRES: [&str; 5] = ["Drama", "Comedy", "Crime", "Horror", "Romance"];
    const KINDS: [&str; 6] = ["movie", "tvMovie", "tvSeries", "tvMiniSeries", "short", "video"];

    let temp_dir = TempDir::new().unwrap();
    let mut basics = Vec::new();
    let mut ratings = Vec::new();
    for id in 1..=12_000u32 {
        let index = id as usize;
        let genres = format!("{},{}", GENRES[index % 5], GENRES[(index / 5) % 5]);
        basics.push(basics_line(id, KINDS[index % 6], &format!("Title {id}"), "2000", &genres));
        if id % 7 != 0 {
            ratings.push(ratings_line(id, f64::from(id % 100) / 10.0, id * 3));
        }
    }
    let (basics_path, ratings_path) = write_pair(temp_dir.path(), &basics, &ratings);

    let batched = Database::open(temp_dir.path().join("batched.db")).unwrap();
    let single = Database::open(temp_dir.path().join("single.db")).unwrap();
    let batched_summary = import_datasets(&batched, &basics_path, &ratings_path, 5000).unwrap();
    let single_summary = import_datasets(&single, &basics_path, &ratings_path, 12_000).unwrap();

    assert_eq!(batched_summary.batches, 2);
    assert_eq!(single_summary.batches, 1);
    assert_eq!(batched_summary.created, single_summary.created);
    assert_eq!(batched_summary.skipped, single_summary.skipped);
    assert_eq!(dump(&batched), dump(&single));
    assert_eq!(batched.count_titles().unwrap(), batched_summary.created);
}

#[test]
fn test_gzip_datasets() {
    let temp_dir = TempDir::new().unwrap();
    let basics_path = temp_dir.path().join("title.basics.tsv.gz");
    let ratings_path = temp_dir.path().join("title.ratings.tsv.gz");

    let mut basics = String::from(BASICS_HEADER);
    for id in 1..=50 {
        write!(basics, "\n{}", basics_line(id, "movie", "Movie", "1999", "Drama")).unwrap();
    }
    let mut ratings = String::from(RATINGS_HEADER);
    for id in 1..=50 {
        write!(ratings, "\n{}", ratings_line(id, 6.5, 1000)).unwrap();
    }
    for (path, content) in [(&basics_path, basics), (&ratings_path, ratings)] {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    let db = Database::open_in_memory().unwrap();
    let summary = import_datasets(&db, &basics_path, &ratings_path, 20).unwrap();
    assert_eq!(summary.created, 50);
    assert_eq!(summary.batches, 3);
}

#[test]
fn test_failed_import_commits_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let (basics, ratings) = write_pair(
        temp_dir.path(),
        &[
            basics_line(1, "movie", "One", "1990", "Drama"),
            basics_line(2, "movie", "Two", "1990", "Drama"),
            "tt0000003\tmovie\tbroken".to_string(),
        ],
        &[
            ratings_line(1, 7.0, 100),
            ratings_line(2, 7.0, 100),
            ratings_line(3, 7.0, 100),
        ],
    );
    let db = Database::open_in_memory().unwrap();

    let result = import_datasets(&db, &basics, &ratings, 1);

    assert!(matches!(
        result,
        Err(ImportError::Dataset(DatasetError::BrokenRow { line: 4, .. }))
    ));
    assert_eq!(db.count_titles().unwrap(), 0);
    assert_eq!(db.count_genres().unwrap(), 0);
}

#[test]
fn test_unsorted_dataset_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let (basics, ratings) = write_pair(
        temp_dir.path(),
        &[
            basics_line(2, "movie", "Two", "1990", "Drama"),
            basics_line(1, "movie", "One", "1990", "Drama"),
        ],
        &[ratings_line(1, 7.0, 100), ratings_line(2, 7.0, 100)],
    );
    let db = Database::open_in_memory().unwrap();

    let result = import_datasets(&db, &basics, &ratings, 10);

    assert!(matches!(
        result,
        Err(ImportError::Dataset(DatasetError::Order(_)))
    ));
    assert_eq!(db.count_titles().unwrap(), 0);
}
