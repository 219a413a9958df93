use anyhow::Result;
use what2watch_core::model::{GenreId, TitleId, TitleTypeFamily, UserId};
use what2watch_core::schema::Database;
use what2watch_etl::Config;

/// Requested preference changes, applied in field order.
#[derive(Debug, Default)]
pub struct PrefsChanges {
    pub min_rating: Option<f64>,
    pub min_votes: Option<u32>,
    pub genres: Vec<String>,
    pub unselected_genres: Vec<String>,
    pub all_genres: bool,
    pub no_genres: bool,
    pub types: Vec<TitleTypeFamily>,
    pub unselected_types: Vec<TitleTypeFamily>,
    pub require_all_genres: Option<bool>,
    pub watched: Vec<TitleId>,
    pub ignored: Vec<TitleId>,
}

pub fn update_prefs(config: &Config, user: i64, changes: &PrefsChanges) -> Result<()> {
    let db = super::open_database(config)?;
    let user = UserId::new(user);
    db.upsert_user(user)?;

    db.with_transaction(|db| apply(db, user, changes))?;
    print_prefs(&db, user)
}

fn apply(db: &Database, user: UserId, changes: &PrefsChanges) -> Result<()> {
    if let Some(rating) = changes.min_rating {
        db.set_minimum_rating(user, rating)?;
    }
    if let Some(votes) = changes.min_votes {
        db.set_minimum_votes(user, votes)?;
    }
    if changes.all_genres {
        db.select_all_genres(user)?;
    }
    if changes.no_genres {
        db.unselect_all_genres(user)?;
    }
    for name in &changes.genres {
        db.select_genre(user, genre_id(db, name)?)?;
    }
    for name in &changes.unselected_genres {
        db.unselect_genre(user, genre_id(db, name)?)?;
    }
    for family in &changes.types {
        db.select_title_type(user, *family)?;
    }
    for family in &changes.unselected_types {
        db.unselect_title_type(user, *family)?;
    }
    if let Some(require_all) = changes.require_all_genres {
        db.set_require_all_genres(user, require_all)?;
    }
    for title in &changes.watched {
        db.mark_watched(user, *title)?;
    }
    for title in &changes.ignored {
        db.mark_ignored(user, *title)?;
    }
    Ok(())
}

fn genre_id(db: &Database, name: &str) -> Result<GenreId> {
    match db.get_genre_by_name(name)? {
        Some(genre) => Ok(genre.id),
        None => anyhow::bail!(
            "Unknown genre: {name}\n\nRun 'what2watch import' first, or check the spelling."
        ),
    }
}

fn print_prefs(db: &Database, user: UserId) -> Result<()> {
    let settings = db.get_user(user)?;
    let genres: Vec<String> = db
        .selected_genres(user)?
        .into_iter()
        .map(|genre| genre.name)
        .collect();
    let types: Vec<String> = db
        .selected_title_types(user)?
        .into_iter()
        .map(|title_type| title_type.name)
        .collect();

    println!("\n⚙️  Preferences of user {user}\n");
    println!("  Minimum rating: {:.1}", settings.minimum_rating);
    println!("  Minimum votes:  {}", settings.minimum_votes);
    println!(
        "  Genres:         {} ({})",
        if genres.is_empty() { "<none>".to_string() } else { genres.join(", ") },
        if settings.require_all_selected_genres { "all required" } else { "any" }
    );
    println!(
        "  Title types:    {}",
        if types.is_empty() { "<none>".to_string() } else { types.join(", ") }
    );
    if let Some(updated) = settings.last_settings_update_at {
        println!("  Last changed:   {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }

    Ok(())
}
