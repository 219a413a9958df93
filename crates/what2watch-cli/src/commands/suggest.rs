use anyhow::Result;
use what2watch_core::model::UserId;
use what2watch_core::schema::TitleRepository;
use what2watch_etl::Config;

pub fn suggest(config: &Config, user: i64, json: bool) -> Result<()> {
    let db = super::open_database(config)?;
    let user = UserId::new(user);
    db.upsert_user(user)?;

    let Some(title) = db.suggest_title(user)? else {
        if json {
            println!("null");
        } else {
            println!("No title matches the current preferences.");
            println!("\nRun 'what2watch prefs --user {user}' to review them.");
        }
        return Ok(());
    };

    let genres: Vec<String> = db
        .title_genres(title.id)?
        .into_iter()
        .map(|genre| genre.name)
        .collect();

    if json {
        let value = serde_json::json!({
            "id": title.id.imdb_id(),
            "url": title.id.imdb_url(),
            "name": title.name,
            "years": title.years(),
            "rating": title.rating,
            "votes": title.votes,
            "genres": genres,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("\n🎬 {} ({})", title.name, title.years());
        println!("  Rating: {:.1} ({} votes)", title.rating, title.votes);
        println!("  Genres: {}", genres.join(", "));
        println!("  {}", title.id.imdb_url());
    }

    Ok(())
}
