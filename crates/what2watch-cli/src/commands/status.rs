use anyhow::Result;
use what2watch_etl::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let db = super::open_database(config)?;

    println!("\n📊 what2watch Status\n");
    println!("  Database: {}", config.database_path.display());
    println!("  Titles:   {}", db.count_titles()?);
    for (title_type, count) in db.count_titles_by_type()? {
        println!("    {:<12} {}", title_type.name, count);
    }
    println!("  Genres:   {}", db.count_genres()?);
    println!("  Users:    {}", db.count_users()?);

    let files = config.dataset_files();
    println!("\n  Datasets: {}", config.data_dir.display());
    for path in [&files.basics, &files.ratings] {
        let state = if path.exists() { "present" } else { "missing" };
        println!(
            "    {:<24} {}",
            path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default(),
            state
        );
    }

    if db.count_titles()? == 0 {
        println!("\n  Run `what2watch import` to fill the catalog");
    }

    Ok(())
}
