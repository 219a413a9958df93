//! Batched upsert of joined dataset records into the title catalog.

use std::collections::HashMap;
use std::path::Path;

use what2watch_core::model::{Title, TitleId, TitleTypeId};
use what2watch_core::schema::{Database, TitleRepository};

use crate::cache::{GenreCache, TitleTypeCache};
use crate::dataset::open_dataset;
use crate::error::{DatasetError, ImportError, ImportResult};
use crate::merge::merge_join;
use crate::reader::DatasetReader;
use crate::records::{TitleBasicsRecord, TitleRatingsRecord};

/// Titles written per lookup round trip.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Counters of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: u64,
    pub updated: u64,

    /// Joined pairs whose title type is not imported.
    pub skipped: u64,
    pub genres_created: u64,
    pub batches: u64,
}

impl ImportSummary {
    #[must_use]
    pub const fn imported(&self) -> u64 {
        self.created + self.updated
    }
}

/// A joined record whose title type is known.
struct Pending {
    basics: TitleBasicsRecord,
    ratings: TitleRatingsRecord,
    title_type: TitleTypeId,
}

impl Pending {
    fn to_title(&self) -> Title {
        let mut title = Title::new(
            self.basics.id,
            self.basics.primary_title.clone(),
            self.title_type,
            self.basics.start_year,
        )
        .with_rating(self.ratings.rating, self.ratings.votes);
        title.end_year = self.basics.end_year;
        title
    }
}

/// Writes joined records into a [`TitleRepository`].
#[derive(Debug, Clone, Copy)]
pub struct Importer {
    batch_size: usize,
}

impl Default for Importer {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Importer {
    /// # Errors
    /// Returns [`ImportError::InvalidBatchSize`] for a batch size of zero.
    pub fn new(batch_size: usize) -> ImportResult<Self> {
        if batch_size == 0 {
            return Err(ImportError::InvalidBatchSize(batch_size));
        }
        Ok(Self { batch_size })
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Upsert every joined pair.
    ///
    /// Existing titles are updated in place and keep their id; new ones are
    /// created. Each title's genre set is replaced by the record's genres.
    /// The first error aborts the run; whatever was written before it stays
    /// unless the caller rolls back.
    pub fn run<S, I>(&self, repo: &S, pairs: I) -> ImportResult<ImportSummary>
    where
        S: TitleRepository + ?Sized,
        I: IntoIterator<Item = Result<(TitleBasicsRecord, TitleRatingsRecord), DatasetError>>,
    {
        let title_types = TitleTypeCache::load(repo)?;
        let mut genres = GenreCache::load(repo)?;
        log::info!("Loaded {} genres", genres.len());

        let mut summary = ImportSummary::default();
        let mut batch: Vec<Pending> = Vec::with_capacity(self.batch_size);

        for pair in pairs {
            let (basics, ratings) = pair?;
            let Some(title_type) = title_types.resolve(&basics.kind) else {
                summary.skipped += 1;
                continue;
            };
            batch.push(Pending {
                basics,
                ratings,
                title_type,
            });
            if batch.len() == self.batch_size {
                Self::write_batch(repo, &mut genres, &batch, &mut summary)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            Self::write_batch(repo, &mut genres, &batch, &mut summary)?;
        }

        summary.genres_created = genres.created() as u64;
        log::info!(
            "Import finished: {} created, {} updated, {} skipped, {} new genres in {} batches",
            summary.created,
            summary.updated,
            summary.skipped,
            summary.genres_created,
            summary.batches
        );
        Ok(summary)
    }

    fn write_batch<S: TitleRepository + ?Sized>(
        repo: &S,
        genres: &mut GenreCache,
        batch: &[Pending],
        summary: &mut ImportSummary,
    ) -> ImportResult<()> {
        let ids: Vec<TitleId> = batch.iter().map(|pending| pending.basics.id).collect();
        let existing: HashMap<TitleId, Title> = repo
            .get_titles_by_ids(&ids)?
            .into_iter()
            .map(|title| (title.id, title))
            .collect();

        let (mut created, mut updated) = (0, 0);
        for pending in batch {
            let title = pending.to_title();
            if existing.contains_key(&title.id) {
                repo.update_title(&title)?;
                updated += 1;
            } else {
                repo.insert_title(&title)?;
                created += 1;
            }
            let genre_ids = genres.resolve_all(repo, &pending.basics.genres)?;
            repo.replace_title_genres(title.id, &genre_ids)?;
        }

        summary.batches += 1;
        summary.created += created;
        summary.updated += updated;
        log::info!(
            "Batch {}: {} created, {} updated",
            summary.batches,
            created,
            updated
        );
        Ok(())
    }
}

/// Import a pair of dataset files into `db` in one transaction.
///
/// Either file may be gzip-compressed. Nothing is committed if the run
/// fails.
pub fn import_datasets(
    db: &Database,
    basics: &Path,
    ratings: &Path,
    batch_size: usize,
) -> ImportResult<ImportSummary> {
    let importer = Importer::new(batch_size)?;
    log::info!(
        "Importing {} and {} (batch size {})",
        basics.display(),
        ratings.display(),
        batch_size
    );

    let basics = DatasetReader::<_, TitleBasicsRecord>::from_read(open_dataset(basics)?)?;
    let ratings = DatasetReader::<_, TitleRatingsRecord>::from_read(open_dataset(ratings)?)?;
    let pairs = merge_join(basics, ratings);

    db.with_transaction(|tx| importer.run(tx, pairs))
}
