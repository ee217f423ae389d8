//! Document import pipeline
//!
//! Turns one parsed TEI document into a Work plus its nested authors and
//! affiliations, performing create-or-reuse resolution at every level
//! and recording a provenance message per decision. Each document runs
//! in its own transaction; the batch driver isolates per-document
//! failures so one malformed file never aborts the rest.

use crate::errors::ImportError;
use crate::parser::{parse_document, TeiDocument};
use colloquia_common::config::ImportConfig;
use colloquia_common::db::models::*;
use colloquia_common::db::repository::{
    add_affiliation_to_authorship, add_keyword_to_work, add_language_to_work, add_topic_to_work,
    collapse_whitespace, create_author, create_institution, find_author_for_appellation,
    find_country_by_label, find_institution_containing, find_language_by_code,
    get_or_create_affiliation, get_or_create_appellation, get_or_create_keyword,
    get_or_create_topic, get_or_create_work, get_or_create_work_type,
    recompute_appellations_index, record_import_attempt, record_import_message,
    upsert_authorship,
};
use metrics::counter;
use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Result of one successful document import.
#[derive(Debug, Clone)]
pub struct ImportedWork {
    pub work: Work,
    /// Provenance log handle for this attempt.
    pub attempt_id: Uuid,
    /// Whether the Work itself was created rather than matched.
    pub work_created: bool,
    /// Authorships written (created or refreshed), in document order.
    pub authorships: usize,
}

/// Result of a directory import. Failed paths carry their cause so
/// operators can re-run only the failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, ImportError)>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Split a raw term list on the configured delimiters and normalize
/// case/whitespace. Order-preserving, deduplicated.
pub fn split_terms(raw: &str, delimiters: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for part in raw.split(|c| delimiters.contains(c)) {
        let term = collapse_whitespace(part).to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Document import pipeline over one store.
pub struct Importer {
    db: DatabaseConnection,
    config: ImportConfig,
}

impl Importer {
    pub fn new(db: DatabaseConnection, config: ImportConfig) -> Self {
        Self { db, config }
    }

    /// Import a single TEI document into the given conference.
    ///
    /// Validation (conference lookup, parse, language registration) runs
    /// before the transaction; every store write, including the
    /// provenance log, lands atomically or not at all.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn import_document(
        &self,
        path: &Path,
        conference_id: Uuid,
    ) -> Result<ImportedWork, ImportError> {
        ConferenceEntity::find_by_id(conference_id)
            .one(&self.db)
            .await
            .map_err(colloquia_common::AppError::from)?
            .ok_or(ImportError::ConferenceNotFound(conference_id))?;

        let xml = std::fs::read_to_string(path)?;
        let doc = parse_document(&xml)?;

        let language = find_language_by_code(&self.db, &doc.language_code)
            .await?
            .ok_or_else(|| ImportError::UnknownLanguage(doc.language_code.clone()))?;

        let path_display = path.display().to_string();
        let delimiters = self.config.term_delimiters.clone();
        let language_id = language.id;

        let imported = self
            .db
            .transaction::<_, ImportedWork, ImportError>(move |txn| {
                Box::pin(async move {
                    import_parsed(txn, &doc, &path_display, conference_id, language_id, &delimiters)
                        .await
                })
            })
            .await
            .map_err(ImportError::from)?;

        info!(
            work_id = %imported.work.id,
            created = imported.work_created,
            authorships = imported.authorships,
            "Document imported"
        );
        counter!("colloquia_import_documents_total", "result" => "ok").increment(1);

        Ok(imported)
    }

    /// Import every matching document in a directory, one transaction
    /// per file. A failure is recorded against its path and the loop
    /// continues; already-committed documents stay committed.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn import_directory(
        &self,
        dir: &Path,
        conference_id: Uuid,
    ) -> Result<BatchOutcome, ImportError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext == self.config.document_extension.as_str())
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut outcome = BatchOutcome::default();
        for path in paths {
            match self.import_document(&path, conference_id).await {
                Ok(_) => outcome.succeeded.push(path),
                Err(err) => {
                    error!(path = %path.display(), error = %err, "Failed to import document");
                    counter!("colloquia_import_documents_total", "result" => "failed")
                        .increment(1);
                    outcome.failed.push((path, err));
                }
            }
        }

        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Directory import complete"
        );

        Ok(outcome)
    }
}

/// Transaction-scoped body of one document import.
async fn import_parsed(
    txn: &DatabaseTransaction,
    doc: &TeiDocument,
    path: &str,
    conference_id: Uuid,
    language_id: Uuid,
    delimiters: &str,
) -> Result<ImportedWork, ImportError> {
    let attempt = record_import_attempt(txn, path, conference_id).await?;

    let work_type_id = match &doc.work_type {
        Some(title) => {
            let (work_type, created) = get_or_create_work_type(txn, title).await?;
            log_decision(txn, attempt.id, created, format!("work type '{}'", work_type.title))
                .await?;
            Some(work_type.id)
        }
        None => None,
    };

    let (work, work_created) = get_or_create_work(
        txn,
        conference_id,
        &doc.title,
        work_type_id,
        &doc.full_text,
        TextFormat::Xml,
    )
    .await?;
    log_decision(txn, attempt.id, work_created, format!("work '{}'", work.title)).await?;

    add_language_to_work(txn, work.id, language_id).await?;

    for raw in &doc.keywords {
        for term in split_terms(raw, delimiters) {
            let (keyword, created) = get_or_create_keyword(txn, &term).await?;
            log_decision(txn, attempt.id, created, format!("keyword '{}'", keyword.title))
                .await?;
            add_keyword_to_work(txn, work.id, keyword.id).await?;
        }
    }
    for raw in &doc.topics {
        for term in split_terms(raw, delimiters) {
            let (topic, created) = get_or_create_topic(txn, &term).await?;
            log_decision(txn, attempt.id, created, format!("topic '{}'", topic.title)).await?;
            add_topic_to_work(txn, work.id, topic.id).await?;
        }
    }

    let mut authorships = 0usize;
    for (index, block) in doc.authors.iter().enumerate() {
        let order = (index + 1) as i32;

        let (appellation, created) =
            get_or_create_appellation(txn, &block.forename, &block.surname).await?;
        let display = appellation.display_name();
        log_decision(txn, attempt.id, created, format!("appellation '{}'", display)).await?;

        let author = match find_author_for_appellation(txn, appellation.id).await? {
            Some(author) => {
                log_decision(
                    txn,
                    attempt.id,
                    false,
                    format!("author for appellation '{}'", display),
                )
                .await?;
                author
            }
            None => {
                let author = create_author(txn).await?;
                log_decision(
                    txn,
                    attempt.id,
                    true,
                    format!("author for appellation '{}'", display),
                )
                .await?;
                author
            }
        };

        let mut affiliation_ids: Vec<Uuid> = Vec::new();
        for affiliation_block in &block.affiliations {
            if affiliation_block.organization.is_empty() {
                continue;
            }

            let institution =
                match find_institution_containing(txn, &affiliation_block.organization).await? {
                    Some(institution) => {
                        log_decision(
                            txn,
                            attempt.id,
                            false,
                            format!("institution '{}'", institution.name),
                        )
                        .await?;
                        institution
                    }
                    None => {
                        let country_id = if affiliation_block.country.is_empty() {
                            None
                        } else {
                            find_country_by_label(txn, &affiliation_block.country)
                                .await?
                                .map(|country| country.id)
                        };
                        let institution = create_institution(
                            txn,
                            &affiliation_block.organization,
                            &affiliation_block.city,
                            country_id,
                        )
                        .await?;
                        log_decision(
                            txn,
                            attempt.id,
                            true,
                            format!("institution '{}'", institution.name),
                        )
                        .await?;
                        institution
                    }
                };

            let (affiliation, created) =
                get_or_create_affiliation(txn, &affiliation_block.department, institution.id)
                    .await?;
            log_decision(
                txn,
                attempt.id,
                created,
                format!("affiliation '{}'", affiliation.department),
            )
            .await?;
            affiliation_ids.push(affiliation.id);
        }

        let (authorship, created) =
            upsert_authorship(txn, work.id, author.id, appellation.id, order).await?;
        log_decision(
            txn,
            attempt.id,
            created,
            format!("authorship '{}' at position {}", display, order),
        )
        .await?;

        for affiliation_id in affiliation_ids {
            add_affiliation_to_authorship(txn, authorship.id, affiliation_id).await?;
        }

        recompute_appellations_index(txn, author.id).await?;
        authorships += 1;
    }

    Ok(ImportedWork {
        work,
        attempt_id: attempt.id,
        work_created,
        authorships,
    })
}

async fn log_decision(
    txn: &DatabaseTransaction,
    attempt_id: Uuid,
    created: bool,
    message: String,
) -> Result<(), ImportError> {
    let kind = if created { ProvenanceKind::Created } else { ProvenanceKind::Matched };
    record_import_message(txn, attempt_id, kind, message).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_terms_normalizes() {
        let terms = split_terms("  Archives; Metadata ,archives", ";,");
        assert_eq!(terms, vec!["archives", "metadata"]);
    }

    #[test]
    fn test_split_terms_empty_input() {
        assert!(split_terms("  ;, ", ";,").is_empty());
    }

    #[test]
    fn test_split_terms_collapses_inner_whitespace() {
        let terms = split_terms("digital   humanities", ";,");
        assert_eq!(terms, vec!["digital humanities"]);
    }
}
