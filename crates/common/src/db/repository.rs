//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations. The
//! free functions are generic over `ConnectionTrait` so the same
//! operations run on a live connection or inside a merge/import
//! transaction; the `Repository` struct wraps them for callers holding
//! a `Store`.

use crate::db::models::*;
use crate::db::Store;
use crate::errors::{AppError, Result};
use crate::MAX_SESSION_DEPTH;
use regex_lite::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use uuid::Uuid;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Collapse runs of whitespace and trim. Used for search text and
/// imported term normalization.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text.trim(), " ").into_owned()
}

// ============================================================================
// Conference Operations
// ============================================================================

/// Build the denormalized search text for a conference from its own
/// fields plus related names as they are right now.
fn build_search_text(
    conference: &Conference,
    series_titles: &[String],
    organizer_names: &[String],
    host_names: &[String],
) -> String {
    let mut parts: Vec<&str> = vec![
        conference.short_title.as_str(),
        conference.theme_title.as_str(),
        conference.city.as_str(),
    ];
    let year = conference.year.to_string();
    parts.push(year.as_str());
    parts.extend(series_titles.iter().map(String::as_str));
    parts.extend(organizer_names.iter().map(String::as_str));
    parts.extend(host_names.iter().map(String::as_str));

    collapse_whitespace(&parts.join(" "))
}

/// Save a conference, recomputing its `search_text` projection from the
/// current state of its series, organizers, and host institutions.
///
/// Every conference save must go through here; writing the entity
/// directly would leave the projection stale.
pub async fn save_conference<C: ConnectionTrait>(
    conn: &C,
    conference: Conference,
) -> Result<Conference> {
    let memberships = SeriesMembershipEntity::find()
        .filter(SeriesMembershipColumn::ConferenceId.eq(conference.id))
        .all(conn)
        .await?;
    let series_ids: Vec<Uuid> = memberships.iter().map(|m| m.series_id).collect();
    let series_titles: Vec<String> = if series_ids.is_empty() {
        Vec::new()
    } else {
        ConferenceSeriesEntity::find()
            .filter(ConferenceSeriesColumn::Id.is_in(series_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|s| s.title)
            .collect()
    };

    let organizer_links = ConferenceOrganizerEntity::find()
        .filter(ConferenceOrganizerColumn::ConferenceId.eq(conference.id))
        .all(conn)
        .await?;
    let organizer_ids: Vec<Uuid> = organizer_links.iter().map(|l| l.organizer_id).collect();
    let organizer_names: Vec<String> = if organizer_ids.is_empty() {
        Vec::new()
    } else {
        OrganizerEntity::find()
            .filter(OrganizerColumn::Id.is_in(organizer_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|o| o.name)
            .collect()
    };

    let host_links = ConferenceHostEntity::find()
        .filter(ConferenceHostColumn::ConferenceId.eq(conference.id))
        .all(conn)
        .await?;
    let host_ids: Vec<Uuid> = host_links.iter().map(|l| l.institution_id).collect();
    let host_names: Vec<String> = if host_ids.is_empty() {
        Vec::new()
    } else {
        InstitutionEntity::find()
            .filter(InstitutionColumn::Id.is_in(host_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|i| i.name)
            .collect()
    };

    let search_text = build_search_text(&conference, &series_titles, &organizer_names, &host_names);

    let exists = ConferenceEntity::find_by_id(conference.id).one(conn).await?.is_some();
    // reset_all marks every field as changed so caller edits persist
    // alongside the recomputed projection.
    let mut active: ConferenceActiveModel = ConferenceActiveModel::from(conference).reset_all();
    active.search_text = Set(search_text);
    active.updated_at = Set(chrono::Utc::now().into());
    if exists {
        active.update(conn).await.map_err(Into::into)
    } else {
        active.insert(conn).await.map_err(Into::into)
    }
}

// ============================================================================
// Work Operations
// ============================================================================

/// Attach (or detach, with `None`) a work to a parent session Work.
///
/// The parent chain is a tree; this walks the proposed ancestors with a
/// bounded step count and rejects anything that would close a cycle.
pub async fn set_work_parent<C: ConnectionTrait>(
    conn: &C,
    work_id: Uuid,
    parent_id: Option<Uuid>,
) -> Result<Work> {
    let work = WorkEntity::find_by_id(work_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("work", work_id))?;

    if let Some(first_parent) = parent_id {
        let mut cursor = Some(first_parent);
        let mut steps = 0usize;
        while let Some(current) = cursor {
            if current == work_id {
                return Err(AppError::SessionCycle { work_id });
            }
            steps += 1;
            if steps > MAX_SESSION_DEPTH {
                return Err(AppError::SessionCycle { work_id });
            }
            let ancestor = WorkEntity::find_by_id(current)
                .one(conn)
                .await?
                .ok_or_else(|| AppError::not_found("work", current))?;
            cursor = ancestor.parent_id;
        }
    }

    let mut active: WorkActiveModel = work.into();
    active.parent_id = Set(parent_id);
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(conn).await.map_err(Into::into)
}

/// Create-or-reuse a Work identified by (conference, title, work type,
/// full text). An identical quadruple is reused, which is what makes
/// re-imports idempotent.
pub async fn get_or_create_work<C: ConnectionTrait>(
    conn: &C,
    conference_id: Uuid,
    title: &str,
    work_type_id: Option<Uuid>,
    full_text: &str,
    format: TextFormat,
) -> Result<(Work, bool)> {
    let existing = WorkEntity::find()
        .filter(WorkColumn::ConferenceId.eq(conference_id))
        .filter(WorkColumn::Title.eq(title))
        .filter(match work_type_id {
            Some(id) => WorkColumn::WorkTypeId.eq(id),
            None => WorkColumn::WorkTypeId.is_null(),
        })
        .filter(WorkColumn::FullText.eq(full_text))
        .one(conn)
        .await?;

    if let Some(work) = existing {
        return Ok((work, false));
    }

    let now = chrono::Utc::now();
    let work = WorkActiveModel {
        id: Set(Uuid::new_v4()),
        conference_id: Set(conference_id),
        title: Set(title.to_string()),
        work_type_id: Set(work_type_id),
        full_text: Set(full_text.to_string()),
        full_text_format: Set(String::from(format)),
        license_id: Set(None),
        parent_id: Set(None),
        hidden: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    Ok((work, true))
}

/// Delete a work and everything that hangs off it: its authorships,
/// their affiliation links, and its vocabulary joins. Explicit cascade,
/// independent of store-level FK behavior.
pub async fn delete_work<C: ConnectionTrait>(conn: &C, work_id: Uuid) -> Result<u64> {
    let authorship_ids: Vec<Uuid> = AuthorshipEntity::find()
        .filter(AuthorshipColumn::WorkId.eq(work_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    if !authorship_ids.is_empty() {
        AuthorshipAffiliationEntity::delete_many()
            .filter(AuthorshipAffiliationColumn::AuthorshipId.is_in(authorship_ids.clone()))
            .exec(conn)
            .await?;
        AuthorshipEntity::delete_many()
            .filter(AuthorshipColumn::Id.is_in(authorship_ids))
            .exec(conn)
            .await?;
    }

    WorkKeywordEntity::delete_many()
        .filter(WorkKeywordColumn::WorkId.eq(work_id))
        .exec(conn)
        .await?;
    WorkTopicEntity::delete_many()
        .filter(WorkTopicColumn::WorkId.eq(work_id))
        .exec(conn)
        .await?;
    WorkLanguageEntity::delete_many()
        .filter(WorkLanguageColumn::WorkId.eq(work_id))
        .exec(conn)
        .await?;
    WorkDisciplineEntity::delete_many()
        .filter(WorkDisciplineColumn::WorkId.eq(work_id))
        .exec(conn)
        .await?;

    let result = WorkEntity::delete_by_id(work_id).exec(conn).await?;
    Ok(result.rows_affected)
}

// ============================================================================
// Author / Appellation Operations
// ============================================================================

/// Create-or-reuse an Appellation by exact (first name, last name).
pub async fn get_or_create_appellation<C: ConnectionTrait>(
    conn: &C,
    first_name: &str,
    last_name: &str,
) -> Result<(Appellation, bool)> {
    let existing = AppellationEntity::find()
        .filter(AppellationColumn::FirstName.eq(first_name))
        .filter(AppellationColumn::LastName.eq(last_name))
        .one(conn)
        .await?;

    if let Some(appellation) = existing {
        return Ok((appellation, false));
    }

    let appellation = AppellationActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
    }
    .insert(conn)
    .await?;

    Ok((appellation, true))
}

/// Find an Author already linked to the given Appellation through some
/// prior Authorship. The earliest-created authorship wins, which keeps
/// repeated imports deterministic.
pub async fn find_author_for_appellation<C: ConnectionTrait>(
    conn: &C,
    appellation_id: Uuid,
) -> Result<Option<Author>> {
    let authorship = AuthorshipEntity::find()
        .filter(AuthorshipColumn::AppellationId.eq(appellation_id))
        .order_by_asc(AuthorshipColumn::CreatedAt)
        .order_by_asc(AuthorshipColumn::Id)
        .one(conn)
        .await?;

    let Some(authorship) = authorship else {
        return Ok(None);
    };

    AuthorEntity::find_by_id(authorship.author_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Create a brand-new Author with an empty appellation index.
pub async fn create_author<C: ConnectionTrait>(conn: &C) -> Result<Author> {
    let now = chrono::Utc::now();
    AuthorActiveModel {
        id: Set(Uuid::new_v4()),
        appellations_index: Set(String::new()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Recompute an author's `appellations_index` projection from all
/// distinct Appellations asserted by its Authorships. Must run after
/// every authorship write touching the author and at the end of an
/// Author merge.
pub async fn recompute_appellations_index<C: ConnectionTrait>(
    conn: &C,
    author_id: Uuid,
) -> Result<Author> {
    let author = AuthorEntity::find_by_id(author_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("author", author_id))?;

    let authorships = AuthorshipEntity::find()
        .filter(AuthorshipColumn::AuthorId.eq(author_id))
        .all(conn)
        .await?;
    let appellation_ids: Vec<Uuid> = authorships
        .iter()
        .map(|a| a.appellation_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let index = if appellation_ids.is_empty() {
        String::new()
    } else {
        let names: BTreeSet<String> = AppellationEntity::find()
            .filter(AppellationColumn::Id.is_in(appellation_ids))
            .all(conn)
            .await?
            .iter()
            .map(Appellation::display_name)
            .collect();
        names.into_iter().collect::<Vec<_>>().join("; ")
    };

    let mut active: AuthorActiveModel = author.into();
    active.appellations_index = Set(index);
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(conn).await.map_err(Into::into)
}

// ============================================================================
// Authorship Operations
// ============================================================================

/// Create-or-reuse the Authorship keyed by (work, author). On reuse the
/// appellation and order are refreshed to the currently asserted values,
/// so re-importing a corrected document converges.
pub async fn upsert_authorship<C: ConnectionTrait>(
    conn: &C,
    work_id: Uuid,
    author_id: Uuid,
    appellation_id: Uuid,
    authorship_order: i32,
) -> Result<(Authorship, bool)> {
    let existing = AuthorshipEntity::find()
        .filter(AuthorshipColumn::WorkId.eq(work_id))
        .filter(AuthorshipColumn::AuthorId.eq(author_id))
        .one(conn)
        .await?;

    if let Some(authorship) = existing {
        let mut active: AuthorshipActiveModel = authorship.into();
        active.appellation_id = Set(appellation_id);
        active.authorship_order = Set(authorship_order);
        active.updated_at = Set(chrono::Utc::now().into());
        let updated = active.update(conn).await?;
        return Ok((updated, false));
    }

    let now = chrono::Utc::now();
    let authorship = AuthorshipActiveModel {
        id: Set(Uuid::new_v4()),
        work_id: Set(work_id),
        author_id: Set(author_id),
        appellation_id: Set(appellation_id),
        authorship_order: Set(authorship_order),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    Ok((authorship, true))
}

/// Append an affiliation to an authorship's asserted set. Idempotent;
/// returns whether a link was actually added.
pub async fn add_affiliation_to_authorship<C: ConnectionTrait>(
    conn: &C,
    authorship_id: Uuid,
    affiliation_id: Uuid,
) -> Result<bool> {
    let existing = AuthorshipAffiliationEntity::find()
        .filter(AuthorshipAffiliationColumn::AuthorshipId.eq(authorship_id))
        .filter(AuthorshipAffiliationColumn::AffiliationId.eq(affiliation_id))
        .one(conn)
        .await?;

    if existing.is_some() {
        return Ok(false);
    }

    AuthorshipAffiliationActiveModel {
        id: Set(Uuid::new_v4()),
        authorship_id: Set(authorship_id),
        affiliation_id: Set(affiliation_id),
    }
    .insert(conn)
    .await?;

    Ok(true)
}

// ============================================================================
// Institution / Affiliation Operations
// ============================================================================

/// Find an existing Institution by case-insensitive substring
/// containment of the candidate name within the stored name — a
/// deliberately loose match that folds minor punctuation and suffix
/// variants. Multiple hits resolve by (name, id) order so repeated
/// imports pick the same institution.
pub async fn find_institution_containing<C: ConnectionTrait>(
    conn: &C,
    candidate: &str,
) -> Result<Option<Institution>> {
    let needle = candidate.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(None);
    }

    let mut institutions = InstitutionEntity::find().all(conn).await?;
    institutions.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    Ok(institutions
        .into_iter()
        .find(|i| i.name.to_lowercase().contains(&needle)))
}

/// Create a new Institution.
pub async fn create_institution<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    city: &str,
    country_id: Option<Uuid>,
) -> Result<Institution> {
    InstitutionActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        city: Set(city.to_string()),
        country_id: Set(country_id),
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Create-or-reuse the (department, institution) Affiliation. An empty
/// department is the "institution with no sub-unit" affiliation.
pub async fn get_or_create_affiliation<C: ConnectionTrait>(
    conn: &C,
    department: &str,
    institution_id: Uuid,
) -> Result<(Affiliation, bool)> {
    let existing = AffiliationEntity::find()
        .filter(AffiliationColumn::Department.eq(department))
        .filter(AffiliationColumn::InstitutionId.eq(institution_id))
        .one(conn)
        .await?;

    if let Some(affiliation) = existing {
        return Ok((affiliation, false));
    }

    let affiliation = AffiliationActiveModel {
        id: Set(Uuid::new_v4()),
        department: Set(department.to_string()),
        institution_id: Set(institution_id),
    }
    .insert(conn)
    .await?;

    Ok((affiliation, true))
}

// ============================================================================
// Country Operations
// ============================================================================

/// Resolve a Country by exact label lookup.
pub async fn find_country_by_label<C: ConnectionTrait>(
    conn: &C,
    label: &str,
) -> Result<Option<Country>> {
    let label_row = CountryLabelEntity::find()
        .filter(CountryLabelColumn::Name.eq(label))
        .one(conn)
        .await?;

    let Some(label_row) = label_row else {
        return Ok(None);
    };

    CountryEntity::find_by_id(label_row.country_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

// ============================================================================
// Vocabulary Operations
// ============================================================================

/// Create-or-reuse a Keyword by title.
pub async fn get_or_create_keyword<C: ConnectionTrait>(
    conn: &C,
    title: &str,
) -> Result<(Keyword, bool)> {
    let existing = KeywordEntity::find()
        .filter(KeywordColumn::Title.eq(title))
        .one(conn)
        .await?;
    if let Some(keyword) = existing {
        return Ok((keyword, false));
    }
    let keyword = KeywordActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
    }
    .insert(conn)
    .await?;
    Ok((keyword, true))
}

/// Create-or-reuse a Topic by title.
pub async fn get_or_create_topic<C: ConnectionTrait>(
    conn: &C,
    title: &str,
) -> Result<(Topic, bool)> {
    let existing = TopicEntity::find()
        .filter(TopicColumn::Title.eq(title))
        .one(conn)
        .await?;
    if let Some(topic) = existing {
        return Ok((topic, false));
    }
    let topic = TopicActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
    }
    .insert(conn)
    .await?;
    Ok((topic, true))
}

/// Create-or-reuse a WorkType by title.
pub async fn get_or_create_work_type<C: ConnectionTrait>(
    conn: &C,
    title: &str,
) -> Result<(WorkType, bool)> {
    let existing = WorkTypeEntity::find()
        .filter(WorkTypeColumn::Title.eq(title))
        .one(conn)
        .await?;
    if let Some(work_type) = existing {
        return Ok((work_type, false));
    }
    let work_type = WorkTypeActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
    }
    .insert(conn)
    .await?;
    Ok((work_type, true))
}

/// Look up a Language by its registered code. Languages are a controlled
/// vocabulary; there is deliberately no create path here.
pub async fn find_language_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<Option<Language>> {
    LanguageEntity::find()
        .filter(LanguageColumn::Code.eq(code))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Attach a language to a work (idempotent).
pub async fn add_language_to_work<C: ConnectionTrait>(
    conn: &C,
    work_id: Uuid,
    language_id: Uuid,
) -> Result<bool> {
    let existing = WorkLanguageEntity::find()
        .filter(WorkLanguageColumn::WorkId.eq(work_id))
        .filter(WorkLanguageColumn::LanguageId.eq(language_id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }
    WorkLanguageActiveModel {
        id: Set(Uuid::new_v4()),
        work_id: Set(work_id),
        language_id: Set(language_id),
    }
    .insert(conn)
    .await?;
    Ok(true)
}

/// Attach a keyword to a work (idempotent).
pub async fn add_keyword_to_work<C: ConnectionTrait>(
    conn: &C,
    work_id: Uuid,
    keyword_id: Uuid,
) -> Result<bool> {
    let existing = WorkKeywordEntity::find()
        .filter(WorkKeywordColumn::WorkId.eq(work_id))
        .filter(WorkKeywordColumn::KeywordId.eq(keyword_id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }
    WorkKeywordActiveModel {
        id: Set(Uuid::new_v4()),
        work_id: Set(work_id),
        keyword_id: Set(keyword_id),
    }
    .insert(conn)
    .await?;
    Ok(true)
}

/// Attach a topic to a work (idempotent).
pub async fn add_topic_to_work<C: ConnectionTrait>(
    conn: &C,
    work_id: Uuid,
    topic_id: Uuid,
) -> Result<bool> {
    let existing = WorkTopicEntity::find()
        .filter(WorkTopicColumn::WorkId.eq(work_id))
        .filter(WorkTopicColumn::TopicId.eq(topic_id))
        .one(conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }
    WorkTopicActiveModel {
        id: Set(Uuid::new_v4()),
        work_id: Set(work_id),
        topic_id: Set(topic_id),
    }
    .insert(conn)
    .await?;
    Ok(true)
}

// ============================================================================
// Import Provenance Operations
// ============================================================================

/// Open a provenance log for one document import attempt.
pub async fn record_import_attempt<C: ConnectionTrait>(
    conn: &C,
    file_path: &str,
    conference_id: Uuid,
) -> Result<ImportAttempt> {
    ImportAttemptActiveModel {
        id: Set(Uuid::new_v4()),
        file_path: Set(file_path.to_string()),
        conference_id: Set(conference_id),
        started_at: Set(chrono::Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Append one created/matched decision to an attempt's provenance log.
pub async fn record_import_message<C: ConnectionTrait>(
    conn: &C,
    attempt_id: Uuid,
    kind: ProvenanceKind,
    message: impl Into<String>,
) -> Result<ImportMessage> {
    ImportMessageActiveModel {
        id: Set(Uuid::new_v4()),
        attempt_id: Set(attempt_id),
        kind: Set(String::from(kind)),
        message: Set(message.into()),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

// ============================================================================
// Repository
// ============================================================================

/// Repository for data access operations over a `Store`.
#[derive(Clone)]
pub struct Repository {
    store: Store,
}

impl Repository {
    /// Create a new repository with the given store
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Find a conference by ID
    pub async fn find_conference(&self, id: Uuid) -> Result<Option<Conference>> {
        ConferenceEntity::find_by_id(id)
            .one(self.store.conn())
            .await
            .map_err(Into::into)
    }

    /// Save a conference, recomputing its search text projection
    pub async fn save_conference(&self, conference: Conference) -> Result<Conference> {
        save_conference(self.store.conn(), conference).await
    }

    /// Find a work by ID
    pub async fn find_work(&self, id: Uuid) -> Result<Option<Work>> {
        WorkEntity::find_by_id(id)
            .one(self.store.conn())
            .await
            .map_err(Into::into)
    }

    /// Re-parent a work within its session tree (cycle-checked)
    pub async fn set_work_parent(&self, work_id: Uuid, parent_id: Option<Uuid>) -> Result<Work> {
        set_work_parent(self.store.conn(), work_id, parent_id).await
    }

    /// Delete a work and its dependent records
    pub async fn delete_work(&self, work_id: Uuid) -> Result<u64> {
        delete_work(self.store.conn(), work_id).await
    }

    /// Find an author by ID
    pub async fn find_author(&self, id: Uuid) -> Result<Option<Author>> {
        AuthorEntity::find_by_id(id)
            .one(self.store.conn())
            .await
            .map_err(Into::into)
    }

    /// Recompute an author's cached appellation projection
    pub async fn recompute_appellations_index(&self, author_id: Uuid) -> Result<Author> {
        recompute_appellations_index(self.store.conn(), author_id).await
    }

    /// Provenance log for one import attempt, oldest first
    pub async fn import_messages(&self, attempt_id: Uuid) -> Result<Vec<ImportMessage>> {
        ImportMessageEntity::find()
            .filter(ImportMessageColumn::AttemptId.eq(attempt_id))
            .order_by_asc(ImportMessageColumn::CreatedAt)
            .all(self.store.conn())
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support as fx;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n c  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_build_search_text_includes_related_names() {
        let conference = Conference {
            id: Uuid::new_v4(),
            short_title: "DH2017".into(),
            theme_title: "Access".into(),
            year: 2017,
            start_date: None,
            end_date: None,
            city: "Montreal".into(),
            notes: String::new(),
            url: String::new(),
            search_text: String::new(),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };
        let text = build_search_text(
            &conference,
            &["Digital Humanities".to_string()],
            &["ADHO".to_string()],
            &["McGill University".to_string()],
        );
        assert!(text.contains("DH2017"));
        assert!(text.contains("2017"));
        assert!(text.contains("Digital Humanities"));
        assert!(text.contains("ADHO"));
        assert!(text.contains("McGill University"));
    }

    #[tokio::test]
    async fn test_search_text_reflects_related_entities_at_save_time() {
        let conn = fx::memory_store().await;
        let repo = Repository::new(Store::from_connection(conn.clone()));
        repo.ping().await.unwrap();

        let conference = fx::conference(&conn, "DH2017", 2017).await;

        let series = ConferenceSeriesActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set("Digital Humanities".into()),
            abbreviation: Set("DH".into()),
            notes: Set(String::new()),
        }
        .insert(&conn)
        .await
        .unwrap();
        SeriesMembershipActiveModel {
            id: Set(Uuid::new_v4()),
            series_id: Set(series.id),
            conference_id: Set(conference.id),
            number: Set(Some(29)),
        }
        .insert(&conn)
        .await
        .unwrap();

        let host = fx::institution(&conn, "McGill University").await;
        ConferenceHostActiveModel {
            id: Set(Uuid::new_v4()),
            conference_id: Set(conference.id),
            institution_id: Set(host.id),
        }
        .insert(&conn)
        .await
        .unwrap();

        // The projection was computed before the series/host existed.
        assert!(!conference.search_text.contains("Digital Humanities"));

        let saved = repo.save_conference(conference).await.unwrap();
        assert!(saved.search_text.contains("Digital Humanities"));
        assert!(saved.search_text.contains("McGill University"));

        let reloaded = repo.find_conference(saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.search_text, saved.search_text);
    }

    #[tokio::test]
    async fn test_session_tree_rejects_cycles() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2018", 2018).await;

        let session = fx::work(&conn, conference.id, "Panel Session").await;
        let first = fx::work(&conn, conference.id, "Panel Paper One").await;
        let second = fx::work(&conn, conference.id, "Panel Paper Two").await;

        set_work_parent(&conn, first.id, Some(session.id)).await.unwrap();
        set_work_parent(&conn, second.id, Some(first.id)).await.unwrap();

        // Closing the loop is rejected, as is self-parenting.
        let err = set_work_parent(&conn, session.id, Some(second.id)).await.unwrap_err();
        assert!(matches!(err, AppError::SessionCycle { .. }));
        let err = set_work_parent(&conn, session.id, Some(session.id)).await.unwrap_err();
        assert!(matches!(err, AppError::SessionCycle { .. }));

        // Detaching is always allowed.
        let detached = set_work_parent(&conn, first.id, None).await.unwrap();
        assert_eq!(detached.parent_id, None);
    }

    #[tokio::test]
    async fn test_appellations_index_tracks_authorship_changes() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2018", 2018).await;
        let author = fx::author(&conn).await;
        let work_a = fx::work(&conn, conference.id, "A").await;
        let work_b = fx::work(&conn, conference.id, "B").await;

        let first = fx::appellation(&conn, "Ana", "Ruiz").await;
        fx::authorship(&conn, work_a.id, author.id, first.id, 1).await;
        let refreshed = recompute_appellations_index(&conn, author.id).await.unwrap();
        assert_eq!(refreshed.appellations_index, "Ana Ruiz");

        let second = fx::appellation(&conn, "Ana", "Ruiz-Gomez").await;
        fx::authorship(&conn, work_b.id, author.id, second.id, 1).await;
        let refreshed = recompute_appellations_index(&conn, author.id).await.unwrap();
        assert!(refreshed.appellations_index.contains("Ana Ruiz"));
        assert!(refreshed.appellations_index.contains("Ana Ruiz-Gomez"));
    }

    #[tokio::test]
    async fn test_delete_work_cascades_to_authorships() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2018", 2018).await;
        let work = fx::work(&conn, conference.id, "Doomed").await;
        let author = fx::author(&conn).await;
        let name = fx::appellation(&conn, "D", "E").await;
        let ship = fx::authorship(&conn, work.id, author.id, name.id, 1).await;

        let institution = fx::institution(&conn, "U").await;
        let affiliation = fx::affiliation(&conn, "", institution.id).await;
        fx::link_affiliation(&conn, ship.id, affiliation.id).await;

        delete_work(&conn, work.id).await.unwrap();

        assert!(WorkEntity::find_by_id(work.id).one(&conn).await.unwrap().is_none());
        assert!(AuthorshipEntity::find_by_id(ship.id).one(&conn).await.unwrap().is_none());
        let links = AuthorshipAffiliationEntity::find()
            .filter(AuthorshipAffiliationColumn::AuthorshipId.eq(ship.id))
            .all(&conn)
            .await
            .unwrap();
        assert!(links.is_empty());

        // The author and the affiliation themselves survive.
        assert!(AuthorEntity::find_by_id(author.id).one(&conn).await.unwrap().is_some());
        assert!(AffiliationEntity::find_by_id(affiliation.id).one(&conn).await.unwrap().is_some());
    }
}
