//! Temporal attribute resolver
//!
//! An author's name and affiliation are not properties of the author
//! record; they are asserted per Work, dated by the Work's conference
//! year. This module computes the current best-known values from that
//! assertion history. Pure reads — generic over `ConnectionTrait` so the
//! same queries run on a live connection or inside a merge transaction.
//!
//! Ranking: each distinct value scores the maximum conference year among
//! the authorships asserting it; every value tied for the overall
//! maximum is returned. Assertions on hidden works are only consulted
//! when the author has no visible ones.

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// One authorship with its assertion year.
#[derive(Debug, Clone)]
struct DatedAuthorship {
    authorship: Authorship,
    year: i32,
}

/// Drift flags for one authorship against its author's current
/// most-recent sets. Surfaced to editors; never auto-corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutdatedFlags {
    pub appellation: bool,
    pub affiliations: bool,
}

impl OutdatedFlags {
    pub fn any(&self) -> bool {
        self.appellation || self.affiliations
    }
}

/// Load the author's authorships with conference years, restricted to
/// visible works when any exist.
async fn dated_authorships<C: ConnectionTrait>(
    conn: &C,
    author_id: Uuid,
) -> Result<Vec<DatedAuthorship>> {
    let authorships = AuthorshipEntity::find()
        .filter(AuthorshipColumn::AuthorId.eq(author_id))
        .all(conn)
        .await?;
    if authorships.is_empty() {
        return Ok(Vec::new());
    }

    let work_ids: Vec<Uuid> = authorships.iter().map(|a| a.work_id).collect();
    let works = WorkEntity::find()
        .filter(WorkColumn::Id.is_in(work_ids))
        .all(conn)
        .await?;
    let conference_ids: Vec<Uuid> = works.iter().map(|w| w.conference_id).collect();
    let conferences = ConferenceEntity::find()
        .filter(ConferenceColumn::Id.is_in(conference_ids))
        .all(conn)
        .await?;

    let year_by_conference: HashMap<Uuid, i32> =
        conferences.into_iter().map(|c| (c.id, c.year)).collect();
    let work_info: HashMap<Uuid, (bool, i32)> = works
        .into_iter()
        .filter_map(|w| {
            let year = *year_by_conference.get(&w.conference_id)?;
            Some((w.id, (w.hidden, year)))
        })
        .collect();

    let mut visible = Vec::new();
    let mut all = Vec::new();
    for authorship in authorships {
        let Some(&(hidden, year)) = work_info.get(&authorship.work_id) else {
            continue;
        };
        let dated = DatedAuthorship { authorship, year };
        if !hidden {
            visible.push(dated.clone());
        }
        all.push(dated);
    }

    // Prefer assertions from visible works; fall back to the full set
    // only when nothing visible remains.
    Ok(if visible.is_empty() { all } else { visible })
}

/// Values tied for the latest assertion year, given (value id, year)
/// observations. Returns the ids sorted for deterministic output.
fn latest_values(observations: &[(Uuid, i32)]) -> Vec<Uuid> {
    let mut best_year: HashMap<Uuid, i32> = HashMap::new();
    for &(id, year) in observations {
        let entry = best_year.entry(id).or_insert(year);
        if year > *entry {
            *entry = year;
        }
    }

    let Some(max_year) = best_year.values().copied().max() else {
        return Vec::new();
    };

    let mut ids: Vec<Uuid> = best_year
        .into_iter()
        .filter(|&(_, year)| year == max_year)
        .map(|(id, _)| id)
        .collect();
    ids.sort();
    ids
}

/// All Appellations tied for the author's latest assertion year.
/// Empty when the author has no authorships.
pub async fn most_recent_appellations<C: ConnectionTrait>(
    conn: &C,
    author_id: Uuid,
) -> Result<Vec<Appellation>> {
    let dated = dated_authorships(conn, author_id).await?;
    if dated.is_empty() {
        return Ok(Vec::new());
    }

    let observations: Vec<(Uuid, i32)> = dated
        .iter()
        .map(|d| (d.authorship.appellation_id, d.year))
        .collect();

    let distinct: HashSet<Uuid> = observations.iter().map(|&(id, _)| id).collect();
    let ids = if distinct.len() == 1 {
        distinct.into_iter().collect()
    } else {
        latest_values(&observations)
    };

    let mut appellations = AppellationEntity::find()
        .filter(AppellationColumn::Id.is_in(ids))
        .all(conn)
        .await?;
    appellations.sort_by_key(|a| a.id);
    Ok(appellations)
}

/// All Affiliations tied for the author's latest assertion year.
pub async fn most_recent_affiliations<C: ConnectionTrait>(
    conn: &C,
    author_id: Uuid,
) -> Result<Vec<Affiliation>> {
    let dated = dated_authorships(conn, author_id).await?;
    if dated.is_empty() {
        return Ok(Vec::new());
    }

    let authorship_ids: Vec<Uuid> = dated.iter().map(|d| d.authorship.id).collect();
    let year_by_authorship: HashMap<Uuid, i32> =
        dated.iter().map(|d| (d.authorship.id, d.year)).collect();

    let links = AuthorshipAffiliationEntity::find()
        .filter(AuthorshipAffiliationColumn::AuthorshipId.is_in(authorship_ids))
        .all(conn)
        .await?;
    if links.is_empty() {
        return Ok(Vec::new());
    }

    let observations: Vec<(Uuid, i32)> = links
        .iter()
        .filter_map(|link| {
            let year = *year_by_authorship.get(&link.authorship_id)?;
            Some((link.affiliation_id, year))
        })
        .collect();

    let distinct: HashSet<Uuid> = observations.iter().map(|&(id, _)| id).collect();
    let ids = if distinct.len() == 1 {
        distinct.into_iter().collect()
    } else {
        latest_values(&observations)
    };

    let mut affiliations = AffiliationEntity::find()
        .filter(AffiliationColumn::Id.is_in(ids))
        .all(conn)
        .await?;
    affiliations.sort_by_key(|a| a.id);
    Ok(affiliations)
}

/// Single current appellation. When several values tie for the latest
/// year the smallest id wins — deterministic, but the choice among tied
/// values carries no meaning.
pub async fn most_recent_appellation<C: ConnectionTrait>(
    conn: &C,
    author_id: Uuid,
) -> Result<Option<Appellation>> {
    Ok(most_recent_appellations(conn, author_id).await?.into_iter().next())
}

/// Single current affiliation; same tie-break as
/// [`most_recent_appellation`].
pub async fn most_recent_affiliation<C: ConnectionTrait>(
    conn: &C,
    author_id: Uuid,
) -> Result<Option<Affiliation>> {
    Ok(most_recent_affiliations(conn, author_id).await?.into_iter().next())
}

/// Flag whether an authorship's asserted appellation/affiliations have
/// drifted out of the author's current most-recent sets.
pub async fn authorship_is_outdated<C: ConnectionTrait>(
    conn: &C,
    authorship: &Authorship,
) -> Result<OutdatedFlags> {
    let current_appellations: HashSet<Uuid> =
        most_recent_appellations(conn, authorship.author_id)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
    let current_affiliations: HashSet<Uuid> =
        most_recent_affiliations(conn, authorship.author_id)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();

    let asserted_affiliations: Vec<Uuid> = AuthorshipAffiliationEntity::find()
        .filter(AuthorshipAffiliationColumn::AuthorshipId.eq(authorship.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|link| link.affiliation_id)
        .collect();

    Ok(OutdatedFlags {
        appellation: !current_appellations.contains(&authorship.appellation_id),
        affiliations: asserted_affiliations
            .iter()
            .any(|id| !current_affiliations.contains(id)),
    })
}
