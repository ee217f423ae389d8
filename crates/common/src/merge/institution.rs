//! Institution merge
//!
//! The hard part is duplicate avoidance: (department, institution) is
//! unique, so moving a source affiliation under the target can collide
//! with an affiliation that already exists there. Collisions are
//! resolved by redirecting authorship references to the pre-existing
//! target affiliation and dropping the source one.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::merge::affiliation::merge_affiliations_in;
use crate::merge::MergeOutcome;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Fold one Institution into another, carrying its affiliations and any
/// conference hosting references along. `updated` counts affiliations
/// processed plus host rows re-pointed.
pub async fn merge_institutions(
    db: &DatabaseConnection,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<MergeOutcome> {
    if source_id == target_id {
        return Err(AppError::SelfMerge { entity_kind: "institution" });
    }
    InstitutionEntity::find_by_id(source_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("institution", source_id))?;
    InstitutionEntity::find_by_id(target_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("institution", target_id))?;

    let updated = db
        .transaction::<_, u64, AppError>(move |txn| {
            Box::pin(async move { merge_institutions_in(txn, source_id, target_id).await })
        })
        .await
        .map_err(AppError::from)?;

    info!(%source_id, %target_id, updated, "Merged institutions");
    counter!("colloquia_merges_total", "kind" => "institution").increment(1);

    Ok(MergeOutcome { updated })
}

/// Transaction-scoped body, shared with the Country merge.
pub(crate) async fn merge_institutions_in(
    txn: &DatabaseTransaction,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<u64> {
    let source_affiliations = AffiliationEntity::find()
        .filter(AffiliationColumn::InstitutionId.eq(source_id))
        .all(txn)
        .await?;

    let mut updated = 0u64;
    for affiliation in source_affiliations {
        let colliding = AffiliationEntity::find()
            .filter(AffiliationColumn::Department.eq(&affiliation.department))
            .filter(AffiliationColumn::InstitutionId.eq(target_id))
            .one(txn)
            .await?;

        match colliding {
            Some(target_affiliation) => {
                // Same department already exists under the target:
                // redirect every authorship reference there and drop the
                // source affiliation.
                merge_affiliations_in(txn, affiliation.id, target_affiliation.id).await?;
            }
            None => {
                let mut active: AffiliationActiveModel = affiliation.into();
                active.institution_id = Set(target_id);
                active.update(txn).await?;
            }
        }
        updated += 1;
    }

    // Conference hosting references follow the institution.
    let target_conferences: HashSet<Uuid> = ConferenceHostEntity::find()
        .filter(ConferenceHostColumn::InstitutionId.eq(target_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|host| host.conference_id)
        .collect();

    let source_hosts = ConferenceHostEntity::find()
        .filter(ConferenceHostColumn::InstitutionId.eq(source_id))
        .all(txn)
        .await?;
    for host in source_hosts {
        if target_conferences.contains(&host.conference_id) {
            ConferenceHostEntity::delete_by_id(host.id).exec(txn).await?;
        } else {
            let mut active: ConferenceHostActiveModel = host.into();
            active.institution_id = Set(target_id);
            active.update(txn).await?;
            updated += 1;
        }
    }

    InstitutionEntity::delete_by_id(source_id).exec(txn).await?;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support as fx;

    #[tokio::test]
    async fn test_self_merge_rejected() {
        let conn = fx::memory_store().await;
        let institution = fx::institution(&conn, "U").await;

        let err = merge_institutions(&conn, institution.id, institution.id).await.unwrap_err();
        assert!(matches!(err, AppError::SelfMerge { entity_kind: "institution" }));
    }

    #[tokio::test]
    async fn test_department_collision_folds_into_target_affiliation() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2014", 2014).await;
        let source = fx::institution(&conn, "Univ. of Somewhere").await;
        let target = fx::institution(&conn, "University of Somewhere").await;

        let source_history = fx::affiliation(&conn, "History", source.id).await;
        let target_history = fx::affiliation(&conn, "History", target.id).await;
        let source_classics = fx::affiliation(&conn, "Classics", source.id).await;

        let name = fx::appellation(&conn, "R", "S").await;
        let work = fx::work(&conn, conference.id, "W").await;
        let author = fx::author(&conn).await;
        let ship = fx::authorship(&conn, work.id, author.id, name.id, 1).await;
        fx::link_affiliation(&conn, ship.id, source_history.id).await;

        let outcome = merge_institutions(&conn, source.id, target.id).await.unwrap();
        assert_eq!(outcome.updated, 2); // two affiliations processed

        assert!(InstitutionEntity::find_by_id(source.id).one(&conn).await.unwrap().is_none());

        // Exactly one "History" affiliation survives, under the target.
        let history_rows = AffiliationEntity::find()
            .filter(AffiliationColumn::Department.eq("History"))
            .all(&conn)
            .await
            .unwrap();
        assert_eq!(history_rows.len(), 1);
        assert_eq!(history_rows[0].id, target_history.id);
        assert_eq!(history_rows[0].institution_id, target.id);

        // The authorship that referenced the source copy now references
        // the target's.
        let links = AuthorshipAffiliationEntity::find()
            .filter(AuthorshipAffiliationColumn::AuthorshipId.eq(ship.id))
            .all(&conn)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].affiliation_id, target_history.id);

        // The non-colliding department moved identity-preserved.
        let classics = AffiliationEntity::find_by_id(source_classics.id)
            .one(&conn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(classics.institution_id, target.id);
    }

    #[tokio::test]
    async fn test_conference_hosts_follow_the_merge() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2013", 2013).await;
        let source = fx::institution(&conn, "Host A").await;
        let target = fx::institution(&conn, "Host B").await;

        ConferenceHostActiveModel {
            id: Set(Uuid::new_v4()),
            conference_id: Set(conference.id),
            institution_id: Set(source.id),
        }
        .insert(&conn)
        .await
        .unwrap();

        merge_institutions(&conn, source.id, target.id).await.unwrap();

        let hosts = ConferenceHostEntity::find()
            .filter(ConferenceHostColumn::ConferenceId.eq(conference.id))
            .all(&conn)
            .await
            .unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].institution_id, target.id);
    }
}
