//! Country merge
//!
//! Institutions are unique as (name, country), so moving an institution
//! under the target country can collide with a same-named institution
//! already there; those collide into a full institution merge inside the
//! same transaction.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::merge::institution::merge_institutions_in;
use crate::merge::MergeOutcome;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

/// Fold one Country into another. `updated` counts institutions moved
/// or folded plus labels re-pointed.
pub async fn merge_countries(
    db: &DatabaseConnection,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<MergeOutcome> {
    if source_id == target_id {
        return Err(AppError::SelfMerge { entity_kind: "country" });
    }
    CountryEntity::find_by_id(source_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("country", source_id))?;
    CountryEntity::find_by_id(target_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("country", target_id))?;

    let updated = db
        .transaction::<_, u64, AppError>(move |txn| {
            Box::pin(async move {
                let mut updated = 0u64;

                let source_institutions = InstitutionEntity::find()
                    .filter(InstitutionColumn::CountryId.eq(source_id))
                    .all(txn)
                    .await?;

                for institution in source_institutions {
                    let colliding = InstitutionEntity::find()
                        .filter(InstitutionColumn::Name.eq(&institution.name))
                        .filter(InstitutionColumn::CountryId.eq(target_id))
                        .one(txn)
                        .await?;

                    match colliding {
                        Some(target_institution) => {
                            merge_institutions_in(txn, institution.id, target_institution.id)
                                .await?;
                        }
                        None => {
                            let mut active: InstitutionActiveModel = institution.into();
                            active.country_id = Set(Some(target_id));
                            active.update(txn).await?;
                        }
                    }
                    updated += 1;
                }

                // Labels are provenance; they move with the country. The
                // target keeps its own preferred label.
                let target_has_preferred = CountryLabelEntity::find()
                    .filter(CountryLabelColumn::CountryId.eq(target_id))
                    .filter(CountryLabelColumn::Preferred.eq(true))
                    .one(txn)
                    .await?
                    .is_some();

                let source_labels = CountryLabelEntity::find()
                    .filter(CountryLabelColumn::CountryId.eq(source_id))
                    .all(txn)
                    .await?;
                for label in source_labels {
                    let mut active: CountryLabelActiveModel = label.into();
                    active.country_id = Set(target_id);
                    if target_has_preferred {
                        active.preferred = Set(false);
                    }
                    active.update(txn).await?;
                    updated += 1;
                }

                CountryEntity::delete_by_id(source_id).exec(txn).await?;

                Ok(updated)
            })
        })
        .await
        .map_err(AppError::from)?;

    info!(%source_id, %target_id, updated, "Merged countries");
    counter!("colloquia_merges_total", "kind" => "country").increment(1);

    Ok(MergeOutcome { updated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support as fx;

    #[tokio::test]
    async fn test_self_merge_rejected() {
        let conn = fx::memory_store().await;
        let country = fx::country(&conn, "Narnia").await;

        let err = merge_countries(&conn, country.id, country.id).await.unwrap_err();
        assert!(matches!(err, AppError::SelfMerge { entity_kind: "country" }));
    }

    #[tokio::test]
    async fn test_institutions_and_labels_follow_the_merge() {
        let conn = fx::memory_store().await;
        let source = fx::country(&conn, "Holland").await;
        let target = fx::country(&conn, "Netherlands").await;

        let moved = InstitutionActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Leiden University".into()),
            city: Set("Leiden".into()),
            country_id: Set(Some(source.id)),
        }
        .insert(&conn)
        .await
        .unwrap();

        let outcome = merge_countries(&conn, source.id, target.id).await.unwrap();
        // One institution re-pointed plus one label moved.
        assert_eq!(outcome.updated, 2);

        assert!(CountryEntity::find_by_id(source.id).one(&conn).await.unwrap().is_none());

        let reloaded = InstitutionEntity::find_by_id(moved.id).one(&conn).await.unwrap().unwrap();
        assert_eq!(reloaded.country_id, Some(target.id));

        // Both labels now belong to the target; only its own stays
        // preferred.
        let labels = CountryLabelEntity::find()
            .filter(CountryLabelColumn::CountryId.eq(target.id))
            .all(&conn)
            .await
            .unwrap();
        assert_eq!(labels.len(), 2);
        let preferred: Vec<_> = labels.iter().filter(|l| l.preferred).collect();
        assert_eq!(preferred.len(), 1);
        assert_eq!(preferred[0].name, "Netherlands");
    }

    #[tokio::test]
    async fn test_same_named_institution_triggers_nested_merge() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2010", 2010).await;
        let source = fx::country(&conn, "UK").await;
        let target = fx::country(&conn, "United Kingdom").await;

        let source_inst = InstitutionActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("King's College London".into()),
            city: Set("London".into()),
            country_id: Set(Some(source.id)),
        }
        .insert(&conn)
        .await
        .unwrap();
        let target_inst = InstitutionActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("King's College London".into()),
            city: Set("London".into()),
            country_id: Set(Some(target.id)),
        }
        .insert(&conn)
        .await
        .unwrap();

        // An authorship asserting a department under the source copy.
        let department = fx::affiliation(&conn, "DDH", source_inst.id).await;
        let name = fx::appellation(&conn, "T", "U").await;
        let work = fx::work(&conn, conference.id, "W").await;
        let author = fx::author(&conn).await;
        let ship = fx::authorship(&conn, work.id, author.id, name.id, 1).await;
        fx::link_affiliation(&conn, ship.id, department.id).await;

        merge_countries(&conn, source.id, target.id).await.unwrap();

        // The source institution folded into the target's same-named one.
        assert!(InstitutionEntity::find_by_id(source_inst.id).one(&conn).await.unwrap().is_none());

        let departments = AffiliationEntity::find()
            .filter(AffiliationColumn::InstitutionId.eq(target_inst.id))
            .all(&conn)
            .await
            .unwrap();
        assert_eq!(departments.len(), 1);
        assert_eq!(departments[0].department, "DDH");

        let links = AuthorshipAffiliationEntity::find()
            .filter(AuthorshipAffiliationColumn::AuthorshipId.eq(ship.id))
            .all(&conn)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].affiliation_id, departments[0].id);
    }
}
