//! Affiliation merge

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::merge::MergeOutcome;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Fold one Affiliation into another.
///
/// Every Authorship asserting the source gets the target instead;
/// authorships already asserting the target just lose the redundant
/// source link. `updated` counts authorships actually re-pointed.
pub async fn merge_affiliations(
    db: &DatabaseConnection,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<MergeOutcome> {
    if source_id == target_id {
        return Err(AppError::SelfMerge { entity_kind: "affiliation" });
    }
    AffiliationEntity::find_by_id(source_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("affiliation", source_id))?;
    AffiliationEntity::find_by_id(target_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("affiliation", target_id))?;

    let updated = db
        .transaction::<_, u64, AppError>(move |txn| {
            Box::pin(async move { merge_affiliations_in(txn, source_id, target_id).await })
        })
        .await
        .map_err(AppError::from)?;

    info!(%source_id, %target_id, updated, "Merged affiliations");
    counter!("colloquia_merges_total", "kind" => "affiliation").increment(1);

    Ok(MergeOutcome { updated })
}

/// Transaction-scoped body, shared with the Institution merge.
pub(crate) async fn merge_affiliations_in(
    txn: &DatabaseTransaction,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<u64> {
    let target_authorships: HashSet<Uuid> = AuthorshipAffiliationEntity::find()
        .filter(AuthorshipAffiliationColumn::AffiliationId.eq(target_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|link| link.authorship_id)
        .collect();

    let source_links = AuthorshipAffiliationEntity::find()
        .filter(AuthorshipAffiliationColumn::AffiliationId.eq(source_id))
        .all(txn)
        .await?;

    let mut updated = 0u64;
    for link in source_links {
        if target_authorships.contains(&link.authorship_id) {
            // The authorship already asserts the target; the source link
            // would become a duplicate.
            AuthorshipAffiliationEntity::delete_by_id(link.id).exec(txn).await?;
        } else {
            let mut active: AuthorshipAffiliationActiveModel = link.into();
            active.affiliation_id = Set(target_id);
            active.update(txn).await?;
            updated += 1;
        }
    }

    AffiliationEntity::delete_by_id(source_id).exec(txn).await?;

    Ok(updated)
}
