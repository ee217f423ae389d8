//! Author merge
//!
//! Reassigns authorships, emits a permanent redirect from the source's
//! public identity path, refreshes the target's cached name projection,
//! and deletes the source.
//!
//! Known edge case, preserved deliberately: when source and target both
//! hold an authorship on the same Work, the source's competing
//! authorship is dropped with the source rather than escalated to an
//! error — (author, work) is unique and blocking the merge on it would
//! stop otherwise-desirable consolidation. Editors are expected to
//! review before merging.

use crate::db::models::*;
use crate::db::repository::recompute_appellations_index;
use crate::errors::{AppError, Result};
use crate::merge::MergeOutcome;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Fold one Author into another. `updated` counts authorships
/// re-assigned to the target; dropped competing authorships are not
/// counted.
pub async fn merge_authors(
    db: &DatabaseConnection,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<MergeOutcome> {
    if source_id == target_id {
        return Err(AppError::SelfMerge { entity_kind: "author" });
    }
    let source = AuthorEntity::find_by_id(source_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("author", source_id))?;
    let target = AuthorEntity::find_by_id(target_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("author", target_id))?;

    let old_path = source.public_path();
    let new_path = target.public_path();

    let (updated, dropped) = db
        .transaction::<_, (u64, u64), AppError>(move |txn| {
            Box::pin(async move {
                let target_work_ids: HashSet<Uuid> = AuthorshipEntity::find()
                    .filter(AuthorshipColumn::AuthorId.eq(target_id))
                    .all(txn)
                    .await?
                    .into_iter()
                    .map(|a| a.work_id)
                    .collect();

                let source_authorships = AuthorshipEntity::find()
                    .filter(AuthorshipColumn::AuthorId.eq(source_id))
                    .all(txn)
                    .await?;

                let mut updated = 0u64;
                let mut dropped = 0u64;
                for authorship in source_authorships {
                    if target_work_ids.contains(&authorship.work_id) {
                        // Target already holds an authorship on this
                        // work; the source's competing assertion is lost
                        // with the source.
                        AuthorshipAffiliationEntity::delete_many()
                            .filter(
                                AuthorshipAffiliationColumn::AuthorshipId.eq(authorship.id),
                            )
                            .exec(txn)
                            .await?;
                        AuthorshipEntity::delete_by_id(authorship.id).exec(txn).await?;
                        dropped += 1;
                    } else {
                        let mut active: AuthorshipActiveModel = authorship.into();
                        active.author_id = Set(target_id);
                        active.updated_at = Set(chrono::Utc::now().into());
                        active.update(txn).await?;
                        updated += 1;
                    }
                }

                // Permanent redirect so external links to the source's
                // public identity keep resolving.
                RedirectActiveModel {
                    id: Set(Uuid::new_v4()),
                    old_path: Set(old_path),
                    new_path: Set(new_path),
                    created_at: Set(chrono::Utc::now().into()),
                }
                .insert(txn)
                .await?;

                recompute_appellations_index(txn, target_id).await?;

                AuthorEntity::delete_by_id(source_id).exec(txn).await?;

                Ok((updated, dropped))
            })
        })
        .await
        .map_err(AppError::from)?;

    if dropped > 0 {
        warn!(%source_id, %target_id, dropped, "Author merge dropped competing authorships");
    }
    info!(%source_id, %target_id, updated, "Merged authors");
    counter!("colloquia_merges_total", "kind" => "author").increment(1);

    Ok(MergeOutcome { updated })
}
