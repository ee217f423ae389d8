//! Vocabulary term merges
//!
//! The five controlled vocabularies (Keyword, Topic, Language,
//! Discipline, WorkType) share one merge shape but are semantically
//! distinct and must never merge across kinds. Each kind implements
//! [`VocabularyTerm`] for its own entity type, so `merge_terms` can only
//! ever fold a keyword into a keyword, a topic into a topic, and so on —
//! a cross-kind merge does not type-check.

use crate::db::models::*;
use crate::errors::{AppError, Result};
use crate::merge::MergeOutcome;
use async_trait::async_trait;
use metrics::counter;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

/// One controlled-vocabulary kind.
#[async_trait]
pub trait VocabularyTerm: Sized + Send + Sync + 'static {
    /// Kind name used in errors, logs, and metrics labels.
    const KIND: &'static str;

    async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Option<Self>>;

    fn title(&self) -> &str;

    /// Re-point every Work relation from `source` to `target`, without
    /// creating duplicate relations. Returns the number of Works
    /// actually re-pointed.
    async fn reassign_works(txn: &DatabaseTransaction, source: Uuid, target: Uuid) -> Result<u64>;

    async fn delete(txn: &DatabaseTransaction, id: Uuid) -> Result<()>;
}

/// Merge one vocabulary term into another of the same kind.
///
/// `updated` counts Works whose relation moved to the target; Works that
/// already carried the target keep a single relation (set union).
pub async fn merge_terms<T: VocabularyTerm>(
    db: &DatabaseConnection,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<MergeOutcome> {
    if source_id == target_id {
        return Err(AppError::SelfMerge { entity_kind: T::KIND });
    }
    let source = T::find(db, source_id)
        .await?
        .ok_or_else(|| AppError::not_found(T::KIND, source_id))?;
    let target = T::find(db, target_id)
        .await?
        .ok_or_else(|| AppError::not_found(T::KIND, target_id))?;

    let updated = db
        .transaction::<_, u64, AppError>(move |txn| {
            Box::pin(async move {
                let updated = T::reassign_works(txn, source_id, target_id).await?;
                T::delete(txn, source_id).await?;
                Ok(updated)
            })
        })
        .await
        .map_err(AppError::from)?;

    info!(
        kind = T::KIND,
        source = source.title(),
        target = target.title(),
        updated,
        "Merged vocabulary term"
    );
    counter!("colloquia_merges_total", "kind" => T::KIND).increment(1);

    Ok(MergeOutcome { updated })
}

#[async_trait]
impl VocabularyTerm for Keyword {
    const KIND: &'static str = "keyword";

    async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Option<Self>> {
        KeywordEntity::find_by_id(id).one(db).await.map_err(Into::into)
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn reassign_works(txn: &DatabaseTransaction, source: Uuid, target: Uuid) -> Result<u64> {
        let target_work_ids: Vec<Uuid> = WorkKeywordEntity::find()
            .filter(WorkKeywordColumn::KeywordId.eq(target))
            .all(txn)
            .await?
            .into_iter()
            .map(|row| row.work_id)
            .collect();

        let moved = WorkKeywordEntity::update_many()
            .col_expr(WorkKeywordColumn::KeywordId, Expr::value(target))
            .filter(WorkKeywordColumn::KeywordId.eq(source))
            .filter(WorkKeywordColumn::WorkId.is_not_in(target_work_ids))
            .exec(txn)
            .await?
            .rows_affected;

        // Rows on works already tagged with the target would be duplicates.
        WorkKeywordEntity::delete_many()
            .filter(WorkKeywordColumn::KeywordId.eq(source))
            .exec(txn)
            .await?;

        Ok(moved)
    }

    async fn delete(txn: &DatabaseTransaction, id: Uuid) -> Result<()> {
        KeywordEntity::delete_by_id(id).exec(txn).await?;
        Ok(())
    }
}

#[async_trait]
impl VocabularyTerm for Topic {
    const KIND: &'static str = "topic";

    async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Option<Self>> {
        TopicEntity::find_by_id(id).one(db).await.map_err(Into::into)
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn reassign_works(txn: &DatabaseTransaction, source: Uuid, target: Uuid) -> Result<u64> {
        let target_work_ids: Vec<Uuid> = WorkTopicEntity::find()
            .filter(WorkTopicColumn::TopicId.eq(target))
            .all(txn)
            .await?
            .into_iter()
            .map(|row| row.work_id)
            .collect();

        let moved = WorkTopicEntity::update_many()
            .col_expr(WorkTopicColumn::TopicId, Expr::value(target))
            .filter(WorkTopicColumn::TopicId.eq(source))
            .filter(WorkTopicColumn::WorkId.is_not_in(target_work_ids))
            .exec(txn)
            .await?
            .rows_affected;

        WorkTopicEntity::delete_many()
            .filter(WorkTopicColumn::TopicId.eq(source))
            .exec(txn)
            .await?;

        Ok(moved)
    }

    async fn delete(txn: &DatabaseTransaction, id: Uuid) -> Result<()> {
        TopicEntity::delete_by_id(id).exec(txn).await?;
        Ok(())
    }
}

#[async_trait]
impl VocabularyTerm for Language {
    const KIND: &'static str = "language";

    async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Option<Self>> {
        LanguageEntity::find_by_id(id).one(db).await.map_err(Into::into)
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn reassign_works(txn: &DatabaseTransaction, source: Uuid, target: Uuid) -> Result<u64> {
        let target_work_ids: Vec<Uuid> = WorkLanguageEntity::find()
            .filter(WorkLanguageColumn::LanguageId.eq(target))
            .all(txn)
            .await?
            .into_iter()
            .map(|row| row.work_id)
            .collect();

        let moved = WorkLanguageEntity::update_many()
            .col_expr(WorkLanguageColumn::LanguageId, Expr::value(target))
            .filter(WorkLanguageColumn::LanguageId.eq(source))
            .filter(WorkLanguageColumn::WorkId.is_not_in(target_work_ids))
            .exec(txn)
            .await?
            .rows_affected;

        WorkLanguageEntity::delete_many()
            .filter(WorkLanguageColumn::LanguageId.eq(source))
            .exec(txn)
            .await?;

        Ok(moved)
    }

    async fn delete(txn: &DatabaseTransaction, id: Uuid) -> Result<()> {
        LanguageEntity::delete_by_id(id).exec(txn).await?;
        Ok(())
    }
}

#[async_trait]
impl VocabularyTerm for Discipline {
    const KIND: &'static str = "discipline";

    async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Option<Self>> {
        DisciplineEntity::find_by_id(id).one(db).await.map_err(Into::into)
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn reassign_works(txn: &DatabaseTransaction, source: Uuid, target: Uuid) -> Result<u64> {
        let target_work_ids: Vec<Uuid> = WorkDisciplineEntity::find()
            .filter(WorkDisciplineColumn::DisciplineId.eq(target))
            .all(txn)
            .await?
            .into_iter()
            .map(|row| row.work_id)
            .collect();

        let moved = WorkDisciplineEntity::update_many()
            .col_expr(WorkDisciplineColumn::DisciplineId, Expr::value(target))
            .filter(WorkDisciplineColumn::DisciplineId.eq(source))
            .filter(WorkDisciplineColumn::WorkId.is_not_in(target_work_ids))
            .exec(txn)
            .await?
            .rows_affected;

        WorkDisciplineEntity::delete_many()
            .filter(WorkDisciplineColumn::DisciplineId.eq(source))
            .exec(txn)
            .await?;

        Ok(moved)
    }

    async fn delete(txn: &DatabaseTransaction, id: Uuid) -> Result<()> {
        DisciplineEntity::delete_by_id(id).exec(txn).await?;
        Ok(())
    }
}

#[async_trait]
impl VocabularyTerm for WorkType {
    const KIND: &'static str = "work_type";

    async fn find(db: &DatabaseConnection, id: Uuid) -> Result<Option<Self>> {
        WorkTypeEntity::find_by_id(id).one(db).await.map_err(Into::into)
    }

    fn title(&self) -> &str {
        &self.title
    }

    async fn reassign_works(txn: &DatabaseTransaction, source: Uuid, target: Uuid) -> Result<u64> {
        // Work type is a nullable single-valued reference; re-pointing
        // cannot collide.
        let moved = WorkEntity::update_many()
            .col_expr(WorkColumn::WorkTypeId, Expr::value(target))
            .filter(WorkColumn::WorkTypeId.eq(source))
            .exec(txn)
            .await?
            .rows_affected;
        Ok(moved)
    }

    async fn delete(txn: &DatabaseTransaction, id: Uuid) -> Result<()> {
        WorkTypeEntity::delete_by_id(id).exec(txn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support as fx;

    #[tokio::test]
    async fn test_self_merge_rejected_before_mutation() {
        let conn = fx::memory_store().await;
        let keyword = fx::keyword(&conn, "maps").await;

        let err = merge_terms::<Keyword>(&conn, keyword.id, keyword.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SelfMerge { entity_kind: "keyword" }));

        // Store unchanged: the keyword still exists.
        assert!(KeywordEntity::find_by_id(keyword.id).one(&conn).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_target_rejected() {
        let conn = fx::memory_store().await;
        let keyword = fx::keyword(&conn, "maps").await;

        let err = merge_terms::<Keyword>(&conn, keyword.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_keyword_merge_is_set_union() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2018", 2018).await;
        let work_a = fx::work(&conn, conference.id, "A").await;
        let work_b = fx::work(&conn, conference.id, "B").await;
        let work_c = fx::work(&conn, conference.id, "C").await;

        let source = fx::keyword(&conn, "digital-humanities").await;
        let target = fx::keyword(&conn, "Digital Humanities").await;

        // A: source only. B: both. C: target only.
        fx::tag_keyword(&conn, work_a.id, source.id).await;
        fx::tag_keyword(&conn, work_b.id, source.id).await;
        fx::tag_keyword(&conn, work_b.id, target.id).await;
        fx::tag_keyword(&conn, work_c.id, target.id).await;

        let outcome = merge_terms::<Keyword>(&conn, source.id, target.id).await.unwrap();
        assert_eq!(outcome.updated, 1); // only work A moved

        assert!(KeywordEntity::find_by_id(source.id).one(&conn).await.unwrap().is_none());

        let rows = WorkKeywordEntity::find()
            .filter(WorkKeywordColumn::KeywordId.eq(target.id))
            .all(&conn)
            .await
            .unwrap();
        let mut works: Vec<Uuid> = rows.iter().map(|r| r.work_id).collect();
        works.sort();
        let mut expected = vec![work_a.id, work_b.id, work_c.id];
        expected.sort();
        assert_eq!(works, expected);

        // No dangling rows for the deleted keyword.
        let dangling = WorkKeywordEntity::find()
            .filter(WorkKeywordColumn::KeywordId.eq(source.id))
            .all(&conn)
            .await
            .unwrap();
        assert!(dangling.is_empty());
    }

    #[tokio::test]
    async fn test_work_type_merge_repoints_fk() {
        let conn = fx::memory_store().await;
        let conference = fx::conference(&conn, "DH2018", 2018).await;

        let (poster, _) =
            crate::db::repository::get_or_create_work_type(&conn, "Poster").await.unwrap();
        let (posters, _) =
            crate::db::repository::get_or_create_work_type(&conn, "Posters").await.unwrap();

        let (work, _) = crate::db::repository::get_or_create_work(
            &conn,
            conference.id,
            "Typed Work",
            Some(posters.id),
            "",
            TextFormat::Plain,
        )
        .await
        .unwrap();

        let outcome = merge_terms::<WorkType>(&conn, posters.id, poster.id).await.unwrap();
        assert_eq!(outcome.updated, 1);

        let reloaded = WorkEntity::find_by_id(work.id).one(&conn).await.unwrap().unwrap();
        assert_eq!(reloaded.work_type_id, Some(poster.id));
        assert!(WorkTypeEntity::find_by_id(posters.id).one(&conn).await.unwrap().is_none());
    }
}
