//! Schema bootstrap
//!
//! Creates every table from its entity definition, plus the composite
//! unique indexes the entity derive cannot express:
//! - appellations (first_name, last_name)
//! - institutions (name, country_id)
//! - affiliations (department, institution_id)
//! - authorships (work_id, author_id) and (work_id, authorship_order)
//!
//! Used by the in-memory SQLite test stores and by the import CLI's
//! `--init-schema` flag against a fresh store.

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, EntityTrait, Schema};

async fn create_table<C, E>(conn: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    conn.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Create all tables and composite unique indexes.
pub async fn create_schema<C: ConnectionTrait>(conn: &C) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    // Referenced entities first, join/leaf entities after.
    create_table(conn, &schema, CountryEntity).await?;
    create_table(conn, &schema, CountryLabelEntity).await?;
    create_table(conn, &schema, ConferenceSeriesEntity).await?;
    create_table(conn, &schema, ConferenceEntity).await?;
    create_table(conn, &schema, SeriesMembershipEntity).await?;
    create_table(conn, &schema, OrganizerEntity).await?;
    create_table(conn, &schema, ConferenceOrganizerEntity).await?;
    create_table(conn, &schema, InstitutionEntity).await?;
    create_table(conn, &schema, ConferenceHostEntity).await?;
    create_table(conn, &schema, AffiliationEntity).await?;
    create_table(conn, &schema, LicenseEntity).await?;
    create_table(conn, &schema, WorkTypeEntity).await?;
    create_table(conn, &schema, WorkEntity).await?;
    create_table(conn, &schema, AuthorEntity).await?;
    create_table(conn, &schema, AppellationEntity).await?;
    create_table(conn, &schema, AuthorshipEntity).await?;
    create_table(conn, &schema, AuthorshipAffiliationEntity).await?;
    create_table(conn, &schema, KeywordEntity).await?;
    create_table(conn, &schema, TopicEntity).await?;
    create_table(conn, &schema, LanguageEntity).await?;
    create_table(conn, &schema, DisciplineEntity).await?;
    create_table(conn, &schema, WorkKeywordEntity).await?;
    create_table(conn, &schema, WorkTopicEntity).await?;
    create_table(conn, &schema, WorkLanguageEntity).await?;
    create_table(conn, &schema, WorkDisciplineEntity).await?;
    create_table(conn, &schema, RedirectEntity).await?;
    create_table(conn, &schema, ImportAttemptEntity).await?;
    create_table(conn, &schema, ImportMessageEntity).await?;

    let indexes = [
        Index::create()
            .name("ux_appellations_first_last")
            .table(AppellationEntity)
            .col(AppellationColumn::FirstName)
            .col(AppellationColumn::LastName)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ux_institutions_name_country")
            .table(InstitutionEntity)
            .col(InstitutionColumn::Name)
            .col(InstitutionColumn::CountryId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ux_affiliations_department_institution")
            .table(AffiliationEntity)
            .col(AffiliationColumn::Department)
            .col(AffiliationColumn::InstitutionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ux_authorships_work_author")
            .table(AuthorshipEntity)
            .col(AuthorshipColumn::WorkId)
            .col(AuthorshipColumn::AuthorId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("ux_authorships_work_order")
            .table(AuthorshipEntity)
            .col(AuthorshipColumn::WorkId)
            .col(AuthorshipColumn::AuthorshipOrder)
            .unique()
            .if_not_exists()
            .to_owned(),
    ];

    for index in indexes {
        conn.execute(backend.build(&index)).await?;
    }

    Ok(())
}
