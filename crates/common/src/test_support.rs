//! Shared fixtures for store-backed tests.
//!
//! Everything here runs against a fresh in-memory SQLite store with the
//! full schema created. Panics are fine; this module only compiles for
//! tests.

use crate::db::models::*;
use crate::db::{repository, schema};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

/// Fresh in-memory store with the full schema.
pub async fn memory_store() -> DatabaseConnection {
    let conn = Database::connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    schema::create_schema(&conn).await.expect("create schema");
    conn
}

pub async fn conference(conn: &DatabaseConnection, short_title: &str, year: i32) -> Conference {
    let now = Utc::now();
    let model = Conference {
        id: Uuid::new_v4(),
        short_title: short_title.to_string(),
        theme_title: String::new(),
        year,
        start_date: None,
        end_date: None,
        city: String::new(),
        notes: String::new(),
        url: String::new(),
        search_text: String::new(),
        created_at: now.into(),
        updated_at: now.into(),
    };
    repository::save_conference(conn, model).await.expect("save conference")
}

pub async fn work(conn: &DatabaseConnection, conference_id: Uuid, title: &str) -> Work {
    let (work, _) = repository::get_or_create_work(
        conn,
        conference_id,
        title,
        None,
        "",
        TextFormat::Plain,
    )
    .await
    .expect("create work");
    work
}

pub async fn hidden_work(conn: &DatabaseConnection, conference_id: Uuid, title: &str) -> Work {
    let work = work(conn, conference_id, title).await;
    let mut active: WorkActiveModel = work.into();
    active.hidden = Set(true);
    active.update(conn).await.expect("hide work")
}

pub async fn author(conn: &DatabaseConnection) -> Author {
    repository::create_author(conn).await.expect("create author")
}

pub async fn appellation(conn: &DatabaseConnection, first: &str, last: &str) -> Appellation {
    let (appellation, _) = repository::get_or_create_appellation(conn, first, last)
        .await
        .expect("create appellation");
    appellation
}

pub async fn authorship(
    conn: &DatabaseConnection,
    work_id: Uuid,
    author_id: Uuid,
    appellation_id: Uuid,
    order: i32,
) -> Authorship {
    let (authorship, _) =
        repository::upsert_authorship(conn, work_id, author_id, appellation_id, order)
            .await
            .expect("create authorship");
    authorship
}

pub async fn country(conn: &DatabaseConnection, ref_name: &str) -> Country {
    let country = CountryActiveModel {
        id: Set(Uuid::new_v4()),
        ref_name: Set(ref_name.to_string()),
    }
    .insert(conn)
    .await
    .expect("create country");

    CountryLabelActiveModel {
        id: Set(Uuid::new_v4()),
        country_id: Set(country.id),
        name: Set(ref_name.to_string()),
        preferred: Set(true),
    }
    .insert(conn)
    .await
    .expect("create country label");

    country
}

pub async fn institution(conn: &DatabaseConnection, name: &str) -> Institution {
    repository::create_institution(conn, name, "", None)
        .await
        .expect("create institution")
}

pub async fn affiliation(
    conn: &DatabaseConnection,
    department: &str,
    institution_id: Uuid,
) -> Affiliation {
    let (affiliation, _) = repository::get_or_create_affiliation(conn, department, institution_id)
        .await
        .expect("create affiliation");
    affiliation
}

pub async fn link_affiliation(
    conn: &DatabaseConnection,
    authorship_id: Uuid,
    affiliation_id: Uuid,
) {
    repository::add_affiliation_to_authorship(conn, authorship_id, affiliation_id)
        .await
        .expect("link affiliation");
}

pub async fn keyword(conn: &DatabaseConnection, title: &str) -> Keyword {
    let (keyword, _) = repository::get_or_create_keyword(conn, title)
        .await
        .expect("create keyword");
    keyword
}

pub async fn tag_keyword(conn: &DatabaseConnection, work_id: Uuid, keyword_id: Uuid) {
    repository::add_keyword_to_work(conn, work_id, keyword_id)
        .await
        .expect("tag keyword");
}
