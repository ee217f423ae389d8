//! End-to-end import pipeline tests against an in-memory store.

use chrono::Utc;
use colloquia_common::config::ImportConfig;
use colloquia_common::db::models::*;
use colloquia_common::db::repository::{create_institution, save_conference};
use colloquia_common::db::schema::create_schema;
use colloquia_ingestion::{ImportError, Importer};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use std::path::PathBuf;
use uuid::Uuid;

const ARCHIVAL_PRACTICES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt>
        <title>Archival Practices</title>
        <author>
          <persName>
            <surname>X</surname>
            <forename>Maria Jose</forename>
          </persName>
          <affiliation>
            <orgName type="main">Universidad de los Andes</orgName>
            <settlement>Bogota</settlement>
            <country>Colombia</country>
          </affiliation>
        </author>
      </titleStmt>
    </fileDesc>
    <profileDesc>
      <textClass>
        <keywords n="category"><term>Paper</term></keywords>
        <keywords n="keywords"><term>archives; community memory</term></keywords>
      </textClass>
    </profileDesc>
  </teiHeader>
  <text>
    <body xml:lang="en"><p>Full text.</p></body>
  </text>
</TEI>"#;

const CORPUS_CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<teiCorpus xmlns="http://www.tei-c.org/ns/1.0">
  <TEI><teiHeader/></TEI>
  <TEI><teiHeader/></TEI>
</teiCorpus>"#;

async fn store() -> DatabaseConnection {
    let conn = Database::connect("sqlite::memory:").await.expect("connect");
    create_schema(&conn).await.expect("schema");
    conn
}

async fn seed_conference(conn: &DatabaseConnection, short_title: &str, year: i32) -> Conference {
    let now = Utc::now();
    save_conference(
        conn,
        Conference {
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
        },
    )
    .await
    .expect("seed conference")
}

async fn seed_language(conn: &DatabaseConnection, title: &str, code: &str) {
    LanguageActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        code: Set(code.to_string()),
    }
    .insert(conn)
    .await
    .expect("seed language");
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("colloquia-import-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn write_doc(dir: &PathBuf, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write doc");
    path
}

#[tokio::test]
async fn import_resolves_entities_and_logs_provenance() {
    let conn = store().await;
    let conference = seed_conference(&conn, "DH2019", 2019).await;
    seed_language(&conn, "English", "en").await;

    // The institution already exists; import must match it, not create
    // a duplicate.
    let existing = create_institution(&conn, "Universidad de los Andes", "Bogota", None)
        .await
        .expect("seed institution");

    let dir = scratch_dir();
    let path = write_doc(&dir, "archival_practices.xml", ARCHIVAL_PRACTICES);

    let importer = Importer::new(conn.clone(), ImportConfig::default());
    let imported = importer.import_document(&path, conference.id).await.expect("import");

    assert!(imported.work_created);
    assert_eq!(imported.work.title, "Archival Practices");
    assert_eq!(imported.work.conference_id, conference.id);
    assert_eq!(imported.authorships, 1);

    // Appellation ("Maria Jose", "X") exists.
    let appellation = AppellationEntity::find()
        .filter(AppellationColumn::FirstName.eq("Maria Jose"))
        .filter(AppellationColumn::LastName.eq("X"))
        .one(&conn)
        .await
        .unwrap()
        .expect("appellation");

    // Authorship order 1, linked to that appellation.
    let authorship = AuthorshipEntity::find()
        .filter(AuthorshipColumn::WorkId.eq(imported.work.id))
        .one(&conn)
        .await
        .unwrap()
        .expect("authorship");
    assert_eq!(authorship.authorship_order, 1);
    assert_eq!(authorship.appellation_id, appellation.id);

    // The affiliation links to the pre-existing institution.
    let links = AuthorshipAffiliationEntity::find()
        .filter(AuthorshipAffiliationColumn::AuthorshipId.eq(authorship.id))
        .all(&conn)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    let affiliation = AffiliationEntity::find_by_id(links[0].affiliation_id)
        .one(&conn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(affiliation.institution_id, existing.id);
    assert_eq!(
        InstitutionEntity::find().count(&conn).await.unwrap(),
        1,
        "no duplicate institution"
    );

    // Provenance shows the institution was matched, never created.
    let messages = ImportMessageEntity::find()
        .filter(ImportMessageColumn::AttemptId.eq(imported.attempt_id))
        .all(&conn)
        .await
        .unwrap();
    let institution_messages: Vec<_> = messages
        .iter()
        .filter(|m| m.message.contains("institution 'Universidad de los Andes'"))
        .collect();
    assert_eq!(institution_messages.len(), 1);
    assert_eq!(institution_messages[0].provenance_kind(), ProvenanceKind::Matched);

    // Keywords split, normalized, attached.
    let keywords = KeywordEntity::find().all(&conn).await.unwrap();
    let mut titles: Vec<&str> = keywords.iter().map(|k| k.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["archives", "community memory"]);

    // The author's cached name projection reflects the assertion.
    let author = AuthorEntity::find_by_id(authorship.author_id)
        .one(&conn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(author.appellations_index, "Maria Jose X");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn reimport_is_idempotent() {
    let conn = store().await;
    let conference = seed_conference(&conn, "DH2019", 2019).await;
    seed_language(&conn, "English", "en").await;

    let dir = scratch_dir();
    let path = write_doc(&dir, "doc.xml", ARCHIVAL_PRACTICES);

    let importer = Importer::new(conn.clone(), ImportConfig::default());
    let first = importer.import_document(&path, conference.id).await.expect("first import");
    let second = importer.import_document(&path, conference.id).await.expect("second import");

    assert!(first.work_created);
    assert!(!second.work_created);
    assert_eq!(first.work.id, second.work.id);

    assert_eq!(WorkEntity::find().count(&conn).await.unwrap(), 1);
    assert_eq!(AuthorEntity::find().count(&conn).await.unwrap(), 1);
    assert_eq!(AppellationEntity::find().count(&conn).await.unwrap(), 1);
    assert_eq!(AuthorshipEntity::find().count(&conn).await.unwrap(), 1);
    assert_eq!(InstitutionEntity::find().count(&conn).await.unwrap(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn second_document_reuses_author_via_appellation() {
    let conn = store().await;
    let conference = seed_conference(&conn, "DH2019", 2019).await;
    seed_language(&conn, "English", "en").await;

    let dir = scratch_dir();
    let first = write_doc(&dir, "a.xml", ARCHIVAL_PRACTICES);
    let second_doc = ARCHIVAL_PRACTICES.replace("Archival Practices", "A Second Paper");
    let second = write_doc(&dir, "b.xml", &second_doc);

    let importer = Importer::new(conn.clone(), ImportConfig::default());
    importer.import_document(&first, conference.id).await.expect("first");
    importer.import_document(&second, conference.id).await.expect("second");

    // Two works, one author identity found through the shared
    // appellation.
    assert_eq!(WorkEntity::find().count(&conn).await.unwrap(), 2);
    assert_eq!(AuthorEntity::find().count(&conn).await.unwrap(), 1);
    assert_eq!(AuthorshipEntity::find().count(&conn).await.unwrap(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn directory_import_isolates_failures() {
    let conn = store().await;
    let conference = seed_conference(&conn, "DH2019", 2019).await;
    seed_language(&conn, "English", "en").await;

    let dir = scratch_dir();
    write_doc(&dir, "good.xml", ARCHIVAL_PRACTICES);
    write_doc(&dir, "container.xml", CORPUS_CONTAINER);
    write_doc(&dir, "notes.txt", "not a document");

    let importer = Importer::new(conn.clone(), ImportConfig::default());
    let outcome = importer.import_directory(&dir, conference.id).await.expect("batch");

    assert_eq!(outcome.succeeded.len(), 1);
    assert!(outcome.succeeded[0].ends_with("good.xml"));
    assert_eq!(outcome.failed.len(), 1);
    assert!(outcome.failed[0].0.ends_with("container.xml"));
    assert!(matches!(outcome.failed[0].1, ImportError::MultiWorkContainer));

    // The valid document committed regardless of the other's failure.
    let work = WorkEntity::find()
        .filter(WorkColumn::Title.eq("Archival Practices"))
        .one(&conn)
        .await
        .unwrap();
    assert!(work.is_some());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn unregistered_language_fails_without_writes() {
    let conn = store().await;
    let conference = seed_conference(&conn, "DH2019", 2019).await;
    // No "en" language registered.

    let dir = scratch_dir();
    let path = write_doc(&dir, "doc.xml", ARCHIVAL_PRACTICES);

    let importer = Importer::new(conn.clone(), ImportConfig::default());
    let err = importer.import_document(&path, conference.id).await.unwrap_err();
    assert!(matches!(err, ImportError::UnknownLanguage(ref code) if code == "en"));

    assert_eq!(WorkEntity::find().count(&conn).await.unwrap(), 0);
    assert_eq!(ImportAttemptEntity::find().count(&conn).await.unwrap(), 0);

    std::fs::remove_dir_all(&dir).ok();
}
