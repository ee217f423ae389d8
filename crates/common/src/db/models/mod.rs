//! SeaORM entity models
//!
//! Database entities for the Colloquia store

mod affiliation;
mod appellation;
mod author;
mod authorship;
mod authorship_affiliation;
mod conference;
mod conference_host;
mod conference_organizer;
mod conference_series;
mod country;
mod country_label;
mod discipline;
mod import_attempt;
mod import_message;
mod institution;
mod keyword;
mod language;
mod license;
mod organizer;
mod redirect;
mod series_membership;
mod topic;
mod work;
mod work_discipline;
mod work_keyword;
mod work_language;
mod work_topic;
mod work_type;

pub use affiliation::{
    ActiveModel as AffiliationActiveModel, Column as AffiliationColumn,
    Entity as AffiliationEntity, Model as Affiliation,
};

pub use appellation::{
    ActiveModel as AppellationActiveModel, Column as AppellationColumn,
    Entity as AppellationEntity, Model as Appellation,
};

pub use author::{
    ActiveModel as AuthorActiveModel, Column as AuthorColumn, Entity as AuthorEntity,
    Model as Author,
};

pub use authorship::{
    ActiveModel as AuthorshipActiveModel, Column as AuthorshipColumn,
    Entity as AuthorshipEntity, Model as Authorship,
};

pub use authorship_affiliation::{
    ActiveModel as AuthorshipAffiliationActiveModel, Column as AuthorshipAffiliationColumn,
    Entity as AuthorshipAffiliationEntity, Model as AuthorshipAffiliation,
};

pub use conference::{
    ActiveModel as ConferenceActiveModel, Column as ConferenceColumn,
    Entity as ConferenceEntity, Model as Conference,
};

pub use conference_host::{
    ActiveModel as ConferenceHostActiveModel, Column as ConferenceHostColumn,
    Entity as ConferenceHostEntity, Model as ConferenceHost,
};

pub use conference_organizer::{
    ActiveModel as ConferenceOrganizerActiveModel, Column as ConferenceOrganizerColumn,
    Entity as ConferenceOrganizerEntity, Model as ConferenceOrganizer,
};

pub use conference_series::{
    ActiveModel as ConferenceSeriesActiveModel, Column as ConferenceSeriesColumn,
    Entity as ConferenceSeriesEntity, Model as ConferenceSeries,
};

pub use country::{
    ActiveModel as CountryActiveModel, Column as CountryColumn, Entity as CountryEntity,
    Model as Country,
};

pub use country_label::{
    ActiveModel as CountryLabelActiveModel, Column as CountryLabelColumn,
    Entity as CountryLabelEntity, Model as CountryLabel,
};

pub use discipline::{
    ActiveModel as DisciplineActiveModel, Column as DisciplineColumn,
    Entity as DisciplineEntity, Model as Discipline,
};

pub use import_attempt::{
    ActiveModel as ImportAttemptActiveModel, Column as ImportAttemptColumn,
    Entity as ImportAttemptEntity, Model as ImportAttempt,
};

pub use import_message::{
    ActiveModel as ImportMessageActiveModel, Column as ImportMessageColumn,
    Entity as ImportMessageEntity, Model as ImportMessage, ProvenanceKind,
};

pub use institution::{
    ActiveModel as InstitutionActiveModel, Column as InstitutionColumn,
    Entity as InstitutionEntity, Model as Institution,
};

pub use keyword::{
    ActiveModel as KeywordActiveModel, Column as KeywordColumn, Entity as KeywordEntity,
    Model as Keyword,
};

pub use language::{
    ActiveModel as LanguageActiveModel, Column as LanguageColumn, Entity as LanguageEntity,
    Model as Language,
};

pub use license::{
    ActiveModel as LicenseActiveModel, Column as LicenseColumn, Entity as LicenseEntity,
    Model as License,
};

pub use organizer::{
    ActiveModel as OrganizerActiveModel, Column as OrganizerColumn, Entity as OrganizerEntity,
    Model as Organizer,
};

pub use redirect::{
    ActiveModel as RedirectActiveModel, Column as RedirectColumn, Entity as RedirectEntity,
    Model as Redirect,
};

pub use series_membership::{
    ActiveModel as SeriesMembershipActiveModel, Column as SeriesMembershipColumn,
    Entity as SeriesMembershipEntity, Model as SeriesMembership,
};

pub use topic::{
    ActiveModel as TopicActiveModel, Column as TopicColumn, Entity as TopicEntity,
    Model as Topic,
};

pub use work::{
    ActiveModel as WorkActiveModel, Column as WorkColumn, Entity as WorkEntity, Model as Work,
    TextFormat,
};

pub use work_discipline::{
    ActiveModel as WorkDisciplineActiveModel, Column as WorkDisciplineColumn,
    Entity as WorkDisciplineEntity, Model as WorkDiscipline,
};

pub use work_keyword::{
    ActiveModel as WorkKeywordActiveModel, Column as WorkKeywordColumn,
    Entity as WorkKeywordEntity, Model as WorkKeyword,
};

pub use work_language::{
    ActiveModel as WorkLanguageActiveModel, Column as WorkLanguageColumn,
    Entity as WorkLanguageEntity, Model as WorkLanguage,
};

pub use work_topic::{
    ActiveModel as WorkTopicActiveModel, Column as WorkTopicColumn, Entity as WorkTopicEntity,
    Model as WorkTopic,
};

pub use work_type::{
    ActiveModel as WorkTypeActiveModel, Column as WorkTypeColumn, Entity as WorkTypeEntity,
    Model as WorkType,
};
