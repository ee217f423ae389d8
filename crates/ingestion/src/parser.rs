//! TEI document parser
//!
//! Extracts the bibliographic shape the import pipeline needs from one
//! per-work TEI document: title-statement title fragments, the language
//! attribute on the body node, the classification node family (work
//! type category/subcategory, keyword and topic term lists), and the
//! repeating author blocks with their nested affiliations. The body is
//! kept as opaque XML text.
//!
//! A `teiCorpus` root is a multi-work container and is rejected; those
//! must be flattened externally before import.

use crate::errors::ImportError;
use colloquia_common::db::repository::collapse_whitespace;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One parsed per-work document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiDocument {
    pub title: String,
    pub language_code: String,
    pub work_type: Option<String>,
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub full_text: String,
    pub authors: Vec<TeiAuthor>,
}

/// One author block, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiAuthor {
    pub forename: String,
    pub surname: String,
    pub affiliations: Vec<TeiAffiliation>,
}

/// One affiliation block inside an author block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiAffiliation {
    /// Organization-name leaf tagged "main" (or untagged).
    pub organization: String,
    /// Organization-name leaf tagged "sub"; empty means "institution
    /// with no sub-unit".
    pub department: String,
    pub city: String,
    pub country: String,
}

fn name_of(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart, key: &str) -> Result<Option<String>, ImportError> {
    match e.try_get_attribute(key)? {
        Some(attr) => {
            let value = attr.unescape_value().map_err(|err| {
                ImportError::DocumentStructure(format!("bad attribute value: {}", err))
            })?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

/// Parse one TEI document into its bibliographic shape.
pub fn parse_document(xml: &str) -> Result<TeiDocument, ImportError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = TeiDocument::default();
    let mut title_parts: Vec<String> = Vec::new();
    let mut category: Option<String> = None;
    let mut subcategory: Option<String> = None;
    let mut path: Vec<String> = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = name_of(&e);
                if !saw_root {
                    saw_root = true;
                    if name == "teiCorpus" {
                        return Err(ImportError::MultiWorkContainer);
                    }
                    if name != "TEI" {
                        return Err(ImportError::DocumentStructure(format!(
                            "unexpected root element <{}>",
                            name
                        )));
                    }
                    path.push(name);
                    continue;
                }

                match name.as_str() {
                    "title" if path.last().map(String::as_str) == Some("titleStmt") => {
                        let text = reader.read_text(e.name())?;
                        let fragment = collapse_whitespace(&text);
                        if !fragment.is_empty() {
                            title_parts.push(fragment);
                        }
                    }
                    "author" if path.last().map(String::as_str) == Some("titleStmt") => {
                        doc.authors.push(parse_author(&mut reader)?);
                    }
                    "keywords" if path.last().map(String::as_str) == Some("textClass") => {
                        let n = attribute(&e, "n")?.unwrap_or_default();
                        let terms = parse_terms(&mut reader)?;
                        match n.as_str() {
                            "category" => category = terms.into_iter().next(),
                            "subcategory" => subcategory = terms.into_iter().next(),
                            "keywords" => doc.keywords = terms,
                            "topics" => doc.topics = terms,
                            _ => {}
                        }
                    }
                    "body" => {
                        if let Some(lang) = attribute(&e, "xml:lang")? {
                            doc.language_code = collapse_whitespace(&lang).to_lowercase();
                        }
                        doc.full_text = reader.read_text(e.name())?.into_owned();
                    }
                    _ => path.push(name),
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if path.last() == Some(&name) {
                    path.pop();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    doc.title = collapse_whitespace(&title_parts.join(" "));
    if doc.title.is_empty() {
        return Err(ImportError::MissingNode("titleStmt/title"));
    }
    if doc.language_code.is_empty() {
        return Err(ImportError::MissingNode("body/@xml:lang"));
    }
    // The subcategory is the more specific work type when both appear.
    doc.work_type = subcategory.or(category);

    Ok(doc)
}

/// Parse one author block: forename/surname leaves plus zero-or-more
/// affiliation blocks.
fn parse_author(reader: &mut Reader<&[u8]>) -> Result<TeiAuthor, ImportError> {
    let mut author = TeiAuthor::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match name_of(&e).as_str() {
                "forename" => {
                    let text = reader.read_text(e.name())?;
                    if !author.forename.is_empty() {
                        author.forename.push(' ');
                    }
                    author.forename.push_str(&collapse_whitespace(&text));
                }
                "surname" => {
                    let text = reader.read_text(e.name())?;
                    if !author.surname.is_empty() {
                        author.surname.push(' ');
                    }
                    author.surname.push_str(&collapse_whitespace(&text));
                }
                "affiliation" => {
                    author.affiliations.push(parse_affiliation(reader)?);
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"author" => break,
            Event::Eof => {
                return Err(ImportError::DocumentStructure(
                    "unterminated author block".to_string(),
                ))
            }
            _ => {}
        }
    }

    if author.forename.is_empty() && author.surname.is_empty() {
        return Err(ImportError::MissingNode("author/persName"));
    }

    Ok(author)
}

/// Parse one affiliation block: organization-name leaves tagged
/// main/sub plus a district/city leaf and an optional country leaf.
fn parse_affiliation(reader: &mut Reader<&[u8]>) -> Result<TeiAffiliation, ImportError> {
    let mut affiliation = TeiAffiliation::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match name_of(&e).as_str() {
                "orgName" => {
                    let kind = attribute(&e, "type")?.unwrap_or_default();
                    let text = collapse_whitespace(&reader.read_text(e.name())?);
                    if kind == "sub" {
                        affiliation.department = text;
                    } else if affiliation.organization.is_empty() {
                        affiliation.organization = text;
                    }
                }
                "settlement" | "district" => {
                    affiliation.city = collapse_whitespace(&reader.read_text(e.name())?);
                }
                "country" => {
                    affiliation.country = collapse_whitespace(&reader.read_text(e.name())?);
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"affiliation" => break,
            Event::Eof => {
                return Err(ImportError::DocumentStructure(
                    "unterminated affiliation block".to_string(),
                ))
            }
            _ => {}
        }
    }

    Ok(affiliation)
}

/// Collect the term leaves of one keywords node.
fn parse_terms(reader: &mut Reader<&[u8]>) -> Result<Vec<String>, ImportError> {
    let mut terms = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"term" => {
                let text = collapse_whitespace(&reader.read_text(e.name())?);
                if !text.is_empty() {
                    terms.push(text);
                }
            }
            Event::Text(t) => {
                let raw = t.unescape().map_err(|err| {
                    ImportError::DocumentStructure(format!("bad text content: {}", err))
                })?;
                let text = collapse_whitespace(&raw);
                if !text.is_empty() {
                    terms.push(text);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"keywords" => break,
            Event::Eof => {
                return Err(ImportError::DocumentStructure(
                    "unterminated keywords block".to_string(),
                ))
            }
            _ => {}
        }
    }

    Ok(terms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc>
      <titleStmt>
        <title>Archival Practices</title>
        <title type="sub">in Latin American Collections</title>
        <author>
          <persName>
            <surname>X</surname>
            <forename>Maria Jose</forename>
          </persName>
          <affiliation>
            <orgName type="main">Universidad de los Andes</orgName>
            <orgName type="sub">Department of History</orgName>
            <settlement>Bogota</settlement>
            <country>Colombia</country>
          </affiliation>
        </author>
        <author>
          <persName>
            <surname>Smith</surname>
            <forename>John</forename>
          </persName>
        </author>
      </titleStmt>
    </fileDesc>
    <profileDesc>
      <textClass>
        <keywords n="category"><term>Paper</term></keywords>
        <keywords n="subcategory"><term>Long Paper</term></keywords>
        <keywords n="keywords"><term>archives; metadata</term></keywords>
        <keywords n="topics"><term>digital archiving</term><term>metadata standards</term></keywords>
      </textClass>
    </profileDesc>
  </teiHeader>
  <text>
    <body xml:lang="en"><p>The full text of the submission.</p></body>
  </text>
</TEI>"#;

    #[test]
    fn test_parse_full_document() {
        let doc = parse_document(SAMPLE).unwrap();

        assert_eq!(doc.title, "Archival Practices in Latin American Collections");
        assert_eq!(doc.language_code, "en");
        assert_eq!(doc.work_type.as_deref(), Some("Long Paper"));
        assert_eq!(doc.keywords, vec!["archives; metadata"]);
        assert_eq!(doc.topics, vec!["digital archiving", "metadata standards"]);
        assert!(doc.full_text.contains("The full text of the submission."));

        assert_eq!(doc.authors.len(), 2);
        let first = &doc.authors[0];
        assert_eq!(first.forename, "Maria Jose");
        assert_eq!(first.surname, "X");
        assert_eq!(first.affiliations.len(), 1);
        let affiliation = &first.affiliations[0];
        assert_eq!(affiliation.organization, "Universidad de los Andes");
        assert_eq!(affiliation.department, "Department of History");
        assert_eq!(affiliation.city, "Bogota");
        assert_eq!(affiliation.country, "Colombia");

        let second = &doc.authors[1];
        assert_eq!(second.forename, "John");
        assert!(second.affiliations.is_empty());
    }

    #[test]
    fn test_corpus_root_is_rejected() {
        let xml = r#"<teiCorpus xmlns="http://www.tei-c.org/ns/1.0"><TEI/></teiCorpus>"#;
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, ImportError::MultiWorkContainer));
    }

    #[test]
    fn test_unexpected_root_is_structural_error() {
        let err = parse_document("<html><body/></html>").unwrap_err();
        assert!(matches!(err, ImportError::DocumentStructure(_)));
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let xml = r#"<TEI><teiHeader><fileDesc><titleStmt></titleStmt></fileDesc></teiHeader>
            <text><body xml:lang="en">x</body></text></TEI>"#;
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, ImportError::MissingNode("titleStmt/title")));
    }

    #[test]
    fn test_missing_language_is_rejected() {
        let xml = r#"<TEI><teiHeader><fileDesc><titleStmt><title>T</title></titleStmt></fileDesc></teiHeader>
            <text><body>x</body></text></TEI>"#;
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, ImportError::MissingNode("body/@xml:lang")));
    }

    #[test]
    fn test_category_used_when_no_subcategory() {
        let xml = r#"<TEI><teiHeader><fileDesc><titleStmt><title>T</title></titleStmt></fileDesc>
            <profileDesc><textClass>
                <keywords n="category"><term>Poster</term></keywords>
            </textClass></profileDesc></teiHeader>
            <text><body xml:lang="fr">x</body></text></TEI>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.work_type.as_deref(), Some("Poster"));
        assert_eq!(doc.language_code, "fr");
    }
}
