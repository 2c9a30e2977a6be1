//! Pass 4: Export -- the objects inventory consumed by other projects and
//! the paragraph-ids dump consumed by drift-detection tooling.

use crate::ast::Kind;
use crate::error::IndexError;
use crate::kinds::behavior;
use crate::pass2_number::{paragraph_number, SectionNumbers};
use crate::registry::{DefinitionItem, Registry};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Search priority of items that should not show up in search results.
pub const PRIORITY_HIDDEN: i8 = -1;
pub const PRIORITY_DEFAULT: i8 = 1;

/// One entry of the cross-project object inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
    pub name: String,
    pub display_name: String,
    pub kind: Kind,
    pub document: String,
    pub anchor: String,
    pub priority: i8,
}

pub fn objects(
    registry: &Registry,
    numbers: &SectionNumbers,
) -> Result<Vec<ObjectEntry>, IndexError> {
    let mut result = Vec::with_capacity(registry.len());
    for kind in Kind::ALL {
        let b = behavior(kind);
        for item in registry.definitions(kind) {
            result.push(ObjectEntry {
                name: item.id.clone(),
                display_name: b.display_name(item, numbers)?,
                kind,
                document: item.document.clone(),
                anchor: b.anchor(item),
                priority: if b.include_in_search() {
                    PRIORITY_DEFAULT
                } else {
                    PRIORITY_HIDDEN
                },
            });
        }
    }
    Ok(result)
}

/// Serialize the documents → sections → paragraphs tree.
pub fn paragraph_ids(
    registry: &Registry,
    numbers: &SectionNumbers,
    link_suffix: &str,
) -> Result<Value, IndexError> {
    let mut by_section: BTreeMap<(&str, &str), Vec<&DefinitionItem>> = BTreeMap::new();
    for item in registry.definitions(Kind::Paragraph) {
        if let Some(info) = item.paragraph() {
            by_section
                .entry((item.document.as_str(), info.section_id.as_str()))
                .or_default()
                .push(item);
        }
    }

    let mut documents = Vec::new();
    for (name, record) in registry.documents() {
        let page = format!("{}{}", name, link_suffix);
        let mut sections = Vec::new();
        for section in &record.sections {
            let mut paragraphs: Vec<&DefinitionItem> = by_section
                .get(&(name.as_str(), section.id.as_str()))
                .cloned()
                .unwrap_or_default();
            paragraphs.sort_by_key(|p| p.paragraph().map(|i| i.sequence));

            let mut rendered = Vec::with_capacity(paragraphs.len());
            for p in paragraphs {
                // Filtered above: every item here carries paragraph info.
                let Some(info) = p.paragraph() else { continue };
                rendered.push(json!({
                    "id": p.id,
                    "number": paragraph_number(&p.document, info, numbers)?,
                    "link": format!("{}#{}", page, p.id),
                    "checksum": info.content_checksum,
                }));
            }

            sections.push(json!({
                "id": section.id,
                "number": numbers.get(name, &section.anchor).map(|n| n.to_string()),
                "title": section.title,
                "link": format!("{}{}", page, section.anchor),
                "paragraphs": rendered,
            }));
        }

        documents.push(json!({
            "title": record.title.clone().unwrap_or_else(|| name.clone()),
            "link": page,
            "sections": sections,
        }));
    }

    Ok(json!({ "documents": documents }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Document, Node, Section};
    use crate::pass1_collect::collect;
    use crate::pass2_number::SectionNumber;

    fn fixture() -> (Registry, SectionNumbers) {
        let doc = Document::new(
            "types",
            vec![Node::Section(Section {
                id: Some("fls_types".into()),
                title: "Types".into(),
                children: vec![
                    Node::paragraph(vec![
                        Node::definition(Kind::Paragraph, "fls_t1"),
                        Node::text("A "),
                        Node::definition(Kind::GlossaryTerm, "type"),
                        Node::text(" classifies values."),
                    ]),
                    Node::paragraph(vec![Node::definition(Kind::Paragraph, "fls_t2")]),
                ],
            })],
        );
        let mut registry = Registry::new();
        collect(&mut registry, &doc, "fls_").unwrap();
        let mut numbers = SectionNumbers::default();
        numbers.insert("types", "#fls_types", SectionNumber::from_ints(&[4]));
        (registry, numbers)
    }

    #[test]
    fn objects_hide_paragraphs_from_search() {
        let (registry, numbers) = fixture();
        let objs = objects(&registry, &numbers).unwrap();
        let para = objs.iter().find(|o| o.name == "fls_t1").unwrap();
        assert_eq!(para.priority, PRIORITY_HIDDEN);
        assert!(para.display_name.starts_with("4:1 "));
        let term = objs.iter().find(|o| o.name == "type").unwrap();
        assert_eq!(term.priority, PRIORITY_DEFAULT);
        assert_eq!(term.display_name, "type");
        assert_eq!(term.anchor, "term_type");
    }

    #[test]
    fn paragraph_ids_shape() {
        let (registry, numbers) = fixture();
        let dump = paragraph_ids(&registry, &numbers, ".html").unwrap();
        let doc = &dump["documents"][0];
        assert_eq!(doc["title"], "Types");
        assert_eq!(doc["link"], "types.html");
        let section = &doc["sections"][0];
        assert_eq!(section["number"], "4");
        assert_eq!(section["link"], "types.html#fls_types");
        let paragraphs = section["paragraphs"].as_array().unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[1]["number"], "4:2");
        assert_eq!(paragraphs[1]["link"], "types.html#fls_t2");
        assert_eq!(paragraphs[0]["checksum"].as_str().unwrap().len(), 64);
    }
}
