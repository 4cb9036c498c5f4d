//! # NAF / KAF
//!
//! Documentos já processados por uma cadeia NLP: a camada `text` traz os `wf` (formas, com o
//! número da sentença em `sent`), a camada `terms` agrupa `wf`s em termos com lema e etiqueta
//! morfológica, e a camada `entities` aponta para termos:
//!
//! ```xml
//! <wf id="w1" sent="1">Barack</wf> <wf id="w2" sent="1">Obama</wf>
//! <term id="t1" lemma="Barack" morphofeat="NNP"><span><target id="w1"/></span></term>
//! <entity id="e1" type="PER">
//!   <references><span><target id="t1"/><target id="t2"/></span></references>
//!   <externalReferences><externalRef reference="http://dbpedia.org/resource/Barack_Obama"/></externalReferences>
//! </entity>
//! ```
//!
//! Cada termo vira um token (colunas `lema`, `morfologia`) e cada span de entidade uma anotação
//! rotulada pelo `type`. Os offsets são os do texto montado por [`super::lay_out`]. Os nomes de
//! atributo do KAF (`wid`, `tid`) também são aceitos.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{lay_out, parse_xml, Record};
use crate::annotation::RawAnnotation;
use crate::error::{ConvertError, Result};
use crate::tokenizer::RawToken;

/// Rótulo de entidades sem atributo `type`.
pub const DEFAULT_ENTITY_TYPE: &str = "MISC";

fn element_id<'a>(node: roxmltree::Node<'a, '_>, kaf_name: &str) -> Option<&'a str> {
    node.attribute("id").or_else(|| node.attribute(kaf_name))
}

/// Alvos (`target@id`) de um `span`.
fn span_targets<'a>(span: roxmltree::Node<'a, '_>) -> Vec<&'a str> {
    span.children()
        .filter(|n| n.has_tag_name("target"))
        .filter_map(|n| n.attribute("id"))
        .collect()
}

/// Lê um documento NAF como um registro pré-tokenizado.
pub fn read(xml: &str) -> Result<Record> {
    let document = parse_xml(xml)?;

    // wf id -> (forma, sentença)
    let mut forms: HashMap<&str, (&str, &str)> = HashMap::new();
    for wf in document.descendants().filter(|n| n.has_tag_name("wf")) {
        let id = element_id(wf, "wid").ok_or_else(|| ConvertError::format("NAF", "wf sem id"))?;
        let sent = wf
            .attribute("sent")
            .ok_or_else(|| ConvertError::format("NAF", format!("wf `{id}` sem atributo `sent`")))?;
        forms.insert(id, (wf.text().unwrap_or_default(), sent));
    }

    let mut sentences: Vec<(&str, Vec<RawToken>)> = Vec::new();
    // term id -> (sentença, token)
    let mut positions: HashMap<&str, (usize, usize)> = HashMap::new();

    for term in document.descendants().filter(|n| n.has_tag_name("term")) {
        let id = element_id(term, "tid").ok_or_else(|| ConvertError::format("NAF", "term sem id"))?;
        let targets = term
            .children()
            .find(|n| n.has_tag_name("span"))
            .map(span_targets)
            .unwrap_or_default();
        let mut words = Vec::with_capacity(targets.len());
        for target in &targets {
            let word = forms.get(target).ok_or_else(|| {
                ConvertError::format("NAF", format!("term `{id}` aponta para wf inexistente `{target}`"))
            })?;
            words.push(*word);
        }
        let Some(&(_, sent)) = words.first() else {
            warn!(term = id, "term sem wf ignorado");
            continue;
        };

        let form = words.iter().map(|(form, _)| *form).collect::<Vec<_>>().join(" ");
        let mut token = RawToken::new(form, 0, 0);
        token.columns = vec![
            term.attribute("lemma").unwrap_or(&token.form).to_string(),
            term.attribute("morphofeat").unwrap_or("O").to_string(),
        ];

        if sentences.last().map(|(current, _)| *current != sent).unwrap_or(true) {
            sentences.push((sent, Vec::new()));
        }
        let index = sentences.len() - 1;
        positions.insert(id, (index, sentences[index].1.len()));
        sentences[index].1.push(token);
    }

    let (text, laid) = lay_out(sentences.into_iter().map(|(_, tokens)| tokens).collect());
    let mut annotations = Vec::new();

    for entity in document.descendants().filter(|n| n.has_tag_name("entity")) {
        let label = entity.attribute("type").unwrap_or(DEFAULT_ENTITY_TYPE);
        for span in entity.descendants().filter(|n| n.has_tag_name("span")) {
            let targets = span_targets(span);
            let Some(terms) = targets
                .iter()
                .map(|t| positions.get(t).copied())
                .collect::<Option<Vec<_>>>()
            else {
                warn!(entity = ?element_id(entity, "eid"), ?targets, "entidade aponta para termo inexistente");
                continue;
            };
            let contiguous = terms
                .windows(2)
                .all(|pair| pair[1] == (pair[0].0, pair[0].1 + 1) || pair[1] == (pair[0].0 + 1, 0));
            let (Some(first), Some(last)) = (terms.first(), terms.last()) else {
                continue;
            };
            if !contiguous {
                warn!(entity = ?element_id(entity, "eid"), ?targets, "entidade descontínua ignorada");
                continue;
            }
            let from = laid[first.0].tokens[first.1].char_start;
            let to = laid[last.0].tokens[last.1].char_end();
            annotations.push(RawAnnotation::new(label, from, to));
        }
    }

    debug!(sentences = laid.len(), entities = annotations.len(), "NAF lido");
    let mut record = Record::tokenized(text, laid);
    record.id = document
        .descendants()
        .find(|n| n.has_tag_name("public"))
        .and_then(|n| n.attribute("publicId"))
        .map(str::to_string);
    record.annotations = annotations;
    Ok(record)
}

/// Primeira referência externa (link de desambiguação) de cada entidade que tenha uma.
pub fn links(xml: &str) -> Result<Vec<String>> {
    let document = parse_xml(xml)?;
    Ok(document
        .descendants()
        .filter(|n| n.has_tag_name("entity"))
        .filter_map(|entity| {
            entity
                .descendants()
                .find(|n| n.has_tag_name("externalRef"))
                .and_then(|n| n.attribute("reference"))
                .map(str::to_string)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NAF xml:lang="en" version="v3">
  <nafHeader><public publicId="obama-01"/></nafHeader>
  <text>
    <wf id="w1" sent="1" offset="0" length="6">Barack</wf>
    <wf id="w2" sent="1" offset="7" length="5">Obama</wf>
    <wf id="w3" sent="1" offset="13" length="7">visited</wf>
    <wf id="w4" sent="1" offset="21" length="3">New</wf>
    <wf id="w5" sent="1" offset="25" length="4">York</wf>
    <wf id="w6" sent="2" offset="30" length="2">He</wf>
    <wf id="w7" sent="2" offset="33" length="4">left</wf>
  </text>
  <terms>
    <term id="t1" lemma="Barack" morphofeat="NNP"><span><target id="w1"/></span></term>
    <term id="t2" lemma="Obama" morphofeat="NNP"><span><target id="w2"/></span></term>
    <term id="t3" lemma="visit" morphofeat="VBD"><span><target id="w3"/></span></term>
    <term id="t4" lemma="New York" morphofeat="NNP"><span><target id="w4"/><target id="w5"/></span></term>
    <term id="t5" lemma="he" morphofeat="PRP"><span><target id="w6"/></span></term>
    <term id="t6" lemma="leave" morphofeat="VBD"><span><target id="w7"/></span></term>
  </terms>
  <entities>
    <entity id="e1" type="PER">
      <references><span><target id="t1"/><target id="t2"/></span></references>
      <externalReferences>
        <externalRef resource="spotlight" reference="http://dbpedia.org/resource/Barack_Obama"/>
      </externalReferences>
    </entity>
    <entity id="e2" type="LOC">
      <references><span><target id="t4"/></span></references>
    </entity>
    <entity id="e3" type="ORG">
      <references><span><target id="t9"/></span></references>
    </entity>
    <entity id="e4" type="MISC">
      <references><span><target id="t1"/><target id="t3"/></span></references>
    </entity>
  </entities>
</NAF>"#;

    #[test]
    fn test_read_terms_and_entities() {
        let record = read(NAF).unwrap();
        assert_eq!(record.id.as_deref(), Some("obama-01"));
        assert_eq!(record.text, "Barack Obama visited New York\nHe left");

        let sentences = record.sentences.as_ref().unwrap();
        assert_eq!(sentences.len(), 2);
        let new_york = &sentences[0].tokens[3];
        assert_eq!(new_york.form, "New York");
        assert_eq!(new_york.columns, vec!["New York".to_string(), "NNP".to_string()]);

        // e3 aponta para termo inexistente, e4 é descontínua
        assert_eq!(
            record.annotations,
            vec![RawAnnotation::new("PER", 0, 12), RawAnnotation::new("LOC", 21, 29)]
        );
    }

    #[test]
    fn test_kaf_attribute_names() {
        let kaf = r#"<KAF><text><wf wid="w1" sent="1">Paris</wf></text>
            <terms><term tid="t1" lemma="Paris"><span><target id="w1"/></span></term></terms>
            <entities><entity eid="e1" type="LOC"><references><span><target id="t1"/></span></references></entity></entities>
        </KAF>"#;
        let record = read(kaf).unwrap();
        assert_eq!(record.text, "Paris");
        assert_eq!(record.annotations, vec![RawAnnotation::new("LOC", 0, 5)]);
        let token = &record.sentences.unwrap()[0].tokens[0];
        assert_eq!(token.columns[1], "O");
    }

    #[test]
    fn test_term_with_unknown_wf_is_error() {
        let naf = r#"<NAF><text><wf id="w1" sent="1">a</wf></text>
            <terms><term id="t1"><span><target id="w7"/></span></term></terms></NAF>"#;
        assert!(matches!(read(naf), Err(ConvertError::Format { .. })));
    }

    #[test]
    fn test_links() {
        assert_eq!(
            links(NAF).unwrap(),
            vec!["http://dbpedia.org/resource/Barack_Obama".to_string()]
        );
    }
}
