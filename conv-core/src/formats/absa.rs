//! # ABSA SemEval
//!
//! - **2014** (extração de termos de aspecto): `sentences/sentence[@id]/text` e
//!   `aspectTerms/aspectTerm[@term @polarity @from @to]`. Todo termo recebe o rótulo `term`.
//! - **2015/2016** (extração de alvos de opinião): `Reviews/Review/sentences/sentence`, com
//!   `Opinions/Opinion[@target @category @polarity @from @to]`. Opiniões com `target="NULL"`
//!   não têm alvo no texto e são ignoradas. Em modo multiclasse o rótulo é a categoria
//!   (ex: `FOOD#QUALITY`); senão, `TARGET`.
//!
//! Cada `<sentence>` vira um [`Record`] tokenizado como sentença única, então os offsets do
//! corpus são offsets do próprio registro.

use tracing::debug;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

use super::{offset_attribute, parse_xml, xml_to_string, Record};
use crate::annotation::RawAnnotation;
use crate::document::{Document, Sentence};
use crate::error::Result;
use crate::tokenizer::TokenizerMode;

pub const ASPECT_TERM_LABEL: &str = "term";
pub const TARGET_LABEL: &str = "TARGET";

fn sentences<'a, 'input>(
    document: &'a roxmltree::Document<'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    document.descendants().filter(|n| n.has_tag_name("sentence"))
}

fn sentence_text(sentence: roxmltree::Node<'_, '_>) -> String {
    sentence
        .children()
        .find(|n| n.has_tag_name("text"))
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string()
}

fn new_record(sentence: roxmltree::Node<'_, '_>) -> Record {
    let mut record = Record::new(sentence_text(sentence), TokenizerMode::Single);
    record.id = sentence.attribute("id").map(str::to_string);
    record
}

/// Lê um corpus ABSA 2014.
pub fn read_2014(xml: &str) -> Result<Vec<Record>> {
    let document = parse_xml(xml)?;
    let mut records = Vec::new();

    for sentence in sentences(&document) {
        let mut record = new_record(sentence);
        for term in sentence.descendants().filter(|n| n.has_tag_name("aspectTerm")) {
            let from = offset_attribute(term, "from")?;
            let to = offset_attribute(term, "to")?;
            record.annotations.push(RawAnnotation::new(ASPECT_TERM_LABEL, from, to));
        }
        records.push(record);
    }

    debug!(sentences = records.len(), "ABSA 2014 lido");
    Ok(records)
}

/// Lê um corpus ABSA 2015/2016.
pub fn read_2015(xml: &str, multiclass: bool) -> Result<Vec<Record>> {
    let document = parse_xml(xml)?;
    let mut records = Vec::new();

    for sentence in sentences(&document) {
        let mut record = new_record(sentence);
        for opinion in sentence.descendants().filter(|n| n.has_tag_name("Opinion")) {
            let target = opinion.attribute("target").unwrap_or("NULL");
            if target.eq_ignore_ascii_case("NULL") {
                continue;
            }
            let label = match opinion.attribute("category") {
                Some(category) if multiclass => category,
                _ => TARGET_LABEL,
            };
            let from = offset_attribute(opinion, "from")?;
            let to = offset_attribute(opinion, "to")?;
            record.annotations.push(RawAnnotation::new(label, from, to));
        }
        records.push(record);
    }

    debug!(sentences = records.len(), multiclass, "ABSA 2015 lido");
    Ok(records)
}

/// Só os textos das sentenças, um por item.
pub fn sentence_texts(xml: &str) -> Result<Vec<String>> {
    let document = parse_xml(xml)?;
    Ok(sentences(&document).map(sentence_text).collect())
}

/// Identificador a escrever para uma sentença.
fn sentence_id(document: &Document, index: usize, sentence: &Sentence, position: usize) -> String {
    if let Some(id) = &sentence.id {
        return id.clone();
    }
    match &document.id {
        Some(id) if document.sentences().len() == 1 => id.clone(),
        Some(id) => format!("{id}.{index}"),
        None => format!("{position}:{index}"),
    }
}

/// Sentenças de todos os documentos com seus identificadores, na ordem.
fn identified(documents: &[Document]) -> Vec<(String, &Sentence)> {
    documents
        .iter()
        .enumerate()
        .flat_map(|(position, document)| {
            document
                .sentences()
                .iter()
                .enumerate()
                .map(move |(index, sentence)| {
                    (sentence_id(document, index, sentence, position), sentence)
                })
        })
        .collect()
}

fn write_text<W: std::io::Write>(writer: &mut EventWriter<W>, sentence: &Sentence) -> Result<()> {
    writer.write(XmlEvent::start_element("text"))?;
    writer.write(XmlEvent::characters(&sentence.text))?;
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

/// Escreve documentos anotados no formato ABSA 2014.
pub fn write_2014(documents: &[Document]) -> Result<String> {
    let mut buffer = Vec::new();
    {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .create_writer(&mut buffer);
        writer.write(XmlEvent::start_element("sentences"))?;

        for (id, sentence) in identified(documents) {
            writer.write(XmlEvent::start_element("sentence").attr("id", &id))?;
            write_text(&mut writer, sentence)?;

            if !sentence.annotations.is_empty() {
                writer.write(XmlEvent::start_element("aspectTerms"))?;
                for annotation in &sentence.annotations {
                    let term = sentence.surface(annotation);
                    let (from, to) = sentence.local_offsets(annotation);
                    let (from, to) = (from.to_string(), to.to_string());
                    writer.write(
                        XmlEvent::start_element("aspectTerm")
                            .attr("term", &term)
                            .attr("polarity", "")
                            .attr("from", &from)
                            .attr("to", &to),
                    )?;
                    writer.write(XmlEvent::end_element())?;
                }
                writer.write(XmlEvent::end_element())?;
            }
            writer.write(XmlEvent::end_element())?;
        }
        writer.write(XmlEvent::end_element())?;
    }
    xml_to_string(buffer)
}

/// Escreve documentos anotados no formato ABSA 2015, agrupando sentenças por review.
///
/// O id da review é o prefixo do id da sentença antes de `:` (ex: `1004293:0` → `1004293`).
/// A polaridade não é conhecida neste caminho e sai como `na`.
pub fn write_2015(documents: &[Document]) -> Result<String> {
    let mut reviews: Vec<(String, Vec<(String, &Sentence)>)> = Vec::new();
    for (id, sentence) in identified(documents) {
        let review = id.split(':').next().unwrap_or_default().to_string();
        match reviews.iter_mut().find(|(rid, _)| *rid == review) {
            Some((_, sentences)) => sentences.push((id, sentence)),
            None => reviews.push((review, vec![(id, sentence)])),
        }
    }

    let mut buffer = Vec::new();
    {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .create_writer(&mut buffer);
        writer.write(XmlEvent::start_element("Reviews"))?;

        for (review, sentences) in &reviews {
            writer.write(XmlEvent::start_element("Review").attr("rid", review))?;
            writer.write(XmlEvent::start_element("sentences"))?;
            for (id, sentence) in sentences {
                writer.write(XmlEvent::start_element("sentence").attr("id", id))?;
                write_text(&mut writer, sentence)?;
                writer.write(XmlEvent::start_element("Opinions"))?;
                for annotation in &sentence.annotations {
                    let target = sentence.surface(annotation);
                    let (from, to) = sentence.local_offsets(annotation);
                    let (from, to) = (from.to_string(), to.to_string());
                    writer.write(
                        XmlEvent::start_element("Opinion")
                            .attr("target", &target)
                            .attr("category", &annotation.label)
                            .attr("polarity", "na")
                            .attr("from", &from)
                            .attr("to", &to),
                    )?;
                    writer.write(XmlEvent::end_element())?;
                }
                writer.write(XmlEvent::end_element())?;
                writer.write(XmlEvent::end_element())?;
            }
            writer.write(XmlEvent::end_element())?;
            writer.write(XmlEvent::end_element())?;
        }
        writer.write(XmlEvent::end_element())?;
    }
    xml_to_string(buffer)
}
