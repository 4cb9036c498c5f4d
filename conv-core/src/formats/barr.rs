//! # BARR / Markyt
//!
//! Dois arquivos TSV:
//!
//! - documentos: `id \t idioma \t título \t resumo`
//! - entidades: `id \t idioma \t seção \t from:to \t texto \t tipo`, com seção `T` (título) ou
//!   `A` (resumo) e offsets relativos à seção.
//!
//! Cada documento gera dois registros, `"{id}#T"` (título, sentença única) e `"{id}#A"` (resumo,
//! segmentado em sentenças), cada um no seu próprio sistema de coordenadas. A escrita faz o
//! caminho inverso: `id \t seção \t from \t to \t texto \t tipo`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::Record;
use crate::annotation::RawAnnotation;
use crate::document::Document;
use crate::tokenizer::TokenizerMode;

static OFFSETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*:\s*(\d+)\s*$").expect("padrão de offsets inválido"));

pub const TITLE: &str = "T";
pub const ABSTRACT: &str = "A";

/// Entidades indexadas por `(id do documento, seção)`.
fn entities_by_section(entities: &str) -> HashMap<(String, String), Vec<RawAnnotation>> {
    let mut map: HashMap<(String, String), Vec<RawAnnotation>> = HashMap::new();
    for (index, line) in entities.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 6 {
            warn!(line = index + 1, %line, "entidade BARR com campos insuficientes");
            continue;
        }
        let Some(captures) = OFFSETS.captures(fields[3]) else {
            warn!(line = index + 1, offsets = fields[3], "offsets BARR inválidos");
            continue;
        };
        let (Ok(from), Ok(to)) = (captures[1].parse(), captures[2].parse()) else {
            warn!(line = index + 1, offsets = fields[3], "offsets BARR fora do intervalo");
            continue;
        };
        let section = fields[2].trim().to_ascii_uppercase();
        map.entry((fields[0].trim().to_string(), section))
            .or_default()
            .push(RawAnnotation::new(fields[5].trim(), from, to));
    }
    map
}

/// Lê documentos e entidades BARR.
pub fn read(documents: &str, entities: &str) -> Vec<Record> {
    let mut entities = entities_by_section(entities);
    let mut records = Vec::new();

    for (index, line) in documents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            warn!(line = index + 1, "documento BARR com campos insuficientes");
            continue;
        }
        let id = fields[0].trim();
        let title = fields[2];
        let summary = fields.get(3).copied().unwrap_or_default();

        for (section, text, mode) in [
            (TITLE, title, TokenizerMode::Single),
            (ABSTRACT, summary, TokenizerMode::Standard),
        ] {
            let mut record = Record::new(text, mode).with_id(format!("{id}#{section}"));
            record.annotations = entities
                .remove(&(id.to_string(), section.to_string()))
                .unwrap_or_default();
            records.push(record);
        }
    }

    for (id, section) in entities.keys() {
        warn!(%id, %section, "entidades sem documento correspondente");
    }
    debug!(records = records.len(), "BARR lido");
    records
}

/// Divide `"{id}#{seção}"` em suas partes.
fn split_id(id: &str) -> (&str, &str) {
    match id.rsplit_once('#') {
        Some((document, section)) => (document, section),
        None => (id, ABSTRACT),
    }
}

/// Escreve as anotações dos documentos no TSV de entidades.
pub fn write_entities(documents: &[Document]) -> String {
    let mut lines = Vec::new();
    for document in documents {
        let (id, section) = split_id(document.id.as_deref().unwrap_or_default());
        for sentence in document.sentences() {
            for annotation in &sentence.annotations {
                let (from, to) = annotation.source_offsets;
                lines.push(format!(
                    "{id}\t{section}\t{from}\t{to}\t{}\t{}",
                    sentence.surface(annotation),
                    annotation.label
                ));
            }
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::tokenizer::{Language, RuleTokenizer, Tokenizer};

    const DOCS: &str = "100005\tes\tTratamiento del TDAH en adultos\tEl TDAH afecta a adultos. El MPH es eficaz.\n\
                        100006\tes\tSin entidades\t\n";
    const ENTITIES: &str = "100005\tes\tT\t16:20\tTDAH\tSHORT\n\
                            100005\tes\tA\t3:7\tTDAH\tSHORT\n\
                            100005\tes\tA\t29:32\tMPH\tSHORT\n\
                            100005\tes\tA\tx:y\tMPH\tSHORT\n";

    #[test]
    fn test_read_splits_title_and_abstract() {
        let records = read(DOCS, ENTITIES);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id.as_deref(), Some("100005#T"));
        assert_eq!(records[0].mode, TokenizerMode::Single);
        assert_eq!(records[0].annotations, vec![RawAnnotation::new("SHORT", 16, 20)]);
        assert_eq!(records[1].id.as_deref(), Some("100005#A"));
        assert_eq!(records[1].annotations.len(), 2);
        assert!(records[3].annotations.is_empty());
    }

    #[test]
    fn test_write_entities_uses_section_offsets() {
        let documents: Vec<Document> = read(DOCS, ENTITIES)
            .into_iter()
            .map(|record| {
                let mut document = Document::from_raw(
                    record.id.clone(),
                    RuleTokenizer.tokenize(&record.text, Language::Es, record.mode),
                );
                document.annotate(&record.annotations, &mut Diagnostics::default());
                document
            })
            .collect();
        assert_eq!(
            write_entities(&documents),
            "100005\tT\t16\t20\tTDAH\tSHORT\n\
             100005\tA\t3\t7\tTDAH\tSHORT\n\
             100005\tA\t29\t32\tMPH\tSHORT"
        );
    }

    #[test]
    fn test_split_id() {
        assert_eq!(split_id("100005#T"), ("100005", "T"));
        assert_eq!(split_id("100005"), ("100005", "A"));
    }
}
