//! # DSRC (MMAX)
//!
//! Corpus de opiniões anotado no MMAX, em dois arquivos:
//!
//! - palavras: `<word id="word_1">The</word>`, uma por token, em ordem;
//! - markables: `<markable span="word_3..word_5" annotation_type="target"/>`.
//!
//! Só os markables do tipo `target` viram anotações (rótulo [`TARGET_LABEL`]). Uma sentença
//! termina depois de um token `.`, `?` ou `|`. Um markable que cita uma palavra inexistente é
//! descartado com aviso, assim como um span cujas palavras não são consecutivas.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{lay_out, parse_xml, Record};
use crate::annotation::RawAnnotation;
use crate::error::{ConvertError, Result};
use crate::tokenizer::RawToken;

pub const TARGET_LABEL: &str = "TARGET";

static END_OF_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[?|.]$").expect("padrão de fim de sentença inválido"));

static WORD_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^word_(\d+)$").expect("padrão de id de palavra inválido"));

/// Número de uma palavra a partir do id (`word_12` → 12).
fn word_number(id: &str) -> Option<usize> {
    WORD_ID.captures(id.trim())?[1].parse().ok()
}

/// Lê palavras e markables DSRC como um registro pré-tokenizado.
pub fn read(words: &str, markables: &str) -> Result<Record> {
    let words_xml = parse_xml(words)?;
    let markables_xml = parse_xml(markables)?;

    let mut sentences: Vec<Vec<RawToken>> = vec![Vec::new()];
    // número da palavra -> (sentença, token)
    let mut positions: HashMap<usize, (usize, usize)> = HashMap::new();

    for word in words_xml.descendants().filter(|n| n.has_tag_name("word")) {
        let id = word.attribute("id").unwrap_or_default();
        let number = word_number(id)
            .ok_or_else(|| ConvertError::format("DSRC", format!("id de palavra inválido: {id:?}")))?;
        let form = word.text().unwrap_or_default().trim();
        if form.is_empty() {
            warn!(word = id, "palavra vazia ignorada");
            continue;
        }

        let sentence = sentences.len() - 1;
        positions.insert(number, (sentence, sentences[sentence].len()));
        sentences[sentence].push(RawToken::new(form, 0, 0));
        if END_OF_SENTENCE.is_match(form) {
            sentences.push(Vec::new());
        }
    }
    if sentences.last().map(Vec::is_empty).unwrap_or(false) {
        sentences.pop();
    }

    let (text, laid) = lay_out(sentences);
    let mut annotations = Vec::new();

    for markable in markables_xml.descendants().filter(|n| n.has_tag_name("markable")) {
        let is_target = markable
            .attribute("annotation_type")
            .map(|t| t.eq_ignore_ascii_case("target"))
            .unwrap_or(false);
        if !is_target {
            continue;
        }
        let span = markable.attribute("span").unwrap_or_default();
        // spans descontínuos do MMAX vêm separados por vírgula
        for fragment in span.split(',') {
            let Some(words) = fragment_words(fragment, &positions) else {
                warn!(span = fragment, "markable com palavras inexistentes ou não consecutivas");
                continue;
            };
            let (Some(first), Some(last)) = (words.first(), words.last()) else {
                continue;
            };
            let from = laid[first.0].tokens[first.1].char_start;
            let to = laid[last.0].tokens[last.1].char_end();
            annotations.push(RawAnnotation::new(TARGET_LABEL, from, to));
        }
    }

    debug!(sentences = laid.len(), targets = annotations.len(), "DSRC lido");
    let mut record = Record::tokenized(text, laid);
    record.annotations = annotations;
    Ok(record)
}

/// Posições das palavras de `word_a..word_b` (ou `word_a`), se todas existem e são consecutivas.
fn fragment_words(
    fragment: &str,
    positions: &HashMap<usize, (usize, usize)>,
) -> Option<Vec<(usize, usize)>> {
    let mut bounds = fragment.split("..");
    let start = word_number(bounds.next()?)?;
    let end = match bounds.next() {
        Some(end) => word_number(end)?,
        None => start,
    };
    if bounds.next().is_some() || end < start {
        return None;
    }

    let words = (start..=end)
        .map(|number| positions.get(&number).copied())
        .collect::<Option<Vec<_>>>()?;
    let consecutive = words
        .windows(2)
        .all(|pair| pair[1] == (pair[0].0, pair[0].1 + 1) || pair[1] == (pair[0].0 + 1, 0));
    consecutive.then_some(words)
}
