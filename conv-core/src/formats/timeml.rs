//! # TimeML (TempEval)
//!
//! Lê o elemento `TEXT` de um arquivo TimeML com expressões temporais inline:
//!
//! ```xml
//! <TEXT>Shares fell <TIMEX3 tid="t1" type="DATE" value="1998-02-27">Friday</TIMEX3>.</TEXT>
//! ```
//!
//! O texto é reconstruído sem as tags; cada `TIMEX3` vira uma anotação rotulada pelo seu atributo
//! `type`. Tags `EVENT` (e qualquer outra) são removidas mantendo o conteúdo. Antes da tokenização
//! o texto é normalizado: aspas de LaTeX (` `` ` e `''`) viram `"`, o espaço no início de cada linha
//! é removido (o que também elimina linhas vazias) e as pontas do texto são aparadas. Os offsets
//! das anotações são calculados já sobre o texto normalizado.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::{parse_xml, Record};
use crate::annotation::RawAnnotation;
use crate::error::{ConvertError, Result};
use crate::tokenizer::TokenizerMode;

static LATEX_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"``|''").expect("padrão de aspas inválido"));

/// Rótulo usado quando um `TIMEX3` não tem atributo `type`.
const DEFAULT_TIMEX_TYPE: &str = "TIMEX3";

enum Piece {
    Text(String),
    Open(String),
    Close,
}

/// Lê um documento TimeML como um único registro, segmentado em sentenças.
pub fn read(xml: &str) -> Result<Record> {
    let document = parse_xml(xml)?;
    let text = document
        .descendants()
        .find(|n| n.has_tag_name("TEXT"))
        .ok_or_else(|| ConvertError::format("TimeML", "elemento TEXT ausente"))?;

    let mut pieces = Vec::new();
    flatten(text, &mut pieces);
    Ok(normalize(&pieces))
}

fn flatten(node: roxmltree::Node<'_, '_>, pieces: &mut Vec<Piece>) {
    for child in node.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                pieces.push(Piece::Text(LATEX_QUOTES.replace_all(text, "\"").into_owned()));
            }
        } else if child.has_tag_name("TIMEX3") {
            let label = child.attribute("type").unwrap_or(DEFAULT_TIMEX_TYPE);
            pieces.push(Piece::Open(label.to_string()));
            flatten(child, pieces);
            pieces.push(Piece::Close);
        } else if child.is_element() {
            flatten(child, pieces);
        }
    }
}

/// Monta o texto normalizado e converte as marcas de abertura/fechamento em offsets.
fn normalize(pieces: &[Piece]) -> Record {
    let mut chars: Vec<char> = Vec::new();
    let mut open: Vec<(String, usize)> = Vec::new();
    let mut spans: Vec<(String, usize, usize)> = Vec::new();
    let mut line_start = true;

    for piece in pieces {
        match piece {
            Piece::Text(text) => {
                for ch in text.chars() {
                    if line_start && ch.is_whitespace() {
                        continue;
                    }
                    line_start = ch == '\n';
                    chars.push(ch);
                }
            }
            Piece::Open(label) => open.push((label.clone(), chars.len())),
            Piece::Close => {
                if let Some((label, start)) = open.pop() {
                    spans.push((label, start, chars.len()));
                }
            }
        }
    }

    while chars.last().map(|c| c.is_whitespace()).unwrap_or(false) {
        chars.pop();
    }

    let mut record = Record::new(chars.iter().collect::<String>(), TokenizerMode::Standard);
    for (label, start, end) in spans {
        // as pontas da anotação não podem ser espaço
        let mut from = start.min(chars.len());
        let mut to = end.min(chars.len());
        while from < to && chars[from].is_whitespace() {
            from += 1;
        }
        while to > from && chars[to - 1].is_whitespace() {
            to -= 1;
        }
        if from == to {
            warn!(%label, start, "TIMEX3 vazio ignorado");
            continue;
        }
        record.annotations.push(RawAnnotation::new(label, from, to));
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEML: &str = r#"<?xml version="1.0" ?>
<TimeML>
<DOCID>wsj_0006</DOCID>
<DCT><TIMEX3 tid="t0" type="DATE" value="1989-11-02" functionInDocument="CREATION_TIME">11/02/89</TIMEX3></DCT>
<TEXT>
   Pacific First Financial Corp. said shareholders <EVENT eid="e1" class="OCCURRENCE">approved</EVENT>
   its acquisition by ``Royal Trustco'' <TIMEX3 tid="t1" type="DATE" value="1989-11-01">yesterday</TIMEX3>.

   The sale <EVENT eid="e2" class="OCCURRENCE">closed</EVENT><TIMEX3 tid="t2" type="DURATION" value="P2D"> two days </TIMEX3>later.
</TEXT>
</TimeML>"#;

    #[test]
    fn test_read_strips_tags_and_normalizes() {
        let record = read(TIMEML).unwrap();
        assert_eq!(
            record.text,
            "Pacific First Financial Corp. said shareholders approved\n\
             its acquisition by \"Royal Trustco\" yesterday.\n\
             The sale closed two days later."
        );
        assert_eq!(record.mode, TokenizerMode::Standard);
    }

    #[test]
    fn test_timex_offsets_on_normalized_text() {
        let record = read(TIMEML).unwrap();
        let chars: Vec<char> = record.text.chars().collect();
        let surfaces: Vec<(String, String)> = record
            .annotations
            .iter()
            .map(|a| (a.label.clone(), chars[a.from..a.to].iter().collect()))
            .collect();
        assert_eq!(
            surfaces,
            vec![
                ("DATE".to_string(), "yesterday".to_string()),
                ("DURATION".to_string(), "two days".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_text_element() {
        let err = read("<TimeML><DOCID>x</DOCID></TimeML>").unwrap_err();
        assert!(matches!(err, ConvertError::Format { .. }));
    }
}
