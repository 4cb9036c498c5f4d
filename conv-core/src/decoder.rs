//! # Decodificador BIO
//!
//! Caminho inverso do [`crate::encoder`]: lê o formato "um token por linha" e reconstrói um
//! [`Document`] com tokens e anotações.
//!
//! O formato não guarda offsets, então os tokens recebem offsets sintéticos: as formas são unidas
//! por um espaço e as sentenças por um separador de um caractere, como se o texto fosse
//! `"forma forma forma\nforma forma"`. Para voltar aos offsets reais, use [`project`] com o
//! documento de referência tokenizado a partir do corpus original.
//!
//! ## Máquina de estados
//! - `B-X` abre um span;
//! - `I-X` logo após um span aberto do tipo `X` o estende;
//! - qualquer outra etiqueta fecha o span aberto;
//! - `I-X` sem span aberto do tipo `X` é promovido a `B-X` (com diagnóstico).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::{Annotation, AnnotationSet};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document::Document;
use crate::error::{ConvertError, Result};
use crate::span::Span;
use crate::tagger::Tag;
use crate::tokenizer::{RawSentence, RawToken};

/// Marcador de início de documento do CoNLL 2003, ignorado na leitura.
const DOCSTART: &str = "-DOCSTART-";

/// Separador de campos das linhas de entrada.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSeparator {
    #[default]
    Tab,
    /// Qualquer sequência de espaços em branco (saída do conlleval, CoNLL 2003).
    Whitespace,
}

/// Resultado da decodificação: o documento e os diagnósticos de linha.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub document: Document,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BioDecoder {
    separator: FieldSeparator,
}

/// Sentença em construção.
#[derive(Default)]
struct Pending {
    tokens: Vec<RawToken>,
    tags: Vec<(Tag, usize)>,
}

impl BioDecoder {
    pub fn new(separator: FieldSeparator) -> Self {
        Self { separator }
    }

    pub fn decode(&self, input: &str) -> Decoded {
        let mut decoded = Decoded::default();
        let mut pending = Pending::default();
        let mut cursor = 0usize;
        let mut started = false;

        for (index, line) in input.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                flush(&mut pending, &mut decoded);
                continue;
            }

            let fields: Vec<&str> = match self.separator {
                FieldSeparator::Tab => line.split('\t').collect(),
                FieldSeparator::Whitespace => line.split_whitespace().collect(),
            };
            if fields.first().map(|f| f.trim()) == Some(DOCSTART) {
                continue;
            }
            let (form, rest) = match fields.split_first() {
                Some((form, rest)) if !rest.is_empty() && !form.trim().is_empty() => (*form, rest),
                _ => {
                    decoded.diagnostics.push(Diagnostic::MalformedLine {
                        line: line_number,
                        content: line.to_string(),
                    });
                    continue;
                }
            };
            let (raw_tag, columns) = match rest.split_last() {
                Some((raw_tag, columns)) if !raw_tag.trim().is_empty() => (raw_tag, columns),
                _ => {
                    decoded.diagnostics.push(Diagnostic::MalformedLine {
                        line: line_number,
                        content: line.to_string(),
                    });
                    continue;
                }
            };
            let tag = Tag::from_label(raw_tag.trim()).unwrap_or_else(|| {
                decoded.diagnostics.push(Diagnostic::MalformedTag {
                    line: line_number,
                    tag: raw_tag.to_string(),
                });
                Tag::Outside
            });

            if started {
                cursor += 1;
            }
            started = true;
            let len = form.chars().count();
            let mut token = RawToken::new(form, cursor, len);
            token.columns = columns.iter().map(|c| c.to_string()).collect();
            cursor += len;

            pending.tokens.push(token);
            pending.tags.push((tag, line_number));
        }
        flush(&mut pending, &mut decoded);

        debug!(
            sentences = decoded.document.sentences().len(),
            tokens = decoded.document.token_count(),
            "decodificação concluída"
        );
        decoded
    }
}

/// Fecha a sentença em construção e reconstrói seus spans.
fn flush(pending: &mut Pending, decoded: &mut Decoded) {
    if pending.tokens.is_empty() {
        return;
    }
    let Pending { tokens, tags } = std::mem::take(pending);
    let annotations = spans_from_tags(&tokens, &tags, &mut decoded.diagnostics);

    let text = tokens.iter().map(|t| t.form.as_str()).collect::<Vec<_>>().join(" ");
    let offset = tokens[0].char_start;
    let index = decoded
        .document
        .push_sentence(None, RawSentence { text, offset, tokens });

    decoded.document.sentences_mut()[index].annotations =
        AnnotationSet::from_annotations(index, annotations, &mut decoded.diagnostics);
}

fn spans_from_tags(
    tokens: &[RawToken],
    tags: &[(Tag, usize)],
    diagnostics: &mut Diagnostics,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    // (tipo, índice do primeiro token)
    let mut open: Option<(&str, usize)> = None;

    let close = |open: Option<(&str, usize)>, end: usize, annotations: &mut Vec<Annotation>| {
        if let Some((label, start)) = open {
            annotations.push(Annotation {
                label: label.to_string(),
                span: Span::new(start, end),
                source_offsets: (tokens[start].char_start, tokens[end - 1].char_end()),
            });
        }
    };

    let mut previous = &Tag::Outside;
    for (i, (tag, line)) in tags.iter().enumerate() {
        match tag {
            Tag::Inside(_) if Tag::is_valid_transition(previous, tag) => {}
            Tag::Begin(category) | Tag::Inside(category) => {
                if matches!(tag, Tag::Inside(_)) {
                    diagnostics.push(Diagnostic::OrphanContinuation {
                        line: *line,
                        tag: tag.label(),
                    });
                }
                close(open.take(), i, &mut annotations);
                open = Some((category.as_str(), i));
            }
            Tag::Outside => close(open.take(), i, &mut annotations),
        }
        previous = tag;
    }
    close(open, tags.len(), &mut annotations);

    annotations
}

/// Projeta as anotações decodificadas sobre documentos de referência com offsets reais.
///
/// As sentenças da referência, na ordem, precisam corresponder uma a uma às sentenças
/// decodificadas, com as mesmas formas de token. Qualquer divergência é um erro: projetar sobre
/// tokens diferentes corromperia os offsets em silêncio. Sentenças da referência sem tokens não
/// aparecem no BIO e são mantidas como estão.
pub fn project(reference: &[Document], decoded: &Document) -> Result<Vec<Document>> {
    let expected = reference
        .iter()
        .flat_map(|d| d.sentences())
        .filter(|s| !s.tokens.is_empty())
        .count();
    let found = decoded.sentences().len();
    if expected != found {
        return Err(ConvertError::projection(
            found.min(expected),
            format!("referência tem {expected} sentenças, predição tem {found}"),
        ));
    }

    let mut predicted = decoded.sentences().iter();
    let mut global = 0usize;
    let mut projected = Vec::with_capacity(reference.len());

    for document in reference {
        let mut target = document.clone();
        for (local, sentence) in target.sentences_mut().iter_mut().enumerate() {
            if sentence.tokens.is_empty() {
                continue;
            }
            let source = predicted
                .next()
                .ok_or_else(|| ConvertError::projection(global, "predição terminou antes"))?;

            let reference_forms = sentence.tokens.forms();
            let predicted_forms = source.tokens.forms();
            if reference_forms != predicted_forms {
                return Err(ConvertError::projection(
                    global,
                    format!(
                        "tokens divergem: {:?} != {:?}",
                        reference_forms, predicted_forms
                    ),
                ));
            }

            let annotations = source
                .annotations
                .iter()
                .filter_map(|a| {
                    let first = sentence.tokens.get(a.span.start)?;
                    let last = sentence.tokens.get(a.span.end - 1)?;
                    Some(Annotation {
                        label: a.label.clone(),
                        span: a.span,
                        source_offsets: (first.char_start, last.char_end()),
                    })
                })
                .collect();
            sentence.annotations =
                AnnotationSet::from_annotations(local, annotations, &mut Diagnostics::default());
            global += 1;
        }
        projected.push(target);
    }

    Ok(projected)
}
