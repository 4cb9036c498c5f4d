//! # Codificador BIO
//!
//! Serializa um [`Document`] no formato "um token por linha": `forma \t ... \t etiqueta`, com uma
//! linha em branco depois de cada sentença.
//!
//! ## Regra de adjacência (IOB2)
//! Todo span começa com `B-TIPO`, inclusive quando o token anterior pertence a outro span do mesmo
//! tipo. Assim, "Paris London" com dois spans `LOC` vira `B-LOC B-LOC` e nunca se funde num único
//! span ao decodificar.
//!
//! ## Precedência entre spans sobrepostos
//! Os spans são percorridos da esquerda para a direita. Entre spans que começam no mesmo token,
//! o mais longo vence. Um span que começa dentro de um span já emitido é suprimido e registrado
//! como [`Diagnostic::OverlapSuppressed`].

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document::{Document, Sentence, Token};
use crate::labels::{LabelMapper, LabelMapping};
use crate::tagger::Tag;

/// Colunas escritas entre a forma e a etiqueta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// `forma etiqueta`
    #[default]
    Compact,
    /// `forma [colunas do token...] etiqueta`
    Preserve,
    /// `forma lema morfologia etiqueta` (CoNLL 2002). Sem colunas no token, o lema é a própria
    /// forma e a morfologia é `O`.
    Conll,
}

/// Separador de colunas da saída.
const SEPARATOR: char = '\t';

pub struct BioEncoder {
    mapper: Box<dyn LabelMapper>,
    layout: ColumnLayout,
}

impl Default for BioEncoder {
    fn default() -> Self {
        Self::new(LabelMapping::Identity)
    }
}

impl std::fmt::Debug for BioEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BioEncoder")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl BioEncoder {
    pub fn new(mapper: impl LabelMapper + 'static) -> Self {
        Self {
            mapper: Box::new(mapper),
            layout: ColumnLayout::Compact,
        }
    }

    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Tipo normalizado de um rótulo. Espaços viram `_` para não quebrar as colunas.
    pub fn map_label(&self, label: &str) -> String {
        self.mapper
            .map(label)
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect()
    }

    /// Calcula a etiqueta de cada token da sentença, aplicando a regra de precedência.
    pub fn tags_for(
        &self,
        sentence_index: usize,
        sentence: &Sentence,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Tag> {
        let mut tags = vec![Tag::Outside; sentence.tokens.len()];
        let annotations = sentence.annotations.as_slice();
        // (token final exclusivo, rótulo) do último span emitido
        let mut emitted: Option<(usize, &str)> = None;

        for group in annotations.chunk_by(|a, b| a.span.start == b.span.start) {
            let start = group[0].span.start;

            if let Some((_, kept)) = emitted.filter(|(end, _)| start < *end) {
                for annotation in group {
                    diagnostics.push(suppressed(sentence_index, annotation, kept));
                }
                continue;
            }

            // o mais longo vence; no empate fica o primeiro
            let Some(winner) = group.iter().rev().max_by_key(|a| a.span.end) else {
                continue;
            };
            for annotation in group.iter().filter(|a| !std::ptr::eq(*a, winner)) {
                diagnostics.push(suppressed(sentence_index, annotation, &winner.label));
            }

            let category = self.map_label(&winner.label);
            for (offset, tag) in tags[winner.span.start..winner.span.end].iter_mut().enumerate() {
                *tag = if offset == 0 {
                    Tag::Begin(category.clone())
                } else {
                    Tag::Inside(category.clone())
                };
            }
            emitted = Some((winner.span.end, winner.label.as_str()));
        }

        tags
    }

    /// Serializa o documento inteiro.
    pub fn encode(&self, document: &Document, diagnostics: &mut Diagnostics) -> String {
        let mut out = String::new();
        for (index, sentence) in document.sentences().iter().enumerate() {
            self.encode_sentence(index, sentence, diagnostics, &mut out);
        }
        out
    }

    /// Escreve as linhas de uma sentença em `out`, seguidas da linha em branco.
    pub fn encode_sentence(
        &self,
        sentence_index: usize,
        sentence: &Sentence,
        diagnostics: &mut Diagnostics,
        out: &mut String,
    ) {
        if sentence.tokens.is_empty() {
            return;
        }
        let tags = self.tags_for(sentence_index, sentence, diagnostics);
        for (token, tag) in sentence.tokens.iter().zip(&tags) {
            self.write_line(token, tag, out);
        }
        out.push('\n');
    }

    fn write_line(&self, token: &Token, tag: &Tag, out: &mut String) {
        out.push_str(&token.form);
        match self.layout {
            ColumnLayout::Compact => {}
            ColumnLayout::Preserve => {
                for column in &token.columns {
                    out.push(SEPARATOR);
                    out.push_str(column);
                }
            }
            ColumnLayout::Conll => {
                let lemma = token.columns.first().unwrap_or(&token.form);
                let morph = token.columns.get(1).map(String::as_str).unwrap_or("O");
                out.push(SEPARATOR);
                out.push_str(lemma);
                out.push(SEPARATOR);
                out.push_str(morph);
            }
        }
        out.push(SEPARATOR);
        out.push_str(&tag.label());
        out.push('\n');
    }
}

fn suppressed(sentence: usize, annotation: &Annotation, kept: &str) -> Diagnostic {
    Diagnostic::OverlapSuppressed {
        sentence,
        from: annotation.source_offsets.0,
        to: annotation.source_offsets.1,
        label: annotation.label.clone(),
        kept_label: kept.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RawAnnotation;
    use crate::decoder::BioDecoder;
    use crate::tokenizer::{
        Language, RawSentence, RawToken, RuleTokenizer, Tokenizer, TokenizerMode,
    };

    fn annotated(text: &str, raw: &[RawAnnotation], diagnostics: &mut Diagnostics) -> Document {
        let mut doc = Document::from_raw(
            None,
            RuleTokenizer.tokenize(text, Language::En, TokenizerMode::Single),
        );
        doc.annotate(raw, diagnostics);
        doc
    }

    #[test]
    fn test_eiffel_tower() {
        let mut diagnostics = Diagnostics::default();
        let doc = annotated(
            "The Eiffel Tower is old",
            &[RawAnnotation::new("LOC", 4, 16)],
            &mut diagnostics,
        );
        let out = BioEncoder::default().encode(&doc, &mut diagnostics);
        assert_eq!(out, "The\tO\nEiffel\tB-LOC\nTower\tI-LOC\nis\tO\nold\tO\n\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_adjacent_same_type_spans_start_with_b() {
        let mut diagnostics = Diagnostics::default();
        let doc = annotated(
            "Paris London",
            &[RawAnnotation::new("LOC", 0, 5), RawAnnotation::new("LOC", 6, 12)],
            &mut diagnostics,
        );
        let out = BioEncoder::default().encode(&doc, &mut diagnostics);
        assert_eq!(out, "Paris\tB-LOC\nLondon\tB-LOC\n\n");
    }

    #[test]
    fn test_adjacent_different_types() {
        let mut diagnostics = Diagnostics::default();
        let doc = annotated(
            "Obama Washington",
            &[RawAnnotation::new("PER", 0, 5), RawAnnotation::new("LOC", 6, 16)],
            &mut diagnostics,
        );
        let out = BioEncoder::default().encode(&doc, &mut diagnostics);
        assert_eq!(out, "Obama\tB-PER\nWashington\tB-LOC\n\n");
    }

    #[test]
    fn test_misaligned_offset_is_dropped_rest_encodes() {
        let mut diagnostics = Diagnostics::default();
        let doc = annotated(
            "Obama visited Paris",
            &[RawAnnotation::new("PER", 1, 5), RawAnnotation::new("LOC", 14, 19)],
            &mut diagnostics,
        );
        let out = BioEncoder::default().encode(&doc, &mut diagnostics);
        assert_eq!(out, "Obama\tO\nvisited\tO\nParis\tB-LOC\n\n");
        assert_eq!(diagnostics.counts().alignment, 1);
    }

    #[test]
    fn test_overlap_longest_wins_and_nested_is_suppressed() {
        let mut diagnostics = Diagnostics::default();
        let doc = annotated(
            "University of New York is big",
            &[
                RawAnnotation::new("ORG", 0, 22),
                RawAnnotation::new("LOC", 14, 22),
                RawAnnotation::new("MISC", 0, 10),
            ],
            &mut diagnostics,
        );
        let out = BioEncoder::default().encode(&doc, &mut diagnostics);
        assert_eq!(
            out,
            "University\tB-ORG\nof\tI-ORG\nNew\tI-ORG\nYork\tI-ORG\nis\tO\nbig\tO\n\n"
        );
        assert_eq!(diagnostics.counts().overlap, 2);
    }

    #[test]
    fn test_label_mapping_and_layout() {
        let mut diagnostics = Diagnostics::default();
        let doc = annotated(
            "Obama spoke",
            &[RawAnnotation::new("PERSON", 0, 5)],
            &mut diagnostics,
        );
        let encoder = BioEncoder::new(LabelMapping::Conll03).with_layout(ColumnLayout::Conll);
        let out = encoder.encode(&doc, &mut diagnostics);
        assert_eq!(out, "Obama\tObama\tO\tB-PER\nspoke\tspoke\tO\tO\n\n");
    }

    #[test]
    fn test_preserve_layout_round_trip() {
        let token = |form: &str, start: usize, columns: [&str; 2]| {
            let mut token = RawToken::new(form, start, form.chars().count());
            token.columns = columns.iter().map(|c| c.to_string()).collect();
            token
        };
        let sentence = RawSentence {
            text: "Obama visitou Paris".into(),
            offset: 0,
            tokens: vec![
                token("Obama", 0, ["Obama", "NP"]),
                token("visitou", 6, ["visitar", "VMIS3S0"]),
                token("Paris", 14, ["Paris", "NP"]),
            ],
        };
        let mut diagnostics = Diagnostics::default();
        let mut doc = Document::from_raw(None, vec![sentence]);
        doc.annotate(
            &[RawAnnotation::new("PER", 0, 5), RawAnnotation::new("LOC", 14, 19)],
            &mut diagnostics,
        );

        let out = BioEncoder::default()
            .with_layout(ColumnLayout::Preserve)
            .encode(&doc, &mut diagnostics);
        assert_eq!(
            out,
            "Obama\tObama\tNP\tB-PER\nvisitou\tvisitar\tVMIS3S0\tO\nParis\tParis\tNP\tB-LOC\n\n"
        );

        let decoded = BioDecoder::default().decode(&out);
        assert!(decoded.diagnostics.is_empty());
        let original = &doc.sentences()[0];
        let restored = &decoded.document.sentences()[0];
        let columns = |s: &Sentence| s.tokens.iter().map(|t| t.columns.clone()).collect::<Vec<_>>();
        assert_eq!(columns(restored), columns(original));
        let mut none = Diagnostics::default();
        assert_eq!(
            BioEncoder::default().tags_for(0, restored, &mut none),
            BioEncoder::default().tags_for(0, original, &mut none)
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_whitespace_in_mapped_label() {
        let encoder = BioEncoder::new(|_: &str| "DRINKS STYLE".to_string());
        assert_eq!(encoder.map_label("x"), "DRINKS_STYLE");
    }
}
