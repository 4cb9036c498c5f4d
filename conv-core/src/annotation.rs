//! # Conjunto de Anotações
//!
//! O [`AnnotationSet`] é um valor construído uma única vez por sentença, via resolvedor de spans,
//! e depois passado imutável ao codificador.
//!
//! ## Política
//! - **Deduplicação**: entradas com os mesmos `(from, to, rótulo)` viram uma só. Esquemas de origem
//!   costumam repetir os mesmos offsets em listas paralelas (alvo, polaridade, categoria).
//! - **Ordem**: `from` crescente, empate por `to` crescente (span mais curto primeiro).
//! - **Sobreposição**: spans sobrepostos com rótulos distintos são mantidos. Quem decide o que vai
//!   para a saída BIO é a regra de precedência do [`crate::encoder`].

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::document::TokenIndex;
use crate::span::{resolve, Span};

/// Anotação bruta vinda de um adaptador: rótulo + intervalo de caracteres `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawAnnotation {
    pub label: String,
    pub from: usize,
    pub to: usize,
}

impl RawAnnotation {
    pub fn new(label: impl Into<String>, from: usize, to: usize) -> Self {
        Self {
            label: label.into(),
            from,
            to,
        }
    }
}

/// Anotação validada: os offsets de origem resolvem exatamente para `span`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub label: String,
    pub span: Span,
    pub source_offsets: (usize, usize),
}

impl Annotation {
    fn key(&self) -> (usize, usize, &str) {
        (self.source_offsets.0, self.source_offsets.1, self.label.as_str())
    }
}

/// Anotações de uma sentença, deduplicadas e ordenadas por offset inicial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSet {
    items: Vec<Annotation>,
}

impl AnnotationSet {
    /// Constrói o conjunto para uma sentença isolada (índice 0).
    pub fn build(index: &TokenIndex, raw: &[RawAnnotation], diagnostics: &mut Diagnostics) -> Self {
        Self::build_in(0, index, raw, diagnostics)
    }

    /// Constrói o conjunto para a sentença `sentence`, resolvendo cada anotação bruta.
    ///
    /// Anotações desalinhadas são descartadas com [`Diagnostic::Alignment`].
    pub fn build_in(
        sentence: usize,
        index: &TokenIndex,
        raw: &[RawAnnotation],
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let mut resolved = Vec::with_capacity(raw.len());
        for annotation in raw {
            match resolve(index, annotation.from, annotation.to) {
                Ok(span) => resolved.push(Annotation {
                    label: annotation.label.clone(),
                    span,
                    source_offsets: (annotation.from, annotation.to),
                }),
                Err(error) => diagnostics.push(Diagnostic::Alignment {
                    sentence: Some(sentence),
                    label: annotation.label.clone(),
                    error,
                }),
            }
        }
        Self::from_annotations(sentence, resolved, diagnostics)
    }

    /// Monta o conjunto a partir de anotações já resolvidas (ex: vindas do decodificador).
    pub fn from_annotations(
        sentence: usize,
        mut annotations: Vec<Annotation>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        // sort estável: entre duplicatas, a primeira ocorrência sobrevive
        annotations.sort_by(|a, b| a.key().cmp(&b.key()));

        let mut items: Vec<Annotation> = Vec::with_capacity(annotations.len());
        for annotation in annotations {
            if items.last().map(|prev| prev.key() == annotation.key()).unwrap_or(false) {
                diagnostics.push(Diagnostic::DuplicateAnnotation {
                    sentence,
                    from: annotation.source_offsets.0,
                    to: annotation.source_offsets.1,
                    label: annotation.label,
                });
                continue;
            }
            items.push(annotation);
        }
        Self { items }
    }

    /// Junta outro conjunto da mesma sentença, reaplicando ordem e deduplicação.
    pub fn extend_from(&mut self, sentence: usize, other: AnnotationSet, diagnostics: &mut Diagnostics) {
        if other.is_empty() {
            return;
        }
        let mut all = std::mem::take(&mut self.items);
        all.extend(other.items);
        *self = Self::from_annotations(sentence, all, diagnostics);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.items
    }

    /// Mantém apenas os rótulos listados. Retorna quantas anotações foram removidas.
    pub fn retain_labels(&mut self, labels: &[String]) -> usize {
        let before = self.items.len();
        self.items.retain(|a| labels.iter().any(|l| l == &a.label));
        before - self.items.len()
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::tokenizer::{Language, RuleTokenizer, Tokenizer, TokenizerMode};

    fn sentence(text: &str) -> Document {
        Document::from_raw(None, RuleTokenizer.tokenize(text, Language::En, TokenizerMode::Single))
    }

    #[test]
    fn test_dedup_exact_repeats() {
        let doc = sentence("The pizza and the wine were great");
        let mut diagnostics = Diagnostics::default();
        let raw = vec![
            RawAnnotation::new("FOOD#QUALITY", 4, 9),
            RawAnnotation::new("FOOD#QUALITY", 4, 9),
            RawAnnotation::new("DRINKS#QUALITY", 18, 22),
        ];
        let set = AnnotationSet::build(&doc.sentences()[0].tokens, &raw, &mut diagnostics);
        assert_eq!(set.len(), 2);
        assert_eq!(diagnostics.counts().duplicate, 1);
    }

    #[test]
    fn test_same_offsets_different_labels_are_kept() {
        let doc = sentence("The pizza was great");
        let mut diagnostics = Diagnostics::default();
        let raw = vec![
            RawAnnotation::new("FOOD#QUALITY", 4, 9),
            RawAnnotation::new("FOOD#PRICES", 4, 9),
        ];
        let set = AnnotationSet::build(&doc.sentences()[0].tokens, &raw, &mut diagnostics);
        assert_eq!(set.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_ordering_by_start_then_end() {
        let doc = sentence("New York City is large");
        let mut diagnostics = Diagnostics::default();
        let raw = vec![
            RawAnnotation::new("LOC", 17, 22),
            RawAnnotation::new("LOC", 0, 13),
            RawAnnotation::new("LOC", 0, 8),
        ];
        let set = AnnotationSet::build(&doc.sentences()[0].tokens, &raw, &mut diagnostics);
        let offsets: Vec<(usize, usize)> = set.iter().map(|a| a.source_offsets).collect();
        assert_eq!(offsets, vec![(0, 8), (0, 13), (17, 22)]);
    }

    #[test]
    fn test_span_integrity() {
        let doc = sentence("Barack Obama visited the United Nations in New York");
        let index = &doc.sentences()[0].tokens;
        let mut diagnostics = Diagnostics::default();
        let raw = vec![
            RawAnnotation::new("PER", 0, 12),
            RawAnnotation::new("ORG", 25, 39),
            RawAnnotation::new("LOC", 43, 51),
            RawAnnotation::new("LOC", 44, 51),
        ];
        let set = AnnotationSet::build(index, &raw, &mut diagnostics);
        assert_eq!(set.len(), 3);
        assert_eq!(diagnostics.counts().alignment, 1);
        for annotation in &set {
            let (from, to) = annotation.source_offsets;
            assert_eq!(resolve(index, from, to), Ok(annotation.span));
        }
    }

    #[test]
    fn test_retain_labels() {
        let doc = sentence("Obama met Merkel in Berlin");
        let mut diagnostics = Diagnostics::default();
        let raw = vec![
            RawAnnotation::new("PER", 0, 5),
            RawAnnotation::new("PER", 10, 16),
            RawAnnotation::new("LOC", 20, 26),
        ];
        let mut set = AnnotationSet::build(&doc.sentences()[0].tokens, &raw, &mut diagnostics);
        assert_eq!(set.retain_labels(&["LOC".to_string()]), 2);
        assert_eq!(set.as_slice()[0].label, "LOC");
    }
}
