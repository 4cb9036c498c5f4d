//! Diagnósticos por item.
//!
//! Cada problema esperado (anotação desalinhada, linha malformada, `I-` órfão...) vira um
//! [`Diagnostic`]. Eles são registrados via `tracing` no momento em que acontecem, marcados com o
//! documento de origem e agregados, para que quem chama possa contá-los e reportá-los por documento.

use serde::Serialize;
use tracing::{debug, warn};

use crate::span::AlignmentError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Anotação rejeitada pelo resolvedor de spans.
    Alignment {
        sentence: Option<usize>,
        label: String,
        error: AlignmentError,
    },
    /// Anotação repetida (mesmos offsets e rótulo) removida.
    DuplicateAnnotation {
        sentence: usize,
        from: usize,
        to: usize,
        label: String,
    },
    /// Span sobreposto a outro já emitido; não aparece na saída BIO.
    OverlapSuppressed {
        sentence: usize,
        from: usize,
        to: usize,
        label: String,
        kept_label: String,
    },
    /// Linha BIO com número de campos insuficiente.
    MalformedLine { line: usize, content: String },
    /// Etiqueta que não é `O`, `B-X` nem `I-X`; o token vira `O`.
    MalformedTag { line: usize, tag: String },
    /// `I-X` sem span aberto do mesmo tipo; promovido a `B-X`.
    OrphanContinuation { line: usize, tag: String },
}

impl Diagnostic {
    fn log(&self, document: Option<&str>) {
        match self {
            Diagnostic::Alignment { sentence, label, error } => {
                warn!(?document, ?sentence, %label, %error, "anotação descartada");
            }
            Diagnostic::DuplicateAnnotation { sentence, from, to, label } => {
                debug!(?document, sentence, from, to, %label, "anotação duplicada removida");
            }
            Diagnostic::OverlapSuppressed { sentence, from, to, label, kept_label } => {
                warn!(?document, sentence, from, to, %label, %kept_label, "span sobreposto suprimido");
            }
            Diagnostic::MalformedLine { line, content } => {
                warn!(?document, line, %content, "linha malformada ignorada");
            }
            Diagnostic::MalformedTag { line, tag } => {
                warn!(?document, line, %tag, "etiqueta inválida tratada como O");
            }
            Diagnostic::OrphanContinuation { line, tag } => {
                warn!(?document, line, %tag, "I- órfão promovido a B-");
            }
        }
    }
}

/// Um diagnóstico e o documento em que ocorreu (id do registro ou `#posição` no lote).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Contagem de diagnósticos por tipo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticCounts {
    pub alignment: usize,
    pub duplicate: usize,
    pub overlap: usize,
    pub malformed_line: usize,
    pub malformed_tag: usize,
    pub orphan_continuation: usize,
}

impl DiagnosticCounts {
    pub fn total(&self) -> usize {
        self.alignment
            + self.duplicate
            + self.overlap
            + self.malformed_line
            + self.malformed_tag
            + self.orphan_continuation
    }

    pub fn merge(&mut self, other: &DiagnosticCounts) {
        self.alignment += other.alignment;
        self.duplicate += other.duplicate;
        self.overlap += other.overlap;
        self.malformed_line += other.malformed_line;
        self.malformed_tag += other.malformed_tag;
        self.orphan_continuation += other.orphan_continuation;
    }
}

/// Diagnósticos acumulados de uma conversão.
///
/// Guarda o documento corrente: tudo o que for registrado depois de [`Diagnostics::set_document`]
/// é atribuído a ele.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    #[serde(skip)]
    document: Option<String>,
    items: Vec<DiagnosticEntry>,
}

impl Diagnostics {
    pub fn set_document(&mut self, document: Option<String>) {
        self.document = document;
    }

    /// Registra (e loga) um diagnóstico no documento corrente.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.log(self.document.as_deref());
        self.items.push(DiagnosticEntry {
            document: self.document.clone(),
            diagnostic,
        });
    }

    /// Absorve diagnósticos já logados, mantendo o documento de cada um.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().map(|entry| &entry.diagnostic)
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.items
    }

    pub fn into_entries(self) -> Vec<DiagnosticEntry> {
        self.items
    }

    /// Diagnósticos de um documento.
    pub fn for_document<'a>(&'a self, document: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.items
            .iter()
            .filter(move |entry| entry.document.as_deref() == Some(document))
            .map(|entry| &entry.diagnostic)
    }

    pub fn counts(&self) -> DiagnosticCounts {
        let mut counts = DiagnosticCounts::default();
        for item in self.iter() {
            match item {
                Diagnostic::Alignment { .. } => counts.alignment += 1,
                Diagnostic::DuplicateAnnotation { .. } => counts.duplicate += 1,
                Diagnostic::OverlapSuppressed { .. } => counts.overlap += 1,
                Diagnostic::MalformedLine { .. } => counts.malformed_line += 1,
                Diagnostic::MalformedTag { .. } => counts.malformed_tag += 1,
                Diagnostic::OrphanContinuation { .. } => counts.orphan_continuation += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::AlignmentReason;

    #[test]
    fn test_counts_by_kind() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::MalformedLine { line: 3, content: "Paris".into() });
        diagnostics.push(Diagnostic::OrphanContinuation { line: 4, tag: "I-LOC".into() });
        diagnostics.push(Diagnostic::OrphanContinuation { line: 9, tag: "I-PER".into() });
        let counts = diagnostics.counts();
        assert_eq!(counts.malformed_line, 1);
        assert_eq!(counts.orphan_continuation, 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_entries_carry_current_document() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::MalformedLine { line: 1, content: "x".into() });
        diagnostics.set_document(Some("doc-A".into()));
        diagnostics.push(Diagnostic::MalformedTag { line: 2, tag: "X-1".into() });
        diagnostics.set_document(Some("doc-B".into()));
        diagnostics.push(Diagnostic::MalformedTag { line: 3, tag: "X-2".into() });

        let documents: Vec<Option<&str>> =
            diagnostics.entries().iter().map(|e| e.document.as_deref()).collect();
        assert_eq!(documents, vec![None, Some("doc-A"), Some("doc-B")]);
        assert_eq!(diagnostics.for_document("doc-B").count(), 1);

        let json = serde_json::to_value(&diagnostics.entries()[1]).unwrap();
        assert_eq!(json["document"], "doc-A");
        assert_eq!(json["kind"], "malformed_tag");
        assert_eq!(json["line"], 2);
        assert!(serde_json::to_value(&diagnostics.entries()[0]).unwrap().get("document").is_none());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let diagnostic = Diagnostic::Alignment {
            sentence: Some(0),
            label: "LOC".into(),
            error: AlignmentError::new(5, 16, AlignmentReason::NoTokenStartsAt),
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], "alignment");
        assert_eq!(json["error"]["reason"], "no_token_starts_at");
    }
}
