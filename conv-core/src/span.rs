//! # Resolução de Spans
//!
//! Mapeia um intervalo de caracteres `[from, to)` para a sequência contígua de tokens que o cobre
//! **exatamente**. Não existe "token mais próximo" nem recorte: ou as duas fronteiras caem em
//! fronteiras de token, ou a anotação é rejeitada com um [`AlignmentError`].
//!
//! ## Exemplo
//! Em "The Eiffel Tower is old", o intervalo `[4, 16)` resolve para `Span { start: 1, end: 3 }`
//! ("Eiffel Tower"). Já `[5, 16)` falha: nenhum token começa no caractere 5.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::TokenIndex;

/// Intervalo de tokens `[start, end)` dentro de uma sentença.
///
/// Invariante: `start < end <= tokens.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }
}

/// Motivo pelo qual um intervalo de caracteres não pôde ser alinhado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentReason {
    /// `from >= to`.
    EmptyRange,
    /// Nenhum token começa exatamente em `from`.
    NoTokenStartsAt,
    /// Nenhum token termina exatamente em `to`.
    NoTokenEndsAt,
    /// O intervalo passa do fim da sentença.
    CrossesSentence,
    /// `from` não cai em nenhuma sentença do documento.
    OutsideDocument,
}

impl AlignmentReason {
    pub fn describe(&self) -> &'static str {
        match self {
            AlignmentReason::EmptyRange => "intervalo vazio",
            AlignmentReason::NoTokenStartsAt => "nenhum token começa no offset inicial",
            AlignmentReason::NoTokenEndsAt => "nenhum token termina no offset final",
            AlignmentReason::CrossesSentence => "intervalo atravessa o fim da sentença",
            AlignmentReason::OutsideDocument => "offset fora do documento",
        }
    }
}

/// Falha de alinhamento de uma anotação. Não é fatal: a anotação é descartada.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("não foi possível alinhar [{from}, {to}): {}", .reason.describe())]
pub struct AlignmentError {
    pub from: usize,
    pub to: usize,
    pub reason: AlignmentReason,
}

impl AlignmentError {
    pub fn new(from: usize, to: usize, reason: AlignmentReason) -> Self {
        Self { from, to, reason }
    }
}

/// Resolve `[from, to)` para um [`Span`] de tokens da sentença.
///
/// Percorre os tokens em ordem de offset: o primeiro token do span é aquele com
/// `char_start == from`; os tokens seguintes são acumulados até um deles terminar em `to`.
pub fn resolve(index: &TokenIndex, from: usize, to: usize) -> Result<Span, AlignmentError> {
    let fail = |reason| Err(AlignmentError::new(from, to, reason));

    if from >= to {
        return fail(AlignmentReason::EmptyRange);
    }

    let tokens = index.tokens();
    let Some(start) = tokens.iter().position(|t| t.char_start == from) else {
        return fail(AlignmentReason::NoTokenStartsAt);
    };

    for (i, token) in tokens.iter().enumerate().skip(start) {
        let end = token.char_end();
        if end == to {
            return Ok(Span::new(start, i + 1));
        }
        if end > to {
            return fail(AlignmentReason::NoTokenEndsAt);
        }
    }

    fail(AlignmentReason::CrossesSentence)
}
