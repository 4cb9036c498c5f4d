//! # Documento e Índice de Tokens
//!
//! Um [`Document`] corresponde a um registro de entrada (uma sentença ABSA, um arquivo TimeML,
//! o título ou o resumo de um documento BARR). Ele possui, com exclusividade, as sentenças,
//! e cada [`Sentence`] possui seu [`TokenIndex`] e seu [`AnnotationSet`].
//!
//! Todos os offsets de um documento estão no mesmo sistema de coordenadas: caracteres do texto do
//! registro. Entidades nunca atravessam sentenças.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::annotation::{Annotation, AnnotationSet, RawAnnotation};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::span::{AlignmentError, AlignmentReason};
use crate::tokenizer::{RawSentence, RawToken};

/// Identificador estável de um token dentro do documento (exibido como `w1`, `w2`...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub usize);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0 + 1)
    }
}

/// Um token imutável, criado em lote quando a sentença é tokenizada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub form: String,
    pub char_start: usize,
    pub char_len: usize,
    /// Índice da sentença dona do token.
    pub sentence: usize,
    /// Colunas intermediárias (lema, etiqueta morfológica) preservadas entre forma e etiqueta.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

impl Token {
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_len
    }
}

/// Sequência ordenada de tokens de uma sentença.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIndex {
    tokens: Vec<Token>,
}

impl TokenIndex {
    /// Cria o índice. Os tokens precisam estar em ordem de offset.
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(tokens.windows(2).all(|w| w[0].char_start <= w[1].char_start));
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Intervalo `[início do primeiro token, fim do último)` coberto pela sentença.
    pub fn char_range(&self) -> Option<(usize, usize)> {
        let first = self.tokens.first()?;
        let last = self.tokens.last()?;
        Some((first.char_start, last.char_end()))
    }

    /// Formas superficiais, na ordem da sentença.
    pub fn forms(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.form.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a TokenIndex {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Uma sentença: texto, tokens e anotações.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Identificador externo opcional (ex: id de sentença ABSA).
    pub id: Option<String>,
    /// Texto coberto pela sentença, começando em `offset`.
    pub text: String,
    /// Offset (em caracteres do registro) onde `text` começa.
    pub offset: usize,
    pub tokens: TokenIndex,
    pub annotations: AnnotationSet,
}

impl Sentence {
    /// Texto superficial de uma anotação, recortado de `text`.
    pub fn surface(&self, annotation: &Annotation) -> String {
        let (from, to) = annotation.source_offsets;
        let local_from = from.saturating_sub(self.offset);
        self.text
            .chars()
            .skip(local_from)
            .take(to.saturating_sub(from))
            .collect()
    }

    /// Offsets de uma anotação relativos ao início de `text`.
    pub fn local_offsets(&self, annotation: &Annotation) -> (usize, usize) {
        let (from, to) = annotation.source_offsets;
        (from.saturating_sub(self.offset), to.saturating_sub(self.offset))
    }

    fn contains_offset(&self, offset: usize) -> bool {
        self.tokens
            .char_range()
            .map(|(start, end)| start <= offset && offset < end)
            .unwrap_or(false)
    }
}

/// Um documento: uma ou mais sentenças no mesmo sistema de coordenadas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identificador externo opcional (ex: "100005#T" para o título de um documento BARR).
    pub id: Option<String>,
    sentences: Vec<Sentence>,
    next_token: usize,
}

impl Document {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            sentences: Vec::new(),
            next_token: 0,
        }
    }

    /// Constrói o documento a partir da saída do tokenizador.
    pub fn from_raw(id: Option<String>, raw: Vec<RawSentence>) -> Self {
        let mut document = Self::new(id);
        for sentence in raw {
            document.push_sentence(None, sentence);
        }
        document
    }

    /// Adiciona uma sentença, atribuindo identificadores sequenciais aos tokens.
    /// Retorna o índice da sentença.
    pub fn push_sentence(&mut self, id: Option<String>, raw: RawSentence) -> usize {
        let index = self.sentences.len();
        let tokens = raw
            .tokens
            .into_iter()
            .map(|RawToken { form, char_start, char_len, columns }| {
                let id = TokenId(self.next_token);
                self.next_token += 1;
                Token {
                    id,
                    form,
                    char_start,
                    char_len,
                    sentence: index,
                    columns,
                }
            })
            .collect();

        self.sentences.push(Sentence {
            id,
            text: raw.text,
            offset: raw.offset,
            tokens: TokenIndex::new(tokens),
            annotations: AnnotationSet::default(),
        });
        index
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentences_mut(&mut self) -> &mut [Sentence] {
        &mut self.sentences
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }

    pub fn annotation_count(&self) -> usize {
        self.sentences.iter().map(|s| s.annotations.len()).sum()
    }

    /// Encontra a sentença cujo intervalo contém `offset`.
    pub fn sentence_at(&self, offset: usize) -> Option<usize> {
        self.sentences.iter().position(|s| s.contains_offset(offset))
    }

    /// Distribui anotações brutas entre as sentenças e constrói o [`AnnotationSet`] de cada uma.
    ///
    /// Anotações que não caem em nenhuma sentença, ou que não alinham com fronteiras de tokens,
    /// são descartadas e registradas em `diagnostics`; as demais seguem normalmente.
    pub fn annotate(&mut self, raw: &[RawAnnotation], diagnostics: &mut Diagnostics) {
        let mut per_sentence: Vec<Vec<RawAnnotation>> = vec![Vec::new(); self.sentences.len()];

        for annotation in raw {
            match self.sentence_at(annotation.from) {
                Some(index) => per_sentence[index].push(annotation.clone()),
                None => diagnostics.push(Diagnostic::Alignment {
                    sentence: None,
                    label: annotation.label.clone(),
                    error: AlignmentError::new(
                        annotation.from,
                        annotation.to,
                        AlignmentReason::OutsideDocument,
                    ),
                }),
            }
        }

        for (index, raws) in per_sentence.into_iter().enumerate() {
            if raws.is_empty() {
                continue;
            }
            let sentence = &mut self.sentences[index];
            let mut set = AnnotationSet::build_in(index, &sentence.tokens, &raws, diagnostics);
            set.extend_from(index, std::mem::take(&mut sentence.annotations), diagnostics);
            sentence.annotations = set;
        }
    }

    /// Mantém apenas anotações cujo rótulo está em `labels`. Retorna quantas foram removidas.
    pub fn retain_labels(&mut self, labels: &[String]) -> usize {
        self.sentences
            .iter_mut()
            .map(|s| s.annotations.retain_labels(labels))
            .sum()
    }
}
