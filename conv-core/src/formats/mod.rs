//! # Adaptadores de Formato
//!
//! Cada adaptador só traduz o esquema externo para registros `(texto, anotações por offset)` e
//! de volta. Tokenização, alinhamento e etiquetagem ficam no motor; nenhum adaptador monta
//! etiquetas BIO por conta própria.
//!
//! | Adaptador | Leitura                          | Escrita                   | Rótulo            |
//! |-----------|----------------------------------|---------------------------|-------------------|
//! | [`absa`]  | SemEval 2014 (aspectos), 2015/16 (alvos de opinião) | XML 2014 e 2015 | `term`, categoria ou `TARGET` |
//! | [`timeml`]| `TIMEX3` inline                  | -                         | atributo `type`   |
//! | [`barr`]  | documentos + entidades TSV       | entidades TSV             | coluna de tipo    |
//! | [`yelp`]  | JSON lines (campo `text`)        | -                         | -                 |
//! | [`eval`]  | referência + predição BIO        | `forma gold predito`      | -                 |
//! | [`naf`]   | NAF/KAF (`wf`, `term`, `entity`) | links de entidades        | atributo `type`   |
//! | [`dsrc`]  | palavras + markables MMAX        | -                         | `TARGET`          |
//!
//! NAF e DSRC já vêm tokenizados: os adaptadores montam as sentenças com [`lay_out`] e o
//! tokenizador não é chamado.

pub mod absa;
pub mod barr;
pub mod dsrc;
pub mod eval;
pub mod naf;
pub mod timeml;
pub mod yelp;

use serde::{Deserialize, Serialize};

use crate::annotation::RawAnnotation;
use crate::tokenizer::{RawSentence, RawToken, TokenizerMode};

/// Um registro de entrada: texto bruto, anotações com offsets em caracteres desse texto e o modo
/// de tokenização que reproduz a segmentação original do corpus.
///
/// Corpora que já vêm tokenizados (NAF, DSRC) trazem as próprias sentenças em `sentences`; nesse
/// caso o tokenizador não é chamado e os offsets das anotações se referem a esses tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: Option<String>,
    pub text: String,
    pub annotations: Vec<RawAnnotation>,
    pub mode: TokenizerMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentences: Option<Vec<RawSentence>>,
}

impl Record {
    pub fn new(text: impl Into<String>, mode: TokenizerMode) -> Self {
        Self {
            id: None,
            text: text.into(),
            annotations: Vec::new(),
            mode,
            sentences: None,
        }
    }

    /// Registro pré-tokenizado.
    pub fn tokenized(text: impl Into<String>, sentences: Vec<RawSentence>) -> Self {
        Self {
            sentences: Some(sentences),
            ..Self::new(text, TokenizerMode::Whitespace)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_annotation(mut self, annotation: RawAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Abre um XML de corpus. Vários corpora trazem DOCTYPE, então DTDs são aceitos.
fn parse_xml(xml: &str) -> crate::Result<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(roxmltree::Document::parse_with_options(xml, options)?)
}

/// Lê um atributo numérico obrigatório de um elemento XML.
fn offset_attribute(node: roxmltree::Node<'_, '_>, name: &str) -> crate::Result<usize> {
    let value = node
        .attribute(name)
        .ok_or_else(|| crate::ConvertError::format(node.tag_name().name(), format!("atributo `{name}` ausente")))?;
    value.trim().parse().map_err(|_| {
        crate::ConvertError::format(
            node.tag_name().name(),
            format!("atributo `{name}` não numérico: {value:?}"),
        )
    })
}

/// Dá offsets sintéticos a um corpus pré-tokenizado: formas unidas por um espaço, sentenças por
/// `\n`, o mesmo texto que o [`crate::decoder`] reconstrói.
pub fn lay_out(sentences: Vec<Vec<RawToken>>) -> (String, Vec<RawSentence>) {
    let mut text = String::new();
    let mut cursor = 0usize;
    let mut laid = Vec::with_capacity(sentences.len());

    for tokens in sentences {
        if !laid.is_empty() {
            text.push('\n');
            cursor += 1;
        }
        let offset = cursor;
        let mut sentence_text = String::new();
        let mut placed = Vec::with_capacity(tokens.len());
        for mut token in tokens {
            if !placed.is_empty() {
                sentence_text.push(' ');
                cursor += 1;
            }
            token.char_start = cursor;
            token.char_len = token.form.chars().count();
            cursor += token.char_len;
            sentence_text.push_str(&token.form);
            placed.push(token);
        }
        text.push_str(&sentence_text);
        laid.push(RawSentence {
            text: sentence_text,
            offset,
            tokens: placed,
        });
    }
    (text, laid)
}

/// Converte a saída do emissor XML em `String`.
fn xml_to_string(buffer: Vec<u8>) -> crate::Result<String> {
    String::from_utf8(buffer).map_err(|e| crate::ConvertError::format("xml", e.to_string()))
}
