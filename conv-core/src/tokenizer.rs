//! # Tokenizador e Segmentador de Sentenças
//!
//! Responsável por dividir o texto bruto em sentenças e tokens. Cada token preserva sua posição
//! original no texto como **offset em caracteres** (valores escalares Unicode, não bytes), porque
//! é nessa unidade que os corpora anotados (ABSA, BARR, TimeML) expressam seus atributos `from`/`to`.
//!
//! O motor de alinhamento só conhece a trait [`Tokenizer`]; o [`RuleTokenizer`] é a implementação
//! padrão, baseada em regras simples e listas de abreviações por idioma.
//!
//! ## Modos de Tokenização
//!
//! - **Standard**: Segmenta sentenças (fronteiras Unicode refinadas por abreviações) e tokeniza palavras.
//! - **Single**: Tokeniza palavras, mas trata o texto inteiro como uma única sentença.
//! - **Whitespace**: Texto pré-tokenizado: uma sentença por linha, tokens separados por espaço.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use conv_core::tokenizer::{Language, RuleTokenizer, Tokenizer, TokenizerMode};
//!
//! let sentences = RuleTokenizer.tokenize("Dr. Silva chegou. Ele saiu.", Language::Pt, TokenizerMode::Standard);
//! assert_eq!(sentences.len(), 2);
//! assert_eq!(sentences[0].tokens[0].form, "Dr.");
//! ```

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token produzido pelo tokenizador, ainda sem identificador.
///
/// `char_start` e `char_len` são contados em caracteres do texto que o tokenizador recebeu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken {
    /// Forma superficial (ex: "Eiffel", ",").
    pub form: String,
    /// Offset do primeiro caractere (inclusivo).
    pub char_start: usize,
    /// Comprimento em caracteres.
    pub char_len: usize,
    /// Colunas intermediárias opcionais (lema, etiqueta morfológica...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
}

impl RawToken {
    pub fn new(form: impl Into<String>, char_start: usize, char_len: usize) -> Self {
        Self {
            form: form.into(),
            char_start,
            char_len,
            columns: Vec::new(),
        }
    }

    /// Offset do caractere seguinte ao último (exclusivo).
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_len
    }
}

/// Uma sentença segmentada: o trecho de texto que ela cobre e seus tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSentence {
    /// Texto da sentença, a partir de `offset`.
    pub text: String,
    /// Offset (em caracteres) onde `text` começa no texto original.
    pub offset: usize,
    pub tokens: Vec<RawToken>,
}

/// Idiomas suportados. Só a lista de abreviações muda entre eles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Es,
    Eu,
    Pt,
    It,
    Nl,
    Fr,
    De,
    Gl,
}

impl Language {
    /// Código ISO 639-1 (ex: "en", "eu").
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Eu => "eu",
            Language::Pt => "pt",
            Language::It => "it",
            Language::Nl => "nl",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Gl => "gl",
        }
    }

    /// Abreviações cujo ponto não termina a sentença nem é separado do token.
    pub fn abbreviations(&self) -> &'static [&'static str] {
        match self {
            Language::En => EN_ABBREVIATIONS,
            Language::Es | Language::Gl => ES_ABBREVIATIONS,
            Language::Pt => PT_ABBREVIATIONS,
            Language::Eu => EU_ABBREVIATIONS,
            Language::It => IT_ABBREVIATIONS,
            Language::Nl => NL_ABBREVIATIONS,
            Language::Fr => FR_ABBREVIATIONS,
            Language::De => DE_ABBREVIATIONS,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "eu" => Ok(Language::Eu),
            "pt" => Ok(Language::Pt),
            "it" => Ok(Language::It),
            "nl" => Ok(Language::Nl),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            "gl" => Ok(Language::Gl),
            other => Err(format!("idioma não suportado: {}", other)),
        }
    }
}

const EN_ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Sr", "Jr", "St", "Mt", "Gen", "Gov", "Sen", "Rep",
    "Inc", "Ltd", "Co", "Corp", "vs", "etc", "approx", "Jan", "Feb", "Mar", "Apr", "Jun",
    "Jul", "Aug", "Sep", "Sept", "Oct", "Nov", "Dec", "No", "Fig",
];

const ES_ABBREVIATIONS: &[&str] = &[
    "Sr", "Sra", "Srta", "Dr", "Dra", "Prof", "Lic", "Ing", "Arq", "Avda", "Av", "Gral",
    "Excmo", "Ilmo", "Dña", "Dª", "Ud", "Uds", "Vd", "Vds", "etc", "pág", "núm", "tel",
];

/// Abreviações comuns em PT-BR que não devem ter o ponto tratado como fim de sentença
const PT_ABBREVIATIONS: &[&str] = &[
    "Dr", "Dra", "Sr", "Sra", "Prof", "Profa", "Gov", "Dep", "Sen", "Min",
    "Gen", "Cap", "Sgt", "Cel", "Brig", "Adm", "Des", "Pres", "Eng", "Arq",
    "km", "cm", "mm", "kg", "mg", "ml", "dl", "ha", "etc", "vol", "núm",
    "art", "pág", "pag", "cap", "tel", "fax", "av", "pg", "ibid", "op",
];

const EU_ABBREVIATIONS: &[&str] = &["Jn", "And", "Dk", "Dn", "etab", "or", "zk", "kg", "km", "etc"];

const IT_ABBREVIATIONS: &[&str] = &["Sig", "Sigg", "Dott", "Prof", "Avv", "Ing", "ecc", "pag", "ca"];

const NL_ABBREVIATIONS: &[&str] = &["dhr", "mevr", "mr", "dr", "prof", "ir", "ing", "bijv", "enz", "blz"];

const FR_ABBREVIATIONS: &[&str] = &["M", "Mme", "Mlle", "Dr", "Pr", "Me", "etc", "av", "bd", "p"];

const DE_ABBREVIATIONS: &[&str] = &["Hr", "Fr", "Dr", "Prof", "bzw", "usw", "ca", "Nr", "Str", "vgl"];

/// Estratégias de segmentação disponíveis.
///
/// Cada adaptador escolhe o modo que reproduz como o corpus foi segmentado originalmente
/// (ex: uma sentença ABSA é sempre uma sentença só).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerMode {
    /// **Padrão**: Segmenta sentenças e separa pontuações, preservando abreviações e números decimais.
    #[default]
    Standard,
    /// **Sentença única**: Mesma tokenização de palavras, sem segmentação de sentenças.
    Single,
    /// **Pré-tokenizado**: Uma sentença por linha, tokens separados por espaços em branco.
    Whitespace,
}

/// Colaborador externo do motor: transforma texto bruto em sentenças de tokens com offsets.
pub trait Tokenizer {
    fn tokenize(&self, text: &str, language: Language, mode: TokenizerMode) -> Vec<RawSentence>;
}

/// Tokenizador baseado em regras.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTokenizer;

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str, language: Language, mode: TokenizerMode) -> Vec<RawSentence> {
        let offsets = CharOffsets::new(text);
        let abbreviations = language.abbreviations();

        match mode {
            TokenizerMode::Single => {
                let spans = word_spans(text, 0..text.len(), abbreviations);
                if spans.is_empty() {
                    return Vec::new();
                }
                // O texto inteiro é a sentença: os offsets continuam relativos ao registro
                vec![RawSentence {
                    text: text.to_string(),
                    offset: 0,
                    tokens: build_tokens(text, &offsets, &spans),
                }]
            }
            TokenizerMode::Standard => sentence_ranges(text, abbreviations)
                .into_iter()
                .filter_map(|range| {
                    let spans = word_spans(text, range, abbreviations);
                    build_sentence(text, &offsets, &spans)
                })
                .collect(),
            TokenizerMode::Whitespace => line_ranges(text)
                .into_iter()
                .filter_map(|range| {
                    let spans = whitespace_spans(text, range);
                    build_sentence(text, &offsets, &spans)
                })
                .collect(),
        }
    }
}

/// Tabela de conversão byte → caractere para o texto inteiro.
struct CharOffsets {
    byte_to_char: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut byte_to_char = vec![0; text.len() + 1];
        let mut count = 0;
        for (byte_pos, ch) in text.char_indices() {
            for slot in &mut byte_to_char[byte_pos..byte_pos + ch.len_utf8()] {
                *slot = count;
            }
            count += 1;
        }
        byte_to_char[text.len()] = count;
        Self { byte_to_char }
    }

    fn at(&self, byte_pos: usize) -> usize {
        self.byte_to_char[byte_pos]
    }
}

fn build_tokens(text: &str, offsets: &CharOffsets, spans: &[(usize, usize)]) -> Vec<RawToken> {
    spans
        .iter()
        .map(|&(start, end)| {
            let char_start = offsets.at(start);
            RawToken::new(&text[start..end], char_start, offsets.at(end) - char_start)
        })
        .collect()
}

fn build_sentence(text: &str, offsets: &CharOffsets, spans: &[(usize, usize)]) -> Option<RawSentence> {
    let first = spans.first()?.0;
    let last = spans.last()?.1;
    Some(RawSentence {
        text: text[first..last].to_string(),
        offset: offsets.at(first),
        tokens: build_tokens(text, offsets, spans),
    })
}

/// Fronteiras de sentença Unicode (UAX #29), reunindo trechos que terminam em abreviação.
fn sentence_ranges(text: &str, abbreviations: &[&str]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut pending: Option<Range<usize>> = None;

    for (start, piece) in text.split_sentence_bound_indices() {
        let end = start + piece.len();
        let range = match pending.take() {
            Some(open) => open.start..end,
            None => start..end,
        };
        if ends_with_abbreviation(&text[range.clone()], abbreviations) {
            pending = Some(range);
        } else {
            ranges.push(range);
        }
    }
    if let Some(open) = pending {
        ranges.push(open);
    }
    ranges
}

fn ends_with_abbreviation(piece: &str, abbreviations: &[&str]) -> bool {
    let Some(stem) = piece.trim_end().strip_suffix('.') else {
        return false;
    };
    let last_word = stem.rsplit(char::is_whitespace).next().unwrap_or("");
    !last_word.is_empty() && abbreviations.contains(&last_word)
}

fn line_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for line in text.split('\n') {
        ranges.push(start..start + line.len());
        start += line.len() + 1;
    }
    ranges
}

fn whitespace_spans(text: &str, range: Range<usize>) -> Vec<(usize, usize)> {
    let base = range.start;
    let piece = &text[range];
    let mut spans = Vec::new();
    let mut current: Option<usize> = None;

    for (pos, ch) in piece.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = current.take() {
                spans.push((base + start, base + pos));
            }
        } else if current.is_none() {
            current = Some(pos);
        }
    }
    if let Some(start) = current {
        spans.push((base + start, base + piece.len()));
    }
    spans
}

/// Tokenização de palavras dentro de `range`, devolvendo intervalos de bytes no texto completo.
///
/// - Letras e dígitos acumulam no token corrente.
/// - Hífens e apóstrofos entre caracteres alfanuméricos ficam dentro da palavra ("bem-estar", "don't").
/// - Ponto ou vírgula entre dígitos fica dentro do número ("10.5", "10,5").
/// - Ponto após uma abreviação conhecida fica no token ("Dr.").
/// - Qualquer outro caractere não-branco vira um token de um caractere.
fn word_spans(text: &str, range: Range<usize>, abbreviations: &[&str]) -> Vec<(usize, usize)> {
    let base = range.start;
    let piece = &text[range];
    let chars: Vec<(usize, char)> = piece.char_indices().collect();
    let mut spans = Vec::new();
    let mut current: Option<usize> = None;

    for (i, &(pos, ch)) in chars.iter().enumerate() {
        let next = chars.get(i + 1).map(|&(_, c)| c);
        let next_is_alnum = next.map(char::is_alphanumeric).unwrap_or(false);

        let joins_word = matches!(ch, '-' | '\'' | '\u{2019}') && current.is_some() && next_is_alnum;
        if ch.is_alphanumeric() || joins_word {
            current.get_or_insert(pos);
            continue;
        }

        if let Some(start) = current.take() {
            let word = &piece[start..pos];
            let next_is_digit = next.map(char::is_numeric).unwrap_or(false);
            let in_number = matches!(ch, '.' | ',')
                && next_is_digit
                && word.chars().all(|c| c.is_numeric() || c == '.' || c == ',');

            if in_number {
                current = Some(start);
                continue;
            }
            if ch == '.' && abbreviations.contains(&word) {
                spans.push((base + start, base + pos + 1));
                continue;
            }
            spans.push((base + start, base + pos));
        }

        if !ch.is_whitespace() {
            spans.push((base + pos, base + pos + ch.len_utf8()));
        }
    }

    if let Some(start) = current {
        spans.push((base + start, base + piece.len()));
    }
    spans
}
