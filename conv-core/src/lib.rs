//! # conv-core: Motor de Alinhamento e Etiquetagem BIO
//!
//! Este crate converte corpora linguísticos entre formatos de anotação usados em pipelines de NLP:
//! XML com anotações por offset de caractere (aspectos, alvos de opinião, expressões temporais),
//! arquivos tabulares com offsets e o formato "um token por linha" com etiquetas BIO.
//!
//! O coração do sistema não é nenhum leitor de formato específico, e sim o **motor de alinhamento**:
//! todo adaptador de formato passa por ele.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto + anotações `(from, to, label)` vindas de um adaptador ([`formats`]).
//! 2.  **Tokenização** ([`tokenizer`]): O texto é segmentado em sentenças e tokens, preservando offsets em caracteres.
//! 3.  **Índice de Tokens** ([`document`]): Cada sentença guarda seus tokens com identificadores estáveis.
//! 4.  **Resolução de Spans** ([`span`]): Cada offset é mapeado para uma sequência exata de tokens (ou rejeitado).
//! 5.  **Conjunto de Anotações** ([`annotation`]): Deduplicado e ordenado por offset inicial.
//! 6.  **Codificação BIO** ([`encoder`]) ou o caminho inverso, **Decodificação BIO** ([`decoder`]).
//!
//! Nada aqui é fatal para o lote: anotações desalinhadas, linhas malformadas e etiquetas `I-` órfãs
//! viram [`Diagnostic`]s agregados por documento.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use conv_core::{Converter, ConvertConfig, RawAnnotation, Record, TokenizerMode};
//!
//! let converter = Converter::new(ConvertConfig::default());
//! let record = Record::new("The Eiffel Tower is old", TokenizerMode::Single)
//!     .with_annotation(RawAnnotation::new("LOC", 4, 16));
//!
//! let (bio, report) = converter.encode_records(&[record]);
//! assert_eq!(bio, "The\tO\nEiffel\tB-LOC\nTower\tI-LOC\nis\tO\nold\tO\n\n");
//! assert_eq!(report.annotations, 1);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador que conecta tokenizador, resolvedor, codificador e decodificador.
//! - [`formats`]: Adaptadores para ABSA SemEval, TimeML, BARR, Yelp e avaliação CoNLL.
//! - [`labels`]: Funções plugáveis de normalização de rótulos.

pub mod annotation;
pub mod config;
pub mod decoder;
pub mod diagnostics;
pub mod document;
pub mod encoder;
pub mod error;
pub mod formats;
pub mod labels;
pub mod pipeline;
pub mod span;
pub mod tagger;
pub mod tokenizer;

pub use annotation::{Annotation, AnnotationSet, RawAnnotation};
pub use config::ConvertConfig;
pub use decoder::{project, BioDecoder, Decoded};
pub use diagnostics::{Diagnostic, DiagnosticCounts, DiagnosticEntry, Diagnostics};
pub use document::{Document, Sentence, Token, TokenId, TokenIndex};
pub use encoder::{BioEncoder, ColumnLayout};
pub use error::{ConvertError, Result};
pub use formats::Record;
pub use labels::{LabelMapper, LabelMapping};
pub use pipeline::{ConversionReport, Converter};
pub use span::{resolve, AlignmentError, AlignmentReason, Span};
pub use tagger::Tag;
pub use tokenizer::{Language, RawSentence, RawToken, RuleTokenizer, Tokenizer, TokenizerMode};
