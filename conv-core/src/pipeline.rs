//! # Pipeline de Conversão: Orquestrador
//!
//! O [`Converter`] conecta tokenizador, resolvedor de spans, codificador e decodificador a partir
//! de uma [`ConvertConfig`]. Os adaptadores de [`crate::formats`] produzem [`Record`]s; o
//! conversor transforma registros em [`Document`]s anotados e estes em BIO (ou o inverso).
//!
//! Nenhuma etapa interrompe o lote por causa de uma anotação ruim: tudo vira [`Diagnostic`] e é
//! contabilizado no [`ConversionReport`]. Erros de verdade (E/S, XML inválido, projeção
//! impossível) sobem como [`crate::ConvertError`].
//!
//! [`Diagnostic`]: crate::diagnostics::Diagnostic

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ConvertConfig;
use crate::decoder::{project, BioDecoder, Decoded};
use crate::diagnostics::{DiagnosticCounts, DiagnosticEntry, Diagnostics};
use crate::document::Document;
use crate::encoder::BioEncoder;
use crate::error::Result;
use crate::formats::Record;
use crate::labels::LabelMapper;
use crate::tokenizer::{RawSentence, RuleTokenizer, Tokenizer};

/// Totais de uma conversão, serializáveis para o relatório JSON da CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub documents: usize,
    pub sentences: usize,
    pub tokens: usize,
    /// Anotações que sobreviveram ao alinhamento e à deduplicação.
    pub annotations: usize,
    pub diagnostics: DiagnosticCounts,
    /// Cada diagnóstico com o documento de origem.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<DiagnosticEntry>,
}

impl ConversionReport {
    fn from_documents(documents: &[Document], diagnostics: Diagnostics) -> Self {
        Self {
            documents: documents.len(),
            sentences: documents.iter().map(|d| d.sentences().len()).sum(),
            tokens: documents.iter().map(Document::token_count).sum(),
            annotations: documents.iter().map(Document::annotation_count).sum(),
            diagnostics: diagnostics.counts(),
            items: diagnostics.into_entries(),
        }
    }

    /// Diagnósticos de um documento.
    pub fn for_document<'a>(&'a self, document: &'a str) -> impl Iterator<Item = &'a DiagnosticEntry> {
        self.items
            .iter()
            .filter(move |entry| entry.document.as_deref() == Some(document))
    }

    /// Soma outro relatório a este (usado ao converter vários arquivos em paralelo).
    pub fn merge(&mut self, other: &ConversionReport) {
        self.documents += other.documents;
        self.sentences += other.sentences;
        self.tokens += other.tokens;
        self.annotations += other.annotations;
        self.diagnostics.merge(&other.diagnostics);
        self.items.extend(other.items.iter().cloned());
    }
}

/// O conversor principal.
///
/// É `Send + Sync`: uma instância pode ser compartilhada entre threads para converter vários
/// arquivos de uma vez.
pub struct Converter {
    config: ConvertConfig,
    tokenizer: Box<dyn Tokenizer + Send + Sync>,
    encoder: BioEncoder,
    decoder: BioDecoder,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertConfig::default())
    }
}

impl Converter {
    /// Monta o conversor com o tokenizador de regras e o mapeamento de rótulos da configuração.
    pub fn new(config: ConvertConfig) -> Self {
        let encoder = BioEncoder::new(config.labels.clone()).with_layout(config.layout);
        let decoder = BioDecoder::new(config.separator);
        Self {
            config,
            tokenizer: Box::new(RuleTokenizer),
            encoder,
            decoder,
        }
    }

    /// Troca o mapeamento de rótulos por uma função arbitrária.
    pub fn with_label_mapper(mut self, mapper: impl LabelMapper + 'static) -> Self {
        self.encoder = BioEncoder::new(mapper).with_layout(self.config.layout);
        self
    }

    /// Troca o tokenizador (ex: um que reproduza a segmentação de outra ferramenta).
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + Send + Sync + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Tokeniza o registro e resolve suas anotações. Os diagnósticos ficam atribuídos ao id do
    /// registro.
    pub fn build_document(&self, record: &Record, diagnostics: &mut Diagnostics) -> Document {
        diagnostics.set_document(record.id.clone());
        self.build(record, diagnostics)
    }

    /// Como [`Converter::build_document`], para um lote. Registros sem id são identificados nos
    /// diagnósticos pela posição (`#0`, `#1`...).
    pub fn build_documents(&self, records: &[Record], diagnostics: &mut Diagnostics) -> Vec<Document> {
        let documents = records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                diagnostics.set_document(Some(document_key(record.id.as_deref(), position)));
                self.build(record, diagnostics)
            })
            .collect();
        diagnostics.set_document(None);
        documents
    }

    fn build(&self, record: &Record, diagnostics: &mut Diagnostics) -> Document {
        let mut raw = match &record.sentences {
            Some(sentences) => sentences.clone(),
            None => {
                let mode = self.config.mode_or(record.mode);
                self.tokenizer.tokenize(&record.text, self.config.language, mode)
            }
        };
        if raw.is_empty() {
            // registro sem tokens: uma sentença vazia mantém o texto e o id na volta ao formato
            raw.push(RawSentence {
                text: record.text.clone(),
                offset: 0,
                tokens: Vec::new(),
            });
        }
        let mut document = Document::from_raw(record.id.clone(), raw);
        document.annotate(&record.annotations, diagnostics);
        self.retain_configured(&mut document);
        document
    }

    fn retain_configured(&self, document: &mut Document) {
        if self.config.keep_labels.is_empty() {
            return;
        }
        let dropped = document.retain_labels(&self.config.keep_labels);
        if dropped > 0 {
            debug!(id = ?document.id, dropped, "anotações fora da lista de rótulos descartadas");
        }
    }

    /// Monta os documentos de um lote e o relatório, sem codificar (para escritores de formato).
    pub fn build_with_report(&self, records: &[Record]) -> (Vec<Document>, ConversionReport) {
        let mut diagnostics = Diagnostics::default();
        let documents = self.build_documents(records, &mut diagnostics);
        let report = ConversionReport::from_documents(&documents, diagnostics);
        (documents, report)
    }

    /// Converte registros em BIO, na ordem, com o relatório da conversão.
    pub fn encode_records(&self, records: &[Record]) -> (String, ConversionReport) {
        let mut diagnostics = Diagnostics::default();
        let documents = self.build_documents(records, &mut diagnostics);
        self.encode_with(&documents, diagnostics)
    }

    /// Converte documentos já montados em BIO.
    pub fn encode_documents(&self, documents: &[Document]) -> (String, ConversionReport) {
        self.encode_with(documents, Diagnostics::default())
    }

    fn encode_with(&self, documents: &[Document], mut diagnostics: Diagnostics) -> (String, ConversionReport) {
        let mut out = String::new();
        for (position, document) in documents.iter().enumerate() {
            diagnostics.set_document(Some(document_key(document.id.as_deref(), position)));
            out.push_str(&self.encoder.encode(document, &mut diagnostics));
        }
        diagnostics.set_document(None);
        let report = ConversionReport::from_documents(documents, diagnostics);
        info!(
            documents = report.documents,
            sentences = report.sentences,
            annotations = report.annotations,
            diagnostics = report.diagnostics.total(),
            "conversão para BIO concluída"
        );
        (out, report)
    }

    /// Lê BIO sem referência: os tokens ficam com offsets sintéticos.
    pub fn decode(&self, input: &str) -> Decoded {
        let mut decoded = self.decoder.decode(input);
        self.retain_configured(&mut decoded.document);
        decoded
    }

    /// Lê BIO e projeta as anotações sobre os registros de referência, recuperando os offsets
    /// reais do corpus original. As anotações que os registros já tivessem são substituídas.
    pub fn decode_and_project(
        &self,
        input: &str,
        reference: &[Record],
    ) -> Result<(Vec<Document>, ConversionReport)> {
        let mut diagnostics = Diagnostics::default();
        let bare: Vec<Record> = reference
            .iter()
            .map(|record| Record {
                annotations: Vec::new(),
                ..record.clone()
            })
            .collect();
        let reference = self.build_documents(&bare, &mut diagnostics);

        let decoded = self.decode(input);
        diagnostics.extend(decoded.diagnostics);
        let projected = project(&reference, &decoded.document)?;

        let report = ConversionReport::from_documents(&projected, diagnostics);
        info!(
            documents = report.documents,
            annotations = report.annotations,
            diagnostics = report.diagnostics.total(),
            "projeção de BIO concluída"
        );
        Ok((projected, report))
    }
}

/// Identificação de um documento nos diagnósticos: o id ou a posição no lote.
fn document_key(id: Option<&str>, position: usize) -> String {
    match id {
        Some(id) => id.to_string(),
        None => format!("#{position}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RawAnnotation;
    use crate::error::ConvertError;
    use crate::labels::LabelMapping;
    use crate::tokenizer::{Language, RawToken, TokenizerMode};

    fn eiffel() -> Record {
        Record::new("The Eiffel Tower is old", TokenizerMode::Single)
            .with_id("s1")
            .with_annotation(RawAnnotation::new("LOC", 4, 16))
    }

    #[test]
    fn test_encode_records_report() {
        let converter = Converter::default();
        let records = vec![
            eiffel(),
            Record::new("Paris London", TokenizerMode::Single)
                .with_annotation(RawAnnotation::new("LOC", 0, 5))
                .with_annotation(RawAnnotation::new("LOC", 6, 12))
                .with_annotation(RawAnnotation::new("LOC", 1, 5)),
        ];
        let (bio, report) = converter.encode_records(&records);
        assert_eq!(
            bio,
            "The\tO\nEiffel\tB-LOC\nTower\tI-LOC\nis\tO\nold\tO\n\n\
             Paris\tB-LOC\nLondon\tB-LOC\n\n"
        );
        assert_eq!(report.documents, 2);
        assert_eq!(report.sentences, 2);
        assert_eq!(report.tokens, 7);
        assert_eq!(report.annotations, 3);
        assert_eq!(report.diagnostics.alignment, 1);
    }

    #[test]
    fn test_config_drives_labels_and_mode() {
        let config = ConvertConfig {
            labels: LabelMapping::Fixed("TARGET".to_string()),
            tokenizer_mode: Some(TokenizerMode::Whitespace),
            ..ConvertConfig::default()
        };
        let converter = Converter::new(config);
        let record = Record::new("great food\nbad service", TokenizerMode::Single)
            .with_annotation(RawAnnotation::new("FOOD#QUALITY", 6, 10));
        let (bio, report) = converter.encode_records(&[record]);
        assert_eq!(bio, "great\tO\nfood\tB-TARGET\n\nbad\tO\nservice\tO\n\n");
        assert_eq!(report.sentences, 2);
    }

    #[test]
    fn test_keep_labels() {
        let config = ConvertConfig {
            keep_labels: vec!["DATE".to_string()],
            ..ConvertConfig::default()
        };
        let record = Record::new("Friday in Paris", TokenizerMode::Single)
            .with_annotation(RawAnnotation::new("DATE", 0, 6))
            .with_annotation(RawAnnotation::new("LOC", 10, 15));
        let (bio, report) = Converter::new(config).encode_records(&[record]);
        assert_eq!(bio, "Friday\tB-DATE\nin\tO\nParis\tO\n\n");
        assert_eq!(report.annotations, 1);
    }

    #[test]
    fn test_custom_label_mapper() {
        let converter = Converter::default().with_label_mapper(|label: &str| label.to_lowercase());
        let (bio, _) = converter.encode_records(&[eiffel()]);
        assert!(bio.contains("Eiffel\tB-loc\nTower\tI-loc"));
    }

    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn tokenize(&self, text: &str, _: Language, _: TokenizerMode) -> Vec<RawSentence> {
            let tokens = text
                .chars()
                .enumerate()
                .filter(|(_, c)| !c.is_whitespace())
                .map(|(i, c)| RawToken::new(c.to_string(), i, 1))
                .collect();
            vec![RawSentence {
                text: text.to_string(),
                offset: 0,
                tokens,
            }]
        }
    }

    #[test]
    fn test_custom_tokenizer() {
        let converter = Converter::default().with_tokenizer(CharTokenizer);
        let record = Record::new("ab c", TokenizerMode::Standard)
            .with_annotation(RawAnnotation::new("X", 0, 2));
        let (bio, _) = converter.encode_records(&[record]);
        assert_eq!(bio, "a\tB-X\nb\tI-X\nc\tO\n\n");
    }

    #[test]
    fn test_decode_and_project_restores_offsets() {
        let converter = Converter::default();
        let reference = vec![
            Record::new("  The Eiffel Tower is old", TokenizerMode::Single).with_id("s1"),
            Record::new("Nice view", TokenizerMode::Single).with_id("s2"),
        ];
        let bio = "The\tO\nEiffel\tB-LOC\nTower\tI-LOC\nis\tO\nold\tO\n\nNice\tO\nview\tB-X\n\n";
        let (documents, report) = converter.decode_and_project(bio, &reference).unwrap();
        assert_eq!(report.annotations, 2);

        let sentence = &documents[0].sentences()[0];
        let annotation = sentence.annotations.iter().next().unwrap();
        assert_eq!(annotation.source_offsets, (6, 18));
        assert_eq!(sentence.surface(annotation), "Eiffel Tower");
        assert_eq!(documents[1].id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_decode_and_project_mismatch() {
        let converter = Converter::default();
        let reference = vec![Record::new("The tower", TokenizerMode::Single)];
        let err = converter
            .decode_and_project("The\tO\nbridge\tB-LOC\n\n", &reference)
            .unwrap_err();
        assert!(matches!(err, ConvertError::Projection { .. }));
    }

    #[test]
    fn test_diagnostics_name_their_document() {
        let misaligned = |id: &str| {
            Record::new("Obama visited Paris", TokenizerMode::Single)
                .with_id(id)
                .with_annotation(RawAnnotation::new("PER", 1, 5))
        };
        let records = vec![
            misaligned("doc-A"),
            misaligned("doc-B"),
            Record::new("Obama", TokenizerMode::Single).with_annotation(RawAnnotation::new("PER", 0, 2)),
        ];
        let (_, report) = Converter::default().encode_records(&records);
        assert_eq!(report.diagnostics.alignment, 3);

        let documents: Vec<Option<&str>> =
            report.items.iter().map(|e| e.document.as_deref()).collect();
        assert_eq!(documents, vec![Some("doc-A"), Some("doc-B"), Some("#2")]);
        assert_ne!(report.items[0], report.items[1]);
        assert_eq!(report.for_document("doc-B").count(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][1]["document"], "doc-B");
        assert_eq!(json["items"][1]["kind"], "alignment");
    }

    #[test]
    fn test_empty_record_keeps_a_sentence() {
        let converter = Converter::default();
        let records = vec![
            eiffel(),
            Record::new("   ", TokenizerMode::Single).with_id("s2"),
            Record::new("Nice view", TokenizerMode::Single).with_id("s3"),
        ];
        let mut diagnostics = Diagnostics::default();
        let documents = converter.build_documents(&records, &mut diagnostics);
        assert_eq!(documents[1].sentences().len(), 1);
        assert_eq!(documents[1].sentences()[0].text, "   ");
        assert_eq!(documents[1].token_count(), 0);

        let (bio, _) = converter.encode_documents(&documents);
        assert_eq!(bio.matches("\n\n").count(), 2);
        let (projected, report) = converter.decode_and_project(&bio, &records).unwrap();
        let ids: Vec<Option<&str>> = projected.iter().map(|d| d.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("s1"), Some("s2"), Some("s3")]);
        assert_eq!(projected[1].sentences().len(), 1);
        assert_eq!(report.annotations, 1);
    }

    #[test]
    fn test_pretokenized_record_skips_tokenizer() {
        let sentence = RawSentence {
            text: "New York".into(),
            offset: 0,
            tokens: vec![RawToken::new("New York", 0, 8)],
        };
        let record = Record::tokenized("New York", vec![sentence])
            .with_annotation(RawAnnotation::new("LOC", 0, 8));
        let (bio, report) = Converter::default().encode_records(&[record]);
        assert_eq!(bio, "New York\tB-LOC\n\n");
        assert_eq!(report.tokens, 1);
    }

    #[test]
    fn test_build_with_report() {
        let records = vec![eiffel(), eiffel().with_annotation(RawAnnotation::new("X", 5, 9))];
        let (documents, report) = Converter::default().build_with_report(&records);
        assert_eq!(documents.len(), 2);
        assert_eq!(report.annotations, 2);
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].document.as_deref(), Some("s1"));
    }

    #[test]
    fn test_report_merge() {
        let converter = Converter::default();
        let (_, mut total) = converter.encode_records(&[eiffel()]);
        let (_, other) = converter.encode_records(&[eiffel(), eiffel()]);
        total.merge(&other);
        assert_eq!(total.documents, 3);
        assert_eq!(total.annotations, 3);
    }
}
