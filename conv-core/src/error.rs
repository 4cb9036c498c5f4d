//! Erros fatais no nível de arquivo ou documento.
//!
//! Problemas esperados e pontuais (offset desalinhado, linha malformada, `I-` órfão) **não** são erros:
//! eles viram [`crate::Diagnostic`]. Este módulo cobre apenas o que impede um arquivo inteiro de ser lido
//! ou escrito.

use thiserror::Error;

/// Resultado padrão das operações de conversão.
pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// XML de entrada inválido (ABSA, TimeML).
    #[error("XML inválido: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Falha ao emitir XML de saída.
    #[error("falha ao escrever XML: {0}")]
    XmlWrite(#[from] xml::writer::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Estrutura do arquivo não corresponde ao formato esperado.
    #[error("formato inválido ({context}): {message}")]
    Format { context: String, message: String },

    /// Predições decodificadas não batem com o documento de referência.
    #[error("projeção incompatível na sentença {sentence}: {message}")]
    Projection { sentence: usize, message: String },
}

impl ConvertError {
    pub fn format(context: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Format {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn projection(sentence: usize, message: impl Into<String>) -> Self {
        ConvertError::Projection {
            sentence,
            message: message.into(),
        }
    }
}
