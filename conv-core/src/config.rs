//! Configuração de uma conversão.
//!
//! Pode vir de um arquivo JSON (todos os campos são opcionais) e ser sobrescrita por flags da
//! linha de comando.
//!
//! ```json
//! { "language": "es", "labels": { "fixed": "TARGET" }, "layout": "conll" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decoder::FieldSeparator;
use crate::encoder::ColumnLayout;
use crate::error::Result;
use crate::labels::LabelMapping;
use crate::tokenizer::{Language, TokenizerMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub language: Language,
    /// Sobrescreve o modo de tokenização escolhido pelo adaptador.
    pub tokenizer_mode: Option<TokenizerMode>,
    pub labels: LabelMapping,
    pub layout: ColumnLayout,
    /// Separador de campos esperado ao decodificar.
    pub separator: FieldSeparator,
    /// Se não vazio, apenas estes rótulos (antes do mapeamento) são mantidos.
    pub keep_labels: Vec<String>,
    /// Extensão dos arquivos gerados ao lado das entradas.
    pub output_suffix: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            language: Language::En,
            tokenizer_mode: None,
            labels: LabelMapping::Identity,
            layout: ColumnLayout::Compact,
            separator: FieldSeparator::Tab,
            keep_labels: Vec::new(),
            output_suffix: "conll02".to_string(),
        }
    }
}

impl ConvertConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Modo efetivo: o da configuração, se houver, senão o sugerido pelo adaptador.
    pub fn mode_or(&self, suggested: TokenizerMode) -> TokenizerMode {
        self.tokenizer_mode.unwrap_or(suggested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            ConvertConfig::from_json_str(r#"{"language":"es","labels":{"fixed":"TARGET"}}"#)
                .unwrap();
        assert_eq!(config.language, Language::Es);
        assert_eq!(config.labels, LabelMapping::Fixed("TARGET".into()));
        assert_eq!(config.layout, ColumnLayout::Compact);
        assert_eq!(config.output_suffix, "conll02");
        assert_eq!(config.mode_or(TokenizerMode::Single), TokenizerMode::Single);
    }

    #[test]
    fn test_mode_override() {
        let config = ConvertConfig::from_json_str(r#"{"tokenizer_mode":"whitespace"}"#).unwrap();
        assert_eq!(config.mode_or(TokenizerMode::Standard), TokenizerMode::Whitespace);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ConvertConfig::from_json_str("{language").is_err());
    }
}
