//! # Normalização de Rótulos
//!
//! O codificador BIO não conhece nenhum esquema de rótulos: ele recebe uma função de mapeamento
//! injetada. Cada adaptador documenta qual mapeamento usa.
//!
//! | Mapeamento  | Entrada          | Saída      |
//! |-------------|------------------|------------|
//! | `Identity`  | `FOOD#QUALITY`   | `FOOD#QUALITY` |
//! | `Conll03`   | `PERSON`, `ORGANIZATION` | `PER`, `ORG` |
//! | `Fixed`     | qualquer         | valor fixo (ex: `TARGET`) |
//! | `Uppercase` | `date`           | `DATE`     |

use serde::{Deserialize, Serialize};

/// Função plugável de normalização de rótulos.
pub trait LabelMapper: Send + Sync {
    fn map(&self, label: &str) -> String;
}

impl<F> LabelMapper for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn map(&self, label: &str) -> String {
        self(label)
    }
}

/// Mapeamentos prontos, selecionáveis por configuração.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMapping {
    /// Rótulo mantido como está (estilo CoNLL 2002).
    #[default]
    Identity,
    /// Códigos de 3 letras do CoNLL 2003.
    Conll03,
    /// Todo rótulo vira o mesmo valor (extração de classe única).
    Fixed(String),
    Uppercase,
}

impl LabelMapper for LabelMapping {
    fn map(&self, label: &str) -> String {
        match self {
            LabelMapping::Identity => label.to_string(),
            LabelMapping::Conll03 => conll03_type(label),
            LabelMapping::Fixed(name) => name.clone(),
            LabelMapping::Uppercase => label.to_uppercase(),
        }
    }
}

/// Converte uma classe de entidade para o código CoNLL 2003.
///
/// Classes que começam com `PER`, `ORG`, `LOC` ou `GPE`, e qualquer classe de 3 caracteres,
/// ficam com os 3 primeiros caracteres. As demais passam intactas.
pub fn conll03_type(label: &str) -> String {
    let truncate = ["PER", "ORG", "LOC", "GPE"].iter().any(|p| label.starts_with(p))
        || label.chars().count() == 3;
    if truncate {
        label.chars().take(3).collect()
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conll03_type() {
        assert_eq!(conll03_type("PERSON"), "PER");
        assert_eq!(conll03_type("ORGANIZATION"), "ORG");
        assert_eq!(conll03_type("LOCATION"), "LOC");
        assert_eq!(conll03_type("GPE"), "GPE");
        assert_eq!(conll03_type("MISC"), "MISC");
        assert_eq!(conll03_type("DATE"), "DATE");
        assert_eq!(conll03_type("per"), "per");
    }

    #[test]
    fn test_builtin_mappings() {
        assert_eq!(LabelMapping::Identity.map("FOOD#QUALITY"), "FOOD#QUALITY");
        assert_eq!(LabelMapping::Fixed("TARGET".into()).map("FOOD#QUALITY"), "TARGET");
        assert_eq!(LabelMapping::Uppercase.map("term"), "TERM");
    }

    #[test]
    fn test_closure_mapper() {
        let mapper = |label: &str| label.replace('#', "_");
        assert_eq!(LabelMapper::map(&mapper, "FOOD#PRICES"), "FOOD_PRICES");
    }

    #[test]
    fn test_mapping_from_json() {
        let mapping: LabelMapping = serde_json::from_str(r#"{"fixed":"TERM"}"#).unwrap();
        assert_eq!(mapping, LabelMapping::Fixed("TERM".into()));
        let mapping: LabelMapping = serde_json::from_str(r#""conll03""#).unwrap();
        assert_eq!(mapping, LabelMapping::Conll03);
    }
}
