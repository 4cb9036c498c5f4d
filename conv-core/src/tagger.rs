//! # Esquema de Tags BIO
//!
//! Define o esquema de anotação **BIO** (Beginning-Inside-Outside) usado no formato
//! "um token por linha".
//!
//! - `B-TIPO`: Begin, primeiro token de um span
//! - `I-TIPO`: Inside, tokens seguintes do mesmo span
//! - `O`: Outside, token fora de qualquer span
//!
//! O `TIPO` é livre (vem do adaptador e passa pelo [`crate::labels`]), por isso é uma `String`
//! e não um enum fechado.

use serde::{Deserialize, Serialize};

/// Tag BIO aplicada a um token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// **Begin**: início de um span. Ex: **Eiffel** (B-LOC) Tower.
    Begin(String),
    /// **Inside**: continuação de um span. Ex: Eiffel **Tower** (I-LOC).
    Inside(String),
    /// **Outside**: o token não faz parte de nenhum span.
    Outside,
}

impl Tag {
    /// Representação textual da tag (ex: "B-PER", "I-ORG", "O")
    pub fn label(&self) -> String {
        match self {
            Tag::Begin(t) => format!("B-{t}"),
            Tag::Inside(t) => format!("I-{t}"),
            Tag::Outside => "O".to_string(),
        }
    }

    /// Verifica se a transição prev → next é válida no esquema BIO
    ///
    /// Regras:
    /// - `I-X` só pode seguir `B-X` ou `I-X` (mesmo tipo)
    /// - `B-X` e `O` podem seguir qualquer tag
    pub fn is_valid_transition(prev: &Tag, next: &Tag) -> bool {
        match next {
            Tag::Inside(t) => match prev {
                Tag::Begin(p) | Tag::Inside(p) => p == t,
                Tag::Outside => false,
            },
            _ => true,
        }
    }

    /// Parseia uma tag a partir de string (ex: "B-PER" → Begin("PER")).
    ///
    /// Aceita também `B_PER`/`I_PER`, usado por alguns corpora. Tipo vazio é inválido.
    pub fn from_label(s: &str) -> Option<Self> {
        if s == "O" {
            return Some(Tag::Outside);
        }
        let (prefix, category) = s.split_at_checked(1)?;
        let category = category.strip_prefix(['-', '_'])?;
        if category.is_empty() {
            return None;
        }
        match prefix {
            "B" => Some(Tag::Begin(category.to_string())),
            "I" => Some(Tag::Inside(category.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_labels() {
        assert_eq!(Tag::Outside.label(), "O");
        assert_eq!(Tag::Begin("PER".into()).label(), "B-PER");
        assert_eq!(Tag::Inside("FOOD#QUALITY".into()).to_string(), "I-FOOD#QUALITY");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(Tag::is_valid_transition(
            &Tag::Begin("PER".into()),
            &Tag::Inside("PER".into())
        ));
        assert!(!Tag::is_valid_transition(&Tag::Outside, &Tag::Inside("PER".into())));
        assert!(!Tag::is_valid_transition(
            &Tag::Begin("ORG".into()),
            &Tag::Inside("PER".into())
        ));
        assert!(Tag::is_valid_transition(&Tag::Begin("LOC".into()), &Tag::Begin("LOC".into())));
    }

    #[test]
    fn test_tag_from_label() {
        assert_eq!(Tag::from_label("O"), Some(Tag::Outside));
        assert_eq!(Tag::from_label("B-PER"), Some(Tag::Begin("PER".into())));
        assert_eq!(Tag::from_label("I-LOC"), Some(Tag::Inside("LOC".into())));
        assert_eq!(Tag::from_label("B_DATE"), Some(Tag::Begin("DATE".into())));
        assert_eq!(Tag::from_label("B-I-X"), Some(Tag::Begin("I-X".into())));
    }

    #[test]
    fn test_invalid_labels() {
        assert_eq!(Tag::from_label("B-"), None);
        assert_eq!(Tag::from_label("X-PER"), None);
        assert_eq!(Tag::from_label("PER"), None);
        assert_eq!(Tag::from_label(""), None);
        assert_eq!(Tag::from_label("É-PER"), None);
    }
}
