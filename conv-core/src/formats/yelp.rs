//! Dataset Yelp em JSON lines: extrai o campo `text` de cada avaliação.

use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize)]
struct Review {
    text: String,
}

/// Textos das avaliações, na ordem. Linhas que não são JSON válido (ou sem `text`) são ignoradas.
pub fn texts(jsonl: &str) -> Vec<String> {
    jsonl
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str::<Review>(line) {
            Ok(review) => Some(review.text),
            Err(error) => {
                warn!(line = index + 1, %error, "linha JSON ignorada");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texts() {
        let input = r#"{"review_id":"a1","stars":5,"text":"Great tacos!\nWill return."}
{"review_id":"a2","stars":1}
not json

{"review_id":"a3","text":"Slow service."}"#;
        assert_eq!(texts(input), vec!["Great tacos!\nWill return.", "Slow service."]);
    }
}
