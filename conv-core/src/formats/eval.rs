//! Junta um arquivo BIO de referência e um de predição no formato de entrada do `conlleval`:
//! `forma gold predito`, uma linha por token, sentenças separadas por linha em branco.
//!
//! A etiqueta é sempre o último campo da linha. Os dois arquivos precisam ter as mesmas linhas
//! e as mesmas formas; qualquer desalinhamento invalida a avaliação inteira.

use crate::error::{ConvertError, Result};

const CONTEXT: &str = "conlleval";

fn form_and_tag(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.split(|c: char| c == '\t' || c == ' ').filter(|f| !f.is_empty());
    let form = fields.next()?;
    let tag = fields.last()?;
    Some((form, tag))
}

pub fn merge(reference: &str, predicted: &str) -> Result<String> {
    let gold: Vec<&str> = reference.lines().collect();
    let pred: Vec<&str> = predicted.lines().collect();
    if gold.len() != pred.len() {
        return Err(ConvertError::format(
            CONTEXT,
            format!("referência tem {} linhas, predição tem {}", gold.len(), pred.len()),
        ));
    }

    let mut out = String::new();
    for (index, (g, p)) in gold.iter().zip(&pred).enumerate() {
        let line = index + 1;
        match (g.trim().is_empty(), p.trim().is_empty()) {
            (true, true) => out.push('\n'),
            (false, false) => {
                let (form, gold_tag) = form_and_tag(g).ok_or_else(|| {
                    ConvertError::format(CONTEXT, format!("linha {line} da referência sem etiqueta"))
                })?;
                let (predicted_form, predicted_tag) = form_and_tag(p).ok_or_else(|| {
                    ConvertError::format(CONTEXT, format!("linha {line} da predição sem etiqueta"))
                })?;
                if form != predicted_form {
                    return Err(ConvertError::format(
                        CONTEXT,
                        format!("linha {line}: forma {form:?} != {predicted_form:?}"),
                    ));
                }
                out.push_str(&format!("{form} {gold_tag} {predicted_tag}\n"));
            }
            _ => {
                return Err(ConvertError::format(
                    CONTEXT,
                    format!("linha {line}: fronteira de sentença divergente"),
                ))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let gold = "Eiffel\tB-LOC\nTower\tI-LOC\n\nParis\tB-LOC\n";
        let pred = "Eiffel\tB-LOC\nTower\tO\n\nParis\tB-PER\n";
        assert_eq!(
            merge(gold, pred).unwrap(),
            "Eiffel B-LOC B-LOC\nTower I-LOC O\n\nParis B-LOC B-PER\n"
        );
    }

    #[test]
    fn test_merge_uses_last_column() {
        let gold = "Eiffel\tEiffel\tO\tB-LOC\n";
        let pred = "Eiffel\tI-LOC\n";
        assert_eq!(merge(gold, pred).unwrap(), "Eiffel B-LOC I-LOC\n");
    }

    #[test]
    fn test_merge_rejects_misalignment() {
        assert!(merge("a\tO\nb\tO\n", "a\tO\n").is_err());
        assert!(merge("a\tO\n", "b\tO\n").is_err());
        assert!(merge("a\tO\n\n", "a\tO\nb\tO\n").is_err());
        assert!(merge("a\n", "a\tO\n").is_err());
    }
}
