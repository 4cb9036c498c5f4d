//! Lógica dos subcomandos, separada do parsing de argumentos para poder ser testada.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use conv_core::formats::{absa, barr, dsrc, eval, naf, timeml, yelp, Record};
use conv_core::{ConversionReport, ConvertConfig, ConvertError, Converter, Result};
use rayon::prelude::*;
use tracing::{info, warn};

/// Extensões aceitas ao percorrer um diretório TimeML.
const TIMEML_EXTENSIONS: [&str; 2] = ["tml", "xml"];
const NAF_EXTENSIONS: [&str; 3] = ["naf", "kaf", "xml"];

pub fn load_config(path: Option<&Path>) -> Result<ConvertConfig> {
    match path {
        Some(path) => ConvertConfig::from_json_file(path),
        None => Ok(ConvertConfig::default()),
    }
}

pub fn absa_2014_to_bio(converter: &Converter, xml: &str) -> Result<(String, ConversionReport)> {
    let records = absa::read_2014(xml)?;
    Ok(converter.encode_records(&records))
}

pub fn absa_2015_to_bio(
    converter: &Converter,
    xml: &str,
    multiclass: bool,
) -> Result<(String, ConversionReport)> {
    let records = absa::read_2015(xml, multiclass)?;
    Ok(converter.encode_records(&records))
}

/// Uma sentença por linha.
pub fn absa_text(xml: &str) -> Result<String> {
    Ok(lines(absa::sentence_texts(xml)?))
}

pub fn timeml_to_bio(converter: &Converter, xml: &str) -> Result<(String, ConversionReport)> {
    let record = timeml::read(xml)?;
    Ok(converter.encode_records(&[record]))
}

/// Converte todos os arquivos TimeML de um diretório em paralelo, gravando cada saída ao lado
/// da entrada.
pub fn timeml_dir(converter: &Converter, dir: &Path) -> Result<ConversionReport> {
    convert_dir(converter, dir, &TIMEML_EXTENSIONS, timeml::read)
}

pub fn naf_to_bio(converter: &Converter, xml: &str) -> Result<(String, ConversionReport)> {
    let record = naf::read(xml)?;
    Ok(converter.encode_records(&[record]))
}

pub fn naf_dir(converter: &Converter, dir: &Path) -> Result<ConversionReport> {
    convert_dir(converter, dir, &NAF_EXTENSIONS, naf::read)
}

/// Entidades NAF como termos de aspecto ABSA 2014.
pub fn naf_to_absa_2014(converter: &Converter, xml: &str) -> Result<(String, ConversionReport)> {
    let record = naf::read(xml)?;
    let (documents, report) = converter.build_with_report(&[record]);
    Ok((absa::write_2014(&documents)?, report))
}

/// Um link de entidade por linha.
pub fn naf_links(xml: &str) -> Result<String> {
    Ok(lines(naf::links(xml)?))
}

pub fn dsrc_to_bio(
    converter: &Converter,
    words: &str,
    markables: &str,
) -> Result<(String, ConversionReport)> {
    let record = dsrc::read(words, markables)?;
    Ok(converter.encode_records(&[record]))
}

/// Converte em paralelo os arquivos de `dir` com uma das `extensions`, gravando cada saída ao
/// lado da entrada. Arquivos que falham são registrados e pulados.
fn convert_dir(
    converter: &Converter,
    dir: &Path,
    extensions: &[&str],
    read: fn(&str) -> Result<Record>,
) -> Result<ConversionReport> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let accepted = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.contains(&e))
            .unwrap_or(false);
        if path.is_file() && accepted {
            files.push(path);
        }
    }
    files.sort();
    info!(files = files.len(), dir = %dir.display(), "convertendo diretório");

    let suffix = converter.config().output_suffix.as_str();
    let report = files
        .par_iter()
        .filter_map(|path| {
            // o nome do arquivo identifica o documento nos diagnósticos
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            let converted = fs::read_to_string(path)
                .map_err(ConvertError::from)
                .and_then(|xml| read(&xml))
                .and_then(|record| -> Result<ConversionReport> {
                    let record = Record { id: name, ..record };
                    let (bio, report) = converter.encode_records(&[record]);
                    fs::write(output_path(path, suffix), bio)?;
                    Ok(report)
                });
            match converted {
                Ok(report) => Some(report),
                Err(error) => {
                    warn!(file = %path.display(), %error, "arquivo ignorado");
                    None
                }
            }
        })
        .reduce(ConversionReport::default, |mut total, report| {
            total.merge(&report);
            total
        });
    Ok(report)
}

pub fn barr_to_bio(
    converter: &Converter,
    documents: &str,
    entities: &str,
) -> Result<(String, ConversionReport)> {
    let records = barr::read(documents, entities);
    Ok(converter.encode_records(&records))
}

pub fn yelp_text(jsonl: &str) -> String {
    lines(yelp::texts(jsonl))
}

pub fn bio_to_absa_2014(
    converter: &Converter,
    bio: &str,
    reference_xml: &str,
) -> Result<(String, ConversionReport)> {
    let reference = absa::read_2014(reference_xml)?;
    let (documents, report) = converter.decode_and_project(bio, &reference)?;
    Ok((absa::write_2014(&documents)?, report))
}

pub fn bio_to_absa_2015(
    converter: &Converter,
    bio: &str,
    reference_xml: &str,
) -> Result<(String, ConversionReport)> {
    let reference = absa::read_2015(reference_xml, false)?;
    let (documents, report) = converter.decode_and_project(bio, &reference)?;
    Ok((absa::write_2015(&documents)?, report))
}

pub fn bio_to_barr(
    converter: &Converter,
    bio: &str,
    documents: &str,
) -> Result<(String, ConversionReport)> {
    let reference = barr::read(documents, "");
    let (documents, report) = converter.decode_and_project(bio, &reference)?;
    Ok((barr::write_entities(&documents), report))
}

pub fn eval_merge(reference: &str, predicted: &str) -> Result<String> {
    eval::merge(reference, predicted)
}

fn lines(items: Vec<String>) -> String {
    items.into_iter().map(|item| item + "\n").collect()
}

/// `dir/wsj_0006.tml` → `dir/wsj_0006.tml.conll02`
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Grava em `path` ou, sem destino, na saída padrão.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text)?,
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())?;
            lock.flush()?;
        }
    }
    Ok(())
}

pub fn write_report(path: &Path, report: &ConversionReport) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
