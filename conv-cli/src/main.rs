//! # conv: Conversor de Corpora
//!
//! Linha de comando sobre o `conv-core`. Cada subcomando lê um formato, passa pelo motor de
//! alinhamento e grava o resultado em `--output` ou na saída padrão. Logs vão para stderr
//! (controle com `RUST_LOG`, padrão `info`).
//!
//! ```text
//! conv absa2015 --multiclass restaurants.xml > restaurants.conll02
//! conv --labels conll03 timeml corpus/
//! conv naf --conll03 documento.naf
//! conv to-absa2015 --reference restaurants.xml predicted.conll02 --output restaurants.pred.xml
//! ```

mod commands;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use conv_core::{
    ColumnLayout, ConversionReport, ConvertConfig, Converter, Language, LabelMapping, Result,
    TokenizerMode,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conv", version, about = "Converte corpora anotados por offset de/para BIO")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

/// Opções comuns; sobrescrevem o arquivo de configuração.
#[derive(clap::Args)]
struct Options {
    /// Configuração JSON (ver `ConvertConfig`)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Idioma do tokenizador (en, es, eu, pt, it, nl, fr, de, gl)
    #[arg(long, global = true)]
    lang: Option<Language>,

    /// Mapeamento de rótulos
    #[arg(long, global = true, value_enum)]
    labels: Option<LabelsArg>,

    /// Usa um único rótulo para todas as anotações (ex: TARGET)
    #[arg(long, global = true, value_name = "LABEL", conflicts_with = "labels")]
    fixed_label: Option<String>,

    #[arg(long, global = true, value_enum)]
    layout: Option<LayoutArg>,

    /// Força o modo de tokenização em vez do sugerido pelo formato
    #[arg(long, global = true, value_enum)]
    mode: Option<ModeArg>,

    /// Mantém apenas estes rótulos (lista separada por vírgulas)
    #[arg(long, global = true, value_delimiter = ',')]
    keep: Vec<String>,

    /// Arquivo de saída (padrão: stdout)
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Grava o relatório da conversão em JSON
    #[arg(long, global = true, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LabelsArg {
    Identity,
    Conll03,
    Uppercase,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    Compact,
    Preserve,
    Conll,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Standard,
    Single,
    Whitespace,
}

#[derive(Subcommand)]
enum Command {
    /// ABSA SemEval 2014 (termos de aspecto) → BIO
    Absa2014 { input: PathBuf },
    /// ABSA SemEval 2015/2016 (alvos de opinião) → BIO
    Absa2015 {
        input: PathBuf,
        /// Usa a categoria da opinião como rótulo
        #[arg(long)]
        multiclass: bool,
    },
    /// ABSA → uma sentença por linha
    AbsaText { input: PathBuf },
    /// TimeML → BIO; um diretório é convertido arquivo a arquivo, com a saída ao lado de cada
    /// entrada
    Timeml { input: PathBuf },
    /// BARR (documentos + entidades) → BIO
    Barr {
        #[arg(long)]
        docs: PathBuf,
        #[arg(long)]
        entities: PathBuf,
    },
    /// Yelp JSON lines → um texto por linha
    YelpText { input: PathBuf },
    /// NAF/KAF com entidades → BIO em colunas CoNLL (forma, lema, morfologia, etiqueta); um
    /// diretório é convertido arquivo a arquivo
    Naf {
        input: PathBuf,
        /// Tipos CoNLL 2003 (PER, ORG, LOC, MISC) e sufixo `conll03`
        #[arg(long)]
        conll03: bool,
    },
    /// NAF/KAF com entidades → ABSA 2014 (termos de aspecto)
    NafToAbsa2014 { input: PathBuf },
    /// Links de desambiguação das entidades NAF, um por linha
    NafLinks { input: PathBuf },
    /// DSRC (palavras + markables MMAX) → BIO com alvos de opinião
    Dsrc {
        #[arg(long)]
        words: PathBuf,
        #[arg(long)]
        markables: PathBuf,
    },
    /// BIO → ABSA 2014, com offsets tirados do XML de referência
    ToAbsa2014 {
        input: PathBuf,
        #[arg(long)]
        reference: PathBuf,
    },
    /// BIO → ABSA 2015, com offsets tirados do XML de referência
    ToAbsa2015 {
        input: PathBuf,
        #[arg(long)]
        reference: PathBuf,
    },
    /// BIO → entidades BARR, com offsets tirados do arquivo de documentos
    ToBarr {
        input: PathBuf,
        #[arg(long)]
        docs: PathBuf,
    },
    /// Referência + predição BIO → entrada do conlleval
    EvalMerge { reference: PathBuf, predicted: PathBuf },
}

impl Options {
    fn apply(&self, config: &mut ConvertConfig) {
        if let Some(lang) = self.lang {
            config.language = lang;
        }
        if let Some(labels) = self.labels {
            config.labels = match labels {
                LabelsArg::Identity => LabelMapping::Identity,
                LabelsArg::Conll03 => LabelMapping::Conll03,
                LabelsArg::Uppercase => LabelMapping::Uppercase,
            };
        }
        if let Some(label) = &self.fixed_label {
            config.labels = LabelMapping::Fixed(label.clone());
        }
        if let Some(layout) = self.layout {
            config.layout = match layout {
                LayoutArg::Compact => ColumnLayout::Compact,
                LayoutArg::Preserve => ColumnLayout::Preserve,
                LayoutArg::Conll => ColumnLayout::Conll,
            };
        }
        if let Some(mode) = self.mode {
            config.tokenizer_mode = Some(match mode {
                ModeArg::Standard => TokenizerMode::Standard,
                ModeArg::Single => TokenizerMode::Single,
                ModeArg::Whitespace => TokenizerMode::Whitespace,
            });
        }
        if !self.keep.is_empty() {
            config.keep_labels = self.keep.clone();
        }
    }
}

impl Command {
    /// Padrões do próprio subcomando; as opções explícitas ainda têm a palavra final.
    fn apply_defaults(&self, config: &mut ConvertConfig) {
        match self {
            Command::Naf { conll03, .. } => {
                config.layout = ColumnLayout::Conll;
                if *conll03 {
                    config.labels = LabelMapping::Conll03;
                    config.output_suffix = "conll03".to_string();
                }
            }
            Command::Dsrc { .. } => config.layout = ColumnLayout::Conll,
            _ => {}
        }
    }
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = commands::load_config(cli.options.config.as_deref())?;
    cli.command.apply_defaults(&mut config);
    cli.options.apply(&mut config);
    let converter = Converter::new(config);
    let output = cli.options.output.as_deref();

    let report: Option<ConversionReport> = match &cli.command {
        Command::Absa2014 { input } => {
            let (bio, report) = commands::absa_2014_to_bio(&converter, &read(input)?)?;
            commands::write_output(output, &bio)?;
            Some(report)
        }
        Command::Absa2015 { input, multiclass } => {
            let (bio, report) =
                commands::absa_2015_to_bio(&converter, &read(input)?, *multiclass)?;
            commands::write_output(output, &bio)?;
            Some(report)
        }
        Command::AbsaText { input } => {
            commands::write_output(output, &commands::absa_text(&read(input)?)?)?;
            None
        }
        Command::Timeml { input } if input.is_dir() => Some(commands::timeml_dir(&converter, input)?),
        Command::Timeml { input } => {
            let (bio, report) = commands::timeml_to_bio(&converter, &read(input)?)?;
            commands::write_output(output, &bio)?;
            Some(report)
        }
        Command::Barr { docs, entities } => {
            let (bio, report) = commands::barr_to_bio(&converter, &read(docs)?, &read(entities)?)?;
            commands::write_output(output, &bio)?;
            Some(report)
        }
        Command::YelpText { input } => {
            commands::write_output(output, &commands::yelp_text(&read(input)?))?;
            None
        }
        Command::Naf { input, .. } if input.is_dir() => Some(commands::naf_dir(&converter, input)?),
        Command::Naf { input, .. } => {
            let (bio, report) = commands::naf_to_bio(&converter, &read(input)?)?;
            commands::write_output(output, &bio)?;
            Some(report)
        }
        Command::NafToAbsa2014 { input } => {
            let (xml, report) = commands::naf_to_absa_2014(&converter, &read(input)?)?;
            commands::write_output(output, &xml)?;
            Some(report)
        }
        Command::NafLinks { input } => {
            commands::write_output(output, &commands::naf_links(&read(input)?)?)?;
            None
        }
        Command::Dsrc { words, markables } => {
            let (bio, report) =
                commands::dsrc_to_bio(&converter, &read(words)?, &read(markables)?)?;
            commands::write_output(output, &bio)?;
            Some(report)
        }
        Command::ToAbsa2014 { input, reference } => {
            let (xml, report) =
                commands::bio_to_absa_2014(&converter, &read(input)?, &read(reference)?)?;
            commands::write_output(output, &xml)?;
            Some(report)
        }
        Command::ToAbsa2015 { input, reference } => {
            let (xml, report) =
                commands::bio_to_absa_2015(&converter, &read(input)?, &read(reference)?)?;
            commands::write_output(output, &xml)?;
            Some(report)
        }
        Command::ToBarr { input, docs } => {
            let (tsv, report) = commands::bio_to_barr(&converter, &read(input)?, &read(docs)?)?;
            commands::write_output(output, &tsv)?;
            Some(report)
        }
        Command::EvalMerge { reference, predicted } => {
            let merged = commands::eval_merge(&read(reference)?, &read(predicted)?)?;
            commands::write_output(output, &merged)?;
            None
        }
    };

    if let (Some(path), Some(report)) = (cli.options.report.as_deref(), &report) {
        commands::write_report(path, report)?;
        info!(path = %path.display(), "relatório gravado");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "conversão falhou");
            ExitCode::FAILURE
        }
    }
}
