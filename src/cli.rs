//! Interface de linha de comando do ANGLER baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (decode, demo, config)
//! e flags globais (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ANGLER: kernel de automação para uma sessão de jogo remota.
#[derive(Debug, Parser)]
#[command(name = "angler", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração (padrão: ./angler.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decodifica um raster de desafio salvo em JSON.
    Decode {
        /// Arquivo JSON no formato {"rows": .., "columns": .., "data": [..]}.
        path: PathBuf,

        /// Mostra também a posição de cada caractere encontrado.
        #[arg(long, default_value_t = false)]
        positions: bool,
    },

    /// Executa uma sessão simulada demonstrando épocas, filas e esperas.
    Demo {
        /// Código que o desafio simulado deve conter.
        #[arg(long, default_value = "R0D42")]
        code: String,
    },

    /// Mostra a configuração efetiva.
    Config,
}
