//! Interface de terminal do ANGLER: spinner e saída colorida.
//!
//! Usa `indicatif` para o spinner que mostra o estado atual da sessão e
//! `console` para colorir resultados. O [`ConsoleTransport`] imprime cada
//! envio acima do spinner, com o tempo decorrido desde o início.

use std::time::{Duration, Instant};

use angler::captcha::Glyph;
use angler::dispatch::{Delivery, QueueKind, Transport};
use angler::signals::WaitOutcome;
use angler::state_machine::{Snapshot, TransitionRecord};
use angler::TransportError;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

/// Indicador visual da sessão em execução no terminal.
pub struct SessionProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    // Verde para sucesso.
    green: Style,
    // Vermelho para falha.
    red: Style,
    // Amarelo para cancelamento/timeout.
    yellow: Style,
    // Ciano para passos da demonstração.
    cyan: Style,
    started: Instant,
}

impl SessionProgress {
    /// Inicia o spinner com uma descrição inicial.
    pub fn start(description: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(description.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
            started: Instant::now(),
        }
    }

    /// Transporte que imprime acima deste spinner.
    pub fn transport(&self) -> ConsoleTransport {
        ConsoleTransport {
            pb: self.pb.clone(),
            started: self.started,
        }
    }

    /// Atualiza a mensagem do spinner com estado e época.
    pub fn update_state(&self, snapshot: &Snapshot) {
        self.pb
            .set_message(format!("{} ({})", snapshot.state, snapshot.epoch));
    }

    /// Imprime o título de um passo da demonstração.
    pub fn step(&self, title: &str) {
        self.pb
            .println(format!("{} {title}", self.cyan.apply_to("▸")));
    }

    /// Imprime como uma espera terminou.
    pub fn wait_outcome(&self, label: &str, outcome: &WaitOutcome) {
        let line = match outcome {
            WaitOutcome::Matched { signal, .. } => format!(
                "  {} {label}: matched `{signal}`",
                self.green.apply_to("✓")
            ),
            WaitOutcome::Cancelled => {
                format!("  {} {label}: cancelled", self.yellow.apply_to("↺"))
            }
            WaitOutcome::TimedOut => {
                format!("  {} {label}: timed out", self.yellow.apply_to("⧗"))
            }
        };
        self.pb.println(line);
    }

    /// Imprime o destino de uma ação enfileirada.
    pub fn delivery(&self, label: &str, delivery: &Delivery) {
        let line = match delivery {
            Delivery::Sent => format!("  {} {label}: sent", self.green.apply_to("✓")),
            Delivery::Discarded => {
                format!("  {} {label}: discarded (stale)", self.yellow.apply_to("↺"))
            }
            Delivery::Failed(err) => {
                format!("  {} {label}: failed: {err}", self.red.apply_to("✗"))
            }
        };
        self.pb.println(line);
    }

    /// Finaliza o spinner e imprime o histórico de transições em JSON.
    pub fn finish(&self, history: &[TransitionRecord]) {
        self.pb.finish_and_clear();
        println!();
        println!("{}", self.green.apply_to("─── Transition History ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(history).unwrap_or_default()
        );
    }
}

/// Transporte de saída que só imprime o que seria enviado.
pub struct ConsoleTransport {
    pb: ProgressBar,
    started: Instant,
}

impl Transport for ConsoleTransport {
    fn send(&self, kind: QueueKind, payload: &str) -> Result<(), TransportError> {
        let elapsed = self.started.elapsed().as_millis();
        self.pb
            .println(format!("    → [{kind:>7}] {payload}  (+{elapsed}ms)"));
        Ok(())
    }
}

/// Imprime o resultado de `angler decode`.
pub fn print_code(glyphs: &[Glyph], expected: usize, positions: bool) {
    let code: String = glyphs.iter().map(|g| g.label).collect();
    let green = Style::new().green().bold();
    let yellow = Style::new().yellow().bold();

    if glyphs.len() == expected {
        println!("{} {code}", green.apply_to("✓"));
    } else {
        println!(
            "{} {code} (read {} of {expected} characters; raster not fully legible)",
            yellow.apply_to("!"),
            glyphs.len()
        );
    }
    if positions {
        for glyph in glyphs {
            println!("  {} at x={} y={}", glyph.label, glyph.x, glyph.y);
        }
    }
}
