use clap::Parser;

use fluidsim::sim::Style;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    /// Frames to run before exiting (0 = until Ctrl-C; overrides config)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Surface width in pixels (overrides config)
    #[arg(long)]
    pub width: Option<i32>,

    /// Surface height in pixels (overrides config)
    #[arg(long)]
    pub height: Option<i32>,

    /// Effect model asset (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Disable the learned effect pass
    #[arg(long, default_value_t = false)]
    pub no_ai: bool,

    /// Palette style
    #[arg(long, value_parser = parse_style)]
    pub style: Option<Style>,
}

fn parse_style(s: &str) -> Result<Style, String> {
    match s.to_ascii_lowercase().as_str() {
        "warm" => Ok(Style::Warm),
        "cool" => Ok(Style::Cool),
        other => Err(format!("unknown style `{other}` (expected warm or cool)")),
    }
}

impl Args {
    pub fn apply(&self, cfg: &mut fluidsim::config::AppConfig) {
        if let Some(frames) = self.frames {
            cfg.host.frames = frames;
        }
        if let Some(width) = self.width {
            cfg.host.width = width;
        }
        if let Some(height) = self.height {
            cfg.host.height = height;
        }
        if let Some(model) = &self.model {
            cfg.inference.model_path = model.into();
        }
        if self.no_ai {
            cfg.simulation.ai_enabled = false;
        }
        if let Some(style) = self.style {
            cfg.simulation.style = style;
        }
    }
}
