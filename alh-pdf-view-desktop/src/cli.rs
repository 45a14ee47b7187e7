use alh_pdf_view::Configuration;
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FitArg {
    Width,
    Height,
    Both,
}

impl FitArg {
    fn wire(self) -> &'static str {
        match self {
            Self::Width => "FitPolicy.width",
            Self::Height => "FitPolicy.height",
            Self::Both => "FitPolicy.both",
        }
    }
}

/// Open a PDF in an embedded alh-pdf-view
#[derive(Debug, Parser)]
#[command(name = "alh-pdf-view", version)]
pub struct Args {
    /// PDF document to open
    pub path: Option<PathBuf>,

    /// JSON file with creation parameters (same keys as the channel payload)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Page to open at, zero based
    #[arg(long)]
    pub page: Option<usize>,

    #[arg(long, value_enum)]
    pub fit: Option<FitArg>,

    /// Password for encrypted documents
    #[arg(long)]
    pub password: Option<String>,

    /// Pages kept rendered around the current one
    #[arg(long, default_value_t = 3)]
    pub preload: usize,

    /// Duration of animated page changes in milliseconds
    #[arg(long, default_value_t = 400)]
    pub animation_ms: u64,
}

/// Creation parameters used when no config file is given
pub fn default_params() -> Value {
    json!({
        "fitPolicy": "FitPolicy.both",
        "swipeHorizontal": true,
        "pageFling": true,
        "pageSnap": true,
        "enableSwipe": true,
        "enableDoubleTap": true,
        "defaultPage": 0,
        "defaultZoomFactor": 1.0,
        "minZoom": 0.5,
        "maxZoom": 4.0,
        "password": "",
        "backgroundColor": 0xFF30_3030u32,
        "spacing": 0,
        "nightMode": false,
        "showScrollbar": true,
        "hasOnLinkHandle": false
    })
}

impl Args {
    pub fn page_animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    /// Merges the config file with command line overrides. The result is
    /// validated before it is handed to the view.
    pub fn creation_params(&self) -> Result<Value> {
        let mut params = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("{} is not valid JSON", path.display()))?
            }
            None => default_params(),
        };
        let Some(map) = params.as_object_mut() else {
            bail!("creation parameters must be a JSON object");
        };

        if let Some(path) = &self.path {
            map.remove("bytes");
            map.insert("filePath".into(), json!(path));
        }
        if let Some(page) = self.page {
            map.insert("defaultPage".into(), json!(page));
        }
        if let Some(fit) = self.fit {
            map.insert("fitPolicy".into(), json!(fit.wire()));
        }
        if let Some(password) = &self.password {
            map.insert("password".into(), json!(password));
        }

        Configuration::from_value(&params).context("invalid creation parameters")?;
        Ok(params)
    }
}
