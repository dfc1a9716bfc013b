use serde::Serialize;

use crate::RenderArgs;
use crate::config::WikiConfig;
use crate::render::Wiki;
use crate::render::pipeline::RenderOutput;

/// Output of `render --json`.
#[derive(Serialize)]
struct JsonOutput<'a> {
    html: &'a str,
    title: Option<&'a str>,
    date: Option<&'a str>,
    background: Option<&'a str>,
}

impl<'a> From<&'a RenderOutput> for JsonOutput<'a> {
    fn from(output: &'a RenderOutput) -> Self {
        Self {
            html: &output.html,
            title: output.title.as_deref(),
            date: output.date.as_deref(),
            background: output.background.as_deref(),
        }
    }
}

pub fn run(args: &RenderArgs) -> Result<(), anyhow::Error> {
    let config = WikiConfig::load_from_arg(args.config_file.as_deref())?;
    let wiki = Wiki::from_config(&config)?;

    let output = wiki.render_file(&args.file)?;
    tracing::info!(file = %args.file.display(), "Rendered file");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&JsonOutput::from(&output))?);
    } else {
        print!("{}", output.html);
    }

    Ok(())
}
