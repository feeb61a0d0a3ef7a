use clap::ValueEnum;

#[derive(Copy, Clone, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    pub(crate) fn render(self, value: &serde_json::Value) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}
