use smart_config::{DescribeConfig, DeserializeConfig};

#[derive(Clone, Debug, DescribeConfig, DeserializeConfig)]
#[config(derive(Default))]
pub struct ObservabilityConfig {
    /// Format of emitted logs: `plain`, `json` or `logfmt`.
    #[config(default_t = "plain".into())]
    pub log_format: String,
    /// `tracing` filter directives, e.g. `l1_adapter_sender=debug,info`.
    /// Falls back to `RUST_LOG` if unset.
    #[config(default)]
    pub log_directives: Option<String>,
}
