use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set, otherwise `LOG_LEVEL` (default `info`).
/// `LOG_JSON=1` switches to one JSON object per line.
pub(crate) fn init() -> anyhow::Result<()> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level.to_lowercase()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json_enabled(std::env::var("LOG_JSON").ok().as_deref()) {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn json_enabled(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1" | "true" | "TRUE" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::json_enabled;

    #[test]
    fn json_flag_values() {
        assert!(json_enabled(Some("1")));
        assert!(json_enabled(Some("true")));
        assert!(!json_enabled(Some("0")));
        assert!(!json_enabled(Some("")));
        assert!(!json_enabled(None));
    }
}
