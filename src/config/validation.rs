use super::ServerConfig;

/// Reject configurations the gateway cannot serve calls with.
pub(super) fn validate(config: &ServerConfig) -> Result<(), String> {
    validate_api_key(config.openai_api_key.as_deref())?;
    validate_vad_threshold(config.vad_threshold)?;
    validate_temperature(config.temperature)?;
    validate_realtime_url(&config.realtime_url)?;
    Ok(())
}

fn validate_api_key(api_key: Option<&str>) -> Result<(), String> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(
            "OPENAI_API_KEY is required (set it in the environment or realtime.api_key in YAML)"
                .to_string(),
        ),
    }
}

fn validate_vad_threshold(threshold: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(format!(
            "VAD threshold must be between 0.0 and 1.0, got {threshold}"
        ))
    }
}

/// The realtime API accepts sampling temperatures in [0.6, 1.2].
fn validate_temperature(temperature: f32) -> Result<(), String> {
    if (0.6..=1.2).contains(&temperature) {
        Ok(())
    } else {
        Err(format!(
            "Realtime temperature must be between 0.6 and 1.2, got {temperature}"
        ))
    }
}

fn validate_realtime_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("Invalid OPENAI_REALTIME_URL: {e}"))?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(format!(
            "OPENAI_REALTIME_URL must use ws or wss, got {other}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key(Some("sk-test")).is_ok());
        assert!(validate_api_key(Some("  ")).is_err());
        assert!(validate_api_key(None).is_err());
    }

    #[test]
    fn test_validate_vad_threshold() {
        assert!(validate_vad_threshold(0.0).is_ok());
        assert!(validate_vad_threshold(0.5).is_ok());
        assert!(validate_vad_threshold(1.0).is_ok());
        assert!(validate_vad_threshold(-0.1).is_err());
        assert!(validate_vad_threshold(1.5).is_err());
        assert!(validate_vad_threshold(f32::NAN).is_err());
    }

    #[test]
    fn test_validate_temperature() {
        assert!(validate_temperature(0.6).is_ok());
        assert!(validate_temperature(0.8).is_ok());
        assert!(validate_temperature(1.2).is_ok());
        assert!(validate_temperature(0.5).is_err());
        assert!(validate_temperature(2.0).is_err());
    }

    #[test]
    fn test_validate_realtime_url() {
        assert!(validate_realtime_url("wss://api.openai.com/v1/realtime").is_ok());
        assert!(validate_realtime_url("ws://127.0.0.1:9000").is_ok());
        assert!(validate_realtime_url("https://api.openai.com").is_err());
        assert!(validate_realtime_url("not a url").is_err());
    }
}
