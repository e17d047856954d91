//! Semantic validation of a parsed [`MatchConfig`].

use crate::error::ConfigError;

use super::schema::MatchConfig;

fn invalid(field: &str, value: impl ToString, expected: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        value: value.to_string(),
        expected: expected.to_owned(),
    }
}

/// Checks value ranges that serde cannot express.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming the first offending field.
pub fn validate(config: &MatchConfig) -> Result<(), ConfigError> {
    if config.match_duration_secs == 0 {
        return Err(invalid("match_duration_secs", 0, "a positive number of seconds"));
    }
    if config.challenges_per_action == 0 {
        return Err(invalid("challenges_per_action", 0, "at least 1"));
    }

    let budgets = &config.time_budgets;
    if budgets.hard == 0 {
        return Err(invalid("time_budgets.hard", 0, "a positive number of seconds"));
    }
    if budgets.medium <= budgets.hard {
        return Err(invalid(
            "time_budgets.medium",
            budgets.medium,
            "greater than time_budgets.hard",
        ));
    }
    if budgets.easy <= budgets.medium {
        return Err(invalid(
            "time_budgets.easy",
            budgets.easy,
            "greater than time_budgets.medium",
        ));
    }

    let providers = &config.providers;
    if providers.request_timeout_ms == 0 {
        return Err(invalid("providers.request_timeout_ms", 0, "a positive duration"));
    }
    if providers.commentary_timeout_ms == 0 {
        return Err(invalid("providers.commentary_timeout_ms", 0, "a positive duration"));
    }
    if !(providers.challenge_url.starts_with("http://")
        || providers.challenge_url.starts_with("https://"))
    {
        return Err(invalid(
            "providers.challenge_url",
            &providers.challenge_url,
            "an http(s) URL",
        ));
    }
    if providers.commentary_model.trim().is_empty() {
        return Err(invalid("providers.commentary_model", "", "a model name"));
    }

    Ok(())
}
