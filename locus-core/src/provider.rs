use crate::{
    Config, LocationSample, PermissionResponse,
    provider::{fixed::FixedProvider, ipapi::IpApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod fixed;
pub mod ipapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    IpApi,
    Fixed,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::IpApi => "ipapi",
            ProviderId::Fixed => "fixed",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::IpApi, ProviderId::Fixed]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "ipapi" => Ok(ProviderId::IpApi),
            "fixed" => Ok(ProviderId::Fixed),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: ipapi, fixed."
            )),
        }
    }
}

/// Source of location permission and position fixes.
///
/// Both calls may suspend. Errors carry a human-readable description that ends up
/// on the error view.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    async fn request_permission(&self) -> anyhow::Result<PermissionResponse>;

    async fn current_position(&self) -> anyhow::Result<LocationSample>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn LocationProvider>> {
    let section = config.provider_config(id);

    let boxed: Box<dyn LocationProvider> = match id {
        ProviderId::IpApi => {
            let section = section.cloned().unwrap_or_default();
            let timeout = section.timeout();
            Box::new(IpApiProvider::new(section.endpoint, timeout)?)
        }
        ProviderId::Fixed => {
            let (latitude, longitude) = section
                .and_then(|cfg| Some((cfg.latitude?, cfg.longitude?)))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "No coordinates configured for provider '{id}'.\n\
                         Hint: run `locus configure {id}` and enter a latitude and longitude."
                    )
                })?;
            let grant = section.and_then(|cfg| cfg.grant_permission).unwrap_or(true);

            Box::new(FixedProvider::new(latitude, longitude, grant))
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn LocationProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ProviderConfig};

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parsing_ignores_case() {
        assert_eq!(ProviderId::try_from("IpApi").unwrap(), ProviderId::IpApi);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("gps").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn ipapi_works_without_a_config_section() {
        let cfg = Config::default();
        assert!(provider_from_config(ProviderId::IpApi, &cfg).is_ok());
    }

    #[test]
    fn ipapi_section_endpoint_and_timeout_are_both_used() {
        let mut cfg = Config::default();
        cfg.upsert_provider(
            ProviderId::IpApi,
            ProviderConfig {
                endpoint: Some("http://localhost:9/json".into()),
                timeout_secs: Some(1),
                ..Default::default()
            },
        );

        let provider = provider_from_config(ProviderId::IpApi, &cfg).expect("ipapi must build");
        assert!(format!("{provider:?}").contains("http://localhost:9/json"));
    }

    #[test]
    fn fixed_provider_errors_when_coordinates_missing() {
        let mut cfg = Config::default();
        cfg.upsert_provider(
            ProviderId::Fixed,
            ProviderConfig { latitude: Some(1.0), ..Default::default() },
        );

        let err = provider_from_config(ProviderId::Fixed, &cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No coordinates configured for provider 'fixed'"));
        assert!(msg.contains("Hint: run `locus configure fixed`"));
    }

    #[tokio::test]
    async fn default_provider_from_config_uses_configured_fixed_position() {
        let mut cfg = Config::default();
        cfg.upsert_provider(ProviderId::Fixed, ProviderConfig::fixed(37.4219999, -122.0840575));

        let provider = default_provider_from_config(&cfg).expect("fixed provider must build");
        let sample = provider.current_position().await.expect("fixed position");

        assert_eq!(sample.coordinates.latitude, 37.4219999);
        assert_eq!(sample.coordinates.longitude, -122.0840575);
    }
}
