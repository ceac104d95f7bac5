use crate::{
    config::{ConfigError, EngineConfig},
    table::TableHandle,
};
use std::{collections::BTreeMap, path::Path, sync::Arc};
use tablekit_core::{
    crypto::{EnvelopeCipher, KeyProvider},
    db::Transport,
    error::{Error, ErrorKind, ErrorOrigin},
    marshal::Marshaller,
    model::Registry,
};

///
/// Engine
///
/// Bound registry + transport + key provider. Cheap to clone; every
/// clone shares the same binding.
///

#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) registry: Registry,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: EngineConfig,
    marshallers: BTreeMap<String, Arc<Marshaller>>,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Handle for one registered model.
    pub fn table(&self, model: &str) -> Result<TableHandle, Error> {
        let schema = self.inner.registry.get(model)?;
        let marshaller = self.inner.marshallers.get(schema.name()).ok_or_else(|| {
            Error::invalid_model(ErrorOrigin::Engine, format!("model '{model}' is not bound"))
        })?;

        Ok(TableHandle::new(Arc::clone(&self.inner), Arc::clone(marshaller)))
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("models", &self.inner.marshallers.keys().collect::<Vec<_>>())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

///
/// EngineBuilder
///

#[derive(Default)]
pub struct EngineBuilder {
    registry: Option<Registry>,
    transport: Option<Arc<dyn Transport>>,
    key_provider: Option<Arc<dyn KeyProvider>>,
    config: Option<EngineConfig>,
}

impl std::fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EngineBuilder {
    #[must_use]
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn key_provider(mut self, provider: Arc<dyn KeyProvider>) -> Self {
        self.key_provider = Some(provider);
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Read configuration from a TOML file.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self, Error> {
        let config = EngineConfig::load(path).map_err(config_error)?;

        Ok(self.config(config))
    }

    /// Bind every registered model. Fails closed when a model has
    /// encrypted attributes and no key provider was given.
    pub fn build(self) -> Result<Engine, Error> {
        let registry = self.registry.ok_or_else(|| missing("registry"))?;
        let transport = self.transport.ok_or_else(|| missing("transport"))?;
        let config = self.config.unwrap_or_default();
        config.validate().map_err(config_error)?;

        let cipher = self.key_provider.map(|provider| {
            EnvelopeCipher::new(provider).with_default_timeout(config.encryption.key_timeout())
        });

        let marshallers = registry
            .models()
            .map(|schema| {
                let marshaller = Marshaller::new(Arc::clone(schema), cipher.clone())?;
                Ok((schema.name().to_string(), Arc::new(marshaller)))
            })
            .collect::<Result<BTreeMap<_, _>, Error>>()?;

        tracing::debug!(
            models = marshallers.len(),
            encryption = cipher.is_some(),
            "engine bound"
        );

        Ok(Engine {
            inner: Arc::new(EngineInner {
                registry,
                transport,
                config,
                marshallers,
            }),
        })
    }
}

fn missing(part: &str) -> Error {
    Error::new(
        ErrorKind::Config,
        ErrorOrigin::Engine,
        format!("engine requires a {part}"),
    )
}

fn config_error(err: ConfigError) -> Error {
    Error::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
}
