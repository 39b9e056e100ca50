use std::io;

use spotlight_core::result::ResultItem;
use spotlight_core::{Dispatcher, DispatcherBuilder, Settings, Stage, Turn};
use spotlight_mcp::{McpHost, McpServersConfig};
use spotlight_model::ModelProvider;

use crate::settings::SettingsStore;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    dispatcher_builder: DispatcherBuilder,
    mcp_servers: McpServersConfig,
    settings_store: Option<SettingsStore>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        Self {
            dispatcher_builder: DispatcherBuilder::with_model_provider(
                provider,
            ),
            mcp_servers: Default::default(),
            settings_store: None,
        }
    }

    /// Sets the MCP servers to launch when the session is built.
    #[inline]
    pub fn with_mcp_servers(mut self, config: McpServersConfig) -> Self {
        self.mcp_servers = config;
        self
    }

    /// Sets where the settings are loaded from and saved to.
    ///
    /// Without a store, settings only live as long as the session.
    #[inline]
    pub fn with_settings_store(mut self, store: SettingsStore) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Attaches a callback to be invoked when the stage changes.
    #[inline]
    pub fn on_stage(
        mut self,
        on_stage: impl Fn(Stage) + Send + Sync + 'static,
    ) -> Self {
        self.dispatcher_builder = self.dispatcher_builder.on_stage(on_stage);
        self
    }

    /// Attaches a callback to be invoked when the results of the current
    /// turn change.
    #[inline]
    pub fn on_results(
        mut self,
        on_results: impl Fn(&[ResultItem]) + Send + Sync + 'static,
    ) -> Self {
        self.dispatcher_builder =
            self.dispatcher_builder.on_results(on_results);
        self
    }

    /// Builds a new session.
    ///
    /// Configured MCP servers are launched in the background, so this must
    /// be called from within a tokio runtime when there are any.
    pub fn build(self) -> Session {
        let Self {
            mut dispatcher_builder,
            mcp_servers,
            settings_store,
        } = self;

        let settings = match &settings_store {
            Some(store) => store.load().unwrap_or_else(|err| {
                warn!("failed to load settings {:?}: {err}", store.path());
                Default::default()
            }),
            None => Settings::default(),
        };
        dispatcher_builder = dispatcher_builder.with_settings(settings);

        let has_tool_servers = !mcp_servers.mcp_servers.is_empty();
        if has_tool_servers {
            dispatcher_builder =
                dispatcher_builder.with_tool_host(McpHost::launch(mcp_servers));
        }

        Session {
            dispatcher: dispatcher_builder.build(),
            settings_store,
            has_tool_servers,
        }
    }
}

/// A spotlight session, like a search box with its result list.
///
/// It is basically a wrapper around [`Dispatcher`] that also manages the
/// tool servers and the persisted settings.
pub struct Session {
    dispatcher: Dispatcher,
    settings_store: Option<SettingsStore>,
    has_tool_servers: bool,
}

impl Session {
    /// Runs one turn for the query.
    #[inline]
    pub async fn submit(&mut self, query: &str) -> Turn {
        self.dispatcher.submit(query).await
    }

    /// Returns `true` if any tool server was configured.
    #[inline]
    pub fn has_tool_servers(&self) -> bool {
        self.has_tool_servers
    }

    /// Waits for the tool servers and refreshes the tool catalog.
    ///
    /// Returns the number of tools available.
    pub async fn refresh_tools(&mut self) -> usize {
        if !self.has_tool_servers {
            return 0;
        }
        self.dispatcher.refresh_tools().await
    }

    /// Saves the API key, taking effect from the next turn.
    ///
    /// The key is kept for this session even if persisting it fails.
    pub fn save_api_key(&mut self, api_key: &str) -> io::Result<()> {
        let settings = Settings::with_api_key(api_key.trim());
        self.dispatcher.set_settings(settings.clone());
        match &self.settings_store {
            Some(store) => store.save(&settings),
            None => Ok(()),
        }
    }

    /// Returns the underlying dispatcher.
    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
